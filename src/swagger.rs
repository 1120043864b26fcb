use anyhow::Result;
use utoipa::openapi::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

/// Mounts the Swagger UI backed by the merged OpenAPI document.
pub fn create_swagger_ui(openapi: OpenApi) -> Result<SwaggerUi> {
    Ok(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", openapi))
}
