use anyhow::Context;
use axum::{
    extract::{Query, State},
    response::IntoResponse,
};
use serde::Deserialize;
use utoipa_axum::router::OpenApiRouter;

use crate::{
    app_error::{AppError, StdResponse},
    app_state::AppState,
    catalog::{ProductCard, ProductKind, latest},
};

/// Defines the public catalog routes with OpenAPI specs.
pub fn routes_with_openapi() -> OpenApiRouter<AppState> {
    utoipa_axum::router::OpenApiRouter::new().nest(
        "/catalog",
        OpenApiRouter::new().routes(utoipa_axum::routes!(get_latest_products)),
    )
}

#[derive(Deserialize)]
struct LatestProductsQuery {
    /// Comma separated product kinds, e.g. `notebook,smartphone`.
    types: String,
    /// Kind whose rows should sort first, when it is among `types`.
    priority: Option<String>,
}

/// The main-page product feed: the five most recent rows of every requested
/// kind, with the priority kind's rows first. Unknown kind names are skipped.
#[utoipa::path(
    get,
    path = "/latest-products",
    tags = ["Catalog"],
    params(
        ("types" = String, Query, description = "Comma separated product kinds to include"),
        ("priority" = Option<String>, Query, description = "Product kind whose rows sort first")
    ),
    responses(
        (status = 200, description = "Latest products", body = StdResponse<Vec<ProductCard>, String>)
    )
)]
async fn get_latest_products(
    Query(query): Query<LatestProductsQuery>,
    State(state): State<AppState>,
) -> Result<impl IntoResponse, AppError> {
    let kinds: Vec<ProductKind> = query
        .types
        .split(',')
        .filter_map(|name| name.trim().parse().ok())
        .collect();
    let priority = query
        .priority
        .as_deref()
        .and_then(|name| name.parse().ok());

    let conn = &mut state
        .db_pool
        .get()
        .await
        .context("Failed to obtain a DB connection pool")?;

    let products = latest::latest_products(conn, &kinds, priority).await?;

    Ok(StdResponse {
        data: Some(products),
        message: Some("Get latest products successfully"),
    })
}
