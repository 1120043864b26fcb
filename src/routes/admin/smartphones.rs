use anyhow::Context;
use axum::{
    Json,
    extract::{DefaultBodyLimit, Multipart, Path, State},
    response::IntoResponse,
};
use diesel::{ExpressionMethods, QueryDsl, SelectableHelper};
use diesel_async::RunQueryDsl;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use utoipa_axum::router::OpenApiRouter;

use crate::{
    admin::{self, SmartphoneFormState},
    app_error::{AppError, StdResponse},
    app_state::AppState,
    catalog::ProductKind,
    models::{CategoryEntity, CreateSmartphoneEntity, SmartphoneEntity, UpdateSmartphoneEntity},
    routes::admin::{
        UPLOAD_BODY_LIMIT, category_options, read_image_field, selectable_category,
        store_product_image,
    },
    schema::smartphones,
};

/// Defines the admin smartphone routes with OpenAPI specs.
pub fn routes_with_openapi() -> OpenApiRouter<AppState> {
    utoipa_axum::router::OpenApiRouter::new().nest(
        "/admin/smartphones",
        OpenApiRouter::new()
            .routes(utoipa_axum::routes!(get_smartphones))
            .routes(utoipa_axum::routes!(create_smartphone))
            .routes(utoipa_axum::routes!(get_smartphone_category_options))
            .routes(utoipa_axum::routes!(get_create_form))
            .routes(utoipa_axum::routes!(get_smartphone))
            .routes(utoipa_axum::routes!(get_edit_form))
            .routes(utoipa_axum::routes!(update_smartphone))
            .routes(utoipa_axum::routes!(delete_smartphone))
            .routes(utoipa_axum::routes!(upload_smartphone_image))
            .route_layer(DefaultBodyLimit::max(UPLOAD_BODY_LIMIT)),
    )
}

/// Fetch all smartphones.
#[utoipa::path(
    get,
    path = "/",
    tags = ["Smartphones"],
    responses(
        (status = 200, description = "List all smartphones", body = StdResponse<Vec<SmartphoneEntity>, String>)
    )
)]
async fn get_smartphones(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let conn = &mut state
        .db_pool
        .get()
        .await
        .context("Failed to obtain a DB connection pool")?;

    let smartphones: Vec<SmartphoneEntity> = smartphones::table
        .get_results(conn)
        .await
        .context("Failed to get smartphones")?;

    Ok(StdResponse {
        data: Some(smartphones),
        message: Some("Get smartphones successfully"),
    })
}

/// Fetch a specific smartphone.
#[utoipa::path(
    get,
    path = "/{id}",
    tags = ["Smartphones"],
    params(
        ("id" = i32, Path, description = "Smartphone ID to fetch")
    ),
    responses(
        (status = 200, description = "Get smartphone successfully", body = StdResponse<SmartphoneEntity, String>)
    )
)]
async fn get_smartphone(
    Path(id): Path<i32>,
    State(state): State<AppState>,
) -> Result<impl IntoResponse, AppError> {
    let conn = &mut state
        .db_pool
        .get()
        .await
        .context("Failed to obtain a DB connection pool")?;

    let smartphone: SmartphoneEntity = smartphones::table.find(id).get_result(conn).await?;

    Ok(StdResponse {
        data: Some(smartphone),
        message: Some("Get smartphone successfully"),
    })
}

/// Categories selectable on the smartphone form: only those with the fixed
/// `smartphones` slug.
#[utoipa::path(
    get,
    path = "/category-options",
    tags = ["Smartphones"],
    responses(
        (status = 200, description = "Selectable categories", body = StdResponse<Vec<CategoryEntity>, String>)
    )
)]
async fn get_smartphone_category_options(
    State(state): State<AppState>,
) -> Result<impl IntoResponse, AppError> {
    let conn = &mut state
        .db_pool
        .get()
        .await
        .context("Failed to obtain a DB connection pool")?;

    let options = category_options(conn, ProductKind::Smartphone).await?;

    Ok(StdResponse {
        data: Some(options),
        message: Some("Get category options successfully"),
    })
}

#[derive(Serialize, ToSchema)]
struct SmartphoneFormRes {
    /// Present when editing an existing row.
    smartphone: Option<SmartphoneEntity>,
    category_options: Vec<CategoryEntity>,
    readonly_fields: Vec<&'static str>,
}

/// Form metadata for creating a smartphone. No stored removable-storage flag
/// exists yet, so every field is editable.
#[utoipa::path(
    get,
    path = "/form",
    tags = ["Smartphones"],
    responses(
        (status = 200, description = "Create-form metadata", body = StdResponse<SmartphoneFormRes, String>)
    )
)]
async fn get_create_form(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let conn = &mut state
        .db_pool
        .get()
        .await
        .context("Failed to obtain a DB connection pool")?;

    let category_options = category_options(conn, ProductKind::Smartphone).await?;
    let form_state = SmartphoneFormState::Creating;

    Ok(StdResponse {
        data: Some(SmartphoneFormRes {
            smartphone: None,
            category_options,
            readonly_fields: form_state.readonly_fields().to_vec(),
        }),
        message: Some("Get form successfully"),
    })
}

/// Form metadata for editing a smartphone. When the stored removable-storage
/// flag is off, `sd_volume_max` is reported read-only.
#[utoipa::path(
    get,
    path = "/{id}/form",
    tags = ["Smartphones"],
    params(
        ("id" = i32, Path, description = "Smartphone ID the form edits")
    ),
    responses(
        (status = 200, description = "Edit-form metadata", body = StdResponse<SmartphoneFormRes, String>)
    )
)]
async fn get_edit_form(
    Path(id): Path<i32>,
    State(state): State<AppState>,
) -> Result<impl IntoResponse, AppError> {
    let conn = &mut state
        .db_pool
        .get()
        .await
        .context("Failed to obtain a DB connection pool")?;

    let smartphone: SmartphoneEntity = smartphones::table.find(id).get_result(conn).await?;
    let category_options = category_options(conn, ProductKind::Smartphone).await?;
    let form_state = SmartphoneFormState::Editing {
        removable_storage: smartphone.sd,
    };

    Ok(StdResponse {
        data: Some(SmartphoneFormRes {
            smartphone: Some(smartphone),
            category_options,
            readonly_fields: form_state.readonly_fields().to_vec(),
        }),
        message: Some("Get form successfully"),
    })
}

#[derive(Deserialize, ToSchema)]
struct SmartphoneFormReq {
    category_id: i32,
    title: String,
    slug: String,
    description: Option<String>,
    price: Decimal,
    diagonal: String,
    display_type: String,
    resolution: String,
    accum_volume: String,
    ram: String,
    sd: bool,
    sd_volume_max: Option<String>,
    main_cam_mp: String,
    frontal_cam_mp: String,
}

/// Create a new smartphone. The category must carry the `smartphones` slug,
/// and a submitted `sd_volume_max` is discarded when `sd` is false.
#[utoipa::path(
    post,
    path = "/",
    tags = ["Smartphones"],
    request_body = SmartphoneFormReq,
    responses(
        (status = 200, description = "Created smartphone successfully", body = StdResponse<SmartphoneEntity, String>)
    )
)]
async fn create_smartphone(
    State(state): State<AppState>,
    Json(body): Json<SmartphoneFormReq>,
) -> Result<impl IntoResponse, AppError> {
    let conn = &mut state
        .db_pool
        .get()
        .await
        .context("Failed to obtain a DB connection pool")?;

    selectable_category(conn, ProductKind::Smartphone, body.category_id).await?;
    let sd_volume_max = admin::clean_sd_volume_max(body.sd, body.sd_volume_max);

    let smartphone: SmartphoneEntity = diesel::insert_into(smartphones::table)
        .values(CreateSmartphoneEntity {
            category_id: body.category_id,
            title: body.title,
            slug: body.slug,
            description: body.description,
            price: body.price,
            diagonal: body.diagonal,
            display_type: body.display_type,
            resolution: body.resolution,
            accum_volume: body.accum_volume,
            ram: body.ram,
            sd: body.sd,
            sd_volume_max,
            main_cam_mp: body.main_cam_mp,
            frontal_cam_mp: body.frontal_cam_mp,
        })
        .returning(SmartphoneEntity::as_returning())
        .get_result(conn)
        .await
        .context("Failed to create smartphone")?;

    Ok(StdResponse {
        data: Some(smartphone),
        message: Some("Created smartphone successfully"),
    })
}

/// Update a smartphone. Whatever the client submitted for `sd_volume_max`
/// is stored as NULL whenever `sd` is false.
#[utoipa::path(
    patch,
    path = "/{id}",
    tags = ["Smartphones"],
    params(
        ("id" = i32, Path, description = "Smartphone ID to update")
    ),
    request_body = SmartphoneFormReq,
    responses(
        (status = 200, description = "Updated smartphone successfully", body = StdResponse<SmartphoneEntity, String>)
    )
)]
async fn update_smartphone(
    Path(id): Path<i32>,
    State(state): State<AppState>,
    Json(body): Json<SmartphoneFormReq>,
) -> Result<impl IntoResponse, AppError> {
    let conn = &mut state
        .db_pool
        .get()
        .await
        .context("Failed to obtain a DB connection pool")?;

    selectable_category(conn, ProductKind::Smartphone, body.category_id).await?;
    let sd_volume_max = admin::clean_sd_volume_max(body.sd, body.sd_volume_max);

    let smartphone: SmartphoneEntity = diesel::update(smartphones::table.find(id))
        .set(UpdateSmartphoneEntity {
            category_id: body.category_id,
            title: body.title,
            slug: body.slug,
            description: body.description,
            price: body.price,
            diagonal: body.diagonal,
            display_type: body.display_type,
            resolution: body.resolution,
            accum_volume: body.accum_volume,
            ram: body.ram,
            sd: body.sd,
            sd_volume_max,
            main_cam_mp: body.main_cam_mp,
            frontal_cam_mp: body.frontal_cam_mp,
        })
        .returning(SmartphoneEntity::as_returning())
        .get_result(conn)
        .await?;

    Ok(StdResponse {
        data: Some(smartphone),
        message: Some("Updated smartphone successfully"),
    })
}

/// Delete a smartphone.
#[utoipa::path(
    delete,
    path = "/{id}",
    tags = ["Smartphones"],
    params(
        ("id" = i32, Path, description = "Smartphone ID to delete")
    ),
    responses(
        (status = 200, description = "Deleted smartphone successfully", body = StdResponse<SmartphoneEntity, String>)
    )
)]
async fn delete_smartphone(
    Path(id): Path<i32>,
    State(state): State<AppState>,
) -> Result<impl IntoResponse, AppError> {
    let conn = &mut state
        .db_pool
        .get()
        .await
        .context("Failed to obtain a DB connection pool")?;

    let smartphone: SmartphoneEntity = diesel::delete(smartphones::table.find(id))
        .returning(SmartphoneEntity::as_returning())
        .get_result(conn)
        .await?;

    Ok(StdResponse {
        data: Some(smartphone),
        message: Some("Deleted smartphone successfully"),
    })
}

/// Upload the smartphone's product image. The upload is cleaned (size
/// ceiling first, then resolution bounds) before anything is written.
#[utoipa::path(
    put,
    path = "/{id}/image",
    tags = ["Smartphones"],
    params(
        ("id" = i32, Path, description = "Smartphone ID to attach the image to")
    ),
    responses(
        (status = 200, description = "Uploaded image successfully", body = StdResponse<SmartphoneEntity, String>),
        (status = 422, description = "Image rejected by validation")
    )
)]
async fn upload_smartphone_image(
    Path(id): Path<i32>,
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<impl IntoResponse, AppError> {
    let conn = &mut state
        .db_pool
        .get()
        .await
        .context("Failed to obtain a DB connection pool")?;

    let smartphone: SmartphoneEntity = smartphones::table.find(id).get_result(conn).await?;

    let data = read_image_field(multipart).await?;
    let image_path = store_product_image(
        &state.media_root,
        ProductKind::Smartphone,
        &smartphone.slug,
        &data,
        smartphone.image.as_deref(),
    )
    .await?;

    let smartphone: SmartphoneEntity = diesel::update(smartphones::table.find(id))
        .set(smartphones::image.eq(Some(image_path)))
        .returning(SmartphoneEntity::as_returning())
        .get_result(conn)
        .await
        .context("Failed to store the image path")?;

    Ok(StdResponse {
        data: Some(smartphone),
        message: Some("Uploaded image successfully"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn category_options_has_a_standalone_route() {
        let openapi = routes_with_openapi().get_openapi().clone();
        assert!(
            openapi
                .paths
                .paths
                .contains_key("/admin/smartphones/category-options")
        );
    }
}
