use anyhow::Context;
use axum::{
    Json,
    extract::{DefaultBodyLimit, Multipart, Path, State},
    response::IntoResponse,
};
use diesel::{ExpressionMethods, QueryDsl, SelectableHelper};
use diesel_async::RunQueryDsl;
use rust_decimal::Decimal;
use serde::Deserialize;
use utoipa::ToSchema;
use utoipa_axum::router::OpenApiRouter;

use crate::{
    app_error::{AppError, StdResponse},
    app_state::AppState,
    catalog::ProductKind,
    models::{CreateNotebookEntity, NotebookEntity, UpdateNotebookEntity},
    routes::admin::{
        UPLOAD_BODY_LIMIT, category_options, read_image_field, selectable_category,
        store_product_image,
    },
    schema::notebooks,
};

/// Defines the admin notebook routes with OpenAPI specs.
pub fn routes_with_openapi() -> OpenApiRouter<AppState> {
    utoipa_axum::router::OpenApiRouter::new().nest(
        "/admin/notebooks",
        OpenApiRouter::new()
            .routes(utoipa_axum::routes!(get_notebooks))
            .routes(utoipa_axum::routes!(create_notebook))
            .routes(utoipa_axum::routes!(get_notebook_category_options))
            .routes(utoipa_axum::routes!(get_notebook))
            .routes(utoipa_axum::routes!(update_notebook))
            .routes(utoipa_axum::routes!(delete_notebook))
            .routes(utoipa_axum::routes!(upload_notebook_image))
            .route_layer(DefaultBodyLimit::max(UPLOAD_BODY_LIMIT)),
    )
}

/// Fetch all notebooks.
#[utoipa::path(
    get,
    path = "/",
    tags = ["Notebooks"],
    responses(
        (status = 200, description = "List all notebooks", body = StdResponse<Vec<NotebookEntity>, String>)
    )
)]
async fn get_notebooks(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let conn = &mut state
        .db_pool
        .get()
        .await
        .context("Failed to obtain a DB connection pool")?;

    let notebooks: Vec<NotebookEntity> = notebooks::table
        .get_results(conn)
        .await
        .context("Failed to get notebooks")?;

    Ok(StdResponse {
        data: Some(notebooks),
        message: Some("Get notebooks successfully"),
    })
}

/// Fetch a specific notebook.
#[utoipa::path(
    get,
    path = "/{id}",
    tags = ["Notebooks"],
    params(
        ("id" = i32, Path, description = "Notebook ID to fetch")
    ),
    responses(
        (status = 200, description = "Get notebook successfully", body = StdResponse<NotebookEntity, String>)
    )
)]
async fn get_notebook(
    Path(id): Path<i32>,
    State(state): State<AppState>,
) -> Result<impl IntoResponse, AppError> {
    let conn = &mut state
        .db_pool
        .get()
        .await
        .context("Failed to obtain a DB connection pool")?;

    let notebook: NotebookEntity = notebooks::table.find(id).get_result(conn).await?;

    Ok(StdResponse {
        data: Some(notebook),
        message: Some("Get notebook successfully"),
    })
}

/// Categories selectable on the notebook form: only those with the fixed
/// `notebooks` slug.
#[utoipa::path(
    get,
    path = "/category-options",
    tags = ["Notebooks"],
    responses(
        (status = 200, description = "Selectable categories", body = StdResponse<Vec<crate::models::CategoryEntity>, String>)
    )
)]
async fn get_notebook_category_options(
    State(state): State<AppState>,
) -> Result<impl IntoResponse, AppError> {
    let conn = &mut state
        .db_pool
        .get()
        .await
        .context("Failed to obtain a DB connection pool")?;

    let options = category_options(conn, ProductKind::Notebook).await?;

    Ok(StdResponse {
        data: Some(options),
        message: Some("Get category options successfully"),
    })
}

#[derive(Deserialize, ToSchema)]
struct NotebookFormReq {
    category_id: i32,
    title: String,
    slug: String,
    description: Option<String>,
    price: Decimal,
    diagonal: String,
    display_type: String,
    processor_freq: String,
    ram: String,
    video: String,
    time_without_charge: String,
}

/// Create a new notebook. The category must carry the `notebooks` slug.
#[utoipa::path(
    post,
    path = "/",
    tags = ["Notebooks"],
    request_body = NotebookFormReq,
    responses(
        (status = 200, description = "Created notebook successfully", body = StdResponse<NotebookEntity, String>)
    )
)]
async fn create_notebook(
    State(state): State<AppState>,
    Json(body): Json<NotebookFormReq>,
) -> Result<impl IntoResponse, AppError> {
    let conn = &mut state
        .db_pool
        .get()
        .await
        .context("Failed to obtain a DB connection pool")?;

    selectable_category(conn, ProductKind::Notebook, body.category_id).await?;

    let notebook: NotebookEntity = diesel::insert_into(notebooks::table)
        .values(CreateNotebookEntity {
            category_id: body.category_id,
            title: body.title,
            slug: body.slug,
            description: body.description,
            price: body.price,
            diagonal: body.diagonal,
            display_type: body.display_type,
            processor_freq: body.processor_freq,
            ram: body.ram,
            video: body.video,
            time_without_charge: body.time_without_charge,
        })
        .returning(NotebookEntity::as_returning())
        .get_result(conn)
        .await
        .context("Failed to create notebook")?;

    Ok(StdResponse {
        data: Some(notebook),
        message: Some("Created notebook successfully"),
    })
}

/// Update a notebook. The category restriction applies on every submit.
#[utoipa::path(
    patch,
    path = "/{id}",
    tags = ["Notebooks"],
    params(
        ("id" = i32, Path, description = "Notebook ID to update")
    ),
    request_body = NotebookFormReq,
    responses(
        (status = 200, description = "Updated notebook successfully", body = StdResponse<NotebookEntity, String>)
    )
)]
async fn update_notebook(
    Path(id): Path<i32>,
    State(state): State<AppState>,
    Json(body): Json<NotebookFormReq>,
) -> Result<impl IntoResponse, AppError> {
    let conn = &mut state
        .db_pool
        .get()
        .await
        .context("Failed to obtain a DB connection pool")?;

    selectable_category(conn, ProductKind::Notebook, body.category_id).await?;

    let notebook: NotebookEntity = diesel::update(notebooks::table.find(id))
        .set(UpdateNotebookEntity {
            category_id: body.category_id,
            title: body.title,
            slug: body.slug,
            description: body.description,
            price: body.price,
            diagonal: body.diagonal,
            display_type: body.display_type,
            processor_freq: body.processor_freq,
            ram: body.ram,
            video: body.video,
            time_without_charge: body.time_without_charge,
        })
        .returning(NotebookEntity::as_returning())
        .get_result(conn)
        .await?;

    Ok(StdResponse {
        data: Some(notebook),
        message: Some("Updated notebook successfully"),
    })
}

/// Delete a notebook.
#[utoipa::path(
    delete,
    path = "/{id}",
    tags = ["Notebooks"],
    params(
        ("id" = i32, Path, description = "Notebook ID to delete")
    ),
    responses(
        (status = 200, description = "Deleted notebook successfully", body = StdResponse<NotebookEntity, String>)
    )
)]
async fn delete_notebook(
    Path(id): Path<i32>,
    State(state): State<AppState>,
) -> Result<impl IntoResponse, AppError> {
    let conn = &mut state
        .db_pool
        .get()
        .await
        .context("Failed to obtain a DB connection pool")?;

    let notebook: NotebookEntity = diesel::delete(notebooks::table.find(id))
        .returning(NotebookEntity::as_returning())
        .get_result(conn)
        .await?;

    Ok(StdResponse {
        data: Some(notebook),
        message: Some("Deleted notebook successfully"),
    })
}

/// Upload the notebook's product image. The upload is cleaned (size ceiling
/// first, then resolution bounds) before anything is written.
#[utoipa::path(
    put,
    path = "/{id}/image",
    tags = ["Notebooks"],
    params(
        ("id" = i32, Path, description = "Notebook ID to attach the image to")
    ),
    responses(
        (status = 200, description = "Uploaded image successfully", body = StdResponse<NotebookEntity, String>),
        (status = 422, description = "Image rejected by validation")
    )
)]
async fn upload_notebook_image(
    Path(id): Path<i32>,
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<impl IntoResponse, AppError> {
    let conn = &mut state
        .db_pool
        .get()
        .await
        .context("Failed to obtain a DB connection pool")?;

    let notebook: NotebookEntity = notebooks::table.find(id).get_result(conn).await?;

    let data = read_image_field(multipart).await?;
    let image_path = store_product_image(
        &state.media_root,
        ProductKind::Notebook,
        &notebook.slug,
        &data,
        notebook.image.as_deref(),
    )
    .await?;

    let notebook: NotebookEntity = diesel::update(notebooks::table.find(id))
        .set(notebooks::image.eq(Some(image_path)))
        .returning(NotebookEntity::as_returning())
        .get_result(conn)
        .await
        .context("Failed to store the image path")?;

    Ok(StdResponse {
        data: Some(notebook),
        message: Some("Uploaded image successfully"),
    })
}
