use anyhow::Context;
use axum::{
    Json,
    extract::{Path, State},
    response::IntoResponse,
};
use diesel::{QueryDsl, QueryResult, SelectableHelper};
use diesel::result::DatabaseErrorKind;
use diesel_async::RunQueryDsl;
use serde::Deserialize;
use utoipa::ToSchema;
use utoipa_axum::router::OpenApiRouter;

use crate::{
    aliases::DieselError,
    app_error::{AppError, StdResponse},
    app_state::AppState,
    models::{CategoryEntity, CreateCategoryEntity, UpdateCategoryEntity},
    schema::categories,
};

/// Defines the admin category routes with OpenAPI specs.
pub fn routes_with_openapi() -> OpenApiRouter<AppState> {
    utoipa_axum::router::OpenApiRouter::new().nest(
        "/admin/categories",
        OpenApiRouter::new()
            .routes(utoipa_axum::routes!(get_categories))
            .routes(utoipa_axum::routes!(create_category))
            .routes(utoipa_axum::routes!(get_category))
            .routes(utoipa_axum::routes!(update_category))
            .routes(utoipa_axum::routes!(delete_category)),
    )
}

/// Fetch all categories.
#[utoipa::path(
    get,
    path = "/",
    tags = ["Categories"],
    responses(
        (status = 200, description = "List all categories", body = StdResponse<Vec<CategoryEntity>, String>)
    )
)]
async fn get_categories(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let conn = &mut state
        .db_pool
        .get()
        .await
        .context("Failed to obtain a DB connection pool")?;

    let categories: Vec<CategoryEntity> = categories::table
        .get_results(conn)
        .await
        .context("Failed to get categories")?;

    Ok(StdResponse {
        data: Some(categories),
        message: Some("Get categories successfully"),
    })
}

/// Fetch a specific category.
#[utoipa::path(
    get,
    path = "/{id}",
    tags = ["Categories"],
    params(
        ("id" = i32, Path, description = "Category ID to fetch")
    ),
    responses(
        (status = 200, description = "Get category successfully", body = StdResponse<CategoryEntity, String>)
    )
)]
async fn get_category(
    Path(id): Path<i32>,
    State(state): State<AppState>,
) -> Result<impl IntoResponse, AppError> {
    let conn = &mut state
        .db_pool
        .get()
        .await
        .context("Failed to obtain a DB connection pool")?;

    let category: CategoryEntity = categories::table.find(id).get_result(conn).await?;

    Ok(StdResponse {
        data: Some(category),
        message: Some("Get category successfully"),
    })
}

#[derive(Deserialize, ToSchema)]
struct CreateCategoryReq {
    name: String,
    slug: String,
}

/// Create a new category. Slugs are globally unique.
#[utoipa::path(
    post,
    path = "/",
    tags = ["Categories"],
    request_body = CreateCategoryReq,
    responses(
        (status = 200, description = "Created category successfully", body = StdResponse<CategoryEntity, String>)
    )
)]
async fn create_category(
    State(state): State<AppState>,
    Json(body): Json<CreateCategoryReq>,
) -> Result<impl IntoResponse, AppError> {
    let conn = &mut state
        .db_pool
        .get()
        .await
        .context("Failed to obtain a DB connection pool")?;

    let category: QueryResult<CategoryEntity> = diesel::insert_into(categories::table)
        .values(CreateCategoryEntity {
            name: body.name,
            slug: body.slug,
        })
        .returning(CategoryEntity::as_returning())
        .get_result(conn)
        .await;

    match category {
        Ok(category) => Ok(StdResponse {
            data: Some(category),
            message: Some("Created category successfully"),
        }),
        Err(DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _)) => Err(
            AppError::BadRequest("A category with this slug already exists".into()),
        ),
        Err(err) => Err(AppError::Other(err.into())),
    }
}

#[derive(Deserialize, ToSchema)]
struct UpdateCategoryReq {
    name: String,
    slug: String,
}

/// Update a category's name and slug. The slug must stay globally unique.
#[utoipa::path(
    patch,
    path = "/{id}",
    tags = ["Categories"],
    params(
        ("id" = i32, Path, description = "Category ID to update")
    ),
    request_body = UpdateCategoryReq,
    responses(
        (status = 200, description = "Updated category successfully", body = StdResponse<CategoryEntity, String>)
    )
)]
async fn update_category(
    Path(id): Path<i32>,
    State(state): State<AppState>,
    Json(body): Json<UpdateCategoryReq>,
) -> Result<impl IntoResponse, AppError> {
    let conn = &mut state
        .db_pool
        .get()
        .await
        .context("Failed to obtain a DB connection pool")?;

    let category: QueryResult<CategoryEntity> = diesel::update(categories::table.find(id))
        .set(UpdateCategoryEntity {
            name: body.name,
            slug: body.slug,
        })
        .returning(CategoryEntity::as_returning())
        .get_result(conn)
        .await;

    match category {
        Ok(category) => Ok(StdResponse {
            data: Some(category),
            message: Some("Updated category successfully"),
        }),
        Err(DieselError::NotFound) => Err(AppError::NotFound),
        Err(DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _)) => Err(
            AppError::BadRequest("A category with this slug already exists".into()),
        ),
        Err(err) => Err(AppError::Other(err.into())),
    }
}

/// Delete a category. Products in it are removed with it.
#[utoipa::path(
    delete,
    path = "/{id}",
    tags = ["Categories"],
    params(
        ("id" = i32, Path, description = "Category ID to delete")
    ),
    responses(
        (status = 200, description = "Deleted category successfully", body = StdResponse<CategoryEntity, String>)
    )
)]
async fn delete_category(
    Path(id): Path<i32>,
    State(state): State<AppState>,
) -> Result<impl IntoResponse, AppError> {
    let conn = &mut state
        .db_pool
        .get()
        .await
        .context("Failed to obtain a DB connection pool")?;

    let category: CategoryEntity = diesel::delete(categories::table.find(id))
        .returning(CategoryEntity::as_returning())
        .get_result(conn)
        .await?;

    Ok(StdResponse {
        data: Some(category),
        message: Some("Deleted category successfully"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn categories_expose_the_full_crud_surface() {
        let openapi = routes_with_openapi().get_openapi().clone();
        let item = openapi
            .paths
            .paths
            .get("/admin/categories/{id}")
            .expect("item routes mounted");
        assert!(item.get.is_some());
        assert!(item.patch.is_some());
        assert!(item.delete.is_some());
    }
}
