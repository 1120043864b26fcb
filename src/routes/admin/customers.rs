use anyhow::Context;
use axum::{
    Json,
    extract::{Path, State},
    response::IntoResponse,
};
use diesel::result::DatabaseErrorKind;
use diesel::{QueryDsl, QueryResult, SelectableHelper};
use diesel_async::RunQueryDsl;
use serde::Deserialize;
use utoipa::ToSchema;
use utoipa_axum::router::OpenApiRouter;

use crate::{
    aliases::DieselError,
    app_error::{AppError, StdResponse},
    app_state::AppState,
    models::{CreateCustomerEntity, CustomerEntity, UpdateCustomerEntity},
    schema::customers,
};

/// Defines the admin customer routes with OpenAPI specs.
pub fn routes_with_openapi() -> OpenApiRouter<AppState> {
    utoipa_axum::router::OpenApiRouter::new().nest(
        "/admin/customers",
        OpenApiRouter::new()
            .routes(utoipa_axum::routes!(get_customers))
            .routes(utoipa_axum::routes!(create_customer))
            .routes(utoipa_axum::routes!(get_customer))
            .routes(utoipa_axum::routes!(update_customer))
            .routes(utoipa_axum::routes!(delete_customer)),
    )
}

/// Fetch all customers.
#[utoipa::path(
    get,
    path = "/",
    tags = ["Customers"],
    responses(
        (status = 200, description = "List all customers", body = StdResponse<Vec<CustomerEntity>, String>)
    )
)]
async fn get_customers(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let conn = &mut state
        .db_pool
        .get()
        .await
        .context("Failed to obtain a DB connection pool")?;

    let customers: Vec<CustomerEntity> = customers::table
        .get_results(conn)
        .await
        .context("Failed to get customers")?;

    Ok(StdResponse {
        data: Some(customers),
        message: Some("Get customers successfully"),
    })
}

/// Fetch a specific customer.
#[utoipa::path(
    get,
    path = "/{id}",
    tags = ["Customers"],
    params(
        ("id" = i32, Path, description = "Customer ID to fetch")
    ),
    responses(
        (status = 200, description = "Get customer successfully", body = StdResponse<CustomerEntity, String>)
    )
)]
async fn get_customer(
    Path(id): Path<i32>,
    State(state): State<AppState>,
) -> Result<impl IntoResponse, AppError> {
    let conn = &mut state
        .db_pool
        .get()
        .await
        .context("Failed to obtain a DB connection pool")?;

    let customer: CustomerEntity = customers::table.find(id).get_result(conn).await?;

    Ok(StdResponse {
        data: Some(customer),
        message: Some("Get customer successfully"),
    })
}

#[derive(Deserialize, ToSchema)]
struct CreateCustomerReq {
    /// Identifier of the externally managed user this customer wraps.
    user_id: i32,
    phone: String,
    address: String,
}

/// Create a customer for an external user identity. Each identity may have
/// at most one customer record.
#[utoipa::path(
    post,
    path = "/",
    tags = ["Customers"],
    request_body = CreateCustomerReq,
    responses(
        (status = 200, description = "Created customer successfully", body = StdResponse<CustomerEntity, String>)
    )
)]
async fn create_customer(
    State(state): State<AppState>,
    Json(body): Json<CreateCustomerReq>,
) -> Result<impl IntoResponse, AppError> {
    let conn = &mut state
        .db_pool
        .get()
        .await
        .context("Failed to obtain a DB connection pool")?;

    let customer: QueryResult<CustomerEntity> = diesel::insert_into(customers::table)
        .values(CreateCustomerEntity {
            user_id: body.user_id,
            phone: body.phone,
            address: body.address,
        })
        .returning(CustomerEntity::as_returning())
        .get_result(conn)
        .await;

    match customer {
        Ok(customer) => Ok(StdResponse {
            data: Some(customer),
            message: Some("Created customer successfully"),
        }),
        Err(DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _)) => Err(
            AppError::BadRequest("A customer already exists for this user".into()),
        ),
        Err(err) => Err(AppError::Other(err.into())),
    }
}

#[derive(Deserialize, ToSchema)]
struct UpdateCustomerReq {
    phone: String,
    address: String,
}

/// Update a customer's contact details. The wrapped user identity is fixed.
#[utoipa::path(
    patch,
    path = "/{id}",
    tags = ["Customers"],
    params(
        ("id" = i32, Path, description = "Customer ID to update")
    ),
    request_body = UpdateCustomerReq,
    responses(
        (status = 200, description = "Updated customer successfully", body = StdResponse<CustomerEntity, String>)
    )
)]
async fn update_customer(
    Path(id): Path<i32>,
    State(state): State<AppState>,
    Json(body): Json<UpdateCustomerReq>,
) -> Result<impl IntoResponse, AppError> {
    let conn = &mut state
        .db_pool
        .get()
        .await
        .context("Failed to obtain a DB connection pool")?;

    let customer: CustomerEntity = diesel::update(customers::table.find(id))
        .set(UpdateCustomerEntity {
            phone: body.phone,
            address: body.address,
        })
        .returning(CustomerEntity::as_returning())
        .get_result(conn)
        .await?;

    Ok(StdResponse {
        data: Some(customer),
        message: Some("Updated customer successfully"),
    })
}

/// Delete a customer along with their carts.
#[utoipa::path(
    delete,
    path = "/{id}",
    tags = ["Customers"],
    params(
        ("id" = i32, Path, description = "Customer ID to delete")
    ),
    responses(
        (status = 200, description = "Deleted customer successfully", body = StdResponse<CustomerEntity, String>)
    )
)]
async fn delete_customer(
    Path(id): Path<i32>,
    State(state): State<AppState>,
) -> Result<impl IntoResponse, AppError> {
    let conn = &mut state
        .db_pool
        .get()
        .await
        .context("Failed to obtain a DB connection pool")?;

    let customer: CustomerEntity = diesel::delete(customers::table.find(id))
        .returning(CustomerEntity::as_returning())
        .get_result(conn)
        .await?;

    Ok(StdResponse {
        data: Some(customer),
        message: Some("Deleted customer successfully"),
    })
}
