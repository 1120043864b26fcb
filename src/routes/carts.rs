use anyhow::Context;
use axum::{
    Json,
    extract::{Path, Query, State},
    response::IntoResponse,
};
use diesel::{ExpressionMethods, QueryDsl, QueryResult, SelectableHelper};
use diesel_async::{AsyncConnection, RunQueryDsl};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use utoipa_axum::router::OpenApiRouter;

use crate::{
    aliases::{DbConn, DieselError},
    app_error::{AppError, StdResponse},
    app_state::AppState,
    catalog::{ProductKind, ProductRef},
    models::{CartEntity, CartProductEntity, CreateCartEntity, CreateCartProductEntity},
    schema::{cart_products, carts, customers},
};

/// Defines the cart routes with OpenAPI specs.
pub fn routes_with_openapi() -> OpenApiRouter<AppState> {
    utoipa_axum::router::OpenApiRouter::new().nest(
        "/carts",
        OpenApiRouter::new()
            .routes(utoipa_axum::routes!(get_carts))
            .routes(utoipa_axum::routes!(create_cart))
            .routes(utoipa_axum::routes!(get_cart))
            .routes(utoipa_axum::routes!(update_cart))
            .routes(utoipa_axum::routes!(delete_cart)),
    )
}

/// Totals recomputed from the cart's line items on every read; nothing is
/// stored on the cart row itself, so they cannot drift out of sync.
#[derive(Serialize, Debug, PartialEq, ToSchema)]
pub struct CartTotals {
    pub total_products: i64,
    pub final_price: Decimal,
}

pub fn cart_totals(items: &[CartProductEntity]) -> CartTotals {
    CartTotals {
        total_products: items.iter().map(|item| i64::from(item.qty)).sum(),
        final_price: items.iter().map(|item| item.final_price).sum(),
    }
}

#[derive(Deserialize, ToSchema)]
struct GetCartsQuery {
    /// Restrict the listing to one customer's carts.
    customer_id: Option<i32>,
}

/// Fetch all carts, optionally for a single customer.
#[utoipa::path(
    get,
    path = "/",
    tags = ["Carts"],
    params(
        ("customer_id" = Option<i32>, Query, description = "Customer to list carts for")
    ),
    responses(
        (status = 200, description = "List carts", body = StdResponse<Vec<CartEntity>, String>)
    )
)]
async fn get_carts(
    Query(query): Query<GetCartsQuery>,
    State(state): State<AppState>,
) -> Result<impl IntoResponse, AppError> {
    let conn = &mut state
        .db_pool
        .get()
        .await
        .context("Failed to obtain a DB connection pool")?;

    let mut carts_query = carts::table.into_boxed();
    if let Some(customer_id) = query.customer_id {
        carts_query = carts_query.filter(carts::customer_id.eq(customer_id));
    }

    let carts: Vec<CartEntity> = carts_query
        .get_results(conn)
        .await
        .context("Failed to get carts")?;

    Ok(StdResponse {
        data: Some(carts),
        message: Some("Get carts successfully"),
    })
}

#[derive(Serialize, ToSchema)]
struct GetCartRes {
    cart: CartEntity,
    cart_products: Vec<CartProductEntity>,
    totals: CartTotals,
}

/// Fetch a specific cart with its line items and recomputed totals.
#[utoipa::path(
    get,
    path = "/{id}",
    tags = ["Carts"],
    params(
        ("id" = i32, Path, description = "Cart ID to fetch")
    ),
    responses(
        (status = 200, description = "Get cart successfully", body = StdResponse<GetCartRes, String>)
    )
)]
async fn get_cart(
    Path(id): Path<i32>,
    State(state): State<AppState>,
) -> Result<impl IntoResponse, AppError> {
    let conn = &mut state
        .db_pool
        .get()
        .await
        .context("Failed to obtain a DB connection pool")?;

    let cart: QueryResult<CartEntity> = carts::table.find(id).get_result(conn).await;

    if let Err(err) = cart {
        match err {
            DieselError::NotFound => return Err(AppError::NotFound),
            _ => return Err(AppError::Other(err.into())),
        }
    }

    let cart = cart.unwrap();

    let cart_products: Vec<CartProductEntity> = cart_products::table
        .filter(cart_products::cart_id.eq(cart.id))
        .get_results(conn)
        .await
        .context("Failed to get cart products")?;

    let totals = cart_totals(&cart_products);

    Ok(StdResponse {
        data: Some(GetCartRes {
            cart,
            cart_products,
            totals,
        }),
        message: Some("Get cart successfully"),
    })
}

#[derive(Deserialize, Debug, PartialEq, Eq, ToSchema)]
struct CartProductReq {
    kind: ProductKind,
    product_id: i32,
    qty: i32,
}

/// Collapses a submitted line-item list to one entry per product reference,
/// summing quantities. Entries with a quantity below 1 are dropped. The
/// line-item table keeps one row per `(cart, kind, product)`, so duplicates
/// must be merged before insertion.
fn merge_product_refs(items: Vec<CartProductReq>) -> Vec<CartProductReq> {
    let mut merged: Vec<CartProductReq> = Vec::new();
    for item in items.into_iter().filter(|item| item.qty >= 1) {
        match merged
            .iter_mut()
            .find(|line| line.kind == item.kind && line.product_id == item.product_id)
        {
            Some(line) => line.qty += item.qty,
            None => merged.push(item),
        }
    }
    merged
}

#[derive(Deserialize, ToSchema)]
struct CreateCartReq {
    customer_id: i32,
    cart_products: Vec<CartProductReq>,
}

#[derive(Serialize, ToSchema)]
struct CreateCartRes {
    cart: CartEntity,
    cart_products: Vec<CartProductEntity>,
    totals: CartTotals,
}

/// Builds insertable line items for a cart, resolving every polymorphic
/// product reference and pricing the line as unit price times quantity.
async fn build_cart_products(
    conn: &mut DbConn<'_>,
    customer_id: i32,
    cart_id: i32,
    items: Vec<CartProductReq>,
) -> Result<Vec<CreateCartProductEntity>, AppError> {
    let mut new_items = Vec::new();
    for item in merge_product_refs(items) {
        let reference = ProductRef {
            kind: item.kind,
            product_id: item.product_id,
        };
        let product = reference.resolve(conn).await?.ok_or_else(|| {
            AppError::BadRequest(format!(
                "Unknown product: {} #{}",
                item.kind, item.product_id
            ))
        })?;

        new_items.push(CreateCartProductEntity {
            customer_id,
            cart_id,
            product_kind: item.kind.as_str().to_string(),
            product_id: item.product_id,
            qty: item.qty,
            final_price: product.price * Decimal::from(item.qty),
        });
    }
    Ok(new_items)
}

/// Create a new cart with its line items for a customer.
#[utoipa::path(
    post,
    path = "/",
    tags = ["Carts"],
    request_body = CreateCartReq,
    responses(
        (status = 200, description = "Created cart successfully", body = StdResponse<CreateCartRes, String>)
    )
)]
async fn create_cart(
    State(state): State<AppState>,
    Json(body): Json<CreateCartReq>,
) -> Result<impl IntoResponse, AppError> {
    let conn = &mut state
        .db_pool
        .get()
        .await
        .context("Failed to obtain a DB connection pool")?;

    let (cart, cart_products) = conn
        .transaction(move |tx| {
            Box::pin(async move {
                let customer_count: i64 = customers::table
                    .find(body.customer_id)
                    .count()
                    .get_result(tx)
                    .await
                    .context("Failed to count customers")?;
                if customer_count == 0 {
                    return Err(AppError::BadRequest(format!(
                        "Customer {} does not exist",
                        body.customer_id
                    )));
                }

                let cart: CartEntity = diesel::insert_into(carts::table)
                    .values(CreateCartEntity {
                        customer_id: body.customer_id,
                    })
                    .returning(CartEntity::as_returning())
                    .get_result(tx)
                    .await
                    .context("Failed to create cart")?;

                let new_items =
                    build_cart_products(tx, body.customer_id, cart.id, body.cart_products).await?;

                let cart_products = diesel::insert_into(cart_products::table)
                    .values(new_items)
                    .returning(CartProductEntity::as_returning())
                    .get_results(tx)
                    .await
                    .context("Failed to create cart products")?;

                Ok::<(CartEntity, Vec<CartProductEntity>), AppError>((cart, cart_products))
            })
        })
        .await?;

    let totals = cart_totals(&cart_products);

    Ok(StdResponse {
        data: Some(CreateCartRes {
            cart,
            cart_products,
            totals,
        }),
        message: Some("Created cart successfully"),
    })
}

#[derive(Deserialize, ToSchema)]
struct UpdateCartReq {
    cart_products: Vec<CartProductReq>,
}

#[derive(Serialize, ToSchema)]
struct UpdateCartRes {
    updated_cart: CartEntity,
    cart_products: Vec<CartProductEntity>,
    totals: CartTotals,
}

/// Replace a cart's line items and touch its `updated_at`.
#[utoipa::path(
    patch,
    path = "/{id}",
    tags = ["Carts"],
    params(
        ("id" = i32, Path, description = "Cart ID to update")
    ),
    request_body = UpdateCartReq,
    responses(
        (status = 200, description = "Updated cart successfully", body = StdResponse<UpdateCartRes, String>)
    )
)]
async fn update_cart(
    Path(id): Path<i32>,
    State(state): State<AppState>,
    Json(body): Json<UpdateCartReq>,
) -> Result<impl IntoResponse, AppError> {
    let conn = &mut state
        .db_pool
        .get()
        .await
        .context("Failed to obtain a DB connection pool")?;

    let (updated_cart, cart_products) = conn
        .transaction(move |tx| {
            Box::pin(async move {
                let cart: CartEntity = carts::table
                    .find(id)
                    .get_result(tx)
                    .await
                    .map_err(|_| AppError::NotFound)?;

                diesel::delete(cart_products::table.filter(cart_products::cart_id.eq(id)))
                    .execute(tx)
                    .await
                    .context("Failed to delete cart products")?;

                let new_items =
                    build_cart_products(tx, cart.customer_id, cart.id, body.cart_products).await?;

                let cart_products = diesel::insert_into(cart_products::table)
                    .values(new_items)
                    .returning(CartProductEntity::as_returning())
                    .get_results(tx)
                    .await
                    .context("Failed to create cart products")?;

                let updated_cart = diesel::update(carts::table.find(id))
                    .set(carts::updated_at.eq(diesel::dsl::now))
                    .returning(CartEntity::as_returning())
                    .get_result(tx)
                    .await
                    .context("Failed to update cart timestamp")?;

                Ok::<(CartEntity, Vec<CartProductEntity>), AppError>((updated_cart, cart_products))
            })
        })
        .await?;

    let totals = cart_totals(&cart_products);

    Ok(StdResponse {
        data: Some(UpdateCartRes {
            updated_cart,
            cart_products,
            totals,
        }),
        message: Some("Updated cart successfully"),
    })
}

/// Delete a cart along with its line items.
#[utoipa::path(
    delete,
    path = "/{id}",
    tags = ["Carts"],
    params(
        ("id" = i32, Path, description = "Cart ID to delete")
    ),
    responses(
        (status = 200, description = "Deleted cart successfully", body = StdResponse<CartEntity, String>)
    )
)]
async fn delete_cart(
    Path(id): Path<i32>,
    State(state): State<AppState>,
) -> Result<impl IntoResponse, AppError> {
    let conn = &mut state
        .db_pool
        .get()
        .await
        .context("Failed to obtain a DB connection pool")?;

    let cart: QueryResult<CartEntity> = diesel::delete(carts::table.find(id))
        .returning(CartEntity::as_returning())
        .get_result(conn)
        .await;

    match cart {
        Ok(cart) => Ok(StdResponse {
            data: Some(cart),
            message: Some("Deleted cart successfully"),
        }),
        Err(err) => match err {
            DieselError::NotFound => Err(AppError::NotFound),
            _ => Err(AppError::Other(err.into())),
        },
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;

    fn item(qty: i32, final_price: Decimal) -> CartProductEntity {
        CartProductEntity {
            id: 1,
            customer_id: 1,
            cart_id: 1,
            product_kind: "notebook".to_string(),
            product_id: 1,
            qty,
            final_price,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn totals_sum_quantities_and_line_prices() {
        let items = vec![
            item(2, Decimal::new(2_599_98, 2)),
            item(1, Decimal::new(899_99, 2)),
        ];
        assert_eq!(
            cart_totals(&items),
            CartTotals {
                total_products: 3,
                final_price: Decimal::new(3_499_97, 2),
            }
        );
    }

    fn reference(kind: ProductKind, product_id: i32, qty: i32) -> CartProductReq {
        CartProductReq {
            kind,
            product_id,
            qty,
        }
    }

    #[test]
    fn duplicate_product_refs_are_merged_by_summing_quantities() {
        let merged = merge_product_refs(vec![
            reference(ProductKind::Notebook, 7, 2),
            reference(ProductKind::Smartphone, 7, 1),
            reference(ProductKind::Notebook, 7, 3),
        ]);
        assert_eq!(
            merged,
            vec![
                reference(ProductKind::Notebook, 7, 5),
                reference(ProductKind::Smartphone, 7, 1),
            ]
        );
    }

    #[test]
    fn refs_with_a_quantity_below_one_are_dropped() {
        let merged = merge_product_refs(vec![
            reference(ProductKind::Notebook, 1, 0),
            reference(ProductKind::Smartphone, 2, -4),
            reference(ProductKind::Smartphone, 3, 1),
        ]);
        assert_eq!(merged, vec![reference(ProductKind::Smartphone, 3, 1)]);
    }

    #[test]
    fn totals_of_an_empty_cart_are_zero() {
        assert_eq!(
            cart_totals(&[]),
            CartTotals {
                total_products: 0,
                final_price: Decimal::ZERO,
            }
        );
    }
}
