use chrono::{DateTime, Utc};
use diesel::{
    Selectable,
    prelude::{AsChangeset, Identifiable, Insertable, Queryable},
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

// Categories

#[derive(Queryable, Selectable, Identifiable, Serialize, Debug, Clone, ToSchema)]
#[diesel(table_name = crate::schema::categories)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct CategoryEntity {
    pub id: i32,
    pub name: String,
    pub slug: String,
}

#[derive(Insertable, Deserialize, Debug)]
#[diesel(table_name = crate::schema::categories)]
pub struct CreateCategoryEntity {
    pub name: String,
    pub slug: String,
}

#[derive(AsChangeset, Debug)]
#[diesel(table_name = crate::schema::categories)]
pub struct UpdateCategoryEntity {
    pub name: String,
    pub slug: String,
}

// Notebooks

#[derive(Queryable, Selectable, Identifiable, Serialize, Debug, Clone, ToSchema)]
#[diesel(table_name = crate::schema::notebooks)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct NotebookEntity {
    pub id: i32,
    pub category_id: i32,
    pub title: String,
    pub slug: String,
    pub image: Option<String>,
    pub description: Option<String>,
    pub price: Decimal,
    pub diagonal: String,
    pub display_type: String,
    pub processor_freq: String,
    pub ram: String,
    pub video: String,
    pub time_without_charge: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Insertable, Debug)]
#[diesel(table_name = crate::schema::notebooks)]
pub struct CreateNotebookEntity {
    pub category_id: i32,
    pub title: String,
    pub slug: String,
    pub description: Option<String>,
    pub price: Decimal,
    pub diagonal: String,
    pub display_type: String,
    pub processor_freq: String,
    pub ram: String,
    pub video: String,
    pub time_without_charge: String,
}

#[derive(AsChangeset, Debug)]
#[diesel(table_name = crate::schema::notebooks)]
#[diesel(treat_none_as_null = true)]
pub struct UpdateNotebookEntity {
    pub category_id: i32,
    pub title: String,
    pub slug: String,
    pub description: Option<String>,
    pub price: Decimal,
    pub diagonal: String,
    pub display_type: String,
    pub processor_freq: String,
    pub ram: String,
    pub video: String,
    pub time_without_charge: String,
}

// Smartphones

#[derive(Queryable, Selectable, Identifiable, Serialize, Debug, Clone, ToSchema)]
#[diesel(table_name = crate::schema::smartphones)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct SmartphoneEntity {
    pub id: i32,
    pub category_id: i32,
    pub title: String,
    pub slug: String,
    pub image: Option<String>,
    pub description: Option<String>,
    pub price: Decimal,
    pub diagonal: String,
    pub display_type: String,
    pub resolution: String,
    pub accum_volume: String,
    pub ram: String,
    pub sd: bool,
    pub sd_volume_max: Option<String>,
    pub main_cam_mp: String,
    pub frontal_cam_mp: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Insertable, Debug)]
#[diesel(table_name = crate::schema::smartphones)]
pub struct CreateSmartphoneEntity {
    pub category_id: i32,
    pub title: String,
    pub slug: String,
    pub description: Option<String>,
    pub price: Decimal,
    pub diagonal: String,
    pub display_type: String,
    pub resolution: String,
    pub accum_volume: String,
    pub ram: String,
    pub sd: bool,
    pub sd_volume_max: Option<String>,
    pub main_cam_mp: String,
    pub frontal_cam_mp: String,
}

/// `treat_none_as_null` matters here: a cleaned `sd_volume_max` of `None`
/// must overwrite whatever value the row held before.
#[derive(AsChangeset, Debug)]
#[diesel(table_name = crate::schema::smartphones)]
#[diesel(treat_none_as_null = true)]
pub struct UpdateSmartphoneEntity {
    pub category_id: i32,
    pub title: String,
    pub slug: String,
    pub description: Option<String>,
    pub price: Decimal,
    pub diagonal: String,
    pub display_type: String,
    pub resolution: String,
    pub accum_volume: String,
    pub ram: String,
    pub sd: bool,
    pub sd_volume_max: Option<String>,
    pub main_cam_mp: String,
    pub frontal_cam_mp: String,
}

// Customers

#[derive(Queryable, Selectable, Identifiable, Serialize, Debug, Clone, ToSchema)]
#[diesel(table_name = crate::schema::customers)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct CustomerEntity {
    pub id: i32,
    pub user_id: i32,
    pub phone: String,
    pub address: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Insertable, Deserialize, Debug)]
#[diesel(table_name = crate::schema::customers)]
pub struct CreateCustomerEntity {
    pub user_id: i32,
    pub phone: String,
    pub address: String,
}

#[derive(AsChangeset, Debug)]
#[diesel(table_name = crate::schema::customers)]
pub struct UpdateCustomerEntity {
    pub phone: String,
    pub address: String,
}

// Carts

#[derive(Queryable, Selectable, Identifiable, Serialize, Debug, Clone, ToSchema)]
#[diesel(table_name = crate::schema::carts)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct CartEntity {
    pub id: i32,
    pub customer_id: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Insertable, Deserialize, Debug)]
#[diesel(table_name = crate::schema::carts)]
pub struct CreateCartEntity {
    pub customer_id: i32,
}

#[derive(Queryable, Selectable, Identifiable, Serialize, Debug, Clone, ToSchema)]
#[diesel(table_name = crate::schema::cart_products)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct CartProductEntity {
    pub id: i32,
    pub customer_id: i32,
    pub cart_id: i32,
    pub product_kind: String,
    pub product_id: i32,
    pub qty: i32,
    pub final_price: Decimal,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Insertable, Debug)]
#[diesel(table_name = crate::schema::cart_products)]
pub struct CreateCartProductEntity {
    pub customer_id: i32,
    pub cart_id: i32,
    pub product_kind: String,
    pub product_id: i32,
    pub qty: i32,
    pub final_price: Decimal,
}
