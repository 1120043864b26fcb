pub mod images;
pub mod latest;

use std::fmt;
use std::str::FromStr;

use anyhow::Result;
use diesel::{QueryDsl, QueryResult};
use diesel_async::RunQueryDsl;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::{
    aliases::{DbConn, DieselError},
    models::{NotebookEntity, SmartphoneEntity},
    schema::{notebooks, smartphones},
};

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
#[error("unknown product kind: {0}")]
pub struct UnknownProductKind(String);

/// The closed set of concrete product types sold by the store.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum ProductKind {
    Notebook,
    Smartphone,
}

impl ProductKind {
    pub const ALL: [ProductKind; 2] = [ProductKind::Notebook, ProductKind::Smartphone];

    pub fn as_str(&self) -> &'static str {
        match self {
            ProductKind::Notebook => "notebook",
            ProductKind::Smartphone => "smartphone",
        }
    }
}

impl fmt::Display for ProductKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProductKind {
    type Err = UnknownProductKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "notebook" => Ok(ProductKind::Notebook),
            "smartphone" => Ok(ProductKind::Smartphone),
            other => Err(UnknownProductKind(other.to_string())),
        }
    }
}

/// Uniform view over the concrete product tables, used by the latest-products
/// aggregator and cart price resolution.
#[derive(Serialize, Debug, Clone, PartialEq, ToSchema)]
pub struct ProductCard {
    pub kind: ProductKind,
    pub id: i32,
    pub category_id: i32,
    pub title: String,
    pub slug: String,
    pub image: Option<String>,
    pub price: Decimal,
}

impl From<NotebookEntity> for ProductCard {
    fn from(entity: NotebookEntity) -> Self {
        Self {
            kind: ProductKind::Notebook,
            id: entity.id,
            category_id: entity.category_id,
            title: entity.title,
            slug: entity.slug,
            image: entity.image,
            price: entity.price,
        }
    }
}

impl From<SmartphoneEntity> for ProductCard {
    fn from(entity: SmartphoneEntity) -> Self {
        Self {
            kind: ProductKind::Smartphone,
            id: entity.id,
            category_id: entity.category_id,
            title: entity.title,
            slug: entity.slug,
            image: entity.image,
            price: entity.price,
        }
    }
}

/// A `(kind, id)` reference to a row in one of the concrete product tables.
#[derive(Deserialize, Debug, Clone, Copy, ToSchema)]
pub struct ProductRef {
    pub kind: ProductKind,
    pub product_id: i32,
}

impl ProductRef {
    /// Resolves the reference against the table its kind names. A dangling
    /// reference yields `Ok(None)` so callers can decide how to report it.
    pub async fn resolve(&self, conn: &mut DbConn<'_>) -> Result<Option<ProductCard>> {
        match self.kind {
            ProductKind::Notebook => {
                let row: QueryResult<NotebookEntity> =
                    notebooks::table.find(self.product_id).get_result(conn).await;
                match row {
                    Ok(row) => Ok(Some(row.into())),
                    Err(DieselError::NotFound) => Ok(None),
                    Err(err) => Err(err.into()),
                }
            }
            ProductKind::Smartphone => {
                let row: QueryResult<SmartphoneEntity> = smartphones::table
                    .find(self.product_id)
                    .get_result(conn)
                    .await;
                match row {
                    Ok(row) => Ok(Some(row.into())),
                    Err(DieselError::NotFound) => Ok(None),
                    Err(err) => Err(err.into()),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn product_kind_round_trips_through_its_name() {
        for kind in ProductKind::ALL {
            assert_eq!(kind.as_str().parse::<ProductKind>(), Ok(kind));
        }
    }

    #[test]
    fn unknown_product_kind_is_rejected() {
        assert_eq!(
            "toaster".parse::<ProductKind>(),
            Err(UnknownProductKind("toaster".to_string()))
        );
    }
}
