use anyhow::{Context, Result};
use diesel::{ExpressionMethods, QueryDsl};
use diesel_async::RunQueryDsl;

use crate::{
    aliases::DbConn,
    catalog::{ProductCard, ProductKind},
    models::{NotebookEntity, SmartphoneEntity},
    schema::{notebooks, smartphones},
};

/// How many rows of each kind the main page shows.
pub const LATEST_PER_KIND: i64 = 5;

/// Stably moves cards of the priority kind to the front; each group keeps
/// its original order.
pub fn with_priority(mut products: Vec<ProductCard>, priority: ProductKind) -> Vec<ProductCard> {
    products.sort_by_key(|card| card.kind != priority);
    products
}

/// Fetches the [`LATEST_PER_KIND`] most recent rows (descending id) for every
/// requested kind, concatenated in request order. When `priority` names one
/// of the requested kinds, its cards sort first.
pub async fn latest_products(
    conn: &mut DbConn<'_>,
    kinds: &[ProductKind],
    priority: Option<ProductKind>,
) -> Result<Vec<ProductCard>> {
    let mut products = Vec::new();
    for kind in kinds {
        products.extend(fetch_latest(conn, *kind).await?);
    }

    if let Some(priority) = priority {
        if kinds.contains(&priority) {
            products = with_priority(products, priority);
        }
    }

    Ok(products)
}

async fn fetch_latest(conn: &mut DbConn<'_>, kind: ProductKind) -> Result<Vec<ProductCard>> {
    match kind {
        ProductKind::Notebook => {
            let rows: Vec<NotebookEntity> = notebooks::table
                .order_by(notebooks::id.desc())
                .limit(LATEST_PER_KIND)
                .get_results(conn)
                .await
                .context("Failed to get latest notebooks")?;
            Ok(rows.into_iter().map(ProductCard::from).collect())
        }
        ProductKind::Smartphone => {
            let rows: Vec<SmartphoneEntity> = smartphones::table
                .order_by(smartphones::id.desc())
                .limit(LATEST_PER_KIND)
                .get_results(conn)
                .await
                .context("Failed to get latest smartphones")?;
            Ok(rows.into_iter().map(ProductCard::from).collect())
        }
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;

    use super::*;

    fn card(kind: ProductKind, id: i32) -> ProductCard {
        ProductCard {
            kind,
            id,
            category_id: 1,
            title: format!("{kind} #{id}"),
            slug: format!("{kind}-{id}"),
            image: None,
            price: Decimal::new(99_999, 2),
        }
    }

    #[test]
    fn priority_kind_sorts_first_and_groups_keep_descending_order() {
        let mut products: Vec<ProductCard> = (0..5)
            .map(|n| card(ProductKind::Notebook, 50 - n))
            .collect();
        products.extend((0..5).map(|n| card(ProductKind::Smartphone, 90 - n)));

        let reordered = with_priority(products, ProductKind::Smartphone);

        assert_eq!(reordered.len(), 10);
        let kinds: Vec<ProductKind> = reordered.iter().map(|c| c.kind).collect();
        assert_eq!(kinds[..5], [ProductKind::Smartphone; 5]);
        assert_eq!(kinds[5..], [ProductKind::Notebook; 5]);

        let smartphone_ids: Vec<i32> = reordered[..5].iter().map(|c| c.id).collect();
        assert_eq!(smartphone_ids, vec![90, 89, 88, 87, 86]);
        let notebook_ids: Vec<i32> = reordered[5..].iter().map(|c| c.id).collect();
        assert_eq!(notebook_ids, vec![50, 49, 48, 47, 46]);
    }

    #[test]
    fn priority_on_a_single_kind_list_is_a_no_op() {
        let products: Vec<ProductCard> =
            (0..3).map(|n| card(ProductKind::Notebook, 10 - n)).collect();
        let reordered = with_priority(products.clone(), ProductKind::Notebook);
        assert_eq!(reordered, products);
    }
}
