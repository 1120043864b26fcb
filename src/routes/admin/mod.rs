pub mod categories;
pub mod customers;
pub mod notebooks;
pub mod smartphones;

use anyhow::Context;
use axum::extract::Multipart;
use diesel::{ExpressionMethods, QueryDsl, QueryResult};
use diesel_async::RunQueryDsl;

use crate::{
    admin,
    aliases::{DbConn, DieselError},
    app_error::AppError,
    catalog::{self, ProductKind},
    models::CategoryEntity,
    schema::categories as categories_schema,
};

/// Multipart bodies must clear the 3 MiB image ceiling with room for the
/// form framing, so the transport limit sits above it. Oversized images are
/// rejected by the domain check, not by the transport.
pub(crate) const UPLOAD_BODY_LIMIT: usize = 4 * 1024 * 1024;

/// The categories offered by a product form's selector: only those whose
/// slug is fixed for the kind. An empty result is a valid, empty selector.
pub(crate) async fn category_options(
    conn: &mut DbConn<'_>,
    kind: ProductKind,
) -> Result<Vec<CategoryEntity>, AppError> {
    let options = categories_schema::table
        .filter(categories_schema::slug.eq(admin::category_slug(kind)))
        .get_results(conn)
        .await
        .context("Failed to get category options")?;
    Ok(options)
}

/// Looks up a submitted category and rejects it unless it is selectable for
/// the given product kind.
pub(crate) async fn selectable_category(
    conn: &mut DbConn<'_>,
    kind: ProductKind,
    category_id: i32,
) -> Result<CategoryEntity, AppError> {
    let category: QueryResult<CategoryEntity> =
        categories_schema::table.find(category_id).get_result(conn).await;
    let category = match category {
        Ok(category) => category,
        Err(DieselError::NotFound) => {
            return Err(AppError::BadRequest(format!(
                "Category {category_id} does not exist"
            )));
        }
        Err(err) => return Err(AppError::Other(err.into())),
    };

    if !admin::category_selectable(kind, &category.slug) {
        return Err(AppError::BadRequest(format!(
            "Category `{}` is not selectable for {}s",
            category.slug, kind
        )));
    }
    Ok(category)
}

/// Pulls the `image` part out of a multipart upload.
pub(crate) async fn read_image_field(mut multipart: Multipart) -> Result<Vec<u8>, AppError> {
    let mut upload = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|err| AppError::BadRequest(format!("Malformed multipart body: {err}")))?
    {
        if field.name() == Some("image") {
            let data = field
                .bytes()
                .await
                .map_err(|err| AppError::BadRequest(format!("Failed to read image field: {err}")))?;
            upload = Some(data.to_vec());
        }
    }
    upload.ok_or_else(|| AppError::BadRequest("Missing `image` form field".into()))
}

/// Cleans an uploaded product image and writes it below the media root.
/// Returns the relative path stored on the product row. The file recorded
/// under `previous` is removed once the replacement differs from it, so a
/// format change does not strand the old file in the media directory.
pub(crate) async fn store_product_image(
    media_root: &std::path::Path,
    kind: ProductKind,
    slug: &str,
    data: &[u8],
    previous: Option<&str>,
) -> Result<String, AppError> {
    catalog::images::clean_upload(data).map_err(|err| AppError::FormValidation {
        field: "image",
        message: err.to_string(),
    })?;
    let ext = catalog::images::file_extension(data)
        .ok_or_else(|| AppError::BadRequest("Unsupported image format".into()))?;

    let dir = media_root.join(kind.as_str());
    tokio::fs::create_dir_all(&dir)
        .await
        .context("Failed to create the media directory")?;
    let filename = format!("{slug}.{ext}");
    tokio::fs::write(dir.join(&filename), data)
        .await
        .context("Failed to write the image file")?;
    let stored = format!("{}/{filename}", kind.as_str());

    if let Some(previous) = previous.filter(|previous| *previous != stored) {
        if let Err(err) = tokio::fs::remove_file(media_root.join(previous)).await {
            if err.kind() != std::io::ErrorKind::NotFound {
                tracing::warn!("Failed to remove the replaced image {previous}: {err}");
            }
        }
    }

    Ok(stored)
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Minimal PNG header carrying the given dimensions. `imagesize` only
    /// inspects the signature and the IHDR chunk.
    fn png_bytes(width: u32, height: u32) -> Vec<u8> {
        let mut data = vec![0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];
        data.extend_from_slice(&13u32.to_be_bytes());
        data.extend_from_slice(b"IHDR");
        data.extend_from_slice(&width.to_be_bytes());
        data.extend_from_slice(&height.to_be_bytes());
        data.extend_from_slice(&[8, 2, 0, 0, 0]);
        data.extend_from_slice(&[0; 4]);
        data
    }

    #[tokio::test]
    async fn replacing_an_image_removes_the_previous_file() {
        let media_root =
            std::env::temp_dir().join(format!("storefront-media-{}", std::process::id()));
        let dir = media_root.join("smartphone");
        tokio::fs::create_dir_all(&dir).await.unwrap();
        tokio::fs::write(dir.join("phone.jpg"), b"old upload")
            .await
            .unwrap();

        let stored = store_product_image(
            &media_root,
            ProductKind::Smartphone,
            "phone",
            &png_bytes(640, 480),
            Some("smartphone/phone.jpg"),
        )
        .await
        .unwrap();

        assert_eq!(stored, "smartphone/phone.png");
        assert!(dir.join("phone.png").exists());
        assert!(!dir.join("phone.jpg").exists());

        tokio::fs::remove_dir_all(&media_root).await.unwrap();
    }
}
