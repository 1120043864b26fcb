use std::fmt;

use imagesize::{ImageSize, ImageType};

/// Inclusive lower bound on uploaded product image dimensions.
pub const MIN_RESOLUTION: Resolution = Resolution {
    width: 400,
    height: 400,
};

/// Inclusive upper bound on uploaded product image dimensions.
pub const MAX_RESOLUTION: Resolution = Resolution {
    width: 800,
    height: 800,
};

/// Upload size ceiling: 3 MiB.
pub const MAX_IMAGE_SIZE: usize = 3_145_728;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Resolution {
    pub width: usize,
    pub height: usize,
}

impl fmt::Display for Resolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

impl From<ImageSize> for Resolution {
    fn from(size: ImageSize) -> Self {
        Self {
            width: size.width,
            height: size.height,
        }
    }
}

/// Raised when a product image falls outside the allowed resolution bounds.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ResolutionError {
    #[error("image resolution {actual} is below the minimum of {minimum}")]
    BelowMinimum {
        actual: Resolution,
        minimum: Resolution,
    },
    #[error("image resolution {actual} is above the maximum of {maximum}")]
    AboveMaximum {
        actual: Resolution,
        maximum: Resolution,
    },
}

/// Raised while cleaning an uploaded image in the admin form path.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum UploadError {
    #[error("image of {size} bytes exceeds the maximum upload size of {limit} bytes")]
    TooLarge { size: usize, limit: usize },
    #[error("could not determine the image dimensions")]
    Unreadable,
    #[error(transparent)]
    Resolution(#[from] ResolutionError),
}

/// Checks a product image against the resolution bounds. Below-minimum is
/// reported before above-maximum; a dimension matching a bound exactly is
/// allowed.
pub fn validate_resolution(
    actual: Resolution,
    min: Resolution,
    max: Resolution,
) -> Result<(), ResolutionError> {
    if actual.height < min.height || actual.width < min.width {
        return Err(ResolutionError::BelowMinimum {
            actual,
            minimum: min,
        });
    }
    if actual.height > max.height || actual.width > max.width {
        return Err(ResolutionError::AboveMaximum {
            actual,
            maximum: max,
        });
    }
    Ok(())
}

/// Full admin-form cleaning of an uploaded image: the byte-size ceiling is
/// checked before any resolution check, so an oversized upload reports the
/// size error even when its dimensions are also out of bounds.
pub fn clean_upload(data: &[u8]) -> Result<Resolution, UploadError> {
    if data.len() > MAX_IMAGE_SIZE {
        return Err(UploadError::TooLarge {
            size: data.len(),
            limit: MAX_IMAGE_SIZE,
        });
    }

    let resolution: Resolution = imagesize::blob_size(data)
        .map_err(|_| UploadError::Unreadable)?
        .into();
    validate_resolution(resolution, MIN_RESOLUTION, MAX_RESOLUTION)?;
    Ok(resolution)
}

/// File extension for the uploaded bytes, or `None` for formats the store
/// does not accept.
pub fn file_extension(data: &[u8]) -> Option<&'static str> {
    match imagesize::image_type(data) {
        Ok(ImageType::Png) => Some("png"),
        Ok(ImageType::Jpeg) => Some("jpg"),
        Ok(ImageType::Gif) => Some("gif"),
        Ok(ImageType::Webp) => Some("webp"),
        _ => None,
    }
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

    fn res(width: usize, height: usize) -> Resolution {
        Resolution { width, height }
    }

    #[test]
    fn width_below_minimum_is_rejected() {
        assert_eq!(
            validate_resolution(res(399, 500), MIN_RESOLUTION, MAX_RESOLUTION),
            Err(ResolutionError::BelowMinimum {
                actual: res(399, 500),
                minimum: MIN_RESOLUTION,
            })
        );
    }

    #[test]
    fn height_below_minimum_is_rejected() {
        assert!(matches!(
            validate_resolution(res(500, 120), MIN_RESOLUTION, MAX_RESOLUTION),
            Err(ResolutionError::BelowMinimum { .. })
        ));
    }

    #[test]
    fn height_above_maximum_is_rejected() {
        assert_eq!(
            validate_resolution(res(500, 801), MIN_RESOLUTION, MAX_RESOLUTION),
            Err(ResolutionError::AboveMaximum {
                actual: res(500, 801),
                maximum: MAX_RESOLUTION,
            })
        );
    }

    #[test]
    fn bounds_are_inclusive() {
        assert_eq!(
            validate_resolution(res(400, 400), MIN_RESOLUTION, MAX_RESOLUTION),
            Ok(())
        );
        assert_eq!(
            validate_resolution(res(800, 800), MIN_RESOLUTION, MAX_RESOLUTION),
            Ok(())
        );
        assert_eq!(
            validate_resolution(res(640, 480), MIN_RESOLUTION, MAX_RESOLUTION),
            Ok(())
        );
    }

    #[test]
    fn clean_upload_reads_dimensions_from_the_header() {
        assert_eq!(clean_upload(&png_bytes(640, 480)), Ok(res(640, 480)));
    }

    #[test]
    fn clean_upload_rejects_out_of_bounds_images() {
        assert!(matches!(
            clean_upload(&png_bytes(100, 100)),
            Err(UploadError::Resolution(ResolutionError::BelowMinimum { .. }))
        ));
        assert!(matches!(
            clean_upload(&png_bytes(1920, 1080)),
            Err(UploadError::Resolution(ResolutionError::AboveMaximum { .. }))
        ));
    }

    #[test]
    fn size_ceiling_wins_over_resolution_checks() {
        // 100x100 would be below-minimum, but the padded upload is over 3 MiB
        // so the size error must be reported instead.
        let mut data = png_bytes(100, 100);
        data.resize(MAX_IMAGE_SIZE + 1, 0);
        assert_eq!(
            clean_upload(&data),
            Err(UploadError::TooLarge {
                size: MAX_IMAGE_SIZE + 1,
                limit: MAX_IMAGE_SIZE,
            })
        );
    }

    #[test]
    fn unreadable_bytes_are_reported_as_such() {
        assert_eq!(clean_upload(b"not an image"), Err(UploadError::Unreadable));
    }

    #[test]
    fn file_extension_maps_known_formats() {
        assert_eq!(file_extension(&png_bytes(10, 10)), Some("png"));
        assert_eq!(file_extension(b"definitely not an image"), None);
    }
}
