//! Form behavior for the admin CRUD surface: the fixed category selector per
//! product kind, and the conditional handling of the smartphone removable
//! storage fields.

use crate::catalog::ProductKind;

/// Slug of the only category selectable for a product kind in the admin forms.
pub fn category_slug(kind: ProductKind) -> &'static str {
    match kind {
        ProductKind::Notebook => "notebooks",
        ProductKind::Smartphone => "smartphones",
    }
}

/// Whether a category may be attached to a product of the given kind.
pub fn category_selectable(kind: ProductKind, slug: &str) -> bool {
    slug == category_slug(kind)
}

/// State of the smartphone admin form. Editing carries the stored removable
/// storage flag; a form for a new row has no stored flag to consult.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SmartphoneFormState {
    Creating,
    Editing { removable_storage: bool },
}

impl SmartphoneFormState {
    /// Fields rendered read-only for this form state. The create form leaves
    /// everything editable.
    pub fn readonly_fields(&self) -> &'static [&'static str] {
        match self {
            SmartphoneFormState::Editing {
                removable_storage: false,
            } => &["sd_volume_max"],
            _ => &[],
        }
    }
}

/// Discards the submitted max storage volume when the smartphone has no
/// removable storage slot, whatever the client sent.
pub fn clean_sd_volume_max(sd: bool, sd_volume_max: Option<String>) -> Option<String> {
    if sd { sd_volume_max } else { None }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn each_kind_selects_only_its_own_category() {
        assert!(category_selectable(ProductKind::Notebook, "notebooks"));
        assert!(!category_selectable(ProductKind::Notebook, "smartphones"));
        assert!(category_selectable(ProductKind::Smartphone, "smartphones"));
        assert!(!category_selectable(ProductKind::Smartphone, "accessories"));
    }

    #[test]
    fn sd_volume_is_readonly_only_when_editing_without_removable_storage() {
        assert_eq!(
            SmartphoneFormState::Editing {
                removable_storage: false
            }
            .readonly_fields(),
            &["sd_volume_max"]
        );
        assert!(
            SmartphoneFormState::Editing {
                removable_storage: true
            }
            .readonly_fields()
            .is_empty()
        );
        assert!(SmartphoneFormState::Creating.readonly_fields().is_empty());
    }

    #[test]
    fn sd_volume_is_discarded_without_removable_storage() {
        assert_eq!(clean_sd_volume_max(false, Some("256 GB".to_string())), None);
        assert_eq!(clean_sd_volume_max(false, None), None);
        assert_eq!(
            clean_sd_volume_max(true, Some("256 GB".to_string())),
            Some("256 GB".to_string())
        );
    }
}
