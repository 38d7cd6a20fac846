//! Error types for packing and panel configuration.

use std::fmt;

use crate::item::ItemId;

/// Errors raised by a definitive layout pass or at the configuration boundary.
///
/// Every variant is a contract violation or an internal sizing bug. Moves
/// rejected during a drag are not errors; they surface as
/// [`DragOutcome::Rejected`](crate::DragOutcome::Rejected).
#[derive(Debug, Clone, PartialEq)]
pub enum LayoutError {
    /// Cell width or height is zero, negative, or not finite.
    InvalidCellSize { axis: &'static str, value: f64 },
    /// Drag scale is zero, negative, or not finite.
    InvalidDragScale { value: f64 },
    /// The same item id appears twice in the item list.
    DuplicateItem { id: ItemId },
    /// An item spans more cells along the packed axis than a matrix word can search.
    RegionTooWide { id: ItemId, extent: usize, max: usize },
    /// Item or available sizes need a matrix larger than
    /// [`MAX_MATRIX_WORDS`](crate::MAX_MATRIX_WORDS) words.
    MatrixTooLarge { columns: usize, rows: usize },
    /// First-fit found no room for an item in a pre-sized matrix.
    PlacementFailed {
        id: ItemId,
        index: usize,
        width: usize,
        height: usize,
    },
}

impl fmt::Display for LayoutError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidCellSize { axis, value } => {
                write!(f, "cell {axis} must be positive and finite, got {value}")
            }
            Self::InvalidDragScale { value } => {
                write!(f, "drag scale must be positive and finite, got {value}")
            }
            Self::DuplicateItem { id } => write!(f, "item {} appears more than once", id.get()),
            Self::RegionTooWide { id, extent, max } => write!(
                f,
                "item {} spans {extent} cells along the packed axis (max {max})",
                id.get()
            ),
            Self::MatrixTooLarge { columns, rows } => write!(
                f,
                "a {columns}x{rows} cell matrix exceeds the {} word limit",
                crate::MAX_MATRIX_WORDS
            ),
            Self::PlacementFailed {
                id,
                index,
                width,
                height,
            } => write!(
                f,
                "no free {width}x{height} region for item {} at list index {index}",
                id.get()
            ),
        }
    }
}

impl std::error::Error for LayoutError {}

/// Errors raised while loading a [`PanelConfig`](crate::PanelConfig).
#[derive(Debug)]
pub enum PanelConfigError {
    /// I/O error reading a file.
    Io(std::io::Error),
    /// TOML parse error.
    #[cfg(feature = "panel-config")]
    Toml(toml::de::Error),
    /// JSON parse error.
    #[cfg(feature = "panel-config")]
    Json(serde_json::Error),
    /// Validation errors.
    Validation(Vec<String>),
}

impl fmt::Display for PanelConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(e) => write!(f, "I/O error: {e}"),
            #[cfg(feature = "panel-config")]
            Self::Toml(e) => write!(f, "TOML parse error: {e}"),
            #[cfg(feature = "panel-config")]
            Self::Json(e) => write!(f, "JSON parse error: {e}"),
            Self::Validation(errors) => {
                write!(f, "validation errors: {}", errors.join("; "))
            }
        }
    }
}

impl std::error::Error for PanelConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            #[cfg(feature = "panel-config")]
            Self::Toml(e) => Some(e),
            #[cfg(feature = "panel-config")]
            Self::Json(e) => Some(e),
            Self::Validation(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn layout_error_messages_name_the_item() {
        let id = ItemId::new(7);
        let err = LayoutError::PlacementFailed {
            id,
            index: 3,
            width: 2,
            height: 1,
        };
        assert_eq!(
            err.to_string(),
            "no free 2x1 region for item 7 at list index 3"
        );

        let err = LayoutError::RegionTooWide {
            id,
            extent: 61,
            max: 60,
        };
        assert!(err.to_string().contains("61 cells"));

        let err = LayoutError::MatrixTooLarge {
            columns: 10,
            rows: usize::MAX,
        };
        assert!(err.to_string().starts_with("a 10x"));
    }

    #[test]
    fn validation_error_joins_messages() {
        let err = PanelConfigError::Validation(vec!["a".into(), "b".into()]);
        assert_eq!(err.to_string(), "validation errors: a; b");
        assert!(std::error::Error::source(&err).is_none());
    }
}
