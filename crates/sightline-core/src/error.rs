//! Error taxonomy for viewpoint operations

use thiserror::Error;

use crate::viewpoint::ViewpointId;

/// Errors reported by the registry, the director and the easing catalog.
///
/// Geometry problems (an anchor object that no longer resolves) are not
/// errors: frame conversion degrades to world space instead.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ViewpointError {
    /// No viewpoint with this id exists in any bucket
    #[error("viewpoint not found: {0}")]
    NotFound(ViewpointId),

    /// Easing name is malformed or not in the catalog
    #[error("invalid easing name: {0:?}")]
    InvalidEasingName(String),

    /// A snapshot could not be restored
    #[error("invalid snapshot: {0}")]
    Snapshot(String),
}

pub type Result<T, E = ViewpointError> = std::result::Result<T, E>;
