//! Error types shared across the scrollwork crates

use thiserror::Error;

use crate::dom::NodeId;

/// Errors raised while building or interpreting animation descriptors.
///
/// Runtime paths (registration against a missing node, removing a listener
/// twice) never surface these; they log and no-op instead.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ScrollworkError {
    /// A referenced node is not in the tree
    #[error("node {0:?} does not exist")]
    MissingTarget(NodeId),

    /// A scroll offset such as `"top 80%"` could not be parsed
    #[error("invalid scroll offset: {0:?}")]
    InvalidOffset(String),

    /// A timeline position such as `"-=0.4"` could not be parsed
    #[error("invalid timeline position: {0:?}")]
    InvalidPosition(String),

    /// An easing identifier was not recognized
    #[error("unknown easing: {0:?}")]
    InvalidEasing(String),

    /// A toggle-actions string was not four known actions
    #[error("invalid toggle actions: {0:?}")]
    InvalidToggleActions(String),

    /// A color scheme name was not recognized
    #[error("unknown color scheme: {0:?}")]
    InvalidScheme(String),

    /// A page descriptor was malformed
    #[error("invalid page descriptor: {0}")]
    Descriptor(String),

    /// The section has already been torn down or never existed
    #[error("section is not mounted")]
    UnknownSection,
}

/// Result type for scrollwork operations
pub type Result<T> = std::result::Result<T, ScrollworkError>;
