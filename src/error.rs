//! Error types for tola-reconcile.
//!
//! Everything in here is fatal: it signals a caller bug (a detached tree,
//! a tag the target cannot build, a handle the target never issued) and is
//! propagated out of the render call rather than swallowed.

use compact_str::CompactString;
use thiserror::Error;

/// Errors that can occur while materializing, reconciling or patching.
#[derive(Debug, Error)]
pub enum RenderError {
    /// A materialized node has no parent container to patch against
    #[error("node output is detached: {0}")]
    Detached(&'static str),

    /// Insert target cannot hold children (e.g. a text handle)
    #[error("insert target is not a container")]
    NotAContainer,

    /// The target does not know how to create this element
    #[error("unknown element tag: <{0}>")]
    UnknownTag(CompactString),

    /// The target was handed a handle it never issued
    #[error("unknown handle: {0}")]
    UnknownHandle(String),

    /// A node reached the reconciler before it was ever materialized
    #[error("{0} node has no output; it was never materialized")]
    Unmaterialized(&'static str),

    /// A root render was requested from inside a render pass
    #[error("render requested while a render pass is running")]
    Reentrant,
}

/// Result type alias for render operations.
pub type RenderResult<T> = Result<T, RenderError>;

impl RenderError {
    /// Create an unknown-tag error.
    pub fn unknown_tag(tag: impl Into<CompactString>) -> Self {
        Self::UnknownTag(tag.into())
    }

    /// Create an unknown-handle error from any debuggable handle.
    pub fn unknown_handle(handle: &impl std::fmt::Debug) -> Self {
        Self::UnknownHandle(format!("{handle:?}"))
    }
}
