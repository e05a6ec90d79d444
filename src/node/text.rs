//! Text node type
//!
//! Leaf nodes carrying a string. The rendered handle is stamped once, when
//! the node is materialized or adopts the handle of the node it replaces.

use std::cell::OnceCell;

// =============================================================================
// Text<H>
// =============================================================================

/// Text content node
#[derive(Debug)]
pub struct Text<H> {
    /// Text content
    pub content: String,
    output: OnceCell<H>,
}

impl<H> Text<H> {
    /// Create a new, unmaterialized text node
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            output: OnceCell::new(),
        }
    }

    /// Check if text content is empty
    pub fn is_empty(&self) -> bool {
        self.content.is_empty()
    }

    /// Get text length in bytes
    pub fn len(&self) -> usize {
        self.content.len()
    }

    /// Rendered handle, once materialized
    #[inline]
    pub fn output(&self) -> Option<&H> {
        self.output.get()
    }

    /// Record the rendered handle. Returns `false` if one was already set.
    pub(crate) fn stamp(&self, handle: H) -> bool {
        self.output.set(handle).is_ok()
    }
}
