//! Element type
//!
//! Tagged nodes with attributes and children. The core building block of
//! the tree.

use std::cell::OnceCell;

use compact_str::CompactString;

use crate::attr::Attrs;

use super::Children;

// =============================================================================
// Element<H>
// =============================================================================

/// Tagged element with attributes and ordered children
#[derive(Debug)]
pub struct Element<H> {
    /// Tag name (e.g. `div`)
    pub tag: CompactString,
    /// Style and listeners
    pub attrs: Attrs,
    /// Child nodes
    pub children: Children<H>,
    output: OnceCell<H>,
}

impl<H> Element<H> {
    /// Create an element with no attributes and no children
    pub fn new(tag: impl Into<CompactString>) -> Self {
        Self::with_parts(tag, Attrs::new(), Children::new())
    }

    /// Create an element from all of its parts
    pub fn with_parts(tag: impl Into<CompactString>, attrs: Attrs, children: Children<H>) -> Self {
        Self {
            tag: tag.into(),
            attrs,
            children,
            output: OnceCell::new(),
        }
    }

    /// Check if element has no children
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }

    /// Rendered handle, once materialized
    #[inline]
    pub fn output(&self) -> Option<&H> {
        self.output.get()
    }

    pub(crate) fn stamp(&self, handle: H) -> bool {
        self.output.set(handle).is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::VNode;

    #[test]
    fn test_element_new() {
        let elem: Element<u32> = Element::new("div");
        assert_eq!(elem.tag, "div");
        assert!(elem.is_empty());
        assert!(elem.attrs.is_empty());
        assert!(elem.output().is_none());
    }

    #[test]
    fn test_element_with_parts() {
        let children: Children<u32> = [VNode::from("a"), VNode::from("b")].into_iter().collect();
        let elem = Element::with_parts("ul", Attrs::new().style("width", 10), children);
        assert_eq!(elem.children.len(), 2);
        assert!(elem.stamp(1));
        assert_eq!(elem.output(), Some(&1));
    }
}
