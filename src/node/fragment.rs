//! Fragment type
//!
//! A group of sibling nodes without a wrapper element. Its extent in the
//! target is delimited by a pair of boundary markers, so an empty fragment
//! still has a position to insert into.

use std::cell::OnceCell;

use super::Children;

/// Child list without a wrapper element
#[derive(Debug)]
pub struct Fragment<H> {
    /// Child nodes
    pub children: Children<H>,
    markers: OnceCell<(H, H)>,
}

impl<H> Fragment<H> {
    pub fn new(children: Children<H>) -> Self {
        Self {
            children,
            markers: OnceCell::new(),
        }
    }

    /// Start and end boundary markers, once materialized
    #[inline]
    pub fn markers(&self) -> Option<&(H, H)> {
        self.markers.get()
    }

    pub(crate) fn stamp(&self, start: H, end: H) -> bool {
        self.markers.set((start, end)).is_ok()
    }
}
