//! Target adapter: the environment a tree is rendered into.
//!
//! The reconciler never touches a concrete output directly. It creates
//! nodes and answers position queries through [`Target`], and describes
//! every change to existing output as a [`PatchAction`](crate::PatchAction)
//! that [`apply`](crate::patch::apply) later executes through the same trait.
//!
//! A handle is whatever the target uses to name one of its nodes (a DOM
//! node reference, an arena index, a widget id). Handles must be cheap to
//! clone and comparable.

use std::fmt;

use crate::attr::{Handler, StyleValue};
use crate::error::RenderResult;

/// Rendering environment.
///
/// Containers are element handles (or whatever root the host mounts
/// into). Text and marker handles never hold children.
pub trait Target {
    type Handle: Clone + PartialEq + fmt::Debug + 'static;

    // -------------------------------------------------------------------------
    // Creation
    // -------------------------------------------------------------------------

    /// Create a detached text node.
    fn create_text(&mut self, content: &str) -> Self::Handle;

    /// Create a detached element; fails with `UnknownTag` if the target
    /// has no such element.
    fn create_element(&mut self, tag: &str) -> RenderResult<Self::Handle>;

    /// Create a detached, invisible boundary marker.
    fn create_marker(&mut self, label: &str) -> Self::Handle;

    // -------------------------------------------------------------------------
    // Structure
    // -------------------------------------------------------------------------

    /// Append `child` as the last child of `parent`.
    fn append(&mut self, parent: &Self::Handle, child: &Self::Handle) -> RenderResult<()>;

    /// Insert `handles`, in order, starting at child position `index` of
    /// `container`. An index past the end appends.
    fn insert(
        &mut self,
        container: &Self::Handle,
        index: usize,
        handles: &[Self::Handle],
    ) -> RenderResult<()>;

    /// Detach `handle` from its parent. Detached handles are left alone.
    fn remove(&mut self, handle: &Self::Handle) -> RenderResult<()>;

    // -------------------------------------------------------------------------
    // Content
    // -------------------------------------------------------------------------

    fn set_text(&mut self, handle: &Self::Handle, content: &str) -> RenderResult<()>;

    /// Set a style property, or remove it when `value` is `None`.
    fn set_style(
        &mut self,
        handle: &Self::Handle,
        name: &str,
        value: Option<&StyleValue>,
    ) -> RenderResult<()>;

    /// Swap the listener for `event`: detach `old` (if any), attach `new`
    /// (if any).
    fn set_listener(
        &mut self,
        handle: &Self::Handle,
        event: &str,
        old: Option<&Handler>,
        new: Option<&Handler>,
    ) -> RenderResult<()>;

    // -------------------------------------------------------------------------
    // Queries
    // -------------------------------------------------------------------------

    /// Parent of an attached handle.
    fn parent(&self, handle: &Self::Handle) -> Option<Self::Handle>;

    /// Position of an attached handle among its parent's children.
    fn index_in_parent(&self, handle: &Self::Handle) -> Option<usize>;

    fn child_count(&self, container: &Self::Handle) -> RenderResult<usize>;

    /// Listener currently attached for `event`, used to dispatch events.
    fn listener(&self, handle: &Self::Handle, event: &str) -> Option<Handler>;
}
