//! Virtual node types.
//!
//! A tree is built from four kinds of node:
//!
//! | Kind        | Carries                          | Output            |
//! |-------------|----------------------------------|-------------------|
//! | `Fragment`  | children                         | boundary markers  |
//! | `Text`      | string content                   | one handle        |
//! | `Element`   | tag, attributes, children        | one handle        |
//! | `Component` | producer, kind                   | its child's       |
//!
//! Nodes are immutable once built and cheap to clone (`Rc`). What changes
//! is their *output*: each node is stamped exactly once with the target
//! handle(s) that represent it, either when it is materialized or when it
//! adopts the output of the node it replaces during reconciliation.
//!
//! The handles of a fragment or component are derived on demand from their
//! descendants, so they always reflect the current render.

mod component;
mod element;
mod fragment;
mod text;

pub use component::{BoxedRender, Component, ComponentCell, ComponentKind, RenderFn, SetupFn};
pub use element::Element;
pub use fragment::Fragment;
pub use text::Text;

pub(crate) use component::Producer;

use std::fmt;
use std::rc::Rc;

use smallvec::SmallVec;

/// Ordered child list.
pub type Children<H> = SmallVec<[VNode<H>; 4]>;

/// Target handles of one node, in document order.
pub type Handles<H> = SmallVec<[H; 2]>;

// =============================================================================
// VNode<H>
// =============================================================================

/// Node in a virtual tree, generic over the target's handle type `H`.
pub enum VNode<H> {
    Fragment(Rc<Fragment<H>>),
    Text(Rc<Text<H>>),
    Element(Rc<Element<H>>),
    Component(Rc<Component<H>>),
}

impl<H> Clone for VNode<H> {
    fn clone(&self) -> Self {
        match self {
            VNode::Fragment(f) => VNode::Fragment(Rc::clone(f)),
            VNode::Text(t) => VNode::Text(Rc::clone(t)),
            VNode::Element(e) => VNode::Element(Rc::clone(e)),
            VNode::Component(c) => VNode::Component(Rc::clone(c)),
        }
    }
}

impl<H: fmt::Debug> fmt::Debug for VNode<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VNode::Fragment(v) => fmt::Debug::fmt(v, f),
            VNode::Text(v) => fmt::Debug::fmt(v, f),
            VNode::Element(v) => fmt::Debug::fmt(v, f),
            VNode::Component(v) => fmt::Debug::fmt(v, f),
        }
    }
}

impl<H> VNode<H> {
    impl_enum_accessors!(H; fragment, text, element, component);

    /// Short name of the node kind, for diagnostics
    pub fn kind_name(&self) -> &'static str {
        match self {
            VNode::Fragment(_) => "fragment",
            VNode::Text(_) => "text",
            VNode::Element(_) => "element",
            VNode::Component(_) => "component",
        }
    }

    /// Tag identity: same variant, same element tag, same component kind.
    ///
    /// Text content, attributes and children do not participate.
    pub fn same_kind(&self, other: &Self) -> bool {
        match (self, other) {
            (VNode::Fragment(_), VNode::Fragment(_)) | (VNode::Text(_), VNode::Text(_)) => true,
            (VNode::Element(a), VNode::Element(b)) => a.tag == b.tag,
            (VNode::Component(a), VNode::Component(b)) => a.kind() == b.kind(),
            _ => false,
        }
    }

    /// Same underlying node (not merely equal)?
    pub fn ptr_eq(&self, other: &Self) -> bool {
        match (self, other) {
            (VNode::Fragment(a), VNode::Fragment(b)) => Rc::ptr_eq(a, b),
            (VNode::Text(a), VNode::Text(b)) => Rc::ptr_eq(a, b),
            (VNode::Element(a), VNode::Element(b)) => Rc::ptr_eq(a, b),
            (VNode::Component(a), VNode::Component(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }

    /// Has this node been stamped with an output?
    pub fn is_materialized(&self) -> bool {
        match self {
            VNode::Fragment(f) => f.markers().is_some(),
            VNode::Text(t) => t.output().is_some(),
            VNode::Element(e) => e.output().is_some(),
            VNode::Component(c) => c.cell().is_some(),
        }
    }
}

impl<H: Clone> VNode<H> {
    /// Target handles this node occupies, in document order.
    ///
    /// Text and element nodes contribute their own handle. A fragment
    /// contributes its start marker, its children's handles and its end
    /// marker. A component contributes whatever its current child does.
    /// Unmaterialized nodes contribute nothing.
    pub fn handles(&self) -> Handles<H> {
        enum Walk<H> {
            Node(VNode<H>),
            Handle(H),
        }

        let mut out = Handles::new();
        let mut stack = vec![Walk::Node(self.clone())];

        while let Some(item) = stack.pop() {
            match item {
                Walk::Handle(h) => out.push(h),
                Walk::Node(VNode::Text(t)) => out.extend(t.output().cloned()),
                Walk::Node(VNode::Element(e)) => out.extend(e.output().cloned()),
                Walk::Node(VNode::Fragment(f)) => {
                    if let Some((start, end)) = f.markers() {
                        out.push(start.clone());
                        stack.push(Walk::Handle(end.clone()));
                        stack.extend(f.children.iter().rev().cloned().map(Walk::Node));
                    }
                }
                Walk::Node(VNode::Component(c)) => {
                    if let Some(child) = c.cell().and_then(|cell| cell.child()) {
                        stack.push(Walk::Node(child));
                    }
                }
            }
        }
        out
    }

    /// First handle in document order
    pub fn first_handle(&self) -> Option<H> {
        let mut node = self.clone();
        loop {
            node = match node {
                VNode::Text(t) => return t.output().cloned(),
                VNode::Element(e) => return e.output().cloned(),
                VNode::Fragment(f) => return f.markers().map(|(start, _)| start.clone()),
                VNode::Component(c) => c.cell()?.child()?,
            };
        }
    }

    /// Number of handles this node occupies
    pub fn handle_count(&self) -> usize {
        self.handles().len()
    }
}

impl<H> From<&str> for VNode<H> {
    fn from(content: &str) -> Self {
        VNode::Text(Rc::new(Text::new(content)))
    }
}

impl<H> From<String> for VNode<H> {
    fn from(content: String) -> Self {
        VNode::Text(Rc::new(Text::new(content)))
    }
}

impl<H> From<Element<H>> for VNode<H> {
    fn from(element: Element<H>) -> Self {
        VNode::Element(Rc::new(element))
    }
}

// =============================================================================
// Tests
// =============================================================================
