//! Component nodes and their persistent cells
//!
//! A [`Component`] node is what a render function returns: a producer plus
//! an identity ([`ComponentKind`]). The first time it is materialized it
//! gets a [`ComponentCell`], which owns everything that must survive
//! between renders:
//!
//! | Field      | Lifetime                                            |
//! |------------|-----------------------------------------------------|
//! | `slots`    | hook records, positional, claimed in call order     |
//! | `renderer` | latest producer (or the closure a setup returned)   |
//! | `child`    | node produced by the most recent render             |
//! | `trigger`  | re-render entry point handed to setters and signals |
//!
//! When a later render produces a component of the same kind at the same
//! position, the new node adopts the existing cell instead of creating one.

use std::any::TypeId;
use std::cell::{Cell, OnceCell, RefCell};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::rc::{Rc, Weak};

use crate::hooks::{self, Disposer, PendingEffect, RenderCx, Rerender, Slots};

use super::VNode;

// =============================================================================
// ComponentKind
// =============================================================================

/// Identity of a component: the type of its producer function.
///
/// Two component nodes are "the same kind" when they were built from the
/// same function item or closure definition, regardless of their inputs.
#[derive(Clone, Copy)]
pub struct ComponentKind {
    id: TypeId,
    name: &'static str,
}

impl ComponentKind {
    /// Kind of producer type `F`
    pub fn of<F: 'static>() -> Self {
        Self {
            id: TypeId::of::<F>(),
            name: std::any::type_name::<F>(),
        }
    }

    /// Type name of the producer, for diagnostics
    #[inline]
    pub fn name(&self) -> &'static str {
        self.name
    }
}

impl PartialEq for ComponentKind {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for ComponentKind {}

impl Hash for ComponentKind {
    fn hash<S: Hasher>(&self, state: &mut S) {
        self.id.hash(state);
    }
}

impl fmt::Debug for ComponentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

// =============================================================================
// Producers
// =============================================================================

/// Render function of a plain component, re-invoked on every render.
pub type RenderFn<H> = Rc<dyn Fn(&mut RenderCx<'_>) -> VNode<H>>;

/// Render closure returned by a setup function.
pub type BoxedRender<H> = Box<dyn FnMut(&mut RenderCx<'_>) -> VNode<H>>;

/// Setup function: runs once per cell and returns the render closure.
pub type SetupFn<H> = Rc<dyn Fn() -> BoxedRender<H>>;

pub(crate) enum Producer<H> {
    Render(RenderFn<H>),
    Setup(SetupFn<H>),
}

impl<H> Clone for Producer<H> {
    fn clone(&self) -> Self {
        match self {
            Producer::Render(f) => Producer::Render(Rc::clone(f)),
            Producer::Setup(f) => Producer::Setup(Rc::clone(f)),
        }
    }
}

enum Renderer<H> {
    Render(RenderFn<H>),
    Setup(SetupFn<H>),
    Ready(BoxedRender<H>),
}

// =============================================================================
// Component<H>
// =============================================================================

/// Component node: a producer awaiting evaluation
pub struct Component<H> {
    kind: ComponentKind,
    pub(crate) producer: Producer<H>,
    cell: OnceCell<Rc<ComponentCell<H>>>,
}

impl<H> Component<H> {
    pub(crate) fn new(kind: ComponentKind, producer: Producer<H>) -> Self {
        Self {
            kind,
            producer,
            cell: OnceCell::new(),
        }
    }

    #[inline]
    pub fn kind(&self) -> ComponentKind {
        self.kind
    }

    /// Persistent cell, once materialized
    #[inline]
    pub fn cell(&self) -> Option<&Rc<ComponentCell<H>>> {
        self.cell.get()
    }

    pub(crate) fn adopt(&self, cell: Rc<ComponentCell<H>>) -> bool {
        self.cell.set(cell).is_ok()
    }
}

impl<H> fmt::Debug for Component<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Component")
            .field("kind", &self.kind)
            .field("materialized", &self.cell.get().is_some())
            .finish()
    }
}

// =============================================================================
// ComponentCell<H>
// =============================================================================

/// State that persists for a component across renders.
pub struct ComponentCell<H> {
    kind: ComponentKind,
    slots: RefCell<Slots>,
    renderer: RefCell<Renderer<H>>,
    child: RefCell<Option<VNode<H>>>,
    trigger: Rc<dyn Rerender>,
    mounted: Cell<bool>,
    dirty: Cell<bool>,
    renders: Cell<u64>,
}

impl<H: Clone + 'static> ComponentCell<H> {
    /// Create a cell for `component`; `trigger` builds the re-render entry
    /// point from a weak reference to the cell itself.
    pub(crate) fn new(
        component: &Component<H>,
        trigger: impl FnOnce(Weak<ComponentCell<H>>) -> Rc<dyn Rerender>,
    ) -> Rc<Self> {
        let renderer = match &component.producer {
            Producer::Render(f) => Renderer::Render(Rc::clone(f)),
            Producer::Setup(f) => Renderer::Setup(Rc::clone(f)),
        };
        Rc::new_cyclic(|weak| Self {
            kind: component.kind,
            slots: RefCell::new(Slots::new()),
            renderer: RefCell::new(renderer),
            child: RefCell::new(None),
            trigger: trigger(weak.clone()),
            mounted: Cell::new(true),
            dirty: Cell::new(false),
            renders: Cell::new(0),
        })
    }

    /// Take the producer of a newer node of the same kind.
    ///
    /// Plain components pick up the new function (and with it any new
    /// input). Setup components keep the closure their setup returned.
    pub(crate) fn adopt_producer(&self, producer: &Producer<H>) {
        if let Producer::Render(f) = producer {
            *self.renderer.borrow_mut() = Renderer::Render(Rc::clone(f));
        }
    }

    /// Evaluate the producer, claiming hooks in call order.
    ///
    /// Effects registered during the call are appended to `effects`. The
    /// produced node is stored as the cell's current child and returned.
    pub(crate) fn render(&self, effects: &mut Vec<PendingEffect>) -> VNode<H> {
        self.dirty.set(false);
        self.renders.set(self.renders.get() + 1);

        let mut slots = self.slots.borrow_mut();
        let mut cx = RenderCx::new(&mut slots, effects, &self.trigger);
        let mut renderer = self.renderer.borrow_mut();

        let node = match &mut *renderer {
            Renderer::Render(f) => {
                let f = Rc::clone(f);
                f(&mut cx)
            }
            Renderer::Ready(f) => f(&mut cx),
            Renderer::Setup(setup) => {
                let setup = Rc::clone(setup);
                let mut f = setup();
                let node = f(&mut cx);
                *renderer = Renderer::Ready(f);
                node
            }
        };

        tracing::trace!(component = self.kind.name(), hooks = cx.hook_count(), "rendered");
        *self.child.borrow_mut() = Some(node.clone());
        node
    }

    /// Mark the cell torn down and hand back the disposers of its effects.
    pub(crate) fn unmount(&self) -> Vec<Disposer> {
        self.mounted.set(false);
        self.dirty.set(false);
        hooks::take_disposers(&mut self.slots.borrow_mut())
    }
}

impl<H> ComponentCell<H> {
    #[inline]
    pub fn kind(&self) -> ComponentKind {
        self.kind
    }

    /// Node produced by the most recent render
    pub fn child(&self) -> Option<VNode<H>> {
        self.child.borrow().clone()
    }

    /// False once the component has been removed from the tree
    #[inline]
    pub fn is_mounted(&self) -> bool {
        self.mounted.get()
    }

    /// Number of times the producer has been evaluated
    #[inline]
    pub fn render_count(&self) -> u64 {
        self.renders.get()
    }

    /// Number of hook slots claimed so far
    pub fn hook_count(&self) -> usize {
        self.slots.borrow().len()
    }

    #[inline]
    pub fn is_dirty(&self) -> bool {
        self.dirty.get()
    }

    /// Flag for a deferred re-render. Returns `false` if already flagged.
    pub(crate) fn mark_dirty(&self) -> bool {
        !self.dirty.replace(true)
    }

    pub(crate) fn clear_dirty(&self) {
        self.dirty.set(false);
    }
}

impl<H> fmt::Debug for ComponentCell<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComponentCell")
            .field("kind", &self.kind)
            .field("hooks", &self.slots.borrow().len())
            .field("mounted", &self.mounted.get())
            .field("renders", &self.renders.get())
            .finish()
    }
}
