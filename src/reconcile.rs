//! Materialization and reconciliation.
//!
//! [`Reconciler`] turns virtual nodes into target output in two ways:
//!
//! - **materialize**: build fresh, detached output for a node and all of its
//!   descendants, evaluating components along the way
//! - **reconcile**: compare an already-rendered node with its replacement,
//!   let the replacement adopt the output it can keep, and record the
//!   [`PatchAction`]s that bring the target up to date
//!
//! Materialization touches the target directly, but only to create nodes
//! and to assemble detached subtrees. Output that is already attached is
//! only ever changed by applying the recorded actions.
//!
//! # Traversal
//!
//! Both operations are iterative (an explicit work stack), so tree depth is
//! bounded by memory rather than by the call stack.
//!
//! Children are matched with [`minimal_edit_sequence_by`] under tag
//! identity ([`VNode::same_kind`]). While the edit script is walked, a
//! running offset tracks how many target handles precede the current
//! position in the container, so inserts land at the right index even when
//! siblings are fragments or components that occupy several handles.
//!
//! # Effects
//!
//! A component's effects are queued after every effect of the subtree it
//! rendered, so children's effects always run before their parent's.

use std::rc::{Rc, Weak};

use crate::algo::{minimal_edit_sequence_by, Edit};
use crate::error::{RenderError, RenderResult};
use crate::hooks::{EffectQueue, PendingEffect, Rerender};
use crate::node::{ComponentCell, Element, Handles, VNode};
use crate::patch::{diff_attrs, Change, PatchAction};
use crate::target::Target;

// =============================================================================
// Scope
// =============================================================================

/// Source of re-render triggers for newly created component cells.
pub trait Scope<H> {
    fn trigger(&self, cell: Weak<ComponentCell<H>>) -> Rc<dyn Rerender>;
}

/// Scope for trees rendered outside a [`Root`](crate::Root).
///
/// Setters still store their values, but nothing re-renders.
#[derive(Debug, Default, Clone, Copy)]
pub struct DetachedScope;

struct Inert;

impl Rerender for Inert {
    fn rerender(&self) -> RenderResult<()> {
        Ok(())
    }
}

impl<H> Scope<H> for DetachedScope {
    fn trigger(&self, _cell: Weak<ComponentCell<H>>) -> Rc<dyn Rerender> {
        Rc::new(Inert)
    }
}

// =============================================================================
// Stats
// =============================================================================

/// Counters for one reconciler run.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ReconcileStats {
    /// Number of node pairs compared
    pub nodes_compared: usize,
    /// Number of nodes replaced because their kinds differed
    pub nodes_replaced: usize,
    /// Number of target nodes created
    pub nodes_created: usize,
    /// Number of child subtrees inserted
    pub children_inserted: usize,
    /// Number of child subtrees deleted
    pub children_deleted: usize,
    /// Number of text updates
    pub text_updates: usize,
    /// Number of style or listener updates
    pub attr_updates: usize,
    /// Number of component evaluations
    pub components_rendered: usize,
    /// Number of components torn down
    pub components_unmounted: usize,
}

// =============================================================================
// Work items
// =============================================================================

enum Work<H> {
    Diff {
        source: VNode<H>,
        next: VNode<H>,
        container: H,
        offset: usize,
    },
    Children(ChildFrame<H>),
    Attrs {
        handle: H,
        source: Rc<Element<H>>,
        next: Rc<Element<H>>,
    },
    Effects(Vec<PendingEffect>),
}

/// Progress through one child list.
struct ChildFrame<H> {
    edits: std::vec::IntoIter<Edit<VNode<H>>>,
    container: H,
    /// Handles of the container that precede the next edit
    offset: usize,
    /// Kept child diffed since the frame was suspended; its handle count
    /// is added to `offset` on resume
    pending: Option<VNode<H>>,
}

impl<H: Clone> ChildFrame<H> {
    fn new(source: &[VNode<H>], next: &[VNode<H>], container: H, offset: usize) -> Self {
        let edits: Vec<Edit<VNode<H>>> = minimal_edit_sequence_by(source, next, VNode::same_kind)
            .into_iter()
            .map(|edit| match edit {
                Edit::Keep { source, target, index } => Edit::Keep {
                    source: source.clone(),
                    target: target.clone(),
                    index,
                },
                Edit::Insert { target, index } => Edit::Insert {
                    target: target.clone(),
                    index,
                },
                Edit::Delete { source, index } => Edit::Delete {
                    source: source.clone(),
                    index,
                },
            })
            .collect();

        Self {
            edits: edits.into_iter(),
            container,
            offset,
            pending: None,
        }
    }
}

enum Build<H> {
    Node(VNode<H>, Option<H>),
    Attach(H, Option<H>),
    Effects(Vec<PendingEffect>),
}

// =============================================================================
// Reconciler
// =============================================================================

/// One materialize/reconcile session against a target.
///
/// Collects patch actions and queues effects; [`finish`](Self::finish)
/// hands the actions back for the caller to apply.
pub struct Reconciler<'a, T: Target> {
    target: &'a mut T,
    effects: &'a EffectQueue,
    scope: &'a dyn Scope<T::Handle>,
    actions: Vec<PatchAction<T::Handle>>,
    stats: ReconcileStats,
}

impl<'a, T: Target> Reconciler<'a, T> {
    pub fn new(target: &'a mut T, effects: &'a EffectQueue, scope: &'a dyn Scope<T::Handle>) -> Self {
        Self {
            target,
            effects,
            scope,
            actions: Vec::new(),
            stats: ReconcileStats::default(),
        }
    }

    /// Actions recorded so far
    pub fn actions(&self) -> &[PatchAction<T::Handle>] {
        &self.actions
    }

    #[inline]
    pub fn stats(&self) -> ReconcileStats {
        self.stats
    }

    /// End the session, returning the recorded actions and counters.
    pub fn finish(self) -> (Vec<PatchAction<T::Handle>>, ReconcileStats) {
        (self.actions, self.stats)
    }

    // -------------------------------------------------------------------------
    // Materialize
    // -------------------------------------------------------------------------

    /// Build detached output for `node` and stamp every node in it.
    ///
    /// Returns the top-level handles in document order: one for a text or
    /// element, the boundary markers plus children for a fragment, and the
    /// child's handles for a component.
    pub fn materialize(&mut self, node: &VNode<T::Handle>) -> RenderResult<Handles<T::Handle>> {
        let mut roots = Handles::new();
        let mut stack = vec![Build::Node(node.clone(), None)];

        while let Some(item) = stack.pop() {
            match item {
                Build::Attach(handle, parent) => self.attach(handle, parent.as_ref(), &mut roots)?,
                Build::Effects(batch) => self.effects.extend(batch),
                Build::Node(VNode::Text(text), parent) => {
                    let handle = self.target.create_text(&text.content);
                    self.stats.nodes_created += 1;
                    warn_if_reused(text.stamp(handle.clone()), "text");
                    self.attach(handle, parent.as_ref(), &mut roots)?;
                }
                Build::Node(VNode::Element(element), parent) => {
                    let handle = self.target.create_element(&element.tag)?;
                    self.stats.nodes_created += 1;
                    for (name, value) in &element.attrs.style {
                        self.target.set_style(&handle, name, Some(value))?;
                    }
                    for (event, handler) in &element.attrs.listeners {
                        self.target.set_listener(&handle, event, None, Some(handler))?;
                    }
                    warn_if_reused(element.stamp(handle.clone()), "element");
                    self.attach(handle.clone(), parent.as_ref(), &mut roots)?;
                    stack.extend(
                        element
                            .children
                            .iter()
                            .rev()
                            .map(|child| Build::Node(child.clone(), Some(handle.clone()))),
                    );
                }
                Build::Node(VNode::Fragment(fragment), parent) => {
                    let start = self.target.create_marker("fragment");
                    let end = self.target.create_marker("/fragment");
                    self.stats.nodes_created += 2;
                    warn_if_reused(fragment.stamp(start.clone(), end.clone()), "fragment");
                    self.attach(start, parent.as_ref(), &mut roots)?;
                    stack.push(Build::Attach(end, parent.clone()));
                    stack.extend(
                        fragment
                            .children
                            .iter()
                            .rev()
                            .map(|child| Build::Node(child.clone(), parent.clone())),
                    );
                }
                Build::Node(VNode::Component(component), parent) => {
                    let scope = self.scope;
                    let cell = ComponentCell::new(&component, |weak| scope.trigger(weak));
                    warn_if_reused(component.adopt(Rc::clone(&cell)), "component");
                    let (child, batch) = self.invoke(&cell);
                    stack.push(Build::Effects(batch));
                    stack.push(Build::Node(child, parent));
                }
            }
        }
        Ok(roots)
    }

    fn attach(
        &mut self,
        handle: T::Handle,
        parent: Option<&T::Handle>,
        roots: &mut Handles<T::Handle>,
    ) -> RenderResult<()> {
        match parent {
            Some(parent) => self.target.append(parent, &handle),
            None => {
                roots.push(handle);
                Ok(())
            }
        }
    }

    // -------------------------------------------------------------------------
    // Reconcile
    // -------------------------------------------------------------------------

    /// Reconcile rendered `source` with its replacement `next`.
    ///
    /// `container` is the handle `source`'s output is attached to and
    /// `offset` the number of container children that precede it.
    pub fn reconcile(
        &mut self,
        source: &VNode<T::Handle>,
        next: &VNode<T::Handle>,
        container: &T::Handle,
        offset: usize,
    ) -> RenderResult<()> {
        self.run(vec![Work::Diff {
            source: source.clone(),
            next: next.clone(),
            container: container.clone(),
            offset,
        }])
    }

    /// Re-evaluate a mounted component and reconcile its previous child
    /// with the new one, in place.
    pub fn rerender_component(&mut self, cell: &Rc<ComponentCell<T::Handle>>) -> RenderResult<()> {
        let previous = cell.child().ok_or(RenderError::Unmaterialized("component"))?;
        let first = previous
            .first_handle()
            .ok_or(RenderError::Unmaterialized(previous.kind_name()))?;
        let container = self
            .target
            .parent(&first)
            .ok_or(RenderError::Detached("component"))?;
        let offset = self
            .target
            .index_in_parent(&first)
            .ok_or(RenderError::Detached("component"))?;

        let (next, batch) = self.invoke(cell);
        self.run(vec![
            Work::Effects(batch),
            Work::Diff {
                source: previous,
                next,
                container,
                offset,
            },
        ])
    }

    /// Record the removal of `node`'s output and unmount its components.
    pub fn remove(&mut self, node: &VNode<T::Handle>) {
        let handles = node.handles();
        self.teardown(node);
        if !handles.is_empty() {
            self.stats.children_deleted += 1;
            self.actions.push(PatchAction::Delete { handles });
        }
    }

    fn run(&mut self, mut stack: Vec<Work<T::Handle>>) -> RenderResult<()> {
        while let Some(work) = stack.pop() {
            match work {
                Work::Diff {
                    source,
                    next,
                    container,
                    offset,
                } => self.diff_node(source, next, container, offset, &mut stack)?,
                Work::Children(frame) => self.step_children(frame, &mut stack)?,
                Work::Attrs { handle, source, next } => {
                    let before = self.actions.len();
                    diff_attrs(&handle, &source.attrs, &next.attrs, &mut self.actions);
                    self.stats.attr_updates += self.actions.len() - before;
                }
                Work::Effects(batch) => self.effects.extend(batch),
            }
        }
        Ok(())
    }

    fn diff_node(
        &mut self,
        source: VNode<T::Handle>,
        next: VNode<T::Handle>,
        container: T::Handle,
        offset: usize,
        stack: &mut Vec<Work<T::Handle>>,
    ) -> RenderResult<()> {
        self.stats.nodes_compared += 1;

        match (source, next) {
            (VNode::Text(old), VNode::Text(new)) => {
                let handle = old.output().cloned().ok_or(RenderError::Unmaterialized("text"))?;
                new.stamp(handle.clone());
                if old.content != new.content {
                    self.stats.text_updates += 1;
                    self.actions.push(PatchAction::Change {
                        target: handle,
                        change: Change::Text(new.content.clone()),
                    });
                }
            }
            (VNode::Element(old), VNode::Element(new)) if old.tag == new.tag => {
                let handle = old.output().cloned().ok_or(RenderError::Unmaterialized("element"))?;
                new.stamp(handle.clone());
                // Attrs after children: popped last
                stack.push(Work::Attrs {
                    handle: handle.clone(),
                    source: Rc::clone(&old),
                    next: Rc::clone(&new),
                });
                stack.push(Work::Children(ChildFrame::new(&old.children, &new.children, handle, 0)));
            }
            (VNode::Fragment(old), VNode::Fragment(new)) => {
                let (start, end) = old
                    .markers()
                    .cloned()
                    .ok_or(RenderError::Unmaterialized("fragment"))?;
                new.stamp(start, end);
                // Children start after the start marker
                stack.push(Work::Children(ChildFrame::new(
                    &old.children,
                    &new.children,
                    container,
                    offset + 1,
                )));
            }
            (VNode::Component(old), VNode::Component(new)) if old.kind() == new.kind() => {
                let cell = old.cell().cloned().ok_or(RenderError::Unmaterialized("component"))?;
                let previous = cell.child().ok_or(RenderError::Unmaterialized("component"))?;
                new.adopt(Rc::clone(&cell));
                cell.adopt_producer(&new.producer);

                let (child, batch) = self.invoke(&cell);
                stack.push(Work::Effects(batch));
                stack.push(Work::Diff {
                    source: previous,
                    next: child,
                    container,
                    offset,
                });
            }
            (source, next) => self.replace(&source, &next, offset)?,
        }
        Ok(())
    }

    fn step_children(
        &mut self,
        mut frame: ChildFrame<T::Handle>,
        stack: &mut Vec<Work<T::Handle>>,
    ) -> RenderResult<()> {
        if let Some(kept) = frame.pending.take() {
            frame.offset += kept.handle_count();
        }

        while let Some(edit) = frame.edits.next() {
            match edit {
                Edit::Delete { source, .. } => {
                    let handles = source.handles();
                    self.teardown(&source);
                    self.stats.children_deleted += 1;
                    self.actions.push(PatchAction::Delete { handles });
                }
                Edit::Insert { target, .. } => {
                    let handles = self.materialize(&target)?;
                    let count = handles.len();
                    self.stats.children_inserted += 1;
                    self.actions.push(PatchAction::Insert {
                        container: frame.container.clone(),
                        index: frame.offset,
                        handles,
                    });
                    frame.offset += count;
                }
                Edit::Keep { source, target, .. } => {
                    let container = frame.container.clone();
                    let offset = frame.offset;
                    frame.pending = Some(target.clone());
                    // Resume this list once the kept pair is fully diffed
                    stack.push(Work::Children(frame));
                    stack.push(Work::Diff {
                        source,
                        next: target,
                        container,
                        offset,
                    });
                    return Ok(());
                }
            }
        }
        Ok(())
    }

    /// Swap `source`'s output for freshly built output of `next`.
    fn replace(&mut self, source: &VNode<T::Handle>, next: &VNode<T::Handle>, offset: usize) -> RenderResult<()> {
        let first = source
            .first_handle()
            .ok_or(RenderError::Unmaterialized(source.kind_name()))?;
        let container = self.target.parent(&first).ok_or(RenderError::Detached("replace"))?;

        let handles = source.handles();
        self.teardown(source);
        let created = self.materialize(next)?;

        self.stats.nodes_replaced += 1;
        self.actions.push(PatchAction::Delete { handles });
        self.actions.push(PatchAction::Insert {
            container,
            index: offset,
            handles: created,
        });
        Ok(())
    }

    /// Unmount every component under `node`; their effect cleanups run at
    /// the next flush.
    fn teardown(&mut self, node: &VNode<T::Handle>) {
        let mut stack = vec![node.clone()];
        let mut disposers = Vec::new();

        while let Some(current) = stack.pop() {
            match current {
                VNode::Text(_) => {}
                VNode::Element(element) => stack.extend(element.children.iter().cloned()),
                VNode::Fragment(fragment) => stack.extend(fragment.children.iter().cloned()),
                VNode::Component(component) => {
                    if let Some(cell) = component.cell() {
                        stack.extend(cell.child());
                        disposers.extend(cell.unmount());
                        self.stats.components_unmounted += 1;
                    }
                }
            }
        }
        self.effects.defer_cleanups(disposers);
    }

    fn invoke(&mut self, cell: &Rc<ComponentCell<T::Handle>>) -> (VNode<T::Handle>, Vec<PendingEffect>) {
        let mut batch = Vec::new();
        let child = cell.render(&mut batch);
        self.stats.components_rendered += 1;
        (child, batch)
    }
}

fn warn_if_reused(stamped: bool, kind: &'static str) {
    if !stamped {
        tracing::warn!(kind, "node was already rendered elsewhere; its first output is kept");
    }
}

// =============================================================================
// Tests
// =============================================================================
