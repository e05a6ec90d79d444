//! Render roots.
//!
//! A [`Root`] owns a target, the container its tree is mounted into and
//! the tree currently shown. It is the runtime behind component setters:
//!
//! 1. `render` mounts a tree on first call and reconciles on later calls
//! 2. a setter outside a render pass re-renders its component in place,
//!    applies the patch and flushes effects before returning
//! 3. a setter inside a render pass only flags the component; it is
//!    re-rendered right after the pass, before effects are flushed
//!
//! Everything is synchronous and single-threaded. Use
//! [`schedule_render`](Root::schedule_render) to defer a render to a
//! [`Scheduler`].

use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

use tracing::debug_span;

use crate::error::{RenderError, RenderResult};
use crate::hooks::{EffectQueue, Rerender};
use crate::node::{ComponentCell, VNode};
use crate::patch::{self, PatchAction};
use crate::reconcile::{ReconcileStats, Reconciler, Scope};
use crate::scheduler::Scheduler;
use crate::target::Target;

// =============================================================================
// Stats
// =============================================================================

/// Lifetime counters of a root.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RootStats {
    /// Number of mounts (first renders)
    pub mounts: usize,
    /// Number of reconcile passes: root updates plus component re-renders
    pub reconciliations: usize,
    /// Number of component re-renders triggered by setters or signals
    pub component_updates: usize,
    /// Number of setter calls deferred because a pass was running
    pub deferred_updates: usize,
    /// Number of patch actions applied
    pub actions_applied: usize,
    /// Number of effects run
    pub effects_run: usize,
}

// =============================================================================
// Runtime
// =============================================================================

struct Runtime<T: Target> {
    weak: Weak<Runtime<T>>,
    target: RefCell<T>,
    container: T::Handle,
    /// Container children that existed before the mount
    base: Cell<usize>,
    current: RefCell<Option<VNode<T::Handle>>>,
    effects: EffectQueue,
    rendering: Cell<bool>,
    dirty: RefCell<Vec<Weak<ComponentCell<T::Handle>>>>,
    stats: Cell<RootStats>,
    last_pass: Cell<ReconcileStats>,
}

/// Clears the rendering flag when a pass ends, however it ends.
struct PassGuard<'a>(&'a Cell<bool>);

impl Drop for PassGuard<'_> {
    fn drop(&mut self) {
        self.0.set(false);
    }
}

impl<T: Target + 'static> Runtime<T> {
    fn begin_pass(&self) -> RenderResult<PassGuard<'_>> {
        if self.rendering.replace(true) {
            return Err(RenderError::Reentrant);
        }
        Ok(PassGuard(&self.rendering))
    }

    fn update_stats(&self, f: impl FnOnce(&mut RootStats)) {
        let mut stats = self.stats.get();
        f(&mut stats);
        self.stats.set(stats);
    }

    fn render(&self, node: VNode<T::Handle>) -> RenderResult<()> {
        let _span = debug_span!("tola.root.render").entered();
        {
            let _pass = self.begin_pass()?;
            let previous = self.current.borrow().clone();
            let mut target = self.target.borrow_mut();
            let mut rec = Reconciler::new(&mut *target, &self.effects, self);

            match previous {
                None => {
                    let handles = rec.materialize(&node)?;
                    let (_, stats) = rec.finish();
                    let base = target.child_count(&self.container)?;
                    target.insert(&self.container, base, &handles)?;
                    self.base.set(base);
                    self.last_pass.set(stats);
                    self.update_stats(|s| s.mounts += 1);
                    tracing::debug!(handles = handles.len(), base, "mounted");
                }
                Some(previous) => {
                    rec.reconcile(&previous, &node, &self.container, self.base.get())?;
                    let (actions, stats) = rec.finish();
                    self.commit(&mut *target, &actions, stats)?;
                }
            }
            *self.current.borrow_mut() = Some(node);
        }
        self.settle()
    }

    fn rerender(&self, cell: &Rc<ComponentCell<T::Handle>>) -> RenderResult<()> {
        if !cell.is_mounted() {
            tracing::trace!(component = cell.kind().name(), "update of unmounted component ignored");
            return Ok(());
        }
        if self.rendering.get() {
            if cell.mark_dirty() {
                self.dirty.borrow_mut().push(Rc::downgrade(cell));
                self.update_stats(|s| s.deferred_updates += 1);
            }
            return Ok(());
        }

        let _span = debug_span!("tola.root.rerender", component = cell.kind().name()).entered();
        {
            let _pass = self.begin_pass()?;
            let mut target = self.target.borrow_mut();
            let mut rec = Reconciler::new(&mut *target, &self.effects, self);
            rec.rerender_component(cell)?;
            let (actions, stats) = rec.finish();
            self.commit(&mut *target, &actions, stats)?;
            self.update_stats(|s| s.component_updates += 1);
        }
        self.settle()
    }

    fn commit(
        &self,
        target: &mut T,
        actions: &[PatchAction<T::Handle>],
        stats: ReconcileStats,
    ) -> RenderResult<()> {
        patch::apply_all(target, actions)?;
        self.last_pass.set(stats);
        self.update_stats(|s| {
            s.reconciliations += 1;
            s.actions_applied += actions.len();
        });
        Ok(())
    }

    /// Re-render components flagged during the last pass, then flush effects.
    fn settle(&self) -> RenderResult<()> {
        let deferred = std::mem::take(&mut *self.dirty.borrow_mut());
        let mut cells = deferred.iter().filter_map(Weak::upgrade);
        while let Some(cell) = cells.next() {
            if !cell.is_dirty() {
                continue;
            }
            if let Err(err) = self.rerender(&cell) {
                // Unflag the rest so later updates can queue them again
                cell.clear_dirty();
                let dropped = cells.inspect(|rest| rest.clear_dirty()).count();
                tracing::warn!(%err, dropped, "deferred re-render failed");
                return Err(err);
            }
        }

        let ran = self.effects.flush();
        if ran > 0 {
            self.update_stats(|s| s.effects_run += ran);
        }
        Ok(())
    }

    fn unmount(&self) -> RenderResult<()> {
        {
            let _pass = self.begin_pass()?;
            let Some(current) = self.current.borrow_mut().take() else {
                return Ok(());
            };
            let mut target = self.target.borrow_mut();
            let mut rec = Reconciler::new(&mut *target, &self.effects, self);
            rec.remove(&current);
            let (actions, stats) = rec.finish();
            self.commit(&mut *target, &actions, stats)?;
        }
        self.dirty.borrow_mut().clear();
        self.settle()
    }
}

impl<T: Target + 'static> Scope<T::Handle> for Runtime<T> {
    fn trigger(&self, cell: Weak<ComponentCell<T::Handle>>) -> Rc<dyn Rerender> {
        Rc::new(ComponentTrigger::<T> {
            runtime: self.weak.clone(),
            cell,
        })
    }
}

struct ComponentTrigger<T: Target> {
    runtime: Weak<Runtime<T>>,
    cell: Weak<ComponentCell<T::Handle>>,
}

impl<T: Target + 'static> Rerender for ComponentTrigger<T> {
    fn rerender(&self) -> RenderResult<()> {
        match (self.runtime.upgrade(), self.cell.upgrade()) {
            (Some(runtime), Some(cell)) => runtime.rerender(&cell),
            // Root or component already dropped
            _ => Ok(()),
        }
    }
}

// =============================================================================
// Root
// =============================================================================

/// A tree mounted into one container of a target.
///
/// Cloning a `Root` yields another handle to the same root.
pub struct Root<T: Target + 'static> {
    runtime: Rc<Runtime<T>>,
}

impl<T: Target + 'static> Clone for Root<T> {
    fn clone(&self) -> Self {
        Self {
            runtime: Rc::clone(&self.runtime),
        }
    }
}

impl<T: Target + 'static> Root<T> {
    /// Create a root that will mount into `container`.
    ///
    /// Children already in the container stay in front of the mounted tree.
    pub fn new(target: T, container: T::Handle) -> Self {
        let runtime = Rc::new_cyclic(|weak| Runtime {
            weak: weak.clone(),
            target: RefCell::new(target),
            container,
            base: Cell::new(0),
            current: RefCell::new(None),
            effects: EffectQueue::new(),
            rendering: Cell::new(false),
            dirty: RefCell::new(Vec::new()),
            stats: Cell::new(RootStats::default()),
            last_pass: Cell::new(ReconcileStats::default()),
        });
        Self { runtime }
    }

    /// Mount `node`, or reconcile the current tree into it.
    ///
    /// Returns after the patch is applied and every resulting effect
    /// (including effects of re-renders they trigger) has run.
    pub fn render(&self, node: VNode<T::Handle>) -> RenderResult<()> {
        self.runtime.render(node)
    }

    /// Render `node` as a scheduled task instead of right away.
    ///
    /// A failed render fails the task, which the scheduler logs.
    pub fn schedule_render(&self, scheduler: &Scheduler, node: VNode<T::Handle>) {
        let root = self.clone();
        scheduler.schedule(move || root.render(node));
    }

    /// Remove the tree from the container and unmount every component.
    pub fn unmount(&self) -> RenderResult<()> {
        self.runtime.unmount()
    }

    /// Invoke the listener attached for `event` on `handle`.
    ///
    /// Returns `Ok(false)` if there is none.
    pub fn dispatch(&self, handle: &T::Handle, event: &str) -> RenderResult<bool> {
        // Release the target before the handler re-renders
        let handler = self.runtime.target.borrow().listener(handle, event);
        match handler {
            Some(handler) => handler.call().map(|()| true),
            None => Ok(false),
        }
    }

    /// Read the target.
    ///
    /// # Panics
    ///
    /// If called from inside a component's render function.
    pub fn with_target<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        f(&self.runtime.target.borrow())
    }

    pub fn container(&self) -> T::Handle {
        self.runtime.container.clone()
    }

    /// Tree currently shown
    pub fn current(&self) -> Option<VNode<T::Handle>> {
        self.runtime.current.borrow().clone()
    }

    pub fn is_mounted(&self) -> bool {
        self.runtime.current.borrow().is_some()
    }

    /// Is a render pass running right now?
    pub fn is_rendering(&self) -> bool {
        self.runtime.rendering.get()
    }

    #[inline]
    pub fn stats(&self) -> RootStats {
        self.runtime.stats.get()
    }

    /// Counters of the most recent mount or reconcile pass
    #[inline]
    pub fn last_pass(&self) -> ReconcileStats {
        self.runtime.last_pass.get()
    }
}

// =============================================================================
// Tests
// =============================================================================
