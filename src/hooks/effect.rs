//! Effect records, teardown values and the post-commit effect queue.

use std::any::Any;
use std::cell::{Cell, RefCell};
use std::rc::Rc;

/// Cleanup returned by an effect, run before the effect re-runs or when
/// its component is torn down.
pub type Disposer = Box<dyn FnOnce()>;

/// Return value of an effect: either nothing or a cleanup closure.
pub trait TearDown: 'static {
    fn into_disposer(self) -> Option<Disposer>;
}

impl TearDown for () {
    fn into_disposer(self) -> Option<Disposer> {
        None
    }
}

impl<F: FnOnce() + 'static> TearDown for F {
    fn into_disposer(self) -> Option<Disposer> {
        Some(Box::new(self))
    }
}

// =============================================================================
// Records
// =============================================================================

/// Persistent state of one `use_effect` slot.
pub(crate) struct EffectRecord {
    /// `None` means "no dependency list": re-run after every render
    deps: Option<Box<dyn Any>>,
    disposer: Option<Disposer>,
    /// Bumped on every re-arm and on teardown; a queued run stamped with
    /// an older value is stale
    generation: u64,
}

impl EffectRecord {
    pub(crate) fn new(deps: Option<Box<dyn Any>>) -> Self {
        Self {
            deps,
            disposer: None,
            generation: 0,
        }
    }

    /// Would `deps` re-trigger this effect?
    ///
    /// A missing list always does. A list of a different type than last
    /// time counts as changed.
    pub(crate) fn deps_changed<D: PartialEq + 'static>(&self, deps: Option<&D>) -> bool {
        match (self.deps.as_deref(), deps) {
            (Some(old), Some(new)) => old.downcast_ref::<D>() != Some(new),
            _ => true,
        }
    }

    /// Store new deps and hand back the previous disposer, if any.
    pub(crate) fn rearm(&mut self, deps: Option<Box<dyn Any>>) -> Option<Disposer> {
        self.deps = deps;
        self.generation += 1;
        self.disposer.take()
    }

    /// Invalidate queued runs and hand back the stored disposer.
    pub(crate) fn retire(&mut self) -> Option<Disposer> {
        self.generation += 1;
        self.disposer.take()
    }
}

/// An effect waiting for the next flush.
pub(crate) struct PendingEffect {
    record: Rc<RefCell<EffectRecord>>,
    generation: u64,
    run: Box<dyn FnOnce() -> Option<Disposer>>,
}

impl PendingEffect {
    pub(crate) fn new(
        record: Rc<RefCell<EffectRecord>>,
        run: Box<dyn FnOnce() -> Option<Disposer>>,
    ) -> Self {
        let generation = record.borrow().generation;
        Self {
            record,
            generation,
            run,
        }
    }

    fn is_current(&self) -> bool {
        self.record.borrow().generation == self.generation
    }

    /// Run the effect and keep its disposer.
    ///
    /// If the record was re-armed or retired while the effect ran, the
    /// disposer belongs to nothing and runs right away.
    fn run(self) {
        let disposer = (self.run)();
        let orphan = {
            let mut record = self.record.borrow_mut();
            if record.generation == self.generation {
                std::mem::replace(&mut record.disposer, disposer)
            } else {
                disposer
            }
        };
        if let Some(dispose) = orphan {
            dispose();
        }
    }
}

/// Clears the flushing flag when a flush ends.
struct FlushGuard<'a>(&'a Cell<bool>);

impl Drop for FlushGuard<'_> {
    fn drop(&mut self) {
        self.0.set(false);
    }
}

// =============================================================================
// EffectQueue
// =============================================================================

/// Effects registered during rendering, run after the patch is applied.
///
/// Component batches are appended children-first, so a component's effects
/// run after those of everything it rendered. Cleanups of torn-down
/// components are run at the start of the next flush, before any effect.
///
/// Only one flush runs at a time: a flush requested by an effect (through
/// a setter and the re-render it causes) returns at once, and the running
/// flush picks up whatever was queued.
#[derive(Default)]
pub struct EffectQueue {
    pending: RefCell<Vec<PendingEffect>>,
    cleanups: RefCell<Vec<Disposer>>,
    flushing: Cell<bool>,
}

impl EffectQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn extend(&self, batch: Vec<PendingEffect>) {
        if !batch.is_empty() {
            self.pending.borrow_mut().extend(batch);
        }
    }

    pub(crate) fn defer_cleanups(&self, disposers: Vec<Disposer>) {
        if !disposers.is_empty() {
            self.cleanups.borrow_mut().extend(disposers);
        }
    }

    /// Number of effects and cleanups waiting
    pub fn pending(&self) -> usize {
        self.pending.borrow().len() + self.cleanups.borrow().len()
    }

    /// Run everything queued, including work queued by the effects
    /// themselves, until the queue is empty. Returns the number of effects
    /// run.
    ///
    /// Queued runs superseded by a later render of the same hook, or whose
    /// component was torn down, are skipped.
    pub fn flush(&self) -> usize {
        if self.flushing.replace(true) {
            return 0;
        }
        let _guard = FlushGuard(&self.flushing);

        let mut ran = 0;
        let mut skipped = 0;
        loop {
            let cleanups = std::mem::take(&mut *self.cleanups.borrow_mut());
            let batch = std::mem::take(&mut *self.pending.borrow_mut());
            if cleanups.is_empty() && batch.is_empty() {
                break;
            }

            for cleanup in cleanups {
                cleanup();
            }
            for effect in batch {
                if effect.is_current() {
                    effect.run();
                    ran += 1;
                } else {
                    skipped += 1;
                }
            }
        }
        if ran > 0 || skipped > 0 {
            tracing::trace!(ran, skipped, "flushed effects");
        }
        ran
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    fn pending(log: &Rc<RefCell<Vec<&'static str>>>, name: &'static str) -> PendingEffect {
        let record = Rc::new(RefCell::new(EffectRecord::new(None)));
        let log = Rc::clone(log);
        PendingEffect::new(
            record,
            Box::new(move || -> Option<Disposer> {
                log.borrow_mut().push(name);
                None
            }),
        )
    }

    #[test]
    fn test_deps_changed() {
        let record = EffectRecord::new(Some(Box::new(1_i32)));
        assert!(!record.deps_changed(Some(&1_i32)));
        assert!(record.deps_changed(Some(&2_i32)));
        // Different type counts as changed
        assert!(record.deps_changed(Some(&1_u8)));
        // No list always re-runs
        assert!(record.deps_changed::<i32>(None));
        assert!(EffectRecord::new(None).deps_changed(Some(&1_i32)));
    }

    #[test]
    fn test_flush_order_and_drain() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let queue = EffectQueue::new();
        queue.extend(vec![pending(&log, "child"), pending(&log, "parent")]);
        assert_eq!(queue.pending(), 2);

        assert_eq!(queue.flush(), 2);
        assert_eq!(*log.borrow(), vec!["child", "parent"]);
        assert_eq!(queue.pending(), 0);
        assert_eq!(queue.flush(), 0);
    }

    #[test]
    fn test_cleanups_run_first() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let queue = EffectQueue::new();
        queue.extend(vec![pending(&log, "effect")]);
        let cleanup_log = Rc::clone(&log);
        queue.defer_cleanups(vec![Box::new(move || cleanup_log.borrow_mut().push("cleanup"))]);

        queue.flush();
        assert_eq!(*log.borrow(), vec!["cleanup", "effect"]);
    }

    #[test]
    fn test_disposer_is_stored() {
        let record = Rc::new(RefCell::new(EffectRecord::new(None)));
        let disposed = Rc::new(Cell::new(false));
        let flag = Rc::clone(&disposed);
        let queue = EffectQueue::new();
        queue.extend(vec![PendingEffect::new(
            Rc::clone(&record),
            Box::new(move || (move || flag.set(true)).into_disposer()),
        )]);
        queue.flush();

        let disposer = record.borrow_mut().retire();
        assert!(disposer.is_some());
        if let Some(disposer) = disposer {
            disposer();
        }
        assert!(disposed.get());
    }

    fn logged(
        record: &Rc<RefCell<EffectRecord>>,
        log: &Rc<RefCell<Vec<&'static str>>>,
        run: &'static str,
        cleanup: &'static str,
    ) -> PendingEffect {
        let log = Rc::clone(log);
        PendingEffect::new(
            Rc::clone(record),
            Box::new(move || -> Option<Disposer> {
                log.borrow_mut().push(run);
                (move || log.borrow_mut().push(cleanup)).into_disposer()
            }),
        )
    }

    #[test]
    fn test_superseded_run_is_skipped() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let record = Rc::new(RefCell::new(EffectRecord::new(None)));
        let queue = EffectQueue::new();

        queue.extend(vec![logged(&record, &log, "run 1", "cleanup 1")]);
        assert!(record.borrow_mut().rearm(None).is_none());
        queue.extend(vec![logged(&record, &log, "run 2", "cleanup 2")]);

        assert_eq!(queue.flush(), 1);
        assert_eq!(*log.borrow(), vec!["run 2"]);
    }

    #[test]
    fn test_disposer_of_retired_record_runs_at_once() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let record = Rc::new(RefCell::new(EffectRecord::new(None)));
        let queue = EffectQueue::new();

        let inner = Rc::clone(&record);
        let sink = Rc::clone(&log);
        queue.extend(vec![PendingEffect::new(
            Rc::clone(&record),
            Box::new(move || -> Option<Disposer> {
                sink.borrow_mut().push("run");
                // Torn down while running
                assert!(inner.borrow_mut().retire().is_none());
                let sink = Rc::clone(&sink);
                (move || sink.borrow_mut().push("cleanup")).into_disposer()
            }),
        )]);

        queue.flush();
        assert_eq!(*log.borrow(), vec!["run", "cleanup"]);
        assert!(record.borrow_mut().retire().is_none());
    }

    #[test]
    fn test_nested_flush_defers_to_running_one() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let queue = Rc::new(EffectQueue::new());

        let nested = Rc::clone(&queue);
        let sink = Rc::clone(&log);
        let record = Rc::new(RefCell::new(EffectRecord::new(None)));
        let follow_up = pending(&log, "follow-up");
        queue.extend(vec![PendingEffect::new(
            record,
            Box::new(move || -> Option<Disposer> {
                sink.borrow_mut().push("outer");
                nested.extend(vec![follow_up]);
                assert_eq!(nested.flush(), 0);
                None
            }),
        )]);

        assert_eq!(queue.flush(), 2);
        assert_eq!(*log.borrow(), vec!["outer", "follow-up"]);
    }

    #[test]
    fn test_unit_teardown_is_none() {
        assert!(().into_disposer().is_none());
    }
}
