//! Positional hooks.
//!
//! A component keeps an ordered list of hook slots. Each render claims the
//! slots in call order through a [`RenderCx`]: the first render creates
//! them, later renders reuse them by position. Calling hooks in a different
//! order (or a different kind at the same position) is a bug and panics.
//!
//! | Hook              | Slot kind | Re-renders on        |
//! |-------------------|-----------|----------------------|
//! | `use_state`       | state     | setter, value change |
//! | `use_ref`         | state     | never                |
//! | `use_effect`      | effect    | n/a                  |
//! | `use_effect_with` | effect    | n/a                  |
//! | `use_memo`        | memo      | n/a                  |
//!
//! Effects run after the patch of the render that registered them has been
//! applied. See [`EffectQueue`] for ordering.

mod effect;
mod signal;
mod state;

pub use effect::{Disposer, EffectQueue, TearDown};
pub use signal::{Signal, Watch};
pub use state::{Ref, SetState};

pub(crate) use effect::{EffectRecord, PendingEffect};

use std::any::Any;
use std::cell::RefCell;
use std::rc::Rc;

use smallvec::SmallVec;

use crate::error::RenderResult;

// =============================================================================
// Rerender
// =============================================================================

/// Re-render entry point of one component.
///
/// Setters and signals hold one of these. Implementations re-evaluate the
/// component, patch the target and flush effects, or defer all of that
/// when a render pass is already running.
pub trait Rerender {
    fn rerender(&self) -> RenderResult<()>;
}

// =============================================================================
// Slots
// =============================================================================

pub(crate) enum Slot {
    State(Rc<dyn Any>),
    Effect(Rc<RefCell<EffectRecord>>),
    Memo(Box<dyn Any>),
}

impl Slot {
    fn kind(&self) -> &'static str {
        match self {
            Slot::State(_) => "state",
            Slot::Effect(_) => "effect",
            Slot::Memo(_) => "memo",
        }
    }
}

pub(crate) type Slots = SmallVec<[Slot; 4]>;

/// Retire every effect slot, collecting the stored disposers.
pub(crate) fn take_disposers(slots: &mut Slots) -> Vec<Disposer> {
    slots
        .iter()
        .filter_map(|slot| match slot {
            Slot::Effect(record) => record.borrow_mut().retire(),
            _ => None,
        })
        .collect()
}

struct MemoRecord<D, T> {
    deps: D,
    value: T,
}

#[cold]
#[inline(never)]
fn hook_mismatch(index: usize, expected: &str, found: &str) -> ! {
    panic!(
        "hook #{index} was {found} on a previous render but is now {expected}; \
         hooks must be called in the same order on every render"
    )
}

// =============================================================================
// RenderCx
// =============================================================================

/// Hook context handed to a component's producer.
///
/// Only exists while a component is being evaluated, so hooks cannot be
/// called from anywhere else.
pub struct RenderCx<'a> {
    slots: &'a mut Slots,
    cursor: usize,
    effects: &'a mut Vec<PendingEffect>,
    trigger: &'a Rc<dyn Rerender>,
}

impl<'a> RenderCx<'a> {
    pub(crate) fn new(
        slots: &'a mut Slots,
        effects: &'a mut Vec<PendingEffect>,
        trigger: &'a Rc<dyn Rerender>,
    ) -> Self {
        Self {
            slots,
            cursor: 0,
            effects,
            trigger,
        }
    }

    /// Number of hooks claimed so far in this render
    #[inline]
    pub fn hook_count(&self) -> usize {
        self.cursor
    }

    pub(crate) fn trigger(&self) -> &Rc<dyn Rerender> {
        self.trigger
    }

    /// Advance the cursor. Returns the slot index and whether the slot
    /// still has to be created.
    fn next_slot(&mut self) -> (usize, bool) {
        let index = self.cursor;
        self.cursor += 1;
        (index, index == self.slots.len())
    }

    fn state_cell<T: 'static>(&mut self, init: impl FnOnce() -> T) -> Rc<RefCell<T>> {
        let (index, fresh) = self.next_slot();
        if fresh {
            let cell = Rc::new(RefCell::new(init()));
            self.slots.push(Slot::State(Rc::clone(&cell) as Rc<dyn Any>));
            return cell;
        }
        match &self.slots[index] {
            Slot::State(any) => Rc::clone(any)
                .downcast::<RefCell<T>>()
                .unwrap_or_else(|_| hook_mismatch(index, "state of another type", "state")),
            other => hook_mismatch(index, "state", other.kind()),
        }
    }

    // -------------------------------------------------------------------------
    // State
    // -------------------------------------------------------------------------

    /// Persistent value plus a setter.
    ///
    /// `initial` is only used on the first render.
    pub fn use_state<T: Clone + PartialEq + 'static>(&mut self, initial: T) -> (T, SetState<T>) {
        self.use_state_with(move || initial)
    }

    /// Like [`use_state`](Self::use_state), with a lazily computed initial
    /// value.
    pub fn use_state_with<T: Clone + PartialEq + 'static>(
        &mut self,
        init: impl FnOnce() -> T,
    ) -> (T, SetState<T>) {
        let cell = self.state_cell(init);
        let value = cell.borrow().clone();
        (value, SetState::new(cell, Rc::clone(self.trigger)))
    }

    /// Mutable box that survives re-renders and never triggers one.
    pub fn use_ref<T: 'static>(&mut self, init: impl FnOnce() -> T) -> Ref<T> {
        Ref::from_cell(self.state_cell(init))
    }

    // -------------------------------------------------------------------------
    // Effects
    // -------------------------------------------------------------------------

    /// Run `effect` after every render.
    pub fn use_effect<R: TearDown>(&mut self, effect: impl FnOnce() -> R + 'static) {
        self.register_effect(None::<()>, effect);
    }

    /// Run `effect` after the first render and after any render where
    /// `deps` differs from the previous render's.
    ///
    /// Pass `()` to run only once.
    pub fn use_effect_with<D, R>(&mut self, deps: D, effect: impl FnOnce() -> R + 'static)
    where
        D: PartialEq + 'static,
        R: TearDown,
    {
        self.register_effect(Some(deps), effect);
    }

    fn register_effect<D, R>(&mut self, deps: Option<D>, effect: impl FnOnce() -> R + 'static)
    where
        D: PartialEq + 'static,
        R: TearDown,
    {
        let run: Box<dyn FnOnce() -> Option<Disposer>> = Box::new(move || effect().into_disposer());
        let boxed = |deps: Option<D>| deps.map(|d| Box::new(d) as Box<dyn Any>);

        let (index, fresh) = self.next_slot();
        if fresh {
            let record = Rc::new(RefCell::new(EffectRecord::new(boxed(deps))));
            self.slots.push(Slot::Effect(Rc::clone(&record)));
            self.effects.push(PendingEffect::new(record, run));
            return;
        }

        let record = match &self.slots[index] {
            Slot::Effect(record) => Rc::clone(record),
            other => hook_mismatch(index, "effect", other.kind()),
        };
        if !record.borrow().deps_changed(deps.as_ref()) {
            return;
        }

        // Previous cleanup runs before the effect is queued again
        let previous = record.borrow_mut().rearm(boxed(deps));
        if let Some(dispose) = previous {
            dispose();
        }
        self.effects.push(PendingEffect::new(record, run));
    }

    // -------------------------------------------------------------------------
    // Memo
    // -------------------------------------------------------------------------

    /// Value computed by `factory`, recomputed only when `deps` changes.
    pub fn use_memo<D, T>(&mut self, deps: D, factory: impl FnOnce() -> T) -> T
    where
        D: PartialEq + 'static,
        T: Clone + 'static,
    {
        let (index, fresh) = self.next_slot();
        if fresh {
            let value = factory();
            self.slots.push(Slot::Memo(Box::new(MemoRecord {
                deps,
                value: value.clone(),
            })));
            return value;
        }

        match &mut self.slots[index] {
            Slot::Memo(any) => match any.downcast_mut::<MemoRecord<D, T>>() {
                Some(record) => {
                    if record.deps != deps {
                        record.value = factory();
                        record.deps = deps;
                    }
                    record.value.clone()
                }
                None => hook_mismatch(index, "memo of another type", "memo"),
            },
            other => hook_mismatch(index, "memo", other.kind()),
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
