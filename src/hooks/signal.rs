//! Observable values shared between components.
//!
//! A [`Signal`] holds a value outside any component. Reading it through
//! [`Signal::get`] during a render subscribes the rendering component;
//! every later change re-renders each subscriber. Plain callbacks can
//! observe changes with [`Signal::watch`], which returns a guard that
//! unsubscribes on drop.
//!
//! ```ignore
//! let count = Signal::new(0);
//! let view = setup_component(move || {
//!     let count = count.clone();
//!     move |cx: &mut RenderCx<'_>| -> VNode<NodeId> { text(count.get(cx).to_string()) }
//! });
//! ```

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};

use crate::error::RenderResult;

use super::{RenderCx, Rerender};

type WatchFn<T> = Rc<dyn Fn(&T, &T)>;

enum Observer<T> {
    Component(Weak<dyn Rerender>),
    Watcher { id: u64, callback: WatchFn<T> },
}

impl<T> Clone for Observer<T> {
    fn clone(&self) -> Self {
        match self {
            Observer::Component(w) => Observer::Component(Weak::clone(w)),
            Observer::Watcher { id, callback } => Observer::Watcher {
                id: *id,
                callback: Rc::clone(callback),
            },
        }
    }
}

struct Inner<T> {
    value: RefCell<T>,
    observers: RefCell<Vec<Observer<T>>>,
    next_id: Cell<u64>,
}

// =============================================================================
// Signal<T>
// =============================================================================

/// Shared observable value. Clones share the value and its observers.
pub struct Signal<T> {
    inner: Rc<Inner<T>>,
}

impl<T> Clone for Signal<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<T: Clone + PartialEq + 'static> Signal<T> {
    pub fn new(value: T) -> Self {
        Self {
            inner: Rc::new(Inner {
                value: RefCell::new(value),
                observers: RefCell::new(Vec::new()),
                next_id: Cell::new(0),
            }),
        }
    }

    /// Read the value and subscribe the rendering component.
    pub fn get(&self, cx: &RenderCx<'_>) -> T {
        self.subscribe(cx.trigger());
        self.get_untracked()
    }

    /// Read the value without subscribing.
    pub fn get_untracked(&self) -> T {
        self.inner.value.borrow().clone()
    }

    /// Replace the value and notify observers in subscription order.
    ///
    /// Equal values are ignored. Watchers see `(new, old)`. Subscribed
    /// components are re-rendered; the first failure is returned after
    /// every observer has been notified.
    pub fn set(&self, value: T) -> RenderResult<()> {
        if *self.inner.value.borrow() == value {
            return Ok(());
        }
        let old = self.inner.value.replace(value.clone());

        // Snapshot so observers may subscribe or unsubscribe while notified
        let observers = self.inner.observers.borrow().clone();
        let mut result = Ok(());
        for observer in observers {
            match observer {
                Observer::Watcher { callback, .. } => callback(&value, &old),
                Observer::Component(weak) => {
                    let Some(trigger) = weak.upgrade() else {
                        continue;
                    };
                    if let Err(err) = trigger.rerender() {
                        if result.is_ok() {
                            result = Err(err);
                        }
                    }
                }
            }
        }
        self.prune();
        result
    }

    /// Call `f(new, old)` on every change until the guard is dropped.
    pub fn watch(&self, f: impl Fn(&T, &T) + 'static) -> Watch {
        let id = self.inner.next_id.get();
        self.inner.next_id.set(id + 1);
        self.inner.observers.borrow_mut().push(Observer::Watcher {
            id,
            callback: Rc::new(f),
        });

        let inner = Rc::downgrade(&self.inner);
        Watch {
            unsubscribe: Some(Box::new(move || {
                if let Some(inner) = inner.upgrade() {
                    inner
                        .observers
                        .borrow_mut()
                        .retain(|o| !matches!(o, Observer::Watcher { id: w, .. } if *w == id));
                }
            })),
        }
    }

    /// Number of live observers (components and watchers)
    pub fn observer_count(&self) -> usize {
        self.prune();
        self.inner.observers.borrow().len()
    }

    fn subscribe(&self, trigger: &Rc<dyn Rerender>) {
        let weak = Rc::downgrade(trigger);
        let mut observers = self.inner.observers.borrow_mut();
        let known = observers
            .iter()
            .any(|o| matches!(o, Observer::Component(w) if Weak::ptr_eq(w, &weak)));
        if !known {
            observers.push(Observer::Component(weak));
        }
    }

    /// Drop subscriptions of components that no longer exist.
    fn prune(&self) {
        self.inner.observers.borrow_mut().retain(|o| match o {
            Observer::Component(w) => w.strong_count() > 0,
            Observer::Watcher { .. } => true,
        });
    }
}

impl<T: fmt::Debug> fmt::Debug for Signal<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Signal")
            .field("value", &self.inner.value.borrow())
            .field("observers", &self.inner.observers.borrow().len())
            .finish()
    }
}

// =============================================================================
// Watch
// =============================================================================

/// Subscription guard returned by [`Signal::watch`].
#[must_use = "dropping a Watch unsubscribes immediately"]
pub struct Watch {
    unsubscribe: Option<Box<dyn FnOnce()>>,
}

impl Watch {
    /// Keep the subscription for the lifetime of the signal.
    pub fn forget(mut self) {
        self.unsubscribe = None;
    }
}

impl Drop for Watch {
    fn drop(&mut self) {
        if let Some(unsubscribe) = self.unsubscribe.take() {
            unsubscribe();
        }
    }
}

impl fmt::Debug for Watch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Watch")
            .field("active", &self.unsubscribe.is_some())
            .finish()
    }
}
