//! State setters and mutable refs.

use std::cell::{Ref as CellRef, RefCell, RefMut};
use std::fmt;
use std::rc::Rc;

use crate::error::RenderResult;

use super::Rerender;

// =============================================================================
// SetState<T>
// =============================================================================

/// Setter returned by `use_state`.
///
/// Setting a value equal to the current one does nothing. Setting a
/// different value stores it and re-renders the owning component right
/// away (or, if a render pass is in progress, right after it).
pub struct SetState<T> {
    cell: Rc<RefCell<T>>,
    trigger: Rc<dyn Rerender>,
}

impl<T> Clone for SetState<T> {
    fn clone(&self) -> Self {
        Self {
            cell: Rc::clone(&self.cell),
            trigger: Rc::clone(&self.trigger),
        }
    }
}

impl<T: PartialEq + 'static> SetState<T> {
    pub(crate) fn new(cell: Rc<RefCell<T>>, trigger: Rc<dyn Rerender>) -> Self {
        Self { cell, trigger }
    }

    /// Replace the value.
    pub fn set(&self, value: T) -> RenderResult<()> {
        if *self.cell.borrow() == value {
            return Ok(());
        }
        *self.cell.borrow_mut() = value;
        self.trigger.rerender()
    }

    /// Compute the next value from the current one.
    pub fn update(&self, f: impl FnOnce(&T) -> T) -> RenderResult<()> {
        let next = f(&*self.cell.borrow());
        self.set(next)
    }
}

impl<T: Clone> SetState<T> {
    /// Current value, which may be newer than the one the render saw.
    pub fn get(&self) -> T {
        self.cell.borrow().clone()
    }
}

impl<T: fmt::Debug> fmt::Debug for SetState<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("SetState").field(&self.cell.borrow()).finish()
    }
}

// =============================================================================
// Ref<T>
// =============================================================================

/// Mutable box returned by `use_ref`; the same box on every render.
///
/// Writing through a `Ref` never re-renders.
pub struct Ref<T>(Rc<RefCell<T>>);

impl<T> Clone for Ref<T> {
    fn clone(&self) -> Self {
        Self(Rc::clone(&self.0))
    }
}

impl<T> Ref<T> {
    pub(crate) fn from_cell(cell: Rc<RefCell<T>>) -> Self {
        Self(cell)
    }

    pub fn borrow(&self) -> CellRef<'_, T> {
        self.0.borrow()
    }

    pub fn borrow_mut(&self) -> RefMut<'_, T> {
        self.0.borrow_mut()
    }

    /// Replace the value, returning the old one.
    pub fn replace(&self, value: T) -> T {
        self.0.replace(value)
    }

    /// Same box?
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl<T: Clone> Ref<T> {
    pub fn get(&self) -> T {
        self.0.borrow().clone()
    }
}

impl<T: fmt::Debug> fmt::Debug for Ref<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Ref").field(&self.0.borrow()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[derive(Default)]
    struct CountingTrigger(Cell<usize>);

    impl Rerender for CountingTrigger {
        fn rerender(&self) -> RenderResult<()> {
            self.0.set(self.0.get() + 1);
            Ok(())
        }
    }

    #[test]
    fn test_set_equal_value_is_noop() {
        let trigger = Rc::new(CountingTrigger::default());
        let setter = SetState::new(Rc::new(RefCell::new(1)), trigger.clone());

        setter.set(1).unwrap();
        assert_eq!(trigger.0.get(), 0);

        setter.set(2).unwrap();
        assert_eq!(trigger.0.get(), 1);
        assert_eq!(setter.get(), 2);
    }

    #[test]
    fn test_update_from_current() {
        let trigger = Rc::new(CountingTrigger::default());
        let setter = SetState::new(Rc::new(RefCell::new(10)), trigger.clone());

        setter.update(|n| n + 5).unwrap();
        setter.update(|n| n + 5).unwrap();
        assert_eq!(setter.get(), 20);
        assert_eq!(trigger.0.get(), 2);
    }

    #[test]
    fn test_ref_is_shared() {
        let r = Ref::from_cell(Rc::new(RefCell::new(vec![1])));
        let alias = r.clone();
        alias.borrow_mut().push(2);
        assert_eq!(r.get(), vec![1, 2]);
        assert_eq!(r.replace(vec![]), vec![1, 2]);
        assert!(r.ptr_eq(&alias));
    }
}
