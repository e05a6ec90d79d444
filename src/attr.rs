//! Attribute system for VDOM elements
//!
//! An element carries two kinds of attributes:
//! - style properties: ordered `(name, value)` pairs
//! - event listeners: ordered `(event, handler)` pairs
//!
//! Both are plain vectors (small, ordered, cheap to diff), with lookup
//! helpers through [`PairsExt`].

use std::fmt;
use std::rc::Rc;

use compact_str::{CompactString, ToCompactString};

use crate::error::RenderResult;

// =============================================================================
// StyleValue
// =============================================================================

/// Value of a single style property.
#[derive(Debug, Clone, PartialEq)]
pub enum StyleValue {
    /// Numeric value, unit left to the target (e.g. `width: 300`)
    Number(f64),
    /// Keyword or string value (e.g. `color: "blue"`)
    Str(CompactString),
}

impl fmt::Display for StyleValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StyleValue::Number(n) => write!(f, "{n}"),
            StyleValue::Str(s) => f.write_str(s),
        }
    }
}

macro_rules! impl_style_number {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for StyleValue {
                fn from(value: $ty) -> Self {
                    StyleValue::Number(value as f64)
                }
            }
        )*
    };
}

impl_style_number!(i32, i64, u32, u64, f32, f64);

impl From<&str> for StyleValue {
    fn from(value: &str) -> Self {
        StyleValue::Str(value.into())
    }
}

impl From<String> for StyleValue {
    fn from(value: String) -> Self {
        StyleValue::Str(value.into())
    }
}

// =============================================================================
// Handler
// =============================================================================

/// Event handler callback.
///
/// Identity is pointer identity: two handlers are equal only if they are
/// clones of the same `Handler`. A closure rebuilt on every render is
/// therefore a new handler each time.
///
/// Handlers return `RenderResult` so that a state setter called inside one
/// can surface a failed re-render to whoever dispatched the event.
#[derive(Clone)]
pub struct Handler(Rc<dyn Fn() -> RenderResult<()>>);

impl Handler {
    /// Wrap a fallible callback.
    pub fn new(f: impl Fn() -> RenderResult<()> + 'static) -> Self {
        Self(Rc::new(f))
    }

    /// Wrap a callback that cannot fail.
    pub fn from_fn(f: impl Fn() + 'static) -> Self {
        Self::new(move || {
            f();
            Ok(())
        })
    }

    /// Invoke the handler.
    pub fn call(&self) -> RenderResult<()> {
        (self.0)()
    }

    /// Same underlying callback?
    #[inline]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl PartialEq for Handler {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl fmt::Debug for Handler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Handler({:p})", Rc::as_ptr(&self.0) as *const ())
    }
}

// =============================================================================
// Attrs
// =============================================================================

/// Style properties as ordered name/value pairs.
pub type Style = Vec<(CompactString, StyleValue)>;

/// Event listeners as ordered event/handler pairs.
pub type Listeners = Vec<(CompactString, Handler)>;

/// Recognized options of an element: style and event listeners.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Attrs {
    pub style: Style,
    pub listeners: Listeners,
}

impl Attrs {
    /// Empty attribute set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a style property.
    pub fn style(mut self, name: impl AsRef<str>, value: impl Into<StyleValue>) -> Self {
        self.style.set_pair(name.as_ref(), value.into());
        self
    }

    /// Attach a fallible listener for `event` (e.g. `"click"`).
    pub fn on(self, event: impl AsRef<str>, f: impl Fn() -> RenderResult<()> + 'static) -> Self {
        self.on_handler(event, Handler::new(f))
    }

    /// Attach an existing handler for `event`.
    pub fn on_handler(mut self, event: impl AsRef<str>, handler: Handler) -> Self {
        self.listeners.set_pair(event.as_ref(), handler);
        self
    }

    /// Look up a style property.
    pub fn get_style(&self, name: &str) -> Option<&StyleValue> {
        self.style.get_pair(name)
    }

    /// Look up a listener.
    pub fn listener(&self, event: &str) -> Option<&Handler> {
        self.listeners.get_pair(event)
    }

    pub fn is_empty(&self) -> bool {
        self.style.is_empty() && self.listeners.is_empty()
    }
}

/// Lookup helpers for ordered name/value vectors.
pub trait PairsExt<V> {
    /// Get a value by name
    fn get_pair(&self, name: &str) -> Option<&V>;

    /// Check if a name exists
    fn has_pair(&self, name: &str) -> bool {
        self.get_pair(name).is_some()
    }

    /// Insert or update a value, keeping first-insertion order
    fn set_pair(&mut self, name: &str, value: V);

    /// Remove a value by name, returning it if present
    fn remove_pair(&mut self, name: &str) -> Option<V>;
}

impl<V> PairsExt<V> for Vec<(CompactString, V)> {
    fn get_pair(&self, name: &str) -> Option<&V> {
        self.iter().find(|(k, _)| k == name).map(|(_, v)| v)
    }

    fn set_pair(&mut self, name: &str, value: V) {
        if let Some(pair) = self.iter_mut().find(|(k, _)| k == name) {
            pair.1 = value;
        } else {
            self.push((name.to_compact_string(), value));
        }
    }

    fn remove_pair(&mut self, name: &str) -> Option<V> {
        self.iter()
            .position(|(k, _)| k == name)
            .map(|pos| self.remove(pos).1)
    }
}

// =============================================================================
// Tests
// =============================================================================
