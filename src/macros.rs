//! Accessor and construction macros
//!
//! All macros use `paste` internally for identifier concatenation.

// =============================================================================
// Enum accessor generation
// =============================================================================

/// Generate is_xxx and as_xxx for enums whose variants wrap `Rc<Type<H>>`
///
/// Uses paste's `:camel` modifier to convert method name to variant name.
/// # Generated methods per variant:
/// - `is_xxx(&self) -> bool`
/// - `as_xxx(&self) -> Option<&Type<H>>`
///
/// No `_mut` accessors: nodes are shared and immutable once built.
///
/// # Example
/// ```ignore
/// impl<H> VNode<H> {
///     // element -> Element, text -> Text, fragment -> Fragment
///     impl_enum_accessors!(H; element, text, fragment);
/// }
/// ```
#[macro_export]
macro_rules! impl_enum_accessors {
    ($handle:ty; $($variant:ident),* $(,)?) => {
        ::paste::paste! {
            $(
                #[doc = "Check if this is a " [<$variant:camel>] " node"]
                #[inline]
                pub fn [<is_ $variant>](&self) -> bool {
                    matches!(self, Self::[<$variant:camel>](_))
                }

                #[doc = "Try to get as " $variant " reference"]
                #[inline]
                pub fn [<as_ $variant>](&self) -> Option<&[<$variant:camel>]<$handle>> {
                    match self { Self::[<$variant:camel>](v) => Some(&**v), _ => None }
                }
            )*
        }
    };
}

// =============================================================================
// Children lists
// =============================================================================

/// Build a `Vec<VNode<_>>` from mixed children.
///
/// Every item goes through `VNode::from`, so string literals, `String`s,
/// builders and nodes can sit side by side.
///
/// # Example
/// ```ignore
/// let children = nodes!["count: ", count.to_string(), button(nodes!["+"], attrs)];
/// ```
#[macro_export]
macro_rules! nodes {
    () => {
        ::std::vec::Vec::new()
    };
    ($($child:expr),+ $(,)?) => {
        ::std::vec![$($crate::VNode::from($child)),+]
    };
}
