//! Node constructors.
//!
//! ```ignore
//! let view = div(
//!     nodes!["count: ", count.to_string()],
//!     Attrs::new().style("width", 300),
//! );
//! let counter = component(|cx| {
//!     let (n, set_n) = cx.use_state(0);
//!     button(nodes![n.to_string()], Attrs::new().on("click", move || set_n.set(n + 1)))
//! });
//! ```

use std::rc::Rc;

use compact_str::CompactString;

use crate::attr::{Attrs, Handler, PairsExt, StyleValue};
use crate::error::RenderResult;
use crate::hooks::RenderCx;
use crate::node::{
    BoxedRender, Children, Component, ComponentKind, Element, Fragment, Producer, RenderFn,
    SetupFn, Text, VNode,
};

// =============================================================================
// Leaves and groups
// =============================================================================

/// Text node.
pub fn text<H>(content: impl Into<String>) -> VNode<H> {
    VNode::Text(Rc::new(Text::new(content)))
}

/// Fragment: children without a wrapper element.
pub fn fragment<H>(children: impl IntoIterator<Item = VNode<H>>) -> VNode<H> {
    VNode::Fragment(Rc::new(Fragment::new(children.into_iter().collect())))
}

// =============================================================================
// Elements
// =============================================================================

/// Start building an element with `tag`.
pub fn element<H>(tag: impl Into<CompactString>) -> ElementBuilder<H> {
    ElementBuilder {
        tag: tag.into(),
        attrs: Attrs::new(),
        children: Children::new(),
    }
}

/// Incremental element construction.
pub struct ElementBuilder<H> {
    tag: CompactString,
    attrs: Attrs,
    children: Children<H>,
}

impl<H> ElementBuilder<H> {
    pub fn child(mut self, child: impl Into<VNode<H>>) -> Self {
        self.children.push(child.into());
        self
    }

    pub fn children(mut self, children: impl IntoIterator<Item = VNode<H>>) -> Self {
        self.children.extend(children);
        self
    }

    /// Replace all attributes.
    pub fn attrs(mut self, attrs: Attrs) -> Self {
        self.attrs = attrs;
        self
    }

    pub fn style(mut self, name: impl AsRef<str>, value: impl Into<StyleValue>) -> Self {
        self.attrs.style.set_pair(name.as_ref(), value.into());
        self
    }

    pub fn on(mut self, event: impl AsRef<str>, f: impl Fn() -> RenderResult<()> + 'static) -> Self {
        self.attrs.listeners.set_pair(event.as_ref(), Handler::new(f));
        self
    }

    /// Finish with trailing `children` and extra `attrs`.
    ///
    /// Attributes given here override ones set earlier with the same name.
    pub fn build(mut self, children: impl IntoIterator<Item = VNode<H>>, attrs: Attrs) -> VNode<H> {
        self.children.extend(children);
        for (name, value) in attrs.style {
            self.attrs.style.set_pair(&name, value);
        }
        for (event, handler) in attrs.listeners {
            self.attrs.listeners.set_pair(&event, handler);
        }
        self.finish()
    }

    /// Finish with what has been set so far.
    pub fn finish(self) -> VNode<H> {
        Element::with_parts(self.tag, self.attrs, self.children).into()
    }
}

impl<H> From<ElementBuilder<H>> for VNode<H> {
    fn from(builder: ElementBuilder<H>) -> Self {
        builder.finish()
    }
}

macro_rules! element_shorthands {
    ($($tag:ident),* $(,)?) => {
        $(
            #[doc = concat!("`<", stringify!($tag), ">` element with `children` and `attrs`.")]
            pub fn $tag<H>(children: impl IntoIterator<Item = VNode<H>>, attrs: Attrs) -> VNode<H> {
                element(stringify!($tag)).build(children, attrs)
            }
        )*
    };
}

element_shorthands!(div, span, p, button, ul, ol, li, h1, h2, h3, section, header, footer, label);

// =============================================================================
// Components
// =============================================================================

/// Component re-evaluated by calling `f` on every render.
///
/// Identity is the type of `f`: every node built from the same function
/// or closure definition is the same kind of component.
pub fn component<H, F>(f: F) -> VNode<H>
where
    H: 'static,
    F: Fn(&mut RenderCx<'_>) -> VNode<H> + 'static,
{
    let render: RenderFn<H> = Rc::new(f);
    VNode::Component(Rc::new(Component::new(
        ComponentKind::of::<F>(),
        Producer::Render(render),
    )))
}

/// Component with an input value, passed to `f` by reference.
///
/// Identity is the type of `f`, so the same function with different
/// inputs reconciles as the same component.
pub fn component_with<H, F, P>(f: F, input: P) -> VNode<H>
where
    H: 'static,
    F: Fn(&mut RenderCx<'_>, &P) -> VNode<H> + 'static,
    P: 'static,
{
    let render: RenderFn<H> = Rc::new(move |cx: &mut RenderCx<'_>| f(cx, &input));
    VNode::Component(Rc::new(Component::new(
        ComponentKind::of::<F>(),
        Producer::Render(render),
    )))
}

/// Component whose `setup` runs once, on first render, and returns the
/// closure used for that and every later render.
///
/// State created in `setup` (signals, plain variables moved into the
/// closure) lives as long as the component. Later nodes of the same kind
/// only trigger a re-render; their own `setup` is never called.
pub fn setup_component<H, S, R>(setup: S) -> VNode<H>
where
    H: 'static,
    S: Fn() -> R + 'static,
    R: FnMut(&mut RenderCx<'_>) -> VNode<H> + 'static,
{
    let producer: SetupFn<H> = Rc::new(move || -> BoxedRender<H> { Box::new(setup()) });
    VNode::Component(Rc::new(Component::new(
        ComponentKind::of::<S>(),
        Producer::Setup(producer),
    )))
}
