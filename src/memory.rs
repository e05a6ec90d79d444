//! In-memory target.
//!
//! An arena-backed tree that implements [`Target`]. Useful for headless
//! rendering, snapshot tests and as a reference adapter: every operation
//! checks its handles and reports misuse as an error instead of panicking.

use compact_str::CompactString;
use rustc_hash::FxHashMap;

use crate::attr::{Handler, PairsExt, Style, StyleValue};
use crate::error::{RenderError, RenderResult};
use crate::target::Target;

// =============================================================================
// Public Types
// =============================================================================

/// Handle of a node in a [`MemoryTarget`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(u32);

impl NodeId {
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

#[derive(Debug, Clone)]
enum Kind {
    Element(CompactString),
    Text(String),
    Marker(CompactString),
}

#[derive(Debug, Clone)]
struct MemoryNode {
    kind: Kind,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    style: Style,
}

/// HTML serialization options.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HtmlConfig {
    /// Emit fragment boundary markers as comments
    pub markers: bool,
}

impl HtmlConfig {
    /// Plain output, markers hidden.
    pub const PLAIN: Self = Self { markers: false };
    /// Debug output, markers shown as `<!--label-->`.
    pub const DEBUG: Self = Self { markers: true };
}

impl Default for HtmlConfig {
    fn default() -> Self {
        Self::PLAIN
    }
}

// =============================================================================
// MemoryTarget
// =============================================================================

/// Arena tree implementing [`Target`].
#[derive(Debug, Default)]
pub struct MemoryTarget {
    nodes: Vec<MemoryNode>,
    listeners: FxHashMap<(NodeId, CompactString), Handler>,
    mutations: usize,
}

impl MemoryTarget {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a detached element to mount trees into.
    ///
    /// Unlike [`Target::create_element`] this never fails; the tag is not
    /// validated.
    pub fn create_root(&mut self, tag: &str) -> NodeId {
        self.alloc(Kind::Element(tag.into()))
    }

    /// Number of nodes ever created
    #[inline]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Number of structural or content changes made so far
    #[inline]
    pub fn mutations(&self) -> usize {
        self.mutations
    }

    /// Tag of an element node
    pub fn tag(&self, id: NodeId) -> Option<&str> {
        match &self.nodes.get(id.index())?.kind {
            Kind::Element(tag) => Some(tag),
            _ => None,
        }
    }

    /// Content of a text node
    pub fn text(&self, id: NodeId) -> Option<&str> {
        match &self.nodes.get(id.index())?.kind {
            Kind::Text(content) => Some(content),
            _ => None,
        }
    }

    /// Children of a node (empty for unknown handles)
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.nodes
            .get(id.index())
            .map(|node| node.children.as_slice())
            .unwrap_or_default()
    }

    pub fn style(&self, id: NodeId, name: &str) -> Option<&StyleValue> {
        self.nodes.get(id.index())?.style.get_pair(name)
    }

    /// Concatenated text of all descendant text nodes, in document order.
    pub fn text_content(&self, id: NodeId) -> String {
        let mut out = String::new();
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            let Some(node) = self.nodes.get(current.index()) else {
                continue;
            };
            if let Kind::Text(content) = &node.kind {
                out.push_str(content);
            }
            stack.extend(node.children.iter().rev());
        }
        out
    }

    /// First element with `tag` under `root` (depth-first, `root` included).
    pub fn find(&self, root: NodeId, tag: &str) -> Option<NodeId> {
        self.find_all(root, tag).into_iter().next()
    }

    /// Every element with `tag` under `root`, in document order.
    pub fn find_all(&self, root: NodeId, tag: &str) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack = vec![root];
        while let Some(current) = stack.pop() {
            let Some(node) = self.nodes.get(current.index()) else {
                continue;
            };
            if matches!(&node.kind, Kind::Element(t) if t == tag) {
                out.push(current);
            }
            stack.extend(node.children.iter().rev());
        }
        out
    }

    /// Serialize the subtree under `id` as HTML, markers hidden.
    pub fn to_html(&self, id: NodeId) -> String {
        self.to_html_with(id, HtmlConfig::PLAIN)
    }

    /// Serialize the subtree under `id` as HTML.
    pub fn to_html_with(&self, id: NodeId, config: HtmlConfig) -> String {
        enum Step {
            Open(NodeId),
            Close(NodeId),
        }

        let mut out = String::new();
        let mut stack = vec![Step::Open(id)];
        while let Some(step) = stack.pop() {
            match step {
                Step::Open(current) => {
                    let Some(node) = self.nodes.get(current.index()) else {
                        continue;
                    };
                    match &node.kind {
                        Kind::Text(content) => out.push_str(&escape_html(content)),
                        Kind::Marker(label) => {
                            if config.markers {
                                out.push_str("<!--");
                                out.push_str(label);
                                out.push_str("-->");
                            }
                        }
                        Kind::Element(tag) => {
                            out.push('<');
                            out.push_str(tag);
                            render_style(&node.style, &mut out);
                            out.push('>');
                            stack.push(Step::Close(current));
                            stack.extend(node.children.iter().rev().map(|&c| Step::Open(c)));
                        }
                    }
                }
                Step::Close(current) => {
                    if let Some(tag) = self.tag(current) {
                        out.push_str("</");
                        out.push_str(tag);
                        out.push('>');
                    }
                }
            }
        }
        out
    }

    // -------------------------------------------------------------------------
    // Internals
    // -------------------------------------------------------------------------

    fn alloc(&mut self, kind: Kind) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(MemoryNode {
            kind,
            parent: None,
            children: Vec::new(),
            style: Style::new(),
        });
        id
    }

    fn node(&self, id: NodeId) -> RenderResult<&MemoryNode> {
        self.nodes
            .get(id.index())
            .ok_or_else(|| RenderError::unknown_handle(&id))
    }

    fn node_mut(&mut self, id: NodeId) -> RenderResult<&mut MemoryNode> {
        self.nodes
            .get_mut(id.index())
            .ok_or_else(|| RenderError::unknown_handle(&id))
    }

    fn element_mut(&mut self, id: NodeId) -> RenderResult<&mut MemoryNode> {
        let node = self.node_mut(id)?;
        match node.kind {
            Kind::Element(_) => Ok(node),
            _ => Err(RenderError::NotAContainer),
        }
    }

    fn detach(&mut self, id: NodeId) -> RenderResult<()> {
        let Some(parent) = self.node_mut(id)?.parent.take() else {
            return Ok(());
        };
        self.node_mut(parent)?.children.retain(|&c| c != id);
        Ok(())
    }
}

impl Target for MemoryTarget {
    type Handle = NodeId;

    fn create_text(&mut self, content: &str) -> NodeId {
        self.alloc(Kind::Text(content.to_owned()))
    }

    fn create_element(&mut self, tag: &str) -> RenderResult<NodeId> {
        let valid = tag.chars().next().is_some_and(|c| c.is_ascii_alphabetic())
            && tag.chars().all(|c| c.is_ascii_alphanumeric() || c == '-');
        if !valid {
            return Err(RenderError::unknown_tag(tag));
        }
        Ok(self.alloc(Kind::Element(tag.into())))
    }

    fn create_marker(&mut self, label: &str) -> NodeId {
        self.alloc(Kind::Marker(label.into()))
    }

    fn append(&mut self, parent: &NodeId, child: &NodeId) -> RenderResult<()> {
        let len = self.node(*parent)?.children.len();
        self.insert(parent, len, std::slice::from_ref(child))
    }

    fn insert(&mut self, container: &NodeId, index: usize, handles: &[NodeId]) -> RenderResult<()> {
        self.element_mut(*container)?;
        for &handle in handles {
            self.node(handle)?;
            self.detach(handle)?;
        }

        let node = self.element_mut(*container)?;
        let at = index.min(node.children.len());
        node.children.splice(at..at, handles.iter().copied());
        for &handle in handles {
            self.node_mut(handle)?.parent = Some(*container);
        }
        self.mutations += 1;
        Ok(())
    }

    fn remove(&mut self, handle: &NodeId) -> RenderResult<()> {
        if self.node(*handle)?.parent.is_some() {
            self.detach(*handle)?;
            self.mutations += 1;
        }
        Ok(())
    }

    fn set_text(&mut self, handle: &NodeId, content: &str) -> RenderResult<()> {
        match &mut self.node_mut(*handle)?.kind {
            Kind::Text(text) => {
                content.clone_into(text);
                self.mutations += 1;
                Ok(())
            }
            _ => Err(RenderError::unknown_handle(handle)),
        }
    }

    fn set_style(&mut self, handle: &NodeId, name: &str, value: Option<&StyleValue>) -> RenderResult<()> {
        let node = self.element_mut(*handle)?;
        match value {
            Some(value) => node.style.set_pair(name, value.clone()),
            None => {
                node.style.remove_pair(name);
            }
        }
        self.mutations += 1;
        Ok(())
    }

    fn set_listener(
        &mut self,
        handle: &NodeId,
        event: &str,
        _old: Option<&Handler>,
        new: Option<&Handler>,
    ) -> RenderResult<()> {
        self.element_mut(*handle)?;
        let key = (*handle, CompactString::from(event));
        match new {
            Some(handler) => {
                self.listeners.insert(key, handler.clone());
            }
            None => {
                self.listeners.remove(&key);
            }
        }
        self.mutations += 1;
        Ok(())
    }

    fn parent(&self, handle: &NodeId) -> Option<NodeId> {
        self.nodes.get(handle.index())?.parent
    }

    fn index_in_parent(&self, handle: &NodeId) -> Option<usize> {
        let parent = self.parent(handle)?;
        self.children(parent).iter().position(|c| c == handle)
    }

    fn child_count(&self, container: &NodeId) -> RenderResult<usize> {
        match &self.node(*container)?.kind {
            Kind::Element(_) => Ok(self.children(*container).len()),
            _ => Err(RenderError::NotAContainer),
        }
    }

    fn listener(&self, handle: &NodeId, event: &str) -> Option<Handler> {
        self.listeners.get(&(*handle, CompactString::from(event))).cloned()
    }
}

// =============================================================================
// HTML helpers
// =============================================================================

fn render_style(style: &Style, out: &mut String) {
    if style.is_empty() {
        return;
    }
    out.push_str(" style=\"");
    for (i, (name, value)) in style.iter().enumerate() {
        if i > 0 {
            out.push(';');
        }
        out.push_str(name);
        out.push(':');
        out.push_str(&escape_attr(&value.to_string()));
    }
    out.push('"');
}

/// Escape HTML special characters.
fn escape_html(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => result.push_str("&amp;"),
            '<' => result.push_str("&lt;"),
            '>' => result.push_str("&gt;"),
            _ => result.push(c),
        }
    }
    result
}

/// Escape attribute value special characters.
fn escape_attr(s: &str) -> String {
    escape_html(s).replace('"', "&quot;")
}

// =============================================================================
// Tests
// =============================================================================
