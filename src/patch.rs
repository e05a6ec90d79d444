//! Patch actions and their executor.
//!
//! Reconciliation describes every change to already-rendered output as a
//! [`PatchAction`]. Actions are emitted in the order they must be applied:
//! a parent's child insertions and deletions before its attribute changes,
//! earlier siblings before later ones.
//!
//! # Action kinds
//!
//! | Action   | Effect on the target                                     |
//! |----------|----------------------------------------------------------|
//! | `Insert` | insert handles at a child position of a container        |
//! | `Delete` | detach handles from their parents                        |
//! | `Change` | update text, style properties or one event listener      |

use compact_str::CompactString;

use crate::attr::{Attrs, Handler, Listeners, PairsExt, Style, StyleValue};
use crate::error::RenderResult;
use crate::node::Handles;
use crate::target::Target;

// =============================================================================
// Public Types
// =============================================================================

/// One change to rendered output.
#[derive(Debug, Clone, PartialEq)]
pub enum PatchAction<H> {
    /// Insert `handles` (in order) at child position `index` of `container`
    Insert {
        container: H,
        index: usize,
        handles: Handles<H>,
    },
    /// Remove `handles` from wherever they are attached
    Delete { handles: Handles<H> },
    /// Update a single text or element handle in place
    Change { target: H, change: Change },
}

impl<H> PatchAction<H> {
    pub fn is_insert(&self) -> bool {
        matches!(self, PatchAction::Insert { .. })
    }

    pub fn is_delete(&self) -> bool {
        matches!(self, PatchAction::Delete { .. })
    }

    pub fn is_change(&self) -> bool {
        matches!(self, PatchAction::Change { .. })
    }
}

/// Payload of a `Change` action.
#[derive(Debug, Clone, PartialEq)]
pub enum Change {
    /// New text content
    Text(String),
    /// Changed style properties
    Style(StyleDiff),
    /// Swapped listener for one event
    Event(EventDiff),
}

/// Style properties that differ between two renders.
///
/// `None` means the property was removed. Properties that kept their value
/// are absent. Order: properties of the old style first (in their order),
/// then properties only the new style has.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StyleDiff(pub Vec<(CompactString, Option<StyleValue>)>);

impl StyleDiff {
    /// Diff two styles.
    pub fn between(old: &Style, new: &Style) -> Self {
        let mut out = Vec::new();
        for (name, value) in old {
            match new.get_pair(name) {
                None => out.push((name.clone(), None)),
                Some(next) if next != value => out.push((name.clone(), Some(next.clone()))),
                Some(_) => {}
            }
        }
        for (name, value) in new {
            if !old.has_pair(name) {
                out.push((name.clone(), Some(value.clone())));
            }
        }
        Self(out)
    }

    /// Entry for `name`: `Some(None)` if removed, `Some(Some(v))` if set.
    pub fn get(&self, name: &str) -> Option<Option<&StyleValue>> {
        self.0.iter().find(|(k, _)| k == name).map(|(_, v)| v.as_ref())
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, Option<&StyleValue>)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_ref()))
    }
}

/// Old and new listener for one event; identical handlers never appear.
#[derive(Debug, Clone, PartialEq)]
pub struct EventDiff {
    pub event: CompactString,
    pub old: Option<Handler>,
    pub new: Option<Handler>,
}

impl EventDiff {
    /// Diff two listener lists, one entry per event whose handler changed.
    pub fn between(old: &Listeners, new: &Listeners) -> Vec<Self> {
        let mut out = Vec::new();
        for (event, handler) in old {
            let next = new.get_pair(event);
            if next != Some(handler) {
                out.push(Self {
                    event: event.clone(),
                    old: Some(handler.clone()),
                    new: next.cloned(),
                });
            }
        }
        for (event, handler) in new {
            if !old.has_pair(event) {
                out.push(Self {
                    event: event.clone(),
                    old: None,
                    new: Some(handler.clone()),
                });
            }
        }
        out
    }
}

/// Append the change actions that turn `old` attributes into `new` on
/// `target`. Nothing is appended when they are equivalent.
pub fn diff_attrs<H: Clone>(target: &H, old: &Attrs, new: &Attrs, out: &mut Vec<PatchAction<H>>) {
    let style = StyleDiff::between(&old.style, &new.style);
    if !style.is_empty() {
        out.push(PatchAction::Change {
            target: target.clone(),
            change: Change::Style(style),
        });
    }
    out.extend(
        EventDiff::between(&old.listeners, &new.listeners)
            .into_iter()
            .map(|event| PatchAction::Change {
                target: target.clone(),
                change: Change::Event(event),
            }),
    );
}

// =============================================================================
// Executor
// =============================================================================

/// Counters for a batch of applied actions.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct PatchStats {
    pub inserted: usize,
    pub deleted: usize,
    pub changed: usize,
}

impl PatchStats {
    #[inline]
    pub fn total(&self) -> usize {
        self.inserted + self.deleted + self.changed
    }
}

/// Execute one action against the target.
pub fn apply<T: Target>(target: &mut T, action: &PatchAction<T::Handle>) -> RenderResult<()> {
    match action {
        PatchAction::Insert {
            container,
            index,
            handles,
        } => target.insert(container, *index, handles),
        PatchAction::Delete { handles } => {
            for handle in handles {
                target.remove(handle)?;
            }
            Ok(())
        }
        PatchAction::Change { target: handle, change } => match change {
            Change::Text(content) => target.set_text(handle, content),
            Change::Style(diff) => {
                for (name, value) in diff.iter() {
                    target.set_style(handle, name, value)?;
                }
                Ok(())
            }
            Change::Event(diff) => {
                target.set_listener(handle, &diff.event, diff.old.as_ref(), diff.new.as_ref())
            }
        },
    }
}

/// Execute actions in order, stopping at the first failure.
pub fn apply_all<T: Target>(
    target: &mut T,
    actions: &[PatchAction<T::Handle>],
) -> RenderResult<PatchStats> {
    let mut stats = PatchStats::default();
    for action in actions {
        apply(target, action)?;
        match action {
            PatchAction::Insert { .. } => stats.inserted += 1,
            PatchAction::Delete { .. } => stats.deleted += 1,
            PatchAction::Change { .. } => stats.changed += 1,
        }
    }
    if stats.total() > 0 {
        tracing::debug!(
            inserted = stats.inserted,
            deleted = stats.deleted,
            changed = stats.changed,
            "applied patch"
        );
    }
    Ok(stats)
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryTarget;

    fn style(pairs: &[(&str, StyleValue)]) -> Style {
        pairs.iter().map(|(k, v)| ((*k).into(), v.clone())).collect()
    }

    #[test]
    fn test_style_diff() {
        let old = style(&[("width", 300.into()), ("height", 200.into()), ("color", "blue".into())]);
        let new = style(&[("height", 100.into()), ("color", "blue".into()), ("bgColor", "grey".into())]);

        let diff = StyleDiff::between(&old, &new);
        assert_eq!(diff.len(), 3);
        assert_eq!(diff.get("width"), Some(None));
        assert_eq!(diff.get("height"), Some(Some(&StyleValue::Number(100.0))));
        assert_eq!(diff.get("bgColor"), Some(Some(&StyleValue::Str("grey".into()))));
        assert_eq!(diff.get("color"), None);
    }

    #[test]
    fn test_equal_styles_produce_no_action() {
        let attrs = Attrs::new().style("width", 1).style("color", "red");
        let mut out: Vec<PatchAction<u32>> = Vec::new();
        diff_attrs(&0, &attrs, &attrs.clone(), &mut out);
        assert!(out.is_empty());
    }

    #[test]
    fn test_event_diff_suppresses_identical_handlers() {
        let shared = Handler::from_fn(|| {});
        let old = Attrs::new()
            .on_handler("click", shared.clone())
            .on("hover", || Ok(()));
        let new = Attrs::new()
            .on_handler("click", shared)
            .on("focus", || Ok(()));

        let diffs = EventDiff::between(&old.listeners, &new.listeners);
        let events: Vec<_> = diffs.iter().map(|d| d.event.as_str()).collect();
        assert_eq!(events, vec!["hover", "focus"]);
        assert!(diffs[0].new.is_none());
        assert!(diffs[1].old.is_none());
    }

    #[test]
    fn test_apply_insert_and_delete() {
        let mut target = MemoryTarget::new();
        let root = target.create_root("div");
        let a = target.create_text("a");
        let b = target.create_text("b");
        let c = target.create_text("c");

        let actions = vec![
            PatchAction::Insert { container: root, index: 0, handles: [a, c].into_iter().collect() },
            PatchAction::Insert { container: root, index: 1, handles: [b].into_iter().collect() },
        ];
        let stats = apply_all(&mut target, &actions).unwrap();
        assert_eq!(stats.inserted, 2);
        assert_eq!(target.text_content(root), "abc");

        apply(&mut target, &PatchAction::Delete { handles: [b].into_iter().collect() }).unwrap();
        assert_eq!(target.text_content(root), "ac");
    }

    #[test]
    fn test_apply_changes() {
        let mut target = MemoryTarget::new();
        let root = target.create_root("div");
        let text = target.create_text("old");
        target.append(&root, &text).unwrap();

        let handler = Handler::from_fn(|| {});
        let actions = vec![
            PatchAction::Change { target: text, change: Change::Text("new".into()) },
            PatchAction::Change {
                target: root,
                change: Change::Style(StyleDiff(vec![("width".into(), Some(5.into()))])),
            },
            PatchAction::Change {
                target: root,
                change: Change::Event(EventDiff { event: "click".into(), old: None, new: Some(handler.clone()) }),
            },
        ];
        let stats = apply_all(&mut target, &actions).unwrap();

        assert_eq!(stats, PatchStats { inserted: 0, deleted: 0, changed: 3 });
        assert_eq!(target.text_content(root), "new");
        assert_eq!(target.style(root, "width"), Some(&StyleValue::Number(5.0)));
        assert_eq!(target.listener(&root, "click"), Some(handler));
    }
}
