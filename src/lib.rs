//! tola-reconcile - Minimal declarative UI core
//!
//! Describe a UI as a tree of immutable [`VNode`]s, mount it into a
//! [`Target`], and re-render: the reconciler computes the smallest list of
//! [`PatchAction`]s that turns what is shown into the new description.
//!
//! ## Modules
//!
//! | Module      | Role                                                  |
//! |-------------|-------------------------------------------------------|
//! | `node`      | `VNode` and its variants                              |
//! | `builder`   | `div`, `text`, `component`, ... constructors          |
//! | `attr`      | Style properties and event handlers                   |
//! | `algo`      | Minimal insert/delete/keep edit sequence              |
//! | `reconcile` | Tree diff producing patch actions                     |
//! | `patch`     | Patch actions and their application to a target       |
//! | `hooks`     | `use_state`, `use_effect`, `use_ref`, `use_memo`, signals |
//! | `root`      | Mounting, setters and effect flushing                 |
//! | `scheduler` | Cooperative priority scheduler with a frame budget    |
//! | `target`    | Backend adapter trait                                 |
//! | `memory`    | In-memory target for headless use and tests           |
//!
//! ## Usage
//!
//! ```ignore
//! use tola_reconcile::prelude::*;
//!
//! fn counter(cx: &mut RenderCx<'_>) -> VNode<NodeId> {
//!     let (count, set_count) = cx.use_state(0);
//!     button(
//!         nodes![count.to_string()],
//!         Attrs::new().on("click", move || set_count.set(count + 1)),
//!     )
//! }
//!
//! let mut target = MemoryTarget::new();
//! let body = target.create_root("body");
//! let root = Root::new(target, body);
//! root.render(div(vec![component(counter)], Attrs::new()))?;
//! ```
//!
//! Everything is single-threaded: nodes, hooks and roots are `!Send`.

// Macros first so every module can use them
#[macro_use]
mod macros;

/// Minimal edit sequence
pub mod algo;

/// Style properties and event handlers
pub mod attr;

/// Node constructors
pub mod builder;

/// Error types
pub mod error;

/// Hook engine and signals
pub mod hooks;

/// In-memory target
pub mod memory;

/// Node types
pub mod node;

/// Patch actions and executor
pub mod patch;

/// Prelude for common imports
pub mod prelude;

/// Tree reconciliation
pub mod reconcile;

/// Render roots
pub mod root;

/// Cooperative scheduler
pub mod scheduler;

/// Backend adapter
pub mod target;

// =============================================================================
// Re-exports
// =============================================================================

pub use algo::{Edit, EditStats, apply_edits, minimal_edit_sequence, minimal_edit_sequence_by};
pub use attr::{Attrs, Handler, PairsExt, StyleValue};
pub use builder::{
    ElementBuilder, button, component, component_with, div, element, footer, fragment, h1, h2,
    h3, header, label, li, ol, p, section, setup_component, span, text, ul,
};
pub use error::{RenderError, RenderResult};
pub use hooks::{Ref, RenderCx, Rerender, SetState, Signal, TearDown, Watch};
pub use memory::{HtmlConfig, MemoryTarget, NodeId};
pub use node::{ComponentCell, ComponentKind, VNode};
pub use patch::{Change, EventDiff, PatchAction, PatchStats, StyleDiff};
pub use reconcile::{ReconcileStats, Reconciler};
pub use root::{Root, RootStats};
pub use scheduler::{Scheduler, SchedulerConfig, TaskError, TickQueue, YieldHost};
pub use target::Target;
