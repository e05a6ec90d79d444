//! Prelude module for common imports.
//!
//! ```ignore
//! use tola_reconcile::prelude::*;
//! ```

// Nodes and builders
pub use crate::builder::{
    button, component, component_with, div, element, fragment, li, p, setup_component, span,
    text, ul,
};
pub use crate::node::VNode;
pub use crate::nodes;

// Attributes
pub use crate::attr::{Attrs, Handler, StyleValue};

// Hooks
pub use crate::hooks::{Ref, RenderCx, SetState, Signal, Watch};

// Mounting
pub use crate::memory::{MemoryTarget, NodeId};
pub use crate::root::Root;
pub use crate::scheduler::{Scheduler, SchedulerConfig, TickQueue};
pub use crate::target::Target;

// Error
pub use crate::error::{RenderError, RenderResult};
