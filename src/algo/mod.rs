//! Algorithm implementations for VDOM operations.
//!
//! - `edit`: minimal keep/insert/delete script between two sequences

mod edit;

pub use edit::{Edit, EditStats, apply_edits, minimal_edit_sequence, minimal_edit_sequence_by};
