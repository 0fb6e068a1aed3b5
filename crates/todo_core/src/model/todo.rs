//! TODO item domain model.
//!
//! # Invariants
//! - `id` is assigned by storage, never reused and never changed.
//! - Blank text never reaches storage through the controller.

use serde::{Deserialize, Serialize};

/// Storage-assigned, auto-incrementing item identifier.
pub type TodoId = i64;

/// The only persisted entity: one line of TODO text.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TodoItem {
    pub id: TodoId,
    pub text: String,
}

impl TodoItem {
    pub fn new(id: TodoId, text: impl Into<String>) -> Self {
        Self {
            id,
            text: text.into(),
        }
    }
}

/// Returns whether `text` is acceptable as a submission.
///
/// Whitespace-only input counts as blank.
pub fn is_submittable(text: &str) -> bool {
    !text.trim().is_empty()
}
