//! Repository layer: the storage module behind the controller.
//!
//! # Invariants
//! - SQL stays inside this layer.
//! - Missing ids are never reported as errors.

pub mod todo_repo;
