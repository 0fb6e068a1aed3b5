//! Use-case layer between the view and the storage module.
//!
//! # Invariants
//! - The controller's list is always a copy rebuilt from storage.
//! - Views never call the repository directly.

pub mod todo_controller;
