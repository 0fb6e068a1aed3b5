//! Domain model for the TODO list.

pub mod todo;
