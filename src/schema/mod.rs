//! Dialogue tree data model.

pub mod choice;
pub mod prerequisites;
pub mod state;
pub mod tree;
