//! Dialogue Graph Engine: the non-visual core of a branching dialogue
//! authoring tool.
//!
//! Evaluates choice prerequisites, plays a tree through in a preview
//! session, processes inline markup and `{$$variable}` interpolation, and
//! computes a deterministic graph layout. Trees are read-only inputs, so any
//! number of sessions and layout passes can share one.

pub mod core;
pub mod schema;
