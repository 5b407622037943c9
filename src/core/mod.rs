//! The engine: conditions, text processing, the preview interpreter, layout
//! and diagnostics.

pub mod condition;
pub mod diagnostics;
pub mod layout;
pub mod markup;
pub mod portrait;
pub mod session;
pub mod store;
pub mod variables;
pub mod vocabulary;
