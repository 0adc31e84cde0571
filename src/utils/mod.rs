//! Small helpers shared across the codebase.

pub mod mime;
pub mod path;
