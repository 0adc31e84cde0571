//! Core types - pure abstractions shared across the codebase.

mod driver;
mod state;

pub use driver::BuildMode;
pub use state::{is_shutdown, register_server, setup_shutdown_handler};
