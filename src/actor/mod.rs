//! Actor system for development mode.
//!
//! Message-passing concurrency for watch mode:
//!
//! ```text
//! FsActor --Rebuild--> BuildActor          (source changes)
//! FsActor --Reload---> WsActor --> Clients (output changes)
//! ```
//!
//! # Module Structure
//!
//! - `messages` - Message types for inter-actor communication
//! - `subscription` - Glob table routing source changes to stages
//! - `fs` - File system watcher
//! - `build` - Serial stage rebuilds
//! - `ws` - WebSocket broadcast
//! - `coordinator` - Wires up and runs actors

pub mod build;
pub mod coordinator;
pub mod fs;
pub mod messages;
pub mod subscription;
pub mod ws;

pub use coordinator::Coordinator;
