//! Live reload for development.
//!
//! ```text
//! FsActor (output change) -> WsActor -> Browser
//! ```
//!
//! - `message` - JSON messages sent to the live-reload client
//! - `server` - WebSocket listener handing connections to `WsActor`

pub mod message;
pub mod server;
