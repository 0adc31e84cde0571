//! Actor message definitions.
//!
//! ```text
//! FsActor --Rebuild--> BuildActor
//! FsActor --Reload---> WsActor
//! ```

use std::net::TcpStream;
use std::path::PathBuf;

use super::subscription::WatchScope;
use crate::compiler::StageKind;

/// Messages to the build actor
#[derive(Debug)]
pub enum BuildMsg {
    /// Rebuild a stage after `path` changed
    Rebuild {
        stage: StageKind,
        path: PathBuf,
        scope: WatchScope,
    },
    Shutdown,
}

/// Messages to the WebSocket actor
#[derive(Debug)]
pub enum WsMsg {
    /// Tell every connected browser to reload
    Reload { reason: String },
    /// Accepted connection, handshake still pending
    AddClient(TcpStream),
    Shutdown,
}
