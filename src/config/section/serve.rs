//! `[serve]` section configuration.
//!
//! Contains development server settings.
//!
//! # Example
//!
//! ```toml
//! [serve]
//! interface = "127.0.0.1"             # Network interface (127.0.0.1 = localhost only)
//! port = 4000                         # HTTP port number
//! reload_port = 35729                 # WebSocket port for live reload
//! ignored = ["node_modules", "fonts"] # Output subtrees that never trigger a reload
//! ```
//!
//! Use `interface = "0.0.0.0"` to make the server accessible from LAN.

use std::net::{IpAddr, Ipv4Addr};

use crate::config::{ConfigDiagnostics, FieldPath};
use serde::{Deserialize, Serialize};

/// Development server settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServeConfig {
    /// Network interface to bind.
    /// - `127.0.0.1` (default): localhost only
    /// - `0.0.0.0`: all interfaces (LAN accessible)
    pub interface: IpAddr,

    /// HTTP port number.
    pub port: u16,

    /// WebSocket port for live reload.
    pub reload_port: u16,

    /// Output directory names excluded from the reload watcher.
    pub ignored: Vec<String>,
}

impl ServeConfig {
    pub const PORT: FieldPath = FieldPath::new("serve.port");

    pub fn validate(&self, diag: &mut ConfigDiagnostics) {
        if self.port != 0 && self.port == self.reload_port {
            diag.error_with_hint(
                Self::PORT,
                format!("port {} is also used as reload_port", self.port),
                "pick distinct values for serve.port and serve.reload_port",
            );
        }
    }
}

impl Default for ServeConfig {
    fn default() -> Self {
        Self {
            interface: IpAddr::V4(Ipv4Addr::new(127, 0, 0, 1)),
            port: 4000,
            reload_port: 35729,
            ignored: vec!["node_modules".into(), "fonts".into()],
        }
    }
}
