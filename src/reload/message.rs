//! Live reload message protocol.
//!
//! JSON messages pushed over the WebSocket to the injected client:
//!
//! - `connected`: handshake finished
//! - `reload`: refresh the page

use serde::{Deserialize, Serialize};

/// Message sent over WebSocket
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ReloadMessage {
    /// Full page reload
    Reload {
        #[serde(skip_serializing_if = "Option::is_none")]
        reason: Option<String>,
    },

    /// Connection established
    Connected {
        /// Server version for compatibility check
        version: String,
    },
}

impl ReloadMessage {
    pub fn reload() -> Self {
        Self::Reload { reason: None }
    }

    pub fn reload_with_reason(reason: impl Into<String>) -> Self {
        Self::Reload {
            reason: Some(reason.into()),
        }
    }

    pub fn connected() -> Self {
        Self::Connected {
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }

    /// Serialize to JSON string
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| r#"{"type":"reload"}"#.to_string())
    }

    /// Parse from JSON string
    pub fn from_json(s: &str) -> Option<Self> {
        serde_json::from_str(s).ok()
    }
}
