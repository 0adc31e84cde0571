//! Actor Coordinator - wires up the watch-mode actor system
//!
//! The Coordinator is a thin orchestrator that:
//! - Creates communication channels
//! - Starts the WebSocket listener
//! - Spawns the actors and waits for the shutdown signal

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use crossbeam::channel::Receiver;
use tokio::sync::mpsc;

use super::build::BuildActor;
use super::fs::FsActor;
use super::messages::{BuildMsg, WsMsg};
use super::ws::WsActor;
use crate::config::SiteConfig;
use crate::core::BuildMode;

const CHANNEL_BUFFER: usize = 32;

/// Coordinator - wires up and runs the actor system.
pub struct Coordinator {
    config: Arc<SiteConfig>,
    mode: BuildMode,
    ws_port: Option<u16>,
    shutdown_rx: Option<Receiver<()>>,
}

impl Coordinator {
    pub fn new(config: Arc<SiteConfig>, mode: BuildMode) -> Self {
        Self {
            config,
            mode,
            ws_port: None,
            shutdown_rx: None,
        }
    }

    /// Set WebSocket port.
    pub fn with_ws_port(mut self, port: u16) -> Self {
        self.ws_port = Some(port);
        self
    }

    /// Set shutdown signal receiver.
    pub fn with_shutdown_signal(mut self, rx: Receiver<()>) -> Self {
        self.shutdown_rx = Some(rx);
        self
    }

    /// Run the actor system until shutdown.
    pub async fn run(mut self) -> Result<()> {
        let (build_tx, build_rx) = mpsc::channel::<BuildMsg>(CHANNEL_BUFFER);
        let (ws_tx, ws_rx) = mpsc::channel::<WsMsg>(CHANNEL_BUFFER);

        if let Some(port) = self.ws_port {
            match crate::reload::server::start_ws_server_with_channel(
                self.config.serve.interface,
                port,
                ws_tx.clone(),
            ) {
                Ok(actual_port) => crate::cli::serve::set_actual_ws_port(actual_port),
                Err(e) => crate::log!("actor"; "websocket server failed: {}", e),
            }
        }

        let fs_actor = FsActor::new(Arc::clone(&self.config), build_tx.clone(), ws_tx.clone())
            .map_err(|e| anyhow::anyhow!("watcher failed: {}", e))?;
        let build_actor = BuildActor::new(build_rx, Arc::clone(&self.config), self.mode);
        let ws_actor = WsActor::new(ws_rx);

        crate::debug!("actor"; "start");
        let fs_handle = tokio::spawn(fs_actor.run());
        let build_handle = tokio::spawn(build_actor.run());
        let ws_handle = tokio::spawn(ws_actor.run());

        if let Some(rx) = self.shutdown_rx.take() {
            loop {
                if rx.try_recv().is_ok() {
                    crate::debug!("actor"; "shutdown signal received");
                    break;
                }
                tokio::time::sleep(Duration::from_millis(100)).await;
            }
        } else {
            tokio::select! {
                _ = fs_handle => {}
                _ = build_handle => {}
                _ = ws_handle => {}
            }
        }

        let _ = build_tx.send(BuildMsg::Shutdown).await;
        let _ = ws_tx.send(WsMsg::Shutdown).await;

        crate::debug!("actor"; "stopped");
        Ok(())
    }
}
