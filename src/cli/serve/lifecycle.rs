//! Server lifecycle management.

use crate::{actor::Coordinator, config::SiteConfig, core::BuildMode, log};
use anyhow::Result;
use crossbeam::channel::Receiver;
use std::{
    net::{IpAddr, SocketAddr},
    sync::Arc,
    thread::{self, JoinHandle},
    time::Duration,
};
use tiny_http::Server;

/// Maximum number of port binding attempts.
const MAX_PORT_RETRIES: u16 = 10;

/// Bind to the specified interface and port, with automatic port retry.
pub fn bind_with_retry(interface: IpAddr, base_port: u16) -> Result<(Server, SocketAddr)> {
    let mut last_error = None;

    for offset in 0..MAX_PORT_RETRIES {
        let port = base_port.saturating_add(offset);
        match Server::http(SocketAddr::new(interface, port)) {
            Ok(server) => {
                let addr = server
                    .server_addr()
                    .to_ip()
                    .unwrap_or_else(|| SocketAddr::new(interface, port));
                if offset > 0 {
                    log!("serve"; "port {} in use, using {} instead", base_port, addr.port());
                }
                return Ok((server, addr));
            }
            Err(e) => last_error = Some(e),
        }
    }

    Err(anyhow::anyhow!(
        "Failed to bind after {} attempts (ports {}-{}): {}",
        MAX_PORT_RETRIES,
        base_port,
        base_port.saturating_add(MAX_PORT_RETRIES - 1),
        last_error.map(|e| e.to_string()).unwrap_or_default()
    ))
}

/// Spawn the actor system for file watching and live reload.
pub fn spawn_actors(
    config: Arc<SiteConfig>,
    mode: BuildMode,
    ws_port: u16,
    shutdown_rx: Receiver<()>,
) -> Option<JoinHandle<()>> {
    if !mode.watch {
        return None;
    }

    Some(thread::spawn(move || {
        run_actor_system(config, mode, ws_port, shutdown_rx);
    }))
}

fn run_actor_system(
    config: Arc<SiteConfig>,
    mode: BuildMode,
    ws_port: u16,
    shutdown_rx: Receiver<()>,
) {
    let rt = match tokio::runtime::Builder::new_multi_thread()
        .worker_threads(2)
        .enable_all()
        .build()
    {
        Ok(rt) => rt,
        Err(e) => {
            log!("actor"; "failed to create tokio runtime: {}", e);
            return;
        }
    };

    rt.block_on(async {
        let coordinator = Coordinator::new(config, mode)
            .with_ws_port(ws_port)
            .with_shutdown_signal(shutdown_rx);
        if let Err(e) = coordinator.run().await {
            log!("actor"; "error: {}", e);
        }
    });
}

/// Wait for actor system to shutdown gracefully (max 2 seconds).
pub fn wait_for_shutdown(handle: Option<JoinHandle<()>>) {
    let Some(handle) = handle else { return };

    for _ in 0..40 {
        if handle.is_finished() {
            let _ = handle.join();
            return;
        }
        thread::sleep(Duration::from_millis(50));
    }
}
