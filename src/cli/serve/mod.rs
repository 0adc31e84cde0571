//! Development server with live reload support.
//!
//! Serves the output directory over HTTP. HTML responses get the live-reload
//! client injected; the client itself is answered from memory.

mod content;
mod lifecycle;
mod path;
mod response;

use crate::{config::SiteConfig, core::BuildMode, debug, embed::serve::LIVERELOAD_URL, log};
use anyhow::Result;
use crossbeam::channel;
use std::sync::Arc;
use std::sync::atomic::{AtomicU16, Ordering};
use tiny_http::{Request, Server};

/// Request handler threads
const REQUEST_THREADS: usize = 4;

/// Actual WebSocket port (may differ from `serve.reload_port` if it was in use)
/// Updated by coordinator after WebSocket server binds successfully
static ACTUAL_WS_PORT: AtomicU16 = AtomicU16::new(0);

/// Update the actual WebSocket port (called by coordinator after binding)
pub fn set_actual_ws_port(port: u16) {
    ACTUAL_WS_PORT.store(port, Ordering::Relaxed);
}

fn get_actual_ws_port() -> u16 {
    ACTUAL_WS_PORT.load(Ordering::Relaxed)
}

/// Bound server ready to accept requests
pub struct BoundServer {
    server: Arc<Server>,
    shutdown_rx: channel::Receiver<()>,
}

/// Bind the HTTP server without starting the request loop
pub fn bind_server(config: &SiteConfig) -> Result<BoundServer> {
    let (server, addr) = lifecycle::bind_with_retry(config.serve.interface, config.serve.port)?;
    let server = Arc::new(server);

    set_actual_ws_port(config.serve.reload_port);
    debug!("livereload"; "ws://{}:{}", config.serve.interface, config.serve.reload_port);

    let (shutdown_tx, shutdown_rx) = channel::unbounded::<()>();
    crate::core::register_server(Arc::clone(&server), shutdown_tx);

    log!("serve"; "http://{}", addr);

    Ok(BoundServer {
        server,
        shutdown_rx,
    })
}

impl BoundServer {
    /// Start the actors and the request loop (blocking until Ctrl+C).
    pub fn run(self, config: Arc<SiteConfig>, mode: BuildMode) -> Result<()> {
        let actor_handle = lifecycle::spawn_actors(
            Arc::clone(&config),
            mode,
            config.serve.reload_port,
            self.shutdown_rx,
        );
        run_request_loop(&self.server, &config, mode.watch)?;
        lifecycle::wait_for_shutdown(actor_handle);
        Ok(())
    }
}

fn run_request_loop(server: &Server, config: &Arc<SiteConfig>, livereload: bool) -> Result<()> {
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(REQUEST_THREADS)
        .build()?;

    for request in server.incoming_requests() {
        let config = Arc::clone(config);
        pool.spawn(move || {
            if let Err(e) = handle_request(request, &config, livereload) {
                log!("serve"; "request error: {e}");
            }
        });
    }
    Ok(())
}

/// Handle a single HTTP request
fn handle_request(request: Request, config: &SiteConfig, livereload: bool) -> Result<()> {
    if crate::core::is_shutdown() {
        return response::respond_unavailable(request);
    }

    if livereload && request.url() == LIVERELOAD_URL {
        return response::respond_livereload_js(request, get_actual_ws_port());
    }

    if let Some(path) = path::resolve_path(request.url(), &config.build.output) {
        return response::respond_file(request, &path, livereload);
    }

    response::respond_not_found(request, config, livereload)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embed::serve::script_tag;
    use std::fs;
    use std::io::{Read, Write};
    use std::net::TcpStream;
    use tempfile::TempDir;

    /// Serve exactly one request on an ephemeral port and return the raw response.
    fn fetch(config: SiteConfig, raw_request: &str) -> String {
        let server = Server::http("127.0.0.1:0").unwrap();
        let addr = server.server_addr().to_ip().unwrap();

        let handle = std::thread::spawn(move || {
            let request = server.recv().unwrap();
            handle_request(request, &config, true).unwrap();
        });

        let mut stream = TcpStream::connect(addr).unwrap();
        stream.write_all(raw_request.as_bytes()).unwrap();
        let mut response = String::new();
        stream.read_to_string(&mut response).unwrap();
        handle.join().unwrap();
        response
    }

    fn get(path: &str) -> String {
        format!("GET {path} HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n")
    }

    fn site() -> (TempDir, SiteConfig) {
        let dir = TempDir::new().unwrap();
        let config = SiteConfig::for_root(dir.path());
        fs::create_dir_all(config.build.output.join("css")).unwrap();
        fs::write(
            config.build.output.join("index.html"),
            "<html><body><h1>home</h1></body></html>",
        )
        .unwrap();
        fs::write(config.build.output.join("css/global.min.css"), "h1{color:red}").unwrap();
        (dir, config)
    }

    #[test]
    fn test_serves_index_with_livereload() {
        let (_dir, config) = site();
        let response = fetch(config, &get("/"));
        assert!(response.starts_with("HTTP/1.1 200"));
        assert!(response.contains(&format!("<h1>home</h1>{}</body>", script_tag())));
    }

    #[test]
    fn test_serves_css_untouched() {
        let (_dir, config) = site();
        let response = fetch(config, &get("/css/global.min.css"));
        assert!(response.starts_with("HTTP/1.1 200"));
        assert!(response.contains("text/css"));
        assert!(response.ends_with("h1{color:red}"));
    }

    #[test]
    fn test_serves_livereload_client() {
        let (_dir, config) = site();
        let response = fetch(config, &get(LIVERELOAD_URL));
        assert!(response.starts_with("HTTP/1.1 200"));
        assert!(response.contains("WebSocket"));
    }

    #[test]
    fn test_missing_page_is_404() {
        let (_dir, config) = site();
        let response = fetch(config.clone(), &get("/missing.html"));
        assert!(response.starts_with("HTTP/1.1 404"));

        fs::write(config.build.output.join("404.html"), "<body>gone</body>").unwrap();
        let response = fetch(config, &get("/missing.html"));
        assert!(response.starts_with("HTTP/1.1 404"));
        assert!(response.contains("gone"));
    }

    #[test]
    fn test_dev_server_binds_configured_port() {
        let dir = TempDir::new().unwrap();
        let mut config = SiteConfig::for_root(dir.path());
        fs::create_dir_all(&config.build.templates).unwrap();
        fs::write(config.build.templates.join("index.hbs"), "<body>built</body>").unwrap();
        assert_eq!(
            crate::cli::build::build_site(BuildMode::DEVELOPMENT, &config),
            0
        );

        let port = std::net::TcpListener::bind("127.0.0.1:0")
            .unwrap()
            .local_addr()
            .unwrap()
            .port();
        config.serve.interface = "127.0.0.1".parse().unwrap();
        config.serve.port = port;

        let bound = bind_server(&config).unwrap();
        let addr = bound.server.server_addr().to_ip().unwrap();
        assert_eq!(addr.port(), port);

        let server = Arc::clone(&bound.server);
        let handle = std::thread::spawn(move || {
            let request = server.recv().unwrap();
            handle_request(request, &config, true).unwrap();
        });

        let mut stream = TcpStream::connect(addr).unwrap();
        stream.write_all(get("/index.html").as_bytes()).unwrap();
        let mut response = String::new();
        stream.read_to_string(&mut response).unwrap();
        handle.join().unwrap();

        assert!(response.starts_with("HTTP/1.1 200"));
        assert!(response.contains("built"));
    }
}
