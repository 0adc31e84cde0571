//! HTTP response handlers.

use super::content::maybe_inject_livereload;
use crate::config::SiteConfig;
use crate::utils::mime::types::{HTML, JAVASCRIPT, PLAIN};
use anyhow::{Context, Result};
use std::{fs, path::Path};
use tiny_http::{Header, Method, Request, Response, StatusCode};

/// Respond with a static file, injecting the live-reload client into HTML.
pub fn respond_file(request: Request, path: &Path, livereload: bool) -> Result<()> {
    let content_type = crate::utils::mime::from_path(path);

    if is_head_request(&request) {
        return send_head(request, 200, content_type);
    }

    if let Some(range) = get_range_header(&request) {
        return respond_range(request, path, content_type, &range);
    }

    let body = fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;
    let body = maybe_inject_livereload(body, content_type, livereload);

    send_body(request, 200, content_type, body)
}

/// Handle Range request for media files (video/audio seeking).
fn respond_range(
    request: Request,
    path: &Path,
    content_type: &'static str,
    range: &str,
) -> Result<()> {
    use std::io::{Read, Seek, SeekFrom};

    let file_size = fs::metadata(path)?.len();
    if file_size == 0 {
        return send_body(request, 200, content_type, Vec::new());
    }

    let range = range.strip_prefix("bytes=").unwrap_or(range);
    let (start, end) = parse_range(range, file_size);
    let length = end - start + 1;

    let mut file = fs::File::open(path)?;
    file.seek(SeekFrom::Start(start))?;
    let reader = file.take(length);

    let content_range = format!("bytes {start}-{end}/{file_size}");
    let response = Response::new(
        StatusCode(206),
        vec![
            make_header("Content-Type", content_type)?,
            make_header("Content-Range", &content_range)?,
            make_header("Accept-Ranges", "bytes")?,
        ],
        reader,
        usize::try_from(length).ok(),
        None,
    );

    request.respond(response)?;
    Ok(())
}

/// Parse Range header value "start-end" into inclusive (start, end) bytes.
///
/// `file_size` must be non-zero.
fn parse_range(range: &str, file_size: u64) -> (u64, u64) {
    let last = file_size - 1;
    let parts: Vec<&str> = range.trim().split('-').collect();

    let (start, end) = match parts.as_slice() {
        // "0-499"
        [s, e] if !s.is_empty() && !e.is_empty() => {
            let start: u64 = s.trim().parse().unwrap_or(0);
            let end: u64 = e.trim().parse().unwrap_or(last);
            (start, end.min(last))
        }
        // "500-"
        [s, ""] if !s.is_empty() => (s.trim().parse().unwrap_or(0), last),
        // "-500": last 500 bytes
        ["", e] if !e.is_empty() => {
            let suffix: u64 = e.trim().parse().unwrap_or(0);
            (file_size.saturating_sub(suffix), last)
        }
        _ => (0, last),
    };

    (start.min(end), end)
}

/// Extract Range header from request.
fn get_range_header(request: &Request) -> Option<String> {
    request
        .headers()
        .iter()
        .find(|h| h.field.as_str().as_str().eq_ignore_ascii_case("range"))
        .map(|h| h.value.to_string())
}

/// Respond with 404 page (custom `404.html` in the output, or plain text).
pub fn respond_not_found(request: Request, config: &SiteConfig, livereload: bool) -> Result<()> {
    let custom_404 = config.build.output.join("404.html");
    let has_custom = custom_404.is_file();

    if is_head_request(&request) {
        let mime = if has_custom { HTML } else { PLAIN };
        return send_head(request, 404, mime);
    }

    if has_custom && let Ok(body) = fs::read(&custom_404) {
        let body = maybe_inject_livereload(body, HTML, livereload);
        return send_body(request, 404, HTML, body);
    }

    send_body(request, 404, PLAIN, b"404 Not Found".to_vec())
}

/// Respond with 503 Service Unavailable (server shutting down).
pub fn respond_unavailable(request: Request) -> Result<()> {
    send_body(request, 503, PLAIN, b"503 Service Unavailable".to_vec())
}

/// Respond with livereload.js from memory.
pub fn respond_livereload_js(request: Request, ws_port: u16) -> Result<()> {
    use crate::embed::serve::{LIVERELOAD_JS, LivereloadVars};

    let body = LIVERELOAD_JS.render(&LivereloadVars { ws_port });
    send_body(request, 200, JAVASCRIPT, body.into_bytes())
}

fn is_head_request(request: &Request) -> bool {
    request.method() == &Method::Head
}

fn send_head(request: Request, status: u16, content_type: &str) -> Result<()> {
    let response = Response::empty(StatusCode(status))
        .with_header(make_header("Content-Type", content_type)?)
        .with_header(make_header("Cache-Control", "no-store")?);
    request.respond(response)?;
    Ok(())
}

fn send_body(request: Request, status: u16, content_type: &str, body: Vec<u8>) -> Result<()> {
    let response = Response::from_data(body)
        .with_status_code(StatusCode(status))
        .with_header(make_header("Content-Type", content_type)?)
        .with_header(make_header("Cache-Control", "no-store")?);
    request.respond(response)?;
    Ok(())
}

fn make_header(key: &str, value: &str) -> Result<Header> {
    Header::from_bytes(key, value).map_err(|()| anyhow::anyhow!("invalid header {key}: {value}"))
}
