//! Content types for files served from the output directory.

use std::path::Path;

/// Content types the dev server writes itself.
pub mod types {
    pub const HTML: &str = "text/html; charset=utf-8";
    pub const PLAIN: &str = "text/plain; charset=utf-8";
    pub const CSS: &str = "text/css; charset=utf-8";
    pub const JAVASCRIPT: &str = "text/javascript; charset=utf-8";
    pub const JSON: &str = "application/json";
    pub const OCTET_STREAM: &str = "application/octet-stream";
}

/// `Content-Type` for a built file, by extension.
pub fn from_path(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);
    match ext.as_deref() {
        Some("html" | "htm") => types::HTML,
        Some("css") => types::CSS,
        Some("js" | "mjs" | "cjs") => types::JAVASCRIPT,
        // stylesheet maps and the data context
        Some("json" | "map") => types::JSON,
        Some("txt") => types::PLAIN,
        Some("xml") => "application/xml",
        Some("svg") => "image/svg+xml",
        Some("png") => "image/png",
        Some("jpg" | "jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        Some("ico") => "image/x-icon",
        Some("mp4") => "video/mp4",
        Some("webm") => "video/webm",
        Some("woff") => "font/woff",
        Some("woff2") => "font/woff2",
        Some("ttf") => "font/ttf",
        Some("otf") => "font/otf",
        Some("eot") => "application/vnd.ms-fontobject",
        _ => types::OCTET_STREAM,
    }
}
