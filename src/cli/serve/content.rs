//! Live-reload script injection into served HTML.

use crate::embed::serve::script_tag;

/// Inject the live-reload client if content is HTML and live reload is active
pub fn maybe_inject_livereload(body: Vec<u8>, content_type: &str, enabled: bool) -> Vec<u8> {
    if enabled && content_type.starts_with("text/html") {
        inject_livereload_script(&body)
    } else {
        body
    }
}

/// Inject the script tag before the last `</body>`, or append it
fn inject_livereload_script(content: &[u8]) -> Vec<u8> {
    let script = script_tag();
    let script_bytes = script.as_bytes();

    const PATTERN: &[u8] = b"</body>";

    let mut result = Vec::with_capacity(content.len() + script_bytes.len());
    if let Some(pos) = content
        .windows(PATTERN.len())
        .rposition(|w| w.eq_ignore_ascii_case(PATTERN))
    {
        result.extend_from_slice(&content[..pos]);
        result.extend_from_slice(script_bytes);
        result.extend_from_slice(&content[pos..]);
    } else {
        // No </body> found, browsers still run a trailing script
        result.extend_from_slice(content);
        result.extend_from_slice(script_bytes);
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::mime::types::{CSS, HTML};

    #[test]
    fn test_inject_before_body_close() {
        let html = b"<html><body><p>hi</p></BODY></html>".to_vec();
        let out = String::from_utf8(maybe_inject_livereload(html, HTML, true)).unwrap();
        let tag = script_tag();
        assert!(out.contains(&format!("<p>hi</p>{tag}</BODY>")));
    }

    #[test]
    fn test_inject_uses_last_body_close() {
        let html = b"<body><pre>&lt;/body&gt; </body></pre></body>".to_vec();
        let out = String::from_utf8(inject_livereload_script(&html)).unwrap();
        assert!(out.ends_with(&format!("{}</body>", script_tag())));
    }

    #[test]
    fn test_append_without_body() {
        let out = String::from_utf8(inject_livereload_script(b"<p>fragment</p>")).unwrap();
        assert_eq!(out, format!("<p>fragment</p>{}", script_tag()));
    }

    #[test]
    fn test_non_html_untouched() {
        let css = b"body{}".to_vec();
        assert_eq!(maybe_inject_livereload(css.clone(), CSS, true), css);

        let html = b"<body></body>".to_vec();
        assert_eq!(maybe_inject_livereload(html.clone(), HTML, false), html);
    }
}
