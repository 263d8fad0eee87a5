//! Fallback content served when both the cache and the network fail.
//!
//! Bodies are built fresh for every failure and are never stored.

use offgrid_core::{Destination, Response};

/// Offline page returned for failed document requests.
pub const OFFLINE_HTML: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<title>Offline</title>
<style>
body{font-family:Inter,Arial,sans-serif;background:#f7f7f7;color:#333;margin:0;display:flex;min-height:100vh;align-items:center;justify-content:center;text-align:center}
main{max-width:28rem;padding:2rem}
h1{font-family:"Playfair Display",Georgia,serif;font-weight:600;margin-bottom:.5rem}
button{margin-top:1.5rem;padding:.6rem 1.4rem;border:0;border-radius:4px;background:#333;color:#fff;cursor:pointer}
</style>
</head>
<body>
<main>
<h1>You are offline</h1>
<p>This page has not been saved for offline reading yet. Articles you have already opened are still available.</p>
<button onclick="location.reload()">Try again</button>
</main>
</body>
</html>
"#;

/// Placeholder returned for failed image requests.
pub const PLACEHOLDER_SVG: &str = r##"<svg xmlns="http://www.w3.org/2000/svg" width="200" height="150" viewBox="0 0 200 150"><rect width="200" height="150" fill="#f0f0f0"/><text x="50%" y="50%" text-anchor="middle" dy="0.35em" font-family="Arial" font-size="14" fill="#999">Image unavailable</text></svg>"##;

pub fn offline_document() -> Response {
    Response::synthetic("text/html", OFFLINE_HTML)
}

pub fn placeholder_image() -> Response {
    Response::synthetic("image/svg+xml", PLACEHOLDER_SVG)
}

/// Synthesized content for a destination, if one exists.
pub fn for_destination(destination: Destination) -> Option<Response> {
    match destination {
        Destination::Document => Some(offline_document()),
        Destination::Image => Some(placeholder_image()),
        Destination::Other => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_offline_document_headers() {
        let resp = offline_document();
        assert_eq!(resp.status, 200);
        assert_eq!(resp.content_type(), Some("text/html"));
        assert_eq!(resp.headers.get("cache-control"), Some("no-cache"));
        assert_eq!(resp.body, OFFLINE_HTML.as_bytes());
    }

    #[test]
    fn test_placeholder_is_svg() {
        let resp = placeholder_image();
        assert_eq!(resp.content_type(), Some("image/svg+xml"));
        assert!(resp.body.starts_with(b"<svg"));
    }

    #[test]
    fn test_no_fallback_for_other() {
        assert!(for_destination(Destination::Other).is_none());
        assert!(for_destination(Destination::Image).is_some());
    }
}
