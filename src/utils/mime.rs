//! MIME type detection for the dev server.

#![allow(dead_code)]

use std::path::Path;

/// Common MIME type constants.
pub mod types {
    pub const HTML: &str = "text/html; charset=utf-8";
    pub const PLAIN: &str = "text/plain; charset=utf-8";
    pub const CSS: &str = "text/css; charset=utf-8";
    pub const JAVASCRIPT: &str = "text/javascript; charset=utf-8";
    pub const JSON: &str = "application/json";
    pub const XML: &str = "application/xml";
    pub const OCTET_STREAM: &str = "application/octet-stream";
    pub const WASM: &str = "application/wasm";
    pub const PNG: &str = "image/png";
    pub const JPEG: &str = "image/jpeg";
    pub const GIF: &str = "image/gif";
    pub const WEBP: &str = "image/webp";
    pub const AVIF: &str = "image/avif";
    pub const SVG: &str = "image/svg+xml";
    pub const ICO: &str = "image/x-icon";
    pub const WOFF: &str = "font/woff";
    pub const WOFF2: &str = "font/woff2";
    pub const TTF: &str = "font/ttf";
}

/// Detect MIME type from a file path's extension.
pub fn from_path(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or_default();

    match ext.to_ascii_lowercase().as_str() {
        "html" | "htm" => types::HTML,
        "txt" => types::PLAIN,
        "css" => types::CSS,
        "js" | "mjs" => types::JAVASCRIPT,
        "json" | "map" => types::JSON,
        "xml" => types::XML,
        "wasm" => types::WASM,
        "png" => types::PNG,
        "jpg" | "jpeg" => types::JPEG,
        "gif" => types::GIF,
        "webp" => types::WEBP,
        "avif" => types::AVIF,
        "svg" => types::SVG,
        "ico" => types::ICO,
        "woff" => types::WOFF,
        "woff2" => types::WOFF2,
        "ttf" => types::TTF,
        _ => types::OCTET_STREAM,
    }
}
