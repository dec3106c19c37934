//! Static asset serving through any [`ByteStore`].
//!
//! This is the plain byte server the script injector wraps. It knows nothing
//! about HTML rewriting: it resolves a URL path, picks a content type and
//! writes the bytes.

use crate::assets::{clean_path, file_name, AssetError, ByteStore};
use crate::content::sniff_content_type;
use crate::server::{set_content_length, write_text_error, Handler, ParsedRequest, ResponseWriter};
use http::header::{ALLOW, CONTENT_TYPE, LOCATION};
use http::{HeaderValue, Method, StatusCode};
use std::io;
use tracing::{debug, warn};

/// File served for directory requests when present
pub const INDEX_FILE: &str = "index.html";

/// Serves files, directory indexes and directory listings from a store
pub struct StaticFiles<S> {
    store: S,
}

impl<S: ByteStore> StaticFiles<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Content type for a file name based on its extension
    ///
    /// Returns `None` for unknown extensions; callers then sniff the bytes.
    pub fn content_type(name: &str) -> Option<&'static str> {
        let ext = crate::content::extension(name)?.to_ascii_lowercase();
        Some(match ext.as_str() {
            "html" | "htm" => "text/html; charset=utf-8",
            "css" => "text/css; charset=utf-8",
            "js" | "mjs" => "text/javascript; charset=utf-8",
            "json" | "map" => "application/json",
            "yaml" | "yml" => "application/yaml",
            "txt" => "text/plain; charset=utf-8",
            "md" => "text/markdown; charset=utf-8",
            "csv" => "text/csv; charset=utf-8",
            "xml" => "text/xml; charset=utf-8",
            "svg" => "image/svg+xml",
            "png" => "image/png",
            "jpg" | "jpeg" => "image/jpeg",
            "gif" => "image/gif",
            "webp" => "image/webp",
            "avif" => "image/avif",
            "ico" => "image/x-icon",
            "woff" => "font/woff",
            "woff2" => "font/woff2",
            "ttf" => "font/ttf",
            "otf" => "font/otf",
            "wasm" => "application/wasm",
            "pdf" => "application/pdf",
            "mp4" => "video/mp4",
            "webm" => "video/webm",
            "mp3" => "audio/mpeg",
            "wav" => "audio/wav",
            "geojson" => "application/geo+json",
            "topojson" => "application/json",
            _ => return None,
        })
    }

    fn serve_file(&self, path: &str, res: &mut dyn ResponseWriter) -> io::Result<()> {
        let bytes = match self.store.open(path) {
            Ok(bytes) => bytes,
            Err(e) => return self.write_asset_error(e, res),
        };
        let content_type = Self::content_type(file_name(path)).unwrap_or_else(|| sniff_content_type(&bytes));
        let headers = res.headers_mut();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static(content_type));
        set_content_length(headers, bytes.len());
        res.write_head(StatusCode::OK)?;
        res.write_body(&bytes)
    }

    fn serve_dir(&self, path: &str, res: &mut dyn ResponseWriter) -> io::Result<()> {
        let index = if path.is_empty() {
            INDEX_FILE.to_string()
        } else {
            format!("{path}/{INDEX_FILE}")
        };
        if matches!(self.store.stat(&index), Ok(meta) if !meta.is_dir()) {
            return self.serve_file(&index, res);
        }

        let entries = match self.store.read_dir(path) {
            Ok(entries) => entries,
            Err(e) => return self.write_asset_error(e, res),
        };
        let mut listing = String::from("<!doctype html>\n<meta name=\"viewport\" content=\"width=device-width\">\n<pre>\n");
        for entry in entries {
            let mut name = entry.name;
            if entry.kind == crate::assets::EntryKind::Dir {
                name.push('/');
            }
            listing.push_str(&format!(
                "<a href=\"{}\">{}</a>\n",
                urlencoding::encode(&name).replace("%2F", "/"),
                html_escape(&name)
            ));
        }
        listing.push_str("</pre>\n");

        let headers = res.headers_mut();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("text/html; charset=utf-8"));
        set_content_length(headers, listing.len());
        res.write_head(StatusCode::OK)?;
        res.write_body(listing.as_bytes())
    }

    fn write_asset_error(&self, err: AssetError, res: &mut dyn ResponseWriter) -> io::Result<()> {
        if err.is_not_found() {
            debug!(error = %err, "asset not found");
            write_text_error(res, StatusCode::NOT_FOUND, "404 page not found")
        } else {
            warn!(error = %err, "asset lookup failed");
            write_text_error(res, StatusCode::INTERNAL_SERVER_ERROR, "500 Internal Server Error")
        }
    }
}

impl<S: ByteStore> Handler for StaticFiles<S> {
    fn serve(&self, req: &ParsedRequest, res: &mut dyn ResponseWriter) -> io::Result<()> {
        if req.method != Method::GET && req.method != Method::HEAD {
            res.headers_mut().insert(ALLOW, HeaderValue::from_static("GET, HEAD"));
            return write_text_error(res, StatusCode::METHOD_NOT_ALLOWED, "405 method not allowed");
        }

        let Some(path) = clean_path(&req.path) else {
            return write_text_error(res, StatusCode::NOT_FOUND, "404 page not found");
        };

        let meta = match self.store.stat(&path) {
            Ok(meta) => meta,
            Err(e) => return self.write_asset_error(e, res),
        };

        if meta.is_dir() {
            if !req.path.ends_with('/') {
                match HeaderValue::from_str(&redirect_target(req)) {
                    Ok(location) => {
                        res.headers_mut().insert(LOCATION, location);
                        return write_text_error(res, StatusCode::MOVED_PERMANENTLY, "Moved Permanently");
                    }
                    Err(_) => return write_text_error(res, StatusCode::NOT_FOUND, "404 page not found"),
                }
            }
            return self.serve_dir(&path, res);
        }
        self.serve_file(&path, res)
    }
}

/// Location for a directory requested without its trailing slash
fn redirect_target(req: &ParsedRequest) -> String {
    let mut target = req
        .path
        .split('/')
        .map(urlencoding::encode)
        .collect::<Vec<_>>()
        .join("/");
    target.push('/');
    if let Some(query) = &req.query {
        target.push('?');
        target.push_str(query);
    }
    target
}

fn html_escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '&' => out.push_str("&amp;"),
            '"' => out.push_str("&#34;"),
            '\'' => out.push_str("&#39;"),
            c => out.push(c),
        }
    }
    out
}
