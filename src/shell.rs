//! Asset handler for a native desktop shell hosting the bundle.
//!
//! The shell's webview asks for assets through a plain request/response
//! handler instead of a socket. HTML candidates are read straight from the
//! overlay and injected with the [`HostKind::Shell`] fragment, which routes
//! external links to the shell's native browser bridge. Everything else goes
//! to [`StaticFiles`].

use crate::assets::{clean_path, AssetError, ByteStore};
use crate::content::{
    classify_and_inject, classify_path, sniff_content_type, Classified, HostKind, Injection, PathClass,
    HTML_CONTENT_TYPE,
};
use crate::server::{set_content_length, write_text_error, Handler, ParsedRequest, ResponseWriter};
use crate::static_files::{StaticFiles, INDEX_FILE};
use http::header::CONTENT_TYPE;
use http::{HeaderValue, Method, StatusCode};
use std::borrow::Cow;
use std::io;
use std::sync::Arc;
use tracing::{debug, warn};

pub struct ShellAssetHandler<S> {
    files: StaticFiles<S>,
    injection: Injection,
}

impl<S: ByteStore> ShellAssetHandler<S> {
    pub fn new(store: S) -> Self {
        Self {
            files: StaticFiles::new(store),
            injection: Injection::for_host(HostKind::Shell),
        }
    }

    fn read_html_candidate(&self, req: &ParsedRequest) -> Result<Arc<[u8]>, AssetError> {
        let path = match req.path.as_str() {
            "/" | "/index.html" => INDEX_FILE.to_string(),
            other => clean_path(other).ok_or_else(|| AssetError::InvalidPath(other.to_string()))?,
        };
        let store = self.files.store();
        // Directories are read errors, not misses.
        if store.stat(&path)?.is_dir() {
            return Err(AssetError::IsADirectory(path));
        }
        store.open(&path)
    }
}

impl<S: ByteStore> Handler for ShellAssetHandler<S> {
    fn serve(&self, req: &ParsedRequest, res: &mut dyn ResponseWriter) -> io::Result<()> {
        if classify_path(&req.path) == PathClass::Passthrough {
            return self.files.serve(req, res);
        }

        let body = match self.read_html_candidate(req) {
            Ok(body) => body,
            Err(e) if e.is_not_found() => {
                debug!(path = %req.path, "shell asset not found");
                return write_text_error(res, StatusCode::NOT_FOUND, "File not found");
            }
            Err(e) => {
                warn!(path = %req.path, error = %e, "shell asset read failed");
                return write_text_error(res, StatusCode::INTERNAL_SERVER_ERROR, "Error reading file");
            }
        };

        let (content_type, bytes) = match classify_and_inject(&body, &self.injection) {
            Classified::Html { body, .. } => (HTML_CONTENT_TYPE, body),
            Classified::Other => (sniff_content_type(&body), Cow::Borrowed(&body[..])),
        };
        let headers = res.headers_mut();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static(content_type));
        set_content_length(headers, bytes.len());
        res.write_head(StatusCode::OK)?;
        if req.method == Method::HEAD {
            return Ok(());
        }
        res.write_body(&bytes)
    }
}
