use crate::content::{
    classify_and_inject, classify_path, sniff_content_type, Classified, Injection, PathClass,
    HTML_CONTENT_TYPE,
};
use crate::server::{set_content_length, Handler, ParsedRequest, ResponseWriter};
use http::header::CONTENT_TYPE;
use http::{HeaderMap, HeaderValue, Method, StatusCode};
use std::io;
use tracing::trace;

/// Captures everything a downstream handler writes
///
/// The response capture buffer for one in-flight request: headers, the first
/// status written (default `200 OK`) and every body byte.
#[derive(Debug)]
pub struct CaptureWriter {
    headers: HeaderMap,
    status: Option<StatusCode>,
    body: Vec<u8>,
}

impl Default for CaptureWriter {
    fn default() -> Self {
        Self {
            headers: HeaderMap::new(),
            status: None,
            body: Vec::new(),
        }
    }
}

impl CaptureWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn status(&self) -> StatusCode {
        self.status.unwrap_or(StatusCode::OK)
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn body(&self) -> &[u8] {
        &self.body
    }

    pub fn into_parts(self) -> (StatusCode, HeaderMap, Vec<u8>) {
        let status = self.status();
        (status, self.headers, self.body)
    }
}

impl ResponseWriter for CaptureWriter {
    fn headers_mut(&mut self) -> &mut HeaderMap {
        &mut self.headers
    }

    fn write_head(&mut self, status: StatusCode) -> io::Result<()> {
        if self.status.is_none() {
            self.status = Some(status);
        }
        Ok(())
    }

    fn write_body(&mut self, chunk: &[u8]) -> io::Result<()> {
        if self.status.is_none() {
            self.status = Some(StatusCode::OK);
        }
        self.body.extend_from_slice(chunk);
        Ok(())
    }
}

/// Injects helper scripts into HTML responses of the wrapped handler
///
/// Requests whose path has a non-HTML extension (and `HEAD` requests, which
/// carry no body to inspect) go straight to the inner handler with zero
/// buffering. Everything else is captured whole, then:
///
/// - bodies without `<html` or `</body>` are flushed unchanged under a sniffed
///   content type
/// - HTML bodies get the injection fragment before `</body>` (when present),
///   `Content-Type: text/html; charset=utf-8` and a recomputed `Content-Length`
///
/// Whole HTML responses are held in memory, which suits presentation pages
/// but not arbitrarily large documents.
pub struct InjectScripts<H> {
    inner: H,
    injection: Injection,
}

impl<H: Handler> InjectScripts<H> {
    pub fn new(inner: H, injection: Injection) -> Self {
        Self { inner, injection }
    }
}

impl<H: Handler> Handler for InjectScripts<H> {
    fn serve(&self, req: &ParsedRequest, res: &mut dyn ResponseWriter) -> io::Result<()> {
        if req.method == Method::HEAD || classify_path(&req.path) == PathClass::Passthrough {
            return self.inner.serve(req, res);
        }

        let mut capture = CaptureWriter::new();
        self.inner.serve(req, &mut capture)?;
        let (status, headers, body) = capture.into_parts();

        for (name, value) in headers.iter() {
            res.headers_mut().append(name.clone(), value.clone());
        }

        match classify_and_inject(&body, &self.injection) {
            Classified::Html { body: html, injected } => {
                trace!(path = %req.path, injected, "serving html");
                let out = res.headers_mut();
                out.insert(CONTENT_TYPE, HeaderValue::from_static(HTML_CONTENT_TYPE));
                set_content_length(out, html.len());
                res.write_head(status)?;
                res.write_body(&html)
            }
            Classified::Other => {
                let out = res.headers_mut();
                out.insert(CONTENT_TYPE, HeaderValue::from_static(sniff_content_type(&body)));
                set_content_length(out, body.len());
                res.write_head(status)?;
                res.write_body(&body)
            }
        }
    }
}
