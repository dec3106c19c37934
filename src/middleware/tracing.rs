use crate::server::{Handler, ParsedRequest, ResponseWriter};
use http::{HeaderMap, StatusCode};
use std::io;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Instant;
use tracing::debug;

/// Records the status a wrapped writer saw
struct StatusRecorder<'a> {
    inner: &'a mut dyn ResponseWriter,
    status: Option<StatusCode>,
    bytes: usize,
}

impl ResponseWriter for StatusRecorder<'_> {
    fn headers_mut(&mut self) -> &mut HeaderMap {
        self.inner.headers_mut()
    }

    fn write_head(&mut self, status: StatusCode) -> io::Result<()> {
        if self.status.is_none() {
            self.status = Some(status);
        }
        self.inner.write_head(status)
    }

    fn write_body(&mut self, chunk: &[u8]) -> io::Result<()> {
        if self.status.is_none() {
            self.status = Some(StatusCode::OK);
        }
        self.bytes += chunk.len();
        self.inner.write_body(chunk)
    }
}

/// Logs one line per request with method, path, status, size and latency
///
/// No span is entered around the inner handler: connection coroutines can
/// migrate between worker threads mid-request.
pub struct TracingMiddleware<H> {
    inner: H,
    requests: AtomicUsize,
}

impl<H: Handler> TracingMiddleware<H> {
    pub fn new(inner: H) -> Self {
        Self {
            inner,
            requests: AtomicUsize::new(0),
        }
    }

    /// Total number of requests seen
    pub fn request_count(&self) -> usize {
        self.requests.load(Ordering::Relaxed)
    }
}

impl<H: Handler> Handler for TracingMiddleware<H> {
    fn serve(&self, req: &ParsedRequest, res: &mut dyn ResponseWriter) -> io::Result<()> {
        self.requests.fetch_add(1, Ordering::Relaxed);
        let started = Instant::now();

        let mut recorder = StatusRecorder {
            inner: res,
            status: None,
            bytes: 0,
        };
        let result = self.inner.serve(req, &mut recorder);
        let status = recorder.status.unwrap_or(StatusCode::OK);

        debug!(
            method = %req.method,
            path = %req.path,
            status = status.as_u16(),
            bytes = recorder.bytes,
            latency_ms = started.elapsed().as_millis() as u64,
            "request served"
        );
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::middleware::CaptureWriter;
    use http::Method;

    struct Teapot;

    impl Handler for Teapot {
        fn serve(&self, _req: &ParsedRequest, res: &mut dyn ResponseWriter) -> io::Result<()> {
            res.write_head(StatusCode::IM_A_TEAPOT)?;
            res.write_body(b"short and stout")
        }
    }

    #[test]
    fn test_passes_response_through_and_counts() {
        let mw = TracingMiddleware::new(Teapot);
        let mut w = CaptureWriter::new();
        mw.serve(&ParsedRequest::new(Method::GET, "/"), &mut w).unwrap();
        mw.serve(&ParsedRequest::new(Method::GET, "/"), &mut CaptureWriter::new())
            .unwrap();
        assert_eq!(w.status(), StatusCode::IM_A_TEAPOT);
        assert_eq!(w.body(), b"short and stout");
        assert_eq!(mw.request_count(), 2);
    }
}
