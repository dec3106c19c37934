use http::header::{CONNECTION, CONTENT_LENGTH, CONTENT_TYPE, X_CONTENT_TYPE_OPTIONS};
use http::{HeaderMap, HeaderValue, StatusCode};
use std::io::{self, Write};

/// Destination for one HTTP response
///
/// Mirrors the usual "set headers, write status, stream body" protocol:
///
/// - headers may be changed until the status line is written
/// - only the first [`ResponseWriter::write_head`] call takes effect
/// - [`ResponseWriter::write_body`] writes a `200 OK` head first if none was written
///
/// Wrappers (for example the script injector) implement this trait to
/// intercept what a downstream handler writes.
pub trait ResponseWriter {
    fn headers_mut(&mut self) -> &mut HeaderMap;

    fn write_head(&mut self, status: StatusCode) -> io::Result<()>;

    fn write_body(&mut self, chunk: &[u8]) -> io::Result<()>;
}

pub(crate) fn status_reason(status: StatusCode) -> &'static str {
    status.canonical_reason().unwrap_or("Unknown")
}

/// Whether a response with this status may carry a body
pub fn status_allows_body(status: StatusCode) -> bool {
    !(status.is_informational()
        || status == StatusCode::NO_CONTENT
        || status == StatusCode::NOT_MODIFIED)
}

/// Set `Content-Length` to `len`
pub fn set_content_length(headers: &mut HeaderMap, len: usize) {
    headers.insert(CONTENT_LENGTH, HeaderValue::from(len));
}

/// Write a short plain-text response (`message` plus a newline)
pub fn write_text_error(res: &mut dyn ResponseWriter, status: StatusCode, message: &str) -> io::Result<()> {
    let body = format!("{message}\n");
    let headers = res.headers_mut();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("text/plain; charset=utf-8"));
    headers.insert(X_CONTENT_TYPE_OPTIONS, HeaderValue::from_static("nosniff"));
    set_content_length(headers, body.len());
    res.write_head(status)?;
    res.write_body(body.as_bytes())
}

/// Response writer that streams straight to the connection
///
/// Nothing is buffered beyond the status line and headers. A response that
/// carries a body without `Content-Length` is delimited by closing the
/// connection, so such responses force `Connection: close`.
pub struct StreamWriter<'a, W: Write> {
    out: &'a mut W,
    headers: HeaderMap,
    status: Option<StatusCode>,
    keep_alive: bool,
    head_only: bool,
}

impl<'a, W: Write> StreamWriter<'a, W> {
    /// `head_only` suppresses the body, as required for `HEAD` requests
    pub fn new(out: &'a mut W, keep_alive: bool, head_only: bool) -> Self {
        Self {
            out,
            headers: HeaderMap::new(),
            status: None,
            keep_alive,
            head_only,
        }
    }

    /// Complete the response and report whether the connection can be reused
    pub fn finish(mut self) -> io::Result<bool> {
        if self.status.is_none() {
            set_content_length(&mut self.headers, 0);
            self.write_head(StatusCode::OK)?;
        }
        self.out.flush()?;
        Ok(self.keep_alive)
    }
}

impl<W: Write> ResponseWriter for StreamWriter<'_, W> {
    fn headers_mut(&mut self) -> &mut HeaderMap {
        &mut self.headers
    }

    fn write_head(&mut self, status: StatusCode) -> io::Result<()> {
        if self.status.is_some() {
            return Ok(());
        }
        self.status = Some(status);

        if !status.is_informational() {
            let delimited = self.headers.contains_key(CONTENT_LENGTH);
            if !delimited && status_allows_body(status) && !self.head_only {
                self.keep_alive = false;
            }
            let connection = if self.keep_alive { "keep-alive" } else { "close" };
            self.headers.insert(CONNECTION, HeaderValue::from_static(connection));
        }

        let mut head = Vec::with_capacity(256);
        write!(head, "HTTP/1.1 {} {}\r\n", status.as_u16(), status_reason(status))?;
        for (name, value) in self.headers.iter() {
            head.extend_from_slice(name.as_str().as_bytes());
            head.extend_from_slice(b": ");
            head.extend_from_slice(value.as_bytes());
            head.extend_from_slice(b"\r\n");
        }
        head.extend_from_slice(b"\r\n");
        self.out.write_all(&head)
    }

    fn write_body(&mut self, chunk: &[u8]) -> io::Result<()> {
        let status = match self.status {
            Some(status) => status,
            None => {
                self.write_head(StatusCode::OK)?;
                StatusCode::OK
            }
        };
        if self.head_only || !status_allows_body(status) || chunk.is_empty() {
            return Ok(());
        }
        self.out.write_all(chunk)
    }
}
