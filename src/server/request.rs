use http::header::{CONNECTION, CONTENT_LENGTH, TRANSFER_ENCODING};
use http::{HeaderMap, HeaderName, HeaderValue, Method, Version};
use std::io::{self, Read};
use tracing::trace;

/// Upper bound on a request head; larger heads close the connection
pub const MAX_HEAD_BYTES: usize = 64 * 1024;

/// Upper bound on a request body; asset requests rarely carry one at all
pub const MAX_BODY_BYTES: usize = 1024 * 1024;

/// Header slots handed to `httparse`; sized for browsers behind proxies
pub const MAX_HEADERS: usize = 32;

const READ_CHUNK: usize = 4096;

/// Parsed HTTP request data used by `AppService` and the asset handlers.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedRequest {
    /// HTTP method (GET, POST, etc.)
    pub method: Method,
    /// Percent-decoded path without the query string
    pub path: String,
    /// Raw query string (after `?`), if any
    pub query: Option<String>,
    pub version: Version,
    pub headers: HeaderMap,
    pub body: Vec<u8>,
}

impl ParsedRequest {
    /// Build a request by hand; used by adapters that do not own a socket
    pub fn new(method: Method, target: &str) -> Self {
        let (path, query) = split_target(target);
        Self {
            method,
            path: decode_path(path).unwrap_or_else(|| path.to_string()),
            query: query.map(str::to_string),
            version: Version::HTTP_11,
            headers: HeaderMap::new(),
            body: Vec::new(),
        }
    }

    /// First value of `name` as a string, if present and valid UTF-8
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// Whether a comma-separated header contains `token` (case-insensitive)
    pub fn header_has_token(&self, name: &str, token: &str) -> bool {
        self.headers.get_all(name).iter().any(|value| {
            value
                .to_str()
                .map(|v| v.split(',').any(|t| t.trim().eq_ignore_ascii_case(token)))
                .unwrap_or(false)
        })
    }

    /// Whether the connection may be reused after this request
    pub fn keep_alive(&self) -> bool {
        match self.version {
            Version::HTTP_10 => self.header_has_token(CONNECTION.as_str(), "keep-alive"),
            _ => !self.header_has_token(CONNECTION.as_str(), "close"),
        }
    }
}

fn split_target(target: &str) -> (&str, Option<&str>) {
    match target.split_once('?') {
        Some((path, query)) => (path, Some(query)),
        None => (target, None),
    }
}

fn decode_path(path: &str) -> Option<String> {
    urlencoding::decode(path).ok().map(|p| p.into_owned())
}

fn invalid(msg: impl Into<String>) -> io::Error {
    io::Error::new(io::ErrorKind::InvalidData, msg.into())
}

/// Read one request from `stream`
///
/// `buf` carries bytes already received on the connection and keeps any
/// bytes read past the end of this request (pipelining, or the first frames of
/// an upgraded protocol).
///
/// # Returns
///
/// `Ok(None)` when the peer closed the connection cleanly between requests.
///
/// # Errors
///
/// `InvalidData` for malformed or oversized requests, `UnexpectedEof` when the
/// peer hangs up mid-request, and any I/O error from the stream.
pub fn read_request<R: Read>(stream: &mut R, buf: &mut Vec<u8>) -> io::Result<Option<ParsedRequest>> {
    loop {
        if !buf.is_empty() {
            if let Some((head, head_len)) = parse_head(buf)? {
                buf.drain(..head_len);
                let body = read_body(stream, buf, &head.headers)?;
                return Ok(Some(ParsedRequest { body, ..head }));
            }
            if buf.len() > MAX_HEAD_BYTES {
                return Err(invalid("request head too large"));
            }
        }

        let mut chunk = [0u8; READ_CHUNK];
        let n = stream.read(&mut chunk)?;
        if n == 0 {
            if buf.is_empty() {
                return Ok(None);
            }
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                "connection closed mid-request",
            ));
        }
        buf.extend_from_slice(&chunk[..n]);
    }
}

fn parse_head(buf: &[u8]) -> io::Result<Option<(ParsedRequest, usize)>> {
    let mut slots = [httparse::EMPTY_HEADER; MAX_HEADERS];
    let mut req = httparse::Request::new(&mut slots);
    let head_len = match req.parse(buf).map_err(|e| invalid(e.to_string()))? {
        httparse::Status::Complete(len) => len,
        httparse::Status::Partial => return Ok(None),
    };

    let method = req.method.ok_or_else(|| invalid("missing method"))?;
    let method = Method::from_bytes(method.as_bytes()).map_err(|e| invalid(e.to_string()))?;
    let target = req.path.ok_or_else(|| invalid("missing request target"))?;
    let version = match req.version {
        Some(0) => Version::HTTP_10,
        _ => Version::HTTP_11,
    };

    let mut headers = HeaderMap::with_capacity(req.headers.len());
    for h in req.headers.iter() {
        let name = HeaderName::from_bytes(h.name.as_bytes()).map_err(|e| invalid(e.to_string()))?;
        let value = HeaderValue::from_bytes(h.value).map_err(|e| invalid(e.to_string()))?;
        headers.append(name, value);
    }

    let (path, query) = split_target(target);
    let path = decode_path(path).ok_or_else(|| invalid("path is not valid UTF-8"))?;
    trace!(%method, %path, "parsed request head");

    Ok(Some((
        ParsedRequest {
            method,
            path,
            query: query.map(str::to_string),
            version,
            headers,
            body: Vec::new(),
        },
        head_len,
    )))
}

fn read_body<R: Read>(stream: &mut R, buf: &mut Vec<u8>, headers: &HeaderMap) -> io::Result<Vec<u8>> {
    if headers.contains_key(TRANSFER_ENCODING) {
        return Err(invalid("chunked request bodies are not supported"));
    }
    let len = match headers.get(CONTENT_LENGTH) {
        None => return Ok(Vec::new()),
        Some(v) => v
            .to_str()
            .ok()
            .and_then(|s| s.trim().parse::<usize>().ok())
            .ok_or_else(|| invalid("bad content-length"))?,
    };
    if len > MAX_BODY_BYTES {
        return Err(invalid("request body too large"));
    }

    while buf.len() < len {
        let mut chunk = [0u8; READ_CHUNK];
        let n = stream.read(&mut chunk)?;
        if n == 0 {
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                "connection closed mid-body",
            ));
        }
        buf.extend_from_slice(&chunk[..n]);
    }
    Ok(buf.drain(..len).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn read_all(raw: &[u8]) -> (Vec<ParsedRequest>, Vec<u8>) {
        let mut stream = Cursor::new(raw.to_vec());
        let mut buf = Vec::new();
        let mut out = Vec::new();
        while let Some(req) = read_request(&mut stream, &mut buf).unwrap() {
            out.push(req);
        }
        (out, buf)
    }

    #[test]
    fn test_parses_get_with_query() {
        let (reqs, _) = read_all(b"GET /slides%20one/index.html?step=2 HTTP/1.1\r\nHost: x\r\n\r\n");
        assert_eq!(reqs.len(), 1);
        let req = &reqs[0];
        assert_eq!(req.method, Method::GET);
        assert_eq!(req.path, "/slides one/index.html");
        assert_eq!(req.query.as_deref(), Some("step=2"));
        assert_eq!(req.header("host"), Some("x"));
        assert!(req.keep_alive());
    }

    #[test]
    fn test_reads_body_and_pipelined_request() {
        let raw = b"POST /shutdown HTTP/1.1\r\nContent-Length: 4\r\n\r\nbye!GET / HTTP/1.1\r\nConnection: close\r\n\r\n";
        let (reqs, rest) = read_all(raw);
        assert_eq!(reqs.len(), 2);
        assert_eq!(reqs[0].body, b"bye!");
        assert_eq!(reqs[1].path, "/");
        assert!(!reqs[1].keep_alive());
        assert!(rest.is_empty());
    }

    #[test]
    fn test_http10_defaults_to_close() {
        let (reqs, _) = read_all(b"GET / HTTP/1.0\r\n\r\n");
        assert!(!reqs[0].keep_alive());
    }

    #[test]
    fn test_header_tokens() {
        let (reqs, _) = read_all(b"GET /ws HTTP/1.1\r\nConnection: keep-alive, Upgrade\r\n\r\n");
        assert!(reqs[0].header_has_token("connection", "upgrade"));
        assert!(!reqs[0].header_has_token("connection", "close"));
    }

    #[test]
    fn test_malformed_request_errors() {
        let mut stream = Cursor::new(b"NOT A REQUEST\r\n\r\n".to_vec());
        let mut buf = Vec::new();
        let err = read_request(&mut stream, &mut buf).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidData);
    }

    #[test]
    fn test_truncated_request_is_eof() {
        let mut stream = Cursor::new(b"GET / HTTP/1.1\r\nHost".to_vec());
        let mut buf = Vec::new();
        let err = read_request(&mut stream, &mut buf).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::UnexpectedEof);
    }

    #[test]
    fn test_manual_request() {
        let req = ParsedRequest::new(Method::GET, "/index.html?x=1");
        assert_eq!(req.path, "/index.html");
        assert_eq!(req.query.as_deref(), Some("x=1"));
    }
}
