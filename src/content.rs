//! # Content Module
//!
//! Pure functions that decide whether a response is HTML and, if so, splice the
//! helper scripts into it. Both hosting adapters share them:
//!
//! - [`crate::middleware::InjectScripts`] wraps a downstream HTTP handler and
//!   rewrites what it wrote
//! - [`crate::shell::ShellAssetHandler`] reads assets straight from the overlay
//!   for a native shell whose asset pipeline cannot intercept responses
//!
//! ## Classification
//!
//! Classification happens in two steps:
//!
//! 1. [`classify_path`] looks at the request path only. The root, paths with no
//!    extension and `.html` / `.htm` paths are HTML candidates; every other
//!    extension passes through untouched and unbuffered.
//! 2. For candidates, [`looks_like_html`] sniffs the full body for an opening
//!    `<html` tag or a closing `</body>` tag. Bodies with neither are served as-is
//!    under a sniffed content type (see [`sniff_content_type`]).
//!
//! Plain text that happens to contain either marker (a code sample, say) is
//! treated as HTML.
//!
//! ## Injection
//!
//! The fragment produced by [`Injection::for_host`] is inserted immediately
//! before the first `</body>`. Without a `</body>` the body is left unchanged.

use std::borrow::Cow;

/// Content type used for every rewritten HTML response
pub const HTML_CONTENT_TYPE: &str = "text/html; charset=utf-8";

/// Closing body marker; injection point and HTML evidence
pub const BODY_CLOSE: &[u8] = b"</body>";

/// Opening html marker; HTML evidence only
pub const HTML_OPEN: &[u8] = b"<html";

/// Request-path verdict, made before the downstream handler runs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathClass {
    /// Might be HTML; buffer the response and sniff it
    HtmlCandidate,
    /// Definitely not HTML; stream it through untouched
    Passthrough,
}

/// Classify a request path (no query string) by its extension
///
/// `.html` and `.htm` match in any case. A name ending in a bare dot has no
/// extension, so it is a candidate; the body sniff still decides.
pub fn classify_path(path: &str) -> PathClass {
    if path.is_empty() || path == "/" {
        return PathClass::HtmlCandidate;
    }
    match extension(path) {
        None => PathClass::HtmlCandidate,
        Some(ext) if ext.eq_ignore_ascii_case("html") || ext.eq_ignore_ascii_case("htm") => {
            PathClass::HtmlCandidate
        }
        Some(_) => PathClass::Passthrough,
    }
}

/// Extension of the last path segment, without the dot
///
/// A trailing dot yields `None`, as does a segment with no dot at all.
pub fn extension(path: &str) -> Option<&str> {
    let name = path.rsplit('/').next().unwrap_or(path);
    let idx = name.rfind('.')?;
    let ext = &name[idx + 1..];
    if ext.is_empty() {
        None
    } else {
        Some(ext)
    }
}

/// Whether `body` carries enough evidence to be treated as HTML
pub fn looks_like_html(body: &[u8]) -> bool {
    find(body, HTML_OPEN).is_some() || find(body, BODY_CLOSE).is_some()
}

/// Insert `fragment` immediately before the first `</body>`
///
/// Returns `None` when the body has no closing body tag.
pub fn inject(body: &[u8], fragment: &[u8]) -> Option<Vec<u8>> {
    let idx = find(body, BODY_CLOSE)?;
    let mut out = Vec::with_capacity(body.len() + fragment.len());
    out.extend_from_slice(&body[..idx]);
    out.extend_from_slice(fragment);
    out.extend_from_slice(&body[idx..]);
    Some(out)
}

/// Outcome of [`classify_and_inject`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Classified<'a> {
    /// Genuine HTML; `body` is the bytes to serve
    Html { body: Cow<'a, [u8]>, injected: bool },
    /// Not HTML after all; serve the original bytes with a sniffed type
    Other,
}

/// Confirm a candidate body as HTML and inject the host's fragment
pub fn classify_and_inject<'a>(body: &'a [u8], injection: &Injection) -> Classified<'a> {
    if !looks_like_html(body) {
        return Classified::Other;
    }
    match inject(body, injection.fragment().as_bytes()) {
        Some(rewritten) => Classified::Html {
            body: Cow::Owned(rewritten),
            injected: true,
        },
        None => Classified::Html {
            body: Cow::Borrowed(body),
            injected: false,
        },
    }
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    if needle.is_empty() || haystack.len() < needle.len() {
        return None;
    }
    haystack.windows(needle.len()).position(|w| w == needle)
}

/// Which host serves the page; decides the injected scripts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostKind {
    /// Browser presentation tied to the server's lifetime
    Presentation,
    /// Persistent server, no control channel
    Server,
    /// Native desktop shell hosting the bundle itself
    Shell,
}

const HEARTBEAT_SCRIPT: &str = r#"<script>
(function () {
    const socket = new WebSocket('ws://' + window.location.host + '/ws');
    socket.addEventListener('open', function () {
        console.log('Connected to presentation server');
        setInterval(function () {
            if (socket.readyState === WebSocket.OPEN) {
                socket.send('ping');
            }
        }, 5000);
    });
    socket.addEventListener('close', function () {
        console.log('Disconnected from presentation server');
    });
    socket.addEventListener('error', function (err) {
        console.error('Presentation server socket error:', err);
    });
})();
</script>
"#;

const HELPER_SCRIPTS: &str = r#"<script src="/js-yaml.min.js"></script>
<script src="/hotkeys.js"></script>
"#;

const SHELL_HELPER_SCRIPTS: &str = r#"<script src="js-yaml.min.js"></script>
<script src="hotkeys.js"></script>
"#;

const SHELL_LINK_BRIDGE: &str = r#"<script>
document.addEventListener('click', function (event) {
    const link = event.target.closest('a');
    if (!link || !link.href) {
        return;
    }
    if (link.target === '_blank' || link.href.startsWith('http')) {
        event.preventDefault();
        if (window.runtime && window.runtime.BrowserOpenURL) {
            window.runtime.BrowserOpenURL(link.href);
        }
    }
});
</script>
"#;

/// The markup spliced in front of `</body>`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Injection {
    fragment: String,
}

impl Injection {
    /// Fragment for the given host
    ///
    /// - `Presentation`: control-channel heartbeat plus the YAML and hotkey helpers
    /// - `Server`: the helpers only
    /// - `Shell`: the helpers (relative paths) plus the external-link bridge
    pub fn for_host(host: HostKind) -> Self {
        let fragment = match host {
            HostKind::Presentation => format!("\n{HEARTBEAT_SCRIPT}{HELPER_SCRIPTS}"),
            HostKind::Server => format!("\n{HELPER_SCRIPTS}"),
            HostKind::Shell => format!("{SHELL_HELPER_SCRIPTS}{SHELL_LINK_BRIDGE}"),
        };
        Self { fragment }
    }

    /// Arbitrary fragment, mostly for tests and embedding hosts
    pub fn custom(fragment: impl Into<String>) -> Self {
        Self {
            fragment: fragment.into(),
        }
    }

    pub fn fragment(&self) -> &str {
        &self.fragment
    }
}

// Leading-byte signatures checked after skipping whitespace; matched
// case-insensitively and must be followed by a space or '>'.
const HTML_SIGNATURES: &[&[u8]] = &[
    b"<!DOCTYPE HTML",
    b"<HTML",
    b"<HEAD",
    b"<SCRIPT",
    b"<IFRAME",
    b"<H1",
    b"<DIV",
    b"<FONT",
    b"<TABLE",
    b"<A",
    b"<STYLE",
    b"<TITLE",
    b"<B",
    b"<BODY",
    b"<BR",
    b"<P",
    b"<!--",
];

const MAGIC_SIGNATURES: &[(&[u8], &str)] = &[
    (b"%PDF-", "application/pdf"),
    (b"\x89PNG\r\n\x1a\n", "image/png"),
    (b"GIF87a", "image/gif"),
    (b"GIF89a", "image/gif"),
    (b"\xff\xd8\xff", "image/jpeg"),
    (b"\x00asm", "application/wasm"),
    (b"\x1f\x8b\x08", "application/x-gzip"),
    (b"PK\x03\x04", "application/zip"),
    (b"wOFF", "font/woff"),
    (b"wOF2", "font/woff2"),
    (b"OggS\x00", "application/ogg"),
    (b"\xef\xbb\xbf", "text/plain; charset=utf-8"),
];

const SNIFF_LEN: usize = 512;

/// Guess a content type from the leading bytes of a body
///
/// Only the first 512 bytes are considered. Falls back to
/// `text/plain; charset=utf-8` for text and `application/octet-stream` for
/// anything containing binary control bytes.
pub fn sniff_content_type(data: &[u8]) -> &'static str {
    let data = &data[..data.len().min(SNIFF_LEN)];

    let start = data
        .iter()
        .position(|&b| !matches!(b, b'\t' | b'\n' | b'\x0c' | b'\r' | b' '))
        .unwrap_or(data.len());
    let trimmed = &data[start..];

    for sig in HTML_SIGNATURES {
        if trimmed.len() > sig.len()
            && trimmed[..sig.len()].eq_ignore_ascii_case(sig)
            && matches!(trimmed[sig.len()], b' ' | b'>')
        {
            return HTML_CONTENT_TYPE;
        }
    }
    if trimmed.len() >= 5 && trimmed[..5].eq_ignore_ascii_case(b"<?xml") {
        return "text/xml; charset=utf-8";
    }
    for &(magic, content_type) in MAGIC_SIGNATURES {
        if data.starts_with(magic) {
            return content_type;
        }
    }
    if data.len() >= 12 && &data[..4] == b"RIFF" && &data[8..12] == b"WEBP" {
        return "image/webp";
    }

    let binary = data
        .iter()
        .any(|&b| matches!(b, 0x00..=0x08 | 0x0b | 0x0e..=0x1a | 0x1c..=0x1f));
    if binary {
        "application/octet-stream"
    } else {
        "text/plain; charset=utf-8"
    }
}
