#![allow(dead_code)]

pub mod test_server {
    use scrolly::assets::{MemoryStore, OverlayStore};
    use scrolly::server::{AppService, HttpServer, ServerHandle};
    use std::path::PathBuf;
    use std::sync::Once;

    /// Ensures May coroutines are configured only once
    static MAY_INIT: Once = Once::new();

    pub fn setup_may_runtime() {
        MAY_INIT.call_once(|| {
            may::config().set_stack_size(0x8000);
        });
    }

    pub fn fixture_dir(name: &str) -> PathBuf {
        PathBuf::from(env!("CARGO_MANIFEST_DIR"))
            .join("tests")
            .join("fixtures")
            .join(name)
    }

    pub type FixtureOverlay = OverlayStore<MemoryStore, MemoryStore>;

    /// `tests/fixtures/site` layered over `tests/fixtures/lib`
    pub fn fixture_overlay() -> FixtureOverlay {
        let site = MemoryStore::load_dir(fixture_dir("site")).unwrap();
        let lib = MemoryStore::load_dir(fixture_dir("lib")).unwrap();
        OverlayStore::new(site, lib)
    }

    /// Serve `service` on an ephemeral localhost port
    pub fn start(service: AppService) -> ServerHandle {
        setup_may_runtime();
        let handle = HttpServer(service).start("127.0.0.1:0").unwrap();
        handle.wait_ready().unwrap();
        handle
    }
}

pub mod http {
    use std::io::{Read, Write};
    use std::net::{SocketAddr, TcpStream};
    use std::time::Duration;

    #[derive(Debug)]
    pub struct RawResponse {
        pub status: u16,
        pub headers: Vec<(String, String)>,
        pub body: Vec<u8>,
    }

    impl RawResponse {
        pub fn header(&self, name: &str) -> Option<&str> {
            self.headers
                .iter()
                .find(|(k, _)| k.eq_ignore_ascii_case(name))
                .map(|(_, v)| v.as_str())
        }

        pub fn text(&self) -> String {
            String::from_utf8_lossy(&self.body).into_owned()
        }
    }

    /// Split one HTTP/1.1 response; the body is whatever follows the head
    pub fn parse_response(raw: &[u8]) -> RawResponse {
        let split = raw
            .windows(4)
            .position(|w| w == b"\r\n\r\n")
            .expect("response head");
        let head = String::from_utf8_lossy(&raw[..split]).into_owned();
        let mut lines = head.split("\r\n");
        let status = lines
            .next()
            .and_then(|l| l.split_whitespace().nth(1))
            .and_then(|s| s.parse().ok())
            .expect("status line");
        let headers = lines
            .filter_map(|l| l.split_once(':'))
            .map(|(k, v)| (k.trim().to_string(), v.trim().to_string()))
            .collect();
        RawResponse {
            status,
            headers,
            body: raw[split + 4..].to_vec(),
        }
    }

    /// Send one request with `Connection: close` and read until EOF
    pub fn request(addr: SocketAddr, method: &str, path: &str) -> RawResponse {
        parse_response(&request_bytes(addr, method, path))
    }

    /// Like [`request`], but returns the response exactly as received
    pub fn request_bytes(addr: SocketAddr, method: &str, path: &str) -> Vec<u8> {
        let mut stream = TcpStream::connect(addr).unwrap();
        stream.set_read_timeout(Some(Duration::from_secs(5))).unwrap();
        write!(
            stream,
            "{method} {path} HTTP/1.1\r\nHost: {addr}\r\nConnection: close\r\n\r\n"
        )
        .unwrap();
        let mut buf = Vec::new();
        stream.read_to_end(&mut buf).unwrap();
        buf
    }

    pub fn get(addr: SocketAddr, path: &str) -> RawResponse {
        request(addr, "GET", path)
    }
}

pub mod terminate {
    use scrolly::lifecycle::Terminator;
    use std::sync::mpsc::{self, Receiver, Sender};
    use std::sync::Mutex;

    /// Records exit codes instead of ending the test process
    pub struct RecordingTerminator(Mutex<Sender<i32>>);

    impl RecordingTerminator {
        pub fn new() -> (Self, Receiver<i32>) {
            let (tx, rx) = mpsc::channel();
            (Self(Mutex::new(tx)), rx)
        }
    }

    impl Terminator for RecordingTerminator {
        fn terminate(&self, code: i32) {
            let _ = self.0.lock().unwrap().send(code);
        }
    }
}
