use super::core::{HttpService, Outcome};
use super::request::read_request;
use super::response::StreamWriter;
use http::Method;
use may::coroutine::JoinHandle;
use may::net::{TcpListener, TcpStream};
use std::io::{self, Write};
use std::net::{IpAddr, Ipv4Addr, SocketAddr, ToSocketAddrs};
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use tracing::{debug, warn};

/// Coroutine HTTP/1.1 server
///
/// One coroutine accepts connections; every accepted connection is served on
/// its own coroutine with a keep-alive request loop. A service may take the
/// socket over by returning [`Outcome::Upgrade`].
pub struct HttpServer<T>(pub T);

/// Handle to a running HTTP server
///
/// Provides methods for waiting until the server is ready, stopping it,
/// or joining the accept coroutine.
pub struct ServerHandle {
    addr: SocketAddr,
    handle: JoinHandle<()>,
}

impl ServerHandle {
    /// Address the listener is bound to
    pub fn local_addr(&self) -> SocketAddr {
        self.addr
    }

    /// Wait for the server to be ready to accept connections
    ///
    /// Polls the server address by attempting TCP connections until successful.
    ///
    /// # Errors
    ///
    /// Returns `TimedOut` error if the server doesn't become ready within ~250ms (50 attempts × 5ms).
    pub fn wait_ready(&self) -> io::Result<()> {
        let mut target = self.addr;
        if target.ip().is_unspecified() {
            target.set_ip(IpAddr::V4(Ipv4Addr::LOCALHOST));
        }
        for _ in 0..50 {
            if std::net::TcpStream::connect(target).is_ok() {
                return Ok(());
            }
            thread::sleep(Duration::from_millis(5));
        }
        Err(io::Error::new(io::ErrorKind::TimedOut, "server not ready"))
    }

    /// Stop accepting connections
    ///
    /// Cancels the accept coroutine and waits for it to finish. Connections
    /// already being served run to completion on their own coroutines.
    pub fn stop(self) {
        // SAFETY: may marks cancellation unsafe because the cancelled coroutine
        // unwinds at its next yield point. The accept loop holds no locks and
        // owns only the listener, which is dropped during the unwind.
        unsafe {
            self.handle.coroutine().cancel();
        }
        let _ = self.handle.join();
    }

    /// Wait for the accept coroutine to complete
    ///
    /// The server runs until the process exits unless stopped externally.
    ///
    /// # Errors
    ///
    /// Returns an error if the accept coroutine panicked.
    pub fn join(self) -> thread::Result<()> {
        self.handle.join()
    }
}

impl<T: HttpService> HttpServer<T> {
    /// Bind `addr` and start serving
    ///
    /// The listener is bound before this returns, so bind failures surface
    /// here rather than inside the accept coroutine.
    ///
    /// # Errors
    ///
    /// Returns an error if the address is invalid or the port cannot be bound.
    pub fn start<A: ToSocketAddrs>(self, addr: A) -> io::Result<ServerHandle> {
        let addr = addr
            .to_socket_addrs()?
            .next()
            .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "invalid address"))?;
        let listener = TcpListener::bind(addr)?;
        let addr = listener.local_addr()?;
        let service = Arc::new(self.0);

        let handle = may::go!(move || {
            for stream in listener.incoming() {
                match stream {
                    Ok(stream) => {
                        let service = Arc::clone(&service);
                        may::go!(move || {
                            if let Err(e) = serve_connection(stream, service.as_ref()) {
                                debug!(error = %e, "connection ended with error");
                            }
                        });
                    }
                    Err(e) => warn!(error = %e, "failed to accept connection"),
                }
            }
        });
        Ok(ServerHandle { addr, handle })
    }
}

/// Serve requests on one connection until it closes or is upgraded
pub fn serve_connection<S: HttpService + ?Sized>(mut stream: TcpStream, service: &S) -> io::Result<()> {
    let mut buf = Vec::with_capacity(4096);
    loop {
        let req = match read_request(&mut stream, &mut buf) {
            Ok(Some(req)) => req,
            Ok(None) => return Ok(()),
            Err(e) if e.kind() == io::ErrorKind::InvalidData => {
                debug!(error = %e, "rejecting malformed request");
                let _ = stream.write_all(
                    b"HTTP/1.1 400 Bad Request\r\nconnection: close\r\ncontent-length: 0\r\n\r\n",
                );
                return Err(e);
            }
            Err(e) => return Err(e),
        };

        let head_only = req.method == Method::HEAD;
        let mut writer = StreamWriter::new(&mut stream, req.keep_alive(), head_only);
        let outcome = service.call(&req, &mut writer)?;
        let keep_alive = writer.finish()?;

        match outcome {
            Outcome::Upgrade(upgrade) => {
                upgrade(stream, std::mem::take(&mut buf));
                return Ok(());
            }
            Outcome::Done if !keep_alive => return Ok(()),
            Outcome::Done => {}
        }
    }
}
