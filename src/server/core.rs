use super::request::ParsedRequest;
use super::response::ResponseWriter;
use may::net::TcpStream;
use std::io;
use std::sync::Arc;

/// Serves one request by writing into a [`ResponseWriter`]
///
/// Handlers compose by wrapping: a middleware holds an inner handler and
/// either forwards the writer untouched or hands the inner handler a writer of
/// its own.
pub trait Handler: Send + Sync {
    fn serve(&self, req: &ParsedRequest, res: &mut dyn ResponseWriter) -> io::Result<()>;
}

impl<H: Handler + ?Sized> Handler for Arc<H> {
    fn serve(&self, req: &ParsedRequest, res: &mut dyn ResponseWriter) -> io::Result<()> {
        (**self).serve(req, res)
    }
}

impl<H: Handler + ?Sized> Handler for Box<H> {
    fn serve(&self, req: &ParsedRequest, res: &mut dyn ResponseWriter) -> io::Result<()> {
        (**self).serve(req, res)
    }
}

/// Takes over a connection after a `101 Switching Protocols` response
///
/// Receives the socket and any bytes already read past the request head.
pub type UpgradeFn = Box<dyn FnOnce(TcpStream, Vec<u8>) + Send>;

/// What the connection loop does after a service call
pub enum Outcome {
    /// Response complete; keep serving requests on this connection
    Done,
    /// Protocol switched; the connection now belongs to the upgrade function
    Upgrade(UpgradeFn),
}

/// Top-level service run by [`super::HttpServer`] for every request
pub trait HttpService: Send + Sync + 'static {
    fn call(&self, req: &ParsedRequest, res: &mut dyn ResponseWriter) -> io::Result<Outcome>;
}
