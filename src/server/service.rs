use super::core::{Handler, HttpService, Outcome};
use super::request::ParsedRequest;
use super::response::{set_content_length, write_text_error, ResponseWriter};
use crate::assets::ByteStore;
use crate::content::{HostKind, Injection};
use crate::lifecycle::channel::{handshake_response, run_control_channel, write_handshake_response};
use crate::lifecycle::LifecycleController;
use crate::middleware::{InjectScripts, TracingMiddleware};
use crate::static_files::StaticFiles;
use http::{Method, StatusCode};
use may::net::TcpStream;
use std::io;
use std::sync::Arc;
use tracing::{info, warn};

/// Path of the control channel upgrade endpoint
pub const CONTROL_PATH: &str = "/ws";

/// Path of the explicit shutdown endpoint
pub const SHUTDOWN_PATH: &str = "/shutdown";

/// Top-level request router
///
/// With a [`LifecycleController`] attached (presentation mode) the control
/// channel and shutdown endpoints are live. Without one (persistent server
/// mode) every request, including `/ws` and `/shutdown`, goes to the asset
/// pipeline.
pub struct AppService {
    assets: Box<dyn Handler>,
    lifecycle: Option<Arc<LifecycleController>>,
}

impl AppService {
    pub fn new(assets: Box<dyn Handler>, lifecycle: Option<Arc<LifecycleController>>) -> Self {
        Self { assets, lifecycle }
    }

    /// Asset pipeline for `store`: request logging, script injection, static files
    pub fn asset_pipeline<S>(store: S, host: HostKind) -> TracingMiddleware<InjectScripts<StaticFiles<S>>>
    where
        S: ByteStore + 'static,
    {
        TracingMiddleware::new(InjectScripts::new(
            StaticFiles::new(store),
            Injection::for_host(host),
        ))
    }

    /// Presentation mode: assets plus lifecycle endpoints driving `controller`
    pub fn presentation<S>(store: S, controller: Arc<LifecycleController>) -> Self
    where
        S: ByteStore + 'static,
    {
        Self::new(
            Box::new(Self::asset_pipeline(store, HostKind::Presentation)),
            Some(controller),
        )
    }

    /// Persistent server mode: assets only
    pub fn persistent<S>(store: S) -> Self
    where
        S: ByteStore + 'static,
    {
        Self::new(Box::new(Self::asset_pipeline(store, HostKind::Server)), None)
    }

    pub fn lifecycle(&self) -> Option<&Arc<LifecycleController>> {
        self.lifecycle.as_ref()
    }
}

/// Answer a `/ws` upgrade request
///
/// A valid handshake gets `101` and hands the socket to the control channel
/// loop; anything else gets `400` and the connection stays HTTP.
pub fn control_endpoint(
    req: &ParsedRequest,
    res: &mut dyn ResponseWriter,
    controller: &Arc<LifecycleController>,
) -> io::Result<Outcome> {
    let response = match handshake_response(req) {
        Ok(response) => response,
        Err(e) => {
            warn!(error = %e, method = %req.method, "rejected control channel upgrade");
            write_text_error(res, StatusCode::BAD_REQUEST, "Bad Request")?;
            return Ok(Outcome::Done);
        }
    };

    write_handshake_response(res, &response)?;
    let controller = Arc::clone(controller);
    Ok(Outcome::Upgrade(Box::new(move |stream: TcpStream, leftover: Vec<u8>| {
        run_control_channel(stream, leftover, &controller);
    })))
}

/// Acknowledge a shutdown request, then schedule termination
pub fn shutdown_endpoint(res: &mut dyn ResponseWriter, controller: &LifecycleController) -> io::Result<()> {
    info!("shutdown requested from browser");
    set_content_length(res.headers_mut(), 0);
    res.write_head(StatusCode::OK)?;
    controller.shutdown_requested();
    Ok(())
}

impl HttpService for AppService {
    fn call(&self, req: &ParsedRequest, res: &mut dyn ResponseWriter) -> io::Result<Outcome> {
        if let Some(controller) = &self.lifecycle {
            if req.path == CONTROL_PATH {
                return control_endpoint(req, res, controller);
            }
            if req.path == SHUTDOWN_PATH && (req.method == Method::GET || req.method == Method::POST) {
                shutdown_endpoint(res, controller)?;
                return Ok(Outcome::Done);
            }
        }

        self.assets.serve(req, res)?;
        Ok(Outcome::Done)
    }
}
