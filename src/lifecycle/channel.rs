//! Control channel: the WebSocket the presentation page keeps open.
//!
//! `tungstenite` checks the upgrade request and builds the `101` answer,
//! which goes out on the HTTP connection; it then takes over framing.

use super::LifecycleController;
use crate::server::{ParsedRequest, ResponseWriter};
use std::io::{self, Read, Write};
use tracing::{debug, trace};
use tungstenite::handshake::server::{create_response, Request, Response};
use tungstenite::protocol::Role;
use tungstenite::{Message, WebSocket};

/// Check an upgrade request and build its `101 Switching Protocols` response
///
/// # Errors
///
/// Returns [`tungstenite::Error::Protocol`] for anything that is not a valid
/// RFC 6455 upgrade.
pub fn handshake_response(req: &ParsedRequest) -> tungstenite::Result<Response> {
    let mut request = Request::builder()
        .method(req.method.clone())
        .uri(req.path.as_str())
        .version(req.version)
        .body(())?;
    *request.headers_mut() = req.headers.clone();
    create_response(&request)
}

/// Write the head of an accepted handshake
pub fn write_handshake_response(res: &mut dyn ResponseWriter, response: &Response) -> io::Result<()> {
    let headers = res.headers_mut();
    for (name, value) in response.headers() {
        headers.insert(name.clone(), value.clone());
    }
    res.write_head(response.status())
}

/// Drain the control channel until it stops being readable
///
/// Heartbeats and any other data frames are read and discarded. A close
/// frame is answered before returning. When the loop ends the controller is
/// told the channel closed, whatever the cause.
pub fn run_control_channel<S: Read + Write>(
    stream: S,
    leftover: Vec<u8>,
    controller: &LifecycleController,
) {
    let Some(id) = controller.channel_opened() else {
        debug!("dropping control channel opened during shutdown");
        return;
    };

    let mut ws = WebSocket::from_partially_read(stream, leftover, Role::Server, None);
    loop {
        match ws.read() {
            Ok(Message::Close(frame)) => {
                debug!(channel = id, ?frame, "control channel close frame");
                let _ = ws.flush();
                break;
            }
            Ok(msg) => trace!(channel = id, len = msg.len(), "heartbeat"),
            Err(e) => {
                debug!(channel = id, error = %e, "control channel read failed");
                break;
            }
        }
    }
    controller.channel_closed(id);
}
