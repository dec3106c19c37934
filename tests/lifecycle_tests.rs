mod common;

use common::http::get;
use common::terminate::RecordingTerminator;
use common::test_server::{fixture_overlay, start};
use scrolly::lifecycle::{LifecycleController, LifecycleState};
use scrolly::server::{AppService, ServerHandle};
use std::net::SocketAddr;
use std::sync::mpsc::Receiver;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};
use tungstenite::Message;

fn presentation() -> (ServerHandle, Arc<LifecycleController>, Receiver<i32>) {
    let (terminator, exits) = RecordingTerminator::new();
    let controller = Arc::new(LifecycleController::new(Arc::new(terminator)));
    let handle = start(AppService::presentation(fixture_overlay(), Arc::clone(&controller)));
    (handle, controller, exits)
}

fn connect(addr: SocketAddr) -> tungstenite::WebSocket<tungstenite::stream::MaybeTlsStream<std::net::TcpStream>> {
    let (ws, response) = tungstenite::connect(format!("ws://{addr}/ws")).unwrap();
    assert_eq!(response.status(), 101);
    ws
}

fn wait_for_state(controller: &LifecycleController, state: LifecycleState) {
    let deadline = Instant::now() + Duration::from_secs(2);
    while controller.state() != state {
        assert!(Instant::now() < deadline, "state stuck at {:?}", controller.state());
        thread::sleep(Duration::from_millis(10));
    }
}

#[test]
fn test_presentation_page_carries_heartbeat() {
    let (handle, controller, _exits) = presentation();
    let body = get(handle.local_addr(), "/").text();
    assert!(body.contains("new WebSocket('ws://' + window.location.host + '/ws')"));
    assert!(body.contains("socket.send('ping')"));
    assert!(body.contains(r#"<script src="/hotkeys.js"></script>"#));
    assert_eq!(controller.state(), LifecycleState::AwaitingConnection);
    handle.stop();
}

#[test]
fn test_heartbeats_keep_connection_then_close_terminates() {
    let (handle, controller, exits) = presentation();
    let mut ws = connect(handle.local_addr());
    wait_for_state(&controller, LifecycleState::Connected);

    for _ in 0..3 {
        ws.send(Message::text("ping")).unwrap();
    }
    thread::sleep(Duration::from_millis(50));
    assert_eq!(controller.state(), LifecycleState::Connected);
    assert!(exits.try_recv().is_err());

    let closed_at = Instant::now();
    ws.close(None).unwrap();
    while ws.read().is_ok() {}

    assert_eq!(exits.recv_timeout(Duration::from_secs(3)), Ok(0));
    assert!(closed_at.elapsed() >= Duration::from_millis(400));
    assert_eq!(controller.state(), LifecycleState::Terminating);
    handle.stop();
}

#[test]
fn test_dropped_socket_terminates() {
    let (handle, controller, exits) = presentation();
    let ws = connect(handle.local_addr());
    wait_for_state(&controller, LifecycleState::Connected);
    drop(ws);
    assert_eq!(exits.recv_timeout(Duration::from_secs(3)), Ok(0));
    handle.stop();
}

#[test]
fn test_shutdown_request_acknowledged_then_terminates() {
    let (handle, controller, exits) = presentation();
    let res = get(handle.local_addr(), "/shutdown");
    assert_eq!(res.status, 200);
    assert!(res.body.is_empty());
    assert_eq!(controller.state(), LifecycleState::Terminating);
    assert_eq!(exits.recv_timeout(Duration::from_secs(3)), Ok(0));
    handle.stop();
}

#[test]
fn test_shutdown_and_channel_close_exit_once() {
    let (handle, controller, exits) = presentation();
    let ws = connect(handle.local_addr());
    wait_for_state(&controller, LifecycleState::Connected);

    assert_eq!(get(handle.local_addr(), "/shutdown").status, 200);
    drop(ws);

    assert_eq!(exits.recv_timeout(Duration::from_secs(3)), Ok(0));
    assert!(exits.recv_timeout(Duration::from_secs(1)).is_err());
    handle.stop();
}

#[test]
fn test_plain_get_on_control_path_is_400_and_server_survives() {
    let (handle, controller, exits) = presentation();
    let res = get(handle.local_addr(), "/ws");
    assert_eq!(res.status, 400);
    assert_eq!(controller.state(), LifecycleState::AwaitingConnection);
    assert_eq!(get(handle.local_addr(), "/").status, 200);
    assert!(exits.try_recv().is_err());
    handle.stop();
}
