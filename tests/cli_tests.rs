mod common;

use common::http::get;
use common::terminate::RecordingTerminator;
use common::test_server::{fixture_dir, setup_may_runtime};
use scrolly::cli::launch;
use scrolly::runtime_config::RuntimeConfig;
use scrolly::ServeMode;
use std::io::{BufRead, BufReader};
use std::net::{SocketAddr, TcpListener};
use std::process::{Child, ChildStdout, Command, ExitStatus, Stdio};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

fn free_port() -> u16 {
    let probe = TcpListener::bind("127.0.0.1:0").unwrap();
    probe.local_addr().unwrap().port()
}

fn scrolly(args: &[&str], site: &str) -> Child {
    Command::new(env!("CARGO_BIN_EXE_scrolly"))
        .args(args)
        .env("SCROLLY_OPEN_BROWSER", "false")
        .env("SCROLLY_BIND", "127.0.0.1")
        .env("SCROLLY_PORT", free_port().to_string())
        .env("SCROLLY_SITE_DIR", fixture_dir(site))
        .env("SCROLLY_LIB_DIR", fixture_dir("lib"))
        .env("SCROLLY_LOG_LEVEL", "warn")
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .spawn()
        .expect("spawn scrolly")
}

fn banner(stdout: ChildStdout) -> (String, String) {
    let mut lines = BufReader::new(stdout).lines();
    let first = lines.next().expect("first line").unwrap();
    let second = lines.next().expect("second line").unwrap();
    (first, second)
}

/// Port announced as "(port N)" at the end of the first banner line
fn announced_addr(line: &str) -> SocketAddr {
    let port: u16 = line
        .rsplit("(port ")
        .next()
        .and_then(|rest| rest.strip_suffix(')'))
        .and_then(|p| p.parse().ok())
        .unwrap_or_else(|| panic!("no port in {line:?}"));
    SocketAddr::from(([127, 0, 0, 1], port))
}

fn wait_exit(child: &mut Child, within: Duration) -> ExitStatus {
    let deadline = Instant::now() + within;
    loop {
        if let Some(status) = child.try_wait().unwrap() {
            return status;
        }
        if Instant::now() > deadline {
            let _ = child.kill();
            panic!("scrolly still running after {within:?}");
        }
        thread::sleep(Duration::from_millis(20));
    }
}

#[test]
fn test_presentation_exits_when_browser_closes() {
    let mut child = scrolly(&[], "site");
    let (first, second) = banner(child.stdout.take().unwrap());
    assert!(first.starts_with("Opening presentation at http://localhost:"));
    assert_eq!(second, "Close the browser when done, or press Ctrl+C to quit");

    let addr = announced_addr(&first);
    assert!(get(addr, "/").text().contains("/ws"));

    let (mut ws, _) = tungstenite::connect(format!("ws://{addr}/ws")).unwrap();
    ws.close(None).unwrap();
    while ws.read().is_ok() {}

    let status = wait_exit(&mut child, Duration::from_secs(5));
    assert_eq!(status.code(), Some(0));
}

#[test]
fn test_presentation_exits_on_shutdown_request() {
    let mut child = scrolly(&[], "site");
    let (first, _) = banner(child.stdout.take().unwrap());
    let res = get(announced_addr(&first), "/shutdown");
    assert_eq!(res.status, 200);
    let status = wait_exit(&mut child, Duration::from_secs(5));
    assert_eq!(status.code(), Some(0));
}

#[test]
fn test_server_mode_banner_and_no_shutdown() {
    let mut child = scrolly(&["--server"], "site");
    let (first, second) = banner(child.stdout.take().unwrap());
    assert!(first.starts_with("Server running at http://localhost:"));
    assert_eq!(second, "Press Ctrl+C to quit");

    let addr = announced_addr(&first);
    assert_eq!(get(addr, "/shutdown").status, 404);
    thread::sleep(Duration::from_millis(400));
    assert!(child.try_wait().unwrap().is_none());
    child.kill().unwrap();
    let _ = child.wait();
}

#[test]
fn test_missing_bundle_fails_startup() {
    let mut child = scrolly(&[], "does-not-exist");
    let status = wait_exit(&mut child, Duration::from_secs(5));
    assert_eq!(status.code(), Some(1));
}

#[test]
fn test_version_flag() {
    let output = Command::new(env!("CARGO_BIN_EXE_scrolly"))
        .arg("--version")
        .output()
        .unwrap();
    assert!(output.status.success());
    assert!(String::from_utf8_lossy(&output.stdout).starts_with("scrolly "));
}

#[cfg(unix)]
#[test]
fn test_sigterm_exits_cleanly() {
    let mut child = scrolly(&["--server"], "site");
    let (first, _) = banner(child.stdout.take().unwrap());
    assert_eq!(get(announced_addr(&first), "/").status, 200);
    let status = Command::new("kill")
        .args(["-TERM", &child.id().to_string()])
        .status()
        .unwrap();
    assert!(status.success());
    let status = wait_exit(&mut child, Duration::from_secs(5));
    assert_eq!(status.code(), Some(0));
}

#[test]
fn test_launch_on_port_zero_announces_bound_port() {
    setup_may_runtime();
    let runtime = RuntimeConfig {
        start_port: 0,
        bind_host: "127.0.0.1".to_string(),
        site_dir: fixture_dir("site"),
        lib_dir: fixture_dir("lib"),
        open_browser: false,
        ..RuntimeConfig::default()
    };
    let (terminator, _exits) = RecordingTerminator::new();
    let launched = launch(ServeMode::Server, &runtime, Arc::new(terminator)).unwrap();
    launched.handle.wait_ready().unwrap();

    let bound = launched.handle.local_addr().port();
    assert_ne!(bound, 0);
    assert_eq!(launched.port, bound);
    assert_eq!(launched.url, format!("http://localhost:{bound}"));

    let addr = SocketAddr::from(([127, 0, 0, 1], launched.port));
    let res = get(addr, "/");
    assert_eq!(res.status, 200);
    assert!(res.text().contains(r#"<script src="/hotkeys.js"></script>"#));
    assert!(!res.text().contains("WebSocket"));
    assert_eq!(get(addr, "/shutdown").status, 404);
}
