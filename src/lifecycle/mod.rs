//! # Lifecycle Module
//!
//! Ties the process lifetime to a browser tab in presentation mode.
//!
//! ## States
//!
//! ```text
//!  AwaitingConnection ──(/ws upgrade)──► Connected ──(read error / close)──► Terminating
//!          │                                 │                                   ▲
//!          └──────────────(/shutdown)────────┴───────────────────────────────────┘
//! ```
//!
//! A [`LifecycleController`] owns the state. The first transition into
//! `Terminating` schedules exactly one exit after a short grace period so the
//! in-flight response can flush; every later trigger is a no-op. That makes the
//! race between an explicit `/shutdown` and a simultaneous channel close
//! deterministic.
//!
//! The browser side opens the channel on page load and sends a heartbeat every
//! few seconds. Message content and timing are never inspected; only whether
//! the connection is still readable matters.
//!
//! In persistent server mode no controller exists and neither endpoint is
//! routed.

pub mod channel;
#[cfg(unix)]
pub mod signals;

use std::fmt;
use std::sync::atomic::{AtomicU64, AtomicU8, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use tracing::{debug, info};

/// Grace period after the control channel drops
pub const CHANNEL_CLOSE_GRACE: Duration = Duration::from_millis(500);

/// Grace period after an explicit shutdown request
pub const SHUTDOWN_GRACE: Duration = Duration::from_millis(200);

/// Lifecycle state of a presentation-mode server
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum LifecycleState {
    AwaitingConnection = 0,
    Connected = 1,
    Terminating = 2,
}

impl LifecycleState {
    fn from_u8(raw: u8) -> Self {
        match raw {
            0 => LifecycleState::AwaitingConnection,
            1 => LifecycleState::Connected,
            _ => LifecycleState::Terminating,
        }
    }
}

/// Why the process is ending
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TerminationReason {
    ChannelClosed,
    ShutdownRequested,
}

impl TerminationReason {
    pub fn grace(self) -> Duration {
        match self {
            TerminationReason::ChannelClosed => CHANNEL_CLOSE_GRACE,
            TerminationReason::ShutdownRequested => SHUTDOWN_GRACE,
        }
    }
}

impl fmt::Display for TerminationReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TerminationReason::ChannelClosed => f.write_str("browser closed"),
            TerminationReason::ShutdownRequested => f.write_str("shutdown requested from browser"),
        }
    }
}

/// Ends the process
///
/// Production code uses [`ProcessExit`]; tests substitute a recorder.
pub trait Terminator: Send + Sync {
    fn terminate(&self, code: i32);
}

/// Calls [`std::process::exit`]
#[derive(Debug, Default, Clone, Copy)]
pub struct ProcessExit;

impl Terminator for ProcessExit {
    fn terminate(&self, code: i32) {
        std::process::exit(code);
    }
}

/// Single owner of the presentation lifecycle state
pub struct LifecycleController {
    state: AtomicU8,
    channels: AtomicU64,
    terminator: Arc<dyn Terminator>,
}

impl fmt::Debug for LifecycleController {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LifecycleController")
            .field("state", &self.state())
            .field("channels", &self.channels.load(Ordering::Relaxed))
            .finish()
    }
}

impl LifecycleController {
    pub fn new(terminator: Arc<dyn Terminator>) -> Self {
        Self {
            state: AtomicU8::new(LifecycleState::AwaitingConnection as u8),
            channels: AtomicU64::new(0),
            terminator,
        }
    }

    pub fn state(&self) -> LifecycleState {
        LifecycleState::from_u8(self.state.load(Ordering::Acquire))
    }

    /// Record a newly upgraded control channel
    ///
    /// Returns the channel's id, or `None` when the process is already
    /// terminating and the channel should be dropped.
    pub fn channel_opened(&self) -> Option<u64> {
        let moved = self.state.fetch_update(Ordering::AcqRel, Ordering::Acquire, |raw| {
            match LifecycleState::from_u8(raw) {
                LifecycleState::Terminating => None,
                _ => Some(LifecycleState::Connected as u8),
            }
        });
        if moved.is_err() {
            return None;
        }
        let id = self.channels.fetch_add(1, Ordering::Relaxed) + 1;
        info!(channel = id, "browser connected");
        Some(id)
    }

    /// The control channel `id` stopped being readable
    pub fn channel_closed(&self, id: u64) -> bool {
        debug!(channel = id, "control channel closed");
        self.begin_termination(TerminationReason::ChannelClosed)
    }

    /// The browser asked the server to stop
    pub fn shutdown_requested(&self) -> bool {
        self.begin_termination(TerminationReason::ShutdownRequested)
    }

    /// Move to `Terminating` and schedule the exit
    ///
    /// Returns `true` for the call that performed the transition; later calls
    /// return `false` and schedule nothing.
    pub fn begin_termination(&self, reason: TerminationReason) -> bool {
        let previous = self
            .state
            .swap(LifecycleState::Terminating as u8, Ordering::AcqRel);
        if LifecycleState::from_u8(previous) == LifecycleState::Terminating {
            debug!(%reason, "termination already scheduled");
            return false;
        }

        info!(%reason, grace_ms = reason.grace().as_millis() as u64, "shutting down");
        let terminator = Arc::clone(&self.terminator);
        let grace = reason.grace();
        thread::spawn(move || {
            thread::sleep(grace);
            terminator.terminate(0);
        });
        true
    }
}
