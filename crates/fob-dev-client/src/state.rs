//! Connection lifecycle of a stream client.
//!
//! ```text
//!            open              close (budget left)
//! Connecting ────▶ Open ────────────────────────▶ Retrying
//!     ▲  │                                           │
//!     │  └── connect failure counts as a close ──────┤
//!     └──────────────── delay elapsed ───────────────┘
//!
//! any close that spends the last attempt ──▶ Exhausted
//! ```

/// Where a stream client is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// A connection attempt is in progress.
    Connecting,
    /// The transport is open.
    Open,
    /// The transport closed; waiting to reconnect.
    Retrying,
    /// The retry budget is spent. Terminal.
    Exhausted,
}

/// Retry budget and lifecycle state of one stream client.
///
/// Transitions are pure: each returns the value to emit, and invalid
/// transitions leave the record untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConnectionRecord {
    state: ConnectionState,
    retries_left: u32,
}

impl ConnectionRecord {
    /// Starts connecting with `attempts` connection attempts (at least one).
    pub fn new(attempts: u32) -> Self {
        Self {
            state: ConnectionState::Connecting,
            retries_left: attempts.max(1),
        }
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    /// Attempts left, including the current one.
    pub fn retries_left(&self) -> u32 {
        self.retries_left
    }

    pub fn is_exhausted(&self) -> bool {
        self.state == ConnectionState::Exhausted
    }

    /// Retries remaining after the current attempt, as reported in `INIT`.
    pub fn init(&self) -> u32 {
        self.retries_left.saturating_sub(1)
    }

    /// `Connecting → Open`.
    pub fn on_open(&mut self) -> bool {
        if self.state != ConnectionState::Connecting {
            return false;
        }
        self.state = ConnectionState::Open;
        true
    }

    /// The transport closed or could not be opened.
    ///
    /// Spends one attempt and returns the retries left for the `CLOSE`
    /// event. Moves to `Retrying`, or to `Exhausted` when that was the last
    /// attempt. Returns `None` if no attempt was active.
    pub fn on_close(&mut self) -> Option<u32> {
        if !matches!(
            self.state,
            ConnectionState::Connecting | ConnectionState::Open
        ) {
            return None;
        }

        let reported = self.retries_left.saturating_sub(1);
        self.retries_left = reported;
        self.state = if self.retries_left > 0 {
            ConnectionState::Retrying
        } else {
            ConnectionState::Exhausted
        };
        Some(reported)
    }

    /// `Retrying → Connecting` once the delay has elapsed.
    pub fn on_reconnect(&mut self) -> bool {
        if self.state != ConnectionState::Retrying {
            return false;
        }
        self.state = ConnectionState::Connecting;
        true
    }
}
