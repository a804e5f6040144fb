//! Progress updates pushed over a per-session WebSocket.
//!
//! [`ProgressChannel`] is a sans-IO state machine. The host owns the socket and
//! the timers: it performs each returned [`ChannelEffect`] and feeds socket
//! events back through `on_open`, `on_close`, `on_message` and
//! `on_reconnect_timer`. Every `Open` effect carries a fresh [`SocketId`];
//! open and close events for any socket but the latest one are ignored.
//!
//! ```text
//! Disconnected --connect--> Connecting --on_open--> Connected
//!      ^                        |                       |
//!      +------- on_close -------+------- on_close ------+
//! ```
//!
//! After an unrequested close the channel asks its [`BackoffPolicy`] for a
//! delay and emits `ScheduleReconnect`. `disconnect` invalidates any pending
//! reconnect token, so a timer that fires afterwards is ignored.

use std::time::Duration;

use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::observer::{Observers, Subscription};

pub const DEFAULT_RECONNECT_INTERVAL: Duration = Duration::from_millis(3000);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressUpdate {
    pub stage: String,
    pub message: String,
    /// Percent complete, clamped to 0..=100.
    #[serde(deserialize_with = "deserialize_percent")]
    pub progress: u8,
    pub timestamp: String,
}

fn deserialize_percent<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u8, D::Error> {
    let raw = f64::deserialize(deserializer)?;
    Ok(raw.clamp(0.0, 100.0).round() as u8)
}

#[derive(Debug, Error)]
pub enum ProgressError {
    #[error("failed to decode progress update: {0}")]
    Decode(#[from] serde_json::Error),
}

/// Delay before reconnect attempt `attempt` (1-based). `None` gives up.
pub trait BackoffPolicy {
    fn delay(&self, attempt: u32) -> Option<Duration>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedBackoff {
    pub interval: Duration,
}

impl Default for FixedBackoff {
    fn default() -> Self {
        FixedBackoff {
            interval: DEFAULT_RECONNECT_INTERVAL,
        }
    }
}

impl BackoffPolicy for FixedBackoff {
    fn delay(&self, _attempt: u32) -> Option<Duration> {
        Some(self.interval)
    }
}

/// `base * 2^(attempt - 1)`, capped at `max`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExponentialBackoff {
    pub base: Duration,
    pub max: Duration,
    pub max_attempts: Option<u32>,
}

impl BackoffPolicy for ExponentialBackoff {
    fn delay(&self, attempt: u32) -> Option<Duration> {
        if self.max_attempts.is_some_and(|limit| attempt > limit) {
            return None;
        }
        let factor = 2u32.saturating_pow(attempt.saturating_sub(1));
        Some(self.base.saturating_mul(factor).min(self.max))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
}

/// Identifies one scheduled reconnect. Stale tokens are ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReconnectToken(u64);

/// Identifies the socket opened for one `Open` effect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SocketId(u64);

/// Work the host must perform on the channel's behalf.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChannelEffect {
    Open { url: String, socket: SocketId },
    Close,
    ScheduleReconnect {
        token: ReconnectToken,
        delay: Duration,
    },
}

pub struct ProgressChannel {
    ws_base_url: String,
    backoff: Box<dyn BackoffPolicy>,
    state: ConnectionState,
    session_id: Option<String>,
    should_reconnect: bool,
    attempt: u32,
    generation: u64,
    pending: Option<ReconnectToken>,
    next_socket: u64,
    socket: Option<SocketId>,
    messages: Observers<ProgressUpdate>,
    connects: Observers<()>,
    disconnects: Observers<()>,
}

impl ProgressChannel {
    pub fn new(ws_base_url: impl Into<String>, backoff: Box<dyn BackoffPolicy>) -> Self {
        ProgressChannel {
            ws_base_url: ws_base_url.into(),
            backoff,
            state: ConnectionState::Disconnected,
            session_id: None,
            should_reconnect: false,
            attempt: 0,
            generation: 0,
            pending: None,
            next_socket: 0,
            socket: None,
            messages: Observers::new(),
            connects: Observers::new(),
            disconnects: Observers::new(),
        }
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    pub fn is_connected(&self) -> bool {
        self.state == ConnectionState::Connected
    }

    pub fn session_id(&self) -> Option<&str> {
        self.session_id.as_deref()
    }

    /// Start following `session_id`. If a socket is already open or opening,
    /// a `Close` is emitted first and that socket's later events are ignored.
    pub fn connect(&mut self, session_id: impl Into<String>) -> Vec<ChannelEffect> {
        let mut effects = Vec::new();
        if self.state != ConnectionState::Disconnected {
            effects.push(ChannelEffect::Close);
        }
        self.cancel_pending();
        self.session_id = Some(session_id.into());
        self.should_reconnect = true;
        self.attempt = 0;
        effects.push(self.open());
        effects
    }

    pub fn on_open(&mut self, socket: SocketId) {
        if self.socket != Some(socket) || self.state != ConnectionState::Connecting {
            debug!(?socket, "ignoring open from a replaced socket");
            return;
        }
        info!(session = ?self.session_id, "progress channel connected");
        self.state = ConnectionState::Connected;
        self.attempt = 0;
        self.connects.notify(&());
    }

    pub fn on_close(&mut self, socket: SocketId) -> Option<ChannelEffect> {
        if self.socket != Some(socket) || self.state == ConnectionState::Disconnected {
            debug!(?socket, "ignoring close from a replaced socket");
            return None;
        }
        self.socket = None;
        info!(session = ?self.session_id, "progress channel disconnected");
        self.state = ConnectionState::Disconnected;
        self.disconnects.notify(&());

        if !self.should_reconnect || self.session_id.is_none() {
            return None;
        }
        self.attempt = self.attempt.saturating_add(1);
        let Some(delay) = self.backoff.delay(self.attempt) else {
            warn!(attempts = self.attempt, "giving up on progress channel");
            return None;
        };
        self.generation += 1;
        let token = ReconnectToken(self.generation);
        self.pending = Some(token);
        debug!(attempt = self.attempt, ?delay, "scheduling reconnect");
        Some(ChannelEffect::ScheduleReconnect { token, delay })
    }

    /// Called by the host when a scheduled reconnect timer fires.
    pub fn on_reconnect_timer(&mut self, token: ReconnectToken) -> Option<ChannelEffect> {
        if self.pending != Some(token) {
            debug!(?token, "ignoring stale reconnect timer");
            return None;
        }
        self.pending = None;
        if !self.should_reconnect || self.state != ConnectionState::Disconnected {
            return None;
        }
        Some(self.open())
    }

    /// Decode a text frame and notify message listeners.
    pub fn on_message(&mut self, text: &str) -> Result<ProgressUpdate, ProgressError> {
        let update: ProgressUpdate = serde_json::from_str(text).inspect_err(|err| {
            warn!(error = %err, "failed to parse progress message");
        })?;
        self.messages.notify(&update);
        Ok(update)
    }

    /// Stop following the session. Cancels any pending reconnect.
    pub fn disconnect(&mut self) -> Option<ChannelEffect> {
        self.should_reconnect = false;
        self.cancel_pending();
        self.session_id = None;
        self.socket = None;
        if self.state == ConnectionState::Disconnected {
            return None;
        }
        self.state = ConnectionState::Disconnected;
        self.disconnects.notify(&());
        Some(ChannelEffect::Close)
    }

    pub fn on_progress(&mut self, listener: impl FnMut(&ProgressUpdate) + 'static) -> Subscription {
        self.messages.subscribe(listener)
    }

    pub fn on_connect(&mut self, mut listener: impl FnMut() + 'static) -> Subscription {
        self.connects.subscribe(move |_| listener())
    }

    pub fn on_disconnect(&mut self, mut listener: impl FnMut() + 'static) -> Subscription {
        self.disconnects.subscribe(move |_| listener())
    }

    pub fn unsubscribe(&mut self, subscription: Subscription) -> bool {
        self.messages.unsubscribe(subscription)
            || self.connects.unsubscribe(subscription)
            || self.disconnects.unsubscribe(subscription)
    }

    fn open(&mut self) -> ChannelEffect {
        self.state = ConnectionState::Connecting;
        self.next_socket += 1;
        let socket = SocketId(self.next_socket);
        self.socket = Some(socket);
        let session = self.session_id.as_deref().unwrap_or_default();
        ChannelEffect::Open {
            url: format!("{}/{}", self.ws_base_url.trim_end_matches('/'), session),
            socket,
        }
    }

    fn cancel_pending(&mut self) {
        self.pending = None;
        self.generation += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed_backoff_never_gives_up() {
        let backoff = FixedBackoff::default();
        assert_eq!(backoff.delay(1), Some(Duration::from_secs(3)));
        assert_eq!(backoff.delay(1000), Some(Duration::from_secs(3)));
    }

    #[test]
    fn exponential_backoff_doubles_and_caps() {
        let backoff = ExponentialBackoff {
            base: Duration::from_millis(500),
            max: Duration::from_secs(4),
            max_attempts: Some(6),
        };
        let delays: Vec<_> = (1..=7).map(|a| backoff.delay(a)).collect();
        assert_eq!(
            delays,
            vec![
                Some(Duration::from_millis(500)),
                Some(Duration::from_secs(1)),
                Some(Duration::from_secs(2)),
                Some(Duration::from_secs(4)),
                Some(Duration::from_secs(4)),
                Some(Duration::from_secs(4)),
                None,
            ]
        );
    }

    #[test]
    fn exponential_backoff_survives_huge_attempts() {
        let backoff = ExponentialBackoff {
            base: Duration::from_secs(1),
            max: Duration::from_secs(60),
            max_attempts: None,
        };
        assert_eq!(backoff.delay(u32::MAX), Some(Duration::from_secs(60)));
    }

    #[test]
    fn progress_is_clamped() {
        let update: ProgressUpdate = serde_json::from_str(
            r#"{"stage":"collect","message":"m","progress":140.2,"timestamp":"t"}"#,
        )
        .unwrap();
        assert_eq!(update.progress, 100);
        let update: ProgressUpdate = serde_json::from_str(
            r#"{"stage":"collect","message":"m","progress":-5,"timestamp":"t"}"#,
        )
        .unwrap();
        assert_eq!(update.progress, 0);
    }

    #[test]
    fn url_joins_base_and_session() {
        let backoff = Box::new(FixedBackoff::default());
        let mut channel = ProgressChannel::new("ws://localhost:8000/ws/", backoff);
        assert!(matches!(
            channel.connect("abc").as_slice(),
            [ChannelEffect::Open { url, .. }] if url == "ws://localhost:8000/ws/abc"
        ));
    }

    #[test]
    fn each_open_gets_a_new_socket() {
        let mut channel = ProgressChannel::new("ws://h/ws", Box::new(FixedBackoff::default()));
        let first = channel.connect("a");
        let second = channel.connect("b");
        let socket = |effect: &ChannelEffect| match effect {
            ChannelEffect::Open { socket, .. } => *socket,
            other => panic!("expected open, got {:?}", other),
        };
        assert_ne!(socket(&first[0]), socket(&second[1]));
    }
}
