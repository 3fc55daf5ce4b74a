use flare_core::{IceServerConfig, RoomId, UserId, default_ice_servers};
use std::time::Duration;

/// Bounded reconnection schedule, consulted only from the failed state.
/// Every retry re-runs the whole negotiation from scratch.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_backoff: Duration,
}

impl RetryPolicy {
    pub fn allows(&self, attempt: u32) -> bool {
        attempt <= self.max_attempts
    }

    /// Exponential backoff: base, 2x base, 4x base, ...
    pub fn backoff(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(6);
        self.base_backoff * 2u32.pow(exponent)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_backoff: Duration::from_secs(2),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// `ws://host:port/ws` endpoint of the signaling relay.
    pub signaling_url: String,
    pub room_id: RoomId,
    pub user_id: UserId,
    /// Bound on the initial signaling handshake; initialization fails
    /// explicitly instead of hanging.
    pub connect_timeout: Duration,
    pub retry: RetryPolicy,
    pub ice_servers: Vec<IceServerConfig>,
}

impl ClientConfig {
    pub fn new(
        signaling_url: impl Into<String>,
        room_id: impl Into<RoomId>,
        user_id: impl Into<UserId>,
    ) -> Self {
        Self {
            signaling_url: signaling_url.into(),
            room_id: room_id.into(),
            user_id: user_id.into(),
            connect_timeout: Duration::from_secs(10),
            retry: RetryPolicy::default(),
            ice_servers: default_ice_servers(),
        }
    }
}
