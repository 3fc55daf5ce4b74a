use async_trait::async_trait;
use flare_core::{ClientEvent, SignalError};

/// Outbound half of the signaling transport. The transport delivers events
/// at least once per connection and guarantees no ordering across
/// reconnects; everything above it tolerates both.
#[async_trait]
pub trait SignalingChannel: Send + Sync {
    async fn send(&self, event: ClientEvent) -> Result<(), SignalError>;
}
