use flare_core::{IceServerConfig, default_ice_servers};
use std::time::Duration;

/// Relay tuning knobs. Every field has the deployed default; the CLI can
/// override all of them.
#[derive(Debug, Clone)]
pub struct RelayConfig {
    /// Zero-member rooms older than this are removed by the sweeper.
    pub stale_room_timeout: Duration,
    /// How often the background sweep runs.
    pub sweep_interval: Duration,
    /// Connectivity-helper descriptors served at `/api/ice-servers`.
    pub ice_servers: Vec<IceServerConfig>,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            stale_room_timeout: Duration::from_secs(30 * 60),
            sweep_interval: Duration::from_secs(5 * 60),
            ice_servers: default_ice_servers(),
        }
    }
}
