use crate::relay::RelayService;
use tokio::task::JoinHandle;
use tracing::info;

/// Spawns the periodic stale-room sweep. Runs on a fixed interval
/// independent of request traffic until the handle is aborted.
pub fn spawn_sweeper(relay: RelayService) -> JoinHandle<()> {
    let interval = relay.config().sweep_interval;
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        // the first tick completes immediately
        ticker.tick().await;
        loop {
            ticker.tick().await;
            let removed = relay.sweep_stale_rooms();
            if removed > 0 {
                info!("Sweeper removed {} stale room(s)", removed);
            }
        }
    })
}
