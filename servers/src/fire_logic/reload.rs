use lib_firewatch::ingestors::{HotspotSource, SatelliteDataset};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{info, warn};

/// Reloads the satellite dataset wholesale every `every` until shutdown. A
/// failed reload keeps the current dataset.
pub async fn run(
    dataset: Arc<SatelliteDataset>,
    source: Arc<dyn HotspotSource>,
    every: Duration,
    mut shutdown: broadcast::Receiver<()>,
) {
    let mut reload_interval = interval_at(Instant::now() + every, every);
    reload_interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            _ = shutdown.recv() => {
                info!("Satellite reload service received shutdown signal.");
                break;
            }
            _ = reload_interval.tick() => {
                let dataset = Arc::clone(&dataset);
                let source = Arc::clone(&source);
                // CSV parsing is blocking file I/O.
                let result = tokio::task::spawn_blocking(move || dataset.reload(source.as_ref())).await;
                match result {
                    Ok(Ok(_)) => {}
                    Ok(Err(e)) => warn!("Satellite reload failed, keeping previous dataset: {}", e),
                    Err(e) => warn!("Satellite reload task aborted: {}", e),
                }
            }
        }
    }
}
