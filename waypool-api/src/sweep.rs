use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;

use waypool_match::{MatchConfig, RideRegistry};

/// Periodic eviction of abandoned ride announcements, so they cannot
/// pollute match results indefinitely. Runs for the life of the process.
pub async fn run_sweeper(registry: Arc<RideRegistry>, config: MatchConfig) {
    let stale_after = chrono::Duration::seconds(config.stale_after_seconds);
    let mut ticker = tokio::time::interval(Duration::from_secs(config.sweep_interval_seconds));
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

    loop {
        ticker.tick().await;
        registry.sweep_stale(Utc::now(), stale_after).await;
    }
}
