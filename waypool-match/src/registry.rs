use std::collections::HashMap;

use chrono::{DateTime, Duration, Utc};
use tokio::sync::RwLock;
use tracing::{debug, info};
use uuid::Uuid;

use waypool_core::CoreError;
use waypool_shared::{ActiveRide, TimedPoint};

/// Process-lifetime registry of currently live rides.
///
/// Owned by the application state and shared behind an `Arc`; every
/// operation takes the lock for the duration of one short map access, so
/// reads and writes from many connections interleave safely.
pub struct RideRegistry {
    rides: RwLock<HashMap<Uuid, ActiveRide>>,
}

impl RideRegistry {
    pub fn new() -> Self {
        Self {
            rides: RwLock::new(HashMap::new()),
        }
    }

    /// Create or replace the entry for `ride.ride_id`.
    pub async fn upsert(&self, ride: ActiveRide) {
        let mut rides = self.rides.write().await;
        debug!(ride_id = %ride.ride_id, status = ?ride.status, "registry upsert");
        rides.insert(ride.ride_id, ride);
    }

    pub async fn get(&self, ride_id: Uuid) -> Option<ActiveRide> {
        self.rides.read().await.get(&ride_id).cloned()
    }

    /// Apply a live position report and return the updated entry.
    pub async fn apply_location(
        &self,
        ride_id: Uuid,
        point: TimedPoint,
    ) -> Result<ActiveRide, CoreError> {
        let mut rides = self.rides.write().await;
        let ride = rides
            .get_mut(&ride_id)
            .ok_or_else(|| CoreError::InvalidInput(format!("unknown ride {}", ride_id)))?;
        ride.record_position(point);
        Ok(ride.clone())
    }

    /// Most recent known location: live report, else announced pickup.
    pub async fn get_location(&self, ride_id: Uuid) -> Option<waypool_shared::GeoPoint> {
        self.rides
            .read()
            .await
            .get(&ride_id)
            .and_then(|r| r.latest_location())
    }

    pub async fn remove(&self, ride_id: Uuid) -> Option<ActiveRide> {
        self.rides.write().await.remove(&ride_id)
    }

    /// Owned snapshot of all live entries, ordered by creation time so
    /// match results keep a stable insertion order.
    pub async fn snapshot_active(&self) -> Vec<ActiveRide> {
        let rides = self.rides.read().await;
        let mut live: Vec<ActiveRide> = rides
            .values()
            .filter(|r| r.status.is_live())
            .cloned()
            .collect();
        live.sort_by_key(|r| (r.started_at, r.ride_id));
        live
    }

    pub async fn len(&self) -> usize {
        self.rides.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.rides.read().await.is_empty()
    }

    /// Evict entries that never produced a live report and carry no usable
    /// pickup location once they outlive `stale_after`. Returns the number
    /// of evicted rides.
    pub async fn sweep_stale(&self, now: DateTime<Utc>, stale_after: Duration) -> usize {
        let mut rides = self.rides.write().await;
        let before = rides.len();
        rides.retain(|_, ride| {
            let abandoned = ride.last.is_none()
                && ride.pickup.map(|p| p.is_finite()) != Some(true)
                && now - ride.started_at > stale_after;
            !abandoned
        });
        let evicted = before - rides.len();
        if evicted > 0 {
            info!(evicted, "swept stale ride announcements");
        }
        evicted
    }

    /// Drain all entries. Called once at shutdown.
    pub async fn clear(&self) {
        self.rides.write().await.clear();
    }
}

impl Default for RideRegistry {
    fn default() -> Self {
        Self::new()
    }
}
