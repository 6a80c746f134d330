use serde::Deserialize;

use waypool_core::models::{DriverProfile, RideRecord};

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct BookingConfig {
    /// Seats assumed when neither the ride nor the driver declares any.
    pub default_capacity: u32,
}

impl Default for BookingConfig {
    fn default() -> Self {
        Self { default_capacity: 4 }
    }
}

/// Resolve the authoritative seat count for a ride: a positive ride-level
/// override wins, then the driver's declared vehicle capacity, then the
/// configured default.
pub fn resolve_capacity(
    record: Option<&RideRecord>,
    driver: Option<&DriverProfile>,
    default_capacity: u32,
) -> u32 {
    if let Some(c) = record.and_then(|r| r.capacity) {
        if c > 0 {
            return c;
        }
    }
    if let Some(c) = driver.and_then(|d| d.vehicle_capacity) {
        if c > 0 {
            return c;
        }
    }
    default_capacity
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use uuid::Uuid;

    fn record(capacity: Option<u32>) -> RideRecord {
        RideRecord {
            id: Uuid::new_v4(),
            driver_id: Uuid::new_v4(),
            capacity,
            status: "active".into(),
            created_at: Utc::now(),
        }
    }

    fn driver(vehicle_capacity: Option<u32>) -> DriverProfile {
        DriverProfile {
            id: Uuid::new_v4(),
            name: "d".into(),
            contact: None,
            vehicle_capacity,
        }
    }

    #[test]
    fn ride_override_wins() {
        let r = record(Some(6));
        let d = driver(Some(4));
        assert_eq!(resolve_capacity(Some(&r), Some(&d), 4), 6);
    }

    #[test]
    fn zero_override_defers_to_driver_vehicle() {
        let r = record(Some(0));
        let d = driver(Some(7));
        assert_eq!(resolve_capacity(Some(&r), Some(&d), 4), 7);
    }

    #[test]
    fn falls_back_to_default() {
        let r = record(None);
        assert_eq!(resolve_capacity(Some(&r), None, 4), 4);
        assert_eq!(resolve_capacity(None, None, 4), 4);
    }
}
