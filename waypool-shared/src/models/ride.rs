use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::geo::{GeoPoint, TimedPoint};

/// Lifecycle state of a live ride. Anything the wire sends that we do not
/// recognize lands on `Inactive` and is never matched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RideStatus {
    Active,
    Ongoing,
    Ended,
    #[serde(other)]
    Inactive,
}

impl RideStatus {
    pub fn is_live(self) -> bool {
        matches!(self, RideStatus::Active | RideStatus::Ongoing)
    }
}

/// A driver-announced ride session, held only in the in-memory registry
/// while the ride is live.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActiveRide {
    pub ride_id: Uuid,
    pub driver_id: Uuid,
    pub driver_name: String,
    pub driver_contact: Option<String>,
    pub pickup: Option<GeoPoint>,
    pub dropoff: Option<GeoPoint>,
    pub route: Vec<GeoPoint>,
    pub distance_meters: f64,
    pub duration_seconds: f64,
    pub status: RideStatus,
    pub started_at: DateTime<Utc>,
    /// First live report, set once and never overwritten.
    pub start_location: Option<TimedPoint>,
    pub last: Option<TimedPoint>,
    /// Append-only while the ride is live.
    pub trail: Vec<TimedPoint>,
    pub capacity: u32,
}

impl ActiveRide {
    /// Record a live position report: appends to the trail, updates `last`,
    /// and pins `start_location` on the first report.
    pub fn record_position(&mut self, point: TimedPoint) {
        if self.start_location.is_none() {
            self.start_location = Some(point);
        }
        self.last = Some(point);
        self.trail.push(point);
    }

    /// Most recent known location: live `last`, else announced pickup.
    pub fn latest_location(&self) -> Option<GeoPoint> {
        if let Some(last) = &self.last {
            return Some(last.point());
        }
        self.pickup.filter(|p| p.is_finite())
    }

    pub fn has_usable_location(&self) -> bool {
        self.latest_location().is_some()
    }
}

/// How a candidate qualified for a search result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchQuality {
    Direct,
    Nearby,
    Expanded,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RideMatch {
    pub quality: MatchQuality,
    pub ride: ActiveRide,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ride(status: RideStatus) -> ActiveRide {
        ActiveRide {
            ride_id: Uuid::new_v4(),
            driver_id: Uuid::new_v4(),
            driver_name: "driver".into(),
            driver_contact: None,
            pickup: Some(GeoPoint::new(12.905, 77.585)),
            dropoff: Some(GeoPoint::new(12.95, 77.60)),
            route: Vec::new(),
            distance_meters: 0.0,
            duration_seconds: 0.0,
            status,
            started_at: Utc::now(),
            start_location: None,
            last: None,
            trail: Vec::new(),
            capacity: 4,
        }
    }

    #[test]
    fn unknown_status_string_is_inactive() {
        let parsed: RideStatus = serde_json::from_str("\"paused\"").unwrap();
        assert_eq!(parsed, RideStatus::Inactive);
        assert!(!parsed.is_live());
    }

    #[test]
    fn start_location_is_set_once() {
        let mut r = ride(RideStatus::Active);
        let first = TimedPoint {
            lat: 12.91,
            lng: 77.58,
            heading: None,
            at: Utc::now(),
        };
        let second = TimedPoint {
            lat: 12.92,
            lng: 77.59,
            heading: Some(90.0),
            at: Utc::now(),
        };
        r.record_position(first);
        r.record_position(second);
        assert_eq!(r.start_location.unwrap().lat, 12.91);
        assert_eq!(r.last.unwrap().lat, 12.92);
        assert_eq!(r.trail.len(), 2);
    }

    #[test]
    fn latest_location_prefers_live_report_over_pickup() {
        let mut r = ride(RideStatus::Active);
        assert_eq!(r.latest_location().unwrap().lat, 12.905);
        r.record_position(TimedPoint {
            lat: 12.93,
            lng: 77.61,
            heading: None,
            at: Utc::now(),
        });
        assert_eq!(r.latest_location().unwrap().lat, 12.93);
    }
}
