use chrono::{DateTime, Utc};
use serde::Deserialize;
use uuid::Uuid;

use waypool_shared::{GeoPoint, RideStatus};

/// Every command a client can send over the realtime channel. One tagged
/// enum instead of ad-hoc per-event callbacks, so the supported events and
/// their payload contracts are enumerable and testable without a socket.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "event", content = "data")]
pub enum ClientCommand {
    #[serde(rename = "ride:start")]
    RideStart(RideStartPayload),
    #[serde(rename = "location:update")]
    LocationUpdate(LocationUpdatePayload),
    #[serde(rename = "ride:end")]
    RideEnd { ride_id: Uuid },
    #[serde(rename = "user:route:search")]
    RouteSearch(RouteSearchPayload),
    #[serde(rename = "ride:accept")]
    RideAccept(RideAcceptPayload),
    #[serde(rename = "ride:watch")]
    RideWatch { ride_id: Uuid },
}

#[derive(Debug, Clone, Deserialize)]
pub struct RideStartPayload {
    pub ride_id: Uuid,
    pub driver_id: Uuid,
    pub driver_name: String,
    #[serde(default)]
    pub driver_contact: Option<String>,
    #[serde(default)]
    pub pickup: Option<GeoPoint>,
    #[serde(default)]
    pub destination: Option<GeoPoint>,
    #[serde(default)]
    pub route: Vec<GeoPoint>,
    #[serde(default)]
    pub distance: Option<f64>,
    #[serde(default)]
    pub duration: Option<f64>,
    #[serde(default = "default_status")]
    pub status: RideStatus,
    #[serde(default)]
    pub start_time: Option<DateTime<Utc>>,
}

fn default_status() -> RideStatus {
    RideStatus::Active
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct LocationUpdatePayload {
    pub ride_id: Uuid,
    pub lat: f64,
    pub lng: f64,
    #[serde(default)]
    pub heading: Option<f32>,
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct RouteSearchPayload {
    pub from_lat: f64,
    pub from_lng: f64,
    pub to_lat: f64,
    pub to_lng: f64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RideAcceptPayload {
    pub ride_id: Uuid,
    pub driver_id: Uuid,
    pub rider_id: Uuid,
    #[serde(default)]
    pub pickup: Option<GeoPoint>,
    #[serde(default)]
    pub destination: Option<GeoPoint>,
    pub seat_count: u32,
    #[serde(default)]
    pub fare: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ride_start_parses_with_minimal_payload() {
        let raw = r#"{
            "event": "ride:start",
            "data": {
                "ride_id": "7f4df4a4-8a00-4b92-bd6f-9c8f9a14c9a1",
                "driver_id": "1f4df4a4-8a00-4b92-bd6f-9c8f9a14c9a2",
                "driver_name": "Asha",
                "pickup": {"lat": 12.905, "lng": 77.585}
            }
        }"#;
        let cmd: ClientCommand = serde_json::from_str(raw).unwrap();
        match cmd {
            ClientCommand::RideStart(p) => {
                assert_eq!(p.driver_name, "Asha");
                assert_eq!(p.status, RideStatus::Active);
                assert!(p.route.is_empty());
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn location_update_parses() {
        let raw = r#"{
            "event": "location:update",
            "data": {
                "ride_id": "7f4df4a4-8a00-4b92-bd6f-9c8f9a14c9a1",
                "lat": 12.91, "lng": 77.59, "heading": 180.0
            }
        }"#;
        let cmd: ClientCommand = serde_json::from_str(raw).unwrap();
        assert!(matches!(cmd, ClientCommand::LocationUpdate(p) if p.heading == Some(180.0)));
    }

    #[test]
    fn unknown_event_name_is_rejected() {
        let raw = r#"{"event": "ride:teleport", "data": {}}"#;
        assert!(serde_json::from_str::<ClientCommand>(raw).is_err());
    }
}
