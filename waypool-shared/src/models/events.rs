use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::geo::GeoPoint;
use crate::models::booking::Passenger;
use crate::models::ride::{ActiveRide, RideMatch};

/// A named broadcast scope. Every ride and every driver gets a topic;
/// riders are addressed individually.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Topic {
    Ride(Uuid),
    Driver(Uuid),
    Rider(Uuid),
}

impl fmt::Display for Topic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Topic::Ride(id) => write!(f, "ride:{}", id),
            Topic::Driver(id) => write!(f, "driver:{}", id),
            Topic::Rider(id) => write!(f, "rider:{}", id),
        }
    }
}

/// Details of an accepted booking, echoed back to the parties.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookingDetails {
    pub rider_id: Uuid,
    pub pickup: Option<GeoPoint>,
    pub destination: Option<GeoPoint>,
    pub seat_count: u32,
    pub fare: f64,
}

/// Every event the engine can emit to a client. Delivery is best-effort and
/// at-most-once per subscriber; late subscribers re-derive state from
/// `ride:info` instead of relying on replay.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "event", content = "data")]
pub enum ServerEvent {
    #[serde(rename = "ride-status-updated")]
    RideStatusUpdated {
        ride_id: Uuid,
        occupied: u32,
        capacity: u32,
        #[serde(skip_serializing_if = "Option::is_none")]
        driver_id: Option<Uuid>,
    },
    #[serde(rename = "ride:accepted")]
    RideAccepted {
        ride_id: Uuid,
        driver_id: Uuid,
        booking: BookingDetails,
        passengers: Vec<Passenger>,
    },
    #[serde(rename = "ride:booking-confirmed")]
    BookingConfirmed {
        ride_id: Uuid,
        occupied: u32,
        capacity: u32,
    },
    #[serde(rename = "ride:booking-error")]
    BookingError {
        ride_id: Uuid,
        occupied: u32,
        capacity: u32,
        reason: String,
    },
    #[serde(rename = "ride:info")]
    RideInfo { ride: ActiveRide },
    #[serde(rename = "ride:location")]
    RideLocation {
        ride_id: Uuid,
        lat: f64,
        lng: f64,
        heading: Option<f32>,
        timestamp: DateTime<Utc>,
    },
    #[serde(rename = "ride:eta")]
    RideEta {
        ride_id: Uuid,
        duration_seconds: f64,
        distance_meters: f64,
        remaining_steps: Vec<GeoPoint>,
    },
    #[serde(rename = "ride:cancelled")]
    RideCancelled {
        ride_id: Uuid,
        #[serde(skip_serializing_if = "Option::is_none")]
        rider_id: Option<Uuid>,
    },
    #[serde(rename = "ride:ended")]
    RideEnded { ride_id: Uuid },
    #[serde(rename = "search:results")]
    SearchResults { matches: Vec<RideMatch> },
    #[serde(rename = "search:none-yet")]
    SearchNoneYet,
    #[serde(rename = "error")]
    Error { message: String },
}
