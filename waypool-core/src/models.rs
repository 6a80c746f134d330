use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use waypool_shared::Passenger;

/// Durable ride record. The live registry entry is derived from this plus
/// the driver's announcement; this record stays behind when the ride ends.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RideRecord {
    pub id: Uuid,
    pub driver_id: Uuid,
    /// Ride-level seat override; zero/absent defers to the driver's vehicle.
    pub capacity: Option<u32>,
    pub status: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DriverProfile {
    pub id: Uuid,
    pub name: String,
    pub contact: Option<String>,
    pub vehicle_capacity: Option<u32>,
}

/// The authoritative seat ledger for one ride.
/// Invariant: 0 <= occupied <= capacity, enforced by the store's
/// conditional update, never by a read-then-write pair.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeatBooking {
    pub ride_id: Uuid,
    pub capacity: u32,
    pub occupied: u32,
    pub passengers: Vec<Passenger>,
}
