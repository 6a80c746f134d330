use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PassengerStatus {
    Confirmed,
    Cancelled,
}

/// One rider's confirmed allocation on a ride.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Passenger {
    pub rider_id: Uuid,
    pub seat_count: u32,
    pub fare: f64,
    pub status: PassengerStatus,
}

/// Occupancy snapshot returned by every allocator operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Occupancy {
    pub occupied: u32,
    pub capacity: u32,
}

impl Occupancy {
    pub fn available(&self) -> u32 {
        self.capacity.saturating_sub(self.occupied)
    }
}
