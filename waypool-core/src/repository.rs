use async_trait::async_trait;
use uuid::Uuid;

use crate::error::StoreError;
use crate::models::{DriverProfile, RideRecord, SeatBooking};
use waypool_shared::{Occupancy, Passenger};

/// Repository trait for durable ride records.
#[async_trait]
pub trait RideRepository: Send + Sync {
    async fn get_ride(&self, id: Uuid) -> Result<Option<RideRecord>, StoreError>;
}

/// Repository trait for driver profiles.
#[async_trait]
pub trait DriverRepository: Send + Sync {
    async fn get_driver(&self, id: Uuid) -> Result<Option<DriverProfile>, StoreError>;
}

/// Repository trait for the seat ledger.
///
/// `try_occupy` is the single write path that can grow `occupied`: one
/// conditional compare-and-update. `Ok(None)` means the condition
/// `occupied + seats <= capacity` did not hold (exhausted, or a concurrent
/// booking won the race) and nothing changed.
#[async_trait]
pub trait BookingRepository: Send + Sync {
    /// Seed the ledger row for a ride if it does not exist yet.
    async fn ensure_booking(&self, ride_id: Uuid, capacity: u32) -> Result<(), StoreError>;

    async fn get_booking(&self, ride_id: Uuid) -> Result<Option<SeatBooking>, StoreError>;

    async fn try_occupy(
        &self,
        ride_id: Uuid,
        seats: u32,
    ) -> Result<Option<Occupancy>, StoreError>;

    /// Decrement `occupied` by `seats`, clamped at zero.
    async fn release(&self, ride_id: Uuid, seats: u32) -> Result<Occupancy, StoreError>;

    /// Driver-reported correction; the value is clamped into
    /// `[0, capacity]` rather than rejected.
    async fn set_occupied(&self, ride_id: Uuid, value: u32) -> Result<Occupancy, StoreError>;

    async fn add_passenger(
        &self,
        ride_id: Uuid,
        passenger: &Passenger,
    ) -> Result<(), StoreError>;

    async fn list_passengers(&self, ride_id: Uuid) -> Result<Vec<Passenger>, StoreError>;

    /// Mark the rider's confirmed booking cancelled and return it, if any.
    async fn cancel_passenger(
        &self,
        ride_id: Uuid,
        rider_id: Uuid,
    ) -> Result<Option<Passenger>, StoreError>;
}
