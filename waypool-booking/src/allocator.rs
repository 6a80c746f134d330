use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, info};
use uuid::Uuid;

use waypool_core::error::StoreError;
use waypool_core::repository::BookingRepository;
use waypool_shared::{Occupancy, Passenger};

#[derive(Debug, Error)]
pub enum AllocationError {
    #[error("not enough seats: requested {requested}, available {available}")]
    CapacityExhausted {
        requested: u32,
        available: u32,
        occupied: u32,
        capacity: u32,
    },

    #[error("unknown ride: {0}")]
    UnknownRide(Uuid),

    #[error("invalid booking request: {0}")]
    InvalidRequest(String),

    #[error(transparent)]
    Store(StoreError),
}

fn map_store(err: StoreError) -> AllocationError {
    match err {
        StoreError::NotFound(id) => AllocationError::UnknownRide(id),
        other => AllocationError::Store(other),
    }
}

/// Enforces the seat-count invariant for every ride: `occupied` never goes
/// negative and never exceeds `capacity`, even with many simultaneous
/// bookers. All growth goes through the store's single conditional update;
/// there is no separate availability check to race against.
pub struct CapacityAllocator {
    bookings: Arc<dyn BookingRepository>,
}

impl CapacityAllocator {
    pub fn new(bookings: Arc<dyn BookingRepository>) -> Self {
        Self { bookings }
    }

    /// Seed the seat ledger for a newly announced ride.
    pub async fn ensure(&self, ride_id: Uuid, capacity: u32) -> Result<(), AllocationError> {
        self.bookings
            .ensure_booking(ride_id, capacity)
            .await
            .map_err(map_store)
    }

    /// Atomically claim `requested` seats. On a lost race or exhausted ride
    /// the attempt fails with the remaining-seat count and no state change.
    pub async fn book(
        &self,
        ride_id: Uuid,
        requested: u32,
    ) -> Result<Occupancy, AllocationError> {
        if requested == 0 {
            return Err(AllocationError::InvalidRequest(
                "seat count must be positive".into(),
            ));
        }

        match self
            .bookings
            .try_occupy(ride_id, requested)
            .await
            .map_err(map_store)?
        {
            Some(occupancy) => {
                debug!(%ride_id, requested, occupied = occupancy.occupied, "seats granted");
                Ok(occupancy)
            }
            None => {
                let booking = self
                    .bookings
                    .get_booking(ride_id)
                    .await
                    .map_err(map_store)?
                    .ok_or(AllocationError::UnknownRide(ride_id))?;
                Err(AllocationError::CapacityExhausted {
                    requested,
                    available: booking.capacity.saturating_sub(booking.occupied),
                    occupied: booking.occupied,
                    capacity: booking.capacity,
                })
            }
        }
    }

    /// Cancel the rider's confirmed booking: marks it cancelled and
    /// releases its seats, clamped at zero.
    pub async fn cancel(
        &self,
        ride_id: Uuid,
        rider_id: Uuid,
    ) -> Result<(Passenger, Occupancy), AllocationError> {
        let passenger = self
            .bookings
            .cancel_passenger(ride_id, rider_id)
            .await
            .map_err(map_store)?
            .ok_or_else(|| {
                AllocationError::InvalidRequest(format!(
                    "no confirmed booking for rider {} on ride {}",
                    rider_id, ride_id
                ))
            })?;
        let occupancy = self
            .bookings
            .release(ride_id, passenger.seat_count)
            .await
            .map_err(map_store)?;
        info!(%ride_id, %rider_id, seats = passenger.seat_count, "booking cancelled");
        Ok((passenger, occupancy))
    }

    /// Driver-reported occupancy correction; the value is clamped into
    /// `[0, capacity]`, never rejected.
    pub async fn set_occupied(
        &self,
        ride_id: Uuid,
        value: u32,
    ) -> Result<Occupancy, AllocationError> {
        self.bookings
            .set_occupied(ride_id, value)
            .await
            .map_err(map_store)
    }

    pub async fn record_passenger(
        &self,
        ride_id: Uuid,
        passenger: &Passenger,
    ) -> Result<(), AllocationError> {
        self.bookings
            .add_passenger(ride_id, passenger)
            .await
            .map_err(map_store)
    }

    pub async fn passengers(&self, ride_id: Uuid) -> Result<Vec<Passenger>, AllocationError> {
        self.bookings.list_passengers(ride_id).await.map_err(map_store)
    }

    pub async fn occupancy(&self, ride_id: Uuid) -> Result<Occupancy, AllocationError> {
        let booking = self
            .bookings
            .get_booking(ride_id)
            .await
            .map_err(map_store)?
            .ok_or(AllocationError::UnknownRide(ride_id))?;
        Ok(Occupancy {
            occupied: booking.occupied,
            capacity: booking.capacity,
        })
    }
}
