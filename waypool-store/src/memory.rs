use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use uuid::Uuid;

use waypool_core::error::StoreError;
use waypool_core::models::{DriverProfile, RideRecord, SeatBooking};
use waypool_core::repository::{BookingRepository, DriverRepository, RideRepository};
use waypool_shared::{Occupancy, Passenger, PassengerStatus};

#[derive(Debug, Default)]
struct Ledger {
    capacity: u32,
    occupied: u32,
    passengers: Vec<Passenger>,
}

/// In-memory durable-store stand-in, used by tests and by local runs
/// without a database. The seat check and increment happen under one mutex
/// hold, giving the same no-overbooking guarantee as the SQL conditional
/// update.
#[derive(Default)]
pub struct InMemoryStore {
    rides: Mutex<HashMap<Uuid, RideRecord>>,
    drivers: Mutex<HashMap<Uuid, DriverProfile>>,
    ledgers: Mutex<HashMap<Uuid, Ledger>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_ride(&self, record: RideRecord) {
        self.rides.lock().unwrap().insert(record.id, record);
    }

    pub fn insert_driver(&self, profile: DriverProfile) {
        self.drivers.lock().unwrap().insert(profile.id, profile);
    }
}

#[async_trait]
impl RideRepository for InMemoryStore {
    async fn get_ride(&self, id: Uuid) -> Result<Option<RideRecord>, StoreError> {
        Ok(self.rides.lock().unwrap().get(&id).cloned())
    }
}

#[async_trait]
impl DriverRepository for InMemoryStore {
    async fn get_driver(&self, id: Uuid) -> Result<Option<DriverProfile>, StoreError> {
        Ok(self.drivers.lock().unwrap().get(&id).cloned())
    }
}

#[async_trait]
impl BookingRepository for InMemoryStore {
    async fn ensure_booking(&self, ride_id: Uuid, capacity: u32) -> Result<(), StoreError> {
        self.ledgers
            .lock()
            .unwrap()
            .entry(ride_id)
            .or_insert_with(|| Ledger {
                capacity,
                occupied: 0,
                passengers: Vec::new(),
            });
        Ok(())
    }

    async fn get_booking(&self, ride_id: Uuid) -> Result<Option<SeatBooking>, StoreError> {
        Ok(self.ledgers.lock().unwrap().get(&ride_id).map(|l| SeatBooking {
            ride_id,
            capacity: l.capacity,
            occupied: l.occupied,
            passengers: l.passengers.clone(),
        }))
    }

    async fn try_occupy(
        &self,
        ride_id: Uuid,
        seats: u32,
    ) -> Result<Option<Occupancy>, StoreError> {
        let mut ledgers = self.ledgers.lock().unwrap();
        let ledger = match ledgers.get_mut(&ride_id) {
            Some(l) => l,
            None => return Ok(None),
        };
        if ledger.occupied + seats > ledger.capacity {
            return Ok(None);
        }
        ledger.occupied += seats;
        Ok(Some(Occupancy {
            occupied: ledger.occupied,
            capacity: ledger.capacity,
        }))
    }

    async fn release(&self, ride_id: Uuid, seats: u32) -> Result<Occupancy, StoreError> {
        let mut ledgers = self.ledgers.lock().unwrap();
        let ledger = ledgers
            .get_mut(&ride_id)
            .ok_or(StoreError::NotFound(ride_id))?;
        ledger.occupied = ledger.occupied.saturating_sub(seats);
        Ok(Occupancy {
            occupied: ledger.occupied,
            capacity: ledger.capacity,
        })
    }

    async fn set_occupied(&self, ride_id: Uuid, value: u32) -> Result<Occupancy, StoreError> {
        let mut ledgers = self.ledgers.lock().unwrap();
        let ledger = ledgers
            .get_mut(&ride_id)
            .ok_or(StoreError::NotFound(ride_id))?;
        ledger.occupied = value.min(ledger.capacity);
        Ok(Occupancy {
            occupied: ledger.occupied,
            capacity: ledger.capacity,
        })
    }

    async fn add_passenger(
        &self,
        ride_id: Uuid,
        passenger: &Passenger,
    ) -> Result<(), StoreError> {
        let mut ledgers = self.ledgers.lock().unwrap();
        let ledger = ledgers
            .get_mut(&ride_id)
            .ok_or(StoreError::NotFound(ride_id))?;
        ledger.passengers.push(passenger.clone());
        Ok(())
    }

    async fn list_passengers(&self, ride_id: Uuid) -> Result<Vec<Passenger>, StoreError> {
        Ok(self
            .ledgers
            .lock()
            .unwrap()
            .get(&ride_id)
            .map(|l| l.passengers.clone())
            .unwrap_or_default())
    }

    async fn cancel_passenger(
        &self,
        ride_id: Uuid,
        rider_id: Uuid,
    ) -> Result<Option<Passenger>, StoreError> {
        let mut ledgers = self.ledgers.lock().unwrap();
        let ledger = ledgers
            .get_mut(&ride_id)
            .ok_or(StoreError::NotFound(ride_id))?;
        for p in ledger.passengers.iter_mut() {
            if p.rider_id == rider_id && p.status == PassengerStatus::Confirmed {
                p.status = PassengerStatus::Cancelled;
                return Ok(Some(p.clone()));
            }
        }
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn occupy_is_conditional() {
        let store = InMemoryStore::new();
        let ride = Uuid::new_v4();
        store.ensure_booking(ride, 2).await.unwrap();

        assert!(store.try_occupy(ride, 2).await.unwrap().is_some());
        assert!(store.try_occupy(ride, 1).await.unwrap().is_none());

        let booking = store.get_booking(ride).await.unwrap().unwrap();
        assert_eq!(booking.occupied, 2);
    }

    #[tokio::test]
    async fn ensure_booking_is_idempotent() {
        let store = InMemoryStore::new();
        let ride = Uuid::new_v4();
        store.ensure_booking(ride, 4).await.unwrap();
        store.try_occupy(ride, 3).await.unwrap().unwrap();
        // Re-seeding must not reset the ledger.
        store.ensure_booking(ride, 4).await.unwrap();
        assert_eq!(store.get_booking(ride).await.unwrap().unwrap().occupied, 3);
    }
}
