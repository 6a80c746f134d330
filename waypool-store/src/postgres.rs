use async_trait::async_trait;
use sqlx::{PgPool, Row};
use tracing::debug;
use uuid::Uuid;

use waypool_core::error::StoreError;
use waypool_core::models::{DriverProfile, RideRecord, SeatBooking};
use waypool_core::repository::{BookingRepository, DriverRepository, RideRepository};
use waypool_shared::{Occupancy, Passenger, PassengerStatus};

fn backend(err: sqlx::Error) -> StoreError {
    StoreError::Backend(err.to_string())
}

fn status_from_str(s: &str) -> PassengerStatus {
    match s {
        "confirmed" => PassengerStatus::Confirmed,
        _ => PassengerStatus::Cancelled,
    }
}

fn status_to_str(s: PassengerStatus) -> &'static str {
    match s {
        PassengerStatus::Confirmed => "confirmed",
        PassengerStatus::Cancelled => "cancelled",
    }
}

pub struct PostgresRideRepository {
    pub pool: PgPool,
}

#[async_trait]
impl RideRepository for PostgresRideRepository {
    async fn get_ride(&self, id: Uuid) -> Result<Option<RideRecord>, StoreError> {
        let row = sqlx::query(
            "SELECT id, driver_id, capacity, status, created_at FROM rides WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(backend)?;

        row.map(|r| {
            Ok(RideRecord {
                id: r.try_get("id").map_err(backend)?,
                driver_id: r.try_get("driver_id").map_err(backend)?,
                capacity: r
                    .try_get::<Option<i32>, _>("capacity")
                    .map_err(backend)?
                    .map(|c| c.max(0) as u32),
                status: r.try_get("status").map_err(backend)?,
                created_at: r.try_get("created_at").map_err(backend)?,
            })
        })
        .transpose()
    }
}

pub struct PostgresDriverRepository {
    pub pool: PgPool,
}

#[async_trait]
impl DriverRepository for PostgresDriverRepository {
    async fn get_driver(&self, id: Uuid) -> Result<Option<DriverProfile>, StoreError> {
        let row = sqlx::query(
            "SELECT id, name, contact, vehicle_capacity FROM drivers WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(backend)?;

        row.map(|r| {
            Ok(DriverProfile {
                id: r.try_get("id").map_err(backend)?,
                name: r.try_get("name").map_err(backend)?,
                contact: r.try_get("contact").map_err(backend)?,
                vehicle_capacity: r
                    .try_get::<Option<i32>, _>("vehicle_capacity")
                    .map_err(backend)?
                    .map(|c| c.max(0) as u32),
            })
        })
        .transpose()
    }
}

/// Seat ledger over Postgres. The booking increment is a single
/// conditional UPDATE so the availability check and the write cannot be
/// separated by a concurrent booker.
pub struct PostgresBookingRepository {
    pub pool: PgPool,
}

impl PostgresBookingRepository {
    fn occupancy_from(row: &sqlx::postgres::PgRow) -> Result<Occupancy, StoreError> {
        let occupied: i32 = row.try_get("occupied").map_err(backend)?;
        let capacity: i32 = row.try_get("capacity").map_err(backend)?;
        Ok(Occupancy {
            occupied: occupied.max(0) as u32,
            capacity: capacity.max(0) as u32,
        })
    }
}

#[async_trait]
impl BookingRepository for PostgresBookingRepository {
    async fn ensure_booking(&self, ride_id: Uuid, capacity: u32) -> Result<(), StoreError> {
        sqlx::query(
            "INSERT INTO seat_bookings (ride_id, capacity, occupied) VALUES ($1, $2, 0)
             ON CONFLICT (ride_id) DO NOTHING",
        )
        .bind(ride_id)
        .bind(capacity as i32)
        .execute(&self.pool)
        .await
        .map_err(backend)?;
        Ok(())
    }

    async fn get_booking(&self, ride_id: Uuid) -> Result<Option<SeatBooking>, StoreError> {
        let row = sqlx::query("SELECT occupied, capacity FROM seat_bookings WHERE ride_id = $1")
            .bind(ride_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(backend)?;

        let occupancy = match row {
            Some(r) => Self::occupancy_from(&r)?,
            None => return Ok(None),
        };

        let passengers = self.list_passengers(ride_id).await?;
        Ok(Some(SeatBooking {
            ride_id,
            capacity: occupancy.capacity,
            occupied: occupancy.occupied,
            passengers,
        }))
    }

    async fn try_occupy(
        &self,
        ride_id: Uuid,
        seats: u32,
    ) -> Result<Option<Occupancy>, StoreError> {
        // Conditional compare-and-update: no row is touched unless the
        // post-increment occupancy still fits the capacity.
        let row = sqlx::query(
            "UPDATE seat_bookings
             SET occupied = occupied + $2
             WHERE ride_id = $1 AND occupied + $2 <= capacity
             RETURNING occupied, capacity",
        )
        .bind(ride_id)
        .bind(seats as i32)
        .fetch_optional(&self.pool)
        .await
        .map_err(backend)?;

        if row.is_none() {
            debug!(%ride_id, seats, "conditional occupancy update rejected");
        }
        row.map(|r| Self::occupancy_from(&r)).transpose()
    }

    async fn release(&self, ride_id: Uuid, seats: u32) -> Result<Occupancy, StoreError> {
        let row = sqlx::query(
            "UPDATE seat_bookings
             SET occupied = GREATEST(occupied - $2, 0)
             WHERE ride_id = $1
             RETURNING occupied, capacity",
        )
        .bind(ride_id)
        .bind(seats as i32)
        .fetch_optional(&self.pool)
        .await
        .map_err(backend)?
        .ok_or(StoreError::NotFound(ride_id))?;

        Self::occupancy_from(&row)
    }

    async fn set_occupied(&self, ride_id: Uuid, value: u32) -> Result<Occupancy, StoreError> {
        let row = sqlx::query(
            "UPDATE seat_bookings
             SET occupied = LEAST(GREATEST($2, 0), capacity)
             WHERE ride_id = $1
             RETURNING occupied, capacity",
        )
        .bind(ride_id)
        .bind(value as i32)
        .fetch_optional(&self.pool)
        .await
        .map_err(backend)?
        .ok_or(StoreError::NotFound(ride_id))?;

        Self::occupancy_from(&row)
    }

    async fn add_passenger(
        &self,
        ride_id: Uuid,
        passenger: &Passenger,
    ) -> Result<(), StoreError> {
        sqlx::query(
            "INSERT INTO ride_passengers (ride_id, rider_id, seat_count, fare, status)
             VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(ride_id)
        .bind(passenger.rider_id)
        .bind(passenger.seat_count as i32)
        .bind(passenger.fare)
        .bind(status_to_str(passenger.status))
        .execute(&self.pool)
        .await
        .map_err(backend)?;
        Ok(())
    }

    async fn list_passengers(&self, ride_id: Uuid) -> Result<Vec<Passenger>, StoreError> {
        let rows = sqlx::query(
            "SELECT rider_id, seat_count, fare, status
             FROM ride_passengers WHERE ride_id = $1 ORDER BY id",
        )
        .bind(ride_id)
        .fetch_all(&self.pool)
        .await
        .map_err(backend)?;

        rows.into_iter()
            .map(|r| {
                Ok(Passenger {
                    rider_id: r.try_get("rider_id").map_err(backend)?,
                    seat_count: r.try_get::<i32, _>("seat_count").map_err(backend)?.max(0)
                        as u32,
                    fare: r.try_get("fare").map_err(backend)?,
                    status: status_from_str(
                        r.try_get::<String, _>("status").map_err(backend)?.as_str(),
                    ),
                })
            })
            .collect()
    }

    async fn cancel_passenger(
        &self,
        ride_id: Uuid,
        rider_id: Uuid,
    ) -> Result<Option<Passenger>, StoreError> {
        let row = sqlx::query(
            "UPDATE ride_passengers
             SET status = 'cancelled'
             WHERE id = (
                 SELECT id FROM ride_passengers
                 WHERE ride_id = $1 AND rider_id = $2 AND status = 'confirmed'
                 ORDER BY id LIMIT 1
             )
             RETURNING rider_id, seat_count, fare",
        )
        .bind(ride_id)
        .bind(rider_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(backend)?;

        row.map(|r| {
            Ok(Passenger {
                rider_id: r.try_get("rider_id").map_err(backend)?,
                seat_count: r.try_get::<i32, _>("seat_count").map_err(backend)?.max(0) as u32,
                fare: r.try_get("fare").map_err(backend)?,
                status: PassengerStatus::Cancelled,
            })
        })
        .transpose()
    }
}
