use axum::{
    extract::{Path, State},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use waypool_shared::{Occupancy, Passenger, PassengerStatus, ServerEvent, Topic};

use crate::error::{from_allocation, AppError};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
struct CreateBookingRequest {
    ride_id: Uuid,
    rider_id: Uuid,
    seat_count: u32,
    #[serde(default)]
    fare: f64,
}

#[derive(Debug, Deserialize)]
struct CancelBookingRequest {
    ride_id: Uuid,
    rider_id: Uuid,
}

#[derive(Debug, Deserialize)]
struct SetOccupancyRequest {
    occupied: u32,
}

#[derive(Debug, Serialize)]
struct OccupancyResponse {
    ride_id: Uuid,
    occupied: u32,
    capacity: u32,
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/v1/bookings", post(create_booking))
        .route("/v1/bookings/cancel", post(cancel_booking))
        .route(
            "/v1/rides/{id}/occupancy",
            get(get_occupancy).post(set_occupancy),
        )
}

fn broadcast_status(state: &AppState, ride_id: Uuid, occupancy: Occupancy, driver_id: Option<Uuid>) {
    let event = ServerEvent::RideStatusUpdated {
        ride_id,
        occupied: occupancy.occupied,
        capacity: occupancy.capacity,
        driver_id,
    };
    state.dispatcher.publish(Topic::Ride(ride_id), event.clone());
    if let Some(driver_id) = driver_id {
        state.dispatcher.publish(Topic::Driver(driver_id), event);
    }
}

/// Atomic seat booking over the request/response channel. The conflict
/// case reports the remaining-seat count and changes nothing.
async fn create_booking(
    State(state): State<AppState>,
    Json(req): Json<CreateBookingRequest>,
) -> Result<Json<OccupancyResponse>, AppError> {
    let occupancy = state
        .allocator
        .book(req.ride_id, req.seat_count)
        .await
        .map_err(from_allocation)?;

    let passenger = Passenger {
        rider_id: req.rider_id,
        seat_count: req.seat_count,
        fare: req.fare,
        status: PassengerStatus::Confirmed,
    };
    state
        .allocator
        .record_passenger(req.ride_id, &passenger)
        .await
        .map_err(from_allocation)?;

    info!(ride_id = %req.ride_id, rider_id = %req.rider_id, seats = req.seat_count, "booking confirmed");

    let driver_id = state.registry.get(req.ride_id).await.map(|r| r.driver_id);
    broadcast_status(&state, req.ride_id, occupancy, driver_id);

    Ok(Json(OccupancyResponse {
        ride_id: req.ride_id,
        occupied: occupancy.occupied,
        capacity: occupancy.capacity,
    }))
}

async fn cancel_booking(
    State(state): State<AppState>,
    Json(req): Json<CancelBookingRequest>,
) -> Result<Json<OccupancyResponse>, AppError> {
    let (_, occupancy) = state
        .allocator
        .cancel(req.ride_id, req.rider_id)
        .await
        .map_err(from_allocation)?;

    state.dispatcher.publish(
        Topic::Ride(req.ride_id),
        ServerEvent::RideCancelled {
            ride_id: req.ride_id,
            rider_id: Some(req.rider_id),
        },
    );
    let driver_id = state.registry.get(req.ride_id).await.map(|r| r.driver_id);
    broadcast_status(&state, req.ride_id, occupancy, driver_id);

    Ok(Json(OccupancyResponse {
        ride_id: req.ride_id,
        occupied: occupancy.occupied,
        capacity: occupancy.capacity,
    }))
}

async fn get_occupancy(
    State(state): State<AppState>,
    Path(ride_id): Path<Uuid>,
) -> Result<Json<OccupancyResponse>, AppError> {
    let occupancy = state
        .allocator
        .occupancy(ride_id)
        .await
        .map_err(from_allocation)?;
    Ok(Json(OccupancyResponse {
        ride_id,
        occupied: occupancy.occupied,
        capacity: occupancy.capacity,
    }))
}

/// Driver-reported correction: the value is clamped into `[0, capacity]`.
async fn set_occupancy(
    State(state): State<AppState>,
    Path(ride_id): Path<Uuid>,
    Json(req): Json<SetOccupancyRequest>,
) -> Result<Json<OccupancyResponse>, AppError> {
    let occupancy = state
        .allocator
        .set_occupied(ride_id, req.occupied)
        .await
        .map_err(from_allocation)?;

    let driver_id = state.registry.get(ride_id).await.map(|r| r.driver_id);
    broadcast_status(&state, ride_id, occupancy, driver_id);

    Ok(Json(OccupancyResponse {
        ride_id,
        occupied: occupancy.occupied,
        capacity: occupancy.capacity,
    }))
}
