use std::collections::HashSet;
use std::sync::{Arc, RwLock};
use std::time::Duration;

use chrono::Utc;
use tokio::sync::mpsc;
use tracing::{debug, warn};

use waypool_booking::{resolve_capacity, AllocationError};
use waypool_core::error::CoreError;
use waypool_core::repository::{DriverRepository, RideRepository};
use waypool_routing::{plan_or_fallback, plan_with_timeout};
use waypool_shared::{
    ActiveRide, BookingDetails, GeoPoint, Passenger, PassengerStatus, ServerEvent, TimedPoint,
    Topic,
};

use crate::protocol::{
    ClientCommand, LocationUpdatePayload, RideAcceptPayload, RideStartPayload,
    RouteSearchPayload,
};
use crate::sessions::{outcome_event, ConnId};
use crate::state::AppState;

/// Transport-independent view of one realtime connection: its outbound
/// queue and the topics it has joined.
pub struct ConnState {
    pub id: ConnId,
    pub topics: Arc<RwLock<HashSet<Topic>>>,
    pub tx: mpsc::UnboundedSender<ServerEvent>,
}

impl ConnState {
    pub fn new(id: ConnId, tx: mpsc::UnboundedSender<ServerEvent>) -> Self {
        Self {
            id,
            topics: Arc::new(RwLock::new(HashSet::new())),
            tx,
        }
    }

    pub fn subscribe(&self, topic: Topic) {
        self.topics.write().unwrap().insert(topic);
    }

    pub fn is_subscribed(&self, topic: &Topic) -> bool {
        self.topics.read().unwrap().contains(topic)
    }

    /// Direct delivery to this connection only. A closed queue means the
    /// client is gone; nothing to do.
    pub fn send(&self, event: ServerEvent) {
        let _ = self.tx.send(event);
    }
}

/// Parse and dispatch one inbound frame. Malformed input is answered with
/// an error event on the triggering connection and nothing else.
pub async fn dispatch_text(state: &AppState, conn: &ConnState, text: &str) {
    match serde_json::from_str::<ClientCommand>(text) {
        Ok(cmd) => handle_command(state, conn, cmd).await,
        Err(err) => {
            debug!(error = %err, "unparseable client frame");
            conn.send(ServerEvent::Error {
                message: format!("unrecognized command: {}", err),
            });
        }
    }
}

pub async fn handle_command(state: &AppState, conn: &ConnState, cmd: ClientCommand) {
    match cmd {
        ClientCommand::RideStart(p) => ride_start(state, conn, p).await,
        ClientCommand::LocationUpdate(p) => location_update(state, conn, p).await,
        ClientCommand::RideEnd { ride_id } => ride_end(state, conn, ride_id).await,
        ClientCommand::RouteSearch(p) => route_search(state, conn, p).await,
        ClientCommand::RideAccept(p) => ride_accept(state, conn, p).await,
        ClientCommand::RideWatch { ride_id } => ride_watch(state, conn, ride_id).await,
    }
}

async fn rerun_searches(state: &AppState) {
    let snapshot = state.registry.snapshot_active().await;
    state.sessions.rerun(&state.engine, &snapshot).await;
}

async fn ride_start(state: &AppState, conn: &ConnState, p: RideStartPayload) {
    for point in [&p.pickup, &p.destination].into_iter().flatten() {
        if !point.is_finite() {
            conn.send(ServerEvent::Error {
                message: "invalid ride coordinates".into(),
            });
            return;
        }
    }

    // Authoritative capacity, resolved once: ride override, then the
    // driver's vehicle, then the configured default. A store hiccup here
    // degrades to the default rather than refusing the announcement.
    let record = match state.rides.get_ride(p.ride_id).await {
        Ok(r) => r,
        Err(err) => {
            warn!(error = %err, ride_id = %p.ride_id, "ride lookup failed");
            None
        }
    };
    let driver = match state.drivers.get_driver(p.driver_id).await {
        Ok(d) => d,
        Err(err) => {
            warn!(error = %err, driver_id = %p.driver_id, "driver lookup failed");
            None
        }
    };
    let capacity = resolve_capacity(
        record.as_ref(),
        driver.as_ref(),
        state.booking_config.default_capacity,
    );

    // Fill in whatever route estimates the announcement left out.
    let (route, distance, duration) = match (p.pickup, p.destination) {
        (Some(from), Some(to))
            if p.route.is_empty() || p.distance.is_none() || p.duration.is_none() =>
        {
            let plan = plan_or_fallback(
                state.router.as_deref(),
                from,
                to,
                &state.routing_config,
            )
            .await;
            let route = if p.route.is_empty() { plan.polyline } else { p.route.clone() };
            (
                route,
                p.distance.unwrap_or(plan.distance_meters),
                p.duration.unwrap_or(plan.duration_seconds),
            )
        }
        _ => (
            p.route.clone(),
            p.distance.unwrap_or(0.0),
            p.duration.unwrap_or(0.0),
        ),
    };

    let ride = ActiveRide {
        ride_id: p.ride_id,
        driver_id: p.driver_id,
        driver_name: p.driver_name,
        driver_contact: p.driver_contact,
        pickup: p.pickup,
        dropoff: p.destination,
        route,
        distance_meters: distance,
        duration_seconds: duration,
        status: p.status,
        started_at: p.start_time.unwrap_or_else(Utc::now),
        start_location: None,
        last: None,
        trail: Vec::new(),
        capacity,
    };

    if let Err(err) = state.allocator.ensure(p.ride_id, capacity).await {
        warn!(error = %err, ride_id = %p.ride_id, "seat ledger seeding failed");
    }

    state.registry.upsert(ride.clone()).await;
    conn.subscribe(Topic::Ride(p.ride_id));
    conn.subscribe(Topic::Driver(p.driver_id));
    state
        .dispatcher
        .publish(Topic::Ride(p.ride_id), ServerEvent::RideInfo { ride });

    rerun_searches(state).await;
}

async fn location_update(state: &AppState, conn: &ConnState, p: LocationUpdatePayload) {
    let point = GeoPoint::new(p.lat, p.lng);
    if !point.is_finite() {
        conn.send(ServerEvent::Error {
            message: "invalid coordinates".into(),
        });
        return;
    }

    let stamp = TimedPoint {
        lat: p.lat,
        lng: p.lng,
        heading: p.heading,
        at: Utc::now(),
    };

    let ride = match state.registry.apply_location(p.ride_id, stamp).await {
        Ok(ride) => ride,
        Err(err) => {
            conn.send(ServerEvent::Error {
                message: err.to_string(),
            });
            return;
        }
    };

    state.dispatcher.publish(
        Topic::Ride(p.ride_id),
        ServerEvent::RideLocation {
            ride_id: p.ride_id,
            lat: p.lat,
            lng: p.lng,
            heading: p.heading,
            timestamp: stamp.at,
        },
    );

    rerun_searches(state).await;

    // Best-effort ETA: a failed or slow lookup is simply omitted.
    if let (Some(router), Some(dropoff)) = (state.router.clone(), ride.dropoff) {
        let dispatcher = state.dispatcher.clone();
        let timeout = Duration::from_secs(state.routing_config.timeout_seconds);
        let ride_id = p.ride_id;
        tokio::spawn(async move {
            match plan_with_timeout(router.as_ref(), point, dropoff, timeout).await {
                Ok(plan) => dispatcher.publish(
                    Topic::Ride(ride_id),
                    ServerEvent::RideEta {
                        ride_id,
                        duration_seconds: plan.duration_seconds,
                        distance_meters: plan.distance_meters,
                        remaining_steps: plan.polyline,
                    },
                ),
                Err(err) => debug!(error = %err, %ride_id, "eta lookup skipped"),
            }
        });
    }
}

async fn ride_end(state: &AppState, conn: &ConnState, ride_id: uuid::Uuid) {
    match state.registry.remove(ride_id).await {
        Some(_) => {
            state
                .dispatcher
                .publish(Topic::Ride(ride_id), ServerEvent::RideEnded { ride_id });
            rerun_searches(state).await;
        }
        None => conn.send(ServerEvent::Error {
            message: format!("unknown ride {}", ride_id),
        }),
    }
}

async fn route_search(state: &AppState, conn: &ConnState, p: RouteSearchPayload) {
    let from = GeoPoint::new(p.from_lat, p.from_lng);
    let to = GeoPoint::new(p.to_lat, p.to_lng);
    if !from.is_finite() || !to.is_finite() {
        conn.send(ServerEvent::Error {
            message: "invalid search coordinates".into(),
        });
        return;
    }

    let criteria = waypool_match::SearchCriteria { from, to };
    state.sessions.set(conn.id, criteria, conn.tx.clone()).await;

    let snapshot = state.registry.snapshot_active().await;
    conn.send(outcome_event(state.engine.find_matches(&criteria, &snapshot)));
}

async fn ride_accept(state: &AppState, conn: &ConnState, p: RideAcceptPayload) {
    // Booking against a ride that is no longer live is stale input, not a
    // capacity problem.
    let ride = match state.registry.get(p.ride_id).await {
        Some(r) if r.status.is_live() => r,
        _ => {
            conn.send(ServerEvent::Error {
                message: CoreError::StaleState(p.ride_id).to_string(),
            });
            return;
        }
    };

    match state.allocator.book(p.ride_id, p.seat_count).await {
        Ok(occupancy) => {
            let passenger = Passenger {
                rider_id: p.rider_id,
                seat_count: p.seat_count,
                fare: p.fare,
                status: PassengerStatus::Confirmed,
            };
            if let Err(err) = state.allocator.record_passenger(p.ride_id, &passenger).await {
                warn!(error = %err, ride_id = %p.ride_id, "passenger record failed");
            }
            let passengers = state
                .allocator
                .passengers(p.ride_id)
                .await
                .unwrap_or_default();

            conn.subscribe(Topic::Ride(p.ride_id));

            state.dispatcher.publish(
                Topic::Ride(p.ride_id),
                ServerEvent::RideAccepted {
                    ride_id: p.ride_id,
                    driver_id: ride.driver_id,
                    booking: BookingDetails {
                        rider_id: p.rider_id,
                        pickup: p.pickup,
                        destination: p.destination,
                        seat_count: p.seat_count,
                        fare: p.fare,
                    },
                    passengers,
                },
            );
            for topic in [Topic::Ride(p.ride_id), Topic::Driver(ride.driver_id)] {
                state.dispatcher.publish(
                    topic,
                    ServerEvent::RideStatusUpdated {
                        ride_id: p.ride_id,
                        occupied: occupancy.occupied,
                        capacity: occupancy.capacity,
                        driver_id: Some(ride.driver_id),
                    },
                );
            }
            conn.send(ServerEvent::BookingConfirmed {
                ride_id: p.ride_id,
                occupied: occupancy.occupied,
                capacity: occupancy.capacity,
            });
        }
        Err(AllocationError::CapacityExhausted {
            requested,
            available,
            occupied,
            capacity,
        }) => {
            conn.send(ServerEvent::BookingError {
                ride_id: p.ride_id,
                occupied,
                capacity,
                reason: format!(
                    "not enough seats: requested {}, available {}",
                    requested, available
                ),
            });
        }
        Err(err) => conn.send(ServerEvent::Error {
            message: err.to_string(),
        }),
    }
}

async fn ride_watch(state: &AppState, conn: &ConnState, ride_id: uuid::Uuid) {
    match state.registry.get(ride_id).await {
        Some(ride) => {
            conn.subscribe(Topic::Ride(ride_id));
            conn.send(ServerEvent::RideInfo { ride });
        }
        None => conn.send(ServerEvent::Error {
            message: format!("unknown ride {}", ride_id),
        }),
    }
}
