pub mod geo;
pub mod models;

pub use geo::{haversine_distance_m, GeoPoint, TimedPoint};
pub use models::booking::{Occupancy, Passenger, PassengerStatus};
pub use models::events::{BookingDetails, ServerEvent, Topic};
pub use models::ride::{ActiveRide, MatchQuality, RideMatch, RideStatus};
