pub mod error;
pub mod models;
pub mod repository;

pub use error::{CoreError, StoreError};
pub use models::{DriverProfile, RideRecord, SeatBooking};
pub use repository::{BookingRepository, DriverRepository, RideRepository};
