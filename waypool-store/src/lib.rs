pub mod database;
pub mod memory;
pub mod postgres;
pub mod redis_repo;

pub use database::DbClient;
pub use memory::InMemoryStore;
pub use postgres::{PostgresBookingRepository, PostgresDriverRepository, PostgresRideRepository};
pub use redis_repo::RedisClient;
