pub mod config;
pub mod engine;
pub mod overlap;
pub mod registry;

pub use config::MatchConfig;
pub use engine::{MatchEngine, SearchCriteria, SearchOutcome};
pub use registry::RideRegistry;
