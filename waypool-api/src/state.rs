use std::sync::Arc;

use waypool_booking::{BookingConfig, CapacityAllocator};
use waypool_core::repository::{DriverRepository, RideRepository};
use waypool_match::{MatchEngine, RideRegistry};
use waypool_routing::{RouteProvider, RoutingConfig};
use waypool_store::RedisClient;

use crate::dispatcher::Dispatcher;
use crate::sessions::SearchSessions;

#[derive(Clone)]
pub struct AppState {
    pub registry: Arc<RideRegistry>,
    pub engine: Arc<MatchEngine>,
    pub dispatcher: Dispatcher,
    pub sessions: Arc<SearchSessions>,
    pub allocator: Arc<CapacityAllocator>,
    pub rides: Arc<dyn RideRepository>,
    pub drivers: Arc<dyn DriverRepository>,
    /// External routing collaborator; absent means every plan is the local
    /// straight-line estimate and ETA events are skipped.
    pub router: Option<Arc<dyn RouteProvider>>,
    pub redis: Option<Arc<RedisClient>>,
    pub routing_config: RoutingConfig,
    pub booking_config: BookingConfig,
}
