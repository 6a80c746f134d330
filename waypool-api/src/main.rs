use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use waypool_api::app_config::Config;
use waypool_api::dispatcher::Dispatcher;
use waypool_api::sessions::SearchSessions;
use waypool_api::{app, AppState};
use waypool_booking::CapacityAllocator;
use waypool_core::repository::{BookingRepository, DriverRepository, RideRepository};
use waypool_match::{MatchEngine, RideRegistry};
use waypool_routing::{OsrmClient, RouteProvider};
use waypool_store::{
    DbClient, InMemoryStore, PostgresBookingRepository, PostgresDriverRepository,
    PostgresRideRepository, RedisClient,
};

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "waypool_api=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::load().expect("Failed to load config");
    tracing::info!("Starting Waypool on port {}", config.server.port);

    let (rides, drivers, bookings): (
        Arc<dyn RideRepository>,
        Arc<dyn DriverRepository>,
        Arc<dyn BookingRepository>,
    ) = match &config.database {
        Some(db) => {
            let client = DbClient::new(&db.url)
                .await
                .expect("Failed to connect to Postgres");
            (
                Arc::new(PostgresRideRepository {
                    pool: client.pool.clone(),
                }),
                Arc::new(PostgresDriverRepository {
                    pool: client.pool.clone(),
                }),
                Arc::new(PostgresBookingRepository { pool: client.pool }),
            )
        }
        None => {
            tracing::warn!("No database configured, using the in-memory store");
            let store = Arc::new(InMemoryStore::new());
            (store.clone(), store.clone(), store)
        }
    };

    let redis = match &config.redis {
        Some(r) => match RedisClient::new(&r.url) {
            Ok(client) => Some(Arc::new(client)),
            Err(err) => {
                tracing::warn!("Redis unavailable, rate limiting disabled: {}", err);
                None
            }
        },
        None => None,
    };

    let router: Option<Arc<dyn RouteProvider>> = match &config.routing.endpoint {
        Some(endpoint) => {
            match OsrmClient::new(endpoint, Duration::from_secs(config.routing.timeout_seconds)) {
                Ok(client) => Some(Arc::new(client)),
                Err(err) => {
                    tracing::warn!("Routing client unavailable, using estimates: {}", err);
                    None
                }
            }
        }
        None => None,
    };

    let registry = Arc::new(RideRegistry::new());
    let state = AppState {
        registry: registry.clone(),
        engine: Arc::new(MatchEngine::new(config.matching.clone())),
        dispatcher: Dispatcher::new(256),
        sessions: Arc::new(SearchSessions::new()),
        allocator: Arc::new(CapacityAllocator::new(bookings)),
        rides,
        drivers,
        router,
        redis,
        routing_config: config.routing.clone(),
        booking_config: config.booking.clone(),
    };

    tokio::spawn(waypool_api::sweep::run_sweeper(
        registry.clone(),
        config.matching.clone(),
    ));

    let app = app(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server.port));
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await.unwrap();
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await
    .unwrap();

    // Not reached in normal operation; the registry drains with the process.
    registry.clear().await;
}
