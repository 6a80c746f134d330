pub mod client;
pub mod error;
pub mod fallback;

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

use waypool_shared::GeoPoint;

pub use client::OsrmClient;
pub use error::RoutingError;
pub use fallback::straight_line_plan;

/// A resolved route between two points. `estimated` marks plans produced
/// by the local straight-line fallback rather than the road network.
#[derive(Debug, Clone, Deserialize)]
pub struct RoutePlan {
    pub distance_meters: f64,
    pub duration_seconds: f64,
    pub polyline: Vec<GeoPoint>,
    pub estimated: bool,
}

/// The external road-routing collaborator.
#[async_trait]
pub trait RouteProvider: Send + Sync {
    async fn plan(&self, from: GeoPoint, to: GeoPoint) -> Result<RoutePlan, RoutingError>;
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RoutingConfig {
    /// OSRM-style endpoint, e.g. `http://localhost:5000`. Unset means the
    /// fallback estimator is always used.
    pub endpoint: Option<String>,
    pub timeout_seconds: u64,
    /// Average speed assumed by the straight-line duration estimate.
    pub fallback_speed_kmh: f64,
}

impl Default for RoutingConfig {
    fn default() -> Self {
        Self {
            endpoint: None,
            timeout_seconds: 3,
            fallback_speed_kmh: 30.0,
        }
    }
}

/// Run the lookup under its timeout bound. The elapsed-timeout case is an
/// explicit error so callers can tell it apart from an API failure.
pub async fn plan_with_timeout(
    provider: &dyn RouteProvider,
    from: GeoPoint,
    to: GeoPoint,
    timeout: Duration,
) -> Result<RoutePlan, RoutingError> {
    match tokio::time::timeout(timeout, provider.plan(from, to)).await {
        Ok(result) => result,
        Err(_) => Err(RoutingError::Timeout),
    }
}

/// Resolve a plan, falling back to the straight-line estimate on any
/// lookup failure. Never errors: routing outages must not stall matching
/// or booking.
pub async fn plan_or_fallback(
    provider: Option<&dyn RouteProvider>,
    from: GeoPoint,
    to: GeoPoint,
    config: &RoutingConfig,
) -> RoutePlan {
    if let Some(provider) = provider {
        match plan_with_timeout(
            provider,
            from,
            to,
            Duration::from_secs(config.timeout_seconds),
        )
        .await
        {
            Ok(plan) => return plan,
            Err(err) => {
                debug!(error = %err, "route lookup failed, using straight-line estimate");
            }
        }
    }
    straight_line_plan(from, to, config.fallback_speed_kmh)
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FailingProvider;

    #[async_trait]
    impl RouteProvider for FailingProvider {
        async fn plan(&self, _: GeoPoint, _: GeoPoint) -> Result<RoutePlan, RoutingError> {
            Err(RoutingError::Api("upstream unavailable".into()))
        }
    }

    struct SlowProvider;

    #[async_trait]
    impl RouteProvider for SlowProvider {
        async fn plan(&self, _: GeoPoint, _: GeoPoint) -> Result<RoutePlan, RoutingError> {
            tokio::time::sleep(Duration::from_secs(60)).await;
            unreachable!()
        }
    }

    #[tokio::test]
    async fn lookup_failure_falls_back_to_estimate() {
        let from = GeoPoint::new(12.90, 77.58);
        let to = GeoPoint::new(12.95, 77.60);
        let plan =
            plan_or_fallback(Some(&FailingProvider), from, to, &RoutingConfig::default()).await;
        assert!(plan.estimated);
        assert!(plan.distance_meters > 0.0);
        assert!(plan.duration_seconds > 0.0);
    }

    #[tokio::test(start_paused = true)]
    async fn slow_lookup_times_out_and_falls_back() {
        let from = GeoPoint::new(12.90, 77.58);
        let to = GeoPoint::new(12.95, 77.60);
        let plan =
            plan_or_fallback(Some(&SlowProvider), from, to, &RoutingConfig::default()).await;
        assert!(plan.estimated);
    }

    #[tokio::test]
    async fn no_provider_means_estimate() {
        let from = GeoPoint::new(12.90, 77.58);
        let to = GeoPoint::new(12.95, 77.60);
        let plan = plan_or_fallback(None, from, to, &RoutingConfig::default()).await;
        assert!(plan.estimated);
        assert_eq!(plan.polyline.len(), 2);
    }
}
