use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;

use waypool_shared::GeoPoint;

use crate::error::RoutingError;
use crate::{RoutePlan, RouteProvider};

/// Thin HTTP client for an OSRM-style `/route` service.
#[derive(Debug, Clone)]
pub struct OsrmClient {
    client: reqwest::Client,
    endpoint: String,
}

#[derive(Debug, Deserialize)]
struct OsrmRouteResponse {
    code: String,
    #[serde(default)]
    routes: Vec<OsrmRoute>,
}

#[derive(Debug, Deserialize)]
struct OsrmRoute {
    distance: f64,
    duration: f64,
    geometry: OsrmGeometry,
}

#[derive(Debug, Deserialize)]
struct OsrmGeometry {
    /// GeoJSON order: [lng, lat].
    coordinates: Vec<[f64; 2]>,
}

impl OsrmClient {
    pub fn new(endpoint: &str, timeout: Duration) -> Result<Self, RoutingError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            endpoint: endpoint.trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl RouteProvider for OsrmClient {
    async fn plan(&self, from: GeoPoint, to: GeoPoint) -> Result<RoutePlan, RoutingError> {
        let url = format!(
            "{}/route/v1/driving/{:.6},{:.6};{:.6},{:.6}?overview=full&geometries=geojson",
            self.endpoint, from.lng, from.lat, to.lng, to.lat
        );

        let response: OsrmRouteResponse = self.client.get(&url).send().await?.json().await?;

        if response.code != "Ok" {
            return Err(RoutingError::Api(response.code));
        }
        let route = response.routes.into_iter().next().ok_or(RoutingError::NoRoute)?;

        Ok(RoutePlan {
            distance_meters: route.distance,
            duration_seconds: route.duration,
            polyline: route
                .geometry
                .coordinates
                .iter()
                .map(|c| GeoPoint::new(c[1], c[0]))
                .collect(),
            estimated: false,
        })
    }
}
