use waypool_shared::{haversine_distance_m, GeoPoint};

use crate::RoutePlan;

/// Straight-line estimate: haversine distance and a duration derived from
/// a fixed average-speed assumption.
pub fn straight_line_plan(from: GeoPoint, to: GeoPoint, speed_kmh: f64) -> RoutePlan {
    let distance_meters = haversine_distance_m(from, to);
    let speed_ms = (speed_kmh.max(1.0)) / 3.6;
    RoutePlan {
        distance_meters,
        duration_seconds: distance_meters / speed_ms,
        polyline: vec![from, to],
        estimated: true,
    }
}
