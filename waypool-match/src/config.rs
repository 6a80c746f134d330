use serde::Deserialize;

/// Matching thresholds. The defaults are the empirically chosen production
/// values; every one of them can be overridden through configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MatchConfig {
    /// Proximity radius for the point-overlap test, meters.
    pub overlap_radius_m: f64,
    /// Minimum overlap ratio for two routes to count as overlapping.
    pub overlap_ratio: f64,
    /// Coarse any-pair radius for the same-path test, meters.
    pub same_path_radius_m: f64,
    /// Endpoint-proximity fallback threshold, meters.
    pub endpoint_radius_m: f64,
    /// Broader radius for nearby/approximate inclusion, meters.
    pub nearby_radius_m: f64,
    /// Radius for the expansion pass when too few matches, meters.
    pub expanded_radius_m: f64,
    /// Run the expansion pass when fewer matches than this were found.
    pub min_results: usize,
    /// Age after which a ride with no live report and no usable pickup is
    /// evicted, seconds.
    pub stale_after_seconds: i64,
    /// Interval between eviction sweeps, seconds.
    pub sweep_interval_seconds: u64,
}

impl Default for MatchConfig {
    fn default() -> Self {
        Self {
            overlap_radius_m: 500.0,
            overlap_ratio: 0.2,
            same_path_radius_m: 2_000.0,
            endpoint_radius_m: 5_000.0,
            nearby_radius_m: 10_000.0,
            expanded_radius_m: 15_000.0,
            min_results: 5,
            stale_after_seconds: 300,
            sweep_interval_seconds: 60,
        }
    }
}
