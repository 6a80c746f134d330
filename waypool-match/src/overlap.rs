use waypool_shared::{haversine_distance_m, GeoPoint};

/// Fraction of points in `a` that have at least one neighbor in `b` within
/// `radius_m`, over the shorter sequence length. Empty input yields 0.0.
pub fn overlap_ratio(a: &[GeoPoint], b: &[GeoPoint], radius_m: f64) -> f64 {
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }
    let matched = a
        .iter()
        .filter(|pa| b.iter().any(|pb| haversine_distance_m(**pa, *pb) <= radius_m))
        .count();
    matched as f64 / a.len().min(b.len()) as f64
}

/// Overlap test: true iff the overlap ratio meets the threshold.
pub fn routes_overlap(a: &[GeoPoint], b: &[GeoPoint], radius_m: f64, threshold: f64) -> bool {
    overlap_ratio(a, b, radius_m) >= threshold
}

/// Coarse same-path test: true iff any pair of points across the two
/// sequences lies within `radius_m`. Cheap fallback for sparse routes.
pub fn same_path(a: &[GeoPoint], b: &[GeoPoint], radius_m: f64) -> bool {
    a.iter()
        .any(|pa| b.iter().any(|pb| haversine_distance_m(*pa, *pb) <= radius_m))
}

/// Point-proximity fallback when a candidate has no route polyline.
///
/// Checks the searcher's endpoints against the candidate's pickup/drop
/// points over four combinations, then relaxes to the averaged aligned-pair
/// distance at 1.5x the threshold as a last resort.
pub fn endpoints_close(
    from: GeoPoint,
    to: GeoPoint,
    candidate_pickup: GeoPoint,
    candidate_drop: GeoPoint,
    threshold_m: f64,
) -> bool {
    let d_start_pickup = haversine_distance_m(from, candidate_pickup);
    let d_end_drop = haversine_distance_m(to, candidate_drop);
    let d_start_drop = haversine_distance_m(from, candidate_drop);
    let d_end_pickup = haversine_distance_m(to, candidate_pickup);

    if d_start_pickup <= threshold_m
        || d_end_drop <= threshold_m
        || d_start_drop <= threshold_m
        || d_end_pickup <= threshold_m
    {
        return true;
    }

    (d_start_pickup + d_end_drop) / 2.0 <= threshold_m * 1.5
}

#[cfg(test)]
mod tests {
    use super::*;

    fn path(points: &[(f64, f64)]) -> Vec<GeoPoint> {
        points.iter().map(|(lat, lng)| GeoPoint::new(*lat, *lng)).collect()
    }

    #[test]
    fn identical_sequences_have_ratio_one() {
        let a = path(&[(12.90, 77.58), (12.92, 77.59), (12.95, 77.60)]);
        let ratio = overlap_ratio(&a, &a, 500.0);
        assert_eq!(ratio, 1.0);
        assert!(routes_overlap(&a, &a, 500.0, 1.0));
        assert!(routes_overlap(&a, &a, 500.0, 0.2));
    }

    #[test]
    fn empty_sequence_never_overlaps() {
        let a = path(&[(12.90, 77.58)]);
        assert_eq!(overlap_ratio(&a, &[], 500.0), 0.0);
        assert_eq!(overlap_ratio(&[], &a, 500.0), 0.0);
        assert!(!routes_overlap(&[], &a, 500.0, 0.2));
    }

    #[test]
    fn disjoint_paths_do_not_overlap() {
        // Bangalore vs. Chennai, hundreds of km apart.
        let a = path(&[(12.97, 77.59), (12.98, 77.60)]);
        let b = path(&[(13.08, 80.27), (13.09, 80.28)]);
        assert!(!routes_overlap(&a, &b, 500.0, 0.2));
        assert!(!same_path(&a, &b, 2_000.0));
    }

    #[test]
    fn same_path_matches_any_close_pair() {
        let a = path(&[(12.97, 77.59), (13.08, 80.27)]);
        let b = path(&[(40.71, -74.00), (12.975, 77.595)]);
        assert!(same_path(&a, &b, 2_000.0));
    }

    #[test]
    fn partial_overlap_respects_threshold() {
        // One of two searcher points has a close neighbor: ratio 0.5.
        let a = path(&[(12.900, 77.580), (12.999, 77.700)]);
        let b = path(&[(12.901, 77.580), (12.902, 77.581), (12.903, 77.582)]);
        let ratio = overlap_ratio(&a, &b, 500.0);
        assert!((ratio - 0.5).abs() < f64::EPSILON);
        assert!(routes_overlap(&a, &b, 500.0, 0.2));
        assert!(!routes_overlap(&a, &b, 500.0, 0.6));
    }

    #[test]
    fn endpoint_fallback_accepts_close_pickup() {
        let from = GeoPoint::new(12.900, 77.580);
        let to = GeoPoint::new(12.950, 77.600);
        // Pickup within 5 km of the searcher's start.
        assert!(endpoints_close(
            from,
            to,
            GeoPoint::new(12.905, 77.585),
            GeoPoint::new(13.50, 78.00),
            5_000.0
        ));
    }

    #[test]
    fn endpoint_fallback_relaxes_on_average() {
        let from = GeoPoint::new(12.800, 77.500);
        let to = GeoPoint::new(13.000, 77.700);
        // Both aligned distances ~6 km: each over the 5 km threshold (and
        // the cross pairs are far), but the average is within 1.5x.
        let pickup = GeoPoint::new(12.800, 77.555);
        let drop = GeoPoint::new(13.000, 77.755);
        assert!(endpoints_close(from, to, pickup, drop, 5_000.0));
        assert!(!endpoints_close(from, to, pickup, drop, 3_000.0));
    }

    #[test]
    fn endpoint_fallback_rejects_far_candidates() {
        let from = GeoPoint::new(12.900, 77.580);
        let to = GeoPoint::new(12.950, 77.600);
        assert!(!endpoints_close(
            from,
            to,
            GeoPoint::new(13.40, 78.10),
            GeoPoint::new(13.50, 78.20),
            5_000.0
        ));
    }
}
