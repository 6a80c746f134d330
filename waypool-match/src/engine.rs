use serde::{Deserialize, Serialize};
use tracing::trace;

use waypool_shared::{
    haversine_distance_m, ActiveRide, GeoPoint, MatchQuality, RideMatch,
};

use crate::config::MatchConfig;
use crate::overlap::{endpoints_close, routes_overlap, same_path};

/// A searcher's desired trip, attached to one live connection and replaced
/// wholesale on every new search.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct SearchCriteria {
    pub from: GeoPoint,
    pub to: GeoPoint,
}

/// The empty case is an explicit signal, never an error.
#[derive(Debug, Clone)]
pub enum SearchOutcome {
    Matches(Vec<RideMatch>),
    NoneYet,
}

/// Runs the matching passes over a registry snapshot. Pure and
/// side-effect-free; re-run on every search and every registry mutation.
pub struct MatchEngine {
    config: MatchConfig,
}

impl MatchEngine {
    pub fn new(config: MatchConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &MatchConfig {
        &self.config
    }

    /// Produce the ordered match list for `criteria` over `rides`
    /// (insertion-ordered snapshot).
    pub fn find_matches(&self, criteria: &SearchCriteria, rides: &[ActiveRide]) -> SearchOutcome {
        let cfg = &self.config;
        let searcher_path = [criteria.from, criteria.to];
        let direct_distance = haversine_distance_m(criteria.from, criteria.to);

        let mut matches: Vec<RideMatch> = Vec::new();
        let mut unmatched: Vec<&ActiveRide> = Vec::new();

        for ride in rides {
            // A malformed or locationless entry is skipped, never fatal.
            if !ride.status.is_live() {
                continue;
            }
            let location = match ride.latest_location() {
                Some(loc) => loc,
                None => continue,
            };

            if self.is_direct_match(criteria, ride, &searcher_path) {
                matches.push(RideMatch {
                    quality: MatchQuality::Direct,
                    ride: ride.clone(),
                });
                continue;
            }

            let d_from = haversine_distance_m(criteria.from, location);
            let d_to = haversine_distance_m(criteria.to, location);
            let within_nearby = d_from.min(d_to) <= cfg.nearby_radius_m
                || d_from + d_to <= 2.0 * direct_distance;
            if within_nearby {
                matches.push(RideMatch {
                    quality: MatchQuality::Nearby,
                    ride: ride.clone(),
                });
            } else {
                unmatched.push(ride);
            }
        }

        // Expansion pass: with too few hits and a non-empty registry, widen
        // the radius over the candidates that missed every other test.
        if matches.len() < cfg.min_results && !rides.is_empty() {
            for ride in unmatched {
                let location = match ride.latest_location() {
                    Some(loc) => loc,
                    None => continue,
                };
                let d_from = haversine_distance_m(criteria.from, location);
                let d_to = haversine_distance_m(criteria.to, location);
                if d_from.min(d_to) <= cfg.expanded_radius_m {
                    matches.push(RideMatch {
                        quality: MatchQuality::Expanded,
                        ride: ride.clone(),
                    });
                }
            }
        }

        trace!(
            candidates = rides.len(),
            matched = matches.len(),
            "match pass complete"
        );

        if matches.is_empty() {
            SearchOutcome::NoneYet
        } else {
            SearchOutcome::Matches(matches)
        }
    }

    fn is_direct_match(
        &self,
        criteria: &SearchCriteria,
        ride: &ActiveRide,
        searcher_path: &[GeoPoint],
    ) -> bool {
        let cfg = &self.config;

        if !ride.route.is_empty() {
            if routes_overlap(
                searcher_path,
                &ride.route,
                cfg.overlap_radius_m,
                cfg.overlap_ratio,
            ) || same_path(searcher_path, &ride.route, cfg.same_path_radius_m)
            {
                return true;
            }
        }

        // No usable polyline (or it missed): endpoint-proximity fallback
        // against the recorded pickup/drop, substituting the live location
        // for whichever endpoint the announcement omitted.
        let location = match ride.latest_location() {
            Some(loc) => loc,
            None => return false,
        };
        let pickup = ride.pickup.filter(|p| p.is_finite()).unwrap_or(location);
        let drop = ride.dropoff.filter(|p| p.is_finite()).unwrap_or(location);
        endpoints_close(criteria.from, criteria.to, pickup, drop, cfg.endpoint_radius_m)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use uuid::Uuid;
    use waypool_shared::RideStatus;

    fn engine() -> MatchEngine {
        MatchEngine::new(MatchConfig::default())
    }

    fn criteria() -> SearchCriteria {
        SearchCriteria {
            from: GeoPoint::new(12.90, 77.58),
            to: GeoPoint::new(12.95, 77.60),
        }
    }

    fn ride_at(pickup: GeoPoint, status: RideStatus) -> ActiveRide {
        ActiveRide {
            ride_id: Uuid::new_v4(),
            driver_id: Uuid::new_v4(),
            driver_name: "d".into(),
            driver_contact: None,
            pickup: Some(pickup),
            dropoff: None,
            route: Vec::new(),
            distance_meters: 0.0,
            duration_seconds: 0.0,
            status,
            started_at: Utc::now(),
            start_location: None,
            last: None,
            trail: Vec::new(),
            capacity: 4,
        }
    }

    #[test]
    fn empty_registry_yields_none_yet() {
        let outcome = engine().find_matches(&criteria(), &[]);
        assert!(matches!(outcome, SearchOutcome::NoneYet));
    }

    #[test]
    fn active_ride_near_pickup_is_a_direct_match() {
        let rides = vec![ride_at(GeoPoint::new(12.905, 77.585), RideStatus::Active)];
        match engine().find_matches(&criteria(), &rides) {
            SearchOutcome::Matches(m) => {
                assert_eq!(m.len(), 1);
                assert_eq!(m[0].quality, MatchQuality::Direct);
            }
            SearchOutcome::NoneYet => panic!("expected a match"),
        }
    }

    #[test]
    fn ended_and_locationless_rides_are_skipped() {
        let mut no_location = ride_at(GeoPoint::new(12.905, 77.585), RideStatus::Active);
        no_location.pickup = None;
        let rides = vec![
            ride_at(GeoPoint::new(12.905, 77.585), RideStatus::Ended),
            no_location,
        ];
        assert!(matches!(
            engine().find_matches(&criteria(), &rides),
            SearchOutcome::NoneYet
        ));
    }

    #[test]
    fn route_overlap_beats_endpoint_distance() {
        // Candidate's polyline runs right along the searcher's path even
        // though its announced pickup is far away.
        let mut ride = ride_at(GeoPoint::new(13.40, 78.20), RideStatus::Ongoing);
        ride.route = vec![
            GeoPoint::new(12.901, 77.581),
            GeoPoint::new(12.930, 77.590),
            GeoPoint::new(12.951, 77.601),
        ];
        match engine().find_matches(&criteria(), &[ride]) {
            SearchOutcome::Matches(m) => assert_eq!(m[0].quality, MatchQuality::Direct),
            SearchOutcome::NoneYet => panic!("expected overlap match"),
        }
    }

    #[test]
    fn moderately_distant_ride_is_flagged_nearby() {
        // ~8 km from the searcher's start: misses the 5 km endpoint
        // fallback (and its averaged relaxation), inside the 10 km nearby
        // radius.
        let rides = vec![ride_at(GeoPoint::new(12.828, 77.58), RideStatus::Active)];
        match engine().find_matches(&criteria(), &rides) {
            SearchOutcome::Matches(m) => {
                assert_eq!(m.len(), 1);
                assert_eq!(m[0].quality, MatchQuality::Nearby);
            }
            SearchOutcome::NoneYet => panic!("expected nearby match"),
        }
    }

    #[test]
    fn distant_ride_is_flagged_expanded_not_direct() {
        // ~11 km from the searcher's end: outside nearby (10 km), inside
        // the 15 km expansion radius.
        let rides = vec![ride_at(GeoPoint::new(13.05, 77.60), RideStatus::Active)];
        match engine().find_matches(&criteria(), &rides) {
            SearchOutcome::Matches(m) => {
                assert_eq!(m.len(), 1);
                assert_eq!(m[0].quality, MatchQuality::Expanded);
            }
            SearchOutcome::NoneYet => panic!("expected expanded match"),
        }
    }

    #[test]
    fn beyond_expansion_radius_yields_none_yet() {
        let rides = vec![ride_at(GeoPoint::new(13.40, 78.20), RideStatus::Active)];
        assert!(matches!(
            engine().find_matches(&criteria(), &rides),
            SearchOutcome::NoneYet
        ));
    }

    #[test]
    fn results_keep_snapshot_order() {
        let a = ride_at(GeoPoint::new(12.905, 77.585), RideStatus::Active);
        let b = ride_at(GeoPoint::new(12.906, 77.586), RideStatus::Active);
        let (id_a, id_b) = (a.ride_id, b.ride_id);
        match engine().find_matches(&criteria(), &[a, b]) {
            SearchOutcome::Matches(m) => {
                assert_eq!(m[0].ride.ride_id, id_a);
                assert_eq!(m[1].ride.ride_id, id_b);
            }
            SearchOutcome::NoneYet => panic!("expected matches"),
        }
    }
}
