use serde::{Deserialize, Serialize};

use crate::geometry::normalize_angle;

const DEFAULT_LOCATION_ACCURACY: f64 = 8.0;
const DEFAULT_HEADING_ACCURACY: f64 = 22.5;
const DEFAULT_MAX_ROAD_DISTANCE: f64 = 100.0;

/// Accuracy assumptions for snapping a position onto a road or route.
/// Zero means "use the default".
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LocationMatchParam {
    /// Position accuracy in meters at 95% confidence.
    pub location_accuracy: f64,
    /// Heading accuracy in degrees at 95% confidence.
    pub heading_accuracy: f64,
    /// Roads farther away than this, in meters, are never matched.
    pub max_road_distance: f64,
}

fn normalize_value(value: f64, default: f64, min: f64, max: f64) -> f64 {
    if value.is_finite() && value > 0.0 {
        value.clamp(min, max)
    } else {
        default
    }
}

impl LocationMatchParam {
    pub fn new(location_accuracy: f64, heading_accuracy: f64, max_road_distance: f64) -> Self {
        LocationMatchParam {
            location_accuracy,
            heading_accuracy,
            max_road_distance,
        }
    }

    pub fn normalized(&self) -> LocationMatchParam {
        LocationMatchParam {
            location_accuracy: normalize_value(self.location_accuracy, DEFAULT_LOCATION_ACCURACY, 1.0, 1000.0),
            heading_accuracy: normalize_value(self.heading_accuracy, DEFAULT_HEADING_ACCURACY, 1.0, 90.0),
            max_road_distance: normalize_value(self.max_road_distance, DEFAULT_MAX_ROAD_DISTANCE, 5.0, 10_000.0),
        }
    }
}

/// Something a position can be matched to, with its distance from the
/// position and the map direction of travel there.
#[derive(Debug, Clone, PartialEq)]
pub struct MatchCandidate<T> {
    pub item: T,
    pub distance: f64,
    pub direction: f64,
}

/// Picks the best candidate for a position. Candidates within the location
/// accuracy all count as equally near; a heading disagreeing by more than the
/// heading accuracy costs as much as the whole search radius.
///
/// `heading` is a map direction in degrees.
pub fn best_match<T>(
    candidates: impl IntoIterator<Item = MatchCandidate<T>>,
    heading: Option<f64>,
    params: &LocationMatchParam,
) -> Option<MatchCandidate<T>> {
    let params = params.normalized();

    candidates
        .into_iter()
        .filter(|candidate| candidate.distance <= params.max_road_distance)
        .map(|candidate| {
            let mut score = candidate.distance.max(params.location_accuracy);
            if let Some(heading) = heading {
                let difference = normalize_angle(candidate.direction - heading).abs();
                if difference > params.heading_accuracy {
                    score += params.max_road_distance;
                }
            }
            (score, candidate)
        })
        .min_by(|(a, _), (b, _)| a.total_cmp(b))
        .map(|(_, candidate)| candidate)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candidate(item: u32, distance: f64, direction: f64) -> MatchCandidate<u32> {
        MatchCandidate {
            item,
            distance,
            direction,
        }
    }

    #[test]
    fn test_normalized_defaults_and_clamps() {
        let params = LocationMatchParam::default().normalized();
        assert_eq!(params, LocationMatchParam::new(8.0, 22.5, 100.0));

        let params = LocationMatchParam::new(0.1, 400.0, -3.0).normalized();
        assert_eq!(params, LocationMatchParam::new(1.0, 90.0, 100.0));
    }

    #[test]
    fn test_best_match_by_distance() {
        let params = LocationMatchParam::default();
        let best = best_match(
            vec![candidate(1, 40.0, 0.0), candidate(2, 12.0, 90.0), candidate(3, 150.0, 0.0)],
            None,
            &params,
        );
        assert_eq!(best.map(|c| c.item), Some(2));

        assert!(best_match(vec![candidate(3, 150.0, 0.0)], None, &params).is_none());
    }

    #[test]
    fn test_best_match_prefers_agreeing_heading() {
        let params = LocationMatchParam::default();
        // Both within the location accuracy: the heading decides.
        let best = best_match(
            vec![candidate(1, 2.0, 180.0), candidate(2, 6.0, 10.0)],
            Some(0.0),
            &params,
        );
        assert_eq!(best.map(|c| c.item), Some(2));

        // A road running the wrong way loses even to a distant one running the right way.
        let best = best_match(
            vec![candidate(1, 10.0, 180.0), candidate(2, 95.0, 0.0)],
            Some(0.0),
            &params,
        );
        assert_eq!(best.map(|c| c.item), Some(2));
    }
}
