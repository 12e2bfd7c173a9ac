use rand::{Rng, SeedableRng, rngs::SmallRng};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::{
    constants::{MAX_BEST_ROUTE_ITERATIONS, MIN_BEST_ROUTE_ITERATIONS},
    error::RouteError,
    graph::RoutableGraph,
    snap::Snap,
    weighting::Weighting,
};

use super::{path_search::PathSearch, search_control::SearchControl};

// Stands in for a leg with no path so that orders using it can still be compared.
const UNREACHABLE_LEG_WEIGHT: f64 = 1e12;

/// Tuning of the waypoint reordering. The iteration bounds are empirical.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BestRouteParams {
    pub min_iterations: usize,
    pub max_iterations: usize,
    /// A move this much worse than the starting order is accepted with a
    /// probability of one half at the start.
    pub temperature_factor: f64,
    pub cooling_rate: f64,
    pub seed: u64,
}

impl Default for BestRouteParams {
    fn default() -> Self {
        BestRouteParams {
            min_iterations: MIN_BEST_ROUTE_ITERATIONS,
            max_iterations: MAX_BEST_ROUTE_ITERATIONS,
            temperature_factor: 0.3,
            cooling_rate: 0.97,
            seed: 2427121,
        }
    }
}

impl BestRouteParams {
    /// Iterations for `waypoint_count` waypoints: the requested count, or the
    /// square of the waypoint count when zero, clamped to the configured bounds.
    pub fn iterations_for(&self, waypoint_count: usize, requested: usize) -> usize {
        let iterations = if requested == 0 {
            waypoint_count.saturating_mul(waypoint_count)
        } else {
            requested
        };
        let max = self.max_iterations.max(self.min_iterations);
        iterations.clamp(self.min_iterations, max)
    }
}

/// Search weights between every ordered pair of waypoints.
pub struct LegWeights {
    weights: Vec<Vec<f64>>,
}

impl LegWeights {
    pub fn compute<S: PathSearch + Sync>(
        search: &S,
        graph: &(impl RoutableGraph + Sync),
        weighting: &(dyn Weighting + Sync),
        waypoints: &[Snap],
        control: &SearchControl,
    ) -> Result<LegWeights, RouteError> {
        let weights = (0..waypoints.len())
            .into_par_iter()
            .map(|from| {
                waypoints
                    .iter()
                    .enumerate()
                    .map(|(to, destination)| {
                        if from == to {
                            return Ok(0.0);
                        }
                        let leg = search.search_leg(graph, weighting, &waypoints[from], destination, control)?;
                        Ok(leg.map_or(UNREACHABLE_LEG_WEIGHT, |leg| leg.weight))
                    })
                    .collect::<Result<Vec<f64>, RouteError>>()
            })
            .collect::<Result<Vec<_>, RouteError>>()?;

        Ok(LegWeights { weights })
    }

    pub fn from_matrix(weights: Vec<Vec<f64>>) -> Self {
        LegWeights { weights }
    }

    pub fn len(&self) -> usize {
        self.weights.len()
    }

    pub fn is_empty(&self) -> bool {
        self.weights.is_empty()
    }

    pub fn order_weight(&self, order: &[usize]) -> f64 {
        order
            .windows(2)
            .map(|pair| self.weights[pair[0]][pair[1]])
            .sum()
    }
}

/// Reorders waypoints by simulated annealing over segment reversals. Fixed
/// ends keep their place; returns the visiting order as waypoint indices.
#[instrument(skip(weights, params, control), level = "debug")]
pub fn best_waypoint_order(
    weights: &LegWeights,
    start_fixed: bool,
    end_fixed: bool,
    iterations: usize,
    params: &BestRouteParams,
    control: &SearchControl,
) -> Result<Vec<usize>, RouteError> {
    let count = weights.len();
    let mut order: Vec<usize> = (0..count).collect();

    let first = usize::from(start_fixed);
    let last = if end_fixed { count.saturating_sub(1) } else { count };
    if last <= first + 1 {
        return Ok(order);
    }

    let mut rng = SmallRng::seed_from_u64(params.seed);
    let mut current_weight = weights.order_weight(&order);
    let mut best_order = order.clone();
    let mut best_weight = current_weight;
    let mut temperature = params.temperature_factor * current_weight / 0.5_f64.ln().abs();

    for _ in 0..iterations {
        control.check()?;

        let i = rng.random_range(first..last - 1);
        let j = rng.random_range(i + 1..last);
        order[i..=j].reverse();

        let candidate_weight = weights.order_weight(&order);
        let delta = candidate_weight - current_weight;
        let accept = delta <= 0.0
            || (temperature > 0.0 && rng.random::<f64>() < (-delta / temperature).exp());

        if accept {
            current_weight = candidate_weight;
            if current_weight < best_weight {
                best_weight = current_weight;
                best_order.clone_from(&order);
            }
        } else {
            order[i..=j].reverse();
        }

        temperature *= params.cooling_rate;
    }

    debug!(iterations, best_weight, "Best waypoint order found");

    Ok(best_order)
}

#[cfg(test)]
mod tests {
    use super::*;

    // Waypoints on a line at the given positions, weights being the distances.
    fn line_weights(positions: &[f64]) -> LegWeights {
        LegWeights::from_matrix(
            positions
                .iter()
                .map(|a| positions.iter().map(|b| (a - b).abs()).collect())
                .collect(),
        )
    }

    #[test]
    fn test_iterations_clamped() {
        let params = BestRouteParams::default();
        assert_eq!(params.iterations_for(3, 0), 16);
        assert_eq!(params.iterations_for(10, 0), 100);
        assert_eq!(params.iterations_for(40, 0), 256);
        assert_eq!(params.iterations_for(3, 1000), 256);
        assert_eq!(params.iterations_for(3, 50), 50);
    }

    #[test]
    fn test_best_order_with_fixed_ends() {
        let weights = line_weights(&[0.0, 3.0, 1.0, 2.0, 4.0]);
        let order = best_waypoint_order(
            &weights,
            true,
            true,
            256,
            &BestRouteParams::default(),
            &SearchControl::new(),
        )
        .unwrap();

        assert_eq!(order, vec![0, 2, 3, 1, 4]);
        assert_eq!(weights.order_weight(&order), 4.0);
    }

    #[test]
    fn test_free_end_moves() {
        let weights = line_weights(&[0.0, 5.0, 1.0]);
        let order = best_waypoint_order(
            &weights,
            true,
            false,
            64,
            &BestRouteParams::default(),
            &SearchControl::new(),
        )
        .unwrap();

        assert_eq!(order, vec![0, 2, 1]);
    }

    #[test]
    fn test_nothing_to_reorder() {
        let weights = line_weights(&[0.0, 5.0, 1.0]);
        let order = best_waypoint_order(
            &weights,
            true,
            true,
            64,
            &BestRouteParams::default(),
            &SearchControl::new(),
        )
        .unwrap();

        assert_eq!(order, vec![0, 1, 2]);
    }

    #[test]
    fn test_cancelled_reordering() {
        let weights = line_weights(&[0.0, 5.0, 1.0, 3.0]);
        let control = SearchControl::new();
        control.cancel();

        assert_eq!(
            best_waypoint_order(&weights, false, false, 64, &BestRouteParams::default(), &control),
            Err(RouteError::Cancelled)
        );
    }
}
