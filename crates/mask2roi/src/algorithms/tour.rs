//! Greedy nearest-neighbour ordering of boundary pixels.
//!
//! The boundary extractor only yields an unordered pixel set. The tour
//! reconstructs an outline from it by always stepping to the closest pixel
//! not yet visited. On simple closed boundaries of roughly even density this
//! walks the outline; on pinches, one-pixel necks or touching sub-regions the
//! greedy step can jump across the shape and the resulting polygon may cross
//! itself. That is expected output, not an error.

use crate::{
    traits::TourBuilder,
    types::{BoundaryPointSet, Polygon},
};

/// Greedy nearest-neighbour tour.
///
/// * Seed: the first point of the input (row-major collection makes this the
///   top-most, then left-most boundary pixel).
/// * Step: the remaining point with the smallest Euclidean distance to the
///   last placed point.
/// * Ties: the candidate that comes first in the pool's current order wins.
///   The pool keeps the input order with visited points removed, so results
///   do not depend on hash or platform iteration order.
///
/// Runs in O(M²) for M points.
#[derive(Debug, Clone, Default)]
pub struct NearestNeighbourTour;

impl NearestNeighbourTour {
    /// Visiting order as indices into `points`.
    pub fn order(points: &[[u32; 2]]) -> Vec<usize> {
        let mut order = Vec::with_capacity(points.len());
        if points.is_empty() {
            return order;
        }

        let mut visited = vec![false; points.len()];
        let mut current = 0;
        visited[current] = true;
        order.push(current);

        while order.len() < points.len() {
            let mut best: Option<(usize, u64)> = None;
            for (candidate, point) in points.iter().enumerate() {
                if visited[candidate] {
                    continue;
                }
                let distance = squared_distance(points[current], *point);
                // Strict comparison keeps the first candidate on ties
                if best.is_none_or(|(_, best_distance)| distance < best_distance) {
                    best = Some((candidate, distance));
                }
            }

            let Some((next, _)) = best else { break };
            visited[next] = true;
            order.push(next);
            current = next;
        }

        order
    }
}

impl TourBuilder for NearestNeighbourTour {
    fn build_tour(&self, points: &BoundaryPointSet) -> Polygon {
        let points = points.points();
        let vertices = Self::order(points)
            .into_iter()
            .map(|index| {
                let [x, y] = points[index];
                [x as f32, y as f32]
            })
            .collect();
        Polygon::new(vertices)
    }
}

/// Exact squared Euclidean distance; same ordering as the distance itself
fn squared_distance(a: [u32; 2], b: [u32; 2]) -> u64 {
    let dx = u64::from(a[0].abs_diff(b[0]));
    let dy = u64::from(a[1].abs_diff(b[1]));
    dx * dx + dy * dy
}
