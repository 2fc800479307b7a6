//! Brute-force reference implementations.
//!
//! O(n²) scans with no index. Used to check the indexed pipeline in tests and
//! as the baseline in benchmarks; never called by `FlockPipeline`.

use super::aggregate::NeighborVectors;
use super::grid::cell_key;
use glam::Vec3;

/// Same-cell neighbors found by comparing every pair's cell key.
pub fn pairwise_same_cell(positions: &[Vec3], motions: &[Vec3], cell_size: f32) -> Vec<NeighborVectors> {
    let keys: Vec<_> = positions.iter().map(|&p| cell_key(p, cell_size)).collect();
    (0..positions.len())
        .map(|i| {
            let mut motion_sum = Vec3::ZERO;
            let mut position_sum = Vec3::ZERO;
            let mut peers = 0;
            for j in 0..positions.len() {
                if j != i && keys[j] == keys[i] {
                    motion_sum += motions[j];
                    position_sum += positions[j];
                    peers += 1;
                }
            }
            NeighborVectors::from_peer_sums(positions[i], motion_sum, position_sum, peers)
        })
        .collect()
}

/// Exact-radius neighbors, first `cap` peers in index order.
pub fn brute_force_within_radius(
    positions: &[Vec3],
    motions: &[Vec3],
    radius: f32,
    cap: Option<usize>,
) -> Vec<NeighborVectors> {
    let radius_sq = radius * radius;
    let cap = cap.unwrap_or(usize::MAX);
    (0..positions.len())
        .map(|i| {
            let mut motion_sum = Vec3::ZERO;
            let mut position_sum = Vec3::ZERO;
            let mut peers = 0;
            for j in 0..positions.len() {
                if peers == cap {
                    break;
                }
                if j != i && positions[i].distance_squared(positions[j]) <= radius_sq {
                    motion_sum += motions[j];
                    position_sum += positions[j];
                    peers += 1;
                }
            }
            NeighborVectors::from_peer_sums(positions[i], motion_sum, position_sum, peers)
        })
        .collect()
}

/// Index and squared distance of the closest point; `(None, ∞)` when empty.
pub fn nearest_brute_force(query: Vec3, points: &[Vec3]) -> (Option<usize>, f32) {
    let mut best = (None, f32::INFINITY);
    for (i, &p) in points.iter().enumerate() {
        let d = query.distance_squared(p);
        if d < best.1 {
            best = (Some(i), d);
        }
    }
    best
}
