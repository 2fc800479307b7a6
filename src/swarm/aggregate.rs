//! Neighbor Aggregation
//!
//! Turns the spatial index into per-agent alignment, separation and cohesion
//! vectors. Under the same-cell policy each bucket is reduced once to a sum
//! of motions and a sum of positions; every member then subtracts its own
//! contribution, so a cell of `k` agents costs O(k) instead of O(k²).

use super::grid::{CellEntry, SpatialHashIndex};
use crate::core::config::NeighborPolicy;
use glam::Vec3;
use rayon::prelude::*;

/// Aggregated neighbor state for one agent.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct NeighborVectors {
    /// Mean motion of the peers.
    pub alignment: Vec3,
    /// Own position minus the peers' mean position.
    pub separation: Vec3,
    /// Peers' mean position minus own position.
    pub cohesion: Vec3,
    /// Number of peers that contributed.
    pub neighbors: usize,
}

impl NeighborVectors {
    pub const ZERO: Self = NeighborVectors {
        alignment: Vec3::ZERO,
        separation: Vec3::ZERO,
        cohesion: Vec3::ZERO,
        neighbors: 0,
    };

    /// Vectors from the sums over `peers` agents, excluding `position`'s owner.
    #[inline]
    pub(crate) fn from_peer_sums(position: Vec3, motion_sum: Vec3, position_sum: Vec3, peers: usize) -> Self {
        if peers == 0 {
            return Self::ZERO;
        }
        let count = peers as f32;
        let centroid = position_sum / count;
        NeighborVectors {
            alignment: motion_sum / count,
            separation: position - centroid,
            cohesion: centroid - position,
            neighbors: peers,
        }
    }
}

/// Leave-one-out vectors for the members of one bucket.
///
/// With a cap `c`, only the first `min(k, c)` members (in index order) feed
/// the sums. A contributing member removes itself and divides by `m - 1`;
/// the others divide by `m`.
pub fn aggregate_cell(entries: &[CellEntry], cap: Option<usize>) -> Vec<(usize, NeighborVectors)> {
    let k = entries.len();
    if k < 2 {
        return entries
            .iter()
            .map(|e| (e.index, NeighborVectors::ZERO))
            .collect();
    }

    let m = cap.map_or(k, |c| c.min(k));
    let (motion_sum, position_sum) = entries[..m]
        .iter()
        .fold((Vec3::ZERO, Vec3::ZERO), |(v, p), e| (v + e.motion, p + e.position));

    entries
        .iter()
        .enumerate()
        .map(|(i, e)| {
            let vectors = if i < m {
                NeighborVectors::from_peer_sums(
                    e.position,
                    motion_sum - e.motion,
                    position_sum - e.position,
                    m - 1,
                )
            } else {
                NeighborVectors::from_peer_sums(e.position, motion_sum, position_sum, m)
            };
            (e.index, vectors)
        })
        .collect()
}

/// Same-cell aggregation over every occupied bucket.  Buckets run in
/// parallel; results land in a buffer indexed by enumeration order.
pub fn aggregate_same_cell(index: &SpatialHashIndex, cap: Option<usize>) -> Vec<NeighborVectors> {
    let per_cell: Vec<Vec<(usize, NeighborVectors)>> = index
        .buckets()
        .par_iter()
        .map(|bucket| aggregate_cell(&bucket.entries, cap))
        .collect();

    let mut out = vec![NeighborVectors::ZERO; index.len()];
    for (agent, vectors) in per_cell.into_iter().flatten() {
        out[agent] = vectors;
    }
    out
}

/// Exact-radius aggregation: scans the 27 surrounding cells and keeps peers
/// with `distance² <= radius²`.  Peers are taken in index order, so the cap
/// and the floating-point sums do not depend on bucket layout.
pub fn aggregate_within_radius(
    index: &SpatialHashIndex,
    radius: f32,
    cap: Option<usize>,
) -> Vec<NeighborVectors> {
    let mut agents = vec![None; index.len()];
    for bucket in index.buckets() {
        for entry in &bucket.entries {
            agents[entry.index] = Some(*entry);
        }
    }
    let radius_sq = radius * radius;

    agents
        .par_iter()
        .map(|agent| {
            let Some(me) = agent else {
                return NeighborVectors::ZERO;
            };
            let mut peers: Vec<&CellEntry> = Vec::new();
            for key in index.neighborhood_keys(me.position) {
                peers.extend(index.members(key).iter().filter(|other| {
                    other.index != me.index
                        && me.position.distance_squared(other.position) <= radius_sq
                }));
            }
            peers.sort_unstable_by_key(|e| e.index);
            if let Some(cap) = cap {
                peers.truncate(cap);
            }

            let (motion_sum, position_sum) = peers
                .iter()
                .fold((Vec3::ZERO, Vec3::ZERO), |(v, p), e| (v + e.motion, p + e.position));
            NeighborVectors::from_peer_sums(me.position, motion_sum, position_sum, peers.len())
        })
        .collect()
}

/// Dispatch on the configured neighbor policy.
pub fn aggregate(
    index: &SpatialHashIndex,
    policy: NeighborPolicy,
    radius: f32,
    cap: Option<usize>,
) -> Vec<NeighborVectors> {
    match policy {
        NeighborPolicy::SameCell => aggregate_same_cell(index, cap),
        NeighborPolicy::WithinRadius => aggregate_within_radius(index, radius, cap),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::swarm::oracle;
    use rand::{rngs::StdRng, Rng, SeedableRng};

    fn entry(index: usize, position: Vec3, motion: Vec3) -> CellEntry {
        CellEntry {
            index,
            position,
            motion,
        }
    }

    fn close(a: Vec3, b: Vec3, tol: f32) -> bool {
        (a - b).abs().max_element() <= tol * (1.0 + a.abs().max_element().max(b.abs().max_element()))
    }

    fn cloud(n: usize, extent: f32, seed: u64) -> (Vec<Vec3>, Vec<Vec3>) {
        let mut rng = StdRng::seed_from_u64(seed);
        let mut v = || Vec3::new(rng.gen_range(-extent..extent), rng.gen_range(-extent..extent), rng.gen_range(-extent..extent));
        let positions: Vec<Vec3> = (0..n).map(|_| v()).collect();
        let motions: Vec<Vec3> = (0..n).map(|_| v()).collect();
        (positions, motions)
    }

    #[test]
    fn single_member_cell_is_zero() {
        let out = aggregate_cell(&[entry(4, Vec3::ONE, Vec3::X)], None);
        assert_eq!(out, vec![(4, NeighborVectors::ZERO)]);
    }

    #[test]
    fn two_members_see_each_other() {
        let a = entry(0, Vec3::ZERO, Vec3::X);
        let b = entry(1, Vec3::new(1.0, 0.0, 0.0), Vec3::Y);
        let out = aggregate_cell(&[a, b], None);

        assert_eq!(out[0].1.alignment, Vec3::Y);
        assert_eq!(out[0].1.separation, Vec3::new(-1.0, 0.0, 0.0));
        assert_eq!(out[0].1.cohesion, Vec3::new(1.0, 0.0, 0.0));
        assert_eq!(out[1].1.alignment, Vec3::X);
        assert_eq!(out[1].1.separation, Vec3::new(1.0, 0.0, 0.0));
        assert_eq!(out[1].1.neighbors, 1);
    }

    #[test]
    fn leave_one_out_identity_holds_per_cell() {
        let mut rng = StdRng::seed_from_u64(99);
        let entries: Vec<CellEntry> = (0..9)
            .map(|i| {
                entry(
                    i,
                    Vec3::new(rng.gen(), rng.gen(), rng.gen()),
                    Vec3::new(rng.gen_range(-5.0..5.0), rng.gen(), rng.gen()),
                )
            })
            .collect();
        let k = entries.len() as f32;
        let sum_v: Vec3 = entries.iter().map(|e| e.motion).sum();
        let out = aggregate_cell(&entries, None);

        // Σ alignment_i·(k−1) + Σ velocity_i == k·sumVelocity
        let lhs: Vec3 = out.iter().map(|(_, v)| v.alignment * (k - 1.0)).sum::<Vec3>() + sum_v;
        assert!(close(lhs, sum_v * k, 1e-5), "{lhs} vs {}", sum_v * k);
    }

    #[test]
    fn same_cell_matches_pairwise_reference() {
        let (positions, motions) = cloud(1_500, 6.0, 21);
        let index = SpatialHashIndex::build(&positions, &motions, 1.0);
        let fast = aggregate_same_cell(&index, None);
        let slow = oracle::pairwise_same_cell(&positions, &motions, 1.0);

        assert_eq!(fast.len(), slow.len());
        for (f, s) in fast.iter().zip(&slow) {
            assert_eq!(f.neighbors, s.neighbors);
            assert!(close(f.alignment, s.alignment, 1e-4));
            assert!(close(f.separation, s.separation, 1e-4));
            assert!(close(f.cohesion, s.cohesion, 1e-4));
        }
    }

    #[test]
    fn cap_truncates_contributors() {
        let entries: Vec<CellEntry> = (0..5)
            .map(|i| entry(i, Vec3::new(i as f32, 0.0, 0.0), Vec3::new(i as f32, 0.0, 0.0)))
            .collect();
        let out = aggregate_cell(&entries, Some(2));

        // Contributors are members 0 and 1.
        assert_eq!(out[0].1.neighbors, 1);
        assert_eq!(out[0].1.alignment, Vec3::new(1.0, 0.0, 0.0));
        assert_eq!(out[1].1.alignment, Vec3::ZERO);
        // Non-contributors average both contributors.
        assert_eq!(out[4].1.neighbors, 2);
        assert_eq!(out[4].1.alignment, Vec3::new(0.5, 0.0, 0.0));
        assert_eq!(out[4].1.separation, Vec3::new(3.5, 0.0, 0.0));
        assert!(out.iter().all(|(_, v)| v.neighbors <= 2));
    }

    #[test]
    fn cap_of_one_leaves_contributor_alone() {
        let entries: Vec<CellEntry> = (0..3)
            .map(|i| entry(i, Vec3::splat(i as f32), Vec3::X * i as f32))
            .collect();
        let out = aggregate_cell(&entries, Some(1));
        assert_eq!(out[0].1, NeighborVectors::ZERO);
        assert_eq!(out[2].1.alignment, Vec3::ZERO);
        assert_eq!(out[2].1.separation, Vec3::splat(2.0));
    }

    #[test]
    fn within_radius_matches_brute_force() {
        let (positions, motions) = cloud(800, 5.0, 5);
        let radius = 1.2;
        let index = SpatialHashIndex::build(&positions, &motions, radius);
        let fast = aggregate_within_radius(&index, radius, None);
        let slow = oracle::brute_force_within_radius(&positions, &motions, radius, None);

        for (f, s) in fast.iter().zip(&slow) {
            assert_eq!(f.neighbors, s.neighbors);
            assert_eq!(f.alignment, s.alignment);
            assert_eq!(f.separation, s.separation);
        }
    }

    #[test]
    fn within_radius_respects_cap() {
        let (positions, motions) = cloud(400, 2.0, 8);
        let index = SpatialHashIndex::build(&positions, &motions, 1.0);
        let capped = aggregate_within_radius(&index, 1.0, Some(3));
        let slow = oracle::brute_force_within_radius(&positions, &motions, 1.0, Some(3));
        assert!(capped.iter().all(|v| v.neighbors <= 3));
        assert_eq!(capped, slow);
    }

    #[test]
    fn policies_differ_at_cell_edges() {
        // Two agents straddling a cell boundary, well inside the radius.
        let positions = [Vec3::new(0.95, 0.5, 0.5), Vec3::new(1.05, 0.5, 0.5)];
        let motions = [Vec3::X, Vec3::Y];
        let index = SpatialHashIndex::build(&positions, &motions, 1.0);

        let same_cell = aggregate(&index, NeighborPolicy::SameCell, 1.0, None);
        let radius = aggregate(&index, NeighborPolicy::WithinRadius, 1.0, None);
        assert_eq!(same_cell[0].neighbors, 0);
        assert_eq!(radius[0].neighbors, 1);
        assert_eq!(radius[0].alignment, Vec3::Y);
    }
}
