//! Proximity Seeker
//!
//! Nearest-point search against the small tagged populations (targets,
//! predators). A plain linear scan per agent; the snapshots are expected to be
//! far smaller than the flock itself.

pub use crate::core::agent::TaggedSnapshot;
use crate::core::agent::{AgentId, AgentSnapshot};
use glam::Vec3;
use rayon::prelude::*;

/// Result of one nearest-point query.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Nearest {
    /// Unit vector toward or away from the nearest point; zero when absent
    /// or coincident.
    pub direction: Vec3,
    /// Squared distance to the nearest point; `+∞` when the snapshot is empty.
    pub distance_sq: f32,
}

impl Nearest {
    pub const NONE: Self = Nearest {
        direction: Vec3::ZERO,
        distance_sq: f32::INFINITY,
    };

    pub fn is_present(&self) -> bool {
        self.distance_sq.is_finite()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SeekMode {
    /// Direction points at the nearest entry (targets).
    Toward,
    /// Direction points away from the nearest entry (predators).
    Away,
}

/// First index achieving the minimum squared distance, skipping `exclude`.
pub fn nearest_index(
    query: Vec3,
    snapshot: &TaggedSnapshot,
    exclude: Option<AgentId>,
) -> Option<(usize, f32)> {
    let mut best: Option<(usize, f32)> = None;
    for (i, (&id, &p)) in snapshot.ids().iter().zip(snapshot.positions()).enumerate() {
        if id.is_some() && id == exclude {
            continue;
        }
        let d = query.distance_squared(p);
        // strict `<` keeps the earliest index on ties
        if best.map_or(true, |(_, bd)| d < bd) {
            best = Some((i, d));
        }
    }
    best
}

pub fn seek(query: Vec3, self_id: Option<AgentId>, snapshot: &TaggedSnapshot, mode: SeekMode) -> Nearest {
    match nearest_index(query, snapshot, self_id) {
        None => Nearest::NONE,
        Some((i, distance_sq)) => {
            let offset = snapshot.positions()[i] - query;
            let direction = match mode {
                SeekMode::Toward => offset.normalize_or_zero(),
                SeekMode::Away => (-offset).normalize_or_zero(),
            };
            Nearest {
                direction,
                distance_sq,
            }
        }
    }
}

/// One result per agent, in partition order.
pub fn seek_partition(agents: &[AgentSnapshot], snapshot: &TaggedSnapshot, mode: SeekMode) -> Vec<Nearest> {
    if snapshot.is_empty() {
        return vec![Nearest::NONE; agents.len()];
    }
    agents
        .par_iter()
        .map(|a| seek(a.position, Some(a.id), snapshot, mode))
        .collect()
}
