// grid.rs — Spatial hash index.
//
// Cell size = neighbor radius.  Key = hash(floor(position / radius)).
// Build: pass 1 computes every key in parallel, pass 2 inserts in parallel
// into a DashMap.  Each pass is a full barrier.  The map is then frozen into
// sorted buckets so readers never touch the concurrent structure.

use dashmap::DashMap;
use glam::{IVec3, Vec3};
use rayon::prelude::*;

/// Hashed integer cell coordinate.
pub type CellKey = u32;

/// One agent as seen by the index.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CellEntry {
    /// Position of the agent in the step's enumeration order.
    pub index: usize,
    pub position: Vec3,
    /// Heading or velocity, depending on the integration policy.
    pub motion: Vec3,
}

/// All entries that hashed into one key, ordered by `index`.
#[derive(Clone, Debug)]
pub struct Bucket {
    pub key: CellKey,
    pub entries: Vec<CellEntry>,
}

#[inline(always)]
pub fn cell_coord(position: Vec3, cell_size: f32) -> IVec3 {
    (position / cell_size).floor().as_ivec3()
}

/// Knuth multiplicative hash over the three cell coordinates.
#[inline(always)]
pub fn hash_cell(cell: IVec3) -> CellKey {
    let key = (cell.x as u32 as u64).wrapping_mul(2_654_435_761)
        ^ (cell.y as u32 as u64).wrapping_mul(2_246_822_519)
        ^ (cell.z as u32 as u64).wrapping_mul(3_266_489_917);
    (key.wrapping_mul(11_400_714_819_323_198_485) >> 32) as CellKey
}

#[inline(always)]
pub fn cell_key(position: Vec3, cell_size: f32) -> CellKey {
    hash_cell(cell_coord(position, cell_size))
}

/// Pass 1: one key per agent.  Pure per element.
pub fn compute_keys(positions: &[Vec3], cell_size: f32) -> Vec<CellKey> {
    positions
        .par_iter()
        .map(|&p| cell_key(p, cell_size))
        .collect()
}

/// Immutable multi-map from cell key to members.  Rebuilt every step.
#[derive(Clone, Debug)]
pub struct SpatialHashIndex {
    cell_size: f32,
    buckets: Vec<Bucket>,
    len: usize,
}

impl SpatialHashIndex {
    /// Build the index for one partition.  `positions` and `motions` are
    /// parallel arrays in enumeration order.
    pub fn build(positions: &[Vec3], motions: &[Vec3], cell_size: f32) -> Self {
        debug_assert_eq!(positions.len(), motions.len());

        // ── Pass 1: keys ─────────────────────────────────────────────────────
        let keys = compute_keys(positions, cell_size);

        // ── Pass 2: concurrent insertion ─────────────────────────────────────
        let map: DashMap<CellKey, Vec<CellEntry>> = DashMap::with_capacity(keys.len());
        keys.par_iter().enumerate().for_each(|(index, &key)| {
            map.entry(key).or_default().push(CellEntry {
                index,
                position: positions[index],
                motion: motions[index],
            });
        });

        Self::freeze(map, cell_size, positions.len())
    }

    /// Insertion order inside a bucket depends on scheduling; sorting by
    /// index makes every downstream sum reproducible.
    fn freeze(map: DashMap<CellKey, Vec<CellEntry>>, cell_size: f32, len: usize) -> Self {
        let mut buckets: Vec<Bucket> = map
            .into_iter()
            .map(|(key, entries)| Bucket { key, entries })
            .collect();
        buckets
            .par_iter_mut()
            .for_each(|b| b.entries.sort_unstable_by_key(|e| e.index));
        buckets.sort_unstable_by_key(|b| b.key);

        SpatialHashIndex {
            cell_size,
            buckets,
            len,
        }
    }

    pub fn cell_size(&self) -> f32 {
        self.cell_size
    }

    /// Number of indexed agents.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Number of distinct occupied keys.
    pub fn occupied_cells(&self) -> usize {
        self.buckets.len()
    }

    /// Occupied keys in ascending order.
    pub fn keys(&self) -> impl Iterator<Item = CellKey> + '_ {
        self.buckets.iter().map(|b| b.key)
    }

    pub fn buckets(&self) -> &[Bucket] {
        &self.buckets
    }

    pub fn members(&self, key: CellKey) -> &[CellEntry] {
        match self.buckets.binary_search_by_key(&key, |b| b.key) {
            Ok(i) => &self.buckets[i].entries,
            Err(_) => &[],
        }
    }

    /// Distinct keys of the 3×3×3 block of cells around `position`.
    /// Colliding cells collapse into one key so no bucket is visited twice.
    pub fn neighborhood_keys(&self, position: Vec3) -> Vec<CellKey> {
        let center = cell_coord(position, self.cell_size);
        let mut keys = Vec::with_capacity(27);
        for dz in -1..=1 {
            for dy in -1..=1 {
                for dx in -1..=1 {
                    let key = hash_cell(center + IVec3::new(dx, dy, dz));
                    if !keys.contains(&key) {
                        keys.push(key);
                    }
                }
            }
        }
        keys
    }
}
