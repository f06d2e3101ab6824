use std::collections::{BTreeMap, BTreeSet, HashMap};

use crate::core::BodyHandle;
use crate::math::{Aabb, Vector3};
use crate::collision::BodyPair;

/// Pair changes reported by one broad-phase update
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BroadPhasePairs {
    /// Pairs whose bounds started overlapping
    pub added: Vec<BodyPair>,

    /// Pairs whose bounds stopped overlapping, or which lost one of their bodies
    pub removed: Vec<BodyPair>,

    /// Pairs that overlapped before and still do
    pub persisting: Vec<BodyPair>,
}

/// Conservative bounding-volume overlap test over the bodies of a world.
///
/// Implementations track one AABB per body and report pair changes in
/// canonical pair order.
pub trait BroadPhase: Send + Sync {
    /// Registers a body with its world bounds
    fn add_object(&mut self, body: BodyHandle, aabb: Aabb);

    /// Unregisters a body. Its pairs are reported as removed on the next update.
    fn remove_object(&mut self, body: BodyHandle);

    /// Moves the bounds of a registered body
    fn update_object(&mut self, body: BodyHandle, aabb: Aabb);

    /// Computes the pair changes since the previous call
    fn compute_pairs(&mut self) -> BroadPhasePairs;

    /// Number of registered bodies
    fn object_count(&self) -> usize;
}

/// Diffs the overlapping set of this update against the previous one
fn diff_pairs(previous: &BTreeSet<BodyPair>, current: &BTreeSet<BodyPair>) -> BroadPhasePairs {
    BroadPhasePairs {
        added: current.difference(previous).copied().collect(),
        removed: previous.difference(current).copied().collect(),
        persisting: current.intersection(previous).copied().collect(),
    }
}

/// Tests every pair of bodies. Fine for small worlds and as a reference.
#[derive(Debug, Default)]
pub struct BruteForceBroadPhase {
    objects: BTreeMap<BodyHandle, Aabb>,
    pairs: BTreeSet<BodyPair>,
}

impl BruteForceBroadPhase {
    pub fn new() -> Self {
        Self::default()
    }
}

impl BroadPhase for BruteForceBroadPhase {
    fn add_object(&mut self, body: BodyHandle, aabb: Aabb) {
        self.objects.insert(body, aabb);
    }

    fn remove_object(&mut self, body: BodyHandle) {
        self.objects.remove(&body);
    }

    fn update_object(&mut self, body: BodyHandle, aabb: Aabb) {
        if let Some(stored) = self.objects.get_mut(&body) {
            *stored = aabb;
        }
    }

    fn compute_pairs(&mut self) -> BroadPhasePairs {
        let objects: Vec<(BodyHandle, Aabb)> = self.objects.iter().map(|(h, a)| (*h, *a)).collect();
        let mut current = BTreeSet::new();
        for (i, (handle_a, aabb_a)) in objects.iter().enumerate() {
            for (handle_b, aabb_b) in &objects[i + 1..] {
                if aabb_a.intersects(aabb_b) {
                    current.insert(BodyPair::new(*handle_a, *handle_b));
                }
            }
        }
        let delta = diff_pairs(&self.pairs, &current);
        self.pairs = current;
        delta
    }

    fn object_count(&self) -> usize {
        self.objects.len()
    }
}

/// Bodies spanning more cells than this are tested against everything instead
const MAX_CELLS_PER_OBJECT: i64 = 4096;

type Cell = (i32, i32, i32);

/// Uniform grid broad phase.
///
/// Bounds are fattened by a small margin so that resting bodies keep their
/// pairs. Bodies too large for the grid are kept aside and tested against all
/// the others.
#[derive(Debug)]
pub struct SpatialHashing {
    cell_size: f32,
    aabb_margin: f32,
    objects: BTreeMap<BodyHandle, Aabb>,
    pairs: BTreeSet<BodyPair>,
}

impl SpatialHashing {
    /// Creates a grid with the given cell size
    ///
    /// # Panics
    ///
    /// Panics if `cell_size` is not strictly positive.
    pub fn new(cell_size: f32) -> Self {
        assert!(cell_size > 0.0, "cell size must be positive, got {}", cell_size);
        Self {
            cell_size,
            aabb_margin: 0.05,
            objects: BTreeMap::new(),
            pairs: BTreeSet::new(),
        }
    }

    fn cell_of(&self, position: &Vector3) -> Cell {
        (
            (position.x / self.cell_size).floor() as i32,
            (position.y / self.cell_size).floor() as i32,
            (position.z / self.cell_size).floor() as i32,
        )
    }

    fn cell_count(min: Cell, max: Cell) -> i64 {
        (max.0 as i64 - min.0 as i64 + 1)
            * (max.1 as i64 - min.1 as i64 + 1)
            * (max.2 as i64 - min.2 as i64 + 1)
    }
}

impl Default for SpatialHashing {
    fn default() -> Self {
        Self::new(4.0)
    }
}

impl BroadPhase for SpatialHashing {
    fn add_object(&mut self, body: BodyHandle, aabb: Aabb) {
        self.objects.insert(body, aabb.inflate(self.aabb_margin));
    }

    fn remove_object(&mut self, body: BodyHandle) {
        self.objects.remove(&body);
    }

    fn update_object(&mut self, body: BodyHandle, aabb: Aabb) {
        let fat = aabb.inflate(self.aabb_margin);
        if let Some(stored) = self.objects.get_mut(&body) {
            *stored = fat;
        }
    }

    fn compute_pairs(&mut self) -> BroadPhasePairs {
        let mut cells: HashMap<Cell, Vec<BodyHandle>> = HashMap::new();
        let mut oversized = Vec::new();

        for (handle, aabb) in &self.objects {
            let min = self.cell_of(&aabb.min);
            let max = self.cell_of(&aabb.max);
            if Self::cell_count(min, max) > MAX_CELLS_PER_OBJECT {
                oversized.push(*handle);
                continue;
            }
            for x in min.0..=max.0 {
                for y in min.1..=max.1 {
                    for z in min.2..=max.2 {
                        cells.entry((x, y, z)).or_default().push(*handle);
                    }
                }
            }
        }

        // Candidates go through a set, so the cell visiting order does not matter
        let mut current = BTreeSet::new();
        let overlap = |a: &BodyHandle, b: &BodyHandle| match (self.objects.get(a), self.objects.get(b)) {
            (Some(aabb_a), Some(aabb_b)) => aabb_a.intersects(aabb_b),
            _ => false,
        };

        for handles in cells.values() {
            for (i, a) in handles.iter().enumerate() {
                for b in &handles[i + 1..] {
                    if overlap(a, b) {
                        current.insert(BodyPair::new(*a, *b));
                    }
                }
            }
        }
        for big in &oversized {
            for other in self.objects.keys() {
                if other != big && overlap(big, other) {
                    current.insert(BodyPair::new(*big, *other));
                }
            }
        }

        let delta = diff_pairs(&self.pairs, &current);
        self.pairs = current;
        delta
    }

    fn object_count(&self) -> usize {
        self.objects.len()
    }
}
