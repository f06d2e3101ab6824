/// A set of dynamic bodies connected through contacts or joints, with the
/// constraints that connect them. Indices refer to the step's dense arrays.
#[derive(Debug, Default, Clone, PartialEq)]
pub(crate) struct Island {
    /// Slots of the dynamic bodies of the island, ascending
    pub bodies: Vec<usize>,

    /// Indices of the island's manifolds in the step manifold list
    pub manifolds: Vec<usize>,

    /// Indices of the island's joints in the step joint list
    pub joints: Vec<usize>,
}

/// Union-find over body slots.
///
/// Only dynamic bodies propagate connectivity: static and kinematic bodies
/// can touch several islands without merging them.
pub(crate) struct IslandBuilder {
    parent: Vec<usize>,
    rank: Vec<u8>,
}

impl IslandBuilder {
    pub fn new(nb_bodies: usize) -> Self {
        Self {
            parent: (0..nb_bodies).collect(),
            rank: vec![0; nb_bodies],
        }
    }

    fn find(&mut self, mut index: usize) -> usize {
        while self.parent[index] != index {
            self.parent[index] = self.parent[self.parent[index]];
            index = self.parent[index];
        }
        index
    }

    fn union(&mut self, a: usize, b: usize) {
        let root_a = self.find(a);
        let root_b = self.find(b);
        if root_a == root_b {
            return;
        }
        match self.rank[root_a].cmp(&self.rank[root_b]) {
            std::cmp::Ordering::Less => self.parent[root_a] = root_b,
            std::cmp::Ordering::Greater => self.parent[root_b] = root_a,
            std::cmp::Ordering::Equal => {
                self.parent[root_b] = root_a;
                self.rank[root_a] += 1;
            }
        }
    }

    /// Groups the dynamic slots into islands.
    ///
    /// `manifold_edges` and `joint_edges` hold the slots of the two bodies of
    /// each constraint. Islands come out ordered by their smallest body slot,
    /// and constraints keep their input order inside an island.
    pub fn build(
        mut self,
        is_dynamic: &[bool],
        manifold_edges: &[(usize, usize)],
        joint_edges: &[(usize, usize)],
    ) -> Vec<Island> {
        for &(a, b) in manifold_edges.iter().chain(joint_edges) {
            if is_dynamic[a] && is_dynamic[b] {
                self.union(a, b);
            }
        }

        let mut island_of_root = vec![usize::MAX; is_dynamic.len()];
        let mut islands: Vec<Island> = Vec::new();
        for slot in 0..is_dynamic.len() {
            if !is_dynamic[slot] {
                continue;
            }
            let root = self.find(slot);
            if island_of_root[root] == usize::MAX {
                island_of_root[root] = islands.len();
                islands.push(Island::default());
            }
            islands[island_of_root[root]].bodies.push(slot);
        }

        let island_of = |a: usize, b: usize, builder: &mut Self| -> Option<usize> {
            let slot = if is_dynamic[a] {
                a
            } else if is_dynamic[b] {
                b
            } else {
                return None;
            };
            Some(island_of_root[builder.find(slot)])
        };

        for (index, &(a, b)) in manifold_edges.iter().enumerate() {
            if let Some(island) = island_of(a, b, &mut self) {
                islands[island].manifolds.push(index);
            }
        }
        for (index, &(a, b)) in joint_edges.iter().enumerate() {
            if let Some(island) = island_of(a, b, &mut self) {
                islands[island].joints.push(index);
            }
        }

        islands
    }
}
