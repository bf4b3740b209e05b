//! Move generators.
//!
//! A move generator proposes a new location for a node. Proposals are always
//! legal for the node's class and, unless the node is special, lie within
//! the current distance limit of the node's address.

use crate::placement::distance::Distance;
use crate::placement::maptable::{Location, MapTable};
use crate::placement::structure::SaStruct;
use rand::Rng;
use rayon::prelude::*;

/// Proposes candidate locations for annealing moves.
pub trait MoveGenerator: Sized + Sync {
    /// Builds the generator for a structure and initial distance limit.
    fn build<M: MapTable, D: Distance>(sa: &SaStruct<M, D>, limit: u32) -> Self;

    /// Adjusts to a new distance limit.
    fn update<M: MapTable, D: Distance>(&mut self, sa: &SaStruct<M, D>, limit: u32);

    /// Proposes a location for `node`, or `None` if there is nowhere to go.
    fn generate<M, D, G>(&self, sa: &SaStruct<M, D>, node: usize, rng: &mut G) -> Option<Location>
    where
        M: MapTable,
        D: Distance,
        G: Rng + ?Sized;
}

/// Picks a legal slot at `target`, avoiding the node's current slot.
fn pick_slot<M, D, G>(sa: &SaStruct<M, D>, node: usize, target: usize, rng: &mut G) -> Option<Location>
where
    M: MapTable,
    D: Distance,
    G: Rng + ?Sized,
{
    let n = &sa.nodes[node];
    let slots = sa.map_table.slots(n.class, target);
    if target != n.location.address() {
        if slots.is_empty() {
            return None;
        }
        let slot = slots[rng.gen_range(0..slots.len())];
        return Some(Location::new(target, slot as usize));
    }
    let others: Vec<u16> = slots.iter().copied().filter(|&s| s != n.location.slot).collect();
    if others.is_empty() {
        return None;
    }
    let slot = others[rng.gen_range(0..others.len())];
    Some(Location::new(target, slot as usize))
}

/// Legal target addresses for one class from one source address, sorted by
/// distance.
#[derive(Debug, Clone, Default)]
struct MoveLut {
    targets: Vec<u32>,
    /// `indices[d]` is the number of targets at distance `<= d`.
    indices: Vec<u32>,
}

impl MoveLut {
    fn build<M: MapTable, D: Distance>(sa: &SaStruct<M, D>, class: usize, source: usize) -> Self {
        let mut targets: Vec<(u32, u32)> = (0..sa.num_addresses())
            .filter(|&a| sa.map_table.has_address(class, a))
            .filter(|&a| a != source || sa.map_table.slots(class, a).len() > 1)
            .map(|a| (sa.distance.distance(source, a), a as u32))
            .collect();
        targets.sort();

        let furthest = targets.last().map_or(0, |&(d, _)| d as usize);
        let mut indices = vec![0u32; furthest + 1];
        for &(d, _) in &targets {
            indices[d as usize] += 1;
        }
        for d in 1..indices.len() {
            indices[d] += indices[d - 1];
        }

        Self {
            targets: targets.into_iter().map(|(_, a)| a).collect(),
            indices,
        }
    }

    fn bound(&self, limit: u32) -> usize {
        match self.indices.get(limit as usize) {
            Some(&n) => n as usize,
            None => self.targets.len(),
        }
    }
}

/// Precomputes, per class and source address, every legal target sorted by
/// distance, so a proposal is a single random index.
#[derive(Debug, Clone)]
pub struct CachedMoveGenerator {
    luts: Vec<Vec<MoveLut>>,
    limit: u32,
}

impl MoveGenerator for CachedMoveGenerator {
    fn build<M: MapTable, D: Distance>(sa: &SaStruct<M, D>, limit: u32) -> Self {
        let luts = (0..sa.map_table.num_classes())
            .into_par_iter()
            .map(|class| {
                (0..sa.num_addresses())
                    .map(|source| {
                        if sa.map_table.has_address(class, source) {
                            MoveLut::build(sa, class, source)
                        } else {
                            MoveLut::default()
                        }
                    })
                    .collect()
            })
            .collect();
        Self { luts, limit }
    }

    fn update<M: MapTable, D: Distance>(&mut self, _sa: &SaStruct<M, D>, limit: u32) {
        self.limit = limit;
    }

    fn generate<M, D, G>(&self, sa: &SaStruct<M, D>, node: usize, rng: &mut G) -> Option<Location>
    where
        M: MapTable,
        D: Distance,
        G: Rng + ?Sized,
    {
        let n = &sa.nodes[node];
        let lut = &self.luts[n.class][n.location.address()];
        let bound = if n.special {
            lut.targets.len()
        } else {
            lut.bound(self.limit)
        };
        if bound == 0 {
            return None;
        }
        let target = lut.targets[rng.gen_range(0..bound)] as usize;
        pick_slot(sa, node, target, rng)
    }
}

/// Scans all addresses on every proposal. No precomputation, so it suits
/// very large architectures where the cached tables would not fit.
#[derive(Debug, Clone)]
pub struct SearchMoveGenerator {
    limit: u32,
}

impl MoveGenerator for SearchMoveGenerator {
    fn build<M: MapTable, D: Distance>(_sa: &SaStruct<M, D>, limit: u32) -> Self {
        Self { limit }
    }

    fn update<M: MapTable, D: Distance>(&mut self, _sa: &SaStruct<M, D>, limit: u32) {
        self.limit = limit;
    }

    fn generate<M, D, G>(&self, sa: &SaStruct<M, D>, node: usize, rng: &mut G) -> Option<Location>
    where
        M: MapTable,
        D: Distance,
        G: Rng + ?Sized,
    {
        let n = &sa.nodes[node];
        let source = n.location.address();
        let mut chosen = None;
        let mut seen = 0usize;
        for a in 0..sa.num_addresses() {
            if !sa.map_table.has_address(n.class, a) {
                continue;
            }
            if a == source && sa.map_table.slots(n.class, a).len() < 2 {
                continue;
            }
            if !n.special && sa.distance.distance(source, a) > self.limit {
                continue;
            }
            seen += 1;
            if rng.gen_range(0..seen) == 0 {
                chosen = Some(a);
            }
        }
        pick_slot(sa, node, chosen?, rng)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::placement::maptable::SlottedMapTable;
    use crate::placement::testing::line_struct;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn check_proposals<G: MoveGenerator>(limit: u32) {
        let mut sa = line_struct::<SlottedMapTable>(6, 2);
        sa.place_node(0, Location::new(2, 0));
        sa.place_node(1, Location::new(5, 0));
        let gen = G::build(&sa, limit);
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..200 {
            let loc = gen.generate(&sa, 0, &mut rng).expect("a target exists");
            assert!(sa.map_table.is_valid(sa.nodes[0].class, loc));
            assert_ne!(loc, sa.nodes[0].location);
            let d = sa.distance.distance(2, loc.address());
            assert!(d <= limit, "distance {d} over limit {limit}");
        }
    }

    #[test]
    fn cached_respects_limit() {
        check_proposals::<CachedMoveGenerator>(1);
        check_proposals::<CachedMoveGenerator>(3);
    }

    #[test]
    fn search_respects_limit() {
        check_proposals::<SearchMoveGenerator>(1);
        check_proposals::<SearchMoveGenerator>(3);
    }

    #[test]
    fn cached_limit_update_widens_range() {
        let mut sa = line_struct::<SlottedMapTable>(6, 2);
        sa.place_node(0, Location::new(0, 0));
        sa.place_node(1, Location::new(5, 0));
        let mut gen = CachedMoveGenerator::build(&sa, 1);
        let mut rng = StdRng::seed_from_u64(1);
        let far = (0..200)
            .filter_map(|_| gen.generate(&sa, 0, &mut rng))
            .any(|l| l.address() > 1);
        assert!(!far);

        gen.update(&sa, 5);
        let far = (0..200)
            .filter_map(|_| gen.generate(&sa, 0, &mut rng))
            .any(|l| l.address() > 1);
        assert!(far);
    }

    #[test]
    fn single_address_yields_nothing() {
        let mut sa = line_struct::<SlottedMapTable>(1, 1);
        sa.place_node(0, Location::new(0, 0));
        let mut rng = StdRng::seed_from_u64(3);
        let gen = CachedMoveGenerator::build(&sa, 1);
        assert_eq!(gen.generate(&sa, 0, &mut rng), None);
        let gen = SearchMoveGenerator::build(&sa, 1);
        assert_eq!(gen.generate(&sa, 0, &mut rng), None);
    }

    #[test]
    fn special_nodes_ignore_limit() {
        let mut sa = line_struct::<SlottedMapTable>(6, 1);
        sa.place_node(0, Location::new(0, 0));
        sa.nodes[0].special = true;
        let gen = CachedMoveGenerator::build(&sa, 1);
        let mut rng = StdRng::seed_from_u64(11);
        let far = (0..300)
            .filter_map(|_| gen.generate(&sa, 0, &mut rng))
            .any(|l| l.address() >= 3);
        assert!(far);
    }
}
