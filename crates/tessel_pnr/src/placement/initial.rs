//! Initial placement.

use crate::mapping::Mapping;
use crate::placement::distance::Distance;
use crate::placement::maptable::{Location, MapTable};
use crate::placement::structure::SaStruct;
use crate::placement::PlaceError;
use rand::Rng;
use tessel_taskgraph::Taskgraph;

/// Places every node on a random free legal location.
///
/// Classes with the fewest legal locations go first, so tightly constrained
/// tasks are not crowded out by flexible ones.
pub(crate) fn random_placement<M, D, G>(sa: &mut SaStruct<M, D>, rng: &mut G) -> Result<(), PlaceError>
where
    M: MapTable,
    D: Distance,
    G: Rng + ?Sized,
{
    let num_classes = sa.map_table.num_classes();
    let mut members: Vec<Vec<usize>> = vec![Vec::new(); num_classes];
    for (i, n) in sa.nodes.iter().enumerate() {
        members[n.class].push(i);
    }

    let mut order: Vec<(usize, Vec<Location>)> = (0..num_classes)
        .map(|c| (c, sa.map_table.locations(c)))
        .collect();
    order.sort_by_key(|(c, locations)| (locations.len(), *c));

    for (class, locations) in order {
        let mut free: Vec<Location> = locations
            .into_iter()
            .filter(|&l| sa.occupant(l).is_none())
            .collect();
        let needed = members[class].len();
        if free.len() < needed {
            return Err(PlaceError::InsufficientResources {
                class,
                needed,
                available: free.len(),
            });
        }
        for &node in &members[class] {
            let location = free.swap_remove(rng.gen_range(0..free.len()));
            sa.place_node(node, location);
        }
    }
    Ok(())
}

/// Loads a complete, legal placement from an existing mapping.
///
/// Returns `false` and leaves the grid empty if any task is missing, sits on
/// a component that is not a placement slot, is illegal for its class, or
/// shares a slot with another task.
pub(crate) fn restore_placement<M, D>(sa: &mut SaStruct<M, D>, mapping: &Mapping, taskgraph: &Taskgraph) -> bool
where
    M: MapTable,
    D: Distance,
{
    let index = sa.location_index();
    for i in 0..sa.nodes.len() {
        let name = &taskgraph.node(sa.nodes[i].task).name;
        let location = mapping
            .location(name)
            .and_then(|c| index.get(&c).copied())
            .filter(|&l| sa.map_table.is_valid(sa.nodes[i].class, l))
            .filter(|&l| sa.occupant(l).is_none());
        match location {
            Some(l) => sa.place_node(i, l),
            None => {
                sa.clear_grid();
                return false;
            }
        }
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::placement::maptable::{FlatMapTable, SlottedMapTable};
    use crate::placement::testing::{line_map, line_struct, structure};
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use tessel_arch::Address;

    #[test]
    fn fills_every_address() {
        let mut sa = line_struct::<FlatMapTable>(5, 5);
        let mut rng = StdRng::seed_from_u64(0);
        random_placement(&mut sa, &mut rng).unwrap();
        assert!(sa.is_consistent());
        assert!(sa.grid.iter().flatten().all(|s| s.is_some()));
    }

    #[test]
    fn too_many_tasks() {
        let mut sa = line_struct::<SlottedMapTable>(3, 4);
        let mut rng = StdRng::seed_from_u64(0);
        let err = random_placement(&mut sa, &mut rng).unwrap_err();
        assert!(matches!(
            err,
            PlaceError::InsufficientResources {
                needed: 4,
                available: 3,
                ..
            }
        ));
    }

    #[test]
    fn restore_roundtrip() {
        let mut map = line_map(4, 3);
        let mut sa = structure::<FlatMapTable>(&map);
        let mut rng = StdRng::seed_from_u64(5);
        random_placement(&mut sa, &mut rng).unwrap();
        for (i, n) in sa.nodes.iter().enumerate() {
            let name = map.taskgraph.node(n.task).name.clone();
            map.mapping.nodes.insert(name, sa.component_of(i));
        }

        let mut restored = structure::<FlatMapTable>(&map);
        assert!(restore_placement(&mut restored, &map.mapping, &map.taskgraph));
        assert!(restored.is_consistent());
        for (a, b) in sa.nodes.iter().zip(&restored.nodes) {
            assert_eq!(a.location, b.location);
        }
    }

    #[test]
    fn restore_rejects_partial_mapping() {
        let mut map = line_map(4, 3);
        map.mapping
            .nodes
            .insert("n0".to_string(), map.architecture.component_at(&Address::from([0])).unwrap());
        let mut sa = structure::<FlatMapTable>(&map);
        assert!(!restore_placement(&mut sa, &map.mapping, &map.taskgraph));
        assert!(sa.grid.iter().flatten().all(|s| s.is_none()));
    }
}
