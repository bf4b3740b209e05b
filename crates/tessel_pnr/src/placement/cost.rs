//! Placement cost evaluation.
//!
//! Cost is the sum of channel costs, plus per-node address costs when
//! enabled, plus the rule set's aux cost. Moves are evaluated by costing
//! only the channels touching the moved nodes before and after the move.

use crate::placement::distance::Distance;
use crate::placement::maptable::MapTable;
use crate::placement::structure::{SaChannel, SaStruct};
use crate::ruleset::RuleSet;
use tessel_taskgraph::Taskgraph;

/// Cost of one channel under the current placement.
pub fn channel_cost<R, M, D>(rules: &R, taskgraph: &Taskgraph, sa: &SaStruct<M, D>, channel: usize) -> f64
where
    R: RuleSet,
    M: MapTable,
    D: Distance,
{
    let ch = &sa.channels[channel];
    let edge = taskgraph.edge(ch.edge());
    match ch {
        SaChannel::Two { source, sink, .. } => {
            let d = sa.distance.distance(sa.address_of(*source), sa.address_of(*sink));
            rules.channel_cost(edge, std::iter::once(d))
        }
        SaChannel::Multi { sources, sinks, .. } => {
            let distances = sources.iter().flat_map(|&s| {
                sinks
                    .iter()
                    .map(move |&t| sa.distance.distance(sa.address_of(s), sa.address_of(t)))
            });
            rules.channel_cost(edge, distances)
        }
    }
}

/// Cost attributable to one node: its channels, its address cost, and the
/// global aux cost.
pub fn node_cost<R, M, D>(rules: &R, taskgraph: &Taskgraph, sa: &SaStruct<M, D>, node: usize) -> f64
where
    R: RuleSet,
    M: MapTable,
    D: Distance,
{
    let n = &sa.nodes[node];
    // A node both driving and consuming a channel still pays for it once.
    let channels: f64 = n
        .out_channels
        .iter()
        .chain(n.in_channels.iter().filter(|&&c| !n.out_channels.contains(&c)))
        .map(|&c| channel_cost(rules, taskgraph, sa, c))
        .sum();
    channels + sa.address_cost(node) + rules.aux_cost(&sa.view())
}

/// Cost attributable to two nodes, counting channels they share once.
pub fn node_pair_cost<R, M, D>(
    rules: &R,
    taskgraph: &Taskgraph,
    sa: &SaStruct<M, D>,
    a: usize,
    b: usize,
) -> f64
where
    R: RuleSet,
    M: MapTable,
    D: Distance,
{
    let mut touched: Vec<usize> = [a, b]
        .iter()
        .flat_map(|&n| {
            sa.nodes[n]
                .out_channels
                .iter()
                .chain(&sa.nodes[n].in_channels)
                .copied()
        })
        .collect();
    touched.sort_unstable();
    touched.dedup();

    let channels: f64 = touched
        .into_iter()
        .map(|c| channel_cost(rules, taskgraph, sa, c))
        .sum();
    channels + sa.address_cost(a) + sa.address_cost(b) + rules.aux_cost(&sa.view())
}

/// Total objective of the current placement.
pub fn objective<R, M, D>(rules: &R, taskgraph: &Taskgraph, sa: &SaStruct<M, D>) -> f64
where
    R: RuleSet,
    M: MapTable,
    D: Distance,
{
    let channels: f64 = (0..sa.channels.len())
        .map(|c| channel_cost(rules, taskgraph, sa, c))
        .sum();
    let addresses: f64 = (0..sa.nodes.len()).map(|n| sa.address_cost(n)).sum();
    channels + addresses + rules.aux_cost(&sa.view())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::map::Map;
    use crate::placement::maptable::{FlatMapTable, Location};
    use crate::placement::testing::{line_arch, line_map, place_at, structure};
    use crate::ruleset::DefaultRules;

    #[test]
    fn channel_cost_is_hop_distance() {
        let map = line_map(5, 3);
        let mut sa = structure::<FlatMapTable>(&map);
        place_at(&mut sa, &[0, 1, 4]);

        assert_eq!(channel_cost(&map.rules, &map.taskgraph, &sa, 0), 1.0);
        assert_eq!(channel_cost(&map.rules, &map.taskgraph, &sa, 1), 3.0);
        assert_eq!(node_cost(&map.rules, &map.taskgraph, &sa, 0), 1.0);
        assert_eq!(node_cost(&map.rules, &map.taskgraph, &sa, 1), 4.0);
        assert_eq!(objective(&map.rules, &map.taskgraph, &sa), 4.0);
    }

    #[test]
    fn swap_delta_matches_objective_delta_across_shared_channel() {
        let map = line_map(5, 3);
        let mut sa = structure::<FlatMapTable>(&map);
        place_at(&mut sa, &[0, 1, 4]);

        let pair_before = node_pair_cost(&map.rules, &map.taskgraph, &sa, 1, 2);
        let total_before = objective(&map.rules, &map.taskgraph, &sa);
        sa.swap_nodes(1, 2);
        let pair_after = node_pair_cost(&map.rules, &map.taskgraph, &sa, 1, 2);
        let total_after = objective(&map.rules, &map.taskgraph, &sa);

        assert_eq!(pair_before, 4.0);
        assert_eq!(total_after, 7.0);
        assert_eq!(pair_after - pair_before, total_after - total_before);
    }

    #[test]
    fn pair_cost_counts_shared_channel_once() {
        let map = line_map(5, 2);
        let mut sa = structure::<FlatMapTable>(&map);
        place_at(&mut sa, &[0, 3]);
        assert_eq!(node_pair_cost(&map.rules, &map.taskgraph, &sa, 0, 1), 3.0);
        assert_eq!(
            node_cost(&map.rules, &map.taskgraph, &sa, 0) + node_cost(&map.rules, &map.taskgraph, &sa, 1),
            6.0
        );
    }

    #[test]
    fn node_on_both_ends_of_a_channel_pays_once() {
        let mut tg = Taskgraph::new("loop");
        for n in ["a", "b", "c"] {
            tg.add_node(n).unwrap();
        }
        tg.add_edge(&["a", "b"], &["a", "c"]).unwrap();
        let map = Map::new(DefaultRules, line_arch(5), tg);
        let mut sa = structure::<FlatMapTable>(&map);
        place_at(&mut sa, &[0, 1, 2]);

        // a->a 0, a->c 2, b->a 1, b->c 1
        assert_eq!(node_cost(&map.rules, &map.taskgraph, &sa, 0), 4.0);
        assert_eq!(objective(&map.rules, &map.taskgraph, &sa), 4.0);

        let node_before = node_cost(&map.rules, &map.taskgraph, &sa, 0);
        let total_before = objective(&map.rules, &map.taskgraph, &sa);
        sa.move_node(0, Location::new(4, 0));
        let node_after = node_cost(&map.rules, &map.taskgraph, &sa, 0);
        let total_after = objective(&map.rules, &map.taskgraph, &sa);

        assert_eq!(node_after - node_before, total_after - total_before);
    }
}
