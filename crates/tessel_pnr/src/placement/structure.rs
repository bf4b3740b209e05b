//! The flattened placement working structure.
//!
//! Tasks become [`SaNode`]s and taskgraph edges become [`SaChannel`]s, all
//! addressed by plain indices so the annealing loop never touches the
//! taskgraph or architecture hash maps.

use crate::placement::distance::Distance;
use crate::placement::maptable::{Location, MapTable};
use crate::placement::PlaceError;
use crate::ruleset::RuleSet;
use std::collections::HashMap;
use tessel_arch::{Address, Architecture, ComponentId};
use tessel_taskgraph::{EdgeId, NodeId, Taskgraph};

/// One placeable task.
#[derive(Debug, Clone)]
pub struct SaNode {
    /// The task this node stands for.
    pub task: NodeId,
    /// Current location.
    pub location: Location,
    /// Equivalence class.
    pub class: usize,
    /// Ignores the move distance limit.
    pub special: bool,
    /// Channels this node drives.
    pub out_channels: Vec<usize>,
    /// Channels this node consumes.
    pub in_channels: Vec<usize>,
}

/// One taskgraph edge, by node index.
#[derive(Debug, Clone)]
pub enum SaChannel {
    /// Single source, single sink.
    Two {
        /// Taskgraph edge.
        edge: EdgeId,
        /// Source node index.
        source: usize,
        /// Sink node index.
        sink: usize,
    },
    /// Any other shape.
    Multi {
        /// Taskgraph edge.
        edge: EdgeId,
        /// Source node indices.
        sources: Vec<usize>,
        /// Sink node indices.
        sinks: Vec<usize>,
    },
}

impl SaChannel {
    /// The taskgraph edge this channel mirrors.
    pub fn edge(&self) -> EdgeId {
        match self {
            SaChannel::Two { edge, .. } | SaChannel::Multi { edge, .. } => *edge,
        }
    }
}

/// Architecture-side layout and task classes, independent of the map-table
/// representation.
#[derive(Debug, Clone)]
pub(crate) struct Layout {
    pub(crate) addresses: Vec<Address>,
    pub(crate) slots: Vec<Vec<ComponentId>>,
    pub(crate) node_class: Vec<usize>,
    pub(crate) class_reps: Vec<NodeId>,
    pub(crate) legal: Vec<Vec<Vec<bool>>>,
}

impl Layout {
    /// Collects mappable slots per address and groups tasks into classes.
    ///
    /// Tasks share a class when the rule set calls them equivalent and they
    /// have exactly the same legal slots.
    pub(crate) fn build<R: RuleSet>(
        rules: &R,
        arch: &Architecture,
        taskgraph: &Taskgraph,
    ) -> Result<Self, PlaceError> {
        let addresses: Vec<Address> = arch.addresses().cloned().collect();
        let slots: Vec<Vec<ComponentId>> = addresses
            .iter()
            .map(|a| {
                arch.component_at(a)
                    .map(|top| {
                        arch.walk(top)
                            .into_iter()
                            .filter(|&c| rules.is_mappable(arch.component(c)))
                            .collect()
                    })
                    .unwrap_or_default()
            })
            .collect();

        let mut node_class = Vec::with_capacity(taskgraph.num_nodes());
        let mut class_reps: Vec<NodeId> = Vec::new();
        let mut legal: Vec<Vec<Vec<bool>>> = Vec::new();

        for (id, node) in taskgraph.nodes() {
            let signature: Vec<Vec<bool>> = slots
                .iter()
                .map(|at| {
                    at.iter()
                        .map(|&c| rules.can_map(node, arch.component(c)))
                        .collect()
                })
                .collect();

            let existing = class_reps.iter().zip(&legal).position(|(&rep, sig)| {
                *sig == signature && rules.is_equivalent(taskgraph.node(rep), node)
            });
            let class = match existing {
                Some(class) => class,
                None => {
                    if !signature.iter().flatten().any(|&ok| ok) {
                        return Err(PlaceError::NoLegalLocation {
                            task: node.name.clone(),
                            class: class_reps.len(),
                        });
                    }
                    class_reps.push(id);
                    legal.push(signature);
                    class_reps.len() - 1
                }
            };
            node_class.push(class);
        }

        Ok(Self {
            addresses,
            slots,
            node_class,
            class_reps,
            legal,
        })
    }

    /// Whether every address holds at most one mappable slot.
    pub(crate) fn is_flat(&self) -> bool {
        self.slots.iter().all(|s| s.len() <= 1)
    }
}

/// The annealing working structure.
#[derive(Debug, Clone)]
pub struct SaStruct<M, D> {
    /// Placeable tasks.
    pub nodes: Vec<SaNode>,
    /// Channels between nodes.
    pub channels: Vec<SaChannel>,
    /// Per-class legality.
    pub map_table: M,
    /// Address distance metric.
    pub distance: D,
    /// Occupant of each (address, slot).
    pub grid: Vec<Vec<Option<usize>>>,
    /// Sorted top-level addresses.
    pub addresses: Vec<Address>,
    /// Mappable component at each (address, slot).
    pub slots: Vec<Vec<ComponentId>>,
    /// Per-node address cost, indexed by flattened slot.
    address_costs: Option<Vec<Vec<f64>>>,
    slot_offsets: Vec<usize>,
}

impl<M: MapTable, D: Distance> SaStruct<M, D> {
    /// Builds the structure with every node unplaced at location `(0, 0)`.
    ///
    /// The grid is empty until [`place_node`](Self::place_node) is called
    /// for each node.
    pub(crate) fn new<R: RuleSet>(
        rules: &R,
        arch: &Architecture,
        taskgraph: &Taskgraph,
        layout: Layout,
        distance: D,
        enable_address: bool,
    ) -> Self {
        let map_table = M::from_legality(&layout.legal);

        let mut nodes: Vec<SaNode> = taskgraph
            .nodes()
            .map(|(id, node)| SaNode {
                task: id,
                location: Location::new(0, 0),
                class: layout.node_class[id.index()],
                special: rules.is_special(node),
                out_channels: Vec::new(),
                in_channels: Vec::new(),
            })
            .collect();

        let mut channels = Vec::with_capacity(taskgraph.num_edges());
        for (edge, e) in taskgraph.edges() {
            let index = channels.len();
            for s in &e.sources {
                nodes[s.index()].out_channels.push(index);
            }
            for t in &e.sinks {
                nodes[t.index()].in_channels.push(index);
            }
            let channel = match (e.sources.as_slice(), e.sinks.as_slice()) {
                ([s], [t]) => SaChannel::Two {
                    edge,
                    source: s.index(),
                    sink: t.index(),
                },
                _ => SaChannel::Multi {
                    edge,
                    sources: e.sources.iter().map(|n| n.index()).collect(),
                    sinks: e.sinks.iter().map(|n| n.index()).collect(),
                },
            };
            channels.push(channel);
        }

        let mut slot_offsets = Vec::with_capacity(layout.slots.len());
        let mut total = 0;
        for s in &layout.slots {
            slot_offsets.push(total);
            total += s.len();
        }

        // Rows are per task: equivalent tasks may still prefer different addresses.
        let address_costs = enable_address.then(|| {
            taskgraph
                .nodes()
                .map(|(_, node)| {
                    layout
                        .slots
                        .iter()
                        .flatten()
                        .map(|&c| rules.address_cost(node, arch.component(c)))
                        .collect()
                })
                .collect()
        });

        let grid = layout.slots.iter().map(|s| vec![None; s.len()]).collect();

        Self {
            nodes,
            channels,
            map_table,
            distance,
            grid,
            addresses: layout.addresses,
            slots: layout.slots,
            address_costs,
            slot_offsets,
        }
    }

    /// Number of addresses.
    pub fn num_addresses(&self) -> usize {
        self.addresses.len()
    }

    /// Node occupying a location.
    pub fn occupant(&self, location: Location) -> Option<usize> {
        self.grid[location.address()][location.slot as usize]
    }

    /// Address index of a node.
    pub fn address_of(&self, node: usize) -> usize {
        self.nodes[node].location.address()
    }

    /// Component a node currently sits on.
    pub fn component_of(&self, node: usize) -> ComponentId {
        let loc = self.nodes[node].location;
        self.slots[loc.address()][loc.slot as usize]
    }

    /// Puts an unplaced node on a free, legal location.
    pub(crate) fn place_node(&mut self, node: usize, location: Location) {
        assert!(
            self.map_table.is_valid(self.nodes[node].class, location),
            "illegal initial location"
        );
        assert!(self.occupant(location).is_none(), "location already occupied");
        self.nodes[node].location = location;
        self.grid[location.address()][location.slot as usize] = Some(node);
    }

    /// Empties the grid, leaving node locations stale until they are placed
    /// again.
    pub(crate) fn clear_grid(&mut self) {
        for slots in &mut self.grid {
            slots.iter_mut().for_each(|s| *s = None);
        }
    }

    /// Relocates a node to a free location.
    pub fn move_node(&mut self, node: usize, to: Location) {
        debug_assert!(self.map_table.is_valid(self.nodes[node].class, to));
        debug_assert!(self.occupant(to).is_none());
        let from = self.nodes[node].location;
        self.grid[from.address()][from.slot as usize] = None;
        self.grid[to.address()][to.slot as usize] = Some(node);
        self.nodes[node].location = to;
    }

    /// Exchanges the locations of two nodes.
    pub fn swap_nodes(&mut self, a: usize, b: usize) {
        let la = self.nodes[a].location;
        let lb = self.nodes[b].location;
        debug_assert!(self.map_table.is_valid(self.nodes[a].class, lb));
        debug_assert!(self.map_table.is_valid(self.nodes[b].class, la));
        self.nodes[a].location = lb;
        self.nodes[b].location = la;
        self.grid[lb.address()][lb.slot as usize] = Some(a);
        self.grid[la.address()][la.slot as usize] = Some(b);
    }

    /// Whether every node sits on a legal location and the grid agrees.
    pub fn is_consistent(&self) -> bool {
        self.nodes.iter().enumerate().all(|(i, n)| {
            self.map_table.is_valid(n.class, n.location) && self.occupant(n.location) == Some(i)
        })
    }

    /// Address cost of a node at its current location; zero when disabled.
    pub(crate) fn address_cost(&self, node: usize) -> f64 {
        match &self.address_costs {
            Some(costs) => {
                let loc = self.nodes[node].location;
                costs[node][self.slot_offsets[loc.address()] + loc.slot as usize]
            }
            None => 0.0,
        }
    }

    /// Approximate heap footprint in bytes.
    pub fn approx_bytes(&self) -> usize {
        use std::mem::size_of;
        let nodes: usize = self
            .nodes
            .iter()
            .map(|n| size_of::<SaNode>() + (n.in_channels.len() + n.out_channels.len()) * size_of::<usize>())
            .sum();
        let channels: usize = self
            .channels
            .iter()
            .map(|c| match c {
                SaChannel::Two { .. } => size_of::<SaChannel>(),
                SaChannel::Multi { sources, sinks, .. } => {
                    size_of::<SaChannel>() + (sources.len() + sinks.len()) * size_of::<usize>()
                }
            })
            .sum();
        let grid: usize = self.grid.iter().map(|g| g.len() * size_of::<Option<usize>>()).sum();
        let addresses = self.num_addresses() * self.num_addresses() * size_of::<u32>();
        nodes + channels + grid + addresses
    }

    /// Read-only view for aux cost evaluation.
    pub fn view(&self) -> PlacementView<'_> {
        PlacementView {
            nodes: &self.nodes,
            addresses: &self.addresses,
        }
    }

    /// Looks up the location of every mappable component.
    pub(crate) fn location_index(&self) -> HashMap<ComponentId, Location> {
        self.slots
            .iter()
            .enumerate()
            .flat_map(|(a, s)| {
                s.iter()
                    .enumerate()
                    .map(move |(slot, &c)| (c, Location::new(a, slot)))
            })
            .collect()
    }
}

/// The current placement as seen by [`RuleSet::aux_cost`].
#[derive(Debug, Clone, Copy)]
pub struct PlacementView<'a> {
    nodes: &'a [SaNode],
    addresses: &'a [Address],
}

impl<'a> PlacementView<'a> {
    /// Number of placed tasks.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Returns `true` if there are no tasks.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Iterates over `(task, address)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (NodeId, &'a Address)> + 'a {
        let addresses = self.addresses;
        self.nodes
            .iter()
            .map(move |n| (n.task, &addresses[n.location.address()]))
    }

    /// Address of the task stored at node index `i`.
    pub fn address(&self, i: usize) -> &'a Address {
        &self.addresses[self.nodes[i].location.address()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::map::Map;
    use crate::placement::cost::objective;
    use crate::placement::maptable::FlatMapTable;
    use crate::placement::testing::{line_arch, line_struct, locations, place_at, preference_map, structure_with};
    use crate::ruleset::DefaultRules;

    #[test]
    fn relocation_changes_one_location() {
        let mut sa = line_struct::<FlatMapTable>(5, 3);
        place_at(&mut sa, &[0, 1, 2]);
        sa.move_node(1, Location::new(4, 0));

        assert_eq!(locations(&sa), vec![0, 4, 2]);
        assert_eq!(sa.occupant(Location::new(1, 0)), None);
        assert_eq!(sa.occupant(Location::new(4, 0)), Some(1));
        assert!(sa.is_consistent());
    }

    #[test]
    fn swap_exchanges_two_locations() {
        let mut sa = line_struct::<FlatMapTable>(5, 4);
        place_at(&mut sa, &[0, 1, 2, 3]);
        sa.swap_nodes(0, 3);

        assert_eq!(locations(&sa), vec![3, 1, 2, 0]);
        assert_eq!(sa.occupant(Location::new(0, 0)), Some(3));
        assert_eq!(sa.occupant(Location::new(3, 0)), Some(0));
        assert_eq!(sa.occupant(Location::new(4, 0)), None);
        assert!(sa.is_consistent());

        sa.swap_nodes(0, 3);
        assert_eq!(locations(&sa), vec![0, 1, 2, 3]);
    }

    #[test]
    fn equivalent_tasks_keep_their_own_address_costs() {
        let map = preference_map();
        let layout = Layout::build(&map.rules, &map.architecture, &map.taskgraph).unwrap();
        assert_eq!(layout.class_reps.len(), 1);

        let mut sa = structure_with::<_, FlatMapTable>(&map, true);
        place_at(&mut sa, &[0, 1]);
        assert_eq!(sa.address_cost(0), 0.0);
        assert_eq!(sa.address_cost(1), 0.0);
        assert_eq!(objective(&map.rules, &map.taskgraph, &sa), 0.0);

        sa.swap_nodes(0, 1);
        assert_eq!(sa.address_cost(0), 10.0);
        assert_eq!(sa.address_cost(1), 10.0);
        assert_eq!(objective(&map.rules, &map.taskgraph, &sa), 20.0);
    }

    #[test]
    fn address_costs_are_zero_when_disabled() {
        let map = preference_map();
        let mut sa = structure_with::<_, FlatMapTable>(&map, false);
        place_at(&mut sa, &[1, 0]);
        assert_eq!(sa.address_cost(0), 0.0);
        assert_eq!(objective(&map.rules, &map.taskgraph, &sa), 0.0);
    }

    #[test]
    fn shared_endpoints_are_listed_per_direction() {
        let mut tg = Taskgraph::new("loop");
        for n in ["a", "b", "c"] {
            tg.add_node(n).unwrap();
        }
        tg.add_edge(&["a", "b"], &["a", "c"]).unwrap();
        tg.add_edge(&["b"], &["c"]).unwrap();
        let map = Map::new(DefaultRules, line_arch(3), tg);
        let sa = structure_with::<_, FlatMapTable>(&map, false);

        assert_eq!(sa.nodes[0].out_channels, vec![0]);
        assert_eq!(sa.nodes[0].in_channels, vec![0]);
        assert_eq!(sa.nodes[1].out_channels, vec![0, 1]);
        assert!(matches!(sa.channels[0], SaChannel::Multi { .. }));
        assert!(matches!(sa.channels[1], SaChannel::Two { source: 1, sink: 2, .. }));
    }
}
