//! Shortest-path search for a single channel.
//!
//! Routes one channel as a tree: the first sink is reached from the first
//! source's start vertices, later sinks are reached from anywhere on the tree
//! built so far, and extra sources are then joined onto the tree. Vertex cost
//! comes from the [`CongestionMap`]; vertices the rule set forbids for the
//! channel are never entered.

use crate::routing::channels::RoutingChannel;
use crate::routing::congestion::CongestionMap;
use crate::routing::graph::{resource, RoutingGraph};
use crate::routing::RouteError;
use crate::ruleset::RuleSet;
use petgraph::graph::NodeIndex;
use std::cmp::Ordering;
use std::collections::{BTreeSet, BinaryHeap};
use tessel_arch::Architecture;
use tessel_taskgraph::TaskgraphEdge;

/// A search frontier entry.
#[derive(Debug, Clone, Copy)]
struct SearchState {
    vertex: NodeIndex,
    cost: f64,
}

impl PartialEq for SearchState {
    fn eq(&self, other: &Self) -> bool {
        self.cost == other.cost
    }
}

impl Eq for SearchState {}

impl Ord for SearchState {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reverse order for min-heap
        other
            .cost
            .partial_cmp(&self.cost)
            .unwrap_or(Ordering::Equal)
            .then_with(|| other.vertex.cmp(&self.vertex))
    }
}

impl PartialOrd for SearchState {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// The vertices and arcs one channel occupies.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RouteTree {
    /// Occupied vertices.
    pub vertices: BTreeSet<NodeIndex>,
    /// Arcs between occupied vertices, in data-flow direction.
    pub arcs: BTreeSet<(NodeIndex, NodeIndex)>,
}

impl RouteTree {
    fn add_path(&mut self, path: &[NodeIndex]) {
        self.vertices.extend(path.iter().copied());
        for pair in path.windows(2) {
            self.arcs.insert((pair[0], pair[1]));
        }
    }
}

struct Search<'a, R> {
    rules: &'a R,
    arch: &'a Architecture,
    graph: &'a RoutingGraph,
    congestion: &'a CongestionMap,
    edge: &'a TaskgraphEdge,
}

impl<R: RuleSet> Search<'_, R> {
    fn usable(&self, v: NodeIndex) -> bool {
        self.rules.can_use(self.edge, resource(self.arch, self.graph.item(v)))
    }

    fn cost(&self, v: NodeIndex, tree: &RouteTree) -> f64 {
        if tree.vertices.contains(&v) {
            0.0
        } else {
            self.congestion.resource_cost(v.index(), self.graph.link(v))
        }
    }

    /// Cheapest path from any seed to any target, seeds first.
    fn shortest_path(
        &self,
        seeds: &[NodeIndex],
        is_target: impl Fn(NodeIndex) -> bool,
        tree: &RouteTree,
    ) -> Option<Vec<NodeIndex>> {
        let n = self.graph.len();
        let mut dist = vec![f64::INFINITY; n];
        let mut prev: Vec<Option<NodeIndex>> = vec![None; n];
        let mut open = BinaryHeap::new();

        for &s in seeds {
            if !self.usable(s) {
                continue;
            }
            let cost = self.cost(s, tree);
            if cost < dist[s.index()] {
                dist[s.index()] = cost;
                open.push(SearchState { vertex: s, cost });
            }
        }

        while let Some(current) = open.pop() {
            if current.cost > dist[current.vertex.index()] {
                continue; // Stale entry
            }
            if is_target(current.vertex) {
                let mut path = vec![current.vertex];
                let mut v = current.vertex;
                while let Some(p) = prev[v.index()] {
                    path.push(p);
                    v = p;
                }
                path.reverse();
                return Some(path);
            }
            for next in self.graph.successors(current.vertex) {
                if !self.usable(next) {
                    continue;
                }
                let tentative = current.cost + self.cost(next, tree);
                if tentative < dist[next.index()] {
                    dist[next.index()] = tentative;
                    prev[next.index()] = Some(current.vertex);
                    open.push(SearchState {
                        vertex: next,
                        cost: tentative,
                    });
                }
            }
        }
        None
    }
}

/// Routes one channel against the current congestion state.
pub fn route_channel<R: RuleSet>(
    rules: &R,
    arch: &Architecture,
    graph: &RoutingGraph,
    congestion: &CongestionMap,
    edge: &TaskgraphEdge,
    channel: &RoutingChannel,
) -> Result<RouteTree, RouteError> {
    let search = Search {
        rules,
        arch,
        graph,
        congestion,
        edge,
    };
    let unroutable = || RouteError::Unroutable {
        edge: channel.edge.index(),
    };
    let mut tree = RouteTree::default();

    let first = channel.starts.first().ok_or_else(unroutable)?;
    for stops in &channel.stops {
        let seeds: Vec<NodeIndex> = if tree.vertices.is_empty() {
            first.clone()
        } else {
            tree.vertices.iter().copied().collect()
        };
        let path = search
            .shortest_path(&seeds, |v| stops.contains(&v), &tree)
            .ok_or_else(unroutable)?;
        tree.add_path(&path);
    }
    for starts in channel.starts.iter().skip(1) {
        let joined = tree.vertices.clone();
        let path = search
            .shortest_path(starts, |v| joined.contains(&v), &tree)
            .ok_or_else(unroutable)?;
        tree.add_path(&path);
    }
    Ok(tree)
}
