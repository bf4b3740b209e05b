//! The mapping record: task placements and channel routes.

use petgraph::graphmap::DiGraphMap;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use tessel_arch::{ArchItem, ComponentId};
use tessel_taskgraph::{EdgeId, Taskgraph};

/// The resources one channel occupies, as a small directed graph.
///
/// Vertices are routing resources; arcs follow the direction data travels.
/// Branching encodes fan-out and merging encodes fan-in.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EdgeRoute {
    /// Resources used.
    pub vertices: BTreeSet<ArchItem>,
    /// Directed connections between used resources.
    pub arcs: BTreeSet<(ArchItem, ArchItem)>,
}

impl EdgeRoute {
    /// Returns `true` if the channel has no route.
    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    /// Adds a directed connection, inserting both endpoints.
    pub fn add_arc(&mut self, from: ArchItem, to: ArchItem) {
        self.vertices.insert(from);
        self.vertices.insert(to);
        self.arcs.insert((from, to));
    }

    /// Number of links the route uses.
    pub fn link_count(&self) -> usize {
        self.vertices
            .iter()
            .filter(|v| matches!(v, ArchItem::Link(_)))
            .count()
    }

    /// Builds a `petgraph` view for traversal.
    pub fn to_graph(&self) -> DiGraphMap<ArchItem, ()> {
        let mut g = DiGraphMap::new();
        for &v in &self.vertices {
            g.add_node(v);
        }
        for &(a, b) in &self.arcs {
            g.add_edge(a, b, ());
        }
        g
    }
}

/// The output of placement and routing.
///
/// `nodes` maps task names to the component each task is placed on.
/// `edges` holds one route per taskgraph edge, indexed by edge ID; edges that
/// are not routed (yet) hold an empty route.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Mapping {
    /// Task placements.
    pub nodes: BTreeMap<String, ComponentId>,
    /// Channel routes by edge index.
    pub edges: Vec<EdgeRoute>,
}

impl Mapping {
    /// Creates an empty record sized for a taskgraph.
    pub fn new(taskgraph: &Taskgraph) -> Self {
        Self {
            nodes: BTreeMap::new(),
            edges: vec![EdgeRoute::default(); taskgraph.num_edges()],
        }
    }

    /// Returns where a task is placed.
    pub fn location(&self, task: &str) -> Option<ComponentId> {
        self.nodes.get(task).copied()
    }

    /// Returns the route of a channel.
    pub fn route(&self, edge: EdgeId) -> &EdgeRoute {
        &self.edges[edge.index()]
    }

    /// Returns `true` if every task of the taskgraph has a location.
    pub fn is_fully_placed(&self, taskgraph: &Taskgraph) -> bool {
        taskgraph
            .nodes()
            .all(|(_, n)| self.nodes.contains_key(&n.name))
    }

    /// Clears all routes, keeping placements.
    pub fn clear_routes(&mut self) {
        for route in &mut self.edges {
            *route = EdgeRoute::default();
        }
    }
}
