//! The routing-resource graph.
//!
//! Vertices are every port and link of the architecture plus one switch
//! vertex per routing fabric component. Arcs follow data flow: a link's
//! source ports feed the link, the link feeds its destination ports, and a
//! fabric component connects each of its input ports to each of its output
//! ports through its switch vertex.

use crate::routing::links::RoutingLink;
use crate::ruleset::{Resource, RuleSet};
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::Direction;
use std::collections::HashMap;
use tessel_arch::{ArchItem, Architecture, PortClass};

/// Looks up the rule-set view of an architecture item.
pub fn resource(arch: &Architecture, item: ArchItem) -> Resource<'_> {
    match item {
        ArchItem::Port(p) => Resource::Port(arch.port(p)),
        ArchItem::Link(l) => Resource::Link(arch.link(l)),
        ArchItem::Component(c) => Resource::Component(arch.component(c)),
    }
}

/// Routing resources, their connectivity, and their annotations.
#[derive(Debug, Clone)]
pub struct RoutingGraph {
    graph: DiGraph<ArchItem, ()>,
    index: HashMap<ArchItem, NodeIndex>,
    links: Vec<RoutingLink>,
}

impl RoutingGraph {
    /// Builds the graph for an architecture.
    pub fn build<R: RuleSet>(rules: &R, arch: &Architecture) -> Self {
        let mut graph = DiGraph::new();
        let mut index = HashMap::new();

        let mut vertex = |graph: &mut DiGraph<ArchItem, ()>, item: ArchItem| {
            *index.entry(item).or_insert_with(|| graph.add_node(item))
        };

        for (id, link) in arch.links() {
            let l = vertex(&mut graph, ArchItem::Link(id));
            for &p in &link.sources {
                let p = vertex(&mut graph, ArchItem::Port(p));
                graph.add_edge(p, l, ());
            }
            for &p in &link.dests {
                let p = vertex(&mut graph, ArchItem::Port(p));
                graph.add_edge(l, p, ());
            }
        }
        for (id, component) in arch.components() {
            if !rules.is_routing_fabric(component) {
                continue;
            }
            let c = vertex(&mut graph, ArchItem::Component(id));
            for &p in &component.ports {
                let v = vertex(&mut graph, ArchItem::Port(p));
                match arch.port(p).class {
                    PortClass::Input => graph.add_edge(v, c, ()),
                    PortClass::Output => graph.add_edge(c, v, ()),
                };
            }
        }
        for (id, _) in arch.ports() {
            vertex(&mut graph, ArchItem::Port(id));
        }

        let links = graph
            .node_indices()
            .map(|v| rules.annotate(resource(arch, graph[v])))
            .collect();

        Self { graph, index, links }
    }

    /// Number of vertices.
    pub fn len(&self) -> usize {
        self.graph.node_count()
    }

    /// Returns `true` if the graph has no vertices.
    pub fn is_empty(&self) -> bool {
        self.graph.node_count() == 0
    }

    /// Vertex of an architecture item.
    pub fn vertex(&self, item: ArchItem) -> Option<NodeIndex> {
        self.index.get(&item).copied()
    }

    /// Architecture item of a vertex.
    pub fn item(&self, v: NodeIndex) -> ArchItem {
        self.graph[v]
    }

    /// Successors of a vertex.
    pub fn successors(&self, v: NodeIndex) -> impl Iterator<Item = NodeIndex> + '_ {
        self.graph.neighbors_directed(v, Direction::Outgoing)
    }

    /// Whether the graph has an arc `a -> b`.
    pub fn has_arc(&self, a: NodeIndex, b: NodeIndex) -> bool {
        self.graph.contains_edge(a, b)
    }

    /// Annotation of a vertex.
    pub fn link(&self, v: NodeIndex) -> &RoutingLink {
        &self.links[v.index()]
    }

    pub(crate) fn link_mut(&mut self, v: NodeIndex) -> &mut RoutingLink {
        &mut self.links[v.index()]
    }

    /// Annotations of every vertex, indexed by vertex.
    pub fn links(&self) -> &[RoutingLink] {
        &self.links
    }

    /// Iterates over all vertices.
    pub fn vertices(&self) -> impl Iterator<Item = NodeIndex> {
        self.graph.node_indices()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ruleset::DefaultRules;
    use tessel_arch::{ArchitectureBuilder, ComponentTemplate};

    fn pair_with_mux() -> Architecture {
        let mut pe = ComponentTemplate::new("pe");
        pe.add_port("in", PortClass::Input).unwrap();
        pe.add_port("out", PortClass::Output).unwrap();
        let mux = ComponentTemplate::build_mux(2, 1);

        let mut builder = ArchitectureBuilder::new("pair", 1);
        builder.add_child(&pe, "a", [0]).unwrap();
        builder.add_child(&pe, "b", [1]).unwrap();
        builder.add_child(&mux, "m", [2]).unwrap();
        builder.add_link("a.out", "m.in[0]").unwrap();
        builder.add_link("m.out[0]", "b.in").unwrap();
        builder.finish()
    }

    #[test]
    fn every_port_and_link_is_a_vertex() {
        let arch = pair_with_mux();
        let g = RoutingGraph::build(&DefaultRules, &arch);
        // 7 ports, 2 links, 1 mux switch.
        assert_eq!(g.len(), 10);
        for (id, _) in arch.ports() {
            assert!(g.vertex(ArchItem::Port(id)).is_some());
        }
    }

    #[test]
    fn mux_connects_inputs_to_outputs() {
        let arch = pair_with_mux();
        let g = RoutingGraph::build(&DefaultRules, &arch);
        let port = |path: &str| g.vertex(arch.resolve(path).unwrap()).unwrap();
        let m = g.vertex(arch.resolve("m").unwrap()).unwrap();
        assert!(g.has_arc(port("m.in[0]"), m));
        assert!(g.has_arc(port("m.in[1]"), m));
        assert!(g.has_arc(m, port("m.out[0]")));
        assert!(!g.has_arc(m, port("m.in[0]")));
    }

    #[test]
    fn default_annotation() {
        let arch = pair_with_mux();
        let g = RoutingGraph::build(&DefaultRules, &arch);
        assert!(g.links().iter().all(|l| l.capacity() == 1 && l.cost() == 1.0));
    }
}
