//! The rule-set capability interface.
//!
//! Every legality, capacity, and cost decision the engines make goes through
//! a [`RuleSet`]. All methods have defaults, so a unit struct implementing the
//! trait with no overrides (see [`DefaultRules`]) is a complete rule set. The
//! engines are generic over `R: RuleSet`, so each rule set gets its own
//! monomorphized copy of the hot loops.

use crate::placement::PlacementView;
use crate::routing::RoutingLink;
use tessel_arch::{Component, Link, Port};
use tessel_taskgraph::{TaskgraphEdge, TaskgraphNode};

/// A routing resource as seen by a rule set.
#[derive(Debug, Clone, Copy)]
pub enum Resource<'a> {
    /// A port.
    Port(&'a Port),
    /// A link.
    Link(&'a Link),
    /// A routing fabric component such as a mux.
    Component(&'a Component),
}

/// Customizes placement legality, routing legality, capacities, and costs.
pub trait RuleSet {
    /// Special tasks ignore the move distance limit.
    fn is_special(&self, _node: &TaskgraphNode) -> bool {
        false
    }

    /// Whether two tasks can share placement tables.
    ///
    /// Tasks are additionally split by their legal-location set, so returning
    /// `true` for tasks with different legality is safe.
    fn is_equivalent(&self, _a: &TaskgraphNode, _b: &TaskgraphNode) -> bool {
        true
    }

    /// Whether a component is a placement target.
    fn is_mappable(&self, _component: &Component) -> bool {
        true
    }

    /// Whether a task may be placed on a mappable component.
    fn can_map(&self, _node: &TaskgraphNode, _component: &Component) -> bool {
        true
    }

    /// Whether a channel may be routed through a resource.
    fn can_use(&self, _edge: &TaskgraphEdge, _resource: Resource<'_>) -> bool {
        true
    }

    /// Number of channels a resource can carry at once.
    fn capacity(&self, _resource: Resource<'_>) -> usize {
        1
    }

    /// Whether a port of a placed source task may start the channel.
    fn is_source_port(&self, _port: &Port, _edge: &TaskgraphEdge) -> bool {
        true
    }

    /// Whether a port of a placed sink task may end the channel.
    fn is_sink_port(&self, _port: &Port, _edge: &TaskgraphEdge) -> bool {
        true
    }

    /// Channels that return `false` are left unrouted.
    fn needs_routing(&self, _edge: &TaskgraphEdge) -> bool {
        true
    }

    /// Builds the routing record for a resource.
    fn annotate(&self, resource: Resource<'_>) -> RoutingLink {
        RoutingLink::new(1.0, self.capacity(resource))
    }

    /// Whether a component exposes an internal switch vertex connecting all
    /// of its input ports to all of its output ports.
    fn is_routing_fabric(&self, component: &Component) -> bool {
        component.primitive == "mux"
    }

    /// Extra placement cost for putting a task on a component. Only used
    /// when address costs are enabled.
    fn address_cost(&self, _node: &TaskgraphNode, _component: &Component) -> f64 {
        0.0
    }

    /// Placement cost of one channel given the distances from each source
    /// to each sink.
    fn channel_cost<I>(&self, _edge: &TaskgraphEdge, distances: I) -> f64
    where
        I: Iterator<Item = u32>,
        Self: Sized,
    {
        distances.map(f64::from).sum()
    }

    /// Global placement cost over the whole current placement.
    fn aux_cost(&self, _view: &PlacementView<'_>) -> f64 {
        0.0
    }

    /// Channels with higher priority are routed first when the rule-set
    /// channel order is selected.
    fn routing_priority(&self, _edge: &TaskgraphEdge) -> i64 {
        0
    }
}

/// The rule set with every default in place.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultRules;

impl RuleSet for DefaultRules {}
