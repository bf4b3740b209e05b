//! Per-channel routing endpoints and routing order.

use crate::map::Map;
use crate::routing::graph::RoutingGraph;
use crate::routing::RouteError;
use crate::ruleset::RuleSet;
use petgraph::graph::NodeIndex;
use tessel_arch::{ArchItem, PortClass};
use tessel_config::ChannelOrder;
use tessel_taskgraph::{EdgeId, NodeId};

/// The start and stop vertex sets of one channel.
///
/// There is one start set per source task and one stop set per sink task,
/// in taskgraph order. A route must reach one vertex of every stop set from
/// some vertex of a start set.
#[derive(Debug, Clone)]
pub struct RoutingChannel {
    /// Taskgraph edge.
    pub edge: EdgeId,
    /// Candidate start vertices per source task.
    pub starts: Vec<Vec<NodeIndex>>,
    /// Candidate stop vertices per sink task.
    pub stops: Vec<Vec<NodeIndex>>,
}

impl RoutingChannel {
    /// Number of sink branches.
    pub fn fanout(&self) -> usize {
        self.stops.len()
    }
}

/// Collects the endpoint ports of one task for a channel.
fn endpoints<R: RuleSet>(
    map: &Map<R>,
    graph: &RoutingGraph,
    edge: EdgeId,
    task: NodeId,
    class: PortClass,
) -> Result<Vec<NodeIndex>, RouteError> {
    let name = &map.taskgraph.node(task).name;
    let component = map
        .mapping
        .location(name)
        .ok_or_else(|| RouteError::Unplaced(name.clone()))?;
    let e = map.taskgraph.edge(edge);
    let set: Vec<NodeIndex> = map
        .architecture
        .component(component)
        .ports
        .iter()
        .filter(|&&p| {
            let port = map.architecture.port(p);
            port.class == class
                && match class {
                    PortClass::Output => map.rules.is_source_port(port, e),
                    PortClass::Input => map.rules.is_sink_port(port, e),
                }
        })
        .filter_map(|&p| graph.vertex(ArchItem::Port(p)))
        .collect();
    if set.is_empty() {
        return Err(match class {
            PortClass::Output => RouteError::EmptyStartSet {
                edge: edge.index(),
                task: name.clone(),
            },
            PortClass::Input => RouteError::EmptyStopSet {
                edge: edge.index(),
                task: name.clone(),
            },
        });
    }
    Ok(set)
}

/// Builds a routing channel for every edge that needs routing.
pub fn build_channels<R: RuleSet>(map: &Map<R>, graph: &RoutingGraph) -> Result<Vec<RoutingChannel>, RouteError> {
    let mut channels = Vec::new();
    for (edge, e) in map.taskgraph.edges() {
        if !map.rules.needs_routing(e) {
            continue;
        }
        let starts = e
            .sources
            .iter()
            .map(|&t| endpoints(map, graph, edge, t, PortClass::Output))
            .collect::<Result<_, _>>()?;
        let stops = e
            .sinks
            .iter()
            .map(|&t| endpoints(map, graph, edge, t, PortClass::Input))
            .collect::<Result<_, _>>()?;
        channels.push(RoutingChannel { edge, starts, stops });
    }
    Ok(channels)
}

/// Returns channel indices in routing order. All orders are stable, so
/// ties keep taskgraph order.
pub fn routing_order<R: RuleSet>(map: &Map<R>, channels: &[RoutingChannel], order: ChannelOrder) -> Vec<usize> {
    let mut indices: Vec<usize> = (0..channels.len()).collect();
    match order {
        ChannelOrder::Input => {}
        ChannelOrder::FanoutFirst => {
            indices.sort_by_key(|&i| std::cmp::Reverse(channels[i].fanout()));
        }
        ChannelOrder::RuleSet => {
            indices.sort_by_key(|&i| {
                std::cmp::Reverse(map.rules.routing_priority(map.taskgraph.edge(channels[i].edge)))
            });
        }
    }
    indices
}
