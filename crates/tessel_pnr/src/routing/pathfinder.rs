//! PathFinder negotiated congestion routing.
//!
//! Every iteration rips up and reroutes channels in routing order. Overused
//! resources then gain history cost and the present-congestion factor grows,
//! so contested resources get steadily more expensive until channels settle
//! on disjoint ones or the iteration cap is hit.

use crate::map::Map;
use crate::routing::channels::{routing_order, RoutingChannel};
use crate::routing::congestion::CongestionMap;
use crate::routing::graph::RoutingGraph;
use crate::routing::search::{route_channel, RouteTree};
use crate::routing::{RouteError, RouteOutcome};
use crate::ruleset::RuleSet;
use crate::stop::StopToken;
use tessel_config::{RipUpPolicy, RouteConfig};

/// Result of negotiation: one tree per channel plus how it ended.
#[derive(Debug, Clone)]
pub(crate) struct Negotiation {
    pub(crate) routes: Vec<RouteTree>,
    pub(crate) outcome: RouteOutcome,
    pub(crate) iterations: u32,
    pub(crate) congested: usize,
}

fn rip_up(graph: &mut RoutingGraph, tree: &RouteTree, channel: u32) {
    for &v in &tree.vertices {
        graph.link_mut(v).remove_channel(channel);
    }
}

/// Runs negotiated congestion routing over `channels`.
///
/// Occupancy is recorded in `graph`. A channel with no path at all is a
/// structural failure and aborts with an error.
pub(crate) fn negotiate<R: RuleSet>(
    map: &Map<R>,
    graph: &mut RoutingGraph,
    channels: &[RoutingChannel],
    config: &RouteConfig,
    stop: Option<&StopToken>,
) -> Result<Negotiation, RouteError> {
    let mut congestion = CongestionMap::new(graph.len(), config);
    let order = routing_order(map, channels, config.channel_order);
    let mut routes = vec![RouteTree::default(); channels.len()];
    let mut routed = vec![false; channels.len()];
    let mut iterations = 0;
    let mut congested = 0;

    while iterations < config.max_iterations {
        if stop.is_some_and(StopToken::is_stopped) {
            return Ok(Negotiation {
                routes,
                outcome: RouteOutcome::Interrupted,
                iterations,
                congested,
            });
        }
        iterations += 1;

        for &i in &order {
            let reroute = !routed[i]
                || config.rip_up == RipUpPolicy::All
                || routes[i].vertices.iter().any(|&v| graph.link(v).is_congested());
            if !reroute {
                continue;
            }
            let id = i as u32;
            rip_up(graph, &routes[i], id);
            let edge = map.taskgraph.edge(channels[i].edge);
            let tree = route_channel(&map.rules, &map.architecture, graph, &congestion, edge, &channels[i])?;
            for &v in &tree.vertices {
                graph.link_mut(v).add_channel(id);
            }
            routes[i] = tree;
            routed[i] = true;
        }

        congested = graph.links().iter().filter(|l| l.is_congested()).count();
        if congested == 0 {
            return Ok(Negotiation {
                routes,
                outcome: RouteOutcome::Success,
                iterations,
                congested,
            });
        }
        congestion.update(graph.links());
    }

    Ok(Negotiation {
        routes,
        outcome: RouteOutcome::Congested,
        iterations,
        congested,
    })
}
