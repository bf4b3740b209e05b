//! Negotiated congestion routing.
//!
//! Routing takes a placed map, builds the routing-resource graph and one
//! [`RoutingChannel`] per edge that needs routing, and negotiates routes
//! until no resource is over capacity. Routes are written back to the
//! mapping record only when routing succeeds, so a failed attempt never
//! leaves half-written routes behind.

mod channels;
mod congestion;
mod graph;
mod links;
mod pathfinder;
mod search;

pub use channels::{build_channels, routing_order, RoutingChannel};
pub use congestion::CongestionMap;
pub use graph::{resource, RoutingGraph};
pub use links::RoutingLink;
pub use search::{route_channel, RouteTree};

use crate::map::Map;
use crate::mapping::EdgeRoute;
use crate::ruleset::RuleSet;
use crate::stop::StopToken;
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tessel_arch::ArchItem;
use tessel_common::{InternalError, TesselResult};
use tessel_config::RouteConfig;
use tessel_diagnostics::{Category, Diagnostic, DiagnosticCode, DiagnosticSink};
use thiserror::Error;

/// Structural routing failures.
///
/// Running out of iterations while congested is not an error; it is reported
/// as [`RouteOutcome::Congested`].
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RouteError {
    /// A task has no location.
    #[error("task `{0}` is not placed")]
    Unplaced(String),
    /// No port of a source task may start the channel.
    #[error("channel {edge} has no legal start port on task `{task}`")]
    EmptyStartSet {
        /// Edge index.
        edge: usize,
        /// Source task.
        task: String,
    },
    /// No port of a sink task may end the channel.
    #[error("channel {edge} has no legal stop port on task `{task}`")]
    EmptyStopSet {
        /// Edge index.
        edge: usize,
        /// Sink task.
        task: String,
    },
    /// No path exists between the channel's endpoints.
    #[error("channel {edge} has no path between its endpoints")]
    Unroutable {
        /// Edge index.
        edge: usize,
    },
    /// A route broke the resource graph's invariants.
    #[error(transparent)]
    Internal(#[from] InternalError),
}

impl RouteError {
    fn code(&self) -> DiagnosticCode {
        let number = match self {
            RouteError::Unplaced(_) => 101,
            RouteError::EmptyStartSet { .. } => 102,
            RouteError::EmptyStopSet { .. } => 103,
            RouteError::Unroutable { .. } => 104,
            RouteError::Internal(_) => 199,
        };
        DiagnosticCode::new(Category::Routing, number)
    }
}

/// How a routing run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RouteOutcome {
    /// Every channel is routed and no resource is over capacity.
    Success,
    /// The iteration cap was reached with resources still over capacity.
    Congested,
    /// The stop token fired.
    Interrupted,
}

/// Statistics of a routing run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RouteReport {
    /// Seconds spent building the resource graph and channels.
    pub struct_time: f64,
    /// Seconds spent negotiating.
    pub route_time: f64,
    /// Iterations run.
    pub iterations: u32,
    /// Resources occupied by at least one channel.
    pub resources_used: usize,
    /// Links occupied by at least one channel.
    pub links_used: usize,
    /// Occupied links owned by the architecture root.
    pub global_links: usize,
    /// Resources over capacity at the end.
    pub congested: usize,
    /// How the run ended.
    pub outcome: RouteOutcome,
}

/// Routes every channel of a placed map.
pub fn route<R: RuleSet>(map: &mut Map<R>, config: &RouteConfig, sink: &DiagnosticSink) -> Result<RouteReport, RouteError> {
    route_with(map, config, None, sink)
}

/// Routes every channel, checking `stop` between iterations.
pub fn route_with<R: RuleSet>(
    map: &mut Map<R>,
    config: &RouteConfig,
    stop: Option<&StopToken>,
    sink: &DiagnosticSink,
) -> Result<RouteReport, RouteError> {
    let result = run(map, config, stop, sink);
    if let Err(err) = &result {
        sink.emit(Diagnostic::error(err.code(), err.to_string()).with_subject(map.taskgraph.name()));
    }
    result
}

fn run<R: RuleSet>(
    map: &mut Map<R>,
    config: &RouteConfig,
    stop: Option<&StopToken>,
    sink: &DiagnosticSink,
) -> Result<RouteReport, RouteError> {
    let start = Instant::now();
    let mut graph = RoutingGraph::build(&map.rules, &map.architecture);
    let channels = build_channels(map, &graph)?;
    let struct_time = start.elapsed().as_secs_f64();

    let start = Instant::now();
    let negotiation = pathfinder::negotiate(map, &mut graph, &channels, config, stop)?;
    let route_time = start.elapsed().as_secs_f64();

    let root = map.architecture.root();
    let mut resources_used = 0;
    let mut links_used = 0;
    let mut global_links = 0;
    for v in graph.vertices() {
        if graph.link(v).occupancy() == 0 {
            continue;
        }
        resources_used += 1;
        if let ArchItem::Link(l) = graph.item(v) {
            links_used += 1;
            if map.architecture.link(l).owner == root {
                global_links += 1;
            }
        }
    }

    let report = RouteReport {
        struct_time,
        route_time,
        iterations: negotiation.iterations,
        resources_used,
        links_used,
        global_links,
        congested: negotiation.congested,
        outcome: negotiation.outcome,
    };

    match report.outcome {
        RouteOutcome::Success => {
            let routes = channels
                .iter()
                .zip(&negotiation.routes)
                .map(|(channel, tree)| to_edge_route(&graph, tree).map(|r| (channel.edge, r)))
                .collect::<TesselResult<Vec<_>>>()?;
            map.mapping.clear_routes();
            for (edge, route) in routes {
                map.mapping.edges[edge.index()] = route;
            }
            sink.emit(
                Diagnostic::note(
                    DiagnosticCode::new(Category::Routing, 1),
                    format!(
                        "routed {} channels in {} iterations",
                        channels.len(),
                        report.iterations
                    ),
                )
                .with_subject(map.taskgraph.name())
                .with_note(format!(
                    "{} resources used, {} links, {} global",
                    resources_used, links_used, global_links
                )),
            );
        }
        RouteOutcome::Congested => sink.emit(
            Diagnostic::warning(
                DiagnosticCode::new(Category::Routing, 2),
                format!(
                    "routing did not converge after {} iterations",
                    report.iterations
                ),
            )
            .with_subject(map.taskgraph.name())
            .with_note(format!("{} resources over capacity", report.congested))
            .with_help("re-run placement or raise `route.max_iterations`"),
        ),
        RouteOutcome::Interrupted => sink.emit(Diagnostic::warning(
            DiagnosticCode::new(Category::Routing, 3),
            format!("routing interrupted after {} iterations", report.iterations),
        )),
    }

    Ok(report)
}

/// Converts a route tree to the mapping record form.
///
/// Fails if the tree uses an arc the resource graph does not have.
pub fn to_edge_route(graph: &RoutingGraph, tree: &RouteTree) -> TesselResult<EdgeRoute> {
    let mut route = EdgeRoute::default();
    route.vertices.extend(tree.vertices.iter().map(|&v| graph.item(v)));
    for &(a, b) in &tree.arcs {
        if !graph.has_arc(a, b) {
            return Err(InternalError::new(format!(
                "route arc {:?} -> {:?} is not in the resource graph",
                graph.item(a),
                graph.item(b)
            )));
        }
        route.add_arc(graph.item(a), graph.item(b));
    }
    Ok(route)
}
