//! Hierarchical place and route for the Tessel mapper.
//!
//! This crate maps a [`Taskgraph`](tessel_taskgraph::Taskgraph) onto an
//! [`Architecture`](tessel_arch::Architecture): simulated annealing assigns
//! each task to a mappable component, then negotiated congestion routing
//! assigns each channel a set of ports, links, and switch vertices. Every
//! legality, capacity, and cost decision is delegated to a [`RuleSet`].
//!
//! # Pipeline
//!
//! 1. **Place**: build classes and tables, random initial placement, anneal
//! 2. **Route**: build the resource graph, negotiate routes until no
//!    resource is over capacity
//! 3. **Verify**: re-check the mapping record against the architecture
//!
//! # Usage
//!
//! ```
//! use tessel_arch::{ArchitectureBuilder, ComponentTemplate, PortClass};
//! use tessel_config::TesselConfig;
//! use tessel_diagnostics::DiagnosticSink;
//! use tessel_pnr::{place_and_route, DefaultRules, Map, RouteOutcome};
//! use tessel_taskgraph::Taskgraph;
//!
//! let mut pe = ComponentTemplate::new("pe");
//! pe.add_port("in", PortClass::Input).unwrap();
//! pe.add_port("out", PortClass::Output).unwrap();
//! let mut builder = ArchitectureBuilder::new("pair", 1);
//! builder.add_child(&pe, "left", [0]).unwrap();
//! builder.add_child(&pe, "right", [1]).unwrap();
//! builder.add_link("left.out", "right.in").unwrap();
//!
//! let mut tg = Taskgraph::new("app");
//! tg.add_node("producer").unwrap();
//! tg.add_node("consumer").unwrap();
//! tg.add_edge(&["producer"], &["consumer"]).unwrap();
//!
//! let mut map = Map::new(DefaultRules, builder.finish(), tg);
//! let mut config = TesselConfig::default();
//! config.place.seed = Some(1);
//! config.place.move_attempts = 100;
//! let sink = DiagnosticSink::new();
//! let report = place_and_route(&mut map, &config, &sink).unwrap();
//! assert_eq!(report.route.outcome, RouteOutcome::Success);
//! ```

#![warn(missing_docs)]

pub mod map;
pub mod mapping;
pub mod placement;
pub mod routing;
pub mod ruleset;
pub mod stop;
pub mod verify;

pub use map::Map;
pub use mapping::{EdgeRoute, Mapping};
pub use placement::{place, place_with, PlaceError, PlacementExit, PlacementReport, PlacementView, SaState};
pub use routing::{route, route_with, RouteError, RouteOutcome, RouteReport, RoutingLink};
pub use ruleset::{DefaultRules, Resource, RuleSet};
pub use stop::StopToken;
pub use verify::{check_routing, Check, VerificationReport, Violation};

use tessel_config::TesselConfig;
use tessel_diagnostics::DiagnosticSink;
use thiserror::Error;

/// Failure of either engine.
#[derive(Debug, Error, PartialEq)]
pub enum PnrError {
    /// Placement failed.
    #[error(transparent)]
    Place(#[from] PlaceError),
    /// Routing failed structurally.
    #[error(transparent)]
    Route(#[from] RouteError),
}

/// Reports of a full place-and-route run.
#[derive(Debug, Clone)]
pub struct PnrReport {
    /// Placement statistics.
    pub place: PlacementReport,
    /// Routing statistics.
    pub route: RouteReport,
}

/// Places, then routes, with the default annealing schedule.
///
/// A congested routing result is returned as a report, not an error, so the
/// caller can re-place and retry.
pub fn place_and_route<R: RuleSet>(
    map: &mut Map<R>,
    config: &TesselConfig,
    sink: &DiagnosticSink,
) -> Result<PnrReport, PnrError> {
    let place = placement::place(map, &config.place, sink)?;
    let route = routing::route(map, &config.route, sink)?;
    Ok(PnrReport { place, route })
}
