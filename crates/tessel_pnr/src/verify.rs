//! Independent re-validation of a mapping record.
//!
//! The checks read only the map (rule set, architecture, taskgraph,
//! mapping) and never the engines' working structures, so they catch bugs in
//! placement or routing as well as hand-edited mappings. Every check returns
//! its violations in a deterministic order.

use crate::map::Map;
use crate::mapping::EdgeRoute;
use crate::routing::resource;
use crate::ruleset::RuleSet;
use petgraph::algo::has_path_connecting;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use tessel_arch::{ArchItem, Architecture, ComponentId, PortClass};
use tessel_diagnostics::{Category, Diagnostic, DiagnosticCode, DiagnosticSink};
use tessel_taskgraph::EdgeId;

/// The check that found a violation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Check {
    /// Task locations.
    Placement,
    /// Route endpoints.
    Ports,
    /// Resource sharing.
    Capacity,
    /// Route arcs against the architecture.
    ArchitectureConnectivity,
    /// Source-to-sink reachability within each route.
    RoutingConnectivity,
    /// Route vertices against the architecture and rule set.
    ArchitectureResources,
}

impl Check {
    fn code(self) -> DiagnosticCode {
        let number = match self {
            Check::Placement => 1,
            Check::Ports => 2,
            Check::Capacity => 3,
            Check::ArchitectureConnectivity => 4,
            Check::RoutingConnectivity => 5,
            Check::ArchitectureResources => 6,
        };
        DiagnosticCode::new(Category::Verify, number)
    }
}

impl fmt::Display for Check {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Check::Placement => "placement",
            Check::Ports => "ports",
            Check::Capacity => "capacity",
            Check::ArchitectureConnectivity => "architecture connectivity",
            Check::RoutingConnectivity => "routing connectivity",
            Check::ArchitectureResources => "architecture resources",
        };
        f.write_str(name)
    }
}

/// One failed expectation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Violation {
    /// The check that failed.
    pub check: Check,
    /// Task, channel, or resource concerned.
    pub subject: String,
    /// What is wrong.
    pub message: String,
}

impl Violation {
    fn new(check: Check, subject: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            check,
            subject: subject.into(),
            message: message.into(),
        }
    }
}

/// All violations found by [`check_routing`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerificationReport {
    /// Violations in check order.
    pub violations: Vec<Violation>,
}

impl VerificationReport {
    /// Returns `true` if nothing failed.
    pub fn is_ok(&self) -> bool {
        self.violations.is_empty()
    }

    /// Violations found by one check.
    pub fn by_check(&self, check: Check) -> impl Iterator<Item = &Violation> {
        self.violations.iter().filter(move |v| v.check == check)
    }
}

fn channel_name(edge: EdgeId) -> String {
    format!("channel {}", edge.index())
}

fn item_exists(arch: &Architecture, item: ArchItem) -> bool {
    match item {
        ArchItem::Port(p) => p.index() < arch.num_ports(),
        ArchItem::Link(l) => l.index() < arch.num_links(),
        ArchItem::Component(c) => c.index() < arch.num_components(),
    }
}

/// Routed channels that need routing, with their routes.
fn routed<'a, R: RuleSet>(map: &'a Map<R>) -> impl Iterator<Item = (EdgeId, &'a EdgeRoute)> + 'a {
    map.taskgraph
        .edges()
        .filter(move |(_, e)| map.rules.needs_routing(e))
        .map(move |(id, _)| (id, map.mapping.route(id)))
}

/// Every task is placed on a distinct, mappable component it may map to.
pub fn check_placement<R: RuleSet>(map: &Map<R>) -> Vec<Violation> {
    let arch = &map.architecture;
    let mut out = Vec::new();
    let mut owners: BTreeMap<ComponentId, &str> = BTreeMap::new();
    for (_, node) in map.taskgraph.nodes() {
        let Some(c) = map.mapping.location(&node.name) else {
            out.push(Violation::new(Check::Placement, &node.name, "task is not placed"));
            continue;
        };
        if c.index() >= arch.num_components() {
            out.push(Violation::new(Check::Placement, &node.name, "placed on a nonexistent component"));
            continue;
        }
        let component = arch.component(c);
        let path = arch.component_path(c);
        if !map.rules.is_mappable(component) {
            out.push(Violation::new(
                Check::Placement,
                &node.name,
                format!("`{path}` is not a mappable component"),
            ));
        } else if !map.rules.can_map(node, component) {
            out.push(Violation::new(
                Check::Placement,
                &node.name,
                format!("task may not be mapped to `{path}`"),
            ));
        }
        if let Some(other) = owners.insert(c, &node.name) {
            out.push(Violation::new(
                Check::Placement,
                &node.name,
                format!("shares `{path}` with task `{other}`"),
            ));
        }
    }
    out
}

/// Each route starts only at legal source ports of its source tasks and
/// reaches a legal sink port of every sink task.
pub fn check_ports<R: RuleSet>(map: &Map<R>) -> Vec<Violation> {
    let arch = &map.architecture;
    let mut out = Vec::new();
    for (id, route) in routed(map) {
        if route.is_empty() {
            continue;
        }
        let edge = map.taskgraph.edge(id);
        let name = channel_name(id);
        let located = |tasks: &[tessel_taskgraph::NodeId]| -> Vec<Option<ComponentId>> {
            tasks
                .iter()
                .map(|&t| map.mapping.location(&map.taskgraph.node(t).name))
                .collect()
        };
        let sources = located(&edge.sources);
        let sinks = located(&edge.sinks);

        let heads: BTreeSet<ArchItem> = route.arcs.iter().map(|&(_, b)| b).collect();
        for &v in route.vertices.iter().filter(|v| !heads.contains(v)) {
            let legal = match v {
                ArchItem::Port(p) if item_exists(arch, v) => {
                    let port = arch.port(p);
                    port.class == PortClass::Output
                        && sources.contains(&Some(port.owner))
                        && map.rules.is_source_port(port, edge)
                }
                _ => false,
            };
            if !legal {
                out.push(Violation::new(
                    Check::Ports,
                    &name,
                    format!("route starts at `{}`, not a source port", describe(arch, v)),
                ));
            }
        }

        for (&t, sink) in edge.sinks.iter().zip(&sinks) {
            let reached = route.vertices.iter().any(|&v| match v {
                ArchItem::Port(p) if item_exists(arch, v) => {
                    let port = arch.port(p);
                    port.class == PortClass::Input
                        && Some(port.owner) == *sink
                        && map.rules.is_sink_port(port, edge)
                }
                _ => false,
            });
            if !reached {
                out.push(Violation::new(
                    Check::Ports,
                    &name,
                    format!("route reaches no sink port of task `{}`", map.taskgraph.node(t).name),
                ));
            }
        }
    }
    out
}

/// No resource carries more channels than its capacity.
pub fn check_capacity<R: RuleSet>(map: &Map<R>) -> Vec<Violation> {
    let arch = &map.architecture;
    let mut usage: BTreeMap<ArchItem, usize> = BTreeMap::new();
    for (_, route) in routed(map) {
        for &v in &route.vertices {
            *usage.entry(v).or_default() += 1;
        }
    }
    usage
        .into_iter()
        .filter(|&(v, _)| item_exists(arch, v))
        .filter_map(|(v, used)| {
            let capacity = map.rules.annotate(resource(arch, v)).capacity();
            (used > capacity).then(|| {
                Violation::new(
                    Check::Capacity,
                    describe(arch, v),
                    format!("used by {used} channels, capacity {capacity}"),
                )
            })
        })
        .collect()
}

/// Whether the architecture has a data-flow connection `a -> b`.
fn connects<R: RuleSet>(map: &Map<R>, a: ArchItem, b: ArchItem) -> bool {
    let arch = &map.architecture;
    match (a, b) {
        (ArchItem::Port(p), ArchItem::Link(l)) => arch.link(l).sources.contains(&p),
        (ArchItem::Link(l), ArchItem::Port(p)) => arch.link(l).dests.contains(&p),
        (ArchItem::Port(p), ArchItem::Component(c)) => {
            let port = arch.port(p);
            port.owner == c && port.class == PortClass::Input && map.rules.is_routing_fabric(arch.component(c))
        }
        (ArchItem::Component(c), ArchItem::Port(p)) => {
            let port = arch.port(p);
            port.owner == c && port.class == PortClass::Output && map.rules.is_routing_fabric(arch.component(c))
        }
        _ => false,
    }
}

/// Every arc of every route is a real connection in the architecture.
pub fn check_architecture_connectivity<R: RuleSet>(map: &Map<R>) -> Vec<Violation> {
    let arch = &map.architecture;
    let mut out = Vec::new();
    for (id, route) in routed(map) {
        for &(a, b) in &route.arcs {
            if !item_exists(arch, a) || !item_exists(arch, b) {
                continue;
            }
            if !connects(map, a, b) {
                out.push(Violation::new(
                    Check::ArchitectureConnectivity,
                    channel_name(id),
                    format!("`{}` does not connect to `{}`", describe(arch, a), describe(arch, b)),
                ));
            }
        }
    }
    out
}

/// Every routed channel reaches each sink task from some source task using
/// only its own arcs.
pub fn check_routing_connectivity<R: RuleSet>(map: &Map<R>) -> Vec<Violation> {
    let arch = &map.architecture;
    let mut out = Vec::new();
    for (id, route) in routed(map) {
        let name = channel_name(id);
        if route.is_empty() {
            out.push(Violation::new(Check::RoutingConnectivity, &name, "channel is not routed"));
            continue;
        }
        let edge = map.taskgraph.edge(id);
        let endpoints = |tasks: &[tessel_taskgraph::NodeId], class: PortClass| -> Vec<ArchItem> {
            let owners: Vec<Option<ComponentId>> = tasks
                .iter()
                .map(|&t| map.mapping.location(&map.taskgraph.node(t).name))
                .collect();
            route
                .vertices
                .iter()
                .copied()
                .filter(|&v| match v {
                    ArchItem::Port(p) if item_exists(arch, v) => {
                        let port = arch.port(p);
                        port.class == class && owners.contains(&Some(port.owner))
                    }
                    _ => false,
                })
                .collect()
        };
        let starts = endpoints(&edge.sources, PortClass::Output);
        let graph = route.to_graph();

        for &t in &edge.sinks {
            let stops = endpoints(&[t], PortClass::Input);
            let reached = stops
                .iter()
                .any(|&s| starts.iter().any(|&a| has_path_connecting(&graph, a, s, None)));
            if !reached {
                out.push(Violation::new(
                    Check::RoutingConnectivity,
                    &name,
                    format!("task `{}` is not reachable from a source", map.taskgraph.node(t).name),
                ));
            }
        }
    }
    out
}

/// Every route vertex exists and the rule set allows the channel to use it.
pub fn check_architecture_resources<R: RuleSet>(map: &Map<R>) -> Vec<Violation> {
    let arch = &map.architecture;
    let mut out = Vec::new();
    for (id, route) in routed(map) {
        let edge = map.taskgraph.edge(id);
        for &v in &route.vertices {
            if !item_exists(arch, v) {
                out.push(Violation::new(
                    Check::ArchitectureResources,
                    channel_name(id),
                    format!("uses nonexistent resource {v:?}"),
                ));
            } else if !map.rules.can_use(edge, resource(arch, v)) {
                out.push(Violation::new(
                    Check::ArchitectureResources,
                    channel_name(id),
                    format!("may not use `{}`", describe(arch, v)),
                ));
            }
        }
    }
    out
}

fn describe(arch: &Architecture, item: ArchItem) -> String {
    if item_exists(arch, item) {
        arch.item_path(item)
    } else {
        format!("{item:?}")
    }
}

/// Runs every check and reports each violation to `sink`.
pub fn check_routing<R: RuleSet>(map: &Map<R>, sink: &DiagnosticSink) -> VerificationReport {
    let mut violations = check_placement(map);
    violations.extend(check_ports(map));
    violations.extend(check_capacity(map));
    violations.extend(check_architecture_connectivity(map));
    violations.extend(check_routing_connectivity(map));
    violations.extend(check_architecture_resources(map));

    for v in &violations {
        sink.emit(
            Diagnostic::error(v.check.code(), v.message.clone())
                .with_subject(v.subject.clone())
                .with_note(format!("{} check", v.check)),
        );
    }
    if violations.is_empty() {
        sink.emit(
            Diagnostic::note(DiagnosticCode::new(Category::Verify, 0), "mapping verified")
                .with_subject(map.taskgraph.name()),
        );
    }
    VerificationReport { violations }
}
