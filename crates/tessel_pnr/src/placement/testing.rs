//! Shared fixtures for placement unit tests.

use crate::map::Map;
use crate::placement::distance::{BasicDistance, Distance};
use crate::placement::maptable::{Location, MapTable};
use crate::placement::structure::{Layout, SaStruct};
use crate::ruleset::{DefaultRules, RuleSet};
use tessel_arch::{Architecture, ArchitectureBuilder, Component, ComponentTemplate, ConnectionRule, Offset, PortClass};
use tessel_taskgraph::{Taskgraph, TaskgraphNode};

/// A row of `n` tiles linked to both neighbours.
pub(crate) fn line_arch(n: usize) -> Architecture {
    let mut tile = ComponentTemplate::new("tile");
    tile.add_port("east_out", PortClass::Output).unwrap();
    tile.add_port("east_in", PortClass::Input).unwrap();
    tile.add_port("west_out", PortClass::Output).unwrap();
    tile.add_port("west_in", PortClass::Input).unwrap();

    let mut builder = ArchitectureBuilder::new("line", 1);
    for x in 0..n as i64 {
        builder.add_child(&tile, &format!("t{x}"), [x]).unwrap();
    }
    builder
        .connection_rule(&ConnectionRule::new(vec![Offset::from([1])], "east_out", "west_in"))
        .unwrap();
    builder
        .connection_rule(&ConnectionRule::new(vec![Offset::from([-1])], "west_out", "east_in"))
        .unwrap();
    builder.finish()
}

/// A chain `n0 -> n1 -> ...` of `n` tasks.
pub(crate) fn chain(n: usize) -> Taskgraph {
    let mut tg = Taskgraph::new("chain");
    for i in 0..n {
        tg.add_node(format!("n{i}")).unwrap();
    }
    for i in 1..n {
        let a = format!("n{}", i - 1);
        let b = format!("n{i}");
        tg.add_edge(&[a.as_str()], &[b.as_str()]).unwrap();
    }
    tg
}

pub(crate) fn line_map(addresses: usize, tasks: usize) -> Map<DefaultRules> {
    Map::new(DefaultRules, line_arch(addresses), chain(tasks))
}

/// Builds an unplaced structure for a map.
pub(crate) fn structure<M: MapTable>(map: &Map<DefaultRules>) -> SaStruct<M, BasicDistance> {
    structure_with(map, false)
}

pub(crate) fn structure_with<R: RuleSet, M: MapTable>(map: &Map<R>, enable_address: bool) -> SaStruct<M, BasicDistance> {
    let layout = Layout::build(&map.rules, &map.architecture, &map.taskgraph).unwrap();
    let distance = BasicDistance::new(&map.architecture, &layout.addresses);
    SaStruct::new(&map.rules, &map.architecture, &map.taskgraph, layout, distance, enable_address)
}

/// Puts node `i` on slot 0 of `addresses[i]`.
pub(crate) fn place_at<M: MapTable, D: Distance>(sa: &mut SaStruct<M, D>, addresses: &[usize]) {
    for (node, &a) in addresses.iter().enumerate() {
        sa.place_node(node, Location::new(a, 0));
    }
}

pub(crate) fn locations<M, D>(sa: &SaStruct<M, D>) -> Vec<usize> {
    sa.nodes.iter().map(|n| n.location.address()).collect()
}

/// Prefers `a` on address 0 and `b` on address 1; anything else costs 10.
pub(crate) struct Preference;

impl RuleSet for Preference {
    fn address_cost(&self, node: &TaskgraphNode, component: &Component) -> f64 {
        let wanted = match node.name.as_str() {
            "a" => 0,
            "b" => 1,
            _ => return 0.0,
        };
        let at = component.address.as_ref().map_or(-1, |a| a.coords()[0]);
        if at == wanted {
            0.0
        } else {
            10.0
        }
    }
}

/// Two unconnected tasks `a` and `b` on a two-tile line.
pub(crate) fn preference_map() -> Map<Preference> {
    let mut tg = Taskgraph::new("pair");
    tg.add_node("a").unwrap();
    tg.add_node("b").unwrap();
    Map::new(Preference, line_arch(2), tg)
}

pub(crate) fn line_struct<M: MapTable>(addresses: usize, tasks: usize) -> SaStruct<M, BasicDistance> {
    structure(&line_map(addresses, tasks))
}
