//! The instantiated architecture graph and its builder.

use crate::address::Address;
use crate::error::ArchError;
use crate::ids::{ArchItem, ComponentId, LinkId, PortId};
use crate::rules::ConnectionRule;
use crate::template::ComponentTemplate;
use crate::types::{Component, Direction, Link, Port};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use tessel_common::{Arena, Ident, Interner, Metadata};

/// An immutable hierarchical architecture.
///
/// Components, ports, and links live in flat arenas. Each component keeps a
/// name table for its direct children, ports, and links, so a dotted path
/// resolves one segment at a time.
#[derive(Debug)]
pub struct Architecture {
    name: String,
    dimensions: usize,
    interner: Interner,
    components: Arena<ComponentId, Component>,
    ports: Arena<PortId, Port>,
    links: Arena<LinkId, Link>,
    root: ComponentId,
    by_address: BTreeMap<Address, ComponentId>,
}

impl Architecture {
    fn new(name: &str, dimensions: usize) -> Self {
        let interner = Interner::new();
        let mut components = Arena::new();
        let root = components.alloc(Component {
            name: interner.intern(name),
            primitive: String::new(),
            parent: None,
            address: None,
            children: Vec::new(),
            ports: Vec::new(),
            links: Vec::new(),
            metadata: Metadata::new(),
            scope: HashMap::new(),
        });
        Self {
            name: name.to_string(),
            dimensions,
            interner,
            components,
            ports: Arena::new(),
            links: Arena::new(),
            root,
            by_address: BTreeMap::new(),
        }
    }

    /// Returns the architecture name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the number of address dimensions.
    pub fn dimensions(&self) -> usize {
        self.dimensions
    }

    /// Returns the root component.
    pub fn root(&self) -> ComponentId {
        self.root
    }

    /// Returns a component.
    pub fn component(&self, id: ComponentId) -> &Component {
        &self.components[id]
    }

    /// Returns a port.
    pub fn port(&self, id: PortId) -> &Port {
        &self.ports[id]
    }

    /// Returns a link.
    pub fn link(&self, id: LinkId) -> &Link {
        &self.links[id]
    }

    /// Iterates over all components, root included.
    pub fn components(&self) -> impl Iterator<Item = (ComponentId, &Component)> {
        self.components.iter()
    }

    /// Iterates over all ports.
    pub fn ports(&self) -> impl Iterator<Item = (PortId, &Port)> {
        self.ports.iter()
    }

    /// Iterates over all links.
    pub fn links(&self) -> impl Iterator<Item = (LinkId, &Link)> {
        self.links.iter()
    }

    /// Returns the number of components, root included.
    pub fn num_components(&self) -> usize {
        self.components.len()
    }

    /// Returns the number of ports.
    pub fn num_ports(&self) -> usize {
        self.ports.len()
    }

    /// Returns the number of links.
    pub fn num_links(&self) -> usize {
        self.links.len()
    }

    /// Resolves an interned name.
    pub fn name_of(&self, ident: Ident) -> &str {
        self.interner.name(ident)
    }

    /// Iterates over occupied top-level addresses in sorted order.
    pub fn addresses(&self) -> impl Iterator<Item = &Address> {
        self.by_address.keys()
    }

    /// Returns the number of occupied top-level addresses.
    pub fn num_addresses(&self) -> usize {
        self.by_address.len()
    }

    /// Returns the top-level component at an address.
    pub fn component_at(&self, address: &Address) -> Option<ComponentId> {
        self.by_address.get(address).copied()
    }

    /// Returns the address of a component's top-level ancestor.
    pub fn address_of(&self, id: ComponentId) -> Option<&Address> {
        self.components[id].address.as_ref()
    }

    /// Returns the address of a port's owner.
    pub fn port_address(&self, id: PortId) -> Option<&Address> {
        self.address_of(self.ports[id].owner)
    }

    /// Returns `id` and all of its descendants in pre-order.
    pub fn walk(&self, id: ComponentId) -> Vec<ComponentId> {
        let mut out = Vec::new();
        let mut stack = vec![id];
        while let Some(c) = stack.pop() {
            out.push(c);
            stack.extend(self.components[c].children.iter().rev());
        }
        out
    }

    /// Resolves a dotted path from the root.
    ///
    /// The first segment names a top-level instance, e.g. `tile_1_0.pe.in`.
    pub fn resolve(&self, path: &str) -> Result<ArchItem, ArchError> {
        self.resolve_in(self.root, path)
    }

    /// Resolves a dotted path relative to a component.
    pub fn resolve_in(&self, from: ComponentId, path: &str) -> Result<ArchItem, ArchError> {
        let unknown = || ArchError::UnknownPath(path.to_string());
        let segments = self.interner.lookup_path(path).ok_or_else(unknown)?;
        let mut item = ArchItem::Component(from);
        for ident in segments {
            let ArchItem::Component(current) = item else {
                return Err(unknown());
            };
            item = self.components[current].lookup(ident).ok_or_else(unknown)?;
        }
        Ok(item)
    }

    /// Returns a human-readable path for a component, starting with its
    /// top-level address.
    pub fn component_path(&self, id: ComponentId) -> String {
        let mut names = Vec::new();
        let mut current = id;
        while let Some(parent) = self.components[current].parent {
            if parent == self.root {
                break;
            }
            names.push(self.name_of(self.components[current].name));
            current = parent;
        }
        match &self.components[current].address {
            Some(address) => {
                let mut path = format!("{address}");
                for name in names.iter().rev() {
                    path.push('.');
                    path.push_str(name);
                }
                path
            }
            None => self.name.clone(),
        }
    }

    /// Returns a human-readable path for any item.
    pub fn item_path(&self, item: ArchItem) -> String {
        match item {
            ArchItem::Component(id) => self.component_path(id),
            ArchItem::Port(id) => {
                let port = &self.ports[id];
                format!("{}.{}", self.component_path(port.owner), self.name_of(port.name))
            }
            ArchItem::Link(id) => {
                let link = &self.links[id];
                format!("{}.{}", self.component_path(link.owner), self.name_of(link.name))
            }
        }
    }

    /// Returns, for every address, the set of other addresses its links reach.
    ///
    /// A link connects the addresses of its source ports to the addresses of
    /// its destination ports. Links local to one address are ignored.
    pub fn connected_addresses(&self) -> BTreeMap<Address, BTreeSet<Address>> {
        let mut out: BTreeMap<Address, BTreeSet<Address>> = self
            .by_address
            .keys()
            .map(|a| (a.clone(), BTreeSet::new()))
            .collect();
        for link in self.links.values() {
            for &src in &link.sources {
                let Some(from) = self.port_address(src) else { continue };
                for &dst in &link.dests {
                    let Some(to) = self.port_address(dst) else { continue };
                    if from != to {
                        out.entry(from.clone()).or_default().insert(to.clone());
                    }
                }
            }
        }
        out
    }

    /// Returns `true` if a port and a link (or two ports through a shared
    /// link) are directly connected.
    pub fn is_connected(&self, a: ArchItem, b: ArchItem) -> bool {
        match (a, b) {
            (ArchItem::Port(p), ArchItem::Link(l)) | (ArchItem::Link(l), ArchItem::Port(p)) => {
                self.ports[p].links().any(|x| x == l)
            }
            (ArchItem::Port(p), ArchItem::Port(q)) => {
                self.ports[p].links().any(|l| self.ports[q].links().any(|m| m == l))
            }
            _ => false,
        }
    }

    /// Returns the ports in a component's subtree that are attached to no link.
    pub fn unused_ports(&self, id: ComponentId) -> Vec<PortId> {
        self.walk(id)
            .into_iter()
            .flat_map(|c| self.components[c].ports.iter().copied())
            .filter(|&p| self.ports[p].links().next().is_none())
            .collect()
    }

    fn instantiate(
        &mut self,
        template: &ComponentTemplate,
        name: &str,
        parent: ComponentId,
        address: &Address,
    ) -> Result<ComponentId, ArchError> {
        let id = self.components.alloc(Component {
            name: self.interner.intern(name),
            primitive: template.primitive.clone(),
            parent: Some(parent),
            address: Some(address.clone()),
            children: Vec::new(),
            ports: Vec::new(),
            links: Vec::new(),
            metadata: template.metadata.clone(),
            scope: HashMap::new(),
        });

        for pt in &template.ports {
            let port_name = self.interner.intern(&pt.name);
            let port = self.ports.alloc(Port {
                name: port_name,
                owner: id,
                class: pt.class,
                outer_link: None,
                inner_link: None,
                metadata: pt.metadata.clone(),
            });
            let comp = &mut self.components[id];
            comp.ports.push(port);
            comp.scope.insert(port_name, ArchItem::Port(port));
        }

        for (child_name, child) in &template.children {
            let child_id = self.instantiate(child, child_name, id, address)?;
            let ident = self.interner.intern(child_name);
            let comp = &mut self.components[id];
            comp.children.push(child_id);
            comp.scope.insert(ident, ArchItem::Component(child_id));
        }

        for lt in &template.links {
            let sources = self.resolve_endpoints(id, &lt.sources)?;
            let dests = self.resolve_endpoints(id, &lt.dests)?;
            self.push_link(id, &lt.name, sources, dests, lt.metadata.clone())?;
        }

        Ok(id)
    }

    fn resolve_endpoints(&self, owner: ComponentId, paths: &[String]) -> Result<Vec<PortId>, ArchError> {
        paths
            .iter()
            .map(|p| {
                self.resolve_in(owner, p)?
                    .as_port()
                    .ok_or_else(|| ArchError::UnknownPath(p.clone()))
            })
            .collect()
    }

    fn push_link(
        &mut self,
        owner: ComponentId,
        name: &str,
        sources: Vec<PortId>,
        dests: Vec<PortId>,
        metadata: Metadata,
    ) -> Result<LinkId, ArchError> {
        let ident = self.interner.intern(name);
        if self.components[owner].scope.contains_key(&ident) {
            return Err(ArchError::DuplicateName {
                scope: self.component_path(owner),
                name: name.to_string(),
            });
        }
        if sources.is_empty() || dests.is_empty() {
            return Err(ArchError::EmptyLink(name.to_string()));
        }

        let mut seen = BTreeSet::new();
        for (ports, role) in [(&sources, Direction::Source), (&dests, Direction::Sink)] {
            for &p in ports {
                let port = &self.ports[p];
                let own = port.owner == owner;
                if port.class.direction(own) != role {
                    return Err(ArchError::WrongPortClass {
                        path: self.item_path(p.into()),
                        class: port.class,
                        role,
                    });
                }
                let slot = if own { port.inner_link } else { port.outer_link };
                if slot.is_some() || !seen.insert(p) {
                    return Err(ArchError::PortAlreadyLinked(self.item_path(p.into())));
                }
            }
        }

        let link = self.links.next_id();
        for &p in sources.iter().chain(&dests) {
            let port = &mut self.ports[p];
            if port.owner == owner {
                port.inner_link = Some(link);
            } else {
                port.outer_link = Some(link);
            }
        }
        self.links.alloc(Link {
            name: ident,
            owner,
            sources,
            dests,
            metadata,
        });
        let comp = &mut self.components[owner];
        comp.links.push(link);
        comp.scope.insert(ident, ArchItem::Link(link));
        Ok(link)
    }
}

/// Builds an [`Architecture`] by placing templates at top-level addresses
/// and linking them.
#[derive(Debug)]
pub struct ArchitectureBuilder {
    arch: Architecture,
}

impl ArchitectureBuilder {
    /// Starts an empty architecture with the given dimensionality.
    pub fn new(name: &str, dimensions: usize) -> Self {
        Self {
            arch: Architecture::new(name, dimensions),
        }
    }

    /// Read access to the architecture built so far.
    pub fn architecture(&self) -> &Architecture {
        &self.arch
    }

    /// Instantiates `template` as a top-level component at `address`.
    pub fn add_child(
        &mut self,
        template: &ComponentTemplate,
        name: &str,
        address: impl Into<Address>,
    ) -> Result<ComponentId, ArchError> {
        let address = address.into();
        if address.dims() != self.arch.dimensions {
            return Err(ArchError::DimensionMismatch {
                expected: self.arch.dimensions,
                found: address.dims(),
                address,
            });
        }
        if self.arch.by_address.contains_key(&address) {
            return Err(ArchError::AddressOccupied(address));
        }
        let root = self.arch.root;
        if self
            .arch
            .interner
            .lookup(name)
            .is_some_and(|ident| self.arch.components[root].scope.contains_key(&ident))
        {
            return Err(ArchError::DuplicateName {
                scope: self.arch.name.clone(),
                name: name.to_string(),
            });
        }

        let id = self.arch.instantiate(template, name, root, &address)?;
        let ident = self.arch.interner.intern(name);
        let comp = &mut self.arch.components[root];
        comp.children.push(id);
        comp.scope.insert(ident, ArchItem::Component(id));
        self.arch.by_address.insert(address, id);
        Ok(id)
    }

    /// Adds a point-to-point top-level link between two ports given by full
    /// paths (`instance.port`).
    pub fn add_link(&mut self, source: &str, dest: &str) -> Result<LinkId, ArchError> {
        self.add_multi_link(&[source], &[dest], Metadata::new())
    }

    /// Adds a top-level link with any number of sources and destinations.
    pub fn add_multi_link(
        &mut self,
        sources: &[&str],
        dests: &[&str],
        metadata: Metadata,
    ) -> Result<LinkId, ArchError> {
        let root = self.arch.root;
        let resolve = |paths: &[&str]| -> Result<Vec<PortId>, ArchError> {
            paths
                .iter()
                .map(|&p| {
                    if p.split('.').count() != 2 {
                        return Err(ArchError::InvalidPath(p.to_string()));
                    }
                    self.arch
                        .resolve(p)?
                        .as_port()
                        .ok_or_else(|| ArchError::UnknownPath(p.to_string()))
                })
                .collect()
        };
        let sources = resolve(sources)?;
        let dests = resolve(dests)?;
        let name = self.next_link_name();
        self.arch.push_link(root, &name, sources, dests, metadata)
    }

    /// Applies a connection rule to every matching top-level component and
    /// returns the number of links created.
    ///
    /// For each source component, all destinations reached through the rule's
    /// offsets share one multi-point link.
    pub fn connection_rule(&mut self, rule: &ConnectionRule) -> Result<usize, ArchError> {
        let root = self.arch.root;
        let mut planned = Vec::new();
        for (address, &src_comp) in &self.arch.by_address {
            if !rule.matches_source(&self.arch.components[src_comp]) {
                continue;
            }
            let Ok(ArchItem::Port(src)) = self.arch.resolve_in(src_comp, &rule.source_port) else {
                continue;
            };
            let mut dests = Vec::new();
            for offset in &rule.offsets {
                let Some(target) = address.offset(offset) else { continue };
                let Some(&dst_comp) = self.arch.by_address.get(&target) else {
                    continue;
                };
                if !rule.matches_dest(&self.arch.components[dst_comp]) {
                    continue;
                }
                if let Ok(ArchItem::Port(dst)) = self.arch.resolve_in(dst_comp, &rule.dest_port) {
                    dests.push(dst);
                }
            }
            if !dests.is_empty() {
                planned.push((src, dests));
            }
        }

        let count = planned.len();
        for (src, dests) in planned {
            let name = self.next_link_name();
            self.arch
                .push_link(root, &name, vec![src], dests, rule.metadata.clone())?;
        }
        Ok(count)
    }

    /// Finishes construction.
    pub fn finish(self) -> Architecture {
        self.arch
    }

    fn next_link_name(&self) -> String {
        format!("link[{}]", self.arch.components[self.arch.root].links.len())
    }
}
