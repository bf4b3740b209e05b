//! Reusable component templates.
//!
//! A [`ComponentTemplate`] describes a component type: its ports, child
//! instances, and internal links. Templates are plain values; nothing is
//! allocated in an [`Architecture`](crate::Architecture) until a template is
//! placed with [`ArchitectureBuilder::add_child`](crate::ArchitectureBuilder::add_child).
//! All structural checks happen while the template is built, so
//! instantiation cannot fail on a well-formed template.

use crate::error::ArchError;
use crate::types::{Direction, PortClass};
use serde_json::Value;
use std::collections::HashSet;
use tessel_common::Metadata;

#[derive(Debug, Clone)]
pub(crate) struct PortTemplate {
    pub(crate) name: String,
    pub(crate) class: PortClass,
    pub(crate) metadata: Metadata,
}

#[derive(Debug, Clone)]
pub(crate) struct LinkTemplate {
    pub(crate) name: String,
    pub(crate) sources: Vec<String>,
    pub(crate) dests: Vec<String>,
    pub(crate) metadata: Metadata,
}

/// Blueprint for a component type.
#[derive(Debug, Clone)]
pub struct ComponentTemplate {
    pub(crate) primitive: String,
    pub(crate) metadata: Metadata,
    pub(crate) ports: Vec<PortTemplate>,
    pub(crate) children: Vec<(String, ComponentTemplate)>,
    pub(crate) links: Vec<LinkTemplate>,
    names: HashSet<String>,
    linked: HashSet<String>,
}

impl ComponentTemplate {
    /// Creates an empty template of the given primitive kind.
    pub fn new(primitive: impl Into<String>) -> Self {
        Self {
            primitive: primitive.into(),
            metadata: Metadata::new(),
            ports: Vec::new(),
            children: Vec::new(),
            links: Vec::new(),
            names: HashSet::new(),
            linked: HashSet::new(),
        }
    }

    /// Builds a routing multiplexer with ports `in[0..inputs]` and
    /// `out[0..outputs]` and primitive `"mux"`.
    pub fn build_mux(inputs: usize, outputs: usize) -> Self {
        let mut mux = Self::new("mux");
        for i in 0..inputs {
            mux.push_port(format!("in[{i}]"), PortClass::Input, Metadata::new());
        }
        for i in 0..outputs {
            mux.push_port(format!("out[{i}]"), PortClass::Output, Metadata::new());
        }
        mux
    }

    /// Sets a metadata entry on the component.
    pub fn with_metadata(mut self, key: impl Into<String>, value: Value) -> Self {
        self.metadata.insert(key.into(), value);
        self
    }

    /// Returns the primitive kind.
    pub fn primitive(&self) -> &str {
        &self.primitive
    }

    /// Returns `true` if the template declares a port with this name.
    pub fn has_port(&self, name: &str) -> bool {
        self.ports.iter().any(|p| p.name == name)
    }

    /// Adds a port.
    pub fn add_port(&mut self, name: impl Into<String>, class: PortClass) -> Result<(), ArchError> {
        self.add_port_with_metadata(name, class, Metadata::new())
    }

    /// Adds a port carrying metadata.
    pub fn add_port_with_metadata(
        &mut self,
        name: impl Into<String>,
        class: PortClass,
        metadata: Metadata,
    ) -> Result<(), ArchError> {
        let name = name.into();
        self.claim(&name)?;
        self.push_port(name, class, metadata);
        Ok(())
    }

    /// Adds `count` ports named `name[0]`, `name[1]`, ...
    pub fn add_ports(&mut self, name: &str, class: PortClass, count: usize) -> Result<(), ArchError> {
        for i in 0..count {
            self.add_port(format!("{name}[{i}]"), class)?;
        }
        Ok(())
    }

    /// Adds a child instance of `template`.
    pub fn add_child(&mut self, template: &ComponentTemplate, name: impl Into<String>) -> Result<(), ArchError> {
        let name = name.into();
        self.claim(&name)?;
        self.children.push((name, template.clone()));
        Ok(())
    }

    /// Adds `count` child instances named `name[0]`, `name[1]`, ...
    pub fn add_children(&mut self, template: &ComponentTemplate, name: &str, count: usize) -> Result<(), ArchError> {
        for i in 0..count {
            self.add_child(template, format!("{name}[{i}]"))?;
        }
        Ok(())
    }

    /// Adds a link with a generated name and returns that name.
    ///
    /// Endpoint paths have one segment (a port of this component) or two
    /// (`child.port`).
    pub fn add_link(&mut self, sources: &[&str], dests: &[&str]) -> Result<String, ArchError> {
        let mut n = self.links.len();
        let mut name = format!("link[{n}]");
        while self.names.contains(&name) {
            n += 1;
            name = format!("link[{n}]");
        }
        self.add_named_link(name.clone(), sources, dests, Metadata::new())?;
        Ok(name)
    }

    /// Adds a link with an explicit name and metadata.
    pub fn add_named_link(
        &mut self,
        name: impl Into<String>,
        sources: &[&str],
        dests: &[&str],
        metadata: Metadata,
    ) -> Result<(), ArchError> {
        let name = name.into();
        if sources.is_empty() || dests.is_empty() {
            return Err(ArchError::EmptyLink(name));
        }
        if self.names.contains(&name) {
            return Err(self.duplicate(&name));
        }

        let mut seen = HashSet::new();
        for (paths, role) in [(sources, Direction::Source), (dests, Direction::Sink)] {
            for &path in paths {
                let (class, own) = self.endpoint_class(path)?;
                let acts = class.direction(own);
                if acts != role {
                    return Err(ArchError::WrongPortClass {
                        path: path.to_string(),
                        class,
                        role,
                    });
                }
                if self.linked.contains(path) || !seen.insert(path) {
                    return Err(ArchError::PortAlreadyLinked(path.to_string()));
                }
            }
        }

        self.names.insert(name.clone());
        self.linked.extend(seen.into_iter().map(str::to_string));
        self.links.push(LinkTemplate {
            name,
            sources: sources.iter().map(|s| s.to_string()).collect(),
            dests: dests.iter().map(|s| s.to_string()).collect(),
            metadata,
        });
        Ok(())
    }

    fn push_port(&mut self, name: String, class: PortClass, metadata: Metadata) {
        self.names.insert(name.clone());
        self.ports.push(PortTemplate {
            name,
            class,
            metadata,
        });
    }

    fn claim(&mut self, name: &str) -> Result<(), ArchError> {
        if !self.names.insert(name.to_string()) {
            return Err(self.duplicate(name));
        }
        Ok(())
    }

    fn duplicate(&self, name: &str) -> ArchError {
        ArchError::DuplicateName {
            scope: self.primitive.clone(),
            name: name.to_string(),
        }
    }

    /// Resolves an endpoint path to the port's class and whether it is one
    /// of this component's own ports.
    fn endpoint_class(&self, path: &str) -> Result<(PortClass, bool), ArchError> {
        let segments: Vec<&str> = path.split('.').collect();
        match segments.as_slice() {
            [port] => self
                .ports
                .iter()
                .find(|p| p.name == *port)
                .map(|p| (p.class, true))
                .ok_or_else(|| ArchError::UnknownPath(path.to_string())),
            [child, port] => self
                .children
                .iter()
                .find(|(name, _)| name == child)
                .and_then(|(_, t)| t.ports.iter().find(|p| p.name == *port))
                .map(|p| (p.class, false))
                .ok_or_else(|| ArchError::UnknownPath(path.to_string())),
            _ => Err(ArchError::InvalidPath(path.to_string())),
        }
    }
}
