//! Stored architecture entities: components, ports, and links.

use crate::address::Address;
use crate::ids::{ArchItem, ComponentId, LinkId, PortId};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use tessel_common::{Ident, Metadata};

/// Declared class of a port, as seen from outside its owner.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub enum PortClass {
    /// Data flows into the owning component.
    Input,
    /// Data flows out of the owning component.
    Output,
}

impl PortClass {
    /// Returns the opposite class.
    pub fn invert(self) -> Self {
        match self {
            PortClass::Input => PortClass::Output,
            PortClass::Output => PortClass::Input,
        }
    }

    /// Returns the role a port of this class plays on a link.
    ///
    /// `own` is `true` when the link belongs to the port's owner. Seen from
    /// inside, an input port drives the owner's internal links, so the class
    /// is inverted before mapping to a direction.
    pub fn direction(self, own: bool) -> Direction {
        let class = if own { self.invert() } else { self };
        match class {
            PortClass::Output => Direction::Source,
            PortClass::Input => Direction::Sink,
        }
    }
}

impl fmt::Display for PortClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PortClass::Input => write!(f, "input"),
            PortClass::Output => write!(f, "output"),
        }
    }
}

/// The role of a port on a link.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub enum Direction {
    /// The port drives the link.
    Source,
    /// The port is driven by the link.
    Sink,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Source => write!(f, "source"),
            Direction::Sink => write!(f, "sink"),
        }
    }
}

/// A component instance in the hierarchy.
#[derive(Debug, Clone)]
pub struct Component {
    /// Instance name within the parent.
    pub name: Ident,
    /// Primitive kind, used by rule sets (e.g. `"mux"`, `"pe"`).
    pub primitive: String,
    /// Parent component, `None` for the root.
    pub parent: Option<ComponentId>,
    /// Address of the top-level ancestor, `None` for the root.
    pub address: Option<Address>,
    /// Child components in declaration order.
    pub children: Vec<ComponentId>,
    /// Ports in declaration order.
    pub ports: Vec<PortId>,
    /// Links owned by this component.
    pub links: Vec<LinkId>,
    /// User data.
    pub metadata: Metadata,
    pub(crate) scope: HashMap<Ident, ArchItem>,
}

impl Component {
    /// Looks up a direct child, port, or link by name.
    pub fn lookup(&self, name: Ident) -> Option<ArchItem> {
        self.scope.get(&name).copied()
    }
}

/// A port on a component.
///
/// A port can be attached to one link owned by its parent (`outer_link`)
/// and one link owned by its own component (`inner_link`). Each attachment
/// is exclusive at its level.
#[derive(Debug, Clone)]
pub struct Port {
    /// Port name within its owner.
    pub name: Ident,
    /// Owning component.
    pub owner: ComponentId,
    /// Declared class.
    pub class: PortClass,
    /// Link in the parent's scope touching this port.
    pub outer_link: Option<LinkId>,
    /// Link in the owner's scope touching this port.
    pub inner_link: Option<LinkId>,
    /// User data.
    pub metadata: Metadata,
}

impl Port {
    /// Iterates over the links attached to this port.
    pub fn links(&self) -> impl Iterator<Item = LinkId> {
        self.outer_link.into_iter().chain(self.inner_link)
    }
}

/// A point-to-point or multi-point connection between ports.
#[derive(Debug, Clone)]
pub struct Link {
    /// Link name within its owner.
    pub name: Ident,
    /// Owning component.
    pub owner: ComponentId,
    /// Driving ports.
    pub sources: Vec<PortId>,
    /// Driven ports.
    pub dests: Vec<PortId>,
    /// User data.
    pub metadata: Metadata,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invert() {
        assert_eq!(PortClass::Input.invert(), PortClass::Output);
        assert_eq!(PortClass::Output.invert(), PortClass::Input);
    }

    #[test]
    fn child_port_direction() {
        assert_eq!(PortClass::Output.direction(false), Direction::Source);
        assert_eq!(PortClass::Input.direction(false), Direction::Sink);
    }

    #[test]
    fn own_port_direction_is_inverted() {
        assert_eq!(PortClass::Input.direction(true), Direction::Source);
        assert_eq!(PortClass::Output.direction(true), Direction::Sink);
    }
}
