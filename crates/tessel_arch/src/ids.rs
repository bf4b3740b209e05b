//! Opaque ID newtypes for architecture entities.
//!
//! Each ID is a thin `u32` wrapper that is `Copy`, `Ord`, `Hash`, and
//! `Serialize`/`Deserialize`. IDs index the component, port, and link arenas
//! of an [`Architecture`](crate::Architecture).

use serde::{Deserialize, Serialize};
use tessel_common::define_id;

define_id!(
    /// Opaque, copyable ID for a component anywhere in the hierarchy.
    ComponentId
);

define_id!(
    /// Opaque, copyable ID for a port.
    PortId
);

define_id!(
    /// Opaque, copyable ID for a link.
    LinkId
);

/// Any addressable item of the architecture.
///
/// Routing resources and mapping record vertices are `ArchItem`s. The derived
/// order sorts components before ports before links, then by raw index.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize, Deserialize)]
pub enum ArchItem {
    /// A component (a mappable block or a routing fabric vertex).
    Component(ComponentId),
    /// A port.
    Port(PortId),
    /// A link.
    Link(LinkId),
}

impl ArchItem {
    /// Returns the port ID if this item is a port.
    pub fn as_port(self) -> Option<PortId> {
        match self {
            ArchItem::Port(id) => Some(id),
            _ => None,
        }
    }

    /// Returns the link ID if this item is a link.
    pub fn as_link(self) -> Option<LinkId> {
        match self {
            ArchItem::Link(id) => Some(id),
            _ => None,
        }
    }

    /// Returns the component ID if this item is a component.
    pub fn as_component(self) -> Option<ComponentId> {
        match self {
            ArchItem::Component(id) => Some(id),
            _ => None,
        }
    }
}

impl From<ComponentId> for ArchItem {
    fn from(id: ComponentId) -> Self {
        ArchItem::Component(id)
    }
}

impl From<PortId> for ArchItem {
    fn from(id: PortId) -> Self {
        ArchItem::Port(id)
    }
}

impl From<LinkId> for ArchItem {
    fn from(id: LinkId) -> Self {
        ArchItem::Link(id)
    }
}
