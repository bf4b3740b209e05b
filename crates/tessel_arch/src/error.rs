//! Errors raised while building an architecture.

use crate::address::Address;
use crate::types::{Direction, PortClass};

/// Errors from template and architecture construction or path lookup.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ArchError {
    /// Two items in the same component share a name.
    #[error("duplicate name '{name}' in '{scope}'")]
    DuplicateName {
        /// The component the name collides in.
        scope: String,
        /// The colliding name.
        name: String,
    },

    /// A path names an item that does not exist.
    #[error("unknown path '{0}'")]
    UnknownPath(String),

    /// A link endpoint path has the wrong number of segments.
    #[error("link endpoint '{0}' must be a port of the component or of a direct child")]
    InvalidPath(String),

    /// A port's class does not allow it to act in the requested role.
    #[error("port '{path}' of class {class} cannot be a link {role}")]
    WrongPortClass {
        /// The endpoint path.
        path: String,
        /// The port's declared class.
        class: PortClass,
        /// The role the link asked it to play.
        role: Direction,
    },

    /// A port is already attached to a link at this level of the hierarchy.
    #[error("port '{0}' is already linked")]
    PortAlreadyLinked(String),

    /// A link needs at least one source and one destination.
    #[error("link '{0}' has no sources or no destinations")]
    EmptyLink(String),

    /// A top-level address already holds a component.
    #[error("address {0} is already occupied")]
    AddressOccupied(Address),

    /// An address has the wrong number of coordinates.
    #[error("address {address} has {found} dimensions, expected {expected}")]
    DimensionMismatch {
        /// The offending address.
        address: Address,
        /// The architecture's dimensionality.
        expected: usize,
        /// The address's dimensionality.
        found: usize,
    },
}
