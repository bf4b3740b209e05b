//! Hierarchical architecture model for the Tessel mapper.
//!
//! An architecture is a rooted tree of components. The root's children are
//! placed at integer-tuple [`Address`]es in a fixed number of dimensions;
//! deeper components are reached by instance name. Components own ports and
//! links, and links connect source ports to sink ports.
//!
//! Storage is arena based: components, ports, and links are flat vectors
//! indexed by [`ComponentId`], [`PortId`], and [`LinkId`], and every component
//! keeps a name table used to resolve dotted paths.
//!
//! # Usage
//!
//! ```
//! use tessel_arch::{ArchitectureBuilder, ComponentTemplate, ConnectionRule, Offset, PortClass};
//!
//! let mut pe = ComponentTemplate::new("pe");
//! pe.add_port("in", PortClass::Input).unwrap();
//! pe.add_port("out", PortClass::Output).unwrap();
//!
//! let mut builder = ArchitectureBuilder::new("row", 1);
//! for x in 0..4 {
//!     builder.add_child(&pe, &format!("pe{x}"), [x]).unwrap();
//! }
//! let rule = ConnectionRule::new(vec![Offset::from([1])], "out", "in");
//! assert_eq!(builder.connection_rule(&rule).unwrap(), 3);
//!
//! let arch = builder.finish();
//! assert_eq!(arch.num_addresses(), 4);
//! ```

#![warn(missing_docs)]

pub mod address;
pub mod architecture;
pub mod error;
pub mod ids;
pub mod rules;
pub mod template;
pub mod types;

pub use address::{Address, Offset};
pub use architecture::{Architecture, ArchitectureBuilder};
pub use error::ArchError;
pub use ids::{ArchItem, ComponentId, LinkId, PortId};
pub use rules::ConnectionRule;
pub use template::ComponentTemplate;
pub use types::{Component, Direction, Link, Port, PortClass};
