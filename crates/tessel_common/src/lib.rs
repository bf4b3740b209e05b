//! Shared foundational types used across the Tessel place-and-route toolkit.
//!
//! This crate provides the dense [`Arena`] storage that the architecture and
//! taskgraph models are built on, interned identifiers for instance names,
//! free-form metadata maps, and the common internal-error result type.

#![warn(missing_docs)]

pub mod arena;
pub mod ident;
pub mod metadata;
pub mod result;

pub use arena::{Arena, ArenaId};
pub use ident::{Ident, Interner};
pub use metadata::{search_metadata, Metadata};
pub use result::{InternalError, TesselResult};
