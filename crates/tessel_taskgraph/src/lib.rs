//! Taskgraph model for the Tessel mapper.
//!
//! A [`Taskgraph`] holds named tasks and channels between them. Channels may
//! have several sources and several sinks. Incoming and outgoing channel
//! lists per task are maintained on every insertion, so they always agree
//! with the edge list.

#![warn(missing_docs)]

pub mod error;
pub mod graph;
pub mod ids;

pub use error::TaskgraphError;
pub use graph::{Taskgraph, TaskgraphEdge, TaskgraphNode};
pub use ids::{EdgeId, NodeId};
