//! Opaque ID newtypes for taskgraph nodes and edges.

use tessel_common::define_id;

define_id!(
    /// Opaque, copyable ID for a task.
    NodeId
);

define_id!(
    /// Opaque, copyable ID for a channel. Equal to the edge's insertion index.
    EdgeId
);
