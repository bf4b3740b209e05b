//! Errors raised while building a taskgraph.

/// Errors from [`Taskgraph`](crate::Taskgraph) construction.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TaskgraphError {
    /// A task with this name already exists.
    #[error("task '{0}' already exists")]
    DuplicateNode(String),

    /// An edge refers to a task that does not exist.
    #[error("unknown task '{0}'")]
    UnknownNode(String),

    /// An edge has no sources or no sinks.
    #[error("edge must have at least one source and one sink")]
    EmptyEdge,
}
