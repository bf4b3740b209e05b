//! Task and channel storage with derived adjacency.

use crate::error::TaskgraphError;
use crate::ids::{EdgeId, NodeId};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tessel_common::{Arena, Metadata};

/// A task to be placed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskgraphNode {
    /// Unique task name.
    pub name: String,
    /// User data read by rule sets.
    pub metadata: Metadata,
}

/// A channel between tasks.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskgraphEdge {
    /// Producing tasks, in declaration order.
    pub sources: Vec<NodeId>,
    /// Consuming tasks, in declaration order.
    pub sinks: Vec<NodeId>,
    /// User data read by rule sets.
    pub metadata: Metadata,
}

/// A graph of tasks connected by possibly multi-endpoint channels.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Taskgraph {
    name: String,
    nodes: Arena<NodeId, TaskgraphNode>,
    edges: Arena<EdgeId, TaskgraphEdge>,
    by_name: HashMap<String, NodeId>,
    out_edges: Vec<Vec<EdgeId>>,
    in_edges: Vec<Vec<EdgeId>>,
}

impl Taskgraph {
    /// Creates an empty taskgraph.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Returns the taskgraph name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Adds a task.
    pub fn add_node(&mut self, name: impl Into<String>) -> Result<NodeId, TaskgraphError> {
        self.add_node_with_metadata(name, Metadata::new())
    }

    /// Adds a task carrying metadata.
    pub fn add_node_with_metadata(
        &mut self,
        name: impl Into<String>,
        metadata: Metadata,
    ) -> Result<NodeId, TaskgraphError> {
        let name = name.into();
        if self.by_name.contains_key(&name) {
            return Err(TaskgraphError::DuplicateNode(name));
        }
        let id = self.nodes.alloc(TaskgraphNode {
            name: name.clone(),
            metadata,
        });
        self.by_name.insert(name, id);
        self.out_edges.push(Vec::new());
        self.in_edges.push(Vec::new());
        Ok(id)
    }

    /// Adds a channel between named tasks.
    pub fn add_edge(&mut self, sources: &[&str], sinks: &[&str]) -> Result<EdgeId, TaskgraphError> {
        self.add_edge_with_metadata(sources, sinks, Metadata::new())
    }

    /// Adds a channel carrying metadata.
    pub fn add_edge_with_metadata(
        &mut self,
        sources: &[&str],
        sinks: &[&str],
        metadata: Metadata,
    ) -> Result<EdgeId, TaskgraphError> {
        if sources.is_empty() || sinks.is_empty() {
            return Err(TaskgraphError::EmptyEdge);
        }
        let sources = self.lookup_all(sources)?;
        let sinks = self.lookup_all(sinks)?;

        let id = self.edges.next_id();
        for &n in &sources {
            self.out_edges[n.index()].push(id);
        }
        for &n in &sinks {
            self.in_edges[n.index()].push(id);
        }
        self.edges.alloc(TaskgraphEdge {
            sources,
            sinks,
            metadata,
        });
        Ok(id)
    }

    fn lookup_all(&self, names: &[&str]) -> Result<Vec<NodeId>, TaskgraphError> {
        names
            .iter()
            .map(|&n| {
                self.node_id(n)
                    .ok_or_else(|| TaskgraphError::UnknownNode(n.to_string()))
            })
            .collect()
    }

    /// Returns `true` if a task with this name exists.
    pub fn has_node(&self, name: &str) -> bool {
        self.by_name.contains_key(name)
    }

    /// Looks up a task by name.
    pub fn node_id(&self, name: &str) -> Option<NodeId> {
        self.by_name.get(name).copied()
    }

    /// Returns a task.
    pub fn node(&self, id: NodeId) -> &TaskgraphNode {
        &self.nodes[id]
    }

    /// Returns a channel.
    pub fn edge(&self, id: EdgeId) -> &TaskgraphEdge {
        &self.edges[id]
    }

    /// Iterates over tasks in insertion order.
    pub fn nodes(&self) -> impl Iterator<Item = (NodeId, &TaskgraphNode)> {
        self.nodes.iter()
    }

    /// Iterates over channels in insertion order.
    pub fn edges(&self) -> impl Iterator<Item = (EdgeId, &TaskgraphEdge)> {
        self.edges.iter()
    }

    /// Returns the number of tasks.
    pub fn num_nodes(&self) -> usize {
        self.nodes.len()
    }

    /// Returns the number of channels.
    pub fn num_edges(&self) -> usize {
        self.edges.len()
    }

    /// Channels the task produces into.
    pub fn out_edges(&self, id: NodeId) -> &[EdgeId] {
        &self.out_edges[id.index()]
    }

    /// Channels the task consumes from.
    pub fn in_edges(&self, id: NodeId) -> &[EdgeId] {
        &self.in_edges[id.index()]
    }

    /// Names of tasks reached through the task's outgoing channels,
    /// deduplicated in first-seen order.
    pub fn out_node_names(&self, id: NodeId) -> Vec<&str> {
        self.neighbour_names(self.out_edges(id), |e| &e.sinks)
    }

    /// Names of tasks feeding the task's incoming channels, deduplicated in
    /// first-seen order.
    pub fn in_node_names(&self, id: NodeId) -> Vec<&str> {
        self.neighbour_names(self.in_edges(id), |e| &e.sources)
    }

    fn neighbour_names<'a>(
        &'a self,
        edges: &[EdgeId],
        side: impl Fn(&'a TaskgraphEdge) -> &'a Vec<NodeId>,
    ) -> Vec<&'a str> {
        let mut out: Vec<&str> = Vec::new();
        for &e in edges {
            for &n in side(&self.edges[e]) {
                let name = self.nodes[n].name.as_str();
                if !out.contains(&name) {
                    out.push(name);
                }
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn diamond() -> Taskgraph {
        let mut tg = Taskgraph::new("diamond");
        for n in ["a", "b", "c", "d"] {
            tg.add_node(n).unwrap();
        }
        tg.add_edge(&["a"], &["b", "c"]).unwrap();
        tg.add_edge(&["b"], &["d"]).unwrap();
        tg.add_edge(&["c"], &["d"]).unwrap();
        tg
    }

    #[test]
    fn counts() {
        let tg = diamond();
        assert_eq!(tg.name(), "diamond");
        assert_eq!(tg.num_nodes(), 4);
        assert_eq!(tg.num_edges(), 3);
    }

    #[test]
    fn adjacency_consistent() {
        let tg = diamond();
        for (e, edge) in tg.edges() {
            for &s in &edge.sources {
                assert!(tg.out_edges(s).contains(&e));
            }
            for &t in &edge.sinks {
                assert!(tg.in_edges(t).contains(&e));
            }
        }
        let d = tg.node_id("d").unwrap();
        assert_eq!(tg.in_edges(d).len(), 2);
        assert!(tg.out_edges(d).is_empty());
    }

    #[test]
    fn neighbour_names() {
        let tg = diamond();
        let a = tg.node_id("a").unwrap();
        let d = tg.node_id("d").unwrap();
        assert_eq!(tg.out_node_names(a), vec!["b", "c"]);
        assert_eq!(tg.in_node_names(d), vec!["b", "c"]);
        assert!(tg.in_node_names(a).is_empty());
    }

    #[test]
    fn duplicate_node() {
        let mut tg = diamond();
        assert_eq!(
            tg.add_node("a").unwrap_err(),
            TaskgraphError::DuplicateNode("a".into())
        );
    }

    #[test]
    fn unknown_endpoint_leaves_graph_unchanged() {
        let mut tg = diamond();
        let err = tg.add_edge(&["a"], &["zz"]).unwrap_err();
        assert_eq!(err, TaskgraphError::UnknownNode("zz".into()));
        assert_eq!(tg.num_edges(), 3);
        let a = tg.node_id("a").unwrap();
        assert_eq!(tg.out_edges(a).len(), 1);
    }

    #[test]
    fn empty_edge() {
        let mut tg = diamond();
        assert_eq!(tg.add_edge(&[], &["a"]).unwrap_err(), TaskgraphError::EmptyEdge);
    }

    #[test]
    fn metadata_and_serde() {
        let mut tg = Taskgraph::new("m");
        let mut meta = Metadata::new();
        meta.insert("kind".into(), json!("input"));
        tg.add_node_with_metadata("x", meta).unwrap();
        tg.add_node("y").unwrap();
        tg.add_edge(&["x"], &["y"]).unwrap();

        let json = serde_json::to_string(&tg).unwrap();
        let back: Taskgraph = serde_json::from_str(&json).unwrap();
        let x = back.node_id("x").unwrap();
        assert_eq!(back.node(x).metadata["kind"], json!("input"));
        assert_eq!(back.out_edges(x).len(), 1);
    }
}
