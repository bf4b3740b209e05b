//! The top-level mapping problem: rule set, architecture, taskgraph, result.

use crate::mapping::Mapping;
use crate::ruleset::RuleSet;
use tessel_arch::Architecture;
use tessel_taskgraph::Taskgraph;

/// Bundles everything the engines read and the record they write.
///
/// The architecture and taskgraph are never mutated after construction;
/// only `mapping` changes as placement and routing run.
#[derive(Debug)]
pub struct Map<R: RuleSet> {
    /// Legality and cost customization.
    pub rules: R,
    /// Target architecture.
    pub architecture: Architecture,
    /// Application taskgraph.
    pub taskgraph: Taskgraph,
    /// Placement and routing result.
    pub mapping: Mapping,
}

impl<R: RuleSet> Map<R> {
    /// Creates a map with an empty mapping record.
    pub fn new(rules: R, architecture: Architecture, taskgraph: Taskgraph) -> Self {
        let mapping = Mapping::new(&taskgraph);
        Self {
            rules,
            architecture,
            taskgraph,
            mapping,
        }
    }

    /// Returns a human-readable path for where a task is placed.
    pub fn location_path(&self, task: &str) -> Option<String> {
        self.mapping
            .location(task)
            .map(|c| self.architecture.component_path(c))
    }
}
