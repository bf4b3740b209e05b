//! Declarative connection rules for regular top-level interconnect.

use crate::address::Offset;
use crate::types::Component;
use serde_json::Value;
use tessel_common::Metadata;

/// Links a port of every matching top-level component to a port of the
/// components found at each offset.
///
/// Components missing either port are skipped, so one rule can be applied
/// across a heterogeneous grid.
#[derive(Debug, Clone)]
pub struct ConnectionRule {
    /// Displacements from the source address to candidate destinations.
    pub offsets: Vec<Offset>,
    /// Source port path relative to the top-level component.
    pub source_port: String,
    /// Destination port path relative to the top-level component.
    pub dest_port: String,
    /// Only components of this primitive act as sources.
    pub source_primitive: Option<String>,
    /// Only components of this primitive act as destinations.
    pub dest_primitive: Option<String>,
    /// Metadata copied onto every created link.
    pub metadata: Metadata,
}

impl ConnectionRule {
    /// Creates an unfiltered rule.
    pub fn new(offsets: Vec<Offset>, source_port: impl Into<String>, dest_port: impl Into<String>) -> Self {
        Self {
            offsets,
            source_port: source_port.into(),
            dest_port: dest_port.into(),
            source_primitive: None,
            dest_primitive: None,
            metadata: Metadata::new(),
        }
    }

    /// Restricts sources to one primitive.
    pub fn with_source_primitive(mut self, primitive: impl Into<String>) -> Self {
        self.source_primitive = Some(primitive.into());
        self
    }

    /// Restricts destinations to one primitive.
    pub fn with_dest_primitive(mut self, primitive: impl Into<String>) -> Self {
        self.dest_primitive = Some(primitive.into());
        self
    }

    /// Sets a metadata entry on created links.
    pub fn with_metadata(mut self, key: impl Into<String>, value: Value) -> Self {
        self.metadata.insert(key.into(), value);
        self
    }

    pub(crate) fn matches_source(&self, component: &Component) -> bool {
        self.source_primitive
            .as_deref()
            .map_or(true, |p| p == component.primitive)
    }

    pub(crate) fn matches_dest(&self, component: &Component) -> bool {
        self.dest_primitive
            .as_deref()
            .map_or(true, |p| p == component.primitive)
    }
}
