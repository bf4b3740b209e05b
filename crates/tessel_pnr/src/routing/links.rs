//! Per-resource routing records.

use serde::{Deserialize, Serialize};

/// Occupancy, base cost, and capacity of one routing resource.
///
/// Rule sets build these through [`RuleSet::annotate`](crate::RuleSet::annotate)
/// and may pick any base cost and capacity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoutingLink {
    channels: Vec<u32>,
    cost: f64,
    capacity: usize,
}

impl RoutingLink {
    /// Creates an unoccupied record.
    pub fn new(cost: f64, capacity: usize) -> Self {
        Self {
            channels: Vec::new(),
            cost,
            capacity,
        }
    }

    /// Channels currently occupying the resource.
    pub fn channels(&self) -> &[u32] {
        &self.channels
    }

    /// Base cost of using the resource.
    pub fn cost(&self) -> f64 {
        self.cost
    }

    /// Number of channels the resource can carry.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of occupying channels.
    pub fn occupancy(&self) -> usize {
        self.channels.len()
    }

    /// Adds a channel; adding the same channel twice has no effect.
    pub fn add_channel(&mut self, channel: u32) {
        if !self.channels.contains(&channel) {
            self.channels.push(channel);
        }
    }

    /// Removes a channel if present.
    pub fn remove_channel(&mut self, channel: u32) {
        self.channels.retain(|&c| c != channel);
    }

    /// Returns `true` when more channels occupy the resource than it holds.
    pub fn is_congested(&self) -> bool {
        self.occupancy() > self.capacity
    }

    /// Channels beyond capacity.
    pub fn overuse(&self) -> usize {
        self.occupancy().saturating_sub(self.capacity)
    }
}
