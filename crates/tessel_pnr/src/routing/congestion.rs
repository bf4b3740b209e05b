//! Congestion costs for negotiated congestion routing.
//!
//! Resources that stay overused across iterations accumulate history cost,
//! and the present-congestion factor grows every iteration, so channels
//! gradually negotiate their way onto disjoint resources.

use crate::routing::links::RoutingLink;
use tessel_config::{HistoryConfig, RouteConfig};

/// History cost per resource plus the present-congestion factor.
#[derive(Debug, Clone)]
pub struct CongestionMap {
    history: Vec<f64>,
    present_factor: f64,
    present_growth: f64,
    policy: HistoryConfig,
}

impl CongestionMap {
    /// Creates a map for `len` resources with no history.
    pub fn new(len: usize, config: &RouteConfig) -> Self {
        Self {
            history: vec![0.0; len],
            present_factor: config.present_factor,
            present_growth: config.present_growth,
            policy: config.history.clone(),
        }
    }

    /// History cost of a resource.
    pub fn history(&self, index: usize) -> f64 {
        self.history[index]
    }

    /// Current present-congestion factor.
    pub fn present_factor(&self) -> f64 {
        self.present_factor
    }

    /// Cost for one more channel to use the resource.
    ///
    /// `(base + history) * (1 + present_factor * overuse)`, where `overuse`
    /// counts the channels beyond capacity once this one is added.
    pub fn resource_cost(&self, index: usize, link: &RoutingLink) -> f64 {
        let overuse = (link.occupancy() + 1).saturating_sub(link.capacity());
        (link.cost() + self.history[index]) * (1.0 + self.present_factor * overuse as f64)
    }

    /// Ends an iteration: grows history of every congested resource and the
    /// present-congestion factor. Returns the number of congested resources.
    pub fn update(&mut self, links: &[RoutingLink]) -> usize {
        let mut congested = 0;
        for (h, link) in self.history.iter_mut().zip(links) {
            if link.is_congested() {
                *h = self.policy.grow(*h, link.overuse());
                congested += 1;
            }
        }
        self.present_factor *= self.present_growth;
        congested
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn used(channels: &[u32], capacity: usize) -> RoutingLink {
        let mut link = RoutingLink::new(1.0, capacity);
        for &c in channels {
            link.add_channel(c);
        }
        link
    }

    #[test]
    fn free_resource_costs_base() {
        let map = CongestionMap::new(1, &RouteConfig::default());
        assert_eq!(map.resource_cost(0, &used(&[], 1)), 1.0);
    }

    #[test]
    fn occupied_resource_costs_more() {
        let map = CongestionMap::new(1, &RouteConfig::default());
        let free = map.resource_cost(0, &used(&[], 1));
        let full = map.resource_cost(0, &used(&[0], 1));
        let over = map.resource_cost(0, &used(&[0, 1], 1));
        assert!(free < full);
        assert!(full < over);
    }

    #[test]
    fn update_grows_history_only_where_congested() {
        let config = RouteConfig::default();
        let mut map = CongestionMap::new(2, &config);
        let links = vec![used(&[0, 1], 1), used(&[0], 1)];
        assert_eq!(map.update(&links), 1);
        assert!(map.history(0) > 0.0);
        assert_eq!(map.history(1), 0.0);
        assert_eq!(map.present_factor(), config.present_factor * config.present_growth);
    }
}
