//! Address distance metrics.

use rayon::prelude::*;
use std::collections::VecDeque;
use tessel_arch::{Address, Architecture};

/// A distance between address indices, used for channel cost and for
/// bounding move distance.
pub trait Distance: Sync {
    /// Distance from one address to another.
    fn distance(&self, from: usize, to: usize) -> u32;

    /// Largest finite distance between any two addresses.
    fn max_distance(&self) -> u32;
}

/// All-pairs hop distance over the address connectivity graph.
///
/// Addresses joined by a link are one hop apart. Distances follow link
/// direction. Pairs with no path get a penalty equal to the number of
/// addresses, which is larger than any real hop count.
#[derive(Debug, Clone)]
pub struct BasicDistance {
    n: usize,
    table: Vec<u32>,
    max: u32,
}

impl BasicDistance {
    /// Computes the table for the architecture's addresses, in the given order.
    pub fn new(arch: &Architecture, addresses: &[Address]) -> Self {
        let index: std::collections::HashMap<&Address, usize> =
            addresses.iter().enumerate().map(|(i, a)| (a, i)).collect();
        let connected = arch.connected_addresses();
        let adjacency: Vec<Vec<usize>> = addresses
            .iter()
            .map(|a| {
                connected
                    .get(a)
                    .into_iter()
                    .flatten()
                    .filter_map(|b| index.get(b).copied())
                    .collect()
            })
            .collect();
        Self::from_adjacency(&adjacency)
    }

    /// Computes the table from an adjacency list, one BFS per source in
    /// parallel.
    pub fn from_adjacency(adjacency: &[Vec<usize>]) -> Self {
        let n = adjacency.len();
        let unreachable = n as u32;
        let rows: Vec<Vec<u32>> = (0..n)
            .into_par_iter()
            .map(|src| {
                let mut row = vec![u32::MAX; n];
                row[src] = 0;
                let mut queue = VecDeque::from([src]);
                while let Some(a) = queue.pop_front() {
                    for &b in &adjacency[a] {
                        if row[b] == u32::MAX {
                            row[b] = row[a] + 1;
                            queue.push_back(b);
                        }
                    }
                }
                row
            })
            .collect();

        let max = rows
            .iter()
            .flatten()
            .copied()
            .filter(|&d| d != u32::MAX)
            .max()
            .unwrap_or(0);
        let table = rows
            .into_iter()
            .flatten()
            .map(|d| if d == u32::MAX { unreachable } else { d })
            .collect();
        Self { n, table, max }
    }
}

impl Distance for BasicDistance {
    fn distance(&self, from: usize, to: usize) -> u32 {
        self.table[from * self.n + to]
    }

    fn max_distance(&self) -> u32 {
        self.max
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chain_distances() {
        // 0 -> 1 -> 2
        let d = BasicDistance::from_adjacency(&[vec![1], vec![2], vec![]]);
        assert_eq!(d.distance(0, 0), 0);
        assert_eq!(d.distance(0, 1), 1);
        assert_eq!(d.distance(0, 2), 2);
        assert_eq!(d.max_distance(), 2);
    }

    #[test]
    fn unreachable_gets_penalty() {
        let d = BasicDistance::from_adjacency(&[vec![1], vec![2], vec![]]);
        assert_eq!(d.distance(2, 0), 3);
        assert!(d.distance(2, 0) > d.max_distance());
    }

    #[test]
    fn bidirectional_ring() {
        let n = 6;
        let adj: Vec<Vec<usize>> = (0..n).map(|i| vec![(i + 1) % n, (i + n - 1) % n]).collect();
        let d = BasicDistance::from_adjacency(&adj);
        assert_eq!(d.distance(0, 3), 3);
        assert_eq!(d.distance(0, 5), 1);
        assert_eq!(d.max_distance(), 3);
    }

    #[test]
    fn empty_architecture() {
        let d = BasicDistance::from_adjacency(&[]);
        assert_eq!(d.max_distance(), 0);
    }
}
