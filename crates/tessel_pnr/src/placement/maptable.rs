//! Per-class legality tables.
//!
//! A map table answers "may a task of class `c` sit at location `l`". Two
//! variants share the [`MapTable`] interface: [`FlatMapTable`] for
//! architectures with at most one mappable slot per address, which stores a
//! boolean per (class, address), and [`SlottedMapTable`], which stores the
//! legal slot list per (class, address).

use serde::{Deserialize, Serialize};

/// A placement location: an address index and a slot within that address.
///
/// On flat architectures the slot is always `0`.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize, Deserialize)]
pub struct Location {
    /// Index into the sorted address list.
    pub address: u32,
    /// Index into the address's mappable components.
    pub slot: u16,
}

impl Location {
    /// Creates a location.
    pub fn new(address: usize, slot: usize) -> Self {
        Self {
            address: address as u32,
            slot: slot as u16,
        }
    }

    /// The address index as `usize`.
    pub fn address(self) -> usize {
        self.address as usize
    }
}

/// Legality lookup from (class, location).
pub trait MapTable: Sync + Sized {
    /// Whether this table assumes one slot per address.
    const IS_FLAT: bool;

    /// Builds the table from `legal[class][address][slot]`.
    fn from_legality(legal: &[Vec<Vec<bool>>]) -> Self;

    /// Number of equivalence classes.
    fn num_classes(&self) -> usize;

    /// Whether `location` is legal for `class`.
    fn is_valid(&self, class: usize, location: Location) -> bool;

    /// Whether any slot at `address` is legal for `class`.
    fn has_address(&self, class: usize, address: usize) -> bool;

    /// Legal slots at `address` for `class`.
    fn slots(&self, class: usize, address: usize) -> &[u16];

    /// All legal locations for `class`, in address order.
    fn locations(&self, class: usize) -> Vec<Location>;
}

const ONLY_SLOT: [u16; 1] = [0];

/// Boolean mask indexed by (class, address).
#[derive(Debug, Clone)]
pub struct FlatMapTable {
    mask: Vec<Vec<bool>>,
}

impl MapTable for FlatMapTable {
    const IS_FLAT: bool = true;

    fn from_legality(legal: &[Vec<Vec<bool>>]) -> Self {
        let mask = legal
            .iter()
            .map(|by_address| {
                by_address
                    .iter()
                    .map(|slots| {
                        debug_assert!(slots.len() <= 1);
                        slots.first().copied().unwrap_or(false)
                    })
                    .collect()
            })
            .collect();
        Self { mask }
    }

    fn num_classes(&self) -> usize {
        self.mask.len()
    }

    fn is_valid(&self, class: usize, location: Location) -> bool {
        location.slot == 0 && self.mask[class].get(location.address()).copied().unwrap_or(false)
    }

    fn has_address(&self, class: usize, address: usize) -> bool {
        self.mask[class][address]
    }

    fn slots(&self, class: usize, address: usize) -> &[u16] {
        if self.mask[class][address] {
            &ONLY_SLOT
        } else {
            &[]
        }
    }

    fn locations(&self, class: usize) -> Vec<Location> {
        self.mask[class]
            .iter()
            .enumerate()
            .filter(|&(_, &ok)| ok)
            .map(|(a, _)| Location::new(a, 0))
            .collect()
    }
}

/// Legal slot lists indexed by (class, address).
#[derive(Debug, Clone)]
pub struct SlottedMapTable {
    table: Vec<Vec<Vec<u16>>>,
}

impl MapTable for SlottedMapTable {
    const IS_FLAT: bool = false;

    fn from_legality(legal: &[Vec<Vec<bool>>]) -> Self {
        let table = legal
            .iter()
            .map(|by_address| {
                by_address
                    .iter()
                    .map(|slots| {
                        slots
                            .iter()
                            .enumerate()
                            .filter(|&(_, &ok)| ok)
                            .map(|(s, _)| s as u16)
                            .collect()
                    })
                    .collect()
            })
            .collect();
        Self { table }
    }

    fn num_classes(&self) -> usize {
        self.table.len()
    }

    fn is_valid(&self, class: usize, location: Location) -> bool {
        self.table[class]
            .get(location.address())
            .is_some_and(|slots| slots.contains(&location.slot))
    }

    fn has_address(&self, class: usize, address: usize) -> bool {
        !self.table[class][address].is_empty()
    }

    fn slots(&self, class: usize, address: usize) -> &[u16] {
        &self.table[class][address]
    }

    fn locations(&self, class: usize) -> Vec<Location> {
        self.table[class]
            .iter()
            .enumerate()
            .flat_map(|(a, slots)| slots.iter().map(move |&s| Location::new(a, s as usize)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // class 0 legal everywhere, class 1 only at address 1
    fn flat_legal() -> Vec<Vec<Vec<bool>>> {
        vec![
            vec![vec![true], vec![true], vec![true]],
            vec![vec![false], vec![true], vec![false]],
        ]
    }

    fn slotted_legal() -> Vec<Vec<Vec<bool>>> {
        vec![
            vec![vec![true, false], vec![true, true]],
            vec![vec![false, true], vec![]],
        ]
    }

    #[test]
    fn flat_lookups() {
        let t = FlatMapTable::from_legality(&flat_legal());
        assert_eq!(t.num_classes(), 2);
        assert!(t.is_valid(0, Location::new(2, 0)));
        assert!(!t.is_valid(1, Location::new(2, 0)));
        assert!(!t.is_valid(0, Location::new(2, 1)));
        assert_eq!(t.slots(1, 1), &[0]);
        assert!(t.slots(1, 0).is_empty());
        assert_eq!(t.locations(1), vec![Location::new(1, 0)]);
    }

    #[test]
    fn slotted_lookups() {
        let t = SlottedMapTable::from_legality(&slotted_legal());
        assert!(t.is_valid(0, Location::new(1, 1)));
        assert!(!t.is_valid(0, Location::new(0, 1)));
        assert!(t.is_valid(1, Location::new(0, 1)));
        assert!(!t.has_address(1, 1));
        assert_eq!(t.slots(0, 1), &[0, 1]);
        assert_eq!(
            t.locations(0),
            vec![Location::new(0, 0), Location::new(1, 0), Location::new(1, 1)]
        );
    }

    #[test]
    fn variants_agree_on_flat_input() {
        let legal = flat_legal();
        let flat = FlatMapTable::from_legality(&legal);
        let slotted = SlottedMapTable::from_legality(&legal);
        for class in 0..2 {
            assert_eq!(flat.locations(class), slotted.locations(class));
            for a in 0..3 {
                let loc = Location::new(a, 0);
                assert_eq!(flat.is_valid(class, loc), slotted.is_valid(class, loc));
            }
        }
    }
}
