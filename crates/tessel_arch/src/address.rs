//! Integer-tuple coordinates for top-level components.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Location of a top-level component in the architecture's D-dimensional grid.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize, Deserialize)]
pub struct Address(Vec<i64>);

impl Address {
    /// Creates an address from its coordinates.
    pub fn new(coords: impl Into<Vec<i64>>) -> Self {
        Self(coords.into())
    }

    /// Returns the number of dimensions.
    pub fn dims(&self) -> usize {
        self.0.len()
    }

    /// Returns the coordinates.
    pub fn coords(&self) -> &[i64] {
        &self.0
    }

    /// Returns `self + offset`, or `None` if the dimensionalities differ.
    pub fn offset(&self, offset: &Offset) -> Option<Address> {
        if offset.0.len() != self.0.len() {
            return None;
        }
        Some(Address(
            self.0.iter().zip(&offset.0).map(|(a, b)| a + b).collect(),
        ))
    }
}

impl<const N: usize> From<[i64; N]> for Address {
    fn from(coords: [i64; N]) -> Self {
        Self(coords.to_vec())
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(")?;
        for (i, c) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{c}")?;
        }
        write!(f, ")")
    }
}

/// A relative displacement between two addresses, used by connection rules.
#[derive(Clone, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub struct Offset(Vec<i64>);

impl Offset {
    /// Creates an offset from its per-dimension deltas.
    pub fn new(deltas: impl Into<Vec<i64>>) -> Self {
        Self(deltas.into())
    }
}

impl<const N: usize> From<[i64; N]> for Offset {
    fn from(deltas: [i64; N]) -> Self {
        Self(deltas.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display() {
        assert_eq!(Address::from([1, -2]).to_string(), "(1, -2)");
        assert_eq!(Address::from([7]).to_string(), "(7)");
    }

    #[test]
    fn offset_applies() {
        let a = Address::from([1, 1]);
        assert_eq!(a.offset(&Offset::from([0, -1])), Some(Address::from([1, 0])));
    }

    #[test]
    fn offset_dimension_mismatch() {
        let a = Address::from([1, 1]);
        assert_eq!(a.offset(&Offset::from([1])), None);
    }

    #[test]
    fn ordering_is_lexicographic() {
        assert!(Address::from([0, 5]) < Address::from([1, 0]));
        assert!(Address::from([1, 0]) < Address::from([1, 1]));
    }
}
