//! Interned instance, port, and link names.
//!
//! Architecture paths are dotted sequences of names (`tile_0.pe[1].out`).
//! Each segment is interned once, so scope lookups hash a `u32` instead of a
//! string.

use lasso::ThreadedRodeo;
use serde::{Deserialize, Serialize};
use std::fmt;

/// One interned path segment.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize, Deserialize)]
pub struct Ident(u32);

// SAFETY: `try_from_usize` only yields values that `into_usize` maps back to
// the same `usize`.
unsafe impl lasso::Key for Ident {
    fn into_usize(self) -> usize {
        self.0 as usize
    }

    fn try_from_usize(int: usize) -> Option<Self> {
        u32::try_from(int).ok().map(Ident)
    }
}

/// Name table of one architecture.
pub struct Interner {
    names: ThreadedRodeo<Ident>,
}

impl Interner {
    /// Creates an empty table.
    pub fn new() -> Self {
        Self {
            names: ThreadedRodeo::new(),
        }
    }

    /// Returns the segment for `name`, adding it if unseen.
    pub fn intern(&self, name: &str) -> Ident {
        self.names.get_or_intern(name)
    }

    /// Returns the segment for `name` if it was ever interned.
    ///
    /// A name that was never interned cannot appear in any scope.
    pub fn lookup(&self, name: &str) -> Option<Ident> {
        self.names.get(name)
    }

    /// Splits a dotted path and looks up every segment.
    ///
    /// Returns `None` as soon as one segment is unknown.
    pub fn lookup_path(&self, path: &str) -> Option<Vec<Ident>> {
        path.split('.').map(|segment| self.lookup(segment)).collect()
    }

    /// Text of a segment.
    ///
    /// # Panics
    ///
    /// Panics if `ident` came from another table.
    pub fn name(&self, ident: Ident) -> &str {
        self.names.resolve(&ident)
    }

    /// Number of distinct names.
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// Returns `true` if nothing has been interned.
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

impl Default for Interner {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Interner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Interner({} names)", self.len())
    }
}
