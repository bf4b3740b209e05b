//! Append-only storage keyed by dense `u32` IDs.
//!
//! Components, ports, links, tasks, and edges each live in an [`Arena`].
//! Nothing is ever removed, so an ID handed out once stays valid, and IDs
//! double as indices into side tables such as per-vertex routing records.

use serde::{Deserialize, Serialize};
use std::marker::PhantomData;
use std::ops::{Index, IndexMut};

/// A dense ID usable as an arena key.
pub trait ArenaId: Copy {
    /// The ID at a position.
    fn from_index(index: usize) -> Self;

    /// Position of the ID.
    fn index(self) -> usize;
}

/// Declares a `u32` ID newtype for use with [`Arena`].
///
/// The calling crate must depend on `serde`.
#[macro_export]
macro_rules! define_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(
            Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug,
            ::serde::Serialize, ::serde::Deserialize,
        )]
        pub struct $name(u32);

        impl $name {
            /// Wraps a raw index.
            pub fn from_raw(index: u32) -> Self {
                Self(index)
            }

            /// The raw index.
            pub fn as_raw(self) -> u32 {
                self.0
            }

            /// The raw index as `usize`.
            pub fn index(self) -> usize {
                self.0 as usize
            }
        }

        impl $crate::ArenaId for $name {
            fn from_index(index: usize) -> Self {
                debug_assert!(index <= u32::MAX as usize);
                Self(index as u32)
            }

            fn index(self) -> usize {
                self.0 as usize
            }
        }

        impl ::std::fmt::Display for $name {
            fn fmt(&self, f: &mut ::std::fmt::Formatter<'_>) -> ::std::fmt::Result {
                ::std::fmt::Display::fmt(&self.0, f)
            }
        }
    };
}

/// Items of one kind, addressed by `I`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Arena<I, T> {
    items: Vec<T>,
    #[serde(skip)]
    key: PhantomData<fn() -> I>,
}

impl<I, T> Default for Arena<I, T> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            key: PhantomData,
        }
    }
}

impl<I: ArenaId, T> Arena<I, T> {
    /// Creates an empty arena.
    pub fn new() -> Self {
        Self::default()
    }

    /// The ID the next [`alloc`](Self::alloc) returns.
    ///
    /// Lets a builder wire cross references to an item before it exists.
    pub fn next_id(&self) -> I {
        I::from_index(self.items.len())
    }

    /// Appends an item.
    pub fn alloc(&mut self, item: T) -> I {
        let id = self.next_id();
        self.items.push(item);
        id
    }

    /// Number of items.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Returns `true` if nothing has been allocated.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Whether `id` was handed out by this arena.
    pub fn contains(&self, id: I) -> bool {
        id.index() < self.items.len()
    }

    /// `(id, item)` pairs in allocation order.
    pub fn iter(&self) -> impl Iterator<Item = (I, &T)> {
        self.items.iter().enumerate().map(|(i, item)| (I::from_index(i), item))
    }

    /// Items in allocation order.
    pub fn values(&self) -> impl Iterator<Item = &T> {
        self.items.iter()
    }
}

impl<I: ArenaId, T> Index<I> for Arena<I, T> {
    type Output = T;

    fn index(&self, id: I) -> &T {
        &self.items[id.index()]
    }
}

impl<I: ArenaId, T> IndexMut<I> for Arena<I, T> {
    fn index_mut(&mut self, id: I) -> &mut T {
        &mut self.items[id.index()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    crate::define_id!(
        /// Test key.
        SlotId
    );

    #[test]
    fn next_id_is_what_alloc_returns() {
        let mut ports: Arena<SlotId, &str> = Arena::new();
        ports.alloc("in");
        let next = ports.next_id();
        assert_eq!(ports.alloc("out"), next);
        assert_eq!(ports[next], "out");
        assert_eq!(next.index(), 1);
    }

    #[test]
    fn index_mut_updates_in_place() {
        let mut counts: Arena<SlotId, u32> = Arena::new();
        let id = counts.alloc(1);
        counts[id] += 4;
        assert_eq!(counts[id], 5);
    }

    #[test]
    fn contains_only_allocated() {
        let mut names: Arena<SlotId, String> = Arena::new();
        assert!(!names.contains(SlotId::from_raw(0)));
        names.alloc("tile".into());
        assert!(names.contains(SlotId::from_raw(0)));
        assert!(!names.contains(SlotId::from_raw(1)));
    }

    #[test]
    fn iteration_follows_allocation() {
        let mut arena: Arena<SlotId, char> = Arena::new();
        for c in ['a', 'b', 'c'] {
            arena.alloc(c);
        }
        let pairs: Vec<(u32, char)> = arena.iter().map(|(id, &c)| (id.as_raw(), c)).collect();
        assert_eq!(pairs, vec![(0, 'a'), (1, 'b'), (2, 'c')]);
        assert_eq!(arena.values().count(), 3);
        assert_eq!(SlotId::from_raw(2).to_string(), "2");
    }

    #[test]
    fn serializes_as_plain_list() {
        let mut arena: Arena<SlotId, u8> = Arena::new();
        arena.alloc(7);
        arena.alloc(9);
        let json = serde_json::to_string(&arena).unwrap();
        assert_eq!(json, "[7,9]");
        let back: Arena<SlotId, u8> = serde_json::from_str(&json).unwrap();
        assert_eq!(back[SlotId::from_raw(1)], 9);
    }
}
