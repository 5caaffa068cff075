//! Phantom-typed sequential identifiers.
//!
//! Places, transitions, and arcs are addressed by small sequential IDs of the
//! shape `P<n>` / `T<n>` / `A<n>` (see the model file contract). [`Id<T>`]
//! wraps the numeric index with a zero-sized marker so `Id<Place>` and
//! `Id<Transition>` are distinct types at compile time even though both are
//! backed by a `usize`.

use std::cmp::Ordering;
use std::fmt::Debug;
use std::fmt::Display;
use std::fmt::Formatter;
use std::hash::Hash;
use std::hash::Hasher;
use std::marker::PhantomData;

/// Marker type for place identifiers. Never instantiated.
pub struct Place;
/// Marker type for transition identifiers. Never instantiated.
pub struct Transition;
/// Marker type for arc identifiers. Never instantiated.
pub struct Arc;

/// Generic ID wrapper providing compile-time type safety over a sequential index.
pub struct Id<T> {
    index: usize,
    marker: PhantomData<T>,
}

impl<T> Id<T> {
    pub fn new(index: usize) -> Self {
        Self {
            index,
            marker: PhantomData,
        }
    }

    pub fn index(&self) -> usize {
        self.index
    }

    /// Cast `Id<T>` to `Id<U>` while preserving the underlying index.
    pub fn cast<U>(self) -> Id<U> {
        Id {
            index: self.index,
            marker: PhantomData,
        }
    }
}

/// Parses a prefixed ID string (`"P3"`, `"T12"`, `"A0"`) into its numeric index.
/// `prefix` is the expected leading letter; any other leading character is an error.
pub fn parse_index(prefix: char, text: &str) -> anyhow::Result<usize> {
    let mut chars = text.chars();
    match chars.next() {
        Some(c) if c == prefix => {}
        _ => anyhow::bail!("id {:?} does not start with '{}'", text, prefix),
    }
    chars
        .as_str()
        .parse::<usize>()
        .map_err(|_| anyhow::anyhow!("id {:?} has a non-numeric suffix", text))
}

impl<T> Copy for Id<T> {}
impl<T> Clone for Id<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Eq for Id<T> {}
impl<T> PartialEq for Id<T> {
    fn eq(&self, other: &Self) -> bool {
        self.index == other.index
    }
}

impl<T> Ord for Id<T> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.index.cmp(&other.index)
    }
}
impl<T> PartialOrd for Id<T> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<T> Hash for Id<T> {
    fn hash<H>(&self, state: &mut H)
    where
        H: Hasher,
    {
        self.index.hash(state);
    }
}

impl<T> Debug for Id<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("Id").field(&self.index).finish()
    }
}

pub type PlaceId = Id<Place>;
pub type TransitionId = Id<Transition>;
pub type ArcId = Id<Arc>;

impl Display for PlaceId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "P{}", self.index)
    }
}
impl Display for TransitionId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "T{}", self.index)
    }
}
impl Display for ArcId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "A{}", self.index)
    }
}
