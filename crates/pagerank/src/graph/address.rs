//! Typed graph addresses
//!
//! An address is a sequence of string parts. Its canonical form is a kind
//! marker followed by NUL-terminated parts, e.g. `N\0github\0user\0alice\0`.
//! Ordering, equality and prefix matching all operate on the canonical form,
//! so a prefix always sorts before its extensions.

use credrank_common::errors::{RankError, Result};
use serde::ser::{Serialize, Serializer};
use std::fmt;
use std::marker::PhantomData;

const SEPARATOR: char = '\0';

/// Marker distinguishing node addresses from edge addresses
pub trait AddressKind {
    const MARKER: &'static str;
    const NAME: &'static str;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EdgeKind;

impl AddressKind for NodeKind {
    const MARKER: &'static str = "N";
    const NAME: &'static str = "NodeAddress";
}

impl AddressKind for EdgeKind {
    const MARKER: &'static str = "E";
    const NAME: &'static str = "EdgeAddress";
}

/// Totally ordered, prefix-matchable address
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Address<K> {
    canonical: String,
    kind: PhantomData<K>,
}

pub type NodeAddress = Address<NodeKind>;
pub type EdgeAddress = Address<EdgeKind>;

impl<K: AddressKind> Address<K> {
    /// The address with no parts; a prefix of every address of this kind
    pub fn empty() -> Self {
        let mut canonical = String::with_capacity(K::MARKER.len() + 1);
        canonical.push_str(K::MARKER);
        canonical.push(SEPARATOR);
        Self {
            canonical,
            kind: PhantomData,
        }
    }

    /// Build an address from its parts
    pub fn from_parts<I, S>(parts: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self::empty().append(parts)
    }

    /// Extend this address with more parts
    pub fn append<I, S>(&self, parts: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut canonical = self.canonical.clone();
        for part in parts {
            let part = part.as_ref();
            if part.contains(SEPARATOR) {
                return Err(RankError::InvalidAddress {
                    part: part.to_string(),
                });
            }
            canonical.push_str(part);
            canonical.push(SEPARATOR);
        }
        Ok(Self {
            canonical,
            kind: PhantomData,
        })
    }

    /// The parts this address was built from
    pub fn parts(&self) -> Vec<&str> {
        let body = &self.canonical[K::MARKER.len() + 1..];
        body.split_terminator(SEPARATOR).collect()
    }

    /// Whether `prefix`'s parts are a leading run of this address's parts
    pub fn has_prefix(&self, prefix: &Self) -> bool {
        self.canonical.starts_with(&prefix.canonical)
    }

    pub fn is_empty(&self) -> bool {
        self.canonical.len() == K::MARKER.len() + 1
    }

    /// Canonical string form, the key of the total order
    pub fn as_str(&self) -> &str {
        &self.canonical
    }
}

impl<K: AddressKind> fmt::Display for Address<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{:?}", K::NAME, self.parts())
    }
}

impl<K: AddressKind> fmt::Debug for Address<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

// Serialized in display form so addresses can key JSON maps
impl<K: AddressKind> Serialize for Address<K> {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}
