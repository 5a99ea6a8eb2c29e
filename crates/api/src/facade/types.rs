//! Facade value types
//!
//! - `Entry`: the adapter bound to a key, chosen by the key's remote type
//! - `LocalValue`: an in-process value, written with `Namespace::set` and
//!   returned by `Namespace::pop` and `Entry::snapshot`

use std::collections::{HashMap, HashSet};
use sugar_core::{Error, KeyType, Result};
use sugar_primitives::{RDict, RList, RSet, RStr, SortedSet};

/// Adapter for one key, one variant per remote type
#[derive(Debug, Clone)]
pub enum Entry {
    /// Sequence
    List(RList),
    /// Mapping
    Dict(RDict),
    /// Unordered set
    Set(RSet),
    /// Ordered-score set
    SortedSet(SortedSet),
    /// Scalar
    Str(RStr),
}

macro_rules! entry_accessors {
    ($($(#[$doc:meta])* $name:ident => $variant:ident($ty:ty), $expected:literal;)*) => {
        $(
            $(#[$doc])*
            pub fn $name(self) -> Result<$ty> {
                match self {
                    Entry::$variant(adapter) => Ok(adapter),
                    other => Err(Error::type_mismatch($expected, other.key_type().as_str())),
                }
            }
        )*
    };
}

impl Entry {
    /// Remote type behind this entry
    pub fn key_type(&self) -> KeyType {
        match self {
            Entry::List(_) => KeyType::List,
            Entry::Dict(_) => KeyType::Hash,
            Entry::Set(_) => KeyType::Set,
            Entry::SortedSet(_) => KeyType::ZSet,
            Entry::Str(_) => KeyType::String,
        }
    }

    /// Namespace key
    pub fn key(&self) -> &str {
        match self {
            Entry::List(a) => a.key(),
            Entry::Dict(a) => a.key(),
            Entry::Set(a) => a.key(),
            Entry::SortedSet(a) => a.key(),
            Entry::Str(a) => a.key(),
        }
    }

    entry_accessors! {
        /// The sequence adapter, or `TypeMismatch`
        into_list => List(RList), "list";
        /// The mapping adapter, or `TypeMismatch`
        into_dict => Dict(RDict), "hash";
        /// The set adapter, or `TypeMismatch`
        into_set => Set(RSet), "set";
        /// The ordered-score set adapter, or `TypeMismatch`
        into_sorted_set => SortedSet(SortedSet), "zset";
        /// The scalar adapter, or `TypeMismatch`
        into_str => Str(RStr), "string";
    }

    /// Materialize the current remote value
    pub fn snapshot(&self) -> Result<LocalValue> {
        Ok(match self {
            Entry::List(a) => LocalValue::List(a.copy()?),
            Entry::Dict(a) => LocalValue::Dict(a.copy()?),
            Entry::Set(a) => LocalValue::Set(a.copy()?),
            Entry::SortedSet(a) => LocalValue::SortedSet(a.copy()?),
            Entry::Str(a) => LocalValue::Str(a.get()?),
        })
    }
}

/// In-process value of one of the five remote shapes
#[derive(Debug, Clone, PartialEq)]
pub enum LocalValue {
    /// Sequence elements in order
    List(Vec<String>),
    /// Field table
    Dict(HashMap<String, String>),
    /// Set members
    Set(HashSet<String>),
    /// Members and scores in rank order
    SortedSet(Vec<(String, f64)>),
    /// Scalar
    Str(String),
}

impl LocalValue {
    /// Sequence from displayable elements
    pub fn list<V: ToString>(items: impl IntoIterator<Item = V>) -> Self {
        LocalValue::List(items.into_iter().map(|v| v.to_string()).collect())
    }

    /// Mapping from displayable pairs
    pub fn dict<K: ToString, V: ToString>(pairs: impl IntoIterator<Item = (K, V)>) -> Self {
        LocalValue::Dict(
            pairs
                .into_iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        )
    }

    /// Set from displayable members
    pub fn set<V: ToString>(members: impl IntoIterator<Item = V>) -> Self {
        LocalValue::Set(members.into_iter().map(|v| v.to_string()).collect())
    }

    /// Ordered-score set from `(member, score)` entries
    pub fn sorted_set<M: ToString>(entries: impl IntoIterator<Item = (M, f64)>) -> Self {
        LocalValue::SortedSet(
            entries
                .into_iter()
                .map(|(m, s)| (m.to_string(), s))
                .collect(),
        )
    }

    /// Remote type this value is written as
    pub fn key_type(&self) -> KeyType {
        match self {
            LocalValue::List(_) => KeyType::List,
            LocalValue::Dict(_) => KeyType::Hash,
            LocalValue::Set(_) => KeyType::Set,
            LocalValue::SortedSet(_) => KeyType::ZSet,
            LocalValue::Str(_) => KeyType::String,
        }
    }

    /// Empty collection (an empty scalar is still a value)
    pub fn is_empty_collection(&self) -> bool {
        match self {
            LocalValue::List(v) => v.is_empty(),
            LocalValue::Dict(m) => m.is_empty(),
            LocalValue::Set(s) => s.is_empty(),
            LocalValue::SortedSet(z) => z.is_empty(),
            LocalValue::Str(_) => false,
        }
    }
}

impl From<Vec<String>> for LocalValue {
    fn from(items: Vec<String>) -> Self {
        LocalValue::List(items)
    }
}

impl From<Vec<&str>> for LocalValue {
    fn from(items: Vec<&str>) -> Self {
        LocalValue::list(items)
    }
}

impl From<HashMap<String, String>> for LocalValue {
    fn from(map: HashMap<String, String>) -> Self {
        LocalValue::Dict(map)
    }
}

impl From<HashSet<String>> for LocalValue {
    fn from(members: HashSet<String>) -> Self {
        LocalValue::Set(members)
    }
}

impl From<String> for LocalValue {
    fn from(s: String) -> Self {
        LocalValue::Str(s)
    }
}

impl From<&str> for LocalValue {
    fn from(s: &str) -> Self {
        LocalValue::Str(s.to_string())
    }
}

impl From<i64> for LocalValue {
    fn from(n: i64) -> Self {
        LocalValue::Str(n.to_string())
    }
}

impl From<f64> for LocalValue {
    fn from(x: f64) -> Self {
        LocalValue::Str(x.to_string())
    }
}
