//! Values held by the in-process store
//!
//! One `StoredValue` per key. Collections that become empty are removed by
//! the store, so an empty collection is never observable.

use crate::zset::ZSetValue;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, VecDeque};
use sugar_core::KeyType;

/// Value stored under one key
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum StoredValue {
    /// Sequence
    List(VecDeque<String>),
    /// Field table (ordered for deterministic enumeration)
    Hash(BTreeMap<String, String>),
    /// Unordered set (ordered for deterministic enumeration)
    Set(BTreeSet<String>),
    /// Ordered-score set
    ZSet(ZSetValue),
    /// Scalar, byte-addressed like the remote store's strings
    Str(Vec<u8>),
}

impl StoredValue {
    /// Remote type of this value
    pub fn key_type(&self) -> KeyType {
        match self {
            StoredValue::List(_) => KeyType::List,
            StoredValue::Hash(_) => KeyType::Hash,
            StoredValue::Set(_) => KeyType::Set,
            StoredValue::ZSet(_) => KeyType::ZSet,
            StoredValue::Str(_) => KeyType::String,
        }
    }

    /// Collection with no elements
    pub fn is_empty_collection(&self) -> bool {
        match self {
            StoredValue::List(l) => l.is_empty(),
            StoredValue::Hash(h) => h.is_empty(),
            StoredValue::Set(s) => s.is_empty(),
            StoredValue::ZSet(z) => z.is_empty(),
            StoredValue::Str(_) => false,
        }
    }
}

/// A value plus its absolute expiry (milliseconds since the Unix epoch)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entry {
    /// The value
    pub value: StoredValue,
    /// Expiry instant, if any
    pub expires_at: Option<u64>,
}

impl Entry {
    /// Entry without expiry
    pub fn new(value: StoredValue) -> Self {
        Self {
            value,
            expires_at: None,
        }
    }

    /// Whether the entry is expired at `now_ms`
    pub fn is_expired(&self, now_ms: u64) -> bool {
        self.expires_at.map_or(false, |at| at <= now_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_type() {
        assert_eq!(StoredValue::Str(b"x".to_vec()).key_type(), KeyType::String);
        assert_eq!(StoredValue::List(VecDeque::new()).key_type(), KeyType::List);
        assert_eq!(StoredValue::ZSet(ZSetValue::default()).key_type(), KeyType::ZSet);
    }

    #[test]
    fn test_empty_collection() {
        assert!(StoredValue::Set(BTreeSet::new()).is_empty_collection());
        assert!(!StoredValue::Str(Vec::new()).is_empty_collection());
    }

    #[test]
    fn test_entry_expiry() {
        let mut e = Entry::new(StoredValue::Str(b"v".to_vec()));
        assert!(!e.is_expired(u64::MAX));
        e.expires_at = Some(100);
        assert!(!e.is_expired(99));
        assert!(e.is_expired(100));
    }
}
