//! Expiry index for keys written with a time to live
//!
//! Maps expiry instant (milliseconds since the Unix epoch) → keys, so a sweep
//! touches only the keys that are due:
//! - `insert`/`remove` keep the index in step with writes and deletes
//! - `due` lists keys whose expiry is at or before `now`
//! - `drain_due` removes those index entries

use std::collections::{BTreeMap, HashSet};
use std::time::{SystemTime, UNIX_EPOCH};

/// Current wall-clock time in milliseconds since the Unix epoch
pub fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

/// Expiry instant → keys expiring at that instant
#[derive(Debug, Default)]
pub struct TtlIndex {
    index: BTreeMap<u64, HashSet<String>>,
}

impl TtlIndex {
    /// Empty index
    pub fn new() -> Self {
        Self::default()
    }

    /// Track `key` as expiring at `expires_at`
    pub fn insert(&mut self, expires_at: u64, key: &str) {
        self.index
            .entry(expires_at)
            .or_default()
            .insert(key.to_string());
    }

    /// Stop tracking `key` at `expires_at`
    pub fn remove(&mut self, expires_at: u64, key: &str) {
        if let Some(keys) = self.index.get_mut(&expires_at) {
            keys.remove(key);
            if keys.is_empty() {
                self.index.remove(&expires_at);
            }
        }
    }

    /// Keys due at or before `now`
    pub fn due(&self, now: u64) -> Vec<String> {
        self.index
            .range(..=now)
            .flat_map(|(_, keys)| keys.iter().cloned())
            .collect()
    }

    /// Remove and return every key due at or before `now`
    pub fn drain_due(&mut self, now: u64) -> Vec<String> {
        let instants: Vec<u64> = self.index.range(..=now).map(|(at, _)| *at).collect();
        let mut out = Vec::new();
        for at in instants {
            if let Some(keys) = self.index.remove(&at) {
                out.extend(keys);
            }
        }
        out
    }

    /// Forget everything
    pub fn clear(&mut self) {
        self.index.clear();
    }

    /// No tracked keys
    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// Number of tracked keys
    pub fn len(&self) -> usize {
        self.index.values().map(|keys| keys.len()).sum()
    }
}
