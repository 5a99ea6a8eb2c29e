//! Namespace: the whole key space as a mapping from key to adapter
//!
//! Reads dispatch on the type the store reports for a key. Writes of a
//! `LocalValue` replace whatever the key held, as one atomic batch.
//!
//! | Facade call | Store commands |
//! |-------------|----------------|
//! | `get(key)` | `TYPE` |
//! | `set(key, list)` | `DEL` + `RPUSH` (batched) |
//! | `pop(key)` | `TYPE`, then read + `DEL` (batched) |
//! | `keys(pattern)` | `SCAN ... MATCH` (paged) |
//! | `clear()` | `FLUSHDB` |

use std::sync::Arc;
use sugar_core::{
    Command, Error, FromStored, Gateway, GatewayExt, KeyScan, KeyType, Reply, Result,
};
use sugar_engine::Sugar;
use sugar_primitives::{RDict, RList, RSet, RStr, SortedSet};
use tracing::info;

use super::types::{Entry, LocalValue};

/// Mapping-like view over every key of one store database
#[derive(Debug, Clone)]
pub struct Namespace {
    sugar: Sugar,
}

impl Namespace {
    /// View over the handle's store
    pub fn new(sugar: Sugar) -> Self {
        Self { sugar }
    }

    /// Underlying handle
    pub fn sugar(&self) -> &Sugar {
        &self.sugar
    }

    fn gateway(&self) -> &Arc<dyn Gateway> {
        self.sugar.gateway()
    }

    fn run(&self, commands: Vec<Command>) -> Result<Vec<Reply>> {
        let ((), replies) = self.sugar.batch(|b| {
            for command in commands {
                b.queue(command);
            }
            Ok(())
        })?;
        Ok(replies)
    }

    fn missing(key: &str) -> Error {
        Error::not_found(format!("key '{}'", key))
    }

    // ========== Binders ==========

    /// Sequence adapter for `key`, whatever it currently holds
    pub fn list(&self, key: &str) -> RList {
        RList::new(&self.sugar, key)
    }

    /// Sequence adapter decoding elements as `T`
    pub fn typed_list<T: FromStored + 'static>(&self, key: &str) -> RList<T> {
        RList::typed(&self.sugar, key)
    }

    /// Mapping adapter for `key`
    pub fn dict(&self, key: &str) -> RDict {
        RDict::new(&self.sugar, key)
    }

    /// Set adapter for `key`
    pub fn set_adapter(&self, key: &str) -> RSet {
        RSet::new(&self.sugar, key)
    }

    /// Ordered-score set adapter for `key`
    pub fn sorted_set(&self, key: &str) -> SortedSet {
        SortedSet::new(&self.sugar, key)
    }

    /// Scalar adapter for `key`
    pub fn string(&self, key: &str) -> RStr {
        RStr::new(&self.sugar, key)
    }

    // ========== Mapping operations ==========

    /// Adapter matching the type `key` holds
    ///
    /// # Errors
    ///
    /// `NotFound` if the key is absent.
    pub fn get(&self, key: &str) -> Result<Entry> {
        let entry = match self.gateway().key_type(key)? {
            KeyType::List => Entry::List(self.list(key)),
            KeyType::Hash => Entry::Dict(self.dict(key)),
            KeyType::Set => Entry::Set(self.set_adapter(key)),
            KeyType::ZSet => Entry::SortedSet(self.sorted_set(key)),
            KeyType::String => Entry::Str(self.string(key)),
            KeyType::None => return Err(Self::missing(key)),
        };
        Ok(entry)
    }

    /// Whole scalar value of `key`
    ///
    /// `NotFound` if absent, `TypeMismatch` if the key holds a collection.
    pub fn get_str(&self, key: &str) -> Result<String> {
        self.gateway().get(key)?.ok_or_else(|| Self::missing(key))
    }

    /// Replace whatever `key` holds with `value`
    ///
    /// Collections are written as `DEL` plus one bulk write in one batch;
    /// an empty collection leaves the key absent. Scalars use a plain `SET`.
    pub fn set(&self, key: &str, value: impl Into<LocalValue>) -> Result<()> {
        let value = value.into();
        if let LocalValue::Str(s) = &value {
            self.gateway().set(key, s, Default::default())?;
            return Ok(());
        }
        let mut commands = vec![Command::Del(vec![key.to_string()])];
        if !value.is_empty_collection() {
            let key = key.to_string();
            commands.push(match value {
                LocalValue::List(values) => Command::RPush { key, values },
                LocalValue::Dict(map) => Command::HSet {
                    key,
                    pairs: map.into_iter().collect(),
                },
                LocalValue::Set(members) => Command::SAdd {
                    key,
                    members: members.into_iter().collect(),
                },
                LocalValue::SortedSet(entries) => Command::ZAdd {
                    key,
                    entries: entries.into_iter().map(|(m, s)| (s, m)).collect(),
                },
                LocalValue::Str(value) => Command::Set {
                    key,
                    value,
                    options: Default::default(),
                },
            });
        }
        self.run(commands)?;
        Ok(())
    }

    /// Remove `key` and return what it held
    ///
    /// The read and the delete run as one atomic batch.
    pub fn pop(&self, key: &str) -> Result<LocalValue> {
        let key_type = self.gateway().key_type(key)?;
        let owned = key.to_string();
        let read = match key_type {
            KeyType::List => Command::LRange {
                key: owned.clone(),
                start: 0,
                stop: -1,
            },
            KeyType::Hash => Command::HGetAll(owned.clone()),
            KeyType::Set => Command::SMembers(owned.clone()),
            KeyType::ZSet => Command::ZRange {
                key: owned.clone(),
                start: 0,
                stop: -1,
                rev: false,
                with_scores: true,
            },
            KeyType::String => Command::Get(owned.clone()),
            KeyType::None => return Err(Self::missing(key)),
        };
        let mut replies = self.run(vec![read, Command::Del(vec![owned])])?.into_iter();
        let reply = replies
            .next()
            .ok_or_else(|| Error::protocol("empty batch reply"))?;
        decode_value(key_type, reply)?.ok_or_else(|| Self::missing(key))
    }

    /// Like `pop`, but returns `default` when the key is absent
    pub fn pop_or(&self, key: &str, default: impl Into<LocalValue>) -> Result<LocalValue> {
        match self.pop(key) {
            Err(Error::NotFound(_)) => Ok(default.into()),
            other => other,
        }
    }

    /// Adapter for `key`, writing `default` first if the key is absent
    ///
    /// Check-then-act: not atomic against other writers.
    pub fn setdefault(&self, key: &str, default: impl Into<LocalValue>) -> Result<Entry> {
        if !self.contains(key)? {
            self.set(key, default)?;
        }
        self.get(key)
    }

    /// Write a scalar and return the previous scalar, if any
    pub fn get_set(&self, key: &str, value: impl ToString) -> Result<Option<String>> {
        self.gateway().getset(key, &value.to_string())
    }

    /// Keys matching a glob pattern, paged lazily
    pub fn keys(&self, pattern: Option<&str>) -> KeyScan {
        KeyScan::new(Arc::clone(self.gateway()), pattern)
    }

    /// Every key, paged lazily
    pub fn iter(&self) -> KeyScan {
        self.keys(None)
    }

    /// Whether `key` exists
    pub fn contains(&self, key: &str) -> Result<bool> {
        self.gateway().exists(key)
    }

    /// Number of keys
    pub fn len(&self) -> Result<usize> {
        self.gateway().db_size()
    }

    /// No keys at all
    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }

    /// Delete `key`, failing with `NotFound` if absent
    pub fn delete(&self, key: &str) -> Result<()> {
        if self.gateway().del(&[key])? == 0 {
            return Err(Self::missing(key));
        }
        Ok(())
    }

    // ========== Maintenance ==========

    /// Delete every key of the database
    pub fn clear(&self) -> Result<()> {
        self.gateway().flush_db()?;
        info!(target: "sugar::namespace", "Flushed database");
        Ok(())
    }

    /// Persist synchronously
    pub fn save(&self) -> Result<()> {
        self.gateway().save()
    }

    /// Persist in the background
    pub fn bgsave(&self) -> Result<()> {
        self.gateway().bgsave()
    }

    /// Rename `src` to `dst`
    ///
    /// With `nx`, returns false and changes nothing if `dst` exists.
    /// `NotFound` if `src` is absent.
    pub fn rename(&self, src: &str, dst: &str, nx: bool) -> Result<bool> {
        match self.gateway().rename(src, dst, nx) {
            Err(Error::Remote(msg)) if msg.contains("no such key") => Err(Self::missing(src)),
            other => other,
        }
    }

    /// Serialized form of `key` for `restore`
    pub fn dump(&self, key: &str) -> Result<Vec<u8>> {
        self.gateway().dump(key)?.ok_or_else(|| Self::missing(key))
    }

    /// Recreate `key` from a `dump` payload
    ///
    /// `ttl_ms` of 0 means no expiry. Without `replace`, an existing key
    /// is an error.
    pub fn restore(&self, key: &str, payload: Vec<u8>, ttl_ms: u64, replace: bool) -> Result<()> {
        self.gateway().restore(key, ttl_ms, payload, replace)
    }
}

/// Convert a whole-value read reply; `None` when the value vanished
fn decode_value(key_type: KeyType, reply: Reply) -> Result<Option<LocalValue>> {
    let value = match key_type {
        KeyType::List => LocalValue::List(reply.into_strings()?),
        KeyType::Hash => LocalValue::Dict(reply.into_pairs()?.into_iter().collect()),
        KeyType::Set => LocalValue::Set(reply.into_strings()?.into_iter().collect()),
        KeyType::ZSet => LocalValue::SortedSet(reply.into_scored()?),
        KeyType::String => match reply.into_opt_string()? {
            Some(s) => LocalValue::Str(s),
            None => return Ok(None),
        },
        KeyType::None => return Ok(None),
    };
    if value.is_empty_collection() {
        return Ok(None);
    }
    Ok(Some(value))
}
