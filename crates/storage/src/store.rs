//! In-process store engine
//!
//! `MemoryStore` interprets every `Command` with the remote store's
//! semantics: the same reply codes, negative-index conventions, clamping,
//! `WRONGTYPE` errors and removal of keys whose collection became empty.
//! All state sits behind one `RwLock`; a batch is applied under a single
//! write guard, which makes it atomic for every other caller.
//!
//! Keys written with a time to live are tracked in a `TtlIndex` and swept
//! before each command, so an expired key is never observed.

use crate::format::{decode_dump, encode_dump, read_snapshot, write_snapshot};
use crate::glob::glob_match;
use crate::range::inclusive_range;
use crate::ttl::{now_millis, TtlIndex};
use crate::value::{Entry, StoredValue};
use crate::zset::ZSetValue;
use parking_lot::{Mutex, RwLock};
use rand::seq::IteratorRandom;
use rustc_hash::FxHashMap;
use std::collections::{BTreeMap, BTreeSet, VecDeque};
use std::path::{Path, PathBuf};
use std::thread::JoinHandle;
use sugar_core::{
    format_score, normalize_index, Aggregate, Command, End, Gateway, InsertPosition, KeyType,
    Reply, Result,
};
use tracing::{debug, trace, warn};

/// Longest string `SETRANGE` may produce
pub const MAX_STRING_LEN: usize = 512 * 1024 * 1024;

/// Default `SCAN` page size
const DEFAULT_SCAN_COUNT: usize = 10;

const WRONGTYPE: &str = "WRONGTYPE Operation against a key holding the wrong kind of value";
const NOT_INTEGER: &str = "ERR value is not an integer or out of range";
const NOT_FLOAT: &str = "ERR value is not a valid float";
const OVERFLOW: &str = "ERR increment or decrement would overflow";
const SYNTAX: &str = "ERR syntax error";

/// Outcome of one command: `Err` carries an error reply
type Step<T> = std::result::Result<T, Reply>;

fn err(msg: &str) -> Reply {
    Reply::Error(msg.to_string())
}

fn wrong_type() -> Reply {
    err(WRONGTYPE)
}

fn arity(command: &str) -> Reply {
    Reply::Error(format!(
        "ERR wrong number of arguments for '{}' command",
        command.to_lowercase()
    ))
}

fn bulk(s: &str) -> Reply {
    Reply::Bulk(s.as_bytes().to_vec())
}

fn bulk_owned(s: String) -> Reply {
    Reply::Bulk(s.into_bytes())
}

fn strings<'a>(items: impl IntoIterator<Item = &'a String>) -> Reply {
    Reply::Array(items.into_iter().map(|s| bulk(s)).collect())
}

fn scored(items: Vec<(String, f64)>, with_scores: bool) -> Reply {
    let mut out = Vec::with_capacity(items.len() * if with_scores { 2 } else { 1 });
    for (member, score) in items {
        out.push(bulk_owned(member));
        if with_scores {
            out.push(bulk_owned(format_score(score)));
        }
    }
    Reply::Array(out)
}

/// Cursor page over `len` ordered items: next cursor and the index range
fn page(len: usize, cursor: u64, count: Option<usize>) -> (u64, std::ops::Range<usize>) {
    let start = usize::try_from(cursor).unwrap_or(usize::MAX).min(len);
    let end = start
        .saturating_add(count.unwrap_or(DEFAULT_SCAN_COUNT).max(1))
        .min(len);
    let next = if end >= len { 0 } else { end as u64 };
    (next, start..end)
}

fn scan_reply(next: u64, items: Vec<Reply>) -> Reply {
    Reply::Array(vec![bulk_owned(next.to_string()), Reply::Array(items)])
}

/// Scalar bytes as text, for the numeric commands
fn scalar_text<'a>(bytes: &'a [u8], message: &'static str) -> Step<&'a str> {
    std::str::from_utf8(bytes).map_err(|_| err(message))
}

fn parse_float(s: &str) -> Step<f64> {
    s.parse::<f64>()
        .ok()
        .filter(|x| x.is_finite())
        .ok_or_else(|| err(NOT_FLOAT))
}

/// Inclusive substring with the store's clamping rules
fn substring(bytes: &[u8], start: i64, end: i64) -> &[u8] {
    let len = bytes.len() as i64;
    if len == 0 {
        return &[];
    }
    let mut start = if start < 0 { len + start } else { start };
    let mut end = if end < 0 { len + end } else { end };
    start = start.max(0);
    end = end.max(0);
    if end >= len {
        end = len - 1;
    }
    if start > end {
        return &[];
    }
    &bytes[start as usize..=end as usize]
}

fn weighted(score: f64, weight: f64) -> f64 {
    let x = score * weight;
    if x.is_nan() {
        0.0
    } else {
        x
    }
}

#[derive(Clone, Copy)]
enum SetOp {
    Union,
    Inter,
    Diff,
}

macro_rules! typed_access {
    ($get:ident, $get_mut:ident, $get_or_create:ident, $variant:ident, $ty:ty) => {
        fn $get(&self, key: &str) -> Step<Option<&$ty>> {
            match self.data.get(key).map(|e| &e.value) {
                None => Ok(None),
                Some(StoredValue::$variant(v)) => Ok(Some(v)),
                Some(_) => Err(wrong_type()),
            }
        }

        #[allow(dead_code)]
        fn $get_mut(&mut self, key: &str) -> Step<Option<&mut $ty>> {
            match self.data.get_mut(key).map(|e| &mut e.value) {
                None => Ok(None),
                Some(StoredValue::$variant(v)) => Ok(Some(v)),
                Some(_) => Err(wrong_type()),
            }
        }

        fn $get_or_create(&mut self, key: &str) -> Step<&mut $ty> {
            let entry = self
                .data
                .entry(key.to_string())
                .or_insert_with(|| Entry::new(StoredValue::$variant(Default::default())));
            match &mut entry.value {
                StoredValue::$variant(v) => Ok(v),
                _ => Err(wrong_type()),
            }
        }
    };
}

#[derive(Default)]
struct Inner {
    data: FxHashMap<String, Entry>,
    ttl: TtlIndex,
}

impl Inner {
    typed_access!(list, list_mut, list_or_create, List, VecDeque<String>);
    typed_access!(hash, hash_mut, hash_or_create, Hash, BTreeMap<String, String>);
    typed_access!(set, set_mut, set_or_create, Set, BTreeSet<String>);
    typed_access!(zset, zset_mut, zset_or_create, ZSet, ZSetValue);
    typed_access!(string, string_mut, string_or_create, Str, Vec<u8>);

    fn from_entries(entries: Vec<(String, Entry)>, now: u64) -> Self {
        let mut inner = Inner::default();
        for (key, entry) in entries {
            if !entry.is_expired(now) {
                inner.insert_entry(key, entry);
            }
        }
        inner
    }

    fn sweep(&mut self, now: u64) {
        let due = self.ttl.drain_due(now);
        if due.is_empty() {
            return;
        }
        let mut expired = 0;
        for key in due {
            if self.data.get(&key).map_or(false, |e| e.is_expired(now)) {
                self.data.remove(&key);
                expired += 1;
            }
        }
        trace!(target: "sugar::store", expired, "Expired keys swept");
    }

    fn insert_entry(&mut self, key: String, entry: Entry) {
        if let Some(at) = entry.expires_at {
            self.ttl.insert(at, &key);
        }
        self.data.insert(key, entry);
    }

    fn remove_key(&mut self, key: &str) -> Option<Entry> {
        let entry = self.data.remove(key)?;
        if let Some(at) = entry.expires_at {
            self.ttl.remove(at, key);
        }
        Some(entry)
    }

    /// Replace whatever `key` holds, dropping any expiry
    fn put(&mut self, key: String, value: StoredValue) {
        self.remove_key(&key);
        self.insert_entry(key, Entry::new(value));
    }

    /// Remove `key` if its collection became empty
    fn prune(&mut self, key: &str) {
        if self
            .data
            .get(key)
            .map_or(false, |e| e.value.is_empty_collection())
        {
            self.remove_key(key);
        }
    }

    fn snapshot(&self) -> Vec<(String, Entry)> {
        let mut entries: Vec<(String, Entry)> = self
            .data
            .iter()
            .map(|(k, e)| (k.clone(), e.clone()))
            .collect();
        entries.sort_by(|a, b| a.0.cmp(&b.0));
        entries
    }

    fn apply(&mut self, command: Command, now: u64) -> Reply {
        match self.dispatch(command, now) {
            Ok(reply) | Err(reply) => reply,
        }
    }

    fn dispatch(&mut self, command: Command, now: u64) -> Step<Reply> {
        match command {
            // ========== Key space ==========
            Command::Ping => Ok(Reply::Status("PONG".to_string())),
            Command::Exists(key) => Ok(Reply::Int(self.data.contains_key(&key) as i64)),
            Command::Del(keys) => {
                let removed = keys
                    .iter()
                    .filter(|k| self.remove_key(k).is_some())
                    .count();
                Ok(Reply::Int(removed as i64))
            }
            Command::Rename { src, dst, nx } => {
                if !self.data.contains_key(&src) {
                    return Err(err("ERR no such key"));
                }
                if nx && self.data.contains_key(&dst) {
                    return Ok(Reply::Int(0));
                }
                if src != dst {
                    if let Some(entry) = self.remove_key(&src) {
                        self.remove_key(&dst);
                        self.insert_entry(dst, entry);
                    }
                }
                Ok(if nx { Reply::Int(1) } else { Reply::ok() })
            }
            Command::Type(key) => {
                let t = self
                    .data
                    .get(&key)
                    .map_or(KeyType::None, |e| e.value.key_type());
                Ok(Reply::Status(t.as_str().to_string()))
            }
            Command::Dump(key) => match self.data.get(&key) {
                None => Ok(Reply::Nil),
                Some(e) => encode_dump(&e.value)
                    .map(Reply::Bulk)
                    .map_err(|e| Reply::Error(format!("ERR {}", e))),
            },
            Command::Restore {
                key,
                ttl_ms,
                payload,
                replace,
            } => {
                if !replace && self.data.contains_key(&key) {
                    return Err(err("BUSYKEY Target key name already exists."));
                }
                let value = decode_dump(&payload)
                    .map_err(|_| err("ERR DUMP payload version or checksum are wrong"))?;
                self.remove_key(&key);
                let expires_at = (ttl_ms > 0).then(|| now.saturating_add(ttl_ms));
                self.insert_entry(key, Entry { value, expires_at });
                Ok(Reply::ok())
            }
            Command::Scan {
                cursor,
                pattern,
                count,
            } => {
                let mut keys: Vec<&String> = self.data.keys().collect();
                keys.sort();
                let (next, range) = page(keys.len(), cursor, count);
                let items = keys[range]
                    .iter()
                    .filter(|k| pattern.as_deref().map_or(true, |p| glob_match(p, k)))
                    .map(|k| bulk(k))
                    .collect();
                Ok(scan_reply(next, items))
            }
            Command::DbSize => Ok(Reply::Int(self.data.len() as i64)),
            Command::FlushDb => {
                self.data.clear();
                self.ttl.clear();
                Ok(Reply::ok())
            }
            // Persistence is handled by `MemoryStore`, which owns the path
            Command::Save | Command::BgSave => Ok(Reply::ok()),

            // ========== Scalars ==========
            Command::Get(key) => Ok(self
                .string(&key)?
                .map_or(Reply::Nil, |s| Reply::Bulk(s.clone()))),
            Command::Set {
                key,
                value,
                options,
            } => {
                if options.validate().is_err() {
                    return Err(err(SYNTAX));
                }
                let exists = self.data.contains_key(&key);
                if (options.nx && exists) || (options.xx && !exists) {
                    return Ok(Reply::Nil);
                }
                let expires_at = options.ttl_millis().map(|ms| now.saturating_add(ms));
                self.remove_key(&key);
                self.insert_entry(
                    key,
                    Entry {
                        value: StoredValue::Str(value.into_bytes()),
                        expires_at,
                    },
                );
                Ok(Reply::ok())
            }
            Command::GetSet { key, value } => {
                let old = self.string(&key)?.cloned();
                self.put(key, StoredValue::Str(value.into_bytes()));
                Ok(old.map_or(Reply::Nil, Reply::Bulk))
            }
            Command::StrLen(key) => Ok(Reply::Int(
                self.string(&key)?.map_or(0, |s| s.len()) as i64,
            )),
            Command::Append { key, value } => {
                let s = self.string_or_create(&key)?;
                s.extend_from_slice(value.as_bytes());
                Ok(Reply::Int(s.len() as i64))
            }
            Command::GetRange { key, start, end } => {
                let bytes = self.string(&key)?.map_or(&[][..], |s| s.as_slice());
                Ok(Reply::Bulk(substring(bytes, start, end).to_vec()))
            }
            Command::SetRange { key, offset, value } => {
                if value.is_empty() {
                    return Ok(Reply::Int(
                        self.string(&key)?.map_or(0, |s| s.len()) as i64,
                    ));
                }
                let end = offset.saturating_add(value.len());
                if end > MAX_STRING_LEN {
                    return Err(err("ERR string exceeds maximum allowed size"));
                }
                let s = self.string_or_create(&key)?;
                if s.len() < end {
                    s.resize(end, 0);
                }
                s[offset..end].copy_from_slice(value.as_bytes());
                Ok(Reply::Int(s.len() as i64))
            }
            Command::IncrBy { key, delta } => {
                let current = match self.string(&key)? {
                    None => 0,
                    Some(s) => scalar_text(s, NOT_INTEGER)?
                        .parse::<i64>()
                        .map_err(|_| err(NOT_INTEGER))?,
                };
                let next = current.checked_add(delta).ok_or_else(|| err(OVERFLOW))?;
                *self.string_or_create(&key)? = next.to_string().into_bytes();
                Ok(Reply::Int(next))
            }
            Command::IncrByFloat { key, delta } => {
                let current = match self.string(&key)? {
                    None => 0.0,
                    Some(s) => parse_float(scalar_text(s, NOT_FLOAT)?)?,
                };
                let next = current + delta;
                if !next.is_finite() {
                    return Err(err("ERR increment would produce NaN or Infinity"));
                }
                let text = format_score(next);
                *self.string_or_create(&key)? = text.clone().into_bytes();
                Ok(bulk_owned(text))
            }
            Command::MGet(keys) => Ok(Reply::Array(
                keys.iter()
                    .map(|k| match self.data.get(k).map(|e| &e.value) {
                        Some(StoredValue::Str(s)) => Reply::Bulk(s.clone()),
                        _ => Reply::Nil,
                    })
                    .collect(),
            )),
            Command::MSet(pairs) => {
                if pairs.is_empty() {
                    return Err(arity("MSET"));
                }
                for (k, v) in pairs {
                    self.put(k, StoredValue::Str(v.into_bytes()));
                }
                Ok(Reply::ok())
            }
            Command::MSetNx(pairs) => {
                if pairs.is_empty() {
                    return Err(arity("MSETNX"));
                }
                if pairs.iter().any(|(k, _)| self.data.contains_key(k)) {
                    return Ok(Reply::Int(0));
                }
                for (k, v) in pairs {
                    self.put(k, StoredValue::Str(v.into_bytes()));
                }
                Ok(Reply::Int(1))
            }

            // ========== Sequences ==========
            Command::LLen(key) => Ok(Reply::Int(self.list(&key)?.map_or(0, |l| l.len()) as i64)),
            Command::LPush { key, values } => {
                if values.is_empty() {
                    return Err(arity("LPUSH"));
                }
                let l = self.list_or_create(&key)?;
                for v in values {
                    l.push_front(v);
                }
                Ok(Reply::Int(l.len() as i64))
            }
            Command::RPush { key, values } => {
                if values.is_empty() {
                    return Err(arity("RPUSH"));
                }
                let l = self.list_or_create(&key)?;
                l.extend(values);
                Ok(Reply::Int(l.len() as i64))
            }
            Command::LPop(key) => {
                let popped = self.list_mut(&key)?.and_then(|l| l.pop_front());
                self.prune(&key);
                Ok(popped.map_or(Reply::Nil, bulk_owned))
            }
            Command::RPop(key) => {
                let popped = self.list_mut(&key)?.and_then(|l| l.pop_back());
                self.prune(&key);
                Ok(popped.map_or(Reply::Nil, bulk_owned))
            }
            Command::LIndex { key, index } => Ok(self
                .list(&key)?
                .and_then(|l| normalize_index(index, l.len()).map(|i| bulk(&l[i])))
                .unwrap_or(Reply::Nil)),
            Command::LSet { key, index, value } => {
                let l = self.list_mut(&key)?.ok_or_else(|| err("ERR no such key"))?;
                let i = normalize_index(index, l.len())
                    .ok_or_else(|| err("ERR index out of range"))?;
                l[i] = value;
                Ok(Reply::ok())
            }
            Command::LRange { key, start, stop } => {
                let items = match self.list(&key)? {
                    Some(l) => match inclusive_range(start, stop, l.len()) {
                        Some((a, b)) => strings(l.range(a..=b)),
                        None => Reply::Array(Vec::new()),
                    },
                    None => Reply::Array(Vec::new()),
                };
                Ok(items)
            }
            Command::LTrim { key, start, stop } => {
                if let Some(l) = self.list_mut(&key)? {
                    match inclusive_range(start, stop, l.len()) {
                        Some((a, b)) => {
                            l.truncate(b + 1);
                            l.drain(..a);
                        }
                        None => l.clear(),
                    }
                }
                self.prune(&key);
                Ok(Reply::ok())
            }
            Command::LInsert {
                key,
                position,
                pivot,
                value,
            } => {
                let Some(l) = self.list_mut(&key)? else {
                    return Ok(Reply::Int(0));
                };
                let Some(at) = l.iter().position(|v| *v == pivot) else {
                    return Ok(Reply::Int(-1));
                };
                let index = match position {
                    InsertPosition::Before => at,
                    InsertPosition::After => at + 1,
                };
                l.insert(index, value);
                Ok(Reply::Int(l.len() as i64))
            }
            Command::LRem { key, count, value } => {
                let removed = match self.list_mut(&key)? {
                    None => 0,
                    Some(l) => {
                        let limit = if count == 0 {
                            usize::MAX
                        } else {
                            count.unsigned_abs() as usize
                        };
                        let mut removed = 0;
                        if count >= 0 {
                            let mut i = 0;
                            while i < l.len() && removed < limit {
                                if l[i] == value {
                                    l.remove(i);
                                    removed += 1;
                                } else {
                                    i += 1;
                                }
                            }
                        } else {
                            let mut i = l.len();
                            while i > 0 && removed < limit {
                                i -= 1;
                                if l[i] == value {
                                    l.remove(i);
                                    removed += 1;
                                }
                            }
                        }
                        removed
                    }
                };
                self.prune(&key);
                Ok(Reply::Int(removed as i64))
            }
            Command::LMove { src, dst, from, to } => {
                // Type-check the destination before popping anything
                self.list(&dst)?;
                let popped = self.list_mut(&src)?.and_then(|l| match from {
                    End::Head => l.pop_front(),
                    End::Tail => l.pop_back(),
                });
                self.prune(&src);
                let Some(value) = popped else {
                    return Ok(Reply::Nil);
                };
                let d = self.list_or_create(&dst)?;
                match to {
                    End::Head => d.push_front(value.clone()),
                    End::Tail => d.push_back(value.clone()),
                }
                Ok(bulk_owned(value))
            }
            Command::Sort {
                key,
                alpha,
                desc,
                store,
            } => {
                let mut items: Vec<String> = match self.data.get(&key).map(|e| &e.value) {
                    None => Vec::new(),
                    Some(StoredValue::List(l)) => l.iter().cloned().collect(),
                    Some(StoredValue::Set(s)) => s.iter().cloned().collect(),
                    Some(StoredValue::ZSet(z)) => z.iter().map(|(m, _)| m.to_string()).collect(),
                    Some(_) => return Err(wrong_type()),
                };
                if alpha {
                    items.sort();
                } else {
                    let mut keyed = items
                        .into_iter()
                        .map(|s| {
                            s.trim()
                                .parse::<f64>()
                                .ok()
                                .filter(|x| !x.is_nan())
                                .map(|x| (x, s))
                                .ok_or_else(|| {
                                    err("ERR One or more scores can't be converted into double")
                                })
                        })
                        .collect::<Step<Vec<(f64, String)>>>()?;
                    keyed.sort_by(|a, b| a.0.total_cmp(&b.0).then_with(|| a.1.cmp(&b.1)));
                    items = keyed.into_iter().map(|(_, s)| s).collect();
                }
                if desc {
                    items.reverse();
                }
                match store {
                    Some(dest) => {
                        let n = items.len();
                        self.remove_key(&dest);
                        if n > 0 {
                            self.insert_entry(dest, Entry::new(StoredValue::List(items.into())));
                        }
                        Ok(Reply::Int(n as i64))
                    }
                    None => Ok(Reply::Array(items.into_iter().map(bulk_owned).collect())),
                }
            }

            // ========== Field tables ==========
            Command::HExists { key, field } => Ok(Reply::Int(
                self.hash(&key)?.map_or(false, |h| h.contains_key(&field)) as i64,
            )),
            Command::HGet { key, field } => Ok(self
                .hash(&key)?
                .and_then(|h| h.get(&field))
                .map_or(Reply::Nil, |v| bulk(v))),
            Command::HSet { key, pairs } => {
                if pairs.is_empty() {
                    return Err(arity("HSET"));
                }
                let h = self.hash_or_create(&key)?;
                let mut added = 0;
                for (field, value) in pairs {
                    if h.insert(field, value).is_none() {
                        added += 1;
                    }
                }
                Ok(Reply::Int(added))
            }
            Command::HDel { key, fields } => {
                let removed = match self.hash_mut(&key)? {
                    None => 0,
                    Some(h) => fields.iter().filter(|f| h.remove(*f).is_some()).count(),
                };
                self.prune(&key);
                Ok(Reply::Int(removed as i64))
            }
            Command::HLen(key) => Ok(Reply::Int(self.hash(&key)?.map_or(0, |h| h.len()) as i64)),
            Command::HKeys(key) => Ok(self
                .hash(&key)?
                .map_or(Reply::Array(Vec::new()), |h| strings(h.keys()))),
            Command::HVals(key) => Ok(self
                .hash(&key)?
                .map_or(Reply::Array(Vec::new()), |h| strings(h.values()))),
            Command::HGetAll(key) => Ok(Reply::Array(
                self.hash(&key)?
                    .map(|h| h.iter().flat_map(|(f, v)| [bulk(f), bulk(v)]).collect())
                    .unwrap_or_default(),
            )),
            Command::HScan { key, cursor, count } => {
                let Some(h) = self.hash(&key)? else {
                    return Ok(scan_reply(0, Vec::new()));
                };
                let (next, range) = page(h.len(), cursor, count);
                let items = h
                    .iter()
                    .skip(range.start)
                    .take(range.len())
                    .flat_map(|(f, v)| [bulk(f), bulk(v)])
                    .collect();
                Ok(scan_reply(next, items))
            }
            Command::HIncrBy { key, field, delta } => {
                let current = match self.hash(&key)?.and_then(|h| h.get(&field)) {
                    None => 0,
                    Some(v) => v
                        .parse::<i64>()
                        .map_err(|_| err("ERR hash value is not an integer"))?,
                };
                let next = current.checked_add(delta).ok_or_else(|| err(OVERFLOW))?;
                self.hash_or_create(&key)?.insert(field, next.to_string());
                Ok(Reply::Int(next))
            }
            Command::HIncrByFloat { key, field, delta } => {
                let current = match self.hash(&key)?.and_then(|h| h.get(&field)) {
                    None => 0.0,
                    Some(v) => parse_float(v)?,
                };
                let next = current + delta;
                if !next.is_finite() {
                    return Err(err("ERR increment would produce NaN or Infinity"));
                }
                let text = format_score(next);
                self.hash_or_create(&key)?.insert(field, text.clone());
                Ok(bulk_owned(text))
            }
            Command::HMGet { key, fields } => {
                let h = self.hash(&key)?;
                Ok(Reply::Array(
                    fields
                        .iter()
                        .map(|f| h.and_then(|h| h.get(f)).map_or(Reply::Nil, |v| bulk(v)))
                        .collect(),
                ))
            }

            // ========== Sets ==========
            Command::SCard(key) => Ok(Reply::Int(self.set(&key)?.map_or(0, |s| s.len()) as i64)),
            Command::SIsMember { key, member } => Ok(Reply::Int(
                self.set(&key)?.map_or(false, |s| s.contains(&member)) as i64,
            )),
            Command::SAdd { key, members } => {
                if members.is_empty() {
                    return Err(arity("SADD"));
                }
                let s = self.set_or_create(&key)?;
                let added = members.into_iter().filter(|m| s.insert(m.clone())).count();
                Ok(Reply::Int(added as i64))
            }
            Command::SRem { key, members } => {
                let removed = match self.set_mut(&key)? {
                    None => 0,
                    Some(s) => members.iter().filter(|m| s.remove(*m)).count(),
                };
                self.prune(&key);
                Ok(Reply::Int(removed as i64))
            }
            Command::SMembers(key) => Ok(self
                .set(&key)?
                .map_or(Reply::Array(Vec::new()), |s| strings(s.iter()))),
            Command::SUnion(keys) => Ok(strings(self.set_algebra(SetOp::Union, &keys)?.iter())),
            Command::SInter(keys) => Ok(strings(self.set_algebra(SetOp::Inter, &keys)?.iter())),
            Command::SDiff(keys) => Ok(strings(self.set_algebra(SetOp::Diff, &keys)?.iter())),
            Command::SUnionStore { dest, keys } => self.set_store(SetOp::Union, dest, &keys),
            Command::SInterStore { dest, keys } => self.set_store(SetOp::Inter, dest, &keys),
            Command::SDiffStore { dest, keys } => self.set_store(SetOp::Diff, dest, &keys),
            Command::SPop(key) => {
                let popped = match self.set_mut(&key)? {
                    None => None,
                    Some(s) => {
                        let pick = s.iter().choose(&mut rand::thread_rng()).cloned();
                        if let Some(m) = &pick {
                            s.remove(m);
                        }
                        pick
                    }
                };
                self.prune(&key);
                Ok(popped.map_or(Reply::Nil, bulk_owned))
            }
            Command::SScan { key, cursor, count } => {
                let Some(s) = self.set(&key)? else {
                    return Ok(scan_reply(0, Vec::new()));
                };
                let (next, range) = page(s.len(), cursor, count);
                let items = s
                    .iter()
                    .skip(range.start)
                    .take(range.len())
                    .map(|m| bulk(m))
                    .collect();
                Ok(scan_reply(next, items))
            }

            // ========== Ordered-score sets ==========
            Command::ZAdd { key, entries } => {
                if entries.is_empty() {
                    return Err(arity("ZADD"));
                }
                if entries.iter().any(|(score, _)| score.is_nan()) {
                    return Err(err(NOT_FLOAT));
                }
                let z = self.zset_or_create(&key)?;
                let added = entries
                    .into_iter()
                    .filter(|(score, member)| z.insert(member.clone(), *score))
                    .count();
                Ok(Reply::Int(added as i64))
            }
            Command::ZRem { key, members } => {
                let removed = match self.zset_mut(&key)? {
                    None => 0,
                    Some(z) => members.iter().filter(|m| z.remove(m)).count(),
                };
                self.prune(&key);
                Ok(Reply::Int(removed as i64))
            }
            Command::ZScore { key, member } => Ok(self
                .zset(&key)?
                .and_then(|z| z.score(&member))
                .map_or(Reply::Nil, |s| bulk_owned(format_score(s)))),
            Command::ZIncrBy { key, delta, member } => {
                let current = self.zset(&key)?.and_then(|z| z.score(&member)).unwrap_or(0.0);
                let next = current + delta;
                if next.is_nan() {
                    return Err(err("ERR resulting score is not a number (NaN)"));
                }
                self.zset_or_create(&key)?.insert(member, next);
                Ok(bulk_owned(format_score(next)))
            }
            Command::ZRank { key, member, rev } => Ok(self
                .zset(&key)?
                .and_then(|z| z.rank(&member, rev))
                .map_or(Reply::Nil, |r| Reply::Int(r as i64))),
            Command::ZCount { key, min, max } => Ok(Reply::Int(
                self.zset(&key)?.map_or(0, |z| z.count(min, max)) as i64,
            )),
            Command::ZCard(key) => Ok(Reply::Int(self.zset(&key)?.map_or(0, |z| z.len()) as i64)),
            Command::ZRange {
                key,
                start,
                stop,
                rev,
                with_scores,
            } => {
                let items = self
                    .zset(&key)?
                    .map(|z| z.range_by_rank(start, stop, rev))
                    .unwrap_or_default();
                Ok(scored(items, with_scores))
            }
            Command::ZRangeByScore {
                key,
                min,
                max,
                limit,
                rev,
                with_scores,
            } => {
                let items = self
                    .zset(&key)?
                    .map(|z| z.range_by_score(min, max, rev, limit))
                    .unwrap_or_default();
                Ok(scored(items, with_scores))
            }
            Command::ZRemRangeByRank { key, start, stop } => {
                let removed = self
                    .zset_mut(&key)?
                    .map_or(0, |z| z.remove_range_by_rank(start, stop));
                self.prune(&key);
                Ok(Reply::Int(removed as i64))
            }
            Command::ZRemRangeByScore { key, min, max } => {
                let removed = self
                    .zset_mut(&key)?
                    .map_or(0, |z| z.remove_range_by_score(min, max));
                self.prune(&key);
                Ok(Reply::Int(removed as i64))
            }
            Command::ZUnionStore {
                dest,
                keys,
                weights,
                aggregate,
            } => self.zstore(dest, &keys, weights, aggregate, false),
            Command::ZInterStore {
                dest,
                keys,
                weights,
                aggregate,
            } => self.zstore(dest, &keys, weights, aggregate, true),
        }
    }

    fn set_algebra(&self, op: SetOp, keys: &[String]) -> Step<BTreeSet<String>> {
        if keys.is_empty() {
            return Err(arity("SUNION"));
        }
        let sets = keys
            .iter()
            .map(|k| self.set(k).map(|s| s.cloned()))
            .collect::<Step<Vec<Option<BTreeSet<String>>>>>()?;
        let result = match op {
            SetOp::Union => sets.into_iter().flatten().fold(BTreeSet::new(), |mut acc, s| {
                acc.extend(s);
                acc
            }),
            SetOp::Inter => {
                if sets.iter().any(Option::is_none) {
                    BTreeSet::new()
                } else {
                    let mut it = sets.into_iter().flatten();
                    let first = it.next().unwrap_or_default();
                    it.fold(first, |acc, s| acc.intersection(&s).cloned().collect())
                }
            }
            SetOp::Diff => {
                let mut it = sets.into_iter();
                let first = it.next().flatten().unwrap_or_default();
                it.flatten()
                    .fold(first, |acc, s| acc.difference(&s).cloned().collect())
            }
        };
        Ok(result)
    }

    fn set_store(&mut self, op: SetOp, dest: String, keys: &[String]) -> Step<Reply> {
        let result = self.set_algebra(op, keys)?;
        let card = result.len();
        self.remove_key(&dest);
        if card > 0 {
            self.insert_entry(dest, Entry::new(StoredValue::Set(result)));
        }
        Ok(Reply::Int(card as i64))
    }

    /// Scored members of a sorted-set source; plain sets score 1
    fn zsource(&self, key: &str) -> Step<Option<Vec<(String, f64)>>> {
        match self.data.get(key).map(|e| &e.value) {
            None => Ok(None),
            Some(StoredValue::ZSet(z)) => Ok(Some(
                z.iter().map(|(m, s)| (m.to_string(), s)).collect(),
            )),
            Some(StoredValue::Set(s)) => Ok(Some(s.iter().map(|m| (m.clone(), 1.0)).collect())),
            Some(_) => Err(wrong_type()),
        }
    }

    fn zstore(
        &mut self,
        dest: String,
        keys: &[String],
        weights: Option<Vec<f64>>,
        aggregate: Aggregate,
        intersect: bool,
    ) -> Step<Reply> {
        if keys.is_empty() {
            return Err(err("ERR at least 1 input key is needed"));
        }
        if weights.as_ref().map_or(false, |w| w.len() != keys.len()) {
            return Err(err(SYNTAX));
        }
        let sources = keys
            .iter()
            .map(|k| self.zsource(k))
            .collect::<Step<Vec<_>>>()?;

        let mut acc: FxHashMap<String, (f64, usize)> = FxHashMap::default();
        if !(intersect && sources.iter().any(Option::is_none)) {
            for (i, source) in sources.iter().enumerate() {
                let weight = weights.as_ref().map_or(1.0, |w| w[i]);
                for (member, score) in source.iter().flatten() {
                    let ws = weighted(*score, weight);
                    acc.entry(member.clone())
                        .and_modify(|(cur, seen)| {
                            let combined = aggregate.combine(*cur, ws);
                            *cur = if combined.is_nan() { 0.0 } else { combined };
                            *seen += 1;
                        })
                        .or_insert((ws, 1));
                }
            }
        }
        let needed = sources.len();
        let result: Vec<(String, f64)> = acc
            .into_iter()
            .filter(|(_, (_, seen))| !intersect || *seen == needed)
            .map(|(m, (s, _))| (m, s))
            .collect();
        let result = ZSetValue::from(result);
        let card = result.len();
        self.remove_key(&dest);
        if card > 0 {
            self.insert_entry(dest, Entry::new(StoredValue::ZSet(result)));
        }
        Ok(Reply::Int(card as i64))
    }
}

/// In-process engine implementing `Gateway`
///
/// Optionally bound to a snapshot file: `Save` writes it synchronously,
/// `BgSave` on a background thread, and `MemoryStore::open` reloads it.
pub struct MemoryStore {
    inner: RwLock<Inner>,
    snapshot_path: Option<PathBuf>,
    background: Mutex<Option<JoinHandle<()>>>,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    /// Empty store without persistence
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(Inner::default()),
            snapshot_path: None,
            background: Mutex::new(None),
        }
    }

    /// Store bound to `path`, loading the snapshot if the file exists
    ///
    /// Entries already expired in the snapshot are dropped on load.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let inner = if path.exists() {
            let entries = read_snapshot(&path)?;
            debug!(
                target: "sugar::store",
                path = %path.display(),
                keys = entries.len(),
                "Snapshot loaded"
            );
            Inner::from_entries(entries, now_millis())
        } else {
            Inner::default()
        };
        Ok(Self {
            inner: RwLock::new(inner),
            snapshot_path: Some(path),
            background: Mutex::new(None),
        })
    }

    /// Snapshot file, if persistence is configured
    pub fn snapshot_path(&self) -> Option<&Path> {
        self.snapshot_path.as_deref()
    }

    /// Number of live keys
    pub fn len(&self) -> usize {
        let mut inner = self.inner.write();
        inner.sweep(now_millis());
        inner.data.len()
    }

    /// No live keys
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Block until a running background save has finished
    pub fn wait_background_save(&self) {
        if let Some(handle) = self.background.lock().take() {
            if handle.join().is_err() {
                warn!(target: "sugar::store", "Background save thread panicked");
            }
        }
    }

    fn persist(&self, inner: &Inner, background: bool) -> Reply {
        let Some(path) = self.snapshot_path.clone() else {
            debug!(target: "sugar::store", "No snapshot path configured; save skipped");
            return Reply::ok();
        };
        self.wait_background_save();
        let entries = inner.snapshot();
        if background {
            let handle = std::thread::spawn(move || {
                if let Err(e) = write_snapshot(&path, &entries) {
                    warn!(target: "sugar::store", error = %e, "Background save failed");
                }
            });
            *self.background.lock() = Some(handle);
            Reply::Status("Background saving started".to_string())
        } else {
            match write_snapshot(&path, &entries) {
                Ok(()) => Reply::ok(),
                Err(e) => Reply::Error(format!("ERR {}", e)),
            }
        }
    }

    fn apply_locked(&self, inner: &mut Inner, command: Command, now: u64) -> Reply {
        match command {
            Command::Save => self.persist(inner, false),
            Command::BgSave => self.persist(inner, true),
            other => inner.apply(other, now),
        }
    }
}

impl Gateway for MemoryStore {
    fn execute(&self, command: Command) -> Result<Reply> {
        let now = now_millis();
        let mut inner = self.inner.write();
        inner.sweep(now);
        trace!(target: "sugar::store", command = command.name(), "Execute");
        Ok(self.apply_locked(&mut inner, command, now))
    }

    fn execute_batch(&self, commands: Vec<Command>) -> Result<Vec<Reply>> {
        let now = now_millis();
        let mut inner = self.inner.write();
        inner.sweep(now);
        trace!(target: "sugar::store", commands = commands.len(), "Execute batch");
        Ok(commands
            .into_iter()
            .map(|c| self.apply_locked(&mut inner, c, now))
            .collect())
    }
}

impl Drop for MemoryStore {
    fn drop(&mut self) {
        self.wait_background_save();
    }
}

impl std::fmt::Debug for MemoryStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryStore")
            .field("snapshot_path", &self.snapshot_path)
            .finish_non_exhaustive()
    }
}
