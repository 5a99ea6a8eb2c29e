//! Gateway trait and its typed extension
//!
//! `Gateway` is the single seam between the adapters and whatever executes
//! commands (the in-process `MemoryStore`, the RESP client). Implementations
//! only interpret `Command` values; the typed helpers in `GatewayExt` are
//! derived from `execute` and shared by every implementation.

use crate::command::{Command, Reply};
use crate::error::Result;
use crate::types::{Aggregate, End, InsertPosition, KeyType, ScoreBound, SetOptions};
use std::sync::Arc;

/// Executes primitive commands against a remote store
///
/// Thread safety: implementations must be `Send + Sync`; every adapter holds
/// an `Arc<dyn Gateway>`.
pub trait Gateway: Send + Sync {
    /// Execute one command
    ///
    /// Error replies are returned as `Ok(Reply::Error(..))`; callers convert
    /// them with `Reply::into_result` or the typed helpers.
    fn execute(&self, command: Command) -> Result<Reply>;

    /// Execute several commands as one atomic unit
    ///
    /// No other client observes a state where only some of the commands
    /// have been applied. Replies are returned in command order.
    fn execute_batch(&self, commands: Vec<Command>) -> Result<Vec<Reply>>;
}

impl<G: Gateway + ?Sized> Gateway for Arc<G> {
    fn execute(&self, command: Command) -> Result<Reply> {
        (**self).execute(command)
    }

    fn execute_batch(&self, commands: Vec<Command>) -> Result<Vec<Reply>> {
        (**self).execute_batch(commands)
    }
}

fn owned(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

/// Typed command helpers
///
/// Blanket-implemented for every `Gateway`. Each method issues exactly one
/// command and converts its reply.
pub trait GatewayExt: Gateway {
    // ========== Key space ==========

    /// Liveness probe
    fn ping(&self) -> Result<()> {
        self.execute(Command::Ping)?.into_result().map(|_| ())
    }

    /// Whether `key` exists
    fn exists(&self, key: &str) -> Result<bool> {
        self.execute(Command::Exists(key.to_string()))?.into_bool()
    }

    /// Delete keys, returning how many existed
    fn del(&self, keys: &[&str]) -> Result<usize> {
        self.execute(Command::Del(owned(keys)))?.into_usize()
    }

    /// Rename a key; with `nx`, false when `dst` already exists
    fn rename(&self, src: &str, dst: &str, nx: bool) -> Result<bool> {
        let reply = self.execute(Command::Rename {
            src: src.to_string(),
            dst: dst.to_string(),
            nx,
        })?;
        match reply.into_result()? {
            Reply::Int(n) => Ok(n != 0),
            _ => Ok(true),
        }
    }

    /// Type of the value at `key`
    fn key_type(&self, key: &str) -> Result<KeyType> {
        let name = self.execute(Command::Type(key.to_string()))?.into_string()?;
        KeyType::from_type_name(&name)
    }

    /// Serialized payload of `key`
    fn dump(&self, key: &str) -> Result<Option<Vec<u8>>> {
        self.execute(Command::Dump(key.to_string()))?.into_opt_bytes()
    }

    /// Recreate `key` from a dump payload
    fn restore(&self, key: &str, ttl_ms: u64, payload: Vec<u8>, replace: bool) -> Result<()> {
        self.execute(Command::Restore {
            key: key.to_string(),
            ttl_ms,
            payload,
            replace,
        })?
        .into_result()
        .map(|_| ())
    }

    /// One page of the key space
    fn scan(
        &self,
        cursor: u64,
        pattern: Option<&str>,
        count: Option<usize>,
    ) -> Result<(u64, Vec<String>)> {
        self.execute(Command::Scan {
            cursor,
            pattern: pattern.map(str::to_string),
            count,
        })?
        .into_scan_page()
    }

    /// Number of keys
    fn db_size(&self) -> Result<usize> {
        self.execute(Command::DbSize)?.into_usize()
    }

    /// Remove every key
    fn flush_db(&self) -> Result<()> {
        self.execute(Command::FlushDb)?.into_result().map(|_| ())
    }

    /// Persist synchronously
    fn save(&self) -> Result<()> {
        self.execute(Command::Save)?.into_result().map(|_| ())
    }

    /// Persist in the background
    fn bgsave(&self) -> Result<()> {
        self.execute(Command::BgSave)?.into_result().map(|_| ())
    }

    // ========== Scalars ==========

    /// Value at `key`
    fn get(&self, key: &str) -> Result<Option<String>> {
        self.execute(Command::Get(key.to_string()))?.into_opt_string()
    }

    /// Raw bytes at `key`
    fn get_bytes(&self, key: &str) -> Result<Option<Vec<u8>>> {
        self.execute(Command::Get(key.to_string()))?.into_opt_bytes()
    }

    /// Conditional write; false when the condition prevented it
    fn set(&self, key: &str, value: &str, options: SetOptions) -> Result<bool> {
        options.validate()?;
        self.execute(Command::Set {
            key: key.to_string(),
            value: value.to_string(),
            options,
        })?
        .into_ok()
    }

    /// Write and return the previous value
    fn getset(&self, key: &str, value: &str) -> Result<Option<String>> {
        self.execute(Command::GetSet {
            key: key.to_string(),
            value: value.to_string(),
        })?
        .into_opt_string()
    }

    /// Byte length
    fn strlen(&self, key: &str) -> Result<usize> {
        self.execute(Command::StrLen(key.to_string()))?.into_usize()
    }

    /// Append, returning the new length
    fn append(&self, key: &str, value: &str) -> Result<usize> {
        self.execute(Command::Append {
            key: key.to_string(),
            value: value.to_string(),
        })?
        .into_usize()
    }

    /// Substring with inclusive bounds
    fn getrange(&self, key: &str, start: i64, end: i64) -> Result<Vec<u8>> {
        Ok(self
            .execute(Command::GetRange {
                key: key.to_string(),
                start,
                end,
            })?
            .into_opt_bytes()?
            .unwrap_or_default())
    }

    /// Overwrite at `offset`, returning the new length
    fn setrange(&self, key: &str, offset: usize, value: &str) -> Result<usize> {
        self.execute(Command::SetRange {
            key: key.to_string(),
            offset,
            value: value.to_string(),
        })?
        .into_usize()
    }

    /// Integer increment
    fn incr_by(&self, key: &str, delta: i64) -> Result<i64> {
        self.execute(Command::IncrBy {
            key: key.to_string(),
            delta,
        })?
        .into_int()
    }

    /// Float increment
    fn incr_by_float(&self, key: &str, delta: f64) -> Result<f64> {
        self.execute(Command::IncrByFloat {
            key: key.to_string(),
            delta,
        })?
        .into_f64()
    }

    /// Several values
    fn mget(&self, keys: &[&str]) -> Result<Vec<Option<String>>> {
        self.execute(Command::MGet(owned(keys)))?.into_opt_strings()
    }

    /// Write several keys
    fn mset(&self, pairs: Vec<(String, String)>) -> Result<()> {
        self.execute(Command::MSet(pairs))?.into_result().map(|_| ())
    }

    /// Write several keys only if none exists
    fn msetnx(&self, pairs: Vec<(String, String)>) -> Result<bool> {
        self.execute(Command::MSetNx(pairs))?.into_bool()
    }

    // ========== Sequences ==========

    /// Sequence length
    fn llen(&self, key: &str) -> Result<usize> {
        self.execute(Command::LLen(key.to_string()))?.into_usize()
    }

    /// Push values onto one end, returning the new length
    fn push(&self, key: &str, end: End, values: Vec<String>) -> Result<usize> {
        let key = key.to_string();
        let cmd = match end {
            End::Head => Command::LPush { key, values },
            End::Tail => Command::RPush { key, values },
        };
        self.execute(cmd)?.into_usize()
    }

    /// Pop from one end
    fn pop(&self, key: &str, end: End) -> Result<Option<String>> {
        let key = key.to_string();
        let cmd = match end {
            End::Head => Command::LPop(key),
            End::Tail => Command::RPop(key),
        };
        self.execute(cmd)?.into_opt_string()
    }

    /// Element at index
    fn lindex(&self, key: &str, index: i64) -> Result<Option<String>> {
        self.execute(Command::LIndex {
            key: key.to_string(),
            index,
        })?
        .into_opt_string()
    }

    /// Overwrite the element at index
    fn lset(&self, key: &str, index: i64, value: &str) -> Result<()> {
        self.execute(Command::LSet {
            key: key.to_string(),
            index,
            value: value.to_string(),
        })?
        .into_result()
        .map(|_| ())
    }

    /// Elements in `[start, stop]`
    fn lrange(&self, key: &str, start: i64, stop: i64) -> Result<Vec<String>> {
        self.execute(Command::LRange {
            key: key.to_string(),
            start,
            stop,
        })?
        .into_strings()
    }

    /// Keep only `[start, stop]`
    fn ltrim(&self, key: &str, start: i64, stop: i64) -> Result<()> {
        self.execute(Command::LTrim {
            key: key.to_string(),
            start,
            stop,
        })?
        .into_result()
        .map(|_| ())
    }

    /// Insert next to the first occurrence of `pivot`, returning the new
    /// length; `None` if the pivot or the key is absent
    fn linsert(
        &self,
        key: &str,
        position: InsertPosition,
        pivot: &str,
        value: &str,
    ) -> Result<Option<usize>> {
        let n = self
            .execute(Command::LInsert {
                key: key.to_string(),
                position,
                pivot: pivot.to_string(),
                value: value.to_string(),
            })?
            .into_int()?;
        Ok(usize::try_from(n).ok().filter(|&len| len > 0))
    }

    /// Remove occurrences of `value`, returning how many were removed
    fn lrem(&self, key: &str, count: i64, value: &str) -> Result<usize> {
        self.execute(Command::LRem {
            key: key.to_string(),
            count,
            value: value.to_string(),
        })?
        .into_usize()
    }

    /// Pop one end of `src` and push onto one end of `dst`
    fn lmove(&self, src: &str, dst: &str, from: End, to: End) -> Result<Option<String>> {
        self.execute(Command::LMove {
            src: src.to_string(),
            dst: dst.to_string(),
            from,
            to,
        })?
        .into_opt_string()
    }

    /// Sort in place (store back over the key), returning the length
    fn sort_store(&self, key: &str, alpha: bool, desc: bool) -> Result<usize> {
        self.execute(Command::Sort {
            key: key.to_string(),
            alpha,
            desc,
            store: Some(key.to_string()),
        })?
        .into_usize()
    }

    // ========== Field tables ==========

    /// Whether `field` exists
    fn hexists(&self, key: &str, field: &str) -> Result<bool> {
        self.execute(Command::HExists {
            key: key.to_string(),
            field: field.to_string(),
        })?
        .into_bool()
    }

    /// Field value
    fn hget(&self, key: &str, field: &str) -> Result<Option<String>> {
        self.execute(Command::HGet {
            key: key.to_string(),
            field: field.to_string(),
        })?
        .into_opt_string()
    }

    /// Set fields, returning how many were new
    fn hset(&self, key: &str, pairs: Vec<(String, String)>) -> Result<usize> {
        self.execute(Command::HSet {
            key: key.to_string(),
            pairs,
        })?
        .into_usize()
    }

    /// Delete fields, returning how many existed
    fn hdel(&self, key: &str, fields: &[&str]) -> Result<usize> {
        self.execute(Command::HDel {
            key: key.to_string(),
            fields: owned(fields),
        })?
        .into_usize()
    }

    /// Field count
    fn hlen(&self, key: &str) -> Result<usize> {
        self.execute(Command::HLen(key.to_string()))?.into_usize()
    }

    /// All fields
    fn hkeys(&self, key: &str) -> Result<Vec<String>> {
        self.execute(Command::HKeys(key.to_string()))?.into_strings()
    }

    /// All values
    fn hvals(&self, key: &str) -> Result<Vec<String>> {
        self.execute(Command::HVals(key.to_string()))?.into_strings()
    }

    /// All field/value pairs
    fn hgetall(&self, key: &str) -> Result<Vec<(String, String)>> {
        self.execute(Command::HGetAll(key.to_string()))?.into_pairs()
    }

    /// One page of field/value pairs
    fn hscan(
        &self,
        key: &str,
        cursor: u64,
        count: Option<usize>,
    ) -> Result<(u64, Vec<(String, String)>)> {
        let (next, flat) = self
            .execute(Command::HScan {
                key: key.to_string(),
                cursor,
                count,
            })?
            .into_scan_page()?;
        let pairs = Reply::Array(flat.into_iter().map(Reply::bulk).collect()).into_pairs()?;
        Ok((next, pairs))
    }

    /// Integer field increment
    fn hincr_by(&self, key: &str, field: &str, delta: i64) -> Result<i64> {
        self.execute(Command::HIncrBy {
            key: key.to_string(),
            field: field.to_string(),
            delta,
        })?
        .into_int()
    }

    /// Float field increment
    fn hincr_by_float(&self, key: &str, field: &str, delta: f64) -> Result<f64> {
        self.execute(Command::HIncrByFloat {
            key: key.to_string(),
            field: field.to_string(),
            delta,
        })?
        .into_f64()
    }

    /// Several field values
    fn hmget(&self, key: &str, fields: &[&str]) -> Result<Vec<Option<String>>> {
        self.execute(Command::HMGet {
            key: key.to_string(),
            fields: owned(fields),
        })?
        .into_opt_strings()
    }

    // ========== Sets ==========

    /// Cardinality
    fn scard(&self, key: &str) -> Result<usize> {
        self.execute(Command::SCard(key.to_string()))?.into_usize()
    }

    /// Membership probe
    fn sismember(&self, key: &str, member: &str) -> Result<bool> {
        self.execute(Command::SIsMember {
            key: key.to_string(),
            member: member.to_string(),
        })?
        .into_bool()
    }

    /// Add members, returning how many were new
    fn sadd(&self, key: &str, members: Vec<String>) -> Result<usize> {
        self.execute(Command::SAdd {
            key: key.to_string(),
            members,
        })?
        .into_usize()
    }

    /// Remove members, returning how many existed
    fn srem(&self, key: &str, members: Vec<String>) -> Result<usize> {
        self.execute(Command::SRem {
            key: key.to_string(),
            members,
        })?
        .into_usize()
    }

    /// All members
    fn smembers(&self, key: &str) -> Result<Vec<String>> {
        self.execute(Command::SMembers(key.to_string()))?.into_strings()
    }

    /// Remove and return a random member
    fn spop(&self, key: &str) -> Result<Option<String>> {
        self.execute(Command::SPop(key.to_string()))?.into_opt_string()
    }

    /// One page of members
    fn sscan(&self, key: &str, cursor: u64, count: Option<usize>) -> Result<(u64, Vec<String>)> {
        self.execute(Command::SScan {
            key: key.to_string(),
            cursor,
            count,
        })?
        .into_scan_page()
    }

    // ========== Ordered-score sets ==========

    /// Add or update members, returning how many were new
    fn zadd(&self, key: &str, entries: Vec<(f64, String)>) -> Result<usize> {
        self.execute(Command::ZAdd {
            key: key.to_string(),
            entries,
        })?
        .into_usize()
    }

    /// Remove members, returning how many existed
    fn zrem(&self, key: &str, members: Vec<String>) -> Result<usize> {
        self.execute(Command::ZRem {
            key: key.to_string(),
            members,
        })?
        .into_usize()
    }

    /// Score of `member`
    fn zscore(&self, key: &str, member: &str) -> Result<Option<f64>> {
        self.execute(Command::ZScore {
            key: key.to_string(),
            member: member.to_string(),
        })?
        .into_opt_f64()
    }

    /// Increment a score
    fn zincr_by(&self, key: &str, delta: f64, member: &str) -> Result<f64> {
        self.execute(Command::ZIncrBy {
            key: key.to_string(),
            delta,
            member: member.to_string(),
        })?
        .into_f64()
    }

    /// Rank of `member`
    fn zrank(&self, key: &str, member: &str, rev: bool) -> Result<Option<usize>> {
        match self
            .execute(Command::ZRank {
                key: key.to_string(),
                member: member.to_string(),
                rev,
            })?
            .into_result()?
        {
            Reply::Nil => Ok(None),
            other => other.into_usize().map(Some),
        }
    }

    /// Members with score in `[min, max]`
    fn zcount(&self, key: &str, min: ScoreBound, max: ScoreBound) -> Result<usize> {
        self.execute(Command::ZCount {
            key: key.to_string(),
            min,
            max,
        })?
        .into_usize()
    }

    /// Cardinality
    fn zcard(&self, key: &str) -> Result<usize> {
        self.execute(Command::ZCard(key.to_string()))?.into_usize()
    }

    /// Members by inclusive rank range
    fn zrange(&self, key: &str, start: i64, stop: i64, rev: bool) -> Result<Vec<String>> {
        self.execute(Command::ZRange {
            key: key.to_string(),
            start,
            stop,
            rev,
            with_scores: false,
        })?
        .into_strings()
    }

    /// Members with scores by inclusive rank range
    fn zrange_with_scores(
        &self,
        key: &str,
        start: i64,
        stop: i64,
        rev: bool,
    ) -> Result<Vec<(String, f64)>> {
        self.execute(Command::ZRange {
            key: key.to_string(),
            start,
            stop,
            rev,
            with_scores: true,
        })?
        .into_scored()
    }

    /// Members with scores by score range
    fn zrange_by_score(
        &self,
        key: &str,
        min: ScoreBound,
        max: ScoreBound,
        limit: Option<(usize, usize)>,
        rev: bool,
    ) -> Result<Vec<(String, f64)>> {
        self.execute(Command::ZRangeByScore {
            key: key.to_string(),
            min,
            max,
            limit,
            rev,
            with_scores: true,
        })?
        .into_scored()
    }

    /// Remove by inclusive rank range
    fn zrem_range_by_rank(&self, key: &str, start: i64, stop: i64) -> Result<usize> {
        self.execute(Command::ZRemRangeByRank {
            key: key.to_string(),
            start,
            stop,
        })?
        .into_usize()
    }

    /// Remove by score range
    fn zrem_range_by_score(&self, key: &str, min: ScoreBound, max: ScoreBound) -> Result<usize> {
        self.execute(Command::ZRemRangeByScore {
            key: key.to_string(),
            min,
            max,
        })?
        .into_usize()
    }

    /// Weighted union or intersection stored into `dest`
    fn zstore(
        &self,
        dest: &str,
        keys: Vec<String>,
        weights: Option<Vec<f64>>,
        aggregate: Aggregate,
        intersect: bool,
    ) -> Result<usize> {
        let dest = dest.to_string();
        let cmd = if intersect {
            Command::ZInterStore {
                dest,
                keys,
                weights,
                aggregate,
            }
        } else {
            Command::ZUnionStore {
                dest,
                keys,
                weights,
                aggregate,
            }
        };
        self.execute(cmd)?.into_usize()
    }
}

impl<G: Gateway + ?Sized> GatewayExt for G {}
