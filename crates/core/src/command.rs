//! Command and reply vocabulary of the remote store
//!
//! `Command` is the closed set of primitives the adapters consume. Every
//! gateway (in-process engine, wire client) interprets the same variants with
//! the same reply shapes, so adapters can decide not-found and bounds
//! conditions purely from reply codes.

use crate::error::{Error, Result};
use crate::types::{parse_score, Aggregate, End, InsertPosition, ScoreBound, SetOptions};

/// One primitive remote operation
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    // ========== Key space ==========
    /// Liveness probe, replies `PONG`
    Ping,
    /// 1 if the key exists
    Exists(String),
    /// Number of keys removed
    Del(Vec<String>),
    /// Rename `src` to `dst`; with `nx`, 0 if `dst` exists
    Rename {
        /// Source key
        src: String,
        /// Destination key
        dst: String,
        /// Fail (reply 0) if the destination exists
        nx: bool,
    },
    /// Status reply naming the key's type
    Type(String),
    /// Serialized payload, nil if absent
    Dump(String),
    /// Recreate a key from a `Dump` payload
    Restore {
        /// Target key
        key: String,
        /// Time to live in milliseconds, 0 for none
        ttl_ms: u64,
        /// Payload produced by `Dump`
        payload: Vec<u8>,
        /// Overwrite an existing key
        replace: bool,
    },
    /// One page of the key space: `[cursor, [keys...]]`
    Scan {
        /// Cursor from the previous page, 0 to start
        cursor: u64,
        /// Glob filter
        pattern: Option<String>,
        /// Page size hint
        count: Option<usize>,
    },
    /// Number of keys
    DbSize,
    /// Remove every key
    FlushDb,
    /// Persist synchronously
    Save,
    /// Persist in the background
    BgSave,

    // ========== Scalars ==========
    /// Value or nil
    Get(String),
    /// Write with options; `OK` or nil when a condition failed
    Set {
        /// Key
        key: String,
        /// New value
        value: String,
        /// Expiry/conditions
        options: SetOptions,
    },
    /// Write and return the previous value
    GetSet {
        /// Key
        key: String,
        /// New value
        value: String,
    },
    /// Byte length, 0 if absent
    StrLen(String),
    /// Append, returns the new length
    Append {
        /// Key
        key: String,
        /// Suffix
        value: String,
    },
    /// Substring with inclusive bounds (negative from the end)
    GetRange {
        /// Key
        key: String,
        /// First offset
        start: i64,
        /// Last offset, inclusive
        end: i64,
    },
    /// Overwrite at `offset`, zero-padding; returns the new length
    SetRange {
        /// Key
        key: String,
        /// Byte offset
        offset: usize,
        /// Replacement bytes
        value: String,
    },
    /// Integer increment, returns the new value
    IncrBy {
        /// Key
        key: String,
        /// Amount
        delta: i64,
    },
    /// Float increment, returns the new value as a string
    IncrByFloat {
        /// Key
        key: String,
        /// Amount
        delta: f64,
    },
    /// Values or nils for several keys
    MGet(Vec<String>),
    /// Write several keys
    MSet(Vec<(String, String)>),
    /// Write several keys only if none exists; 1 on success
    MSetNx(Vec<(String, String)>),

    // ========== Sequences ==========
    /// Length, 0 if absent
    LLen(String),
    /// Push each value at the head in order; returns the new length
    LPush {
        /// Key
        key: String,
        /// Values
        values: Vec<String>,
    },
    /// Push each value at the tail in order; returns the new length
    RPush {
        /// Key
        key: String,
        /// Values
        values: Vec<String>,
    },
    /// Remove and return the head, nil if empty
    LPop(String),
    /// Remove and return the tail, nil if empty
    RPop(String),
    /// Element at index, nil if out of range
    LIndex {
        /// Key
        key: String,
        /// Index
        index: i64,
    },
    /// Overwrite the element at index; error if out of range
    LSet {
        /// Key
        key: String,
        /// Index
        index: i64,
        /// Value
        value: String,
    },
    /// Elements in `[start, stop]`, inclusive, clamped
    LRange {
        /// Key
        key: String,
        /// First index
        start: i64,
        /// Last index, inclusive
        stop: i64,
    },
    /// Keep only `[start, stop]`, inclusive
    LTrim {
        /// Key
        key: String,
        /// First kept index
        start: i64,
        /// Last kept index, inclusive
        stop: i64,
    },
    /// Insert relative to the first occurrence of `pivot`; -1 if no pivot
    LInsert {
        /// Key
        key: String,
        /// Before or after
        position: InsertPosition,
        /// Existing value
        pivot: String,
        /// New value
        value: String,
    },
    /// Remove occurrences of `value`; count > 0 from head, < 0 from tail, 0 all
    LRem {
        /// Key
        key: String,
        /// Count
        count: i64,
        /// Value to remove
        value: String,
    },
    /// Atomically pop one end of `src` and push onto one end of `dst`
    LMove {
        /// Source list
        src: String,
        /// Destination list
        dst: String,
        /// End popped from `src`
        from: End,
        /// End pushed onto `dst`
        to: End,
    },
    /// Sort elements, optionally storing the result
    Sort {
        /// Key
        key: String,
        /// Lexicographic instead of numeric
        alpha: bool,
        /// Descending
        desc: bool,
        /// Store the result here instead of returning it
        store: Option<String>,
    },

    // ========== Field tables ==========
    /// 1 if the field exists
    HExists {
        /// Key
        key: String,
        /// Field
        field: String,
    },
    /// Field value or nil
    HGet {
        /// Key
        key: String,
        /// Field
        field: String,
    },
    /// Set fields; returns number of new fields
    HSet {
        /// Key
        key: String,
        /// Field/value pairs
        pairs: Vec<(String, String)>,
    },
    /// Remove fields; returns number removed
    HDel {
        /// Key
        key: String,
        /// Fields
        fields: Vec<String>,
    },
    /// Field count
    HLen(String),
    /// All fields
    HKeys(String),
    /// All values
    HVals(String),
    /// Flat field/value array
    HGetAll(String),
    /// One page of field/value pairs: `[cursor, [f, v, ...]]`
    HScan {
        /// Key
        key: String,
        /// Cursor
        cursor: u64,
        /// Page size hint
        count: Option<usize>,
    },
    /// Integer field increment
    HIncrBy {
        /// Key
        key: String,
        /// Field
        field: String,
        /// Amount
        delta: i64,
    },
    /// Float field increment
    HIncrByFloat {
        /// Key
        key: String,
        /// Field
        field: String,
        /// Amount
        delta: f64,
    },
    /// Several field values (nil for missing)
    HMGet {
        /// Key
        key: String,
        /// Fields
        fields: Vec<String>,
    },

    // ========== Sets ==========
    /// Cardinality
    SCard(String),
    /// 1 if member
    SIsMember {
        /// Key
        key: String,
        /// Member
        member: String,
    },
    /// Add members; returns number added
    SAdd {
        /// Key
        key: String,
        /// Members
        members: Vec<String>,
    },
    /// Remove members; returns number removed
    SRem {
        /// Key
        key: String,
        /// Members
        members: Vec<String>,
    },
    /// All members
    SMembers(String),
    /// Union of sets
    SUnion(Vec<String>),
    /// Intersection of sets
    SInter(Vec<String>),
    /// First set minus the others
    SDiff(Vec<String>),
    /// Union stored into `dest`; returns cardinality
    SUnionStore {
        /// Destination
        dest: String,
        /// Sources
        keys: Vec<String>,
    },
    /// Intersection stored into `dest`
    SInterStore {
        /// Destination
        dest: String,
        /// Sources
        keys: Vec<String>,
    },
    /// Difference stored into `dest`
    SDiffStore {
        /// Destination
        dest: String,
        /// Sources
        keys: Vec<String>,
    },
    /// Remove and return a random member, nil if empty
    SPop(String),
    /// One page of members: `[cursor, [members...]]`
    SScan {
        /// Key
        key: String,
        /// Cursor
        cursor: u64,
        /// Page size hint
        count: Option<usize>,
    },

    // ========== Ordered-score sets ==========
    /// Add or update members; returns number added
    ZAdd {
        /// Key
        key: String,
        /// (score, member) entries
        entries: Vec<(f64, String)>,
    },
    /// Remove members; returns number removed
    ZRem {
        /// Key
        key: String,
        /// Members
        members: Vec<String>,
    },
    /// Score or nil
    ZScore {
        /// Key
        key: String,
        /// Member
        member: String,
    },
    /// Increment a score; returns the new score
    ZIncrBy {
        /// Key
        key: String,
        /// Amount
        delta: f64,
        /// Member
        member: String,
    },
    /// Rank or nil
    ZRank {
        /// Key
        key: String,
        /// Member
        member: String,
        /// Rank from the highest score
        rev: bool,
    },
    /// Members with score in range
    ZCount {
        /// Key
        key: String,
        /// Lower bound
        min: ScoreBound,
        /// Upper bound
        max: ScoreBound,
    },
    /// Cardinality
    ZCard(String),
    /// Members by rank, inclusive
    ZRange {
        /// Key
        key: String,
        /// First rank
        start: i64,
        /// Last rank, inclusive
        stop: i64,
        /// Descending order
        rev: bool,
        /// Interleave scores
        with_scores: bool,
    },
    /// Members by score
    ZRangeByScore {
        /// Key
        key: String,
        /// Lower bound
        min: ScoreBound,
        /// Upper bound
        max: ScoreBound,
        /// (offset, count)
        limit: Option<(usize, usize)>,
        /// Descending order
        rev: bool,
        /// Interleave scores
        with_scores: bool,
    },
    /// Remove by rank, inclusive; returns number removed
    ZRemRangeByRank {
        /// Key
        key: String,
        /// First rank
        start: i64,
        /// Last rank, inclusive
        stop: i64,
    },
    /// Remove by score; returns number removed
    ZRemRangeByScore {
        /// Key
        key: String,
        /// Lower bound
        min: ScoreBound,
        /// Upper bound
        max: ScoreBound,
    },
    /// Weighted union stored into `dest`
    ZUnionStore {
        /// Destination
        dest: String,
        /// Sources
        keys: Vec<String>,
        /// Per-source weights
        weights: Option<Vec<f64>>,
        /// Combination mode
        aggregate: Aggregate,
    },
    /// Weighted intersection stored into `dest`
    ZInterStore {
        /// Destination
        dest: String,
        /// Sources
        keys: Vec<String>,
        /// Per-source weights
        weights: Option<Vec<f64>>,
        /// Combination mode
        aggregate: Aggregate,
    },
}

impl Command {
    /// Command name as sent on the wire
    pub fn name(&self) -> &'static str {
        match self {
            Command::Ping => "PING",
            Command::Exists(_) => "EXISTS",
            Command::Del(_) => "DEL",
            Command::Rename { nx: false, .. } => "RENAME",
            Command::Rename { nx: true, .. } => "RENAMENX",
            Command::Type(_) => "TYPE",
            Command::Dump(_) => "DUMP",
            Command::Restore { .. } => "RESTORE",
            Command::Scan { .. } => "SCAN",
            Command::DbSize => "DBSIZE",
            Command::FlushDb => "FLUSHDB",
            Command::Save => "SAVE",
            Command::BgSave => "BGSAVE",
            Command::Get(_) => "GET",
            Command::Set { .. } => "SET",
            Command::GetSet { .. } => "GETSET",
            Command::StrLen(_) => "STRLEN",
            Command::Append { .. } => "APPEND",
            Command::GetRange { .. } => "GETRANGE",
            Command::SetRange { .. } => "SETRANGE",
            Command::IncrBy { .. } => "INCRBY",
            Command::IncrByFloat { .. } => "INCRBYFLOAT",
            Command::MGet(_) => "MGET",
            Command::MSet(_) => "MSET",
            Command::MSetNx(_) => "MSETNX",
            Command::LLen(_) => "LLEN",
            Command::LPush { .. } => "LPUSH",
            Command::RPush { .. } => "RPUSH",
            Command::LPop(_) => "LPOP",
            Command::RPop(_) => "RPOP",
            Command::LIndex { .. } => "LINDEX",
            Command::LSet { .. } => "LSET",
            Command::LRange { .. } => "LRANGE",
            Command::LTrim { .. } => "LTRIM",
            Command::LInsert { .. } => "LINSERT",
            Command::LRem { .. } => "LREM",
            Command::LMove { .. } => "LMOVE",
            Command::Sort { .. } => "SORT",
            Command::HExists { .. } => "HEXISTS",
            Command::HGet { .. } => "HGET",
            Command::HSet { .. } => "HSET",
            Command::HDel { .. } => "HDEL",
            Command::HLen(_) => "HLEN",
            Command::HKeys(_) => "HKEYS",
            Command::HVals(_) => "HVALS",
            Command::HGetAll(_) => "HGETALL",
            Command::HScan { .. } => "HSCAN",
            Command::HIncrBy { .. } => "HINCRBY",
            Command::HIncrByFloat { .. } => "HINCRBYFLOAT",
            Command::HMGet { .. } => "HMGET",
            Command::SCard(_) => "SCARD",
            Command::SIsMember { .. } => "SISMEMBER",
            Command::SAdd { .. } => "SADD",
            Command::SRem { .. } => "SREM",
            Command::SMembers(_) => "SMEMBERS",
            Command::SUnion(_) => "SUNION",
            Command::SInter(_) => "SINTER",
            Command::SDiff(_) => "SDIFF",
            Command::SUnionStore { .. } => "SUNIONSTORE",
            Command::SInterStore { .. } => "SINTERSTORE",
            Command::SDiffStore { .. } => "SDIFFSTORE",
            Command::SPop(_) => "SPOP",
            Command::SScan { .. } => "SSCAN",
            Command::ZAdd { .. } => "ZADD",
            Command::ZRem { .. } => "ZREM",
            Command::ZScore { .. } => "ZSCORE",
            Command::ZIncrBy { .. } => "ZINCRBY",
            Command::ZRank { rev: false, .. } => "ZRANK",
            Command::ZRank { rev: true, .. } => "ZREVRANK",
            Command::ZCount { .. } => "ZCOUNT",
            Command::ZCard(_) => "ZCARD",
            Command::ZRange { rev: false, .. } => "ZRANGE",
            Command::ZRange { rev: true, .. } => "ZREVRANGE",
            Command::ZRangeByScore { rev: false, .. } => "ZRANGEBYSCORE",
            Command::ZRangeByScore { rev: true, .. } => "ZREVRANGEBYSCORE",
            Command::ZRemRangeByRank { .. } => "ZREMRANGEBYRANK",
            Command::ZRemRangeByScore { .. } => "ZREMRANGEBYSCORE",
            Command::ZUnionStore { .. } => "ZUNIONSTORE",
            Command::ZInterStore { .. } => "ZINTERSTORE",
        }
    }
}

/// Reply to one command
#[derive(Debug, Clone, PartialEq)]
pub enum Reply {
    /// Absent value
    Nil,
    /// Status line (`OK`, `PONG`, type names)
    Status(String),
    /// Integer
    Int(i64),
    /// Binary-safe string
    Bulk(Vec<u8>),
    /// Nested replies
    Array(Vec<Reply>),
    /// Error line returned by the store
    Error(String),
}

impl Reply {
    /// Bulk reply from text
    pub fn bulk(s: impl Into<String>) -> Self {
        Reply::Bulk(s.into().into_bytes())
    }

    /// `OK` status
    pub fn ok() -> Self {
        Reply::Status("OK".to_string())
    }

    /// Convert an `Error` reply into `Err`
    pub fn into_result(self) -> Result<Reply> {
        match self {
            Reply::Error(msg) => Err(Error::from_reply(&msg)),
            other => Ok(other),
        }
    }

    fn unexpected(&self, wanted: &str) -> Error {
        Error::protocol(format!("expected {} reply, got {:?}", wanted, self))
    }

    /// Integer reply
    pub fn into_int(self) -> Result<i64> {
        match self.into_result()? {
            Reply::Int(n) => Ok(n),
            other => Err(other.unexpected("integer")),
        }
    }

    /// Non-negative integer reply
    pub fn into_usize(self) -> Result<usize> {
        let n = self.into_int()?;
        usize::try_from(n).map_err(|_| Error::protocol(format!("negative count {}", n)))
    }

    /// 0/1 integer reply
    pub fn into_bool(self) -> Result<bool> {
        Ok(self.into_int()? != 0)
    }

    /// `OK` (true) or nil (false), as replied by conditional writes
    pub fn into_ok(self) -> Result<bool> {
        match self.into_result()? {
            Reply::Status(_) => Ok(true),
            Reply::Nil => Ok(false),
            other => Err(other.unexpected("status or nil")),
        }
    }

    /// Binary-safe optional payload
    pub fn into_opt_bytes(self) -> Result<Option<Vec<u8>>> {
        match self.into_result()? {
            Reply::Nil => Ok(None),
            Reply::Bulk(b) => Ok(Some(b)),
            Reply::Status(s) => Ok(Some(s.into_bytes())),
            other => Err(other.unexpected("bulk")),
        }
    }

    /// Optional text
    pub fn into_opt_string(self) -> Result<Option<String>> {
        self.into_opt_bytes()?
            .map(|b| String::from_utf8(b).map_err(|e| Error::protocol(e.to_string())))
            .transpose()
    }

    /// Required text
    pub fn into_string(self) -> Result<String> {
        self.into_opt_string()?
            .ok_or_else(|| Error::protocol("expected bulk reply, got nil"))
    }

    /// Optional float encoded as text
    pub fn into_opt_f64(self) -> Result<Option<f64>> {
        self.into_opt_string()?.map(|s| parse_score(&s)).transpose()
    }

    /// Required float encoded as text
    pub fn into_f64(self) -> Result<f64> {
        self.into_opt_f64()?
            .ok_or_else(|| Error::protocol("expected float reply, got nil"))
    }

    /// Array of replies (nil counts as empty)
    pub fn into_array(self) -> Result<Vec<Reply>> {
        match self.into_result()? {
            Reply::Array(items) => Ok(items),
            Reply::Nil => Ok(Vec::new()),
            other => Err(other.unexpected("array")),
        }
    }

    /// Array of required strings
    pub fn into_strings(self) -> Result<Vec<String>> {
        self.into_array()?.into_iter().map(Reply::into_string).collect()
    }

    /// Array of optional strings (`MGET`, `HMGET`)
    pub fn into_opt_strings(self) -> Result<Vec<Option<String>>> {
        self.into_array()?
            .into_iter()
            .map(Reply::into_opt_string)
            .collect()
    }

    /// Flat `[a1, b1, a2, b2, ...]` array as pairs
    pub fn into_pairs(self) -> Result<Vec<(String, String)>> {
        let flat = self.into_strings()?;
        if flat.len() % 2 != 0 {
            return Err(Error::protocol("odd number of elements in pair reply"));
        }
        let mut out = Vec::with_capacity(flat.len() / 2);
        let mut it = flat.into_iter();
        while let (Some(a), Some(b)) = (it.next(), it.next()) {
            out.push((a, b));
        }
        Ok(out)
    }

    /// Flat `[member, score, ...]` array as scored members
    pub fn into_scored(self) -> Result<Vec<(String, f64)>> {
        self.into_pairs()?
            .into_iter()
            .map(|(m, s)| Ok((m, parse_score(&s)?)))
            .collect()
    }

    /// Scan page `[cursor, [items...]]`
    pub fn into_scan_page(self) -> Result<(u64, Vec<String>)> {
        let mut parts = self.into_array()?;
        if parts.len() != 2 {
            return Err(Error::protocol("scan reply must have two elements"));
        }
        let items = parts.pop().map(Reply::into_strings).transpose()?.unwrap_or_default();
        let cursor = parts
            .pop()
            .map(Reply::into_string)
            .transpose()?
            .unwrap_or_default();
        let cursor = cursor
            .parse::<u64>()
            .map_err(|_| Error::protocol(format!("invalid scan cursor '{}'", cursor)))?;
        Ok((cursor, items))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_names() {
        assert_eq!(Command::LLen("k".into()).name(), "LLEN");
        assert_eq!(
            Command::Rename {
                src: "a".into(),
                dst: "b".into(),
                nx: true
            }
            .name(),
            "RENAMENX"
        );
        assert_eq!(
            Command::ZRank {
                key: "z".into(),
                member: "m".into(),
                rev: true
            }
            .name(),
            "ZREVRANK"
        );
    }

    #[test]
    fn test_error_reply_becomes_err() {
        let r = Reply::Error("ERR no such key".into());
        assert!(matches!(r.into_int(), Err(Error::Remote(_))));
    }

    #[test]
    fn test_opt_string() {
        assert_eq!(Reply::Nil.into_opt_string().unwrap(), None);
        assert_eq!(
            Reply::bulk("v").into_opt_string().unwrap(),
            Some("v".to_string())
        );
        assert!(Reply::Int(1).into_opt_string().is_err());
    }

    #[test]
    fn test_into_ok() {
        assert!(Reply::ok().into_ok().unwrap());
        assert!(!Reply::Nil.into_ok().unwrap());
    }

    #[test]
    fn test_pairs_and_scored() {
        let r = Reply::Array(vec![
            Reply::bulk("a"),
            Reply::bulk("1"),
            Reply::bulk("b"),
            Reply::bulk("2.5"),
        ]);
        assert_eq!(
            r.clone().into_pairs().unwrap(),
            vec![("a".into(), "1".into()), ("b".into(), "2.5".into())]
        );
        assert_eq!(
            r.into_scored().unwrap(),
            vec![("a".to_string(), 1.0), ("b".to_string(), 2.5)]
        );
        assert!(Reply::Array(vec![Reply::bulk("a")]).into_pairs().is_err());
    }

    #[test]
    fn test_scan_page() {
        let r = Reply::Array(vec![
            Reply::bulk("17"),
            Reply::Array(vec![Reply::bulk("x"), Reply::bulk("y")]),
        ]);
        let (cursor, items) = r.into_scan_page().unwrap();
        assert_eq!(cursor, 17);
        assert_eq!(items, vec!["x", "y"]);
    }

    #[test]
    fn test_into_usize_rejects_negative() {
        assert!(Reply::Int(-1).into_usize().is_err());
        assert_eq!(Reply::Int(3).into_usize().unwrap(), 3);
    }
}
