//! Core types shared by every layer
//!
//! - KeyType: the remote type a namespace key currently holds
//! - End: head or tail of a sequence
//! - InsertPosition: before/after a pivot value
//! - Aggregate: score combination mode for sorted-set stores
//! - ScoreBound: inclusive/exclusive/infinite score range endpoints
//! - SetOptions: expiry and existence conditions for scalar writes
//! - Number: integer-or-float increment amount

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Type of the value a namespace key holds, as reported by remote introspection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum KeyType {
    /// Ordered sequence
    List,
    /// Field table
    Hash,
    /// Unordered set
    Set,
    /// Ordered-score set
    ZSet,
    /// Scalar string
    String,
    /// Key is absent
    None,
}

impl KeyType {
    /// Parse the store's type name (`TYPE` reply)
    pub fn from_type_name(name: &str) -> Result<Self> {
        match name {
            "list" => Ok(KeyType::List),
            "hash" => Ok(KeyType::Hash),
            "set" => Ok(KeyType::Set),
            "zset" => Ok(KeyType::ZSet),
            "string" => Ok(KeyType::String),
            "none" => Ok(KeyType::None),
            other => Err(Error::protocol(format!("unknown key type '{}'", other))),
        }
    }

    /// The store's name for this type
    pub fn as_str(&self) -> &'static str {
        match self {
            KeyType::List => "list",
            KeyType::Hash => "hash",
            KeyType::Set => "set",
            KeyType::ZSet => "zset",
            KeyType::String => "string",
            KeyType::None => "none",
        }
    }
}

impl fmt::Display for KeyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One end of a sequence
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum End {
    /// Index 0
    Head,
    /// Index -1
    Tail,
}

impl End {
    /// Wire keyword (`LEFT`/`RIGHT`)
    pub fn keyword(&self) -> &'static str {
        match self {
            End::Head => "LEFT",
            End::Tail => "RIGHT",
        }
    }
}

/// Where `LINSERT` places the new value relative to the pivot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum InsertPosition {
    /// Immediately before the pivot
    Before,
    /// Immediately after the pivot
    After,
}

impl InsertPosition {
    /// Wire keyword
    pub fn keyword(&self) -> &'static str {
        match self {
            InsertPosition::Before => "BEFORE",
            InsertPosition::After => "AFTER",
        }
    }
}

/// Score aggregation for sorted-set union/intersection stores
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Aggregate {
    /// Sum of weighted scores
    #[default]
    Sum,
    /// Minimum weighted score
    Min,
    /// Maximum weighted score
    Max,
}

impl Aggregate {
    /// Wire keyword
    pub fn keyword(&self) -> &'static str {
        match self {
            Aggregate::Sum => "SUM",
            Aggregate::Min => "MIN",
            Aggregate::Max => "MAX",
        }
    }

    /// Combine an accumulated score with a new weighted score
    pub fn combine(&self, acc: f64, next: f64) -> f64 {
        match self {
            Aggregate::Sum => acc + next,
            Aggregate::Min => acc.min(next),
            Aggregate::Max => acc.max(next),
        }
    }
}

impl FromStr for Aggregate {
    type Err = Error;

    /// Accepts exactly `SUM`, `MIN` or `MAX`
    fn from_str(s: &str) -> Result<Self> {
        match s {
            "SUM" => Ok(Aggregate::Sum),
            "MIN" => Ok(Aggregate::Min),
            "MAX" => Ok(Aggregate::Max),
            other => Err(Error::invalid(format!(
                "aggregate must be one of SUM, MIN, MAX; got '{}'",
                other
            ))),
        }
    }
}

/// Endpoint of a score range
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum ScoreBound {
    /// `score >= x` (as min) or `score <= x` (as max)
    Inclusive(f64),
    /// `score > x` (as min) or `score < x` (as max)
    Exclusive(f64),
    /// Unbounded below
    NegInf,
    /// Unbounded above
    PosInf,
}

impl ScoreBound {
    /// Whether `score` satisfies this bound used as a range minimum
    pub fn admits_as_min(&self, score: f64) -> bool {
        match *self {
            ScoreBound::Inclusive(x) => score >= x,
            ScoreBound::Exclusive(x) => score > x,
            ScoreBound::NegInf => true,
            ScoreBound::PosInf => score == f64::INFINITY,
        }
    }

    /// Whether `score` satisfies this bound used as a range maximum
    pub fn admits_as_max(&self, score: f64) -> bool {
        match *self {
            ScoreBound::Inclusive(x) => score <= x,
            ScoreBound::Exclusive(x) => score < x,
            ScoreBound::NegInf => score == f64::NEG_INFINITY,
            ScoreBound::PosInf => true,
        }
    }
}

impl From<f64> for ScoreBound {
    fn from(x: f64) -> Self {
        ScoreBound::Inclusive(x)
    }
}

impl From<i64> for ScoreBound {
    fn from(x: i64) -> Self {
        ScoreBound::Inclusive(x as f64)
    }
}

impl fmt::Display for ScoreBound {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScoreBound::Inclusive(x) => write!(f, "{}", format_score(*x)),
            ScoreBound::Exclusive(x) => write!(f, "({}", format_score(*x)),
            ScoreBound::NegInf => f.write_str("-inf"),
            ScoreBound::PosInf => f.write_str("+inf"),
        }
    }
}

impl FromStr for ScoreBound {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "-inf" => return Ok(ScoreBound::NegInf),
            "+inf" | "inf" => return Ok(ScoreBound::PosInf),
            _ => {}
        }
        let (exclusive, digits) = match s.strip_prefix('(') {
            Some(rest) => (true, rest),
            None => (false, s),
        };
        let x = parse_score(digits)?;
        Ok(if exclusive {
            ScoreBound::Exclusive(x)
        } else {
            ScoreBound::Inclusive(x)
        })
    }
}

/// Format a score the way the store prints it (`3`, `2.5`, `inf`)
pub fn format_score(x: f64) -> String {
    if x == f64::INFINITY {
        "inf".to_string()
    } else if x == f64::NEG_INFINITY {
        "-inf".to_string()
    } else {
        format!("{}", x)
    }
}

/// Parse a score string, accepting `inf`/`+inf`/`-inf`
pub fn parse_score(s: &str) -> Result<f64> {
    match s {
        "inf" | "+inf" => Ok(f64::INFINITY),
        "-inf" => Ok(f64::NEG_INFINITY),
        _ => s
            .parse::<f64>()
            .ok()
            .filter(|x| !x.is_nan())
            .ok_or_else(|| Error::Decode {
                value: s.to_string(),
                target: "f64",
            }),
    }
}

/// Options for a scalar write
///
/// At most one expiry (`ex` seconds or `px` milliseconds) and at most one
/// existence condition (`nx` or `xx`) may be given.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SetOptions {
    /// Expire after this many seconds
    pub ex: Option<u64>,
    /// Expire after this many milliseconds
    pub px: Option<u64>,
    /// Only write if the key is absent
    pub nx: bool,
    /// Only write if the key is present
    pub xx: bool,
}

impl SetOptions {
    /// Unconditional write without expiry
    pub fn new() -> Self {
        Self::default()
    }

    /// Expire after `secs` seconds
    pub fn ex(mut self, secs: u64) -> Self {
        self.ex = Some(secs);
        self
    }

    /// Expire after `millis` milliseconds
    pub fn px(mut self, millis: u64) -> Self {
        self.px = Some(millis);
        self
    }

    /// Only write if absent
    pub fn nx(mut self) -> Self {
        self.nx = true;
        self
    }

    /// Only write if present
    pub fn xx(mut self) -> Self {
        self.xx = true;
        self
    }

    /// Reject contradictory combinations
    pub fn validate(&self) -> Result<()> {
        if self.nx && self.xx {
            return Err(Error::invalid(
                "only-if-absent and only-if-present are mutually exclusive",
            ));
        }
        if self.ex.is_some() && self.px.is_some() {
            return Err(Error::invalid(
                "expiry may be given in seconds or milliseconds, not both",
            ));
        }
        if self.ex == Some(0) || self.px == Some(0) {
            return Err(Error::invalid("expiry must be positive"));
        }
        Ok(())
    }

    /// Expiry converted to milliseconds, if any
    pub fn ttl_millis(&self) -> Option<u64> {
        self.px.or(self.ex.map(|s| s.saturating_mul(1000)))
    }
}

/// Increment amount: integer or float
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Number {
    /// Integer amount (`INCRBY`)
    Int(i64),
    /// Float amount (`INCRBYFLOAT`)
    Float(f64),
}

impl Number {
    /// Parse a stored numeric string, preferring integers
    pub fn parse(s: &str) -> Result<Self> {
        if let Ok(i) = s.parse::<i64>() {
            return Ok(Number::Int(i));
        }
        s.parse::<f64>()
            .ok()
            .filter(|f| f.is_finite())
            .map(Number::Float)
            .ok_or_else(|| Error::Decode {
                value: s.to_string(),
                target: "number",
            })
    }

    /// Value negated (for decrements)
    pub fn negated(self) -> Result<Self> {
        match self {
            Number::Int(i) => i
                .checked_neg()
                .map(Number::Int)
                .ok_or_else(|| Error::invalid("increment would overflow")),
            Number::Float(f) => Ok(Number::Float(-f)),
        }
    }

    /// Value as f64
    pub fn as_f64(&self) -> f64 {
        match *self {
            Number::Int(i) => i as f64,
            Number::Float(f) => f,
        }
    }
}

impl From<i64> for Number {
    fn from(i: i64) -> Self {
        Number::Int(i)
    }
}

impl From<i32> for Number {
    fn from(i: i32) -> Self {
        Number::Int(i as i64)
    }
}

impl From<f64> for Number {
    fn from(f: f64) -> Self {
        Number::Float(f)
    }
}

impl fmt::Display for Number {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Number::Int(i) => write!(f, "{}", i),
            Number::Float(x) => write!(f, "{}", x),
        }
    }
}
