//! RDict: a remote field table presented as a string mapping
//!
//! Fields and values are stored and returned as strings. Typed decoding is
//! the caller's job; only `RList` carries a decoder.
//!
//! `pop` and `setdefault` are check-then-act sequences of two round trips
//! and are not atomic against other writers of the same key.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use sugar_core::{Error, FieldScan, Gateway, GatewayExt, Result};
use sugar_engine::Sugar;
use tracing::debug;

/// Accepted shapes for bulk construction and `update`
#[derive(Debug, Clone)]
pub enum DictUpdate {
    /// A local mapping
    Mapping(HashMap<String, String>),
    /// Field/value pairs
    Pairs(Vec<(String, String)>),
    /// Rows that must each hold exactly a field and a value
    Rows(Vec<Vec<String>>),
}

impl From<HashMap<String, String>> for DictUpdate {
    fn from(map: HashMap<String, String>) -> Self {
        DictUpdate::Mapping(map)
    }
}

impl From<Vec<(String, String)>> for DictUpdate {
    fn from(pairs: Vec<(String, String)>) -> Self {
        DictUpdate::Pairs(pairs)
    }
}

impl From<Vec<(&str, &str)>> for DictUpdate {
    fn from(pairs: Vec<(&str, &str)>) -> Self {
        DictUpdate::Pairs(
            pairs
                .into_iter()
                .map(|(f, v)| (f.to_string(), v.to_string()))
                .collect(),
        )
    }
}

impl From<Vec<Vec<String>>> for DictUpdate {
    fn from(rows: Vec<Vec<String>>) -> Self {
        DictUpdate::Rows(rows)
    }
}

impl DictUpdate {
    /// Flatten into pairs, rejecting malformed rows before anything is sent
    pub fn into_pairs(self) -> Result<Vec<(String, String)>> {
        match self {
            DictUpdate::Mapping(map) => Ok(map.into_iter().collect()),
            DictUpdate::Pairs(pairs) => Ok(pairs),
            DictUpdate::Rows(rows) => rows
                .into_iter()
                .enumerate()
                .map(|(i, row)| {
                    let n = row.len();
                    let mut it = row.into_iter();
                    match (it.next(), it.next(), it.next()) {
                        (Some(field), Some(value), None) => Ok((field, value)),
                        _ => Err(Error::invalid(format!(
                            "dictionary update sequence element #{} has length {}; 2 is required",
                            i, n
                        ))),
                    }
                })
                .collect(),
        }
    }
}

/// Remote mapping adapter
#[derive(Clone)]
pub struct RDict {
    gateway: Arc<dyn Gateway>,
    key: String,
}

impl fmt::Debug for RDict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<rdict {}>", self.key)
    }
}

impl RDict {
    /// Bind `key`
    pub fn new(sugar: &Sugar, key: impl Into<String>) -> Self {
        Self {
            gateway: Arc::clone(sugar.gateway()),
            key: key.into(),
        }
    }

    /// Bind `key` and write `source` plus `keywords`
    pub fn with_items(
        sugar: &Sugar,
        key: impl Into<String>,
        source: impl Into<DictUpdate>,
        keywords: &[(&str, &str)],
    ) -> Result<Self> {
        let dict = Self::new(sugar, key);
        dict.update(source, keywords)?;
        Ok(dict)
    }

    /// Bind `key` with every field in `fields` set to `value`
    pub fn from_keys<F: ToString>(
        sugar: &Sugar,
        key: impl Into<String>,
        fields: impl IntoIterator<Item = F>,
        value: impl ToString,
    ) -> Result<Self> {
        let value = value.to_string();
        let pairs: Vec<(String, String)> = fields
            .into_iter()
            .map(|f| (f.to_string(), value.clone()))
            .collect();
        let dict = Self::new(sugar, key);
        dict.update(pairs, &[])?;
        Ok(dict)
    }

    /// Namespace key
    pub fn key(&self) -> &str {
        &self.key
    }

    fn missing(&self, field: &str) -> Error {
        Error::not_found(format!("field '{}' in rdict '{}'", field, self.key))
    }

    /// Value of `field`
    pub fn get(&self, field: &str) -> Result<String> {
        self.gateway
            .hget(&self.key, field)?
            .ok_or_else(|| self.missing(field))
    }

    /// Value of `field`, or `default` when absent
    pub fn get_or(&self, field: &str, default: impl Into<String>) -> Result<String> {
        Ok(self
            .gateway
            .hget(&self.key, field)?
            .unwrap_or_else(|| default.into()))
    }

    /// Set one field
    pub fn set(&self, field: impl ToString, value: impl ToString) -> Result<()> {
        self.gateway
            .hset(&self.key, vec![(field.to_string(), value.to_string())])?;
        Ok(())
    }

    /// Delete one field
    pub fn delete(&self, field: &str) -> Result<()> {
        if self.gateway.hdel(&self.key, &[field])? == 0 {
            return Err(self.missing(field));
        }
        Ok(())
    }

    /// Whether `field` is present
    pub fn contains(&self, field: &str) -> Result<bool> {
        self.gateway.hexists(&self.key, field)
    }

    /// Number of fields
    pub fn len(&self) -> Result<usize> {
        self.gateway.hlen(&self.key)
    }

    /// No fields
    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }

    /// All field names
    pub fn keys(&self) -> Result<Vec<String>> {
        self.gateway.hkeys(&self.key)
    }

    /// All values
    pub fn values(&self) -> Result<Vec<String>> {
        self.gateway.hvals(&self.key)
    }

    /// All field/value pairs
    pub fn items(&self) -> Result<Vec<(String, String)>> {
        self.gateway.hgetall(&self.key)
    }

    /// Local snapshot
    pub fn copy(&self) -> Result<HashMap<String, String>> {
        Ok(self.items()?.into_iter().collect())
    }

    /// Values of several fields, `None` where absent
    pub fn get_many(&self, fields: &[&str]) -> Result<Vec<Option<String>>> {
        self.gateway.hmget(&self.key, fields)
    }

    /// Paged iteration over field/value pairs
    pub fn iter_items(&self) -> FieldScan {
        FieldScan::new(Arc::clone(&self.gateway), &self.key)
    }

    /// Paged iteration over field names
    pub fn iter_keys(&self) -> impl Iterator<Item = Result<String>> {
        self.iter_items().map(|r| r.map(|(f, _)| f))
    }

    /// Paged iteration over values
    pub fn iter_values(&self) -> impl Iterator<Item = Result<String>> {
        self.iter_items().map(|r| r.map(|(_, v)| v))
    }

    /// Remove `field` and return its value
    pub fn pop(&self, field: &str) -> Result<String> {
        let value = self.get(field)?;
        self.gateway.hdel(&self.key, &[field])?;
        Ok(value)
    }

    /// Remove `field` and return its value, or return `default` untouched
    pub fn pop_or(&self, field: &str, default: impl Into<String>) -> Result<String> {
        match self.gateway.hget(&self.key, field)? {
            Some(value) => {
                self.gateway.hdel(&self.key, &[field])?;
                Ok(value)
            }
            None => Ok(default.into()),
        }
    }

    /// Remove and return the first pair the field cursor yields
    pub fn popitem(&self) -> Result<(String, String)> {
        let first = self.iter_items().next().transpose()?;
        let Some((field, value)) = first else {
            return Err(Error::not_found(format!("popitem(): rdict '{}' is empty", self.key)));
        };
        self.gateway.hdel(&self.key, &[&field])?;
        Ok((field, value))
    }

    /// Value of `field`, writing `default` first if absent
    pub fn setdefault(&self, field: &str, default: impl Into<String>) -> Result<String> {
        if let Some(value) = self.gateway.hget(&self.key, field)? {
            return Ok(value);
        }
        let default = default.into();
        self.gateway
            .hset(&self.key, vec![(field.to_string(), default.clone())])?;
        Ok(default)
    }

    /// Write `source` and `keywords` with one command
    ///
    /// # Errors
    ///
    /// `InvalidArgument` naming the offending row if a row is not a pair;
    /// nothing is written in that case.
    pub fn update(&self, source: impl Into<DictUpdate>, keywords: &[(&str, &str)]) -> Result<()> {
        let mut pairs = source.into().into_pairs()?;
        pairs.extend(
            keywords
                .iter()
                .map(|(f, v)| (f.to_string(), v.to_string())),
        );
        if pairs.is_empty() {
            return Ok(());
        }
        let count = pairs.len();
        self.gateway.hset(&self.key, pairs)?;
        debug!(target: "sugar::dict", key = %self.key, count, "Updated fields");
        Ok(())
    }

    /// Add `delta` to an integer field
    ///
    /// Fails with `NotFound` when the field is absent.
    pub fn incr_by(&self, field: &str, delta: i64) -> Result<i64> {
        if !self.contains(field)? {
            return Err(self.missing(field));
        }
        self.gateway.hincr_by(&self.key, field, delta)
    }

    /// Add `delta` to a float field
    ///
    /// Fails with `NotFound` when the field is absent.
    pub fn incr_by_float(&self, field: &str, delta: f64) -> Result<f64> {
        if !self.contains(field)? {
            return Err(self.missing(field));
        }
        self.gateway.hincr_by_float(&self.key, field, delta)
    }

    /// Delete the key
    pub fn clear(&self) -> Result<()> {
        self.gateway.del(&[&self.key])?;
        Ok(())
    }
}
