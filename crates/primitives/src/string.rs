//! RStr: a remote scalar mutated in place
//!
//! Increments, appends and range overwrites run on the store without
//! reading the value back. Offsets are byte offsets; `slice` translates
//! half-open ranges to the store's inclusive `GETRANGE`.
//!
//! The store keeps raw bytes. Text reads fail with `Decode` when the bytes
//! they select are not valid UTF-8; the `*_bytes` reads never do.

use std::fmt;
use std::sync::Arc;
use sugar_core::{
    check_index, Command, Error, Gateway, GatewayExt, Number, Result, SetOptions, Slice,
};
use sugar_engine::Sugar;

use crate::support::read_positions;

/// Remote scalar adapter
#[derive(Clone)]
pub struct RStr {
    gateway: Arc<dyn Gateway>,
    key: String,
}

impl fmt::Debug for RStr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<rstr {}>", self.key)
    }
}

impl RStr {
    /// Bind `key`
    pub fn new(sugar: &Sugar, key: impl Into<String>) -> Self {
        Self {
            gateway: Arc::clone(sugar.gateway()),
            key: key.into(),
        }
    }

    /// Bind `key` and write `value`
    pub fn with_value(sugar: &Sugar, key: impl Into<String>, value: impl ToString) -> Result<Self> {
        let s = Self::new(sugar, key);
        s.set(value)?;
        Ok(s)
    }

    /// Namespace key
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Overwrite unconditionally
    pub fn set(&self, value: impl ToString) -> Result<()> {
        self.gateway
            .set(&self.key, &value.to_string(), SetOptions::new())?;
        Ok(())
    }

    /// Write with expiry and existence conditions; false if a condition
    /// prevented the write
    pub fn set_with(&self, value: impl ToString, options: SetOptions) -> Result<bool> {
        self.gateway.set(&self.key, &value.to_string(), options)
    }

    /// Current value
    ///
    /// # Errors
    ///
    /// `NotFound` if absent, `Decode` if the bytes are not UTF-8.
    pub fn get(&self) -> Result<String> {
        text(self.get_bytes()?)
    }

    /// Current value as raw bytes
    pub fn get_bytes(&self) -> Result<Vec<u8>> {
        self.gateway
            .get_bytes(&self.key)?
            .ok_or_else(|| Error::not_found(format!("rstr '{}'", self.key)))
    }

    /// Write `value` and return the previous value, if any
    pub fn get_set(&self, value: impl ToString) -> Result<Option<String>> {
        self.gateway.getset(&self.key, &value.to_string())
    }

    /// Byte length (0 when absent)
    pub fn len(&self) -> Result<usize> {
        self.gateway.strlen(&self.key)
    }

    /// Empty or absent
    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }

    /// Concatenate in place; returns the new length
    pub fn append(&self, suffix: impl ToString) -> Result<usize> {
        self.gateway.append(&self.key, &suffix.to_string())
    }

    /// Overwrite starting at byte `offset`; returns the new length
    pub fn set_range(&self, offset: usize, value: impl ToString) -> Result<usize> {
        self.gateway.setrange(&self.key, offset, &value.to_string())
    }

    /// Byte at `index`
    pub fn byte_at(&self, index: i64) -> Result<u8> {
        let len = self.len()?;
        let i = check_index(&self.key, index, len)? as i64;
        let bytes = self.gateway.getrange(&self.key, i, i)?;
        bytes
            .first()
            .copied()
            .ok_or_else(|| Error::protocol("GETRANGE returned no byte for a valid index"))
    }

    /// Byte at `index` as a one-character string
    ///
    /// Fails with `Decode` when that byte is part of a multi-byte character.
    pub fn char_at(&self, index: i64) -> Result<String> {
        text(vec![self.byte_at(index)?])
    }

    /// Bytes selected by `slice`, as text
    pub fn slice(&self, slice: impl Into<Slice>) -> Result<String> {
        text(self.slice_bytes(slice)?)
    }

    /// Bytes selected by `slice`
    pub fn slice_bytes(&self, slice: impl Into<Slice>) -> Result<Vec<u8>> {
        let len = self.len()?;
        let resolved = slice.into().resolve(len)?;
        if resolved.is_empty() {
            return Ok(Vec::new());
        }
        if resolved.is_contiguous() {
            return self
                .gateway
                .getrange(&self.key, resolved.start, resolved.stop - 1);
        }
        let indices: Vec<usize> = resolved.indices().collect();
        let replies = read_positions(&self.gateway, &self.key, &indices, len, |i| {
            Command::GetRange {
                key: self.key.clone(),
                start: i,
                end: i,
            }
        })?;
        replies
            .into_iter()
            .map(|r| Ok(r.into_opt_bytes()?.unwrap_or_default()))
            .collect::<Result<Vec<_>>>()
            .map(|parts| parts.concat())
    }

    /// Add `amount`; the store creates the value at `amount` if absent
    ///
    /// Fails with `Remote` if the stored value is not numeric.
    pub fn increase(&self, amount: impl Into<Number>) -> Result<Number> {
        match amount.into() {
            Number::Int(delta) => self.gateway.incr_by(&self.key, delta).map(Number::Int),
            Number::Float(delta) => self
                .gateway
                .incr_by_float(&self.key, delta)
                .map(Number::Float),
        }
    }

    /// Subtract `amount`
    pub fn decrease(&self, amount: impl Into<Number>) -> Result<Number> {
        self.increase(amount.into().negated()?)
    }

    /// Delete the key
    pub fn clear(&self) -> Result<()> {
        self.gateway.del(&[&self.key])?;
        Ok(())
    }

    // ========== Multi-key ==========

    /// Values of several keys, `None` where absent
    pub fn multi_get(sugar: &Sugar, keys: &[&str]) -> Result<Vec<Option<String>>> {
        sugar.gateway().mget(keys)
    }

    /// Write several keys with one command
    pub fn multi_set<K: ToString, V: ToString>(
        sugar: &Sugar,
        pairs: impl IntoIterator<Item = (K, V)>,
    ) -> Result<()> {
        let pairs = owned_pairs(pairs);
        if pairs.is_empty() {
            return Ok(());
        }
        sugar.gateway().mset(pairs)
    }

    /// Write several keys only if none of them exists
    ///
    /// # Errors
    ///
    /// `InvalidArgument` if any key exists; nothing is written then.
    pub fn multi_set_not_exist<K: ToString, V: ToString>(
        sugar: &Sugar,
        pairs: impl IntoIterator<Item = (K, V)>,
    ) -> Result<()> {
        let pairs = owned_pairs(pairs);
        if pairs.is_empty() {
            return Ok(());
        }
        if !sugar.gateway().msetnx(pairs)? {
            return Err(Error::invalid("one or more keys already exist"));
        }
        Ok(())
    }
}

fn text(bytes: Vec<u8>) -> Result<String> {
    String::from_utf8(bytes).map_err(|e| Error::Decode {
        value: String::from_utf8_lossy(e.as_bytes()).into_owned(),
        target: "utf-8 text",
    })
}

fn owned_pairs<K: ToString, V: ToString>(
    pairs: impl IntoIterator<Item = (K, V)>,
) -> Vec<(String, String)> {
    pairs
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}
