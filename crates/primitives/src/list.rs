//! RList: a remote list presented as a mutable, sliceable sequence
//!
//! ## Design
//!
//! The store only offers length, head/tail push and pop, index read and
//! write, range read, range trim, pivot insert and remove-by-value. Every
//! other sequence operation is built from those:
//!
//! - Slice reads resolve `(start, stop, step)` against the current length
//!   and issue one `LRANGE` (unit step) or one batch of `LINDEX`.
//! - Structural mutations (slice assign/delete, middle insert/delete) read
//!   what they need first, then apply every dependent index write plus the
//!   final push or trim as one atomic batch, so concurrent readers never
//!   observe a half-shifted list.
//! - Reversal moves every element onto a private temporary key with
//!   `LMOVE` and renames it over the original, in the same batch.
//!
//! ## Element Decoding
//!
//! Values are written through `ToString` and read back as strings, then
//! projected by the list's decoder (`FromStored` by default).
//!
//! ## Errors
//!
//! Indices are validated against a fresh length before any write, so
//! `IndexOutOfRange` and `InvalidArgument` never leave the list modified.

use std::fmt;
use std::sync::Arc;
use sugar_core::{
    check_index, default_decoder, Command, Decoder, End, Error, FromStored, Gateway, GatewayExt,
    InsertPosition, Result, Slice, SCAN_PAGE,
};
use sugar_engine::Sugar;
use tracing::debug;
use uuid::Uuid;

use crate::support::{read_positions, run_batch, to_strings};

/// Remote list adapter
pub struct RList<T = String> {
    gateway: Arc<dyn Gateway>,
    key: String,
    decoder: Decoder<T>,
}

impl<T> Clone for RList<T> {
    fn clone(&self) -> Self {
        Self {
            gateway: Arc::clone(&self.gateway),
            key: self.key.clone(),
            decoder: Arc::clone(&self.decoder),
        }
    }
}

impl<T> fmt::Debug for RList<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<rlist {}>", self.key)
    }
}

/// Right-hand side of `concat`
pub enum ListOperand<'a, T> {
    /// Values held locally
    Local(&'a [T]),
    /// Another remote list
    Remote(&'a RList<T>),
}

impl RList<String> {
    /// Bind `key` with string elements
    pub fn new(sugar: &Sugar, key: impl Into<String>) -> Self {
        Self::typed(sugar, key)
    }

    /// Bind `key` and append `values`
    pub fn with_values<V: ToString>(
        sugar: &Sugar,
        key: impl Into<String>,
        values: impl IntoIterator<Item = V>,
    ) -> Result<Self> {
        let list = Self::new(sugar, key);
        list.extend(values)?;
        Ok(list)
    }
}

impl<T: FromStored + 'static> RList<T> {
    /// Bind `key`, decoding elements with `T::from_stored`
    pub fn typed(sugar: &Sugar, key: impl Into<String>) -> Self {
        Self::with_decoder(sugar, key, default_decoder::<T>())
    }
}

impl<T> RList<T> {
    /// Bind `key`, decoding elements with `decoder`
    pub fn with_decoder(sugar: &Sugar, key: impl Into<String>, decoder: Decoder<T>) -> Self {
        Self {
            gateway: Arc::clone(sugar.gateway()),
            key: key.into(),
            decoder,
        }
    }

    /// Namespace key
    pub fn key(&self) -> &str {
        &self.key
    }

    fn decode(&self, raw: String) -> Result<T> {
        (self.decoder)(raw)
    }

    fn decode_all(&self, raw: Vec<String>) -> Result<Vec<T>> {
        raw.into_iter().map(|s| self.decode(s)).collect()
    }

    fn raw_all(&self) -> Result<Vec<String>> {
        self.gateway.lrange(&self.key, 0, -1)
    }

    /// Values at `[from, len)`, empty when `from` is past the end
    fn raw_suffix(&self, from: usize, len: usize) -> Result<Vec<String>> {
        if from >= len {
            return Ok(Vec::new());
        }
        self.gateway.lrange(&self.key, from as i64, -1)
    }

    fn lset_cmd(&self, index: usize, value: String) -> Command {
        Command::LSet {
            key: self.key.clone(),
            index: index as i64,
            value,
        }
    }

    /// `LTRIM` down to `new_len`, or `DEL` when nothing remains
    fn truncate_cmd(&self, new_len: usize) -> Command {
        if new_len == 0 {
            Command::Del(vec![self.key.clone()])
        } else {
            Command::LTrim {
                key: self.key.clone(),
                start: 0,
                stop: new_len as i64 - 1,
            }
        }
    }

    // ========== Size ==========

    /// Number of elements (0 when the key is absent)
    pub fn len(&self) -> Result<usize> {
        self.gateway.llen(&self.key)
    }

    /// No elements
    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }

    // ========== Reads ==========

    /// Element at `index` (negative counts from the tail)
    pub fn get(&self, index: i64) -> Result<T> {
        let len = self.len()?;
        let i = check_index(&self.key, index, len)?;
        match self.gateway.lindex(&self.key, i as i64)? {
            Some(raw) => self.decode(raw),
            None => Err(Error::IndexOutOfRange {
                key: self.key.clone(),
                index,
                len,
            }),
        }
    }

    /// Elements selected by `slice`, in walk order
    pub fn get_slice(&self, slice: impl Into<Slice>) -> Result<Vec<T>> {
        let len = self.len()?;
        let resolved = slice.into().resolve(len)?;
        if resolved.is_empty() {
            return Ok(Vec::new());
        }
        if resolved.is_contiguous() {
            let raw = self
                .gateway
                .lrange(&self.key, resolved.start, resolved.stop - 1)?;
            return self.decode_all(raw);
        }
        let indices: Vec<usize> = resolved.indices().collect();
        let replies = read_positions(&self.gateway, &self.key, &indices, len, |i| {
            Command::LIndex {
                key: self.key.clone(),
                index: i,
            }
        })?;
        replies
            .into_iter()
            .map(|r| self.decode(r.into_string()?))
            .collect()
    }

    /// Snapshot of every element
    pub fn copy(&self) -> Result<Vec<T>> {
        let raw = self.raw_all()?;
        self.decode_all(raw)
    }

    /// Iterate by index, one round trip per element
    ///
    /// Iteration ends at the first index past the end at the time it is
    /// read, so elements appended during iteration are visited.
    pub fn iter(&self) -> ListIter<T> {
        ListIter {
            list: self.clone(),
            next: 0,
            done: false,
        }
    }

    // ========== Writes ==========

    /// Overwrite the element at `index`
    pub fn set(&self, index: i64, value: impl ToString) -> Result<()> {
        let len = self.len()?;
        let i = check_index(&self.key, index, len)?;
        self.gateway.lset(&self.key, i as i64, &value.to_string())
    }

    /// Assign `values` to the positions selected by `slice`
    ///
    /// With a unit step the list grows or shrinks to fit; with any other
    /// step `values` must have exactly one element per selected position.
    pub fn set_slice<V: ToString>(
        &self,
        slice: impl Into<Slice>,
        values: impl IntoIterator<Item = V>,
    ) -> Result<()> {
        let values = to_strings(values);
        let len = self.len()?;
        let resolved = slice.into().resolve(len)?;

        if !resolved.is_contiguous() {
            if resolved.len() != values.len() {
                return Err(Error::invalid(format!(
                    "attempt to assign sequence of size {} to extended slice of size {}",
                    values.len(),
                    resolved.len()
                )));
            }
            let commands = resolved
                .indices()
                .zip(values)
                .map(|(i, v)| self.lset_cmd(i, v))
                .collect();
            run_batch(&self.gateway, commands)?;
            return Ok(());
        }

        let start = resolved.start as usize;
        let stop = resolved.stop.max(resolved.start) as usize;
        let span = stop - start;
        let count = values.len();

        let mut commands = Vec::new();
        if count == span {
            commands.extend(
                values
                    .into_iter()
                    .enumerate()
                    .map(|(j, v)| self.lset_cmd(start + j, v)),
            );
        } else if count > span {
            // Final layout from `start` is values ++ old suffix. Positions
            // below the old length are overwritten, the rest are pushed.
            let mut layout = values;
            layout.extend(self.raw_suffix(stop, len)?);
            let pushed = layout.split_off(len - start);
            commands.extend(
                layout
                    .into_iter()
                    .enumerate()
                    .map(|(j, v)| self.lset_cmd(start + j, v)),
            );
            commands.push(Command::RPush {
                key: self.key.clone(),
                values: pushed,
            });
            debug!(
                target: "sugar::list",
                key = %self.key,
                start,
                span,
                count,
                "Growing slice assignment"
            );
        } else {
            let suffix = self.raw_suffix(stop, len)?;
            let new_len = len - (span - count);
            commands.extend(
                values
                    .into_iter()
                    .chain(suffix)
                    .enumerate()
                    .map(|(j, v)| self.lset_cmd(start + j, v)),
            );
            commands.push(self.truncate_cmd(new_len));
            debug!(
                target: "sugar::list",
                key = %self.key,
                start,
                span,
                count,
                "Shrinking slice assignment"
            );
        }
        run_batch(&self.gateway, commands)?;
        Ok(())
    }

    /// Insert `value` before position `index`
    ///
    /// `index >= len` appends; an index below `-len` inserts at the head.
    pub fn insert(&self, index: i64, value: impl ToString) -> Result<()> {
        let value = value.to_string();
        let len = self.len()?;
        let target = if index < 0 {
            (index + len as i64).max(0)
        } else {
            index
        };
        if target == 0 {
            self.gateway.push(&self.key, End::Head, vec![value])?;
            return Ok(());
        }
        if target as usize >= len {
            self.gateway.push(&self.key, End::Tail, vec![value])?;
            return Ok(());
        }

        let target = target as usize;
        let suffix = self.raw_suffix(target, len)?;
        let Some(last) = suffix.last().cloned() else {
            return Err(Error::IndexOutOfRange {
                key: self.key.clone(),
                index,
                len,
            });
        };
        let mut commands = vec![Command::RPush {
            key: self.key.clone(),
            values: vec![last],
        }];
        // Shift right from the end down to the target, then overwrite it
        for i in (target + 1..len).rev() {
            commands.push(self.lset_cmd(i, suffix[i - 1 - target].clone()));
        }
        commands.push(self.lset_cmd(target, value));
        run_batch(&self.gateway, commands)?;
        debug!(
            target: "sugar::list",
            key = %self.key,
            index = target,
            len,
            "Inserted in the middle"
        );
        Ok(())
    }

    /// Push onto the head or the tail
    pub fn push(&self, value: impl ToString, end: End) -> Result<()> {
        self.gateway.push(&self.key, end, vec![value.to_string()])?;
        Ok(())
    }

    /// Push onto the tail
    pub fn append(&self, value: impl ToString) -> Result<()> {
        self.push(value, End::Tail)
    }

    /// Push every value onto the tail in one command
    pub fn extend<V: ToString>(&self, values: impl IntoIterator<Item = V>) -> Result<()> {
        let values = to_strings(values);
        if values.is_empty() {
            return Ok(());
        }
        self.gateway.push(&self.key, End::Tail, values)?;
        Ok(())
    }

    // ========== Deletes ==========

    /// Delete the element at `index`
    pub fn del(&self, index: i64) -> Result<()> {
        let len = self.len()?;
        let i = check_index(&self.key, index, len)?;
        if i == 0 {
            self.gateway.pop(&self.key, End::Head)?;
        } else if i == len - 1 {
            self.gateway.pop(&self.key, End::Tail)?;
        } else {
            let after = self.raw_suffix(i + 1, len)?;
            let mut commands: Vec<Command> = after
                .into_iter()
                .enumerate()
                .map(|(j, v)| self.lset_cmd(i + j, v))
                .collect();
            commands.push(Command::RPop(self.key.clone()));
            run_batch(&self.gateway, commands)?;
            debug!(
                target: "sugar::list",
                key = %self.key,
                index = i,
                len,
                "Deleted from the middle"
            );
        }
        Ok(())
    }

    /// Delete every position selected by `slice`
    pub fn del_slice(&self, slice: impl Into<Slice>) -> Result<()> {
        let len = self.len()?;
        let resolved = slice.into().resolve(len)?;
        if resolved.is_empty() {
            return Ok(());
        }
        let mut doomed: Vec<usize> = resolved.indices().collect();
        doomed.sort_unstable();
        let first = doomed[0];

        // Single left-to-right compaction, shift = deletions seen so far
        let mut commands = Vec::new();
        let mut removed = 0;
        for (offset, value) in self.raw_suffix(first, len)?.into_iter().enumerate() {
            let i = first + offset;
            if doomed.binary_search(&i).is_ok() {
                removed += 1;
            } else {
                commands.push(self.lset_cmd(i - removed, value));
            }
        }
        commands.push(self.truncate_cmd(len - doomed.len()));
        run_batch(&self.gateway, commands)?;
        debug!(
            target: "sugar::list",
            key = %self.key,
            removed = doomed.len(),
            len,
            "Deleted slice"
        );
        Ok(())
    }

    /// Remove and return the element at `index`
    pub fn pop(&self, index: i64) -> Result<T> {
        let len = self.len()?;
        let i = check_index(&self.key, index, len)?;
        let end = if i == 0 {
            Some(End::Head)
        } else if i == len - 1 {
            Some(End::Tail)
        } else {
            None
        };
        if let Some(end) = end {
            return match self.gateway.pop(&self.key, end)? {
                Some(raw) => self.decode(raw),
                None => Err(Error::IndexOutOfRange {
                    key: self.key.clone(),
                    index,
                    len,
                }),
            };
        }
        let value = self.get(i as i64)?;
        self.del(i as i64)?;
        Ok(value)
    }

    /// Remove up to `count` occurrences of `value`
    ///
    /// `count > 0` scans from the head, `count < 0` from the tail, `0`
    /// removes all. Fails with `NotFound` when nothing was removed.
    pub fn remove(&self, value: impl ToString, count: i64) -> Result<usize> {
        let value = value.to_string();
        let removed = self.gateway.lrem(&self.key, count, &value)?;
        if removed == 0 {
            return Err(Error::not_found(format!(
                "{} not in rlist '{}'",
                value, self.key
            )));
        }
        Ok(removed)
    }

    /// Insert `value` next to the first occurrence of `pivot`; returns the
    /// new length
    ///
    /// # Errors
    ///
    /// `NotFound` if `pivot` is not in the list; nothing is written then.
    pub fn insert_relative(
        &self,
        pivot: impl ToString,
        value: impl ToString,
        position: InsertPosition,
    ) -> Result<usize> {
        let pivot = pivot.to_string();
        self.gateway
            .linsert(&self.key, position, &pivot, &value.to_string())?
            .ok_or_else(|| Error::not_found(format!("{} not in rlist '{}'", pivot, self.key)))
    }

    /// Remove and return every element in one atomic step
    pub fn pop_all(&self) -> Result<Vec<T>> {
        let replies = run_batch(
            &self.gateway,
            vec![
                Command::LRange {
                    key: self.key.clone(),
                    start: 0,
                    stop: -1,
                },
                Command::Del(vec![self.key.clone()]),
            ],
        )?;
        let raw = match replies.into_iter().next() {
            Some(reply) => reply.into_strings()?,
            None => return Err(Error::protocol("batch returned no reply for LRANGE")),
        };
        debug!(target: "sugar::list", key = %self.key, count = raw.len(), "pop_all");
        self.decode_all(raw)
    }

    /// Delete the key
    pub fn clear(&self) -> Result<()> {
        self.gateway.del(&[&self.key])?;
        Ok(())
    }

    // ========== Reordering ==========

    /// Sort in place, numerically unless `alpha`
    pub fn sort(&self, reverse: bool, alpha: bool) -> Result<()> {
        self.gateway.sort_store(&self.key, alpha, reverse)?;
        Ok(())
    }

    /// Reverse in place
    pub fn reverse(&self) -> Result<()> {
        let len = self.len()?;
        if len < 2 {
            return Ok(());
        }
        let tmp = format!("{}:reverse:{}", self.key, Uuid::new_v4());
        let mut commands: Vec<Command> = (0..len)
            .map(|_| Command::LMove {
                src: self.key.clone(),
                dst: tmp.clone(),
                from: End::Tail,
                to: End::Tail,
            })
            .collect();
        commands.push(Command::Rename {
            src: tmp,
            dst: self.key.clone(),
            nx: false,
        });
        run_batch(&self.gateway, commands)?;
        debug!(target: "sugar::list", key = %self.key, len, "Reversed");
        Ok(())
    }

    // ========== Concatenation and repetition ==========

    /// Append the raw contents of `src` (`len` elements) `times` times,
    /// reading one page at a time through `source`
    fn append_paged(
        &self,
        source: &Arc<dyn Gateway>,
        src: &str,
        len: usize,
        times: usize,
    ) -> Result<()> {
        for _ in 0..times {
            let mut offset = 0;
            while offset < len {
                let stop = (offset + SCAN_PAGE).min(len);
                let page = source.lrange(src, offset as i64, stop as i64 - 1)?;
                if page.is_empty() {
                    break;
                }
                offset += page.len();
                self.gateway.push(&self.key, End::Tail, page)?;
            }
        }
        Ok(())
    }

    /// Repeat the current contents `times` times in place
    ///
    /// `0` clears the list; `1` leaves it unchanged.
    pub fn repeat_in_place(&self, times: usize) -> Result<()> {
        match times {
            0 => self.clear(),
            1 => Ok(()),
            n => {
                let len = self.len()?;
                self.append_paged(&self.gateway, &self.key, len, n - 1)
            }
        }
    }
}

impl<T: Clone> RList<T> {
    /// Local concatenation of this list and `other`
    pub fn concat(&self, other: ListOperand<'_, T>) -> Result<Vec<T>> {
        let mut out = self.copy()?;
        match other {
            ListOperand::Local(values) => out.extend_from_slice(values),
            ListOperand::Remote(list) => out.extend(list.copy()?),
        }
        Ok(out)
    }

    /// Local repetition of this list
    pub fn repeat(&self, times: usize) -> Result<Vec<T>> {
        let once = self.copy()?;
        let mut out = Vec::with_capacity(once.len() * times);
        for _ in 0..times {
            out.extend_from_slice(&once);
        }
        Ok(out)
    }
}

impl<T: ToString> RList<T> {
    /// Append `other` without reading this list
    ///
    /// A remote operand is read through its own store, which may differ
    /// from this list's.
    pub fn concat_in_place(&self, other: ListOperand<'_, T>) -> Result<()> {
        match other {
            ListOperand::Local(values) => self.extend(values.iter().map(|v| v.to_string())),
            ListOperand::Remote(list) => {
                let len = list.len()?;
                self.append_paged(&list.gateway, &list.key, len, 1)
            }
        }
    }
}

impl<T: PartialEq> RList<T> {
    /// Position of the first element equal to `value`
    pub fn index(&self, value: &T) -> Result<usize> {
        self.index_in(value, Slice::full())
    }

    /// Position of the first element equal to `value` within `slice`
    pub fn index_in(&self, value: &T, slice: impl Into<Slice>) -> Result<usize> {
        let slice = slice.into();
        if slice.step.is_some_and(|s| s != 1) {
            return Err(Error::invalid("index search requires a unit step"));
        }
        let len = self.len()?;
        let resolved = slice.resolve(len)?;
        if !resolved.is_empty() {
            let raw = self
                .gateway
                .lrange(&self.key, resolved.start, resolved.stop - 1)?;
            for (offset, item) in raw.into_iter().enumerate() {
                if self.decode(item)? == *value {
                    return Ok(resolved.start as usize + offset);
                }
            }
        }
        Err(Error::not_found(format!("value not in rlist '{}'", self.key)))
    }

    /// Number of elements equal to `value`
    pub fn count(&self, value: &T) -> Result<usize> {
        let mut n = 0;
        for raw in self.raw_all()? {
            if self.decode(raw)? == *value {
                n += 1;
            }
        }
        Ok(n)
    }

    /// Whether any element equals `value`
    pub fn contains(&self, value: &T) -> Result<bool> {
        for raw in self.raw_all()? {
            if self.decode(raw)? == *value {
                return Ok(true);
            }
        }
        Ok(false)
    }
}

/// Index-walking iterator returned by `RList::iter`
pub struct ListIter<T> {
    list: RList<T>,
    next: i64,
    done: bool,
}

impl<T> Iterator for ListIter<T> {
    type Item = Result<T>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match self.list.gateway.lindex(&self.list.key, self.next) {
            Ok(Some(raw)) => {
                self.next += 1;
                Some(self.list.decode(raw))
            }
            Ok(None) => {
                self.done = true;
                None
            }
            Err(e) => {
                self.done = true;
                Some(Err(e))
            }
        }
    }
}
