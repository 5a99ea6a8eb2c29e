//! Index and slice arithmetic
//!
//! Non-negative indices count from the head starting at 0; negative indices
//! count from the tail starting at -1. An index is valid iff
//! `-len <= index < len`.
//!
//! `Slice` carries optional `start`, `stop` and `step`; `Slice::resolve`
//! normalizes them against a concrete length with the usual rules: bounds
//! are clamped into the container, a negative step walks backwards, and an
//! empty range resolves to zero positions rather than an error.

use crate::error::{Error, Result};
use std::ops::{Range, RangeFrom, RangeFull, RangeInclusive, RangeTo};

/// Unresolved `[start:stop:step]` slice
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Slice {
    /// First position (default: the end the step walks away from)
    pub start: Option<i64>,
    /// One past the last position (default: the end the step walks towards)
    pub stop: Option<i64>,
    /// Stride (default 1, must not be 0)
    pub step: Option<i64>,
}

impl Slice {
    /// `[start:stop]`
    pub fn new(start: i64, stop: i64) -> Self {
        Self {
            start: Some(start),
            stop: Some(stop),
            step: None,
        }
    }

    /// `[:]`
    pub fn full() -> Self {
        Self::default()
    }

    /// `[start:]`
    pub fn starting_at(start: i64) -> Self {
        Self {
            start: Some(start),
            ..Self::default()
        }
    }

    /// `[:stop]`
    pub fn until(stop: i64) -> Self {
        Self {
            stop: Some(stop),
            ..Self::default()
        }
    }

    /// Same bounds with a stride
    pub fn step(mut self, step: i64) -> Self {
        self.step = Some(step);
        self
    }

    /// Normalize against a container length
    ///
    /// # Errors
    ///
    /// `InvalidArgument` if the step is zero.
    pub fn resolve(&self, len: usize) -> Result<ResolvedSlice> {
        let step = self.step.unwrap_or(1);
        if step == 0 {
            return Err(Error::invalid("slice step cannot be zero"));
        }
        let len = len as i64;
        let (lower, upper) = if step > 0 { (0, len) } else { (-1, len - 1) };

        let clamp = |bound: i64| -> i64 {
            if bound < 0 {
                (bound + len).max(lower)
            } else {
                bound.min(upper)
            }
        };

        let start = match self.start {
            Some(s) => clamp(s),
            None if step < 0 => upper,
            None => lower,
        };
        let stop = match self.stop {
            Some(s) => clamp(s),
            None if step < 0 => lower,
            None => upper,
        };

        Ok(ResolvedSlice { start, stop, step })
    }
}

impl From<Range<i64>> for Slice {
    fn from(r: Range<i64>) -> Self {
        Slice::new(r.start, r.end)
    }
}

impl From<RangeInclusive<i64>> for Slice {
    fn from(r: RangeInclusive<i64>) -> Self {
        let (start, end) = r.into_inner();
        // `-1..=-1` would otherwise become the empty `[-1:0]`
        match end.checked_add(1) {
            Some(0) | None => Slice::starting_at(start),
            Some(stop) => Slice::new(start, stop),
        }
    }
}

impl From<RangeFrom<i64>> for Slice {
    fn from(r: RangeFrom<i64>) -> Self {
        Slice::starting_at(r.start)
    }
}

impl From<RangeTo<i64>> for Slice {
    fn from(r: RangeTo<i64>) -> Self {
        Slice::until(r.end)
    }
}

impl From<RangeFull> for Slice {
    fn from(_: RangeFull) -> Self {
        Slice::full()
    }
}

/// Slice normalized against a concrete length
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedSlice {
    /// First position (may be -1 for an empty backwards slice)
    pub start: i64,
    /// Exclusive end position
    pub stop: i64,
    /// Non-zero stride
    pub step: i64,
}

impl ResolvedSlice {
    /// Number of positions selected
    pub fn len(&self) -> usize {
        let span = if self.step > 0 {
            self.stop - self.start
        } else {
            self.start - self.stop
        };
        if span <= 0 {
            return 0;
        }
        // `unsigned_abs` keeps `i64::MIN` strides representable
        ((span as u64 - 1) / self.step.unsigned_abs() + 1) as usize
    }

    /// No positions selected
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Unit forward stride
    pub fn is_contiguous(&self) -> bool {
        self.step == 1
    }

    /// Selected positions in walk order
    pub fn indices(&self) -> impl Iterator<Item = usize> {
        let ResolvedSlice { start, step, .. } = *self;
        // every visited offset lies inside the span, so the product fits
        (0..self.len() as i128).map(move |k| (start as i128 + k * step as i128) as usize)
    }
}

/// Map a possibly negative index onto `[0, len)`
///
/// Returns `None` when the index is out of range.
pub fn normalize_index(index: i64, len: usize) -> Option<usize> {
    let len = len as i64;
    let i = if index < 0 { index + len } else { index };
    if (0..len).contains(&i) {
        Some(i as usize)
    } else {
        None
    }
}

/// Like `normalize_index`, but produces `IndexOutOfRange` naming the key
pub fn check_index(key: &str, index: i64, len: usize) -> Result<usize> {
    normalize_index(index, len).ok_or_else(|| Error::IndexOutOfRange {
        key: key.to_string(),
        index,
        len,
    })
}
