//! SortedSet: members ordered by score, addressable by member and by rank
//!
//! Rank slices use the half-open `[start, stop)` convention and are
//! translated to the store's inclusive ranks by issuing `stop - 1`. An
//! empty resolved range never reaches the store, since an inclusive range
//! with `stop < start` has wrap-around meaning there. Stepped slices are
//! emulated with one batched single-rank request per position.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use sugar_core::{
    check_index, Aggregate, Command, Error, Gateway, GatewayExt, Reply, Result, ScoreBound, Slice,
    SCAN_PAGE,
};
use sugar_engine::Sugar;
use tracing::debug;

use crate::support::run_batch;

/// Remote ordered-score set adapter
#[derive(Clone)]
pub struct SortedSet {
    gateway: Arc<dyn Gateway>,
    key: String,
}

impl fmt::Debug for SortedSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<sortedset {}>", self.key)
    }
}

impl SortedSet {
    /// Bind `key`
    pub fn new(sugar: &Sugar, key: impl Into<String>) -> Self {
        Self {
            gateway: Arc::clone(sugar.gateway()),
            key: key.into(),
        }
    }

    /// Bind `key` and add `(member, score)` entries
    pub fn with_entries<M: ToString>(
        sugar: &Sugar,
        key: impl Into<String>,
        entries: impl IntoIterator<Item = (M, f64)>,
    ) -> Result<Self> {
        let zset = Self::new(sugar, key);
        zset.add_many(entries)?;
        Ok(zset)
    }

    /// Namespace key
    pub fn key(&self) -> &str {
        &self.key
    }

    fn missing(&self, member: &str) -> Error {
        Error::not_found(format!("member '{}' in sortedset '{}'", member, self.key))
    }

    // ========== Members ==========

    /// Add or rescore one member; true if it was new
    pub fn add(&self, member: impl ToString, score: f64) -> Result<bool> {
        Ok(self
            .gateway
            .zadd(&self.key, vec![(score, member.to_string())])?
            == 1)
    }

    /// Add or rescore several members with one command
    pub fn add_many<M: ToString>(
        &self,
        entries: impl IntoIterator<Item = (M, f64)>,
    ) -> Result<usize> {
        let entries: Vec<(f64, String)> = entries
            .into_iter()
            .map(|(m, s)| (s, m.to_string()))
            .collect();
        if entries.is_empty() {
            return Ok(0);
        }
        self.gateway.zadd(&self.key, entries)
    }

    /// Remove `member`, failing with `NotFound` if absent
    pub fn remove(&self, member: &str) -> Result<()> {
        if self.gateway.zrem(&self.key, vec![member.to_string()])? == 0 {
            return Err(self.missing(member));
        }
        Ok(())
    }

    /// Remove `member` if present
    pub fn discard(&self, member: &str) -> Result<()> {
        self.gateway.zrem(&self.key, vec![member.to_string()])?;
        Ok(())
    }

    /// Score of `member`
    pub fn score(&self, member: &str) -> Result<f64> {
        self.gateway
            .zscore(&self.key, member)?
            .ok_or_else(|| self.missing(member))
    }

    /// Add `delta` to the score of `member`, creating it at `delta`
    pub fn incr_by(&self, member: &str, delta: f64) -> Result<f64> {
        self.gateway.zincr_by(&self.key, delta, member)
    }

    /// Rank of `member`, from the lowest score unless `reverse`
    pub fn rank(&self, member: &str, reverse: bool) -> Result<usize> {
        self.gateway
            .zrank(&self.key, member, reverse)?
            .ok_or_else(|| self.missing(member))
    }

    /// Whether `member` is present
    pub fn contains(&self, member: &str) -> Result<bool> {
        Ok(self.gateway.zscore(&self.key, member)?.is_some())
    }

    /// Number of members with score in `[min, max]`
    pub fn count(&self, min: impl Into<ScoreBound>, max: impl Into<ScoreBound>) -> Result<usize> {
        self.gateway.zcount(&self.key, min.into(), max.into())
    }

    /// Cardinality
    pub fn len(&self) -> Result<usize> {
        self.gateway.zcard(&self.key)
    }

    /// No members
    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }

    // ========== Rank access ==========

    /// Member and score at `rank` (negative counts from the highest)
    pub fn get(&self, rank: i64) -> Result<(String, f64)> {
        let len = self.len()?;
        let r = check_index(&self.key, rank, len)? as i64;
        self.gateway
            .zrange_with_scores(&self.key, r, r, false)?
            .into_iter()
            .next()
            .ok_or_else(|| Error::IndexOutOfRange {
                key: self.key.clone(),
                index: rank,
                len,
            })
    }

    /// Members selected by a rank slice
    pub fn range(&self, slice: impl Into<Slice>, reverse: bool) -> Result<Vec<String>> {
        Ok(self
            .range_with_scores(slice, reverse)?
            .into_iter()
            .map(|(m, _)| m)
            .collect())
    }

    /// Members and scores selected by a rank slice
    ///
    /// With `reverse`, rank 0 is the highest score.
    pub fn range_with_scores(
        &self,
        slice: impl Into<Slice>,
        reverse: bool,
    ) -> Result<Vec<(String, f64)>> {
        let len = self.len()?;
        let resolved = slice.into().resolve(len)?;
        if resolved.is_empty() {
            return Ok(Vec::new());
        }
        if resolved.is_contiguous() {
            return self.gateway.zrange_with_scores(
                &self.key,
                resolved.start,
                resolved.stop - 1,
                reverse,
            );
        }
        let commands = resolved
            .indices()
            .map(|i| Command::ZRange {
                key: self.key.clone(),
                start: i as i64,
                stop: i as i64,
                rev: reverse,
                with_scores: true,
            })
            .collect();
        let mut out = Vec::with_capacity(resolved.len());
        for reply in run_batch(&self.gateway, commands)? {
            out.extend(reply.into_scored()?);
        }
        Ok(out)
    }

    /// Members and scores with score between `min` and `max`
    ///
    /// `limit` is `(offset, count)` applied after ordering.
    pub fn range_by_score(
        &self,
        min: impl Into<ScoreBound>,
        max: impl Into<ScoreBound>,
        limit: Option<(usize, usize)>,
        reverse: bool,
    ) -> Result<Vec<(String, f64)>> {
        self.gateway
            .zrange_by_score(&self.key, min.into(), max.into(), limit, reverse)
    }

    /// Remove every member selected by a rank slice; returns the count
    pub fn remove_range(&self, slice: impl Into<Slice>) -> Result<usize> {
        let len = self.len()?;
        let resolved = slice.into().resolve(len)?;
        if resolved.is_empty() {
            return Ok(0);
        }
        if resolved.is_contiguous() {
            return self
                .gateway
                .zrem_range_by_rank(&self.key, resolved.start, resolved.stop - 1);
        }
        // Highest rank first so earlier removals don't shift later ones
        let mut ranks: Vec<usize> = resolved.indices().collect();
        ranks.sort_unstable_by(|a, b| b.cmp(a));
        let commands = ranks
            .iter()
            .map(|&r| Command::ZRemRangeByRank {
                key: self.key.clone(),
                start: r as i64,
                stop: r as i64,
            })
            .collect();
        let removed = run_batch(&self.gateway, commands)?
            .into_iter()
            .map(Reply::into_usize)
            .sum::<Result<usize>>()?;
        debug!(target: "sugar::zset", key = %self.key, removed, "Removed stepped rank slice");
        Ok(removed)
    }

    /// Remove members with score between `min` and `max`
    pub fn remove_range_by_score(
        &self,
        min: impl Into<ScoreBound>,
        max: impl Into<ScoreBound>,
    ) -> Result<usize> {
        self.gateway
            .zrem_range_by_score(&self.key, min.into(), max.into())
    }

    /// Every member and score in rank order
    pub fn items(&self) -> Result<Vec<(String, f64)>> {
        self.gateway.zrange_with_scores(&self.key, 0, -1, false)
    }

    /// Local snapshot in rank order
    pub fn copy(&self) -> Result<Vec<(String, f64)>> {
        self.items()
    }

    /// Rank-ordered iteration, one page per round trip
    pub fn iter(&self) -> SortedSetIter {
        SortedSetIter {
            zset: self.clone(),
            offset: 0,
            page: Vec::new().into_iter(),
            done: false,
        }
    }

    /// Delete the key
    pub fn clear(&self) -> Result<()> {
        self.gateway.del(&[&self.key])?;
        Ok(())
    }

    // ========== Store operations ==========

    /// Weighted union of `keys` stored into `dest`
    ///
    /// # Errors
    ///
    /// `InvalidArgument` if `aggregate` is not `SUM`, `MIN` or `MAX`, if
    /// `weights` does not match `keys` in length, if `keys` is empty, or if
    /// `dest` exists and `overwrite` is false. Nothing is written then.
    pub fn union_store(
        sugar: &Sugar,
        dest: &str,
        keys: &[&str],
        weights: Option<&[f64]>,
        aggregate: &str,
        overwrite: bool,
    ) -> Result<SortedSet> {
        Self::store(sugar, dest, keys, weights, aggregate, overwrite, false)
    }

    /// Weighted intersection of `keys` stored into `dest`
    ///
    /// Validation as for `union_store`.
    pub fn intersection_store(
        sugar: &Sugar,
        dest: &str,
        keys: &[&str],
        weights: Option<&[f64]>,
        aggregate: &str,
        overwrite: bool,
    ) -> Result<SortedSet> {
        Self::store(sugar, dest, keys, weights, aggregate, overwrite, true)
    }

    fn store(
        sugar: &Sugar,
        dest: &str,
        keys: &[&str],
        weights: Option<&[f64]>,
        aggregate: &str,
        overwrite: bool,
        intersect: bool,
    ) -> Result<SortedSet> {
        let aggregate = Aggregate::from_str(aggregate)?;
        if keys.is_empty() {
            return Err(Error::invalid("at least one source key is required"));
        }
        if let Some(w) = weights {
            if w.len() != keys.len() {
                return Err(Error::invalid(format!(
                    "{} weights given for {} keys",
                    w.len(),
                    keys.len()
                )));
            }
        }
        let gateway = sugar.gateway();
        if !overwrite && gateway.exists(dest)? {
            return Err(Error::invalid(format!(
                "destination '{}' already exists",
                dest
            )));
        }
        let size = gateway.zstore(
            dest,
            keys.iter().map(|k| k.to_string()).collect(),
            weights.map(<[f64]>::to_vec),
            aggregate,
            intersect,
        )?;
        debug!(
            target: "sugar::zset",
            dest,
            sources = keys.len(),
            size,
            intersect,
            "Stored combination"
        );
        Ok(SortedSet::new(sugar, dest))
    }
}

/// Paged iterator returned by `SortedSet::iter`
pub struct SortedSetIter {
    zset: SortedSet,
    offset: usize,
    page: std::vec::IntoIter<(String, f64)>,
    done: bool,
}

impl Iterator for SortedSetIter {
    type Item = Result<(String, f64)>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(item) = self.page.next() {
                return Some(Ok(item));
            }
            if self.done {
                return None;
            }
            let start = self.offset as i64;
            let stop = (self.offset + SCAN_PAGE) as i64 - 1;
            match self
                .zset
                .gateway
                .zrange_with_scores(&self.zset.key, start, stop, false)
            {
                Ok(page) => {
                    self.done = page.len() < SCAN_PAGE;
                    self.offset += page.len();
                    self.page = page.into_iter();
                }
                Err(e) => {
                    self.done = true;
                    return Some(Err(e));
                }
            }
        }
    }
}
