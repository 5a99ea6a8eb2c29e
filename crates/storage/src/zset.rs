//! Ordered-score set representation
//!
//! Members are indexed twice: a hash map for O(1) score lookup and a
//! `BTreeSet` of `(score, member)` for rank order. Ties on score are broken
//! by the member's byte order. Both indexes are updated together by every
//! mutating method.

use crate::range::inclusive_range;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BTreeSet;
use sugar_core::ScoreBound;

#[derive(Debug, Clone)]
struct Ranked {
    score: f64,
    member: String,
}

impl PartialEq for Ranked {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Ranked {}

impl PartialOrd for Ranked {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Ranked {
    fn cmp(&self, other: &Self) -> Ordering {
        self.score
            .total_cmp(&other.score)
            .then_with(|| self.member.cmp(&other.member))
    }
}

/// Member → score mapping kept in rank order
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(from = "Vec<(String, f64)>", into = "Vec<(String, f64)>")]
pub struct ZSetValue {
    scores: FxHashMap<String, f64>,
    order: BTreeSet<Ranked>,
}

impl PartialEq for ZSetValue {
    fn eq(&self, other: &Self) -> bool {
        self.scores == other.scores
    }
}

impl From<Vec<(String, f64)>> for ZSetValue {
    fn from(entries: Vec<(String, f64)>) -> Self {
        let mut z = ZSetValue::default();
        for (member, score) in entries {
            z.insert(member, score);
        }
        z
    }
}

impl From<ZSetValue> for Vec<(String, f64)> {
    fn from(z: ZSetValue) -> Self {
        z.order.into_iter().map(|r| (r.member, r.score)).collect()
    }
}

impl ZSetValue {
    /// Number of members
    pub fn len(&self) -> usize {
        self.scores.len()
    }

    /// No members
    pub fn is_empty(&self) -> bool {
        self.scores.is_empty()
    }

    /// Score of `member`
    pub fn score(&self, member: &str) -> Option<f64> {
        self.scores.get(member).copied()
    }

    /// Insert or update; true if the member is new
    ///
    /// `-0.0` is stored as `0.0` so it ties with other zero scores.
    pub fn insert(&mut self, member: String, score: f64) -> bool {
        let score = if score == 0.0 { 0.0 } else { score };
        let is_new = match self.scores.insert(member.clone(), score) {
            Some(old) => {
                self.order.remove(&Ranked {
                    score: old,
                    member: member.clone(),
                });
                false
            }
            None => true,
        };
        self.order.insert(Ranked { score, member });
        is_new
    }

    /// Remove; true if the member existed
    pub fn remove(&mut self, member: &str) -> bool {
        match self.scores.remove(member) {
            Some(score) => {
                self.order.remove(&Ranked {
                    score,
                    member: member.to_string(),
                });
                true
            }
            None => false,
        }
    }

    /// Ascending rank of `member`, or descending with `rev`
    pub fn rank(&self, member: &str, rev: bool) -> Option<usize> {
        let score = self.score(member)?;
        let target = Ranked {
            score,
            member: member.to_string(),
        };
        let asc = self.order.range(..&target).count();
        Some(if rev { self.len() - 1 - asc } else { asc })
    }

    /// All members in ascending order
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = (&str, f64)> + '_ {
        self.order.iter().map(|r| (r.member.as_str(), r.score))
    }

    /// Members in the inclusive rank range
    pub fn range_by_rank(&self, start: i64, stop: i64, rev: bool) -> Vec<(String, f64)> {
        let Some((lo, hi)) = inclusive_range(start, stop, self.len()) else {
            return Vec::new();
        };
        let take = hi - lo + 1;
        let owned = |(m, s): (&str, f64)| (m.to_string(), s);
        if rev {
            self.iter().rev().skip(lo).take(take).map(owned).collect()
        } else {
            self.iter().skip(lo).take(take).map(owned).collect()
        }
    }

    /// Members whose score lies in `[min, max]`
    pub fn range_by_score(
        &self,
        min: ScoreBound,
        max: ScoreBound,
        rev: bool,
        limit: Option<(usize, usize)>,
    ) -> Vec<(String, f64)> {
        let admitted = |&(_, s): &(&str, f64)| min.admits_as_min(s) && max.admits_as_max(s);
        let (offset, count) = limit.unwrap_or((0, usize::MAX));
        let owned = |(m, s): (&str, f64)| (m.to_string(), s);
        if rev {
            self.iter()
                .rev()
                .filter(admitted)
                .skip(offset)
                .take(count)
                .map(owned)
                .collect()
        } else {
            self.iter()
                .filter(admitted)
                .skip(offset)
                .take(count)
                .map(owned)
                .collect()
        }
    }

    /// Number of members with score in `[min, max]`
    pub fn count(&self, min: ScoreBound, max: ScoreBound) -> usize {
        self.iter()
            .filter(|&(_, s)| min.admits_as_min(s) && max.admits_as_max(s))
            .count()
    }

    /// Remove members in the inclusive rank range
    pub fn remove_range_by_rank(&mut self, start: i64, stop: i64) -> usize {
        let doomed = self.range_by_rank(start, stop, false);
        for (m, _) in &doomed {
            self.remove(m);
        }
        doomed.len()
    }

    /// Remove members with score in `[min, max]`
    pub fn remove_range_by_score(&mut self, min: ScoreBound, max: ScoreBound) -> usize {
        let doomed = self.range_by_score(min, max, false, None);
        for (m, _) in &doomed {
            self.remove(m);
        }
        doomed.len()
    }
}
