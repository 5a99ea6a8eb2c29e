//! RSet: a remote unordered set with set algebra
//!
//! When every operand is another `RSet` on the same store, an operation is
//! delegated to one whole-set command (`SUNION`, `SINTER`, `SDIFF` or their
//! `STORE` forms) and computed remotely. Local operands are folded in memory
//! after that single remote read. An `RSet` bound to a different store is
//! read through its own gateway and treated as a local operand. Results of
//! the non-updating operations are local snapshots.

use std::borrow::Cow;
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;
use sugar_core::{Command, Error, Gateway, GatewayExt, MemberScan, Reply, Result};
use sugar_engine::Sugar;
use tracing::debug;

use crate::support::{run_batch, to_strings};

/// Operand of a set-algebra operation
#[derive(Debug, Clone)]
pub enum SetOperand<'a> {
    /// Another remote set
    Remote(&'a RSet),
    /// Members held locally
    Local(HashSet<String>),
}

impl<'a> SetOperand<'a> {
    /// Local operand from any displayable members
    pub fn local<V: ToString>(members: impl IntoIterator<Item = V>) -> Self {
        SetOperand::Local(to_strings(members).into_iter().collect())
    }
}

impl<'a> From<&'a RSet> for SetOperand<'a> {
    fn from(set: &'a RSet) -> Self {
        SetOperand::Remote(set)
    }
}

impl From<HashSet<String>> for SetOperand<'_> {
    fn from(members: HashSet<String>) -> Self {
        SetOperand::Local(members)
    }
}

/// Remote set adapter
#[derive(Clone)]
pub struct RSet {
    gateway: Arc<dyn Gateway>,
    key: String,
}

impl fmt::Debug for RSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<rset {}>", self.key)
    }
}

impl RSet {
    /// Bind `key`
    pub fn new(sugar: &Sugar, key: impl Into<String>) -> Self {
        Self {
            gateway: Arc::clone(sugar.gateway()),
            key: key.into(),
        }
    }

    /// Bind `key` and add `members`
    pub fn with_members<V: ToString>(
        sugar: &Sugar,
        key: impl Into<String>,
        members: impl IntoIterator<Item = V>,
    ) -> Result<Self> {
        let set = Self::new(sugar, key);
        set.add_many(members)?;
        Ok(set)
    }

    /// Namespace key
    pub fn key(&self) -> &str {
        &self.key
    }

    fn with_self(&self, keys: Vec<String>) -> Vec<String> {
        let mut all = Vec::with_capacity(keys.len() + 1);
        all.push(self.key.clone());
        all.extend(keys);
        all
    }

    /// Both adapters talk to the same store
    fn same_store(&self, other: &RSet) -> bool {
        Arc::ptr_eq(&self.gateway, &other.gateway)
    }

    /// Members of an operand on another store, read through its own gateway
    fn foreign(&self, other: &SetOperand<'_>) -> Result<Option<SetOperand<'static>>> {
        match other {
            SetOperand::Remote(set) if !self.same_store(set) => {
                Ok(Some(SetOperand::Local(set.copy()?)))
            }
            _ => Ok(None),
        }
    }

    /// Split operands into keys on this store and local member sets
    fn partition<'a>(
        &self,
        others: &'a [SetOperand<'_>],
    ) -> Result<(Vec<String>, Vec<Cow<'a, HashSet<String>>>)> {
        let mut keys = Vec::new();
        let mut locals = Vec::new();
        for other in others {
            match other {
                SetOperand::Remote(set) if self.same_store(set) => keys.push(set.key.clone()),
                SetOperand::Remote(set) => locals.push(Cow::Owned(set.copy()?)),
                SetOperand::Local(members) => locals.push(Cow::Borrowed(members)),
            }
        }
        Ok((keys, locals))
    }

    fn remote(&self, command: Command) -> Result<HashSet<String>> {
        Ok(self.gateway.execute(command)?.into_strings()?.into_iter().collect())
    }

    /// Membership of each candidate, one batched probe per member
    fn probe(&self, candidates: &[&String]) -> Result<Vec<bool>> {
        let commands = candidates
            .iter()
            .map(|m| Command::SIsMember {
                key: self.key.clone(),
                member: (*m).clone(),
            })
            .collect();
        run_batch(&self.gateway, commands)?
            .into_iter()
            .map(Reply::into_bool)
            .collect()
    }

    // ========== Membership ==========

    /// Add one member; false if it was already present
    pub fn add(&self, member: impl ToString) -> Result<bool> {
        Ok(self.gateway.sadd(&self.key, vec![member.to_string()])? == 1)
    }

    /// Add several members with one command
    pub fn add_many<V: ToString>(&self, members: impl IntoIterator<Item = V>) -> Result<usize> {
        let members = to_strings(members);
        if members.is_empty() {
            return Ok(0);
        }
        self.gateway.sadd(&self.key, members)
    }

    /// Remove `member` if present
    pub fn discard(&self, member: impl ToString) -> Result<()> {
        self.gateway.srem(&self.key, vec![member.to_string()])?;
        Ok(())
    }

    /// Remove `member`, failing with `NotFound` if absent
    pub fn remove(&self, member: impl ToString) -> Result<()> {
        let member = member.to_string();
        if self.gateway.srem(&self.key, vec![member.clone()])? == 0 {
            return Err(Error::not_found(format!(
                "member '{}' in rset '{}'",
                member, self.key
            )));
        }
        Ok(())
    }

    /// Remove and return an arbitrary member
    pub fn pop(&self) -> Result<String> {
        self.gateway
            .spop(&self.key)?
            .ok_or_else(|| Error::not_found(format!("pop from an empty rset '{}'", self.key)))
    }

    /// Whether `member` is present
    pub fn contains(&self, member: impl ToString) -> Result<bool> {
        self.gateway.sismember(&self.key, &member.to_string())
    }

    /// Cardinality
    pub fn len(&self) -> Result<usize> {
        self.gateway.scard(&self.key)
    }

    /// No members
    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }

    /// Paged iteration over members
    pub fn iter(&self) -> MemberScan {
        MemberScan::new(Arc::clone(&self.gateway), &self.key)
    }

    /// Local snapshot
    pub fn copy(&self) -> Result<HashSet<String>> {
        Ok(self.gateway.smembers(&self.key)?.into_iter().collect())
    }

    /// Delete the key
    pub fn clear(&self) -> Result<()> {
        self.gateway.del(&[&self.key])?;
        Ok(())
    }

    // ========== Algebra ==========

    /// `self ∪ others`
    pub fn union(&self, others: &[SetOperand<'_>]) -> Result<HashSet<String>> {
        let (keys, locals) = self.partition(others)?;
        let mut out = self.remote(Command::SUnion(self.with_self(keys)))?;
        for local in locals {
            out.extend(local.iter().cloned());
        }
        Ok(out)
    }

    /// `self ∩ others`
    pub fn intersection(&self, others: &[SetOperand<'_>]) -> Result<HashSet<String>> {
        let (keys, locals) = self.partition(others)?;
        let mut out = self.remote(Command::SInter(self.with_self(keys)))?;
        for local in locals {
            out.retain(|m| local.contains(m));
        }
        Ok(out)
    }

    /// `self − others`
    pub fn difference(&self, others: &[SetOperand<'_>]) -> Result<HashSet<String>> {
        let (keys, locals) = self.partition(others)?;
        let mut out = self.remote(Command::SDiff(self.with_self(keys)))?;
        for local in locals {
            out.retain(|m| !local.contains(m));
        }
        Ok(out)
    }

    /// `other − self`
    pub fn difference_from(&self, other: &SetOperand<'_>) -> Result<HashSet<String>> {
        if let Some(local) = self.foreign(other)? {
            return self.difference_from(&local);
        }
        match other {
            SetOperand::Remote(set) => {
                self.remote(Command::SDiff(vec![set.key.clone(), self.key.clone()]))
            }
            SetOperand::Local(members) => {
                let mine = self.copy()?;
                Ok(members.difference(&mine).cloned().collect())
            }
        }
    }

    /// `(self − other) ∪ (other − self)`
    pub fn symmetric_difference(&self, other: &SetOperand<'_>) -> Result<HashSet<String>> {
        if let Some(local) = self.foreign(other)? {
            return self.symmetric_difference(&local);
        }
        match other {
            SetOperand::Remote(set) => {
                let replies = run_batch(
                    &self.gateway,
                    vec![
                        Command::SDiff(vec![self.key.clone(), set.key.clone()]),
                        Command::SDiff(vec![set.key.clone(), self.key.clone()]),
                    ],
                )?;
                let mut out = HashSet::new();
                for reply in replies {
                    out.extend(reply.into_strings()?);
                }
                Ok(out)
            }
            SetOperand::Local(members) => {
                let mine = self.copy()?;
                Ok(mine.symmetric_difference(members).cloned().collect())
            }
        }
    }

    /// `self |= others`
    pub fn union_update(&self, others: &[SetOperand<'_>]) -> Result<()> {
        let (keys, locals) = self.partition(others)?;
        let mut commands = Vec::new();
        if !keys.is_empty() {
            commands.push(Command::SUnionStore {
                dest: self.key.clone(),
                keys: self.with_self(keys),
            });
        }
        let added: Vec<String> = locals.iter().flat_map(|s| s.iter().cloned()).collect();
        if !added.is_empty() {
            commands.push(Command::SAdd {
                key: self.key.clone(),
                members: added,
            });
        }
        run_batch(&self.gateway, commands)?;
        Ok(())
    }

    /// `self &= others`
    pub fn intersection_update(&self, others: &[SetOperand<'_>]) -> Result<()> {
        let (keys, locals) = self.partition(others)?;
        if locals.is_empty() {
            if !keys.is_empty() {
                self.gateway.execute(Command::SInterStore {
                    dest: self.key.clone(),
                    keys: self.with_self(keys),
                })?
                .into_usize()?;
            }
            return Ok(());
        }
        let kept = self.intersection(others)?;
        let mut commands = vec![Command::Del(vec![self.key.clone()])];
        if !kept.is_empty() {
            commands.push(Command::SAdd {
                key: self.key.clone(),
                members: kept.into_iter().collect(),
            });
        }
        run_batch(&self.gateway, commands)?;
        debug!(target: "sugar::set", key = %self.key, "Rewrote set for mixed intersection");
        Ok(())
    }

    /// `self -= others`
    pub fn difference_update(&self, others: &[SetOperand<'_>]) -> Result<()> {
        let (keys, locals) = self.partition(others)?;
        let mut commands = Vec::new();
        if !keys.is_empty() {
            commands.push(Command::SDiffStore {
                dest: self.key.clone(),
                keys: self.with_self(keys),
            });
        }
        let removed: Vec<String> = locals.iter().flat_map(|s| s.iter().cloned()).collect();
        if !removed.is_empty() {
            commands.push(Command::SRem {
                key: self.key.clone(),
                members: removed,
            });
        }
        run_batch(&self.gateway, commands)?;
        Ok(())
    }

    /// `self ^= other`
    pub fn symmetric_difference_update(&self, other: &SetOperand<'_>) -> Result<()> {
        let theirs = match other {
            SetOperand::Remote(set) => set.copy()?,
            SetOperand::Local(members) => members.clone(),
        };
        let mine = self.copy()?;
        let common: Vec<String> = mine.intersection(&theirs).cloned().collect();
        let fresh: Vec<String> = theirs.difference(&mine).cloned().collect();
        let mut commands = Vec::new();
        if !common.is_empty() {
            commands.push(Command::SRem {
                key: self.key.clone(),
                members: common,
            });
        }
        if !fresh.is_empty() {
            commands.push(Command::SAdd {
                key: self.key.clone(),
                members: fresh,
            });
        }
        run_batch(&self.gateway, commands)?;
        Ok(())
    }

    // ========== Comparison ==========

    /// No common member
    pub fn is_disjoint(&self, other: &SetOperand<'_>) -> Result<bool> {
        if let Some(local) = self.foreign(other)? {
            return self.is_disjoint(&local);
        }
        match other {
            SetOperand::Remote(set) => Ok(self
                .remote(Command::SInter(vec![self.key.clone(), set.key.clone()]))?
                .is_empty()),
            SetOperand::Local(members) => {
                if members.is_empty() {
                    return Ok(true);
                }
                // Walk the smaller side, probe the larger one
                if members.len() <= self.len()? {
                    let candidates: Vec<&String> = members.iter().collect();
                    Ok(!self.probe(&candidates)?.into_iter().any(|hit| hit))
                } else {
                    Ok(self.copy()?.is_disjoint(members))
                }
            }
        }
    }

    /// Every member of `self` is in `other`
    pub fn is_subset(&self, other: &SetOperand<'_>) -> Result<bool> {
        if let Some(local) = self.foreign(other)? {
            return self.is_subset(&local);
        }
        match other {
            SetOperand::Remote(set) => {
                if self.len()? > set.len()? {
                    return Ok(false);
                }
                Ok(self
                    .remote(Command::SDiff(vec![self.key.clone(), set.key.clone()]))?
                    .is_empty())
            }
            SetOperand::Local(members) => {
                if self.len()? > members.len() {
                    return Ok(false);
                }
                Ok(self.copy()?.is_subset(members))
            }
        }
    }

    /// Every member of `other` is in `self`
    pub fn is_superset(&self, other: &SetOperand<'_>) -> Result<bool> {
        if let Some(local) = self.foreign(other)? {
            return self.is_superset(&local);
        }
        match other {
            SetOperand::Remote(set) => set.is_subset(&SetOperand::Remote(self)),
            SetOperand::Local(members) => {
                if members.is_empty() {
                    return Ok(true);
                }
                if members.len() > self.len()? {
                    return Ok(false);
                }
                let candidates: Vec<&String> = members.iter().collect();
                Ok(self.probe(&candidates)?.into_iter().all(|hit| hit))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strs(items: &[&str]) -> HashSet<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    fn pair() -> (RSet, RSet) {
        let sugar = Sugar::in_memory();
        let a = RSet::with_members(&sugar, "a", [1, 2, 3]).unwrap();
        let b = RSet::with_members(&sugar, "b", [3, 4]).unwrap();
        (a, b)
    }

    #[test]
    fn test_membership() {
        let sugar = Sugar::in_memory();
        let set = RSet::new(&sugar, "s");
        assert!(set.add("x").unwrap());
        assert!(!set.add("x").unwrap());
        assert!(set.contains("x").unwrap());
        set.discard("nope").unwrap();
        assert!(set.remove("nope").unwrap_err().is_not_found());
        assert_eq!(set.pop().unwrap(), "x");
        assert!(set.pop().unwrap_err().is_not_found());
    }

    #[test]
    fn test_remote_algebra() {
        let (a, b) = pair();
        let ops = [SetOperand::Remote(&b)];
        assert_eq!(a.union(&ops).unwrap(), strs(&["1", "2", "3", "4"]));
        assert_eq!(a.intersection(&ops).unwrap(), strs(&["3"]));
        assert_eq!(a.difference(&ops).unwrap(), strs(&["1", "2"]));
        assert_eq!(a.difference_from(&ops[0]).unwrap(), strs(&["4"]));
        assert_eq!(
            a.symmetric_difference(&ops[0]).unwrap(),
            strs(&["1", "2", "4"])
        );
    }

    #[test]
    fn test_mixed_algebra_matches_remote() {
        let (a, b) = pair();
        let local = SetOperand::local([3, 4]);
        let remote = SetOperand::Remote(&b);
        assert_eq!(
            a.union(&[local.clone()]).unwrap(),
            a.union(&[remote.clone()]).unwrap()
        );
        assert_eq!(
            a.intersection(&[local.clone()]).unwrap(),
            a.intersection(&[remote.clone()]).unwrap()
        );
        assert_eq!(
            a.difference_from(&local).unwrap(),
            a.difference_from(&remote).unwrap()
        );
        assert_eq!(
            a.symmetric_difference(&local).unwrap(),
            a.symmetric_difference(&remote).unwrap()
        );
    }

    #[test]
    fn test_updates() {
        let (a, b) = pair();
        a.union_update(&[SetOperand::Remote(&b), SetOperand::local(["9"])])
            .unwrap();
        assert_eq!(a.copy().unwrap(), strs(&["1", "2", "3", "4", "9"]));

        a.intersection_update(&[SetOperand::local(["1", "4", "7"])])
            .unwrap();
        assert_eq!(a.copy().unwrap(), strs(&["1", "4"]));

        a.difference_update(&[SetOperand::Remote(&b)]).unwrap();
        assert_eq!(a.copy().unwrap(), strs(&["1"]));

        a.symmetric_difference_update(&SetOperand::local(["1", "5"]))
            .unwrap();
        assert_eq!(a.copy().unwrap(), strs(&["5"]));
    }

    #[test]
    fn test_intersection_update_to_empty_deletes_key() {
        let (a, b) = pair();
        a.intersection_update(&[SetOperand::Remote(&b), SetOperand::local(["1"])])
            .unwrap();
        assert!(!a.gateway.exists("a").unwrap());
    }

    #[test]
    fn test_comparisons() {
        let (a, b) = pair();
        assert!(!a.is_disjoint(&SetOperand::Remote(&b)).unwrap());
        assert!(a.is_disjoint(&SetOperand::local(["8", "9"])).unwrap());
        assert!(a
            .is_disjoint(&SetOperand::local((10..20).map(|i| i.to_string())))
            .unwrap());
        assert!(a.is_subset(&SetOperand::local([1, 2, 3, 4])).unwrap());
        assert!(!a.is_subset(&SetOperand::Remote(&b)).unwrap());
        assert!(a.is_superset(&SetOperand::local([1, 3])).unwrap());
        assert!(!a.is_superset(&SetOperand::Remote(&b)).unwrap());
        assert!(a.is_superset(&SetOperand::local(Vec::<String>::new())).unwrap());
    }

    #[test]
    fn test_operands_on_another_store() {
        let here = Sugar::in_memory();
        let there = Sugar::in_memory();
        let a = RSet::with_members(&here, "a", [1, 2]).unwrap();
        let b = RSet::with_members(&there, "b", [2, 3, 4]).unwrap();
        let ops = [SetOperand::Remote(&b)];

        assert_eq!(a.union(&ops).unwrap(), strs(&["1", "2", "3", "4"]));
        assert_eq!(a.intersection(&ops).unwrap(), strs(&["2"]));
        assert_eq!(a.difference(&ops).unwrap(), strs(&["1"]));
        assert_eq!(a.difference_from(&ops[0]).unwrap(), strs(&["3", "4"]));
        assert_eq!(
            a.symmetric_difference(&ops[0]).unwrap(),
            strs(&["1", "3", "4"])
        );
        assert!(!a.is_disjoint(&ops[0]).unwrap());
        assert!(!a.is_subset(&ops[0]).unwrap());
        assert!(!a.is_superset(&ops[0]).unwrap());

        a.union_update(&ops).unwrap();
        assert_eq!(a.copy().unwrap(), strs(&["1", "2", "3", "4"]));
        assert!(a.is_superset(&ops[0]).unwrap());
        a.difference_update(&ops).unwrap();
        assert_eq!(a.copy().unwrap(), strs(&["1"]));
        assert_eq!(b.copy().unwrap(), strs(&["2", "3", "4"]));
        assert!(!here.gateway().exists("b").unwrap());
    }

    #[test]
    fn test_wrong_type_operand() {
        let sugar = Sugar::in_memory();
        let a = RSet::with_members(&sugar, "a", ["x"]).unwrap();
        sugar
            .gateway()
            .push("not-a-set", sugar_core::End::Tail, vec!["x".into()])
            .unwrap();
        let other = RSet::new(&sugar, "not-a-set");
        assert!(matches!(
            a.union(&[SetOperand::Remote(&other)]),
            Err(Error::TypeMismatch { .. })
        ));
    }
}
