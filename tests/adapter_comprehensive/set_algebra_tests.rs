//! Set algebra laws with remote and local operands

use std::collections::HashSet;

use crate::test_utils::*;
use redisugar::{RSet, SetOperand};

fn pair() -> (redisugar::Namespace, RSet, RSet) {
    let ns = namespace();
    let a = RSet::with_members(ns.sugar(), "a", ["1", "2", "3", "4"]).unwrap();
    let b = RSet::with_members(ns.sugar(), "b", ["3", "4", "5"]).unwrap();
    (ns, a, b)
}

#[test]
fn test_remote_and_local_operands_agree() {
    let (_ns, a, b) = pair();
    let local = SetOperand::local(["3", "4", "5"]);
    assert_eq!(
        a.union(&[SetOperand::from(&b)]).unwrap(),
        a.union(&[local.clone()]).unwrap()
    );
    assert_eq!(
        a.intersection(&[SetOperand::from(&b)]).unwrap(),
        a.intersection(&[local.clone()]).unwrap()
    );
    assert_eq!(
        a.symmetric_difference(&SetOperand::from(&b)).unwrap(),
        a.symmetric_difference(&local).unwrap()
    );
}

#[test]
fn test_difference_and_intersection_partition() {
    let (_ns, a, b) = pair();
    let other = SetOperand::from(&b);
    let diff = a.difference(std::slice::from_ref(&other)).unwrap();
    let inter = a.intersection(std::slice::from_ref(&other)).unwrap();
    assert!(diff.is_disjoint(&inter));
    let joined: HashSet<String> = diff.union(&inter).cloned().collect();
    assert_eq!(joined, a.copy().unwrap());
}

#[test]
fn test_updates_write_back() {
    let (_ns, a, b) = pair();
    a.symmetric_difference_update(&SetOperand::from(&b)).unwrap();
    let expected: HashSet<String> = strings(&["1", "2", "5"]).into_iter().collect();
    assert_eq!(a.copy().unwrap(), expected);
    a.intersection_update(&[SetOperand::local(["9"])]).unwrap();
    assert!(a.is_empty().unwrap());
    assert!(a.is_subset(&SetOperand::from(&b)).unwrap());
}

#[test]
fn test_subset_relations() {
    let (ns, a, _b) = pair();
    let small = RSet::with_members(ns.sugar(), "small", ["1", "2"]).unwrap();
    assert!(small.is_subset(&SetOperand::from(&a)).unwrap());
    assert!(a.is_superset(&SetOperand::from(&small)).unwrap());
    assert!(!small.is_disjoint(&SetOperand::from(&a)).unwrap());
    assert!(small.is_disjoint(&SetOperand::local(["7"])).unwrap());
}

mod props {
    use super::*;
    use proptest::prelude::*;
    use redisugar::Sugar;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(32))]

        #[test]
        fn algebra_matches_local_sets(
            left in prop::collection::hash_set(0u8..20, 0..12),
            right in prop::collection::hash_set(0u8..20, 0..12),
        ) {
            let sugar = Sugar::in_memory();
            let a = RSet::with_members(&sugar, "a", left.iter()).unwrap();
            let b = RSet::with_members(&sugar, "b", right.iter()).unwrap();
            let l: HashSet<String> = left.iter().map(|v| v.to_string()).collect();
            let r: HashSet<String> = right.iter().map(|v| v.to_string()).collect();
            let other = SetOperand::from(&b);

            prop_assert_eq!(
                a.union(std::slice::from_ref(&other)).unwrap(),
                l.union(&r).cloned().collect::<HashSet<_>>()
            );
            prop_assert_eq!(
                a.intersection(std::slice::from_ref(&other)).unwrap(),
                l.intersection(&r).cloned().collect::<HashSet<_>>()
            );
            prop_assert_eq!(
                a.symmetric_difference(&other).unwrap(),
                l.symmetric_difference(&r).cloned().collect::<HashSet<_>>()
            );
            prop_assert_eq!(a.is_subset(&other).unwrap(), l.is_subset(&r));
            prop_assert_eq!(a.is_disjoint(&other).unwrap(), l.is_disjoint(&r));
        }
    }
}
