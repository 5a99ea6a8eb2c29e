//! Ordered-score set invariants
//!
//! Rank order is score order, with ties broken by member bytes.

use crate::test_utils::*;
use redisugar::{Error, ScoreBound, SortedSet};

#[test]
fn test_rank_follows_score_then_member() {
    let ns = namespace();
    let z = SortedSet::with_entries(
        ns.sugar(),
        "z",
        [("b", 1.0), ("a", 1.0), ("c", 0.5), ("d", 2.0)],
    )
    .unwrap();
    assert_eq!(z.range(.., false).unwrap(), strings(&["c", "a", "b", "d"]));
    assert_eq!(z.range(.., true).unwrap(), strings(&["d", "b", "a", "c"]));
    for (i, member) in z.range(.., false).unwrap().iter().enumerate() {
        assert_eq!(z.rank(member, false).unwrap(), i);
        assert_eq!(z.get(i as i64).unwrap().0, *member);
    }
}

#[test]
fn test_score_window_bounds() {
    let ns = namespace();
    let z = SortedSet::with_entries(ns.sugar(), "z", [("a", 1.0), ("b", 2.0), ("c", 3.0)])
        .unwrap();
    assert_eq!(z.count(ScoreBound::Exclusive(1.0), ScoreBound::PosInf).unwrap(), 2);
    assert_eq!(z.count(ScoreBound::NegInf, 2.0).unwrap(), 2);
    let window = z.range_by_score(1.0, 3.0, Some((1, 1)), false).unwrap();
    assert_eq!(window, vec![("b".to_string(), 2.0)]);
    assert_eq!(z.remove_range_by_score(ScoreBound::NegInf, 1.5).unwrap(), 1);
    assert_eq!(z.len().unwrap(), 2);
}

#[test]
fn test_weighted_union_store() {
    let ns = namespace();
    let sugar = ns.sugar();
    SortedSet::with_entries(sugar, "x", [("a", 1.0), ("b", 2.0)]).unwrap();
    SortedSet::with_entries(sugar, "y", [("b", 10.0), ("c", 3.0)]).unwrap();
    let out =
        SortedSet::union_store(sugar, "out", &["x", "y"], Some(&[2.0, 1.0][..]), "SUM", false)
            .unwrap();
    assert_eq!(out.score("a").unwrap(), 2.0);
    assert_eq!(out.score("b").unwrap(), 14.0);
    assert_eq!(out.score("c").unwrap(), 3.0);

    let err = SortedSet::intersection_store(sugar, "out", &["x", "y"], None, "MAX", false)
        .unwrap_err();
    assert!(matches!(err, Error::InvalidArgument(_)));
    let inter =
        SortedSet::intersection_store(sugar, "out", &["x", "y"], None, "MAX", true).unwrap();
    assert_eq!(inter.items().unwrap(), vec![("b".to_string(), 10.0)]);
}

#[test]
fn test_missing_member_is_not_found() {
    let ns = namespace();
    let z = ns.sorted_set("z");
    assert!(z.score("ghost").unwrap_err().is_not_found());
    assert!(z.remove("ghost").unwrap_err().is_not_found());
    z.discard("ghost").unwrap();
}
