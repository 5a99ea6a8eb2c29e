//! Business Logic and Edge Case Tests for sugar-primitives
//!
//! Tests targeting container contracts and boundary conditions:
//!
//! 1. RList: slice assignment boundaries, deletion, reversal safety
//! 2. RDict: bulk update shapes, check-then-act helpers
//! 3. RSet: algebra identities across remote and local operands
//! 4. SortedSet: rank/score consistency, store validation
//! 5. RStr: in-place numeric and byte mutation
//! 6. Adapters over a snapshot-backed store

use std::collections::{HashMap, HashSet};

use sugar_core::{Error, GatewayExt, KeyType, Slice};
use sugar_engine::Sugar;
use sugar_primitives::{DictUpdate, RDict, RList, RSet, RStr, SetOperand, SortedSet};
use tempfile::TempDir;

// ============================================================================
// Test Helpers
// ============================================================================

fn numbers(sugar: &Sugar, key: &str, n: i64) -> RList<i64> {
    let list = RList::<i64>::typed(sugar, key);
    list.extend(0..n).unwrap();
    list
}

// ============================================================================
// Module 1: RList
// ============================================================================

/// Assigning a slice to its own contents is a no-op
#[test]
fn test_list_self_assignment_is_noop() {
    let sugar = Sugar::in_memory();
    let list = numbers(&sugar, "l", 6);
    let window = list.get_slice(1..4).unwrap();
    list.set_slice(1..4, window).unwrap();
    assert_eq!(list.copy().unwrap(), (0..6).collect::<Vec<_>>());
}

/// Covering the whole sequence replaces it
#[test]
fn test_list_assign_whole_range() {
    let sugar = Sugar::in_memory();
    let list = numbers(&sugar, "l", 3);
    list.set_slice(.., [7, 8, 9, 10, 11]).unwrap();
    assert_eq!(list.copy().unwrap(), vec![7, 8, 9, 10, 11]);
    list.set_slice(.., [1]).unwrap();
    assert_eq!(list.copy().unwrap(), vec![1]);
}

/// Empty slice in the middle inserts without replacing
#[test]
fn test_list_assign_empty_slice_inserts() {
    let sugar = Sugar::in_memory();
    let list = numbers(&sugar, "l", 4);
    list.set_slice(2..2, [50, 51]).unwrap();
    assert_eq!(list.copy().unwrap(), vec![0, 1, 50, 51, 2, 3]);
}

/// Reversed bounds are treated as an empty slice at `start`
#[test]
fn test_list_assign_reversed_bounds() {
    let sugar = Sugar::in_memory();
    let list = numbers(&sugar, "l", 4);
    list.set_slice(3..1, [9]).unwrap();
    assert_eq!(list.copy().unwrap(), vec![0, 1, 2, 9, 3]);
}

/// Stepped mismatch reports both sizes and leaves the list intact
#[test]
fn test_list_stepped_mismatch_message() {
    let sugar = Sugar::in_memory();
    let list = numbers(&sugar, "l", 6);
    let err = list.set_slice(Slice::full().step(3), [1, 2, 3]).unwrap_err();
    match err {
        Error::InvalidArgument(msg) => {
            assert!(msg.contains("size 3"));
            assert!(msg.contains("extended slice of size 2"));
        }
        other => panic!("unexpected error: {:?}", other),
    }
    assert_eq!(list.len().unwrap(), 6);
}

/// Reversal leaves no temporary key behind, and twice restores the order
#[test]
fn test_list_reverse_involution() {
    let sugar = Sugar::in_memory();
    let list = numbers(&sugar, "l", 10);
    list.reverse().unwrap();
    assert_eq!(list.get(0).unwrap(), 9);
    list.reverse().unwrap();
    assert_eq!(list.copy().unwrap(), (0..10).collect::<Vec<_>>());
    assert_eq!(sugar.gateway().db_size().unwrap(), 1);
}

/// Clearing removes the key and length drops to zero
#[test]
fn test_list_clear_removes_key() {
    let sugar = Sugar::in_memory();
    let list = numbers(&sugar, "l", 5);
    assert_eq!(list.len().unwrap(), 5);
    list.clear().unwrap();
    assert_eq!(list.len().unwrap(), 0);
    assert!(!sugar.gateway().exists("l").unwrap());
}

/// Two adapters on the same key observe each other's writes
#[test]
fn test_list_adapters_share_state() {
    let sugar = Sugar::in_memory();
    let a = RList::new(&sugar, "shared");
    let b = RList::new(&sugar, "shared");
    a.append("x").unwrap();
    assert_eq!(b.get(0).unwrap(), "x");
    b.set(0, "y").unwrap();
    assert_eq!(a.get(-1).unwrap(), "y");
}

/// In-place repetition pages through lists larger than one page
#[test]
fn test_list_repeat_in_place_large() {
    let sugar = Sugar::in_memory();
    let list = numbers(&sugar, "l", 250);
    list.repeat_in_place(2).unwrap();
    assert_eq!(list.len().unwrap(), 500);
    assert_eq!(list.get(250).unwrap(), 0);
    assert_eq!(list.get(-1).unwrap(), 249);
}

// ============================================================================
// Module 2: RDict
// ============================================================================

/// All three update shapes produce the same fields
#[test]
fn test_dict_update_shapes() {
    let sugar = Sugar::in_memory();
    let from_map = RDict::new(&sugar, "m1");
    from_map
        .update(
            HashMap::from([("a".to_string(), "1".to_string())]),
            &[("b", "2")],
        )
        .unwrap();
    let from_rows = RDict::new(&sugar, "m2");
    from_rows
        .update(
            DictUpdate::Rows(vec![vec!["a".into(), "1".into()], vec!["b".into(), "2".into()]]),
            &[],
        )
        .unwrap();
    assert_eq!(from_map.copy().unwrap(), from_rows.copy().unwrap());
}

/// Keyword pairs override earlier pairs for the same field
#[test]
fn test_dict_keywords_win() {
    let sugar = Sugar::in_memory();
    let dict = RDict::with_items(&sugar, "m", vec![("a", "1")], &[("a", "2")]).unwrap();
    assert_eq!(dict.get("a").unwrap(), "2");
}

/// A typed mapping on the wrong key type reports a type mismatch
#[test]
fn test_dict_on_list_key_is_type_mismatch() {
    let sugar = Sugar::in_memory();
    numbers(&sugar, "l", 1);
    let dict = RDict::new(&sugar, "l");
    assert!(matches!(dict.len(), Err(Error::TypeMismatch { .. })));
    assert!(matches!(dict.set("f", "v"), Err(Error::TypeMismatch { .. })));
    assert_eq!(sugar.gateway().key_type("l").unwrap(), KeyType::List);
}

// ============================================================================
// Module 3: RSet
// ============================================================================

/// (A − B) ∪ (B − A) ∪ (A ∩ B) == A ∪ B
#[test]
fn test_set_partition_identity() {
    let sugar = Sugar::in_memory();
    let a = RSet::with_members(&sugar, "a", 0..8).unwrap();
    let b = RSet::with_members(&sugar, "b", 5..12).unwrap();
    let ob = [SetOperand::Remote(&b)];
    let mut parts: HashSet<String> = a.difference(&ob).unwrap();
    parts.extend(a.difference_from(&ob[0]).unwrap());
    parts.extend(a.intersection(&ob).unwrap());
    assert_eq!(parts, a.union(&ob).unwrap());
}

/// Intersection is symmetric across remote operands
#[test]
fn test_set_intersection_commutes() {
    let sugar = Sugar::in_memory();
    let a = RSet::with_members(&sugar, "a", [1, 2, 3]).unwrap();
    let b = RSet::with_members(&sugar, "b", [2, 3, 4]).unwrap();
    assert_eq!(
        a.intersection(&[SetOperand::Remote(&b)]).unwrap(),
        b.intersection(&[SetOperand::Remote(&a)]).unwrap()
    );
}

/// Two remote sets: union is computed remotely and stored in place
#[test]
fn test_set_remote_union_scenario() {
    let sugar = Sugar::in_memory();
    let a = RSet::with_members(&sugar, "a", [1, 2]).unwrap();
    let b = RSet::with_members(&sugar, "b", [3, 4]).unwrap();
    let expected: HashSet<String> = (1..=4).map(|i| i.to_string()).collect();
    assert_eq!(a.union(&[SetOperand::Remote(&b)]).unwrap(), expected);
    a.union_update(&[SetOperand::Remote(&b)]).unwrap();
    assert_eq!(a.copy().unwrap(), expected);
    assert_eq!(b.len().unwrap(), 2);
}

/// Multiple operands fold left to right
#[test]
fn test_set_multiple_operands() {
    let sugar = Sugar::in_memory();
    let a = RSet::with_members(&sugar, "a", 0..10).unwrap();
    let b = RSet::with_members(&sugar, "b", 0..5).unwrap();
    let result = a
        .difference(&[SetOperand::Remote(&b), SetOperand::local([9])])
        .unwrap();
    let expected: HashSet<String> = (5..9).map(|i| i.to_string()).collect();
    assert_eq!(result, expected);
}

// ============================================================================
// Module 4: SortedSet
// ============================================================================

/// Lower score always means lower rank
#[test]
fn test_zset_rank_follows_score() {
    let sugar = Sugar::in_memory();
    let z = SortedSet::with_entries(
        &sugar,
        "z",
        [("m1", 3.5), ("m2", -1.0), ("m3", 10.0), ("m4", 0.0)],
    )
    .unwrap();
    let items = z.items().unwrap();
    for pair in items.windows(2) {
        assert!(pair[0].1 <= pair[1].1);
        assert!(z.rank(&pair[0].0, false).unwrap() < z.rank(&pair[1].0, false).unwrap());
    }
    let len = z.len().unwrap() as i64;
    assert_eq!(
        z.range(0..len, false).unwrap(),
        items.into_iter().map(|(m, _)| m).collect::<Vec<_>>()
    );
}

/// Ties are ordered by member
#[test]
fn test_zset_ties_break_by_member() {
    let sugar = Sugar::in_memory();
    let z = SortedSet::with_entries(&sugar, "z", [("b", 1.0), ("a", 1.0), ("c", 0.0)]).unwrap();
    assert_eq!(z.range(.., false).unwrap(), vec!["c", "a", "b"]);
}

/// Concrete scenario: slicing and removing rank ranges
#[test]
fn test_zset_rank_scenario() {
    let sugar = Sugar::in_memory();
    let z = SortedSet::with_entries(&sugar, "z", [("a", 1.0), ("b", 2.0), ("c", 3.0), ("d", 4.0)])
        .unwrap();
    assert_eq!(z.range(1..3, false).unwrap(), vec!["b", "c"]);
    z.remove_range(0..2).unwrap();
    assert_eq!(z.len().unwrap(), 2);
}

/// Store into an existing destination is refused unless overwriting
#[test]
fn test_zset_store_respects_overwrite() {
    let sugar = Sugar::in_memory();
    SortedSet::with_entries(&sugar, "src", [("a", 1.0)]).unwrap();
    SortedSet::with_entries(&sugar, "dst", [("old", 1.0)]).unwrap();
    assert!(SortedSet::union_store(&sugar, "dst", &["src"], None, "SUM", false).is_err());
    assert!(SortedSet::new(&sugar, "dst").contains("old").unwrap());
    let dst = SortedSet::union_store(&sugar, "dst", &["src"], None, "SUM", true).unwrap();
    assert_eq!(dst.range(.., false).unwrap(), vec!["a"]);
}

// ============================================================================
// Module 5: RStr
// ============================================================================

/// Counters never read the value back to increment it
#[test]
fn test_str_counter() {
    let sugar = Sugar::in_memory();
    let counter = RStr::new(&sugar, "hits");
    for _ in 0..10 {
        counter.increase(1).unwrap();
    }
    assert_eq!(counter.get().unwrap(), "10");
    counter.decrease(10).unwrap();
    assert_eq!(counter.get().unwrap(), "0");
}

/// Overwriting past the end zero-pads
#[test]
fn test_str_set_range_pads() {
    let sugar = Sugar::in_memory();
    let s = RStr::with_value(&sugar, "s", "ab").unwrap();
    assert_eq!(s.set_range(4, "z").unwrap(), 5);
    assert_eq!(s.slice(4..).unwrap(), "z");
    assert_eq!(s.char_at(2).unwrap(), "\0");
}

// ============================================================================
// Module 6: Persistence
// ============================================================================

/// Adapter state written to a snapshot is visible after reopening
#[test]
fn test_adapters_survive_snapshot() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("adapters.snapshot");
    {
        let sugar = Sugar::open(&path).unwrap();
        numbers(&sugar, "l", 3);
        RDict::from_keys(&sugar, "d", ["x"], 1).unwrap();
        RSet::with_members(&sugar, "s", ["m"]).unwrap();
        SortedSet::with_entries(&sugar, "z", [("a", 2.5)]).unwrap();
        RStr::with_value(&sugar, "t", "text").unwrap();
        sugar.gateway().save().unwrap();
    }
    let sugar = Sugar::open(&path).unwrap();
    assert_eq!(RList::<i64>::typed(&sugar, "l").copy().unwrap(), vec![0, 1, 2]);
    assert_eq!(RDict::new(&sugar, "d").get("x").unwrap(), "1");
    assert!(RSet::new(&sugar, "s").contains("m").unwrap());
    assert_eq!(SortedSet::new(&sugar, "z").score("a").unwrap(), 2.5);
    assert_eq!(RStr::new(&sugar, "t").get().unwrap(), "text");
}
