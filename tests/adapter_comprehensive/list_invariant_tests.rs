//! Sequence invariants
//!
//! Slice assignment follows local sequence semantics exactly, including
//! growth, shrinkage and stepped slices.

use crate::test_utils::*;
use redisugar::{End, Error, ListOperand, RList, Slice};

#[test]
fn test_grow_within_list() {
    let ns = namespace();
    ns.set("l", vec!["a", "b", "c", "d"]).unwrap();
    let list = ns.list("l");
    list.set_slice(1..2, ["x", "y", "z"]).unwrap();
    assert_eq!(list.copy().unwrap(), strings(&["a", "x", "y", "z", "c", "d"]));
}

#[test]
fn test_shrink_to_empty_deletes_key() {
    let ns = namespace();
    ns.set("l", vec!["a", "b", "c"]).unwrap();
    let list = ns.list("l");
    list.set_slice(.., Vec::<String>::new()).unwrap();
    assert!(!ns.contains("l").unwrap());
    assert_eq!(list.len().unwrap(), 0);
}

#[test]
fn test_shrink_keeps_suffix() {
    let ns = namespace();
    ns.set("l", vec!["0", "1", "2", "3", "4", "5"]).unwrap();
    let list = ns.list("l");
    list.set_slice(1..5, ["m"]).unwrap();
    assert_eq!(list.copy().unwrap(), strings(&["0", "m", "5"]));
}

#[test]
fn test_stepped_assignment_requires_same_length() {
    let ns = namespace();
    ns.set("l", vec!["a", "b", "c", "d", "e"]).unwrap();
    let list = ns.list("l");
    let every_other = Slice {
        start: None,
        stop: None,
        step: Some(2),
    };
    let err = list.set_slice(every_other, ["x", "y"]).unwrap_err();
    assert!(matches!(err, Error::InvalidArgument(_)));
    assert_eq!(list.copy().unwrap(), strings(&["a", "b", "c", "d", "e"]));

    list.set_slice(every_other, ["x", "y", "z"]).unwrap();
    assert_eq!(list.copy().unwrap(), strings(&["x", "b", "y", "d", "z"]));
}

#[test]
fn test_negative_step_reads_backwards() {
    let sugar = redisugar::Sugar::in_memory();
    let list = RList::with_values(&sugar, "l", 0..6).unwrap();
    let backwards = Slice {
        start: Some(-1),
        stop: None,
        step: Some(-2),
    };
    assert_eq!(list.get_slice(backwards).unwrap(), strings(&["5", "3", "1"]));
}

#[test]
fn test_index_errors_name_the_key() {
    let ns = namespace();
    ns.set("l", vec!["a"]).unwrap();
    match ns.list("l").get(3) {
        Err(Error::IndexOutOfRange { key, index, len }) => {
            assert_eq!(key, "l");
            assert_eq!(index, 3);
            assert_eq!(len, 1);
        }
        other => panic!("unexpected: {:?}", other),
    }
}

#[test]
fn test_push_ends_and_pop_positions() {
    let ns = namespace();
    let list = ns.list("deque");
    list.push("b", End::Tail).unwrap();
    list.push("a", End::Head).unwrap();
    list.push("c", End::Tail).unwrap();
    list.insert(1, "ab").unwrap();
    assert_eq!(list.pop(0).unwrap(), "a");
    assert_eq!(list.pop(-1).unwrap(), "c");
    assert_eq!(list.pop(0).unwrap(), "ab");
    assert_eq!(list.copy().unwrap(), strings(&["b"]));
}

#[test]
fn test_concat_with_remote_operand() {
    let ns = namespace();
    ns.set("a", vec!["1", "2"]).unwrap();
    ns.set("b", vec!["3"]).unwrap();
    let a = ns.list("a");
    let b = ns.list("b");
    assert_eq!(
        a.concat(ListOperand::Remote(&b)).unwrap(),
        strings(&["1", "2", "3"])
    );
    a.concat_in_place(ListOperand::Remote(&b)).unwrap();
    a.repeat_in_place(2).unwrap();
    assert_eq!(a.len().unwrap(), 6);
    assert_eq!(b.copy().unwrap(), strings(&["3"]));
}

#[test]
fn test_typed_list_decodes_elements() {
    let ns = namespace();
    ns.set("nums", vec!["3", "1", "2"]).unwrap();
    let nums = ns.typed_list::<i64>("nums");
    nums.sort(false, false).unwrap();
    assert_eq!(nums.copy().unwrap(), vec![1, 2, 3]);
    assert_eq!(nums.index(&2).unwrap(), 1);
    assert!(nums.contains(&3).unwrap());
}
