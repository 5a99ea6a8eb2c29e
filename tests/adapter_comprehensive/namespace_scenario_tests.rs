//! Namespace workflows across several value shapes

use std::collections::HashMap;

use crate::test_utils::*;
use redisugar::{Entry, KeyType, LocalValue, RDict};

#[test]
fn test_job_queue_workflow() {
    let ns = namespace();
    ns.set("jobs", vec!["j1", "j2", "j3"]).unwrap();
    ns.set("status", LocalValue::dict([("j1", "queued"), ("j2", "queued")]))
        .unwrap();

    let jobs = ns.list("jobs");
    let status = ns.dict("status");
    let next = jobs.pop(0).unwrap();
    status.set(&next, "running").unwrap();
    assert_eq!(status.setdefault("j3", "queued").unwrap(), "queued");
    assert_eq!(status.get("j1").unwrap(), "running");
    assert_eq!(status.len().unwrap(), 3);

    let seen: Vec<String> = ns.keys(None).collect::<redisugar::Result<_>>().unwrap();
    assert_eq!(seen.len(), 2);
}

#[test]
fn test_dict_update_accepts_every_shape() {
    let ns = namespace();
    let dict = RDict::with_items(
        ns.sugar(),
        "d",
        vec![("a", "1")],
        &[("b", "2")],
    )
    .unwrap();
    dict.update(HashMap::from([("c".to_string(), "3".to_string())]), &[])
        .unwrap();
    dict.update(vec![vec!["d".to_string(), "4".to_string()]], &[("a", "9")])
        .unwrap();
    assert_eq!(
        ns.pop("d").unwrap(),
        LocalValue::dict([("a", "9"), ("b", "2"), ("c", "3"), ("d", "4")])
    );
}

#[test]
fn test_overwrite_changes_type() {
    let ns = namespace();
    ns.set("k", LocalValue::set(["x"])).unwrap();
    ns.set("k", vec!["y", "z"]).unwrap();
    assert_eq!(ns.get("k").unwrap().key_type(), KeyType::List);
    ns.set("k", "scalar").unwrap();
    assert!(matches!(ns.get("k").unwrap(), Entry::Str(_)));
}

#[test]
fn test_pop_or_and_missing_keys() {
    let ns = namespace();
    assert!(ns.get("nope").unwrap_err().is_not_found());
    assert!(ns.delete("nope").unwrap_err().is_not_found());
    assert_eq!(
        ns.pop_or("nope", "fallback").unwrap(),
        LocalValue::from("fallback")
    );
    ns.set("empty", Vec::<String>::new()).unwrap();
    assert!(!ns.contains("empty").unwrap());
}

#[test]
fn test_clear_empties_namespace() {
    let ns = namespace();
    ns.set("a", 1i64).unwrap();
    ns.set("b", vec!["x"]).unwrap();
    ns.clear().unwrap();
    assert!(ns.is_empty().unwrap());
}

#[test]
fn test_snapshot_file_survives_reopen() {
    let dir = tempfile::TempDir::new().unwrap();
    let path = dir.path().join("ns.snapshot");
    {
        let ns = redisugar::Namespace::new(redisugar::Sugar::open(&path).unwrap());
        ns.set("board", LocalValue::sorted_set([("ann", 3.0), ("bob", 5.0)]))
            .unwrap();
        ns.save().unwrap();
    }
    let ns = redisugar::Namespace::new(redisugar::Sugar::open(&path).unwrap());
    let board = ns.get("board").unwrap().into_sorted_set().unwrap();
    assert_eq!(board.range(.., true).unwrap(), strings(&["bob", "ann"]));
}
