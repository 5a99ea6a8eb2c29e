//! Scalar workflows: counters, conditional writes and batch access

use crate::test_utils::*;
use redisugar::{Error, Number, RStr, SetOptions};

#[test]
fn test_counter_switches_to_float() {
    let ns = namespace();
    let counter = ns.string("hits");
    assert_eq!(counter.increase(5).unwrap(), Number::Int(5));
    assert_eq!(counter.decrease(2).unwrap(), Number::Int(3));
    assert_eq!(counter.increase(0.5).unwrap(), Number::Float(3.5));
    assert_eq!(ns.get_str("hits").unwrap(), "3.5");
}

#[test]
fn test_conditional_writes() {
    let ns = namespace();
    let s = ns.string("s");
    assert!(s.set_with("first", SetOptions::default().nx()).unwrap());
    assert!(!s.set_with("second", SetOptions::default().nx()).unwrap());
    assert_eq!(s.get().unwrap(), "first");
    assert!(s.set_with("third", SetOptions::default().xx()).unwrap());
    assert_eq!(s.get_set("fourth").unwrap().as_deref(), Some("third"));
}

#[test]
fn test_text_operations() {
    let ns = namespace();
    let s = RStr::with_value(ns.sugar(), "s", "hello").unwrap();
    assert_eq!(s.append(" world").unwrap(), 11);
    assert_eq!(s.char_at(-1).unwrap(), "d");
    assert_eq!(s.slice(0..5).unwrap(), "hello");
    assert!(matches!(
        s.char_at(11),
        Err(Error::IndexOutOfRange { .. })
    ));
}

#[test]
fn test_multi_key_writes() {
    let ns = namespace();
    let sugar = ns.sugar();
    RStr::multi_set(sugar, [("a", "1"), ("b", "2")]).unwrap();
    assert_eq!(
        RStr::multi_get(sugar, &["a", "b", "c"]).unwrap(),
        vec![Some("1".to_string()), Some("2".to_string()), None]
    );
    let err = RStr::multi_set_not_exist(sugar, [("b", "x"), ("c", "3")]).unwrap_err();
    assert!(matches!(err, Error::InvalidArgument(_)));
    assert!(!ns.contains("c").unwrap());
}
