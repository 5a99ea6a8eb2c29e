//! Integration tests for Sugar handles
//!
//! These tests verify the handle lifecycle:
//! - Opening in-memory and snapshot-backed stores
//! - Reopening a snapshot after save and bgsave
//! - Config-driven connection failures
//! - Sharing one gateway between handles

use std::sync::Arc;
use std::thread;
use sugar_core::{Error, GatewayExt, SetOptions};
use sugar_engine::{GatewayRegistry, Sugar, SugarConfig, CONFIG_FILE_NAME};
use tempfile::TempDir;

#[test]
fn test_snapshot_lifecycle() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("lifecycle.snapshot");

    // Phase 1: write and save synchronously
    {
        let sugar = Sugar::open(&path).expect("Failed to open store");
        let gw = sugar.gateway();
        gw.push("seq", sugar_core::End::Tail, vec!["a".into(), "b".into()])
            .unwrap();
        gw.hset("map", vec![("f".into(), "1".into())]).unwrap();
        gw.save().unwrap();
    }

    // Phase 2: reopen, mutate, save in the background
    {
        let sugar = Sugar::open(&path).unwrap();
        let gw = sugar.gateway();
        assert_eq!(gw.lrange("seq", 0, -1).unwrap(), vec!["a", "b"]);
        gw.sadd("set", vec!["x".into()]).unwrap();
        gw.bgsave().unwrap();
    }

    // Phase 3: background save is visible after the store is dropped
    let sugar = Sugar::open(&path).unwrap();
    let gw = sugar.gateway();
    assert_eq!(gw.hget("map", "f").unwrap().as_deref(), Some("1"));
    assert!(gw.sismember("set", "x").unwrap());
    assert_eq!(gw.db_size().unwrap(), 3);
}

#[test]
fn test_expired_keys_are_not_reloaded() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("ttl.snapshot");
    {
        let sugar = Sugar::open(&path).unwrap();
        let gw = sugar.gateway();
        gw.set("short", "v", SetOptions::new().px(1)).unwrap();
        gw.set("long", "v", SetOptions::new()).unwrap();
        gw.save().unwrap();
    }
    thread::sleep(std::time::Duration::from_millis(10));
    let sugar = Sugar::open(&path).unwrap();
    assert!(!sugar.gateway().exists("short").unwrap());
    assert!(sugar.gateway().exists("long").unwrap());
}

#[test]
fn test_in_memory_save_is_noop() {
    let sugar = Sugar::in_memory();
    sugar.gateway().save().unwrap();
    sugar.gateway().bgsave().unwrap();
}

#[test]
fn test_config_file_connection_failure() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join(CONFIG_FILE_NAME);
    std::fs::write(&path, "port = 1\nconnect_timeout_ms = 200\n").unwrap();

    let config = SugarConfig::from_file(&path).unwrap();
    let registry = GatewayRegistry::new();
    let err = Sugar::connect_shared(&registry, &config).unwrap_err();
    assert!(matches!(err, Error::Connection(_)));
    assert!(registry.is_empty());
}

#[test]
fn test_cloned_handles_share_state() {
    let sugar = Sugar::in_memory();
    let handles: Vec<_> = (0..4)
        .map(|i| {
            let sugar = sugar.clone();
            thread::spawn(move || {
                sugar
                    .gateway()
                    .sadd("members", vec![format!("m{}", i)])
                    .unwrap();
            })
        })
        .collect();
    for h in handles {
        h.join().unwrap();
    }
    assert_eq!(sugar.gateway().scard("members").unwrap(), 4);
    assert_eq!(Arc::strong_count(sugar.gateway()), 1);
}
