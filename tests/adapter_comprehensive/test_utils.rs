//! Shared helpers for the adapter suite

use redisugar::{Namespace, Sugar};

/// Route adapter logs to the test harness; run with `--nocapture` to see them
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_max_level(tracing_subscriber::filter::LevelFilter::DEBUG)
        .with_test_writer()
        .try_init();
}

/// Fresh in-process namespace with logging enabled
pub fn namespace() -> Namespace {
    init_tracing();
    Namespace::new(Sugar::in_memory())
}

/// Owned strings from literals
pub fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}
