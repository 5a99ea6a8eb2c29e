//! Cursor-driven iterators over the key space, field tables and sets
//!
//! Pages are fetched lazily: a new round trip happens only when the buffered
//! page is exhausted and the store's cursor has not returned to 0. Errors
//! end the iteration after being yielded once.

use crate::error::Result;
use crate::traits::{Gateway, GatewayExt};
use std::collections::VecDeque;
use std::sync::Arc;

/// Default page size hint
pub const SCAN_PAGE: usize = 100;

struct Pager<T> {
    cursor: u64,
    buffer: VecDeque<T>,
    done: bool,
}

impl<T> Pager<T> {
    fn new() -> Self {
        Self {
            cursor: 0,
            buffer: VecDeque::new(),
            done: false,
        }
    }

    fn next_with<F>(&mut self, mut fetch: F) -> Option<Result<T>>
    where
        F: FnMut(u64) -> Result<(u64, Vec<T>)>,
    {
        loop {
            if let Some(item) = self.buffer.pop_front() {
                return Some(Ok(item));
            }
            if self.done {
                return None;
            }
            match fetch(self.cursor) {
                Ok((next, page)) => {
                    self.cursor = next;
                    self.done = next == 0;
                    self.buffer.extend(page);
                }
                Err(e) => {
                    self.done = true;
                    return Some(Err(e));
                }
            }
        }
    }
}

/// Keys matching an optional glob pattern
pub struct KeyScan {
    gateway: Arc<dyn Gateway>,
    pattern: Option<String>,
    pager: Pager<String>,
}

impl KeyScan {
    /// Iterate every key, or those matching `pattern`
    pub fn new(gateway: Arc<dyn Gateway>, pattern: Option<&str>) -> Self {
        Self {
            gateway,
            pattern: pattern.map(str::to_string),
            pager: Pager::new(),
        }
    }
}

impl Iterator for KeyScan {
    type Item = Result<String>;

    fn next(&mut self) -> Option<Self::Item> {
        let gateway = &self.gateway;
        let pattern = self.pattern.as_deref();
        self.pager
            .next_with(|cursor| gateway.scan(cursor, pattern, Some(SCAN_PAGE)))
    }
}

/// Field/value pairs of a field table
pub struct FieldScan {
    gateway: Arc<dyn Gateway>,
    key: String,
    pager: Pager<(String, String)>,
}

impl FieldScan {
    /// Iterate the fields of `key`
    pub fn new(gateway: Arc<dyn Gateway>, key: &str) -> Self {
        Self {
            gateway,
            key: key.to_string(),
            pager: Pager::new(),
        }
    }
}

impl Iterator for FieldScan {
    type Item = Result<(String, String)>;

    fn next(&mut self) -> Option<Self::Item> {
        let gateway = &self.gateway;
        let key = self.key.as_str();
        self.pager
            .next_with(|cursor| gateway.hscan(key, cursor, Some(SCAN_PAGE)))
    }
}

/// Members of a set
pub struct MemberScan {
    gateway: Arc<dyn Gateway>,
    key: String,
    pager: Pager<String>,
}

impl MemberScan {
    /// Iterate the members of `key`
    pub fn new(gateway: Arc<dyn Gateway>, key: &str) -> Self {
        Self {
            gateway,
            key: key.to_string(),
            pager: Pager::new(),
        }
    }
}

impl Iterator for MemberScan {
    type Item = Result<String>;

    fn next(&mut self) -> Option<Self::Item> {
        let gateway = &self.gateway;
        let key = self.key.as_str();
        self.pager
            .next_with(|cursor| gateway.sscan(key, cursor, Some(SCAN_PAGE)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::{Command, Reply};
    use crate::error::Error;
    use parking_lot::Mutex;

    /// Serves three keys in pages of two
    struct Paged {
        calls: Mutex<usize>,
    }

    impl Gateway for Paged {
        fn execute(&self, command: Command) -> Result<Reply> {
            *self.calls.lock() += 1;
            let page = |cursor: &str, items: &[&str]| {
                Reply::Array(vec![
                    Reply::bulk(cursor),
                    Reply::Array(items.iter().map(|s| Reply::bulk(*s)).collect()),
                ])
            };
            match command {
                Command::Scan { cursor: 0, .. } => Ok(page("2", &["a", "b"])),
                Command::Scan { cursor: 2, .. } => Ok(page("0", &["c"])),
                Command::SScan { .. } => Ok(Reply::Error("ERR boom".into())),
                _ => Ok(Reply::Nil),
            }
        }

        fn execute_batch(&self, commands: Vec<Command>) -> Result<Vec<Reply>> {
            commands.into_iter().map(|c| self.execute(c)).collect()
        }
    }

    #[test]
    fn test_key_scan_follows_cursor() {
        let g = Arc::new(Paged {
            calls: Mutex::new(0),
        });
        let keys: Vec<String> = KeyScan::new(g.clone(), None)
            .collect::<Result<_>>()
            .unwrap();
        assert_eq!(keys, vec!["a", "b", "c"]);
        assert_eq!(*g.calls.lock(), 2);
    }

    #[test]
    fn test_key_scan_is_lazy() {
        let g = Arc::new(Paged {
            calls: Mutex::new(0),
        });
        let mut it = KeyScan::new(g.clone(), Some("*"));
        assert_eq!(it.next().unwrap().unwrap(), "a");
        assert_eq!(*g.calls.lock(), 1);
    }

    #[test]
    fn test_error_ends_iteration() {
        let g = Arc::new(Paged {
            calls: Mutex::new(0),
        });
        let mut it = MemberScan::new(g, "s");
        assert!(matches!(it.next(), Some(Err(Error::Remote(_)))));
        assert!(it.next().is_none());
    }
}
