//! Scoped command batches
//!
//! A `Batch` queues commands locally and submits them through
//! `Gateway::execute_batch`, so the store applies them as one unit. A batch
//! must be finalized on every exit path: `execute` submits, `discard` drops
//! the queue, and a batch dropped unfinalized discards and logs.
//!
//! ## Usage
//!
//! ```rust,ignore
//! let replies = Batch::run(gateway, |b| {
//!     b.queue(Command::LSet { key: "seq".into(), index: 0, value: "a".into() });
//!     b.queue(Command::LTrim { key: "seq".into(), start: 0, stop: 3 });
//!     Ok(())
//! })?;
//! ```

use crate::command::{Command, Reply};
use crate::error::Result;
use crate::traits::Gateway;
use std::sync::Arc;
use tracing::{debug, warn};

/// Commands queued for one atomic submission
pub struct Batch {
    gateway: Arc<dyn Gateway>,
    commands: Vec<Command>,
    finished: bool,
}

impl Batch {
    /// Start an empty batch against `gateway`
    pub fn new(gateway: Arc<dyn Gateway>) -> Self {
        Self {
            gateway,
            commands: Vec::new(),
            finished: false,
        }
    }

    /// Build a batch in `f`; execute it if `f` succeeds, discard it otherwise
    ///
    /// Returns the closure's value with the replies in queue order.
    pub fn run<T, F>(gateway: Arc<dyn Gateway>, f: F) -> Result<(T, Vec<Reply>)>
    where
        F: FnOnce(&mut Batch) -> Result<T>,
    {
        let mut batch = Batch::new(gateway);
        match f(&mut batch) {
            Ok(value) => {
                let replies = batch.execute()?;
                Ok((value, replies))
            }
            Err(e) => {
                batch.discard();
                Err(e)
            }
        }
    }

    /// Queue a command, returning the position of its reply
    pub fn queue(&mut self, command: Command) -> usize {
        self.commands.push(command);
        self.commands.len() - 1
    }

    /// Number of queued commands
    pub fn len(&self) -> usize {
        self.commands.len()
    }

    /// Nothing queued
    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Submit the queue as one atomic unit
    ///
    /// An empty batch costs no round trip. The first error reply, if any,
    /// is returned as `Err`.
    pub fn execute(mut self) -> Result<Vec<Reply>> {
        self.finished = true;
        let commands = std::mem::take(&mut self.commands);
        if commands.is_empty() {
            return Ok(Vec::new());
        }
        debug!(target: "sugar::gateway", commands = commands.len(), "Executing batch");
        let replies = self.gateway.execute_batch(commands)?;
        replies.into_iter().map(Reply::into_result).collect()
    }

    /// Drop the queue without submitting it
    pub fn discard(mut self) {
        self.finished = true;
        debug!(target: "sugar::gateway", commands = self.commands.len(), "Discarding batch");
        self.commands.clear();
    }
}

impl Drop for Batch {
    fn drop(&mut self) {
        if !self.finished && !self.commands.is_empty() {
            warn!(
                target: "sugar::gateway",
                commands = self.commands.len(),
                "Batch dropped without execute or discard; commands discarded"
            );
        }
    }
}

impl std::fmt::Debug for Batch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Batch")
            .field("commands", &self.commands)
            .field("finished", &self.finished)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use parking_lot::Mutex;

    fn lset(key: &str, value: &str) -> Command {
        Command::LSet {
            key: key.into(),
            index: 0,
            value: value.into(),
        }
    }

    #[derive(Default)]
    struct Recorder {
        batches: Mutex<Vec<Vec<Command>>>,
    }

    impl Gateway for Recorder {
        fn execute(&self, _command: Command) -> Result<Reply> {
            Ok(Reply::ok())
        }

        fn execute_batch(&self, commands: Vec<Command>) -> Result<Vec<Reply>> {
            let n = commands.len();
            self.batches.lock().push(commands);
            Ok(vec![Reply::ok(); n])
        }
    }

    #[test]
    fn test_run_executes_on_ok() {
        let rec = Arc::new(Recorder::default());
        let (value, replies) = Batch::run(rec.clone(), |b| {
            b.queue(lset("k", "a"));
            b.queue(Command::LTrim {
                key: "k".into(),
                start: 0,
                stop: 0,
            });
            Ok(7)
        })
        .unwrap();
        assert_eq!(value, 7);
        assert_eq!(replies.len(), 2);
        assert_eq!(rec.batches.lock().len(), 1);
    }

    #[test]
    fn test_run_discards_on_err() {
        let rec = Arc::new(Recorder::default());
        let result: Result<((), Vec<Reply>)> = Batch::run(rec.clone(), |b| {
            b.queue(Command::Del(vec!["k".into()]));
            Err(Error::invalid("stop"))
        });
        assert!(result.is_err());
        assert!(rec.batches.lock().is_empty());
    }

    #[test]
    fn test_empty_batch_skips_round_trip() {
        let rec = Arc::new(Recorder::default());
        let replies = Batch::new(rec.clone()).execute().unwrap();
        assert!(replies.is_empty());
        assert!(rec.batches.lock().is_empty());
    }

    #[test]
    fn test_drop_without_finalizing_sends_nothing() {
        let rec = Arc::new(Recorder::default());
        {
            let mut b = Batch::new(rec.clone());
            b.queue(Command::Del(vec!["k".into()]));
        }
        assert!(rec.batches.lock().is_empty());
    }

    #[test]
    fn test_error_reply_surfaces() {
        struct Failing;
        impl Gateway for Failing {
            fn execute(&self, _c: Command) -> Result<Reply> {
                Ok(Reply::Nil)
            }
            fn execute_batch(&self, c: Vec<Command>) -> Result<Vec<Reply>> {
                Ok(c.iter().map(|_| Reply::Error("ERR no such key".into())).collect())
            }
        }
        let mut b = Batch::new(Arc::new(Failing));
        b.queue(lset("k", "v"));
        assert!(matches!(b.execute(), Err(Error::Remote(_))));
    }
}
