//! Helpers shared by the adapters

use std::sync::Arc;
use sugar_core::{Batch, Command, Error, Gateway, Reply, Result};

/// Render caller values in their stored form
pub(crate) fn to_strings<V: ToString>(values: impl IntoIterator<Item = V>) -> Vec<String> {
    values.into_iter().map(|v| v.to_string()).collect()
}

/// Run `commands` as one batch and return their replies
pub(crate) fn run_batch(gateway: &Arc<dyn Gateway>, commands: Vec<Command>) -> Result<Vec<Reply>> {
    let ((), replies) = Batch::run(Arc::clone(gateway), |b| {
        for command in commands {
            b.queue(command);
        }
        Ok(())
    })?;
    Ok(replies)
}

/// Batched single-position reads, one command per index
///
/// `read` builds the command for one index. A nil reply means the value
/// shrank underneath us and is reported as `IndexOutOfRange`.
pub(crate) fn read_positions<F>(
    gateway: &Arc<dyn Gateway>,
    key: &str,
    indices: &[usize],
    len: usize,
    read: F,
) -> Result<Vec<Reply>>
where
    F: Fn(i64) -> Command,
{
    if indices.is_empty() {
        return Ok(Vec::new());
    }
    let replies = run_batch(gateway, indices.iter().map(|&i| read(i as i64)).collect())?;
    replies
        .into_iter()
        .zip(indices)
        .map(|(reply, &i)| match reply {
            Reply::Nil => Err(Error::IndexOutOfRange {
                key: key.to_string(),
                index: i as i64,
                len,
            }),
            other => Ok(other),
        })
        .collect()
}
