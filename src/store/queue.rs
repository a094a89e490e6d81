//! Shared page queue operations

use crate::error::Result;
use crate::store::models::{decode_record, QueueEntry};
use crate::store::{StoreConn, PAGE_QUEUE_KEY};
use redis::AsyncCommands;

/// Append a queue entry to the tail of the shared page queue.
pub async fn push_entry(conn: &StoreConn, entry: &QueueEntry) -> Result<()> {
    let mut store = conn.clone();
    store
        .rpush::<_, _, ()>(PAGE_QUEUE_KEY, serde_json::to_string(entry)?)
        .await?;

    Ok(())
}

/// Pop the next entry from the head of the queue, without blocking.
///
/// `Ok(None)` means the queue is currently empty (or the popped entry was
/// malformed and has been dropped with a log line). A popped entry is gone
/// from the queue permanently; it is owned by the caller from here on.
/// Connection-level failures surface as errors so the worker loop can run
/// its connectivity backoff.
pub async fn pop_next_entry(conn: &StoreConn) -> Result<Option<QueueEntry>> {
    let mut store = conn.clone();
    let raw: Option<String> = store.lpop(PAGE_QUEUE_KEY, None).await?;

    Ok(decode_record(PAGE_QUEUE_KEY, raw))
}

/// Number of entries waiting in the queue. Monitoring only.
pub async fn queue_depth(conn: &StoreConn) -> Result<u64> {
    let mut store = conn.clone();
    let depth = store.llen(PAGE_QUEUE_KEY).await?;

    Ok(depth)
}
