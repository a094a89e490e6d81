//! Store connection management

use crate::error::{EbookError, Result};
use redis::aio::ConnectionManager;

/// Shared handle to the key-value store.
///
/// `ConnectionManager` multiplexes over one connection and reconnects on
/// failure, so a single handle is cloned into every worker.
pub type StoreConn = ConnectionManager;

/// Open a connection to the store.
///
/// # Example
/// ```ignore
/// let conn = connect("redis://localhost:6379").await?;
/// ```
pub async fn connect(redis_url: &str) -> Result<StoreConn> {
    let client = redis::Client::open(redis_url)?;
    let conn = ConnectionManager::new(client).await?;

    Ok(conn)
}

/// Open a connection from the `REDIS_URL` (or `REDIS_PUBLIC_URL`)
/// environment variable.
pub async fn connect_from_env() -> Result<StoreConn> {
    let redis_url = std::env::var("REDIS_URL")
        .or_else(|_| std::env::var("REDIS_PUBLIC_URL"))
        .map_err(|_| EbookError::ConfigError("REDIS_URL or REDIS_PUBLIC_URL not set".to_string()))?;

    connect(&redis_url).await
}

/// Round-trip a PING to verify the store is reachable.
pub async fn ping(conn: &StoreConn) -> Result<()> {
    let mut store = conn.clone();
    redis::cmd("PING").query_async::<_, String>(&mut store).await?;

    Ok(())
}

/// Connectivity probe used by the worker loop's error backoff.
pub async fn check_connection(conn: &StoreConn) -> bool {
    ping(conn).await.is_ok()
}
