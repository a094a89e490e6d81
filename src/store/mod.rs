//! Redis-backed job store
//!
//! This module owns the on-disk representation of ebook generation state:
//! - Document records under `ebook:<documentId>`
//! - Page records under `ebook-page:<documentId>:<pageIndex>`
//! - A FIFO page queue under `ebook-queue:pages`
//!
//! All operations are independent per-key reads and writes; there is no
//! transaction discipline. Reads degrade to absent/empty on store failure
//! and writes other than document creation are best-effort.

pub mod connection;
pub mod documents;
pub mod models;
pub mod pages;
pub mod queue;
pub mod status;

pub use connection::{check_connection, connect, connect_from_env, ping, StoreConn};

/// Key prefix for document records
pub(crate) const DOCUMENT_PREFIX: &str = "ebook:";

/// Key prefix for page records
pub(crate) const PAGE_PREFIX: &str = "ebook-page:";

/// List key holding the shared page queue
pub(crate) const PAGE_QUEUE_KEY: &str = "ebook-queue:pages";

pub(crate) fn document_key(document_id: &str) -> String {
    format!("{}{}", DOCUMENT_PREFIX, document_id)
}

pub(crate) fn page_key(document_id: &str, page_index: u32) -> String {
    format!("{}{}:{}", PAGE_PREFIX, document_id, page_index)
}
