//! Document record operations

use crate::error::Result;
use crate::store::models::{
    decode_record, new_document_id, now_millis, ContentMode, DocumentJob, DocumentStatus, PageJob,
    PageStatus, QueueEntry,
};
use crate::store::{document_key, page_key, queue, StoreConn};
use redis::AsyncCommands;
use tracing::{error, info};

/// Create a document with one page record and one queue entry per title.
///
/// Pages and queue entries are written sequentially in index order so the
/// queue drains in reading order. There is no rollback: if a write fails
/// partway through, the error surfaces to the caller and the aggregate
/// recompute tolerates whatever subset landed.
pub async fn create_document(
    conn: &StoreConn,
    title: &str,
    description: &str,
    content_mode: ContentMode,
    page_titles: &[String],
) -> Result<(String, DocumentJob)> {
    let document_id = new_document_id();
    let now = now_millis();
    let total_pages = page_titles.len() as u32;

    let document = DocumentJob {
        id: document_id.clone(),
        title: title.to_string(),
        description: description.to_string(),
        content_mode,
        status: DocumentStatus::Queued,
        total_pages,
        completed_pages: 0,
        processing_pages: 0,
        queued_pages: total_pages,
        failed_pages: 0,
        created_at: now,
        updated_at: now,
    };

    let mut store = conn.clone();
    store
        .set::<_, _, ()>(document_key(&document_id), serde_json::to_string(&document)?)
        .await?;

    for (index, page_title) in page_titles.iter().enumerate() {
        let page_index = index as u32;
        let page = PageJob {
            document_id: document_id.clone(),
            page_index,
            page_title: page_title.clone(),
            status: PageStatus::Queued,
            content: String::new(),
            error: String::new(),
            attempts: 0,
            created_at: now,
            updated_at: now,
        };

        store
            .set::<_, _, ()>(page_key(&document_id, page_index), serde_json::to_string(&page)?)
            .await?;

        queue::push_entry(
            conn,
            &QueueEntry {
                document_id: document_id.clone(),
                page_index,
            },
        )
        .await?;
    }

    info!(
        "Created document {} with {} pages (mode {})",
        document_id,
        total_pages,
        content_mode.as_str()
    );

    Ok((document_id, document))
}

/// Fetch a document record. Store failures and malformed records degrade to
/// `None` with a log line.
pub async fn get_document(conn: &StoreConn, document_id: &str) -> Option<DocumentJob> {
    let key = document_key(document_id);
    let mut store = conn.clone();

    match store.get::<_, Option<String>>(&key).await {
        Ok(raw) => decode_record(&key, raw),
        Err(e) => {
            error!("Failed to read document {}: {}", document_id, e);
            None
        }
    }
}
