//! Page record operations

use crate::store::models::{decode_record, now_millis, PageJob, PageStatus};
use crate::store::{documents, page_key, status, StoreConn};
use redis::AsyncCommands;
use tracing::{error, warn};

/// Fetch every page of a document, sorted by page index.
///
/// Returns an empty list when the document is absent, the store is
/// unreachable, or no page decodes; individual malformed pages are skipped.
pub async fn get_pages(conn: &StoreConn, document_id: &str) -> Vec<PageJob> {
    let Some(document) = documents::get_document(conn, document_id).await else {
        warn!("Document {} not found, returning no pages", document_id);
        return Vec::new();
    };

    if document.total_pages == 0 {
        return Vec::new();
    }

    let keys: Vec<String> = (0..document.total_pages)
        .map(|index| page_key(document_id, index))
        .collect();

    let mut store = conn.clone();
    let raw: Vec<Option<String>> = match store.mget(&keys).await {
        Ok(values) => values,
        Err(e) => {
            error!("Failed to read pages of document {}: {}", document_id, e);
            return Vec::new();
        }
    };

    let mut pages: Vec<PageJob> = raw
        .into_iter()
        .zip(keys.iter())
        .filter_map(|(value, key)| decode_record(key, value))
        .collect();

    pages.sort_by_key(|page| page.page_index);
    pages
}

/// Fetch a single page record.
pub async fn get_page(conn: &StoreConn, document_id: &str, page_index: u32) -> Option<PageJob> {
    let key = page_key(document_id, page_index);
    let mut store = conn.clone();

    match store.get::<_, Option<String>>(&key).await {
        Ok(raw) => decode_record(&key, raw),
        Err(e) => {
            error!("Failed to read page {}:{}: {}", document_id, page_index, e);
            None
        }
    }
}

/// Transition a page and recompute the owning document's aggregate status.
///
/// Best-effort: workers are long-running and must not crash on a store
/// hiccup, so every failure here is logged and swallowed. `content` and
/// `error` overwrite the stored values on every call.
pub async fn update_page_status(
    conn: &StoreConn,
    document_id: &str,
    page_index: u32,
    status: PageStatus,
    content: &str,
    error: &str,
) {
    let Some(mut page) = get_page(conn, document_id, page_index).await else {
        warn!(
            "Page {} of document {} not found, skipping status update",
            page_index, document_id
        );
        return;
    };

    page.status = status;
    page.content = content.to_string();
    page.error = error.to_string();
    page.updated_at = now_millis();

    let key = page_key(document_id, page_index);
    let payload = match serde_json::to_string(&page) {
        Ok(payload) => payload,
        Err(e) => {
            error!("Failed to encode page {}:{}: {}", document_id, page_index, e);
            return;
        }
    };

    let mut store = conn.clone();
    if let Err(e) = store.set::<_, _, ()>(&key, payload).await {
        error!("Failed to write page {}:{}: {}", document_id, page_index, e);
        return;
    }

    status::recompute_document_status(conn, document_id).await;
}
