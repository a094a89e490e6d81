//! Aggregate document status derivation
//!
//! The document status is recomputed from scratch after every page
//! transition: fetch all pages, count them by status, derive, write back.
//! Rereading the full page set on every transition tolerates missing or
//! delayed individual writes; documents are small (tens of pages), so the
//! extra reads are acceptable.
//!
//! Two workers finishing pages of the same document concurrently can
//! interleave their recomputes so that the later write clobbers the
//! earlier counts. That lost update is an accepted trade-off, not
//! corruption: the next page transition recomputes from the full page set
//! and self-corrects. No lock is taken here.

use crate::store::models::{now_millis, DocumentStatus, PageJob, PageStatus};
use crate::store::{document_key, documents, pages, StoreConn};
use redis::AsyncCommands;
use tracing::{error, warn};

/// Page tallies by status.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PageCounts {
    pub completed: u32,
    pub processing: u32,
    pub queued: u32,
    pub failed: u32,
}

impl PageCounts {
    pub fn tally(pages: &[PageJob]) -> Self {
        let mut counts = Self::default();
        for page in pages {
            match page.status {
                PageStatus::Completed => counts.completed += 1,
                PageStatus::Processing => counts.processing += 1,
                PageStatus::Queued => counts.queued += 1,
                PageStatus::Failed => counts.failed += 1,
            }
        }
        counts
    }
}

/// Derive the aggregate status from page tallies.
///
/// Precedence: once every page is terminal, the document is `failed` when
/// all pages failed, `partial` when some did, `completed` otherwise. Before
/// that it is `queued` until the first page starts and `processing` while
/// any page is queued or in flight. The trailing `partial` arm is reachable
/// only while the tallies do not sum to `total_pages`, i.e. a concurrent
/// write is in flight.
pub fn derive_status(counts: PageCounts, total_pages: u32) -> DocumentStatus {
    if counts.failed + counts.completed == total_pages {
        if counts.failed == total_pages {
            DocumentStatus::Failed
        } else if counts.failed > 0 {
            DocumentStatus::Partial
        } else {
            DocumentStatus::Completed
        }
    } else if counts.queued == total_pages {
        DocumentStatus::Queued
    } else if counts.processing > 0 || counts.queued > 0 {
        DocumentStatus::Processing
    } else {
        DocumentStatus::Partial
    }
}

/// Recompute and persist a document's aggregate status and counters.
///
/// No-ops (with a log line) when the document record is gone. Write
/// failures are logged and swallowed; the next page transition repairs the
/// aggregate.
pub async fn recompute_document_status(conn: &StoreConn, document_id: &str) {
    let Some(mut document) = documents::get_document(conn, document_id).await else {
        warn!("Document {} not found, skipping status recompute", document_id);
        return;
    };

    let all_pages = pages::get_pages(conn, document_id).await;
    let counts = PageCounts::tally(&all_pages);

    document.status = derive_status(counts, document.total_pages);
    document.completed_pages = counts.completed;
    document.processing_pages = counts.processing;
    document.queued_pages = counts.queued;
    document.failed_pages = counts.failed;
    document.updated_at = now_millis();

    let payload = match serde_json::to_string(&document) {
        Ok(payload) => payload,
        Err(e) => {
            error!("Failed to encode document {}: {}", document_id, e);
            return;
        }
    };

    let mut store = conn.clone();
    if let Err(e) = store
        .set::<_, _, ()>(document_key(document_id), payload)
        .await
    {
        error!(
            "Failed to write aggregate status for document {}: {}",
            document_id, e
        );
    }
}
