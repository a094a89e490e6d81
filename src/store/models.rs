//! Store record types
//!
//! Records are stored as JSON with camelCase field names so that every
//! surface sharing the store (submission API, library migration, this
//! worker pool) reads and writes the same shape.

use chrono::Utc;
use rand::{distributions::Alphanumeric, Rng};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use tracing::warn;

/// Current wall-clock time as epoch milliseconds.
pub fn now_millis() -> i64 {
    Utc::now().timestamp_millis()
}

/// Allocate a document id: creation time plus a random suffix.
///
/// Uniqueness is best-effort, not cryptographically guaranteed.
pub fn new_document_id() -> String {
    let suffix: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(7)
        .map(char::from)
        .collect();

    format!("{}-{}", now_millis(), suffix.to_lowercase())
}

/// Aggregate status of a whole document, derived from its pages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentStatus {
    Queued,
    Processing,
    Completed,
    Failed,
    Partial,
}

impl DocumentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            DocumentStatus::Queued => "queued",
            DocumentStatus::Processing => "processing",
            DocumentStatus::Completed => "completed",
            DocumentStatus::Failed => "failed",
            DocumentStatus::Partial => "partial",
        }
    }
}

/// Status of a single page job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PageStatus {
    Queued,
    Processing,
    Completed,
    Failed,
}

impl PageStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PageStatus::Queued => "queued",
            PageStatus::Processing => "processing",
            PageStatus::Completed => "completed",
            PageStatus::Failed => "failed",
        }
    }
}

/// Target length preset for generated prose.
///
/// Stored as `FULL | MEDIUM | MINIMAL | ULTRA_MINIMAL`. An unrecognized
/// value decodes as `Medium` rather than poisoning the whole record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ContentMode {
    Full,
    Medium,
    Minimal,
    UltraMinimal,
}

impl ContentMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContentMode::Full => "FULL",
            ContentMode::Medium => "MEDIUM",
            ContentMode::Minimal => "MINIMAL",
            ContentMode::UltraMinimal => "ULTRA_MINIMAL",
        }
    }
}

impl From<String> for ContentMode {
    fn from(value: String) -> Self {
        match value.as_str() {
            "FULL" => ContentMode::Full,
            "MEDIUM" => ContentMode::Medium,
            "MINIMAL" => ContentMode::Minimal,
            "ULTRA_MINIMAL" => ContentMode::UltraMinimal,
            other => {
                warn!("Unknown content mode {:?}, using MEDIUM", other);
                ContentMode::Medium
            }
        }
    }
}

impl From<ContentMode> for String {
    fn from(mode: ContentMode) -> Self {
        mode.as_str().to_string()
    }
}

/// One full multi-page generation request, with its derived counters.
///
/// The counters and `status` are owned by the aggregate recompute; callers
/// never set them directly. `completedPages + processingPages + queuedPages
/// + failedPages == totalPages` holds after every recompute, but may be
/// transiently violated between a page write and the following recompute.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentJob {
    pub id: String,
    pub title: String,
    pub description: String,
    pub content_mode: ContentMode,
    pub status: DocumentStatus,
    pub total_pages: u32,
    pub completed_pages: u32,
    pub processing_pages: u32,
    pub queued_pages: u32,
    pub failed_pages: u32,
    pub created_at: i64,
    pub updated_at: i64,
}

/// One page's generation unit of work and its result.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageJob {
    pub document_id: String,
    pub page_index: u32,
    pub page_title: String,
    pub status: PageStatus,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub error: String,
    /// Informational only; the retry ceiling is tracked in worker memory.
    #[serde(default)]
    pub attempts: u32,
    pub created_at: i64,
    pub updated_at: i64,
}

/// Lightweight reference to a page job awaiting processing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueueEntry {
    pub document_id: String,
    pub page_index: u32,
}

/// Decode a raw store value into a typed record.
///
/// Absent and malformed values both come back as `None`; malformed values
/// are logged so the ambiguity never reaches callers.
pub(crate) fn decode_record<T: DeserializeOwned>(key: &str, raw: Option<String>) -> Option<T> {
    let raw = raw?;

    match serde_json::from_str(&raw) {
        Ok(record) => Some(record),
        Err(e) => {
            warn!("Malformed record at {}: {}", key, e);
            None
        }
    }
}
