//! Job processor for resolving individual queue entries

use crate::error::Result;
use crate::generator::{PageContext, PageGenerator};
use crate::retry;
use crate::store::models::{PageStatus, QueueEntry};
use crate::store::{documents, pages, StoreConn};
use crate::worker::WorkerConfig;
use std::sync::Arc;
use tokio::time::sleep;
use tracing::{error, info, warn};

/// How a claimed queue entry was resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobOutcome {
    /// Content generated and stored
    Completed,
    /// Generation failed fatally or exhausted its retries
    Failed,
    /// Referenced document or page no longer exists; entry dropped
    Skipped,
}

/// Processes one queue entry end to end: fetch context, generate content,
/// write the terminal page status back.
pub struct JobProcessor {
    conn: StoreConn,
    generator: Arc<dyn PageGenerator>,
    config: WorkerConfig,
}

impl JobProcessor {
    pub fn new(conn: StoreConn, generator: Arc<dyn PageGenerator>, config: WorkerConfig) -> Self {
        Self {
            conn,
            generator,
            config,
        }
    }

    /// Resolve a single queue entry.
    ///
    /// The entry is already consumed from the queue; failed pages are
    /// marked `failed` in place, never re-enqueued.
    pub async fn process(&self, entry: &QueueEntry, worker_id: usize) -> JobOutcome {
        let document_id = entry.document_id.as_str();
        let page_index = entry.page_index;

        info!(
            "[worker-{}] Processing page {} of document {}",
            worker_id, page_index, document_id
        );

        let (document, all_pages) = tokio::join!(
            documents::get_document(&self.conn, document_id),
            pages::get_pages(&self.conn, document_id),
        );

        let Some(document) = document else {
            // Nothing to update; the entry is consumed and dropped.
            error!(
                "[worker-{}] Document {} not found for page {}",
                worker_id, document_id, page_index
            );
            return JobOutcome::Skipped;
        };

        if all_pages.is_empty() {
            error!(
                "[worker-{}] Page data not found or invalid for document {}",
                worker_id, document_id
            );
            pages::update_page_status(
                &self.conn,
                document_id,
                page_index,
                PageStatus::Failed,
                "",
                "Page data not found or invalid in store",
            )
            .await;
            return JobOutcome::Skipped;
        }

        let Some(page) = all_pages.iter().find(|p| p.page_index == page_index) else {
            error!(
                "[worker-{}] Page {} not found in page list for document {}",
                worker_id, page_index, document_id
            );
            pages::update_page_status(
                &self.conn,
                document_id,
                page_index,
                PageStatus::Failed,
                "",
                "Current page data not found in list",
            )
            .await;
            return JobOutcome::Skipped;
        };

        let page_titles: Vec<String> = all_pages.iter().map(|p| p.page_title.clone()).collect();

        pages::update_page_status(
            &self.conn,
            document_id,
            page_index,
            PageStatus::Processing,
            "",
            "",
        )
        .await;

        let context = PageContext {
            document_title: &document.title,
            document_description: &document.description,
            page_title: &page.page_title,
            page_index,
            content_mode: document.content_mode,
            page_titles: &page_titles,
        };

        match generate_with_retry(
            self.generator.as_ref(),
            &context,
            self.config.max_retries,
            worker_id,
        )
        .await
        {
            Ok(content) => {
                pages::update_page_status(
                    &self.conn,
                    document_id,
                    page_index,
                    PageStatus::Completed,
                    &content,
                    "",
                )
                .await;
                info!(
                    "[worker-{}] Completed page {} of document {}",
                    worker_id, page_index, document_id
                );
                JobOutcome::Completed
            }
            Err(e) => {
                pages::update_page_status(
                    &self.conn,
                    document_id,
                    page_index,
                    PageStatus::Failed,
                    "",
                    &e.to_string(),
                )
                .await;
                warn!(
                    "[worker-{}] Failed page {} of document {}: {}",
                    worker_id, page_index, document_id, e
                );
                JobOutcome::Failed
            }
        }
    }
}

/// Run the generation call under the retry policy.
///
/// Transient failures are re-attempted by the same worker after a backoff;
/// a slow job blocks this worker's throughput but no one else's. Attempts
/// are tracked here, in memory, not in the page record.
pub(crate) async fn generate_with_retry(
    generator: &dyn PageGenerator,
    context: &PageContext<'_>,
    max_retries: u32,
    worker_id: usize,
) -> Result<String> {
    let mut attempt = 0;

    loop {
        match generator.generate(context).await {
            Ok(content) => return Ok(content),
            Err(e) => {
                warn!(
                    "[worker-{}] Generation attempt {} failed for page {}: {}",
                    worker_id,
                    attempt + 1,
                    context.page_index,
                    e
                );

                if !retry::should_retry(&e, attempt, max_retries) {
                    return Err(e);
                }

                let delay = retry::backoff_delay(attempt);
                info!(
                    "[worker-{}] Retrying page {} in {:?}",
                    worker_id, context.page_index, delay
                );
                sleep(delay).await;
                attempt += 1;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::EbookError;
    use crate::store::models::ContentMode;
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Mutex;
    use std::time::Duration;

    /// Generator returning a scripted sequence of outcomes, then failing.
    struct ScriptedGenerator {
        outcomes: Mutex<VecDeque<Result<String>>>,
        calls: AtomicU32,
    }

    impl ScriptedGenerator {
        fn new(outcomes: Vec<Result<String>>) -> Self {
            Self {
                outcomes: Mutex::new(outcomes.into()),
                calls: AtomicU32::new(0),
            }
        }

        fn calls(&self) -> u32 {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl PageGenerator for ScriptedGenerator {
        async fn generate(&self, _context: &PageContext<'_>) -> Result<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.outcomes
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(EbookError::GenerationError("script exhausted".to_string())))
        }
    }

    fn context(page_titles: &[String]) -> PageContext<'_> {
        PageContext {
            document_title: "Test book",
            document_description: "about testing",
            page_title: &page_titles[0],
            page_index: 0,
            content_mode: ContentMode::Medium,
            page_titles,
        }
    }

    fn failure(message: &str) -> Result<String> {
        Err(EbookError::GenerationError(message.to_string()))
    }

    #[tokio::test(start_paused = true)]
    async fn test_transient_failure_exhausts_retries_with_backoff() {
        let generator = ScriptedGenerator::new(vec![
            failure("network unreachable"),
            failure("network unreachable"),
            failure("network unreachable"),
            failure("network unreachable"),
        ]);
        let titles = vec!["Intro".to_string()];
        let started = tokio::time::Instant::now();

        let result = generate_with_retry(&generator, &context(&titles), 3, 1).await;

        assert!(result.is_err());
        assert_eq!(generator.calls(), 4);
        // Backoffs of 5s, 10s and 15s between the four attempts.
        assert_eq!(started.elapsed(), Duration::from_secs(30));
    }

    #[tokio::test(start_paused = true)]
    async fn test_fatal_failure_is_not_retried() {
        let generator = ScriptedGenerator::new(vec![failure("invalid model")]);
        let titles = vec!["Intro".to_string()];
        let started = tokio::time::Instant::now();

        let result = generate_with_retry(&generator, &context(&titles), 3, 1).await;

        assert!(result.is_err());
        assert_eq!(generator.calls(), 1);
        assert_eq!(started.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn test_recovers_after_transient_failures() {
        let generator = ScriptedGenerator::new(vec![
            failure("rate limit exceeded"),
            failure("Generation timeout after 60000ms"),
            Ok("generated page text".to_string()),
        ]);
        let titles = vec!["Intro".to_string()];

        let content = generate_with_retry(&generator, &context(&titles), 3, 1)
            .await
            .expect("third attempt succeeds");

        assert_eq!(content, "generated page text");
        assert_eq!(generator.calls(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_error_is_retried() {
        let generator = ScriptedGenerator::new(vec![
            Err(EbookError::GenerationTimeout { timeout_ms: 60_000 }),
            Ok("recovered".to_string()),
        ]);
        let titles = vec!["Intro".to_string()];

        let content = generate_with_retry(&generator, &context(&titles), 3, 1)
            .await
            .expect("second attempt succeeds");

        assert_eq!(content, "recovered");
        assert_eq!(generator.calls(), 2);
    }
}
