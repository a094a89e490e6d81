//! Store-backed lifecycle tests
//!
//! These tests exercise document creation, the shared queue, and the
//! aggregate status recompute against a real Redis instance. They are
//! ignored by default and expect a dedicated instance (the queue key is
//! shared), reachable via REDIS_URL:
//!
//! ```text
//! REDIS_URL=redis://localhost:6379 cargo test -- --ignored --test-threads=1
//! ```

use ebook_builder::store::{connection, documents, pages, queue, status, StoreConn};
use ebook_builder::{ContentMode, DocumentStatus, PageStatus};

async fn test_conn() -> StoreConn {
    dotenvy::dotenv().ok();
    connection::connect_from_env()
        .await
        .expect("redis connection")
}

async fn drain_queue(conn: &StoreConn) {
    while queue::pop_next_entry(conn)
        .await
        .expect("queue pop")
        .is_some()
    {}
}

fn titles(names: &[&str]) -> Vec<String> {
    names.iter().map(|s| s.to_string()).collect()
}

#[tokio::test]
#[ignore] // Requires Redis
async fn test_creation_initializes_counters_and_queue_in_order() {
    let conn = test_conn().await;
    drain_queue(&conn).await;

    let page_titles = titles(&["Alpha", "Beta", "Gamma"]);
    let (document_id, document) = documents::create_document(
        &conn,
        "Test book",
        "about testing",
        ContentMode::Medium,
        &page_titles,
    )
    .await
    .expect("create document");

    assert_eq!(document.status, DocumentStatus::Queued);
    assert_eq!(document.total_pages, 3);
    assert_eq!(document.queued_pages, 3);
    assert_eq!(document.completed_pages, 0);
    assert_eq!(document.processing_pages, 0);
    assert_eq!(document.failed_pages, 0);

    let stored = documents::get_document(&conn, &document_id)
        .await
        .expect("stored document");
    assert_eq!(stored.status, DocumentStatus::Queued);

    let stored_pages = pages::get_pages(&conn, &document_id).await;
    assert_eq!(stored_pages.len(), 3);
    for (index, page) in stored_pages.iter().enumerate() {
        assert_eq!(page.page_index, index as u32);
        assert_eq!(page.page_title, page_titles[index]);
        assert_eq!(page.status, PageStatus::Queued);
        assert_eq!(page.content, "");
    }

    // The queue pops exactly one entry per page, in ascending page order.
    for expected in 0..3u32 {
        let entry = queue::pop_next_entry(&conn)
            .await
            .expect("queue pop")
            .expect("queue entry");
        assert_eq!(entry.document_id, document_id);
        assert_eq!(entry.page_index, expected);
    }
    assert!(queue::pop_next_entry(&conn)
        .await
        .expect("queue pop")
        .is_none());
}

#[tokio::test]
#[ignore] // Requires Redis
async fn test_partial_failure_accounting() {
    let conn = test_conn().await;
    drain_queue(&conn).await;

    let page_titles = titles(&["Intro", "Body", "Conclusion"]);
    let (document_id, _) = documents::create_document(
        &conn,
        "Partial book",
        "",
        ContentMode::Medium,
        &page_titles,
    )
    .await
    .expect("create document");

    for _ in 0..3 {
        queue::pop_next_entry(&conn)
            .await
            .expect("queue pop")
            .expect("queue entry");
    }

    pages::update_page_status(&conn, &document_id, 0, PageStatus::Completed, "intro text", "")
        .await;
    pages::update_page_status(
        &conn,
        &document_id,
        1,
        PageStatus::Failed,
        "",
        "Failed to generate content: boom",
    )
    .await;
    pages::update_page_status(
        &conn,
        &document_id,
        2,
        PageStatus::Completed,
        "closing text",
        "",
    )
    .await;

    let document = documents::get_document(&conn, &document_id)
        .await
        .expect("document");
    assert_eq!(document.status, DocumentStatus::Partial);
    assert_eq!(document.completed_pages, 2);
    assert_eq!(document.failed_pages, 1);
    assert_eq!(document.queued_pages, 0);
    assert_eq!(document.processing_pages, 0);

    let failed_page = pages::get_page(&conn, &document_id, 1)
        .await
        .expect("failed page");
    assert_eq!(failed_page.error, "Failed to generate content: boom");
}

#[tokio::test]
#[ignore] // Requires Redis
async fn test_terminal_status_transitions() {
    let conn = test_conn().await;
    drain_queue(&conn).await;

    // All pages completed -> completed.
    let (completed_id, _) =
        documents::create_document(&conn, "Done", "", ContentMode::Full, &titles(&["A", "B"]))
            .await
            .expect("create document");
    pages::update_page_status(&conn, &completed_id, 0, PageStatus::Completed, "a", "").await;

    let in_flight = documents::get_document(&conn, &completed_id)
        .await
        .expect("document");
    assert_eq!(in_flight.status, DocumentStatus::Processing);

    pages::update_page_status(&conn, &completed_id, 1, PageStatus::Completed, "b", "").await;
    let done = documents::get_document(&conn, &completed_id)
        .await
        .expect("document");
    assert_eq!(done.status, DocumentStatus::Completed);

    // All pages failed -> failed.
    let (failed_id, _) =
        documents::create_document(&conn, "Broken", "", ContentMode::Full, &titles(&["A", "B"]))
            .await
            .expect("create document");
    pages::update_page_status(&conn, &failed_id, 0, PageStatus::Failed, "", "boom").await;
    pages::update_page_status(&conn, &failed_id, 1, PageStatus::Failed, "", "boom").await;

    let failed = documents::get_document(&conn, &failed_id)
        .await
        .expect("document");
    assert_eq!(failed.status, DocumentStatus::Failed);
    assert_eq!(failed.failed_pages, 2);

    drain_queue(&conn).await;
}

#[tokio::test]
#[ignore] // Requires Redis
async fn test_empty_queue_pop_returns_none() {
    let conn = test_conn().await;
    drain_queue(&conn).await;

    assert!(queue::pop_next_entry(&conn)
        .await
        .expect("queue pop")
        .is_none());
}

#[tokio::test]
#[ignore] // Requires Redis
async fn test_recompute_is_idempotent() {
    let conn = test_conn().await;

    let (document_id, _) = documents::create_document(
        &conn,
        "Idempotent",
        "",
        ContentMode::Full,
        &titles(&["One", "Two"]),
    )
    .await
    .expect("create document");

    pages::update_page_status(&conn, &document_id, 0, PageStatus::Completed, "text", "").await;

    let first = documents::get_document(&conn, &document_id)
        .await
        .expect("document");
    status::recompute_document_status(&conn, &document_id).await;
    let second = documents::get_document(&conn, &document_id)
        .await
        .expect("document");

    assert_eq!(first.status, second.status);
    assert_eq!(first.completed_pages, second.completed_pages);
    assert_eq!(first.processing_pages, second.processing_pages);
    assert_eq!(first.queued_pages, second.queued_pages);
    assert_eq!(first.failed_pages, second.failed_pages);

    drain_queue(&conn).await;
}

#[tokio::test]
#[ignore] // Requires Redis
async fn test_update_missing_page_is_a_no_op() {
    let conn = test_conn().await;

    // No page record exists; the update logs and drops, never panics.
    pages::update_page_status(
        &conn,
        "no-such-document",
        0,
        PageStatus::Failed,
        "",
        "orphan entry",
    )
    .await;

    assert!(documents::get_document(&conn, "no-such-document")
        .await
        .is_none());
}
