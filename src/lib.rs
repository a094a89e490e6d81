//! Ebook Builder - A Rust service for generating multi-page ebook content
//!
//! A submitted ebook is split into one generation job per page. The jobs are
//! queued in a shared Redis store and drained by a pool of concurrent
//! polling workers, each calling the OpenAI API to write one page at a time.
//! The document-level status is re-derived from the full page set after
//! every page transition, so readers see live per-page progress and an
//! accurate partial-failure accounting once the queue drains.
//!
//! The store layout (`ebook:<id>`, `ebook-page:<id>:<index>`,
//! `ebook-queue:pages`) is shared with the surfaces that submit new ebooks
//! and migrate finished ones into the library.

pub mod error;
pub mod generator;
pub mod retry;
pub mod store;
pub mod worker;

pub use error::{EbookError, Result};
pub use generator::{OpenAiGenerator, PageContext, PageGenerator};
pub use store::models::{
    ContentMode, DocumentJob, DocumentStatus, PageJob, PageStatus, QueueEntry,
};
pub use worker::{WorkerConfig, WorkerPool};
