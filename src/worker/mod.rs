//! Worker pool for polling and processing page-generation jobs
//!
//! This module provides:
//! - WorkerPool: spawns N symmetric polling loops over the shared queue
//! - JobProcessor: resolves one claimed queue entry end to end
//! - WorkerConfig: pool configuration with env-based defaults

pub mod config;
pub mod pool;
pub mod processor;

pub use config::WorkerConfig;
pub use pool::{setup_signal_handler, PoolStats, WorkerPool};
pub use processor::{JobOutcome, JobProcessor};
