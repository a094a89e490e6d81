//! Worker pool - spawns and supervises the polling loops

use crate::error::Result;
use crate::generator::PageGenerator;
use crate::store::{connection, queue, StoreConn};
use crate::worker::{JobOutcome, JobProcessor, WorkerConfig};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tokio::time::{sleep, Duration};
use tracing::{error, info};

/// How often the pool logs its aggregate statistics
const STATS_INTERVAL: Duration = Duration::from_secs(30);

/// Backoff after an in-loop error while the store is unreachable
const STORE_DOWN_BACKOFF: Duration = Duration::from_secs(10);

/// Backoff after a transient in-loop error
const LOOP_ERROR_BACKOFF: Duration = Duration::from_secs(5);

/// Aggregate counters shared by every worker in a pool.
#[derive(Debug)]
pub struct PoolStats {
    processed: AtomicU64,
    succeeded: AtomicU64,
    failed: AtomicU64,
    active_workers: AtomicU64,
    started_at: Instant,
}

impl PoolStats {
    fn new() -> Self {
        Self {
            processed: AtomicU64::new(0),
            succeeded: AtomicU64::new(0),
            failed: AtomicU64::new(0),
            active_workers: AtomicU64::new(0),
            started_at: Instant::now(),
        }
    }

    /// Record a resolved job. Skipped jobs count as processed but neither
    /// succeeded nor failed.
    fn record(&self, outcome: JobOutcome) {
        self.processed.fetch_add(1, Ordering::Relaxed);
        match outcome {
            JobOutcome::Completed => {
                self.succeeded.fetch_add(1, Ordering::Relaxed);
            }
            JobOutcome::Failed => {
                self.failed.fetch_add(1, Ordering::Relaxed);
            }
            JobOutcome::Skipped => {}
        }
    }

    pub fn processed(&self) -> u64 {
        self.processed.load(Ordering::Relaxed)
    }

    pub fn succeeded(&self) -> u64 {
        self.succeeded.load(Ordering::Relaxed)
    }

    pub fn failed(&self) -> u64 {
        self.failed.load(Ordering::Relaxed)
    }

    fn log_summary(&self) {
        let processed = self.processed();
        let succeeded = self.succeeded();
        let failed = self.failed();
        let active = self.active_workers.load(Ordering::Relaxed);
        let uptime = self.started_at.elapsed().as_secs();
        let success_rate = if processed > 0 {
            succeeded as f64 / processed as f64 * 100.0
        } else {
            0.0
        };

        info!(
            "Uptime: {}s | Processed: {} | Succeeded: {} | Failed: {} | Success rate: {:.1}% | Active workers: {}",
            uptime, processed, succeeded, failed, success_rate, active
        );
    }
}

/// Pool of symmetric polling workers over the shared page queue.
///
/// Work distribution is purely the atomic pop from the shared queue; no
/// dispatcher assigns jobs, and a popped entry is never seen by a second
/// worker.
pub struct WorkerPool {
    conn: StoreConn,
    generator: Arc<dyn PageGenerator>,
    config: WorkerConfig,
    stats: Arc<PoolStats>,
    shutdown: Arc<AtomicBool>,
}

impl WorkerPool {
    pub fn new(conn: StoreConn, generator: Arc<dyn PageGenerator>, config: WorkerConfig) -> Self {
        Self {
            conn,
            generator,
            config,
            stats: Arc::new(PoolStats::new()),
            shutdown: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Get a handle to signal shutdown
    pub fn shutdown_handle(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.shutdown)
    }

    pub fn stats(&self) -> Arc<PoolStats> {
        Arc::clone(&self.stats)
    }

    /// Run the pool until shutdown is signaled.
    ///
    /// Shutdown is cooperative: workers stop picking up new queue entries
    /// and finish whatever they have in flight. The only fatal condition
    /// is the initial store connectivity check.
    pub async fn run(&self) -> Result<()> {
        connection::ping(&self.conn).await?;
        info!("Store connection successful");

        match queue::queue_depth(&self.conn).await {
            Ok(depth) => info!(
                "Starting {} workers, {} entries queued",
                self.config.workers, depth
            ),
            Err(_) => info!("Starting {} workers", self.config.workers),
        }
        info!("Poll interval: {:?}", self.config.poll_interval);
        info!("Generation timeout: {:?}", self.config.generation_timeout);
        info!("Max retries: {}", self.config.max_retries);

        let stats_task = {
            let stats = Arc::clone(&self.stats);
            let shutdown = Arc::clone(&self.shutdown);
            tokio::spawn(async move {
                let mut ticker = tokio::time::interval(STATS_INTERVAL);
                ticker.tick().await;
                loop {
                    ticker.tick().await;
                    if shutdown.load(Ordering::Relaxed) {
                        break;
                    }
                    stats.log_summary();
                }
            })
        };

        let processor = Arc::new(JobProcessor::new(
            self.conn.clone(),
            Arc::clone(&self.generator),
            self.config.clone(),
        ));

        let workers: Vec<_> = (1..=self.config.workers)
            .map(|worker_id| {
                tokio::spawn(worker_loop(
                    worker_id,
                    self.conn.clone(),
                    Arc::clone(&processor),
                    self.config.clone(),
                    Arc::clone(&self.stats),
                    Arc::clone(&self.shutdown),
                ))
            })
            .collect();

        futures::future::join_all(workers).await;

        stats_task.abort();
        self.stats.log_summary();
        info!("Worker pool stopped");

        Ok(())
    }

    /// Pop and process a single queue entry (useful for testing with the
    /// --once flag).
    ///
    /// Returns:
    /// - Ok(true) if an entry was processed
    /// - Ok(false) if the queue was empty
    /// - Err on a store error
    pub async fn run_once(&self) -> Result<bool> {
        let Some(entry) = queue::pop_next_entry(&self.conn).await? else {
            return Ok(false);
        };

        let processor = JobProcessor::new(
            self.conn.clone(),
            Arc::clone(&self.generator),
            self.config.clone(),
        );
        let outcome = processor.process(&entry, 1).await;
        self.stats.record(outcome);

        Ok(true)
    }
}

/// One worker's polling loop. Never terminates on error; only the shutdown
/// flag ends it.
async fn worker_loop(
    worker_id: usize,
    conn: StoreConn,
    processor: Arc<JobProcessor>,
    config: WorkerConfig,
    stats: Arc<PoolStats>,
    shutdown: Arc<AtomicBool>,
) {
    info!("[worker-{}] Started", worker_id);

    loop {
        if shutdown.load(Ordering::Relaxed) {
            break;
        }

        match queue::pop_next_entry(&conn).await {
            Ok(Some(entry)) => {
                stats.active_workers.fetch_add(1, Ordering::Relaxed);
                let outcome = processor.process(&entry, worker_id).await;
                stats.active_workers.fetch_sub(1, Ordering::Relaxed);
                stats.record(outcome);

                if config.processing_delay > Duration::ZERO {
                    sleep(config.processing_delay).await;
                }
            }
            Ok(None) => {
                sleep(config.poll_interval).await;
            }
            Err(e) => {
                error!("[worker-{}] Error in worker loop: {}", worker_id, e);

                if !connection::check_connection(&conn).await {
                    error!(
                        "[worker-{}] Store connection lost, retrying in {:?}",
                        worker_id, STORE_DOWN_BACKOFF
                    );
                    sleep(STORE_DOWN_BACKOFF).await;
                } else {
                    sleep(LOOP_ERROR_BACKOFF).await;
                }
            }
        }
    }

    info!("[worker-{}] Stopped", worker_id);
}

/// Setup signal handlers for graceful shutdown
pub fn setup_signal_handler(shutdown: Arc<AtomicBool>) {
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("Received Ctrl+C, finishing in-flight jobs...");
                shutdown.store(true, Ordering::Relaxed);
            }
            Err(e) => {
                error!("Failed to listen for Ctrl+C: {}", e);
            }
        }
    });
}
