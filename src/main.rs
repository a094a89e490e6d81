//! Ebook Builder CLI
//!
//! Queues multi-page ebooks for generation and runs the worker pool that
//! drains the shared page queue. The `status` subcommand exposes the
//! read-only document view consumed by the library migration.

use anyhow::Result;
use clap::{Parser, Subcommand};
use ebook_builder::store::{connection, documents, pages};
use ebook_builder::worker::{setup_signal_handler, WorkerConfig, WorkerPool};
use ebook_builder::{ContentMode, OpenAiGenerator, PageStatus};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser)]
#[command(name = "ebook-builder")]
#[command(about = "Generate multi-page ebook content with a queue-backed worker pool")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Queue a new ebook for generation from an ordered list of page titles
    Enqueue {
        /// Ebook title
        #[arg(short, long)]
        title: String,

        /// Short description of the ebook
        #[arg(short, long, default_value = "")]
        description: String,

        /// Content mode: FULL, MEDIUM, MINIMAL or ULTRA_MINIMAL
        #[arg(short, long, default_value = "MEDIUM")]
        mode: String,

        /// Page titles, in reading order
        #[arg(required = true)]
        pages: Vec<String>,
    },

    /// Show the current status of a queued ebook and its pages
    Status {
        /// Document id returned by enqueue
        id: String,
    },

    /// Run the worker pool, polling the shared page queue
    Worker {
        /// Number of concurrent workers (default: CONCURRENT_WORKERS or 3)
        #[arg(short, long)]
        workers: Option<usize>,

        /// Poll interval in milliseconds while the queue is empty
        #[arg(long)]
        poll_interval: Option<u64>,

        /// Delay in milliseconds after each job on a worker
        #[arg(long)]
        processing_delay: Option<u64>,

        /// Generation timeout in milliseconds
        #[arg(short, long)]
        timeout: Option<u64>,

        /// Maximum retries for transient generation failures
        #[arg(long)]
        max_retries: Option<u32>,

        /// Process a single queue entry and exit (for testing)
        #[arg(long)]
        once: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    let subscriber = FmtSubscriber::builder().with_max_level(level).finish();
    tracing::subscriber::set_global_default(subscriber)?;

    // Load .env file if present
    dotenvy::dotenv().ok();

    match cli.command {
        Commands::Enqueue {
            title,
            description,
            mode,
            pages,
        } => {
            let conn = connection::connect_from_env().await?;
            let mode = ContentMode::from(mode);

            let (document_id, document) =
                documents::create_document(&conn, &title, &description, mode, &pages).await?;

            println!(
                "Queued ebook {} ({} pages, mode {})",
                document_id,
                document.total_pages,
                document.content_mode.as_str()
            );
        }

        Commands::Status { id } => {
            let conn = connection::connect_from_env().await?;

            let Some(document) = documents::get_document(&conn, &id).await else {
                anyhow::bail!("Document {} not found", id);
            };

            println!(
                "{} - \"{}\" [{}]",
                document.id,
                document.title,
                document.status.as_str()
            );
            println!(
                "  pages: {} total | {} completed | {} processing | {} queued | {} failed",
                document.total_pages,
                document.completed_pages,
                document.processing_pages,
                document.queued_pages,
                document.failed_pages
            );

            for page in pages::get_pages(&conn, &id).await {
                let detail = match page.status {
                    PageStatus::Completed => format!("({} chars)", page.content.len()),
                    PageStatus::Failed => page.error.clone(),
                    _ => String::new(),
                };
                println!(
                    "  {:>3}. {} [{}] {}",
                    page.page_index + 1,
                    page.page_title,
                    page.status.as_str(),
                    detail
                );
            }
        }

        Commands::Worker {
            workers,
            poll_interval,
            processing_delay,
            timeout,
            max_retries,
            once,
        } => {
            info!("Initializing worker pool...");

            let conn = connection::connect_from_env().await?;

            let mut config = WorkerConfig::from_env();
            if let Some(workers) = workers {
                config.workers = workers;
            }
            if let Some(ms) = poll_interval {
                config.poll_interval = Duration::from_millis(ms);
            }
            if let Some(ms) = processing_delay {
                config.processing_delay = Duration::from_millis(ms);
            }
            if let Some(ms) = timeout {
                config.generation_timeout = Duration::from_millis(ms);
            }
            if let Some(n) = max_retries {
                config.max_retries = n;
            }

            let generator = Arc::new(OpenAiGenerator::from_env(config.generation_timeout)?);
            let pool = WorkerPool::new(conn, generator, config);

            if once {
                info!("Running in single-job mode...");
                if pool.run_once().await? {
                    println!("Processed one queue entry");
                } else {
                    println!("Queue is empty");
                }
            } else {
                setup_signal_handler(pool.shutdown_handle());
                pool.run().await?;
            }
        }
    }

    Ok(())
}
