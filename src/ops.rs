//! Shared scaffolding for the maintenance binaries.
//!
//! Every operational entry point loads configuration, initialises tracing,
//! connects, optionally migrates, runs one unit of work and then releases the
//! pool whether or not the work succeeded. Failures map to exit status 1.

use std::future::Future;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Instant;

use metrics::{counter, histogram};
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use crate::config::{self, AppConfig};
use crate::db::{self, DbPool};
use crate::errors::ServiceError;
use crate::events::{self, EventSender};
use crate::lifecycle::DependencyGraph;

const EVENT_CHANNEL_CAPACITY: usize = 256;

/// Resources handed to an operation.
#[derive(Clone)]
pub struct OpsContext {
    pub config: AppConfig,
    pub db: Arc<DbPool>,
    pub events: Arc<EventSender>,
}

/// Runs `work` with a connected [`OpsContext`] and returns the process exit
/// status.
pub async fn run<F, Fut>(operation: &'static str, work: F) -> ExitCode
where
    F: FnOnce(OpsContext) -> Fut,
    Fut: Future<Output = Result<(), ServiceError>>,
{
    let config = match config::load_config() {
        Ok(config) => config,
        Err(e) => {
            config::init_tracing("info", false);
            error!(operation, "Failed to load configuration: {}", e);
            return ExitCode::FAILURE;
        }
    };
    config::init_tracing(config.log_level(), config.log_json);

    match execute(operation, config, work).await {
        Ok(()) => {
            info!(operation, "Operation finished");
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!(operation, error = %e, "Operation failed");
            ExitCode::FAILURE
        }
    }
}

async fn execute<F, Fut>(operation: &'static str, config: AppConfig, work: F) -> Result<(), ServiceError>
where
    F: FnOnce(OpsContext) -> Fut,
    Fut: Future<Output = Result<(), ServiceError>>,
{
    // Refuse to start on a malformed dependency graph.
    DependencyGraph::declared()?;

    let pool = db::establish_connection_from_app_config(&config).await?;
    let (sender, rx) = EventSender::channel(EVENT_CHANNEL_CAPACITY);
    let event_loop = tokio::spawn(events::process_events(rx));

    let ctx = OpsContext {
        config,
        db: Arc::new(pool),
        events: Arc::new(sender),
    };

    let start = Instant::now();
    let result = prepare_and_run(&ctx, work).await;
    histogram!("tradeflow_ops.duration", start.elapsed(), "operation" => operation);
    if result.is_err() {
        counter!("tradeflow_ops.failures", 1, "operation" => operation);
    }

    let OpsContext { db, events, .. } = ctx;
    release(db, events, event_loop).await;

    result
}

/// Stops the event loop and closes the pool. Problems are logged rather than
/// returned since the operation's own result already decides the exit
/// status. Returns `true` when both shut down cleanly.
pub async fn release(
    db: Arc<DbPool>,
    events: Arc<EventSender>,
    event_loop: JoinHandle<()>,
) -> bool {
    let mut clean = true;

    drop(events);
    if let Err(e) = event_loop.await {
        warn!("Event loop ended abnormally: {}", e);
        clean = false;
    }

    match Arc::try_unwrap(db) {
        Ok(pool) => {
            if let Err(e) = db::close_pool(pool).await {
                warn!("Failed to close database pool: {}", e);
                clean = false;
            }
        }
        Err(_) => {
            warn!("Database pool still shared at shutdown; leaving it to drop");
            clean = false;
        }
    }

    clean
}

async fn prepare_and_run<F, Fut>(ctx: &OpsContext, work: F) -> Result<(), ServiceError>
where
    F: FnOnce(OpsContext) -> Fut,
    Fut: Future<Output = Result<(), ServiceError>>,
{
    if ctx.config.database.auto_migrate {
        db::run_migrations(&ctx.db).await?;
    }
    db::check_connection(&ctx.db).await?;
    work(ctx.clone()).await
}
