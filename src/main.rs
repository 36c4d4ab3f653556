use std::sync::Arc;
use std::time::Duration;
use studiosync::components::sync::Reconciler;
use studiosync::error::other_error;
use studiosync::shutdown;
use studiosync::startup;
use studiosync::utils::scheduler::run_periodically;
use tokio::sync::oneshot;
use tracing::{error, info};

#[tokio::main]
async fn main() -> miette::Result<()> {
    // Initialize logging
    startup::init_logging()?;

    info!("Starting studiosync");

    // Load configuration
    let config = startup::load_config()?;
    let interval = config.sync.sync_interval_secs;

    let reconciler = startup::build_reconciler(config)?;

    if interval == 0 {
        return run_once(&reconciler).await;
    }

    // Create shutdown channel
    let (shutdown_send, shutdown_recv) = oneshot::channel();

    // Spawn signal handler task
    tokio::spawn(shutdown::handle_signals(shutdown_send));

    let reconciler = Arc::new(reconciler);
    let runs = run_periodically(Duration::from_secs(interval), shutdown_recv, || {
        let reconciler = Arc::clone(&reconciler);
        async move {
            if let Err(e) = reconciler.run().await {
                error!("Sync run failed: {}", e);
            }
        }
    })
    .await;

    info!("Stopped after {} sync runs", runs);
    Ok(())
}

/// Single run, a failed run or failed items make the exit code non-zero
async fn run_once(reconciler: &Reconciler) -> miette::Result<()> {
    let report = reconciler.run().await?;

    let failed = report.failed();
    if !failed.is_empty() {
        return Err(other_error(&format!("{} sync actions failed", failed.len())).into());
    }
    Ok(())
}
