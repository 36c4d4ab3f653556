use tokio::sync::oneshot;
use tracing::{error, info};

#[cfg(unix)]
use tokio::signal::unix::{signal, SignalKind};
#[cfg(windows)]
use tokio::signal::windows::{ctrl_break, ctrl_c};

/// Wait for a termination signal and tell the scheduler to stop
pub async fn handle_signals(shutdown_send: oneshot::Sender<()>) {
    if let Err(e) = wait_for_signal().await {
        error!("Failed to install signal handlers: {}", e);
        // Dropping the sender would read as a shutdown request
        std::future::pending::<()>().await;
    }

    // The scheduler may already be gone after a one-shot run
    let _ = shutdown_send.send(());
}

/// Platform-specific signal handling implementation
#[cfg(unix)]
async fn wait_for_signal() -> std::io::Result<()> {
    // SIGTERM from systemd or a container runtime
    let mut sigterm = signal(SignalKind::terminate())?;
    // SIGINT (Ctrl+C)
    let mut sigint = signal(SignalKind::interrupt())?;

    tokio::select! {
        _ = sigterm.recv() => {
            info!("Received SIGTERM signal, stopping after the current run");
        }
        _ = sigint.recv() => {
            info!("Received SIGINT signal, stopping after the current run");
        }
    }

    Ok(())
}

/// Platform-specific signal handling implementation
#[cfg(windows)]
async fn wait_for_signal() -> std::io::Result<()> {
    let mut ctrlc = ctrl_c()?;
    let mut ctrlbreak = ctrl_break()?;

    tokio::select! {
        _ = ctrlc.recv() => {
            info!("Received Ctrl+C signal, stopping after the current run");
        }
        _ = ctrlbreak.recv() => {
            info!("Received Ctrl+Break signal, stopping after the current run");
        }
    }

    Ok(())
}
