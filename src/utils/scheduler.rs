use std::future::Future;
use std::time::Duration;
use tokio::sync::oneshot;
use tokio::time::sleep;
use tracing::{info, warn};

/// Run `job` every `interval` until a shutdown signal arrives.
///
/// Runs never overlap: the next one starts `interval` after the previous one
/// finished. The shutdown signal is only looked at between runs, so a run in
/// progress always completes. A closed channel without a signal keeps the
/// loop going.
pub async fn run_periodically<F, Fut>(
    interval: Duration,
    mut shutdown: oneshot::Receiver<()>,
    mut job: F,
) -> usize
where
    F: FnMut() -> Fut,
    Fut: Future<Output = ()>,
{
    let mut runs = 0;
    let mut listening = true;

    loop {
        job().await;
        runs += 1;

        info!("Next sync in {} seconds", interval.as_secs());
        let wait = sleep(interval);
        tokio::pin!(wait);
        let mut stop = false;
        loop {
            tokio::select! {
                _ = &mut wait => break,
                result = &mut shutdown, if listening => {
                    if result.is_ok() {
                        stop = true;
                        break;
                    }
                    warn!("Shutdown channel closed, signals will no longer stop the scheduler");
                    listening = false;
                }
            }
        }

        if stop {
            info!("Shutdown requested, stopping scheduler");
            break;
        }
    }

    runs
}
