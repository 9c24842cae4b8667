//! Restart-on-crash supervision for module workers.

use crate::metrics;
use std::future::Future;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, warn};

/// How a supervised task ended for good.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Exit {
    /// The task returned normally.
    Stopped,
    /// The task panicked more often than the restart budget allows.
    GaveUp { restarts: u32 },
    /// Shutdown was requested while the task was down.
    Cancelled,
}

/// Run `start()` on its own task, starting it again each time it panics.
///
/// Every restart calls `start` anew, so the worker comes back in its initial
/// state. At most `max_restarts` restarts happen.
pub async fn supervise<F, Fut>(
    module: &str,
    max_restarts: u32,
    shutdown: &CancellationToken,
    mut start: F,
) -> Exit
where
    F: FnMut() -> Fut,
    Fut: Future<Output = ()> + Send + 'static,
{
    let mut restarts = 0;
    loop {
        match tokio::spawn(start()).await {
            Ok(()) => {
                debug!(module, "Module worker exited");
                return Exit::Stopped;
            }
            Err(e) if e.is_panic() => {
                if shutdown.is_cancelled() {
                    return Exit::Cancelled;
                }
                if restarts >= max_restarts {
                    error!(module, restarts, "Module worker keeps crashing, giving up");
                    return Exit::GaveUp { restarts };
                }
                restarts += 1;
                metrics::record_module_restart(module);
                warn!(module, attempt = restarts, "Module worker crashed, restarting");
            }
            Err(_) => return Exit::Cancelled,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicU32, Ordering};

    type Start = std::pin::Pin<Box<dyn Future<Output = ()> + Send>>;

    fn crashing(times: u32, starts: &Arc<AtomicU32>) -> impl FnMut() -> Start {
        let starts = Arc::clone(starts);
        move || {
            let n = starts.fetch_add(1, Ordering::SeqCst);
            Box::pin(async move {
                if n < times {
                    panic!("crash {n}");
                }
            })
        }
    }

    #[tokio::test]
    async fn restarts_until_the_worker_survives() {
        let starts = Arc::new(AtomicU32::new(0));
        let exit = supervise("demo", 3, &CancellationToken::new(), crashing(2, &starts)).await;
        assert_eq!(exit, Exit::Stopped);
        assert_eq!(starts.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn gives_up_after_the_budget() {
        let starts = Arc::new(AtomicU32::new(0));
        let token = CancellationToken::new();
        let exit = supervise("demo", 2, &token, crashing(u32::MAX, &starts)).await;
        assert_eq!(exit, Exit::GaveUp { restarts: 2 });
        assert_eq!(starts.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn no_restart_after_shutdown() {
        let starts = Arc::new(AtomicU32::new(0));
        let token = CancellationToken::new();
        token.cancel();
        let exit = supervise("demo", 5, &token, crashing(u32::MAX, &starts)).await;
        assert_eq!(exit, Exit::Cancelled);
        assert_eq!(starts.load(Ordering::SeqCst), 1);
    }
}
