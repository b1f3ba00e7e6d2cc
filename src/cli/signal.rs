//! Shutdown signals
//!
//! SIGINT and SIGTERM cancel the run. A listener that cannot be installed is
//! logged and never fires, so the run carries on uncancelled.

use std::future::Future;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// Cancel `cancel` on the first SIGINT or SIGTERM
pub async fn cancel_on_signal(cancel: CancellationToken) {
    let signal = wait_for_signal().await;
    info!(signal, "Shutdown signal received, stopping after the current step");
    cancel.cancel();
}

/// Resolve to `name` when `listener` reports a signal.
///
/// If the listener fails the error is logged and the future stays pending.
pub async fn signal_or_pending<F>(name: &'static str, listener: F) -> &'static str
where
    F: Future<Output = std::io::Result<()>>,
{
    match listener.await {
        Ok(()) => name,
        Err(e) => {
            warn!(signal = name, error = %e, "Could not listen for signal");
            std::future::pending().await
        }
    }
}

#[cfg(unix)]
async fn wait_for_signal() -> &'static str {
    use tokio::signal::unix::{signal, SignalKind};

    let interrupt = signal_or_pending("SIGINT", tokio::signal::ctrl_c());
    let terminate = signal_or_pending("SIGTERM", async {
        let mut stream = signal(SignalKind::terminate())?;
        stream.recv().await;
        Ok::<(), std::io::Error>(())
    });

    tokio::select! {
        name = interrupt => name,
        name = terminate => name,
    }
}

#[cfg(not(unix))]
async fn wait_for_signal() -> &'static str {
    signal_or_pending("SIGINT", tokio::signal::ctrl_c()).await
}

#[cfg(test)]
mod signal_tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_signal_resolves_to_name() {
        let name = signal_or_pending("SIGTERM", async { Ok(()) }).await;
        assert_eq!(name, "SIGTERM");
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_listener_never_fires() {
        let failing = signal_or_pending("SIGINT", async {
            Err(std::io::Error::other("no signal driver"))
        });

        let result = tokio::time::timeout(Duration::from_secs(60), failing).await;
        assert!(result.is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_listener_leaves_run_uncancelled() {
        let cancel = CancellationToken::new();
        let token = cancel.clone();
        let watcher = async move {
            signal_or_pending("SIGINT", async {
                Err(std::io::Error::other("no signal driver"))
            })
            .await;
            token.cancel();
        };

        let _ = tokio::time::timeout(Duration::from_secs(60), watcher).await;
        assert!(!cancel.is_cancelled());
    }
}
