//! Graceful shutdown signal handling for long-running workers

use std::io;

use thiserror::Error;
use tokio::{signal, sync::watch};
use tracing::info;

#[derive(Debug, Error)]
pub enum ShutdownSignalError {
    #[error("failed to install Ctrl+C handler: {0}")]
    CtrlC(#[source] io::Error),

    #[cfg(unix)]
    #[error("failed to install SIGTERM handler: {0}")]
    SigTerm(#[source] io::Error),
}

/// Cancellation channel observed by worker loops. Sending `true` asks
/// every receiver to stop after its current unit of work.
#[must_use]
pub fn channel() -> (watch::Sender<bool>, watch::Receiver<bool>) {
    watch::channel(false)
}

/// Wait for Ctrl+C or SIGTERM.
///
/// # Errors
///
/// Returns an error when a signal handler cannot be installed.
pub async fn wait_for_signal() -> Result<(), ShutdownSignalError> {
    let ctrl_c = async { signal::ctrl_c().await.map_err(ShutdownSignalError::CtrlC) };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .map_err(ShutdownSignalError::SigTerm)?
            .recv()
            .await;
        Ok::<(), ShutdownSignalError>(())
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<Result<(), ShutdownSignalError>>();

    tokio::select! {
        result = ctrl_c => {
            result?;
            info!("ctrl_c signal received");
        }
        result = terminate => {
            result?;
            info!("terminate signal received");
        }
    };

    Ok(())
}

/// Flip `sender` once a termination signal arrives.
///
/// # Errors
///
/// Returns an error when a signal handler cannot be installed.
pub async fn listen(sender: watch::Sender<bool>) -> Result<(), ShutdownSignalError> {
    wait_for_signal().await?;

    let _receivers_gone = sender.send(true);

    Ok(())
}

#[cfg(test)]
mod tests {
    use testresult::TestResult;

    use super::*;

    #[tokio::test]
    async fn receivers_observe_shutdown() -> TestResult {
        let (sender, mut receiver) = channel();

        assert!(!*receiver.borrow());

        sender.send(true)?;
        receiver.changed().await?;

        assert!(*receiver.borrow());

        Ok(())
    }
}
