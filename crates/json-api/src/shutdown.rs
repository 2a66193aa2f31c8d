//! Graceful shutdown signal handling

use std::time::Duration;

use salvo::server::ServerHandle;
use skus_app::shutdown::{ShutdownSignalError, wait_for_signal};

pub(crate) async fn listen(
    handle: ServerHandle,
    grace: Duration,
) -> Result<(), ShutdownSignalError> {
    wait_for_signal().await?;

    handle.stop_graceful(Some(grace));

    Ok(())
}
