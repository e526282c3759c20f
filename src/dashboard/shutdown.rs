use tokio::select;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// Cancels the dashboard on ctrl-c. Returns as soon as the dashboard is cancelled some other way.
pub async fn detect_shutdown(cancelation: CancellationToken) {
    select! {
        result = tokio::signal::ctrl_c() => match result {
            Ok(()) => {
                info!("Received ctrl-c, shutting down");
                cancelation.cancel();
            }
            Err(e) => {
                warn!("Can't listen for ctrl-c {e:?}");
                cancelation.cancelled().await;
            }
        },
        _ = cancelation.cancelled() => (),
    };
}
