//! Fixed-cadence driver for the collection cycle.

use std::time::Duration;

use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use crate::collector::{CollectError, Collector};

/// Run a cycle every `period` until `cancel` fires or a cycle fails.
///
/// The first cycle runs one full period after the call. Cycles never
/// overlap: a slow cycle delays the next tick instead of stacking up.
///
/// A failed cycle ends the loop with its error, unless the failure was caused
/// by shutdown, in which case the loop ends cleanly.
pub async fn run(
    collector: &mut Collector,
    period: Duration,
    cancel: &CancellationToken,
) -> Result<(), CollectError> {
    let mut ticker = interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                info!("stopping");
                return Ok(());
            }
            _ = ticker.tick() => {
                if let Err(err) = collector.collect(cancel).await {
                    if cancel.is_cancelled() {
                        info!("cycle interrupted by shutdown");
                        return Ok(());
                    }
                    error!(error = %err, "collection cycle failed");
                    return Err(err);
                }
            }
        }
    }
}

/// Resolve when the process receives SIGINT or SIGTERM.
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            error!(error = %err, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(err) => {
                error!(error = %err, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
}
