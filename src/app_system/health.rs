use std::time::{Duration, Instant};
use tracing::{debug, error, warn};

use crate::clients::StallClient;

const HEALTH_TIMEOUT: Duration = Duration::from_millis(500);
const SLOW_THRESHOLD: Duration = Duration::from_millis(100);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Health {
    /// Answered within the slow threshold
    Healthy,
    /// Answered, but slowly
    Degraded,
    /// Failed or timed out
    Unavailable,
}

/// Times one ledger round-trip.
///
/// - Normal response: < 100ms (debug log)
/// - Slow response: 100-500ms (warning, the actor may be overloaded)
/// - Timeout or error: error log
pub async fn check_health(stalls: &StallClient) -> Health {
    let start = Instant::now();

    match tokio::time::timeout(HEALTH_TIMEOUT, stalls.get_stall("health_check".to_string())).await {
        Ok(Ok(_)) => log_response_time(start.elapsed()),
        Ok(Err(e)) => {
            error!(error = %e, duration_ms = start.elapsed().as_millis(), "Health check failed");
            Health::Unavailable
        }
        Err(_) => {
            error!(
                timeout_ms = HEALTH_TIMEOUT.as_millis(),
                "Health check timed out - ledger may be blocked/overloaded"
            );
            Health::Unavailable
        }
    }
}

/// Runs [`check_health`] on a fixed interval until the task is dropped.
pub async fn performance_monitor(stalls: StallClient, interval: Duration) {
    let mut interval_timer = tokio::time::interval(interval);

    loop {
        interval_timer.tick().await;
        check_health(&stalls).await;
    }
}

fn log_response_time(duration: Duration) -> Health {
    let duration_ms = duration.as_millis();
    if duration > SLOW_THRESHOLD {
        warn!(duration_ms, "Health check slow but completed - potential overload");
        Health::Degraded
    } else {
        debug!(duration_ms, "Health check completed normally");
        Health::Healthy
    }
}
