//! Liveness reporter — a low-frequency heartbeat proving the runtime
//! is still scheduling tasks, independent of worker throughput.

use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::info;

/// Spawn the heartbeat task. It shares nothing with the worker loop
/// beyond the interval it was given and runs until the process exits.
pub fn spawn_heartbeat(interval: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut tick = tokio::time::interval(interval);
        // Skip the immediate first tick; the first beat comes one
        // full interval after startup.
        tick.tick().await;

        loop {
            tick.tick().await;
            info!(code = "STILL_ALIVE", "service instance still running");
        }
    })
}
