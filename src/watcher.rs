use std::time::{Duration, SystemTime};
use tokio::time::sleep;
use tracing::debug;

use crate::config::PROGRESS_POLL_INTERVAL_MS;
use crate::progress::ProgressTracker;
use crate::state::SharedState;

/// Poll the progress file and broadcast each new snapshot to the WebSocket
/// clients. Stat-based: unchanged mtimes skip the read entirely.
pub fn spawn_progress_watcher(state: SharedState) {
    let tracker = ProgressTracker::new(&state.config.data_dir);
    let mut shutdown_rx = state.shutdown_tx.subscribe();

    tokio::spawn(async move {
        let mut last_mtime: Option<SystemTime> = None;
        loop {
            tokio::select! {
                _ = shutdown_rx.recv() => {
                    debug!("progress watcher shutting down");
                    break;
                }
                _ = sleep(Duration::from_millis(PROGRESS_POLL_INTERVAL_MS)) => {}
            }

            let mtime = match tokio::fs::metadata(tracker.progress_path()).await {
                Ok(meta) => meta.modified().ok(),
                Err(_) => continue,
            };
            if mtime.is_some() && mtime == last_mtime {
                continue;
            }
            last_mtime = mtime;

            match tracker.read() {
                Ok(data) => {
                    // Send fails only when no client is subscribed.
                    let _ = state.progress_tx.send(data);
                }
                Err(e) => debug!("progress file unreadable: {}", e),
            }
        }
    });
}
