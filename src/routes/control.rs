use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;
use serde::Deserialize;
use std::fs::File;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tracing::{info, warn};

use crate::config::{DEFAULT_TEST_DURATION_MINUTES, GRACEFUL_STOP_TIMEOUT_SECS};
use crate::error::StorewatchError;
use crate::progress::ProgressTracker;
use crate::region::TestEnv;
use crate::state::SharedState;

#[derive(Deserialize)]
pub struct StartTestRequest {
    /// Run duration in minutes.
    #[serde(default)]
    pub duration: Option<u64>,
    #[serde(default)]
    pub environment: Option<TestEnv>,
}

/// POST /api/start-test — spawn a monitor child process. At most one run
/// is active; a second request gets 409.
pub async fn start_test(
    State(state): State<SharedState>,
    Json(body): Json<StartTestRequest>,
) -> Result<impl IntoResponse, StorewatchError> {
    let environment = body.environment.unwrap_or(TestEnv::Qa);
    let duration = body.duration.unwrap_or(DEFAULT_TEST_DURATION_MINUTES);

    {
        let mut monitor = state.monitor.write().await;
        monitor.try_begin(environment)?;
    }

    match spawn_monitor(&state, environment, duration).await {
        Ok(()) => {
            info!("monitor run started: {} for {} minutes", environment, duration);
            Ok(Json(serde_json::json!({
                "status": "started",
                "environment": environment,
                "duration": duration,
            })))
        }
        Err(e) => {
            state.monitor.write().await.clear();
            Err(e)
        }
    }
}

async fn spawn_monitor(
    state: &SharedState,
    environment: TestEnv,
    duration: u64,
) -> Result<(), StorewatchError> {
    let exe = std::env::current_exe()?;
    std::fs::create_dir_all(&state.config.data_dir)?;
    let log = File::create(state.config.data_dir.join("monitor.log"))?;
    let log_err = log.try_clone()?;

    let child = Command::new(exe)
        .arg("monitor")
        .arg("--region")
        .arg(&state.config.region)
        .arg("--environment")
        .arg(environment.as_str())
        .arg("--duration-minutes")
        .arg(duration.to_string())
        .arg("--output-dir")
        .arg(&state.config.data_dir)
        .stdout(Stdio::from(log))
        .stderr(Stdio::from(log_err))
        .spawn()?;

    state.monitor.write().await.process = Some(child);
    monitor_child_exit(state.clone());
    Ok(())
}

/// Watch for the child exiting on its own and release the run slot. The
/// child stays in state so stop_test can still take and kill it; this
/// task only polls.
fn monitor_child_exit(state: SharedState) {
    tokio::spawn(async move {
        loop {
            tokio::time::sleep(Duration::from_secs(1)).await;
            let mut monitor = state.monitor.write().await;
            match monitor.process.as_mut() {
                Some(child) => match child.try_wait() {
                    Ok(Some(status)) => {
                        info!("monitor child exited with {}", status);
                        monitor.clear();
                        return;
                    }
                    Ok(None) => {}
                    Err(e) => {
                        warn!("monitor child wait failed: {}", e);
                        monitor.clear();
                        return;
                    }
                },
                // stop_test took the child; it owns cleanup now.
                None => return,
            }
        }
    });
}

/// POST /api/stop-test — cooperative stop, escalating to kill after the
/// grace period.
pub async fn stop_test(
    State(state): State<SharedState>,
) -> Result<impl IntoResponse, StorewatchError> {
    let child = {
        let mut monitor = state.monitor.write().await;
        if !monitor.running {
            return Err(StorewatchError::MonitorNotActive);
        }
        monitor.process.take()
    };

    let tracker = ProgressTracker::new(&state.config.data_dir);
    tracker.create_stop_signal()?;

    // Give the cooperative signal a grace period before killing.
    if let Some(mut child) = child {
        let graceful = tokio::time::timeout(
            Duration::from_secs(GRACEFUL_STOP_TIMEOUT_SECS),
            child.wait(),
        )
        .await;
        match graceful {
            Ok(Ok(status)) => info!("monitor stopped gracefully with {}", status),
            Ok(Err(e)) => warn!("monitor wait failed during stop: {}", e),
            Err(_) => {
                warn!("monitor ignored stop signal, killing");
                child.kill().await?;
            }
        }
    }
    state.monitor.write().await.clear();

    Ok(Json(serde_json::json!({
        "status": "stopped",
        "message": "Monitor run stopped"
    })))
}
