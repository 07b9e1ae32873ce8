use axum::extract::{Path, State};
use axum::http::header;
use axum::response::IntoResponse;
use axum::Json;
use chrono::Utc;
use rand::Rng;
use serde::Deserialize;
use std::time::Duration;
use tokio::process::Command;
use tracing::{info, warn};

use crate::config::{JOB_SWEEP_INTERVAL_SECS, JOB_TTL_HOURS};
use crate::error::StorewatchError;
use crate::region::{self, TestEnv};
use crate::state::{evict_expired_jobs, ComboResult, JobStatus, RunCombo, SharedState, TestJob};

#[derive(Deserialize)]
pub struct RunTestsRequest {
    pub regions: Vec<String>,
    pub environments: Vec<TestEnv>,
}

/// POST /api/run-tests — queue a flow-suite job over the cross product of
/// regions and environments. Unknown regions are rejected up front rather
/// than defaulted.
pub async fn run_tests(
    State(state): State<SharedState>,
    Json(body): Json<RunTestsRequest>,
) -> Result<impl IntoResponse, StorewatchError> {
    if body.regions.is_empty() || body.environments.is_empty() {
        return Err(StorewatchError::InvalidInput(
            "at least one region and one environment are required".to_string(),
        ));
    }
    for code in &body.regions {
        if region::by_code(code).is_none() {
            return Err(StorewatchError::UnknownRegion(code.clone()));
        }
    }

    let combos: Vec<RunCombo> = body
        .regions
        .iter()
        .flat_map(|code| {
            body.environments.iter().map(|env| RunCombo {
                region: code.clone(),
                environment: *env,
            })
        })
        .collect();

    let job_id = uuid::Uuid::new_v4().to_string();
    let job = TestJob {
        job_id: job_id.clone(),
        status: JobStatus::Queued,
        combos: combos.clone(),
        created_at: Utc::now(),
        finished_at: None,
        results: Vec::new(),
    };
    state.jobs.write().await.insert(job_id.clone(), job);

    tokio::spawn(run_job(state.clone(), job_id.clone(), combos));

    Ok(Json(serde_json::json!({
        "status": "queued",
        "jobId": job_id,
    })))
}

/// Run each combo as a `run-flows` child process, sequentially. One slow
/// region must not block another job's status queries, hence the task.
async fn run_job(state: SharedState, job_id: String, combos: Vec<RunCombo>) {
    if let Some(job) = state.jobs.write().await.get_mut(&job_id) {
        job.status = JobStatus::Running;
    }

    let mut results = Vec::new();
    for combo in combos {
        let result = run_combo(&state, &job_id, &combo).await;
        results.push(result);
        if let Some(job) = state.jobs.write().await.get_mut(&job_id) {
            job.results = results.clone();
        }
    }

    let all_passed = results.iter().all(|r| r.passed);
    if let Some(job) = state.jobs.write().await.get_mut(&job_id) {
        job.status = if all_passed {
            JobStatus::Completed
        } else {
            JobStatus::Failed
        };
        job.finished_at = Some(Utc::now());
    }
    info!(
        "job {} finished, all passed: {}",
        job_id, all_passed
    );
}

async fn run_combo(state: &SharedState, job_id: &str, combo: &RunCombo) -> ComboResult {
    let mut result = ComboResult {
        region: combo.region.clone(),
        environment: combo.environment,
        passed: false,
        total: 0,
        failed: 0,
        report: None,
        exit_code: None,
        note: None,
    };

    let exe = match std::env::current_exe() {
        Ok(exe) => exe,
        Err(e) => {
            result.note = Some(format!("could not resolve worker binary: {e}"));
            return result;
        }
    };
    let report_path = state
        .config
        .data_dir
        .join("jobs")
        .join(job_id)
        .join(format!("{}-{}.json", combo.region, combo.environment));
    if let Some(parent) = report_path.parent() {
        if let Err(e) = std::fs::create_dir_all(parent) {
            result.note = Some(format!("could not create job directory: {e}"));
            return result;
        }
    }

    let output = Command::new(exe)
        .arg("run-flows")
        .arg("--region")
        .arg(&combo.region)
        .arg("--environment")
        .arg(combo.environment.as_str())
        .arg("--report")
        .arg(&report_path)
        .output()
        .await;

    match output {
        Ok(output) => {
            result.exit_code = output.status.code();
            match std::fs::read_to_string(&report_path)
                .map_err(StorewatchError::from)
                .and_then(|raw| {
                    serde_json::from_str::<serde_json::Value>(&raw).map_err(Into::into)
                }) {
                Ok(report) => {
                    result.total = report["total"].as_u64().unwrap_or(0) as usize;
                    result.failed = report["failed"].as_u64().unwrap_or(0) as usize;
                    result.passed = result.failed == 0 && result.total > 0;
                    result.report = Some(report);
                }
                Err(e) => {
                    // Fall back to the coarse exit-code signal.
                    warn!("job {} report unreadable: {}", job_id, e);
                    result.passed = output.status.success();
                    result.note = Some("report file unreadable, verdict from exit code".to_string());
                }
            }
        }
        Err(e) => {
            result.note = Some(format!("worker failed to start: {e}"));
        }
    }
    result
}

/// GET /api/test-status/{job_id}
pub async fn job_status(
    State(state): State<SharedState>,
    Path(job_id): Path<String>,
) -> Result<impl IntoResponse, StorewatchError> {
    let jobs = state.jobs.read().await;
    let job = jobs
        .get(&job_id)
        .ok_or_else(|| StorewatchError::JobNotFound(job_id.clone()))?;
    Ok(Json(serde_json::json!({
        "jobId": job.job_id,
        "status": job.status,
        "createdAt": job.created_at,
        "finishedAt": job.finished_at,
        "combos": job.combos,
        "completed": job.results.len(),
    })))
}

/// GET /api/test-results/{job_id}
pub async fn job_results(
    State(state): State<SharedState>,
    Path(job_id): Path<String>,
) -> Result<impl IntoResponse, StorewatchError> {
    let jobs = state.jobs.read().await;
    let job = jobs
        .get(&job_id)
        .ok_or_else(|| StorewatchError::JobNotFound(job_id.clone()))?;
    Ok(Json(job.clone()))
}

/// GET /api/test-results/{job_id}/download — the same payload as an
/// attachment.
pub async fn job_download(
    State(state): State<SharedState>,
    Path(job_id): Path<String>,
) -> Result<impl IntoResponse, StorewatchError> {
    let jobs = state.jobs.read().await;
    let job = jobs
        .get(&job_id)
        .ok_or_else(|| StorewatchError::JobNotFound(job_id.clone()))?;

    let body = serde_json::to_string_pretty(job)?;
    Ok((
        [
            (header::CONTENT_TYPE, "application/json".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=test-results-{job_id}.json"),
            ),
        ],
        body,
    ))
}

const TRIVIA: &[&str] = &[
    "The first photo book printed on this platform was a wedding album.",
    "Canvas prints are the most reordered product across every region.",
    "The German storefront was the first localization, added in 2015.",
    "Over half of calendar orders are placed in November and December.",
    "The designer autosaves projects every thirty seconds.",
];

/// GET /api/trivia — a random fact for the job dashboard's waiting screen.
pub async fn trivia() -> Json<serde_json::Value> {
    let idx = rand::thread_rng().gen_range(0..TRIVIA.len());
    Json(serde_json::json!({ "fact": TRIVIA[idx] }))
}

/// GET /api/health
pub async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

/// Hourly sweep of jobs past their TTL.
pub fn spawn_job_sweeper(state: SharedState) {
    let mut shutdown_rx = state.shutdown_tx.subscribe();
    tokio::spawn(async move {
        loop {
            tokio::select! {
                _ = shutdown_rx.recv() => break,
                _ = tokio::time::sleep(Duration::from_secs(JOB_SWEEP_INTERVAL_SECS)) => {}
            }
            let evicted =
                evict_expired_jobs(&mut *state.jobs.write().await, Utc::now(), JOB_TTL_HOURS);
            if evicted > 0 {
                info!("swept {} expired jobs", evicted);
            }
        }
    });
}
