use serde::Serialize;
use std::fs::{self, File};
use std::path::Path;
use std::process::Stdio;
use tokio::process::Command;
use tracing::{info, warn};

use crate::config::CHUNK_FILE_PREFIX;
use crate::error::StorewatchError;
use crate::region::TestEnv;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkerOutcome {
    pub chunk_id: usize,
    pub passed: bool,
    pub skipped: bool,
    pub exit_code: Option<i32>,
    pub log_file: String,
}

/// Spawn one `run-chunk` worker process per chunk file and wait for all of
/// them. Missing chunk files are skipped with a warning so a partial split
/// still runs. Worker stdout and stderr both go to the chunk's log file.
pub async fn run_batch(
    workers: usize,
    chunks_dir: &Path,
    results_dir: &Path,
    region: &str,
    environment: TestEnv,
) -> Result<Vec<WorkerOutcome>, StorewatchError> {
    let exe = std::env::current_exe()?;
    fs::create_dir_all(results_dir)?;

    let mut handles = Vec::new();
    let mut outcomes = Vec::new();

    for chunk_id in 1..=workers {
        let chunk_file = chunks_dir.join(format!("{CHUNK_FILE_PREFIX}{chunk_id}.json"));
        let chunk_results = results_dir.join(format!("chunk-{chunk_id}"));
        fs::create_dir_all(&chunk_results)?;
        let log_path = chunk_results.join("test-output.log");

        if !chunk_file.exists() {
            warn!("chunk file {:?} missing, skipping worker {}", chunk_file, chunk_id);
            outcomes.push(WorkerOutcome {
                chunk_id,
                passed: false,
                skipped: true,
                exit_code: None,
                log_file: log_path.to_string_lossy().to_string(),
            });
            continue;
        }

        let log = File::create(&log_path)?;
        let log_err = log.try_clone()?;

        let mut child = Command::new(&exe)
            .arg("run-chunk")
            .env("CHUNK_FILE", &chunk_file)
            .env("CHUNK_ID", chunk_id.to_string())
            .env("TEST_REGION", region)
            .env("TEST_ENV", environment.as_str())
            .arg("--output-dir")
            .arg(results_dir)
            .stdout(Stdio::from(log))
            .stderr(Stdio::from(log_err))
            .spawn()?;
        info!("worker {} started (pid {:?})", chunk_id, child.id());

        handles.push((chunk_id, log_path, tokio::spawn(async move { child.wait().await })));
    }

    for (chunk_id, log_path, handle) in handles {
        let status = handle
            .await
            .map_err(|e| StorewatchError::Process(format!("worker {chunk_id} join: {e}")))?
            .map_err(|e| StorewatchError::Process(format!("worker {chunk_id} wait: {e}")))?;
        outcomes.push(WorkerOutcome {
            chunk_id,
            passed: status.success(),
            skipped: false,
            exit_code: status.code(),
            log_file: log_path.to_string_lossy().to_string(),
        });
    }

    outcomes.sort_by_key(|o| o.chunk_id);
    let passed = outcomes.iter().filter(|o| o.passed).count();
    info!("batch finished: {}/{} workers passed", passed, outcomes.len());
    Ok(outcomes)
}
