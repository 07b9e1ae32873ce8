use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::process::Child;
use tokio::sync::{broadcast, RwLock};

use crate::config::ServeArgs;
use crate::error::StorewatchError;
use crate::progress::ProgressData;
use crate::region::TestEnv;

/// Resolved server configuration, shared read-only.
#[derive(Debug, Clone)]
pub struct ServeConfig {
    pub port: u16,
    pub data_dir: PathBuf,
    pub region: String,
    /// Basic-auth credentials; auth is disabled when `None`.
    pub auth: Option<(String, String)>,
}

impl ServeConfig {
    pub fn from_args(args: &ServeArgs) -> Self {
        let auth = match (&args.auth_username, &args.auth_password) {
            (Some(user), Some(pass)) => Some((user.clone(), pass.clone())),
            _ => None,
        };
        ServeConfig {
            port: args.port,
            data_dir: args.data_dir.clone(),
            region: args.region.clone(),
            auth,
        }
    }
}

/// The running monitor child, if any. At most one run is active at a time;
/// `try_begin` enforces that without holding the child handle.
#[derive(Default)]
pub struct MonitorProc {
    pub process: Option<Child>,
    pub running: bool,
    pub environment: Option<TestEnv>,
    pub started_at: Option<DateTime<Utc>>,
}

impl MonitorProc {
    /// Claim the run slot. Fails when a run is already active.
    pub fn try_begin(&mut self, environment: TestEnv) -> Result<(), StorewatchError> {
        if self.running {
            return Err(StorewatchError::MonitorAlreadyRunning);
        }
        self.running = true;
        self.environment = Some(environment);
        self.started_at = Some(Utc::now());
        Ok(())
    }

    pub fn clear(&mut self) {
        self.process = None;
        self.running = false;
        self.environment = None;
        self.started_at = None;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Queued,
    Running,
    Completed,
    Failed,
}

/// One region-environment pair requested in a job.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunCombo {
    pub region: String,
    pub environment: TestEnv,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComboResult {
    pub region: String,
    pub environment: TestEnv,
    pub passed: bool,
    pub total: usize,
    pub failed: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub report: Option<Value>,
    pub exit_code: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

/// A multi-combo test job on the job server. Kept in memory and swept
/// after its TTL.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestJob {
    pub job_id: String,
    pub status: JobStatus,
    pub combos: Vec<RunCombo>,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub finished_at: Option<DateTime<Utc>>,
    pub results: Vec<ComboResult>,
}

/// Remove finished jobs older than `ttl_hours`. Queued and running jobs
/// are never evicted, whatever their age.
pub fn evict_expired_jobs(
    jobs: &mut HashMap<String, TestJob>,
    now: DateTime<Utc>,
    ttl_hours: i64,
) -> usize {
    let cutoff = now - chrono::Duration::hours(ttl_hours);
    let before = jobs.len();
    jobs.retain(|_, job| {
        let terminal = matches!(job.status, JobStatus::Completed | JobStatus::Failed);
        !terminal || job.created_at > cutoff
    });
    before - jobs.len()
}

pub struct DashboardState {
    pub config: ServeConfig,
    pub monitor: RwLock<MonitorProc>,
    pub jobs: RwLock<HashMap<String, TestJob>>,
    /// Progress snapshots pushed to every connected WebSocket client.
    pub progress_tx: broadcast::Sender<ProgressData>,
    pub shutdown_tx: broadcast::Sender<()>,
}

pub type SharedState = Arc<DashboardState>;

impl DashboardState {
    pub fn new(config: ServeConfig) -> SharedState {
        let (progress_tx, _) = broadcast::channel(64);
        let (shutdown_tx, _) = broadcast::channel(4);
        Arc::new(DashboardState {
            config,
            monitor: RwLock::new(MonitorProc::default()),
            jobs: RwLock::new(HashMap::new()),
            progress_tx,
            shutdown_tx,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn try_begin_rejects_second_run() {
        let mut proc = MonitorProc::default();
        proc.try_begin(TestEnv::Qa).unwrap();
        assert!(matches!(
            proc.try_begin(TestEnv::Live),
            Err(StorewatchError::MonitorAlreadyRunning)
        ));
        proc.clear();
        proc.try_begin(TestEnv::Live).unwrap();
    }

    #[test]
    fn eviction_keeps_fresh_jobs() {
        let mut jobs = HashMap::new();
        let now = Utc::now();
        jobs.insert(
            "old".to_string(),
            TestJob {
                job_id: "old".to_string(),
                status: JobStatus::Completed,
                combos: vec![],
                created_at: now - chrono::Duration::hours(30),
                finished_at: None,
                results: vec![],
            },
        );
        jobs.insert(
            "fresh".to_string(),
            TestJob {
                job_id: "fresh".to_string(),
                status: JobStatus::Running,
                combos: vec![],
                created_at: now - chrono::Duration::hours(1),
                finished_at: None,
                results: vec![],
            },
        );

        let evicted = evict_expired_jobs(&mut jobs, now, 24);
        assert_eq!(evicted, 1);
        assert!(jobs.contains_key("fresh"));
        assert!(!jobs.contains_key("old"));
    }

    #[test]
    fn eviction_never_drops_unfinished_jobs() {
        let mut jobs = HashMap::new();
        let now = Utc::now();
        for (id, status) in [("stale-running", JobStatus::Running), ("stale-queued", JobStatus::Queued)] {
            jobs.insert(
                id.to_string(),
                TestJob {
                    job_id: id.to_string(),
                    status,
                    combos: vec![],
                    created_at: now - chrono::Duration::hours(25),
                    finished_at: None,
                    results: vec![],
                },
            );
        }

        let evicted = evict_expired_jobs(&mut jobs, now, 24);
        assert_eq!(evicted, 0);
        assert!(jobs.contains_key("stale-running"));
        assert!(jobs.contains_key("stale-queued"));
    }
}
