use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::config::{PROGRESS_FILE, RECENT_FAILURES_CAP, STOP_SIGNAL_FILE};
use crate::error::StorewatchError;
use crate::results::format_success_rate;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunStatus {
    Idle,
    Running,
    Completed,
    Stopped,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FailureEntry {
    pub link_name: String,
    pub url: String,
    pub timestamp: DateTime<Utc>,
    pub reason: String,
}

/// Snapshot of one monitor run. Serialized as a single JSON file that is
/// overwritten on every update; the file is the only channel between the
/// monitor process and the dashboard.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressData {
    pub status: RunStatus,
    pub environment: String,
    pub start_time: DateTime<Utc>,
    pub last_update: DateTime<Utc>,
    pub duration_secs: u64,
    pub elapsed_secs: u64,
    pub remaining_secs: u64,
    pub total_clicks: u64,
    pub successful_clicks: u64,
    pub failed_clicks: u64,
    pub success_rate: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_link: Option<String>,
    pub recent_failures: Vec<FailureEntry>,
    pub should_stop: bool,
}

impl ProgressData {
    pub fn idle() -> Self {
        let now = Utc::now();
        ProgressData {
            status: RunStatus::Idle,
            environment: String::new(),
            start_time: now,
            last_update: now,
            duration_secs: 0,
            elapsed_secs: 0,
            remaining_secs: 0,
            total_clicks: 0,
            successful_clicks: 0,
            failed_clicks: 0,
            success_rate: "0.0%".to_string(),
            current_link: None,
            recent_failures: Vec::new(),
            should_stop: false,
        }
    }
}

/// Read-modify-write access to the progress file and the stop-signal
/// sentinel. Single writer assumed; every write goes through a temp file
/// plus atomic rename so readers never observe a torn file.
pub struct ProgressTracker {
    progress_path: PathBuf,
    stop_path: PathBuf,
}

impl ProgressTracker {
    pub fn new(dir: &Path) -> Self {
        ProgressTracker {
            progress_path: dir.join(PROGRESS_FILE),
            stop_path: dir.join(STOP_SIGNAL_FILE),
        }
    }

    pub fn progress_path(&self) -> &Path {
        &self.progress_path
    }

    /// Reset to a fresh `running` state and clear any stale stop signal.
    pub fn init(
        &self,
        environment: &str,
        duration_minutes: u64,
    ) -> Result<ProgressData, StorewatchError> {
        if let Some(parent) = self.progress_path.parent() {
            fs::create_dir_all(parent)?;
        }
        self.clear_stop_signal()?;

        let now = Utc::now();
        let duration_secs = duration_minutes * 60;
        let data = ProgressData {
            status: RunStatus::Running,
            environment: environment.to_string(),
            start_time: now,
            last_update: now,
            duration_secs,
            elapsed_secs: 0,
            remaining_secs: duration_secs,
            total_clicks: 0,
            successful_clicks: 0,
            failed_clicks: 0,
            success_rate: "0.0%".to_string(),
            current_link: None,
            recent_failures: Vec::new(),
            should_stop: false,
        };
        self.write(&data)?;
        Ok(data)
    }

    pub fn read(&self) -> Result<ProgressData, StorewatchError> {
        let raw = fs::read_to_string(&self.progress_path)?;
        Ok(serde_json::from_str(&raw)?)
    }

    /// Current progress, or an idle snapshot when no run has written one yet.
    pub fn read_or_idle(&self) -> ProgressData {
        self.read().unwrap_or_else(|_| ProgressData::idle())
    }

    /// Read, recompute the clock-derived fields, apply the partial update,
    /// recompute the success rate, and overwrite the file.
    pub fn update(
        &self,
        apply: impl FnOnce(&mut ProgressData),
    ) -> Result<ProgressData, StorewatchError> {
        let mut data = self.read()?;

        let now = Utc::now();
        let elapsed = (now - data.start_time).num_seconds().max(0) as u64;
        data.elapsed_secs = elapsed.min(data.duration_secs);
        data.remaining_secs = data.duration_secs - data.elapsed_secs;
        data.last_update = now;

        apply(&mut data);

        data.success_rate =
            format_success_rate(data.successful_clicks as usize, data.total_clicks as usize);
        self.write(&data)?;
        Ok(data)
    }

    /// Prepend to the recent-failures ring, newest first, capped.
    pub fn add_failure(&self, entry: FailureEntry) -> Result<ProgressData, StorewatchError> {
        self.update(|data| {
            data.recent_failures.insert(0, entry);
            data.recent_failures.truncate(RECENT_FAILURES_CAP);
        })
    }

    /// True when the sentinel file exists or the in-file flag is set.
    pub fn should_stop(&self) -> bool {
        if self.stop_path.exists() {
            return true;
        }
        self.read().map(|d| d.should_stop).unwrap_or(false)
    }

    /// Cooperative cancellation: write the sentinel and flip the in-file
    /// flag. The monitor honors it at its next iteration boundary.
    pub fn create_stop_signal(&self) -> Result<(), StorewatchError> {
        if let Some(parent) = self.stop_path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&self.stop_path, Utc::now().to_rfc3339())?;
        // The flag matters only when a progress file exists; a missing file
        // just means no run ever started here.
        let _ = self.update(|data| data.should_stop = true);
        Ok(())
    }

    pub fn clear_stop_signal(&self) -> Result<(), StorewatchError> {
        if self.stop_path.exists() {
            fs::remove_file(&self.stop_path)?;
        }
        Ok(())
    }

    fn write(&self, data: &ProgressData) -> Result<(), StorewatchError> {
        let tmp = self.progress_path.with_extension("json.tmp");
        fs::write(&tmp, serde_json::to_vec_pretty(data)?)?;
        fs::rename(&tmp, &self.progress_path)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn idle_snapshot_has_no_counters() {
        let idle = ProgressData::idle();
        assert_eq!(idle.status, RunStatus::Idle);
        assert_eq!(idle.total_clicks, 0);
        assert_eq!(idle.success_rate, "0.0%");
        assert!(!idle.should_stop);
    }

    #[test]
    fn read_or_idle_without_file() {
        let dir = tempfile::tempdir().unwrap();
        let tracker = ProgressTracker::new(dir.path());
        assert_eq!(tracker.read_or_idle().status, RunStatus::Idle);
    }

    #[test]
    fn no_stale_tmp_file_after_write() {
        let dir = tempfile::tempdir().unwrap();
        let tracker = ProgressTracker::new(dir.path());
        tracker.init("qa", 5).unwrap();
        assert!(tracker.progress_path().exists());
        assert!(!dir.path().join(".progress.json.tmp").exists());
    }
}
