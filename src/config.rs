use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::region::TestEnv;

/// Storewatch — browser E2E test orchestration and monitoring for the storefront.
#[derive(Parser, Debug)]
#[command(name = "storewatch", version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Primary dashboard server: progress relay, monitor start/stop, artifacts
    Serve(ServeArgs),
    /// Multi-region job server: ad-hoc flow suites per region x environment
    JobServer(ServeArgs),
    /// Navigation monitor loop (spawned by `serve`, or run directly)
    Monitor(MonitorArgs),
    /// Split a link list into worker chunk files plus a manifest
    Split(SplitArgs),
    /// Spawn one run-chunk worker per chunk file and wait for all of them
    RunBatch(RunBatchArgs),
    /// Drive the designer flow over one chunk file (worker process)
    RunChunk(RunChunkArgs),
    /// Run the flow suite for one region and environment, writing a JSON report
    RunFlows(RunFlowsArgs),
}

#[derive(Parser, Debug, Clone)]
pub struct ServeArgs {
    /// HTTP port
    #[arg(long, env = "PORT", default_value_t = DEFAULT_DASHBOARD_PORT)]
    pub port: u16,

    /// Directory holding progress/summary/screenshot artifacts
    #[arg(long = "data-dir", default_value = "test-results")]
    pub data_dir: PathBuf,

    /// Region whose storefront monitor runs are started against
    #[arg(long, env = "TEST_REGION", default_value = "UK")]
    pub region: String,

    /// Basic-auth username (auth is disabled unless both are set)
    #[arg(long, env = "AUTH_USERNAME")]
    pub auth_username: Option<String>,

    /// Basic-auth password
    #[arg(long, env = "AUTH_PASSWORD")]
    pub auth_password: Option<String>,
}

#[derive(Parser, Debug, Clone)]
pub struct MonitorArgs {
    /// Region code from the registry (UK, DE, FR, NL, US)
    #[arg(long, env = "TEST_REGION", default_value = "UK")]
    pub region: String,

    /// Target environment
    #[arg(long, env = "TEST_ENV", value_enum, default_value_t = TestEnv::Qa)]
    pub environment: TestEnv,

    /// Wall-clock duration of the monitor run
    #[arg(long = "duration-minutes", env = "TEST_DURATION_MINUTES", default_value_t = DEFAULT_TEST_DURATION_MINUTES)]
    pub duration_minutes: u64,

    /// Override the base URL derived from region + environment
    #[arg(long = "base-url", env = "BASE_URL")]
    pub base_url: Option<String>,

    /// Output directory (progress file at its root, artifacts per environment)
    #[arg(long = "output-dir", default_value = "test-results")]
    pub output_dir: PathBuf,

    /// Run the browser with a visible window
    #[arg(long)]
    pub headed: bool,
}

#[derive(Parser, Debug, Clone)]
pub struct SplitArgs {
    /// Input JSON array of URL strings (optionally with a leading "link" header)
    #[arg(long, default_value = "final.json")]
    pub input: PathBuf,

    /// Output directory for chunk files and the manifest
    #[arg(long = "out-dir", default_value = "test-data/chunks")]
    pub out_dir: PathBuf,

    /// Number of chunks to produce
    #[arg(long, default_value_t = DEFAULT_CHUNK_COUNT)]
    pub chunks: usize,
}

#[derive(Parser, Debug, Clone)]
pub struct RunBatchArgs {
    /// Number of parallel workers
    #[arg(long, env = "NUM_WORKERS", default_value_t = DEFAULT_WORKER_COUNT)]
    pub workers: usize,

    /// Directory containing links-chunk-{i}.json files
    #[arg(long = "chunks-dir", default_value = "test-data/chunks")]
    pub chunks_dir: PathBuf,

    /// Directory for per-worker logs and results
    #[arg(long = "results-dir", default_value = "test-results/printbox")]
    pub results_dir: PathBuf,

    #[arg(long, env = "TEST_REGION", default_value = "UK")]
    pub region: String,

    #[arg(long, env = "TEST_ENV", value_enum, default_value_t = TestEnv::Qa)]
    pub environment: TestEnv,
}

#[derive(Parser, Debug, Clone)]
pub struct RunChunkArgs {
    /// Chunk file to process
    #[arg(long = "chunk-file", env = "CHUNK_FILE")]
    pub chunk_file: PathBuf,

    /// Chunk id, used for output directory naming
    #[arg(long = "chunk-id", env = "CHUNK_ID", default_value_t = 0)]
    pub chunk_id: usize,

    /// Optional 1-based sub-slice start within the chunk
    #[arg(long = "start-index", env = "START_INDEX")]
    pub start_index: Option<usize>,

    /// Optional 1-based sub-slice end within the chunk (inclusive)
    #[arg(long = "end-index", env = "END_INDEX")]
    pub end_index: Option<usize>,

    #[arg(long, env = "TEST_REGION", default_value = "UK")]
    pub region: String,

    #[arg(long, env = "TEST_ENV", value_enum, default_value_t = TestEnv::Qa)]
    pub environment: TestEnv,

    #[arg(long = "output-dir", default_value = "test-results/printbox")]
    pub output_dir: PathBuf,
}

#[derive(Parser, Debug, Clone)]
pub struct RunFlowsArgs {
    #[arg(long, env = "TEST_REGION", default_value = "UK")]
    pub region: String,

    #[arg(long, env = "TEST_ENV", value_enum, default_value_t = TestEnv::Qa)]
    pub environment: TestEnv,

    /// Credentials for the authentication flow (flow is skipped when absent)
    #[arg(long, env = "TEST_USER_EMAIL")]
    pub email: Option<String>,

    #[arg(long, env = "TEST_USER_PASSWORD")]
    pub password: Option<String>,

    /// Where to write the JSON flow report
    #[arg(long, default_value = FLOW_REPORT_FILE)]
    pub report: PathBuf,

    #[arg(long)]
    pub headed: bool,
}

// Port and scale defaults
pub const DEFAULT_DASHBOARD_PORT: u16 = 4000;
pub const DEFAULT_WORKER_COUNT: usize = 10;
pub const DEFAULT_CHUNK_COUNT: usize = 10;
pub const DEFAULT_TEST_DURATION_MINUTES: u64 = 30;

// Monitor loop timing
pub const PAGE_SETTLE_DELAY_MS: u64 = 2000;
pub const SELECTOR_WAIT_MS: u64 = 5000;
pub const URL_WAIT_MS: u64 = 10_000;
pub const CLICK_DELAY_MIN_MS: u64 = 200;
pub const CLICK_DELAY_MAX_MS: u64 = 500;

// Popup handling
pub const POPUP_TIMEOUT_MS: u64 = 5000;
pub const POPUP_RETRY_TIMEOUT_MS: u64 = 1500;
pub const OVERLAY_HIDDEN_WAIT_MS: u64 = 3000;
pub const POPUP_SETTLE_DELAY_MS: u64 = 500;

// Content validation thresholds
pub const MIN_BODY_TEXT_CHARS: usize = 100;
pub const MIN_PAGE_HEIGHT_PX: i64 = 600;

// Success-rate bands: below FAIL the run fails, between FAIL and WARN it
// passes with a warning.
pub const SUCCESS_RATE_FAIL_BELOW: f64 = 90.0;
pub const SUCCESS_RATE_WARN_BELOW: f64 = 95.0;

// Progress reporting
pub const RECENT_FAILURES_CAP: usize = 10;
pub const PROGRESS_POLL_INTERVAL_MS: u64 = 1000;

// Dashboard process control
pub const GRACEFUL_STOP_TIMEOUT_SECS: u64 = 10;
pub const JOB_TTL_HOURS: i64 = 24;
pub const JOB_SWEEP_INTERVAL_SECS: u64 = 3600;

// Artifact file names
pub const PROGRESS_FILE: &str = ".progress.json";
pub const STOP_SIGNAL_FILE: &str = ".stop-signal";
pub const SUMMARY_FILE: &str = "summary.json";
pub const COMBINED_REPORT_FILE: &str = "combined-summary.html";
pub const CHUNK_FILE_PREFIX: &str = "links-chunk-";
pub const CHUNK_MANIFEST_FILE: &str = "chunks-summary.json";
pub const FLOW_REPORT_FILE: &str = "flow-report.json";

pub const DEFAULT_VIEWPORT_WIDTH: u32 = 1366;
pub const DEFAULT_VIEWPORT_HEIGHT: u32 = 900;
