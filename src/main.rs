mod batch;
mod browser;
mod config;
mod error;
mod flows;
mod links;
mod monitor;
mod pages;
mod progress;
mod region;
mod report;
mod results;
mod routes;
mod server;
mod state;
mod watcher;

use clap::Parser;
use std::time::Duration;
use tracing::{error, info, warn};

use config::{Cli, Command, MonitorArgs, RunBatchArgs, RunFlowsArgs, ServeArgs, SplitArgs};
use error::StorewatchError;
use progress::ProgressTracker;
use results::RateVerdict;
use state::{DashboardState, ServeConfig, SharedState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "storewatch=info,tower_http=info".into()),
        )
        .init();

    let cli = Cli::parse();
    info!("Starting storewatch v{}", env!("CARGO_PKG_VERSION"));

    match cli.command {
        Command::Serve(args) => serve(args).await,
        Command::JobServer(args) => job_server(args).await,
        Command::Monitor(args) => run_monitor_command(args).await,
        Command::Split(args) => split(args),
        Command::RunBatch(args) => run_batch(args).await,
        Command::RunChunk(args) => {
            let failed = batch::run_chunk(&args).await?;
            if failed > 0 {
                std::process::exit(1);
            }
            Ok(())
        }
        Command::RunFlows(args) => run_flows(args).await,
    }
}

async fn serve(args: ServeArgs) -> anyhow::Result<()> {
    let config = ServeConfig::from_args(&args);
    if region::by_code(&config.region).is_none() {
        error!("Unknown region: {}", config.region);
        std::process::exit(1);
    }
    let port = config.port;
    let state = DashboardState::new(config);

    watcher::spawn_progress_watcher(state.clone());

    let router = server::build_router(state.clone());
    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", port)).await?;
    info!("Dashboard listening on http://0.0.0.0:{}", port);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal(state.clone()))
        .await?;

    info!("Dashboard shutting down");
    stop_monitor_on_exit(&state).await;
    Ok(())
}

async fn job_server(args: ServeArgs) -> anyhow::Result<()> {
    let config = ServeConfig::from_args(&args);
    let port = config.port;
    let state = DashboardState::new(config);

    routes::jobs::spawn_job_sweeper(state.clone());

    let router = server::build_job_router(state.clone());
    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", port)).await?;
    info!("Job server listening on http://0.0.0.0:{}", port);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal(state.clone()))
        .await?;

    info!("Job server shutting down");
    Ok(())
}

async fn shutdown_signal(state: SharedState) {
    if tokio::signal::ctrl_c().await.is_err() {
        error!("Failed to install Ctrl+C handler");
        return;
    }
    info!("Received shutdown signal");
    let _ = state.shutdown_tx.send(());
}

/// A monitor child left running would keep writing progress after the
/// dashboard is gone; stop it the same way /api/stop-test does.
async fn stop_monitor_on_exit(state: &SharedState) {
    let child = {
        let mut monitor = state.monitor.write().await;
        if !monitor.running {
            return;
        }
        monitor.process.take()
    };
    let tracker = ProgressTracker::new(&state.config.data_dir);
    if let Err(e) = tracker.create_stop_signal() {
        warn!("could not write stop signal on shutdown: {}", e);
    }
    if let Some(mut child) = child {
        let graceful = tokio::time::timeout(
            Duration::from_secs(config::GRACEFUL_STOP_TIMEOUT_SECS),
            child.wait(),
        )
        .await;
        if graceful.is_err() {
            warn!("monitor ignored stop signal during shutdown, killing");
            let _ = child.kill().await;
        }
    }
    state.monitor.write().await.clear();
}

async fn run_monitor_command(args: MonitorArgs) -> anyhow::Result<()> {
    let region = region::by_code(&args.region)
        .ok_or_else(|| StorewatchError::UnknownRegion(args.region.clone()))?;
    let base_url = args
        .base_url
        .clone()
        .unwrap_or_else(|| region.base_url(args.environment));
    info!(
        "Monitor: {} {} against {} for {} minutes",
        region.code, args.environment, base_url, args.duration_minutes
    );

    // Progress and stop signal live at the output root; per-environment
    // artifacts in a subdirectory, matching the dashboard's layout.
    let tracker = ProgressTracker::new(&args.output_dir);
    let artifacts_dir = args.output_dir.join(args.environment.as_str());
    let monitor_config = monitor::MonitorConfig::new(
        args.environment,
        base_url,
        Duration::from_secs(args.duration_minutes * 60),
        artifacts_dir,
    );

    let session = browser::BrowserSession::launch(!args.headed).await?;
    let mut driver = session.new_driver().await?;
    let summary = monitor::run_monitor(&mut driver, &tracker, &monitor_config).await;
    drop(driver);
    session.close().await?;
    let summary = summary?;

    if let Some(path) = report::write_combined_report(&args.output_dir)? {
        info!("Combined report written to {:?}", path);
    }
    println!("{}", report::render_text_summary(&summary));

    match summary.verdict() {
        RateVerdict::Pass => {}
        RateVerdict::Warn => warn!(
            "success rate {} is below the warning threshold",
            summary.success_rate
        ),
        RateVerdict::Fail => {
            error!("success rate {} is below the failure threshold", summary.success_rate);
            std::process::exit(1);
        }
    }
    Ok(())
}

fn split(args: SplitArgs) -> anyhow::Result<()> {
    let manifest = batch::split_links(&args.input, &args.out_dir, args.chunks)?;
    println!(
        "Split {} links into {} chunks of up to {} in {}",
        manifest.total_links,
        manifest.chunk_count,
        manifest.chunk_size,
        args.out_dir.display()
    );
    for chunk in &manifest.chunks {
        println!(
            "  chunk {}: {} links ({}..={})",
            chunk.chunk_id, chunk.count, chunk.start_index, chunk.end_index
        );
    }
    Ok(())
}

async fn run_batch(args: RunBatchArgs) -> anyhow::Result<()> {
    if region::by_code(&args.region).is_none() {
        error!("Unknown region: {}", args.region);
        std::process::exit(1);
    }
    let outcomes = batch::run_batch(
        args.workers,
        &args.chunks_dir,
        &args.results_dir,
        &args.region,
        args.environment,
    )
    .await?;

    let mut any_failed = false;
    for outcome in &outcomes {
        let verdict = if outcome.skipped {
            "SKIP"
        } else if outcome.passed {
            "PASS"
        } else {
            any_failed = true;
            "FAIL"
        };
        println!(
            "worker {}: {} (log: {})",
            outcome.chunk_id, verdict, outcome.log_file
        );
    }
    if any_failed {
        std::process::exit(1);
    }
    Ok(())
}

async fn run_flows(args: RunFlowsArgs) -> anyhow::Result<()> {
    let region = region::by_code(&args.region)
        .ok_or_else(|| StorewatchError::UnknownRegion(args.region.clone()))?;
    let credentials = match (&args.email, &args.password) {
        (Some(email), Some(password)) => Some((email.as_str(), password.as_str())),
        _ => None,
    };

    let session = browser::BrowserSession::launch(!args.headed).await?;
    let mut driver = session.new_driver().await?;
    let report = flows::run_flow_suite(&mut driver, region, args.environment, credentials).await;
    drop(driver);
    session.close().await?;

    report.write(&args.report)?;
    println!("{}", report.render_text());
    if report.failed > 0 {
        std::process::exit(1);
    }
    Ok(())
}
