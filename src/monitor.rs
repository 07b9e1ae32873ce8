use chrono::Utc;
use rand::Rng;
use std::path::PathBuf;
use std::time::{Duration, Instant};
use tokio::time::sleep;
use tracing::{info, warn};

use crate::browser::popups::dismiss_all;
use crate::browser::PageDriver;
use crate::config::{
    CLICK_DELAY_MAX_MS, CLICK_DELAY_MIN_MS, DEFAULT_VIEWPORT_HEIGHT, DEFAULT_VIEWPORT_WIDTH,
    MIN_PAGE_HEIGHT_PX, PAGE_SETTLE_DELAY_MS, SELECTOR_WAIT_MS,
};
use crate::error::StorewatchError;
use crate::links::pick_random;
use crate::progress::{FailureEntry, ProgressTracker, RunStatus};
use crate::region::TestEnv;
use crate::report::{write_failure_log, write_summary};
use crate::results::{NavigationTestResult, TestSummary, Viewport};

/// Main content container present on every catalogue page.
pub const MAIN_CONTENT_SELECTOR: &str = "main#content, main[role='main']";

/// Any one of these marks a rendered product listing.
pub const PRODUCT_CARD_SELECTORS: &[&str] = &[
    "[data-test='product-card']",
    "div.product-grid .product-tile",
    "article.product-card",
];

/// Knobs for one monitor run. Timing fields exist so tests can run the
/// loop without real-world delays.
pub struct MonitorConfig {
    pub environment: TestEnv,
    pub base_url: String,
    pub duration: Duration,
    pub output_dir: PathBuf,
    pub viewport: Viewport,
    pub settle_delay: Duration,
    pub click_delay_ms: (u64, u64),
    pub selector_wait: Duration,
}

impl MonitorConfig {
    pub fn new(environment: TestEnv, base_url: String, duration: Duration, output_dir: PathBuf) -> Self {
        MonitorConfig {
            environment,
            base_url,
            duration,
            output_dir,
            viewport: Viewport {
                width: DEFAULT_VIEWPORT_WIDTH,
                height: DEFAULT_VIEWPORT_HEIGHT,
            },
            settle_delay: Duration::from_millis(PAGE_SETTLE_DELAY_MS),
            click_delay_ms: (CLICK_DELAY_MIN_MS, CLICK_DELAY_MAX_MS),
            selector_wait: Duration::from_millis(SELECTOR_WAIT_MS),
        }
    }
}

/// Random-walk navigation monitor: repeatedly pick a catalogue link, load
/// it, validate the rendered page, and record the outcome until the
/// duration elapses or a stop signal arrives.
pub async fn run_monitor(
    driver: &mut dyn PageDriver,
    tracker: &ProgressTracker,
    config: &MonitorConfig,
) -> Result<TestSummary, StorewatchError> {
    let duration_minutes = (config.duration.as_secs() + 59) / 60;
    tracker.init(config.environment.as_str(), duration_minutes)?;

    let started_at = Utc::now();
    if let Err(e) = setup(driver, config).await {
        // A homepage that will not load means nothing downstream can run.
        tracker.update(|d| d.status = RunStatus::Stopped)?;
        return Err(e);
    }

    let screenshots_dir = config.output_dir.join("screenshots");
    let logs_dir = config.output_dir.join("logs");
    let deadline = Utc::now() + chrono::Duration::from_std(config.duration).unwrap_or_default();

    let mut results: Vec<NavigationTestResult> = Vec::new();
    let mut stopped = false;

    while Utc::now() < deadline {
        let link = pick_random();
        let url = format!("{}{}", config.base_url, link.path);
        let index = results.len() + 1;

        tracker.update(|d| d.current_link = Some(link.name.to_string()))?;

        driver.take_page_state();
        let attempt_start = Instant::now();
        let mut result = NavigationTestResult {
            link_name: link.name.to_string(),
            link_url: url.clone(),
            timestamp: Utc::now(),
            passed: false,
            load_time_ms: 0,
            screenshot: None,
            page_state: Default::default(),
            viewport: config.viewport,
            page_height: 0,
            error: None,
        };

        // Prefer clicking the real nav anchor when the link carries a hint
        // and the anchor is present; fall back to direct navigation.
        let mut clicked_through = false;
        if let Some(hint) = link.selector_hint {
            if driver.exists(hint).await.unwrap_or(false) && driver.click(hint).await.is_ok() {
                clicked_through = driver
                    .wait_for_url_contains(link.path, config.selector_wait)
                    .await
                    .unwrap_or(false);
            }
        }
        let navigated = if clicked_through {
            Ok(())
        } else {
            driver.goto(&url).await
        };

        match navigated {
            Ok(()) => {
                sleep(config.settle_delay).await;
                result.page_height = driver.scroll_height().await.unwrap_or(0);
                // A driver hiccup during validation is this attempt's
                // failure, not the run's.
                result.error = match validate_page(driver, config, result.page_height).await {
                    Ok(reason) => reason,
                    Err(e) => Some(format!("validation failed: {e}")),
                };
                result.passed = result.error.is_none();
            }
            Err(e) => {
                result.error = Some(format!("navigation failed: {e}"));
            }
        }

        result.load_time_ms = attempt_start.elapsed().as_millis() as u64;
        result.page_state = driver.take_page_state();

        if !result.passed {
            let shot = screenshots_dir.join(format!("{:04}-{}.png", index, slug(link.name)));
            if let Some(parent) = shot.parent() {
                let _ = std::fs::create_dir_all(parent);
            }
            match driver.screenshot(&shot).await {
                Ok(()) => result.screenshot = Some(shot.to_string_lossy().to_string()),
                Err(e) => warn!("screenshot failed for {}: {}", link.name, e),
            }
            if let Err(e) = write_failure_log(&logs_dir, index, &result) {
                warn!("failure log write failed: {}", e);
            }
            tracker.add_failure(FailureEntry {
                link_name: link.name.to_string(),
                url: url.clone(),
                timestamp: result.timestamp,
                reason: result.error.clone().unwrap_or_default(),
            })?;
        }

        let passed = result.passed;
        tracker.update(|d| {
            d.total_clicks += 1;
            if passed {
                d.successful_clicks += 1;
            } else {
                d.failed_clicks += 1;
            }
        })?;
        results.push(result);

        if tracker.should_stop() {
            info!("stop signal received, ending run after {} attempts", results.len());
            stopped = true;
            break;
        }

        let (min, max) = config.click_delay_ms;
        if max > min {
            let pause = rand::thread_rng().gen_range(min..=max);
            sleep(Duration::from_millis(pause)).await;
        }
    }

    let final_status = if stopped {
        RunStatus::Stopped
    } else {
        RunStatus::Completed
    };
    tracker.update(|d| {
        d.status = final_status;
        d.current_link = None;
    })?;

    let summary = TestSummary::from_results(config.environment.as_str(), started_at, results);
    write_summary(&config.output_dir, &summary)?;
    info!(
        "monitor run {}: {} tested, {} failed, success rate {}",
        if stopped { "stopped" } else { "completed" },
        summary.total_tested,
        summary.total_failed,
        summary.success_rate
    );
    Ok(summary)
}

/// Load the homepage once and clear the overlays before the walk starts.
async fn setup(driver: &mut dyn PageDriver, config: &MonitorConfig) -> Result<(), StorewatchError> {
    driver.goto(&config.base_url).await?;
    sleep(config.settle_delay).await;
    dismiss_all(driver).await;
    Ok(())
}

/// Three-layer page validation. Returns the failure reason, or `None` when
/// the page passes all layers.
async fn validate_page(
    driver: &mut dyn PageDriver,
    config: &MonitorConfig,
    page_height: i64,
) -> Result<Option<String>, StorewatchError> {
    if !driver
        .is_visible(MAIN_CONTENT_SELECTOR, config.selector_wait)
        .await?
    {
        return Ok(Some("main content not visible".to_string()));
    }

    if page_height < MIN_PAGE_HEIGHT_PX {
        return Ok(Some(format!(
            "page height {page_height}px below minimum {MIN_PAGE_HEIGHT_PX}px"
        )));
    }

    for selector in PRODUCT_CARD_SELECTORS {
        if driver.exists(selector).await? {
            return Ok(None);
        }
    }
    Ok(Some("no product cards found".to_string()))
}

fn slug(name: &str) -> String {
    name.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() {
                c.to_ascii_lowercase()
            } else {
                '-'
            }
        })
        .collect()
}
