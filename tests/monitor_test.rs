mod common;

use std::time::Duration;

use common::FakeDriver;
use storewatch::monitor::{run_monitor, MonitorConfig, MAIN_CONTENT_SELECTOR, PRODUCT_CARD_SELECTORS};
use storewatch::progress::{ProgressTracker, RunStatus};
use storewatch::region::TestEnv;

fn fast_config(duration: Duration, output_dir: std::path::PathBuf) -> MonitorConfig {
    let mut config = MonitorConfig::new(
        TestEnv::Qa,
        "https://qa.printshop.co.uk".to_string(),
        duration,
        output_dir,
    );
    config.settle_delay = Duration::from_millis(10);
    config.click_delay_ms = (0, 0);
    config.selector_wait = Duration::ZERO;
    config
}

fn healthy_driver() -> FakeDriver {
    FakeDriver::new()
        .with_visible(&[MAIN_CONTENT_SELECTOR])
        .with_existing(&[PRODUCT_CARD_SELECTORS[0]])
}

/// A page that renders a short blank shell: no main content, height just
/// above the minimum. Every attempt must fail on the visibility layer.
fn blank_page_driver() -> FakeDriver {
    let mut driver = FakeDriver::new();
    driver.height = 650;
    driver
}

#[tokio::test]
async fn blank_pages_fail_every_attempt() {
    let dir = tempfile::tempdir().unwrap();
    let tracker = ProgressTracker::new(dir.path());
    let config = fast_config(Duration::from_millis(300), dir.path().join("qa"));
    let mut driver = blank_page_driver();

    let summary = run_monitor(&mut driver, &tracker, &config).await.unwrap();

    assert!(summary.total_tested > 0);
    assert_eq!(summary.total_failed, summary.total_tested);
    assert_eq!(summary.success_rate, "0.0%");
    for failure in &summary.failures {
        assert_eq!(
            failure.error.as_deref(),
            Some("main content not visible"),
            "height 650 is above the minimum, so the visibility layer must fire first"
        );
    }

    // One failure log and one screenshot per attempt.
    let logs: Vec<_> = std::fs::read_dir(dir.path().join("qa").join("logs"))
        .unwrap()
        .collect();
    assert_eq!(logs.len(), summary.total_tested);
    let shots: Vec<_> = std::fs::read_dir(dir.path().join("qa").join("screenshots"))
        .unwrap()
        .collect();
    assert_eq!(shots.len(), summary.total_tested);

    let progress = tracker.read().unwrap();
    assert_eq!(progress.status, RunStatus::Completed);
    assert_eq!(progress.total_clicks as usize, summary.total_tested);
    assert_eq!(progress.failed_clicks, progress.total_clicks);
    assert_eq!(progress.current_link, None);
}

#[tokio::test]
async fn healthy_pages_all_pass() {
    let dir = tempfile::tempdir().unwrap();
    let tracker = ProgressTracker::new(dir.path());
    let config = fast_config(Duration::from_millis(200), dir.path().join("qa"));
    let mut driver = healthy_driver();

    let summary = run_monitor(&mut driver, &tracker, &config).await.unwrap();

    assert!(summary.total_tested > 0);
    assert_eq!(summary.total_failed, 0);
    assert_eq!(summary.success_rate, "100.0%");
    assert!(dir.path().join("qa").join("summary.json").exists());

    let progress = tracker.read().unwrap();
    assert_eq!(progress.successful_clicks, progress.total_clicks);
}

#[tokio::test]
async fn driver_errors_during_validation_fail_the_attempt_not_the_run() {
    let dir = tempfile::tempdir().unwrap();
    let tracker = ProgressTracker::new(dir.path());
    let config = fast_config(Duration::from_millis(200), dir.path().join("qa"));
    // Main content renders, but the product-card probe hits a browser error
    // on every attempt.
    let mut driver = FakeDriver::new()
        .with_visible(&[MAIN_CONTENT_SELECTOR])
        .with_erroring(&[PRODUCT_CARD_SELECTORS[0]]);

    let summary = run_monitor(&mut driver, &tracker, &config)
        .await
        .expect("the loop must absorb per-attempt driver errors");

    assert!(summary.total_tested > 0);
    assert_eq!(summary.total_failed, summary.total_tested);
    for failure in &summary.failures {
        assert!(
            failure
                .error
                .as_deref()
                .unwrap_or_default()
                .starts_with("validation failed:"),
            "unexpected failure reason: {:?}",
            failure.error
        );
    }
    assert!(dir.path().join("qa").join("summary.json").exists());
    assert_eq!(tracker.read().unwrap().status, RunStatus::Completed);
}

#[tokio::test]
async fn stop_signal_ends_the_run_early() {
    let dir = tempfile::tempdir().unwrap();
    let tracker = ProgressTracker::new(dir.path());
    // A full hour; only the stop signal can end this within the test.
    let config = fast_config(Duration::from_secs(3600), dir.path().join("qa"));
    let mut driver = healthy_driver();

    let stopper = ProgressTracker::new(dir.path());
    let stop_task = tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(200)).await;
        stopper.create_stop_signal().unwrap();
    });

    let summary = tokio::time::timeout(
        Duration::from_secs(30),
        run_monitor(&mut driver, &tracker, &config),
    )
    .await
    .expect("run should stop long before the timeout")
    .unwrap();

    stop_task.await.unwrap();
    assert!(summary.total_tested > 0);
    assert_eq!(tracker.read().unwrap().status, RunStatus::Stopped);
}
