use chrono::Utc;
use storewatch::progress::{FailureEntry, ProgressTracker, RunStatus};

fn failure(n: usize) -> FailureEntry {
    FailureEntry {
        link_name: format!("Link {n}"),
        url: format!("/link-{n}"),
        timestamp: Utc::now(),
        reason: "main content not visible".to_string(),
    }
}

#[test]
fn init_writes_a_running_snapshot() {
    let dir = tempfile::tempdir().unwrap();
    let tracker = ProgressTracker::new(dir.path());

    let data = tracker.init("qa", 5).unwrap();
    assert_eq!(data.status, RunStatus::Running);
    assert_eq!(data.duration_secs, 300);
    assert_eq!(data.remaining_secs, 300);
    assert_eq!(data.elapsed_secs, 0);

    let reread = tracker.read().unwrap();
    assert_eq!(reread.environment, "qa");
    assert_eq!(reread.duration_secs, 300);
}

#[test]
fn update_keeps_the_clock_invariant() {
    let dir = tempfile::tempdir().unwrap();
    let tracker = ProgressTracker::new(dir.path());
    tracker.init("qa", 5).unwrap();

    let data = tracker
        .update(|d| {
            d.total_clicks = 10;
            d.successful_clicks = 7;
            d.failed_clicks = 3;
        })
        .unwrap();

    assert_eq!(data.elapsed_secs + data.remaining_secs, data.duration_secs);
    assert_eq!(
        data.successful_clicks + data.failed_clicks,
        data.total_clicks
    );
    assert_eq!(data.success_rate, "70.0%");
}

#[test]
fn recent_failures_ring_keeps_newest_ten() {
    let dir = tempfile::tempdir().unwrap();
    let tracker = ProgressTracker::new(dir.path());
    tracker.init("qa", 5).unwrap();

    for n in 1..=13 {
        tracker.add_failure(failure(n)).unwrap();
    }

    let data = tracker.read().unwrap();
    assert_eq!(data.recent_failures.len(), 10);
    assert_eq!(data.recent_failures[0].link_name, "Link 13");
    assert_eq!(data.recent_failures[9].link_name, "Link 4");
}

#[test]
fn stop_signal_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let tracker = ProgressTracker::new(dir.path());
    tracker.init("qa", 5).unwrap();
    assert!(!tracker.should_stop());

    tracker.create_stop_signal().unwrap();
    assert!(tracker.should_stop());
    assert!(tracker.read().unwrap().should_stop);

    tracker.clear_stop_signal().unwrap();
    // The in-file flag still holds until the next init resets it.
    assert!(tracker.should_stop());

    tracker.init("qa", 5).unwrap();
    assert!(!tracker.should_stop());
}

#[test]
fn stop_signal_works_without_a_progress_file() {
    let dir = tempfile::tempdir().unwrap();
    let tracker = ProgressTracker::new(dir.path());

    tracker.create_stop_signal().unwrap();
    assert!(tracker.should_stop());
}
