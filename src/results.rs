use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::config::{SUCCESS_RATE_FAIL_BELOW, SUCCESS_RATE_WARN_BELOW};

/// Per-navigation-attempt event bags, drained from the driver at the end of
/// each attempt.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageState {
    pub failed_requests: Vec<FailedRequest>,
    pub console_errors: Vec<String>,
    pub page_errors: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FailedRequest {
    pub url: String,
    pub status: i64,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

/// Outcome of a single monitor navigation attempt. Append-only: never
/// mutated after creation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NavigationTestResult {
    pub link_name: String,
    pub link_url: String,
    pub timestamp: DateTime<Utc>,
    pub passed: bool,
    pub load_time_ms: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub screenshot: Option<String>,
    pub page_state: PageState,
    pub viewport: Viewport,
    pub page_height: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Aggregate over one monitor run, recomputed from the result list and
/// written once per run.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestSummary {
    pub environment: String,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub total_tested: usize,
    pub total_passed: usize,
    pub total_failed: usize,
    pub success_rate: String,
    pub failures: Vec<NavigationTestResult>,
    pub results: Vec<NavigationTestResult>,
}

impl TestSummary {
    pub fn from_results(
        environment: impl Into<String>,
        started_at: DateTime<Utc>,
        results: Vec<NavigationTestResult>,
    ) -> Self {
        let total_tested = results.len();
        let total_passed = results.iter().filter(|r| r.passed).count();
        let total_failed = total_tested - total_passed;
        let failures = results.iter().filter(|r| !r.passed).cloned().collect();

        TestSummary {
            environment: environment.into(),
            started_at,
            finished_at: Utc::now(),
            total_tested,
            total_passed,
            total_failed,
            success_rate: format_success_rate(total_passed, total_tested),
            failures,
            results,
        }
    }

    pub fn success_rate_value(&self) -> f64 {
        if self.total_tested == 0 {
            0.0
        } else {
            self.total_passed as f64 * 100.0 / self.total_tested as f64
        }
    }

    pub fn verdict(&self) -> RateVerdict {
        evaluate_success_rate(self.success_rate_value())
    }
}

/// Format a pass/total ratio as the dashboard's percent string, one decimal
/// place with a `%` suffix.
pub fn format_success_rate(passed: usize, total: usize) -> String {
    if total == 0 {
        "0.0%".to_string()
    } else {
        format!("{:.1}%", passed as f64 * 100.0 / total as f64)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateVerdict {
    Pass,
    /// Passes, but the rate sits in the warning band.
    Warn,
    Fail,
}

pub fn evaluate_success_rate(rate: f64) -> RateVerdict {
    if rate < SUCCESS_RATE_FAIL_BELOW {
        RateVerdict::Fail
    } else if rate < SUCCESS_RATE_WARN_BELOW {
        RateVerdict::Warn
    } else {
        RateVerdict::Pass
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(name: &str, passed: bool) -> NavigationTestResult {
        NavigationTestResult {
            link_name: name.to_string(),
            link_url: format!("/{}", name),
            timestamp: Utc::now(),
            passed,
            load_time_ms: 120,
            screenshot: None,
            page_state: PageState::default(),
            viewport: Viewport {
                width: 1366,
                height: 900,
            },
            page_height: 2400,
            error: if passed {
                None
            } else {
                Some("main content not visible".to_string())
            },
        }
    }

    #[test]
    fn summary_counts_add_up() {
        let results = vec![
            result("a", true),
            result("b", false),
            result("c", true),
            result("d", false),
            result("e", true),
        ];
        let summary = TestSummary::from_results("qa", Utc::now(), results);
        assert_eq!(summary.total_tested, 5);
        assert_eq!(summary.total_passed + summary.total_failed, summary.total_tested);
        assert_eq!(summary.failures.len(), 2);
        assert_eq!(summary.success_rate, "60.0%");
    }

    #[test]
    fn summary_of_empty_run() {
        let summary = TestSummary::from_results("qa", Utc::now(), vec![]);
        assert_eq!(summary.total_tested, 0);
        assert_eq!(summary.success_rate, "0.0%");
    }

    #[test]
    fn rate_is_bounded() {
        let all_pass = TestSummary::from_results("qa", Utc::now(), vec![result("a", true)]);
        assert_eq!(all_pass.success_rate, "100.0%");
        let all_fail = TestSummary::from_results("qa", Utc::now(), vec![result("a", false)]);
        assert_eq!(all_fail.success_rate, "0.0%");
        assert!(all_pass.success_rate_value() <= 100.0);
        assert!(all_fail.success_rate_value() >= 0.0);
    }

    #[test]
    fn verdict_bands() {
        assert_eq!(evaluate_success_rate(100.0), RateVerdict::Pass);
        assert_eq!(evaluate_success_rate(95.0), RateVerdict::Pass);
        assert_eq!(evaluate_success_rate(94.9), RateVerdict::Warn);
        assert_eq!(evaluate_success_rate(90.0), RateVerdict::Warn);
        assert_eq!(evaluate_success_rate(89.9), RateVerdict::Fail);
        assert_eq!(evaluate_success_rate(0.0), RateVerdict::Fail);
    }

    #[test]
    fn rate_formatting_rounds_to_one_decimal() {
        assert_eq!(format_success_rate(1, 3), "33.3%");
        assert_eq!(format_success_rate(2, 3), "66.7%");
        assert_eq!(format_success_rate(0, 0), "0.0%");
    }
}
