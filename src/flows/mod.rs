//! End-to-end flows composed from the page objects. Each flow returns a
//! checkpoint record; errors along the way are captured as data so a suite
//! can keep going after one flow fails.

pub mod auth;
pub mod checkout;
pub mod checkpoint;
pub mod designer;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fs;
use std::path::Path;
use tracing::{info, warn};

use crate::browser::PageDriver;
use crate::error::StorewatchError;
use crate::flows::checkpoint::FlowError;
use crate::region::{RegionConfig, TestEnv};

pub use auth::{run_auth_flow, AuthFlowResult};
pub use checkout::{run_checkout_flow, CartCheckoutTestResult};
pub use designer::{
    run_photo_books_flow, run_printbox_flow, PhotoBooksTestResult, PrintboxTestResult,
};

/// Product path used by the checkout and designer flows when none is given.
const DEFAULT_PRODUCT_PATH: &str = "/photo-books/classic-photo-book";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlowCase {
    pub name: String,
    pub region: String,
    pub environment: TestEnv,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<FlowError>,
    pub details: Value,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlowReport {
    pub region: String,
    pub environment: TestEnv,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
    pub cases: Vec<FlowCase>,
}

impl FlowReport {
    pub fn write(&self, path: &Path) -> Result<(), StorewatchError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, serde_json::to_vec_pretty(self)?)?;
        Ok(())
    }

    pub fn render_text(&self) -> String {
        let mut out = format!(
            "Flow suite: {} / {} — {} passed, {} failed ({} total)\n",
            self.region, self.environment, self.passed, self.failed, self.total
        );
        for case in &self.cases {
            let marker = if case.success { "PASS" } else { "FAIL" };
            out.push_str(&format!("  [{}] {}", marker, case.name));
            if let Some(err) = &case.error {
                out.push_str(&format!(" — {} at {}", err.message, err.checkpoint));
            }
            out.push('\n');
        }
        out
    }
}

/// Run every flow for one region and environment on a single page. The
/// auth flow needs credentials and is skipped without them.
pub async fn run_flow_suite(
    driver: &mut dyn PageDriver,
    region: &'static RegionConfig,
    environment: TestEnv,
    credentials: Option<(&str, &str)>,
) -> FlowReport {
    let started_at = Utc::now();
    let base_url = region.base_url(environment);
    let mut cases = Vec::new();

    match credentials {
        Some((email, password)) => {
            let result = run_auth_flow(driver, region, &base_url, email, password).await;
            cases.push(case("auth", region, environment, result.success, result.error.clone(), &result));
        }
        None => {
            warn!("no test credentials configured, skipping auth flow");
        }
    }

    let result = run_checkout_flow(driver, &base_url, DEFAULT_PRODUCT_PATH).await;
    cases.push(case(
        "cart-checkout",
        region,
        environment,
        result.success,
        result.error.clone(),
        &result,
    ));

    let result = run_photo_books_flow(driver, &base_url).await;
    cases.push(case(
        "photo-books",
        region,
        environment,
        result.success,
        result.error.clone(),
        &result,
    ));

    let product_url = format!("{base_url}{DEFAULT_PRODUCT_PATH}");
    let result = run_printbox_flow(driver, &product_url).await;
    cases.push(case(
        "designer",
        region,
        environment,
        result.success,
        result.error.clone(),
        &result,
    ));

    let passed = cases.iter().filter(|c| c.success).count();
    let report = FlowReport {
        region: region.code.to_string(),
        environment,
        started_at,
        finished_at: Utc::now(),
        total: cases.len(),
        passed,
        failed: cases.len() - passed,
        cases,
    };
    info!(
        "flow suite finished: {}/{} passed for {} {}",
        report.passed, report.total, report.region, report.environment
    );
    report
}

fn case<T: Serialize>(
    name: &str,
    region: &RegionConfig,
    environment: TestEnv,
    success: bool,
    error: Option<FlowError>,
    details: &T,
) -> FlowCase {
    FlowCase {
        name: name.to_string(),
        region: region.code.to_string(),
        environment,
        success,
        error,
        details: serde_json::to_value(details).unwrap_or(Value::Null),
    }
}
