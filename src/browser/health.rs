use std::time::Duration;

use crate::browser::PageDriver;
use crate::config::{MIN_BODY_TEXT_CHARS, URL_WAIT_MS};
use crate::error::StorewatchError;

/// Substrings that mark a rendered error page rather than real content.
const ERROR_PHRASES: &[&str] = &[
    "404",
    "page not found",
    "something went wrong",
    "internal server error",
    "service unavailable",
    "access denied",
];

const ERROR_TITLE_MARKERS: &[&str] = &["404", "error", "not found"];

/// Check the body text of a rendered page. Returns a reason when the page
/// looks broken, `None` when it looks healthy.
pub fn check_body_text(body: &str) -> Option<String> {
    let trimmed = body.trim();
    if trimmed.len() < MIN_BODY_TEXT_CHARS {
        return Some(format!(
            "body text too short ({} chars, need at least {})",
            trimmed.len(),
            MIN_BODY_TEXT_CHARS
        ));
    }
    let lower = trimmed.to_lowercase();
    for phrase in ERROR_PHRASES {
        if lower.contains(phrase) {
            return Some(format!("body contains error phrase '{phrase}'"));
        }
    }
    None
}

/// Check the document title for error markers.
pub fn check_title(title: &str) -> Option<String> {
    let lower = title.to_lowercase();
    for marker in ERROR_TITLE_MARKERS {
        if lower.contains(marker) {
            return Some(format!("title '{title}' contains '{marker}'"));
        }
    }
    None
}

/// Fail with a `HealthCheck` error when the current page looks like an
/// error page. `context` names the step for the error message.
pub async fn assert_page_healthy(
    driver: &mut dyn PageDriver,
    context: &str,
) -> Result<(), StorewatchError> {
    let body = driver.body_text().await?;
    let title = driver.title().await?;
    if let Some(reason) = check_body_text(&body).or_else(|| check_title(&title)) {
        let url = driver.current_url().await.unwrap_or_default();
        return Err(StorewatchError::HealthCheck(format!(
            "{context} at {url}: {reason}"
        )));
    }
    Ok(())
}

/// Wait for the URL to reach the expected page, then run the health check.
pub async fn assert_navigation_successful(
    driver: &mut dyn PageDriver,
    url_fragment: &str,
    context: &str,
) -> Result<(), StorewatchError> {
    let arrived = driver
        .wait_for_url_contains(url_fragment, Duration::from_millis(URL_WAIT_MS))
        .await?;
    if !arrived {
        let actual = driver.current_url().await.unwrap_or_default();
        return Err(StorewatchError::Timeout(format!(
            "{context}: expected URL containing '{url_fragment}', still at '{actual}'"
        )));
    }
    assert_page_healthy(driver, context).await
}
