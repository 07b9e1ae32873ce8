use std::time::Duration;
use tokio::time::{sleep, Instant};
use tracing::debug;

use crate::browser::PageDriver;
use crate::config::{OVERLAY_HIDDEN_WAIT_MS, POPUP_SETTLE_DELAY_MS, POPUP_TIMEOUT_MS};

/// Marketing signup overlay. The container appears a few seconds after
/// page load, so callers pass a generous timeout on first load and a
/// short one on retries.
const NEWSLETTER_OVERLAY: &str = "div[role='dialog'][aria-label*='newsletter' i], div.kl-private-reset-css-Xuajs1";

const NEWSLETTER_CLOSE_BUTTONS: &[&str] = &[
    "button[aria-label='Close dialog']",
    "button[aria-label='Close']",
    "div[role='dialog'] button.close",
    "div[role='dialog'] svg[aria-label='Close']",
];

const COOKIE_OVERLAY: &str = "#onetrust-banner-sdk, div.cookie-consent-banner";

const COOKIE_ACCEPT_BUTTONS: &[&str] = &[
    "#onetrust-accept-btn-handler",
    "button#accept-all-cookies",
    "div.cookie-consent-banner button.accept",
];

/// Close the newsletter signup popup if it shows up within `timeout`.
/// Best effort: a popup that never appears, or one that resists closing,
/// must not fail the navigation being tested.
pub async fn dismiss_newsletter_popup(driver: &mut dyn PageDriver, timeout: Duration) {
    dismiss_overlay(driver, NEWSLETTER_OVERLAY, NEWSLETTER_CLOSE_BUTTONS, timeout).await;
}

/// Accept the cookie consent banner if present.
pub async fn dismiss_cookie_consent(driver: &mut dyn PageDriver, timeout: Duration) {
    dismiss_overlay(driver, COOKIE_OVERLAY, COOKIE_ACCEPT_BUTTONS, timeout).await;
}

/// Dismiss both overlays with the standard first-load timeout.
pub async fn dismiss_all(driver: &mut dyn PageDriver) {
    let timeout = Duration::from_millis(POPUP_TIMEOUT_MS);
    dismiss_cookie_consent(driver, timeout).await;
    dismiss_newsletter_popup(driver, timeout).await;
}

async fn dismiss_overlay(
    driver: &mut dyn PageDriver,
    overlay: &str,
    close_buttons: &[&str],
    timeout: Duration,
) {
    let appeared = match driver.is_visible(overlay, timeout).await {
        Ok(v) => v,
        Err(e) => {
            debug!("overlay probe failed: {}", e);
            return;
        }
    };
    if !appeared {
        return;
    }

    for button in close_buttons {
        let present = driver.exists(button).await.unwrap_or(false);
        if !present {
            continue;
        }
        if driver.click(button).await.is_ok() {
            sleep(Duration::from_millis(POPUP_SETTLE_DELAY_MS)).await;
            if wait_hidden(driver, overlay).await {
                return;
            }
        }
    }

    // No close button worked; Escape closes most dialog implementations.
    if driver.press_escape().await.is_ok() {
        sleep(Duration::from_millis(POPUP_SETTLE_DELAY_MS)).await;
        if wait_hidden(driver, overlay).await {
            return;
        }
    }
    debug!("overlay '{}' still visible after dismissal attempts", overlay);
}

/// Poll until the overlay is no longer visible. Returns false on timeout.
async fn wait_hidden(driver: &mut dyn PageDriver, overlay: &str) -> bool {
    let deadline = Instant::now() + Duration::from_millis(OVERLAY_HIDDEN_WAIT_MS);
    loop {
        match driver.is_visible(overlay, Duration::ZERO).await {
            Ok(false) => return true,
            Err(_) => return true,
            Ok(true) => {}
        }
        if Instant::now() >= deadline {
            return false;
        }
        sleep(Duration::from_millis(250)).await;
    }
}
