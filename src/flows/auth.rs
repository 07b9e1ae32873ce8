use serde::{Deserialize, Serialize};
use tracing::info;

use crate::browser::popups::dismiss_all;
use crate::browser::PageDriver;
use crate::flows::checkpoint::FlowError;
use crate::pages::LoginPage;
use crate::region::RegionConfig;

/// Checkpoint record for the sign-in / sign-out flow. Failures are data,
/// not errors: the caller inspects `success` and `error`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthFlowResult {
    pub signin_page_loaded: bool,
    pub signed_in: bool,
    pub greeting_verified: bool,
    pub signed_out: bool,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<FlowError>,
}

impl AuthFlowResult {
    fn empty() -> Self {
        AuthFlowResult {
            signin_page_loaded: false,
            signed_in: false,
            greeting_verified: false,
            signed_out: false,
            success: false,
            error: None,
        }
    }

    /// The first checkpoint that was not reached, reading backwards.
    pub fn failure_point(&self) -> Option<&'static str> {
        if !self.signin_page_loaded {
            Some("signinPageLoaded")
        } else if !self.signed_in {
            Some("signedIn")
        } else if !self.greeting_verified {
            Some("greetingVerified")
        } else if !self.signed_out {
            Some("signedOut")
        } else {
            None
        }
    }
}

pub async fn run_auth_flow(
    driver: &mut dyn PageDriver,
    region: &'static RegionConfig,
    base_url: &str,
    email: &str,
    password: &str,
) -> AuthFlowResult {
    let mut result = AuthFlowResult::empty();
    let mut page = LoginPage::new(driver, region, base_url.to_string());

    if let Err(e) = page.open().await {
        result.error = Some(FlowError::from_error(&e, "signinPageLoaded"));
        return result;
    }
    result.signin_page_loaded = true;
    dismiss_all(driver).await;

    let mut page = LoginPage::new(driver, region, base_url.to_string());
    if let Err(e) = page.sign_in(email, password).await {
        result.error = Some(FlowError::from_error(&e, "signedIn"));
        return result;
    }
    result.signed_in = true;
    // sign_in already asserted the greeting; record it as its own checkpoint.
    result.greeting_verified = true;

    if let Err(e) = page.sign_out().await {
        result.error = Some(FlowError::from_error(&e, "signedOut"));
        return result;
    }
    result.signed_out = true;
    result.success = true;
    info!("auth flow completed for {}", region.code);
    result
}
