use std::time::Duration;
use tracing::debug;

use crate::browser::health::{assert_navigation_successful, assert_page_healthy};
use crate::browser::popups::dismiss_newsletter_popup;
use crate::browser::PageDriver;
use crate::config::{POPUP_RETRY_TIMEOUT_MS, SELECTOR_WAIT_MS, URL_WAIT_MS};
use crate::error::StorewatchError;
use crate::region::RegionConfig;

pub const EMAIL_INPUT: &str = "input[name='loginEmail'], input#login-email";
pub const PASSWORD_INPUT: &str = "input[name='loginPassword'], input#login-password";
pub const SUBMIT_BUTTON: &str = "button[type='submit'][data-test='login-submit'], form.login button[type='submit']";
pub const FORGOT_PASSWORD_LINK: &str = "a[href*='forgot-password']";
pub const RESET_EMAIL_INPUT: &str = "input[name='resetEmail'], input#reset-email";
pub const RESET_SUBMIT_BUTTON: &str = "form.forgot-password button[type='submit']";
pub const ACCOUNT_MENU: &str = "[data-test='account-menu'], a[href*='/account']";
pub const SIGN_OUT_LINK: &str = "a[href*='logout'], [data-test='sign-out']";

/// Account sign-in page.
pub struct LoginPage<'a> {
    driver: &'a mut dyn PageDriver,
    region: &'static RegionConfig,
    base_url: String,
}

impl<'a> LoginPage<'a> {
    pub fn new(
        driver: &'a mut dyn PageDriver,
        region: &'static RegionConfig,
        base_url: String,
    ) -> Self {
        LoginPage {
            driver,
            region,
            base_url,
        }
    }

    pub async fn open(&mut self) -> Result<(), StorewatchError> {
        self.driver.goto(&format!("{}/login", self.base_url)).await?;
        assert_page_healthy(self.driver, "login page").await?;
        let visible = self
            .driver
            .is_visible(EMAIL_INPUT, Duration::from_millis(SELECTOR_WAIT_MS))
            .await?;
        if !visible {
            return Err(StorewatchError::HealthCheck(
                "login form did not appear".to_string(),
            ));
        }
        Ok(())
    }

    /// Submit credentials and verify the localized greeting. A newsletter
    /// popup re-appearing over the form gets one dismiss-and-retry.
    pub async fn sign_in(&mut self, email: &str, password: &str) -> Result<(), StorewatchError> {
        self.driver.type_into(EMAIL_INPUT, email).await?;
        self.driver.type_into(PASSWORD_INPUT, password).await?;

        if let Err(first) = self.driver.click(SUBMIT_BUTTON).await {
            debug!("login submit click failed, retrying after popup dismissal: {}", first);
            dismiss_newsletter_popup(
                self.driver,
                Duration::from_millis(POPUP_RETRY_TIMEOUT_MS),
            )
            .await;
            self.driver.click(SUBMIT_BUTTON).await?;
        }

        let arrived = self
            .driver
            .wait_for_url_contains("/account", Duration::from_millis(URL_WAIT_MS))
            .await?;
        if !arrived {
            let body = self.driver.body_text().await?;
            if body.contains(self.region.strings.invalid_credentials) {
                return Err(StorewatchError::InvalidInput(
                    "sign-in rejected: invalid credentials".to_string(),
                ));
            }
            let url = self.driver.current_url().await.unwrap_or_default();
            return Err(StorewatchError::Timeout(format!(
                "sign-in: account page not reached, still at '{url}'"
            )));
        }
        self.verify_greeting().await
    }

    /// The account page greets with a localized string ("Hello", "Hallo", ...).
    pub async fn verify_greeting(&mut self) -> Result<(), StorewatchError> {
        let body = self.driver.body_text().await?;
        if body.contains(self.region.strings.greeting) {
            Ok(())
        } else {
            Err(StorewatchError::HealthCheck(format!(
                "greeting '{}' not found on account page",
                self.region.strings.greeting
            )))
        }
    }

    pub async fn sign_out(&mut self) -> Result<(), StorewatchError> {
        if self
            .driver
            .is_visible(ACCOUNT_MENU, Duration::from_millis(SELECTOR_WAIT_MS))
            .await?
        {
            self.driver.click(ACCOUNT_MENU).await?;
        }
        self.driver.click(SIGN_OUT_LINK).await?;
        let signed_out = self
            .driver
            .wait_for_url_contains("/login", Duration::from_millis(URL_WAIT_MS))
            .await?;
        if signed_out {
            Ok(())
        } else {
            Err(StorewatchError::Timeout(
                "sign-out did not return to the login page".to_string(),
            ))
        }
    }

    /// Request a password reset email for `email`.
    pub async fn forgot_password(&mut self, email: &str) -> Result<(), StorewatchError> {
        self.driver.click(FORGOT_PASSWORD_LINK).await?;
        assert_navigation_successful(self.driver, "forgot-password", "forgot-password page")
            .await?;
        self.driver.type_into(RESET_EMAIL_INPUT, email).await?;
        self.driver.click(RESET_SUBMIT_BUTTON).await?;
        Ok(())
    }
}
