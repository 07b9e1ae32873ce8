use std::time::Duration;

use crate::browser::health::assert_page_healthy;
use crate::browser::PageDriver;
use crate::config::{SELECTOR_WAIT_MS, URL_WAIT_MS};
use crate::error::StorewatchError;
use crate::region::RegionConfig;

pub const FIRST_NAME_INPUT: &str = "input[name='firstName'], input#register-first-name";
pub const LAST_NAME_INPUT: &str = "input[name='lastName'], input#register-last-name";
pub const EMAIL_INPUT: &str = "input[name='registerEmail'], input#register-email";
pub const PASSWORD_INPUT: &str = "input[name='registerPassword'], input#register-password";
pub const SUBMIT_BUTTON: &str = "form.register button[type='submit'], button[data-test='register-submit']";

/// Account registration page.
pub struct RegisterPage<'a> {
    driver: &'a mut dyn PageDriver,
    region: &'static RegionConfig,
    base_url: String,
}

impl<'a> RegisterPage<'a> {
    pub fn new(
        driver: &'a mut dyn PageDriver,
        region: &'static RegionConfig,
        base_url: String,
    ) -> Self {
        RegisterPage {
            driver,
            region,
            base_url,
        }
    }

    pub async fn open(&mut self) -> Result<(), StorewatchError> {
        self.driver
            .goto(&format!("{}/register", self.base_url))
            .await?;
        assert_page_healthy(self.driver, "register page").await?;
        let visible = self
            .driver
            .is_visible(EMAIL_INPUT, Duration::from_millis(SELECTOR_WAIT_MS))
            .await?;
        if !visible {
            return Err(StorewatchError::HealthCheck(
                "registration form did not appear".to_string(),
            ));
        }
        Ok(())
    }

    /// Create an account and verify the localized greeting on arrival.
    pub async fn register(
        &mut self,
        first_name: &str,
        last_name: &str,
        email: &str,
        password: &str,
    ) -> Result<(), StorewatchError> {
        self.driver.type_into(FIRST_NAME_INPUT, first_name).await?;
        self.driver.type_into(LAST_NAME_INPUT, last_name).await?;
        self.driver.type_into(EMAIL_INPUT, email).await?;
        self.driver.type_into(PASSWORD_INPUT, password).await?;
        self.driver.click(SUBMIT_BUTTON).await?;

        let arrived = self
            .driver
            .wait_for_url_contains("/account", Duration::from_millis(URL_WAIT_MS))
            .await?;
        if !arrived {
            let url = self.driver.current_url().await.unwrap_or_default();
            return Err(StorewatchError::Timeout(format!(
                "registration: account page not reached, still at '{url}'"
            )));
        }

        let body = self.driver.body_text().await?;
        if body.contains(self.region.strings.greeting) {
            Ok(())
        } else {
            Err(StorewatchError::HealthCheck(format!(
                "greeting '{}' not found after registration",
                self.region.strings.greeting
            )))
        }
    }
}
