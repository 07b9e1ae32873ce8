use std::time::Duration;

use crate::browser::health::{assert_navigation_successful, assert_page_healthy};
use crate::browser::PageDriver;
use crate::config::{SELECTOR_WAIT_MS, URL_WAIT_MS};
use crate::error::StorewatchError;

pub const ADD_TO_CART_BUTTON: &str = "button[data-test='add-to-cart'], button.add-to-basket";
pub const CART_ITEM: &str = "[data-test='cart-item'], li.basket-item";
pub const CHECKOUT_BUTTON: &str = "button[data-test='checkout'], a.checkout-button";
pub const PAYMENT_SECTION: &str = "#payment-section, [data-test='payment-methods']";
pub const CONTACT_EMAIL_INPUT: &str = "input[name='contactEmail'], input#checkout-email";
pub const CART_BADGE: &str = "[data-test='cart-count'], span.basket-count";

/// Basket and checkout entry.
pub struct CartPage<'a> {
    driver: &'a mut dyn PageDriver,
    base_url: String,
}

impl<'a> CartPage<'a> {
    pub fn new(driver: &'a mut dyn PageDriver, base_url: String) -> Self {
        CartPage { driver, base_url }
    }

    pub async fn add_current_product(&mut self) -> Result<(), StorewatchError> {
        let visible = self
            .driver
            .is_visible(ADD_TO_CART_BUTTON, Duration::from_millis(SELECTOR_WAIT_MS))
            .await?;
        if !visible {
            return Err(StorewatchError::HealthCheck(
                "add-to-cart button not visible on product page".to_string(),
            ));
        }
        self.driver.click(ADD_TO_CART_BUTTON).await
    }

    pub async fn open_cart(&mut self) -> Result<(), StorewatchError> {
        self.driver.goto(&format!("{}/cart", self.base_url)).await?;
        assert_page_healthy(self.driver, "cart page").await?;
        let has_item = self
            .driver
            .is_visible(CART_ITEM, Duration::from_millis(SELECTOR_WAIT_MS))
            .await?;
        if !has_item {
            return Err(StorewatchError::HealthCheck(
                "cart is empty after adding a product".to_string(),
            ));
        }
        Ok(())
    }

    pub async fn proceed_to_checkout(&mut self) -> Result<(), StorewatchError> {
        self.driver.click(CHECKOUT_BUTTON).await?;
        assert_navigation_successful(self.driver, "checkout", "checkout page").await
    }

    /// Fill the guest contact email on the checkout page when the field is
    /// present. Some regions go straight to payment methods; skipping is
    /// not a failure.
    pub async fn fill_contact_email(&mut self, email: &str) -> Result<bool, StorewatchError> {
        let visible = self
            .driver
            .is_visible(CONTACT_EMAIL_INPUT, Duration::from_millis(SELECTOR_WAIT_MS))
            .await?;
        if !visible {
            return Ok(false);
        }
        self.driver.type_into(CONTACT_EMAIL_INPUT, email).await?;
        Ok(true)
    }

    /// Whether the payment method section has rendered. The checkout flow
    /// stops here; no payment is ever submitted.
    pub async fn payment_section_visible(&mut self) -> Result<bool, StorewatchError> {
        self.driver
            .is_visible(PAYMENT_SECTION, Duration::from_millis(URL_WAIT_MS))
            .await
    }
}
