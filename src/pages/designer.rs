use std::time::Duration;

use crate::browser::health::assert_page_healthy;
use crate::browser::PageDriver;
use crate::config::{SELECTOR_WAIT_MS, URL_WAIT_MS};
use crate::error::StorewatchError;

pub const CREATE_BUTTON: &str = "button[data-test='start-designing'], a.start-designing";
pub const LISTING_PRODUCT_TILE: &str = "[data-test='product-card'] a, div.product-grid .product-tile a";
pub const THEME_TILE: &str = "[data-test='theme-tile'], div.theme-grid .theme-tile";
pub const EDITOR_CANVAS: &str = "#printbox-editor canvas, [data-test='editor-canvas']";
pub const EDITOR_TOOLBAR: &str = "[data-test='editor-toolbar'], div.editor-toolbar";

/// Product page and the embedded print-product designer.
pub struct DesignerPage<'a> {
    driver: &'a mut dyn PageDriver,
}

impl<'a> DesignerPage<'a> {
    pub fn new(driver: &'a mut dyn PageDriver) -> Self {
        DesignerPage { driver }
    }

    pub async fn open_product(&mut self, url: &str) -> Result<(), StorewatchError> {
        self.driver.goto(url).await?;
        assert_page_healthy(self.driver, "product page").await
    }

    /// Open a category listing page.
    pub async fn open_listing(&mut self, url: &str) -> Result<(), StorewatchError> {
        self.driver.goto(url).await?;
        assert_page_healthy(self.driver, "listing page").await?;
        let visible = self
            .driver
            .is_visible(LISTING_PRODUCT_TILE, Duration::from_millis(SELECTOR_WAIT_MS))
            .await?;
        if !visible {
            return Err(StorewatchError::HealthCheck(
                "no product tiles on the listing page".to_string(),
            ));
        }
        Ok(())
    }

    /// Click through to the first product on the listing.
    pub async fn open_first_product(&mut self) -> Result<(), StorewatchError> {
        self.driver.click(LISTING_PRODUCT_TILE).await?;
        assert_page_healthy(self.driver, "product page").await
    }

    /// Click the product CTA that loads the designer.
    pub async fn launch_designer(&mut self) -> Result<(), StorewatchError> {
        let visible = self
            .driver
            .is_visible(CREATE_BUTTON, Duration::from_millis(SELECTOR_WAIT_MS))
            .await?;
        if !visible {
            return Err(StorewatchError::HealthCheck(
                "designer CTA not visible on product page".to_string(),
            ));
        }
        self.driver.click(CREATE_BUTTON).await
    }

    pub async fn select_first_theme(&mut self) -> Result<(), StorewatchError> {
        let visible = self
            .driver
            .is_visible(THEME_TILE, Duration::from_millis(URL_WAIT_MS))
            .await?;
        if !visible {
            return Err(StorewatchError::HealthCheck(
                "no theme tiles appeared in the designer".to_string(),
            ));
        }
        self.driver.click(THEME_TILE).await
    }

    /// The editor is ready once the canvas and toolbar have both rendered.
    pub async fn editor_ready(&mut self) -> Result<bool, StorewatchError> {
        let canvas = self
            .driver
            .is_visible(EDITOR_CANVAS, Duration::from_millis(URL_WAIT_MS))
            .await?;
        if !canvas {
            return Ok(false);
        }
        self.driver
            .is_visible(EDITOR_TOOLBAR, Duration::from_millis(SELECTOR_WAIT_MS))
            .await
    }
}
