use serde::{Deserialize, Serialize};
use tracing::info;

use crate::browser::popups::dismiss_all;
use crate::browser::PageDriver;
use crate::flows::checkpoint::{FlowError, FlowErrorType};
use crate::pages::DesignerPage;

/// Checkpoint record for the print-product designer flow, driven over one
/// product URL at a time by the batch workers.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PrintboxTestResult {
    pub url: String,
    pub product_page_loaded: bool,
    pub designer_page_loaded: bool,
    pub theme_selected: bool,
    pub editor_ready: bool,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<FlowError>,
}

impl PrintboxTestResult {
    fn empty(url: &str) -> Self {
        PrintboxTestResult {
            url: url.to_string(),
            product_page_loaded: false,
            designer_page_loaded: false,
            theme_selected: false,
            editor_ready: false,
            success: false,
            error: None,
        }
    }

    pub fn failure_point(&self) -> Option<&'static str> {
        if !self.product_page_loaded {
            Some("productPageLoaded")
        } else if !self.designer_page_loaded {
            Some("designerPageLoaded")
        } else if !self.theme_selected {
            Some("themeSelected")
        } else if !self.editor_ready {
            Some("editorReady")
        } else {
            None
        }
    }
}

/// Checkpoint record for the photo-books flow, which reaches the designer
/// through the category listing rather than a direct product URL.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PhotoBooksTestResult {
    pub listing_page_loaded: bool,
    pub product_page_loaded: bool,
    pub designer_page_loaded: bool,
    pub theme_selected: bool,
    pub editor_ready: bool,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<FlowError>,
}

impl PhotoBooksTestResult {
    fn empty() -> Self {
        PhotoBooksTestResult {
            listing_page_loaded: false,
            product_page_loaded: false,
            designer_page_loaded: false,
            theme_selected: false,
            editor_ready: false,
            success: false,
            error: None,
        }
    }

    pub fn failure_point(&self) -> Option<&'static str> {
        if !self.listing_page_loaded {
            Some("listingPageLoaded")
        } else if !self.product_page_loaded {
            Some("productPageLoaded")
        } else if !self.designer_page_loaded {
            Some("designerPageLoaded")
        } else if !self.theme_selected {
            Some("themeSelected")
        } else if !self.editor_ready {
            Some("editorReady")
        } else {
            None
        }
    }
}

pub async fn run_photo_books_flow(
    driver: &mut dyn PageDriver,
    base_url: &str,
) -> PhotoBooksTestResult {
    let mut result = PhotoBooksTestResult::empty();
    let mut page = DesignerPage::new(driver);

    if let Err(e) = page.open_listing(&format!("{base_url}/photo-books")).await {
        result.error = Some(FlowError::from_error(&e, "listingPageLoaded"));
        return result;
    }
    result.listing_page_loaded = true;
    dismiss_all(driver).await;

    let mut page = DesignerPage::new(driver);
    if let Err(e) = page.open_first_product().await {
        result.error = Some(FlowError::from_error(&e, "productPageLoaded"));
        return result;
    }
    result.product_page_loaded = true;

    if let Err(e) = page.launch_designer().await {
        result.error = Some(FlowError::from_error(&e, "designerPageLoaded"));
        return result;
    }
    result.designer_page_loaded = true;

    if let Err(e) = page.select_first_theme().await {
        result.error = Some(FlowError::from_error(&e, "themeSelected"));
        return result;
    }
    result.theme_selected = true;

    match page.editor_ready().await {
        Ok(true) => {
            result.editor_ready = true;
            result.success = true;
            info!("photo books editor ready");
        }
        Ok(false) => {
            result.error = Some(FlowError {
                error_type: FlowErrorType::ValidationFailed,
                message: "editor canvas or toolbar never rendered".to_string(),
                checkpoint: "editorReady".to_string(),
            });
        }
        Err(e) => {
            result.error = Some(FlowError::from_error(&e, "editorReady"));
        }
    }
    result
}

pub async fn run_printbox_flow(driver: &mut dyn PageDriver, url: &str) -> PrintboxTestResult {
    let mut result = PrintboxTestResult::empty(url);
    let mut page = DesignerPage::new(driver);

    if let Err(e) = page.open_product(url).await {
        result.error = Some(FlowError::from_error(&e, "productPageLoaded"));
        return result;
    }
    result.product_page_loaded = true;
    dismiss_all(driver).await;

    let mut page = DesignerPage::new(driver);
    if let Err(e) = page.launch_designer().await {
        result.error = Some(FlowError::from_error(&e, "designerPageLoaded"));
        return result;
    }
    result.designer_page_loaded = true;

    if let Err(e) = page.select_first_theme().await {
        result.error = Some(FlowError::from_error(&e, "themeSelected"));
        return result;
    }
    result.theme_selected = true;

    match page.editor_ready().await {
        Ok(true) => {
            result.editor_ready = true;
            result.success = true;
            info!("designer editor ready for {}", url);
        }
        Ok(false) => {
            result.error = Some(FlowError {
                error_type: FlowErrorType::ValidationFailed,
                message: "editor canvas or toolbar never rendered".to_string(),
                checkpoint: "editorReady".to_string(),
            });
        }
        Err(e) => {
            result.error = Some(FlowError::from_error(&e, "editorReady"));
        }
    }
    result
}
