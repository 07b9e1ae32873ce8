#![allow(dead_code)]

use async_trait::async_trait;
use std::path::Path;
use std::time::Duration;

use storewatch::browser::PageDriver;
use storewatch::error::StorewatchError;
use storewatch::results::PageState;

/// In-memory page driver. Selector matching is by exact string against the
/// lists configured on the fixture; clicks can rewrite the current URL to
/// simulate navigation.
pub struct FakeDriver {
    pub url: String,
    pub body: String,
    pub title: String,
    pub height: i64,
    pub visible_selectors: Vec<String>,
    pub existing_selectors: Vec<String>,
    /// (selector, new URL) applied when that selector is clicked.
    pub click_url_rewrites: Vec<(String, String)>,
    /// Selectors whose `exists` probe fails with a browser error.
    pub erroring_selectors: Vec<String>,
    pub clicked: Vec<String>,
    pub typed: Vec<(String, String)>,
}

impl FakeDriver {
    pub fn new() -> Self {
        FakeDriver {
            url: "about:blank".to_string(),
            body: "Create personalised photo books, calendars, canvas prints and wall art. \
                   Free delivery on orders over twenty pounds. Browse the full range below and \
                   start designing your own print products today."
                .to_string(),
            title: "Printshop | Personalised Photo Products".to_string(),
            height: 2400,
            visible_selectors: Vec::new(),
            existing_selectors: Vec::new(),
            click_url_rewrites: Vec::new(),
            erroring_selectors: Vec::new(),
            clicked: Vec::new(),
            typed: Vec::new(),
        }
    }

    pub fn with_visible(mut self, selectors: &[&str]) -> Self {
        self.visible_selectors
            .extend(selectors.iter().map(|s| s.to_string()));
        self
    }

    pub fn with_existing(mut self, selectors: &[&str]) -> Self {
        self.existing_selectors
            .extend(selectors.iter().map(|s| s.to_string()));
        self
    }

    pub fn with_click_rewrite(mut self, selector: &str, url: &str) -> Self {
        self.click_url_rewrites
            .push((selector.to_string(), url.to_string()));
        self
    }

    pub fn with_erroring(mut self, selectors: &[&str]) -> Self {
        self.erroring_selectors
            .extend(selectors.iter().map(|s| s.to_string()));
        self
    }

    fn known(&self, selector: &str) -> bool {
        self.visible_selectors.iter().any(|s| s == selector)
            || self.existing_selectors.iter().any(|s| s == selector)
    }
}

#[async_trait]
impl PageDriver for FakeDriver {
    async fn goto(&mut self, url: &str) -> Result<(), StorewatchError> {
        self.url = url.to_string();
        Ok(())
    }

    async fn current_url(&mut self) -> Result<String, StorewatchError> {
        Ok(self.url.clone())
    }

    async fn title(&mut self) -> Result<String, StorewatchError> {
        Ok(self.title.clone())
    }

    async fn body_text(&mut self) -> Result<String, StorewatchError> {
        Ok(self.body.clone())
    }

    async fn is_visible(
        &mut self,
        selector: &str,
        _timeout: Duration,
    ) -> Result<bool, StorewatchError> {
        Ok(self.visible_selectors.iter().any(|s| s == selector))
    }

    async fn exists(&mut self, selector: &str) -> Result<bool, StorewatchError> {
        if self.erroring_selectors.iter().any(|s| s == selector) {
            return Err(StorewatchError::Browser(format!(
                "evaluate failed probing '{selector}'"
            )));
        }
        Ok(self.known(selector))
    }

    async fn click(&mut self, selector: &str) -> Result<(), StorewatchError> {
        if !self.known(selector) {
            return Err(StorewatchError::Browser(format!(
                "no element matched click target '{selector}'"
            )));
        }
        self.clicked.push(selector.to_string());
        if let Some((_, url)) = self
            .click_url_rewrites
            .iter()
            .find(|(s, _)| s == selector)
        {
            self.url = url.clone();
        }
        Ok(())
    }

    async fn type_into(&mut self, selector: &str, text: &str) -> Result<(), StorewatchError> {
        if !self.known(selector) {
            return Err(StorewatchError::Browser(format!(
                "no element matched input '{selector}'"
            )));
        }
        self.typed.push((selector.to_string(), text.to_string()));
        Ok(())
    }

    async fn press_escape(&mut self) -> Result<(), StorewatchError> {
        Ok(())
    }

    async fn scroll_height(&mut self) -> Result<i64, StorewatchError> {
        Ok(self.height)
    }

    async fn screenshot(&mut self, path: &Path) -> Result<(), StorewatchError> {
        std::fs::write(path, b"png-bytes")?;
        Ok(())
    }

    async fn wait_for_url_contains(
        &mut self,
        fragment: &str,
        _timeout: Duration,
    ) -> Result<bool, StorewatchError> {
        Ok(self.url.contains(fragment))
    }

    fn take_page_state(&mut self) -> PageState {
        PageState::default()
    }
}
