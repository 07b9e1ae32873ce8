use async_trait::async_trait;
use std::path::Path;
use std::time::Duration;

use crate::error::StorewatchError;
use crate::results::PageState;

/// Seam between the flows/monitor and the browser engine. The production
/// implementation is [`crate::browser::CdpDriver`]; tests substitute an
/// in-memory fake.
#[async_trait]
pub trait PageDriver: Send {
    async fn goto(&mut self, url: &str) -> Result<(), StorewatchError>;

    async fn current_url(&mut self) -> Result<String, StorewatchError>;

    async fn title(&mut self) -> Result<String, StorewatchError>;

    /// Trimmed text content of the document body.
    async fn body_text(&mut self) -> Result<String, StorewatchError>;

    /// Poll until the first element matching `selector` is visible, up to
    /// `timeout`. A zero timeout performs exactly one check.
    async fn is_visible(
        &mut self,
        selector: &str,
        timeout: Duration,
    ) -> Result<bool, StorewatchError>;

    async fn exists(&mut self, selector: &str) -> Result<bool, StorewatchError>;

    /// Forced click: dispatched in the page, bypassing pointer-event
    /// interception by overlays.
    async fn click(&mut self, selector: &str) -> Result<(), StorewatchError>;

    async fn type_into(&mut self, selector: &str, text: &str) -> Result<(), StorewatchError>;

    async fn press_escape(&mut self) -> Result<(), StorewatchError>;

    async fn scroll_height(&mut self) -> Result<i64, StorewatchError>;

    /// Full-page screenshot written to `path`.
    async fn screenshot(&mut self, path: &Path) -> Result<(), StorewatchError>;

    /// Poll until the current URL contains `fragment`, up to `timeout`.
    /// Returns false on timeout rather than erroring; callers decide.
    async fn wait_for_url_contains(
        &mut self,
        fragment: &str,
        timeout: Duration,
    ) -> Result<bool, StorewatchError>;

    /// Drain the accumulated per-navigation event bags, resetting them.
    fn take_page_state(&mut self) -> PageState;
}
