use async_trait::async_trait;
use base64::Engine;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::cdp::browser_protocol::input::{DispatchKeyEventParams, DispatchKeyEventType};
use chromiumoxide::cdp::browser_protocol::network::EventResponseReceived;
use chromiumoxide::cdp::browser_protocol::page::{
    CaptureScreenshotFormat, CaptureScreenshotParams,
};
use chromiumoxide::cdp::js_protocol::runtime::{ConsoleApiCalledType, EventConsoleApiCalled};
use chromiumoxide::cdp::js_protocol::runtime::EventExceptionThrown;
use chromiumoxide::page::Page;
use futures::StreamExt;
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{sleep, Instant};
use tracing::debug;

use crate::config::{DEFAULT_VIEWPORT_HEIGHT, DEFAULT_VIEWPORT_WIDTH};
use crate::error::StorewatchError;
use crate::results::{FailedRequest, PageState};

const POLL_INTERVAL: Duration = Duration::from_millis(250);

/// Owns the browser process and its CDP event handler task.
pub struct BrowserSession {
    browser: Browser,
    handler_task: JoinHandle<()>,
}

impl BrowserSession {
    pub async fn launch(headless: bool) -> Result<Self, StorewatchError> {
        let mut builder = BrowserConfig::builder()
            .no_sandbox()
            .window_size(DEFAULT_VIEWPORT_WIDTH, DEFAULT_VIEWPORT_HEIGHT);
        if !headless {
            builder = builder.with_head();
        }
        let config = builder.build().map_err(StorewatchError::Browser)?;

        let (browser, mut handler) = Browser::launch(config).await?;
        let handler_task = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if event.is_err() {
                    break;
                }
            }
        });

        Ok(BrowserSession {
            browser,
            handler_task,
        })
    }

    /// Open a new page and attach the per-page event listeners.
    pub async fn new_driver(&self) -> Result<CdpDriver, StorewatchError> {
        let page = self.browser.new_page("about:blank").await?;
        CdpDriver::attach(page).await
    }

    pub async fn close(mut self) -> Result<(), StorewatchError> {
        self.browser.close().await?;
        self.handler_task.abort();
        Ok(())
    }
}

/// [`crate::browser::PageDriver`] over one CDP page. Network failures,
/// console errors, and uncaught exceptions accumulate into a shared
/// [`PageState`] that the caller drains per navigation attempt.
pub struct CdpDriver {
    page: Page,
    state: Arc<Mutex<PageState>>,
    listener_tasks: Vec<JoinHandle<()>>,
}

impl CdpDriver {
    async fn attach(page: Page) -> Result<Self, StorewatchError> {
        let state = Arc::new(Mutex::new(PageState::default()));
        let mut tasks = Vec::new();

        let mut console = page.event_listener::<EventConsoleApiCalled>().await?;
        let sink = state.clone();
        tasks.push(tokio::spawn(async move {
            while let Some(event) = console.next().await {
                if !matches!(event.r#type, ConsoleApiCalledType::Error) {
                    continue;
                }
                let text = event
                    .args
                    .iter()
                    .filter_map(|arg| {
                        arg.value
                            .as_ref()
                            .and_then(|v| v.as_str().map(str::to_string))
                    })
                    .collect::<Vec<_>>()
                    .join(" ");
                if let Ok(mut s) = sink.lock() {
                    s.console_errors.push(text);
                }
            }
        }));

        let mut exceptions = page.event_listener::<EventExceptionThrown>().await?;
        let sink = state.clone();
        tasks.push(tokio::spawn(async move {
            while let Some(event) = exceptions.next().await {
                let details = &event.exception_details;
                let message = details
                    .exception
                    .as_ref()
                    .and_then(|e| e.description.clone())
                    .unwrap_or_else(|| details.text.clone());
                if let Ok(mut s) = sink.lock() {
                    s.page_errors.push(message);
                }
            }
        }));

        let mut responses = page.event_listener::<EventResponseReceived>().await?;
        let sink = state.clone();
        tasks.push(tokio::spawn(async move {
            while let Some(event) = responses.next().await {
                if event.response.status >= 400 {
                    if let Ok(mut s) = sink.lock() {
                        s.failed_requests.push(FailedRequest {
                            url: event.response.url.clone(),
                            status: event.response.status,
                        });
                    }
                }
            }
        }));

        Ok(CdpDriver {
            page,
            state,
            listener_tasks: tasks,
        })
    }

    async fn eval_bool(&self, expression: &str) -> Result<bool, StorewatchError> {
        let result = self.page.evaluate(expression).await?;
        Ok(result.into_value::<bool>().unwrap_or(false))
    }

    /// One visibility probe, without waiting.
    async fn check_visible(&self, selector: &str) -> Result<bool, StorewatchError> {
        let sel = serde_json::to_string(selector)?;
        let expr = format!(
            "(function(){{const el=document.querySelector({sel});if(!el)return false;\
             const r=el.getBoundingClientRect();const st=getComputedStyle(el);\
             return r.width>0&&r.height>0&&st.visibility!=='hidden'&&st.display!=='none';}})()"
        );
        self.eval_bool(&expr).await
    }
}

impl Drop for CdpDriver {
    fn drop(&mut self) {
        for task in &self.listener_tasks {
            task.abort();
        }
    }
}

#[async_trait]
impl crate::browser::PageDriver for CdpDriver {
    async fn goto(&mut self, url: &str) -> Result<(), StorewatchError> {
        self.page.goto(url).await?;
        Ok(())
    }

    async fn current_url(&mut self) -> Result<String, StorewatchError> {
        Ok(self.page.url().await?.unwrap_or_default())
    }

    async fn title(&mut self) -> Result<String, StorewatchError> {
        Ok(self.page.get_title().await?.unwrap_or_default())
    }

    async fn body_text(&mut self) -> Result<String, StorewatchError> {
        let result = self
            .page
            .evaluate("document.body ? document.body.innerText.trim() : ''")
            .await?;
        Ok(result.into_value::<String>().unwrap_or_default())
    }

    async fn is_visible(
        &mut self,
        selector: &str,
        timeout: Duration,
    ) -> Result<bool, StorewatchError> {
        let deadline = Instant::now() + timeout;
        loop {
            if self.check_visible(selector).await? {
                return Ok(true);
            }
            if Instant::now() >= deadline {
                return Ok(false);
            }
            sleep(POLL_INTERVAL.min(timeout)).await;
        }
    }

    async fn exists(&mut self, selector: &str) -> Result<bool, StorewatchError> {
        let sel = serde_json::to_string(selector)?;
        self.eval_bool(&format!("document.querySelector({sel}) !== null"))
            .await
    }

    async fn click(&mut self, selector: &str) -> Result<(), StorewatchError> {
        let sel = serde_json::to_string(selector)?;
        let clicked = self
            .eval_bool(&format!(
                "(function(){{const el=document.querySelector({sel});\
                 if(!el)return false;el.click();return true;}})()"
            ))
            .await?;
        if clicked {
            Ok(())
        } else {
            Err(StorewatchError::Browser(format!(
                "no element matched click target '{selector}'"
            )))
        }
    }

    async fn type_into(&mut self, selector: &str, text: &str) -> Result<(), StorewatchError> {
        let sel = serde_json::to_string(selector)?;
        let value = serde_json::to_string(text)?;
        let filled = self
            .eval_bool(&format!(
                "(function(){{const el=document.querySelector({sel});if(!el)return false;\
                 el.value={value};el.dispatchEvent(new Event('input',{{bubbles:true}}));\
                 el.dispatchEvent(new Event('change',{{bubbles:true}}));return true;}})()"
            ))
            .await?;
        if filled {
            Ok(())
        } else {
            Err(StorewatchError::Browser(format!(
                "no element matched input '{selector}'"
            )))
        }
    }

    async fn press_escape(&mut self) -> Result<(), StorewatchError> {
        let down = DispatchKeyEventParams::builder()
            .r#type(DispatchKeyEventType::KeyDown)
            .key("Escape")
            .build()
            .map_err(StorewatchError::Browser)?;
        self.page.execute(down).await?;
        let up = DispatchKeyEventParams::builder()
            .r#type(DispatchKeyEventType::KeyUp)
            .key("Escape")
            .build()
            .map_err(StorewatchError::Browser)?;
        self.page.execute(up).await?;
        Ok(())
    }

    async fn scroll_height(&mut self) -> Result<i64, StorewatchError> {
        let result = self
            .page
            .evaluate("document.documentElement ? document.documentElement.scrollHeight : 0")
            .await?;
        Ok(result.into_value::<i64>().unwrap_or(0))
    }

    async fn screenshot(&mut self, path: &Path) -> Result<(), StorewatchError> {
        let params = CaptureScreenshotParams::builder()
            .format(CaptureScreenshotFormat::Png)
            .capture_beyond_viewport(true)
            .build();
        let captured = self.page.execute(params).await?;
        let bytes = base64::engine::general_purpose::STANDARD
            .decode(&captured.data)
            .map_err(|e| StorewatchError::Browser(format!("screenshot decode: {e}")))?;
        tokio::fs::write(path, bytes).await?;
        debug!("screenshot written to {:?}", path);
        Ok(())
    }

    async fn wait_for_url_contains(
        &mut self,
        fragment: &str,
        timeout: Duration,
    ) -> Result<bool, StorewatchError> {
        let deadline = Instant::now() + timeout;
        loop {
            let url = self.page.url().await?.unwrap_or_default();
            if url.contains(fragment) {
                return Ok(true);
            }
            if Instant::now() >= deadline {
                return Ok(false);
            }
            sleep(POLL_INTERVAL).await;
        }
    }

    fn take_page_state(&mut self) -> PageState {
        self.state
            .lock()
            .map(|mut s| std::mem::take(&mut *s))
            .unwrap_or_default()
    }
}
