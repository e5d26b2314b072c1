//! Playwright driver - browser control via a Node.js Playwright server
//!
//! The server script is started as a child process and spoken to with
//! line-delimited JSON-RPC (see `rpc`). Every element call carries the page id
//! and the element's selector; the server resolves it against whichever frame
//! was last selected for that page.

use async_trait::async_trait;
use serde_json::{json, Value};
use std::process::Stdio;
use std::sync::Arc;
use std::time::Duration;
use tokio::process::{Child, Command};
use tokio::sync::mpsc;
use tracing::{debug, info};

use super::rpc::{send_request, spawn_communication_task, RequestSender};
use super::{BrowserDriver, BrowserError, CollectionRef, Element, ElementCollection, ElementRef};
use crate::config::{BrowserType, PlaywrightConfig};

pub struct PlaywrightBridge {
    request_tx: RequestSender,
    request_timeout: Duration,
    #[allow(dead_code)]
    child: Child,
}

impl PlaywrightBridge {
    pub async fn start(config: &PlaywrightConfig) -> Result<Self, BrowserError> {
        let node = which::which(&config.node)
            .map_err(|e| BrowserError::StartupFailed(format!("{}: {}", config.node, e)))?;

        info!(
            "Starting Playwright server {} with {}",
            config.server_script,
            node.display()
        );

        let mut child = Command::new(node)
            .arg(&config.server_script)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| BrowserError::StartupFailed(e.to_string()))?;

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| BrowserError::StartupFailed("server stdin unavailable".to_string()))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| BrowserError::StartupFailed("server stdout unavailable".to_string()))?;

        let (request_tx, request_rx) = mpsc::channel(100);
        spawn_communication_task(request_rx, stdin, stdout);

        Ok(Self {
            request_tx,
            request_timeout: Duration::from_millis(config.request_timeout_ms),
            child,
        })
    }

    async fn request(&self, method: &str, params: Value) -> Result<Value, BrowserError> {
        debug!("playwright {}", method);
        send_request(&self.request_tx, method, params, self.request_timeout).await
    }

    // Browser Actions
    pub async fn browser_launch(
        &self,
        browser_type: &BrowserType,
        headless: bool,
    ) -> Result<String, BrowserError> {
        let result = self
            .request(
                "browser.launch",
                json!({
                    "browserType": browser_type.as_str(),
                    "headless": headless,
                }),
            )
            .await?;
        string_field(&result, "browserId")
    }

    pub async fn page_new(&self, browser_id: &str) -> Result<String, BrowserError> {
        let result = self
            .request("page.new", json!({ "browserId": browser_id }))
            .await?;
        string_field(&result, "pageId")
    }

    pub async fn browser_close(&self, browser_id: &str) -> Result<(), BrowserError> {
        self.request("browser.close", json!({ "browserId": browser_id }))
            .await?;
        Ok(())
    }

    // Page Actions
    pub async fn page_goto(&self, page_id: &str, url: &str) -> Result<(), BrowserError> {
        self.request("page.goto", json!({ "pageId": page_id, "url": url }))
            .await?;
        Ok(())
    }

    pub async fn page_url(&self, page_id: &str) -> Result<String, BrowserError> {
        let result = self.request("page.url", json!({ "pageId": page_id })).await?;
        string_field(&result, "url")
    }

    pub async fn page_title(&self, page_id: &str) -> Result<String, BrowserError> {
        let result = self
            .request("page.title", json!({ "pageId": page_id }))
            .await?;
        string_field(&result, "title")
    }

    // Frame Actions
    pub async fn frame_select(&self, page_id: &str, selector: &str) -> Result<(), BrowserError> {
        self.request(
            "frame.select",
            json!({ "pageId": page_id, "selector": selector }),
        )
        .await?;
        Ok(())
    }

    pub async fn frame_reset(&self, page_id: &str) -> Result<(), BrowserError> {
        self.request("frame.reset", json!({ "pageId": page_id }))
            .await?;
        Ok(())
    }

    // Element Actions
    pub async fn element_click(&self, page_id: &str, selector: &str) -> Result<(), BrowserError> {
        self.request(
            "element.click",
            json!({ "pageId": page_id, "selector": selector }),
        )
        .await?;
        Ok(())
    }

    pub async fn element_fill(
        &self,
        page_id: &str,
        selector: &str,
        value: &str,
    ) -> Result<(), BrowserError> {
        self.request(
            "element.fill",
            json!({ "pageId": page_id, "selector": selector, "value": value }),
        )
        .await?;
        Ok(())
    }

    pub async fn element_is_visible(
        &self,
        page_id: &str,
        selector: &str,
    ) -> Result<bool, BrowserError> {
        let result = self
            .request(
                "element.isVisible",
                json!({ "pageId": page_id, "selector": selector }),
            )
            .await?;
        Ok(result["visible"].as_bool().unwrap_or(false))
    }

    pub async fn element_input_value(
        &self,
        page_id: &str,
        selector: &str,
    ) -> Result<String, BrowserError> {
        let result = self
            .request(
                "element.inputValue",
                json!({ "pageId": page_id, "selector": selector }),
            )
            .await?;
        string_field(&result, "value")
    }

    pub async fn element_count(&self, page_id: &str, selector: &str) -> Result<usize, BrowserError> {
        let result = self
            .request(
                "element.count",
                json!({ "pageId": page_id, "selector": selector }),
            )
            .await?;
        result["count"]
            .as_u64()
            .map(|n| n as usize)
            .ok_or_else(|| BrowserError::ServerError("No count returned".to_string()))
    }
}

fn string_field(result: &Value, field: &str) -> Result<String, BrowserError> {
    result[field]
        .as_str()
        .map(|s| s.to_string())
        .ok_or_else(|| BrowserError::ServerError(format!("No {} returned", field)))
}

/// One browser page driven through a `PlaywrightBridge`
pub struct PlaywrightDriver {
    bridge: Arc<PlaywrightBridge>,
    browser_id: String,
    page_id: String,
}

impl PlaywrightDriver {
    /// Start the server, launch a browser and open a page in it
    pub async fn launch(config: &PlaywrightConfig) -> Result<Self, BrowserError> {
        let bridge = Arc::new(PlaywrightBridge::start(config).await?);
        let browser_id = bridge.browser_launch(&config.browser, config.headless).await?;
        let page_id = bridge.page_new(&browser_id).await?;
        info!(browser = %browser_id, page = %page_id, "Playwright page ready");

        Ok(Self {
            bridge,
            browser_id,
            page_id,
        })
    }

    /// Close the browser; the server exits with the process
    pub async fn close(&self) -> Result<(), BrowserError> {
        self.bridge.browser_close(&self.browser_id).await
    }
}

#[async_trait]
impl BrowserDriver for PlaywrightDriver {
    async fn current_url(&self) -> Result<String, BrowserError> {
        self.bridge.page_url(&self.page_id).await
    }

    async fn get(&self, url: &str) -> Result<(), BrowserError> {
        self.bridge.page_goto(&self.page_id, url).await
    }

    async fn switch_to_default_content(&self) -> Result<(), BrowserError> {
        self.bridge.frame_reset(&self.page_id).await
    }

    async fn switch_to_frame(&self, selector: &str) -> Result<(), BrowserError> {
        self.bridge.frame_select(&self.page_id, selector).await
    }

    async fn title(&self) -> Result<String, BrowserError> {
        self.bridge.page_title(&self.page_id).await
    }

    fn find(&self, selector: &str) -> ElementRef {
        Arc::new(PlaywrightElement {
            bridge: self.bridge.clone(),
            page_id: self.page_id.clone(),
            selector: selector.to_string(),
        })
    }

    fn find_all(&self, selector: &str) -> CollectionRef {
        Arc::new(PlaywrightCollection {
            bridge: self.bridge.clone(),
            page_id: self.page_id.clone(),
            selector: selector.to_string(),
        })
    }
}

struct PlaywrightElement {
    bridge: Arc<PlaywrightBridge>,
    page_id: String,
    selector: String,
}

#[async_trait]
impl Element for PlaywrightElement {
    async fn click(&self) -> Result<(), BrowserError> {
        self.bridge.element_click(&self.page_id, &self.selector).await
    }

    async fn input_value(&self, text: &str) -> Result<(), BrowserError> {
        self.bridge
            .element_fill(&self.page_id, &self.selector, text)
            .await
    }

    async fn is_displayed(&self) -> Result<bool, BrowserError> {
        self.bridge
            .element_is_visible(&self.page_id, &self.selector)
            .await
    }

    async fn value(&self) -> Result<String, BrowserError> {
        self.bridge
            .element_input_value(&self.page_id, &self.selector)
            .await
    }

    fn describe(&self) -> String {
        self.selector.clone()
    }
}

struct PlaywrightCollection {
    bridge: Arc<PlaywrightBridge>,
    page_id: String,
    selector: String,
}

#[async_trait]
impl ElementCollection for PlaywrightCollection {
    async fn elements(&self) -> Result<Vec<ElementRef>, BrowserError> {
        let count = self.bridge.element_count(&self.page_id, &self.selector).await?;
        Ok((0..count)
            .map(|i| -> ElementRef {
                Arc::new(PlaywrightElement {
                    bridge: self.bridge.clone(),
                    page_id: self.page_id.clone(),
                    selector: nth_selector(&self.selector, i),
                })
            })
            .collect())
    }

    fn describe(&self) -> String {
        self.selector.clone()
    }
}

fn nth_selector(selector: &str, index: usize) -> String {
    format!("{} >> nth={}", selector, index)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nth_selector() {
        assert_eq!(nth_selector(".g", 0), ".g >> nth=0");
        assert_eq!(nth_selector("div.result a", 3), "div.result a >> nth=3");
    }

    #[test]
    fn test_string_field() {
        let value = json!({ "title": "Google" });
        assert_eq!(string_field(&value, "title").unwrap(), "Google");
        assert!(string_field(&value, "url").is_err());
    }

    #[tokio::test]
    async fn test_start_with_missing_node_fails() {
        let config = PlaywrightConfig {
            node: "definitely-not-a-node-binary".to_string(),
            ..PlaywrightConfig::default()
        };
        let err = PlaywrightBridge::start(&config).await.err().unwrap();
        assert!(matches!(err, BrowserError::StartupFailed(_)));
    }
}
