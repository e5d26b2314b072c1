//! Element wait gate
//!
//! Every interaction with an element goes through `await_visible` first. The
//! gate polls the element's displayed state until it reports visible or the
//! deadline passes; there is no retry after the deadline and no way to cut a
//! wait short.

use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, warn};

use super::error::PageError;
use crate::browser::{BrowserError, Element};

/// Default timeout for the visibility wait (10 seconds)
pub const DEFAULT_WAIT_TIMEOUT_SECS: u64 = 10;

/// Default polling interval (100ms)
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 100;

// Deadlines are clamped here so oversized timeouts never overflow `Instant`.
const MAX_WAIT: Duration = Duration::from_secs(100 * 365 * 24 * 60 * 60);

/// Options for the visibility wait
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WaitOptions {
    /// Timeout in milliseconds
    pub timeout_ms: u64,
    /// Polling interval in milliseconds
    pub poll_interval_ms: u64,
}

impl Default for WaitOptions {
    fn default() -> Self {
        Self {
            timeout_ms: DEFAULT_WAIT_TIMEOUT_SECS * 1000,
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
        }
    }
}

impl WaitOptions {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub const fn with_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }

    #[must_use]
    pub const fn with_timeout_secs(mut self, timeout_secs: u64) -> Self {
        self.timeout_ms = timeout_secs.saturating_mul(1000);
        self
    }

    #[must_use]
    pub const fn with_poll_interval_ms(mut self, poll_interval_ms: u64) -> Self {
        self.poll_interval_ms = poll_interval_ms;
        self
    }

    pub const fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub const fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

/// Block until `element` is displayed or the timeout elapses.
///
/// An element the browser cannot find yet counts as not visible; any other
/// browser failure ends the wait immediately.
pub async fn await_visible(element: &dyn Element, options: &WaitOptions) -> Result<(), PageError> {
    let started = Instant::now();
    let deadline = started
        .checked_add(options.timeout())
        .unwrap_or_else(|| started + MAX_WAIT);
    let poll = options.poll_interval().max(Duration::from_millis(1));

    loop {
        match element.is_displayed().await {
            Ok(true) => return Ok(()),
            Ok(false) | Err(BrowserError::ElementNotFound(_)) => {}
            Err(e) => return Err(e.into()),
        }

        let now = Instant::now();
        if now >= deadline {
            warn!(
                "Element '{}' not visible after {:?}",
                element.describe(),
                options.timeout()
            );
            return Err(PageError::ElementNeverVisible {
                element: element.describe(),
                timeout: options.timeout(),
            });
        }

        tokio::time::sleep(poll.min(deadline - now)).await;
    }
}

/// Wait for `element`, click it, then type `value` into it if one is given
pub async fn interact(
    element: &dyn Element,
    options: &WaitOptions,
    value: Option<&str>,
) -> Result<(), PageError> {
    await_visible(element, options).await?;
    element.click().await?;
    if let Some(value) = value {
        debug!("Typing into '{}'", element.describe());
        element.input_value(value).await?;
    }
    Ok(())
}

/// Wait for `element` and click it
pub async fn click_when_visible(element: &dyn Element, options: &WaitOptions) -> Result<(), PageError> {
    interact(element, options, None).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::browser::MemoryBrowser;

    fn fast() -> WaitOptions {
        WaitOptions::new()
            .with_timeout_ms(1_000)
            .with_poll_interval_ms(100)
    }

    #[test]
    fn test_default_options() {
        let options = WaitOptions::default();
        assert_eq!(options.timeout(), Duration::from_secs(10));
        assert_eq!(options.poll_interval(), Duration::from_millis(100));
    }

    #[tokio::test(start_paused = true)]
    async fn test_visible_element_passes_immediately() {
        let browser = MemoryBrowser::new();
        let element = browser.element("#q");

        let start = Instant::now();
        await_visible(element.as_ref(), &fast()).await.unwrap();
        assert_eq!(start.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn test_late_element_is_awaited() {
        let browser = MemoryBrowser::new();
        let element = browser.element("#late");
        element.appear_after(3);

        let start = Instant::now();
        await_visible(element.as_ref(), &fast()).await.unwrap();
        assert_eq!(start.elapsed(), Duration::from_millis(300));
    }

    #[tokio::test(start_paused = true)]
    async fn test_huge_timeout_still_polls() {
        let browser = MemoryBrowser::new();
        let element = browser.element("#late");
        element.appear_after(2);

        let options = WaitOptions::new().with_timeout_secs(u64::MAX / 10);
        assert_eq!(options.timeout_ms, u64::MAX);
        await_visible(element.as_ref(), &options).await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_hidden_element_times_out() {
        let browser = MemoryBrowser::new();
        let element = browser.element("#hidden");
        element.hide();

        let start = Instant::now();
        let err = await_visible(element.as_ref(), &fast()).await.unwrap_err();
        assert_eq!(start.elapsed(), Duration::from_secs(1));
        match err {
            PageError::ElementNeverVisible { element, timeout } => {
                assert_eq!(element, "#hidden");
                assert_eq!(timeout, Duration::from_secs(1));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_detached_element_counts_as_hidden() {
        let browser = MemoryBrowser::new();
        let element = browser.element("#gone");
        element.detach();

        let err = await_visible(element.as_ref(), &fast()).await.unwrap_err();
        assert!(matches!(err, PageError::ElementNeverVisible { .. }));
    }

    #[tokio::test(start_paused = true)]
    async fn test_interact_clicks_then_types() {
        let browser = MemoryBrowser::new();
        let element = browser.element("#q");

        interact(element.as_ref(), &fast(), Some("hello")).await.unwrap();
        assert_eq!(element.clicks(), 1);
        assert_eq!(element.current_value(), "hello");

        click_when_visible(element.as_ref(), &fast()).await.unwrap();
        assert_eq!(element.clicks(), 2);
        assert_eq!(element.inputs(), vec!["hello".to_string()]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_interact_never_touches_hidden_element() {
        let browser = MemoryBrowser::new();
        let element = browser.element("#hidden");
        element.hide();

        assert!(interact(element.as_ref(), &fast(), Some("x")).await.is_err());
        assert_eq!(element.clicks(), 0);
        assert!(element.inputs().is_empty());
    }
}
