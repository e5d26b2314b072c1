//! Browser-control capability consumed by pages
//!
//! This module defines the seam between page objects and whatever is actually
//! driving a browser:
//! - `BrowserDriver`: navigation, frames, title and element lookup
//! - `Element` / `ElementCollection`: one control, or a lazily located list
//! - `Browser`: the cloneable handle pages hold, carrying the wait settings
//!
//! Two drivers ship with the crate:
//! - `playwright`: a Node.js Playwright server spoken to over JSON-RPC
//! - `memory`: an in-process browser for offline runs and tests

use async_trait::async_trait;
use std::fmt;
use std::sync::Arc;

pub mod memory;
pub mod playwright;
pub mod rpc;

pub use memory::{MemoryBrowser, MemoryElement};
pub use playwright::{PlaywrightBridge, PlaywrightDriver};

use crate::page::wait::WaitOptions;

/// Shared reference to an element owned by the browser session
pub type ElementRef = Arc<dyn Element>;

/// Shared reference to a lazily located element list
pub type CollectionRef = Arc<dyn ElementCollection>;

/// Errors raised by browser drivers
#[derive(Debug, thiserror::Error)]
pub enum BrowserError {
    #[error("Failed to start browser server: {0}")]
    StartupFailed(String),

    #[error("Browser server disconnected")]
    Disconnected,

    #[error("Request timed out")]
    Timeout,

    #[error("Browser server error: {0}")]
    ServerError(String),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("No element matches selector '{0}'")]
    ElementNotFound(String),
}

/// One addressable UI control
#[async_trait]
pub trait Element: Send + Sync {
    /// Click the control
    async fn click(&self) -> Result<(), BrowserError>;

    /// Replace the control's value with `text`
    async fn input_value(&self, text: &str) -> Result<(), BrowserError>;

    /// Whether the control is currently displayed
    async fn is_displayed(&self) -> Result<bool, BrowserError>;

    /// Current value of the control
    async fn value(&self) -> Result<String, BrowserError>;

    /// Human-readable locator, used in diagnostics
    fn describe(&self) -> String;
}

/// A list of controls located on demand
#[async_trait]
pub trait ElementCollection: Send + Sync {
    /// Every control currently matching the locator
    async fn elements(&self) -> Result<Vec<ElementRef>, BrowserError>;

    /// Human-readable locator, used in diagnostics
    fn describe(&self) -> String;
}

/// Navigation and lookup operations of one browser session
#[async_trait]
pub trait BrowserDriver: Send + Sync {
    /// URL currently loaded
    async fn current_url(&self) -> Result<String, BrowserError>;

    /// Load `url`
    async fn get(&self, url: &str) -> Result<(), BrowserError>;

    /// Return to the top-level document
    async fn switch_to_default_content(&self) -> Result<(), BrowserError>;

    /// Descend into the frame matched by `selector`
    async fn switch_to_frame(&self, selector: &str) -> Result<(), BrowserError>;

    /// Title of the current document
    async fn title(&self) -> Result<String, BrowserError>;

    /// Lazily locate a single element. No browser round-trip happens here.
    fn find(&self, selector: &str) -> ElementRef;

    /// Lazily locate every element matching `selector`
    fn find_all(&self, selector: &str) -> CollectionRef;
}

/// Cloneable browser handle held by page objects
#[derive(Clone)]
pub struct Browser {
    driver: Arc<dyn BrowserDriver>,
    wait: WaitOptions,
}

impl Browser {
    /// Wrap a driver with default wait settings
    pub fn new(driver: Arc<dyn BrowserDriver>) -> Self {
        Self {
            driver,
            wait: WaitOptions::default(),
        }
    }

    /// Override the wait settings used by pages built on this handle
    pub fn with_wait_options(mut self, wait: WaitOptions) -> Self {
        self.wait = wait;
        self
    }

    /// The underlying driver
    pub fn driver(&self) -> &dyn BrowserDriver {
        self.driver.as_ref()
    }

    /// Wait settings applied before every element interaction
    pub fn wait_options(&self) -> &WaitOptions {
        &self.wait
    }

    pub fn find(&self, selector: &str) -> ElementRef {
        self.driver.find(selector)
    }

    pub fn find_all(&self, selector: &str) -> CollectionRef {
        self.driver.find_all(selector)
    }
}

impl fmt::Debug for Browser {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Browser")
            .field("wait", &self.wait)
            .finish_non_exhaustive()
    }
}
