//! # Natural Automation
//!
//! Page objects for natural-language browser acceptance tests.
//!
//! Scenarios are written as plain sentences ("the user is in the Google
//! search page", "the user does a search") and executed against page objects
//! that register their elements and actions by name.
//!
//! ## Features
//!
//! - **Explicit page schemas** - slots and actions are registered once per page type
//! - **Element wait gate** - interactions wait for the element to become visible
//! - **Tabular import** - key/value and header-aligned tables fill page fields
//! - **Two drivers** - Playwright over JSON-RPC, or an in-memory browser
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use natural_automation::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let driver = PlaywrightDriver::launch(&PlaywrightConfig::default()).await?;
//!     let browser = Browser::new(Arc::new(driver));
//!     let registry = Arc::new(natural_automation::pages::default_registry()?);
//!
//!     let story = StoryLoader::parse(
//!         "Scenario: search\n\
//!          Given the user is in the Google search page\n\
//!          When the user does a search\n\
//!          Then there should be results\n",
//!         "inline.story",
//!     )?;
//!
//!     let runner = StepRunner::new();
//!     for scenario in &story.scenarios {
//!         let mut ctx = ScenarioContext::new(registry.clone(), browser.clone());
//!         let result = runner.run_scenario(&mut ctx, scenario).await;
//!         println!("{}: success={}", result.name, result.success);
//!     }
//!     Ok(())
//! }
//! ```

pub mod browser;
pub mod config;
pub mod page;
pub mod pages;
pub mod registry;
pub mod scenario;

// Re-export main types
pub use browser::{
    Browser, BrowserDriver, BrowserError, CollectionRef, Element, ElementCollection, ElementRef,
    MemoryBrowser, PlaywrightDriver,
};
pub use config::{AutomationConfig, BrowserType, ConfigError, PlaywrightConfig, WaitConfig};
pub use page::{
    FieldValue, ImportRow, ImportTable, Page, PageError, PageHandle, PageObject, PageState,
    SchemaBuilder, SchemaError, SlotKind, Transition, WaitOptions,
};
pub use registry::{PageInfo, PageRegistry};
pub use scenario::{
    Keyword, Scenario, ScenarioContext, ScenarioError, ScenarioResult, Step, StepRunner, Story,
    StoryLoader,
};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::browser::{Browser, BrowserDriver, ElementRef, MemoryBrowser, PlaywrightDriver};
    pub use crate::config::{AutomationConfig, PlaywrightConfig};
    pub use crate::page::{
        click_when_visible, FieldValue, ImportRow, Page, PageError, PageHandle, PageObject,
        PageState, SchemaBuilder, Transition, WaitOptions,
    };
    pub use crate::registry::PageRegistry;
    pub use crate::scenario::{ScenarioContext, ScenarioError, StepRunner, StoryLoader};
}
