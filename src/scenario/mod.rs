//! Scenario execution
//!
//! A `ScenarioContext` is created per scenario and handed to every step. It
//! owns the page the scenario is currently on; actions that move to another
//! page replace it, and `teardown` drops it when the scenario ends.
//!
//! - `steps` - natural-language step matching
//! - `loader` - story file parsing

use serde_json::Value;
use std::sync::Arc;
use tracing::info;

pub mod loader;
pub mod steps;

pub use loader::{Keyword, Scenario, Step, Story, StoryLoader};
pub use steps::{ScenarioResult, StepRunner};

use crate::browser::Browser;
use crate::page::{FieldValue, ImportRow, Page, PageError, PageState, Transition};
use crate::registry::PageRegistry;

/// Errors that fail a scenario
#[derive(Debug, thiserror::Error)]
pub enum ScenarioError {
    #[error("No current page: start the scenario with 'the user is in the <page> page'")]
    NoCurrentPage,

    #[error("Unknown step: {0}")]
    UnknownStep(String),

    #[error("Step '{0}' needs a table")]
    MissingTable(String),

    #[error("Assertion failed: {0}")]
    AssertionFailed(String),

    #[error("Parse error in {file} line {line}: {message}")]
    Parse {
        file: String,
        line: usize,
        message: String,
    },

    #[error(transparent)]
    Page(#[from] PageError),
}

/// Per-scenario state passed to every step
pub struct ScenarioContext {
    registry: Arc<PageRegistry>,
    browser: Browser,
    current: Option<Box<dyn Page>>,
}

impl ScenarioContext {
    pub fn new(registry: Arc<PageRegistry>, browser: Browser) -> Self {
        Self {
            registry,
            browser,
            current: None,
        }
    }

    pub fn browser(&self) -> &Browser {
        &self.browser
    }

    /// The page the scenario is on
    pub fn current_page(&self) -> Result<&dyn Page, ScenarioError> {
        self.current.as_deref().ok_or(ScenarioError::NoCurrentPage)
    }

    fn page_mut(&mut self) -> Result<&mut Box<dyn Page>, ScenarioError> {
        self.current.as_mut().ok_or(ScenarioError::NoCurrentPage)
    }

    /// Build the named page, navigate to it and make it current
    pub async fn given_user_in_page(&mut self, name: &str) -> Result<(), ScenarioError> {
        info!("Given the user is in the {} page.", name);
        self.current = None;
        let page = self.registry.get_page(name, &self.browser)?;
        let page = page.navigate().await?;
        self.current = Some(page);
        Ok(())
    }

    pub async fn given_page_populated_random(&mut self) -> Result<(), ScenarioError> {
        info!("Given the page is populated with random data.");
        self.page_mut()?.fill_default_data().await?;
        Ok(())
    }

    /// Invoke an action; the scenario follows any page transition
    pub async fn when_user_does(
        &mut self,
        action: &str,
        params: Vec<Value>,
    ) -> Result<(), ScenarioError> {
        info!("When the user does a {}.", action);
        let transition = self.page_mut()?.invoke_action(action, params).await?;
        if let Transition::To(next) = transition {
            info!("Now on the {} page.", next.name());
            self.current = Some(next);
        }
        Ok(())
    }

    /// A collection slot must hold at least one element; an element slot must be displayed
    pub async fn then_there_should_be(&mut self, name: &str) -> Result<(), ScenarioError> {
        info!("Then there should be {}.", name);
        let value = self.current_page()?.get_field_value(name)?;
        match value {
            FieldValue::Collection(collection) => {
                let found = collection.elements().await.map_err(PageError::from)?;
                if found.is_empty() {
                    return Err(ScenarioError::AssertionFailed(format!(
                        "expected at least one of '{}' ({}) but found none",
                        name,
                        collection.describe()
                    )));
                }
            }
            FieldValue::Element(element) => {
                if !element.is_displayed().await.map_err(PageError::from)? {
                    return Err(ScenarioError::AssertionFailed(format!(
                        "expected '{}' ({}) to be displayed",
                        name,
                        element.describe()
                    )));
                }
            }
        }
        Ok(())
    }

    pub async fn then_field_is_visible(&mut self, name: &str) -> Result<(), ScenarioError> {
        info!("Then the {} should be visible.", name);
        if !self.page_mut()?.validate_is_visible(name).await? {
            return Err(ScenarioError::AssertionFailed(format!(
                "expected '{}' to be visible",
                name
            )));
        }
        Ok(())
    }

    /// Key/value table import
    pub async fn fill_in(&mut self, rows: &[ImportRow]) -> Result<(), ScenarioError> {
        info!("When the user fills in {} field(s).", rows.len());
        self.page_mut()?.import_key_value_pairs(rows).await?;
        Ok(())
    }

    /// Header-aligned table import
    pub async fn enter_values(
        &mut self,
        headers: &[String],
        rows: &[ImportRow],
    ) -> Result<(), ScenarioError> {
        info!("When the user enters values for {}.", headers.join(", "));
        self.page_mut()?.import_named_values(headers, rows).await?;
        Ok(())
    }

    pub fn current_state(&self) -> Option<PageState> {
        self.current.as_ref().map(|p| p.state())
    }

    /// Drop the current page at the end of the scenario
    pub fn teardown(&mut self) {
        if let Some(page) = self.current.take() {
            info!("Leaving the {} page.", page.name());
        }
    }
}
