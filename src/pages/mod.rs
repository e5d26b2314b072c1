//! Pages bundled with the crate

pub mod google;

pub use google::{GoogleResultsPage, GoogleSearchPage};

use crate::page::PageError;
use crate::registry::PageRegistry;

/// Registry with every bundled page
pub fn default_registry() -> Result<PageRegistry, PageError> {
    let mut registry = PageRegistry::new();
    registry.register(google::SEARCH_PAGE_NAME, GoogleSearchPage::new)?;
    registry.register(google::RESULTS_PAGE_NAME, GoogleResultsPage::new)?;
    Ok(registry)
}
