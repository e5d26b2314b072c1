//! Google search and results pages

use async_trait::async_trait;

use crate::browser::{Browser, CollectionRef, ElementRef};
use crate::page::{click_when_visible, PageError, PageObject, SchemaBuilder, Transition};

pub const GOOGLE_URL: &str = "https://www.google.com/";

pub const SEARCH_PAGE_NAME: &str = "Google search";
pub const RESULTS_PAGE_NAME: &str = "Google results";

/// The search form
pub struct GoogleSearchPage {
    browser: Browser,
    q: ElementRef,
    search: ElementRef,
}

impl GoogleSearchPage {
    pub fn new(browser: &Browser) -> Self {
        Self {
            q: browser.find("textarea[name=\"q\"], input[name=\"q\"]"),
            search: browser.find("input[name=\"btnK\"]"),
            browser: browser.clone(),
        }
    }

    /// Submit the query and continue on the results page
    pub async fn search(&mut self) -> anyhow::Result<Transition> {
        click_when_visible(self.search.as_ref(), self.browser.wait_options()).await?;
        Ok(Transition::to(GoogleResultsPage::new(&self.browser))?)
    }
}

#[async_trait]
impl PageObject for GoogleSearchPage {
    fn name(&self) -> &str {
        SEARCH_PAGE_NAME
    }

    fn browser(&self) -> &Browser {
        &self.browser
    }

    fn define(schema: SchemaBuilder<Self>) -> SchemaBuilder<Self> {
        schema
            .input("q", |p| &p.q, |p| &mut p.q)
            .element("search", |p| &p.search, |p| &mut p.search)
            .action("search", 0, |page, _| Box::pin(page.search()))
    }

    async fn url(&self) -> Result<String, PageError> {
        Ok(GOOGLE_URL.to_string())
    }

    async fn is_in_page(&self) -> Result<bool, PageError> {
        Ok(self.browser.driver().title().await? == "Google")
    }
}

/// Search results
pub struct GoogleResultsPage {
    browser: Browser,
    results: CollectionRef,
}

impl GoogleResultsPage {
    pub fn new(browser: &Browser) -> Self {
        Self {
            results: browser.find_all(".g"),
            browser: browser.clone(),
        }
    }
}

#[async_trait]
impl PageObject for GoogleResultsPage {
    fn name(&self) -> &str {
        RESULTS_PAGE_NAME
    }

    fn browser(&self) -> &Browser {
        &self.browser
    }

    fn define(schema: SchemaBuilder<Self>) -> SchemaBuilder<Self> {
        schema.collection("results", |p| &p.results, |p| &mut p.results)
    }

    async fn is_in_page(&self) -> Result<bool, PageError> {
        Ok(true)
    }
}
