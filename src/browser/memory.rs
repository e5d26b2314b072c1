//! In-memory browser
//!
//! A `BrowserDriver` that keeps its whole "DOM" in process. Elements are
//! created the first time a selector is looked up and the same instance is
//! handed out afterwards, so a test can script an element (hide it, delay its
//! appearance, detach it) and then observe what a page did to it.
//!
//! ```
//! use natural_automation::browser::MemoryBrowser;
//!
//! let browser = MemoryBrowser::new();
//! browser.add_page("https://example.com/", "Example");
//! browser.element("#q").hide();
//! assert_eq!(browser.element("#q").clicks(), 0);
//! ```

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use super::{BrowserDriver, BrowserError, CollectionRef, Element, ElementCollection, ElementRef};

#[derive(Debug, Default)]
struct DocumentState {
    url: String,
    title: String,
    frame: Option<String>,
    visits: Vec<String>,
    titles: HashMap<String, String>,
    title_error: Option<String>,
}

/// In-process browser session
#[derive(Default)]
pub struct MemoryBrowser {
    document: Mutex<DocumentState>,
    elements: Mutex<HashMap<String, Arc<MemoryElement>>>,
    collections: Mutex<HashMap<String, Arc<MemoryCollection>>>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl MemoryBrowser {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the title served for `url`
    pub fn add_page(&self, url: &str, title: &str) {
        lock(&self.document)
            .titles
            .insert(url.to_string(), title.to_string());
    }

    /// Pretend the browser is already showing `url`
    pub fn open(&self, url: &str) {
        let mut doc = lock(&self.document);
        doc.url = url.to_string();
        doc.title = doc.titles.get(url).cloned().unwrap_or_default();
    }

    /// Override the current document title
    pub fn set_title(&self, title: &str) {
        lock(&self.document).title = title.to_string();
    }

    /// Make every `title` call fail with a server error until cleared with `None`
    pub fn fail_title(&self, message: Option<&str>) {
        lock(&self.document).title_error = message.map(str::to_string);
    }

    /// Every URL loaded through `get`, oldest first
    pub fn visits(&self) -> Vec<String> {
        lock(&self.document).visits.clone()
    }

    /// Frame currently selected, `None` for the top-level document
    pub fn frame(&self) -> Option<String> {
        lock(&self.document).frame.clone()
    }

    /// The element behind `selector`, created on first use
    pub fn element(&self, selector: &str) -> Arc<MemoryElement> {
        lock(&self.elements)
            .entry(selector.to_string())
            .or_insert_with(|| Arc::new(MemoryElement::new(selector)))
            .clone()
    }

    /// The collection behind `selector`, created empty on first use
    pub fn collection(&self, selector: &str) -> Arc<MemoryCollection> {
        lock(&self.collections)
            .entry(selector.to_string())
            .or_insert_with(|| Arc::new(MemoryCollection::new(selector)))
            .clone()
    }
}

#[async_trait]
impl BrowserDriver for MemoryBrowser {
    async fn current_url(&self) -> Result<String, BrowserError> {
        Ok(lock(&self.document).url.clone())
    }

    async fn get(&self, url: &str) -> Result<(), BrowserError> {
        let mut doc = lock(&self.document);
        doc.visits.push(url.to_string());
        doc.url = url.to_string();
        doc.title = doc.titles.get(url).cloned().unwrap_or_default();
        doc.frame = None;
        Ok(())
    }

    async fn switch_to_default_content(&self) -> Result<(), BrowserError> {
        lock(&self.document).frame = None;
        Ok(())
    }

    async fn switch_to_frame(&self, selector: &str) -> Result<(), BrowserError> {
        lock(&self.document).frame = Some(selector.to_string());
        Ok(())
    }

    async fn title(&self) -> Result<String, BrowserError> {
        let doc = lock(&self.document);
        match &doc.title_error {
            Some(message) => Err(BrowserError::ServerError(message.clone())),
            None => Ok(doc.title.clone()),
        }
    }

    fn find(&self, selector: &str) -> ElementRef {
        self.element(selector)
    }

    fn find_all(&self, selector: &str) -> CollectionRef {
        self.collection(selector)
    }
}

#[derive(Debug)]
struct ElementState {
    displayed: bool,
    attached: bool,
    hidden_polls: u32,
    value: String,
    clicks: usize,
    inputs: Vec<String>,
}

/// A scriptable control living in a `MemoryBrowser`
#[derive(Debug)]
pub struct MemoryElement {
    selector: String,
    state: Mutex<ElementState>,
}

impl MemoryElement {
    fn new(selector: &str) -> Self {
        Self {
            selector: selector.to_string(),
            state: Mutex::new(ElementState {
                displayed: true,
                attached: true,
                hidden_polls: 0,
                value: String::new(),
                clicks: 0,
                inputs: Vec::new(),
            }),
        }
    }

    pub fn show(&self) {
        lock(&self.state).displayed = true;
    }

    pub fn hide(&self) {
        lock(&self.state).displayed = false;
    }

    /// Report hidden for the next `polls` visibility checks, displayed after
    pub fn appear_after(&self, polls: u32) {
        let mut state = lock(&self.state);
        state.displayed = true;
        state.hidden_polls = polls;
    }

    /// Remove the element from the document; lookups fail until reattached
    pub fn detach(&self) {
        lock(&self.state).attached = false;
    }

    pub fn attach(&self) {
        lock(&self.state).attached = true;
    }

    pub fn current_value(&self) -> String {
        lock(&self.state).value.clone()
    }

    pub fn clicks(&self) -> usize {
        lock(&self.state).clicks
    }

    /// Every value typed into the element, oldest first
    pub fn inputs(&self) -> Vec<String> {
        lock(&self.state).inputs.clone()
    }

    fn ensure_attached(&self, state: &ElementState) -> Result<(), BrowserError> {
        if state.attached {
            Ok(())
        } else {
            Err(BrowserError::ElementNotFound(self.selector.clone()))
        }
    }
}

#[async_trait]
impl Element for MemoryElement {
    async fn click(&self) -> Result<(), BrowserError> {
        let mut state = lock(&self.state);
        self.ensure_attached(&state)?;
        state.clicks += 1;
        Ok(())
    }

    async fn input_value(&self, text: &str) -> Result<(), BrowserError> {
        let mut state = lock(&self.state);
        self.ensure_attached(&state)?;
        state.value = text.to_string();
        state.inputs.push(text.to_string());
        Ok(())
    }

    async fn is_displayed(&self) -> Result<bool, BrowserError> {
        let mut state = lock(&self.state);
        self.ensure_attached(&state)?;
        if state.hidden_polls > 0 {
            state.hidden_polls -= 1;
            return Ok(false);
        }
        Ok(state.displayed)
    }

    async fn value(&self) -> Result<String, BrowserError> {
        let state = lock(&self.state);
        self.ensure_attached(&state)?;
        Ok(state.value.clone())
    }

    fn describe(&self) -> String {
        self.selector.clone()
    }
}

/// A scriptable element list living in a `MemoryBrowser`
pub struct MemoryCollection {
    selector: String,
    items: Mutex<Vec<ElementRef>>,
}

impl MemoryCollection {
    fn new(selector: &str) -> Self {
        Self {
            selector: selector.to_string(),
            items: Mutex::new(Vec::new()),
        }
    }

    /// Replace the contents with `count` fresh, displayed elements
    pub fn fill(&self, count: usize) {
        let items = (0..count)
            .map(|i| -> ElementRef {
                Arc::new(MemoryElement::new(&format!("{} >> nth={}", self.selector, i)))
            })
            .collect();
        *lock(&self.items) = items;
    }

    pub fn clear(&self) {
        lock(&self.items).clear();
    }

    pub fn len(&self) -> usize {
        lock(&self.items).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl ElementCollection for MemoryCollection {
    async fn elements(&self) -> Result<Vec<ElementRef>, BrowserError> {
        Ok(lock(&self.items).clone())
    }

    fn describe(&self) -> String {
        self.selector.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_get_records_visit_and_title() {
        let browser = MemoryBrowser::new();
        browser.add_page("https://example.com/", "Example");

        browser.get("https://example.com/").await.unwrap();

        assert_eq!(browser.current_url().await.unwrap(), "https://example.com/");
        assert_eq!(browser.title().await.unwrap(), "Example");
        assert_eq!(browser.visits(), vec!["https://example.com/".to_string()]);
    }

    #[tokio::test]
    async fn test_fail_title() {
        let browser = MemoryBrowser::new();
        browser.fail_title(Some("target closed"));
        assert!(matches!(browser.title().await, Err(BrowserError::ServerError(_))));

        browser.fail_title(None);
        assert_eq!(browser.title().await.unwrap(), "");
    }

    #[tokio::test]
    async fn test_frames() {
        let browser = MemoryBrowser::new();
        browser.switch_to_frame("#editor").await.unwrap();
        assert_eq!(browser.frame(), Some("#editor".to_string()));

        browser.switch_to_default_content().await.unwrap();
        assert_eq!(browser.frame(), None);
    }

    #[tokio::test]
    async fn test_find_returns_same_element() {
        let browser = MemoryBrowser::new();
        let first = browser.find("#q");
        let second = browser.find("#q");
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[tokio::test]
    async fn test_element_input_and_click() {
        let browser = MemoryBrowser::new();
        let element = browser.find("#q");

        element.click().await.unwrap();
        element.input_value("rust").await.unwrap();

        let handle = browser.element("#q");
        assert_eq!(handle.clicks(), 1);
        assert_eq!(handle.current_value(), "rust");
        assert_eq!(element.value().await.unwrap(), "rust");
    }

    #[tokio::test]
    async fn test_appear_after() {
        let browser = MemoryBrowser::new();
        let handle = browser.element("#late");
        handle.appear_after(2);

        assert!(!handle.is_displayed().await.unwrap());
        assert!(!handle.is_displayed().await.unwrap());
        assert!(handle.is_displayed().await.unwrap());
    }

    #[tokio::test]
    async fn test_detached_element_errors() {
        let browser = MemoryBrowser::new();
        let handle = browser.element("#gone");
        handle.detach();

        let err = handle.click().await.unwrap_err();
        assert!(matches!(err, BrowserError::ElementNotFound(s) if s == "#gone"));
    }

    #[tokio::test]
    async fn test_collection_fill() {
        let browser = MemoryBrowser::new();
        browser.collection(".g").fill(3);

        let items = browser.find_all(".g").elements().await.unwrap();
        assert_eq!(items.len(), 3);
        assert_eq!(items[1].describe(), ".g >> nth=1");
    }
}
