//! Page registry
//!
//! Maps a page's display name, as written in scenario steps, to a constructor
//! for that page. Registering a page builds and validates its schema, so a
//! page with conflicting slot or action names is rejected before any scenario
//! runs.

use tracing::{debug, warn};

use crate::browser::Browser;
use crate::page::{schema_of, Page, PageError, PageHandle, PageObject, SlotKind};

type Factory = Box<dyn Fn(&Browser) -> Result<Box<dyn Page>, PageError> + Send + Sync>;

/// Static description of a registered page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageInfo {
    pub name: String,
    pub fields: Vec<(String, SlotKind)>,
    pub actions: Vec<(String, usize)>,
}

struct Entry {
    info: PageInfo,
    factory: Factory,
}

/// Display name to page constructor lookup
#[derive(Default)]
pub struct PageRegistry {
    entries: Vec<Entry>,
}

impl PageRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register page type `P` under `name`.
    ///
    /// Registering a name twice replaces the earlier constructor.
    pub fn register<P, F>(&mut self, name: impl Into<String>, ctor: F) -> Result<(), PageError>
    where
        P: PageObject,
        F: Fn(&Browser) -> P + Send + Sync + 'static,
    {
        let name = name.into();
        let schema = schema_of::<P>()?;
        let info = PageInfo {
            name: name.clone(),
            fields: schema
                .fields()
                .map(|f| (f.name().to_string(), f.kind()))
                .collect(),
            actions: schema.action_signatures(),
        };
        let factory: Factory =
            Box::new(move |browser: &Browser| Ok(PageHandle::boxed(ctor(browser))?));

        match self.entries.iter_mut().find(|e| e.info.name == name) {
            Some(existing) => {
                warn!("Page '{}' registered twice, keeping the latest", name);
                *existing = Entry { info, factory };
            }
            None => {
                debug!("Registered page '{}'", name);
                self.entries.push(Entry { info, factory });
            }
        }
        Ok(())
    }

    /// Build a fresh instance of the page registered as `name`
    pub fn get_page(&self, name: &str, browser: &Browser) -> Result<Box<dyn Page>, PageError> {
        let entry = self
            .entries
            .iter()
            .find(|e| e.info.name == name)
            .ok_or_else(|| PageError::PageNotMapped(name.to_string()))?;
        (entry.factory)(browser)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.iter().any(|e| e.info.name == name)
    }

    /// Registered names, in registration order
    pub fn names(&self) -> Vec<&str> {
        self.entries.iter().map(|e| e.info.name.as_str()).collect()
    }

    /// Descriptions of every registered page, in registration order
    pub fn describe(&self) -> Vec<&PageInfo> {
        self.entries.iter().map(|e| &e.info).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
