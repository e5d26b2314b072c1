//! Page objects
//!
//! A concrete page implements `PageObject`: it says which browser it lives in,
//! how to recognise itself, and registers its element slots and actions in
//! `define`. Wrapping it in a `PageHandle` yields a `Box<dyn Page>`, the
//! name-driven surface the step layer talks to.
//!
//! ```ignore
//! struct LoginPage {
//!     browser: Browser,
//!     user: ElementRef,
//!     submit: ElementRef,
//! }
//!
//! #[async_trait]
//! impl PageObject for LoginPage {
//!     fn name(&self) -> &str {
//!         "Login"
//!     }
//!
//!     fn browser(&self) -> &Browser {
//!         &self.browser
//!     }
//!
//!     fn define(schema: SchemaBuilder<Self>) -> SchemaBuilder<Self> {
//!         schema
//!             .input("user", |p| &p.user, |p| &mut p.user)
//!             .element("submit", |p| &p.submit, |p| &mut p.submit)
//!             .action("login", 0, |page, _| Box::pin(page.login()))
//!     }
//!
//!     async fn is_in_page(&self) -> Result<bool, PageError> {
//!         Ok(self.browser.driver().title().await?.contains("Sign in"))
//!     }
//! }
//! ```
//!
//! - `schema` - name to slot/action registration
//! - `wait` - the element wait gate
//! - `import` - tabular field population
//! - `error` - page error types

use async_trait::async_trait;
use serde_json::Value;
use std::any::Any;
use std::fmt;
use tracing::{debug, error, info, warn};

pub mod error;
pub mod import;
pub mod schema;
pub mod wait;

pub use error::{PageError, SchemaError};
pub use import::{ImportRow, ImportTable, IMPORT_KEY, IMPORT_VALUE};
pub use schema::{
    schema_of, ActionFuture, FieldValue, PageSchema, SchemaBuilder, SlotKind, SlotMut, SlotRef,
};
pub use wait::{await_visible, click_when_visible, interact, WaitOptions};

use crate::browser::{Browser, ElementRef};

/// Lifecycle of a page object
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageState {
    /// Built but never navigated
    Unvisited,
    /// `navigate` is in progress
    Navigating,
    /// Navigation succeeded and the page recognised itself
    Verified,
    /// Navigation finished on a document the page does not recognise
    NotInPage,
}

/// Outcome of an action
pub enum Transition {
    /// The scenario stays on the same page
    Stay,
    /// The scenario continues on another page
    To(Box<dyn Page>),
}

impl Transition {
    /// Continue on `page`
    pub fn to<P: PageObject>(page: P) -> Result<Self, SchemaError> {
        Ok(Transition::To(PageHandle::boxed(page)?))
    }
}

impl fmt::Debug for Transition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Transition::Stay => f.write_str("Stay"),
            Transition::To(page) => f.debug_tuple("To").field(&page.name()).finish(),
        }
    }
}

/// A concrete page type
#[async_trait]
pub trait PageObject: Send + Sync + Sized + 'static {
    /// Display name used by the page registry and in diagnostics
    fn name(&self) -> &str;

    /// Browser session the page lives in
    fn browser(&self) -> &Browser;

    /// Register the page's slots and actions
    fn define(schema: SchemaBuilder<Self>) -> SchemaBuilder<Self>;

    /// URL loaded by `navigate`; defaults to wherever the browser already is
    async fn url(&self) -> Result<String, PageError> {
        Ok(self.browser().driver().current_url().await?)
    }

    /// Frame selection after loading; defaults to the top-level document
    async fn select_iframe(&self) -> Result<(), PageError> {
        Ok(self.browser().driver().switch_to_default_content().await?)
    }

    /// Whether the browser is showing this page
    async fn is_in_page(&self) -> Result<bool, PageError>;
}

/// Name-driven page surface used by the step layer
#[async_trait]
pub trait Page: Send + Sync {
    /// Display name
    fn name(&self) -> &str;

    fn state(&self) -> PageState;

    /// Registered slot names, in declaration order
    fn field_names(&self) -> Vec<String>;

    /// Registered `(action, arity)` pairs, in declaration order
    fn action_signatures(&self) -> Vec<(String, usize)>;

    fn as_any(&self) -> &dyn Any;

    /// Title of the document the browser is showing
    async fn title(&self) -> Result<String, PageError>;

    /// Load the page and verify it. A page that does not recognise the
    /// loaded document is dropped and `NotInPage` is returned instead.
    async fn navigate(self: Box<Self>) -> Result<Box<dyn Page>, PageError>;

    /// Type a generated placeholder into every input slot
    async fn fill_default_data(&mut self) -> Result<(), PageError>;

    /// Run the action registered under `action` with `params.len()` parameters
    async fn invoke_action(
        &mut self,
        action: &str,
        params: Vec<Value>,
    ) -> Result<Transition, PageError>;

    /// Current reference held by slot `field`
    fn get_field_value(&self, field: &str) -> Result<FieldValue, PageError>;

    /// Point slot `field` at another element or collection, returning the old one
    fn replace_field_value(&mut self, field: &str, value: FieldValue)
        -> Result<FieldValue, PageError>;

    /// Wait for the element, click it and type `value`
    async fn set_field_value(&mut self, field: &str, value: &str) -> Result<(), PageError>;

    /// Wait for the element and click it
    async fn click(&mut self, field: &str) -> Result<(), PageError>;

    /// Displayed state of the element, without waiting or clicking.
    /// An element the browser cannot find is reported as not visible.
    async fn is_visible(&self, field: &str) -> Result<bool, PageError>;

    /// Wait for the element, click it, then report its displayed state.
    /// An unknown field yields `false`; every other failure propagates.
    async fn validate_is_visible(&mut self, field: &str) -> Result<bool, PageError>;

    /// Apply key/value rows, one field per row
    async fn import_key_value_pairs(&mut self, rows: &[ImportRow]) -> Result<(), PageError>;

    /// Apply header-aligned rows: for each header, every row's value in turn
    async fn import_named_values(
        &mut self,
        headers: &[String],
        rows: &[ImportRow],
    ) -> Result<(), PageError>;
}

/// Title reported by `NotInPage` when the browser cannot tell what it shows
pub const UNKNOWN_TITLE: &str = "<unknown>";

/// Generated placeholder for default data
pub fn placeholder() -> String {
    uuid::Uuid::new_v4().simple().to_string()
}

/// A `PageObject` together with its schema and lifecycle state
pub struct PageHandle<P: PageObject> {
    page: P,
    schema: &'static PageSchema<P>,
    state: PageState,
}

impl<P: PageObject> PageHandle<P> {
    pub fn new(page: P) -> Result<Self, SchemaError> {
        Ok(Self {
            page,
            schema: schema_of::<P>()?,
            state: PageState::Unvisited,
        })
    }

    pub fn boxed(page: P) -> Result<Box<dyn Page>, SchemaError> {
        Ok(Box::new(Self::new(page)?))
    }

    pub fn inner(&self) -> &P {
        &self.page
    }

    pub fn inner_mut(&mut self) -> &mut P {
        &mut self.page
    }

    pub fn schema(&self) -> &'static PageSchema<P> {
        self.schema
    }

    /// Resolve a slot for reading
    pub fn resolve(&self, field: &str) -> Result<SlotRef<'_>, PageError> {
        self.schema.resolve(&self.page, field)
    }

    /// Resolve a slot for overwriting
    pub fn resolve_mut(&mut self, field: &str) -> Result<SlotMut<'_>, PageError> {
        self.schema.resolve_mut(&mut self.page, field)
    }

    fn element(&self, field: &str) -> Result<ElementRef, PageError> {
        match self.resolve(field)? {
            SlotRef::Element(element) => Ok(element.clone()),
            SlotRef::Collection(_) => Err(PageError::WrongFieldKind {
                page: self.page.name().to_string(),
                field: field.to_string(),
                expected: "a single element",
            }),
        }
    }

    fn wait_options(&self) -> WaitOptions {
        *self.page.browser().wait_options()
    }
}

#[async_trait]
impl<P: PageObject> Page for PageHandle<P> {
    fn name(&self) -> &str {
        self.page.name()
    }

    fn state(&self) -> PageState {
        self.state
    }

    fn field_names(&self) -> Vec<String> {
        self.schema.fields().map(|f| f.name().to_string()).collect()
    }

    fn action_signatures(&self) -> Vec<(String, usize)> {
        self.schema.action_signatures()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    async fn title(&self) -> Result<String, PageError> {
        Ok(self.page.browser().driver().title().await?)
    }

    async fn navigate(self: Box<Self>) -> Result<Box<dyn Page>, PageError> {
        let mut this = self;
        this.state = PageState::Navigating;

        let url = this.page.url().await?;
        info!(page = this.page.name(), url = %url, "Navigating");
        this.page.browser().driver().get(&url).await?;
        this.page.select_iframe().await?;

        if !this.page.is_in_page().await? {
            this.state = PageState::NotInPage;
            let title = match this.title().await {
                Ok(title) => title,
                Err(e) => {
                    warn!(page = this.page.name(), "Could not read the page title: {}", e);
                    UNKNOWN_TITLE.to_string()
                }
            };
            warn!(page = this.page.name(), title = %title, "Browser is not showing the expected page");
            return Err(PageError::NotInPage {
                page: this.page.name().to_string(),
                title,
            });
        }

        this.state = PageState::Verified;
        debug!(page = this.page.name(), "Page verified");
        Ok(this)
    }

    async fn fill_default_data(&mut self) -> Result<(), PageError> {
        let wait = self.wait_options();
        let inputs: Vec<(String, ElementRef)> = self
            .schema
            .input_fields()
            .filter_map(|slot| match slot.read(&self.page) {
                SlotRef::Element(element) => Some((slot.name().to_string(), element.clone())),
                SlotRef::Collection(_) => None,
            })
            .collect();

        for (name, element) in inputs {
            debug!(page = self.page.name(), field = %name, "Filling default data");
            interact(element.as_ref(), &wait, Some(&placeholder())).await?;
        }
        Ok(())
    }

    async fn invoke_action(
        &mut self,
        action: &str,
        params: Vec<Value>,
    ) -> Result<Transition, PageError> {
        let arity = params.len();
        let schema = self.schema;
        let slot = schema
            .action(action, arity)
            .ok_or_else(|| PageError::ActionNotFound {
                page: self.page.name().to_string(),
                action: action.to_string(),
                arity,
            })?;

        debug!(page = self.page.name(), action, arity, "Invoking action");
        match slot.invoke(&mut self.page, params).await {
            Ok(transition) => Ok(transition),
            Err(source) => {
                error!(page = self.page.name(), action, "Action failed: {:#}", source);
                Err(PageError::ActionExecutionFailed {
                    page: self.page.name().to_string(),
                    action: action.to_string(),
                    arity,
                    source,
                })
            }
        }
    }

    fn get_field_value(&self, field: &str) -> Result<FieldValue, PageError> {
        self.resolve(field).map(FieldValue::from).map_err(|e| {
            error!("Error when trying to get field value for field: {}. {}", field, e);
            e
        })
    }

    fn replace_field_value(
        &mut self,
        field: &str,
        value: FieldValue,
    ) -> Result<FieldValue, PageError> {
        let page = self.page.name().to_string();
        match (self.resolve_mut(field)?, value) {
            (SlotMut::Element(slot), FieldValue::Element(element)) => Ok(FieldValue::Element(
                std::mem::replace(slot, element),
            )),
            (SlotMut::Collection(slot), FieldValue::Collection(collection)) => Ok(
                FieldValue::Collection(std::mem::replace(slot, collection)),
            ),
            (SlotMut::Element(_), FieldValue::Collection(_)) => Err(PageError::WrongFieldKind {
                page,
                field: field.to_string(),
                expected: "a collection",
            }),
            (SlotMut::Collection(_), FieldValue::Element(_)) => Err(PageError::WrongFieldKind {
                page,
                field: field.to_string(),
                expected: "a single element",
            }),
        }
    }

    async fn set_field_value(&mut self, field: &str, value: &str) -> Result<(), PageError> {
        let element = self.element(field).map_err(|e| {
            error!("Error when trying to set field value for field: {}. {}", field, e);
            e
        })?;
        interact(element.as_ref(), &self.wait_options(), Some(value)).await
    }

    async fn click(&mut self, field: &str) -> Result<(), PageError> {
        let element = self.element(field).map_err(|e| {
            error!("Error when trying to click field: {}. {}", field, e);
            e
        })?;
        click_when_visible(element.as_ref(), &self.wait_options()).await
    }

    async fn is_visible(&self, field: &str) -> Result<bool, PageError> {
        let element = self.element(field)?;
        match element.is_displayed().await {
            Ok(displayed) => Ok(displayed),
            Err(crate::browser::BrowserError::ElementNotFound(_)) => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    async fn validate_is_visible(&mut self, field: &str) -> Result<bool, PageError> {
        let element = match self.element(field) {
            Ok(element) => element,
            Err(e) if e.is_field_not_found() => {
                error!("Error retrieving the element {}. {}", field, e);
                return Ok(false);
            }
            Err(e) => return Err(e),
        };
        click_when_visible(element.as_ref(), &self.wait_options()).await?;
        Ok(element.is_displayed().await?)
    }

    async fn import_key_value_pairs(&mut self, rows: &[ImportRow]) -> Result<(), PageError> {
        for row in rows {
            let field = row.require(IMPORT_KEY)?;
            let value = row.require(IMPORT_VALUE)?;
            self.set_field_value(field, value).await?;
        }
        Ok(())
    }

    async fn import_named_values(
        &mut self,
        headers: &[String],
        rows: &[ImportRow],
    ) -> Result<(), PageError> {
        for header in headers {
            for row in rows {
                let value = row.require(header)?;
                self.set_field_value(header, value).await?;
            }
        }
        Ok(())
    }
}
