#![allow(dead_code)]

use async_trait::async_trait;
use serde_json::Value;
use std::fs;
use std::path::Path;
use std::sync::Arc;
use tempfile::TempDir;

use natural_automation::prelude::*;
use natural_automation::{CollectionRef, Element, PageRegistry};

pub const LOGIN_URL: &str = "https://app.test/login";
pub const HOME_URL: &str = "https://app.test/home";
pub const EDITOR_URL: &str = "https://app.test/editor";

pub fn create_test_dir() -> TempDir {
    tempfile::tempdir().expect("Failed to create temp directory")
}

pub fn write_story(dir: &Path, filename: &str, content: &str) {
    fs::write(dir.join(filename), content).expect("Failed to write story file");
}

/// In-memory browser serving the login, home and editor documents
pub fn memory_browser() -> (Arc<MemoryBrowser>, Browser) {
    let memory = Arc::new(MemoryBrowser::new());
    memory.add_page(LOGIN_URL, "Sign in");
    memory.add_page(HOME_URL, "Dashboard");
    memory.add_page(EDITOR_URL, "Editor");
    let browser = Browser::new(memory.clone());
    (memory, browser)
}

pub fn registry() -> Arc<PageRegistry> {
    let mut registry = PageRegistry::new();
    registry.register("Login", LoginPage::new).unwrap();
    registry.register("Home", HomePage::new).unwrap();
    registry.register("Editor", EditorPage::new).unwrap();
    Arc::new(registry)
}

pub struct LoginPage {
    browser: Browser,
    user: ElementRef,
    password: ElementRef,
    submit: ElementRef,
    banner: ElementRef,
    errors: CollectionRef,
}

impl LoginPage {
    pub fn new(browser: &Browser) -> Self {
        Self {
            user: browser.find("#user"),
            password: browser.find("#password"),
            submit: browser.find("#submit"),
            banner: browser.find("#banner"),
            errors: browser.find_all(".error"),
            browser: browser.clone(),
        }
    }

    async fn login(&mut self) -> anyhow::Result<Transition> {
        click_when_visible(self.submit.as_ref(), self.browser.wait_options()).await?;
        Ok(Transition::to(HomePage::new(&self.browser))?)
    }

    async fn login_as(&mut self, params: Vec<Value>) -> anyhow::Result<Transition> {
        let user = params[0]
            .as_str()
            .ok_or_else(|| anyhow::anyhow!("user must be a string"))?;
        let password = params[1]
            .as_str()
            .ok_or_else(|| anyhow::anyhow!("password must be a string"))?;
        self.user.input_value(user).await?;
        self.password.input_value(password).await?;
        self.login().await
    }

    async fn refresh(&mut self) -> anyhow::Result<Transition> {
        Ok(Transition::Stay)
    }

    async fn explode(&mut self) -> anyhow::Result<Transition> {
        anyhow::bail!("backend unavailable")
    }
}

#[async_trait]
impl PageObject for LoginPage {
    fn name(&self) -> &str {
        "Login"
    }

    fn browser(&self) -> &Browser {
        &self.browser
    }

    fn define(schema: SchemaBuilder<Self>) -> SchemaBuilder<Self> {
        schema
            .input("user", |p| &p.user, |p| &mut p.user)
            .input("password", |p| &p.password, |p| &mut p.password)
            .element("submit", |p| &p.submit, |p| &mut p.submit)
            .element("banner", |p| &p.banner, |p| &mut p.banner)
            .collection("errors", |p| &p.errors, |p| &mut p.errors)
            .action("login", 0, |page, _| Box::pin(page.login()))
            .action("login", 2, |page, params| Box::pin(page.login_as(params)))
            .action("refresh", 0, |page, _| Box::pin(page.refresh()))
            .action("explode", 0, |page, _| Box::pin(page.explode()))
    }

    async fn url(&self) -> Result<String, PageError> {
        Ok(LOGIN_URL.to_string())
    }

    async fn is_in_page(&self) -> Result<bool, PageError> {
        Ok(self.browser.driver().title().await? == "Sign in")
    }
}

/// Lands wherever the browser already is
pub struct HomePage {
    browser: Browser,
    greeting: ElementRef,
    items: CollectionRef,
}

impl HomePage {
    pub fn new(browser: &Browser) -> Self {
        Self {
            greeting: browser.find("#greeting"),
            items: browser.find_all(".item"),
            browser: browser.clone(),
        }
    }
}

#[async_trait]
impl PageObject for HomePage {
    fn name(&self) -> &str {
        "Home"
    }

    fn browser(&self) -> &Browser {
        &self.browser
    }

    fn define(schema: SchemaBuilder<Self>) -> SchemaBuilder<Self> {
        schema
            .element("greeting", |p| &p.greeting, |p| &mut p.greeting)
            .collection("items", |p| &p.items, |p| &mut p.items)
    }

    async fn is_in_page(&self) -> Result<bool, PageError> {
        Ok(self.browser.driver().title().await? == "Dashboard")
    }
}

/// Lives inside an iframe
pub struct EditorPage {
    browser: Browser,
    body: ElementRef,
}

impl EditorPage {
    pub fn new(browser: &Browser) -> Self {
        Self {
            body: browser.find("#body"),
            browser: browser.clone(),
        }
    }
}

#[async_trait]
impl PageObject for EditorPage {
    fn name(&self) -> &str {
        "Editor"
    }

    fn browser(&self) -> &Browser {
        &self.browser
    }

    fn define(schema: SchemaBuilder<Self>) -> SchemaBuilder<Self> {
        schema.input("body", |p| &p.body, |p| &mut p.body)
    }

    async fn url(&self) -> Result<String, PageError> {
        Ok(EDITOR_URL.to_string())
    }

    async fn select_iframe(&self) -> Result<(), PageError> {
        Ok(self.browser.driver().switch_to_frame("#editor-frame").await?)
    }

    async fn is_in_page(&self) -> Result<bool, PageError> {
        Ok(true)
    }
}

/// Recognises itself by a marker element instead of the title
pub struct GatedPage {
    browser: Browser,
    gate: ElementRef,
}

impl GatedPage {
    pub fn new(browser: &Browser) -> Self {
        Self {
            gate: browser.find("#gate"),
            browser: browser.clone(),
        }
    }
}

#[async_trait]
impl PageObject for GatedPage {
    fn name(&self) -> &str {
        "Gated"
    }

    fn browser(&self) -> &Browser {
        &self.browser
    }

    fn define(schema: SchemaBuilder<Self>) -> SchemaBuilder<Self> {
        schema.element("gate", |p| &p.gate, |p| &mut p.gate)
    }

    async fn is_in_page(&self) -> Result<bool, PageError> {
        Ok(self.gate.is_displayed().await?)
    }
}

/// Registers the same action signature twice
pub struct DuplicateActionPage {
    browser: Browser,
}

impl DuplicateActionPage {
    pub fn new(browser: &Browser) -> Self {
        Self {
            browser: browser.clone(),
        }
    }

    async fn go(&mut self) -> anyhow::Result<Transition> {
        Ok(Transition::Stay)
    }
}

#[async_trait]
impl PageObject for DuplicateActionPage {
    fn name(&self) -> &str {
        "Duplicate action"
    }

    fn browser(&self) -> &Browser {
        &self.browser
    }

    fn define(schema: SchemaBuilder<Self>) -> SchemaBuilder<Self> {
        schema
            .action("go", 1, |page, _| Box::pin(page.go()))
            .action("go", 0, |page, _| Box::pin(page.go()))
            .action("go", 1, |page, _| Box::pin(page.go()))
    }

    async fn is_in_page(&self) -> Result<bool, PageError> {
        Ok(true)
    }
}

/// Registers the same slot name twice
pub struct DuplicateFieldPage {
    browser: Browser,
    a: ElementRef,
    b: ElementRef,
}

impl DuplicateFieldPage {
    pub fn new(browser: &Browser) -> Self {
        Self {
            a: browser.find("#a"),
            b: browser.find("#b"),
            browser: browser.clone(),
        }
    }
}

#[async_trait]
impl PageObject for DuplicateFieldPage {
    fn name(&self) -> &str {
        "Duplicate field"
    }

    fn browser(&self) -> &Browser {
        &self.browser
    }

    fn define(schema: SchemaBuilder<Self>) -> SchemaBuilder<Self> {
        schema
            .element("field", |p| &p.a, |p| &mut p.a)
            .element("field", |p| &p.b, |p| &mut p.b)
    }

    async fn is_in_page(&self) -> Result<bool, PageError> {
        Ok(true)
    }
}
