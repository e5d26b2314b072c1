//! Natural-language step matching
//!
//! Supported sentences, after the leading keyword is stripped:
//!
//! - `the user is in the <page> page`
//! - `the page is populated with random data`
//! - `the user does a <action>` or `the user does a <action> with "a", "b"`
//! - `there should be <field>`
//! - `the <field> should be visible`
//! - `the user fills in the fields:` followed by a key/value table
//! - `the user enters the values:` followed by a header table

use regex::Regex;
use serde_json::Value;
use std::sync::LazyLock;
use tracing::{error, info};

use super::{Scenario, ScenarioContext, ScenarioError, Step};

static USER_IN_PAGE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^the user is in the (.+) page$").unwrap());

static POPULATE_RANDOM: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^the page is populated with random data$").unwrap());

static USER_DOES: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^the user does an? (\S+)(?: with (.+))?$").unwrap());

static THERE_SHOULD_BE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^there should be (.+)$").unwrap());

static SHOULD_BE_VISIBLE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^the (.+) should be visible$").unwrap());

static FILLS_IN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^the user fills in the fields:?$").unwrap());

static ENTERS_VALUES: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^the user enters the values:?$").unwrap());

static QUOTED: LazyLock<Regex> = LazyLock::new(|| Regex::new(r#""([^"]*)""#).unwrap());

/// Outcome of one scenario
#[derive(Debug, Clone)]
pub struct ScenarioResult {
    pub name: String,
    pub success: bool,
    pub steps_run: usize,
    pub error: Option<String>,
}

/// Dispatches parsed steps onto a `ScenarioContext`
#[derive(Debug, Default, Clone, Copy)]
pub struct StepRunner;

impl StepRunner {
    pub fn new() -> Self {
        Self
    }

    /// Run a single step against the context
    pub async fn run_step(&self, ctx: &mut ScenarioContext, step: &Step) -> Result<(), ScenarioError> {
        let text = step.text.trim();

        if let Some(caps) = USER_IN_PAGE.captures(text) {
            return ctx.given_user_in_page(&caps[1]).await;
        }

        if POPULATE_RANDOM.is_match(text) {
            return ctx.given_page_populated_random().await;
        }

        if let Some(caps) = USER_DOES.captures(text) {
            let params = caps
                .get(2)
                .map(|m| parse_params(m.as_str()))
                .unwrap_or_default();
            return ctx.when_user_does(&caps[1], params).await;
        }

        if let Some(caps) = SHOULD_BE_VISIBLE.captures(text) {
            return ctx.then_field_is_visible(&caps[1]).await;
        }

        if let Some(caps) = THERE_SHOULD_BE.captures(text) {
            return ctx.then_there_should_be(&caps[1]).await;
        }

        if FILLS_IN.is_match(text) {
            let table = step
                .table
                .as_ref()
                .ok_or_else(|| ScenarioError::MissingTable(text.to_string()))?;
            return ctx.fill_in(&table.rows).await;
        }

        if ENTERS_VALUES.is_match(text) {
            let table = step
                .table
                .as_ref()
                .ok_or_else(|| ScenarioError::MissingTable(text.to_string()))?;
            return ctx.enter_values(&table.headers, &table.rows).await;
        }

        Err(ScenarioError::UnknownStep(text.to_string()))
    }

    /// Run every step in order, stopping at the first failure. The context is
    /// torn down whatever the outcome.
    pub async fn run_scenario(&self, ctx: &mut ScenarioContext, scenario: &Scenario) -> ScenarioResult {
        info!(scenario = %scenario.name, "Running scenario");
        let mut steps_run = 0;
        let mut failure = None;

        for step in &scenario.steps {
            steps_run += 1;
            if let Err(e) = self.run_step(ctx, step).await {
                error!(
                    scenario = %scenario.name,
                    line = step.line,
                    "Step '{:?} {}' failed: {}",
                    step.keyword,
                    step.text,
                    e
                );
                failure = Some(format!("line {}: {}", step.line, e));
                break;
            }
        }

        ctx.teardown();

        ScenarioResult {
            name: scenario.name.clone(),
            success: failure.is_none(),
            steps_run,
            error: failure,
        }
    }
}

/// `"a", "b"` becomes two string parameters; unquoted text is one parameter
fn parse_params(raw: &str) -> Vec<Value> {
    let quoted: Vec<Value> = QUOTED
        .captures_iter(raw)
        .map(|c| Value::String(c[1].to_string()))
        .collect();
    if quoted.is_empty() {
        vec![Value::String(raw.trim().to_string())]
    } else {
        quoted
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_params() {
        assert_eq!(
            parse_params(r#""bob", "secret""#),
            vec![Value::from("bob"), Value::from("secret")]
        );
        assert_eq!(parse_params("rust"), vec![Value::from("rust")]);
        assert_eq!(parse_params(r#""""#), vec![Value::from("")]);
    }

    #[test]
    fn test_sentence_patterns() {
        let caps = USER_IN_PAGE.captures("the user is in the Google search page").unwrap();
        assert_eq!(&caps[1], "Google search");

        let caps = USER_DOES.captures("the user does a search").unwrap();
        assert_eq!(&caps[1], "search");
        assert!(caps.get(2).is_none());

        let caps = USER_DOES.captures(r#"the user does an login with "bob""#).unwrap();
        assert_eq!(&caps[1], "login");
        assert_eq!(caps.get(2).map(|m| m.as_str()), Some(r#""bob""#));

        assert!(SHOULD_BE_VISIBLE.is_match("the search should be visible"));
        assert!(THERE_SHOULD_BE.is_match("there should be results"));
        assert!(FILLS_IN.is_match("the user fills in the fields:"));
        assert!(ENTERS_VALUES.is_match("the user enters the values"));
        assert!(!POPULATE_RANDOM.is_match("the page is populated"));
    }
}
