//! Page error types

use std::time::Duration;

use crate::browser::BrowserError;

/// Errors detected while building a page schema
#[derive(Debug, thiserror::Error)]
pub enum SchemaError {
    #[error("Page {page} declares field '{field}' more than once")]
    DuplicateField { page: String, field: String },

    #[error("Page {page} declares action '{action}' with {arity} parameter(s) more than once")]
    DuplicateAction {
        page: String,
        action: String,
        arity: usize,
    },

    #[error("Page {page} declares a field or action with an empty name")]
    EmptyName { page: String },
}

/// Errors raised by page operations
#[derive(Debug, thiserror::Error)]
pub enum PageError {
    #[error("Field not found: '{field}' in page '{page}'")]
    FieldNotFound { page: String, field: String },

    #[error("Action not found: '{action}' with {arity} parameter(s) in page '{page}'")]
    ActionNotFound {
        page: String,
        action: String,
        arity: usize,
    },

    #[error("Error while executing action '{action}' with {arity} parameter(s) in page '{page}': {source}")]
    ActionExecutionFailed {
        page: String,
        action: String,
        arity: usize,
        #[source]
        source: anyhow::Error,
    },

    #[error("Element '{element}' never became visible within {timeout:?}")]
    ElementNeverVisible { element: String, timeout: Duration },

    #[error("Page with title '{title}' is not what I expected.")]
    NotInPage { page: String, title: String },

    #[error("Page not mapped: {0}")]
    PageNotMapped(String),

    #[error("Field '{field}' in page '{page}' is not {expected}")]
    WrongFieldKind {
        page: String,
        field: String,
        expected: &'static str,
    },

    #[error("Import row has no '{column}' column")]
    MissingColumn { column: String },

    #[error("Schema error: {0}")]
    Schema(#[from] SchemaError),

    #[error("Browser error: {0}")]
    Browser(#[from] BrowserError),
}

impl PageError {
    pub fn is_field_not_found(&self) -> bool {
        matches!(self, PageError::FieldNotFound { .. })
    }
}
