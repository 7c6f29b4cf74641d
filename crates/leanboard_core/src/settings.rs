//! Monitor settings and their JSON encoding.
//!
//! # Responsibility
//! - Hold the selectors and marker token the monitors use.
//! - Load overrides from a JSON document, falling back to host defaults.
//!
//! # Invariants
//! - A `MonitorSettings` value always carries parsed, valid selectors.
//! - The marker token is a single non-empty class token.
//! - Unknown JSON fields are rejected instead of ignored.

use crate::host::{Selector, SelectorError};
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};

pub const DEFAULT_CONTENT_SELECTOR: &str = "#content";
pub const DEFAULT_LIST_SELECTOR: &str = ".list";
pub const DEFAULT_HEADING_SELECTOR: &str = ":scope h2";
pub const DEFAULT_COUNTER_SELECTOR: &str = ":scope .js-num-cards";
pub const DEFAULT_OVERLOADED_CLASS: &str = "leanboard-overloaded";

/// How the root monitor reacts to a content-container mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SwitchStrategy {
    /// Tear down every list monitor and rebuild the board.
    #[default]
    Rebuild,
    /// Keep monitors of surviving list regions; only add and remove.
    Reconcile,
}

impl SwitchStrategy {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Rebuild => "rebuild",
            Self::Reconcile => "reconcile",
        }
    }
}

/// Settings document as stored on disk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SettingsDocument {
    pub content_selector: String,
    pub list_selector: String,
    pub heading_selector: String,
    pub counter_selector: String,
    pub overloaded_class: String,
    pub switch_strategy: SwitchStrategy,
}

impl Default for SettingsDocument {
    fn default() -> Self {
        Self {
            content_selector: DEFAULT_CONTENT_SELECTOR.to_string(),
            list_selector: DEFAULT_LIST_SELECTOR.to_string(),
            heading_selector: DEFAULT_HEADING_SELECTOR.to_string(),
            counter_selector: DEFAULT_COUNTER_SELECTOR.to_string(),
            overloaded_class: DEFAULT_OVERLOADED_CLASS.to_string(),
            switch_strategy: SwitchStrategy::default(),
        }
    }
}

/// Validated monitor settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonitorSettings {
    pub content: Selector,
    pub list: Selector,
    pub heading: Selector,
    pub counter: Selector,
    pub overloaded_class: String,
    pub switch_strategy: SwitchStrategy,
}

impl Default for MonitorSettings {
    fn default() -> Self {
        Self::from_document(&SettingsDocument::default())
            .expect("default settings document must be valid")
    }
}

impl MonitorSettings {
    /// Validates a settings document.
    pub fn from_document(document: &SettingsDocument) -> Result<Self, SettingsError> {
        let overloaded_class = document.overloaded_class.trim();
        if overloaded_class.is_empty() || overloaded_class.contains(char::is_whitespace) {
            return Err(SettingsError::InvalidClassToken(
                document.overloaded_class.clone(),
            ));
        }

        Ok(Self {
            content: parse_selector("content_selector", &document.content_selector)?,
            list: parse_selector("list_selector", &document.list_selector)?,
            heading: parse_selector("heading_selector", &document.heading_selector)?,
            counter: parse_selector("counter_selector", &document.counter_selector)?,
            overloaded_class: overloaded_class.to_string(),
            switch_strategy: document.switch_strategy,
        })
    }

    /// Parses and validates a JSON settings document.
    pub fn from_json_str(json: &str) -> Result<Self, SettingsError> {
        let document =
            serde_json::from_str::<SettingsDocument>(json).map_err(SettingsError::Json)?;
        Self::from_document(&document)
    }

    /// Reads and validates a JSON settings file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, SettingsError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| SettingsError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&raw)
    }

    /// Returns the document form of these settings.
    pub fn to_document(&self) -> SettingsDocument {
        SettingsDocument {
            content_selector: self.content.as_str().to_string(),
            list_selector: self.list.as_str().to_string(),
            heading_selector: self.heading.as_str().to_string(),
            counter_selector: self.counter.as_str().to_string(),
            overloaded_class: self.overloaded_class.clone(),
            switch_strategy: self.switch_strategy,
        }
    }
}

/// Settings load and validation errors.
#[derive(Debug)]
pub enum SettingsError {
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    Json(serde_json::Error),
    InvalidSelector {
        field: &'static str,
        source: SelectorError,
    },
    InvalidClassToken(String),
}

impl Display for SettingsError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io { path, source } => {
                write!(f, "failed to read settings `{}`: {source}", path.display())
            }
            Self::Json(err) => write!(f, "invalid settings document: {err}"),
            Self::InvalidSelector { field, source } => write!(f, "invalid {field}: {source}"),
            Self::InvalidClassToken(value) => {
                write!(f, "overloaded_class must be one class token, got `{value}`")
            }
        }
    }
}

impl Error for SettingsError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Json(err) => Some(err),
            Self::InvalidSelector { source, .. } => Some(source),
            Self::InvalidClassToken(_) => None,
        }
    }
}

fn parse_selector(field: &'static str, value: &str) -> Result<Selector, SettingsError> {
    Selector::parse(value).map_err(|source| SettingsError::InvalidSelector { field, source })
}
