mod template;

use crate::analysis::{FieldFlattener, PathSeparator, DEFAULT_MAX_DEPTH};
use crate::error::ConsoleError;
use crate::locale::{LocaleTable, MessageKey};
use json_comments::StripComments;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;
use url::Url;

pub use template::CONFIG_TEMPLATE;

pub const DEFAULT_BASE_URL: &str = "http://localhost:8080/api";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_path_separator() -> String {
    PathSeparator::default().to_string()
}

fn default_max_depth() -> usize {
    DEFAULT_MAX_DEPTH
}

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
pub struct ConsoleConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_path_separator")]
    pub path_separator: String,
    #[serde(default = "default_max_depth")]
    pub max_depth: usize,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default)]
    pub messages: HashMap<MessageKey, String>,
}

impl Default for ConsoleConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            path_separator: default_path_separator(),
            max_depth: default_max_depth(),
            timeout_secs: default_timeout_secs(),
            messages: HashMap::new(),
        }
    }
}

impl ConsoleConfig {
    /// Loads a JSON config file; `//` and `/* */` comments are allowed.
    pub fn from_file<P: Into<PathBuf>>(path: P) -> Result<Self, ConsoleError> {
        let path = path.into();
        tracing::info!("Loading console config from {:?}", path);
        let file = std::fs::File::open(&path)?;
        let config = serde_json::from_reader(StripComments::new(file))?;
        tracing::info!("Successfully loaded console config: {}", path.display());
        Ok(config)
    }

    pub fn from_content(content: &str) -> Result<Self, ConsoleError> {
        Ok(serde_json::from_reader(StripComments::new(
            content.as_bytes(),
        ))?)
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn validate(&self) -> Result<(), ConsoleError> {
        tracing::info!("Validating console config...");

        let url = Url::parse(&self.base_url).map_err(|e| {
            tracing::error!("Invalid base URL: {}", self.base_url);
            ConsoleError::Config(format!("baseUrl '{}' is not a valid URL: {}", self.base_url, e))
        })?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(ConsoleError::Config(format!(
                "baseUrl must use http or https, found '{}'",
                url.scheme()
            )));
        }

        self.separator()?;

        if self.max_depth == 0 {
            return Err(ConsoleError::Config(
                "maxDepth must be at least 1".to_string(),
            ));
        }

        if self.timeout_secs == 0 {
            return Err(ConsoleError::Config(
                "timeoutSecs must be at least 1".to_string(),
            ));
        }

        tracing::info!("Console config validation successful");
        Ok(())
    }

    pub fn separator(&self) -> Result<PathSeparator, ConsoleError> {
        self.path_separator.parse()
    }

    pub fn flattener(&self) -> Result<FieldFlattener, ConsoleError> {
        Ok(FieldFlattener::new(self.separator()?, self.max_depth))
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn locale(&self) -> LocaleTable {
        LocaleTable::with_overrides(self.messages.clone())
    }
}
