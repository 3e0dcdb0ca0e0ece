//! Store configuration, read from TOML.
//!
//! ```toml
//! default_page_size = 100
//! local_page_size = 9
//! max_local_results = 600
//! ```

use crate::{DEFAULT_LOCAL_PAGE_SIZE, DEFAULT_PAGE_SIZE};
use serde::{Deserialize, Serialize};
use std::{fs, path::Path};
use thiserror::Error as ThisError;

/// Above this many entities a local list is flagged as maxed.
pub const DEFAULT_MAX_LOCAL_RESULTS: usize = 600;

///
/// ConfigError
///

#[derive(Debug, ThisError)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse store config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid store config: {0}")]
    Invalid(String),
}

///
/// StoreConfig
///

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct StoreConfig {
    /// `results-per-page` used when a section has no explicit param.
    pub default_page_size: usize,

    /// Page size for new local (client-side) paging configs.
    pub local_page_size: usize,

    pub max_local_results: usize,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            default_page_size: DEFAULT_PAGE_SIZE,
            local_page_size: DEFAULT_LOCAL_PAGE_SIZE,
            max_local_results: DEFAULT_MAX_LOCAL_RESULTS,
        }
    }
}

impl StoreConfig {
    /// Parse and validate a TOML document; missing keys take defaults.
    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(contents)?;
        config.validate()?;

        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;

        Self::from_toml_str(&contents)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.default_page_size == 0 {
            return Err(ConfigError::Invalid(
                "default_page_size must be greater than zero".to_string(),
            ));
        }
        if self.local_page_size == 0 {
            return Err(ConfigError::Invalid(
                "local_page_size must be greater than zero".to_string(),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_keys_take_defaults() {
        let config = StoreConfig::from_toml_str("local_page_size = 25\n").expect("parse");

        assert_eq!(
            config,
            StoreConfig {
                local_page_size: 25,
                ..StoreConfig::default()
            }
        );
        assert_eq!(StoreConfig::from_toml_str("").expect("empty"), StoreConfig::default());
    }

    #[test]
    fn zero_page_size_is_rejected() {
        let err = StoreConfig::from_toml_str("default_page_size = 0").expect_err("zero");
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn unknown_keys_and_bad_types_fail_to_parse() {
        assert!(matches!(
            StoreConfig::from_toml_str("page_size = 10"),
            Err(ConfigError::Parse(_))
        ));
        assert!(matches!(
            StoreConfig::from_toml_str("local_page_size = \"nine\""),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn missing_file_reports_path() {
        let err = StoreConfig::load(Path::new("/nonexistent/cfstore.toml")).expect_err("missing");
        assert!(err.to_string().contains("/nonexistent/cfstore.toml"));
    }

    #[test]
    fn serializes_back_to_toml() {
        let text = toml::to_string(&StoreConfig::default()).expect("serialize");
        assert_eq!(StoreConfig::from_toml_str(&text).expect("parse"), StoreConfig::default());
    }
}
