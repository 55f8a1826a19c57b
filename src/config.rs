//! Configuration types for paginated listings
//!
//! A configuration file declares the models keys are resolved against and the
//! listings (model + key + page size) built on them.
//!
//! ```yaml
//! models:
//!   - name: User
//!     ordering: [username]
//!     fields:
//!       - { name: username, kind: scalar, type: text }
//!   - name: Contact
//!     ordering: [last_name]
//!     fields:
//!       - { name: last_name, kind: scalar, type: text }
//!       - { name: rank, kind: scalar, type: integer, nullable: true }
//!       - { name: user, kind: to_one, model: User }
//! listings:
//!   contacts:
//!     model: Contact
//!     key: -rank
//!     per_page: 25
//! ```

use crate::error::{Error, Result};
use crate::schema::{ModelMeta, Schema, SortKey};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

/// Page size used when a listing does not set one
pub const DEFAULT_PER_PAGE: usize = 25;

fn default_per_page() -> usize {
    DEFAULT_PER_PAGE
}

// ============================================================================
// Listing Config
// ============================================================================

/// Settings of one paginated listing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaginatorConfig {
    /// Model of the listed records
    pub model: String,

    /// Key, e.g. `last_name`, `-rank` or `user.username`
    pub key: String,

    /// Records per page (must be greater than 1)
    #[serde(default = "default_per_page")]
    pub per_page: usize,
}

impl PaginatorConfig {
    /// Create a listing config with the default page size
    pub fn new(model: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            key: key.into(),
            per_page: DEFAULT_PER_PAGE,
        }
    }

    /// Set the page size
    #[must_use]
    pub fn with_per_page(mut self, per_page: usize) -> Self {
        self.per_page = per_page;
        self
    }

    /// Check the settings that do not need a schema
    pub fn validate(&self) -> Result<()> {
        if self.model.is_empty() {
            return Err(Error::config("Listing model cannot be empty"));
        }
        if self.key.is_empty() || self.key == "-" {
            return Err(Error::config("Listing key cannot be empty"));
        }
        if self.per_page <= 1 {
            return Err(Error::config(format!(
                "per_page must be greater than 1 (got {})",
                self.per_page
            )));
        }
        Ok(())
    }
}

// ============================================================================
// Top-Level Config
// ============================================================================

/// Complete configuration loaded from YAML
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Models keys are resolved against
    #[serde(default)]
    pub models: Vec<ModelMeta>,

    /// Listings by name
    #[serde(default)]
    pub listings: BTreeMap<String, PaginatorConfig>,
}

impl Config {
    /// Build the schema declared by `models`
    pub fn schema(&self) -> Result<Schema> {
        Schema::from_models(self.models.iter().cloned())
    }

    /// Get a listing by name
    pub fn listing(&self, name: &str) -> Result<&PaginatorConfig> {
        self.listings
            .get(name)
            .ok_or_else(|| Error::config(format!("Unknown listing \"{name}\"")))
    }

    /// Check the schema and resolve the key of every listing
    pub fn validate(&self) -> Result<()> {
        let schema = self.schema()?;

        for (name, listing) in &self.listings {
            listing
                .validate()
                .and_then(|()| SortKey::resolve(&schema, &listing.model, &listing.key))
                .map_err(|e| Error::config(format!("Listing \"{name}\": {}", config_message(e))))?;
        }

        Ok(())
    }
}

fn config_message(error: Error) -> String {
    match error {
        Error::Config { message } => message,
        other => other.to_string(),
    }
}

// ============================================================================
// Loading
// ============================================================================

/// Load and validate a configuration file
pub fn load_config(path: impl AsRef<Path>) -> Result<Config> {
    let content = fs::read_to_string(path).map_err(Error::Io)?;
    load_config_from_str(&content)
}

/// Load and validate a configuration from a YAML string
pub fn load_config_from_str(yaml: &str) -> Result<Config> {
    let config: Config = serde_yaml::from_str(yaml)?;
    config.validate()?;
    Ok(config)
}
