//! Compiler configuration.
//!
//! Loaded from TOML; every field has a default so an empty document is a
//! valid config.
//!
//! ```toml
//! subject_variable = "instance"
//! variable_prefix = "v"
//! default_prefix = "emf"
//! max_depth = 64
//!
//! [field_predicates]
//! title = "dcterms:title"
//! ```

use crate::error::ConfigError;
use crate::fragment::{is_valid_predicate, is_valid_prefix, is_valid_variable_name};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use tracing::debug;

/// Default subject variable, bound by the query the fragment is embedded in
pub const DEFAULT_SUBJECT_VARIABLE: &str = "instance";

/// Default prefix for fresh per-criterion variables (`?v0`, `?v1`, ...)
pub const DEFAULT_VARIABLE_PREFIX: &str = "v";

/// Default namespace prefix for bare field names
pub const DEFAULT_NAMESPACE_PREFIX: &str = "emf";

/// Default maximum nesting depth of a criteria tree
pub const DEFAULT_MAX_DEPTH: usize = 64;

/// Settings that shape the emitted fragment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompilerConfig {
    /// Variable the fragment filters on, without the leading `?`
    pub subject_variable: String,
    /// Prefix for generated value variables
    pub variable_prefix: String,
    /// Namespace prefix applied to bare field names
    pub default_prefix: String,
    /// Trees deeper than this fail validation
    pub max_depth: usize,
    /// Explicit field to predicate mappings, checked before any other rule
    pub field_predicates: BTreeMap<String, String>,
}

impl Default for CompilerConfig {
    fn default() -> Self {
        Self {
            subject_variable: DEFAULT_SUBJECT_VARIABLE.to_string(),
            variable_prefix: DEFAULT_VARIABLE_PREFIX.to_string(),
            default_prefix: DEFAULT_NAMESPACE_PREFIX.to_string(),
            max_depth: DEFAULT_MAX_DEPTH,
            field_predicates: BTreeMap::new(),
        }
    }
}

impl CompilerConfig {
    /// Parse and validate a TOML document
    pub fn from_toml_str(input: &str) -> Result<Self, ConfigError> {
        let config: CompilerConfig = toml::from_str(input)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a TOML file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_toml_str(&content)?;
        debug!(
            path = %path.display(),
            mappings = config.field_predicates.len(),
            "Loaded criteria compiler config"
        );
        Ok(config)
    }

    /// Add a field mapping
    pub fn with_field_predicate(
        mut self,
        field: impl Into<String>,
        predicate: impl Into<String>,
    ) -> Self {
        self.field_predicates.insert(field.into(), predicate.into());
        self
    }

    /// Check that every setting can be rendered into valid SPARQL
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !is_valid_variable_name(&self.subject_variable) {
            return Err(ConfigError::Invalid(format!(
                "subject_variable '{}' is not a valid variable name",
                self.subject_variable
            )));
        }
        if !is_valid_variable_name(&self.variable_prefix) {
            return Err(ConfigError::Invalid(format!(
                "variable_prefix '{}' is not a valid variable name",
                self.variable_prefix
            )));
        }
        // Generated names are the prefix plus a counter and must never shadow the subject
        let shadowed = self
            .subject_variable
            .strip_prefix(self.variable_prefix.as_str())
            .is_some_and(|rest| rest.is_empty() || rest.chars().all(|c| c.is_ascii_digit()));
        if shadowed {
            return Err(ConfigError::Invalid(format!(
                "variable_prefix '{}' can generate the subject variable '{}'",
                self.variable_prefix, self.subject_variable
            )));
        }
        if !is_valid_prefix(&self.default_prefix) {
            return Err(ConfigError::Invalid(format!(
                "default_prefix '{}' is not a valid namespace prefix",
                self.default_prefix
            )));
        }
        if self.max_depth == 0 {
            return Err(ConfigError::Invalid(
                "max_depth must be at least 1".to_string(),
            ));
        }
        for (field, predicate) in &self.field_predicates {
            if !is_valid_predicate(predicate) {
                return Err(ConfigError::Invalid(format!(
                    "predicate '{}' mapped for field '{}' is neither an IRI nor a prefixed name",
                    predicate, field
                )));
            }
        }
        Ok(())
    }
}
