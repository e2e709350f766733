//! Stack configuration loading and lookup.
//!
//! The configuration is an explicit struct handed to the stack program at
//! construction time; there is no global lookup. A [`StackConfig`] is
//! usually loaded from a YAML `Kumofile` and then overlaid with
//! `KUMO_CONFIG_*` / `KUMO_SECRET_*` environment variables, but tests and
//! embedders can assemble one directly with [`StackConfig::with_value`] and
//! [`StackConfig::with_secret`].
//!
//! ```yaml
//! stack_version: "1.0.0"
//! stack: dev
//! config:
//!   location: westeurope
//!   vm_name: monitored-linux-vm
//! ```
//!
//! Secrets never appear in the Kumofile; they reach the process through the
//! environment (or programmatic injection) and stay wrapped in
//! [`SecretString`] from the moment they are read.

use anyhow::{Context, Result};
use indexmap::IndexMap;
use semver::Version;
use serde::Deserialize;
use std::{fs, path::Path};

use crate::secret::SecretString;

mod diagnostics;

pub use diagnostics::{ConfigError, map_yaml_error};

/// Major stack format version this build understands.
pub const SUPPORTED_MAJOR: u64 = 1;

/// Environment prefix overriding plain configuration values.
pub const CONFIG_ENV_PREFIX: &str = "KUMO_CONFIG_";

/// Environment prefix supplying secret values.
pub const SECRET_ENV_PREFIX: &str = "KUMO_SECRET_";

/// On-disk shape of a `Kumofile`.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct Kumofile {
    /// Semantic version of the stack configuration format.
    stack_version: Version,
    /// Name of the stack instance being configured.
    stack: String,
    /// Plain string configuration values.
    #[serde(default)]
    config: IndexMap<String, String>,
}

/// Explicit configuration namespace passed into the stack program.
#[derive(Debug, Clone, Default)]
pub struct StackConfig {
    stack: String,
    values: IndexMap<String, String>,
    secrets: IndexMap<String, SecretString>,
}

impl StackConfig {
    /// Create an empty configuration for the named stack.
    #[must_use]
    pub fn new(stack: impl Into<String>) -> Self {
        Self {
            stack: stack.into(),
            values: IndexMap::new(),
            secrets: IndexMap::new(),
        }
    }

    /// Parse a `Kumofile` from a string.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] when the YAML is malformed and
    /// [`ConfigError::UnsupportedVersion`] when the declared
    /// `stack_version` has an unsupported major version.
    pub fn from_str(yaml: &str) -> Result<Self, ConfigError> {
        Self::from_str_named(yaml, "Kumofile")
    }

    /// Load a `Kumofile` from the given path.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or fails to parse.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path_ref = path.as_ref();
        let data = fs::read_to_string(path_ref)
            .with_context(|| format!("failed to read {}", path_ref.display()))?;
        Ok(Self::from_str_named(
            &data,
            &path_ref.display().to_string(),
        )?)
    }

    fn from_str_named(yaml: &str, name: &str) -> Result<Self, ConfigError> {
        let file: Kumofile =
            serde_yml::from_str(yaml).map_err(|e| map_yaml_error(&e, yaml, name))?;
        if file.stack_version.major != SUPPORTED_MAJOR {
            return Err(ConfigError::UnsupportedVersion {
                found: file.stack_version,
                supported: SUPPORTED_MAJOR,
            });
        }
        Ok(Self {
            stack: file.stack,
            values: file.config,
            secrets: IndexMap::new(),
        })
    }

    /// Overlay configuration and secret values from the process
    /// environment.
    ///
    /// `KUMO_CONFIG_VM_NAME=x` overrides the `vm_name` value;
    /// `KUMO_SECRET_ADMIN_PASSWORD=...` supplies the `admin_password`
    /// secret. Environment keys are lower-cased to form the lookup key.
    pub fn overlay_env(&mut self) {
        for (name, value) in std::env::vars_os() {
            // Skip entries that are not valid UTF-8 rather than panicking.
            let (Some(name_str), Some(value_str)) = (name.to_str(), value.to_str()) else {
                continue;
            };
            if let Some(rest) = name_str.strip_prefix(CONFIG_ENV_PREFIX) {
                self.values
                    .insert(rest.to_ascii_lowercase(), value_str.to_owned());
            } else if let Some(rest) = name_str.strip_prefix(SECRET_ENV_PREFIX) {
                self.secrets
                    .insert(rest.to_ascii_lowercase(), SecretString::new(value_str));
            }
        }
    }

    /// Add or replace a plain value, builder-style.
    #[must_use]
    pub fn with_value(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.values.insert(key.into(), value.into());
        self
    }

    /// Add or replace a secret, builder-style.
    #[must_use]
    pub fn with_secret(mut self, key: impl Into<String>, value: impl Into<SecretString>) -> Self {
        self.secrets.insert(key.into(), value.into());
        self
    }

    /// The configured stack name.
    #[must_use]
    pub fn stack(&self) -> &str {
        &self.stack
    }

    /// Look up a plain value.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    /// Look up a plain value, falling back to `default` when absent.
    #[must_use]
    pub fn get_or<'a>(&'a self, key: &str, default: &'a str) -> &'a str {
        self.get(key).unwrap_or(default)
    }

    /// Look up a plain value that must be present.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingRequiredValue`] when `key` is absent.
    pub fn require(&self, key: &str) -> Result<&str, ConfigError> {
        self.get(key).ok_or_else(|| ConfigError::MissingRequiredValue {
            key: key.to_owned(),
        })
    }

    /// Look up a secret that must be present.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingRequiredSecret`] when `key` is absent.
    pub fn require_secret(&self, key: &str) -> Result<SecretString, ConfigError> {
        self.secrets
            .get(key)
            .cloned()
            .ok_or_else(|| ConfigError::MissingRequiredSecret {
                key: key.to_owned(),
            })
    }
}
