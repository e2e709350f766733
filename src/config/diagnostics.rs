//! Translates configuration errors into actionable diagnostics.
//!
//! Parse failures keep the Kumofile source attached so miette can point at
//! the offending line; lookup failures carry stable diagnostic codes and a
//! hint naming the environment overlay that would satisfy them.

use miette::{Diagnostic, NamedSource, SourceSpan};
use semver::Version;
use thiserror::Error;

/// Errors raised while loading or querying the stack configuration.
#[derive(Debug, Error, Diagnostic)]
pub enum ConfigError {
    /// The Kumofile could not be parsed as YAML or did not match the
    /// expected structure.
    #[error("failed to parse {name}: {message}")]
    #[diagnostic(code(kumo::config::parse))]
    Parse {
        /// Display name of the configuration source.
        name: String,
        /// Parser error text.
        message: String,
        /// The configuration source, for span rendering.
        #[source_code]
        src: NamedSource<String>,
        /// Location of the parse failure, when the parser reports one.
        #[label("parse error here")]
        span: Option<SourceSpan>,
    },

    /// The Kumofile declares a stack format this build does not support.
    #[error("unsupported stack_version {found}: this build supports major version {supported}")]
    #[diagnostic(code(kumo::config::unsupported_version))]
    UnsupportedVersion {
        /// The declared version.
        found: Version,
        /// The supported major version.
        supported: u64,
    },

    /// A required plain configuration value is absent.
    #[error("missing required configuration value '{key}'")]
    #[diagnostic(
        code(kumo::config::missing_value),
        help("set it in the Kumofile `config` section or export KUMO_CONFIG_<KEY>")
    )]
    MissingRequiredValue {
        /// The absent key.
        key: String,
    },

    /// A required secret is absent.
    #[error("missing required secret '{key}'")]
    #[diagnostic(
        code(kumo::config::missing_secret),
        help("export the secret as KUMO_SECRET_<KEY>; secrets are never read from the Kumofile")
    )]
    MissingRequiredSecret {
        /// The absent secret key.
        key: String,
    },
}

/// Map a YAML parse error onto the source that produced it.
#[must_use]
pub fn map_yaml_error(err: &serde_yml::Error, src: &str, name: &str) -> ConfigError {
    let span = err
        .location()
        .map(|loc| SourceSpan::from((loc.index(), 1)));
    ConfigError::Parse {
        name: name.to_owned(),
        message: err.to_string(),
        src: NamedSource::new(name, src.to_owned()),
        span,
    }
}
