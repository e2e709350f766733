//! Apply report parsing and export resolution.
//!
//! The engine writes a JSON report when an apply completes: an outcome plus
//! the resolved attribute tree of every resource it reconciled. Deferred
//! references recorded in the graph are resolved against that report — an
//! explicit post-completion step, so the data flow stays testable without a
//! live cloud backend.

use indexmap::IndexMap;
use miette::Diagnostic;
use serde::Deserialize;
use std::{fs, io, path::Path};
use thiserror::Error;

use crate::resource::Value;
use crate::secret::REDACTED;

/// Failures raised while reading a report or resolving exports against it.
#[derive(Debug, Error, Diagnostic)]
pub enum ReportError {
    /// The report file could not be read.
    #[error("failed to read report at {path}")]
    #[diagnostic(code(kumo::report::read))]
    Read {
        /// Path the engine was asked to write the report to.
        path: String,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },

    /// The report was not valid JSON of the expected shape.
    #[error("failed to parse apply report")]
    #[diagnostic(code(kumo::report::parse))]
    Parse(#[from] serde_json::Error),

    /// The engine reported a failed apply.
    #[error("engine reported a failed apply")]
    #[diagnostic(
        code(kumo::report::apply_failed),
        help("inspect the engine output above for the failing resource")
    )]
    ApplyFailed,

    /// The report does not mention the referenced resource.
    #[error("report has no resource '{resource}'")]
    #[diagnostic(code(kumo::report::unknown_resource))]
    UnknownResource {
        /// The missing resource name.
        resource: String,
    },

    /// The referenced attribute is absent from the resource's resolved tree.
    #[error("resource '{resource}' has no attribute '{path}'")]
    #[diagnostic(code(kumo::report::missing_attribute))]
    MissingAttribute {
        /// The producing resource.
        resource: String,
        /// The dotted attribute path that failed to resolve.
        path: String,
    },

    /// The referenced attribute resolved to a list or object.
    #[error("attribute '{path}' of '{resource}' is not a scalar")]
    #[diagnostic(code(kumo::report::non_scalar))]
    NonScalar {
        /// The producing resource.
        resource: String,
        /// The attribute path.
        path: String,
    },

    /// The exported value itself is a list or map, which has no single
    /// string rendering.
    #[error("export values must be scalars or references")]
    #[diagnostic(code(kumo::report::unsupported_export))]
    UnsupportedExport,
}

/// Outcome recorded by the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    /// Every resource reconciled.
    Succeeded,
    /// The apply stopped before completion.
    Failed,
}

/// The engine's completion report.
#[derive(Debug, Deserialize)]
pub struct ApplyReport {
    outcome: Outcome,
    #[serde(default)]
    resources: IndexMap<String, serde_json::Value>,
}

impl ApplyReport {
    /// Parse a report from a JSON string.
    ///
    /// # Errors
    ///
    /// Returns [`ReportError::Parse`] on malformed input.
    pub fn from_str(json: &str) -> Result<Self, ReportError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Read and parse a report file.
    ///
    /// # Errors
    ///
    /// Returns [`ReportError::Read`] when the file cannot be read and
    /// [`ReportError::Parse`] on malformed content.
    pub fn from_path(path: &Path) -> Result<Self, ReportError> {
        let data = fs::read_to_string(path).map_err(|source| ReportError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_str(&data)
    }

    /// The recorded outcome.
    #[must_use]
    pub const fn outcome(&self) -> Outcome {
        self.outcome
    }

    /// Fail unless the engine reported success.
    ///
    /// # Errors
    ///
    /// Returns [`ReportError::ApplyFailed`] for a failed outcome.
    pub const fn ensure_succeeded(&self) -> Result<(), ReportError> {
        match self.outcome {
            Outcome::Succeeded => Ok(()),
            Outcome::Failed => Err(ReportError::ApplyFailed),
        }
    }

    /// Materialize an exported value against this report.
    ///
    /// Literals pass through unchanged, secrets stay redacted, and deferred
    /// references walk the producer's resolved attribute tree by dotted
    /// path.
    ///
    /// # Errors
    ///
    /// Returns [`ReportError::UnknownResource`],
    /// [`ReportError::MissingAttribute`], or [`ReportError::NonScalar`] when
    /// a reference cannot be resolved, and [`ReportError::UnsupportedExport`]
    /// for list or map exports.
    pub fn resolve(&self, value: &Value) -> Result<String, ReportError> {
        match value {
            Value::Literal(text) => Ok(text.clone()),
            Value::Bool(flag) => Ok(flag.to_string()),
            Value::Int(number) => Ok(number.to_string()),
            Value::Secret(_) => Ok(REDACTED.to_owned()),
            Value::Ref(attr) => {
                let tree = self.resources.get(attr.resource.as_str()).ok_or_else(|| {
                    ReportError::UnknownResource {
                        resource: attr.resource.to_string(),
                    }
                })?;
                let resolved = walk_path(tree, &attr.path).ok_or_else(|| {
                    ReportError::MissingAttribute {
                        resource: attr.resource.to_string(),
                        path: attr.path.clone(),
                    }
                })?;
                scalar_to_string(resolved).ok_or_else(|| ReportError::NonScalar {
                    resource: attr.resource.to_string(),
                    path: attr.path.clone(),
                })
            }
            Value::List(_) | Value::Map(_) => Err(ReportError::UnsupportedExport),
        }
    }
}

/// Follow a dotted attribute path through a resolved attribute tree.
fn walk_path<'a>(tree: &'a serde_json::Value, path: &str) -> Option<&'a serde_json::Value> {
    path.split('.')
        .try_fold(tree, |node, segment| node.get(segment))
}

fn scalar_to_string(value: &serde_json::Value) -> Option<String> {
    match value {
        serde_json::Value::String(text) => Some(text.clone()),
        serde_json::Value::Bool(flag) => Some(flag.to_string()),
        serde_json::Value::Number(number) => Some(number.to_string()),
        serde_json::Value::Null | serde_json::Value::Array(_) | serde_json::Value::Object(_) => {
            None
        }
    }
}
