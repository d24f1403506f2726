// SPDX-License-Identifier: MIT

//! Typed error handling for taco-rs
//!
//! Construction and decode failures are collected into a single
//! [`ValidationReport`] so authoring tools can show every problem at once.
//! Resolution and evaluation failures name the offending token or node path.

use std::fmt;
use thiserror::Error;

/// Top-level error type for taco-rs
#[derive(Debug, Error)]
pub enum ConditionError {
    /// One or more schema or structural violations found during construction/decode
    #[error("Invalid condition: {0}")]
    Validation(ValidationReport),

    /// The `conditionType` tag does not name a known condition kind
    #[error("Unknown condition type '{tag}' at {path}")]
    UnknownConditionType { tag: String, path: String },

    /// A context parameter has no binding at resolution time
    #[error("Unresolved context parameter '{token}' at {path}")]
    UnresolvedParameter { token: String, path: String },

    /// A bound context value has the wrong shape for the slot it fills
    #[error("Context parameter '{token}' at {path} must resolve to {expected}")]
    ContextValueType {
        token: String,
        path: String,
        expected: String,
    },

    /// A sequential variable was bound as absent after its entry failed
    #[error("Variable '{name}' referenced at {path} is absent because its condition failed")]
    AbsentVariable { name: String, path: String },

    /// A custom context parameter name is malformed or reserved
    #[error("Invalid context parameter '{token}': {reason}")]
    InvalidContextParameter { token: String, reason: String },

    /// A return value test could not compare the observed value
    #[error("Comparison failed at {path}: {message}")]
    Comparison { path: String, message: String },

    /// The external leaf executor reported a failure
    #[error("Execution of '{condition_type}' condition at {path} failed: {message}")]
    Execution {
        condition_type: String,
        path: String,
        message: String,
    },

    /// A leaf execution exceeded its time budget
    #[error("Execution at {path} timed out after {after_ms}ms")]
    Timeout { path: String, after_ms: u64 },

    /// A chain-reading leaf targets a different chain than the provider
    #[error("Condition at {path} targets chain {expected} but provider is on chain {found}")]
    ChainMismatch {
        path: String,
        expected: u64,
        found: u64,
    },

    /// A signer or chain provider call failed
    #[error("Provider error: {message}")]
    Provider { message: String },

    /// The expression envelope carries an unsupported version
    #[error("Incompatible condition expression version {found}, expected {expected}")]
    IncompatibleVersion { found: String, expected: String },

    /// Serialized payload exceeds the configured size limit
    #[error("Condition payload is {size} bytes, limit is {limit}")]
    PayloadTooLarge { size: usize, limit: usize },

    /// I/O errors
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error(transparent)]
    Json(#[from] serde_json::Error),

    /// YAML parsing errors
    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),
}

/// A single violation found while validating a condition
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationIssue {
    /// Shape, type or range violation of a field
    #[error("{path}: {message}")]
    Schema { path: String, message: String },

    /// Tree-level rule violation (arity, duplicate names, forward references, depth)
    #[error("{path}: {message}")]
    StructuralInvariant { path: String, message: String },
}

impl ValidationIssue {
    pub fn path(&self) -> &str {
        match self {
            Self::Schema { path, .. } | Self::StructuralInvariant { path, .. } => path,
        }
    }

    pub fn message(&self) -> &str {
        match self {
            Self::Schema { message, .. } | Self::StructuralInvariant { message, .. } => message,
        }
    }

    pub fn is_structural(&self) -> bool {
        matches!(self, Self::StructuralInvariant { .. })
    }
}

/// Every violation found in one validation pass
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationReport {
    issues: Vec<ValidationIssue>,
}

impl ValidationReport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn schema(&mut self, path: impl Into<String>, message: impl Into<String>) {
        self.issues.push(ValidationIssue::Schema {
            path: path.into(),
            message: message.into(),
        });
    }

    pub fn structural(&mut self, path: impl Into<String>, message: impl Into<String>) {
        self.issues.push(ValidationIssue::StructuralInvariant {
            path: path.into(),
            message: message.into(),
        });
    }

    pub fn issues(&self) -> &[ValidationIssue] {
        &self.issues
    }

    pub fn is_empty(&self) -> bool {
        self.issues.is_empty()
    }

    pub fn len(&self) -> usize {
        self.issues.len()
    }

    /// True when some issue is reported at exactly `path`
    pub fn has_path(&self, path: &str) -> bool {
        self.issues.iter().any(|i| i.path() == path)
    }

    /// Convert into `Ok(())` when empty, or the aggregated error otherwise
    pub fn into_result(self) -> Result<(), ConditionError> {
        if self.issues.is_empty() {
            Ok(())
        } else {
            Err(ConditionError::Validation(self))
        }
    }
}

impl fmt::Display for ValidationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rendered: Vec<String> = self.issues.iter().map(|i| i.to_string()).collect();
        write!(f, "{}", rendered.join("; "))
    }
}

impl ConditionError {
    /// Create an unknown condition type error
    pub fn unknown_type(tag: impl Into<String>, path: impl Into<String>) -> Self {
        Self::UnknownConditionType {
            tag: tag.into(),
            path: path.into(),
        }
    }

    /// Create an unresolved parameter error
    pub fn unresolved(token: impl Into<String>, path: impl Into<String>) -> Self {
        Self::UnresolvedParameter {
            token: token.into(),
            path: path.into(),
        }
    }

    /// Create a comparison error
    pub fn comparison(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Comparison {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Wrap a single schema violation
    pub fn schema(path: impl Into<String>, message: impl Into<String>) -> Self {
        let mut report = ValidationReport::new();
        report.schema(path, message);
        Self::Validation(report)
    }

    /// The validation report, if this is a validation failure
    pub fn report(&self) -> Option<&ValidationReport> {
        match self {
            Self::Validation(report) => Some(report),
            _ => None,
        }
    }
}
