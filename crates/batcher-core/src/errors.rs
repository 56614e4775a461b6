//! Structured error types shared across batcher crates.

use std::collections::BTreeMap;
use std::fmt::{self, Display};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Structured payload attached to every [`BatcherError`] variant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorInfo {
    /// Stable machine readable error code, e.g. `pack.mismatch`.
    pub code: String,
    /// Human readable diagnostic message.
    pub message: String,
    /// Contextual key value pairs (paths, parameter names, offending values).
    #[serde(default)]
    pub context: BTreeMap<String, String>,
    /// Optional hint that may help the caller resolve the issue.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
}

impl ErrorInfo {
    /// Creates a new error payload with the provided code and message.
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            context: BTreeMap::new(),
            hint: None,
        }
    }

    /// Adds a context entry to the payload.
    pub fn with_context(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.context.insert(key.into(), value.into());
        self
    }

    /// Sets a human readable hint for remediation.
    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }
}

/// Canonical error type for the batcher pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Error)]
#[serde(tag = "family", content = "detail")]
pub enum BatcherError {
    /// Malformed or unreadable experiment descriptions.
    #[error("spec error: {0}")]
    Spec(ErrorInfo),
    /// Placeholder substitution failures.
    #[error("template error: {0}")]
    Template(ErrorInfo),
    /// Restricted expression parse or evaluation failures.
    #[error("expr error: {0}")]
    Expr(ErrorInfo),
    /// Pack construction and homogeneity violations.
    #[error("pack error: {0}")]
    Pack(ErrorInfo),
    /// Filesystem failures.
    #[error("io error: {0}")]
    Io(ErrorInfo),
    /// Execution backend launch failures.
    #[error("backend error: {0}")]
    Backend(ErrorInfo),
    /// Serialization failures (CSV, JSON, YAML).
    #[error("serde error: {0}")]
    Serde(ErrorInfo),
    /// Invalid run configuration or unknown registry names.
    #[error("config error: {0}")]
    Config(ErrorInfo),
}

impl Display for ErrorInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (code: {})", self.message, self.code)?;
        if !self.context.is_empty() {
            write!(f, " | context: [")?;
            for (idx, (key, value)) in self.context.iter().enumerate() {
                if idx > 0 {
                    write!(f, ", ")?;
                }
                write!(f, "{key}={value}")?;
            }
            write!(f, "]")?;
        }
        if let Some(hint) = &self.hint {
            write!(f, " | hint: {hint}")?;
        }
        Ok(())
    }
}

impl BatcherError {
    /// Returns a reference to the payload describing the error.
    pub fn info(&self) -> &ErrorInfo {
        match self {
            BatcherError::Spec(info)
            | BatcherError::Template(info)
            | BatcherError::Expr(info)
            | BatcherError::Pack(info)
            | BatcherError::Io(info)
            | BatcherError::Backend(info)
            | BatcherError::Serde(info)
            | BatcherError::Config(info) => info,
        }
    }

    /// Wraps an I/O error, recording the path it occurred on.
    pub fn io(code: &str, path: impl AsRef<std::path::Path>, err: std::io::Error) -> Self {
        BatcherError::Io(
            ErrorInfo::new(code, err.to_string())
                .with_context("path", path.as_ref().display().to_string()),
        )
    }
}
