//! Error types shared by the portal crates

use thiserror::Error;

/// Result type alias for configuration loading
pub type Result<T> = std::result::Result<T, ConfigError>;

/// Configuration is missing or unusable
///
/// Messages are operator-facing: they name the variable and say how to fix it.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Missing required environment variable {var}. {hint}")]
    MissingVar { var: String, hint: String },

    #[error("Invalid value for {var}: {reason}")]
    InvalidVar { var: String, reason: String },

    #[error("Required input file not found: '{0}'. Check the path or omit it to use the default location.")]
    MissingInput(String),
}

impl ConfigError {
    /// Create a missing-variable error
    pub fn missing(var: impl Into<String>, hint: impl Into<String>) -> Self {
        Self::MissingVar {
            var: var.into(),
            hint: hint.into(),
        }
    }

    /// Create an invalid-value error
    pub fn invalid(var: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidVar {
            var: var.into(),
            reason: reason.into(),
        }
    }
}
