//! Environment lookups for configuration objects
//!
//! Configuration structs are built from an [`EnvSource`] rather than from
//! `std::env` directly, so tests can hand in a closure over a fixed map.
//! Blank values count as unset everywhere.

use std::fmt::Display;
use std::str::FromStr;

use crate::error::{ConfigError, Result};

/// Source of configuration values
pub trait EnvSource {
    /// Raw value for `key`, if set
    fn get(&self, key: &str) -> Option<String>;

    /// Trimmed value, `None` when unset or blank
    fn optional(&self, key: &str) -> Option<String> {
        self.get(key)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    }

    /// Trimmed value, or a [`ConfigError::MissingVar`] carrying `hint`
    fn required(&self, key: &str, hint: &str) -> Result<String> {
        self.optional(key)
            .ok_or_else(|| ConfigError::missing(key, hint))
    }

    /// Parsed value, `default` when unset
    ///
    /// A value that is set but does not parse is an error, never a silent fallback.
    fn parse_or<T>(&self, key: &str, default: T) -> Result<T>
    where
        T: FromStr,
        T::Err: Display,
    {
        match self.optional(key) {
            None => Ok(default),
            Some(raw) => raw
                .parse()
                .map_err(|e: T::Err| ConfigError::invalid(key, format!("'{}': {}", raw, e))),
        }
    }
}

/// The real process environment
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessEnv;

impl EnvSource for ProcessEnv {
    fn get(&self, key: &str) -> Option<String> {
        std::env::var(key).ok()
    }
}

impl<F> EnvSource for F
where
    F: Fn(&str) -> Option<String>,
{
    fn get(&self, key: &str) -> Option<String> {
        self(key)
    }
}
