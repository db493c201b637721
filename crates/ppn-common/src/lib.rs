//! PPN Common Library
#![deny(clippy::unwrap_used, clippy::expect_used)]
//!
//! Shared plumbing for the PPN Research Portal binaries.
//!
//! # Overview
//!
//! - **Error Handling**: configuration errors with remediation hints
//! - **Environment**: typed lookups used to build configuration objects
//! - **Logging**: the `tracing` bootstrap every binary calls first
//!
//! # Example
//!
//! ```no_run
//! use ppn_common::env::{EnvSource, ProcessEnv};
//!
//! fn main() -> ppn_common::Result<()> {
//!     let url = ProcessEnv.required("SUPABASE_URL", "Add it to backend/.env")?;
//!     tracing::info!(%url, "Target configured");
//!     Ok(())
//! }
//! ```

pub mod env;
pub mod error;
pub mod logging;

// Re-export commonly used types
pub use error::{ConfigError, Result};
