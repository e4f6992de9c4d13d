//! # arcview Common Library
//!
//! Shared code for the arcview crates:
//! - Error types
//! - Configuration loading (TOML + environment)
//! - Network selection and endpoint defaults

pub mod config;
pub mod error;

pub use config::Network;
pub use error::{Error, Result};
