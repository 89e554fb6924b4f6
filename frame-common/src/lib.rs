//! # Frame Common Library
//!
//! Shared code for the Frame dataset tools:
//! - Error type used across crates
//! - TOML bootstrap configuration and credential resolution
//! - Tracing subscriber initialisation

pub mod config;
pub mod error;
pub mod logging;

pub use error::{Error, Result};
