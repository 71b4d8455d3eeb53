//! Valuator Common - Shared plumbing for the valuator workspace.
//!
//! This crate provides:
//! - Configuration file location, loading and saving
//! - Configuration validation
//! - Error types and handling utilities
//! - Logging setup

#![warn(clippy::all)]
#![allow(clippy::pedantic)]

pub mod config;
pub mod error;
pub mod logging;
pub mod validation;

pub use config::{config_dir, config_path, ObservabilityConfig};
pub use error::{Error, Result, ResultExt};
pub use validation::{Validate, ValidationError, ValidationResult};

