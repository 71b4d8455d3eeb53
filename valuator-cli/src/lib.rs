//! Valuator CLI library.
//!
//! Configuration, prompts and report rendering used by the `valuator`
//! binary.

#![warn(clippy::all)]
#![allow(clippy::pedantic)]

pub mod config;
pub mod prompt;
pub mod render;
pub mod report;

pub use config::Config;

/// Parse a monetary amount given on the command line.
///
/// Accepts the same forms as interactive input (`1,500`, `$230`, `-40`).
pub fn parse_amount_arg(raw: &str) -> Result<f64, String> {
    valuator_core::parse_amount("value", raw).map_err(|e| e.to_string())
}
