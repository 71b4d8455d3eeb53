//! Valuator Core
//!
//! Company valuation from EBIT and Revenue.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │                           valuator-core                             │
//! ├─────────────────────────────────────────────────────────────────────┤
//! │  input ──► ValuationCalculator ──► ValuationResult ──► ChartModel   │
//! │               │        │                                            │
//! │          WeightRule  ReferenceTable ──► Calibration (scale factor)  │
//! │                                                                     │
//! │  EarnoutModel ──► EarnoutSchedule        (two-year earnout)         │
//! │  LinearValuationModel ──► LinearReport   (regression + payments)    │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Key Concepts
//!
//! ## Dynamic weighting
//! EBIT as a percentage of Revenue selects a band; the band gives the share
//! of the blend assigned to EBIT, the remainder goes to Revenue.
//!
//! ## Scale factor
//! Calibrated once against reference deals with known prices so that the
//! blend lands on the historical price level.
//!
//! # Example
//!
//! ```
//! use valuator_core::{ModelConfig, ValuationCalculator};
//!
//! let calculator = ValuationCalculator::new(ModelConfig::default())?;
//! let result = calculator.compute(230.0, 2300.0)?;
//! assert_eq!(result.weight_used, 0.3);
//! assert_eq!(result.rounded_valuation(), 891.43);
//! # Ok::<(), valuator_core::ValuationError>(())
//! ```

#![warn(clippy::all)]
#![allow(clippy::pedantic)]

pub mod calculator;
pub mod chart;
pub mod earnout;
pub mod error;
pub mod explain;
pub mod input;
pub mod linear;
pub mod payments;
pub mod reference;
pub mod weights;

pub use calculator::{ebit_percentage, ModelConfig, ValuationCalculator, ValuationResult};
pub use chart::{ChartConfig, ChartModel, ZoneConfig, ZoneKind};
pub use earnout::{EarnoutConfig, EarnoutModel, EarnoutRow, EarnoutSchedule, YearFigures};
pub use error::{Result, ValuationError};
pub use explain::describe_model;
pub use input::{parse_amount, parse_input};
pub use linear::{
    least_squares, LinearFit, LinearModelConfig, LinearReport, LinearValuation,
    LinearValuationModel, Multiples, RelationsTable,
};
pub use payments::{BuyBackTable, PaymentBreakdown};
pub use reference::{Calibration, ReferenceExample, ReferenceTable};
pub use weights::{WeightBand, WeightRule, Weights};
