//! Earnout Model.
//!
//! Prices a company in two consecutive years with the valuation calculator,
//! bounded by a floor and a cap, and splits the purchase price into an
//! initial price paid in installments plus two earnout payments.
//!
//! ```text
//!            Initial Price   Earnout Year 1   Earnout Year 2   TOTAL
//!  Year 0        300               0                0           300
//!  Year 1        300           split                0           300 + split
//!  Year 2        300           split             y2 earnout     ...
//!  Total         900          2 * split          y2 earnout     price year 2
//! ```

use serde::{Deserialize, Serialize};
use valuator_common::validation::MAX_AMOUNT;
use valuator_common::{Validate, ValidationError, ValidationResult};

use crate::calculator::{ValuationCalculator, ValuationResult};
use crate::error::{Result, ValuationError};

/// Earnout parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EarnoutConfig {
    /// Amount paid in each initial installment
    #[serde(default = "default_initial_payment")]
    pub initial_payment: i64,
    /// Number of initial installments (Year 0, 1 and 2)
    #[serde(default = "default_installments")]
    pub initial_installments: u32,
    /// Price floor
    #[serde(default = "default_min_price")]
    pub min_price: f64,
    /// Price cap
    #[serde(default = "default_max_price")]
    pub max_price: f64,
}

impl Default for EarnoutConfig {
    fn default() -> Self {
        Self {
            initial_payment: default_initial_payment(),
            initial_installments: default_installments(),
            min_price: default_min_price(),
            max_price: default_max_price(),
        }
    }
}

fn default_initial_payment() -> i64 {
    300
}
fn default_installments() -> u32 {
    3
}
fn default_min_price() -> f64 {
    300.0
}
fn default_max_price() -> f64 {
    2025.0
}

impl Validate for EarnoutConfig {
    fn validate(&self) -> ValidationResult<()> {
        if self.initial_payment < 0 {
            return Err(ValidationError::invalid(
                "earnout.initial_payment",
                "must not be negative",
            ));
        }
        if self.initial_installments == 0 {
            return Err(ValidationError::invalid(
                "earnout.initial_installments",
                "must be at least 1",
            ));
        }
        if self.initial_total().is_none() {
            return Err(ValidationError::invalid(
                "earnout.initial_payment",
                format!(
                    "{} installments of {} exceed {MAX_AMOUNT}",
                    self.initial_installments, self.initial_payment
                ),
            ));
        }
        if !(self.min_price.is_finite() && self.max_price.is_finite()) || self.min_price < 0.0 {
            return Err(ValidationError::invalid(
                "earnout.min_price",
                "price bounds must be finite and non-negative",
            ));
        }
        if self.max_price > MAX_AMOUNT as f64 {
            return Err(ValidationError::invalid(
                "earnout.max_price",
                format!("must not exceed {MAX_AMOUNT}, got {}", self.max_price),
            ));
        }
        if self.min_price >= self.max_price {
            return Err(ValidationError::Conflict {
                reason: format!(
                    "earnout.min_price ({}) must be below earnout.max_price ({})",
                    self.min_price, self.max_price
                ),
            });
        }
        Ok(())
    }
}

impl EarnoutConfig {
    /// Sum of the initial installments, `None` when it exceeds [`MAX_AMOUNT`].
    pub fn initial_total(&self) -> Option<i64> {
        self.initial_payment
            .checked_mul(i64::from(self.initial_installments))
            .filter(|total| *total <= MAX_AMOUNT)
    }
}

/// Inputs for one year of the earnout.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct YearFigures {
    pub ebit: f64,
    pub revenue: f64,
}

/// Price of one year after applying the floor and cap.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct YearPrice {
    pub valuation: ValuationResult,
    /// Whole-unit price within `[min_price, max_price]`
    pub price: i64,
    pub floored: bool,
    pub capped: bool,
}

/// One row of the earnout table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EarnoutRow {
    pub label: String,
    pub initial_price: i64,
    pub earnout_year1: i64,
    pub earnout_year2: i64,
    pub total: i64,
}

/// Full two-year earnout schedule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EarnoutSchedule {
    pub year1: YearPrice,
    pub year2: YearPrice,
    pub year1_earnout: i64,
    pub year2_earnout: i64,
    pub rows: Vec<EarnoutRow>,
}

impl EarnoutSchedule {
    /// Column headers matching [`EarnoutRow`].
    pub const HEADERS: [&'static str; 5] =
        ["", "Initial Price", "Earnout Year 1", "Earnout Year 2", "TOTAL"];

    pub fn total(&self) -> i64 {
        self.rows.last().map_or(0, |r| r.total)
    }
}

/// Two-year earnout pricing on top of the valuation calculator.
#[derive(Debug, Clone)]
pub struct EarnoutModel {
    calculator: ValuationCalculator,
    config: EarnoutConfig,
}

impl EarnoutModel {
    pub fn new(calculator: ValuationCalculator, config: EarnoutConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { calculator, config })
    }

    pub fn config(&self) -> &EarnoutConfig {
        &self.config
    }

    /// Price a single year within the configured bounds.
    pub fn price(&self, figures: YearFigures) -> Result<YearPrice> {
        let valuation = self.calculator.compute(figures.ebit, figures.revenue)?;
        let raw = valuation.scaled_valuation;
        let bounded = raw.clamp(self.config.min_price, self.config.max_price);

        Ok(YearPrice {
            valuation,
            price: bounded.round() as i64,
            floored: raw < self.config.min_price,
            capped: raw > self.config.max_price,
        })
    }

    /// Build the payment schedule for two consecutive years.
    pub fn schedule(&self, year1: YearFigures, year2: YearFigures) -> Result<EarnoutSchedule> {
        let first = self.price(year1)?;
        let second = self.price(year2)?;

        let initial = self.config.initial_payment;
        let initial_total = self.config.initial_total().ok_or_else(|| {
            ValuationError::InvalidConfig("earnout initial installments overflow".into())
        })?;

        let year1_earnout = first.price - initial_total;
        let year2_earnout = second.price - first.price;
        let year1_split = (year1_earnout as f64 / 2.0).round() as i64;

        tracing::debug!(
            price1 = first.price,
            price2 = second.price,
            year1_earnout,
            year2_earnout,
            "Built earnout schedule"
        );

        let rows = vec![
            EarnoutRow {
                label: "Year 0".into(),
                initial_price: initial,
                earnout_year1: 0,
                earnout_year2: 0,
                total: initial,
            },
            EarnoutRow {
                label: "Year 1".into(),
                initial_price: initial,
                earnout_year1: year1_split,
                earnout_year2: 0,
                total: initial + year1_split,
            },
            EarnoutRow {
                label: "Year 2".into(),
                initial_price: initial,
                earnout_year1: year1_split,
                earnout_year2: year2_earnout,
                total: initial + year1_split + year2_earnout,
            },
            EarnoutRow {
                label: "Total".into(),
                initial_price: initial_total,
                earnout_year1: year1_split * 2,
                earnout_year2: year2_earnout,
                total: initial_total + year1_earnout + year2_earnout,
            },
        ];

        Ok(EarnoutSchedule {
            year1: first,
            year2: second,
            year1_earnout,
            year2_earnout,
            rows,
        })
    }
}
