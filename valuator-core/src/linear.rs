//! Linear Valuation Model.
//!
//! An alternative to the weighted calculator: two least-squares lines fitted
//! through reference deals (valuation vs EBIT, valuation vs Revenue) are
//! averaged, with fixed prices for known combinations, input ceilings, a
//! low-margin EBIT multiple cap and a valuation floor/ceiling.

use serde::{Deserialize, Serialize};
use valuator_common::validation::{collect, require_amount, require_positive};
use valuator_common::{Validate, ValidationError, ValidationResult};

use crate::error::{ensure_finite, Result, ValuationError};
use crate::payments::{BuyBackTable, PaymentBreakdown};

/// A combination of EBIT and Revenue with a pinned valuation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FixedCombination {
    pub ebit: f64,
    pub revenue: f64,
    pub valuation: i64,
}

impl FixedCombination {
    pub const fn new(ebit: f64, revenue: f64, valuation: i64) -> Self {
        Self {
            ebit,
            revenue,
            valuation,
        }
    }
}

/// Parameters of the linear model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinearModelConfig {
    #[serde(default = "default_ebit_points")]
    pub ebit_points: Vec<f64>,
    #[serde(default = "default_revenue_points")]
    pub revenue_points: Vec<f64>,
    /// Known valuations, paired index-wise with the EBIT and Revenue points
    #[serde(default = "default_valuations")]
    pub valuations: Vec<f64>,
    /// Owner's income added to EBIT for the SDI multiple and buy-back table
    #[serde(default = "default_seller_income")]
    pub seller_income: f64,
    /// Price paid regardless of performance
    #[serde(default = "default_base_price")]
    pub base_price: i64,
    #[serde(default = "default_valuation_floor")]
    pub valuation_floor: i64,
    #[serde(default = "default_valuation_ceiling")]
    pub valuation_ceiling: i64,
    #[serde(default = "default_ebit_ceiling")]
    pub ebit_ceiling: f64,
    #[serde(default = "default_revenue_ceiling")]
    pub revenue_ceiling: f64,
    #[serde(default = "default_fixed_combinations")]
    pub fixed_combinations: Vec<FixedCombination>,
    /// Below this EBIT/Revenue ratio the valuation is capped at a multiple of EBIT
    #[serde(default = "default_low_margin_threshold")]
    pub low_margin_threshold: f64,
    #[serde(default = "default_low_margin_multiplier")]
    pub low_margin_multiplier: f64,
}

impl Default for LinearModelConfig {
    fn default() -> Self {
        Self {
            ebit_points: default_ebit_points(),
            revenue_points: default_revenue_points(),
            valuations: default_valuations(),
            seller_income: default_seller_income(),
            base_price: default_base_price(),
            valuation_floor: default_valuation_floor(),
            valuation_ceiling: default_valuation_ceiling(),
            ebit_ceiling: default_ebit_ceiling(),
            revenue_ceiling: default_revenue_ceiling(),
            fixed_combinations: default_fixed_combinations(),
            low_margin_threshold: default_low_margin_threshold(),
            low_margin_multiplier: default_low_margin_multiplier(),
        }
    }
}

fn default_ebit_points() -> Vec<f64> {
    vec![220.0, 350.0, 550.0]
}
fn default_revenue_points() -> Vec<f64> {
    vec![2200.0, 3500.0, 5500.0]
}
fn default_valuations() -> Vec<f64> {
    vec![800.0, 1350.0, 2020.0]
}
fn default_seller_income() -> f64 {
    220.0
}
fn default_base_price() -> i64 {
    800
}
fn default_valuation_floor() -> i64 {
    750
}
fn default_valuation_ceiling() -> i64 {
    2020
}
fn default_ebit_ceiling() -> f64 {
    750.0
}
fn default_revenue_ceiling() -> f64 {
    5500.0
}
fn default_fixed_combinations() -> Vec<FixedCombination> {
    vec![
        FixedCombination::new(0.0, 0.0, 750),
        FixedCombination::new(220.0, 2200.0, 800),
        FixedCombination::new(350.0, 3500.0, 1350),
        FixedCombination::new(550.0, 5500.0, 2020),
    ]
}
fn default_low_margin_threshold() -> f64 {
    0.09
}
fn default_low_margin_multiplier() -> f64 {
    3.7
}

impl Validate for LinearModelConfig {
    fn validate(&self) -> ValidationResult<()> {
        let n = self.valuations.len();
        let mut checks = Vec::new();

        if self.ebit_points.len() != n || self.revenue_points.len() != n {
            checks.push(Err(ValidationError::Conflict {
                reason: format!(
                    "linear.ebit_points ({}), linear.revenue_points ({}) and linear.valuations ({n}) must have the same length",
                    self.ebit_points.len(),
                    self.revenue_points.len()
                ),
            }));
        }
        if n < 2 {
            checks.push(Err(ValidationError::invalid(
                "linear.valuations",
                "at least two reference points are required for a fit",
            )));
        }
        checks.push(require_distinct("linear.ebit_points", &self.ebit_points));
        checks.push(require_distinct("linear.revenue_points", &self.revenue_points));
        checks.push(require_amount("linear.base_price", self.base_price));
        checks.push(require_amount("linear.valuation_floor", self.valuation_floor));
        checks.push(require_amount("linear.valuation_ceiling", self.valuation_ceiling));
        for (i, fixed) in self.fixed_combinations.iter().enumerate() {
            checks.push(require_amount(
                &format!("linear.fixed_combinations[{i}].valuation"),
                fixed.valuation,
            ));
        }
        if self.valuation_floor > self.valuation_ceiling {
            checks.push(Err(ValidationError::Conflict {
                reason: "linear.valuation_floor exceeds linear.valuation_ceiling".into(),
            }));
        }
        checks.push(require_positive("linear.ebit_ceiling", self.ebit_ceiling));
        checks.push(require_positive("linear.revenue_ceiling", self.revenue_ceiling));
        checks.push(require_positive("linear.low_margin_multiplier", self.low_margin_multiplier));
        if !(self.seller_income.is_finite() && self.seller_income >= 0.0) {
            checks.push(Err(ValidationError::invalid(
                "linear.seller_income",
                "must be a non-negative number",
            )));
        }

        collect(checks)
    }
}

/// A regression needs at least two distinct x values.
fn require_distinct(field: &str, points: &[f64]) -> ValidationResult<()> {
    let Some(first) = points.first() else {
        return Ok(());
    };
    if points.iter().any(|p| !p.is_finite()) {
        return Err(ValidationError::invalid(field, "points must be finite"));
    }
    if points.len() >= 2 && points.iter().all(|p| p == first) {
        return Err(ValidationError::invalid(
            field,
            format!("points must not all be equal ({first})"),
        ));
    }
    Ok(())
}

/// Slope and intercept of a least-squares line.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LinearFit {
    pub slope: f64,
    pub intercept: f64,
}

impl LinearFit {
    pub fn at(&self, x: f64) -> f64 {
        self.slope * x + self.intercept
    }
}

/// Ordinary least-squares fit of `ys` against `xs`.
pub fn least_squares(xs: &[f64], ys: &[f64]) -> Result<LinearFit> {
    if xs.len() != ys.len() {
        return Err(ValuationError::InvalidReference(format!(
            "cannot fit {} x values against {} y values",
            xs.len(),
            ys.len()
        )));
    }
    if xs.len() < 2 {
        return Err(ValuationError::InvalidReference(
            "at least two points are required for a fit".into(),
        ));
    }

    let n = xs.len() as f64;
    let sum_x: f64 = xs.iter().sum();
    let sum_y: f64 = ys.iter().sum();
    let sum_xy: f64 = xs.iter().zip(ys).map(|(x, y)| x * y).sum();
    let sum_xx: f64 = xs.iter().map(|x| x * x).sum();

    let denominator = n * sum_xx - sum_x * sum_x;
    if denominator.abs() < f64::EPSILON {
        return Err(ValuationError::InvalidReference(
            "x values are all identical; slope is undefined".into(),
        ));
    }

    let slope = (n * sum_xy - sum_x * sum_y) / denominator;
    let intercept = (sum_y - slope * sum_x) / n;
    Ok(LinearFit { slope, intercept })
}

/// Valuation produced by the linear model.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LinearValuation {
    pub ebit: f64,
    pub revenue: f64,
    pub valuation: i64,
    /// EBIT / Revenue of the raw inputs (0 when Revenue is 0)
    pub ebit_ratio: f64,
    /// Valuation came from a pinned combination
    pub fixed: bool,
    /// Low-margin EBIT multiple cap was applied
    pub low_margin_capped: bool,
}

/// Valuation relative to earnings.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Multiples {
    pub ebit_multiple: f64,
    /// Valuation over EBIT plus seller income
    pub sdi_multiple: f64,
}

/// Grid of pinned valuations: EBIT rows, Revenue columns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelationsTable {
    pub revenue_columns: Vec<f64>,
    pub rows: Vec<(f64, Vec<i64>)>,
}

/// Everything shown for one linear-model evaluation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinearReport {
    pub valuation: LinearValuation,
    pub multiples: Multiples,
    pub payments: PaymentBreakdown,
    pub buy_back: BuyBackTable,
    pub ebit_fit: LinearFit,
    pub revenue_fit: LinearFit,
}

/// Regression-based valuation model.
#[derive(Debug, Clone)]
pub struct LinearValuationModel {
    config: LinearModelConfig,
    ebit_fit: LinearFit,
    revenue_fit: LinearFit,
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

impl LinearValuationModel {
    pub fn new(config: LinearModelConfig) -> Result<Self> {
        config.validate()?;
        let ebit_fit = least_squares(&config.ebit_points, &config.valuations)?;
        let revenue_fit = least_squares(&config.revenue_points, &config.valuations)?;

        tracing::debug!(
            ebit_slope = ebit_fit.slope,
            ebit_intercept = ebit_fit.intercept,
            revenue_slope = revenue_fit.slope,
            revenue_intercept = revenue_fit.intercept,
            "Fitted linear valuation model"
        );

        Ok(Self {
            config,
            ebit_fit,
            revenue_fit,
        })
    }

    pub fn config(&self) -> &LinearModelConfig {
        &self.config
    }

    pub fn ebit_fit(&self) -> LinearFit {
        self.ebit_fit
    }

    pub fn revenue_fit(&self) -> LinearFit {
        self.revenue_fit
    }

    /// Value a company from its EBIT and Revenue.
    pub fn valuation(&self, ebit: f64, revenue: f64) -> Result<LinearValuation> {
        ensure_finite("EBIT", ebit)?;
        ensure_finite("Revenue", revenue)?;
        if ebit < 0.0 || revenue < 0.0 {
            return Err(ValuationError::input(
                if ebit < 0.0 { "EBIT" } else { "Revenue" },
                "the linear model only accepts non-negative figures",
            ));
        }

        let ebit_ratio = if revenue != 0.0 { ebit / revenue } else { 0.0 };
        let cfg = &self.config;

        if let Some(fixed) = cfg
            .fixed_combinations
            .iter()
            .find(|c| c.ebit == ebit && c.revenue == revenue)
        {
            return Ok(LinearValuation {
                ebit,
                revenue,
                valuation: fixed.valuation,
                ebit_ratio,
                fixed: true,
                low_margin_capped: false,
            });
        }

        let e = ebit.min(cfg.ebit_ceiling);
        let r = revenue.min(cfg.revenue_ceiling);
        let mut value = (self.ebit_fit.at(e) + self.revenue_fit.at(r)) / 2.0;

        let capped_ratio = if r != 0.0 { e / r } else { 0.0 };
        let mut low_margin_capped = false;
        if capped_ratio < cfg.low_margin_threshold {
            let cap = cfg.low_margin_multiplier * e;
            if cap < value {
                value = cap;
                low_margin_capped = true;
            }
        }

        let truncated = value.min(cfg.valuation_ceiling as f64).trunc() as i64;
        let valuation = truncated.max(cfg.valuation_floor);

        Ok(LinearValuation {
            ebit,
            revenue,
            valuation,
            ebit_ratio,
            fixed: false,
            low_margin_capped,
        })
    }

    /// EBIT and SDI multiples, rounded to two decimals; 0 when undefined.
    pub fn multiples(&self, valuation: i64, ebit: f64) -> Multiples {
        let v = valuation as f64;
        let sdi = ebit + self.config.seller_income;
        Multiples {
            ebit_multiple: if ebit != 0.0 { round2(v / ebit) } else { 0.0 },
            sdi_multiple: if sdi != 0.0 { round2(v / sdi) } else { 0.0 },
        }
    }

    /// Pinned valuations laid out by EBIT (rows) and Revenue (columns).
    pub fn relations_table(&self) -> RelationsTable {
        let cfg = &self.config;
        let revenue_columns: Vec<f64> =
            std::iter::once(0.0).chain(cfg.revenue_points.iter().copied()).collect();

        let rows = std::iter::once(0.0)
            .chain(cfg.ebit_points.iter().copied())
            .map(|ebit| {
                let values = revenue_columns
                    .iter()
                    .map(|&revenue| {
                        cfg.fixed_combinations
                            .iter()
                            .find(|c| c.ebit == ebit && c.revenue == revenue)
                            .map_or(0, |c| c.valuation)
                    })
                    .collect();
                (ebit, values)
            })
            .collect();

        RelationsTable {
            revenue_columns,
            rows,
        }
    }

    /// Valuation plus payment schedule and buy-back analysis.
    pub fn report(&self, ebit: f64, revenue: f64) -> Result<LinearReport> {
        let valuation = self.valuation(ebit, revenue)?;
        let multiples = self.multiples(valuation.valuation, ebit);
        let payments = PaymentBreakdown::calculate(self.config.base_price, valuation.valuation);
        let buy_back = BuyBackTable::build(ebit, self.config.seller_income, &payments);

        Ok(LinearReport {
            valuation,
            multiples,
            payments,
            buy_back,
            ebit_fit: self.ebit_fit,
            revenue_fit: self.revenue_fit,
        })
    }
}
