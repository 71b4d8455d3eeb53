//! Reference data and scale factor calibration.
//!
//! The scale factor maps the raw EBIT/Revenue blend onto the price level of
//! known historical deals. Each reference example is priced with a fixed
//! baseline blend; the ratio of its known price to that baseline is its
//! individual factor, and the scale factor is the mean of those factors.

use serde::{Deserialize, Serialize};
use valuator_common::validation::{collect, require_finite, require_positive};
use valuator_common::{Validate, ValidationError, ValidationResult};

use crate::error::{Result, ValuationError};
use crate::weights::Weights;

/// A historical company with a known price.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ReferenceExample {
    pub ebit: f64,
    pub revenue: f64,
    pub price: f64,
}

impl ReferenceExample {
    pub const fn new(ebit: f64, revenue: f64, price: f64) -> Self {
        Self {
            ebit,
            revenue,
            price,
        }
    }
}

/// Static table of reference examples.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ReferenceTable {
    examples: Vec<ReferenceExample>,
}

impl Default for ReferenceTable {
    fn default() -> Self {
        Self {
            examples: vec![
                ReferenceExample::new(230.0, 2300.0, 900.0),
                ReferenceExample::new(350.0, 3500.0, 1350.0),
                ReferenceExample::new(525.0, 5250.0, 2025.0),
            ],
        }
    }
}

impl ReferenceTable {
    pub fn new(examples: Vec<ReferenceExample>) -> Self {
        Self { examples }
    }

    pub fn examples(&self) -> &[ReferenceExample] {
        &self.examples
    }

    pub fn max_revenue(&self) -> Option<f64> {
        self.examples.iter().map(|e| e.revenue).reduce(f64::max)
    }

    pub fn max_ebit(&self) -> Option<f64> {
        self.examples.iter().map(|e| e.ebit).reduce(f64::max)
    }

    /// Price every example with the baseline blend and derive the scale factor.
    pub fn calibrate(&self, baseline_ebit_weight: f64) -> Result<Calibration> {
        if self.examples.is_empty() {
            return Err(ValuationError::InvalidReference(
                "at least one reference example is required".into(),
            ));
        }

        let baseline = Weights::from_ebit(baseline_ebit_weight);
        let rows = self
            .examples
            .iter()
            .enumerate()
            .map(|(i, example)| {
                let computed = baseline.blend(example.ebit, example.revenue);
                if !computed.is_finite() || computed <= 0.0 {
                    return Err(ValuationError::InvalidReference(format!(
                        "example {i} (EBIT {}, Revenue {}) has a non-positive baseline value {computed}",
                        example.ebit, example.revenue
                    )));
                }
                Ok(CalibrationRow {
                    example: *example,
                    baseline_value: computed,
                    factor: example.price / computed,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        let scale_factor = rows.iter().map(|r| r.factor).sum::<f64>() / rows.len() as f64;

        tracing::debug!(
            examples = rows.len(),
            baseline_ebit_weight,
            scale_factor,
            "Calibrated scale factor"
        );

        Ok(Calibration {
            baseline,
            rows,
            scale_factor,
        })
    }
}

impl Validate for ReferenceTable {
    fn validate(&self) -> ValidationResult<()> {
        if self.examples.is_empty() {
            return Err(ValidationError::MissingField {
                field: "model.reference".into(),
            });
        }

        collect(self.examples.iter().enumerate().flat_map(|(i, e)| {
            [
                require_finite(&format!("model.reference[{i}].ebit"), e.ebit),
                require_positive(&format!("model.reference[{i}].revenue"), e.revenue),
                require_positive(&format!("model.reference[{i}].price"), e.price),
            ]
        }))
    }
}

impl ReferenceTable {
    /// Check that every example has a positive baseline value under the given blend.
    pub fn validate_baseline(&self, baseline_ebit_weight: f64) -> ValidationResult<()> {
        let baseline = Weights::from_ebit(baseline_ebit_weight);
        collect(self.examples.iter().enumerate().map(|(i, e)| {
            let computed = baseline.blend(e.ebit, e.revenue);
            if computed.is_finite() && computed > 0.0 {
                Ok(())
            } else {
                Err(ValidationError::invalid(
                    format!("model.reference[{i}]"),
                    format!(
                        "baseline value {computed} at EBIT weight {baseline_ebit_weight} must be positive"
                    ),
                ))
            }
        }))
    }
}

/// One reference example with its baseline value and individual factor.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CalibrationRow {
    pub example: ReferenceExample,
    pub baseline_value: f64,
    pub factor: f64,
}

/// Outcome of calibrating against a reference table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Calibration {
    pub baseline: Weights,
    pub rows: Vec<CalibrationRow>,
    pub scale_factor: f64,
}

impl Calibration {
    /// Largest relative miss between a reference price and the scaled baseline.
    pub fn max_relative_error(&self) -> f64 {
        self.rows
            .iter()
            .map(|r| ((r.baseline_value * self.scale_factor - r.example.price) / r.example.price).abs())
            .fold(0.0, f64::max)
    }
}
