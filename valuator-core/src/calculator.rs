//! Valuation Calculator.
//!
//! Blends EBIT and Revenue with a weight chosen from EBIT as a percentage of
//! Revenue, then scales the blend by the reference-calibrated scale factor.
//!
//! ```text
//! ebit_pct  = ebit / revenue * 100
//! w         = WeightRule(ebit_pct)
//! blended   = w * ebit + (1 - w) * revenue
//! valuation = blended * scale_factor
//! ```

use serde::{Deserialize, Serialize};
use valuator_common::validation::{collect, require_fraction};
use valuator_common::{Validate, ValidationResult};

use crate::error::{ensure_finite, Result, ValuationError};
use crate::reference::{Calibration, ReferenceTable};
use crate::weights::{BandMatch, WeightRule};

/// Immutable configuration of the valuation model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelConfig {
    /// Threshold bands selecting the EBIT weight
    #[serde(default)]
    pub weights: WeightRule,

    /// Historical examples used to calibrate the scale factor
    #[serde(default)]
    pub reference: ReferenceTable,

    /// EBIT weight of the blend used when calibrating against the reference table
    #[serde(default = "default_baseline_ebit_weight")]
    pub baseline_ebit_weight: f64,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            weights: WeightRule::default(),
            reference: ReferenceTable::default(),
            baseline_ebit_weight: default_baseline_ebit_weight(),
        }
    }
}

fn default_baseline_ebit_weight() -> f64 {
    0.3
}

impl Validate for ModelConfig {
    fn validate(&self) -> ValidationResult<()> {
        let baseline = require_fraction("model.baseline_ebit_weight", self.baseline_ebit_weight);
        let baseline_usable = baseline.is_ok();
        let reference = self.reference.validate().and_then(|()| {
            if baseline_usable {
                self.reference.validate_baseline(self.baseline_ebit_weight)
            } else {
                Ok(())
            }
        });
        collect([self.weights.validate(), reference, baseline])
    }
}

/// Outcome of a single valuation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ValuationResult {
    pub ebit: f64,
    pub revenue: f64,
    /// EBIT as a percentage of Revenue
    pub ebit_pct: f64,
    /// EBIT weight selected by the weight rule
    pub weight_used: f64,
    pub revenue_weight: f64,
    /// Index of the band that supplied the weight
    pub band_index: usize,
    pub blended_value: f64,
    pub scale_factor: f64,
    pub scaled_valuation: f64,
}

impl ValuationResult {
    /// Valuation rounded to cents, as displayed.
    pub fn rounded_valuation(&self) -> f64 {
        (self.scaled_valuation * 100.0).round() / 100.0
    }

    /// Multi-line explanation of how the valuation was reached.
    pub fn explain(&self) -> String {
        format!(
            "The price was calculated using a dynamic weighting based on EBIT as a percentage of Revenue ({:.2}%).\n\
             EBIT weighting used: {:.2}, Revenue weighting used: {:.2}.\n\
             The scaling factor applied was: {:.4}.",
            self.ebit_pct, self.weight_used, self.revenue_weight, self.scale_factor
        )
    }
}

/// Stateless valuation calculator.
///
/// Owns its configuration and the calibration derived from it; every call to
/// [`ValuationCalculator::compute`] is a pure function of its arguments.
#[derive(Debug, Clone)]
pub struct ValuationCalculator {
    config: ModelConfig,
    calibration: Calibration,
}

impl ValuationCalculator {
    /// Validate the configuration and calibrate the scale factor.
    pub fn new(config: ModelConfig) -> Result<Self> {
        config.validate()?;
        let calibration = config.reference.calibrate(config.baseline_ebit_weight)?;

        tracing::debug!(
            bands = config.weights.bands().len(),
            scale_factor = calibration.scale_factor,
            "Valuation calculator ready"
        );

        Ok(Self {
            config,
            calibration,
        })
    }

    pub fn config(&self) -> &ModelConfig {
        &self.config
    }

    pub fn calibration(&self) -> &Calibration {
        &self.calibration
    }

    pub fn scale_factor(&self) -> f64 {
        self.calibration.scale_factor
    }

    /// Band that applies to the given figures.
    pub fn band_for(&self, ebit: f64, revenue: f64) -> Result<BandMatch> {
        let ebit_pct = ebit_percentage(ebit, revenue)?;
        self.config.weights.select(ebit_pct).ok_or_else(|| {
            ValuationError::InvalidConfig(format!("no weight band covers {ebit_pct}%"))
        })
    }

    /// Compute the valuation of a company.
    pub fn compute(&self, ebit: f64, revenue: f64) -> Result<ValuationResult> {
        let ebit_pct = ebit_percentage(ebit, revenue)?;
        let band = self.band_for(ebit, revenue)?;

        if revenue < 0.0 {
            tracing::warn!(revenue, "Negative revenue; valuation is unlikely to be meaningful");
        }

        let blended_value = band.weights.blend(ebit, revenue);
        let scaled_valuation = blended_value * self.calibration.scale_factor;

        tracing::debug!(
            ebit,
            revenue,
            ebit_pct,
            band = band.index,
            weight = band.weights.ebit,
            scaled_valuation,
            "Computed valuation"
        );

        Ok(ValuationResult {
            ebit,
            revenue,
            ebit_pct,
            weight_used: band.weights.ebit,
            revenue_weight: band.weights.revenue,
            band_index: band.index,
            blended_value,
            scale_factor: self.calibration.scale_factor,
            scaled_valuation,
        })
    }
}

/// EBIT as a percentage of Revenue, rejecting inputs where it is undefined.
///
/// A ratio too large for `f64` saturates at `±f64::MAX`, which still lands
/// in the first or last weight band.
pub fn ebit_percentage(ebit: f64, revenue: f64) -> Result<f64> {
    ensure_finite("EBIT", ebit)?;
    ensure_finite("Revenue", revenue)?;
    if revenue == 0.0 {
        return Err(ValuationError::input(
            "Revenue",
            "must not be zero (EBIT percentage is undefined)",
        ));
    }

    Ok((ebit / revenue * 100.0).clamp(-f64::MAX, f64::MAX))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reference::ReferenceExample;
    use crate::weights::WeightBand;

    fn calculator() -> ValuationCalculator {
        ValuationCalculator::new(ModelConfig::default()).unwrap()
    }

    #[test]
    fn test_low_margin_example() {
        let result = calculator().compute(100.0, 1000.0).unwrap();

        assert!((result.ebit_pct - 10.0).abs() < 1e-12);
        assert_eq!(result.weight_used, 0.3);
        assert!((result.blended_value - 730.0).abs() < 1e-9);
        assert!((result.scaled_valuation - 730.0 * result.scale_factor).abs() < 1e-9);
        assert!((result.scaled_valuation - 387.58).abs() < 0.01);
    }

    #[test]
    fn test_high_margin_example_differs() {
        let calc = calculator();
        let low = calc.compute(100.0, 1000.0).unwrap();
        let high = calc.compute(300.0, 1000.0).unwrap();

        assert_eq!(high.weight_used, 0.2);
        assert!((high.blended_value - 860.0).abs() < 1e-9);
        assert_ne!(low.weight_used, high.weight_used);
        assert_ne!(low.scaled_valuation, high.scaled_valuation);
    }

    #[test]
    fn test_reference_company_default_inputs() {
        let result = calculator().compute(230.0, 2300.0).unwrap();
        assert_eq!(result.rounded_valuation(), 891.43);
    }

    #[test]
    fn test_zero_revenue_rejected() {
        let calc = calculator();
        for ebit in [-100.0, 0.0, 250.0] {
            let err = calc.compute(ebit, 0.0).unwrap_err();
            assert!(err.is_invalid_input(), "ebit {ebit}: {err}");
        }
    }

    #[test]
    fn test_non_finite_rejected() {
        let calc = calculator();
        assert!(calc.compute(f64::NAN, 1000.0).unwrap_err().is_invalid_input());
        assert!(calc.compute(100.0, f64::INFINITY).unwrap_err().is_invalid_input());
    }

    #[test]
    fn test_overflowing_ratio_saturates_into_outer_bands() {
        let calc = calculator();

        let huge = calc.compute(1.0e300, 1.0e-10).unwrap();
        assert_eq!(huge.ebit_pct, f64::MAX);
        assert_eq!(huge.weight_used, 0.05);
        assert!(huge.scaled_valuation.is_finite());

        let extreme = calc.compute(f64::MAX, f64::MIN_POSITIVE).unwrap();
        assert_eq!(extreme.weight_used, 0.05);
        assert!(extreme.scaled_valuation.is_finite());

        let loss = calc.compute(-1.0e300, 1.0e-10).unwrap();
        assert_eq!(loss.ebit_pct, -f64::MAX);
        assert_eq!(loss.weight_used, 0.9);
        assert!(loss.scaled_valuation.is_finite());
    }

    #[test]
    fn test_negative_ebit_uses_lowest_band() {
        let result = calculator().compute(-50.0, 1000.0).unwrap();
        assert_eq!(result.weight_used, 0.9);
        assert_eq!(result.band_index, 0);
        assert!(result.scaled_valuation.is_finite());
    }

    #[test]
    fn test_deterministic() {
        let calc = calculator();
        assert_eq!(calc.compute(420.0, 3100.0), calc.compute(420.0, 3100.0));
    }

    #[test]
    fn test_alternate_config() {
        let config = ModelConfig {
            weights: WeightRule::new(vec![WeightBand::new(20.0, 1.0), WeightBand::open(0.0)]),
            reference: ReferenceTable::new(vec![ReferenceExample::new(100.0, 1000.0, 1460.0)]),
            baseline_ebit_weight: 0.3,
        };
        let calc = ValuationCalculator::new(config).unwrap();
        assert!((calc.scale_factor() - 2.0).abs() < 1e-12);

        let ebit_only = calc.compute(100.0, 1000.0).unwrap();
        assert!((ebit_only.scaled_valuation - 200.0).abs() < 1e-9);

        let revenue_only = calc.compute(500.0, 1000.0).unwrap();
        assert!((revenue_only.scaled_valuation - 2000.0).abs() < 1e-9);
    }

    #[test]
    fn test_invalid_config_rejected() {
        let config = ModelConfig {
            baseline_ebit_weight: 2.0,
            ..Default::default()
        };
        assert!(matches!(
            ValuationCalculator::new(config),
            Err(ValuationError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_reference_with_negative_baseline_is_a_config_error() {
        let config = ModelConfig {
            reference: ReferenceTable::new(vec![ReferenceExample::new(-10_000.0, 100.0, 900.0)]),
            ..Default::default()
        };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("model.reference[0]"));
        assert!(matches!(
            ValuationCalculator::new(config),
            Err(ValuationError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_explain_mentions_weights() {
        let text = calculator().compute(230.0, 2300.0).unwrap().explain();
        assert!(text.contains("(10.00%)"));
        assert!(text.contains("EBIT weighting used: 0.30, Revenue weighting used: 0.70."));
        assert!(text.contains("0.5309"));
    }

    #[test]
    fn test_model_config_partial_json() {
        let config: ModelConfig = serde_json::from_str(r#"{ "baseline_ebit_weight": 0.5 }"#).unwrap();
        assert_eq!(config.weights, WeightRule::default());
        assert_eq!(config.baseline_ebit_weight, 0.5);
    }
}
