//! Dynamic EBIT/Revenue weighting.
//!
//! The share of the blend given to EBIT depends on EBIT as a percentage of
//! Revenue. The rule is a list of half-open bands `[previous, below)`; the
//! last band is open-ended.
//!
//! ```text
//!  EBIT % of Revenue   EBIT weight   Revenue weight
//!  ─────────────────   ───────────   ──────────────
//!        < 3              0.90            0.10
//!       3 – 5             0.70            0.30
//!       5 – 10            0.50            0.50
//!      10 – 30            0.30            0.70     (normal range)
//!      30 – 40            0.20            0.80
//!      40 – 50            0.10            0.90
//!       ≥ 50              0.05            0.95
//! ```

use serde::{Deserialize, Serialize};
use valuator_common::validation::{collect, require_fraction};
use valuator_common::{Validate, ValidationError, ValidationResult};

/// One threshold band of the weight rule.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WeightBand {
    /// Exclusive upper bound on EBIT % of Revenue; `None` for the last band
    pub below: Option<f64>,
    /// Weight given to EBIT while in this band
    pub ebit_weight: f64,
}

impl WeightBand {
    pub const fn new(below: f64, ebit_weight: f64) -> Self {
        Self {
            below: Some(below),
            ebit_weight,
        }
    }

    pub const fn open(ebit_weight: f64) -> Self {
        Self {
            below: None,
            ebit_weight,
        }
    }

    fn contains(&self, ebit_pct: f64) -> bool {
        self.below.map_or(true, |below| ebit_pct < below)
    }
}

/// EBIT weight paired with its complementary Revenue weight.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Weights {
    pub ebit: f64,
    pub revenue: f64,
}

impl Weights {
    pub fn from_ebit(ebit: f64) -> Self {
        Self {
            ebit,
            revenue: 1.0 - ebit,
        }
    }

    /// `ebit_weight * ebit + revenue_weight * revenue`
    pub fn blend(&self, ebit: f64, revenue: f64) -> f64 {
        self.ebit * ebit + self.revenue * revenue
    }
}

/// Band that matched a given EBIT percentage.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BandMatch {
    /// Position of the band in the rule
    pub index: usize,
    /// Inclusive lower bound (`None` for the first band)
    pub from: Option<f64>,
    /// Exclusive upper bound (`None` for the last band)
    pub below: Option<f64>,
    pub weights: Weights,
}

impl BandMatch {
    /// Human-readable range, e.g. `10% to 30%`.
    pub fn range_label(&self) -> String {
        match (self.from, self.below) {
            (None, Some(below)) => format!("below {}%", fmt_pct(below)),
            (Some(from), Some(below)) => format!("{}% to {}%", fmt_pct(from), fmt_pct(below)),
            (Some(from), None) => format!("{}% and above", fmt_pct(from)),
            (None, None) => "any".to_string(),
        }
    }
}

fn fmt_pct(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{value:.0}")
    } else {
        format!("{value}")
    }
}

/// Threshold-based weighting policy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WeightRule {
    bands: Vec<WeightBand>,
}

impl Default for WeightRule {
    fn default() -> Self {
        Self {
            bands: vec![
                WeightBand::new(3.0, 0.9),
                WeightBand::new(5.0, 0.7),
                WeightBand::new(10.0, 0.5),
                WeightBand::new(30.0, 0.3),
                WeightBand::new(40.0, 0.2),
                WeightBand::new(50.0, 0.1),
                WeightBand::open(0.05),
            ],
        }
    }
}

impl WeightRule {
    /// Build a rule from explicit bands. Call [`Validate::validate`] before use.
    pub fn new(bands: Vec<WeightBand>) -> Self {
        Self { bands }
    }

    /// A rule that always applies the same EBIT weight.
    pub fn fixed(ebit_weight: f64) -> Self {
        Self {
            bands: vec![WeightBand::open(ebit_weight)],
        }
    }

    pub fn bands(&self) -> &[WeightBand] {
        &self.bands
    }

    /// Find the band for an EBIT percentage.
    ///
    /// Returns `None` only for rules that fail validation (no open-ended
    /// last band) or for a NaN percentage.
    pub fn select(&self, ebit_pct: f64) -> Option<BandMatch> {
        if ebit_pct.is_nan() {
            return None;
        }

        let mut from = None;
        for (index, band) in self.bands.iter().enumerate() {
            if band.contains(ebit_pct) {
                return Some(BandMatch {
                    index,
                    from,
                    below: band.below,
                    weights: Weights::from_ebit(band.ebit_weight),
                });
            }
            from = band.below;
        }
        None
    }

    /// Every band with its range, in order.
    pub fn describe(&self) -> Vec<BandMatch> {
        let mut from = None;
        self.bands
            .iter()
            .enumerate()
            .map(|(index, band)| {
                let described = BandMatch {
                    index,
                    from,
                    below: band.below,
                    weights: Weights::from_ebit(band.ebit_weight),
                };
                from = band.below;
                described
            })
            .collect()
    }
}

impl Validate for WeightRule {
    fn validate(&self) -> ValidationResult<()> {
        let Some(last) = self.bands.last() else {
            return Err(ValidationError::MissingField {
                field: "model.weights".into(),
            });
        };

        if last.below.is_some() {
            return Err(ValidationError::invalid(
                "model.weights",
                "last band must be open-ended (below = null)",
            ));
        }

        let mut checks = Vec::new();
        let mut previous: Option<f64> = None;
        for (i, band) in self.bands.iter().enumerate() {
            checks.push(require_fraction(
                &format!("model.weights[{i}].ebit_weight"),
                band.ebit_weight,
            ));

            let is_last = i + 1 == self.bands.len();
            match band.below {
                None if !is_last => checks.push(Err(ValidationError::invalid(
                    format!("model.weights[{i}].below"),
                    "only the last band may be open-ended",
                ))),
                Some(below) if !below.is_finite() => checks.push(Err(ValidationError::invalid(
                    format!("model.weights[{i}].below"),
                    format!("must be finite, got {below}"),
                ))),
                Some(below) => {
                    if previous.is_some_and(|p| below <= p) {
                        checks.push(Err(ValidationError::invalid(
                            format!("model.weights[{i}].below"),
                            "thresholds must be strictly increasing",
                        )));
                    }
                    previous = Some(below);
                }
                None => {}
            }
        }

        collect(checks)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    fn ebit_weight(pct: f64) -> f64 {
        WeightRule::default().select(pct).unwrap().weights.ebit
    }

    #[test_case(-25.0, 0.9 ; "loss making")]
    #[test_case(0.0, 0.9 ; "break even")]
    #[test_case(2.999, 0.9 ; "just below 3")]
    #[test_case(3.0, 0.7 ; "at 3")]
    #[test_case(4.999, 0.7 ; "just below 5")]
    #[test_case(5.0, 0.5 ; "at 5")]
    #[test_case(9.999, 0.5 ; "just below 10")]
    #[test_case(10.0, 0.3 ; "at 10")]
    #[test_case(29.999, 0.3 ; "just below 30")]
    #[test_case(30.0, 0.2 ; "at 30")]
    #[test_case(39.999, 0.2 ; "just below 40")]
    #[test_case(40.0, 0.1 ; "at 40")]
    #[test_case(49.999, 0.1 ; "just below 50")]
    #[test_case(50.0, 0.05 ; "at 50")]
    #[test_case(400.0, 0.05 ; "far above")]
    fn test_default_band_boundaries(pct: f64, expected: f64) {
        assert_eq!(ebit_weight(pct), expected);
    }

    #[test]
    fn test_weights_complement() {
        for band in WeightRule::default().describe() {
            let w = band.weights;
            assert!((w.ebit + w.revenue - 1.0).abs() < 1e-12);
        }
    }

    #[test]
    fn test_select_reports_range() {
        let m = WeightRule::default().select(12.0).unwrap();
        assert_eq!(m.index, 3);
        assert_eq!(m.from, Some(10.0));
        assert_eq!(m.below, Some(30.0));
        assert_eq!(m.range_label(), "10% to 30%");

        assert_eq!(WeightRule::default().select(1.0).unwrap().range_label(), "below 3%");
        assert_eq!(
            WeightRule::default().select(75.0).unwrap().range_label(),
            "50% and above"
        );
    }

    #[test]
    fn test_select_nan() {
        assert!(WeightRule::default().select(f64::NAN).is_none());
    }

    #[test]
    fn test_blend() {
        let w = Weights::from_ebit(0.3);
        assert!((w.blend(230.0, 2300.0) - 1679.0).abs() < 1e-9);
    }

    #[test]
    fn test_default_rule_is_valid() {
        assert!(WeightRule::default().validate().is_ok());
        assert!(WeightRule::fixed(0.3).validate().is_ok());
    }

    #[test]
    fn test_validation_rejects_bad_rules() {
        assert!(WeightRule::new(vec![]).validate().is_err());
        // no open-ended band
        assert!(WeightRule::new(vec![WeightBand::new(10.0, 0.5)]).validate().is_err());
        // weight out of range
        assert!(WeightRule::new(vec![WeightBand::open(1.5)]).validate().is_err());
        // thresholds not increasing
        let unordered = WeightRule::new(vec![
            WeightBand::new(10.0, 0.5),
            WeightBand::new(5.0, 0.4),
            WeightBand::open(0.3),
        ]);
        assert!(unordered.validate().is_err());
        // open band in the middle
        let gap = WeightRule::new(vec![WeightBand::open(0.5), WeightBand::open(0.3)]);
        assert!(gap.validate().is_err());
    }

    #[test]
    fn test_serde_round_trip_uses_null_for_open_band() {
        let json = serde_json::to_string(&WeightRule::fixed(0.25)).unwrap();
        assert_eq!(json, r#"[{"below":null,"ebit_weight":0.25}]"#);

        let parsed: WeightRule =
            serde_json::from_str(r#"[{"below":20,"ebit_weight":0.6},{"below":null,"ebit_weight":0.2}]"#)
                .unwrap();
        assert_eq!(parsed.select(19.0).unwrap().weights.ebit, 0.6);
        assert_eq!(parsed.select(20.0).unwrap().weights.ebit, 0.2);
    }
}
