//! Property tests for the valuation calculator.

use proptest::prelude::*;
use valuator_core::{
    ChartConfig, ChartModel, ModelConfig, ValuationCalculator, ValuationError, WeightRule,
};

fn calculator() -> ValuationCalculator {
    ValuationCalculator::new(ModelConfig::default()).unwrap()
}

proptest! {
    #[test]
    fn valuation_is_finite_and_weight_bounded(
        ebit in prop_oneof![-1.0e9f64..1.0e9, -1.0e300f64..1.0e300],
        revenue in prop_oneof![1.0e-300f64..1.0e-3, 1.0e-3f64..1.0e9, 1.0e9f64..1.0e300],
    ) {
        let result = calculator().compute(ebit, revenue).unwrap();
        prop_assert!(result.scaled_valuation.is_finite());
        prop_assert!((0.0..=1.0).contains(&result.weight_used));
        prop_assert!((result.weight_used + result.revenue_weight - 1.0).abs() < 1e-12);
    }

    #[test]
    fn compute_is_deterministic(ebit in -1.0e6f64..1.0e6, revenue in 1.0f64..1.0e7) {
        let calc = calculator();
        prop_assert_eq!(calc.compute(ebit, revenue).unwrap(), calc.compute(ebit, revenue).unwrap());
    }

    #[test]
    fn zero_revenue_always_rejected(ebit in proptest::num::f64::ANY) {
        let err = calculator().compute(ebit, 0.0).unwrap_err();
        let is_invalid_input = matches!(err, ValuationError::InvalidInput { .. });
        prop_assert!(is_invalid_input);
    }

    #[test]
    fn valuation_is_blend_times_scale(ebit in 0.0f64..1.0e6, revenue in 1.0f64..1.0e7) {
        let result = calculator().compute(ebit, revenue).unwrap();
        let expected = (result.weight_used * ebit + result.revenue_weight * revenue) * result.scale_factor;
        prop_assert!((result.scaled_valuation - expected).abs() <= 1e-9 * expected.abs().max(1.0));
    }

    #[test]
    fn weight_only_changes_at_thresholds(pct_a in -100.0f64..200.0, pct_b in -100.0f64..200.0) {
        let rule = WeightRule::default();
        let (lo, hi) = if pct_a <= pct_b { (pct_a, pct_b) } else { (pct_b, pct_a) };
        let thresholds: Vec<f64> = rule.bands().iter().filter_map(|b| b.below).collect();
        let crosses = thresholds.iter().any(|t| lo < *t && *t <= hi);
        if !crosses {
            prop_assert_eq!(
                rule.select(lo).unwrap().weights.ebit,
                rule.select(hi).unwrap().weights.ebit
            );
        }
    }

    #[test]
    fn chart_limits_cover_every_point(ebit in 0.0f64..5000.0, revenue in 1.0f64..50000.0) {
        let calc = calculator();
        let result = calc.compute(ebit, revenue).unwrap();
        let model = ChartModel::build(&ChartConfig::default(), &calc.config().reference, &result);
        prop_assert!(model.selected_in_bounds);
        for point in &model.reference_points {
            prop_assert!(point.revenue <= model.x_max && point.ebit <= model.y_max);
        }
    }
}

#[test]
fn weight_never_increases_with_margin_in_default_rule() {
    let rule = WeightRule::default();
    let weights: Vec<f64> = rule.describe().iter().map(|b| b.weights.ebit).collect();
    assert!(weights.windows(2).all(|w| w[0] >= w[1]));
}
