//! Plain-text description of the valuation model.

use crate::calculator::ValuationCalculator;

/// Describe the model, listing the active weight bands and the scale factor.
pub fn describe_model(calculator: &ValuationCalculator) -> String {
    let mut out = String::new();

    out.push_str("## Model Explanation\n\n");
    out.push_str(
        "This valuation model prices a company from both EBIT (Earnings Before Interest and Taxes) \
         and Revenue, using weightings that adjust to EBIT as a percentage of Revenue. \
         The price reflects both the company's operational efficiency and its size.\n\n",
    );
    out.push_str(
        "The weightings respond to the EBIT margin (EBIT as a percentage of Revenue) as follows:\n\n",
    );

    for band in calculator.config().weights.describe() {
        out.push_str(&format!(
            "- **EBIT margin {}:** EBIT weighted at {:.0}%, Revenue at {:.0}%.\n",
            band.range_label(),
            band.weights.ebit * 100.0,
            band.weights.revenue * 100.0
        ));
    }

    let calibration = calculator.calibration();
    out.push_str("\n## Scaling Factor Calculation\n\n");
    out.push_str(&format!(
        "Each of the {} reference companies is priced with a baseline blend \
         ({:.0}% EBIT, {:.0}% Revenue). The ratio of its known historical price to that \
         baseline is its individual factor, and the scaling factor is the average of those \
         factors: {:.4}. The factor is applied uniformly so that computed prices stay \
         aligned with the historical prices (largest deviation {:.2}%).\n",
        calibration.rows.len(),
        calibration.baseline.ebit * 100.0,
        calibration.baseline.revenue * 100.0,
        calibration.scale_factor,
        calibration.max_relative_error() * 100.0
    ));

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calculator::ModelConfig;

    #[test]
    fn test_describe_default_model() {
        let calc = ValuationCalculator::new(ModelConfig::default()).unwrap();
        let text = describe_model(&calc);

        assert!(text.starts_with("## Model Explanation"));
        assert!(text.contains("- **EBIT margin below 3%:** EBIT weighted at 90%, Revenue at 10%."));
        assert!(text.contains("- **EBIT margin 10% to 30%:** EBIT weighted at 30%, Revenue at 70%."));
        assert!(text.contains("- **EBIT margin 50% and above:** EBIT weighted at 5%, Revenue at 95%."));
        assert!(!text.contains("and above of Revenue"));
        assert!(text.contains("Each of the 3 reference companies"));
        assert!(text.contains("0.5309"));
    }
}
