//! Text and JSON reports for each command.
//!
//! Every function here is pure: it takes already-built models and returns
//! the text to print, so the binary only deals with I/O.

use anyhow::{Context, Result};
use serde_json::json;
use valuator_core::{
    describe_model, ChartConfig, ChartModel, EarnoutModel, LinearValuationModel,
    ValuationCalculator, YearFigures,
};

use crate::render::{self, money, render_table};

fn heading(text: &str) -> String {
    console::style(text).bold().to_string()
}

/// Headline valuation, explanation and optionally the chart.
pub fn price(
    calculator: &ValuationCalculator,
    chart: Option<&ChartConfig>,
    ebit: f64,
    revenue: f64,
) -> Result<String> {
    let result = calculator.compute(ebit, revenue)?;

    let mut out = String::new();
    out.push_str(&heading(&format!(
        "Calculated Company Price: {}",
        money(result.scaled_valuation)
    )));
    out.push('\n');
    out.push_str(&result.explain());
    out.push('\n');

    if let Some(chart_config) = chart {
        let model = ChartModel::build(chart_config, &calculator.config().reference, &result);
        out.push('\n');
        out.push_str(&model.render_text(chart_config.width, chart_config.height));

        let hit: Vec<&str> = model.zones_hit().into_iter().map(|z| z.label.as_str()).collect();
        if !hit.is_empty() {
            out.push_str(&format!("\nSelected point lies in: {}\n", hit.join(", ")));
        }
    }

    Ok(out)
}

/// Valuation result (and chart model) as pretty JSON.
pub fn price_json(
    calculator: &ValuationCalculator,
    chart: Option<&ChartConfig>,
    ebit: f64,
    revenue: f64,
) -> Result<String> {
    let result = calculator.compute(ebit, revenue)?;
    let value = match chart {
        Some(chart_config) => {
            let model = ChartModel::build(chart_config, &calculator.config().reference, &result);
            json!({ "result": result, "chart": model })
        }
        None => json!({ "result": result }),
    };
    serde_json::to_string_pretty(&value).context("Failed to serialize valuation")
}

/// Model description followed by the band table.
pub fn explain(calculator: &ValuationCalculator) -> String {
    let rows: Vec<Vec<String>> = calculator
        .config()
        .weights
        .describe()
        .iter()
        .map(|band| {
            vec![
                band.range_label(),
                format!("{:.2}", band.weights.ebit),
                format!("{:.2}", band.weights.revenue),
            ]
        })
        .collect();

    format!(
        "{}\n{}\n",
        describe_model(calculator),
        render_table(&["EBIT % of Revenue", "EBIT weight", "Revenue weight"], &rows)
    )
}

/// Reference deals with their individual factors and the derived scale factor.
pub fn reference(calculator: &ValuationCalculator) -> String {
    let calibration = calculator.calibration();
    let rows: Vec<Vec<String>> = calibration
        .rows
        .iter()
        .map(|row| {
            vec![
                format!("{}", row.example.ebit),
                format!("{}", row.example.revenue),
                money(row.example.price),
                format!("{:.2}", row.baseline_value),
                format!("{:.4}", row.factor),
                money(row.baseline_value * calibration.scale_factor),
            ]
        })
        .collect();

    format!(
        "{}\n{}\nScale factor: {:.4} (baseline {:.0}% EBIT / {:.0}% Revenue)\n",
        heading("Reference Examples"),
        render_table(
            &["EBIT", "Revenue", "Price", "Baseline", "Factor", "Scaled"],
            &rows
        ),
        calibration.scale_factor,
        calibration.baseline.ebit * 100.0,
        calibration.baseline.revenue * 100.0,
    )
}

/// Two-year earnout schedule.
pub fn earnout(model: &EarnoutModel, year1: YearFigures, year2: YearFigures) -> Result<String> {
    let schedule = model.schedule(year1, year2)?;

    let mut out = String::new();
    out.push_str(&heading("Earnout Model"));
    out.push('\n');
    for (label, price) in [("Year 1", &schedule.year1), ("Year 2", &schedule.year2)] {
        let note = if price.floored {
            " (raised to the price floor)"
        } else if price.capped {
            " (limited to the price cap)"
        } else {
            ""
        };
        out.push_str(&format!(
            "{label} price: {} from a valuation of {}{note}\n",
            price.price,
            money(price.valuation.scaled_valuation)
        ));
    }
    out.push('\n');
    out.push_str(&render::earnout_table(&schedule));
    out.push('\n');
    Ok(out)
}

pub fn earnout_json(model: &EarnoutModel, year1: YearFigures, year2: YearFigures) -> Result<String> {
    let schedule = model.schedule(year1, year2)?;
    serde_json::to_string_pretty(&schedule).context("Failed to serialize earnout schedule")
}

/// Linear valuation with payments, buy-back analysis and regression lines.
pub fn linear(model: &LinearValuationModel, ebit: f64, revenue: f64) -> Result<String> {
    let report = model.report(ebit, revenue)?;
    let v = &report.valuation;

    let mut out = String::new();
    out.push_str(&heading("Results"));
    out.push('\n');
    out.push_str(&format!("Calculated Valuation: {}\n", v.valuation));
    out.push_str(&format!("EBIT Ratio: {:.2}%\n", v.ebit_ratio * 100.0));
    out.push_str(&format!("EBIT Multiple: {}x\n", report.multiples.ebit_multiple));
    out.push_str(&format!("SDI Multiple: {}x\n", report.multiples.sdi_multiple));
    if v.fixed {
        out.push_str("Valuation taken from a pinned EBIT/Revenue combination.\n");
    } else if v.low_margin_capped {
        out.push_str(&format!(
            "EBIT ratio below {:.0}%: valuation limited to {}x EBIT.\n",
            model.config().low_margin_threshold * 100.0,
            model.config().low_margin_multiplier
        ));
    }

    out.push('\n');
    out.push_str(&heading("Payment Breakdown"));
    out.push('\n');
    out.push_str(&render::payment_table(&report.payments));
    out.push_str("\n\n");

    out.push_str(&heading("Buy-Back Table"));
    out.push('\n');
    out.push_str(&render::buy_back_table(&report.buy_back));
    out.push('\n');
    match report.buy_back.payback_period() {
        Some(period) => out.push_str(&format!("Payments are recovered by T{period}.\n")),
        None => out.push_str("Payments are not recovered within T0..T3.\n"),
    }

    out.push('\n');
    out.push_str(&heading("Linear Relationship for Valuation"));
    out.push('\n');
    out.push_str(&format!("Slope (EBIT): {:.2}\n", report.ebit_fit.slope));
    out.push_str(&format!("Intercept (EBIT): {:.2}\n", report.ebit_fit.intercept));
    out.push_str(&format!("Slope (Revenue): {:.2}\n", report.revenue_fit.slope));
    out.push_str(&format!("Intercept (Revenue): {:.2}\n", report.revenue_fit.intercept));

    Ok(out)
}

pub fn linear_json(model: &LinearValuationModel, ebit: f64, revenue: f64) -> Result<String> {
    let report = model.report(ebit, revenue)?;
    serde_json::to_string_pretty(&report).context("Failed to serialize linear report")
}

pub fn relations(model: &LinearValuationModel) -> String {
    format!(
        "{}\n{}\n",
        heading("Linear Relations Table"),
        render::relations_table(&model.relations_table())
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use valuator_core::{EarnoutConfig, LinearModelConfig, ModelConfig};

    fn calculator() -> ValuationCalculator {
        ValuationCalculator::new(ModelConfig::default()).unwrap()
    }

    #[test]
    fn test_price_headline_and_explanation() {
        let text = price(&calculator(), None, 230.0, 2300.0).unwrap();
        assert!(text.contains("Calculated Company Price: $891.43"));
        assert!(text.contains("(10.00%)"));
        assert!(text.contains("EBIT weighting used: 0.30, Revenue weighting used: 0.70."));
        assert!(text.contains("The scaling factor applied was: 0.5309."));
    }

    #[test]
    fn test_price_with_chart() {
        let chart = ChartConfig::default();
        let text = price(&calculator(), Some(&chart), 230.0, 2300.0).unwrap();
        assert!(text.contains("EBIT vs Revenue with Price Annotations"));
        assert!(text.contains("Minimum Zone"));
    }

    #[test]
    fn test_price_rejects_zero_revenue() {
        let err = price(&calculator(), None, 100.0, 0.0).unwrap_err();
        let valuation_err = err.downcast_ref::<valuator_core::ValuationError>().unwrap();
        assert!(valuation_err.is_invalid_input());
    }

    #[test]
    fn test_price_json() {
        let text = price_json(&calculator(), None, 100.0, 1000.0).unwrap();
        let value: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(value["result"]["weight_used"], 0.3);
        assert_eq!(value["result"]["blended_value"], 730.0);
        assert!(value.get("chart").is_none());
    }

    #[test]
    fn test_explain_lists_bands() {
        let text = explain(&calculator());
        assert!(text.contains("## Model Explanation"));
        assert!(text.contains("│ 30% to 40%        │        0.20 │           0.80 │"));
    }

    #[test]
    fn test_reference_shows_scale_factor() {
        let text = reference(&calculator());
        assert!(text.contains("Scale factor: 0.5309 (baseline 30% EBIT / 70% Revenue)"));
        assert!(text.contains("$2,025.00"));
    }

    #[test]
    fn test_earnout_report() {
        let model = EarnoutModel::new(calculator(), EarnoutConfig::default()).unwrap();
        let text = earnout(
            &model,
            YearFigures { ebit: 230.0, revenue: 2300.0 },
            YearFigures { ebit: 350.0, revenue: 3500.0 },
        )
        .unwrap();
        assert!(text.contains("Year 1 price: 891"));
        assert!(text.contains("Year 2 price: 1357"));
        assert!(text.contains("│ Total  │           900 │            -10 │            466 │  1357 │"));
    }

    #[test]
    fn test_linear_report() {
        let model = LinearValuationModel::new(LinearModelConfig::default()).unwrap();
        let text = linear(&model, 300.0, 3000.0).unwrap();
        assert!(text.contains("Calculated Valuation: 1121"));
        assert!(text.contains("EBIT Ratio: 10.00%"));
        assert!(text.contains("EBIT Multiple: 3.74x"));
        assert!(text.contains("SDI Multiple: 2.16x"));
        assert!(text.contains("Payments are recovered by T3."));
        assert!(text.contains("Slope (EBIT): 3.67"));
        assert!(text.contains("Intercept (Revenue): 20.74"));
    }

    #[test]
    fn test_linear_report_flags_low_margin() {
        let model = LinearValuationModel::new(LinearModelConfig::default()).unwrap();
        let text = linear(&model, 250.0, 3000.0).unwrap();
        assert!(text.contains("Calculated Valuation: 925"));
        assert!(text.contains("valuation limited to 3.7x EBIT"));
    }

    #[test]
    fn test_relations_grid() {
        let model = LinearValuationModel::new(LinearModelConfig::default()).unwrap();
        let text = relations(&model);
        assert!(text.contains("EBIT \\ Revenue"));
        assert!(text.contains("1350"));
        assert!(text.contains("2020"));
    }
}
