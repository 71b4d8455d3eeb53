//! EBIT vs Revenue chart.
//!
//! [`ChartModel`] holds everything needed to draw the chart (axes, zones,
//! reference points, the valued company, the historical price line) and can
//! be serialized for external plotting or rendered as a character grid.
//!
//! ```text
//!  EBIT
//!   │            :::::::::::::::::::::::   ← EBIT ceiling zone
//!   │                  $2025.00 o    :::
//!   │        $1350.00 o              :::   ← Revenue ceiling zone
//!   │ ░$900.00 o                     :::
//!   │ ░░░░░░░░  ← minimum zone       :::
//!   └──────────────────────────────────── Revenue
//! ```

use serde::{Deserialize, Serialize};
use valuator_common::validation::{collect, require_positive};
use valuator_common::{Validate, ValidationError, ValidationResult};

use crate::calculator::ValuationResult;
use crate::reference::ReferenceTable;

// ============================================================================
// Configuration
// ============================================================================

/// How a zone is drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ZoneKind {
    /// Region below which prices bottom out
    Floor,
    /// Region above which prices are capped
    Ceiling,
}

/// A rectangular zone in Revenue/EBIT space.
///
/// `None` upper bounds extend to the reference data extent times the
/// chart headroom.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ZoneConfig {
    pub label: String,
    pub kind: ZoneKind,
    #[serde(default)]
    pub revenue_from: f64,
    #[serde(default)]
    pub revenue_to: Option<f64>,
    #[serde(default)]
    pub ebit_from: f64,
    #[serde(default)]
    pub ebit_to: Option<f64>,
}

/// Chart layout configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartConfig {
    /// Multiplier applied to the largest plotted value to get the axis limit
    #[serde(default = "default_headroom")]
    pub headroom: f64,

    #[serde(default = "default_zones")]
    pub zones: Vec<ZoneConfig>,

    /// Reference prices joined by the historical price line
    #[serde(default = "default_historical_prices")]
    pub historical_prices: Vec<f64>,

    /// Character grid size used by the text renderer
    #[serde(default = "default_width")]
    pub width: usize,
    #[serde(default = "default_height")]
    pub height: usize,
}

impl Default for ChartConfig {
    fn default() -> Self {
        Self {
            headroom: default_headroom(),
            zones: default_zones(),
            historical_prices: default_historical_prices(),
            width: default_width(),
            height: default_height(),
        }
    }
}

fn default_headroom() -> f64 {
    1.1
}
fn default_zones() -> Vec<ZoneConfig> {
    vec![
        ZoneConfig {
            label: "Minimum Zone".into(),
            kind: ZoneKind::Floor,
            revenue_from: 0.0,
            revenue_to: Some(2200.0),
            ebit_from: 0.0,
            ebit_to: Some(220.0),
        },
        ZoneConfig {
            label: "Revenue Ceiling Zone".into(),
            kind: ZoneKind::Ceiling,
            revenue_from: 5300.0,
            revenue_to: None,
            ebit_from: 0.0,
            ebit_to: None,
        },
        ZoneConfig {
            label: "EBIT Ceiling Zone".into(),
            kind: ZoneKind::Ceiling,
            revenue_from: 0.0,
            revenue_to: None,
            ebit_from: 532.0,
            ebit_to: None,
        },
    ]
}
fn default_historical_prices() -> Vec<f64> {
    vec![900.0, 1350.0, 2025.0]
}
fn default_width() -> usize {
    72
}
fn default_height() -> usize {
    22
}

impl Validate for ChartConfig {
    fn validate(&self) -> ValidationResult<()> {
        let mut checks = vec![require_positive("chart.headroom", self.headroom)];
        if self.width < 16 || self.height < 6 {
            checks.push(Err(ValidationError::invalid(
                "chart.width/height",
                format!("grid must be at least 16x6, got {}x{}", self.width, self.height),
            )));
        }
        for (i, zone) in self.zones.iter().enumerate() {
            let inverted = zone.revenue_to.is_some_and(|to| to <= zone.revenue_from)
                || zone.ebit_to.is_some_and(|to| to <= zone.ebit_from);
            if inverted {
                checks.push(Err(ValidationError::invalid(
                    format!("chart.zones[{i}]"),
                    "upper bounds must exceed lower bounds",
                )));
            }
        }
        collect(checks)
    }
}

// ============================================================================
// Model
// ============================================================================

/// A labelled point, x = Revenue, y = EBIT.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartPoint {
    pub revenue: f64,
    pub ebit: f64,
    pub label: String,
}

/// A resolved zone rectangle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Zone {
    pub label: String,
    pub kind: ZoneKind,
    pub revenue_from: f64,
    pub revenue_to: f64,
    pub ebit_from: f64,
    pub ebit_to: f64,
}

impl Zone {
    fn contains(&self, revenue: f64, ebit: f64) -> bool {
        (self.revenue_from..=self.revenue_to).contains(&revenue)
            && (self.ebit_from..=self.ebit_to).contains(&ebit)
    }
}

/// Everything needed to draw the chart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartModel {
    pub title: String,
    pub x_label: String,
    pub y_label: String,
    pub x_max: f64,
    pub y_max: f64,
    pub zones: Vec<Zone>,
    pub reference_points: Vec<ChartPoint>,
    pub selected: ChartPoint,
    /// False when the selected point lies outside the plotted area
    pub selected_in_bounds: bool,
    /// Reference points whose price is in the historical set, by Revenue
    pub historical_line: Option<Vec<(f64, f64)>>,
}

fn price_label(price: f64) -> String {
    format!("${price:.2}")
}

impl ChartModel {
    /// Lay out the chart for a computed valuation.
    pub fn build(config: &ChartConfig, reference: &ReferenceTable, result: &ValuationResult) -> Self {
        let ref_revenue = reference.max_revenue().unwrap_or(0.0);
        let ref_ebit = reference.max_ebit().unwrap_or(0.0);

        let x_max = axis_limit(ref_revenue.max(result.revenue) * config.headroom);
        let y_max = axis_limit(ref_ebit.max(result.ebit) * config.headroom);

        // ceiling zones are sized from the reference data only
        let zone_x_limit = axis_limit(ref_revenue * config.headroom);
        let zone_y_limit = axis_limit(ref_ebit * config.headroom);

        let zones = config
            .zones
            .iter()
            .map(|z| Zone {
                label: z.label.clone(),
                kind: z.kind,
                revenue_from: z.revenue_from,
                revenue_to: z.revenue_to.unwrap_or(zone_x_limit),
                ebit_from: z.ebit_from,
                ebit_to: z.ebit_to.unwrap_or(zone_y_limit),
            })
            .collect();

        let reference_points = reference
            .examples()
            .iter()
            .map(|e| ChartPoint {
                revenue: e.revenue,
                ebit: e.ebit,
                label: price_label(e.price),
            })
            .collect();

        let mut historical: Vec<(f64, f64)> = reference
            .examples()
            .iter()
            .filter(|e| config.historical_prices.iter().any(|p| (p - e.price).abs() < 1e-9))
            .map(|e| (e.revenue, e.ebit))
            .collect();
        historical.sort_by(|a, b| a.0.total_cmp(&b.0));
        let historical_line = (historical.len() >= 2).then_some(historical);

        let selected_in_bounds = (0.0..=x_max).contains(&result.revenue)
            && (0.0..=y_max).contains(&result.ebit);
        if !selected_in_bounds {
            tracing::debug!(
                revenue = result.revenue,
                ebit = result.ebit,
                "Selected point lies outside the chart area"
            );
        }

        Self {
            title: "EBIT vs Revenue with Price Annotations".into(),
            x_label: "Revenue".into(),
            y_label: "EBIT".into(),
            x_max,
            y_max,
            zones,
            reference_points,
            selected: ChartPoint {
                revenue: result.revenue,
                ebit: result.ebit,
                label: price_label(result.rounded_valuation()),
            },
            selected_in_bounds,
            historical_line,
        }
    }

    /// Zones containing the selected point.
    pub fn zones_hit(&self) -> Vec<&Zone> {
        self.zones
            .iter()
            .filter(|z| z.contains(self.selected.revenue, self.selected.ebit))
            .collect()
    }

    /// Render the chart as text on a `width` x `height` plotting grid.
    pub fn render_text(&self, width: usize, height: usize) -> String {
        let mut canvas = Canvas::new(width.max(16), height.max(6), self.x_max, self.y_max);

        for zone in &self.zones {
            let fill = match zone.kind {
                ZoneKind::Floor => '░',
                ZoneKind::Ceiling => ':',
            };
            canvas.fill_rect(zone.revenue_from, zone.ebit_from, zone.revenue_to, zone.ebit_to, fill);
        }

        for point in &self.reference_points {
            canvas.line(0.0, point.ebit, point.revenue, point.ebit, '·');
            canvas.line(point.revenue, 0.0, point.revenue, point.ebit, '·');
        }

        if let Some(line) = &self.historical_line {
            for pair in line.windows(2) {
                canvas.line(pair[0].0, pair[0].1, pair[1].0, pair[1].1, '-');
            }
        }

        for point in &self.reference_points {
            canvas.mark(point.revenue, point.ebit, 'o', &point.label, false);
        }
        canvas.mark(self.selected.revenue, self.selected.ebit, '@', &self.selected.label, true);

        let mut out = String::new();
        out.push_str(&self.title);
        out.push('\n');
        out.push_str(&canvas.finish(&self.y_label, &self.x_label));
        out.push_str(&self.legend());
        out
    }

    fn legend(&self) -> String {
        let mut entries: Vec<String> = self
            .zones
            .iter()
            .map(|z| {
                let swatch = match z.kind {
                    ZoneKind::Floor => '░',
                    ZoneKind::Ceiling => ':',
                };
                format!("{swatch} {}", z.label)
            })
            .collect();
        entries.push(format!("@ Selected ({})", self.selected.label));
        entries.push("o Reference company".into());
        if self.historical_line.is_some() {
            entries.push("- Historical Price Line".into());
        }

        let mut out = String::from("Legend:\n");
        for row in entries.chunks(3) {
            out.push_str("  ");
            out.push_str(&row.join("   "));
            out.push('\n');
        }
        if !self.selected_in_bounds {
            out.push_str("  (selected point lies outside the plotted area and is pinned to the border)\n");
        }
        out
    }
}

fn axis_limit(value: f64) -> f64 {
    if value.is_finite() && value > 0.0 {
        value
    } else {
        1.0
    }
}

// ============================================================================
// Text canvas
// ============================================================================

struct Canvas {
    cells: Vec<Vec<char>>,
    width: usize,
    height: usize,
    x_max: f64,
    y_max: f64,
}

impl Canvas {
    fn new(width: usize, height: usize, x_max: f64, y_max: f64) -> Self {
        Self {
            cells: vec![vec![' '; width]; height],
            width,
            height,
            x_max,
            y_max,
        }
    }

    fn col(&self, x: f64) -> usize {
        let scaled = (x / self.x_max * (self.width - 1) as f64).round();
        scaled.clamp(0.0, (self.width - 1) as f64) as usize
    }

    fn row(&self, y: f64) -> usize {
        let scaled = (y / self.y_max * (self.height - 1) as f64).round();
        let from_bottom = scaled.clamp(0.0, (self.height - 1) as f64) as usize;
        self.height - 1 - from_bottom
    }

    fn set(&mut self, row: usize, col: usize, c: char) {
        if let Some(cell) = self.cells.get_mut(row).and_then(|r| r.get_mut(col)) {
            *cell = c;
        }
    }

    fn fill_rect(&mut self, x0: f64, y0: f64, x1: f64, y1: f64, c: char) {
        let (c0, c1) = (self.col(x0), self.col(x1));
        let (r_top, r_bottom) = (self.row(y1), self.row(y0));
        for row in r_top..=r_bottom {
            for col in c0..=c1 {
                // hatch every other cell so overlapping zones stay distinguishable
                if (row + col) % 2 == 0 {
                    self.set(row, col, c);
                }
            }
        }
    }

    fn line(&mut self, x0: f64, y0: f64, x1: f64, y1: f64, c: char) {
        let steps = self.width.max(self.height) * 2;
        for i in 0..=steps {
            let t = i as f64 / steps as f64;
            let (row, col) = (self.row(y0 + (y1 - y0) * t), self.col(x0 + (x1 - x0) * t));
            self.set(row, col, c);
        }
    }

    /// Plot a marker with its label written to the left, or to the right
    /// when there is no room. Labels `above` go on the row over the marker.
    fn mark(&mut self, x: f64, y: f64, marker: char, label: &str, above: bool) {
        let (row, col) = (self.row(y), self.col(x));
        self.set(row, col, marker);

        let label_row = match (above, row) {
            (false, _) => row,
            (true, 0) => 1,
            (true, r) => r - 1,
        };
        let len = label.chars().count();
        let start = if col > len { col - len - 1 } else { col + 2 };
        for (i, ch) in label.chars().enumerate() {
            self.set(label_row, start + i, ch);
        }
    }

    fn finish(self, y_label: &str, x_label: &str) -> String {
        let top = format_tick(self.y_max);
        let mid = format_tick(self.y_max / 2.0);
        let gutter = top.len().max(mid.len()).max(1);

        let mut out = format!("{:>gutter$}\n", y_label);
        for (i, row) in self.cells.iter().enumerate() {
            let tick = if i == 0 {
                top.clone()
            } else if i == self.height / 2 {
                mid.clone()
            } else if i == self.height - 1 {
                "0".to_string()
            } else {
                String::new()
            };
            let line: String = row.iter().collect();
            out.push_str(&format!("{tick:>gutter$} │{}\n", line.trim_end()));
        }
        out.push_str(&format!("{:>gutter$} └{}\n", "", "─".repeat(self.width)));

        let left = "0";
        let right = format_tick(self.x_max);
        let pad = self.width.saturating_sub(left.len() + right.len());
        out.push_str(&format!("{:>gutter$}  {left}{}{right}\n", "", " ".repeat(pad)));
        out.push_str(&format!("{:>gutter$}  {:^width$}\n", "", x_label, width = self.width));
        out
    }
}

fn format_tick(value: f64) -> String {
    if value.abs() >= 100.0 {
        format!("{value:.0}")
    } else {
        format!("{value:.1}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calculator::{ModelConfig, ValuationCalculator};
    use crate::reference::ReferenceExample;

    fn model_for(ebit: f64, revenue: f64) -> ChartModel {
        let calc = ValuationCalculator::new(ModelConfig::default()).unwrap();
        let result = calc.compute(ebit, revenue).unwrap();
        ChartModel::build(&ChartConfig::default(), &calc.config().reference, &result)
    }

    #[test]
    fn test_axis_limits_include_headroom() {
        let model = model_for(230.0, 2300.0);
        assert!((model.x_max - 5775.0).abs() < 1e-9);
        assert!((model.y_max - 577.5).abs() < 1e-9);

        let big = model_for(800.0, 9000.0);
        assert!((big.x_max - 9900.0).abs() < 1e-9);
        assert!((big.y_max - 880.0).abs() < 1e-9);
    }

    #[test]
    fn test_zones_resolved_from_reference_extent() {
        // zone extents ignore the selected company
        let model = model_for(800.0, 9000.0);
        let revenue_ceiling = &model.zones[1];
        assert_eq!(revenue_ceiling.revenue_from, 5300.0);
        assert!((revenue_ceiling.revenue_to - 5775.0).abs() < 1e-9);
        assert!((revenue_ceiling.ebit_to - 577.5).abs() < 1e-9);

        let ebit_ceiling = &model.zones[2];
        assert_eq!(ebit_ceiling.ebit_from, 532.0);
        assert_eq!(ebit_ceiling.revenue_from, 0.0);
    }

    #[test]
    fn test_points_and_labels() {
        let model = model_for(230.0, 2300.0);
        assert_eq!(model.reference_points.len(), 3);
        assert_eq!(model.reference_points[0].label, "$900.00");
        assert_eq!(model.selected.label, "$891.43");
        assert!(model.selected_in_bounds);
    }

    #[test]
    fn test_historical_line() {
        let model = model_for(230.0, 2300.0);
        let line = model.historical_line.unwrap();
        assert_eq!(line, vec![(2300.0, 230.0), (3500.0, 350.0), (5250.0, 525.0)]);

        let config = ChartConfig {
            historical_prices: vec![900.0],
            ..Default::default()
        };
        let calc = ValuationCalculator::new(ModelConfig::default()).unwrap();
        let result = calc.compute(230.0, 2300.0).unwrap();
        let model = ChartModel::build(&config, &ReferenceTable::default(), &result);
        assert!(model.historical_line.is_none());
    }

    #[test]
    fn test_zones_hit() {
        let small = model_for(100.0, 1000.0);
        let hit: Vec<&str> = small.zones_hit().into_iter().map(|z| z.label.as_str()).collect();
        assert_eq!(hit, vec!["Minimum Zone"]);

        let wide = model_for(300.0, 5500.0);
        let hit: Vec<&str> = wide.zones_hit().into_iter().map(|z| z.label.as_str()).collect();
        assert_eq!(hit, vec!["Revenue Ceiling Zone"]);
    }

    #[test]
    fn test_negative_ebit_out_of_bounds() {
        let model = model_for(-40.0, 1000.0);
        assert!(!model.selected_in_bounds);
        let text = model.render_text(40, 12);
        assert!(text.contains("pinned to the border"));
        assert!(text.contains('@'));
    }

    #[test]
    fn test_render_text_layout() {
        let model = model_for(230.0, 2300.0);
        let text = model.render_text(60, 16);

        assert!(text.starts_with("EBIT vs Revenue with Price Annotations\n"));
        assert!(text.contains("$900.00"));
        assert!(text.contains("$2025.00"));
        assert!(text.contains('@'));
        assert!(text.contains("Legend:"));
        assert!(text.contains("Historical Price Line"));
        assert!(text.contains("Revenue"));
        // title + y label + 16 grid rows + axis + ticks + x label
        let before_legend = text.split("Legend:").next().unwrap();
        assert_eq!(before_legend.lines().count(), 1 + 1 + 16 + 1 + 1 + 1);
    }

    #[test]
    fn test_empty_reference_still_renders() {
        let calc = ValuationCalculator::new(ModelConfig {
            reference: ReferenceTable::new(vec![ReferenceExample::new(10.0, 100.0, 50.0)]),
            ..Default::default()
        })
        .unwrap();
        let result = calc.compute(5.0, 50.0).unwrap();
        let model = ChartModel::build(&ChartConfig::default(), &ReferenceTable::new(vec![]), &result);
        assert!(model.historical_line.is_none());
        assert!(model.x_max > 0.0 && model.y_max > 0.0);
        assert!(!model.render_text(30, 8).is_empty());
    }

    #[test]
    fn test_chart_config_validation() {
        assert!(ChartConfig::default().validate().is_ok());

        let tiny = ChartConfig {
            width: 4,
            ..Default::default()
        };
        assert!(tiny.validate().is_err());

        let mut inverted = ChartConfig::default();
        inverted.zones[0].revenue_to = Some(-1.0);
        assert!(inverted.validate().is_err());
    }

    #[test]
    fn test_chart_model_serializes() {
        let json = serde_json::to_value(model_for(230.0, 2300.0)).unwrap();
        assert_eq!(json["zones"][0]["kind"], "floor");
        assert_eq!(json["selected"]["label"], "$891.43");
    }
}
