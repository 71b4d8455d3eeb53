//! Terminal rendering of result tables.
//!
//! Tables are drawn with box-drawing characters:
//!
//! ```text
//! ┌────────┬───────────────┬────────────────┐
//! │        │ Initial Price │ Earnout Year 1 │
//! ├────────┼───────────────┼────────────────┤
//! │ Year 0 │           300 │              0 │
//! └────────┴───────────────┴────────────────┘
//! ```
//!
//! The first column is left-aligned, numeric columns are right-aligned.

use valuator_core::{BuyBackTable, EarnoutSchedule, PaymentBreakdown, RelationsTable};

/// Render a header row and data rows as a box-drawn table.
pub fn render_table(headers: &[&str], rows: &[Vec<String>]) -> String {
    let col_count = rows
        .iter()
        .map(Vec::len)
        .chain(std::iter::once(headers.len()))
        .max()
        .unwrap_or(0);
    if col_count == 0 {
        return String::new();
    }

    let header: Vec<String> = headers.iter().map(|h| (*h).to_string()).collect();

    // Column widths: widest cell per column, at least 3
    let mut widths = vec![3usize; col_count];
    for row in std::iter::once(&header).chain(rows) {
        for (i, cell) in row.iter().enumerate() {
            widths[i] = widths[i].max(display_width(cell));
        }
    }

    let mut output = Vec::with_capacity(rows.len() + 4);
    output.push(build_border(&widths, '┌', '┬', '┐'));
    output.push(build_row(&header, &widths));
    output.push(build_border(&widths, '├', '┼', '┤'));
    for row in rows {
        output.push(build_row(row, &widths));
    }
    output.push(build_border(&widths, '└', '┴', '┘'));

    output.join("\n")
}

fn build_border(widths: &[usize], left: char, mid: char, right: char) -> String {
    let segments: Vec<String> = widths.iter().map(|&w| "─".repeat(w + 2)).collect();
    format!("{left}{}{right}", segments.join(&mid.to_string()))
}

fn build_row(cells: &[String], widths: &[usize]) -> String {
    let padded: Vec<String> = widths
        .iter()
        .enumerate()
        .map(|(i, &width)| {
            let cell = cells.get(i).map_or("", String::as_str);
            let padding = " ".repeat(width.saturating_sub(display_width(cell)));
            if i == 0 {
                format!(" {cell}{padding} ")
            } else {
                format!(" {padding}{cell} ")
            }
        })
        .collect();
    format!("│{}│", padded.join("│"))
}

fn display_width(s: &str) -> usize {
    console::measure_text_width(s)
}

/// Format an amount as dollars with two decimals and thousands separators.
pub fn money(value: f64) -> String {
    let sign = if value < 0.0 { "-" } else { "" };
    let cents = (value.abs() * 100.0).round();
    let whole = (cents / 100.0).trunc();
    let frac = cents - whole * 100.0;
    format!("{sign}${}.{:02}", group_thousands(whole as u64), frac as u64)
}

fn group_thousands(n: u64) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

/// Whole amounts are printed without a fractional part.
fn amount(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{value:.0}")
    } else {
        format!("{value:.2}")
    }
}

pub fn earnout_table(schedule: &EarnoutSchedule) -> String {
    let rows: Vec<Vec<String>> = schedule
        .rows
        .iter()
        .map(|r| {
            vec![
                r.label.clone(),
                r.initial_price.to_string(),
                r.earnout_year1.to_string(),
                r.earnout_year2.to_string(),
                r.total.to_string(),
            ]
        })
        .collect();
    render_table(&EarnoutSchedule::HEADERS, &rows)
}

pub fn payment_table(payments: &PaymentBreakdown) -> String {
    let rows: Vec<Vec<String>> = payments
        .rows()
        .into_iter()
        .map(|(label, values)| {
            std::iter::once(label.to_string())
                .chain(values.iter().map(ToString::to_string))
                .collect()
        })
        .collect();
    render_table(&PaymentBreakdown::HEADERS, &rows)
}

pub fn buy_back_table(table: &BuyBackTable) -> String {
    let rows: Vec<Vec<String>> = table
        .rows()
        .into_iter()
        .map(|(label, values)| {
            std::iter::once(label.to_string())
                .chain(values.iter().map(|v| amount(*v)))
                .collect()
        })
        .collect();
    render_table(&BuyBackTable::HEADERS, &rows)
}

pub fn relations_table(table: &RelationsTable) -> String {
    let mut headers = vec!["EBIT \\ Revenue".to_string()];
    headers.extend(table.revenue_columns.iter().map(|r| amount(*r)));
    let headers: Vec<&str> = headers.iter().map(String::as_str).collect();

    let rows: Vec<Vec<String>> = table
        .rows
        .iter()
        .map(|(ebit, values)| {
            std::iter::once(amount(*ebit))
                .chain(values.iter().map(ToString::to_string))
                .collect()
        })
        .collect();
    render_table(&headers, &rows)
}
