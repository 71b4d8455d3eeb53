//! Interactive prompts for figures not given on the command line.

use anyhow::Result;
use dialoguer::{theme::ColorfulTheme, Input};
use valuator_core::parse_amount;

/// Use `given` when present, otherwise ask for the amount.
///
/// The prompt re-asks until the text parses as an amount.
pub fn amount_or_prompt(given: Option<f64>, label: &str, default: f64) -> Result<f64> {
    if let Some(value) = given {
        return Ok(value);
    }

    let field = label.to_string();
    let raw: String = Input::with_theme(&ColorfulTheme::default())
        .with_prompt(format!("Enter {label}"))
        .default(default.to_string())
        .validate_with(move |input: &String| -> std::result::Result<(), String> {
            parse_amount(&field, input).map(|_| ()).map_err(|e| e.to_string())
        })
        .interact_text()?;

    Ok(parse_amount(label, &raw)?)
}
