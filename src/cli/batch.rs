//! Runs a list of named calculations from a YAML file concurrently.
//!
//! ```yaml
//! - name: "Retirement SIP"
//!   calculator: sip
//!   input: { sipAmount: 10000, returnRate: 12, tenureYears: 25 }
//! ```

use super::calc::OutputOptions;
use super::{render, ui};
use crate::core::{CalcError, CalcRequest, CalcResponse, Calculator, CalculatorKind};
use anyhow::{Context, Result};
use comfy_table::Cell;
use futures::future::join_all;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{debug, info};

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct BatchEntry {
    pub name: String,
    pub calculator: String,
    #[serde(default)]
    pub input: serde_json::Value,
}

#[derive(Debug, Serialize)]
pub struct BatchOutcome {
    pub name: String,
    pub calculator: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<CalcResponse>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

pub fn load_entries(path: &Path) -> Result<Vec<BatchEntry>> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read batch file: {}", path.display()))?;
    serde_yaml::from_str(&text)
        .with_context(|| format!("Failed to parse batch file: {}", path.display()))
}

fn prepare(entry: &BatchEntry) -> Result<CalcRequest, String> {
    let kind: CalculatorKind = entry.calculator.parse().map_err(|e: anyhow::Error| e.to_string())?;
    let input = if entry.input.is_null() {
        serde_json::Value::Object(Default::default())
    } else {
        entry.input.clone()
    };
    CalcRequest::from_value(kind, input).map_err(|e| e.to_string())
}

/// Evaluates every entry; a failing entry never stops the others.
pub async fn evaluate_all(calculator: &dyn Calculator, entries: &[BatchEntry]) -> Vec<BatchOutcome> {
    let pb = ui::new_progress_bar(entries.len() as u64, true);
    pb.set_message("Calculating");

    let futures = entries.iter().map(|entry| {
        let pb_clone = pb.clone();
        async move {
            let result: Result<CalcResponse, String> = match prepare(entry) {
                Ok(req) => calculator
                    .calculate(&req)
                    .await
                    .map_err(|e: CalcError| e.to_string()),
                Err(e) => Err(e),
            };
            pb_clone.inc(1);
            debug!(name = %entry.name, ok = result.is_ok(), "Batch entry finished");
            let (result, error) = match result {
                Ok(res) => (Some(res), None),
                Err(e) => (None, Some(e)),
            };
            BatchOutcome {
                name: entry.name.clone(),
                calculator: entry.calculator.clone(),
                result,
                error,
            }
        }
    });

    let outcomes = join_all(futures).await;
    pb.finish_and_clear();
    outcomes
}

pub fn display_outcomes(outcomes: &[BatchOutcome], symbol: &str) -> String {
    let mut table = ui::new_styled_table();
    table.set_header(vec![
        ui::header_cell("Name"),
        ui::header_cell("Calculator"),
        ui::header_cell("Result"),
        ui::header_cell("Value"),
    ]);

    let mut failures = 0;
    for outcome in outcomes {
        let (label, value_cell) = match (&outcome.result, &outcome.error) {
            (Some(res), _) => {
                let (label, value) = render::headline(res);
                let cell = ui::format_optional_cell(value, |v| {
                    if label.ends_with('%') {
                        ui::format_percentage(v)
                    } else if label.starts_with("Years") {
                        format!("{v:.2}")
                    } else if label.starts_with("Tenure") {
                        format!("{v:.0}")
                    } else {
                        ui::format_amount(v, symbol)
                    }
                });
                (label.to_string(), cell)
            }
            (None, error) => {
                failures += 1;
                (
                    ui::style_text("Error", ui::StyleType::Error),
                    Cell::new(error.as_deref().unwrap_or("unknown error")),
                )
            }
        };
        table.add_row(vec![
            Cell::new(&outcome.name),
            Cell::new(&outcome.calculator),
            Cell::new(label),
            value_cell,
        ]);
    }

    let mut output = format!(
        "{}\n\n{}",
        ui::style_text("Batch Results", ui::StyleType::Title),
        table
    );
    output.push_str(&format!(
        "\n\n{}: {}",
        ui::style_text("Completed", ui::StyleType::TotalLabel),
        ui::style_text(
            &format!("{}/{}", outcomes.len() - failures, outcomes.len()),
            if failures == 0 {
                ui::StyleType::TotalValue
            } else {
                ui::StyleType::Error
            }
        )
    ));
    output
}

pub async fn run(
    calculator: &dyn Calculator,
    path: &Path,
    symbol: &str,
    opts: OutputOptions,
) -> Result<String> {
    let entries = load_entries(path)?;
    info!(entries = entries.len(), "Running batch calculations...");
    if entries.is_empty() {
        return Ok("No calculations found in batch file.".to_string());
    }

    let outcomes = evaluate_all(calculator, &entries).await;
    if opts.json {
        return Ok(serde_json::to_string_pretty(&outcomes)?);
    }
    Ok(display_outcomes(&outcomes, symbol))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::LocalCalculator;
    use std::io::Write;

    const BATCH: &str = r#"
- name: "Retirement"
  calculator: sip
  input: { sipAmount: 10000, returnRate: 12, tenureYears: 25 }
- name: "Tax"
  calculator: gst
  input: { amount: 1000, gst_rate: 18, calculation_type: add }
- name: "Broken"
  calculator: loan-emi
- name: "Bad input"
  calculator: fd
  input: { principal_amount: -5, annual_interest_rate: 7, tenure_years: 1 }
"#;

    fn batch_file() -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{BATCH}").unwrap();
        file
    }

    #[tokio::test]
    async fn test_failures_are_isolated() {
        let entries = load_entries(batch_file().path()).unwrap();
        let outcomes = evaluate_all(&LocalCalculator, &entries).await;

        assert_eq!(outcomes.len(), 4);
        assert!(outcomes[0].result.is_some());
        assert!(outcomes[1].result.is_some());
        assert!(outcomes[2].error.as_deref().unwrap().contains("Unknown calculator"));
        assert!(outcomes[3].error.is_some());
    }

    #[tokio::test]
    async fn test_summary_counts_completed() {
        let out = run(
            &LocalCalculator,
            batch_file().path(),
            "₹",
            OutputOptions::default(),
        )
        .await
        .unwrap();
        assert!(out.contains("Retirement"));
        assert!(out.contains("₹1,180"));
        assert!(out.contains("2/4"));
    }
}
