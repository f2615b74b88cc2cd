//! Building calculator requests from `key=value` arguments and input files.

use crate::calc::xirr::CashFlow;
use crate::core::{CalcRequest, CalculatorKind};
use anyhow::{Context, Result, anyhow};
use chrono::NaiveDate;
use serde_json::{Map, Value};
use std::path::Path;

/// Parses `key=value`. Integers stay integers so they fit `u32` fields;
/// anything non-numeric is passed through as a string.
pub fn parse_pair(pair: &str) -> Result<(String, Value)> {
    let (key, raw) = pair
        .split_once('=')
        .ok_or_else(|| anyhow!("Expected key=value, got '{pair}'"))?;
    let key = key.trim();
    if key.is_empty() {
        return Err(anyhow!("Missing key in '{pair}'"));
    }
    let raw = raw.trim();
    let value = if let Ok(i) = raw.parse::<i64>() {
        Value::from(i)
    } else if let Ok(f) = raw.parse::<f64>() {
        Value::from(f)
    } else if let Ok(b) = raw.parse::<bool>() {
        Value::from(b)
    } else {
        Value::from(raw)
    };
    Ok((key.to_string(), value))
}

/// Reads a YAML or JSON document into a JSON value.
pub fn read_document(path: &Path) -> Result<Value> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read input file: {}", path.display()))?;
    serde_yaml::from_str(&text)
        .with_context(|| format!("Failed to parse input file: {}", path.display()))
}

/// File fields first, then `key=value` pairs on top.
pub fn build_request(
    kind: CalculatorKind,
    input: Option<&Path>,
    pairs: &[String],
) -> Result<CalcRequest> {
    let mut fields = match input.map(read_document).transpose()? {
        Some(Value::Object(map)) => map,
        Some(_) => return Err(anyhow!("Input file must contain a mapping of fields")),
        None => Map::new(),
    };
    for pair in pairs {
        let (key, value) = parse_pair(pair)?;
        fields.insert(key, value);
    }
    CalcRequest::from_value(kind, Value::Object(fields))
        .with_context(|| format!("Invalid input for {kind}"))
}

/// Parses `YYYY-MM-DD:amount`, e.g. `2024-01-15:-5000`.
pub fn parse_cash_flow(arg: &str) -> Result<CashFlow> {
    let (date, amount) = arg
        .split_once(':')
        .ok_or_else(|| anyhow!("Expected DATE:AMOUNT, got '{arg}'"))?;
    let date = NaiveDate::parse_from_str(date.trim(), "%Y-%m-%d")
        .with_context(|| format!("Invalid date in '{arg}'"))?;
    let amount: f64 = amount
        .trim()
        .parse()
        .with_context(|| format!("Invalid amount in '{arg}'"))?;
    Ok(CashFlow::new(date, amount))
}

/// Accepts either a bare list of flows or `{cashFlows: [...]}`.
pub fn read_cash_flows(path: &Path) -> Result<Vec<CashFlow>> {
    let doc = read_document(path)?;
    let list = match doc {
        Value::Object(mut map) => map
            .remove("cashFlows")
            .or_else(|| map.remove("cash_flows"))
            .ok_or_else(|| anyhow!("No cashFlows in {}", path.display()))?,
        other => other,
    };
    serde_json::from_value(list)
        .with_context(|| format!("Invalid cash flows in {}", path.display()))
}
