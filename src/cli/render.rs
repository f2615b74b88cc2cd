//! Tables for calculator results.
//!
//! Responses are rendered from their JSON form: scalar fields become a
//! summary table, the first list of rows becomes a breakdown table.

use super::ui;
use crate::core::CalcResponse;
use comfy_table::Cell;
use serde_json::{Map, Value};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FieldKind {
    Money,
    Percent,
    Plain,
}

fn field_kind(key: &str) -> FieldKind {
    let key = key.to_lowercase();
    if key.contains("percent") || key.contains("rate") || key.contains("cagr") || key.contains("apr") {
        FieldKind::Percent
    } else if key.ends_with("year")
        || key.contains("years")
        || key.contains("period")
        || key.contains("months")
        || key.contains("count")
    {
        FieldKind::Plain
    } else {
        FieldKind::Money
    }
}

/// `totalInvested` and `total_invested` both become "Total Invested".
pub fn humanize(key: &str) -> String {
    let mut words: Vec<String> = Vec::new();
    let mut current = String::new();
    for ch in key.chars() {
        if ch == '_' || ch == '-' {
            if !current.is_empty() {
                words.push(std::mem::take(&mut current));
            }
        } else if ch.is_uppercase() && !current.is_empty() {
            words.push(std::mem::take(&mut current));
            current.push(ch);
        } else {
            current.push(ch);
        }
    }
    if !current.is_empty() {
        words.push(current);
    }
    words
        .iter()
        .map(|w| {
            let mut chars = w.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

fn format_value(key: &str, value: &Value, symbol: &str) -> String {
    match value {
        Value::Number(n) => {
            let v = n.as_f64().unwrap_or_default();
            match field_kind(key) {
                FieldKind::Money => ui::format_amount(v, symbol),
                FieldKind::Percent => ui::format_percentage(v),
                FieldKind::Plain if v.fract() == 0.0 => format!("{v:.0}"),
                FieldKind::Plain => format!("{v:.2}"),
            }
        }
        Value::Null => "N/A".to_string(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn value_cell(key: &str, value: &Value, symbol: &str) -> Cell {
    let text = format_value(key, value, symbol);
    match value {
        Value::Null => ui::format_optional_cell(None::<f64>, |v| v.to_string()),
        Value::Number(n) if key.contains("gain") || key.contains("returns") => {
            ui::signed_cell(n.as_f64().unwrap_or_default(), text)
        }
        _ => ui::value_cell(text),
    }
}

fn fields_of(res: &CalcResponse) -> Map<String, Value> {
    match serde_json::to_value(res) {
        Ok(Value::Object(map)) => map,
        _ => Map::new(),
    }
}

pub fn summary_table(res: &CalcResponse, symbol: &str) -> String {
    let mut table = ui::new_styled_table();
    table.set_header(vec![ui::header_cell("Result"), ui::header_cell("Value")]);
    for (key, value) in fields_of(res).iter().filter(|(_, v)| !v.is_array()) {
        table.add_row(vec![Cell::new(humanize(key)), value_cell(key, value, symbol)]);
    }
    table.to_string()
}

/// The year-wise (or flow-wise) table, when the result has one.
pub fn breakdown_table(res: &CalcResponse, symbol: &str) -> Option<String> {
    let fields = fields_of(res);
    let rows = fields.values().find_map(|v| match v {
        Value::Array(rows) if rows.first().is_some_and(Value::is_object) => Some(rows),
        _ => None,
    })?;
    let columns: Vec<String> = rows.first()?.as_object()?.keys().cloned().collect();

    let mut table = ui::new_styled_table();
    table.set_header(columns.iter().map(|c| ui::header_cell(&humanize(c))));
    for row in rows.iter().filter_map(Value::as_object) {
        table.add_row(columns.iter().map(|c| {
            let value = row.get(c).unwrap_or(&Value::Null);
            value_cell(c, value, symbol)
        }));
    }
    Some(table.to_string())
}

pub fn display(res: &CalcResponse, symbol: &str) -> String {
    let mut output = format!(
        "{}\n\n{}",
        ui::style_text(&humanize(res.kind().name()), ui::StyleType::Title),
        summary_table(res, symbol)
    );
    if let Some(breakdown) = breakdown_table(res, symbol) {
        output.push_str("\n\n");
        output.push_str(&breakdown);
    }
    output
}

/// The one number a batch summary shows for each calculator.
pub fn headline(res: &CalcResponse) -> (&'static str, Option<f64>) {
    match res {
        CalcResponse::Sip(r) => ("Future value", Some(r.future_value)),
        CalcResponse::StepUpSip(r) => ("Future value", Some(r.future_value)),
        CalcResponse::LumpSum(r) => ("Future value", Some(r.future_value)),
        CalcResponse::GoalSip(r) => ("Required SIP", Some(r.required_sip)),
        CalcResponse::ReverseSip(r) => ("Required SIP", Some(r.sip_amount)),
        CalcResponse::Swp(r) => ("Final balance", Some(r.final_balance)),
        CalcResponse::CompoundInterest(r) => ("Final amount", Some(r.final_amount)),
        CalcResponse::FutureValue(r) => ("Future value", Some(r.future_value)),
        CalcResponse::DailyCompoundInterest(r) => ("Future value", Some(r.future_value)),
        CalcResponse::Fd(r) => ("Maturity amount", Some(r.maturity_amount)),
        CalcResponse::Rd(r) => ("Maturity amount", Some(r.maturity_amount)),
        CalcResponse::Ppf(r) => ("Maturity value", Some(r.maturity_value)),
        CalcResponse::Nsc(r) => ("Maturity amount", Some(r.maturity_amount)),
        CalcResponse::Kvp(r) => ("Maturity amount", Some(r.maturity_amount)),
        CalcResponse::Epf(r) => ("EPF corpus", Some(r.total_corpus)),
        CalcResponse::Ssy(r) => ("Maturity amount", Some(r.maturity_amount)),
        CalcResponse::Scss(r) => ("Quarterly interest", Some(r.quarterly_interest)),
        CalcResponse::Pomis(r) => ("Monthly income", Some(r.monthly_interest)),
        CalcResponse::Gratuity(r) => ("Gratuity", Some(r.gratuity_amount)),
        CalcResponse::LoanAmount(r) => ("Loan amount", Some(r.principal_amount)),
        CalcResponse::LoanTenure(r) => ("Tenure (months)", Some(r.tenure_months as f64)),
        CalcResponse::InterestRate(r) => ("Interest rate %", Some(r.interest_rate)),
        CalcResponse::Gst(r) => ("Total amount", Some(r.total_amount)),
        CalcResponse::Hra(r) => ("HRA exempt", Some(r.hra_exempt)),
        CalcResponse::Inflation(r) => ("Future cost", Some(r.future_value)),
        CalcResponse::Cagr(r) => ("CAGR %", Some(r.cagr_percentage)),
        CalcResponse::ReverseCagr(r) => ("Invest today", Some(r.initial_investment)),
        CalcResponse::RuleOf72(r) => match r {
            crate::calc::growth::RuleOf72Response::YearsToDouble {
                years_to_double_exact,
                ..
            } => ("Years to double", Some(*years_to_double_exact)),
            crate::calc::growth::RuleOf72Response::RequiredRate {
                required_rate_exact,
                ..
            } => ("Required rate %", Some(*required_rate_exact)),
        },
        CalcResponse::XirrAnalysis(r) => ("XIRR %", r.xirr_percentage),
    }
}
