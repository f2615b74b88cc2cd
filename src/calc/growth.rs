//! Growth-rate arithmetic: CAGR, reverse CAGR and the rule of 72.

use super::frequency::fraction;
use crate::core::chart::ChartSpec;
use crate::core::error::{CalcError, ensure_positive, ensure_range};
use rust_decimal::{Decimal, prelude::*};
use rust_finprim::rate::cagr;
use serde::{Deserialize, Serialize};
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CagrRequest {
    pub initial_value: f64,
    pub final_value: f64,
    pub years: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CagrResponse {
    pub cagr_percentage: f64,
    pub absolute_return_percentage: f64,
}

impl CagrResponse {
    pub fn chart(&self) -> ChartSpec {
        ChartSpec::breakdown(
            "Annualized vs absolute return",
            &[
                ("CAGR %", self.cagr_percentage),
                ("Absolute %", self.absolute_return_percentage),
            ],
        )
    }
}

pub(crate) fn to_decimal(field: &str, value: f64) -> Result<Decimal, CalcError> {
    Decimal::from_f64(value)
        .ok_or_else(|| CalcError::validation(format!("{field} is out of range")))
}

/// `cagr` divides and raises with unchecked `Decimal` arithmetic, so the same
/// operations are tried with their checked forms first.
fn checked_cagr(begin_bal: Decimal, end_bal: Decimal, n_years: Decimal) -> Option<Decimal> {
    let ratio = end_bal.checked_div(begin_bal)?;
    ratio.checked_powd(Decimal::ONE.checked_div(n_years)?)?;
    Some(cagr(begin_bal, end_bal, n_years))
}

pub fn calculate_cagr(req: &CagrRequest) -> Result<CagrResponse, CalcError> {
    ensure_positive("initial_value", req.initial_value)?;
    ensure_positive("final_value", req.final_value)?;
    ensure_range("years", req.years, 0.01, 100.0)?;

    let begin_bal = to_decimal("initial_value", req.initial_value)?;
    let end_bal = to_decimal("final_value", req.final_value)?;
    let n_years = to_decimal("years", req.years)?;

    let rate = checked_cagr(begin_bal, end_bal, n_years).ok_or_else(|| {
        CalcError::validation("Values are too far apart to compute a growth rate")
    })?;
    let cagr_percentage = rate
        .checked_mul(Decimal::ONE_HUNDRED)
        .and_then(|pct| pct.to_f64())
        .ok_or_else(|| CalcError::validation("CAGR is out of range"))?;
    debug!("cagr: {begin_bal}, {end_bal}, {n_years} = {rate}");

    Ok(CagrResponse {
        cagr_percentage,
        absolute_return_percentage: (req.final_value - req.initial_value) / req.initial_value * 100.0,
    })
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReverseCagrRequest {
    pub target_amount: f64,
    pub expected_cagr: f64,
    pub investment_years: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GrowthRow {
    pub year: u32,
    pub opening_balance: f64,
    pub growth_amount: f64,
    pub closing_balance: f64,
    pub cumulative_growth: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReverseCagrResponse {
    pub initial_investment: f64,
    pub target_amount: f64,
    pub total_growth: f64,
    pub growth_table: Vec<GrowthRow>,
}

impl ReverseCagrResponse {
    pub fn chart(&self) -> ChartSpec {
        ChartSpec::series(
            "Path to target",
            self.growth_table
                .iter()
                .map(|row| (format!("Year {}", row.year), row.closing_balance)),
        )
    }
}

/// Lump sum needed today to reach `target_amount` at a given CAGR.
pub fn reverse_cagr(req: &ReverseCagrRequest) -> Result<ReverseCagrResponse, CalcError> {
    ensure_positive("targetAmount", req.target_amount)?;
    ensure_range("expectedCagr", req.expected_cagr, 0.0, 100.0)?;
    if !(1..=100).contains(&req.investment_years) {
        return Err(CalcError::validation(
            "investmentYears must be between 1 and 100",
        ));
    }

    let g = fraction(req.expected_cagr);
    let initial_investment = req.target_amount / (1.0 + g).powi(req.investment_years as i32);

    let mut value = initial_investment;
    let growth_table = (1..=req.investment_years)
        .map(|year| {
            let opening = value;
            value = opening * (1.0 + g);
            GrowthRow {
                year,
                opening_balance: opening,
                growth_amount: value - opening,
                closing_balance: value,
                cumulative_growth: value - initial_investment,
            }
        })
        .collect();

    Ok(ReverseCagrResponse {
        initial_investment,
        target_amount: req.target_amount,
        total_growth: req.target_amount - initial_investment,
        growth_table,
    })
}

/// Exactly one of the two fields must be set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleOf72Request {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interest_rate: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub years_to_double: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum RuleOf72Response {
    /// Given a rate, how long until money doubles.
    YearsToDouble {
        interest_rate: f64,
        years_to_double_rule_72: f64,
        years_to_double_exact: f64,
        /// `100 - relative error %` of the estimate.
        accuracy_percentage: f64,
    },
    /// Given a horizon, the rate that doubles money within it.
    RequiredRate {
        years_to_double: f64,
        required_rate_rule_72: f64,
        required_rate_exact: f64,
        accuracy_percentage: f64,
    },
}

impl RuleOf72Response {
    pub fn chart(&self) -> ChartSpec {
        let (estimate, exact) = match self {
            RuleOf72Response::YearsToDouble {
                years_to_double_rule_72,
                years_to_double_exact,
                ..
            } => (*years_to_double_rule_72, *years_to_double_exact),
            RuleOf72Response::RequiredRate {
                required_rate_rule_72,
                required_rate_exact,
                ..
            } => (*required_rate_rule_72, *required_rate_exact),
        };
        ChartSpec::breakdown("Rule of 72 vs exact", &[("Rule of 72", estimate), ("Exact", exact)])
    }
}

fn accuracy(estimate: f64, exact: f64) -> f64 {
    100.0 - (estimate - exact).abs() / exact * 100.0
}

pub fn rule_of_72(req: &RuleOf72Request) -> Result<RuleOf72Response, CalcError> {
    match (req.interest_rate, req.years_to_double) {
        (Some(rate), None) => {
            ensure_range("interest_rate", rate, 0.01, 100.0)?;
            let estimate = 72.0 / rate;
            let exact = std::f64::consts::LN_2 / (1.0 + fraction(rate)).ln();
            Ok(RuleOf72Response::YearsToDouble {
                interest_rate: rate,
                years_to_double_rule_72: estimate,
                years_to_double_exact: exact,
                accuracy_percentage: accuracy(estimate, exact),
            })
        }
        (None, Some(years)) => {
            ensure_range("years_to_double", years, 0.1, 100.0)?;
            let estimate = 72.0 / years;
            let exact = (2f64.powf(1.0 / years) - 1.0) * 100.0;
            Ok(RuleOf72Response::RequiredRate {
                years_to_double: years,
                required_rate_rule_72: estimate,
                required_rate_exact: exact,
                accuracy_percentage: accuracy(estimate, exact),
            })
        }
        _ => Err(CalcError::validation(
            "Provide either interest_rate or years_to_double, not both",
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cagr_of_doubling_in_five_years() {
        let res = calculate_cagr(&CagrRequest {
            initial_value: 100_000.0,
            final_value: 200_000.0,
            years: 5.0,
        })
        .unwrap();
        assert!((res.cagr_percentage - 14.8698).abs() < 1e-3);
        assert!((res.absolute_return_percentage - 100.0).abs() < 1e-9);
    }

    #[test]
    fn cagr_rejects_values_beyond_decimal_precision() {
        let vanishing_start = CagrRequest {
            initial_value: 1e-30,
            final_value: 1e6,
            years: 5.0,
        };
        assert!(matches!(
            calculate_cagr(&vanishing_start),
            Err(CalcError::Validation(_))
        ));

        let overflowing_growth = CagrRequest {
            initial_value: 0.0001,
            final_value: 1e22,
            years: 0.01,
        };
        assert!(matches!(
            calculate_cagr(&overflowing_growth),
            Err(CalcError::Validation(_))
        ));
    }

    #[test]
    fn cagr_rejects_non_positive_values() {
        let req = CagrRequest {
            initial_value: 0.0,
            final_value: 10.0,
            years: 1.0,
        };
        assert!(matches!(calculate_cagr(&req), Err(CalcError::Validation(_))));
    }

    #[test]
    fn reverse_cagr_discounts_target() {
        let req: ReverseCagrRequest = serde_json::from_str(
            r#"{"targetAmount":1000000,"expectedCagr":12,"investmentYears":10}"#,
        )
        .unwrap();
        let res = reverse_cagr(&req).unwrap();
        assert!((res.initial_investment - 321_973.24).abs() < 0.01);
        let last = res.growth_table.last().unwrap();
        assert!((last.closing_balance - 1_000_000.0).abs() < 1e-6);
        assert!((last.cumulative_growth - res.total_growth).abs() < 1e-6);
    }

    #[test]
    fn rule_of_72_in_both_directions() {
        let by_rate = rule_of_72(&RuleOf72Request {
            interest_rate: Some(8.0),
            years_to_double: None,
        })
        .unwrap();
        match by_rate {
            RuleOf72Response::YearsToDouble {
                years_to_double_rule_72,
                years_to_double_exact,
                accuracy_percentage,
                ..
            } => {
                assert_eq!(years_to_double_rule_72, 9.0);
                assert!((years_to_double_exact - 9.0064).abs() < 1e-3);
                assert!(accuracy_percentage > 99.0);
            }
            other => panic!("unexpected {other:?}"),
        }

        let by_years = rule_of_72(&RuleOf72Request {
            interest_rate: None,
            years_to_double: Some(6.0),
        })
        .unwrap();
        let RuleOf72Response::RequiredRate {
            required_rate_rule_72,
            required_rate_exact,
            ..
        } = by_years
        else {
            panic!("expected required-rate mode");
        };
        assert_eq!(required_rate_rule_72, 12.0);
        assert!((required_rate_exact - 12.2462).abs() < 1e-3);
    }

    #[test]
    fn rule_of_72_needs_exactly_one_input() {
        let both = RuleOf72Request {
            interest_rate: Some(8.0),
            years_to_double: Some(9.0),
        };
        let neither = RuleOf72Request {
            interest_rate: None,
            years_to_double: None,
        };
        assert!(rule_of_72(&both).is_err());
        assert!(rule_of_72(&neither).is_err());
    }
}
