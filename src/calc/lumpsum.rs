//! One-off investment compounded once a year.

use super::frequency::{ContributionFrequency, fraction};
use super::sip::{SipYear, simulate, validate_common};
use crate::core::chart::ChartSpec;
use crate::core::error::{CalcError, ensure_positive};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LumpSumRequest {
    pub lump_sum_amount: f64,
    pub return_rate: f64,
    pub tenure_years: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LumpSumResponse {
    pub total_invested: f64,
    pub total_returns: f64,
    pub future_value: f64,
    pub yearly_breakdown: Vec<SipYear>,
}

impl LumpSumResponse {
    pub fn chart(&self) -> ChartSpec {
        ChartSpec::breakdown(
            "Lump sum breakup",
            &[
                ("Total Invested", self.total_invested),
                ("Expected Returns", self.total_returns),
            ],
        )
    }
}

pub fn calculate(req: &LumpSumRequest) -> Result<LumpSumResponse, CalcError> {
    ensure_positive("lumpSumAmount", req.lump_sum_amount)?;
    validate_common(req.return_rate, req.tenure_years, 0.0)?;

    let yearly_breakdown = simulate(
        ContributionFrequency::Yearly,
        req.return_rate,
        req.tenure_years,
        0.0,
        |year| if year == 1 { req.lump_sum_amount } else { 0.0 },
    );
    let future_value = req.lump_sum_amount
        * (1.0 + fraction(req.return_rate)).powi(req.tenure_years as i32);

    Ok(LumpSumResponse {
        total_invested: req.lump_sum_amount,
        total_returns: future_value - req.lump_sum_amount,
        future_value,
        yearly_breakdown,
    })
}
