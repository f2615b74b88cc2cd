//! Systematic Investment Plan: fixed instalments, compounded per instalment.

use super::frequency::{ContributionFrequency, fraction};
use crate::core::chart::ChartSpec;
use crate::core::error::{CalcError, ensure_positive, ensure_range};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SipRequest {
    pub sip_amount: f64,
    #[serde(default)]
    pub frequency: ContributionFrequency,
    pub return_rate: f64,
    pub tenure_years: u32,
    #[serde(default)]
    pub inflation_rate: f64,
}

/// One row of the year-by-year table shared by both SIP calculators.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SipYear {
    pub year: u32,
    /// Instalment paid during this year; constant for a plain SIP.
    pub sip_amount: f64,
    pub yearly_invested: f64,
    pub cumulative_invested: f64,
    pub cumulative_value: f64,
    pub yearly_returns: f64,
    pub inflation_adjusted_value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SipResponse {
    pub total_invested: f64,
    pub total_returns: f64,
    pub future_value: f64,
    pub inflation_adjusted_value: f64,
    pub yearly_breakdown: Vec<SipYear>,
}

impl SipResponse {
    pub fn chart(&self) -> ChartSpec {
        ChartSpec::breakdown(
            "SIP breakup",
            &[
                ("Total Invested", self.total_invested),
                ("Expected Returns", self.total_returns),
            ],
        )
    }
}

pub(crate) fn validate_common(
    return_rate: f64,
    tenure_years: u32,
    inflation_rate: f64,
) -> Result<(), CalcError> {
    ensure_range("returnRate", return_rate, 0.0, 100.0)?;
    ensure_range("inflationRate", inflation_rate, 0.0, 100.0)?;
    if !(1..=50).contains(&tenure_years) {
        return Err(CalcError::validation(
            "tenureYears must be between 1 and 50",
        ));
    }
    Ok(())
}

/// Future value of an annuity due: `P * ((1+i)^n - 1) / i * (1+i)`.
pub fn annuity_due_value(payment: f64, periodic_rate: f64, periods: u32) -> f64 {
    if periodic_rate == 0.0 {
        return payment * periods as f64;
    }
    let growth = (1.0 + periodic_rate).powi(periods as i32);
    payment * (growth - 1.0) / periodic_rate * (1.0 + periodic_rate)
}

/// Walks the instalments year by year. `amount_for_year` gives the
/// instalment size for a 1-based year.
pub(crate) fn simulate<F>(
    frequency: ContributionFrequency,
    return_rate: f64,
    tenure_years: u32,
    inflation_rate: f64,
    mut amount_for_year: F,
) -> Vec<SipYear>
where
    F: FnMut(u32) -> f64,
{
    let per_year = frequency.periods_per_year();
    let i = fraction(return_rate) / per_year as f64;
    let inflation = fraction(inflation_rate);

    let mut value = 0.0;
    let mut invested = 0.0;
    let mut rows = Vec::with_capacity(tenure_years as usize);
    for year in 1..=tenure_years {
        let instalment = amount_for_year(year);
        let payments = frequency.payments_in_year(year);
        for period in 0..per_year {
            let paid = if period < payments { instalment } else { 0.0 };
            value = (value + paid) * (1.0 + i);
        }
        let yearly_invested = instalment * payments as f64;
        invested += yearly_invested;
        rows.push(SipYear {
            year,
            sip_amount: instalment,
            yearly_invested,
            cumulative_invested: invested,
            cumulative_value: value,
            yearly_returns: value - invested,
            inflation_adjusted_value: value / (1.0 + inflation).powi(year as i32),
        });
    }
    rows
}

pub fn calculate(req: &SipRequest) -> Result<SipResponse, CalcError> {
    ensure_positive("sipAmount", req.sip_amount)?;
    validate_common(req.return_rate, req.tenure_years, req.inflation_rate)?;

    let per_year = req.frequency.periods_per_year();
    let periods = per_year * req.tenure_years;
    let i = fraction(req.return_rate) / per_year as f64;

    let future_value = if req.frequency.is_recurring() {
        annuity_due_value(req.sip_amount, i, periods)
    } else {
        req.sip_amount * (1.0 + i).powi(periods as i32)
    };
    let total_invested = req.sip_amount * req.frequency.total_payments(req.tenure_years) as f64;
    let inflation_adjusted_value =
        future_value / (1.0 + fraction(req.inflation_rate)).powi(req.tenure_years as i32);

    let yearly_breakdown = simulate(
        req.frequency,
        req.return_rate,
        req.tenure_years,
        req.inflation_rate,
        |_| req.sip_amount,
    );

    Ok(SipResponse {
        total_invested,
        total_returns: future_value - total_invested,
        future_value,
        inflation_adjusted_value,
        yearly_breakdown,
    })
}
