//! Systematic Withdrawal Plan: a corpus that keeps earning while a fixed
//! amount is taken out at the start of every period.

use super::frequency::{ContributionFrequency, fraction};
use crate::core::chart::ChartSpec;
use crate::core::error::{CalcError, ensure_positive, ensure_range};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SwpRequest {
    pub initial_investment: f64,
    pub annual_return_rate: f64,
    pub withdrawal_amount: f64,
    pub tenure_years: u32,
    #[serde(default)]
    pub withdrawal_frequency: ContributionFrequency,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SwpYear {
    pub year: u32,
    pub opening_balance: f64,
    pub withdrawals: f64,
    pub returns: f64,
    pub closing_balance: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SwpResponse {
    pub initial_investment: f64,
    pub total_withdrawals: f64,
    pub final_balance: f64,
    pub total_returns: f64,
    /// Withdrawals plus what is left, over what went in.
    pub net_return_percentage: f64,
    /// First year in which the corpus could not cover a full withdrawal.
    pub depleted_in_year: Option<u32>,
    pub yearly_breakdown: Vec<SwpYear>,
}

impl SwpResponse {
    pub fn chart(&self) -> ChartSpec {
        ChartSpec::series(
            "Balance by year",
            self.yearly_breakdown
                .iter()
                .map(|row| (format!("Year {}", row.year), row.closing_balance)),
        )
    }
}

pub fn calculate(req: &SwpRequest) -> Result<SwpResponse, CalcError> {
    ensure_positive("initial_investment", req.initial_investment)?;
    ensure_positive("withdrawal_amount", req.withdrawal_amount)?;
    ensure_range("annual_return_rate", req.annual_return_rate, 0.0, 50.0)?;
    if !(1..=50).contains(&req.tenure_years) {
        return Err(CalcError::validation("tenure_years must be between 1 and 50"));
    }
    if !req.withdrawal_frequency.is_recurring() {
        return Err(CalcError::validation(
            "Withdrawals must recur; choose a daily, monthly, quarterly, half-yearly or yearly frequency",
        ));
    }

    let per_year = req.withdrawal_frequency.periods_per_year();
    let i = fraction(req.annual_return_rate) / per_year as f64;

    let mut balance = req.initial_investment;
    let mut total_withdrawals = 0.0;
    let mut depleted_in_year = None;
    let mut yearly_breakdown = Vec::with_capacity(req.tenure_years as usize);
    for year in 1..=req.tenure_years {
        let opening_balance = balance;
        let mut withdrawals = 0.0;
        for _ in 0..per_year {
            let taken = req.withdrawal_amount.min(balance);
            if taken < req.withdrawal_amount && depleted_in_year.is_none() {
                depleted_in_year = Some(year);
            }
            balance = (balance - taken) * (1.0 + i);
            withdrawals += taken;
        }
        total_withdrawals += withdrawals;
        yearly_breakdown.push(SwpYear {
            year,
            opening_balance,
            withdrawals,
            returns: balance - opening_balance + withdrawals,
            closing_balance: balance,
        });
    }

    let total_returns = total_withdrawals + balance - req.initial_investment;
    Ok(SwpResponse {
        initial_investment: req.initial_investment,
        total_withdrawals,
        final_balance: balance,
        total_returns,
        net_return_percentage: total_returns / req.initial_investment * 100.0,
        depleted_in_year,
        yearly_breakdown,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calc::sip::annuity_due_value;

    fn request() -> SwpRequest {
        SwpRequest {
            initial_investment: 1_000_000.0,
            annual_return_rate: 8.0,
            withdrawal_amount: 5000.0,
            tenure_years: 10,
            withdrawal_frequency: ContributionFrequency::Monthly,
        }
    }

    #[test]
    fn sustainable_plan_matches_closed_form() {
        let res = calculate(&request()).unwrap();
        let i = 0.08 / 12.0;
        let expected = 1_000_000.0 * (1.0f64 + i).powi(120) - annuity_due_value(5000.0, i, 120);
        assert!(((res.final_balance - expected) / expected).abs() < 1e-9);
        assert_eq!(res.total_withdrawals, 600_000.0);
        assert_eq!(res.depleted_in_year, None);
        assert_eq!(res.yearly_breakdown.len(), 10);
        assert_eq!(res.yearly_breakdown[0].withdrawals, 60_000.0);
    }

    #[test]
    fn corpus_runs_dry_and_stops_paying() {
        let mut req = request();
        req.withdrawal_amount = 20_000.0;
        req.annual_return_rate = 0.0;
        let res = calculate(&req).unwrap();
        // 50 full withdrawals empty the corpus during year 5.
        assert_eq!(res.total_withdrawals, 1_000_000.0);
        assert_eq!(res.final_balance, 0.0);
        assert_eq!(res.depleted_in_year, Some(5));
        assert_eq!(res.net_return_percentage, 0.0);
        assert_eq!(res.yearly_breakdown[9].withdrawals, 0.0);
    }

    #[test]
    fn yearly_rows_chain() {
        let mut req = request();
        req.withdrawal_frequency = ContributionFrequency::Quarterly;
        let res = calculate(&req).unwrap();
        for pair in res.yearly_breakdown.windows(2) {
            assert_eq!(pair[0].closing_balance, pair[1].opening_balance);
        }
        let returns: f64 = res.yearly_breakdown.iter().map(|row| row.returns).sum();
        assert!((returns - res.total_returns).abs() < 1e-6);
    }

    #[test]
    fn one_time_withdrawal_is_rejected() {
        let mut req = request();
        req.withdrawal_frequency = ContributionFrequency::OneTime;
        assert!(matches!(calculate(&req), Err(CalcError::Validation(_))));
        let mut req = request();
        req.tenure_years = 0;
        assert!(matches!(calculate(&req), Err(CalcError::Validation(_))));
    }
}
