//! Recurring deposit: a fixed deposit each month, compounded monthly.

use super::frequency::fraction;
use super::sip::annuity_due_value;
use crate::core::chart::ChartSpec;
use crate::core::error::{CalcError, ensure_positive, ensure_range};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RdRequest {
    pub monthly_deposit: f64,
    pub annual_interest_rate: f64,
    pub tenure_years: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RdYear {
    pub year: u32,
    pub deposits_till_date: f64,
    pub balance: f64,
    pub interest_till_date: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RdResponse {
    pub total_deposits: f64,
    pub maturity_amount: f64,
    pub interest_earned: f64,
    pub total_return_percentage: f64,
    pub year_wise_data: Vec<RdYear>,
}

impl RdResponse {
    pub fn chart(&self) -> ChartSpec {
        ChartSpec::breakdown(
            "Deposits vs interest",
            &[
                ("Total Deposits", self.total_deposits),
                ("Interest Earned", self.interest_earned),
            ],
        )
    }
}

pub fn calculate(req: &RdRequest) -> Result<RdResponse, CalcError> {
    ensure_positive("monthly_deposit", req.monthly_deposit)?;
    ensure_range("annual_interest_rate", req.annual_interest_rate, 0.0, 100.0)?;
    if !(1..=50).contains(&req.tenure_years) {
        return Err(CalcError::validation(
            "tenure_years must be between 1 and 50",
        ));
    }

    let i = fraction(req.annual_interest_rate) / 12.0;
    let months = req.tenure_years * 12;
    let total_deposits = req.monthly_deposit * months as f64;
    let maturity_amount = annuity_due_value(req.monthly_deposit, i, months);
    let interest_earned = maturity_amount - total_deposits;

    let year_wise_data = (1..=req.tenure_years)
        .map(|year| {
            let deposits = req.monthly_deposit * (year * 12) as f64;
            let balance = annuity_due_value(req.monthly_deposit, i, year * 12);
            RdYear {
                year,
                deposits_till_date: deposits,
                balance,
                interest_till_date: balance - deposits,
            }
        })
        .collect();

    Ok(RdResponse {
        total_deposits,
        maturity_amount,
        interest_earned,
        total_return_percentage: interest_earned / total_deposits * 100.0,
        year_wise_data,
    })
}
