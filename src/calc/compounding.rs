//! Lump sums compounded at a fixed frequency: compound interest, future value
//! and fixed deposits all reduce to `P * (1 + r/n)^(n*t)`.

use super::frequency::{CompoundingFrequency, fraction};
use crate::core::chart::ChartSpec;
use crate::core::error::{CalcError, ensure_positive, ensure_range};
use serde::{Deserialize, Serialize};

pub fn compound(principal: f64, annual_rate: f64, frequency: CompoundingFrequency, years: f64) -> f64 {
    let n = frequency.periods_per_year() as f64;
    principal * (1.0 + annual_rate / n).powf(n * years)
}

fn validate_lump_sum(principal: f64, rate_percent: f64, years: f64) -> Result<(), CalcError> {
    ensure_positive("principal", principal)?;
    ensure_range("interest rate", rate_percent, 0.0, 100.0)?;
    ensure_range("tenure", years, 0.0, 100.0)?;
    Ok(())
}

fn default_monthly() -> CompoundingFrequency {
    CompoundingFrequency::Monthly
}

fn default_quarterly() -> CompoundingFrequency {
    CompoundingFrequency::Quarterly
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompoundInterestRequest {
    pub principal_amount: f64,
    pub annual_interest_rate: f64,
    pub tenure_years: f64,
    #[serde(default = "default_monthly")]
    pub compounding_frequency: CompoundingFrequency,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompoundInterestResponse {
    pub principal_amount: f64,
    pub final_amount: f64,
    pub interest_earned: f64,
    pub total_return_percentage: f64,
}

impl CompoundInterestResponse {
    pub fn chart(&self) -> ChartSpec {
        ChartSpec::breakdown(
            "Principal vs interest",
            &[
                ("Principal", self.principal_amount),
                ("Interest", self.interest_earned),
            ],
        )
    }
}

pub fn compound_interest(req: &CompoundInterestRequest) -> Result<CompoundInterestResponse, CalcError> {
    validate_lump_sum(req.principal_amount, req.annual_interest_rate, req.tenure_years)?;
    let final_amount = compound(
        req.principal_amount,
        fraction(req.annual_interest_rate),
        req.compounding_frequency,
        req.tenure_years,
    );
    let interest_earned = final_amount - req.principal_amount;
    Ok(CompoundInterestResponse {
        principal_amount: req.principal_amount,
        final_amount,
        interest_earned,
        total_return_percentage: interest_earned / req.principal_amount * 100.0,
    })
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FutureValueRequest {
    pub principal: f64,
    pub annual_rate: f64,
    pub time_years: f64,
    #[serde(default = "default_monthly")]
    pub compounding_frequency: CompoundingFrequency,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FutureValueYear {
    pub year: u32,
    pub principal: f64,
    pub interest_earned: f64,
    pub future_value: f64,
    pub growth_rate: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FutureValueResponse {
    pub principal: f64,
    pub future_value: f64,
    pub total_interest: f64,
    pub compounding_periods_per_year: u32,
    /// Annual yield after compounding, as a percentage.
    pub effective_annual_rate: f64,
    pub year_wise_data: Vec<FutureValueYear>,
}

impl FutureValueResponse {
    pub fn chart(&self) -> ChartSpec {
        ChartSpec::series(
            "Growth by year",
            self.year_wise_data
                .iter()
                .map(|row| (format!("Year {}", row.year), row.future_value)),
        )
    }
}

pub fn future_value(req: &FutureValueRequest) -> Result<FutureValueResponse, CalcError> {
    validate_lump_sum(req.principal, req.annual_rate, req.time_years)?;
    let r = fraction(req.annual_rate);
    let n = req.compounding_frequency.periods_per_year();
    let fv = compound(req.principal, r, req.compounding_frequency, req.time_years);

    // Whole years only; a fractional tail shows up in the headline figure.
    let year_wise_data = (1..=req.time_years.floor() as u32)
        .map(|year| {
            let value = compound(req.principal, r, req.compounding_frequency, year as f64);
            FutureValueYear {
                year,
                principal: req.principal,
                interest_earned: value - req.principal,
                future_value: value,
                growth_rate: (value - req.principal) / req.principal * 100.0,
            }
        })
        .collect();

    Ok(FutureValueResponse {
        principal: req.principal,
        future_value: fv,
        total_interest: fv - req.principal,
        compounding_periods_per_year: n,
        effective_annual_rate: ((1.0 + r / n as f64).powi(n as i32) - 1.0) * 100.0,
        year_wise_data,
    })
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FdRequest {
    pub principal_amount: f64,
    pub annual_interest_rate: f64,
    pub tenure_years: f64,
    #[serde(default = "default_quarterly")]
    pub compounding_frequency: CompoundingFrequency,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FdResponse {
    pub principal_amount: f64,
    pub maturity_amount: f64,
    pub interest_earned: f64,
    pub total_return_percentage: f64,
}

impl FdResponse {
    pub fn chart(&self) -> ChartSpec {
        ChartSpec::breakdown(
            "Deposit vs interest",
            &[
                ("Principal", self.principal_amount),
                ("Interest", self.interest_earned),
            ],
        )
    }
}

pub fn fixed_deposit(req: &FdRequest) -> Result<FdResponse, CalcError> {
    let res = compound_interest(&CompoundInterestRequest {
        principal_amount: req.principal_amount,
        annual_interest_rate: req.annual_interest_rate,
        tenure_years: req.tenure_years,
        compounding_frequency: req.compounding_frequency,
    })?;
    Ok(FdResponse {
        principal_amount: res.principal_amount,
        maturity_amount: res.final_amount,
        interest_earned: res.interest_earned,
        total_return_percentage: res.total_return_percentage,
    })
}

const DAILY_MAX_PRINCIPAL: f64 = 10_000_000.0;
const DAILY_MAX_RATE: f64 = 50.0;
const DAILY_MAX_YEARS: f64 = 50.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeUnit {
    Days,
    Months,
    #[default]
    Years,
}

impl TimeUnit {
    pub fn to_years(self, value: f64) -> f64 {
        match self {
            TimeUnit::Days => value / 365.0,
            TimeUnit::Months => value / 12.0,
            TimeUnit::Years => value,
        }
    }
}

fn default_daily() -> CompoundingFrequency {
    CompoundingFrequency::Daily
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyCompoundRequest {
    pub principal: f64,
    pub annual_rate: f64,
    pub time_period_value: f64,
    #[serde(default)]
    pub time_period_unit: TimeUnit,
    #[serde(default = "default_daily")]
    pub compounding_frequency: CompoundingFrequency,
}

/// The same deposit under another compounding frequency.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrequencyComparison {
    pub frequency: CompoundingFrequency,
    pub future_value: f64,
    pub interest_earned: f64,
    /// Interest relative to the chosen frequency.
    pub difference: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyCompoundResponse {
    pub principal: f64,
    pub time_years: f64,
    pub compounding_frequency: CompoundingFrequency,
    pub future_value: f64,
    pub interest_earned: f64,
    /// Annualized growth over the period, as a percentage.
    pub effective_rate: f64,
    /// Most interest first.
    pub comparison_data: Vec<FrequencyComparison>,
}

impl DailyCompoundResponse {
    pub fn chart(&self) -> ChartSpec {
        ChartSpec::series(
            "Interest by compounding frequency",
            self.comparison_data
                .iter()
                .map(|row| (row.frequency.to_string(), row.interest_earned)),
        )
    }
}

pub fn daily_compound_interest(req: &DailyCompoundRequest) -> Result<DailyCompoundResponse, CalcError> {
    ensure_positive("principal", req.principal)?;
    if req.principal > DAILY_MAX_PRINCIPAL {
        return Err(CalcError::validation("Principal amount cannot exceed ₹1,00,00,000"));
    }
    ensure_range("annual_rate", req.annual_rate, 0.0, DAILY_MAX_RATE)?;
    ensure_positive("time_period_value", req.time_period_value)?;
    let years = req.time_period_unit.to_years(req.time_period_value);
    if years > DAILY_MAX_YEARS {
        return Err(CalcError::validation(format!(
            "Time period cannot exceed {DAILY_MAX_YEARS} years"
        )));
    }

    let r = fraction(req.annual_rate);
    let future_value = compound(req.principal, r, req.compounding_frequency, years);
    let interest_earned = future_value - req.principal;

    let mut comparison_data: Vec<FrequencyComparison> = CompoundingFrequency::ALL
        .iter()
        .map(|&frequency| {
            let value = compound(req.principal, r, frequency, years);
            FrequencyComparison {
                frequency,
                future_value: value,
                interest_earned: value - req.principal,
                difference: value - future_value,
            }
        })
        .collect();
    comparison_data.sort_by(|a, b| b.interest_earned.total_cmp(&a.interest_earned));

    Ok(DailyCompoundResponse {
        principal: req.principal,
        time_years: years,
        compounding_frequency: req.compounding_frequency,
        future_value,
        interest_earned,
        effective_rate: ((future_value / req.principal).powf(1.0 / years) - 1.0) * 100.0,
        comparison_data,
    })
}
