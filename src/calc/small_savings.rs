//! Post-office small savings schemes: PPF, NSC and KVP.
//!
//! Statutory limits (PPF contribution band, 80C cap, NSC tenure) are constants
//! here; interest rates are inputs because they are revised quarterly.

use super::frequency::fraction;
use crate::core::chart::ChartSpec;
use crate::core::error::{CalcError, ensure_finite, ensure_range};
use serde::{Deserialize, Serialize};
use std::f64::consts::LN_2;

pub const PPF_MIN_CONTRIBUTION: f64 = 500.0;
pub const PPF_MAX_CONTRIBUTION: f64 = 150_000.0;
pub const SECTION_80C_LIMIT: f64 = 150_000.0;
pub const NSC_TENURE_YEARS: u32 = 5;
pub const MIN_CERTIFICATE_AMOUNT: f64 = 1_000.0;
pub const KVP_LOCK_IN_YEARS: f64 = 2.5;
/// Rate band for KVP. At the floor the certificate doubles in about 70 years,
/// which bounds the yearly table.
pub const KVP_MIN_RATE: f64 = 1.0;
pub const KVP_MAX_RATE: f64 = 20.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PpfContribution {
    /// One deposit at the start of each financial year.
    #[default]
    Yearly,
    /// Twelve equal deposits; interest on monthly balances, credited yearly.
    Monthly,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PpfRequest {
    pub annual_contribution: f64,
    pub duration_years: u32,
    pub interest_rate: f64,
    #[serde(default)]
    pub contribution_frequency: PpfContribution,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PpfYear {
    pub year: u32,
    pub annual_contribution: f64,
    pub opening_balance: f64,
    pub interest_earned: f64,
    pub closing_balance: f64,
    pub total_invested_till_date: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PpfResponse {
    pub total_investment: f64,
    pub total_interest: f64,
    pub maturity_value: f64,
    pub year_wise_data: Vec<PpfYear>,
}

impl PpfResponse {
    pub fn chart(&self) -> ChartSpec {
        ChartSpec::breakdown(
            "PPF breakup",
            &[
                ("Total Investment", self.total_investment),
                ("Interest Earned", self.total_interest),
            ],
        )
    }
}

pub fn ppf(req: &PpfRequest) -> Result<PpfResponse, CalcError> {
    ensure_range(
        "annual_contribution",
        req.annual_contribution,
        PPF_MIN_CONTRIBUTION,
        PPF_MAX_CONTRIBUTION,
    )?;
    if !(15..=30).contains(&req.duration_years) {
        return Err(CalcError::validation(
            "Investment duration must be between 15 and 30 years",
        ));
    }
    ensure_range("interest_rate", req.interest_rate, 0.0, 100.0)?;

    let r = fraction(req.interest_rate);
    let mut balance = 0.0;
    let mut invested = 0.0;
    let mut year_wise_data = Vec::with_capacity(req.duration_years as usize);

    for year in 1..=req.duration_years {
        let opening = balance;
        let interest = match req.contribution_frequency {
            PpfContribution::Yearly => (opening + req.annual_contribution) * r,
            PpfContribution::Monthly => {
                let instalment = req.annual_contribution / 12.0;
                (1..=12)
                    .map(|month| (opening + instalment * month as f64) * r / 12.0)
                    .sum()
            }
        };
        balance = opening + req.annual_contribution + interest;
        invested += req.annual_contribution;
        year_wise_data.push(PpfYear {
            year,
            annual_contribution: req.annual_contribution,
            opening_balance: opening,
            interest_earned: interest,
            closing_balance: balance,
            total_invested_till_date: invested,
        });
    }

    Ok(PpfResponse {
        total_investment: invested,
        total_interest: balance - invested,
        maturity_value: balance,
        year_wise_data,
    })
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CertificateRequest {
    pub investment_amount: f64,
    pub interest_rate: f64,
}

/// Year-end value of a certificate compounding annually.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CertificateYear {
    pub year: u32,
    pub opening_balance: f64,
    pub interest_earned: f64,
    pub closing_balance: f64,
    pub cumulative_interest: f64,
}

fn validate_certificate(req: &CertificateRequest) -> Result<(), CalcError> {
    ensure_finite("investment_amount", req.investment_amount)?;
    if req.investment_amount < MIN_CERTIFICATE_AMOUNT {
        return Err(CalcError::validation("Minimum investment amount is ₹1,000"));
    }
    ensure_range("interest_rate", req.interest_rate, 0.0, 100.0)?;
    Ok(())
}

fn yearly_growth(principal: f64, rate: f64, years: u32, cap: Option<f64>) -> Vec<CertificateYear> {
    let mut opening = principal;
    (1..=years)
        .map(|year| {
            let mut closing = principal * (1.0 + rate).powi(year as i32);
            if let Some(cap) = cap {
                closing = closing.min(cap);
            }
            let row = CertificateYear {
                year,
                opening_balance: opening,
                interest_earned: closing - opening,
                closing_balance: closing,
                cumulative_interest: closing - principal,
            };
            opening = closing;
            row
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NscResponse {
    pub investment_amount: f64,
    pub maturity_amount: f64,
    pub total_interest: f64,
    /// Deduction available under section 80C.
    pub tax_benefit: f64,
    pub yearly_data: Vec<CertificateYear>,
}

impl NscResponse {
    pub fn chart(&self) -> ChartSpec {
        ChartSpec::breakdown(
            "NSC breakup",
            &[
                ("Investment", self.investment_amount),
                ("Interest", self.total_interest),
            ],
        )
    }
}

pub fn nsc(req: &CertificateRequest) -> Result<NscResponse, CalcError> {
    validate_certificate(req)?;
    let r = fraction(req.interest_rate);
    let maturity_amount = req.investment_amount * (1.0 + r).powi(NSC_TENURE_YEARS as i32);
    Ok(NscResponse {
        investment_amount: req.investment_amount,
        maturity_amount,
        total_interest: maturity_amount - req.investment_amount,
        tax_benefit: req.investment_amount.min(SECTION_80C_LIMIT),
        yearly_data: yearly_growth(req.investment_amount, r, NSC_TENURE_YEARS, None),
    })
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KvpResponse {
    pub investment_amount: f64,
    /// Always twice the investment.
    pub maturity_amount: f64,
    pub total_interest: f64,
    pub doubling_period_years: f64,
    pub maturity_months: u32,
    pub lock_in_amount: f64,
    pub lock_in_interest: f64,
    pub yearly_data: Vec<CertificateYear>,
}

impl KvpResponse {
    pub fn chart(&self) -> ChartSpec {
        ChartSpec::series(
            "KVP value by year",
            self.yearly_data
                .iter()
                .map(|row| (format!("Year {}", row.year), row.closing_balance)),
        )
    }
}

pub fn kvp(req: &CertificateRequest) -> Result<KvpResponse, CalcError> {
    validate_certificate(req)?;
    ensure_range("interest_rate", req.interest_rate, KVP_MIN_RATE, KVP_MAX_RATE)?;
    let r = fraction(req.interest_rate);
    let doubling_period_years = LN_2 / (1.0 + r).ln();
    let maturity_amount = req.investment_amount * 2.0;
    let lock_in_amount = req.investment_amount * (1.0 + r).powf(KVP_LOCK_IN_YEARS);

    Ok(KvpResponse {
        investment_amount: req.investment_amount,
        maturity_amount,
        total_interest: maturity_amount - req.investment_amount,
        doubling_period_years,
        maturity_months: (doubling_period_years * 12.0).round() as u32,
        lock_in_amount,
        lock_in_interest: lock_in_amount - req.investment_amount,
        yearly_data: yearly_growth(
            req.investment_amount,
            r,
            doubling_period_years.ceil() as u32,
            Some(maturity_amount),
        ),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn yearly_ppf_credits_interest_on_opening_plus_deposit() {
        let res = ppf(&PpfRequest {
            annual_contribution: 150_000.0,
            duration_years: 15,
            interest_rate: 7.1,
            contribution_frequency: PpfContribution::Yearly,
        })
        .unwrap();
        assert_eq!(res.total_investment, 2_250_000.0);
        // Annuity due, 15 years at 7.1%.
        let expected = 150_000.0 * (1.071f64.powi(15) - 1.0) / 0.071 * 1.071;
        assert!((res.maturity_value - expected).abs() < 1e-6);
        assert_eq!(res.year_wise_data.len(), 15);
    }

    #[test]
    fn monthly_ppf_earns_less_than_yearly() {
        let base = PpfRequest {
            annual_contribution: 120_000.0,
            duration_years: 15,
            interest_rate: 7.1,
            contribution_frequency: PpfContribution::Yearly,
        };
        let yearly = ppf(&base).unwrap();
        let monthly = ppf(&PpfRequest {
            contribution_frequency: PpfContribution::Monthly,
            ..base
        })
        .unwrap();
        assert!(monthly.maturity_value < yearly.maturity_value);
        assert_eq!(monthly.total_investment, yearly.total_investment);
    }

    #[test]
    fn ppf_enforces_statutory_band() {
        let req = PpfRequest {
            annual_contribution: 150_001.0,
            duration_years: 15,
            interest_rate: 7.1,
            contribution_frequency: PpfContribution::Yearly,
        };
        assert!(matches!(ppf(&req), Err(CalcError::Validation(_))));
        let req = PpfRequest {
            annual_contribution: 1000.0,
            duration_years: 14,
            ..req
        };
        assert!(matches!(ppf(&req), Err(CalcError::Validation(_))));
    }

    #[test]
    fn nsc_caps_tax_benefit() {
        let res = nsc(&CertificateRequest {
            investment_amount: 200_000.0,
            interest_rate: 7.7,
        })
        .unwrap();
        assert_eq!(res.tax_benefit, SECTION_80C_LIMIT);
        assert!((res.maturity_amount - 200_000.0 * 1.077f64.powi(5)).abs() < 1e-6);
        assert_eq!(res.yearly_data.len(), 5);
        assert_eq!(res.yearly_data[4].closing_balance, res.maturity_amount);
    }

    #[test]
    fn kvp_doubles_and_reports_doubling_period() {
        let res = kvp(&CertificateRequest {
            investment_amount: 10_000.0,
            interest_rate: 7.5,
        })
        .unwrap();
        assert_eq!(res.maturity_amount, 20_000.0);
        assert!((res.doubling_period_years - 9.584).abs() < 1e-3);
        assert_eq!(res.maturity_months, 115);
        let last = res.yearly_data.last().unwrap();
        assert_eq!(last.closing_balance, 20_000.0);
        assert!(res.lock_in_amount > 10_000.0 && res.lock_in_amount < 20_000.0);
    }

    #[test]
    fn kvp_rate_band_bounds_the_table() {
        for rate in [0.0001, 1e-9, 0.5, 25.0] {
            let err = kvp(&CertificateRequest {
                investment_amount: 1_000.0,
                interest_rate: rate,
            })
            .unwrap_err();
            assert!(matches!(err, CalcError::Validation(_)), "rate {rate}");
        }

        let slowest = kvp(&CertificateRequest {
            investment_amount: 1_000.0,
            interest_rate: KVP_MIN_RATE,
        })
        .unwrap();
        assert_eq!(slowest.yearly_data.len(), 70);
        assert_eq!(slowest.maturity_months, 836);
    }

    #[test]
    fn certificates_require_minimum_amount() {
        let err = nsc(&CertificateRequest {
            investment_amount: 999.0,
            interest_rate: 7.7,
        })
        .unwrap_err();
        assert_eq!(err.to_string(), "Minimum investment amount is ₹1,000");

        let err = kvp(&CertificateRequest {
            investment_amount: f64::NAN,
            interest_rate: 7.5,
        })
        .unwrap_err();
        assert_eq!(err.to_string(), "investment_amount must be a finite number");
    }
}
