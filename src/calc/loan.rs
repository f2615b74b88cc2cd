//! EMI loans solved three ways: the amount an EMI supports, the tenure that
//! repays a loan, and the rate implied by a loan, EMI and tenure.
//!
//! Interest accrues monthly at `rate / 12`. An EMI in arrears is paid at the
//! end of each month; an EMI in advance is paid at disbursement and then at
//! the start of each month. Fees reduce the money actually received, which
//! is what the APR is measured against.

use super::growth::to_decimal;
use crate::core::chart::ChartSpec;
use crate::core::error::{CalcError, ensure_non_negative, ensure_positive, ensure_range};
use rust_decimal::prelude::*;
use rust_finprim::tvm::pv;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Thirty years of monthly instalments.
const MAX_MONTHS: u32 = 360;
const MAX_EMI: f64 = 10_000_000.0;
const MAX_LOAN: f64 = 1_000_000_000.0;
const MAX_RATE: f64 = 30.0;
/// Upper end of the bracket when solving for an implied rate.
const MAX_IMPLIED_RATE: f64 = 100.0;
/// A balance below one rupee after an instalment is settled with it.
const SETTLE_TOLERANCE: f64 = 1.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmiScheme {
    #[default]
    Arrears,
    Advance,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoanYear {
    pub year: u32,
    pub principal: f64,
    pub interest: f64,
    pub total_payment: f64,
    pub balance: f64,
    pub loan_paid_percentage: f64,
}

fn monthly_rate(annual_percent: f64) -> f64 {
    annual_percent / 1200.0
}

/// Present value per unit of EMI over `months` instalments.
fn annuity_factor(i: f64, months: u32, scheme: EmiScheme) -> f64 {
    if i == 0.0 {
        return months as f64;
    }
    let factor = (1.0 - (1.0 + i).powi(-(months as i32))) / i;
    match scheme {
        EmiScheme::Arrears => factor,
        EmiScheme::Advance => factor * (1.0 + i),
    }
}

struct Amortization {
    months: u32,
    total_interest: f64,
    schedule: Vec<LoanYear>,
}

/// Pays `emi` every month until the balance is cleared, rolling months up
/// into yearly rows. The last instalment is whatever is left.
fn amortize(
    principal: f64,
    annual_rate: f64,
    emi: f64,
    scheme: EmiScheme,
) -> Result<Amortization, CalcError> {
    let i = monthly_rate(annual_rate);
    if scheme == EmiScheme::Arrears && emi <= principal * i {
        return Err(CalcError::validation(
            "EMI must be more than the first month's interest",
        ));
    }

    let mut balance = principal;
    let mut months = 0;
    let mut total_interest = 0.0;
    let mut schedule: Vec<LoanYear> = Vec::new();
    while balance > 0.0 {
        if months == MAX_MONTHS {
            return Err(CalcError::validation(
                "EMI is too small to repay the loan within 30 years",
            ));
        }
        months += 1;
        let interest = match scheme {
            EmiScheme::Advance if months == 1 => 0.0,
            _ => balance * i,
        };
        let mut payment = emi.min(balance + interest);
        balance += interest - payment;
        if balance < SETTLE_TOLERANCE {
            payment += balance;
            balance = 0.0;
        }
        total_interest += interest;

        let year = (months - 1) / 12 + 1;
        if schedule.last().is_none_or(|row| row.year != year) {
            schedule.push(LoanYear {
                year,
                principal: 0.0,
                interest: 0.0,
                total_payment: 0.0,
                balance: 0.0,
                loan_paid_percentage: 0.0,
            });
        }
        if let Some(row) = schedule.last_mut() {
            row.principal += payment - interest;
            row.interest += interest;
            row.total_payment += payment;
            row.balance = balance;
            row.loan_paid_percentage = (principal - balance) / principal * 100.0;
        }
    }

    Ok(Amortization {
        months,
        total_interest,
        schedule,
    })
}

/// Annual rate at which `months` instalments of `emi` are worth `amount`
/// today. Bisection, since the present value falls as the rate rises.
fn implied_rate(amount: f64, emi: f64, months: u32, scheme: EmiScheme) -> Result<f64, CalcError> {
    let present = |rate: f64| emi * annuity_factor(monthly_rate(rate), months, scheme);
    if present(0.0) < amount {
        return Err(CalcError::validation(
            "EMI is too low to repay the loan over this tenure",
        ));
    }
    if present(MAX_IMPLIED_RATE) > amount {
        return Err(CalcError::validation(format!(
            "EMI implies an interest rate above {MAX_IMPLIED_RATE}%"
        )));
    }

    let (mut low, mut high) = (0.0, MAX_IMPLIED_RATE);
    while high - low > 1e-10 {
        let mid = (low + high) / 2.0;
        if present(mid) > amount {
            low = mid;
        } else {
            high = mid;
        }
    }
    Ok((low + high) / 2.0)
}

fn ensure_amount(field: &str, value: f64, max: f64) -> Result<(), CalcError> {
    ensure_positive(field, value)?;
    if value > max {
        return Err(CalcError::validation(format!("{field} cannot exceed {max}")));
    }
    Ok(())
}

fn validate_fees(fees: f64, amount: f64) -> Result<(), CalcError> {
    ensure_non_negative("feesCharges", fees)?;
    if fees >= amount {
        return Err(CalcError::validation(
            "feesCharges must be less than the loan amount",
        ));
    }
    Ok(())
}

/// APR of a loan whose instalments were priced at `rate`.
fn loan_apr(
    amount: f64,
    fees: f64,
    emi: f64,
    months: u32,
    rate: f64,
    scheme: EmiScheme,
) -> Result<f64, CalcError> {
    if fees == 0.0 {
        return Ok(rate);
    }
    implied_rate(amount - fees, emi, months, scheme)
}

fn tenure_months(years: u32, months: u32) -> Result<u32, CalcError> {
    let total = years.saturating_mul(12).saturating_add(months);
    if !(1..=MAX_MONTHS).contains(&total) {
        return Err(CalcError::validation(format!(
            "Loan tenure must be between 1 and {MAX_MONTHS} months"
        )));
    }
    Ok(total)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoanAmountRequest {
    pub emi: f64,
    pub interest_rate: f64,
    pub tenure_years: u32,
    #[serde(default)]
    pub tenure_months: u32,
    #[serde(default)]
    pub fees_charges: f64,
    #[serde(default)]
    pub emi_scheme: EmiScheme,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoanAmountResponse {
    pub principal_amount: f64,
    pub emi: f64,
    pub interest_rate: f64,
    pub tenure_months: u32,
    pub loan_apr: f64,
    pub total_interest: f64,
    pub fees_charges: f64,
    pub total_payment: f64,
    pub payment_schedule: Vec<LoanYear>,
}

impl LoanAmountResponse {
    pub fn chart(&self) -> ChartSpec {
        ChartSpec::breakdown(
            "Total payment breakup",
            &[
                ("Principal", self.principal_amount),
                ("Interest", self.total_interest),
                ("Fees & Charges", self.fees_charges),
            ],
        )
    }
}

/// Principal that `emi` repays over the tenure, via the annuity present value.
pub fn loan_amount(req: &LoanAmountRequest) -> Result<LoanAmountResponse, CalcError> {
    ensure_amount("emi", req.emi, MAX_EMI)?;
    ensure_range("interestRate", req.interest_rate, 0.0, MAX_RATE)?;
    let months = tenure_months(req.tenure_years, req.tenure_months)?;

    let rate = to_decimal("interestRate", monthly_rate(req.interest_rate))?;
    let payment = to_decimal("emi", req.emi)?;
    let due = req.emi_scheme == EmiScheme::Advance;
    let principal = pv(rate, Decimal::from(months), -payment, None, Some(due))
        .abs()
        .to_f64()
        .ok_or_else(|| CalcError::validation("Loan amount is out of range"))?;
    debug!("loan amount: {months} months of {} at {rate} = {principal}", req.emi);

    validate_fees(req.fees_charges, principal)?;
    let amortization = amortize(principal, req.interest_rate, req.emi, req.emi_scheme)?;
    let loan_apr = loan_apr(
        principal,
        req.fees_charges,
        req.emi,
        months,
        req.interest_rate,
        req.emi_scheme,
    )?;

    Ok(LoanAmountResponse {
        principal_amount: principal,
        emi: req.emi,
        interest_rate: req.interest_rate,
        tenure_months: months,
        loan_apr,
        total_interest: amortization.total_interest,
        fees_charges: req.fees_charges,
        total_payment: principal + amortization.total_interest + req.fees_charges,
        payment_schedule: amortization.schedule,
    })
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoanTenureRequest {
    pub loan_amount: f64,
    pub emi: f64,
    pub interest_rate: f64,
    #[serde(default)]
    pub fees_charges: f64,
    #[serde(default)]
    pub emi_scheme: EmiScheme,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoanTenureResponse {
    pub loan_amount: f64,
    pub emi: f64,
    pub tenure_months: u32,
    pub tenure_years: u32,
    pub tenure_remaining_months: u32,
    pub loan_apr: f64,
    pub total_interest: f64,
    pub fees_charges: f64,
    pub total_payment: f64,
    pub payment_schedule: Vec<LoanYear>,
}

impl LoanTenureResponse {
    pub fn chart(&self) -> ChartSpec {
        ChartSpec::series(
            "Outstanding balance",
            self.payment_schedule
                .iter()
                .map(|row| (format!("Year {}", row.year), row.balance)),
        )
    }
}

/// Months of `emi` needed to clear the loan; the last one may be smaller.
pub fn loan_tenure(req: &LoanTenureRequest) -> Result<LoanTenureResponse, CalcError> {
    ensure_amount("loanAmount", req.loan_amount, MAX_LOAN)?;
    ensure_amount("emi", req.emi, MAX_EMI)?;
    ensure_range("interestRate", req.interest_rate, 0.0, MAX_RATE)?;
    validate_fees(req.fees_charges, req.loan_amount)?;

    let amortization = amortize(req.loan_amount, req.interest_rate, req.emi, req.emi_scheme)?;
    let months = amortization.months;
    let loan_apr = loan_apr(
        req.loan_amount,
        req.fees_charges,
        req.emi,
        months,
        req.interest_rate,
        req.emi_scheme,
    )?;

    Ok(LoanTenureResponse {
        loan_amount: req.loan_amount,
        emi: req.emi,
        tenure_months: months,
        tenure_years: months / 12,
        tenure_remaining_months: months % 12,
        loan_apr,
        total_interest: amortization.total_interest,
        fees_charges: req.fees_charges,
        total_payment: req.loan_amount + amortization.total_interest + req.fees_charges,
        payment_schedule: amortization.schedule,
    })
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InterestRateRequest {
    pub loan_amount: f64,
    pub emi: f64,
    pub tenure_years: u32,
    #[serde(default)]
    pub tenure_months: u32,
    #[serde(default)]
    pub fees_charges: f64,
    #[serde(default)]
    pub emi_scheme: EmiScheme,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InterestRateResponse {
    pub interest_rate: f64,
    pub apr: f64,
    pub loan_amount: f64,
    pub emi: f64,
    pub tenure_months: u32,
    pub total_interest: f64,
    pub fees_charges: f64,
    pub total_payment: f64,
    pub payment_schedule: Vec<LoanYear>,
}

impl InterestRateResponse {
    pub fn chart(&self) -> ChartSpec {
        ChartSpec::breakdown(
            "Total payment breakup",
            &[
                ("Principal", self.loan_amount),
                ("Interest", self.total_interest),
                ("Fees & Charges", self.fees_charges),
            ],
        )
    }
}

/// Annual rate implied by a loan amount, its EMI and its tenure.
pub fn interest_rate(req: &InterestRateRequest) -> Result<InterestRateResponse, CalcError> {
    ensure_amount("loanAmount", req.loan_amount, MAX_LOAN)?;
    ensure_amount("emi", req.emi, MAX_EMI)?;
    let months = tenure_months(req.tenure_years, req.tenure_months)?;
    validate_fees(req.fees_charges, req.loan_amount)?;

    let rate = implied_rate(req.loan_amount, req.emi, months, req.emi_scheme)?;
    let apr = loan_apr(
        req.loan_amount,
        req.fees_charges,
        req.emi,
        months,
        rate,
        req.emi_scheme,
    )?;
    let amortization = amortize(req.loan_amount, rate, req.emi, req.emi_scheme)?;

    Ok(InterestRateResponse {
        interest_rate: rate,
        apr,
        loan_amount: req.loan_amount,
        emi: req.emi,
        tenure_months: months,
        total_interest: amortization.total_interest,
        fees_charges: req.fees_charges,
        total_payment: req.loan_amount + amortization.total_interest + req.fees_charges,
        payment_schedule: amortization.schedule,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    // 10 lakh at 10.75% over five years.
    const EMI: f64 = 21_617.95;

    #[test]
    fn loan_amount_inverts_the_emi() {
        let res = loan_amount(&LoanAmountRequest {
            emi: EMI,
            interest_rate: 10.75,
            tenure_years: 5,
            tenure_months: 0,
            fees_charges: 10_000.0,
            emi_scheme: EmiScheme::Arrears,
        })
        .unwrap();
        assert!((res.principal_amount - 1_000_000.0).abs() < 1.0);
        assert_eq!(res.tenure_months, 60);
        assert!((res.total_interest - 297_077.0).abs() < 1.0);
        assert!((res.loan_apr - 11.19).abs() < 0.01);
        assert_eq!(res.payment_schedule.len(), 5);
        assert_eq!(res.payment_schedule[4].balance, 0.0);
        assert!((res.payment_schedule[4].loan_paid_percentage - 100.0).abs() < 1e-9);
    }

    #[test]
    fn closed_form_agrees_with_decimal_present_value() {
        let i = monthly_rate(10.75);
        let principal = EMI * annuity_factor(i, 60, EmiScheme::Advance);
        let res = loan_amount(&LoanAmountRequest {
            emi: EMI,
            interest_rate: 10.75,
            tenure_years: 5,
            tenure_months: 0,
            fees_charges: 0.0,
            emi_scheme: EmiScheme::Advance,
        })
        .unwrap();
        assert!((res.principal_amount - principal).abs() < 1e-4);
        assert_eq!(res.loan_apr, 10.75);
        // Advance EMIs support a larger loan than the same EMIs in arrears.
        assert!(res.principal_amount > 1_000_000.0);
    }

    #[test]
    fn tenure_settles_rounding_dust_in_the_last_month() {
        let res = loan_tenure(&LoanTenureRequest {
            loan_amount: 1_000_000.0,
            emi: EMI,
            interest_rate: 10.75,
            fees_charges: 0.0,
            emi_scheme: EmiScheme::Arrears,
        })
        .unwrap();
        assert_eq!(res.tenure_months, 60);
        assert_eq!((res.tenure_years, res.tenure_remaining_months), (5, 0));
    }

    #[test]
    fn partial_last_instalment() {
        let res = loan_tenure(&LoanTenureRequest {
            loan_amount: 100_000.0,
            emi: 30_000.0,
            interest_rate: 0.0,
            fees_charges: 0.0,
            emi_scheme: EmiScheme::Arrears,
        })
        .unwrap();
        assert_eq!(res.tenure_months, 4);
        assert_eq!(res.total_interest, 0.0);
        assert_eq!(res.payment_schedule[0].total_payment, 100_000.0);
        assert_eq!(res.total_payment, 100_000.0);
    }

    #[test]
    fn emi_below_interest_never_repays() {
        let err = loan_tenure(&LoanTenureRequest {
            loan_amount: 1_000_000.0,
            emi: 5000.0,
            interest_rate: 12.0,
            fees_charges: 0.0,
            emi_scheme: EmiScheme::Arrears,
        })
        .unwrap_err();
        assert!(err.to_string().contains("first month's interest"));

        // Covers the interest, but only just.
        let err = loan_tenure(&LoanTenureRequest {
            loan_amount: 1_000_000.0,
            emi: 10_001.0,
            interest_rate: 12.0,
            fees_charges: 0.0,
            emi_scheme: EmiScheme::Arrears,
        })
        .unwrap_err();
        assert!(err.to_string().contains("within 30 years"));
    }

    #[test]
    fn interest_rate_is_recovered() {
        let req: InterestRateRequest = serde_json::from_str(
            r#"{"loanAmount":1000000,"emi":21617.95,"tenureYears":5,"tenureMonths":0,
                "feesCharges":10000,"emiScheme":"arrears"}"#,
        )
        .unwrap();
        let res = interest_rate(&req).unwrap();
        assert!((res.interest_rate - 10.75).abs() < 1e-4);
        assert!((res.apr - 11.19).abs() < 0.01);
        assert!((res.total_payment - 1_307_077.0).abs() < 1.0);
    }

    #[test]
    fn interest_rate_rejects_emi_that_cannot_repay() {
        let err = interest_rate(&InterestRateRequest {
            loan_amount: 1_000_000.0,
            emi: 10_000.0,
            tenure_years: 5,
            tenure_months: 0,
            fees_charges: 0.0,
            emi_scheme: EmiScheme::Arrears,
        })
        .unwrap_err();
        assert!(matches!(err, CalcError::Validation(_)));
    }

    #[test]
    fn fees_cannot_swallow_the_loan() {
        let err = loan_tenure(&LoanTenureRequest {
            loan_amount: 10_000.0,
            emi: 1000.0,
            interest_rate: 10.0,
            fees_charges: 10_000.0,
            emi_scheme: EmiScheme::Arrears,
        })
        .unwrap_err();
        assert!(err.to_string().contains("feesCharges"));
    }
}
