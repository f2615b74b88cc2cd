//! Retirement and income schemes: EPF, Sukanya Samriddhi, Senior Citizens'
//! Savings Scheme and the Post Office Monthly Income Scheme.
//!
//! EPF and SSY accrue interest on monthly balances and credit it once a
//! year. SCSS and POMIS pay interest out as it falls due, so the principal
//! comes back untouched at maturity.

use super::frequency::{ContributionFrequency, fraction};
use super::small_savings::SECTION_80C_LIMIT;
use crate::core::chart::ChartSpec;
use crate::core::error::{CalcError, ensure_positive, ensure_range};
use serde::{Deserialize, Serialize};

pub const SSY_MIN_ANNUAL_DEPOSIT: f64 = 250.0;
pub const SSY_MAX_ANNUAL_DEPOSIT: f64 = 150_000.0;
/// Deposits stop after 15 years; the account matures at 21.
pub const SSY_DEPOSIT_YEARS: u32 = 15;
pub const SSY_MATURITY_YEARS: u32 = 21;
pub const SCSS_MIN_DEPOSIT: f64 = 1_000.0;
pub const SCSS_MAX_DEPOSIT: f64 = 3_000_000.0;
/// Five years, or eight with the one permitted three-year extension.
pub const SCSS_TENURES: [u32; 2] = [5, 8];
pub const POMIS_MIN_DEPOSIT: f64 = 1_000.0;
/// Joint account limit.
pub const POMIS_MAX_DEPOSIT: f64 = 1_500_000.0;

fn ensure_years(field: &str, years: u32, max: u32) -> Result<(), CalcError> {
    if !(1..=max).contains(&years) {
        return Err(CalcError::validation(format!(
            "{field} must be between 1 and {max}"
        )));
    }
    Ok(())
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EpfRequest {
    /// Monthly basic pay plus DA.
    pub basic_salary: f64,
    /// Percent of basic pay.
    pub employee_contribution: f64,
    /// Percent of basic pay that reaches the EPF account.
    pub employer_contribution: f64,
    pub interest_rate: f64,
    pub years_of_service: u32,
    #[serde(default)]
    pub salary_increase: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EpfYear {
    pub year: u32,
    pub basic_salary: f64,
    pub employee_contribution: f64,
    pub employer_contribution: f64,
    pub interest_earned: f64,
    pub total_balance: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EpfResponse {
    pub total_employee_contribution: f64,
    pub total_employer_contribution: f64,
    pub total_interest: f64,
    pub total_corpus: f64,
    pub yearly_breakdown: Vec<EpfYear>,
}

impl EpfResponse {
    pub fn chart(&self) -> ChartSpec {
        ChartSpec::breakdown(
            "EPF corpus",
            &[
                ("Employee Contribution", self.total_employee_contribution),
                ("Employer Contribution", self.total_employer_contribution),
                ("Interest Earned", self.total_interest),
            ],
        )
    }
}

pub fn epf(req: &EpfRequest) -> Result<EpfResponse, CalcError> {
    ensure_positive("basic_salary", req.basic_salary)?;
    ensure_range("employee_contribution", req.employee_contribution, 0.0, 100.0)?;
    ensure_range("employer_contribution", req.employer_contribution, 0.0, 100.0)?;
    ensure_range("interest_rate", req.interest_rate, 0.0, 20.0)?;
    ensure_range("salary_increase", req.salary_increase, 0.0, 50.0)?;
    ensure_years("years_of_service", req.years_of_service, 50)?;

    let monthly_rate = fraction(req.interest_rate) / 12.0;
    let mut salary = req.basic_salary;
    let mut balance = 0.0;
    let mut totals = (0.0, 0.0, 0.0);
    let mut yearly_breakdown = Vec::with_capacity(req.years_of_service as usize);

    for year in 1..=req.years_of_service {
        if year > 1 {
            salary *= 1.0 + fraction(req.salary_increase);
        }
        let employee = salary * fraction(req.employee_contribution);
        let employer = salary * fraction(req.employer_contribution);

        // Interest runs on each month's closing balance and lands at year end.
        let interest: f64 = (1..=12)
            .map(|month| (balance + (employee + employer) * month as f64) * monthly_rate)
            .sum();
        balance += (employee + employer) * 12.0 + interest;

        totals.0 += employee * 12.0;
        totals.1 += employer * 12.0;
        totals.2 += interest;
        yearly_breakdown.push(EpfYear {
            year,
            basic_salary: salary,
            employee_contribution: employee * 12.0,
            employer_contribution: employer * 12.0,
            interest_earned: interest,
            total_balance: balance,
        });
    }

    Ok(EpfResponse {
        total_employee_contribution: totals.0,
        total_employer_contribution: totals.1,
        total_interest: totals.2,
        total_corpus: balance,
        yearly_breakdown,
    })
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SsyRequest {
    /// Amount of each deposit.
    pub investment_amount: f64,
    #[serde(default)]
    pub investment_frequency: ContributionFrequency,
    pub annual_interest_rate: f64,
    /// Years in which deposits are made, at most fifteen.
    pub investment_period: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SsyYear {
    pub year: u32,
    pub annual_investment: f64,
    pub total_invested: f64,
    pub interest_earned: f64,
    pub balance: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SsyResponse {
    pub annual_investment: f64,
    pub total_investment: f64,
    pub total_interest: f64,
    pub maturity_amount: f64,
    pub maturity_year: u32,
    pub yearly_breakdown: Vec<SsyYear>,
}

impl SsyResponse {
    pub fn chart(&self) -> ChartSpec {
        ChartSpec::series(
            "Balance by year",
            self.yearly_breakdown
                .iter()
                .map(|row| (format!("Year {}", row.year), row.balance)),
        )
    }
}

pub fn ssy(req: &SsyRequest) -> Result<SsyResponse, CalcError> {
    ensure_positive("investment_amount", req.investment_amount)?;
    ensure_range("annual_interest_rate", req.annual_interest_rate, 0.0, 20.0)?;
    ensure_years("investment_period", req.investment_period, SSY_DEPOSIT_YEARS)?;
    // Deposits have to land on month boundaries.
    let months_between = match req.investment_frequency {
        ContributionFrequency::Daily | ContributionFrequency::OneTime => {
            return Err(CalcError::validation(
                "SSY deposits are monthly, quarterly, half-yearly or yearly",
            ));
        }
        recurring => 12 / recurring.periods_per_year(),
    };
    let annual_investment =
        req.investment_amount * req.investment_frequency.periods_per_year() as f64;
    if !(SSY_MIN_ANNUAL_DEPOSIT..=SSY_MAX_ANNUAL_DEPOSIT).contains(&annual_investment) {
        return Err(CalcError::validation(
            "Yearly deposits must be between ₹250 and ₹1,50,000",
        ));
    }

    let monthly_rate = fraction(req.annual_interest_rate) / 12.0;
    let mut balance = 0.0;
    let mut invested = 0.0;
    let mut yearly_breakdown = Vec::with_capacity(SSY_MATURITY_YEARS as usize);
    for year in 1..=SSY_MATURITY_YEARS {
        let depositing = year <= req.investment_period;
        let mut deposited = 0.0;
        let mut interest = 0.0;
        for month in 0..12 {
            if depositing && month % months_between == 0 {
                deposited += req.investment_amount;
            }
            interest += (balance + deposited) * monthly_rate;
        }
        balance += deposited + interest;
        invested += deposited;
        yearly_breakdown.push(SsyYear {
            year,
            annual_investment: deposited,
            total_invested: invested,
            interest_earned: interest,
            balance,
        });
    }

    Ok(SsyResponse {
        annual_investment,
        total_investment: invested,
        total_interest: balance - invested,
        maturity_amount: balance,
        maturity_year: SSY_MATURITY_YEARS,
        yearly_breakdown,
    })
}

fn default_scss_tenure() -> u32 {
    SCSS_TENURES[0]
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScssRequest {
    pub investment_amount: f64,
    pub annual_interest_rate: f64,
    #[serde(default = "default_scss_tenure")]
    pub tenure_years: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScssResponse {
    pub investment_amount: f64,
    pub quarterly_interest: f64,
    pub annual_interest: f64,
    pub total_interest: f64,
    pub maturity_amount: f64,
    pub tax_benefit: f64,
}

impl ScssResponse {
    pub fn chart(&self) -> ChartSpec {
        ChartSpec::breakdown(
            "SCSS payout",
            &[
                ("Investment", self.investment_amount),
                ("Interest Paid Out", self.total_interest),
            ],
        )
    }
}

pub fn scss(req: &ScssRequest) -> Result<ScssResponse, CalcError> {
    ensure_range(
        "investment_amount",
        req.investment_amount,
        SCSS_MIN_DEPOSIT,
        SCSS_MAX_DEPOSIT,
    )?;
    ensure_range("annual_interest_rate", req.annual_interest_rate, 0.0, 20.0)?;
    if !SCSS_TENURES.contains(&req.tenure_years) {
        return Err(CalcError::validation(
            "SCSS runs for 5 years, or 8 with an extension",
        ));
    }

    let quarterly_interest = req.investment_amount * fraction(req.annual_interest_rate) / 4.0;
    let total_interest = quarterly_interest * 4.0 * req.tenure_years as f64;
    Ok(ScssResponse {
        investment_amount: req.investment_amount,
        quarterly_interest,
        annual_interest: quarterly_interest * 4.0,
        total_interest,
        maturity_amount: req.investment_amount + total_interest,
        tax_benefit: req.investment_amount.min(SECTION_80C_LIMIT),
    })
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PomisRequest {
    /// The single deposit; the form has always called it the yearly investment.
    pub yearly_investment: f64,
    pub time_period: u32,
    pub interest_rate: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PomisResponse {
    pub invested_amount: f64,
    pub monthly_interest: f64,
    pub total_interest: f64,
    pub maturity_value: f64,
}

impl PomisResponse {
    pub fn chart(&self) -> ChartSpec {
        ChartSpec::breakdown(
            "Monthly income scheme",
            &[
                ("Invested Amount", self.invested_amount),
                ("Total Interest", self.total_interest),
            ],
        )
    }
}

pub fn pomis(req: &PomisRequest) -> Result<PomisResponse, CalcError> {
    ensure_range(
        "yearly_investment",
        req.yearly_investment,
        POMIS_MIN_DEPOSIT,
        POMIS_MAX_DEPOSIT,
    )?;
    ensure_range("interest_rate", req.interest_rate, 0.0, 20.0)?;
    ensure_years("time_period", req.time_period, 30)?;

    let monthly_interest = req.yearly_investment * fraction(req.interest_rate) / 12.0;
    let total_interest = monthly_interest * 12.0 * req.time_period as f64;
    Ok(PomisResponse {
        invested_amount: req.yearly_investment,
        monthly_interest,
        total_interest,
        maturity_value: req.yearly_investment + total_interest,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn epf_request() -> EpfRequest {
        EpfRequest {
            basic_salary: 50_000.0,
            employee_contribution: 12.0,
            employer_contribution: 3.67,
            interest_rate: 8.25,
            years_of_service: 25,
            salary_increase: 5.0,
        }
    }

    #[test]
    fn epf_corpus_is_contributions_plus_interest() {
        let res = epf(&epf_request()).unwrap();
        assert_eq!(res.yearly_breakdown.len(), 25);
        assert_eq!(res.yearly_breakdown[0].employee_contribution, 72_000.0);
        assert!((res.yearly_breakdown[1].basic_salary - 52_500.0).abs() < 1e-9);
        let sum = res.total_employee_contribution + res.total_employer_contribution + res.total_interest;
        assert!((sum - res.total_corpus).abs() < 1e-6);
    }

    #[test]
    fn epf_first_year_interest_on_monthly_balances() {
        let mut req = epf_request();
        req.years_of_service = 1;
        req.employer_contribution = 0.0;
        req.interest_rate = 12.0;
        let res = epf(&req).unwrap();
        // 6000 a month; balances 6000, 12000, ... 72000 at 1% a month.
        assert!((res.total_interest - 4680.0).abs() < 1e-6);
    }

    #[test]
    fn ssy_deposits_stop_but_interest_runs_to_maturity() {
        let res = ssy(&SsyRequest {
            investment_amount: 150_000.0,
            investment_frequency: ContributionFrequency::Yearly,
            annual_interest_rate: 8.2,
            investment_period: 15,
        })
        .unwrap();
        assert_eq!(res.yearly_breakdown.len(), 21);
        assert_eq!(res.total_investment, 2_250_000.0);
        assert_eq!(res.yearly_breakdown[15].annual_investment, 0.0);
        assert!(res.yearly_breakdown[20].interest_earned > res.yearly_breakdown[15].interest_earned);
        assert!((res.maturity_amount - 7_182_119.17).abs() < 0.01);
    }

    #[test]
    fn ssy_enforces_yearly_deposit_band() {
        let req = SsyRequest {
            investment_amount: 15_000.0,
            investment_frequency: ContributionFrequency::Monthly,
            annual_interest_rate: 8.2,
            investment_period: 15,
        };
        assert!(matches!(ssy(&req), Err(CalcError::Validation(_))));

        let mut req = req;
        req.investment_amount = 12_500.0;
        assert_eq!(ssy(&req).unwrap().annual_investment, 150_000.0);
        req.investment_frequency = ContributionFrequency::Daily;
        assert!(matches!(ssy(&req), Err(CalcError::Validation(_))));
        req.investment_frequency = ContributionFrequency::Monthly;
        req.investment_period = 16;
        assert!(matches!(ssy(&req), Err(CalcError::Validation(_))));
    }

    #[test]
    fn scss_pays_quarterly_and_returns_principal() {
        let req: ScssRequest =
            serde_json::from_str(r#"{"investment_amount":1000000,"annual_interest_rate":8.2}"#)
                .unwrap();
        assert_eq!(req.tenure_years, 5);
        let res = scss(&req).unwrap();
        assert!((res.quarterly_interest - 20_500.0).abs() < 1e-6);
        assert!((res.total_interest - 410_000.0).abs() < 1e-6);
        assert_eq!(res.tax_benefit, SECTION_80C_LIMIT);

        let mut req = req;
        req.tenure_years = 6;
        assert!(matches!(scss(&req), Err(CalcError::Validation(_))));
    }

    #[test]
    fn pomis_pays_monthly() {
        let res = pomis(&PomisRequest {
            yearly_investment: 900_000.0,
            time_period: 5,
            interest_rate: 7.4,
        })
        .unwrap();
        assert!((res.monthly_interest - 5550.0).abs() < 1e-6);
        assert!((res.total_interest - 333_000.0).abs() < 1e-6);
        assert!((res.maturity_value - 1_233_000.0).abs() < 1e-6);

        let err = pomis(&PomisRequest {
            yearly_investment: 2_000_000.0,
            time_period: 5,
            interest_rate: 7.4,
        })
        .unwrap_err();
        assert!(err.to_string().starts_with("yearly_investment must be between"));
    }
}
