//! SIP whose instalment grows once a year, by a percentage or a fixed amount.

use super::frequency::ContributionFrequency;
use super::sip::{SipYear, simulate, validate_common};
use crate::core::chart::ChartSpec;
use crate::core::error::{CalcError, ensure_non_negative, ensure_positive, ensure_range};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepUpType {
    #[default]
    Percentage,
    FixedAmount,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StepUpSipRequest {
    pub initial_sip_amount: f64,
    #[serde(default)]
    pub step_up_type: StepUpType,
    #[serde(default)]
    pub step_up_percentage: f64,
    #[serde(default)]
    pub fixed_step_up_amount: f64,
    #[serde(default)]
    pub frequency: ContributionFrequency,
    pub return_rate: f64,
    pub tenure_years: u32,
    #[serde(default)]
    pub inflation_rate: f64,
}

impl StepUpSipRequest {
    /// Instalment in force during `year` (1-based).
    pub fn instalment_for_year(&self, year: u32) -> f64 {
        let steps = year.saturating_sub(1);
        match self.step_up_type {
            StepUpType::Percentage => {
                self.initial_sip_amount
                    * (1.0 + self.step_up_percentage / 100.0).powi(steps as i32)
            }
            StepUpType::FixedAmount => {
                self.initial_sip_amount + self.fixed_step_up_amount * steps as f64
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StepUpSipResponse {
    pub total_invested: f64,
    pub total_returns: f64,
    pub future_value: f64,
    pub inflation_adjusted_value: f64,
    /// Size of the first annual increase.
    pub annual_step_up_value: f64,
    pub final_sip_amount: f64,
    pub yearly_breakdown: Vec<SipYear>,
}

impl StepUpSipResponse {
    pub fn chart(&self) -> ChartSpec {
        ChartSpec::series(
            "Portfolio value by year",
            self.yearly_breakdown
                .iter()
                .map(|row| (format!("Year {}", row.year), row.cumulative_value)),
        )
    }
}

pub fn calculate(req: &StepUpSipRequest) -> Result<StepUpSipResponse, CalcError> {
    ensure_positive("initialSipAmount", req.initial_sip_amount)?;
    match req.step_up_type {
        StepUpType::Percentage => ensure_range("stepUpPercentage", req.step_up_percentage, 0.0, 100.0)?,
        StepUpType::FixedAmount => ensure_non_negative("fixedStepUpAmount", req.fixed_step_up_amount)?,
    }
    validate_common(req.return_rate, req.tenure_years, req.inflation_rate)?;
    if !req.frequency.is_recurring() {
        return Err(CalcError::validation(
            "A step-up SIP needs recurring instalments, not a one-time investment",
        ));
    }

    // No closed form once the instalment changes; the walk is the answer.
    let yearly_breakdown = simulate(
        req.frequency,
        req.return_rate,
        req.tenure_years,
        req.inflation_rate,
        |year| req.instalment_for_year(year),
    );
    let (future_value, total_invested, inflation_adjusted_value) = yearly_breakdown
        .last()
        .map(|row| {
            (
                row.cumulative_value,
                row.cumulative_invested,
                row.inflation_adjusted_value,
            )
        })
        .unwrap_or_default();

    Ok(StepUpSipResponse {
        total_invested,
        total_returns: future_value - total_invested,
        future_value,
        inflation_adjusted_value,
        annual_step_up_value: req.instalment_for_year(2) - req.initial_sip_amount,
        final_sip_amount: req.instalment_for_year(req.tenure_years),
        yearly_breakdown,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calc::sip;

    fn request() -> StepUpSipRequest {
        StepUpSipRequest {
            initial_sip_amount: 5000.0,
            step_up_type: StepUpType::Percentage,
            step_up_percentage: 10.0,
            fixed_step_up_amount: 0.0,
            frequency: ContributionFrequency::Monthly,
            return_rate: 12.0,
            tenure_years: 10,
            inflation_rate: 6.0,
        }
    }

    #[test]
    fn zero_step_up_equals_plain_sip() {
        let mut req = request();
        req.step_up_percentage = 0.0;
        let stepped = calculate(&req).unwrap();
        let plain = sip::calculate(&sip::SipRequest {
            sip_amount: 5000.0,
            frequency: ContributionFrequency::Monthly,
            return_rate: 12.0,
            tenure_years: 10,
            inflation_rate: 6.0,
        })
        .unwrap();
        assert!(((stepped.future_value - plain.future_value) / plain.future_value).abs() < 1e-9);
        assert_eq!(stepped.total_invested, plain.total_invested);
    }

    #[test]
    fn percentage_step_up_compounds_the_instalment() {
        let res = calculate(&request()).unwrap();
        assert!((res.annual_step_up_value - 500.0).abs() < 1e-9);
        assert!((res.final_sip_amount - 5000.0 * 1.1f64.powi(9)).abs() < 1e-6);
        assert_eq!(res.yearly_breakdown[1].yearly_invested, 5500.0 * 12.0);
    }

    #[test]
    fn fixed_step_up_adds_linearly() {
        let mut req = request();
        req.step_up_type = StepUpType::FixedAmount;
        req.fixed_step_up_amount = 1000.0;
        let res = calculate(&req).unwrap();
        assert_eq!(res.final_sip_amount, 14_000.0);
        // 12 * (5000 + 6000 + ... + 14000)
        assert_eq!(res.total_invested, 12.0 * 95_000.0);
    }

    #[test]
    fn daily_step_up_works_but_one_time_is_refused() {
        let mut req = request();
        req.frequency = ContributionFrequency::Daily;
        let res = calculate(&req).unwrap();
        assert_eq!(res.yearly_breakdown[0].yearly_invested, 5000.0 * 365.0);

        req.frequency = ContributionFrequency::OneTime;
        assert!(matches!(calculate(&req), Err(CalcError::Validation(_))));
    }

    #[test]
    fn step_up_type_uses_form_values() {
        let req: StepUpSipRequest = serde_json::from_str(
            r#"{"initialSipAmount":2000,"stepUpType":"fixed_amount","fixedStepUpAmount":100,
                "frequency":"quarterly","returnRate":8,"tenureYears":3}"#,
        )
        .unwrap();
        assert_eq!(req.step_up_type, StepUpType::FixedAmount);
        assert_eq!(req.inflation_rate, 0.0);
        assert!(calculate(&req).is_ok());
    }
}
