//! Working back from a target corpus to the instalment that reaches it.
//!
//! Two forms ask the same question: the goal planner (snake_case fields)
//! and the reverse SIP calculator (camelCase fields). Both invert the SIP
//! closed form, so feeding the answer back through the SIP breakdown lands
//! on the target.

use super::frequency::{ContributionFrequency, fraction};
use super::sip::{SipYear, annuity_due_value, simulate, validate_common};
use crate::core::chart::ChartSpec;
use crate::core::error::{CalcError, ensure_positive};
use serde::{Deserialize, Serialize};

struct Plan {
    instalment: f64,
    total_investment: f64,
    yearly_breakdown: Vec<SipYear>,
}

fn plan(
    target: f64,
    return_rate: f64,
    years: u32,
    frequency: ContributionFrequency,
) -> Result<Plan, CalcError> {
    validate_common(return_rate, years, 0.0)?;

    let per_year = frequency.periods_per_year();
    let periods = per_year * years;
    let i = fraction(return_rate) / per_year as f64;
    // What one unit of instalment grows to.
    let unit_value = if frequency.is_recurring() {
        annuity_due_value(1.0, i, periods)
    } else {
        (1.0 + i).powi(periods as i32)
    };
    let instalment = target / unit_value;

    Ok(Plan {
        instalment,
        total_investment: instalment * frequency.total_payments(years) as f64,
        yearly_breakdown: simulate(frequency, return_rate, years, 0.0, |_| instalment),
    })
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GoalSipRequest {
    pub target_amount: f64,
    pub expected_return: f64,
    pub time_period: u32,
    #[serde(default)]
    pub frequency: ContributionFrequency,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GoalSipResponse {
    pub required_sip: f64,
    pub target_amount: f64,
    pub total_investment: f64,
    pub wealth_gain: f64,
    pub yearly_breakdown: Vec<SipYear>,
}

impl GoalSipResponse {
    pub fn chart(&self) -> ChartSpec {
        ChartSpec::breakdown(
            "Goal breakup",
            &[
                ("Total Investment", self.total_investment),
                ("Wealth Gain", self.wealth_gain),
            ],
        )
    }
}

pub fn goal_sip(req: &GoalSipRequest) -> Result<GoalSipResponse, CalcError> {
    ensure_positive("target_amount", req.target_amount)?;
    let plan = plan(req.target_amount, req.expected_return, req.time_period, req.frequency)?;
    Ok(GoalSipResponse {
        required_sip: plan.instalment,
        target_amount: req.target_amount,
        total_investment: plan.total_investment,
        wealth_gain: req.target_amount - plan.total_investment,
        yearly_breakdown: plan.yearly_breakdown,
    })
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReverseSipRequest {
    pub target_amount: f64,
    pub expected_return: f64,
    pub investment_period: u32,
    #[serde(default)]
    pub sip_frequency: ContributionFrequency,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReverseSipResponse {
    pub sip_amount: f64,
    pub target_amount: f64,
    pub total_investment: f64,
    pub total_returns: f64,
    /// Value the breakdown actually reaches; equals the target up to rounding.
    pub final_amount: f64,
    pub yearly_breakdown: Vec<SipYear>,
}

impl ReverseSipResponse {
    pub fn chart(&self) -> ChartSpec {
        ChartSpec::breakdown(
            "Reverse SIP breakup",
            &[
                ("Total Investment", self.total_investment),
                ("Total Returns", self.total_returns),
            ],
        )
    }
}

pub fn reverse_sip(req: &ReverseSipRequest) -> Result<ReverseSipResponse, CalcError> {
    ensure_positive("targetAmount", req.target_amount)?;
    let plan = plan(
        req.target_amount,
        req.expected_return,
        req.investment_period,
        req.sip_frequency,
    )?;
    let final_amount = plan
        .yearly_breakdown
        .last()
        .map_or(req.target_amount, |row| row.cumulative_value);
    Ok(ReverseSipResponse {
        sip_amount: plan.instalment,
        target_amount: req.target_amount,
        total_investment: plan.total_investment,
        total_returns: final_amount - plan.total_investment,
        final_amount,
        yearly_breakdown: plan.yearly_breakdown,
    })
}
