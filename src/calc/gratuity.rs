//! Gratuity on leaving an employer, under the Payment of Gratuity Act or
//! outside it.

use crate::core::chart::ChartSpec;
use crate::core::error::{CalcError, ensure_non_negative, ensure_range};
use serde::{Deserialize, Serialize};

/// Largest gratuity exempt from income tax.
pub const GRATUITY_CAP: f64 = 2_000_000.0;
/// Service needed before gratuity becomes payable under the Act.
pub const MIN_SERVICE_YEARS: u32 = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GratuityType {
    /// 15 days' wages per year, a month counted as 26 working days.
    #[default]
    Act,
    /// Half a month's wages per year, a month counted as 30 days.
    NonAct,
    /// `custom_days` of wages per year over 26 working days.
    Custom,
}

fn default_days() -> f64 {
    15.0
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GratuityRequest {
    /// Last drawn monthly basic pay plus DA.
    pub last_salary: f64,
    pub years_of_service: u32,
    #[serde(default)]
    pub gratuity_type: GratuityType,
    #[serde(default = "default_days")]
    pub custom_days: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GratuityResponse {
    pub gratuity_amount: f64,
    pub annual_salary: f64,
    pub years_of_service: u32,
    pub eligible: bool,
    /// Formula amount before the tax-free ceiling was applied.
    pub uncapped_amount: f64,
}

impl GratuityResponse {
    pub fn chart(&self) -> ChartSpec {
        ChartSpec::breakdown(
            "Gratuity vs annual salary",
            &[
                ("Gratuity", self.gratuity_amount),
                ("Annual Salary", self.annual_salary),
            ],
        )
    }
}

pub fn calculate(req: &GratuityRequest) -> Result<GratuityResponse, CalcError> {
    ensure_non_negative("last_salary", req.last_salary)?;
    ensure_range("custom_days", req.custom_days, 1.0, 30.0)?;
    if req.years_of_service > 60 {
        return Err(CalcError::validation(
            "years_of_service must be between 0 and 60",
        ));
    }

    let (days, month_days) = match req.gratuity_type {
        GratuityType::Act => (15.0, 26.0),
        GratuityType::NonAct => (15.0, 30.0),
        GratuityType::Custom => (req.custom_days, 26.0),
    };
    let eligible = req.years_of_service >= MIN_SERVICE_YEARS;
    let uncapped_amount = if eligible {
        req.last_salary * days * req.years_of_service as f64 / month_days
    } else {
        0.0
    };

    Ok(GratuityResponse {
        gratuity_amount: uncapped_amount.min(GRATUITY_CAP),
        annual_salary: req.last_salary * 12.0,
        years_of_service: req.years_of_service,
        eligible,
        uncapped_amount,
    })
}
