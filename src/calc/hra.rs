//! House Rent Allowance exemption under section 10(13A).

use crate::core::chart::ChartSpec;
use crate::core::error::{CalcError, ensure_non_negative};
use serde::{Deserialize, Serialize};

/// Marginal rate used for the tax-savings estimate.
pub const ASSUMED_TAX_SLAB: f64 = 0.30;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CityType {
    Metro,
    #[default]
    #[serde(alias = "non_metro")]
    NonMetro,
}

impl CityType {
    fn basic_share(self) -> f64 {
        match self {
            CityType::Metro => 0.50,
            CityType::NonMetro => 0.40,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HraRequest {
    pub basic_salary_annual: f64,
    #[serde(default)]
    pub da_received_annual: f64,
    pub hra_received_annual: f64,
    pub rent_paid_annual: f64,
    #[serde(default)]
    pub city_type: CityType,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HraResponse {
    pub actual_hra: f64,
    pub salary_percentage: f64,
    pub rent_minus_ten_percent: f64,
    pub hra_exempt: f64,
    pub taxable_hra: f64,
    pub tax_savings: f64,
}

impl HraResponse {
    pub fn chart(&self) -> ChartSpec {
        ChartSpec::breakdown(
            "HRA split",
            &[("HRA Exempt", self.hra_exempt), ("Taxable HRA", self.taxable_hra)],
        )
    }
}

pub fn calculate(req: &HraRequest) -> Result<HraResponse, CalcError> {
    ensure_non_negative("basic_salary_annual", req.basic_salary_annual)?;
    ensure_non_negative("da_received_annual", req.da_received_annual)?;
    ensure_non_negative("hra_received_annual", req.hra_received_annual)?;
    ensure_non_negative("rent_paid_annual", req.rent_paid_annual)?;

    // The salary share uses basic only; the 10% rent threshold uses basic + DA.
    let salary_percentage = req.basic_salary_annual * req.city_type.basic_share();
    let ten_percent_salary = (req.basic_salary_annual + req.da_received_annual) * 0.10;
    let rent_minus_ten_percent = (req.rent_paid_annual - ten_percent_salary).max(0.0);

    let hra_exempt = req
        .hra_received_annual
        .min(salary_percentage)
        .min(rent_minus_ten_percent);

    Ok(HraResponse {
        actual_hra: req.hra_received_annual,
        salary_percentage,
        rent_minus_ten_percent,
        hra_exempt,
        taxable_hra: (req.hra_received_annual - hra_exempt).max(0.0),
        tax_savings: hra_exempt * ASSUMED_TAX_SLAB,
    })
}
