use super::frequency::fraction;
use crate::core::chart::ChartSpec;
use crate::core::error::{CalcError, ensure_positive, ensure_range};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InflationRequest {
    pub current_amount: f64,
    pub inflation_rate: f64,
    pub time_period: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InflationYear {
    pub year: u32,
    pub current_value: f64,
    pub future_value: f64,
    pub purchasing_power_lost: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InflationResponse {
    /// Amount needed after `time_period` years to buy what `current_amount` buys today.
    pub future_value: f64,
    pub purchasing_power_lost: f64,
    /// What `current_amount` held as cash will be worth in today's money.
    pub real_value_today: f64,
    pub yearly_data: Vec<InflationYear>,
}

impl InflationResponse {
    pub fn chart(&self) -> ChartSpec {
        ChartSpec::series(
            "Cost of the same basket",
            self.yearly_data
                .iter()
                .map(|row| (format!("Year {}", row.year), row.future_value)),
        )
    }
}

pub fn calculate(req: &InflationRequest) -> Result<InflationResponse, CalcError> {
    ensure_positive("current_amount", req.current_amount)?;
    ensure_range("inflation_rate", req.inflation_rate, 0.0, 100.0)?;
    if !(1..=100).contains(&req.time_period) {
        return Err(CalcError::validation(
            "time_period must be between 1 and 100",
        ));
    }

    let rate = fraction(req.inflation_rate);
    let growth = |years: u32| (1.0 + rate).powi(years as i32);
    let future_value = req.current_amount * growth(req.time_period);

    let yearly_data = (1..=req.time_period)
        .map(|year| {
            let fv = req.current_amount * growth(year);
            InflationYear {
                year,
                current_value: req.current_amount,
                future_value: fv,
                purchasing_power_lost: fv - req.current_amount,
            }
        })
        .collect();

    Ok(InflationResponse {
        future_value,
        purchasing_power_lost: future_value - req.current_amount,
        real_value_today: req.current_amount / growth(req.time_period),
        yearly_data,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn six_percent_for_twelve_years_roughly_doubles() {
        let res = calculate(&InflationRequest {
            current_amount: 100_000.0,
            inflation_rate: 6.0,
            time_period: 12,
        })
        .unwrap();
        assert!((res.future_value - 201_219.65).abs() < 0.01);
        assert!((res.real_value_today * res.future_value - 1e10).abs() < 1e-3);
        assert_eq!(res.yearly_data.len(), 12);
        assert_eq!(res.yearly_data[11].future_value, res.future_value);
    }

    #[test]
    fn zero_period_is_rejected() {
        let req = InflationRequest {
            current_amount: 1.0,
            inflation_rate: 6.0,
            time_period: 0,
        };
        assert!(calculate(&req).is_err());
    }
}
