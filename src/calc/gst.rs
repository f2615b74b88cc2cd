use crate::core::chart::ChartSpec;
use crate::core::error::{CalcError, ensure_finite, ensure_range};
use serde::{Deserialize, Serialize};

/// Largest amount the calculator accepts: ₹2 crore.
pub const MAX_AMOUNT: f64 = 20_000_000.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GstMode {
    /// `amount` excludes tax.
    #[default]
    Add,
    /// `amount` already includes tax.
    Remove,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GstRequest {
    pub amount: f64,
    pub gst_rate: f64,
    #[serde(default)]
    pub calculation_type: GstMode,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GstResponse {
    pub base_amount: f64,
    pub gst_amount: f64,
    pub total_amount: f64,
    /// Central share; intra-state supplies split the tax evenly.
    pub cgst: f64,
    pub sgst: f64,
}

impl GstResponse {
    pub fn chart(&self) -> ChartSpec {
        ChartSpec::breakdown(
            "Base vs GST",
            &[("Base Amount", self.base_amount), ("GST Amount", self.gst_amount)],
        )
    }
}

pub fn calculate(req: &GstRequest) -> Result<GstResponse, CalcError> {
    ensure_finite("amount", req.amount)?;
    if req.amount < 0.0 {
        return Err(CalcError::validation("Amount cannot be negative"));
    }
    if req.amount > MAX_AMOUNT {
        return Err(CalcError::validation("Amount cannot exceed ₹2,00,00,000"));
    }
    ensure_range("gst_rate", req.gst_rate, 0.0, 100.0)?;

    let (base_amount, gst_amount, total_amount) = match req.calculation_type {
        GstMode::Add => {
            let gst = req.amount * req.gst_rate / 100.0;
            (req.amount, gst, req.amount + gst)
        }
        GstMode::Remove => {
            let gst = req.amount * req.gst_rate / (100.0 + req.gst_rate);
            (req.amount - gst, gst, req.amount)
        }
    };

    Ok(GstResponse {
        base_amount,
        gst_amount,
        total_amount,
        cgst: gst_amount / 2.0,
        sgst: gst_amount / 2.0,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_then_remove_recovers_base() {
        let added = calculate(&GstRequest {
            amount: 1000.0,
            gst_rate: 18.0,
            calculation_type: GstMode::Add,
        })
        .unwrap();
        assert!((added.gst_amount - 180.0).abs() < 1e-9);
        assert!((added.total_amount - 1180.0).abs() < 1e-9);
        assert!((added.cgst - 90.0).abs() < 1e-9);

        let removed = calculate(&GstRequest {
            amount: added.total_amount,
            gst_rate: 18.0,
            calculation_type: GstMode::Remove,
        })
        .unwrap();
        assert!((removed.base_amount - 1000.0).abs() < 1e-9);
        assert!((removed.gst_amount - 180.0).abs() < 1e-9);
    }

    #[test]
    fn rate_outside_percentage_range_is_rejected() {
        let err = calculate(&GstRequest {
            amount: 100.0,
            gst_rate: 101.0,
            calculation_type: GstMode::Add,
        })
        .unwrap_err();
        assert_eq!(err.to_string(), "gst_rate must be between 0 and 100");
    }

    #[test]
    fn non_finite_amount_is_named_as_such() {
        for amount in [f64::NAN, f64::INFINITY] {
            let err = calculate(&GstRequest {
                amount,
                gst_rate: 18.0,
                calculation_type: GstMode::Add,
            })
            .unwrap_err();
            assert_eq!(err, CalcError::validation("amount must be a finite number"));
        }
    }

    #[test]
    fn amount_is_capped_at_two_crore() {
        assert!(
            calculate(&GstRequest {
                amount: MAX_AMOUNT,
                gst_rate: 5.0,
                calculation_type: GstMode::Add,
            })
            .is_ok()
        );
        let err = calculate(&GstRequest {
            amount: MAX_AMOUNT + 1.0,
            gst_rate: 5.0,
            calculation_type: GstMode::Add,
        })
        .unwrap_err();
        assert_eq!(err, CalcError::validation("Amount cannot exceed ₹2,00,00,000"));
        assert!(
            calculate(&GstRequest {
                amount: -5.0,
                gst_rate: 5.0,
                calculation_type: GstMode::Remove,
            })
            .is_err()
        );
    }
}
