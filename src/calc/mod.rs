//! Pure calculation functions. No I/O; every transport calls into here.

pub mod compounding;
pub mod frequency;
pub mod goal_sip;
pub mod gratuity;
pub mod growth;
pub mod gst;
pub mod hra;
pub mod inflation;
pub mod loan;
pub mod lumpsum;
pub mod recurring;
pub mod schemes;
pub mod sip;
pub mod small_savings;
pub mod step_up_sip;
pub mod withdrawal;
pub mod xirr;

use crate::core::{CalcError, CalcRequest, CalcResponse};
use tracing::debug;

/// Evaluates any calculator request locally.
pub fn evaluate(req: &CalcRequest) -> Result<CalcResponse, CalcError> {
    debug!(calculator = %req.kind(), ?req, "Evaluating");
    let result = req.dispatch();
    if let Err(e) = &result {
        debug!(calculator = %req.kind(), "Rejected: {e}");
    }
    result
}
