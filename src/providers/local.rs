use crate::calc;
use crate::core::{CalcError, CalcRequest, CalcResponse, Calculator};
use async_trait::async_trait;

/// Evaluates in-process with the pure calculation module.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalCalculator;

#[async_trait]
impl Calculator for LocalCalculator {
    async fn calculate(&self, req: &CalcRequest) -> Result<CalcResponse, CalcError> {
        calc::evaluate(req)
    }
}
