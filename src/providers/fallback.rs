use crate::core::{CalcError, CalcRequest, CalcResponse, Calculator};
use async_trait::async_trait;
use tracing::{debug, warn};

/// Tries `primary` first and answers from `fallback` when the primary
/// cannot be reached. Input errors from the primary are returned as-is.
#[derive(Clone)]
pub struct FallbackCalculator<P: Calculator, F: Calculator> {
    primary: P,
    fallback: F,
}

impl<P: Calculator, F: Calculator> FallbackCalculator<P, F> {
    pub fn new(primary: P, fallback: F) -> Self {
        Self { primary, fallback }
    }
}

#[async_trait]
impl<P: Calculator, F: Calculator> Calculator for FallbackCalculator<P, F> {
    async fn calculate(&self, req: &CalcRequest) -> Result<CalcResponse, CalcError> {
        match self.primary.calculate(req).await {
            Ok(res) => {
                debug!("Served {} by primary calculator", req.kind());
                Ok(res)
            }
            Err(e) if e.is_recoverable() => {
                warn!("{} unavailable ({}), evaluating locally", req.kind(), e);
                self.fallback.calculate(req).await
            }
            Err(e) => Err(e),
        }
    }
}
