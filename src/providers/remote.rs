use crate::core::config::BackendConfig;
use crate::core::{CalcError, CalcRequest, CalcResponse, Calculator};
use crate::providers::util::with_retry;
use async_trait::async_trait;
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

const RETRY_DELAY_MS: u64 = 200;

/// Client for a backend serving the `/calculate-*` endpoints.
pub struct RemoteCalculator {
    base_url: String,
    retries: usize,
    client: reqwest::Client,
}

impl RemoteCalculator {
    pub fn new(config: &BackendConfig) -> Result<Self, CalcError> {
        let client = reqwest::Client::builder()
            .user_agent("fincalc/1.0")
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()
            .map_err(|e| CalcError::Transport(e.to_string()))?;
        Ok(RemoteCalculator {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            retries: config.retries,
            client,
        })
    }
}

/// Unwraps the `{status, ...}` envelope.
fn parse_envelope(req: &CalcRequest, http_status: u16, body: &str) -> Result<CalcResponse, CalcError> {
    let Ok(Value::Object(mut fields)) = serde_json::from_str::<Value>(body) else {
        return Err(CalcError::Backend(format!(
            "HTTP {http_status} with a non-JSON body"
        )));
    };

    match fields.remove("status").as_ref().and_then(Value::as_str) {
        Some("success") => CalcResponse::from_value(req.kind(), Value::Object(fields)),
        Some("error") => {
            let message = fields
                .get("error")
                .and_then(Value::as_str)
                .unwrap_or("Calculation failed");
            // The backend rejected the input; evaluating locally would only repeat that.
            Err(CalcError::validation(message))
        }
        _ => Err(CalcError::Backend(format!(
            "HTTP {http_status} without a status field"
        ))),
    }
}

#[async_trait]
impl Calculator for RemoteCalculator {
    async fn calculate(&self, req: &CalcRequest) -> Result<CalcResponse, CalcError> {
        let url = format!("{}{}", self.base_url, req.kind().endpoint());
        debug!("Requesting calculation from {}", url);

        let response = with_retry(
            || async { self.client.post(&url).json(req).send().await },
            self.retries,
            RETRY_DELAY_MS,
        )
        .await?;

        let status = response.status();
        let body = response.text().await?;
        if status.is_server_error() {
            return Err(CalcError::Backend(format!("HTTP {}", status.as_u16())));
        }
        parse_envelope(req, status.as_u16(), &body)
    }
}
