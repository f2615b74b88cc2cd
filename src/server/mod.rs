//! HTTP service exposing every calculator at `POST /calculate-<name>`.

pub mod error;

use crate::core::config::ServerConfig;
use crate::core::{CalcRequest, Calculator, CalculatorKind};
use crate::providers::LocalCalculator;
use anyhow::{Context, Result};
use axum::{
    Json, Router,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
    routing::{get, post},
};
use error::{ApiError, ApiResult};
use serde_json::{Map, Value};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tower_http::{
    cors::{Any, CorsLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};
use tracing::{debug, info};

#[derive(Clone)]
pub struct AppState {
    pub calculator: Arc<dyn Calculator>,
}

impl Default for AppState {
    fn default() -> Self {
        AppState {
            calculator: Arc::new(LocalCalculator),
        }
    }
}

async fn healthz() -> &'static str {
    "ok"
}

async fn calculate(
    kind: CalculatorKind,
    state: AppState,
    payload: Result<Json<Value>, JsonRejection>,
) -> ApiResult<Json<Value>> {
    let Json(body) = payload.map_err(|e| ApiError::BadRequest(e.body_text()))?;
    debug!("{} request: {}", kind, body);

    let req = CalcRequest::from_value(kind, body)?;
    let res = state.calculator.calculate(&req).await?;

    let mut envelope = Map::new();
    envelope.insert("status".to_string(), Value::from("success"));
    match serde_json::to_value(&res) {
        Ok(Value::Object(fields)) => envelope.extend(fields),
        Ok(other) => {
            return Err(ApiError::BadRequest(format!(
                "{kind} produced a non-object result: {other}"
            )));
        }
        Err(e) => return Err(ApiError::BadRequest(e.to_string())),
    }
    Ok(Json(Value::Object(envelope)))
}

pub fn app_router(state: AppState, config: &ServerConfig) -> Result<Router> {
    let cors = if config.cors_allow.iter().any(|o| o == "*") {
        CorsLayer::new().allow_origin(Any)
    } else {
        let origins = config
            .cors_allow
            .iter()
            .map(|o| {
                o.parse()
                    .with_context(|| format!("Invalid CORS origin: {o}"))
            })
            .collect::<Result<Vec<_>>>()?;
        CorsLayer::new().allow_origin(origins)
    };

    let mut router = Router::new().route("/healthz", get(healthz));
    for &kind in CalculatorKind::ALL {
        router = router.route(
            &kind.endpoint(),
            post(
                move |State(state): State<AppState>, payload: Result<Json<Value>, JsonRejection>| {
                    calculate(kind, state, payload)
                },
            ),
        );
    }

    Ok(router
        .with_state(state)
        .layer(cors)
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            Duration::from_millis(config.request_timeout_ms),
        ))
        .layer(TraceLayer::new_for_http()))
}

/// Serves until the listener fails or the task is dropped.
pub async fn serve(listener: TcpListener, router: Router) -> Result<()> {
    info!("Listening on {}", listener.local_addr()?);
    axum::serve(listener, router)
        .await
        .context("HTTP server stopped")?;
    Ok(())
}

pub async fn run(config: &ServerConfig) -> Result<()> {
    let router = app_router(AppState::default(), config)?;
    let listener = TcpListener::bind(&config.listen_addr)
        .await
        .with_context(|| format!("Failed to bind {}", config.listen_addr))?;
    serve(listener, router).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{Body, to_bytes};
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;

    async fn post_json(path: &str, body: &str) -> (StatusCode, Value) {
        let router = app_router(AppState::default(), &ServerConfig::default()).unwrap();
        let response = router
            .oneshot(
                Request::post(path)
                    .header("content-type", "application/json")
                    .body(Body::from(body.to_string()))
                    .unwrap(),
            )
            .await
            .unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_xirr_analysis_envelope() {
        let (status, body) = post_json(
            "/calculate-xirr-analysis",
            r#"{"cashFlows":[{"date":"2024-01-01","amount":-10000},{"date":"2024-01-31","amount":-5000},{"date":"2024-03-01","amount":16000}]}"#,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "success");
        assert_eq!(body["total_invested"], 15000.0);
        assert_eq!(body["net_gain_loss"], 1000.0);
        assert_eq!(body["cash_flow_count"], 3);
        assert!(body["xirr_percentage"].is_f64());
        assert_eq!(body["cumulative_flows"].as_array().unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_validation_error_envelope() {
        let (status, body) = post_json(
            "/calculate-xirr-analysis",
            r#"{"cashFlows":[{"date":"2024-01-01","amount":100},{"date":"2024-02-01","amount":200}]}"#,
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["status"], "error");
        assert!(body["error"].as_str().unwrap().contains("at least one investment"));
    }

    #[tokio::test]
    async fn test_malformed_json_is_rejected() {
        let (status, body) = post_json("/calculate-gst", "{not json").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["status"], "error");
    }

    #[tokio::test]
    async fn test_camel_case_endpoints() {
        let (status, body) = post_json(
            "/calculate-sip",
            r#"{"sipAmount":5000,"frequency":"monthly","returnRate":12,"tenureYears":10,"inflationRate":6}"#,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["totalInvested"], 600000.0);
        assert_eq!(body["yearlyBreakdown"].as_array().unwrap().len(), 10);
    }

    struct StalledCalculator;

    #[async_trait::async_trait]
    impl Calculator for StalledCalculator {
        async fn calculate(
            &self,
            _req: &CalcRequest,
        ) -> Result<crate::core::CalcResponse, crate::core::CalcError> {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Err(crate::core::CalcError::validation("never reached"))
        }
    }

    #[tokio::test]
    async fn test_slow_calculation_times_out() {
        let config = ServerConfig {
            request_timeout_ms: 20,
            ..Default::default()
        };
        let state = AppState {
            calculator: Arc::new(StalledCalculator),
        };
        let response = app_router(state, &config)
            .unwrap()
            .oneshot(
                Request::post("/calculate-gst")
                    .header("content-type", "application/json")
                    .body(Body::from(
                        r#"{"amount":1000,"gst_rate":18,"calculation_type":"add"}"#,
                    ))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::REQUEST_TIMEOUT);
    }
}
