//! AccrualClient — HTTP client for the points-accrual service

use reqwest::{Client, StatusCode, header};
use serde::Deserialize;
use shared::models::OrderStatus;
use std::time::Duration;

use crate::utils::AppError;

/// Upstream verdict for one order.
///
/// `status` is one of REGISTERED / PROCESSING / PROCESSED / INVALID;
/// `accrual` is meaningful only when PROCESSED.
#[derive(Debug, Clone, Deserialize)]
pub struct AccrualReply {
    pub order: String,
    pub status: OrderStatus,
    #[serde(default)]
    pub accrual: Option<f64>,
}

/// Classified upstream outcomes that are not a resolved reply.
///
/// None of these is fatal to a caller: submission proceeds with a NEW
/// order, and the reconciler retries on a later cycle.
#[derive(Debug, thiserror::Error)]
pub enum AccrualError {
    /// The accrual service does not know the order yet.
    #[error("order not registered with the accrual service")]
    NotFound,

    /// Upstream asked us to back off; `retry_after` is an advisory hint.
    #[error("accrual service rate limit exceeded")]
    RateLimited { retry_after: Option<Duration> },

    /// Upstream has accepted the order but produced no verdict yet.
    #[error("accrual service has no verdict yet")]
    StillProcessing,

    /// Transport failure, unexpected status, or an unparseable body.
    #[error("accrual service unavailable: {0}")]
    Unavailable(String),
}

/// HTTP client for the accrual service API
pub struct AccrualClient {
    client: Client,
    base_url: String,
}

impl AccrualClient {
    /// Create a client against `base_url` with a fixed per-request deadline.
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, AppError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AppError::internal(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    /// Query the upstream verdict for one order number.
    ///
    /// Read-only; exactly one GET per invocation.
    pub async fn check(&self, number: &str) -> Result<AccrualReply, AccrualError> {
        let url = format!("{}/api/orders/{}", self.base_url, number);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| AccrualError::Unavailable(e.to_string()))?;

        match response.status() {
            StatusCode::OK => {
                let reply: AccrualReply = response
                    .json()
                    .await
                    .map_err(|e| AccrualError::Unavailable(format!("bad response body: {e}")))?;
                // The wire contract never reports NEW; treat it as a broken upstream.
                if reply.status == OrderStatus::New {
                    return Err(AccrualError::Unavailable(
                        "upstream reported status NEW".to_string(),
                    ));
                }
                Ok(reply)
            }
            StatusCode::NO_CONTENT => Err(AccrualError::StillProcessing),
            StatusCode::NOT_FOUND => Err(AccrualError::NotFound),
            StatusCode::TOO_MANY_REQUESTS => {
                let retry_after = response
                    .headers()
                    .get(header::RETRY_AFTER)
                    .and_then(|v| v.to_str().ok())
                    .and_then(|s| s.trim().parse::<u64>().ok())
                    .map(Duration::from_secs);
                Err(AccrualError::RateLimited { retry_after })
            }
            status => Err(AccrualError::Unavailable(format!(
                "unexpected status {status}"
            ))),
        }
    }
}
