//! Client for the remote analysis service.
//!
//! # Architecture
//!
//! One request per submission, one JSON reply:
//!
//! - [`ServiceEndpoint`] - normalized base URL plus the [`ServiceVariant`] that decides
//!   the path, request body, and where the result text lives in the reply
//! - [`send_analysis`] - performs the exchange and classifies the outcome
//! - [`shape`] - per-variant request/response adapters
//! - [`errors`] - turning error bodies into short, user-facing detail
//!
//! # Outcome classification
//!
//! | Outcome | Result |
//! |---------|--------|
//! | 2xx, JSON, text field present | `Ok(AnalysisReply { used_fallback: false })` |
//! | 2xx, JSON, text field absent or empty | `Ok(AnalysisReply { used_fallback: true })` with [`FALLBACK_ANALYSIS_TEXT`] |
//! | 2xx, body is not JSON | `Err(ExchangeError::Malformed)` |
//! | non-2xx | `Err(ExchangeError::Status)` |
//! | connect/timeout/IO failure | `Err(ExchangeError::Timeout \| Transport)` |
//! | base URL cannot form an absolute URL | `Err(ExchangeError::InvalidUrl)` |

pub mod errors;
pub mod shape;

use std::time::Duration;

use thiserror::Error;

pub use devlens_types;
use devlens_types::{
    AnalysisRequest, FALLBACK_ANALYSIS_TEXT, NonEmptyString, ServiceVariant,
    sanitize_terminal_text,
};

const CONNECT_TIMEOUT_SECS: u64 = 30;
const TCP_KEEPALIVE_SECS: u64 = 60;
const POOL_IDLE_TIMEOUT_SECS: u64 = 90;

const MAX_ERROR_BODY_BYTES: usize = 32 * 1024;

const USER_AGENT: &str = concat!("devlens/", env!("CARGO_PKG_VERSION"));

/// Strip one trailing `/` so endpoint paths can be appended verbatim.
///
/// An empty base is valid and yields relative request paths.
#[must_use]
pub fn normalize_base_url(raw: &str) -> String {
    let trimmed = raw.trim();
    trimmed.strip_suffix('/').unwrap_or(trimmed).to_string()
}

/// Where and how to reach the analysis service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceEndpoint {
    base_url: String,
    variant: ServiceVariant,
}

impl ServiceEndpoint {
    #[must_use]
    pub fn new(base_url: &str, variant: ServiceVariant) -> Self {
        Self {
            base_url: normalize_base_url(base_url),
            variant,
        }
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    #[must_use]
    pub fn variant(&self) -> ServiceVariant {
        self.variant
    }

    /// Full request URL; relative when no base URL is configured.
    #[must_use]
    pub fn url(&self) -> String {
        format!("{}{}", self.base_url, shape::endpoint_path(self.variant))
    }
}

/// Build the HTTP client used for analysis requests.
///
/// `timeout` bounds the whole exchange; `None` leaves it to the transport
/// defaults (no overall timeout).
pub fn http_client(timeout: Option<Duration>) -> Result<reqwest::Client, reqwest::Error> {
    let mut builder = reqwest::Client::builder()
        .user_agent(USER_AGENT)
        .connect_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS))
        .tcp_keepalive(Some(Duration::from_secs(TCP_KEEPALIVE_SECS)))
        .pool_idle_timeout(Some(Duration::from_secs(POOL_IDLE_TIMEOUT_SECS)));
    if let Some(timeout) = timeout {
        builder = builder.timeout(timeout);
    }
    builder.build()
}

/// A successful exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalysisReply {
    pub text: NonEmptyString,
    /// The reply had no usable text and [`FALLBACK_ANALYSIS_TEXT`] was substituted.
    pub used_fallback: bool,
}

#[derive(Debug, Error)]
pub enum ExchangeError {
    #[error("Request failed: invalid service URL '{url}': {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },
    #[error("API error: {status}{}", errors::detail_suffix(.detail.as_deref()))]
    Status {
        status: reqwest::StatusCode,
        detail: Option<String>,
    },
    #[error("Request timed out: {0}")]
    Timeout(#[source] reqwest::Error),
    #[error("Request failed: {0}")]
    Transport(#[source] reqwest::Error),
    #[error("Malformed response: {0}")]
    Malformed(String),
}

impl ExchangeError {
    fn from_transport(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout(err)
        } else {
            Self::Transport(err)
        }
    }

    /// Terminal-safe, never-empty text for the error display.
    #[must_use]
    pub fn user_message(&self) -> NonEmptyString {
        let rendered = self.to_string();
        NonEmptyString::new(sanitize_terminal_text(&rendered).into_owned())
            .unwrap_or_else(|_| NonEmptyString::from(errors::UNKNOWN_ERROR))
    }
}

/// Perform one analysis exchange.
pub async fn send_analysis(
    client: &reqwest::Client,
    endpoint: &ServiceEndpoint,
    request: &AnalysisRequest,
) -> Result<AnalysisReply, ExchangeError> {
    let raw_url = endpoint.url();
    let url = url::Url::parse(&raw_url).map_err(|source| ExchangeError::InvalidUrl {
        url: raw_url.clone(),
        source,
    })?;

    let payload = shape::request_body(endpoint.variant(), request);
    tracing::debug!(url = %url, %payload, "Sending request");

    let response = client
        .post(url)
        .json(&payload)
        .send()
        .await
        .map_err(ExchangeError::from_transport)?;

    let status = response.status();
    if !status.is_success() {
        let body = read_capped_error_body(response).await;
        return Err(ExchangeError::Status {
            status,
            detail: errors::extract_error_detail(&body),
        });
    }

    let bytes = response
        .bytes()
        .await
        .map_err(ExchangeError::from_transport)?;
    let body: serde_json::Value = serde_json::from_slice(&bytes)
        .map_err(|e| ExchangeError::Malformed(e.to_string()))?;

    Ok(match shape::extract_result_text(endpoint.variant(), &body) {
        Some(text) => AnalysisReply {
            text,
            used_fallback: false,
        },
        None => AnalysisReply {
            text: NonEmptyString::from(FALLBACK_ANALYSIS_TEXT),
            used_fallback: true,
        },
    })
}

pub async fn read_capped_error_body(response: reqwest::Response) -> String {
    use futures_util::StreamExt;
    let mut body = Vec::new();
    let mut stream = response.bytes_stream();
    while let Some(chunk) = stream.next().await {
        let Ok(chunk) = chunk else { break };
        body.extend_from_slice(&chunk);
        if body.len() > MAX_ERROR_BODY_BYTES {
            body.truncate(MAX_ERROR_BODY_BYTES);
            let text = String::from_utf8_lossy(&body);
            return format!("{text}...(truncated)");
        }
    }
    String::from_utf8_lossy(&body).into_owned()
}
