//! Extraction server collaborator
//!
//! The session controller talks to the server through [`ShippingBackend`]:
//! `POST /extract` (urlencoded markup), `POST /store-addresses` (JSON) and
//! `POST /generate-csv` (urlencoded submission form). [`HttpBackend`] is the
//! reqwest implementation. It keeps a cookie store so the server-side
//! session written by `/store-addresses` is seen by `/generate-csv`.
//!
//! One request per call; nothing is retried.

use crate::submission::SubmissionPayload;
use async_trait::async_trait;
use reqwest::header::CONTENT_DISPOSITION;
use serde::Deserialize;
use shipform_common::config::ClientConfig;
use shipform_common::models::{ExtractResponse, StoreAddressesRequest};
use shipform_common::{AddressRecord, Extraction};
use std::path::Path;
use thiserror::Error;

const USER_AGENT: &str = concat!("shipform/", env!("CARGO_PKG_VERSION"));

/// Filename used when the server does not suggest one
pub const DEFAULT_CSV_FILENAME: &str = "shipping_order.csv";

/// Collaborator failure
#[derive(Debug, Error)]
pub enum BackendError {
    /// Request never produced a response
    #[error("Network error: {0}")]
    Network(String),

    /// Non-success status, with the server's `error` message if it sent one
    #[error("Server error {status}: {}", .message.as_deref().unwrap_or("no details"))]
    Server { status: u16, message: Option<String> },

    /// Success status but the body was not what we expected
    #[error("Malformed response: {0}")]
    Malformed(String),
}

impl BackendError {
    /// Message supplied by the server, if any
    pub fn server_message(&self) -> Option<&str> {
        match self {
            BackendError::Server {
                message: Some(message),
                ..
            } if !message.trim().is_empty() => Some(message.as_str()),
            _ => None,
        }
    }
}

/// Result of a successful form post
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmissionReceipt {
    /// Filename suggested by the server's `Content-Disposition` header
    pub filename: Option<String>,
    /// Response body (CSV)
    pub content: Vec<u8>,
}

impl SubmissionReceipt {
    pub fn filename_or_default(&self) -> &str {
        self.filename.as_deref().unwrap_or(DEFAULT_CSV_FILENAME)
    }
}

#[async_trait]
pub trait ShippingBackend: Send + Sync {
    /// Turn pasted markup into one or more address records
    async fn extract(&self, markup: &str) -> Result<Extraction, BackendError>;

    /// Forward the full address set to server-side storage
    async fn store_addresses(&self, addresses: &[AddressRecord]) -> Result<(), BackendError>;

    /// Post the assembled submission form
    async fn submit(&self, payload: &SubmissionPayload) -> Result<SubmissionReceipt, BackendError>;
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: Option<String>,
}

/// reqwest-backed [`ShippingBackend`]
pub struct HttpBackend {
    http_client: reqwest::Client,
    base_url: String,
}

impl HttpBackend {
    pub fn new(config: &ClientConfig) -> Result<Self, BackendError> {
        let mut builder = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .cookie_store(true);
        if let Some(timeout) = config.request_timeout {
            builder = builder.timeout(timeout);
        }
        let http_client = builder
            .build()
            .map_err(|e| BackendError::Network(e.to_string()))?;

        Ok(Self {
            http_client,
            base_url: config.server_url.trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

#[async_trait]
impl ShippingBackend for HttpBackend {
    async fn extract(&self, markup: &str) -> Result<Extraction, BackendError> {
        let url = self.url("/extract");
        tracing::debug!(url = %url, bytes = markup.len(), "Posting markup for extraction");

        let response = self
            .http_client
            .post(&url)
            .form(&[("html_content", markup)])
            .send()
            .await
            .map_err(|e| BackendError::Network(e.to_string()))?;

        let status = response.status();
        let body = response
            .bytes()
            .await
            .map_err(|e| BackendError::Network(e.to_string()))?;

        if !status.is_success() {
            let message = serde_json::from_slice::<ErrorBody>(&body)
                .ok()
                .and_then(|b| b.error);
            return Err(BackendError::Server {
                status: status.as_u16(),
                message,
            });
        }

        let parsed: ExtractResponse = serde_json::from_slice(&body)
            .map_err(|e| BackendError::Malformed(e.to_string()))?;
        let extraction = parsed
            .into_extraction()
            .map_err(|e| BackendError::Malformed(e.to_string()))?;

        tracing::info!(
            count = match &extraction {
                Extraction::Single(_) => 1,
                Extraction::Multiple(records) => records.len(),
            },
            multiple = extraction.is_multiple(),
            "Extraction succeeded"
        );
        Ok(extraction)
    }

    async fn store_addresses(&self, addresses: &[AddressRecord]) -> Result<(), BackendError> {
        let url = self.url("/store-addresses");
        tracing::debug!(url = %url, count = addresses.len(), "Storing addresses");

        let response = self
            .http_client
            .post(&url)
            .json(&StoreAddressesRequest { addresses })
            .send()
            .await
            .map_err(|e| BackendError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let message = response.json::<ErrorBody>().await.ok().and_then(|b| b.error);
            return Err(BackendError::Server {
                status: status.as_u16(),
                message,
            });
        }
        Ok(())
    }

    async fn submit(&self, payload: &SubmissionPayload) -> Result<SubmissionReceipt, BackendError> {
        let url = self.url("/generate-csv");
        tracing::debug!(url = %url, fields = payload.len(), "Posting submission form");

        let response = self
            .http_client
            .post(&url)
            .form(payload.pairs())
            .send()
            .await
            .map_err(|e| BackendError::Network(e.to_string()))?;

        let status = response.status();
        let filename = response
            .headers()
            .get(CONTENT_DISPOSITION)
            .and_then(|value| value.to_str().ok())
            .and_then(parse_content_disposition);
        let content = response
            .bytes()
            .await
            .map_err(|e| BackendError::Network(e.to_string()))?
            .to_vec();

        if !status.is_success() {
            let message = serde_json::from_slice::<ErrorBody>(&content)
                .ok()
                .and_then(|b| b.error);
            return Err(BackendError::Server {
                status: status.as_u16(),
                message,
            });
        }

        tracing::info!(bytes = content.len(), filename = ?filename, "Submission accepted");
        Ok(SubmissionReceipt { filename, content })
    }
}

/// Filename from a `Content-Disposition` header, reduced to its last path component
pub fn parse_content_disposition(value: &str) -> Option<String> {
    let raw = value
        .split(';')
        .map(str::trim)
        .find_map(|part| part.strip_prefix("filename="))?;
    let unquoted = raw.trim().trim_matches('"');
    let name = Path::new(unquoted).file_name()?.to_str()?;
    if name.is_empty() {
        None
    } else {
        Some(name.to_string())
    }
}
