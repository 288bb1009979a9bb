//! Ads API reachability probes
//!
//! The diagnostics pipeline needs two network probes against the Ads API:
//! an unauthenticated reachability check of the base URL and an
//! authenticated call to the cheapest real endpoint. Both sit behind a
//! trait so tests — and webview embedders with richer cross-origin
//! signals — can supply their own classification.

use std::time::Duration;

use adspilot_domain::constants::{
    ADS_API_BASE_URL, ENDPOINT_PROBE_TIMEOUT_SECS, LIST_ACCESSIBLE_CUSTOMERS_PATH,
};
use adspilot_domain::AdsPilotError;
use async_trait::async_trait;
use reqwest::Method;

use crate::http::HttpClient;

/// Structured classification of a probe failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProbeFailureKind {
    /// The user agent refused the cross-origin request before it left.
    /// Native transports cannot produce this; webview embedders can.
    CrossOriginBlocked,
    /// The request deadline elapsed
    Timeout,
    /// Connection-level failure (refused, reset, DNS)
    Network,
    /// The endpoint answered with a non-success HTTP status
    Http(u16),
}

/// A failed probe with its classification and the transport's message.
#[derive(Debug, Clone)]
pub struct ProbeFailure {
    pub kind: ProbeFailureKind,
    pub message: String,
}

impl ProbeFailure {
    /// Construct a failure.
    #[must_use]
    pub fn new(kind: ProbeFailureKind, message: impl Into<String>) -> Self {
        Self { kind, message: message.into() }
    }

    /// Best-effort guess that this failure is a cross-origin block.
    ///
    /// Structured classification wins; the substring check is the
    /// documented last resort for transports that only surface free-text
    /// messages.
    #[must_use]
    pub fn suggests_cross_origin(&self) -> bool {
        matches!(self.kind, ProbeFailureKind::CrossOriginBlocked)
            || self.message.contains("CORS")
            || self.message.contains("Network Error")
    }

    fn from_transport(err: &AdsPilotError) -> Self {
        match err {
            AdsPilotError::Timeout(msg) => Self::new(ProbeFailureKind::Timeout, msg.clone()),
            other => Self::new(ProbeFailureKind::Network, other.to_string()),
        }
    }
}

/// Trait for Ads API probes
///
/// Abstracts the two network probes the diagnostics pipeline runs so they
/// can be exercised against mock implementations.
#[async_trait]
pub trait AdsApiProbe: Send + Sync {
    /// Unauthenticated `HEAD` against the API base URL.
    ///
    /// Any HTTP-level answer counts as reachable — only a transport
    /// failure is an error here.
    ///
    /// # Errors
    /// Returns the classified transport failure.
    async fn head_reachability(&self) -> Result<(), ProbeFailure>;

    /// Authenticated `GET /customers:listAccessibleCustomers` with a short
    /// timeout.
    ///
    /// # Errors
    /// Returns the classified failure, including non-success HTTP
    /// statuses.
    async fn list_accessible_customers(
        &self,
        access_token: &str,
        developer_token: &str,
    ) -> Result<(), ProbeFailure>;
}

/// Production probe against the Google Ads API.
#[derive(Clone)]
pub struct GoogleAdsProbe {
    http: HttpClient,
    base_url: String,
}

impl GoogleAdsProbe {
    /// Create a probe over the shared HTTP transport.
    #[must_use]
    pub fn new(http: HttpClient) -> Self {
        Self { http, base_url: ADS_API_BASE_URL.to_string() }
    }

    /// Override the API base URL (tests point this at a mock server).
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

#[async_trait]
impl AdsApiProbe for GoogleAdsProbe {
    async fn head_reachability(&self) -> Result<(), ProbeFailure> {
        let builder = self.http.request(Method::HEAD, &self.base_url);
        match self.http.send(builder).await {
            Ok(_) => Ok(()),
            Err(err) => Err(ProbeFailure::from_transport(&err)),
        }
    }

    async fn list_accessible_customers(
        &self,
        access_token: &str,
        developer_token: &str,
    ) -> Result<(), ProbeFailure> {
        let url = format!("{}{}", self.base_url, LIST_ACCESSIBLE_CUSTOMERS_PATH);
        let builder = self
            .http
            .request(Method::GET, &url)
            .bearer_auth(access_token)
            .header("developer-token", developer_token)
            .timeout(Duration::from_secs(ENDPOINT_PROBE_TIMEOUT_SECS));

        match self.http.send(builder).await {
            Ok(response) if response.status().is_success() => Ok(()),
            Ok(response) => {
                let status = response.status().as_u16();
                Err(ProbeFailure::new(
                    ProbeFailureKind::Http(status),
                    format!("API endpoint returned HTTP {status}"),
                ))
            }
            Err(err) => Err(ProbeFailure::from_transport(&err)),
        }
    }
}
