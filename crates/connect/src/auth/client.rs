//! OAuth 2.0 token endpoint client
//!
//! Handles the two grants this flow uses against Google's token endpoint:
//! - Authorization-code exchange
//! - Refresh-token grant
//!
//! Neither grant is ever retried automatically — retrying a used
//! authorization code fails with `invalid_grant` and only muddies the
//! diagnosis.

use adspilot_domain::constants::GOOGLE_TOKEN_ENDPOINT;
use adspilot_domain::{AdsPilotError, GoogleAdsCredentials};
use async_trait::async_trait;
use reqwest::Method;
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info};

use super::types::{OAuthErrorResponse, TokenResponse};
use crate::http::HttpClient;

/// Error type for token endpoint operations
#[derive(Debug, Error)]
pub enum OAuthClientError {
    /// Transport-level failure (network, timeout)
    #[error("token endpoint request failed: {0}")]
    Transport(#[from] AdsPilotError),

    /// The authorization server rejected the request
    #[error("oauth server error ({status}): {body}")]
    Server { status: u16, body: OAuthErrorResponse },

    /// The response body could not be parsed
    #[error("failed to parse token response: {0}")]
    Parse(String),

    /// No refresh token available for a refresh grant
    #[error("no refresh token available")]
    NoRefreshToken,
}

impl OAuthClientError {
    /// Structured category for diagnostics routing.
    #[must_use]
    pub fn category(&self) -> OAuthErrorCategory {
        match self {
            Self::Server { body, .. } => OAuthErrorCategory::from_error_code(&body.error),
            Self::Transport(_) | Self::Parse(_) | Self::NoRefreshToken => {
                OAuthErrorCategory::Unknown
            }
        }
    }
}

/// Category of an OAuth failure, used to route diagnostics.
///
/// Serialized names are part of the diagnostic report wire contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OAuthErrorCategory {
    /// `invalid_grant`: the refresh token expired or was revoked
    ExpiredRefreshToken,
    /// `invalid_client`: client id/secret rejected
    InvalidCredentials,
    /// `invalid_request`: the request itself was malformed
    MalformedRequest,
    /// `unauthorized_client`: the client may not use this grant type
    ClientNotAuthorized,
    /// `unsupported_grant_type`
    UnsupportedGrant,
    /// Anything else
    #[serde(rename = "unknown_oauth_error")]
    Unknown,
}

impl OAuthErrorCategory {
    /// Map an RFC 6749 error code to a category.
    #[must_use]
    pub fn from_error_code(code: &str) -> Self {
        match code {
            "invalid_grant" => Self::ExpiredRefreshToken,
            "invalid_client" => Self::InvalidCredentials,
            "invalid_request" => Self::MalformedRequest,
            "unauthorized_client" => Self::ClientNotAuthorized,
            "unsupported_grant_type" => Self::UnsupportedGrant,
            _ => Self::Unknown,
        }
    }

    /// True when the category points at bad credentials rather than an
    /// expired or revoked token.
    #[must_use]
    pub fn implies_invalid_credentials(&self) -> bool {
        matches!(self, Self::InvalidCredentials | Self::ClientNotAuthorized)
    }

    /// Wire name of the category.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ExpiredRefreshToken => "expired_refresh_token",
            Self::InvalidCredentials => "invalid_credentials",
            Self::MalformedRequest => "malformed_request",
            Self::ClientNotAuthorized => "client_not_authorized",
            Self::UnsupportedGrant => "unsupported_grant",
            Self::Unknown => "unknown_oauth_error",
        }
    }
}

/// Trait for token endpoint operations
///
/// Abstracts the token endpoint so the flow controller and diagnostics can
/// be exercised against mock implementations.
#[async_trait]
pub trait OAuthClientTrait: Send + Sync {
    /// Exchange an authorization code for tokens.
    ///
    /// `redirect_uri` must be the exact value used in the authorization
    /// request; the server validates byte equality.
    ///
    /// # Errors
    /// Returns an error if the request fails or the server rejects the
    /// grant.
    async fn exchange_code(
        &self,
        code: &str,
        redirect_uri: &str,
    ) -> Result<TokenResponse, OAuthClientError>;

    /// Obtain a fresh access token from a refresh token.
    ///
    /// # Errors
    /// Returns an error if no refresh token is provided, the request
    /// fails, or the server rejects the grant.
    async fn refresh_access_token(
        &self,
        refresh_token: &str,
    ) -> Result<TokenResponse, OAuthClientError>;
}

/// OAuth 2.0 client for Google's token endpoint.
#[derive(Clone)]
pub struct OAuthClient {
    http: HttpClient,
    token_endpoint: String,
    client_id: String,
    client_secret: String,
}

impl OAuthClient {
    /// Create a client from credentials and a shared HTTP transport.
    #[must_use]
    pub fn new(credentials: &GoogleAdsCredentials, http: HttpClient) -> Self {
        Self {
            http,
            token_endpoint: GOOGLE_TOKEN_ENDPOINT.to_string(),
            client_id: credentials.client_id.clone(),
            client_secret: credentials.client_secret.clone(),
        }
    }

    /// Override the token endpoint (tests point this at a mock server).
    #[must_use]
    pub fn with_token_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.token_endpoint = endpoint.into();
        self
    }

    async fn post_grant(
        &self,
        params: &[(&str, &str)],
    ) -> Result<TokenResponse, OAuthClientError> {
        let builder = self.http.request(Method::POST, &self.token_endpoint).form(params);
        let response = self.http.send(builder).await?;

        let status = response.status();
        if !status.is_success() {
            let text = response
                .text()
                .await
                .map_err(|e| OAuthClientError::Parse(e.to_string()))?;
            let body = serde_json::from_str::<OAuthErrorResponse>(&text).unwrap_or_else(|_| {
                OAuthErrorResponse {
                    error: format!("http_{}", status.as_u16()),
                    error_description: Some(text.trim().to_string()),
                }
            });
            debug!(status = status.as_u16(), error = %body.error, "token endpoint rejected grant");
            return Err(OAuthClientError::Server { status: status.as_u16(), body });
        }

        response
            .json::<TokenResponse>()
            .await
            .map_err(|e| OAuthClientError::Parse(e.to_string()))
    }
}

#[async_trait]
impl OAuthClientTrait for OAuthClient {
    async fn exchange_code(
        &self,
        code: &str,
        redirect_uri: &str,
    ) -> Result<TokenResponse, OAuthClientError> {
        let params = [
            ("client_id", self.client_id.as_str()),
            ("client_secret", self.client_secret.as_str()),
            ("code", code),
            ("grant_type", "authorization_code"),
            ("redirect_uri", redirect_uri),
        ];

        let tokens = self.post_grant(&params).await?;
        info!("exchanged authorization code for tokens");
        Ok(tokens)
    }

    async fn refresh_access_token(
        &self,
        refresh_token: &str,
    ) -> Result<TokenResponse, OAuthClientError> {
        if refresh_token.is_empty() {
            return Err(OAuthClientError::NoRefreshToken);
        }

        let params = [
            ("client_id", self.client_id.as_str()),
            ("client_secret", self.client_secret.as_str()),
            ("refresh_token", refresh_token),
            ("grant_type", "refresh_token"),
        ];

        let tokens = self.post_grant(&params).await?;
        info!("refreshed access token");
        Ok(tokens)
    }
}
