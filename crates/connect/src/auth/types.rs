//! OAuth 2.0 types and structures
//!
//! Data shapes for the token endpoint wire contract (RFC 6749), the
//! session-persisted token record, and the in-flight authorization state.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// OAuth 2.0 tokens with absolute expiry, as persisted for the session.
///
/// Created whole on every successful exchange or refresh and replaced
/// whole on the next one; partial updates are never visible to readers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenRecord {
    /// Access token presented to the Ads API
    pub access_token: String,

    /// Refresh token used for silent renewal
    pub refresh_token: String,

    /// Absolute expiration timestamp (UTC), computed from `expires_in` at
    /// issue time
    pub expires_at: DateTime<Utc>,

    /// Granted scopes (space-separated)
    pub scope: String,
}

impl TokenRecord {
    /// Seconds until expiry relative to `now` (negative once past expiry).
    #[must_use]
    pub fn seconds_until_expiry(&self, now: DateTime<Utc>) -> i64 {
        (self.expires_at - now).num_seconds()
    }
}

/// Token response from the authorization server.
///
/// Standard OAuth 2.0 token response format (RFC 6749 §5.1). The refresh
/// token is optional: Google omits it on refresh-token grants.
#[derive(Debug, Clone, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    pub expires_in: i64,
    #[serde(default)]
    pub scope: Option<String>,
    #[serde(default)]
    pub token_type: Option<String>,
}

/// OAuth error response from the authorization server.
///
/// Standard OAuth 2.0 error response format (RFC 6749 §5.2).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OAuthErrorResponse {
    pub error: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_description: Option<String>,
}

impl fmt::Display for OAuthErrorResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.error_description {
            Some(desc) => write!(f, "{}: {}", self.error, desc),
            None => write!(f, "{}", self.error),
        }
    }
}

impl std::error::Error for OAuthErrorResponse {}

/// In-flight authorization flow state, persisted across the redirect
/// round-trip.
///
/// At most one exists per session. Created by `initiate_flow`, consumed
/// (deleted) when the flow leaves via success or failure — the pair must
/// never survive to be replayed against a second callback.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthState {
    /// Random anti-CSRF token echoed back by the authorization server
    pub state: String,

    /// Exact redirect URI used in the authorization request; reused
    /// byte-for-byte in the token exchange
    pub redirect_uri: String,

    /// Marks that a redirect round-trip is underway; distinguishes a
    /// genuine callback from an unrelated page load carrying a `code`
    /// query parameter
    pub in_progress: bool,
}
