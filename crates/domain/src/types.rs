//! Google Ads credential and configuration types

use serde::{Deserialize, Serialize};

/// OAuth2 and API credentials for a Google Ads account connection.
///
/// Loaded once at startup and treated as immutable for the process
/// lifetime. Empty strings mean "not configured" — absence of a credential
/// is a legitimate state the diagnostics pipeline reports on, not a load
/// error.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GoogleAdsCredentials {
    /// OAuth2 client ID from the Google Cloud Console
    pub client_id: String,

    /// OAuth2 client secret paired with `client_id`
    pub client_secret: String,

    /// Google Ads API developer token
    pub developer_token: String,

    /// API key for auxiliary Google API calls
    pub api_key: String,

    /// Pre-provisioned refresh token, if one was issued out of band
    pub refresh_token: String,

    /// Default customer ID for account-level requests
    pub customer_id: String,

    /// Manager (MCC) customer ID used as login-customer-id header, if any
    pub login_customer_id: String,
}

impl GoogleAdsCredentials {
    /// True when every credential required for network probing is present.
    ///
    /// Gates all network activity in the diagnostics pipeline: the API key,
    /// client ID, client secret, refresh token and developer token must all
    /// be non-empty.
    #[must_use]
    pub fn has_all_credentials(&self) -> bool {
        !self.api_key.is_empty()
            && !self.client_id.is_empty()
            && !self.client_secret.is_empty()
            && !self.refresh_token.is_empty()
            && !self.developer_token.is_empty()
    }

    /// True when no credential at all has been configured.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.api_key.is_empty()
            && self.client_id.is_empty()
            && self.client_secret.is_empty()
            && self.refresh_token.is_empty()
            && self.developer_token.is_empty()
    }

    /// Per-field presence snapshot for diagnostic reports.
    #[must_use]
    pub fn presence(&self) -> CredentialPresence {
        CredentialPresence {
            api_key: !self.api_key.is_empty(),
            client_id: !self.client_id.is_empty(),
            client_secret: !self.client_secret.is_empty(),
            refresh_token: !self.refresh_token.is_empty(),
            developer_token: !self.developer_token.is_empty(),
            has_all_credentials: self.has_all_credentials(),
        }
    }
}

/// Boolean snapshot of which credentials are configured.
///
/// Embedded in every diagnostic report; field names are part of the wire
/// contract with the consuming UI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CredentialPresence {
    pub api_key: bool,
    pub client_id: bool,
    pub client_secret: bool,
    pub refresh_token: bool,
    pub developer_token: bool,
    pub has_all_credentials: bool,
}
