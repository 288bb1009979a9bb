//! Connection diagnostics
//!
//! Runs a fixed pipeline of independent checks against the Google Ads
//! setup — credential presence, token refresh, cross-origin reachability,
//! API endpoint reachability — short-circuiting on the first structurally
//! blocking failure, and classifies the aggregate into exactly one
//! [`ConnectionStatus`].
//!
//! The pipeline never returns an error: every probe failure is captured
//! into the report's `errors`/`warnings` and reflected in the status. A
//! cross-origin block in particular is an expected security boundary, not
//! an application error; it is downgraded to a warning and folds into the
//! `authenticated_cors_limited` success classification.

pub mod probe;

use std::sync::Arc;

use adspilot_domain::GoogleAdsCredentials;
use adspilot_domain::types::CredentialPresence;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

pub use probe::{AdsApiProbe, GoogleAdsProbe, ProbeFailure, ProbeFailureKind};

use crate::auth::{AuthFlowController, OAuthErrorCategory};
use crate::clock::Clock;

/// Universal fallback recommendation when API access is degraded.
const MANUAL_CLIENTS_RECOMMENDATION: &str =
    "Add clients manually by Customer ID while API access is unavailable";

/// Overall connection status.
///
/// A closed taxonomy; the serialized names are the wire contract the
/// consuming UI branches on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionStatus {
    /// No credential at all is configured
    NoCredentials,
    /// Some credentials present, but the probing set is incomplete
    CredentialsMissing,
    /// OAuth refresh failed, most likely an expired/revoked refresh token
    AuthFailed,
    /// OAuth refresh failed in a way that implicates the credentials
    CredentialsInvalid,
    /// OAuth works; direct API access is blocked cross-origin. The
    /// expected outcome in a browser runtime — treated as success.
    AuthenticatedCorsLimited,
    /// OAuth works and the API answered directly (unusual)
    FullyAccessible,
    /// Probe results did not match any expected combination
    UnknownState,
}

impl ConnectionStatus {
    /// Wire name of the status.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NoCredentials => "no_credentials",
            Self::CredentialsMissing => "credentials_missing",
            Self::AuthFailed => "auth_failed",
            Self::CredentialsInvalid => "credentials_invalid",
            Self::AuthenticatedCorsLimited => "authenticated_cors_limited",
            Self::FullyAccessible => "fully_accessible",
            Self::UnknownState => "unknown_state",
        }
    }

    /// True for the statuses that mean the connection is usable.
    #[must_use]
    pub fn is_connected(&self) -> bool {
        matches!(self, Self::AuthenticatedCorsLimited | Self::FullyAccessible)
    }
}

impl std::fmt::Display for ConnectionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of the token refresh probe.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenProbeResult {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_in: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scope: Option<String>,
}

/// Result of the cross-origin reachability probe.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CorsProbeResult {
    pub blocked: bool,
    pub message: String,
}

/// Result of the authenticated endpoint probe.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EndpointProbeResult {
    pub accessible: bool,
    /// Best-effort guess that the failure is cross-origin rather than a
    /// genuine outage
    #[serde(rename = "isCorsDue")]
    pub cors_suspected: bool,
    pub message: String,
}

/// Immutable snapshot produced by one diagnostics run.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiagnosticReport {
    pub credentials: CredentialPresence,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token_test: Option<TokenProbeResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cors_test: Option<CorsProbeResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub endpoint_test: Option<EndpointProbeResult>,
    pub connection_status: ConnectionStatus,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
    pub recommendations: Vec<String>,
}

impl DiagnosticReport {
    fn new(credentials: CredentialPresence) -> Self {
        Self {
            credentials,
            token_test: None,
            cors_test: None,
            endpoint_test: None,
            connection_status: ConnectionStatus::UnknownState,
            errors: Vec::new(),
            warnings: Vec::new(),
            recommendations: Vec::new(),
        }
    }
}

/// Classify the aggregate probe outcome.
///
/// The four flags are evaluated in precedence order: missing credentials
/// dominate, then a broken OAuth path, then the cross-origin/API access
/// combination.
#[must_use]
pub fn classify(
    credentials_valid: bool,
    oauth_working: bool,
    cors_blocked: bool,
    api_accessible: bool,
) -> ConnectionStatus {
    if !credentials_valid {
        return ConnectionStatus::NoCredentials;
    }
    if !oauth_working {
        return ConnectionStatus::CredentialsInvalid;
    }
    match (cors_blocked, api_accessible) {
        (true, false) => ConnectionStatus::AuthenticatedCorsLimited,
        (false, true) => ConnectionStatus::FullyAccessible,
        _ => ConnectionStatus::UnknownState,
    }
}

fn recommendations_for(status: ConnectionStatus) -> Vec<String> {
    match status {
        ConnectionStatus::NoCredentials | ConnectionStatus::CredentialsMissing => vec![
            "Add the missing Google Ads credentials to the environment configuration"
                .to_string(),
            MANUAL_CLIENTS_RECOMMENDATION.to_string(),
        ],
        ConnectionStatus::AuthFailed => vec![
            "Re-run the OAuth2 sign-in flow to obtain a fresh refresh token".to_string(),
            MANUAL_CLIENTS_RECOMMENDATION.to_string(),
        ],
        ConnectionStatus::CredentialsInvalid => vec![
            "Verify the OAuth client ID and client secret against the Google Cloud Console"
                .to_string(),
            "Confirm the developer token is approved for the Google Ads API".to_string(),
            MANUAL_CLIENTS_RECOMMENDATION.to_string(),
        ],
        ConnectionStatus::AuthenticatedCorsLimited => vec![
            "Route Google Ads API calls through a backend proxy; browsers cannot call the API directly"
                .to_string(),
        ],
        ConnectionStatus::FullyAccessible => Vec::new(),
        ConnectionStatus::UnknownState => vec![
            "Re-run connection diagnostics".to_string(),
            MANUAL_CLIENTS_RECOMMENDATION.to_string(),
        ],
    }
}

/// Runs the diagnostics pipeline.
///
/// Probes execute strictly sequentially: later probes depend on the
/// credential/token state established earlier, and a report is clearer
/// when a failure is attributable to a single stage.
pub struct ConnectionDiagnostics {
    credentials: GoogleAdsCredentials,
    flow: Arc<AuthFlowController>,
    probe: Arc<dyn AdsApiProbe>,
    clock: Arc<dyn Clock>,
}

impl ConnectionDiagnostics {
    /// Create a diagnostics runner over the given collaborators.
    #[must_use]
    pub fn new(
        credentials: GoogleAdsCredentials,
        flow: Arc<AuthFlowController>,
        probe: Arc<dyn AdsApiProbe>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self { credentials, flow, probe, clock }
    }

    /// Run the full pipeline and produce a fresh report.
    ///
    /// Never fails; every probe failure is folded into the report.
    pub async fn run(&self) -> DiagnosticReport {
        let mut report = DiagnosticReport::new(self.credentials.presence());

        // Stage 1: credential presence. Gates all network probing.
        if !report.credentials.has_all_credentials {
            report.connection_status = if self.credentials.is_empty() {
                ConnectionStatus::NoCredentials
            } else {
                ConnectionStatus::CredentialsMissing
            };
            report.errors.push(self.describe_missing_credentials());
            report.recommendations = recommendations_for(report.connection_status);
            info!(status = %report.connection_status, "diagnostics stopped at credential check");
            return report;
        }

        // Stage 2: token refresh probe.
        let access_token = match self.flow.refresh_tokens().await {
            Ok(record) => {
                debug!("token refresh probe succeeded");
                report.token_test = Some(TokenProbeResult {
                    success: true,
                    expires_in: Some(record.seconds_until_expiry(self.clock.now())),
                    scope: Some(record.scope.clone()),
                });
                record.access_token
            }
            Err(err) => {
                let category =
                    err.oauth_category().unwrap_or(OAuthErrorCategory::Unknown);
                report.token_test =
                    Some(TokenProbeResult { success: false, expires_in: None, scope: None });
                report
                    .errors
                    .push(format!("token refresh failed ({}): {err}", category.as_str()));
                report.connection_status = if category.implies_invalid_credentials() {
                    ConnectionStatus::CredentialsInvalid
                } else {
                    ConnectionStatus::AuthFailed
                };
                report.recommendations = recommendations_for(report.connection_status);
                info!(status = %report.connection_status, "diagnostics stopped at token probe");
                return report;
            }
        };

        // Stage 3: cross-origin probe. Never escalates above a warning.
        let cors_blocked = match self.probe.head_reachability().await {
            Ok(()) => {
                report.cors_test = Some(CorsProbeResult {
                    blocked: false,
                    message: "API base URL answered from this runtime".to_string(),
                });
                false
            }
            Err(failure) => {
                let blocked = failure.suggests_cross_origin();
                report.warnings.push(format!("reachability probe: {}", failure.message));
                report.cors_test =
                    Some(CorsProbeResult { blocked, message: failure.message });
                blocked
            }
        };

        // Stage 4: authenticated endpoint probe.
        let api_accessible = match self
            .probe
            .list_accessible_customers(&access_token, &self.credentials.developer_token)
            .await
        {
            Ok(()) => {
                report.endpoint_test = Some(EndpointProbeResult {
                    accessible: true,
                    cors_suspected: false,
                    message: "listAccessibleCustomers answered".to_string(),
                });
                true
            }
            Err(failure) => {
                let cors_suspected = failure.suggests_cross_origin();
                if cors_suspected {
                    report.warnings.push(format!("endpoint probe: {}", failure.message));
                } else {
                    report.errors.push(format!("endpoint probe: {}", failure.message));
                }
                report.endpoint_test = Some(EndpointProbeResult {
                    accessible: false,
                    cors_suspected,
                    message: failure.message,
                });
                false
            }
        };

        report.connection_status = classify(true, true, cors_blocked, api_accessible);
        if report.connection_status == ConnectionStatus::FullyAccessible {
            report.warnings.push(
                "direct Google Ads API access from this runtime is unusual; expected a cross-origin block"
                    .to_string(),
            );
        }
        report.recommendations = recommendations_for(report.connection_status);

        info!(status = %report.connection_status, "connection diagnostics complete");
        report
    }

    fn describe_missing_credentials(&self) -> String {
        let mut missing = Vec::new();
        if self.credentials.api_key.is_empty() {
            missing.push("api_key");
        }
        if self.credentials.client_id.is_empty() {
            missing.push("client_id");
        }
        if self.credentials.client_secret.is_empty() {
            missing.push("client_secret");
        }
        if self.credentials.refresh_token.is_empty() {
            missing.push("refresh_token");
        }
        if self.credentials.developer_token.is_empty() {
            missing.push("developer_token");
        }
        format!("missing Google Ads credentials: {}", missing.join(", "))
    }
}

#[cfg(test)]
mod tests {
    //! Unit tests for diagnostics.
    use super::*;

    /// Validates `classify` behavior for the classification table scenario.
    ///
    /// Assertions:
    /// - Confirms each row of the status table yields exactly the
    ///   specified status.
    #[test]
    fn test_classification_table() {
        // credentials_valid, oauth_working, cors_blocked, api_accessible
        assert_eq!(
            classify(true, true, true, false),
            ConnectionStatus::AuthenticatedCorsLimited
        );
        assert_eq!(classify(true, true, false, true), ConnectionStatus::FullyAccessible);
        assert_eq!(classify(true, false, true, false), ConnectionStatus::CredentialsInvalid);
        assert_eq!(classify(true, false, false, true), ConnectionStatus::CredentialsInvalid);
        assert_eq!(classify(false, true, true, false), ConnectionStatus::NoCredentials);
        assert_eq!(classify(false, false, false, false), ConnectionStatus::NoCredentials);
        assert_eq!(classify(true, true, true, true), ConnectionStatus::UnknownState);
        assert_eq!(classify(true, true, false, false), ConnectionStatus::UnknownState);
    }

    /// Validates `ConnectionStatus` behavior for the wire name scenario.
    ///
    /// Assertions:
    /// - Confirms every status serializes to its exact wire string.
    #[test]
    fn test_status_wire_names() {
        let cases = [
            (ConnectionStatus::NoCredentials, "no_credentials"),
            (ConnectionStatus::CredentialsMissing, "credentials_missing"),
            (ConnectionStatus::AuthFailed, "auth_failed"),
            (ConnectionStatus::CredentialsInvalid, "credentials_invalid"),
            (ConnectionStatus::AuthenticatedCorsLimited, "authenticated_cors_limited"),
            (ConnectionStatus::FullyAccessible, "fully_accessible"),
            (ConnectionStatus::UnknownState, "unknown_state"),
        ];

        for (status, expected) in cases {
            assert_eq!(status.as_str(), expected);
            let json = serde_json::to_string(&status).expect("serialize status");
            assert_eq!(json, format!("\"{expected}\""));
        }
    }

    /// Validates `ConnectionStatus::is_connected` behavior for the success
    /// classification scenario.
    ///
    /// Assertions:
    /// - Ensures the cross-origin-limited outcome counts as connected.
    /// - Ensures failure statuses do not.
    #[test]
    fn test_is_connected() {
        assert!(ConnectionStatus::AuthenticatedCorsLimited.is_connected());
        assert!(ConnectionStatus::FullyAccessible.is_connected());
        assert!(!ConnectionStatus::AuthFailed.is_connected());
        assert!(!ConnectionStatus::UnknownState.is_connected());
    }

    /// Validates `recommendations_for` behavior for the actionable fallback
    /// scenario.
    ///
    /// Assertions:
    /// - Ensures every non-authenticated status carries at least one
    ///   actionable recommendation.
    /// - Ensures the manual-clients fallback appears for degraded access.
    #[test]
    fn test_recommendations_presence() {
        for status in [
            ConnectionStatus::NoCredentials,
            ConnectionStatus::CredentialsMissing,
            ConnectionStatus::AuthFailed,
            ConnectionStatus::CredentialsInvalid,
            ConnectionStatus::UnknownState,
        ] {
            let recs = recommendations_for(status);
            assert!(!recs.is_empty(), "{status} must carry a recommendation");
            assert!(recs.iter().any(|r| r.contains("Customer ID")));
        }
    }

    /// Validates `DiagnosticReport` behavior for the wire format scenario.
    ///
    /// Assertions:
    /// - Ensures field names serialize camelCase, including `isCorsDue`.
    #[test]
    fn test_report_wire_format() {
        let credentials = GoogleAdsCredentials::default();
        let mut report = DiagnosticReport::new(credentials.presence());
        report.connection_status = ConnectionStatus::AuthenticatedCorsLimited;
        report.token_test =
            Some(TokenProbeResult { success: true, expires_in: Some(3599), scope: None });
        report.endpoint_test = Some(EndpointProbeResult {
            accessible: false,
            cors_suspected: true,
            message: "Network Error".to_string(),
        });

        let json = serde_json::to_string(&report).expect("serialize report");
        assert!(json.contains("\"connectionStatus\":\"authenticated_cors_limited\""));
        assert!(json.contains("\"tokenTest\""));
        assert!(json.contains("\"expiresIn\":3599"));
        assert!(json.contains("\"isCorsDue\":true"));
        assert!(json.contains("\"hasAllCredentials\":false"));
    }
}
