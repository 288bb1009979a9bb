//! Connection service orchestrator
//!
//! Ties the flow controller, token store and diagnostics into the surface
//! the embedding application consumes. Common-path failures come back as
//! structured [`ConnectOutcome`] values rather than errors, so callers
//! never need exception handling around the connect entry point.

use std::sync::Arc;

use adspilot_domain::{GoogleAdsCredentials, Result};
use serde::Serialize;
use tracing::info;

use crate::auth::{
    AuthFlowController, FlowPhase, OAuthClient, OAuthClientTrait, TokenRecord, TokenStore,
};
use crate::clock::{Clock, SystemClock};
use crate::diagnostics::{AdsApiProbe, ConnectionDiagnostics, DiagnosticReport, GoogleAdsProbe};
use crate::http::HttpClient;
use crate::session::{InMemorySessionStore, SessionStore};

/// How a connect attempt was resolved.
///
/// Serialized names are part of the wire contract with the consuming UI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectMethod {
    /// Valid tokens were already stored; no network round-trip
    StoredTokens,
    /// An OAuth callback was detected and exchanged
    Oauth2Callback,
    /// A new authorization flow was started; the embedder must navigate
    Oauth2Redirect,
    /// The attempt failed
    Oauth2Error,
}

impl ConnectMethod {
    /// Wire name of the method.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::StoredTokens => "stored_tokens",
            Self::Oauth2Callback => "oauth2_callback",
            Self::Oauth2Redirect => "oauth2_redirect",
            Self::Oauth2Error => "oauth2_error",
        }
    }
}

/// Outcome of a `connect_with_oauth2` call.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectOutcome {
    pub success: bool,
    pub method: ConnectMethod,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tokens: Option<TokenRecord>,
    /// Present on the redirect path; the URL the embedder must navigate to
    #[serde(skip_serializing_if = "Option::is_none")]
    pub authorization_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub timestamp: String,
}

/// Orchestrating entry point for the Google Ads connection.
///
/// One instance per application context; constructing several independent
/// instances (as tests do) is safe because all state lives in the injected
/// session store.
pub struct ConnectService {
    flow: Arc<AuthFlowController>,
    diagnostics: ConnectionDiagnostics,
    tokens: TokenStore,
    clock: Arc<dyn Clock>,
}

impl ConnectService {
    /// Create a service with production wiring: in-memory session storage,
    /// the system clock, and real HTTP transports against Google.
    ///
    /// # Errors
    /// Returns an error if the HTTP client cannot be constructed.
    pub fn new(credentials: GoogleAdsCredentials) -> Result<Self> {
        let http = HttpClient::new()?;
        let session: Arc<dyn SessionStore> = Arc::new(InMemorySessionStore::new());
        let oauth: Arc<dyn OAuthClientTrait> =
            Arc::new(OAuthClient::new(&credentials, http.clone()));
        let probe: Arc<dyn AdsApiProbe> = Arc::new(GoogleAdsProbe::new(http));
        Ok(Self::from_parts(credentials, session, oauth, probe, Arc::new(SystemClock)))
    }

    /// Create a service from explicit collaborators (dependency injection
    /// seam used by tests and embedders with custom transports).
    #[must_use]
    pub fn from_parts(
        credentials: GoogleAdsCredentials,
        session: Arc<dyn SessionStore>,
        oauth: Arc<dyn OAuthClientTrait>,
        probe: Arc<dyn AdsApiProbe>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let tokens = TokenStore::new(session.clone(), clock.clone());
        let flow = Arc::new(AuthFlowController::new(
            credentials.clone(),
            oauth,
            tokens.clone(),
            session,
        ));
        let diagnostics =
            ConnectionDiagnostics::new(credentials, flow.clone(), probe, clock.clone());

        Self { flow, diagnostics, tokens, clock }
    }

    /// Connect to Google Ads, resolving whichever path applies:
    ///
    /// 1. A detected OAuth callback is exchanged for tokens.
    /// 2. Otherwise, valid stored tokens short-circuit the flow with no
    ///    network call.
    /// 3. Otherwise, a new authorization flow is initiated and the
    ///    authorization URL returned for navigation.
    ///
    /// Failures come back as `success: false` outcomes with
    /// `method: oauth2_error`; this method does not return `Err`.
    pub async fn connect_with_oauth2(&self, current_url: &str) -> ConnectOutcome {
        match self.flow.detect_callback(current_url) {
            Ok(Some(callback)) => match self.flow.exchange_code(&callback.code).await {
                Ok(record) => {
                    info!("connected to Google Ads via OAuth2 callback");
                    self.outcome_success(
                        ConnectMethod::Oauth2Callback,
                        "Connected to Google Ads via OAuth2 callback",
                        Some(record),
                        None,
                    )
                }
                Err(err) => self.outcome_error(err.to_string()),
            },
            Err(err) => self.outcome_error(err.to_string()),
            Ok(None) => {
                if self.tokens.is_valid() {
                    info!("using stored OAuth2 tokens");
                    return self.outcome_success(
                        ConnectMethod::StoredTokens,
                        "Using stored OAuth2 tokens",
                        self.tokens.current(),
                        None,
                    );
                }

                match self.flow.initiate_flow(current_url) {
                    Ok(request) => self.outcome_success(
                        ConnectMethod::Oauth2Redirect,
                        "Redirecting to Google for authorization",
                        None,
                        Some(request.url),
                    ),
                    Err(err) => self.outcome_error(err.to_string()),
                }
            }
        }
    }

    /// Run connection diagnostics and produce a fresh report.
    pub async fn test_connection(&self) -> DiagnosticReport {
        self.diagnostics.run().await
    }

    /// True iff stored tokens exist and have not expired.
    #[must_use]
    pub fn are_tokens_valid(&self) -> bool {
        self.tokens.is_valid()
    }

    /// Current phase of the authorization flow.
    #[must_use]
    pub fn flow_phase(&self) -> FlowPhase {
        self.flow.phase()
    }

    /// The flow controller, for embedders that drive steps individually.
    #[must_use]
    pub fn flow(&self) -> &AuthFlowController {
        &self.flow
    }

    fn outcome_success(
        &self,
        method: ConnectMethod,
        message: &str,
        tokens: Option<TokenRecord>,
        authorization_url: Option<String>,
    ) -> ConnectOutcome {
        ConnectOutcome {
            success: true,
            method,
            message: message.to_string(),
            tokens,
            authorization_url,
            error: None,
            timestamp: self.clock.now().to_rfc3339(),
        }
    }

    fn outcome_error(&self, error: String) -> ConnectOutcome {
        ConnectOutcome {
            success: false,
            method: ConnectMethod::Oauth2Error,
            message: "Google Ads OAuth2 connection failed".to_string(),
            tokens: None,
            authorization_url: None,
            error: Some(error),
            timestamp: self.clock.now().to_rfc3339(),
        }
    }
}

#[cfg(test)]
mod tests {
    //! Unit tests for service.
    use super::*;
    use crate::testing::{MockAdsApiProbe, MockClock, MockOAuthClient};

    fn credentials() -> GoogleAdsCredentials {
        GoogleAdsCredentials {
            client_id: "client".to_string(),
            client_secret: "secret".to_string(),
            developer_token: "dev".to_string(),
            api_key: "key".to_string(),
            refresh_token: "refresh".to_string(),
            customer_id: "123".to_string(),
            login_customer_id: String::new(),
        }
    }

    fn service_with(
        credentials: GoogleAdsCredentials,
        oauth: MockOAuthClient,
        probe: MockAdsApiProbe,
    ) -> ConnectService {
        ConnectService::from_parts(
            credentials,
            Arc::new(InMemorySessionStore::new()),
            Arc::new(oauth),
            Arc::new(probe),
            Arc::new(MockClock::new()),
        )
    }

    /// Validates `ConnectService::connect_with_oauth2` behavior for the
    /// fresh start scenario.
    ///
    /// Assertions:
    /// - Ensures the first call starts a redirect with an authorization
    ///   URL and no tokens.
    #[tokio::test]
    async fn test_connect_starts_redirect() {
        let service =
            service_with(credentials(), MockOAuthClient::new(), MockAdsApiProbe::new());

        let outcome = service.connect_with_oauth2("http://localhost:3000/dashboard").await;

        assert!(outcome.success);
        assert_eq!(outcome.method, ConnectMethod::Oauth2Redirect);
        assert!(outcome
            .authorization_url
            .as_deref()
            .is_some_and(|u| u.starts_with("https://accounts.google.com/")));
        assert!(outcome.tokens.is_none());
        assert_eq!(service.flow_phase(), FlowPhase::AwaitingRedirect);
    }

    /// Validates `ConnectService::connect_with_oauth2` behavior for the
    /// callback round-trip scenario.
    ///
    /// Assertions:
    /// - Ensures the callback load exchanges the code and returns tokens.
    /// - Ensures a subsequent call uses the stored tokens with no new
    ///   exchange.
    #[tokio::test]
    async fn test_connect_callback_then_stored_tokens() {
        let oauth = MockOAuthClient::new();
        let service = service_with(credentials(), oauth.clone(), MockAdsApiProbe::new());

        let redirect = service.connect_with_oauth2("http://localhost:3000/dashboard").await;
        let auth_url = redirect.authorization_url.expect("authorization url");
        let state = auth_url
            .split("state=")
            .nth(1)
            .and_then(|s| s.split('&').next())
            .expect("state parameter");

        let callback_url =
            format!("http://localhost:3000/dashboard?code=the-code&state={state}");
        let connected = service.connect_with_oauth2(&callback_url).await;

        assert!(connected.success);
        assert_eq!(connected.method, ConnectMethod::Oauth2Callback);
        assert!(connected.tokens.is_some());
        assert_eq!(oauth.exchange_calls(), 1);
        assert!(service.are_tokens_valid());

        let again = service.connect_with_oauth2("http://localhost:3000/dashboard").await;
        assert!(again.success);
        assert_eq!(again.method, ConnectMethod::StoredTokens);
        assert_eq!(oauth.exchange_calls(), 1);
    }

    /// Validates `ConnectService::connect_with_oauth2` behavior for the
    /// missing credentials scenario.
    ///
    /// Assertions:
    /// - Ensures the outcome is a structured `oauth2_error`, not a panic
    ///   or an `Err`.
    #[tokio::test]
    async fn test_connect_without_client_id() {
        let mut creds = credentials();
        creds.client_id = String::new();
        let service = service_with(creds, MockOAuthClient::new(), MockAdsApiProbe::new());

        let outcome = service.connect_with_oauth2("http://localhost:3000/dashboard").await;

        assert!(!outcome.success);
        assert_eq!(outcome.method, ConnectMethod::Oauth2Error);
        assert!(outcome.error.is_some());
    }

    /// Validates `ConnectMethod` behavior for the wire name scenario.
    ///
    /// Assertions:
    /// - Confirms each method serializes to its exact wire string.
    #[test]
    fn test_method_wire_names() {
        let cases = [
            (ConnectMethod::StoredTokens, "stored_tokens"),
            (ConnectMethod::Oauth2Callback, "oauth2_callback"),
            (ConnectMethod::Oauth2Redirect, "oauth2_redirect"),
            (ConnectMethod::Oauth2Error, "oauth2_error"),
        ];
        for (method, expected) in cases {
            assert_eq!(method.as_str(), expected);
            let json = serde_json::to_string(&method).expect("serialize method");
            assert_eq!(json, format!("\"{expected}\""));
        }
    }

    /// Validates `ConnectOutcome` behavior for the serialization scenario.
    ///
    /// Assertions:
    /// - Ensures camelCase wire names and RFC 3339 timestamps.
    #[tokio::test]
    async fn test_outcome_serialization() {
        let service =
            service_with(credentials(), MockOAuthClient::new(), MockAdsApiProbe::new());
        let outcome = service.connect_with_oauth2("http://localhost:3000/dashboard").await;

        let json = serde_json::to_string(&outcome).expect("serialize outcome");
        assert!(json.contains("\"method\":\"oauth2_redirect\""));
        assert!(json.contains("\"authorizationUrl\""));
        assert!(json.contains("\"timestamp\""));
    }
}
