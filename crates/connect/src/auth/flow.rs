//! OAuth2 authorization-code flow controller
//!
//! Drives the state machine
//! `Idle → AwaitingRedirect → CallbackReceived → Exchanging →
//! {Authenticated, Failed}`.
//!
//! The redirect to Google is a true suspension point: the embedder
//! navigates to the authorization URL and this process loses control
//! until the next page load, where [`AuthFlowController::detect_callback`]
//! resumes the flow from the session-persisted [`AuthState`]. Every exit
//! from the flow — success or failure — consumes the persisted state so a
//! stale `code`/`state` pair can never be replayed.

use std::sync::{Arc, RwLock};

use adspilot_domain::constants::{
    ADS_API_SCOPE, GOOGLE_AUTH_ENDPOINT, SESSION_KEY_AUTH_STATE, SESSION_KEY_RETURN_TO,
};
use adspilot_domain::{AdsPilotError, GoogleAdsCredentials};
use thiserror::Error;
use tracing::{info, warn};
use url::Url;

use super::client::{OAuthClientError, OAuthClientTrait};
use super::state::{generate_state, validate_state};
use super::store::TokenStore;
use super::types::{AuthState, TokenRecord};
use crate::session::SessionStore;

/// Query parameters stripped from the visible URL after a callback, so the
/// authorization code and state never linger in the address bar or
/// history.
const OAUTH_CALLBACK_PARAMS: [&str; 7] =
    ["code", "state", "error", "error_description", "scope", "authuser", "prompt"];

/// Phase of the authorization-code flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlowPhase {
    Idle,
    AwaitingRedirect,
    CallbackReceived,
    Exchanging,
    Authenticated,
    Failed,
}

/// Error type for flow operations
#[derive(Debug, Error)]
pub enum FlowError {
    /// Required credentials absent; never retried — the caller must supply
    /// configuration first
    #[error("Google Ads OAuth2 is not configured: {0}")]
    CredentialsMissing(String),

    /// The callback URL carried neither a code nor an error
    #[error("authorization callback did not include a code parameter")]
    NoAuthorizationCode,

    /// State validation failed: possible CSRF or stale callback
    #[error("state parameter mismatch (possible CSRF or stale callback)")]
    StateMismatch { expected: String, received: String },

    /// The user declined the consent screen
    #[error("authorization denied: {0}")]
    AuthorizationDenied(String),

    /// Google rejected the client identity during authorization
    #[error("invalid client: {0}")]
    InvalidClient(String),

    /// The client is not authorized for this grant flow
    #[error("unauthorized client: {0}")]
    UnauthorizedClient(String),

    /// Any other provider-reported authorization error
    #[error("authorization failed: {0}")]
    Provider(String),

    /// The token exchange was rejected; terminal for the current code
    #[error("token exchange failed: {0}")]
    Exchange(String),

    /// No flow is in progress; exchange called without a pending
    /// authorization state
    #[error("no authorization flow in progress")]
    NoPendingFlow,

    /// The supplied page URL could not be parsed
    #[error("invalid page URL: {0}")]
    InvalidUrl(String),

    /// Token endpoint failure surfaced unmapped (refresh path)
    #[error(transparent)]
    OAuth(#[from] OAuthClientError),

    /// Storage or serialization failure
    #[error(transparent)]
    Domain(#[from] AdsPilotError),
}

impl FlowError {
    /// OAuth failure category, when the underlying error came from the
    /// token endpoint.
    #[must_use]
    pub fn oauth_category(&self) -> Option<super::client::OAuthErrorCategory> {
        match self {
            Self::OAuth(e) => Some(e.category()),
            _ => None,
        }
    }
}

/// Authorization request handed to the embedder for navigation.
#[derive(Debug, Clone)]
pub struct AuthorizationRequest {
    /// Full authorization URL to navigate to
    pub url: String,
    /// Anti-CSRF state baked into the URL
    pub state: String,
    /// Redirect URI Google will send the user back to
    pub redirect_uri: String,
}

/// A detected OAuth callback.
#[derive(Debug, Clone)]
pub struct CallbackOutcome {
    /// Authorization code to exchange
    pub code: String,
    /// The page URL with OAuth parameters stripped; the embedder should
    /// replace the visible URL/history entry with this
    pub sanitized_url: String,
}

/// Drives the OAuth2 authorization-code flow.
///
/// Single writer of [`AuthState`] and the token store; readers
/// (diagnostics, the embedding service) only observe.
pub struct AuthFlowController {
    credentials: GoogleAdsCredentials,
    oauth: Arc<dyn OAuthClientTrait>,
    tokens: TokenStore,
    session: Arc<dyn SessionStore>,
    phase: RwLock<FlowPhase>,
}

impl AuthFlowController {
    /// Create a controller over the given collaborators.
    #[must_use]
    pub fn new(
        credentials: GoogleAdsCredentials,
        oauth: Arc<dyn OAuthClientTrait>,
        tokens: TokenStore,
        session: Arc<dyn SessionStore>,
    ) -> Self {
        Self { credentials, oauth, tokens, session, phase: RwLock::new(FlowPhase::Idle) }
    }

    /// Current phase of the flow.
    #[must_use]
    pub fn phase(&self) -> FlowPhase {
        match self.phase.read() {
            Ok(guard) => *guard,
            Err(poisoned) => *poisoned.into_inner(),
        }
    }

    fn set_phase(&self, next: FlowPhase) {
        match self.phase.write() {
            Ok(mut guard) => *guard = next,
            Err(poisoned) => *poisoned.into_inner() = next,
        }
    }

    /// Token store shared with this controller.
    #[must_use]
    pub fn token_store(&self) -> &TokenStore {
        &self.tokens
    }

    /// Begin the authorization-code flow.
    ///
    /// Generates the anti-CSRF state, derives the redirect URI from the
    /// current page URL (origin + path, no query or fragment — so the
    /// identical value can be reconstructed after the round-trip),
    /// persists the in-flight [`AuthState`] plus the pre-redirect URL, and
    /// returns the authorization URL for the embedder to navigate to.
    /// Control does not return to this flow until `detect_callback` runs
    /// on the next load.
    ///
    /// # Errors
    /// `FlowError::CredentialsMissing` when no client ID is configured
    /// (no state is written); `FlowError::InvalidUrl` when the page URL
    /// cannot be parsed.
    pub fn initiate_flow(&self, current_url: &str) -> Result<AuthorizationRequest, FlowError> {
        if self.credentials.client_id.is_empty() {
            return Err(FlowError::CredentialsMissing("client_id is not set".to_string()));
        }

        let page = Url::parse(current_url).map_err(|e| FlowError::InvalidUrl(e.to_string()))?;
        let redirect_uri = origin_and_path(&page);
        let state = generate_state();

        self.save_auth_state(&AuthState {
            state: state.clone(),
            redirect_uri: redirect_uri.clone(),
            in_progress: true,
        })?;
        self.session.set(SESSION_KEY_RETURN_TO, current_url.to_string());

        let url = self.build_authorization_url(&state, &redirect_uri);

        self.set_phase(FlowPhase::AwaitingRedirect);
        info!(redirect_uri = %redirect_uri, "initiated OAuth2 authorization flow");

        Ok(AuthorizationRequest { url, state, redirect_uri })
    }

    /// Inspect a page load for an OAuth callback. Invoked unconditionally
    /// on every load.
    ///
    /// Returns `Ok(None)` when no flow is in progress — an unrelated page
    /// load carrying a `code` parameter is not a callback and mutates
    /// nothing.
    ///
    /// # Errors
    /// Provider-reported errors, a missing code, and a state mismatch all
    /// abort the flow: the persisted [`AuthState`] is consumed and the
    /// mapped error returned. None of these are retried; the caller must
    /// restart from `initiate_flow`.
    pub fn detect_callback(
        &self,
        current_url: &str,
    ) -> Result<Option<CallbackOutcome>, FlowError> {
        let Some(auth_state) = self.load_auth_state() else {
            return Ok(None);
        };
        if !auth_state.in_progress {
            return Ok(None);
        }

        let page = Url::parse(current_url).map_err(|e| FlowError::InvalidUrl(e.to_string()))?;
        let query = |name: &str| {
            page.query_pairs().find(|(k, _)| k == name).map(|(_, v)| v.into_owned())
        };

        if let Some(error) = query("error") {
            self.consume_auth_state();
            self.set_phase(FlowPhase::Failed);
            warn!(error = %error, "authorization server returned an error");
            return Err(map_callback_error(&error, query("error_description")));
        }

        let Some(code) = query("code") else {
            self.consume_auth_state();
            self.set_phase(FlowPhase::Failed);
            return Err(FlowError::NoAuthorizationCode);
        };

        let received_state = query("state").unwrap_or_default();
        if !validate_state(&auth_state.state, &received_state) {
            self.consume_auth_state();
            self.set_phase(FlowPhase::Failed);
            warn!("state parameter mismatch on OAuth callback");
            return Err(FlowError::StateMismatch {
                expected: auth_state.state,
                received: received_state,
            });
        }

        self.set_phase(FlowPhase::CallbackReceived);
        info!("OAuth2 callback detected and state validated");

        Ok(Some(CallbackOutcome { code, sanitized_url: sanitize_callback_url(&page) }))
    }

    /// Exchange the authorization code for tokens and persist them.
    ///
    /// Uses the redirect URI persisted at `initiate_flow` time,
    /// byte-for-byte — Google rejects any difference, down to a trailing
    /// slash. The persisted [`AuthState`] is consumed whether the
    /// exchange succeeds or fails, so a retry with a stale redirect URI
    /// is impossible.
    ///
    /// # Errors
    /// `FlowError::NoPendingFlow` when no authorization state exists;
    /// `FlowError::Exchange` with remediation text when the token
    /// endpoint rejects the grant.
    pub async fn exchange_code(&self, code: &str) -> Result<TokenRecord, FlowError> {
        let Some(auth_state) = self.load_auth_state() else {
            return Err(FlowError::NoPendingFlow);
        };

        self.set_phase(FlowPhase::Exchanging);

        match self.oauth.exchange_code(code, &auth_state.redirect_uri).await {
            Ok(response) => match self.tokens.store(&response) {
                Ok(record) => {
                    self.consume_auth_state();
                    self.set_phase(FlowPhase::Authenticated);
                    info!("OAuth2 flow completed; tokens stored");
                    Ok(record)
                }
                Err(err) => {
                    self.consume_auth_state();
                    self.set_phase(FlowPhase::Failed);
                    Err(err.into())
                }
            },
            Err(err) => {
                self.consume_auth_state();
                self.set_phase(FlowPhase::Failed);
                warn!(error = %err, "token exchange failed");
                Err(FlowError::Exchange(describe_exchange_failure(&err)))
            }
        }
    }

    /// Refresh the access token with a refresh-token grant, bypassing the
    /// redirect flow.
    ///
    /// Prefers the refresh token from the stored record, falling back to
    /// the pre-provisioned credential. The resulting tokens replace the
    /// stored record. Never retried automatically.
    ///
    /// # Errors
    /// `OAuthClientError::NoRefreshToken` (wrapped) when neither source
    /// has a refresh token; otherwise the token endpoint failure.
    pub async fn refresh_tokens(&self) -> Result<TokenRecord, FlowError> {
        let refresh_token = self
            .tokens
            .current()
            .map(|r| r.refresh_token)
            .filter(|t| !t.is_empty())
            .unwrap_or_else(|| self.credentials.refresh_token.clone());

        let response = self.oauth.refresh_access_token(&refresh_token).await?;
        let record = self.tokens.store(&response)?;
        Ok(record)
    }

    /// The page URL captured before the redirect, consumed on read.
    ///
    /// The embedder may navigate back to it after the callback completes.
    #[must_use]
    pub fn take_return_to(&self) -> Option<String> {
        let url = self.session.get(SESSION_KEY_RETURN_TO)?;
        self.session.remove(SESSION_KEY_RETURN_TO);
        Some(url)
    }

    fn build_authorization_url(&self, state: &str, redirect_uri: &str) -> String {
        let params = [
            ("client_id", self.credentials.client_id.as_str()),
            ("redirect_uri", redirect_uri),
            ("scope", ADS_API_SCOPE),
            ("response_type", "code"),
            ("access_type", "offline"),
            ("prompt", "consent"),
            ("state", state),
            ("include_granted_scopes", "true"),
        ];

        let query = params
            .iter()
            .map(|(k, v)| format!("{k}={}", urlencoding::encode(v)))
            .collect::<Vec<_>>()
            .join("&");

        format!("{GOOGLE_AUTH_ENDPOINT}?{query}")
    }

    fn load_auth_state(&self) -> Option<AuthState> {
        let blob = self.session.get(SESSION_KEY_AUTH_STATE)?;
        match serde_json::from_str(&blob) {
            Ok(state) => Some(state),
            Err(e) => {
                warn!(error = %e, "discarding unreadable auth state");
                None
            }
        }
    }

    fn save_auth_state(&self, state: &AuthState) -> Result<(), FlowError> {
        let blob = serde_json::to_string(state)
            .map_err(|e| AdsPilotError::Serialization(e.to_string()))?;
        self.session.set(SESSION_KEY_AUTH_STATE, blob);
        Ok(())
    }

    fn consume_auth_state(&self) {
        self.session.remove(SESSION_KEY_AUTH_STATE);
    }
}

/// Origin + path of a URL, query and fragment stripped.
fn origin_and_path(url: &Url) -> String {
    let mut stripped = url.clone();
    stripped.set_query(None);
    stripped.set_fragment(None);
    stripped.to_string()
}

/// Rebuild the page URL without OAuth callback parameters.
fn sanitize_callback_url(url: &Url) -> String {
    let retained: Vec<(String, String)> = url
        .query_pairs()
        .filter(|(k, _)| !OAUTH_CALLBACK_PARAMS.contains(&k.as_ref()))
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();

    let mut clean = url.clone();
    clean.set_query(None);
    if !retained.is_empty() {
        let mut pairs = clean.query_pairs_mut();
        for (k, v) in &retained {
            pairs.append_pair(k, v);
        }
    }
    clean.to_string()
}

fn map_callback_error(error: &str, description: Option<String>) -> FlowError {
    match error {
        "access_denied" => FlowError::AuthorizationDenied(
            "the user must grant permission to connect Google Ads".to_string(),
        ),
        "invalid_client" => {
            FlowError::InvalidClient("check the OAuth client ID configuration".to_string())
        }
        "unauthorized_client" => FlowError::UnauthorizedClient(
            "the application is not authorized for this flow".to_string(),
        ),
        other => FlowError::Provider(match description {
            Some(desc) => format!("{other}: {desc}"),
            None => other.to_string(),
        }),
    }
}

fn describe_exchange_failure(err: &OAuthClientError) -> String {
    match err {
        OAuthClientError::Server { status, body } => match body.error.as_str() {
            "invalid_grant" => {
                "authorization code expired or already used; restart the sign-in flow"
                    .to_string()
            }
            "invalid_client" => {
                "client rejected; check the OAuth client ID and client secret".to_string()
            }
            "redirect_uri_mismatch" => {
                "redirect URI must match the Cloud Console configuration exactly".to_string()
            }
            _ => format!(
                "{status}: {} - {}",
                body.error,
                body.error_description.clone().unwrap_or_default()
            ),
        },
        other => other.to_string(),
    }
}
