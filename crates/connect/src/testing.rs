//! Test support
//!
//! Deterministic mock implementations of the crate's seams, used by the
//! unit and integration tests. Mocks record their calls so tests can
//! assert on exactly what the code under test did — including that it did
//! nothing at all.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};

use crate::auth::{OAuthClientError, OAuthClientTrait, OAuthErrorResponse, TokenResponse};
use crate::clock::Clock;
use crate::diagnostics::{AdsApiProbe, ProbeFailure};

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    match mutex.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

/// Controllable clock for expiry tests.
pub struct MockClock {
    now: Mutex<DateTime<Utc>>,
}

impl MockClock {
    /// Create a clock pinned to the current instant.
    #[must_use]
    pub fn new() -> Self {
        Self { now: Mutex::new(Utc::now()) }
    }

    /// Advance the clock by whole seconds.
    pub fn advance_secs(&self, seconds: i64) {
        let mut guard = lock(&self.now);
        *guard += Duration::seconds(seconds);
    }
}

impl Default for MockClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for MockClock {
    fn now(&self) -> DateTime<Utc> {
        *lock(&self.now)
    }
}

fn default_token_response() -> TokenResponse {
    TokenResponse {
        access_token: "mock-access-token".to_string(),
        refresh_token: Some("mock-refresh-token".to_string()),
        expires_in: 3600,
        scope: Some("https://www.googleapis.com/auth/adwords".to_string()),
        token_type: Some("Bearer".to_string()),
    }
}

/// Mock token endpoint client with call recording.
#[derive(Clone)]
pub struct MockOAuthClient {
    exchange_calls: Arc<AtomicUsize>,
    refresh_calls: Arc<AtomicUsize>,
    exchange_failure: Arc<Mutex<Option<(u16, OAuthErrorResponse)>>>,
    refresh_failure: Arc<Mutex<Option<(u16, OAuthErrorResponse)>>>,
    refresh_response: Arc<Mutex<Option<TokenResponse>>>,
    last_exchange_redirect_uri: Arc<Mutex<Option<String>>>,
    last_refresh_token: Arc<Mutex<Option<String>>>,
}

impl MockOAuthClient {
    /// Create a mock that succeeds with a default token response.
    #[must_use]
    pub fn new() -> Self {
        Self {
            exchange_calls: Arc::new(AtomicUsize::new(0)),
            refresh_calls: Arc::new(AtomicUsize::new(0)),
            exchange_failure: Arc::new(Mutex::new(None)),
            refresh_failure: Arc::new(Mutex::new(None)),
            refresh_response: Arc::new(Mutex::new(None)),
            last_exchange_redirect_uri: Arc::new(Mutex::new(None)),
            last_refresh_token: Arc::new(Mutex::new(None)),
        }
    }

    /// Make every code exchange fail with the given server error.
    pub fn fail_exchange_with(&self, status: u16, body: OAuthErrorResponse) {
        *lock(&self.exchange_failure) = Some((status, body));
    }

    /// Make every refresh fail with the given server error.
    pub fn fail_refresh_with(&self, status: u16, body: OAuthErrorResponse) {
        *lock(&self.refresh_failure) = Some((status, body));
    }

    /// Configure the response returned by successful refreshes.
    pub fn set_refresh_response(&self, response: TokenResponse) {
        *lock(&self.refresh_response) = Some(response);
    }

    /// Number of exchange calls made.
    #[must_use]
    pub fn exchange_calls(&self) -> usize {
        self.exchange_calls.load(Ordering::SeqCst)
    }

    /// Number of refresh calls made.
    #[must_use]
    pub fn refresh_calls(&self) -> usize {
        self.refresh_calls.load(Ordering::SeqCst)
    }

    /// The redirect URI supplied to the most recent exchange.
    #[must_use]
    pub fn last_exchange_redirect_uri(&self) -> Option<String> {
        lock(&self.last_exchange_redirect_uri).clone()
    }

    /// The refresh token supplied to the most recent refresh.
    #[must_use]
    pub fn last_refresh_token(&self) -> Option<String> {
        lock(&self.last_refresh_token).clone()
    }
}

impl Default for MockOAuthClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl OAuthClientTrait for MockOAuthClient {
    async fn exchange_code(
        &self,
        _code: &str,
        redirect_uri: &str,
    ) -> Result<TokenResponse, OAuthClientError> {
        self.exchange_calls.fetch_add(1, Ordering::SeqCst);
        *lock(&self.last_exchange_redirect_uri) = Some(redirect_uri.to_string());

        if let Some((status, body)) = lock(&self.exchange_failure).clone() {
            return Err(OAuthClientError::Server { status, body });
        }
        Ok(default_token_response())
    }

    async fn refresh_access_token(
        &self,
        refresh_token: &str,
    ) -> Result<TokenResponse, OAuthClientError> {
        self.refresh_calls.fetch_add(1, Ordering::SeqCst);
        *lock(&self.last_refresh_token) = Some(refresh_token.to_string());

        if refresh_token.is_empty() {
            return Err(OAuthClientError::NoRefreshToken);
        }
        if let Some((status, body)) = lock(&self.refresh_failure).clone() {
            return Err(OAuthClientError::Server { status, body });
        }
        Ok(lock(&self.refresh_response).clone().unwrap_or_else(default_token_response))
    }
}

/// Mock Ads API probe with call recording.
#[derive(Clone)]
pub struct MockAdsApiProbe {
    head_calls: Arc<AtomicUsize>,
    endpoint_calls: Arc<AtomicUsize>,
    head_failure: Arc<Mutex<Option<ProbeFailure>>>,
    endpoint_failure: Arc<Mutex<Option<ProbeFailure>>>,
}

impl MockAdsApiProbe {
    /// Create a probe where both checks succeed.
    #[must_use]
    pub fn new() -> Self {
        Self {
            head_calls: Arc::new(AtomicUsize::new(0)),
            endpoint_calls: Arc::new(AtomicUsize::new(0)),
            head_failure: Arc::new(Mutex::new(None)),
            endpoint_failure: Arc::new(Mutex::new(None)),
        }
    }

    /// Make the reachability check fail.
    pub fn fail_head_with(&self, failure: ProbeFailure) {
        *lock(&self.head_failure) = Some(failure);
    }

    /// Make the endpoint check fail.
    pub fn fail_endpoint_with(&self, failure: ProbeFailure) {
        *lock(&self.endpoint_failure) = Some(failure);
    }

    /// Number of reachability checks made.
    #[must_use]
    pub fn head_calls(&self) -> usize {
        self.head_calls.load(Ordering::SeqCst)
    }

    /// Number of endpoint checks made.
    #[must_use]
    pub fn endpoint_calls(&self) -> usize {
        self.endpoint_calls.load(Ordering::SeqCst)
    }
}

impl Default for MockAdsApiProbe {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AdsApiProbe for MockAdsApiProbe {
    async fn head_reachability(&self) -> Result<(), ProbeFailure> {
        self.head_calls.fetch_add(1, Ordering::SeqCst);
        match lock(&self.head_failure).clone() {
            Some(failure) => Err(failure),
            None => Ok(()),
        }
    }

    async fn list_accessible_customers(
        &self,
        _access_token: &str,
        _developer_token: &str,
    ) -> Result<(), ProbeFailure> {
        self.endpoint_calls.fetch_add(1, Ordering::SeqCst);
        match lock(&self.endpoint_failure).clone() {
            Some(failure) => Err(failure),
            None => Ok(()),
        }
    }
}
