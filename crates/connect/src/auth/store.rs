//! Session-scoped token store
//!
//! Holds the current [`TokenRecord`] and answers validity queries. The
//! record is replaced whole on every store; readers never observe a
//! partially updated record.

use std::sync::Arc;

use adspilot_domain::constants::SESSION_KEY_TOKENS;
use adspilot_domain::{AdsPilotError, Result};
use chrono::Duration;
use tracing::{debug, warn};

use super::types::{TokenRecord, TokenResponse};
use crate::clock::Clock;
use crate::session::SessionStore;

/// Persists OAuth tokens for the current session and answers validity
/// queries.
///
/// Validity is `now < expires_at` with no clock-skew margin; callers that
/// want a safety margin use [`TokenStore::is_valid_with_margin`].
#[derive(Clone)]
pub struct TokenStore {
    session: Arc<dyn SessionStore>,
    clock: Arc<dyn Clock>,
}

impl TokenStore {
    /// Create a store over the given session storage and clock.
    #[must_use]
    pub fn new(session: Arc<dyn SessionStore>, clock: Arc<dyn Clock>) -> Self {
        Self { session, clock }
    }

    /// Persist the tokens from a successful exchange or refresh.
    ///
    /// Computes `expires_at = now + expires_in` and replaces any prior
    /// record in a single assignment. A refresh-grant response that omits
    /// the refresh token keeps the previously stored one.
    ///
    /// # Errors
    /// Returns `AdsPilotError::Serialization` if the record cannot be
    /// encoded for storage.
    pub fn store(&self, response: &TokenResponse) -> Result<TokenRecord> {
        let previous = self.current();

        let refresh_token = response
            .refresh_token
            .clone()
            .or_else(|| previous.as_ref().map(|p| p.refresh_token.clone()))
            .unwrap_or_default();

        let scope = response
            .scope
            .clone()
            .or_else(|| previous.map(|p| p.scope))
            .unwrap_or_default();

        let record = TokenRecord {
            access_token: response.access_token.clone(),
            refresh_token,
            expires_at: self.clock.now() + Duration::seconds(response.expires_in),
            scope,
        };

        let blob = serde_json::to_string(&record)
            .map_err(|e| AdsPilotError::Serialization(e.to_string()))?;
        self.session.set(SESSION_KEY_TOKENS, blob);

        debug!(expires_in = response.expires_in, "stored OAuth token record");

        Ok(record)
    }

    /// The stored record, or `None` if never set.
    ///
    /// A corrupt blob is treated as absent; the record is only ever
    /// written whole, so corruption means the session storage was
    /// tampered with externally.
    #[must_use]
    pub fn current(&self) -> Option<TokenRecord> {
        let blob = self.session.get(SESSION_KEY_TOKENS)?;
        match serde_json::from_str(&blob) {
            Ok(record) => Some(record),
            Err(e) => {
                warn!(error = %e, "discarding unreadable token record");
                None
            }
        }
    }

    /// True iff a record exists and has not yet expired (`now <
    /// expires_at`, no margin).
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.is_valid_with_margin(0)
    }

    /// True iff a record exists and `now < expires_at - margin`.
    ///
    /// A margin of 30s or so avoids presenting a token that will expire
    /// mid-request as valid.
    #[must_use]
    pub fn is_valid_with_margin(&self, margin_seconds: i64) -> bool {
        match self.current() {
            Some(record) => {
                self.clock.now() < record.expires_at - Duration::seconds(margin_seconds)
            }
            None => false,
        }
    }

    /// Remove the stored record.
    ///
    /// Used on flow failure so a record inconsistent with a failed
    /// negotiation is not retained.
    pub fn clear(&self) {
        self.session.remove(SESSION_KEY_TOKENS);
        debug!("cleared OAuth token record");
    }
}
