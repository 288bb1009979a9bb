//! OAuth 2.0 authorization-code flow for Google Ads
//!
//! This module owns the full authentication lifecycle for a Google Ads
//! connection:
//!
//! - **[`types`]**: token records, wire-format responses, in-flight state
//! - **[`state`]**: anti-CSRF state generation and validation
//! - **[`store`]**: session-scoped token persistence and validity
//! - **[`client`]**: token endpoint grants (code exchange, refresh)
//! - **[`flow`]**: the redirect state machine tying it all together
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────┐
//! │  AuthFlowController  │  redirect state machine
//! └──────────┬───────────┘
//!            │
//!            ├──► OAuthClient      (token endpoint grants)
//!            ├──► TokenStore       (session-scoped persistence)
//!            │         │
//!            │         └──► SessionStore  (pluggable storage)
//!            └──► state utilities  (anti-CSRF token)
//! ```
//!
//! The redirect to Google is a process-boundary suspension: the flow
//! persists its state, the embedder navigates away, and
//! `detect_callback` resumes from persisted state on the next load.

pub mod client;
pub mod flow;
pub mod state;
pub mod store;
pub mod types;

// Re-export commonly used types and functions
pub use client::{OAuthClient, OAuthClientError, OAuthClientTrait, OAuthErrorCategory};
pub use flow::{
    AuthFlowController, AuthorizationRequest, CallbackOutcome, FlowError, FlowPhase,
};
pub use state::{generate_state, validate_state};
pub use store::TokenStore;
pub use types::{AuthState, OAuthErrorResponse, TokenRecord, TokenResponse};
