//! # AdsPilot Connect
//!
//! Google Ads connection layer: OAuth2 authorization-code flow,
//! session-scoped token storage, and connection diagnostics.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────┐
//! │  ConnectService  │  orchestrating entry point
//! └────────┬─────────┘
//!          │
//!          ├──► AuthFlowController    (redirect state machine)
//!          │         ├──► OAuthClient (token endpoint grants)
//!          │         └──► TokenStore  (session-scoped persistence)
//!          │
//!          └──► ConnectionDiagnostics (probe pipeline + classification)
//!                    └──► AdsApiProbe (API reachability checks)
//! ```
//!
//! The embedding application calls
//! [`ConnectService::connect_with_oauth2`] on every page load with the
//! current URL — the service resolves whichever path applies (callback
//! exchange, stored tokens, or starting a new flow) — and
//! [`ConnectService::test_connection`] to produce a
//! [`diagnostics::DiagnosticReport`] for the settings screen.
//!
//! # Usage Example
//!
//! ```no_run
//! use adspilot_connect::config;
//! use adspilot_connect::service::ConnectService;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let credentials = config::load()?;
//!     let service = ConnectService::new(credentials)?;
//!
//!     let outcome = service.connect_with_oauth2("http://localhost:3000/dashboard").await;
//!     if let Some(url) = &outcome.authorization_url {
//!         println!("Open this URL in your browser: {url}");
//!     }
//!
//!     let report = service.test_connection().await;
//!     println!("Connection status: {}", report.connection_status);
//!
//!     Ok(())
//! }
//! ```

#![forbid(unsafe_code)]
#![warn(rust_2018_idioms)]
#![warn(clippy::all, clippy::perf, clippy::complexity, clippy::suspicious)]

pub mod auth;
pub mod clock;
pub mod config;
pub mod diagnostics;
pub mod http;
pub mod service;
pub mod session;
pub mod testing;

// Re-export commonly used types for convenience
pub use auth::{
    AuthFlowController, AuthorizationRequest, CallbackOutcome, FlowError, FlowPhase,
    OAuthClient, OAuthClientError, OAuthClientTrait, OAuthErrorCategory, TokenRecord,
    TokenStore,
};
pub use clock::{Clock, SystemClock};
pub use diagnostics::{
    classify, AdsApiProbe, ConnectionDiagnostics, ConnectionStatus, DiagnosticReport,
    GoogleAdsProbe,
};
pub use http::HttpClient;
pub use service::{ConnectMethod, ConnectOutcome, ConnectService};
pub use session::{InMemorySessionStore, SessionStore};
