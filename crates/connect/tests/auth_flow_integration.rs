//! Integration tests for the OAuth2 authorization-code flow
//!
//! Exercises the flow controller and service against a mock token
//! endpoint, down to the exact form-encoded wire bodies Google would see.

use std::sync::Arc;

use adspilot_connect::auth::{AuthFlowController, FlowError, OAuthClient, TokenStore};
use adspilot_connect::clock::SystemClock;
use adspilot_connect::http::HttpClient;
use adspilot_connect::service::{ConnectMethod, ConnectService};
use adspilot_connect::session::{InMemorySessionStore, SessionStore};
use adspilot_domain::GoogleAdsCredentials;
use wiremock::matchers::{body_string_contains, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn credentials() -> GoogleAdsCredentials {
    GoogleAdsCredentials {
        client_id: "it-client-id".to_string(),
        client_secret: "it-client-secret".to_string(),
        developer_token: "it-dev-token".to_string(),
        api_key: "it-api-key".to_string(),
        refresh_token: "it-refresh-token".to_string(),
        customer_id: "123-456-7890".to_string(),
        login_customer_id: String::new(),
    }
}

fn token_response_body() -> serde_json::Value {
    serde_json::json!({
        "access_token": "it-access-token",
        "refresh_token": "it-new-refresh-token",
        "expires_in": 3599,
        "scope": "https://www.googleapis.com/auth/adwords",
        "token_type": "Bearer"
    })
}

fn controller_against(server_uri: &str) -> (AuthFlowController, Arc<InMemorySessionStore>) {
    let session = Arc::new(InMemorySessionStore::new());
    let http = HttpClient::new().expect("http client");
    let oauth = OAuthClient::new(&credentials(), http)
        .with_token_endpoint(format!("{server_uri}/token"));
    let tokens = TokenStore::new(session.clone(), Arc::new(SystemClock));
    let controller =
        AuthFlowController::new(credentials(), Arc::new(oauth), tokens, session.clone());
    (controller, session)
}

/// Validates the full initiate → callback → exchange round-trip against a
/// mock token endpoint.
///
/// The exchange must send the exact redirect URI persisted at initiate
/// time — Google validates byte equality — along with the code and client
/// credentials, form-encoded.
///
/// # Test Steps
/// 1. Initiate the flow from a dashboard URL with a query string
/// 2. Verify the derived redirect URI is origin + path only
/// 3. Simulate the callback load with the matching state
/// 4. Exchange the code against a mock endpoint that asserts on the body
/// 5. Verify the stored tokens match the endpoint's response
#[tokio::test]
async fn test_exchange_sends_exact_redirect_uri() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/token"))
        .and(body_string_contains("grant_type=authorization_code"))
        .and(body_string_contains("code=it-auth-code"))
        .and(body_string_contains("client_id=it-client-id"))
        .and(body_string_contains("client_secret=it-client-secret"))
        .and(body_string_contains(
            "redirect_uri=http%3A%2F%2Flocalhost%3A3000%2Fdashboard",
        ))
        .respond_with(ResponseTemplate::new(200).set_body_json(token_response_body()))
        .expect(1)
        .mount(&server)
        .await;

    let (controller, _session) = controller_against(&server.uri());

    let request = controller
        .initiate_flow("http://localhost:3000/dashboard?tab=clients")
        .expect("flow should start");
    assert_eq!(request.redirect_uri, "http://localhost:3000/dashboard");

    let callback = controller
        .detect_callback(&format!(
            "http://localhost:3000/dashboard?code=it-auth-code&state={}",
            request.state
        ))
        .expect("callback detection")
        .expect("callback present");

    let record = controller.exchange_code(&callback.code).await.expect("exchange succeeds");

    assert_eq!(record.access_token, "it-access-token");
    assert_eq!(record.refresh_token, "it-new-refresh-token");
    assert_eq!(record.scope, "https://www.googleapis.com/auth/adwords");
    assert!(controller.token_store().is_valid());
}

/// Validates the `invalid_grant` rejection path.
///
/// A used or expired authorization code is terminal: the error message
/// tells the user to restart, the auth state is consumed, and a second
/// exchange attempt cannot reuse the stale redirect URI.
///
/// # Test Steps
/// 1. Initiate and complete the callback detection
/// 2. Exchange against an endpoint answering HTTP 400 `invalid_grant`
/// 3. Verify the remediation text and that exactly one POST was made
/// 4. Verify a second exchange fails with no pending flow
#[tokio::test]
async fn test_exchange_invalid_grant_is_terminal() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/token"))
        .respond_with(ResponseTemplate::new(400).set_body_json(serde_json::json!({
            "error": "invalid_grant",
            "error_description": "Code was already redeemed."
        })))
        .expect(1)
        .mount(&server)
        .await;

    let (controller, _session) = controller_against(&server.uri());

    let request =
        controller.initiate_flow("http://localhost:3000/dashboard").expect("flow starts");
    controller
        .detect_callback(&format!(
            "http://localhost:3000/dashboard?code=used-code&state={}",
            request.state
        ))
        .expect("callback detection");

    let result = controller.exchange_code("used-code").await;
    match result {
        Err(FlowError::Exchange(message)) => {
            assert!(message.contains("expired or already used"), "got: {message}");
        }
        other => panic!("expected exchange failure, got {other:?}"),
    }

    let second = controller.exchange_code("used-code").await;
    assert!(matches!(second, Err(FlowError::NoPendingFlow)));

    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 1, "token exchange must never be retried");
}

/// Validates the refresh-token grant wire format.
///
/// # Test Steps
/// 1. Refresh against a mock endpoint asserting `grant_type=refresh_token`
///    and the pre-provisioned refresh token
/// 2. Verify the refreshed record is stored and valid
#[tokio::test]
async fn test_refresh_token_grant() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/token"))
        .and(body_string_contains("grant_type=refresh_token"))
        .and(body_string_contains("refresh_token=it-refresh-token"))
        .and(body_string_contains("client_id=it-client-id"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "access_token": "refreshed-access-token",
            "expires_in": 3599,
            "scope": "https://www.googleapis.com/auth/adwords",
            "token_type": "Bearer"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let (controller, _session) = controller_against(&server.uri());

    let record = controller.refresh_tokens().await.expect("refresh succeeds");

    assert_eq!(record.access_token, "refreshed-access-token");
    assert!(controller.token_store().is_valid());
}

/// Validates that a failing refresh is never retried.
///
/// # Test Steps
/// 1. Refresh against an endpoint answering HTTP 500
/// 2. Verify exactly one POST reached the server
#[tokio::test]
async fn test_refresh_is_never_retried() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/token"))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&server)
        .await;

    let (controller, _session) = controller_against(&server.uri());

    let result = controller.refresh_tokens().await;
    assert!(result.is_err());

    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 1);
}

/// Validates the service-level connect orchestration end to end.
///
/// # Test Steps
/// 1. First connect call starts a redirect and hands back the
///    authorization URL
/// 2. The callback load exchanges the code via the mock endpoint
/// 3. A third call short-circuits on stored tokens with no network call
#[tokio::test]
async fn test_service_connect_round_trip() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(token_response_body()))
        .expect(1)
        .mount(&server)
        .await;

    let session: Arc<dyn SessionStore> = Arc::new(InMemorySessionStore::new());
    let http = HttpClient::new().expect("http client");
    let oauth = OAuthClient::new(&credentials(), http.clone())
        .with_token_endpoint(format!("{}/token", server.uri()));
    let probe = adspilot_connect::diagnostics::GoogleAdsProbe::new(http)
        .with_base_url(server.uri());
    let service = ConnectService::from_parts(
        credentials(),
        session,
        Arc::new(oauth),
        Arc::new(probe),
        Arc::new(SystemClock),
    );

    let redirect = service.connect_with_oauth2("http://localhost:3000/dashboard").await;
    assert!(redirect.success);
    assert_eq!(redirect.method, ConnectMethod::Oauth2Redirect);
    let auth_url = redirect.authorization_url.expect("authorization url");
    let state = auth_url
        .split("state=")
        .nth(1)
        .and_then(|s| s.split('&').next())
        .expect("state parameter");

    let connected = service
        .connect_with_oauth2(&format!(
            "http://localhost:3000/dashboard?code=it-auth-code&state={state}"
        ))
        .await;
    assert!(connected.success);
    assert_eq!(connected.method, ConnectMethod::Oauth2Callback);
    assert!(connected.tokens.is_some());
    assert!(service.are_tokens_valid());

    let again = service.connect_with_oauth2("http://localhost:3000/dashboard").await;
    assert!(again.success);
    assert_eq!(again.method, ConnectMethod::StoredTokens);

    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 1, "stored-token path must not touch the network");
}
