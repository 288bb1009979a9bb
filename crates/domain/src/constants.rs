//! Domain constants
//!
//! Centralized location for endpoints, environment variable names, session
//! storage keys and timing defaults used by the connection layer.

// Google OAuth2 endpoints
pub const GOOGLE_AUTH_ENDPOINT: &str = "https://accounts.google.com/o/oauth2/v2/auth";
pub const GOOGLE_TOKEN_ENDPOINT: &str = "https://oauth2.googleapis.com/token";

// Google Ads API
pub const ADS_API_BASE_URL: &str = "https://googleads.googleapis.com/v14";
pub const ADS_API_SCOPE: &str = "https://www.googleapis.com/auth/adwords";
pub const LIST_ACCESSIBLE_CUSTOMERS_PATH: &str = "/customers:listAccessibleCustomers";

// HTTP transport defaults
pub const HTTP_TIMEOUT_SECS: u64 = 30;
pub const ENDPOINT_PROBE_TIMEOUT_SECS: u64 = 5;
pub const HTTP_MAX_ATTEMPTS: usize = 3;
pub const HTTP_BACKOFF_STEP_MS: u64 = 1000;

// Anti-CSRF state parameter
pub const STATE_TOKEN_BYTES: usize = 32;

// Session storage keys
pub const SESSION_KEY_TOKENS: &str = "adspilot.google_ads.tokens";
pub const SESSION_KEY_AUTH_STATE: &str = "adspilot.google_ads.auth_state";
pub const SESSION_KEY_RETURN_TO: &str = "adspilot.google_ads.return_to";

// Environment variables for credential loading
pub const ENV_CLIENT_ID: &str = "ADSPILOT_GOOGLE_ADS_CLIENT_ID";
pub const ENV_CLIENT_SECRET: &str = "ADSPILOT_GOOGLE_ADS_CLIENT_SECRET";
pub const ENV_DEVELOPER_TOKEN: &str = "ADSPILOT_GOOGLE_ADS_DEVELOPER_TOKEN";
pub const ENV_API_KEY: &str = "ADSPILOT_GOOGLE_ADS_API_KEY";
pub const ENV_REFRESH_TOKEN: &str = "ADSPILOT_GOOGLE_ADS_REFRESH_TOKEN";
pub const ENV_CUSTOMER_ID: &str = "ADSPILOT_GOOGLE_ADS_CUSTOMER_ID";
pub const ENV_LOGIN_CUSTOMER_ID: &str = "ADSPILOT_GOOGLE_ADS_LOGIN_CUSTOMER_ID";
