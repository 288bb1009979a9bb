//! Credential loader
//!
//! Loads Google Ads credentials from environment variables or files.
//!
//! ## Loading Strategy
//! 1. Loads a `.env` file into the process environment if one exists
//! 2. Reads the `ADSPILOT_GOOGLE_ADS_*` environment variables
//! 3. If no variable is set, probes standard paths for a config file
//! 4. Supports JSON and TOML formats
//!
//! Missing credentials are not a load error: an empty field is a
//! legitimate state the diagnostics pipeline reports on. Only unreadable
//! or malformed files fail the load.
//!
//! ## Environment Variables
//! - `ADSPILOT_GOOGLE_ADS_CLIENT_ID`: OAuth2 client ID
//! - `ADSPILOT_GOOGLE_ADS_CLIENT_SECRET`: OAuth2 client secret
//! - `ADSPILOT_GOOGLE_ADS_DEVELOPER_TOKEN`: Ads API developer token
//! - `ADSPILOT_GOOGLE_ADS_API_KEY`: API key for auxiliary calls
//! - `ADSPILOT_GOOGLE_ADS_REFRESH_TOKEN`: pre-provisioned refresh token
//! - `ADSPILOT_GOOGLE_ADS_CUSTOMER_ID`: default customer ID
//! - `ADSPILOT_GOOGLE_ADS_LOGIN_CUSTOMER_ID`: manager (MCC) customer ID

use std::path::{Path, PathBuf};

use adspilot_domain::constants::{
    ENV_API_KEY, ENV_CLIENT_ID, ENV_CLIENT_SECRET, ENV_CUSTOMER_ID, ENV_DEVELOPER_TOKEN,
    ENV_LOGIN_CUSTOMER_ID, ENV_REFRESH_TOKEN,
};
use adspilot_domain::{AdsPilotError, GoogleAdsCredentials, Result};

/// Load credentials with automatic fallback strategy.
///
/// Reads the environment first (after loading `.env` if present); if no
/// credential variable is set at all, falls back to probing for a config
/// file.
///
/// # Errors
/// Returns `AdsPilotError::Config` if a config file is found but cannot
/// be read or parsed.
pub fn load() -> Result<GoogleAdsCredentials> {
    dotenvy::dotenv().ok();

    let credentials = load_from_env();
    if !credentials.is_empty() {
        tracing::info!("Google Ads credentials loaded from environment variables");
        return Ok(credentials);
    }

    match probe_config_paths() {
        Some(path) => load_from_file(Some(path)),
        None => {
            tracing::debug!("no credential environment variables or config file found");
            Ok(credentials)
        }
    }
}

/// Load credentials from environment variables.
///
/// Unset variables yield empty fields.
#[must_use]
pub fn load_from_env() -> GoogleAdsCredentials {
    GoogleAdsCredentials {
        client_id: env_or_default(ENV_CLIENT_ID),
        client_secret: env_or_default(ENV_CLIENT_SECRET),
        developer_token: env_or_default(ENV_DEVELOPER_TOKEN),
        api_key: env_or_default(ENV_API_KEY),
        refresh_token: env_or_default(ENV_REFRESH_TOKEN),
        customer_id: env_or_default(ENV_CUSTOMER_ID),
        login_customer_id: env_or_default(ENV_LOGIN_CUSTOMER_ID),
    }
}

/// Load credentials from a file.
///
/// If `path` is `None`, probes standard locations. Format is detected by
/// file extension (`.json` or `.toml`).
///
/// # Errors
/// Returns `AdsPilotError::Config` if the file is missing, unreadable, or
/// malformed.
pub fn load_from_file(path: Option<PathBuf>) -> Result<GoogleAdsCredentials> {
    let config_path = match path {
        Some(p) => {
            if !p.exists() {
                return Err(AdsPilotError::Config(format!(
                    "config file not found: {}",
                    p.display()
                )));
            }
            p
        }
        None => probe_config_paths().ok_or_else(|| {
            AdsPilotError::Config("no config file found in any standard location".to_string())
        })?,
    };

    tracing::info!(path = %config_path.display(), "loading Google Ads credentials from file");

    let contents = std::fs::read_to_string(&config_path)
        .map_err(|e| AdsPilotError::Config(format!("failed to read config file: {e}")))?;

    parse_credentials(&contents, &config_path)
}

/// Parse credentials from string content; format detected by extension.
fn parse_credentials(contents: &str, path: &Path) -> Result<GoogleAdsCredentials> {
    let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("json");

    match extension {
        "toml" => toml::from_str(contents)
            .map_err(|e| AdsPilotError::Config(format!("invalid TOML format: {e}"))),
        "json" => serde_json::from_str(contents)
            .map_err(|e| AdsPilotError::Config(format!("invalid JSON format: {e}"))),
        other => Err(AdsPilotError::Config(format!("unsupported config format: {other}"))),
    }
}

/// Probe standard paths for a credentials file.
///
/// Searches the working directory and up to two parents, then the
/// executable's directory, for `adspilot.{json,toml}` and
/// `config.{json,toml}`. Returns the first file that exists.
#[must_use]
pub fn probe_config_paths() -> Option<PathBuf> {
    let names = ["adspilot.json", "adspilot.toml", "config.json", "config.toml"];
    let mut candidates = Vec::new();

    if let Ok(cwd) = std::env::current_dir() {
        for prefix in ["", "../", "../../"] {
            for name in names {
                candidates.push(cwd.join(format!("{prefix}{name}")));
            }
        }
    }

    if let Ok(exe_path) = std::env::current_exe() {
        if let Some(exe_dir) = exe_path.parent() {
            for name in names {
                candidates.push(exe_dir.join(name));
            }
        }
    }

    candidates.into_iter().find(|path| path.exists())
}

fn env_or_default(key: &str) -> String {
    std::env::var(key).unwrap_or_default()
}
