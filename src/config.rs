//! Client configuration parsed from environment variables.

use std::path::PathBuf;

use crate::services::oauth::GoogleOAuthConfig;

pub const DEFAULT_API_BASE_URL: &str = "http://localhost:8000";
pub const DEFAULT_GOOGLE_REDIRECT_URI: &str = "http://localhost:5173/auth/google/callback";
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 15;
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 5;
const DEFAULT_SESSION_FILE: &str = ".medcare/session.json";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestTimeouts {
    pub request_secs: u64,
    pub connect_secs: u64,
}

impl Default for RequestTimeouts {
    fn default() -> Self {
        Self { request_secs: DEFAULT_REQUEST_TIMEOUT_SECS, connect_secs: DEFAULT_CONNECT_TIMEOUT_SECS }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    pub api_base_url: String,
    /// `None` disables Google sign-in.
    pub google: Option<GoogleOAuthConfig>,
    pub timeouts: RequestTimeouts,
    pub session_file: PathBuf,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_owned(),
            google: None,
            timeouts: RequestTimeouts::default(),
            session_file: default_session_file(None),
        }
    }
}

impl ClientConfig {
    /// Build typed client config from environment variables.
    ///
    /// All variables are optional:
    /// - `MEDCARE_API_BASE_URL`: default `http://localhost:8000`
    /// - `GOOGLE_CLIENT_ID`: enables Google sign-in when present
    /// - `GOOGLE_REDIRECT_URI`: default `http://localhost:5173/auth/google/callback`
    /// - `MEDCARE_REQUEST_TIMEOUT_SECS`: default 15
    /// - `MEDCARE_CONNECT_TIMEOUT_SECS`: default 5
    /// - `MEDCARE_SESSION_FILE`: default `$HOME/.medcare/session.json`
    #[must_use]
    pub fn from_env() -> Self {
        let api_base_url = normalize_base_url(
            &std::env::var("MEDCARE_API_BASE_URL").unwrap_or_else(|_| DEFAULT_API_BASE_URL.to_owned()),
        );

        let google = env_non_empty("GOOGLE_CLIENT_ID").map(|client_id| GoogleOAuthConfig {
            client_id,
            redirect_uri: env_non_empty("GOOGLE_REDIRECT_URI")
                .unwrap_or_else(|| DEFAULT_GOOGLE_REDIRECT_URI.to_owned()),
        });

        let timeouts = RequestTimeouts {
            request_secs: env_parse_u64("MEDCARE_REQUEST_TIMEOUT_SECS", DEFAULT_REQUEST_TIMEOUT_SECS),
            connect_secs: env_parse_u64("MEDCARE_CONNECT_TIMEOUT_SECS", DEFAULT_CONNECT_TIMEOUT_SECS),
        };

        let session_file = env_non_empty("MEDCARE_SESSION_FILE")
            .map_or_else(|| default_session_file(std::env::var_os("HOME").map(PathBuf::from)), PathBuf::from);

        Self { api_base_url, google, timeouts, session_file }
    }
}

pub(crate) fn normalize_base_url(raw: &str) -> String {
    let trimmed = raw.trim().trim_end_matches('/');
    if trimmed.is_empty() { DEFAULT_API_BASE_URL.to_owned() } else { trimmed.to_owned() }
}

fn default_session_file(home: Option<PathBuf>) -> PathBuf {
    home.unwrap_or_default().join(DEFAULT_SESSION_FILE)
}

fn env_non_empty(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_owned())
        .filter(|v| !v.is_empty())
}

fn env_parse_u64(key: &str, default: u64) -> u64 {
    std::env::var(key)
        .ok()
        .and_then(|v| v.trim().parse::<u64>().ok())
        .filter(|v| *v > 0)
        .unwrap_or(default)
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
