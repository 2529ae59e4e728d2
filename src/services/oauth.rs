//! Google OAuth helpers: authorization URL and the exchanged-code cache.
//!
//! ARCHITECTURE
//! ============
//! An authorization code is single use upstream. The callback page can be
//! reloaded before the app navigates away, which replays the same code, so
//! every successful exchange is remembered here and a replayed code reuses
//! the token instead of hitting `/auth/google` again.

use std::collections::{HashMap, VecDeque};

pub const GOOGLE_AUTHORIZE_URL: &str = "https://accounts.google.com/o/oauth2/v2/auth";
pub const GOOGLE_SCOPES: &str = "openid email profile";
const DEFAULT_CODE_CACHE_CAPACITY: usize = 32;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GoogleOAuthConfig {
    pub client_id: String,
    pub redirect_uri: String,
}

impl GoogleOAuthConfig {
    /// Provider URL the user is sent to; it redirects back with `?code=...`.
    #[must_use]
    pub fn authorize_url(&self) -> String {
        let params = [
            ("client_id", self.client_id.as_str()),
            ("redirect_uri", self.redirect_uri.as_str()),
            ("response_type", "code"),
            ("scope", GOOGLE_SCOPES),
            ("access_type", "online"),
            ("prompt", "select_account"),
        ];
        match reqwest::Url::parse_with_params(GOOGLE_AUTHORIZE_URL, &params) {
            Ok(url) => url.into(),
            // Unreachable while GOOGLE_AUTHORIZE_URL is a valid absolute URL.
            Err(e) => {
                tracing::error!(error = %e, "google authorize url failed to build");
                GOOGLE_AUTHORIZE_URL.to_owned()
            }
        }
    }
}

/// Bounded code -> token map; the oldest code is evicted first.
#[derive(Debug)]
pub struct OAuthCodeCache {
    tokens: HashMap<String, String>,
    order: VecDeque<String>,
    capacity: usize,
}

impl Default for OAuthCodeCache {
    fn default() -> Self {
        Self::new(DEFAULT_CODE_CACHE_CAPACITY)
    }
}

impl OAuthCodeCache {
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self { tokens: HashMap::with_capacity(capacity), order: VecDeque::with_capacity(capacity), capacity }
    }

    #[must_use]
    pub fn get(&self, code: &str) -> Option<&str> {
        self.tokens.get(code).map(String::as_str)
    }

    pub fn insert(&mut self, code: &str, token: &str) {
        if self.tokens.insert(code.to_owned(), token.to_owned()).is_some() {
            return;
        }
        self.order.push_back(code.to_owned());
        while self.order.len() > self.capacity {
            if let Some(oldest) = self.order.pop_front() {
                self.tokens.remove(&oldest);
            }
        }
    }

    pub fn remove(&mut self, code: &str) {
        if self.tokens.remove(code).is_some() {
            self.order.retain(|c| c != code);
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }
}

#[cfg(test)]
#[path = "oauth_test.rs"]
mod tests;
