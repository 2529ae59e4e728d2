//! Session store: the single owner of "who is logged in".
//!
//! DESIGN
//! ======
//! `SessionStore` is a cheap cloneable handle around shared state. The
//! current [`Session`] lives in a `tokio::sync::watch` channel so pages and
//! the route guard can either read a snapshot or await the next change.
//! Every transition that touches the token or the user writes durable
//! storage first and memory second, so a storage failure never leaves memory
//! claiming credentials that a restart would not see.
//!
//! RE-ENTRANCY
//! ===========
//! - `initialize_auth` holds an async mutex acquired with `try_lock`; a
//!   second call while the first is validating returns
//!   [`InitOutcome::AlreadyRunning`] without touching the backend.
//! - `process_google_auth` claims `is_loading` with a single check-and-set.
//!   If any auth operation is in flight the call is a no-op.
//! - Exchanged Google codes are remembered in an [`OAuthCodeCache`]; a
//!   replayed code reuses its token instead of being exchanged twice.
//!
//! TIMEOUTS
//! ========
//! Every backend call goes through `SessionStore::call`, which bounds it
//! with the configured request timeout. An elapsed timeout is reported as
//! [`ApiError::Timeout`] and takes the same failure path as any other error.

use std::future::Future;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::watch;

use super::session::{AuthPhase, Session, needs_profile_update};
use super::storage::{self, Hydration, KeyValueStore, StorageError};
use crate::config::{ClientConfig, DEFAULT_REQUEST_TIMEOUT_SECS};
use crate::net::api::AuthApi;
use crate::net::types::{ApiError, GoogleProfileRequest, RegisterRequest, User};
use crate::services::oauth::{GoogleOAuthConfig, OAuthCodeCache};

pub const SESSION_EXPIRED_MESSAGE: &str = "Session expired or token invalid";
pub const LOGIN_FAILED_MESSAGE: &str = "Login failed. Please check your credentials.";
pub const REGISTRATION_FAILED_MESSAGE: &str = "Registration failed. Please try again.";
pub const GOOGLE_FAILED_MESSAGE: &str = "Google sign-in failed. Please try again.";
pub const PROFILE_COMPLETION_FAILED_MESSAGE: &str = "Could not complete the profile. Please try again.";

// =============================================================================
// ERRORS
// =============================================================================

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// A backend call failed; `message` is what the session's `error` shows.
    #[error("{message}")]
    Failed {
        message: String,
        #[source]
        source: ApiError,
    },
    #[error("session storage failed: {0}")]
    Storage(#[from] StorageError),
    #[error("Google sign-in is not configured")]
    OAuthNotConfigured,
    #[error("authorization code is missing")]
    MissingAuthorizationCode,
    #[error("not signed in")]
    NotAuthenticated,
}

impl AuthError {
    /// User-facing text for this failure.
    #[must_use]
    pub fn message(&self) -> String {
        self.to_string()
    }

    #[must_use]
    pub fn api_error(&self) -> Option<&ApiError> {
        match self {
            Self::Failed { source, .. } => Some(source),
            _ => None,
        }
    }
}

/// How `initialize_auth` settled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InitOutcome {
    /// Nothing usable was stored.
    Anonymous,
    /// Stored credentials were confirmed and the user refreshed.
    Verified,
    /// Stored credentials were rejected; the session was cleared.
    Expired,
    /// Another initialization is validating; nothing was done.
    AlreadyRunning,
    /// The session changed while validating (logout or a new sign-in); the
    /// backend answer was discarded.
    Superseded,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreOptions {
    /// `None` disables Google sign-in.
    pub google: Option<GoogleOAuthConfig>,
    pub request_timeout: Duration,
}

impl Default for StoreOptions {
    fn default() -> Self {
        Self { google: None, request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS) }
    }
}

impl StoreOptions {
    #[must_use]
    pub fn from_config(config: &ClientConfig) -> Self {
        Self {
            google: config.google.clone(),
            request_timeout: Duration::from_secs(config.timeouts.request_secs),
        }
    }
}

// =============================================================================
// STORE
// =============================================================================

struct Inner {
    api: Arc<dyn AuthApi>,
    storage: Arc<dyn KeyValueStore>,
    state: watch::Sender<Session>,
    google: Option<GoogleOAuthConfig>,
    oauth_codes: Mutex<OAuthCodeCache>,
    init_gate: tokio::sync::Mutex<()>,
    request_timeout: Duration,
}

#[derive(Clone)]
pub struct SessionStore {
    inner: Arc<Inner>,
}

impl SessionStore {
    /// Build an empty store. Call [`initialize_auth`](Self::initialize_auth)
    /// to pick up credentials from a previous run.
    #[must_use]
    pub fn new(api: Arc<dyn AuthApi>, storage: Arc<dyn KeyValueStore>, options: StoreOptions) -> Self {
        let (state, _) = watch::channel(Session::default());
        Self {
            inner: Arc::new(Inner {
                api,
                storage,
                state,
                google: options.google,
                oauth_codes: Mutex::new(OAuthCodeCache::default()),
                init_gate: tokio::sync::Mutex::new(()),
                request_timeout: options.request_timeout,
            }),
        }
    }

    /// Current snapshot.
    #[must_use]
    pub fn session(&self) -> Session {
        self.inner.state.borrow().clone()
    }

    /// Receiver that observes every session change.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<Session> {
        self.inner.state.subscribe()
    }

    /// Backend client shared with the services layer.
    #[must_use]
    pub fn api(&self) -> &dyn AuthApi {
        self.inner.api.as_ref()
    }

    /// Run a backend call under the request timeout.
    pub(crate) async fn call<T, F>(&self, request: F) -> Result<T, ApiError>
    where
        F: Future<Output = Result<T, ApiError>>,
    {
        tokio::time::timeout(self.inner.request_timeout, request).await.unwrap_or(Err(ApiError::Timeout))
    }

    // -------------------------------------------------------------------------
    // initialization
    // -------------------------------------------------------------------------

    /// Hydrate from durable storage, then confirm the token with the backend.
    ///
    /// The session is authenticated (phase `Hydrated`) as soon as valid
    /// credentials are read, before the backend answers.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::Storage`] if storage cannot be cleared or
    /// written. A rejected token is not an error; it yields
    /// [`InitOutcome::Expired`]. If the session is replaced or cleared while
    /// the backend is answering, nothing is written and the result is
    /// [`InitOutcome::Superseded`].
    pub async fn initialize_auth(&self) -> Result<InitOutcome, AuthError> {
        let Ok(_gate) = self.inner.init_gate.try_lock() else {
            tracing::debug!("session initialization already running");
            return Ok(InitOutcome::AlreadyRunning);
        };

        match storage::load_credentials(self.inner.storage.as_ref()) {
            Hydration::Empty => {
                self.inner.api.set_auth_token(None);
                self.update(|s| {
                    s.clear_credentials();
                    s.set_loading(false);
                    s.set_error(None);
                });
                Ok(InitOutcome::Anonymous)
            }
            Hydration::Malformed => {
                tracing::warn!("stored session is malformed; clearing it");
                self.reset(None)?;
                Ok(InitOutcome::Anonymous)
            }
            Hydration::Valid { token, user } => {
                tracing::info!(user_id = user.id, "session hydrated from storage");
                self.inner.api.set_auth_token(Some(&token));
                let hydrated = token.clone();
                self.update(|s| {
                    s.authenticate(token, user, AuthPhase::Hydrated);
                    s.set_loading(true);
                    s.set_error(None);
                });

                let validated = self.call(self.inner.api.current_user()).await;
                if self.session().token() != Some(hydrated.as_str()) {
                    tracing::info!("session changed during validation; discarding result");
                    return Ok(InitOutcome::Superseded);
                }

                match validated {
                    Ok(fresh) => {
                        if let Err(e) = storage::save_user(self.inner.storage.as_ref(), &fresh) {
                            self.reset_quietly(Some(SESSION_EXPIRED_MESSAGE.to_owned()));
                            return Err(e.into());
                        }
                        tracing::info!(user_id = fresh.id, "stored session verified");
                        self.update(|s| {
                            s.replace_user(fresh);
                            s.mark_verified();
                            s.set_loading(false);
                            s.set_error(None);
                        });
                        Ok(InitOutcome::Verified)
                    }
                    Err(e) => {
                        tracing::warn!(error = %e, "stored session rejected by backend");
                        self.reset(Some(SESSION_EXPIRED_MESSAGE.to_owned()))?;
                        Ok(InitOutcome::Expired)
                    }
                }
            }
        }
    }

    // -------------------------------------------------------------------------
    // password auth
    // -------------------------------------------------------------------------

    /// Exchange credentials for a token, then fetch the user it belongs to.
    ///
    /// # Errors
    ///
    /// On any failure the session and storage are cleared, the session
    /// `error` is set, and the same message is returned in
    /// [`AuthError::Failed`].
    pub async fn login(&self, email: &str, password: &str) -> Result<User, AuthError> {
        self.begin();
        let outcome = async {
            let issued = self.call(self.inner.api.login(email, password)).await?;
            let user = self.fetch_identity(&issued.access_token).await?;
            Ok::<_, ApiError>((issued.access_token, user))
        }
        .await;

        match outcome {
            Ok((token, user)) => {
                tracing::info!(user_id = user.id, "login succeeded");
                self.commit(token, user)
            }
            Err(e) => {
                tracing::warn!(error = %e, "login failed");
                Err(self.fail(e, LOGIN_FAILED_MESSAGE))
            }
        }
    }

    /// Create an account. Does not sign the caller in; the new account must
    /// verify its email first.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::Failed`] with the backend detail; the session
    /// `error` carries the same text and credentials are left alone.
    pub async fn register_user(&self, request: &RegisterRequest) -> Result<User, AuthError> {
        self.begin();
        match self.call(self.inner.api.register(request)).await {
            Ok(user) => {
                tracing::info!(user_id = user.id, role = %request.role, "account registered");
                self.update(|s| s.set_loading(false));
                Ok(user)
            }
            Err(e) => {
                tracing::warn!(error = %e, "registration failed");
                let message = e.user_message(REGISTRATION_FAILED_MESSAGE);
                self.update(|s| {
                    s.set_loading(false);
                    s.set_error(Some(message.clone()));
                });
                Err(AuthError::Failed { message, source: e })
            }
        }
    }

    // -------------------------------------------------------------------------
    // google
    // -------------------------------------------------------------------------

    /// Authorization URL to send the user to. No state changes.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::OAuthNotConfigured`] without a client id.
    pub fn login_with_google(&self) -> Result<String, AuthError> {
        let google = self.inner.google.as_ref().ok_or(AuthError::OAuthNotConfigured)?;
        Ok(google.authorize_url())
    }

    /// Finish Google sign-in with the code from the provider callback.
    ///
    /// Returns `Ok(None)` when another auth operation is in flight.
    /// Replaying a code that already succeeded reuses its token and yields
    /// the same user without a second exchange.
    ///
    /// # Errors
    ///
    /// On failure the session and storage are cleared and
    /// [`AuthError::Failed`] carries the message also recorded in `error`.
    pub async fn process_google_auth(&self, code: &str) -> Result<Option<User>, AuthError> {
        let code = code.trim();
        if code.is_empty() {
            return Err(AuthError::MissingAuthorizationCode);
        }

        let mut claimed = false;
        self.inner.state.send_if_modified(|s| {
            if s.is_loading() {
                return false;
            }
            s.set_loading(true);
            s.set_error(None);
            claimed = true;
            true
        });
        if !claimed {
            tracing::debug!("google callback ignored; auth operation in flight");
            return Ok(None);
        }

        let cached = self.cached_token(code);
        let reused = cached.is_some();
        let token = match cached {
            Some(token) => {
                tracing::info!("google code already exchanged; reusing token");
                token
            }
            None => match self.call(self.inner.api.exchange_google_code(code)).await {
                Ok(issued) => issued.access_token,
                Err(e) => {
                    tracing::warn!(error = %e, "google code exchange failed");
                    return Err(self.fail(e, GOOGLE_FAILED_MESSAGE));
                }
            },
        };

        match self.fetch_identity(&token).await {
            Ok(user) => {
                if !reused {
                    self.remember_code(code, &token);
                }
                tracing::info!(
                    user_id = user.id,
                    needs_profile = needs_profile_update(&user),
                    "google sign-in succeeded"
                );
                self.commit(token, user).map(Some)
            }
            Err(e) => {
                tracing::warn!(error = %e, "google identity fetch failed");
                self.forget_code(code);
                Err(self.fail(e, GOOGLE_FAILED_MESSAGE))
            }
        }
    }

    /// Submit role and minimum profile data for a first-time Google user,
    /// then mark the local user active with the chosen role.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::NotAuthenticated`] when signed out, or
    /// [`AuthError::Failed`] when the backend rejects the profile. A failure
    /// keeps the session signed in.
    pub async fn complete_google_profile(&self, request: &GoogleProfileRequest) -> Result<User, AuthError> {
        let current = self.session().user().cloned().ok_or(AuthError::NotAuthenticated)?;
        self.begin();

        if let Err(e) = self.call(self.inner.api.complete_google_profile(request)).await {
            tracing::warn!(error = %e, "profile completion failed");
            let message = e.user_message(PROFILE_COMPLETION_FAILED_MESSAGE);
            self.update(|s| {
                s.set_loading(false);
                s.set_error(Some(message.clone()));
            });
            return Err(AuthError::Failed { message, source: e });
        }

        let completed = User { role: Some(request.role), is_active: true, ..current };
        let saved = self.set_user(completed.clone());
        self.update(|s| s.set_loading(false));
        saved?;
        tracing::info!(user_id = completed.id, role = %request.role, "profile completed");
        Ok(completed)
    }

    // -------------------------------------------------------------------------
    // direct mutations
    // -------------------------------------------------------------------------

    /// Clear credentials in memory and storage. Safe to call when signed out.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::Storage`] if storage cannot be cleared; memory is
    /// cleared regardless.
    pub fn logout(&self) -> Result<(), AuthError> {
        let signed_in = self.session().is_authenticated();
        self.reset(None)?;
        if signed_in {
            tracing::info!("logged out");
        }
        Ok(())
    }

    /// Replace the user record, keeping the token.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::NotAuthenticated`] without a token, or
    /// [`AuthError::Storage`] if the write fails (memory is then unchanged).
    pub fn set_user(&self, user: User) -> Result<(), AuthError> {
        if self.session().token().is_none() {
            return Err(AuthError::NotAuthenticated);
        }
        storage::save_user(self.inner.storage.as_ref(), &user)?;
        self.update(|s| s.replace_user(user));
        Ok(())
    }

    // -------------------------------------------------------------------------
    // internals
    // -------------------------------------------------------------------------

    fn update(&self, modify: impl FnOnce(&mut Session)) {
        self.inner.state.send_modify(modify);
    }

    fn begin(&self) {
        self.update(|s| {
            s.set_loading(true);
            s.set_error(None);
        });
    }

    async fn fetch_identity(&self, token: &str) -> Result<User, ApiError> {
        self.inner.api.set_auth_token(Some(token));
        self.call(self.inner.api.current_user()).await
    }

    /// Persist a fresh sign-in, then publish it.
    fn commit(&self, token: String, user: User) -> Result<User, AuthError> {
        if let Err(e) = storage::save_credentials(self.inner.storage.as_ref(), &token, &user) {
            tracing::error!(error = %e, "could not persist session");
            self.reset_quietly(Some(e.to_string()));
            return Err(e.into());
        }
        self.update(|s| {
            s.authenticate(token, user.clone(), AuthPhase::Verified);
            s.set_loading(false);
            s.set_error(None);
        });
        Ok(user)
    }

    /// Full reset after a failed backend call; returns the error to propagate.
    fn fail(&self, error: ApiError, fallback: &str) -> AuthError {
        let message = error.user_message(fallback);
        self.reset_quietly(Some(message.clone()));
        AuthError::Failed { message, source: error }
    }

    /// Drop credentials everywhere. Memory is cleared even if storage fails.
    fn reset(&self, error: Option<String>) -> Result<(), StorageError> {
        self.inner.api.set_auth_token(None);
        let cleared = storage::clear_credentials(self.inner.storage.as_ref());
        self.update(|s| {
            s.clear_credentials();
            s.set_loading(false);
            s.set_error(error);
        });
        cleared
    }

    fn reset_quietly(&self, error: Option<String>) {
        if let Err(e) = self.reset(error) {
            tracing::error!(error = %e, "could not clear stored session");
        }
    }

    fn cached_token(&self, code: &str) -> Option<String> {
        self.inner.oauth_codes.lock().ok().and_then(|cache| cache.get(code).map(str::to_owned))
    }

    fn remember_code(&self, code: &str, token: &str) {
        if let Ok(mut cache) = self.inner.oauth_codes.lock() {
            cache.insert(code, token);
        }
    }

    fn forget_code(&self, code: &str) {
        if let Ok(mut cache) = self.inner.oauth_codes.lock() {
            cache.remove(code);
        }
    }
}

#[cfg(test)]
#[path = "store_test.rs"]
mod tests;
