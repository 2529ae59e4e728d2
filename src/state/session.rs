//! Session snapshot and its derived flags.

use crate::net::types::{Role, User};

/// How far the current credentials have been confirmed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AuthPhase {
    /// No credentials.
    #[default]
    Anonymous,
    /// Loaded from durable storage; the backend has not confirmed them yet.
    Hydrated,
    /// Confirmed by the backend during this process.
    Verified,
}

/// Who is logged in, as seen by pages and the route guard.
///
/// Fields are private so the token/user pairing can only change through the
/// crate's mutators, which keep `phase` consistent with them.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Session {
    token: Option<String>,
    user: Option<User>,
    phase: AuthPhase,
    is_loading: bool,
    error: Option<String>,
}

/// True when the user still has to pick a role or activate the account.
#[must_use]
pub fn needs_profile_update(user: &User) -> bool {
    user.role.is_none() || !user.is_active
}

impl Session {
    #[must_use]
    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    #[must_use]
    pub fn user(&self) -> Option<&User> {
        self.user.as_ref()
    }

    #[must_use]
    pub fn role(&self) -> Option<Role> {
        self.user.as_ref().and_then(|u| u.role)
    }

    #[must_use]
    pub fn phase(&self) -> AuthPhase {
        self.phase
    }

    #[must_use]
    pub fn is_loading(&self) -> bool {
        self.is_loading
    }

    #[must_use]
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.token.is_some() && self.user.is_some() && self.phase != AuthPhase::Anonymous
    }

    /// Authenticated and confirmed by the backend, not just loaded from storage.
    #[must_use]
    pub fn is_verified(&self) -> bool {
        self.is_authenticated() && self.phase == AuthPhase::Verified
    }

    /// Only meaningful while authenticated; false otherwise.
    #[must_use]
    pub fn needs_profile_update(&self) -> bool {
        self.is_authenticated() && self.user.as_ref().is_some_and(needs_profile_update)
    }

    // -------------------------------------------------------------------------
    // mutators (store-only)
    // -------------------------------------------------------------------------

    pub(crate) fn authenticate(&mut self, token: String, user: User, phase: AuthPhase) {
        debug_assert!(phase != AuthPhase::Anonymous);
        self.token = Some(token);
        self.user = Some(user);
        self.phase = phase;
    }

    pub(crate) fn clear_credentials(&mut self) {
        self.token = None;
        self.user = None;
        self.phase = AuthPhase::Anonymous;
    }

    /// Replace the user record, leaving the token alone. No-op when anonymous.
    pub(crate) fn replace_user(&mut self, user: User) {
        if self.token.is_some() {
            self.user = Some(user);
        }
    }

    pub(crate) fn mark_verified(&mut self) {
        if self.is_authenticated() {
            self.phase = AuthPhase::Verified;
        }
    }

    pub(crate) fn set_loading(&mut self, loading: bool) {
        self.is_loading = loading;
    }

    pub(crate) fn set_error(&mut self, error: Option<String>) {
        self.error = error;
    }
}

#[cfg(test)]
#[path = "session_test.rs"]
mod tests;
