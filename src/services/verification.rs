//! Email verification from the link sent after registration.

use crate::net::types::ApiError;
use crate::state::store::SessionStore;

pub const VERIFIED_MESSAGE: &str = "Email successfully verified. You can now log in.";
pub const EXPIRED_MESSAGE: &str = "The verification link has expired.";
pub const INVALID_MESSAGE: &str = "The verification token is invalid.";
pub const VERIFICATION_FAILED_MESSAGE: &str = "Email verification failed.";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VerificationOutcome {
    Verified(String),
    Expired,
    /// Unknown, already used, or missing token.
    Invalid,
    Failed(String),
}

impl VerificationOutcome {
    #[must_use]
    pub fn message(&self) -> &str {
        match self {
            Self::Verified(message) | Self::Failed(message) => message,
            Self::Expired => EXPIRED_MESSAGE,
            Self::Invalid => INVALID_MESSAGE,
        }
    }

    #[must_use]
    pub fn is_verified(&self) -> bool {
        matches!(self, Self::Verified(_))
    }
}

/// Map a failed `/verify-email` call onto an outcome by its `detail` text.
#[must_use]
pub fn classify_failure(error: &ApiError) -> VerificationOutcome {
    let message = error.user_message(VERIFICATION_FAILED_MESSAGE);
    if message.contains("expired") {
        VerificationOutcome::Expired
    } else if message.contains("Invalid") {
        VerificationOutcome::Invalid
    } else {
        VerificationOutcome::Failed(message)
    }
}

/// Confirm an account. Never touches the session; the user logs in afterwards.
pub async fn verify_email(store: &SessionStore, token: &str) -> VerificationOutcome {
    let token = token.trim();
    if token.is_empty() {
        return VerificationOutcome::Invalid;
    }

    match store.call(store.api().verify_email(token)).await {
        Ok(response) => {
            tracing::info!("email verified");
            let message = response
                .message
                .filter(|m| !m.trim().is_empty())
                .unwrap_or_else(|| VERIFIED_MESSAGE.to_owned());
            VerificationOutcome::Verified(message)
        }
        Err(e) => {
            tracing::warn!(error = %e, "email verification failed");
            classify_failure(&e)
        }
    }
}

#[cfg(test)]
#[path = "verification_test.rs"]
mod tests;
