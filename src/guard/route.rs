//! Application route table.

use crate::net::types::Role;

const ADMIN_ONLY: &[Role] = &[Role::Admin];

/// Who may reach a route.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteAccess {
    /// Rendered for everyone.
    Public,
    /// Any signed-in user, complete profile or not.
    SessionOnly,
    /// Signed in with a complete profile; a non-empty slice also restricts roles.
    Protected(&'static [Role]),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppRoute {
    Login,
    Register,
    VerifyEmail,
    GoogleCallback,
    CompleteProfile,
    Home,
    Profile,
    SearchDoctors,
    History,
    Doctor(i64),
    Admin,
    NotFound(String),
}

impl AppRoute {
    /// Match a location path. Query string, fragment and a trailing slash
    /// are ignored.
    #[must_use]
    pub fn from_path(path: &str) -> Self {
        let path = path.split(['?', '#']).next().unwrap_or_default();
        let trimmed = path.trim_end_matches('/');
        let normalized = if trimmed.is_empty() { "/" } else { trimmed };

        match normalized {
            "/" => Self::Home,
            "/login" => Self::Login,
            "/register" => Self::Register,
            "/verify-email" => Self::VerifyEmail,
            "/auth/google/callback" => Self::GoogleCallback,
            "/complete-profile" => Self::CompleteProfile,
            "/profile" => Self::Profile,
            "/search-doctors" => Self::SearchDoctors,
            "/history" => Self::History,
            "/admin" => Self::Admin,
            other => other
                .strip_prefix("/doctors/")
                .and_then(|id| id.parse::<i64>().ok())
                .filter(|id| *id > 0)
                .map_or_else(|| Self::NotFound(other.to_owned()), Self::Doctor),
        }
    }

    #[must_use]
    pub fn to_path(&self) -> String {
        match self {
            Self::Login => "/login".into(),
            Self::Register => "/register".into(),
            Self::VerifyEmail => "/verify-email".into(),
            Self::GoogleCallback => "/auth/google/callback".into(),
            Self::CompleteProfile => "/complete-profile".into(),
            Self::Home => "/".into(),
            Self::Profile => "/profile".into(),
            Self::SearchDoctors => "/search-doctors".into(),
            Self::History => "/history".into(),
            Self::Doctor(id) => format!("/doctors/{id}"),
            Self::Admin => "/admin".into(),
            Self::NotFound(path) => path.clone(),
        }
    }

    #[must_use]
    pub fn access(&self) -> RouteAccess {
        match self {
            Self::Login | Self::Register | Self::VerifyEmail | Self::GoogleCallback | Self::NotFound(_) => {
                RouteAccess::Public
            }
            Self::CompleteProfile => RouteAccess::SessionOnly,
            Self::Home | Self::Profile | Self::SearchDoctors | Self::History | Self::Doctor(_) => {
                RouteAccess::Protected(&[])
            }
            Self::Admin => RouteAccess::Protected(ADMIN_ONLY),
        }
    }
}

#[cfg(test)]
#[path = "route_test.rs"]
mod tests;
