//! Route guard: what a navigation may render for the current session.
//!
//! DESIGN
//! ======
//! The guard is a pure function of the session snapshot and the route's
//! declared access. It keeps no state; callers re-evaluate it whenever the
//! session changes. `Loading` is the only non-terminal decision.
//!
//! Checks run in a fixed order:
//! 1. loading -> `Loading`
//! 2. not authenticated -> redirect to `/login` (history replaced)
//! 3. incomplete profile -> redirect to `/complete-profile`
//! 4. role not allowed -> `Forbidden` (no redirect)
//! 5. otherwise `Granted`

pub mod route;

use std::fmt::Write as _;

use crate::net::types::Role;
use crate::state::session::Session;
use route::{AppRoute, RouteAccess};

pub const LOGIN_PATH: &str = "/login";
pub const COMPLETE_PROFILE_PATH: &str = "/complete-profile";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Redirect {
    pub to: &'static str,
    /// Replace the current history entry so "back" skips the guarded page.
    pub replace_history: bool,
}

/// Why an authenticated user was refused.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Denial {
    pub role: Option<Role>,
    pub allowed: Vec<Role>,
}

impl Denial {
    #[must_use]
    pub fn message(&self) -> String {
        let mut message = String::from("Access denied: this page is only available to ");
        let names: Vec<&str> = self.allowed.iter().map(|r| r.as_str()).collect();
        let _ = write!(message, "{} accounts", names.join(" or "));
        match self.role {
            Some(role) => {
                let _ = write!(message, ", and you are signed in as {role}.");
            }
            None => message.push_str(", and your account has no role yet."),
        }
        message
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardDecision {
    Loading,
    Redirect(Redirect),
    Forbidden(Denial),
    Granted,
}

impl GuardDecision {
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Loading)
    }
}

fn redirect(to: &'static str) -> GuardDecision {
    GuardDecision::Redirect(Redirect { to, replace_history: true })
}

/// Decide access to a protected region. An empty `allowed_roles` admits any role.
#[must_use]
pub fn evaluate(session: &Session, allowed_roles: &[Role]) -> GuardDecision {
    if session.is_loading() {
        return GuardDecision::Loading;
    }
    if !session.is_authenticated() {
        tracing::debug!("guard: not authenticated, redirecting to login");
        return redirect(LOGIN_PATH);
    }
    if session.needs_profile_update() {
        tracing::debug!("guard: profile incomplete, redirecting to completion");
        return redirect(COMPLETE_PROFILE_PATH);
    }

    let role = session.role();
    if !allowed_roles.is_empty() && !role.is_some_and(|r| allowed_roles.contains(&r)) {
        tracing::debug!(role = ?role, "guard: role not allowed");
        return GuardDecision::Forbidden(Denial { role, allowed: allowed_roles.to_vec() });
    }
    GuardDecision::Granted
}

/// Decide access to `route` using the route table.
#[must_use]
pub fn resolve(session: &Session, route: &AppRoute) -> GuardDecision {
    match route.access() {
        RouteAccess::Public => GuardDecision::Granted,
        RouteAccess::SessionOnly => {
            if session.is_loading() {
                GuardDecision::Loading
            } else if session.is_authenticated() {
                GuardDecision::Granted
            } else {
                redirect(LOGIN_PATH)
            }
        }
        RouteAccess::Protected(roles) => evaluate(session, roles),
    }
}

/// Parse `path` and decide access to it.
#[must_use]
pub fn resolve_path(session: &Session, path: &str) -> (AppRoute, GuardDecision) {
    let route = AppRoute::from_path(path);
    let decision = resolve(session, &route);
    (route, decision)
}

#[cfg(test)]
#[path = "mod_test.rs"]
mod tests;
