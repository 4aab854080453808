//! Route guard
//!
//! Gates rendering of a protected subtree on the current [`Session`].
//! Pure and synchronous: the decision is a total function of the session
//! and the guard's configuration, with no I/O.

use opencircle_domain::constants::{HOME_ROUTE, LOGIN_ROUTE};
use opencircle_domain::{Role, Session};

/// Outcome of a guard evaluation
///
/// Exactly one of render, redirect-to-login, redirect-to-home. Wrong-role
/// is deliberately distinct from unauthenticated: an authenticated
/// principal is sent home, never back to login.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteDecision {
    /// Render the protected subtree
    Render,
    /// Not authenticated: go to the login route, carrying the originally
    /// requested location for a post-login return. Producing `return_to`
    /// is the guard's whole responsibility; consuming it is up to the
    /// shell.
    RedirectToLogin { redirect: String, return_to: String },
    /// Authenticated but the role is not allowed here
    RedirectToHome { redirect: String },
}

/// Role-based gate for a protected route
#[derive(Debug, Clone)]
pub struct RouteGuard {
    /// Roles allowed through; empty means any authenticated role
    allowed_roles: Vec<Role>,
    /// Where unauthenticated requests are sent
    redirect_path: String,
}

impl Default for RouteGuard {
    fn default() -> Self {
        Self::new()
    }
}

impl RouteGuard {
    /// Guard that admits any authenticated role
    #[must_use]
    pub fn new() -> Self {
        Self { allowed_roles: Vec::new(), redirect_path: LOGIN_ROUTE.to_string() }
    }

    /// Restrict the guard to the given roles
    #[must_use]
    pub fn with_roles(mut self, roles: impl IntoIterator<Item = Role>) -> Self {
        self.allowed_roles = roles.into_iter().collect();
        self
    }

    /// Override the unauthenticated redirect target
    #[must_use]
    pub fn redirect_path(mut self, path: impl Into<String>) -> Self {
        self.redirect_path = path.into();
        self
    }

    /// Decide whether `requested` may render for the given session
    #[must_use]
    pub fn evaluate(&self, session: &Session, requested: &str) -> RouteDecision {
        let Some(identity) = session.identity() else {
            return RouteDecision::RedirectToLogin {
                redirect: self.redirect_path.clone(),
                return_to: requested.to_string(),
            };
        };

        if self.allowed_roles.is_empty() || self.allowed_roles.contains(&identity.role()) {
            RouteDecision::Render
        } else {
            RouteDecision::RedirectToHome { redirect: HOME_ROUTE.to_string() }
        }
    }
}
