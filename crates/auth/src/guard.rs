//! Route guard: gate navigation on the current auth view.
//!
//! Pure decision logic; rendering and actual navigation belong to the view
//! layer consuming the returned [`RouteDecision`].

use crate::facade::AuthView;
use crate::roles::Role;

pub const LOGIN_ROUTE: &str = "/login";
pub const DASHBOARD_ROUTE: &str = "/dashboard";
pub const STUDENT_HOME_ROUTE: &str = "/student";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteDecision {
    /// Auth state still resolving; render a loading indicator, no redirect.
    Loading,

    /// Not signed in; go to login, remembering the attempted path for the
    /// post-login return.
    RedirectToLogin { from: String },

    /// Blocked student: terminal full-page notice, not a redirect. The user
    /// cannot navigate away within the app.
    Blocked,

    /// Signed in but the route's role set does not match; go elsewhere.
    Redirect { to: &'static str },

    /// Authorized; render the requested route.
    Allow,
}

/// Evaluate one navigation attempt.
///
/// An empty `allowed_roles` slice means the route only requires
/// authentication. The block check runs before the role check: a blocked
/// student sees the block notice even when a role would have matched.
pub fn evaluate_route(view: &AuthView, allowed_roles: &[Role], requested_path: &str) -> RouteDecision {
    if view.loading {
        return RouteDecision::Loading;
    }

    if view.user.is_none() {
        return RouteDecision::RedirectToLogin {
            from: requested_path.to_string(),
        };
    }

    if view.roles.is_student() && view.student.as_ref().is_some_and(|s| s.is_blocked) {
        return RouteDecision::Blocked;
    }

    if !allowed_roles.is_empty() && !allowed_roles.iter().any(|r| view.roles.contains(*r)) {
        let to = if view.roles.is_student() {
            STUDENT_HOME_ROUTE
        } else {
            DASHBOARD_ROUTE
        };
        return RouteDecision::Redirect { to };
    }

    RouteDecision::Allow
}
