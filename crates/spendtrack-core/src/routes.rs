//! Route table and the authentication gate in front of it.
//!
//! The guard is a pure function of the session's `{is_authenticated, loading}`
//! pair; it never mutates anything.

use crate::auth::SessionSnapshot;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Login,
    Signup,
    Dashboard,
    Spends,
}

/// Who may see a route
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    /// Only signed-out users; signed-in users are sent to the dashboard
    Public,
    /// Only signed-in users; everybody else is sent to login
    Protected,
}

/// Outcome of guarding a navigation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Guard {
    /// Session still resolving; show a neutral waiting view
    Waiting,
    Render(Route),
    Redirect(Route),
}

impl Route {
    pub const LANDING: Route = Route::Dashboard;

    /// Map a path to a route. `/` and unknown paths go to the landing route.
    pub fn from_path(path: &str) -> Route {
        match path.trim_end_matches('/') {
            "/login" => Route::Login,
            "/signup" => Route::Signup,
            "/dashboard" => Route::Dashboard,
            "/spends" => Route::Spends,
            _ => Self::LANDING,
        }
    }

    pub fn path(&self) -> &'static str {
        match self {
            Route::Login => "/login",
            Route::Signup => "/signup",
            Route::Dashboard => "/dashboard",
            Route::Spends => "/spends",
        }
    }

    pub fn access(&self) -> Access {
        match self {
            Route::Login | Route::Signup => Access::Public,
            Route::Dashboard | Route::Spends => Access::Protected,
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            Route::Login => "Login",
            Route::Signup => "Sign Up",
            Route::Dashboard => "Dashboard",
            Route::Spends => "Spends",
        }
    }
}

pub fn guard(route: Route, session: &SessionSnapshot) -> Guard {
    if session.loading {
        return Guard::Waiting;
    }
    match (route.access(), session.is_authenticated) {
        (Access::Protected, true) | (Access::Public, false) => Guard::Render(route),
        (Access::Protected, false) => Guard::Redirect(Route::Login),
        (Access::Public, true) => Guard::Redirect(Route::Dashboard),
    }
}

/// Follow redirects until a route renders; `None` while the session is loading.
pub fn resolve(route: Route, session: &SessionSnapshot) -> Option<Route> {
    let mut current = route;
    // Login and dashboard always render for their own audience, so two hops suffice
    for _ in 0..2 {
        match guard(current, session) {
            Guard::Waiting => return None,
            Guard::Render(route) => return Some(route),
            Guard::Redirect(next) => current = next,
        }
    }
    Some(current)
}
