//! Route guards.
//!
//! Pure decisions over a surface and its authentication flag. Nothing here
//! mutates a session.

use crate::{AuthSession, Surface};
use serde::Serialize;

/// How a route is mounted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteGuard {
    /// Only for signed-in visitors (dashboards, admin pages).
    Protected,
    /// Only for anonymous visitors (login pages).
    Public,
}

/// What to do with a navigation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "decision", rename_all = "snake_case")]
pub enum RouteDecision {
    Render,
    Redirect { to: &'static str },
}

impl RouteGuard {
    pub fn decide(self, surface: Surface, is_authenticated: bool) -> RouteDecision {
        match (self, is_authenticated) {
            (RouteGuard::Protected, false) => RouteDecision::Redirect {
                to: surface.login_path(),
            },
            (RouteGuard::Public, true) => RouteDecision::Redirect {
                to: surface.landing_path(),
            },
            _ => RouteDecision::Render,
        }
    }

    pub fn check(self, session: &AuthSession) -> RouteDecision {
        self.decide(session.surface(), session.is_authenticated())
    }
}
