mod profile_routes;
mod user_routes;

use crate::app::App;

use axum::routing::Router;
use entrait::Impl;

/// Named routes, so handlers can redirect without hard-coding paths.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Route {
    Register,
    Login,
    CurrentUser,
    Profile,
}

impl Route {
    pub const fn path(self) -> &'static str {
        match self {
            Self::Register => "/users",
            Self::Login => "/users/login",
            Self::CurrentUser => "/user",
            Self::Profile => "/profile",
        }
    }

    /// Look a route up by name.
    pub fn reverse(name: &str) -> Option<Self> {
        match name {
            "register" => Some(Self::Register),
            "login" => Some(Self::Login),
            "current_user" => Some(Self::CurrentUser),
            "profile" => Some(Self::Profile),
            _ => None,
        }
    }
}

/// Axum router for the real app.
pub fn api_router() -> axum::Router {
    Router::new()
        .merge(user_routes::UserRoutes::<Impl<App>>::router())
        .merge(profile_routes::ProfileRoutes::<Impl<App>>::router())
}
