// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Screen routes and the navigation seam used by the session store.

use std::fmt;
use std::str::FromStr;
use std::sync::Mutex;

/// Application screens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Route {
    Landing,
    Login,
    Signup,
    Summary,
    AddTask,
    Board,
    Contacts,
    PrivacyPolicy,
    LegalNotice,
}

impl Route {
    pub const ALL: [Route; 9] = [
        Route::Landing,
        Route::Login,
        Route::Signup,
        Route::Summary,
        Route::AddTask,
        Route::Board,
        Route::Contacts,
        Route::PrivacyPolicy,
        Route::LegalNotice,
    ];

    /// Screen shown after signing in.
    pub const DEFAULT_AUTHENTICATED: Route = Route::Summary;

    pub fn path(self) -> &'static str {
        match self {
            Route::Landing => "/",
            Route::Login => "/login",
            Route::Signup => "/signup",
            Route::Summary => "/summary",
            Route::AddTask => "/add-task",
            Route::Board => "/board",
            Route::Contacts => "/contacts",
            Route::PrivacyPolicy => "/privacy-policy",
            Route::LegalNotice => "/legal-notice",
        }
    }

    /// Reachable without a session. The landing screen is not on this list.
    pub fn is_public(self) -> bool {
        matches!(
            self,
            Route::Login | Route::Signup | Route::PrivacyPolicy | Route::LegalNotice
        )
    }

    /// Only makes sense while signed out.
    pub fn is_auth_only(self) -> bool {
        matches!(self, Route::Login | Route::Signup)
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path())
    }
}

impl FromStr for Route {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let path = s.split(['?', '#']).next().unwrap_or_default();
        let path = match path.trim_end_matches('/') {
            "" => "/",
            trimmed => trimmed,
        };
        Route::ALL
            .into_iter()
            .find(|r| r.path() == path)
            .ok_or_else(|| format!("unknown route: {s}"))
    }
}

/// Where the client currently is, and how to move it.
pub trait Navigator: Send + Sync {
    fn current(&self) -> Route;
    fn navigate(&self, route: Route);
}

/// Navigator that records every visited route.
#[derive(Debug)]
pub struct HistoryNavigator {
    history: Mutex<Vec<Route>>,
}

impl HistoryNavigator {
    pub fn new(start: Route) -> Self {
        Self {
            history: Mutex::new(vec![start]),
        }
    }

    /// All routes visited so far, oldest first.
    pub fn history(&self) -> Vec<Route> {
        self.lock().clone()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<Route>> {
        self.history.lock().unwrap_or_else(|p| p.into_inner())
    }
}

impl Default for HistoryNavigator {
    fn default() -> Self {
        Self::new(Route::Landing)
    }
}

impl Navigator for HistoryNavigator {
    fn current(&self) -> Route {
        *self.lock().last().unwrap_or(&Route::Landing)
    }

    fn navigate(&self, route: Route) {
        tracing::debug!(route = %route, "Navigating");
        self.lock().push(route);
    }
}
