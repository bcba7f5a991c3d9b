//! Screen routing with session-aware guards.
//!
//! Every screen declares who may visit it; `redirect_for` is the single
//! place that verdict is computed. `RouteGuard` holds the current route
//! and re-evaluates it on every session transition, so a forced logout
//! lands on the login screen no matter which screen was up.

use parley_types::session::SessionState;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::info;

use std::fmt;

/// The navigable screens.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    /// The shared room. Home screen.
    Chat,
    Login,
    Register,
    Profile,
}

/// Who may visit a route.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    /// Needs an authenticated session.
    RequiresSession,
    /// Auth screens, pointless once logged in.
    AnonymousOnly,
}

impl Route {
    pub fn access(&self) -> Access {
        match self {
            Route::Chat | Route::Profile => Access::RequiresSession,
            Route::Login | Route::Register => Access::AnonymousOnly,
        }
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Route::Chat => write!(f, "chat"),
            Route::Login => write!(f, "login"),
            Route::Register => write!(f, "register"),
            Route::Profile => write!(f, "profile"),
        }
    }
}

/// Where a visit to `route` actually lands under the given session state.
///
/// `None` means the route stands. While the session is `Uninitialized`
/// there is no verdict at all: guards must not act before the one-shot
/// hydration has resolved.
pub fn redirect_for(route: Route, state: &SessionState) -> Option<Route> {
    if !state.is_initialized() {
        return None;
    }
    match (route.access(), state.is_authenticated()) {
        (Access::RequiresSession, false) => Some(Route::Login),
        (Access::AnonymousOnly, true) => Some(Route::Chat),
        _ => None,
    }
}

/// Holds the current route and keeps it legal as the session changes.
///
/// Guarding is reactive: the guard subscribes to session state and
/// re-evaluates the current route on every transition, rather than
/// checking once at navigation time only.
pub struct RouteGuard {
    session: watch::Receiver<SessionState>,
    route: watch::Sender<Route>,
}

impl RouteGuard {
    /// Create a guard starting on the home screen.
    pub fn new(session: watch::Receiver<SessionState>) -> Self {
        let (route, _) = watch::channel(Route::Chat);
        Self { session, route }
    }

    pub fn current(&self) -> Route {
        *self.route.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<Route> {
        self.route.subscribe()
    }

    /// Navigate to a screen, applying the access rule immediately.
    ///
    /// Returns the route actually landed on.
    pub fn navigate(&self, requested: Route) -> Route {
        let state = self.session.borrow().clone();
        let settled = redirect_for(requested, &state).unwrap_or(requested);
        if settled != requested {
            info!(requested = %requested, settled = %settled, "Navigation redirected");
        }
        self.route.send_replace(settled);
        settled
    }

    /// Re-evaluate the current route on every session change until
    /// `shutdown` fires.
    pub async fn run(&self, shutdown: CancellationToken) {
        let mut session = self.session.clone();
        loop {
            {
                let state = session.borrow_and_update().clone();
                let current = *self.route.borrow();
                if let Some(target) = redirect_for(current, &state) {
                    info!(from = %current, to = %target, "Route redirected");
                    self.route.send_replace(target);
                }
            }
            tokio::select! {
                _ = shutdown.cancelled() => break,
                changed = session.changed() => {
                    if changed.is_err() {
                        break;
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use parley_types::session::ActiveSession;
    use parley_types::user::User;
    use std::sync::Arc;

    fn authenticated() -> SessionState {
        SessionState::Authenticated(ActiveSession::new(
            "tok",
            User {
                id: 1,
                username: "alice".to_string(),
                created_at: Utc::now(),
            },
        ))
    }

    #[test]
    fn protected_routes_redirect_anonymous_to_login() {
        for route in [Route::Chat, Route::Profile] {
            assert_eq!(
                redirect_for(route, &SessionState::Anonymous),
                Some(Route::Login)
            );
        }
    }

    #[test]
    fn auth_routes_redirect_logged_in_home() {
        for route in [Route::Login, Route::Register] {
            assert_eq!(redirect_for(route, &authenticated()), Some(Route::Chat));
        }
    }

    #[test]
    fn legal_routes_stand() {
        assert_eq!(redirect_for(Route::Chat, &authenticated()), None);
        assert_eq!(redirect_for(Route::Profile, &authenticated()), None);
        assert_eq!(redirect_for(Route::Login, &SessionState::Anonymous), None);
        assert_eq!(
            redirect_for(Route::Register, &SessionState::Anonymous),
            None
        );
    }

    #[test]
    fn no_verdict_before_initialization() {
        for route in [Route::Chat, Route::Login, Route::Register, Route::Profile] {
            assert_eq!(redirect_for(route, &SessionState::Uninitialized), None);
        }
    }

    #[test]
    fn navigate_applies_redirect_immediately() {
        let (tx, rx) = watch::channel(SessionState::Anonymous);
        let guard = RouteGuard::new(rx);

        assert_eq!(guard.navigate(Route::Chat), Route::Login);
        assert_eq!(guard.current(), Route::Login);

        tx.send_replace(authenticated());
        assert_eq!(guard.navigate(Route::Login), Route::Chat);
    }

    #[tokio::test]
    async fn forced_logout_redirects_reactively() {
        let (tx, rx) = watch::channel(authenticated());
        let guard = Arc::new(RouteGuard::new(rx));
        let shutdown = CancellationToken::new();
        tokio::spawn({
            let guard = Arc::clone(&guard);
            let shutdown = shutdown.clone();
            async move { guard.run(shutdown).await }
        });

        assert_eq!(guard.navigate(Route::Chat), Route::Chat);

        tx.send_replace(SessionState::Anonymous);
        let mut route_rx = guard.subscribe();
        route_rx.wait_for(|r| *r == Route::Login).await.unwrap();
        shutdown.cancel();
    }

    #[tokio::test]
    async fn login_moves_off_auth_screen_reactively() {
        let (tx, rx) = watch::channel(SessionState::Anonymous);
        let guard = Arc::new(RouteGuard::new(rx));
        let shutdown = CancellationToken::new();
        tokio::spawn({
            let guard = Arc::clone(&guard);
            let shutdown = shutdown.clone();
            async move { guard.run(shutdown).await }
        });

        assert_eq!(guard.navigate(Route::Login), Route::Login);

        tx.send_replace(authenticated());
        let mut route_rx = guard.subscribe();
        route_rx.wait_for(|r| *r == Route::Chat).await.unwrap();
        shutdown.cancel();
    }

    #[tokio::test]
    async fn navigation_holds_until_initialized() {
        let (tx, rx) = watch::channel(SessionState::Uninitialized);
        let guard = Arc::new(RouteGuard::new(rx));
        let shutdown = CancellationToken::new();
        tokio::spawn({
            let guard = Arc::clone(&guard);
            let shutdown = shutdown.clone();
            async move { guard.run(shutdown).await }
        });

        // No verdict yet, the requested route stands.
        assert_eq!(guard.navigate(Route::Profile), Route::Profile);

        // Hydration resolves to no session; now the guard acts.
        tx.send_replace(SessionState::Anonymous);
        let mut route_rx = guard.subscribe();
        route_rx.wait_for(|r| *r == Route::Login).await.unwrap();
        shutdown.cancel();
    }
}
