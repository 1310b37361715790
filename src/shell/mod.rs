//! Application shell: routes, chrome visibility, sidebar state, and the menu
//! kept in sync with the session's principal.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::menu::{normalize_route, MenuNode, NavigationMenu};
use crate::session::{Session, SessionError, Subscription};

/// Routes rendered without navbar, sidebar and footer
const CHROMELESS_ROUTES: &[&str] = &["/", "/signup"];

/// Viewports at or below this width start with the sidebar closed
pub const MOBILE_BREAKPOINT: u32 = 768;

pub struct Shell {
    menu: Arc<Mutex<NavigationMenu>>,
    route: String,
    chrome_visible: bool,
    sidebar_open: bool,
    subscription: Option<Subscription>,
}

impl Shell {
    pub fn new(viewport_width: u32) -> Self {
        Self {
            menu: Arc::new(Mutex::new(NavigationMenu::new())),
            route: "/".to_string(),
            chrome_visible: false,
            sidebar_open: viewport_width > MOBILE_BREAKPOINT,
            subscription: None,
        }
    }

    /// Follow the session: every principal change rebuilds the menu before
    /// the current route is re-evaluated against it.
    pub fn attach(&mut self, session: &Session) {
        let menu = self.menu.clone();
        self.subscription = Some(session.subscribe(move |principal| {
            lock(&menu).principal_changed(principal);
        }));
    }

    pub fn detach(&mut self) {
        self.subscription = None;
    }

    pub fn navigate(&mut self, route: &str) {
        self.route = normalize_route(route);
        self.chrome_visible = !CHROMELESS_ROUTES.contains(&self.route.as_str());
        lock(&self.menu).route_changed(&self.route);
        tracing::debug!("Navigated to {} (chrome {})", self.route, self.chrome_visible);
    }

    pub fn route(&self) -> &str {
        &self.route
    }

    pub fn chrome_visible(&self) -> bool {
        self.chrome_visible
    }

    pub fn sidebar_open(&self) -> bool {
        self.sidebar_open
    }

    pub fn toggle_sidebar(&mut self) {
        self.sidebar_open = !self.sidebar_open;
    }

    pub fn close_sidebar(&mut self) {
        self.sidebar_open = false;
    }

    pub fn resize(&mut self, viewport_width: u32) {
        if viewport_width <= MOBILE_BREAKPOINT {
            self.sidebar_open = false;
        }
    }

    /// Public screens are always reachable; the rest only through the menu
    pub fn can_reach(&self, route: &str) -> bool {
        let route = normalize_route(route);
        CHROMELESS_ROUTES.contains(&route.as_str()) || lock(&self.menu).can_reach(&route)
    }

    pub fn menu(&self) -> Vec<MenuNode> {
        lock(&self.menu).tree().to_vec()
    }

    pub fn toggle_menu(&mut self, label: &str) -> bool {
        lock(&self.menu).toggle_label(label)
    }

    pub fn with_menu<R>(&self, f: impl FnOnce(&NavigationMenu) -> R) -> R {
        f(&lock(&self.menu))
    }

    /// Clear the session and return to the sign-in screen
    pub fn sign_out(&mut self, session: &mut Session) -> Result<(), SessionError> {
        session.clear_principal()?;
        self.navigate("/");
        Ok(())
    }
}

fn lock(menu: &Mutex<NavigationMenu>) -> MutexGuard<'_, NavigationMenu> {
    menu.lock().unwrap_or_else(PoisonError::into_inner)
}
