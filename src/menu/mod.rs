//! Role-scoped navigation menu with accordion expansion.
//!
//! The tree is rebuilt from the static role table whenever the principal's
//! role changes, and the branch holding the current route is kept expanded.

pub mod roles;

use serde::Serialize;

use crate::session::Principal;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MenuNode {
    pub label: String,
    pub link: Option<String>,
    pub children: Vec<MenuNode>,
    pub open: bool,
}

impl MenuNode {
    pub fn link(label: &str, route: &str) -> Self {
        Self {
            label: label.to_string(),
            link: Some(route.to_string()),
            children: Vec::new(),
            open: false,
        }
    }

    pub fn group(label: &str, children: Vec<MenuNode>) -> Self {
        Self {
            label: label.to_string(),
            link: None,
            children,
            open: false,
        }
    }

    /// Every route in this subtree, the node's own link first
    pub fn routes(&self) -> Vec<&str> {
        let mut routes: Vec<&str> = self.link.as_deref().into_iter().collect();
        routes.extend(self.children.iter().flat_map(|c| c.routes()));
        routes
    }

    fn has_descendant_route(&self, route: &str) -> bool {
        self.children
            .iter()
            .any(|c| c.link.as_deref() == Some(route) || c.has_descendant_route(route))
    }

    fn reset(&mut self) {
        self.open = false;
        self.children.iter_mut().for_each(MenuNode::reset);
    }
}

/// Canonical form of a route: leading slash, no query, fragment or trailing slash
pub fn normalize_route(route: &str) -> String {
    let path = route
        .split(['?', '#'])
        .next()
        .unwrap_or_default()
        .trim();
    let trimmed = path.trim_matches('/');
    format!("/{}", trimmed)
}

#[derive(Debug, Clone)]
pub struct NavigationMenu {
    role: Option<u8>,
    tree: Vec<MenuNode>,
    current_url: String,
}

impl Default for NavigationMenu {
    fn default() -> Self {
        Self::new()
    }
}

impl NavigationMenu {
    pub fn new() -> Self {
        Self {
            role: None,
            tree: Vec::new(),
            current_url: "/".to_string(),
        }
    }

    pub fn tree(&self) -> &[MenuNode] {
        &self.tree
    }

    pub fn role(&self) -> Option<u8> {
        self.role
    }

    pub fn current_url(&self) -> &str {
        &self.current_url
    }

    /// Expand every branch holding the route; collapse the rest.
    pub fn route_changed(&mut self, route: &str) {
        self.current_url = normalize_route(route);
        let url = self.current_url.as_str();
        for node in self.tree.iter_mut() {
            if node.has_descendant_route(url) {
                node.open = true;
            } else if node.link.as_deref() != Some(url) {
                node.open = false;
            }
        }
    }

    /// Accordion toggle: close siblings, flip the node. Returns false for an
    /// index outside the tree.
    pub fn user_toggled(&mut self, index: usize) -> bool {
        if index >= self.tree.len() {
            return false;
        }
        for (i, node) in self.tree.iter_mut().enumerate() {
            if i == index {
                node.open = !node.open;
            } else {
                node.open = false;
            }
        }
        true
    }

    pub fn toggle_label(&mut self, label: &str) -> bool {
        match self.tree.iter().position(|n| n.label == label) {
            Some(index) => self.user_toggled(index),
            None => false,
        }
    }

    /// Rebuild the tree for a role, collapse everything, then re-expand the
    /// branch holding the current route.
    pub fn role_changed(&mut self, role: Option<u8>) {
        self.role = role;
        self.tree = role.map(roles::tree_for_role).unwrap_or_default();
        self.tree.iter_mut().for_each(MenuNode::reset);
        tracing::debug!("Menu rebuilt for role {:?}: {} top-level entries", role, self.tree.len());
        let current = self.current_url.clone();
        self.route_changed(&current);
    }

    pub fn principal_changed(&mut self, principal: Option<&Principal>) {
        self.role_changed(principal.map(|p| p.role_id));
    }

    pub fn open_labels(&self) -> Vec<&str> {
        self.tree
            .iter()
            .filter(|n| n.open)
            .map(|n| n.label.as_str())
            .collect()
    }

    pub fn is_active(&self, node: &MenuNode) -> bool {
        node.link.as_deref() == Some(self.current_url.as_str())
    }

    pub fn can_reach(&self, route: &str) -> bool {
        let route = normalize_route(route);
        self.tree.iter().any(|n| n.routes().contains(&route.as_str()))
    }

    pub fn reachable_routes(&self) -> Vec<&str> {
        self.tree.iter().flat_map(|n| n.routes()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::roles::{ROLE_ADMIN, ROLE_EDITOR, ROLE_VIEWER};
    use super::*;

    #[test]
    fn starts_empty() {
        let menu = NavigationMenu::new();
        assert!(menu.tree().is_empty());
        assert!(menu.open_labels().is_empty());
    }

    #[test]
    fn editor_on_about_opens_only_pages() {
        let mut menu = NavigationMenu::new();
        menu.role_changed(Some(ROLE_EDITOR));
        menu.route_changed("/about");
        assert_eq!(menu.open_labels(), vec!["Pages"]);
    }

    #[test]
    fn role_change_re_expands_current_route() {
        let mut menu = NavigationMenu::new();
        menu.route_changed("/users");
        menu.role_changed(Some(ROLE_ADMIN));
        assert_eq!(menu.open_labels(), vec!["People"]);

        // editor tree has no /users: nothing open, nothing stale
        menu.role_changed(Some(ROLE_EDITOR));
        assert!(menu.open_labels().is_empty());
        assert!(!menu.can_reach("/users"));
    }

    #[test]
    fn route_change_collapses_unrelated_branches() {
        let mut menu = NavigationMenu::new();
        menu.role_changed(Some(ROLE_ADMIN));
        menu.toggle_label("Academy");
        assert_eq!(menu.open_labels(), vec!["Academy"]);

        menu.route_changed("/blogs");
        assert_eq!(menu.open_labels(), vec!["Blog"]);
    }

    #[test]
    fn user_toggle_is_an_accordion() {
        let mut menu = NavigationMenu::new();
        menu.role_changed(Some(ROLE_ADMIN));
        menu.route_changed("/about");
        assert!(menu.toggle_label("People"));
        assert_eq!(menu.open_labels(), vec!["People"]);

        assert!(menu.toggle_label("People"));
        assert!(menu.open_labels().is_empty());
        assert!(!menu.user_toggled(99));
        assert!(!menu.toggle_label("Nope"));
    }

    #[test]
    fn active_leaf_link_keeps_its_state() {
        let mut menu = NavigationMenu::new();
        menu.role_changed(Some(ROLE_VIEWER));
        menu.route_changed("/home?tab=1");
        assert_eq!(menu.current_url(), "/home");
        let node = menu.tree()[0].clone();
        assert!(menu.is_active(&node));
        assert!(menu.can_reach("/home/"));
    }

    #[test]
    fn unknown_role_and_sign_out_empty_the_tree() {
        let mut menu = NavigationMenu::new();
        menu.role_changed(Some(42));
        assert!(menu.tree().is_empty());
        menu.role_changed(Some(ROLE_ADMIN));
        menu.principal_changed(None);
        assert!(menu.tree().is_empty());
        assert_eq!(menu.role(), None);
    }

    #[test]
    fn normalizes_routes() {
        assert_eq!(normalize_route("about"), "/about");
        assert_eq!(normalize_route("/about/#team"), "/about");
        assert_eq!(normalize_route(""), "/");
        assert_eq!(normalize_route("/"), "/");
    }
}
