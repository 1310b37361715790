//! Static role → menu table.

use super::MenuNode;

pub const ROLE_ADMIN: u8 = 1;
pub const ROLE_EDITOR: u8 = 2;
pub const ROLE_VIEWER: u8 = 3;

/// Menu tree for a role; unknown roles get nothing.
pub fn tree_for_role(role_id: u8) -> Vec<MenuNode> {
    match role_id {
        ROLE_ADMIN => admin_tree(),
        ROLE_EDITOR => editor_tree(),
        ROLE_VIEWER => vec![MenuNode::link("Home Content", "/home")],
        _ => Vec::new(),
    }
}

fn pages(include_team: bool) -> MenuNode {
    let mut children = vec![
        MenuNode::link("About", "/about"),
        MenuNode::link("Services", "/services"),
        MenuNode::link("Products", "/products"),
    ];
    if include_team {
        children.push(MenuNode::link("Our Team", "/ourteam"));
    }
    children.push(MenuNode::link("Testimonials", "/testimonials"));
    MenuNode::group("Pages", children)
}

fn admin_tree() -> Vec<MenuNode> {
    vec![
        MenuNode::link("Home Content", "/home"),
        pages(true),
        MenuNode::group("Blog", vec![MenuNode::link("Blogs", "/blogs")]),
        MenuNode::group(
            "Academy",
            vec![
                MenuNode::link("Courses", "/courses"),
                MenuNode::link("Students", "/students"),
            ],
        ),
        MenuNode::group(
            "People",
            vec![
                MenuNode::link("Employees", "/employees"),
                MenuNode::link("Users", "/users"),
            ],
        ),
        MenuNode::link("Contact Requests", "/contactus"),
    ]
}

fn editor_tree() -> Vec<MenuNode> {
    vec![
        MenuNode::link("Home Content", "/home"),
        pages(false),
        MenuNode::group("Blog", vec![MenuNode::link("Blogs", "/blogs")]),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resource::catalog;

    fn routes(tree: &[MenuNode]) -> Vec<&str> {
        tree.iter().flat_map(|n| n.routes()).collect()
    }

    #[test]
    fn admin_reaches_every_entity_screen() {
        let admin = tree_for_role(ROLE_ADMIN);
        let reachable = routes(&admin);
        for descriptor in catalog::all() {
            if let Some(route) = descriptor.route {
                assert!(reachable.contains(&route), "{} unreachable for admin", route);
            }
        }
    }

    #[test]
    fn trees_are_at_most_two_levels() {
        for role in [ROLE_ADMIN, ROLE_EDITOR, ROLE_VIEWER] {
            for node in tree_for_role(role) {
                assert!(node.children.iter().all(|c| c.children.is_empty()));
            }
        }
    }

    #[test]
    fn reduced_trees() {
        let editor_tree = tree_for_role(ROLE_EDITOR);
        let editor = routes(&editor_tree);
        assert!(editor.contains(&"/about"));
        assert!(!editor.contains(&"/users"));
        assert_eq!(routes(&tree_for_role(ROLE_VIEWER)), vec!["/home"]);
        assert!(tree_for_role(9).is_empty());
    }
}
