use serde_json::json;

use crate::cli::utils::*;
use crate::cli::OutputFormat;
use crate::menu::{MenuNode, NavigationMenu};
use crate::shell::Shell;

pub async fn handle(role: Option<u8>, route: &str, output_format: OutputFormat) -> anyhow::Result<()> {
    let (tree, current, reachable) = match role {
        Some(role) => {
            let mut menu = NavigationMenu::new();
            menu.route_changed(route);
            menu.role_changed(Some(role));
            snapshot(&menu)
        }
        None => {
            let session = open_session()?;
            let mut shell = Shell::new(0);
            shell.attach(&session);
            shell.navigate(route);
            shell.with_menu(snapshot)
        }
    };

    if tree.is_empty() {
        return output_empty_collection(&output_format, "menu", "No menu entries for this role");
    }

    match output_format {
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::to_string_pretty(&json!({
                    "current_url": current,
                    "menu": tree,
                    "reachable": reachable,
                }))?
            );
        }
        OutputFormat::Text => {
            for node in &tree {
                print_node(node, &current, 0);
            }
        }
    }

    Ok(())
}

fn snapshot(menu: &NavigationMenu) -> (Vec<MenuNode>, String, Vec<String>) {
    (
        menu.tree().to_vec(),
        menu.current_url().to_string(),
        menu.reachable_routes().into_iter().map(str::to_string).collect(),
    )
}

fn print_node(node: &MenuNode, current: &str, depth: usize) {
    let indent = "  ".repeat(depth);
    let marker = if node.link.as_deref() == Some(current) {
        "*"
    } else if !node.children.is_empty() {
        if node.open { "v" } else { ">" }
    } else {
        " "
    };
    match &node.link {
        Some(link) => println!("{}{} {:<20} {}", indent, marker, node.label, link),
        None => println!("{}{} {}", indent, marker, node.label),
    }
    if node.open {
        for child in &node.children {
            print_node(child, current, depth + 1);
        }
    }
}
