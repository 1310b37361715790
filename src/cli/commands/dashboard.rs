use futures::future::join_all;
use serde_json::json;

use crate::cli::utils::*;
use crate::cli::OutputFormat;
use crate::resource::{catalog, LoadOutcome, ResourceController};
use crate::shell::Shell;

/// Load every list the signed-in role can reach, all reads in flight at once.
pub async fn handle(output_format: OutputFormat) -> anyhow::Result<()> {
    let session = open_session()?;
    let Some(principal) = session.principal() else {
        return Err(anyhow::anyhow!("Not signed in; run `console session set` first"));
    };
    let greeting = principal.display_name();

    let mut shell = Shell::new(0);
    shell.attach(&session);

    let gateway = http_gateway()?;
    let mut controllers: Vec<ResourceController> = catalog::all()
        .into_iter()
        .filter(|d| d.route.is_some_and(|route| shell.can_reach(route)))
        .map(|d| ResourceController::new(d, gateway.clone()))
        .collect();

    if controllers.is_empty() {
        return output_empty_collection(&output_format, "dashboard", "Nothing to show for this role");
    }

    let tickets: Vec<_> = controllers.iter_mut().map(|c| c.begin_load()).collect();
    let reads = join_all(controllers.iter().zip(&tickets).map(|(c, t)| c.fetch(t))).await;

    let mut rows = Vec::new();
    for ((controller, ticket), result) in controllers.iter_mut().zip(tickets).zip(reads) {
        let descriptor = controller.descriptor();
        let (name, route) = (descriptor.plural, descriptor.route.unwrap_or_default());
        let row = match controller.apply_load(ticket, result) {
            Ok(LoadOutcome::Applied(count)) => {
                let active = controller.records().iter().filter(|r| r.status).count();
                json!({ "entity": name, "route": route, "count": count, "active": active })
            }
            Ok(LoadOutcome::Stale) => json!({ "entity": name, "route": route, "error": "stale" }),
            Err(e) => json!({ "entity": name, "route": route, "error": e.to_string() }),
        };
        rows.push(row);
    }

    match output_format {
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::to_string_pretty(&json!({ "principal": greeting, "dashboard": rows }))?
            );
        }
        OutputFormat::Text => {
            println!("Welcome, {}", greeting);
            println!("{:<16} {:<14} {:>6} {:>7}", "ENTITY", "ROUTE", "COUNT", "ACTIVE");
            println!("{}", "-".repeat(46));
            for row in &rows {
                match row.get("error").and_then(|e| e.as_str()) {
                    Some(error) => println!(
                        "{:<16} {:<14} failed: {}",
                        row["entity"].as_str().unwrap_or_default(),
                        row["route"].as_str().unwrap_or_default(),
                        error
                    ),
                    None => println!(
                        "{:<16} {:<14} {:>6} {:>7}",
                        row["entity"].as_str().unwrap_or_default(),
                        row["route"].as_str().unwrap_or_default(),
                        row["count"],
                        row["active"]
                    ),
                }
            }
        }
    }

    Ok(())
}
