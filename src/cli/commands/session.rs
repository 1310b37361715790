use chrono::Utc;
use clap::Subcommand;
use serde_json::json;

use crate::cli::utils::*;
use crate::cli::OutputFormat;
use crate::session::Principal;
use crate::shell::Shell;

#[derive(Subcommand)]
pub enum SessionCommands {
    #[command(about = "Show the signed-in principal")]
    Show,

    #[command(about = "Sign in as a principal given as JSON")]
    Set {
        #[arg(help = r#"Principal JSON, e.g. '{"id":1,"role_id":1,"username":"admin"}'"#)]
        principal: String,
    },

    #[command(about = "Sign out and erase the stored session")]
    Clear,
}

pub async fn handle(cmd: SessionCommands, output_format: OutputFormat) -> anyhow::Result<()> {
    let mut session = open_session()?;

    match cmd {
        SessionCommands::Show => match session.principal() {
            Some(principal) => match output_format {
                OutputFormat::Json => {
                    println!(
                        "{}",
                        serde_json::to_string_pretty(&json!({
                            "current_principal": principal,
                            "display_name": principal.display_name(),
                        }))?
                    );
                }
                OutputFormat::Text => {
                    println!("Signed in as: {}", principal.display_name());
                    println!("ID: {}", principal.id);
                    println!("Role: {}", principal.role_id);
                    if let Some(at) = principal.signed_in_at {
                        println!("Since: {}", at.format("%Y-%m-%d %H:%M"));
                    }
                }
            },
            None => match output_format {
                OutputFormat::Json => {
                    println!("{}", serde_json::to_string_pretty(&json!({ "current_principal": null }))?);
                }
                OutputFormat::Text => println!("Not signed in"),
            },
        },
        SessionCommands::Set { principal } => {
            let mut principal: Principal = serde_json::from_str(&principal)
                .map_err(|e| anyhow::anyhow!("Invalid principal JSON: {}", e))?;
            if principal.signed_in_at.is_none() {
                principal.signed_in_at = Some(Utc::now());
            }
            let name = principal.display_name();
            let role = principal.role_id;
            session.set_principal(principal)?;
            output_success(
                &output_format,
                &format!("Signed in as {}", name),
                Some(json!({ "display_name": name, "role_id": role })),
            )?;
        }
        SessionCommands::Clear => {
            let mut shell = Shell::new(0);
            shell.attach(&session);
            shell.sign_out(&mut session)?;
            output_success(&output_format, "Signed out", None)?;
        }
    }

    Ok(())
}
