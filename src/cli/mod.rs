pub mod commands;
pub mod utils;

use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};

#[derive(Parser)]
#[command(name = "console")]
#[command(about = "Admin console - manage site content over the remote API")]
#[command(version)]
pub struct Cli {
    #[arg(long, global = true, help = "Output in human-readable text format")]
    pub text: bool,

    #[arg(long, global = true, help = "Output in JSON format")]
    pub json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    #[command(about = "Signed-in principal management")]
    Session {
        #[command(subcommand)]
        cmd: commands::session::SessionCommands,
    },

    #[command(about = "Show the navigation menu for a role")]
    Menu {
        #[arg(long, help = "Role id (defaults to the signed-in principal's role)")]
        role: Option<u8>,

        #[arg(long, default_value = "/", help = "Current route used to expand the menu")]
        route: String,
    },

    #[command(about = "List managed entities")]
    Entities,

    #[command(about = "Record counts for every screen the signed-in role can reach")]
    Dashboard,

    #[command(about = "List, create, update, delete and change status of records")]
    Resource {
        #[command(subcommand)]
        cmd: commands::resource::ResourceCommands,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum OutputFormat {
    Text,
    Json,
}

impl OutputFormat {
    pub fn from_cli(cli: &Cli) -> Self {
        if cli.json {
            OutputFormat::Json
        } else {
            OutputFormat::Text
        }
    }
}

pub async fn run(cli: Cli) -> anyhow::Result<()> {
    let output_format = OutputFormat::from_cli(&cli);

    match cli.command {
        Commands::Session { cmd } => commands::session::handle(cmd, output_format).await,
        Commands::Menu { role, route } => commands::menu::handle(role, &route, output_format).await,
        Commands::Entities => commands::resource::list_entities(output_format),
        Commands::Dashboard => commands::dashboard::handle(output_format).await,
        Commands::Resource { cmd } => commands::resource::handle(cmd, output_format).await,
    }
}
