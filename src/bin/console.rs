use clap::Parser;
use admin_console::cli::utils::ErrorReported;
use admin_console::cli::Cli;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let config = admin_console::config::config();
    tracing::debug!(
        "Console running in {:?} mode against {}",
        config.environment,
        config.gateway.base_url
    );

    let cli = Cli::parse();

    if let Err(e) = admin_console::cli::run(cli).await {
        if e.is::<ErrorReported>() {
            std::process::exit(1);
        }
        let verbose = matches!(std::env::var("CLI_VERBOSE").as_deref(), Ok("true") | Ok("1"));
        if verbose || admin_console::is_development!() {
            eprintln!("Error: {e:?}");
        } else {
            eprintln!("Error: {e}");
        }
        std::process::exit(1);
    }

    Ok(())
}
