use clap::Parser;
use dotenv::dotenv;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;

use commands::{App, Cli};
use shared_config::AppConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Loading Env Vars
    dotenv().ok();

    // Logs go to stderr so stdout stays machine-readable JSON
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    let config = AppConfig::from_env();
    info!("Using provider API at {}", config.api_base_url);

    let app = App::new(&config);
    let outcome = app.run(cli.command).await;

    println!("{}", serde_json::to_string_pretty(&outcome)?);

    if !outcome.success {
        std::process::exit(1);
    }
    Ok(())
}
