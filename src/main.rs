use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use spell_tracker::config::{Cli, Command, Config};
use spell_tracker::db;
use spell_tracker::rules::Dnd5eClient;
use spell_tracker::state::AppState;
use spell_tracker::{routes, seed};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // Parse CLI args and load config
    let cli = Cli::parse();
    let data_dir = Config::data_dir(&cli);
    std::fs::create_dir_all(&data_dir)?;
    tracing::info!("Data directory: {}", data_dir.display());

    let config = Config::load(&cli)?;

    // Initialize database
    let db_path = config
        .db_path()
        .context("database path not configured")?;
    let pool = db::create_pool(db_path)?;
    db::run_migrations(&pool)?;

    let rules = Dnd5eClient::from_config(&config.rules)
        .context("building the rules service client")?;
    tracing::info!("Rules reference service: {}", config.rules.base_url);

    match Config::command(&cli) {
        Command::Seed { skip_spells } => {
            seed::run(&pool, &rules, skip_spells).await?;
        }
        Command::Serve => {
            let state = AppState {
                db: pool,
                config: config.clone(),
                rules: Arc::new(rules),
            };
            let app = routes::app(state);

            let addr: SocketAddr =
                format!("{}:{}", config.server.host, config.server.port).parse()?;
            tracing::info!("Listening on http://{}", addr);

            let listener = tokio::net::TcpListener::bind(addr).await?;
            axum::serve(listener, app).await?;
        }
    }

    Ok(())
}
