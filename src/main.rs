use anyhow::Result;
use az_tracker::{api, config, db};
use clap::Parser;
use std::path::PathBuf;
use tracing::info;

#[derive(Debug, Parser)]
#[command(author, version, about)]
struct Args {
    /// Path to YAML config file
    #[arg(long, default_value = "config.yaml")]
    config: PathBuf,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_target(false)
        .compact()
        .init();

    let args = Args::parse();
    let cfg = config::load(Some(&args.config))?;
    cfg.ensure_dirs()?;

    let database_url = std::env::var("DATABASE_URL")
        .unwrap_or_else(|_| format!("sqlite://{}/tracker.db", cfg.app.data_dir));

    let pool = db::init_pool(&database_url).await?;
    // Handlers re-run this per request; running it here surfaces a broken
    // database before the listener opens.
    db::ensure_schema(&pool).await?;

    let app = api::router(pool);
    let listener = tokio::net::TcpListener::bind(&cfg.server.bind_addr).await?;
    info!(addr = %cfg.server.bind_addr, "listening");
    axum::serve(listener, app).await?;

    Ok(())
}
