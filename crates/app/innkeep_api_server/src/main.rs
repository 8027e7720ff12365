//! Innkeep API server binary.
//!
//! Connects to PostgreSQL, runs migrations, and serves the auth API.

use clap::Parser;
use sqlx::postgres::PgPoolOptions;
use tracing::info;

use innkeep_api::config::ApiConfig;

/// CLI arguments for the API server.
#[derive(Parser, Debug)]
#[command(name = "innkeep_api_server", about = "Innkeep auth API server")]
struct Args {
    /// Address to bind the HTTP listener.
    #[arg(long, env = "BIND_ADDR", default_value = "127.0.0.1:8080")]
    bind_addr: String,

    /// PostgreSQL connection URL.
    #[arg(
        long,
        env = "DATABASE_URL",
        default_value = "postgres://localhost:5432/innkeep"
    )]
    database_url: String,

    /// Maximum number of database connections in the pool.
    #[arg(long, default_value_t = 5)]
    max_connections: u32,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,innkeep_api=debug,innkeep_core=debug".parse().unwrap()),
        )
        .init();

    let args = Args::parse();

    info!(database_url = %args.database_url, "starting innkeep_api_server");

    let pool = PgPoolOptions::new()
        .max_connections(args.max_connections)
        .acquire_timeout(std::time::Duration::from_secs(30))
        .connect(&args.database_url)
        .await?;

    info!("running database migrations");
    innkeep_api::migrate(&pool).await?;

    let config = ApiConfig {
        bind_addr: args.bind_addr,
        database_url: args.database_url,
        ..ApiConfig::from_env()
    };
    let codec = config.codec();

    let state = innkeep_api::AppState {
        pool,
        config: config.clone(),
        codec,
    };

    let app = innkeep_api::router(state);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    info!(addr = %listener.local_addr()?, "innkeep API listening");

    axum::serve(listener, app).await?;

    Ok(())
}
