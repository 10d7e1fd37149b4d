use bgp_models::config::{AppConfig, StorageBackend};
use bgp_models::seed;
use bgp_models::store::{MemoryStore, PostgresStore, Store};
use std::sync::Arc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file if it exists
    dotenvy::dotenv().ok();

    // Initialize logging with explicit filter to suppress sqlx debug logs
    use env_logger::Builder;
    use log::LevelFilter;

    Builder::new()
        .filter_level(LevelFilter::Info)
        .filter_module("sqlx", LevelFilter::Warn)
        .parse_default_env()
        .init();

    println!("BGP models API server");

    // Load configuration
    let config = AppConfig::load()?;
    println!(
        "Configuration loaded: server={}:{} backend={:?}",
        config.server.host, config.server.port, config.database.backend
    );

    match config.database.backend {
        StorageBackend::Memory => start(Arc::new(MemoryStore::new()), &config).await,
        StorageBackend::Postgres => {
            println!("Connecting to PostgreSQL...");
            let database_url = config.database_url()?;
            let max_connections = config.database.max_connections.unwrap_or(20);
            let postgres_store = PostgresStore::new(&database_url, max_connections).await?;

            println!("Running database migrations...");
            postgres_store.migrate().await?;

            start(Arc::new(postgres_store), &config).await
        }
    }
}

async fn start<S: Store + 'static>(store: Arc<S>, config: &AppConfig) -> anyhow::Result<()> {
    seed::load_statuses(&*store).await?;

    // Load seed data for demonstration (optional)
    if std::env::var("LOAD_SEED_DATA").unwrap_or_default() == "true" {
        println!("Loading seed data...");
        seed::load_seed_data(&*store).await?;
        println!("Seed data loaded successfully");
    }

    bgp_models::run_server(store, config).await
}
