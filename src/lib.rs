pub mod api;
pub mod config;
pub mod error;
pub mod logic;
pub mod model;
pub mod seed;
pub mod serializers;
pub mod store;

// Export API types
pub use api::handlers;
pub use api::routes;

pub use error::{Error, FieldErrors, Result};

// Export all model types
pub use model::*;

// Export store types
pub use store::{MemoryStore, PostgresStore, Store};

/// Serve the API on an already bound listener until the task is dropped.
pub async fn serve<S: Store + 'static>(
    listener: tokio::net::TcpListener,
    store: std::sync::Arc<S>,
    api: config::ApiConfig,
) -> anyhow::Result<()> {
    use axum::{extract::Request, ServiceExt};

    let app = routes::build_app(store, api);
    axum::serve(listener, ServiceExt::<Request>::into_make_service(app)).await?;

    Ok(())
}

/// Bind the configured address and serve the API.
pub async fn run_server<S: Store + 'static>(
    store: std::sync::Arc<S>,
    config: &config::AppConfig,
) -> anyhow::Result<()> {
    let bind_address = config.server_address();
    let listener = tokio::net::TcpListener::bind(&bind_address).await?;
    log::info!("BGP models API listening on http://{}", bind_address);

    serve(listener, store, config.api.clone()).await
}
