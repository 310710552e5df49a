// src/bin/api_server.rs

use bizdata_sync::transport;
use bizdata_sync::{DataLayerConfig, DataService};
use tower_http::cors::{Any, CorsLayer};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("bizdata_sync=info,api_server=info")),
        )
        .init();

    let config = DataLayerConfig::from_env()?;
    info!(
        remote = config.remote_url.as_deref().unwrap_or("<none>"),
        local_store = %config.local_store_url,
        max_retries = config.max_retries,
        "starting data service"
    );

    // --- Service Initialization ---
    let service = DataService::from_config(&config).await?;
    let report = service.initialize().await?;
    info!(
        mode = ?report.status.mode,
        missing_tables = ?report.status.missing_tables,
        synced_tables = report.synced.len(),
        "data service ready"
    );

    // --- API Server Initialization ---
    let app_state = transport::http::AppState { service };
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);
    let app = transport::http::create_router(app_state)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", transport::http::ApiDoc::openapi()))
        .layer(cors);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    info!(addr = %listener.local_addr()?, "API server listening");
    info!("Swagger UI available at /swagger-ui");

    tokio::select! {
        result = axum::serve(listener, app) => {
            if let Err(e) = result {
                error!(error = %e, "API server stopped with an error");
                return Err(e.into());
            }
        }
        _ = tokio::signal::ctrl_c() => {
            info!("shutdown signal received (Ctrl+C)");
        }
    }

    Ok(())
}
