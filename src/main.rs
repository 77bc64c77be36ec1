//! OpenSASE Catalog - Self-hosted catalog service

use anyhow::Result;
use opensase_catalog::{api, Catalog, Config, PgStore};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::from_env()?;
    tracing_subscriber::registry().with(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into())).with(tracing_subscriber::fmt::layer()).init();

    let store = PgStore::connect(&config.database_url, config.max_connections).await?;
    store.migrate().await?;

    let nats = match &config.nats_url {
        Some(url) => match async_nats::connect(url.as_str()).await {
            Ok(client) => Some(client),
            Err(e) => {
                tracing::warn!(error = %e, "NATS unavailable, events disabled");
                None
            }
        },
        None => None,
    };

    let catalog = Catalog::new(store, config.codes.clone(), config.product_code_attempts).with_events(nats);
    let app = api::router(catalog).layer(TraceLayer::new_for_http()).layer(CorsLayer::permissive());

    tracing::info!(producer = %config.codes.producer_code, country = %config.codes.country_code, "🚀 OpenSASE Catalog listening on 0.0.0.0:{}", config.port);
    axum::serve(tokio::net::TcpListener::bind(format!("0.0.0.0:{}", config.port)).await?, app).await?;
    Ok(())
}
