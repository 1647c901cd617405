//! Mayorista - wholesale storefront and back-office service

use anyhow::Result;
use mayorista::auth::JwtVerifier;
use mayorista::config::Config;
use mayorista::images::FsImageStore;
use mayorista::notify::{Outbox, TracingMailer};
use mayorista::state::AppState;
use mayorista::store::PgStore;
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Arc::new(Config::from_env()?);

    let db = PgPoolOptions::new()
        .max_connections(10)
        .connect(&config.database_url)
        .await?;
    sqlx::migrate!("./migrations").run(&db).await?;

    let nats = match &config.nats_url {
        Some(url) => match async_nats::connect(url).await {
            Ok(client) => Some(client),
            Err(e) => {
                tracing::warn!(error = %e, "NATS unavailable, order events disabled");
                None
            }
        },
        None => None,
    };

    let state = AppState::assemble(
        Arc::new(PgStore::new(db)),
        Arc::new(FsImageStore::new(config.media_dir.clone(), config.site_url.clone())),
        Arc::new(JwtVerifier::new(&config.jwt_secret)),
        Outbox::spawn(Arc::new(TracingMailer)),
        nats,
        config.clone(),
    );

    let app = mayorista::http::router(state);
    tracing::info!("mayorista listening on {}", config.bind_addr);
    axum::serve(tokio::net::TcpListener::bind(&config.bind_addr).await?, app).await?;
    Ok(())
}
