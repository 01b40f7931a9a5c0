use std::net::SocketAddr;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use storefront_backend::api::{self, Adapters, AppState};
use storefront_backend::config::Config;
use storefront_backend::database::{self, PoolConfig, Stores};

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,tower_http=info"));
    let registry = tracing_subscriber::registry().with(filter);

    if std::env::var("LOG_FORMAT").map(|v| v == "json").unwrap_or(false) {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    init_tracing();

    let config = Config::from_env()?;

    tracing::info!("Starting storefront backend");
    tracing::info!("Environment: {}", config.server.environment);
    tracing::info!("Store currency: {}", config.store.currency.to_uppercase());
    tracing::info!("Configured providers: {:?}", config.configured_providers());

    let pool = database::init_pool(
        &config.database.url,
        Some(PoolConfig {
            max_connections: config.database.max_connections,
            database_name: config.database.name.clone(),
            ..PoolConfig::default()
        }),
    )
    .await?;
    database::run_migrations(&pool).await?;

    let adapters = Adapters::from_config(&config)?;
    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port).parse()?;
    let app = api::router(AppState::new(config, Stores::postgres(pool), adapters));

    tracing::info!("Server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
