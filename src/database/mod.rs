pub mod error;
pub mod hyperpay_repository;
pub mod memory;
pub mod order_repository;
pub mod repository;
pub mod shipment_repository;
pub mod transaction_repository;
pub mod user_repository;

use sqlx::postgres::{PgConnectOptions, PgPoolOptions};
use sqlx::PgPool;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error as log_error, info, warn};

use self::error::{DatabaseError, DbResult};
use self::hyperpay_repository::HyperPayRepository;
use self::memory::MemoryStore;
use self::order_repository::OrderRepository;
use self::repository::{HyperPayStore, OrderStore, ShipmentStore, TransactionStore, UserStore};
use self::shipment_repository::ShipmentRepository;
use self::transaction_repository::TransactionRepository;
use self::user_repository::UserRepository;

/// Pool sizing and lifetimes. `DATABASE_MAX_CONNECTIONS` and `DB_NAME` feed
/// `max_connections` and `database_name`.
#[derive(Debug, Clone)]
pub struct PoolConfig {
    pub max_connections: u32,
    pub min_connections: u32,
    pub acquire_timeout: Duration,
    pub idle_timeout: Duration,
    pub max_lifetime: Duration,
    /// Overrides the database named in the URL
    pub database_name: Option<String>,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            max_connections: 20,
            min_connections: 2,
            acquire_timeout: Duration::from_secs(30),
            idle_timeout: Duration::from_secs(600),
            max_lifetime: Duration::from_secs(1800),
            database_name: None,
        }
    }
}

pub async fn init_pool(database_url: &str, config: Option<PoolConfig>) -> DbResult<PgPool> {
    let config = config.unwrap_or_default();

    let mut options = PgConnectOptions::from_str(database_url).map_err(|e| {
        log_error!(error = %e, "DATABASE_URL is not a valid Postgres URL");
        DatabaseError::from_sqlx(e)
    })?;
    if let Some(name) = &config.database_name {
        options = options.database(name);
    }

    info!(
        max = config.max_connections,
        min = config.min_connections,
        database = config.database_name.as_deref().unwrap_or("<from url>"),
        "Connecting to Postgres"
    );

    let pool = PgPoolOptions::new()
        .max_connections(config.max_connections)
        .min_connections(config.min_connections)
        .acquire_timeout(config.acquire_timeout)
        .idle_timeout(config.idle_timeout)
        .max_lifetime(config.max_lifetime)
        .connect_with(options)
        .await
        .map_err(|e| {
            log_error!(error = %e, "Postgres connection failed");
            DatabaseError::from_sqlx(e)
        })?;

    Ok(pool)
}

/// Applies everything under `migrations/` that has not run yet
pub async fn run_migrations(pool: &PgPool) -> DbResult<()> {
    sqlx::migrate!("./migrations").run(pool).await.map_err(|e| {
        log_error!(error = %e, "Migrations failed");
        DatabaseError::from(e)
    })?;
    info!("Schema is up to date");
    Ok(())
}

pub async fn ping(pool: &PgPool) -> DbResult<()> {
    sqlx::query("SELECT 1").execute(pool).await.map_err(|e| {
        warn!(error = %e, "Database ping failed");
        DatabaseError::from_sqlx(e)
    })?;
    Ok(())
}

/// One handle per record collection, shared by services and handlers
#[derive(Clone)]
pub struct Stores {
    pub transactions: Arc<dyn TransactionStore>,
    pub orders: Arc<dyn OrderStore>,
    pub hyperpay: Arc<dyn HyperPayStore>,
    pub shipments: Arc<dyn ShipmentStore>,
    pub users: Arc<dyn UserStore>,
    /// Present when backed by Postgres
    pub pool: Option<PgPool>,
}

impl Stores {
    pub fn postgres(pool: PgPool) -> Self {
        Self {
            transactions: Arc::new(TransactionRepository::new(pool.clone())),
            orders: Arc::new(OrderRepository::new(pool.clone())),
            hyperpay: Arc::new(HyperPayRepository::new(pool.clone())),
            shipments: Arc::new(ShipmentRepository::new(pool.clone())),
            users: Arc::new(UserRepository::new(pool.clone())),
            pool: Some(pool),
        }
    }

    pub fn in_memory() -> Self {
        let store = Arc::new(MemoryStore::new());
        Self {
            transactions: store.clone(),
            orders: store.clone(),
            hyperpay: store.clone(),
            shipments: store.clone(),
            users: store,
            pool: None,
        }
    }

    /// Reports whether the backing database answers
    pub async fn is_healthy(&self) -> bool {
        match &self.pool {
            Some(pool) => ping(pool).await.is_ok(),
            None => true,
        }
    }
}
