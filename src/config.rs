use anyhow::{anyhow, Context, Result};
use serde::Deserialize;
use std::env;

use crate::payments::providers::hyperpay::HyperPayConfig;
use crate::payments::providers::stripe::StripeConfig;
use crate::shipping::providers::aramex::AramexConfig;
use crate::shipping::providers::dhl::DhlConfig;

#[derive(Debug, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub cors: CorsConfig,
    pub auth: AuthConfig,
    pub store: StoreConfig,
    pub stripe: StripeConfig,
    pub hyperpay: HyperPayConfig,
    pub dhl: DhlConfig,
    pub aramex: AramexConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub environment: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    /// Overrides the database named in the URL when set
    pub name: Option<String>,
    pub max_connections: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CorsConfig {
    /// `["*"]` allows any origin
    pub allowed_origins: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    pub jwt_secret: String,
    pub token_expiry_hours: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StoreConfig {
    pub currency: String,
    pub provider_timeout_secs: u64,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let server = ServerConfig {
            host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: env::var("PORT")
                .unwrap_or_else(|_| "8000".to_string())
                .parse()
                .context("PORT must be a valid number")?,
            environment: env::var("ENVIRONMENT").unwrap_or_else(|_| "development".to_string()),
        };

        let database = DatabaseConfig {
            url: env::var("DATABASE_URL").context("DATABASE_URL not set")?,
            name: env::var("DB_NAME").ok().filter(|s| !s.trim().is_empty()),
            max_connections: env::var("DATABASE_MAX_CONNECTIONS")
                .unwrap_or_else(|_| "20".to_string())
                .parse()
                .context("DATABASE_MAX_CONNECTIONS must be a valid number")?,
        };

        let cors = CorsConfig {
            allowed_origins: parse_origins(
                &env::var("CORS_ORIGINS").unwrap_or_else(|_| "*".to_string()),
            ),
        };

        let auth = AuthConfig {
            jwt_secret: env::var("JWT_SECRET").context("JWT_SECRET not set")?,
            token_expiry_hours: env::var("JWT_EXPIRY_HOURS")
                .unwrap_or_else(|_| "168".to_string())
                .parse()
                .context("JWT_EXPIRY_HOURS must be a valid number")?,
        };

        let store = StoreConfig {
            currency: env::var("STORE_CURRENCY")
                .unwrap_or_else(|_| "sar".to_string())
                .to_lowercase(),
            provider_timeout_secs: env::var("PROVIDER_TIMEOUT_SECS")
                .unwrap_or_else(|_| "30".to_string())
                .parse()
                .context("PROVIDER_TIMEOUT_SECS must be a valid number")?,
        };

        let timeout = store.provider_timeout_secs;
        let production = server.environment == "production";

        let config = Config {
            server,
            database,
            cors,
            auth,
            store,
            stripe: StripeConfig::from_env(timeout),
            hyperpay: HyperPayConfig::from_env(timeout),
            dhl: DhlConfig::from_env(timeout, production),
            aramex: AramexConfig::from_env(timeout),
        };

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        // Validate environment
        let valid_environments = ["development", "staging", "production"];
        if !valid_environments.contains(&self.server.environment.as_str()) {
            return Err(anyhow!(
                "Environment must be one of: {:?}, got {}",
                valid_environments,
                self.server.environment
            ));
        }

        if self.server.port == 0 {
            return Err(anyhow!("PORT must be greater than 0"));
        }

        if self.database.url.trim().is_empty() {
            return Err(anyhow!("DATABASE_URL cannot be empty"));
        }

        if self.database.max_connections == 0 {
            return Err(anyhow!("DATABASE_MAX_CONNECTIONS must be greater than 0"));
        }

        if self.auth.jwt_secret.len() < 16 {
            return Err(anyhow!("JWT_SECRET must be at least 16 characters"));
        }

        if self.auth.token_expiry_hours <= 0 {
            return Err(anyhow!("JWT_EXPIRY_HOURS must be greater than 0"));
        }

        if self.store.currency.len() != 3 {
            return Err(anyhow!(
                "STORE_CURRENCY must be a three-letter code, got {}",
                self.store.currency
            ));
        }

        if self.store.provider_timeout_secs == 0 {
            return Err(anyhow!("PROVIDER_TIMEOUT_SECS must be greater than 0"));
        }

        if self.cors.allowed_origins.is_empty() {
            return Err(anyhow!("CORS_ORIGINS must contain at least one origin"));
        }

        Ok(())
    }

    /// Provider names whose credentials are present
    pub fn configured_providers(&self) -> Vec<&'static str> {
        let mut providers = Vec::new();
        if self.stripe.api_key.is_some() {
            providers.push("stripe");
        }
        if self.hyperpay.access_token.is_some() && self.hyperpay.entity_id.is_some() {
            providers.push("hyperpay");
        }
        if self.dhl.username.is_some() && self.dhl.password.is_some() {
            providers.push("dhl");
        }
        if self.aramex.username.is_some() && self.aramex.password.is_some() {
            providers.push("aramex");
        }
        providers
    }
}

fn parse_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

/// Reads an optional variable, treating blank values as unset
pub(crate) fn optional_env(key: &str) -> Option<String> {
    env::var(key).ok().filter(|s| !s.trim().is_empty())
}

#[cfg(test)]
pub(crate) fn test_config() -> Config {
    Config {
        server: ServerConfig {
            host: "127.0.0.1".to_string(),
            port: 8000,
            environment: "development".to_string(),
        },
        database: DatabaseConfig {
            url: "postgres://localhost/storefront".to_string(),
            name: None,
            max_connections: 5,
        },
        cors: CorsConfig {
            allowed_origins: vec!["*".to_string()],
        },
        auth: AuthConfig {
            jwt_secret: "test-secret-with-enough-length".to_string(),
            token_expiry_hours: 24,
        },
        store: StoreConfig {
            currency: "sar".to_string(),
            provider_timeout_secs: 30,
        },
        stripe: StripeConfig::default(),
        hyperpay: HyperPayConfig::default(),
        dhl: DhlConfig::default(),
        aramex: AramexConfig::default(),
    }
}
