use deadpool_postgres::{Config, ManagerConfig, Pool, PoolConfig, RecyclingMethod, Runtime};
use tokio_postgres::NoTls;
use tracing::info;

/// Connection pool type alias
pub type DbPool = Pool;

/// Translate application config into deadpool's config
fn pool_config(config: &config::DatabaseConfig) -> Config {
    let mut cfg = Config::new();
    cfg.host = Some(config.host.clone());
    cfg.port = Some(config.port);
    cfg.dbname = Some(config.database.clone());
    cfg.user = Some(config.username.clone());
    cfg.password = Some(config.password.clone());
    cfg.manager = Some(ManagerConfig {
        recycling_method: RecyclingMethod::Fast,
    });
    cfg.pool = Some(PoolConfig::new(config.max_connections));
    cfg
}

/// Create a connection pool and verify a connection can be obtained
pub async fn create_pool(config: &config::DatabaseConfig) -> anyhow::Result<DbPool> {
    info!(
        "Creating database pool: {}:{}/{} (max_connections={})",
        config.host, config.port, config.database, config.max_connections
    );

    let pool = pool_config(config)
        .create_pool(Some(Runtime::Tokio1), NoTls)
        .map_err(|e| anyhow::anyhow!("Failed to create pool: {}", e))?;

    let _client = pool
        .get()
        .await
        .map_err(|e| anyhow::anyhow!("Failed to connect to database: {}", e))?;

    info!("Database connection established");
    Ok(pool)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> config::DatabaseConfig {
        config::DatabaseConfig {
            host: "localhost".to_string(),
            port: 5433,
            database: "billing_test".to_string(),
            username: "postgres".to_string(),
            password: "postgres".to_string(),
            max_connections: 5,
        }
    }

    #[test]
    fn test_pool_config_maps_connection_settings() {
        let cfg = pool_config(&test_config());
        assert_eq!(cfg.host.as_deref(), Some("localhost"));
        assert_eq!(cfg.port, Some(5433));
        assert_eq!(cfg.dbname.as_deref(), Some("billing_test"));
        assert_eq!(cfg.pool.map(|p| p.max_size), Some(5));
    }

    #[tokio::test]
    async fn test_pool_builds_without_connecting() {
        let pool = pool_config(&test_config())
            .create_pool(Some(Runtime::Tokio1), NoTls)
            .expect("pool creation is lazy");
        assert_eq!(pool.status().max_size, 5);
    }
}
