//! 数据库基础设施

use sqlx::postgres::{PgConnectOptions, PgPool, PgPoolOptions};
use std::str::FromStr;
use tracing::info;

use crate::config::{ConfigError, RepositoryConfig};
use crate::core::error::ConnectionError;

/// 连接池管理，克隆后共享同一个连接池
#[derive(Clone, Debug)]
pub struct DatabaseManager {
    pool: PgPool,
}

impl DatabaseManager {
    /// 建立连接池并立即探测连通性，失败时不推迟到第一次操作
    pub async fn connect(config: &RepositoryConfig) -> Result<Self, ConnectionError> {
        config.validate()?;

        let options = PgConnectOptions::from_str(&config.database_url)
            .map_err(|e| ConfigError::Validation(format!("无效的数据库地址: {}", e)))?;

        info!(
            host = options.get_host(),
            database = options.get_database().unwrap_or_default(),
            "Connecting to order database"
        );

        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .min_connections(config.min_connections)
            .acquire_timeout(config.acquire_timeout())
            .idle_timeout(config.idle_timeout())
            .max_lifetime(config.max_lifetime())
            .connect_with(options)
            .await
            .map_err(ConnectionError::Unreachable)?;

        let manager = Self { pool };
        manager.ping().await.map_err(ConnectionError::Unreachable)?;

        Ok(manager)
    }

    /// 连通性探测
    pub async fn ping(&self) -> Result<(), sqlx::Error> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    pub fn get_pool(&self) -> &PgPool {
        &self.pool
    }

    /// 关闭连接池，等待借出的连接归还；可重复调用
    pub async fn close(&self) {
        self.pool.close().await;
    }

    pub fn is_closed(&self) -> bool {
        self.pool.is_closed()
    }
}
