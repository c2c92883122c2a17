// データベース接続アダプター
//
// SQLxを使用したデータベース接続プールの管理を行います。
// PostgreSQL、MySQL、SQLiteに対応した統一されたインターフェースを提供します。

use crate::adapters::connection_string::{build_connection_string, redact_connection_string};
use crate::core::config::{DatabaseConfig, Dialect};
use crate::core::error::DatabaseError;
use sqlx::pool::PoolOptions;
use sqlx::{Any, AnyPool};
use std::time::Duration;
use tracing::debug;

/// 既定の接続タイムアウト（秒）
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// スキーマ取得に使う最大接続数
const MAX_CONNECTIONS: u32 = 2;

/// データベース接続サービス
#[derive(Debug, Clone, Default)]
pub struct DatabaseConnectionService {}

impl DatabaseConnectionService {
    /// 新しいDatabaseConnectionServiceを作成
    pub fn new() -> Self {
        Self {}
    }

    /// データベース接続プールを作成
    ///
    /// プールは遅延接続で作成されるため、接続の失敗は最初のクエリで報告されます。
    pub fn create_lazy_pool(
        &self,
        dialect: Dialect,
        config: &DatabaseConfig,
    ) -> Result<AnyPool, DatabaseError> {
        sqlx::any::install_default_drivers();

        let connection_string = build_connection_string(dialect, config);
        debug!(
            connection = %redact_connection_string(dialect, config),
            "creating lazy connection pool"
        );

        self.create_pool_options(config.timeout)
            .connect_lazy(&connection_string)
            .map_err(|e| DatabaseError::Connection {
                message: format!("Failed to create connection pool for {}", dialect),
                cause: e.to_string(),
            })
    }

    /// プールオプションを作成
    ///
    /// # Arguments
    ///
    /// * `timeout_secs` - 接続取得のタイムアウト秒数（省略時は30秒）
    pub fn create_pool_options(&self, timeout_secs: Option<u64>) -> PoolOptions<Any> {
        PoolOptions::new()
            .max_connections(MAX_CONNECTIONS)
            .acquire_timeout(Duration::from_secs(
                timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS),
            ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_pool_options() {
        let service = DatabaseConnectionService::new();
        let pool_options = service.create_pool_options(Some(60));

        assert_eq!(pool_options.get_acquire_timeout(), Duration::from_secs(60));
        assert_eq!(pool_options.get_max_connections(), MAX_CONNECTIONS);
    }

    #[test]
    fn test_create_pool_options_default_timeout() {
        let service = DatabaseConnectionService::new();
        let pool_options = service.create_pool_options(None);

        assert_eq!(
            pool_options.get_acquire_timeout(),
            Duration::from_secs(DEFAULT_TIMEOUT_SECS)
        );
    }
}
