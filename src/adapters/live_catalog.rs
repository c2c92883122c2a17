// ライブ接続スキーマカタログ
//
// 稼働中のデータベースに接続し、INFORMATION_SCHEMA/PRAGMA からテーブル定義を解決するカタログ。
// 接続やクエリの失敗はすべて SourceUnavailable として返します。

use crate::adapters::database::DatabaseConnectionService;
use crate::adapters::database_introspector::{create_introspector, DatabaseIntrospector};
use crate::core::catalog::{NameMatching, SchemaCatalog};
use crate::core::config::{DatabaseConfig, Dialect};
use crate::core::error::CatalogError;
use crate::core::schema::TableDescriptor;
use async_trait::async_trait;
use sqlx::AnyPool;
use tracing::debug;

/// ライブ接続スキーマカタログ
pub struct LiveCatalog {
    source_name: String,
    dialect: Dialect,
    pool: AnyPool,
    introspector: Box<dyn DatabaseIntrospector>,
    matching: NameMatching,
}

impl LiveCatalog {
    /// 接続設定からカタログを作成
    ///
    /// 接続は最初の解決時に確立されます。
    pub fn connect(
        source_name: impl Into<String>,
        dialect: Dialect,
        config: &DatabaseConfig,
    ) -> Result<Self, CatalogError> {
        let source_name = source_name.into();
        let pool = DatabaseConnectionService::new()
            .create_lazy_pool(dialect, config)
            .map_err(|e| CatalogError::unavailable(&source_name, e))?;
        Ok(Self::with_pool(source_name, dialect, pool))
    }

    /// 既存の接続プールからカタログを作成
    pub fn with_pool(source_name: impl Into<String>, dialect: Dialect, pool: AnyPool) -> Self {
        Self {
            source_name: source_name.into(),
            dialect,
            pool,
            introspector: create_introspector(dialect),
            matching: NameMatching::Exact,
        }
    }

    /// テーブル名の照合方法を指定
    pub fn with_matching(mut self, matching: NameMatching) -> Self {
        self.matching = matching;
        self
    }

    pub fn dialect(&self) -> Dialect {
        self.dialect
    }

    fn unavailable(&self, error: anyhow::Error) -> CatalogError {
        CatalogError::unavailable(&self.source_name, format!("{:#}", error))
    }
}

#[async_trait]
impl SchemaCatalog for LiveCatalog {
    fn source_name(&self) -> &str {
        &self.source_name
    }

    fn name_matching(&self) -> NameMatching {
        self.matching
    }

    async fn get_table(&self, name: &str) -> Result<Option<TableDescriptor>, CatalogError> {
        let names = self.list_tables().await?;
        let Some(actual) = names.into_iter().find(|n| self.matching.matches(n, name)) else {
            debug!(source = %self.source_name, table = name, "table not present in live source");
            return Ok(None);
        };

        let table = self
            .introspector
            .describe_table(&self.pool, &actual)
            .await
            .map_err(|e| self.unavailable(e))?;
        Ok(Some(table))
    }

    async fn list_tables(&self) -> Result<Vec<String>, CatalogError> {
        let mut names = self
            .introspector
            .get_table_names(&self.pool)
            .await
            .map_err(|e| self.unavailable(e))?;
        names.sort();
        Ok(names)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    /// テスト用のSQLiteデータベースを作成して書き込み可能なプールを返す
    async fn sqlite_fixture(dir: &TempDir) -> AnyPool {
        sqlx::any::install_default_drivers();
        let path = dir.path().join("live.db");
        let url = format!("sqlite://{}?mode=rwc", path.display());
        let pool = sqlx::pool::PoolOptions::<sqlx::Any>::new()
            .max_connections(1)
            .connect(&url)
            .await
            .unwrap();

        for statement in [
            "CREATE TABLE customers (id INTEGER PRIMARY KEY, email VARCHAR(100) NOT NULL UNIQUE)",
            "CREATE TABLE orders (id INTEGER PRIMARY KEY, customer_id INTEGER NOT NULL REFERENCES customers(id), note TEXT)",
            "CREATE INDEX ix_orders_customer ON orders (customer_id)",
        ] {
            sqlx::query(statement).execute(&pool).await.unwrap();
        }
        pool
    }

    #[tokio::test]
    async fn test_live_sqlite_catalog() {
        let dir = TempDir::new().unwrap();
        let pool = sqlite_fixture(&dir).await;
        let catalog = LiveCatalog::with_pool("live", Dialect::SQLite, pool);

        assert_eq!(
            catalog.list_tables().await.unwrap(),
            vec!["customers", "orders"]
        );

        let orders = catalog.get_table("orders").await.unwrap().unwrap();
        assert_eq!(orders.column_names(), vec!["id", "customer_id", "note"]);
        assert_eq!(orders.primary_key_columns().unwrap(), ["id".to_string()]);
        assert!(orders
            .constraints
            .iter()
            .any(|c| c.kind() == "FOREIGN_KEY"));
        assert_eq!(orders.indexes.len(), 1);

        let customers = catalog.get_table("customers").await.unwrap().unwrap();
        assert!(customers.constraints.iter().any(|c| c.kind() == "UNIQUE"));

        assert!(catalog.get_table("invoices").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_unreachable_source_is_unavailable() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("missing.db");
        let config = DatabaseConfig {
            timeout: Some(1),
            ..DatabaseConfig::new(missing.display().to_string())
        };

        let catalog = LiveCatalog::connect("live", Dialect::SQLite, &config).unwrap();

        let err = catalog.list_tables().await.unwrap_err();
        assert!(err.is_source_unavailable());
        assert!(catalog.lookup("orders").await.is_unavailable());
    }
}
