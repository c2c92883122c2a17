// スキーマパッケージカタログ
//
// ディスク上のYAMLスキーマパッケージ（ファイルまたはディレクトリ）をソースとするカタログ。
// 解決のたびにパッケージを読み直すため、ビルドし直されたパッケージの内容が常に反映されます。

use crate::core::catalog::{NameMatching, SchemaCatalog};
use crate::core::error::CatalogError;
use crate::core::schema::{SchemaDocument, TableDescriptor};
use crate::services::schema_parser::SchemaParserService;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tracing::debug;

/// スキーマパッケージカタログ
#[derive(Debug, Clone)]
pub struct PackageCatalog {
    source_name: String,
    path: PathBuf,
    matching: NameMatching,
    parser: SchemaParserService,
}

impl PackageCatalog {
    /// 新しいPackageCatalogを作成
    pub fn new(source_name: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            source_name: source_name.into(),
            path: path.into(),
            matching: NameMatching::Exact,
            parser: SchemaParserService::new(),
        }
    }

    /// テーブル名の照合方法を指定
    pub fn with_matching(mut self, matching: NameMatching) -> Self {
        self.matching = matching;
        self
    }

    /// パッケージのパスを取得
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// パッケージを読み込む
    ///
    /// 読み込みや解析の失敗は SourceUnavailable として返します。
    async fn load(&self) -> Result<SchemaDocument, CatalogError> {
        let parser = self.parser.clone();
        let path = self.path.clone();
        let loaded = tokio::task::spawn_blocking(move || parser.parse_package(&path))
            .await
            .map_err(|e| CatalogError::unavailable(&self.source_name, e))?;

        let document = loaded
            .map_err(|e| CatalogError::unavailable(&self.source_name, format!("{:#}", e)))?;
        debug!(
            source = %self.source_name,
            tables = document.table_count(),
            "schema package loaded"
        );
        Ok(document)
    }
}

#[async_trait]
impl SchemaCatalog for PackageCatalog {
    fn source_name(&self) -> &str {
        &self.source_name
    }

    fn name_matching(&self) -> NameMatching {
        self.matching
    }

    async fn get_table(&self, name: &str) -> Result<Option<TableDescriptor>, CatalogError> {
        let mut document = self.load().await?;

        let key = match self.matching {
            NameMatching::Exact => document.tables.contains_key(name).then(|| name.to_string()),
            NameMatching::CaseInsensitive => document
                .tables
                .keys()
                .find(|k| self.matching.matches(k, name))
                .cloned(),
        };

        Ok(key.and_then(|k| document.tables.remove(&k)))
    }

    async fn list_tables(&self) -> Result<Vec<String>, CatalogError> {
        let document = self.load().await?;
        let mut names: Vec<String> = document.tables.into_keys().collect();
        names.sort();
        Ok(names)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    const SCHEMA_YAML: &str = r#"
version: "1.0"
tables:
  Customers:
    name: Customers
    columns:
      - name: Id
        type:
          kind: INTEGER
        nullable: false
    constraints:
      - type: PRIMARY_KEY
        columns: [Id]
  Orders:
    name: Orders
    columns:
      - name: Id
        type:
          kind: INTEGER
        nullable: false
"#;

    fn package_dir() -> TempDir {
        let temp_dir = TempDir::new().unwrap();
        fs::write(temp_dir.path().join("schema.yaml"), SCHEMA_YAML).unwrap();
        temp_dir
    }

    #[tokio::test]
    async fn test_get_table_from_package() {
        let dir = package_dir();
        let catalog = PackageCatalog::new("project", dir.path());

        let customers = catalog.get_table("Customers").await.unwrap().unwrap();
        assert_eq!(customers.primary_key_columns().unwrap(), ["Id".to_string()]);

        assert!(catalog.get_table("Invoices").await.unwrap().is_none());
        // 既定では大文字小文字を区別する
        assert!(catalog.get_table("customers").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_case_insensitive_package() {
        let dir = package_dir();
        let catalog =
            PackageCatalog::new("project", dir.path()).with_matching(NameMatching::CaseInsensitive);

        let orders = catalog.get_table("orders").await.unwrap().unwrap();
        assert_eq!(orders.name, "Orders");
    }

    #[tokio::test]
    async fn test_list_tables_sorted() {
        let dir = package_dir();
        let catalog = PackageCatalog::new("project", dir.path());

        assert_eq!(
            catalog.list_tables().await.unwrap(),
            vec!["Customers", "Orders"]
        );
    }

    #[tokio::test]
    async fn test_missing_package_is_unavailable() {
        let catalog = PackageCatalog::new("project", "/nonexistent/package");

        let err = catalog.get_table("Customers").await.unwrap_err();
        assert!(err.is_source_unavailable());
        assert!(catalog.list_tables().await.unwrap_err().is_source_unavailable());
    }

    #[tokio::test]
    async fn test_malformed_package_is_unavailable() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(temp_dir.path().join("schema.yaml"), "version: [").unwrap();
        let catalog = PackageCatalog::new("project", temp_dir.path());

        let lookup = catalog.lookup("Customers").await;
        assert!(lookup.is_unavailable());
    }
}
