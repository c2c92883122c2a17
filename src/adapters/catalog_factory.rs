// スキーマカタログファクトリー
//
// 設定ファイルのソース定義から、対応する SchemaCatalog 実装を組み立てます。

use crate::adapters::live_catalog::LiveCatalog;
use crate::adapters::package_catalog::PackageCatalog;
use crate::core::catalog::SchemaCatalog;
use crate::core::config::{SourceConfig, SourceKind};
use anyhow::{Context, Result};
use std::path::Path;
use tracing::debug;

/// ソース設定からスキーマカタログを作成
///
/// パッケージの相対パスは設定ファイルのあるディレクトリ（`base_dir`）から解決します。
/// ライブ接続は遅延接続のため、ここでは接続を確立しません。
pub fn create_catalog(
    name: &str,
    source: &SourceConfig,
    base_dir: &Path,
) -> Result<Box<dyn SchemaCatalog>> {
    source
        .validate()
        .with_context(|| format!("Invalid configuration for source '{}'", name))?;

    let matching = source.name_matching();
    match &source.kind {
        SourceKind::Package { path } => {
            let path = if path.is_absolute() {
                path.clone()
            } else {
                base_dir.join(path)
            };
            debug!(source = name, path = %path.display(), "using schema package catalog");
            Ok(Box::new(
                PackageCatalog::new(name, path).with_matching(matching),
            ))
        }
        SourceKind::Database {
            dialect,
            connection,
        } => {
            debug!(source = name, %dialect, "using live database catalog");
            let catalog = LiveCatalog::connect(name, *dialect, connection)
                .with_context(|| format!("Failed to prepare connection for source '{}'", name))?;
            Ok(Box::new(catalog.with_matching(matching)))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::{DatabaseConfig, Dialect};
    use std::fs;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_package_path_resolved_from_base_dir() {
        let temp_dir = TempDir::new().unwrap();
        fs::create_dir(temp_dir.path().join("schema")).unwrap();
        fs::write(
            temp_dir.path().join("schema/users.yaml"),
            r#"
version: "1.0"
tables:
  users:
    name: users
    columns:
      - name: id
        type:
          kind: INTEGER
        nullable: false
"#,
        )
        .unwrap();

        let source = SourceConfig::package("schema");
        let catalog = create_catalog("project", &source, temp_dir.path()).unwrap();

        assert_eq!(catalog.source_name(), "project");
        assert_eq!(catalog.list_tables().await.unwrap(), vec!["users"]);
    }

    #[tokio::test]
    async fn test_case_insensitive_source() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(
            temp_dir.path().join("schema.yaml"),
            r#"
version: "1.0"
tables:
  Users:
    name: Users
    columns: []
"#,
        )
        .unwrap();

        let mut source = SourceConfig::package("schema.yaml");
        source.case_insensitive = true;
        let catalog = create_catalog("project", &source, temp_dir.path()).unwrap();

        assert!(catalog.get_table("users").await.unwrap().is_some());
    }

    #[test]
    fn test_invalid_source_is_rejected() {
        let source = SourceConfig::database(Dialect::PostgreSQL, DatabaseConfig::new(""));

        let result = create_catalog("prod", &source, Path::new("."));
        assert!(result.is_err());
        let message = format!("{:#}", result.err().unwrap());
        assert!(message.contains("prod"));
    }

    #[tokio::test]
    async fn test_database_source_is_lazy() {
        let source = SourceConfig::database(
            Dialect::PostgreSQL,
            DatabaseConfig {
                host: "db.invalid".to_string(),
                ..DatabaseConfig::new("app")
            },
        );

        let catalog = create_catalog("prod", &source, Path::new(".")).unwrap();
        assert_eq!(catalog.source_name(), "prod");
    }
}
