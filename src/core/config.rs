// 設定ファイル管理
//
// 設定ファイル（YAML形式）の読み込みと検証、
// 名前付きスキーマソース（スキーマパッケージ・データベース接続）の管理を行います。

use crate::core::catalog::NameMatching;
use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// データベース方言
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dialect {
    #[serde(rename = "postgresql")]
    PostgreSQL,
    #[serde(rename = "mysql")]
    MySQL,
    #[serde(rename = "sqlite")]
    SQLite,
}

impl std::fmt::Display for Dialect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Dialect::PostgreSQL => write!(f, "postgresql"),
            Dialect::MySQL => write!(f, "mysql"),
            Dialect::SQLite => write!(f, "sqlite"),
        }
    }
}

/// 設定
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// 設定ファイルのバージョン
    pub version: String,

    /// 名前付きスキーマソース
    pub sources: HashMap<String, SourceConfig>,
}

impl Config {
    /// デフォルトの設定ファイルパス
    pub const DEFAULT_CONFIG_PATH: &'static str = crate::core::naming::CONFIG_FILE;

    /// ファイルから設定を読み込む
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;
        content.parse()
    }

    /// 指定された名前のスキーマソースを取得
    pub fn source(&self, name: &str) -> Result<&SourceConfig> {
        self.sources.get(name).ok_or_else(|| {
            anyhow!(
                "Source '{}' not found. Available sources: {:?}",
                name,
                self.source_names()
            )
        })
    }

    /// スキーマソース名の一覧（名前順）
    pub fn source_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.sources.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// 設定の妥当性を検証
    pub fn validate(&self) -> Result<()> {
        if self.version.is_empty() {
            return Err(anyhow!("Config file version is not specified"));
        }

        if self.sources.is_empty() {
            return Err(anyhow!("At least one source configuration is required"));
        }

        for (source_name, source) in &self.sources {
            source
                .validate()
                .with_context(|| format!("Invalid config for source '{}'", source_name))?;
        }

        Ok(())
    }
}

/// std::str::FromStrトレイトの実装
impl FromStr for Config {
    type Err = anyhow::Error;

    fn from_str(yaml: &str) -> Result<Self, Self::Err> {
        serde_saphyr::from_str(yaml).with_context(|| "Failed to parse config file")
    }
}

/// スキーマソース設定
///
/// 1つのプロジェクト（またはデータベース接続）に対応します。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    /// ソースの種類と接続先
    #[serde(flatten)]
    pub kind: SourceKind,

    /// テーブル名の大文字小文字を区別しない
    #[serde(default)]
    pub case_insensitive: bool,

    /// デプロイ前に実行するスクリプト
    #[serde(default)]
    pub pre_deploy_script: Option<PathBuf>,

    /// デプロイ後に実行するスクリプト
    #[serde(default)]
    pub post_deploy_script: Option<PathBuf>,
}

impl SourceConfig {
    /// スキーマパッケージのソースを作成
    pub fn package(path: impl Into<PathBuf>) -> Self {
        Self::from_kind(SourceKind::Package { path: path.into() })
    }

    /// データベース接続のソースを作成
    pub fn database(dialect: Dialect, connection: DatabaseConfig) -> Self {
        Self::from_kind(SourceKind::Database {
            dialect,
            connection,
        })
    }

    fn from_kind(kind: SourceKind) -> Self {
        Self {
            kind,
            case_insensitive: false,
            pre_deploy_script: None,
            post_deploy_script: None,
        }
    }

    /// テーブル名の照合方法
    pub fn name_matching(&self) -> NameMatching {
        if self.case_insensitive {
            NameMatching::CaseInsensitive
        } else {
            NameMatching::Exact
        }
    }

    /// Validate source configuration
    pub fn validate(&self) -> Result<()> {
        match &self.kind {
            SourceKind::Package { path } => {
                if path.as_os_str().is_empty() {
                    return Err(anyhow!("Package path is not specified"));
                }
                Ok(())
            }
            SourceKind::Database { connection, .. } => connection.validate(),
        }
    }
}

/// スキーマソースの種類
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum SourceKind {
    /// YAMLスキーマパッケージ（ファイルまたはディレクトリ）
    Package {
        /// パッケージのパス
        path: PathBuf,
    },
    /// ライブデータベース接続
    Database {
        /// データベース方言
        dialect: Dialect,
        /// 接続設定
        connection: DatabaseConfig,
    },
}

/// データベース接続設定
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// ホスト名（SQLiteの場合は不要）
    #[serde(default = "default_host")]
    pub host: String,

    /// ポート番号
    #[serde(default = "default_port")]
    pub port: u16,

    /// データベース名（SQLiteの場合はファイルパス）
    pub database: String,

    /// ユーザー名
    pub user: Option<String>,

    /// パスワード
    pub password: Option<String>,

    /// 接続タイムアウト（秒）
    pub timeout: Option<u64>,
}

fn default_host() -> String {
    "localhost".to_string()
}

fn default_port() -> u16 {
    5432 // PostgreSQLのデフォルトポート
}

impl DatabaseConfig {
    /// データベース名だけを指定して作成
    pub fn new(database: impl Into<String>) -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            database: database.into(),
            user: None,
            password: None,
            timeout: None,
        }
    }

    /// Validate database configuration
    pub fn validate(&self) -> Result<()> {
        if self.database.is_empty() {
            return Err(anyhow!("Database name is not specified"));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CONFIG_YAML: &str = r#"
version: "1.0"
sources:
  project:
    type: package
    path: schema
    pre_deploy_script: scripts/pre.sql
  production:
    type: database
    dialect: postgresql
    case_insensitive: true
    connection:
      host: db.internal
      database: app
      user: merge
"#;

    #[test]
    fn test_dialect_display() {
        assert_eq!(Dialect::PostgreSQL.to_string(), "postgresql");
        assert_eq!(Dialect::MySQL.to_string(), "mysql");
        assert_eq!(Dialect::SQLite.to_string(), "sqlite");
    }

    #[test]
    fn test_parse_sources() {
        let config: Config = CONFIG_YAML.parse().unwrap();
        config.validate().unwrap();

        assert_eq!(config.source_names(), vec!["production", "project"]);

        let project = config.source("project").unwrap();
        assert!(matches!(project.kind, SourceKind::Package { ref path } if path == Path::new("schema")));
        assert_eq!(
            project.pre_deploy_script.as_deref(),
            Some(Path::new("scripts/pre.sql"))
        );
        assert_eq!(project.name_matching(), NameMatching::Exact);

        let production = config.source("production").unwrap();
        match &production.kind {
            SourceKind::Database {
                dialect,
                connection,
            } => {
                assert_eq!(*dialect, Dialect::PostgreSQL);
                assert_eq!(connection.host, "db.internal");
                assert_eq!(connection.port, 5432);
            }
            other => panic!("Expected database source, got {:?}", other),
        }
        assert_eq!(production.name_matching(), NameMatching::CaseInsensitive);
    }

    #[test]
    fn test_unknown_source_lists_available() {
        let config: Config = CONFIG_YAML.parse().unwrap();
        let err = config.source("staging").unwrap_err();
        assert!(err.to_string().contains("production"));
    }

    #[test]
    fn test_validate_rejects_empty_sources() {
        let config = Config {
            version: "1.0".to_string(),
            sources: HashMap::new(),
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_empty_database() {
        let mut config = Config {
            version: "1.0".to_string(),
            sources: HashMap::new(),
        };
        config.sources.insert(
            "db".to_string(),
            SourceConfig::database(Dialect::SQLite, DatabaseConfig::new("")),
        );
        assert!(config.validate().is_err());
    }
}
