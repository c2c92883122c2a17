// スキーマパーサーサービス
//
// YAMLスキーマパッケージの読み込みと解析を行うサービス。
// パッケージは単一のYAMLファイル、またはYAMLファイルを含むディレクトリです。
// ディレクトリの場合はすべてのファイルを統合したスキーマ文書を生成します。

use crate::core::error::IoError;
use crate::core::schema::SchemaDocument;
use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// スキーマパーサーサービス
#[derive(Debug, Clone, Default)]
pub struct SchemaParserService {}

impl SchemaParserService {
    /// 新しいSchemaParserServiceを作成
    pub fn new() -> Self {
        Self {}
    }

    /// スキーマパッケージを読み込む
    ///
    /// # Arguments
    ///
    /// * `path` - YAMLファイル、またはYAMLファイルを含むディレクトリ
    ///
    /// # Errors
    ///
    /// - パスが存在しない場合
    /// - ファイルの読み込み、またはYAMLの解析に失敗した場合
    pub fn parse_package(&self, path: &Path) -> Result<SchemaDocument> {
        if path.is_dir() {
            self.parse_schema_directory(path)
        } else {
            self.parse_schema_file(path)
        }
    }

    /// 指定されたディレクトリからすべてのYAMLファイルを読み込み、統合されたスキーマ文書を返す
    pub fn parse_schema_directory(&self, schema_dir: &Path) -> Result<SchemaDocument> {
        if !schema_dir.exists() {
            return Err(IoError::FileNotFound {
                path: schema_dir.display().to_string(),
            }
            .into());
        }

        let yaml_files = self.scan_yaml_files(schema_dir)?;
        debug!(dir = %schema_dir.display(), files = yaml_files.len(), "scanning schema package");

        // YAMLファイルが存在しない場合は空のスキーマを返す
        let mut merged = SchemaDocument::new("1.0".to_string());

        for (i, file_path) in yaml_files.iter().enumerate() {
            let document = self
                .parse_schema_file(file_path)
                .with_context(|| format!("Failed to parse schema file: {:?}", file_path))?;

            // 最初のファイルのバージョンを使用
            if i == 0 {
                merged.version = document.version;
            }

            for (table_name, table) in document.tables {
                if merged.tables.contains_key(&table_name) {
                    warn!(
                        table = %table_name,
                        file = %file_path.display(),
                        "table defined in multiple schema files, later definition wins"
                    );
                }
                merged.tables.insert(table_name, table);
            }
        }

        Ok(merged)
    }

    /// 単一のYAMLファイルを解析してスキーマ文書に変換
    ///
    /// テーブル名が省略されたテーブル定義には、マップのキーを名前として設定します。
    pub fn parse_schema_file(&self, file_path: &Path) -> Result<SchemaDocument> {
        if !file_path.exists() {
            return Err(IoError::FileNotFound {
                path: file_path.display().to_string(),
            }
            .into());
        }

        let content = fs::read_to_string(file_path).map_err(|e| IoError::FileRead {
            path: file_path.display().to_string(),
            cause: e.to_string(),
        })?;

        let mut document: SchemaDocument = serde_saphyr::from_str(&content)
            .with_context(|| format!("Failed to parse YAML: {:?}", file_path))?;

        for (key, table) in document.tables.iter_mut() {
            if table.name.is_empty() {
                table.name = key.clone();
            }
        }

        Ok(document)
    }

    /// ディレクトリ内のYAMLファイルをスキャン
    ///
    /// .yaml と .yml 拡張子を持つファイルのみを収集し、ファイル名でソートして返します。
    fn scan_yaml_files(&self, dir: &Path) -> Result<Vec<PathBuf>> {
        let mut yaml_files = Vec::new();

        let entries = fs::read_dir(dir).map_err(|e| IoError::FileRead {
            path: dir.display().to_string(),
            cause: e.to_string(),
        })?;

        for entry in entries {
            let entry = entry.map_err(|e| IoError::FileRead {
                path: dir.display().to_string(),
                cause: e.to_string(),
            })?;

            let path = entry.path();
            if !path.is_file() {
                continue;
            }

            if let Some(extension) = path.extension() {
                if extension == "yaml" || extension == "yml" {
                    yaml_files.push(path);
                }
            }
        }

        yaml_files.sort();

        Ok(yaml_files)
    }
}
