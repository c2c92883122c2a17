// コマンド共通コンテキスト
//
// 設定ファイル読み込みとスキーマカタログの組み立てをCLI層で集約する。

use crate::adapters::catalog_factory::create_catalog;
use crate::core::catalog::SchemaCatalog;
use crate::core::config::Config;
use anyhow::{anyhow, Context, Result};
use std::path::{Path, PathBuf};

/// CLIコマンド共通の実行コンテキスト
#[derive(Debug, Clone)]
pub struct CommandContext {
    pub project_path: PathBuf,
    pub config_path: PathBuf,
    pub config: Config,
}

impl CommandContext {
    /// プロジェクトルートから設定を読み込んでコンテキストを作成
    pub fn load(project_path: PathBuf) -> Result<Self> {
        Self::load_with_config(project_path, None)
    }

    /// カスタム設定ファイルパスを指定してコンテキストを作成
    pub fn load_with_config(
        project_path: PathBuf,
        custom_config_path: Option<PathBuf>,
    ) -> Result<Self> {
        let config_path = custom_config_path
            .unwrap_or_else(|| project_path.join(Config::DEFAULT_CONFIG_PATH));

        if !config_path.exists() {
            return Err(anyhow!(
                "Config file not found: {:?}. Please create it with at least one schema source.",
                config_path
            ));
        }

        let config =
            Config::from_file(&config_path).with_context(|| "Failed to read config file")?;
        config.validate()?;

        Ok(Self {
            project_path,
            config_path,
            config,
        })
    }

    /// 相対パスの基準ディレクトリ（設定ファイルのあるディレクトリ）
    pub fn base_dir(&self) -> &Path {
        self.config_path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or(self.project_path.as_path())
    }

    /// ソース名からスキーマカタログを作成
    pub fn catalog(&self, name: &str) -> Result<Box<dyn SchemaCatalog>> {
        let source = self.config.source(name)?;
        create_catalog(name, source, self.base_dir())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    const CONFIG_YAML: &str = r#"
version: "1.0"
sources:
  project:
    type: package
    path: schema
"#;

    #[test]
    fn test_missing_config() {
        let temp_dir = TempDir::new().unwrap();
        let result = CommandContext::load(temp_dir.path().to_path_buf());
        assert!(result.is_err());
    }

    #[test]
    fn test_base_dir_follows_custom_config() {
        let temp_dir = TempDir::new().unwrap();
        let config_dir = temp_dir.path().join("conf");
        fs::create_dir(&config_dir).unwrap();
        let config_path = config_dir.join("merge.yaml");
        fs::write(&config_path, CONFIG_YAML).unwrap();

        let context =
            CommandContext::load_with_config(temp_dir.path().to_path_buf(), Some(config_path))
                .unwrap();
        assert_eq!(context.base_dir(), config_dir.as_path());
    }

    #[test]
    fn test_unknown_source() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(temp_dir.path().join(Config::DEFAULT_CONFIG_PATH), CONFIG_YAML).unwrap();

        let context = CommandContext::load(temp_dir.path().to_path_buf()).unwrap();
        let message = format!("{:#}", context.catalog("staging").err().unwrap());
        assert!(message.contains("project"));
    }
}
