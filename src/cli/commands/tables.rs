// tablesコマンドハンドラー
//
// 設定ファイルで名前付けされたスキーマソースのテーブル一覧を表示します。

use crate::cli::command_context::CommandContext;
use anyhow::{Context, Result};
use colored::Colorize;
use std::path::PathBuf;

/// tablesコマンドの入力パラメータ
#[derive(Debug, Clone)]
pub struct TablesCommand {
    /// プロジェクトのルートパス
    pub project_path: PathBuf,
    /// カスタム設定ファイルパス
    pub config_path: Option<PathBuf>,
    /// ソース名
    pub source: String,
}

/// tablesコマンドハンドラー
#[derive(Debug, Clone, Default)]
pub struct TablesCommandHandler {}

impl TablesCommandHandler {
    /// 新しいTablesCommandHandlerを作成
    pub fn new() -> Self {
        Self {}
    }

    /// tablesコマンドを実行
    pub async fn execute(&self, command: &TablesCommand) -> Result<String> {
        let context = CommandContext::load_with_config(
            command.project_path.clone(),
            command.config_path.clone(),
        )?;
        let catalog = context.catalog(&command.source)?;

        let tables = catalog
            .list_tables()
            .await
            .with_context(|| format!("Failed to list tables of '{}'", command.source))?;

        Ok(self.format_tables(&command.source, &tables))
    }

    fn format_tables(&self, source: &str, tables: &[String]) -> String {
        let mut output = String::new();
        output.push_str(&format!(
            "{}\n\n",
            format!("=== Tables in '{}' ===", source).bold()
        ));

        if tables.is_empty() {
            output.push_str("No tables defined.\n");
            return output;
        }

        for table in tables {
            output.push_str(&format!("  {}\n", table.cyan()));
        }
        output.push_str(&format!("\nTotal: {} table(s)", tables.len()));
        output
    }
}
