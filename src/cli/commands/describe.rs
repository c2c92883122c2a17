// describeコマンドハンドラー
//
// 1つのテーブル定義（カラム、キー、インデックス）を表示します。
// テーブルが存在しない場合はエラーになります。

use crate::cli::command_context::CommandContext;
use crate::core::schema::TableDescriptor;
use anyhow::Result;
use colored::Colorize;
use std::path::PathBuf;

/// describeコマンドの入力パラメータ
#[derive(Debug, Clone)]
pub struct DescribeCommand {
    /// プロジェクトのルートパス
    pub project_path: PathBuf,
    /// カスタム設定ファイルパス
    pub config_path: Option<PathBuf>,
    /// ソース名
    pub source: String,
    /// テーブル名
    pub table: String,
}

/// describeコマンドハンドラー
#[derive(Debug, Clone, Default)]
pub struct DescribeCommandHandler {}

impl DescribeCommandHandler {
    /// 新しいDescribeCommandHandlerを作成
    pub fn new() -> Self {
        Self {}
    }

    /// describeコマンドを実行
    pub async fn execute(&self, command: &DescribeCommand) -> Result<String> {
        let context = CommandContext::load_with_config(
            command.project_path.clone(),
            command.config_path.clone(),
        )?;
        let catalog = context.catalog(&command.source)?;
        let table = catalog.require_table(&command.table).await?;

        Ok(self.format_table(&table))
    }

    fn format_table(&self, table: &TableDescriptor) -> String {
        let mut output = String::new();
        output.push_str(&format!(
            "{}\n\n",
            format!("=== {} ===", table.name).bold()
        ));

        for column in &table.columns {
            let nullability = if column.nullable { "NULL" } else { "NOT NULL" };
            let mut line = format!(
                "  {} {:?} {}",
                column.name.cyan(),
                column.column_type,
                nullability
            );
            if let Some(default) = &column.default_value {
                line.push_str(&format!(" DEFAULT {}", default));
            }
            if column.is_auto_increment() {
                line.push_str(" AUTO_INCREMENT");
            }
            output.push_str(&line);
            output.push('\n');
        }

        match table.merge_key_columns() {
            Some(key) => output.push_str(&format!("\nMerge key: {}\n", key.join(", "))),
            None => output.push_str(&format!("\n{}\n", "No merge key available".yellow())),
        }

        for index in &table.indexes {
            let unique = if index.unique { "UNIQUE " } else { "" };
            output.push_str(&format!(
                "{}INDEX {} ({})\n",
                unique,
                index.name,
                index.columns.join(", ")
            ));
        }

        output.trim_end().to_string()
    }
}
