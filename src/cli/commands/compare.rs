// compareコマンドハンドラー
//
// 2つのスキーマソースのテーブル集合を比較し、片方にしか存在しないテーブルを表示します。

use crate::cli::command_context::CommandContext;
use crate::services::catalog_comparator::{CatalogComparator, CatalogComparison};
use anyhow::Result;
use colored::Colorize;
use std::path::PathBuf;

/// compareコマンドの入力パラメータ
#[derive(Debug, Clone)]
pub struct CompareCommand {
    /// プロジェクトのルートパス
    pub project_path: PathBuf,
    /// カスタム設定ファイルパス
    pub config_path: Option<PathBuf>,
    /// ソース側のソース名
    pub source: String,
    /// デスティネーション側のソース名
    pub destination: String,
}

/// compareコマンドハンドラー
#[derive(Debug, Clone, Default)]
pub struct CompareCommandHandler {}

impl CompareCommandHandler {
    /// 新しいCompareCommandHandlerを作成
    pub fn new() -> Self {
        Self {}
    }

    /// compareコマンドを実行
    pub async fn execute(&self, command: &CompareCommand) -> Result<String> {
        let context = CommandContext::load_with_config(
            command.project_path.clone(),
            command.config_path.clone(),
        )?;
        let source = context.catalog(&command.source)?;
        let destination = context.catalog(&command.destination)?;

        let comparison = CatalogComparator::new()
            .compare(source.as_ref(), destination.as_ref())
            .await?;

        Ok(self.format_comparison(command, &comparison))
    }

    fn format_comparison(&self, command: &CompareCommand, comparison: &CatalogComparison) -> String {
        let mut output = String::new();
        output.push_str(&format!(
            "{}\n\n",
            format!(
                "=== {} → {} ===",
                command.source, command.destination
            )
            .bold()
        ));

        if !comparison.only_in_source.is_empty() {
            output.push_str(&format!(
                "{}\n",
                format!("Only in '{}':", command.source).yellow()
            ));
            for table in &comparison.only_in_source {
                output.push_str(&format!("  + {}\n", table.green()));
            }
            output.push('\n');
        }

        if !comparison.only_in_destination.is_empty() {
            output.push_str(&format!(
                "{}\n",
                format!("Only in '{}':", command.destination).yellow()
            ));
            for table in &comparison.only_in_destination {
                output.push_str(&format!("  - {}\n", table.red()));
            }
            output.push('\n');
        }

        output.push_str(&format!(
            "{}: {} shared, {} source only, {} destination only",
            "Summary".bold(),
            comparison.in_both.len(),
            comparison.only_in_source.len(),
            comparison.only_in_destination.len()
        ));
        if comparison.is_identical() {
            output.push_str(&format!("\n{}", "Table sets are identical".green()));
        }
        output
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn command() -> CompareCommand {
        CompareCommand {
            project_path: PathBuf::from("."),
            config_path: None,
            source: "project".to_string(),
            destination: "production".to_string(),
        }
    }

    #[test]
    fn test_format_comparison() {
        colored::control::set_override(false);
        let comparison = CatalogComparison {
            only_in_source: vec!["audit".to_string()],
            only_in_destination: vec!["legacy".to_string()],
            in_both: vec!["users".to_string()],
        };

        let output = CompareCommandHandler::new().format_comparison(&command(), &comparison);
        assert!(output.contains("Only in 'project':\n  + audit"));
        assert!(output.contains("Only in 'production':\n  - legacy"));
        assert!(output.contains("Summary: 1 shared, 1 source only, 1 destination only"));
        assert!(!output.contains("identical"));
    }

    #[test]
    fn test_format_identical() {
        colored::control::set_override(false);
        let comparison = CatalogComparison {
            in_both: vec!["users".to_string()],
            ..Default::default()
        };

        let output = CompareCommandHandler::new().format_comparison(&command(), &comparison);
        assert!(output.ends_with("Table sets are identical"));
    }
}
