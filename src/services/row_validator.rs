// 行データバリデーターサービス
//
// DataTable の行データをデスティネーションのテーブル定義に照らして検証します。
// マージ前に、適用できない変更を検出するために使用します。

use crate::core::data_table::{DataTable, RowState};
use crate::core::error::{ErrorLocation, ValidationError, ValidationResult};
use crate::core::schema::TableDescriptor;
use tracing::debug;

/// 行データバリデーターサービス
#[derive(Debug, Clone, Default)]
pub struct RowValidator {}

impl RowValidator {
    /// 新しいRowValidatorを作成
    pub fn new() -> Self {
        Self {}
    }

    /// テーブルの行データを検証
    ///
    /// # Arguments
    ///
    /// * `table` - 検証対象のテーブル
    /// * `descriptor` - 照合先のテーブル定義
    ///
    /// # Returns
    ///
    /// 検証結果（エラーのリストを含む）。削除済みの行は検証しません。
    pub fn validate(&self, table: &DataTable, descriptor: &TableDescriptor) -> ValidationResult {
        let mut result = ValidationResult::new();

        result.merge(self.validate_columns(table, descriptor));
        result.merge(self.validate_merge_key(table, descriptor));

        for (index, row) in table.rows().iter().enumerate() {
            if row.state() == RowState::Deleted {
                continue;
            }

            for column in &descriptor.columns {
                let Some(value) = row.get(&column.name) else {
                    continue;
                };
                let location = || {
                    ErrorLocation::with_table(table.name())
                        .column(&column.name)
                        .row(index)
                };

                if value.is_null() {
                    // 追加行では、デフォルト値や自動増分を持つカラムの省略を許容
                    let may_be_omitted =
                        row.state() == RowState::Added && column.allows_missing();
                    if !column.nullable && !may_be_omitted {
                        result.add_error(ValidationError::NullViolation {
                            message: format!(
                                "Column '{}' does not allow NULL",
                                column.name
                            ),
                            location: Some(location()),
                        });
                    }
                } else if !column.column_type.accepts(value) {
                    result.add_error(ValidationError::TypeMismatch {
                        message: format!(
                            "Value '{}' ({}) does not fit column '{}' of type {:?}",
                            value,
                            value.kind(),
                            column.name,
                            column.column_type
                        ),
                        location: Some(location()),
                    });
                }
            }
        }

        debug!(
            table = table.name(),
            errors = result.error_count(),
            "row validation finished"
        );
        result
    }

    /// テーブルのカラムが定義に存在することを検証
    fn validate_columns(&self, table: &DataTable, descriptor: &TableDescriptor) -> ValidationResult {
        let mut result = ValidationResult::new();

        for column in table.columns() {
            if descriptor.get_column(&column.name).is_none() {
                result.add_error(ValidationError::UnknownColumn {
                    message: format!(
                        "Column '{}' is not defined in table '{}'",
                        column.name, descriptor.name
                    ),
                    location: Some(ErrorLocation::with_table(table.name()).column(&column.name)),
                });
            }
        }

        result
    }

    /// 行を突き合わせるキーが利用できることを検証
    fn validate_merge_key(
        &self,
        table: &DataTable,
        descriptor: &TableDescriptor,
    ) -> ValidationResult {
        let mut result = ValidationResult::new();

        match descriptor.merge_key_columns() {
            None => {
                result.add_error(ValidationError::MissingMergeKey {
                    message: format!(
                        "Table '{}' has no primary key or unique key",
                        descriptor.name
                    ),
                    location: Some(ErrorLocation::with_table(table.name())),
                    suggestion: Some(
                        "Add a PRIMARY KEY or UNIQUE constraint to the table definition".to_string(),
                    ),
                });
            }
            Some(key) => {
                for column in key.iter().filter(|c| !table.has_column(c)) {
                    result.add_error(ValidationError::MissingMergeKey {
                        message: format!("Key column '{}' is not loaded", column),
                        location: Some(ErrorLocation::with_table(table.name()).column(column)),
                        suggestion: Some(format!("Include '{}' in the loaded columns", column)),
                    });
                }
            }
        }

        result
    }
}
