// エラー型定義
//
// アプリケーション全体で使用されるカスタムエラー型を提供します。
// thiserrorを使用して、CatalogError, TrackingError, ValidationError, DatabaseError, IoError を定義します。

use thiserror::Error;

/// スキーマカタログエラー
///
/// テーブル定義の解決時に発生するエラーを表現します。
/// 「テーブルが存在しない」と「ソースが読めない」は区別されます。
#[derive(Debug, Clone, Error)]
pub enum CatalogError {
    /// Table not found
    #[error("Table '{table}' not found in schema source '{source_name}'")]
    NotFound {
        /// スキーマソース名
        source_name: String,
        /// テーブル名
        table: String,
    },

    /// Schema source could not be read or reached
    #[error("Schema source '{source_name}' is unavailable: {cause}")]
    SourceUnavailable {
        /// スキーマソース名
        source_name: String,
        /// エラー原因
        cause: String,
    },
}

impl CatalogError {
    /// テーブル未検出エラーを作成
    pub fn not_found(source_name: impl Into<String>, table: impl Into<String>) -> Self {
        CatalogError::NotFound {
            source_name: source_name.into(),
            table: table.into(),
        }
    }

    /// ソース利用不可エラーを作成
    pub fn unavailable(source_name: impl Into<String>, cause: impl ToString) -> Self {
        CatalogError::SourceUnavailable {
            source_name: source_name.into(),
            cause: cause.to_string(),
        }
    }

    /// テーブル未検出エラーかどうか
    pub fn is_not_found(&self) -> bool {
        matches!(self, CatalogError::NotFound { .. })
    }

    /// ソース利用不可エラーかどうか
    pub fn is_source_unavailable(&self) -> bool {
        matches!(self, CatalogError::SourceUnavailable { .. })
    }

    /// スキーマソース名を取得
    pub fn source_name(&self) -> &str {
        match self {
            CatalogError::NotFound { source_name, .. }
            | CatalogError::SourceUnavailable { source_name, .. } => source_name,
        }
    }
}

/// 変更追跡エラー
///
/// DataTable への不正な操作や、変更追跡の誤用を表現します。
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TrackingError {
    /// Tracking attached twice
    #[error("Change tracking is already attached to table '{table}'")]
    AlreadyTracked {
        /// テーブル名
        table: String,
    },

    /// Row index out of range
    #[error("Row {index} is out of range for table '{table}' ({len} rows)")]
    RowOutOfRange {
        /// テーブル名
        table: String,
        /// 指定された行番号
        index: usize,
        /// 行数
        len: usize,
    },

    /// Unknown column
    #[error("Column '{column}' does not exist in table '{table}'")]
    UnknownColumn {
        /// テーブル名
        table: String,
        /// カラム名
        column: String,
    },

    /// Row already deleted
    #[error("Row {index} of table '{table}' has been deleted")]
    RowDeleted {
        /// テーブル名
        table: String,
        /// 行番号
        index: usize,
    },
}

impl TrackingError {
    /// 二重アタッチエラーかどうか
    pub fn is_already_tracked(&self) -> bool {
        matches!(self, TrackingError::AlreadyTracked { .. })
    }

    /// 行番号範囲外エラーかどうか
    pub fn is_row_out_of_range(&self) -> bool {
        matches!(self, TrackingError::RowOutOfRange { .. })
    }

    /// 未知カラムエラーかどうか
    pub fn is_unknown_column(&self) -> bool {
        matches!(self, TrackingError::UnknownColumn { .. })
    }

    /// 削除済み行エラーかどうか
    pub fn is_row_deleted(&self) -> bool {
        matches!(self, TrackingError::RowDeleted { .. })
    }
}

/// バリデーションエラー
///
/// テーブル定義に照らした行データの検証時に発生するエラーを表現します。
#[derive(Debug, Clone, Error)]
pub enum ValidationError {
    /// Column missing from the table definition
    #[error("Unknown column: {message}{}", format_location_opt(.location))]
    UnknownColumn {
        /// エラーメッセージ
        message: String,
        /// エラー発生位置
        location: Option<ErrorLocation>,
    },

    /// NULL in a non-nullable column
    #[error("NULL violation: {message}{}", format_location_opt(.location))]
    NullViolation {
        /// エラーメッセージ
        message: String,
        /// エラー発生位置
        location: Option<ErrorLocation>,
    },

    /// Value does not fit the column type
    #[error("Type mismatch: {message}{}", format_location_opt(.location))]
    TypeMismatch {
        /// エラーメッセージ
        message: String,
        /// エラー発生位置
        location: Option<ErrorLocation>,
    },

    /// No key usable to match rows on the destination
    #[error("Missing merge key: {message}{}", format_location_opt(.location))]
    MissingMergeKey {
        /// エラーメッセージ
        message: String,
        /// エラー発生位置
        location: Option<ErrorLocation>,
        /// 修正提案
        suggestion: Option<String>,
    },
}

impl ValidationError {
    /// 未知カラムエラーかどうか
    pub fn is_unknown_column(&self) -> bool {
        matches!(self, ValidationError::UnknownColumn { .. })
    }

    /// NULL違反エラーかどうか
    pub fn is_null_violation(&self) -> bool {
        matches!(self, ValidationError::NullViolation { .. })
    }

    /// 型不一致エラーかどうか
    pub fn is_type_mismatch(&self) -> bool {
        matches!(self, ValidationError::TypeMismatch { .. })
    }

    /// マージキー欠落エラーかどうか
    pub fn is_missing_merge_key(&self) -> bool {
        matches!(self, ValidationError::MissingMergeKey { .. })
    }

    /// エラー発生位置を取得
    pub fn location(&self) -> Option<&ErrorLocation> {
        match self {
            ValidationError::UnknownColumn { location, .. }
            | ValidationError::NullViolation { location, .. }
            | ValidationError::TypeMismatch { location, .. }
            | ValidationError::MissingMergeKey { location, .. } => location.as_ref(),
        }
    }

    /// 修正提案を取得
    pub fn suggestion(&self) -> Option<&str> {
        match self {
            ValidationError::MissingMergeKey { suggestion, .. } => suggestion.as_deref(),
            _ => None,
        }
    }
}

/// エラー発生位置
///
/// 検証対象のテーブル・カラム・行を表現します。
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ErrorLocation {
    /// テーブル名
    pub table: Option<String>,
    /// カラム名
    pub column: Option<String>,
    /// 行番号
    pub row: Option<usize>,
}

impl ErrorLocation {
    /// 新しいエラー位置を作成
    pub fn new() -> Self {
        Self::default()
    }

    /// テーブル名を指定してエラー位置を作成
    pub fn with_table(table: impl Into<String>) -> Self {
        Self {
            table: Some(table.into()),
            ..Self::default()
        }
    }

    /// カラム名を設定
    pub fn column(mut self, column: impl Into<String>) -> Self {
        self.column = Some(column.into());
        self
    }

    /// 行番号を設定
    pub fn row(mut self, row: usize) -> Self {
        self.row = Some(row);
        self
    }

    /// 位置情報をフォーマット
    pub fn format(&self) -> String {
        let mut parts = Vec::new();

        if let Some(table) = &self.table {
            parts.push(format!("table: {}", table));
        }
        if let Some(column) = &self.column {
            parts.push(format!("column: {}", column));
        }
        if let Some(row) = self.row {
            parts.push(format!("row: {}", row));
        }

        if parts.is_empty() {
            String::new()
        } else {
            format!(" ({})", parts.join(", "))
        }
    }
}

/// 位置情報をフォーマットするヘルパー関数
fn format_location_opt(location: &Option<ErrorLocation>) -> String {
    location.as_ref().map_or(String::new(), |loc| loc.format())
}

/// バリデーション結果
#[derive(Debug, Clone, Default)]
pub struct ValidationResult {
    /// エラーのリスト
    pub errors: Vec<ValidationError>,
}

impl ValidationResult {
    /// 新しいバリデーション結果を作成
    pub fn new() -> Self {
        Self::default()
    }

    /// エラーを追加
    pub fn add_error(&mut self, error: ValidationError) {
        self.errors.push(error);
    }

    /// 検証が成功したかどうか（エラーがない場合は成功）
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    /// エラーの数を取得
    pub fn error_count(&self) -> usize {
        self.errors.len()
    }

    /// 他のバリデーション結果をマージ
    pub fn merge(&mut self, other: ValidationResult) {
        self.errors.extend(other.errors);
    }
}

/// データベースエラー
///
/// ライブ接続のスキーマ取得時に発生するエラーを表現します。
#[derive(Debug, Error)]
pub enum DatabaseError {
    /// Connection error
    #[error("Database connection error: {message} (cause: {cause})")]
    Connection {
        /// エラーメッセージ
        message: String,
        /// エラー原因
        cause: String,
    },
}

impl DatabaseError {
    /// 接続エラーかどうか
    pub fn is_connection(&self) -> bool {
        matches!(self, DatabaseError::Connection { .. })
    }
}

/// I/Oエラー
///
/// スキーマパッケージの読み込み時に発生するエラーを表現します。
#[derive(Debug, Error)]
pub enum IoError {
    /// File not found
    #[error("File not found: {path}")]
    FileNotFound {
        /// ファイルパス
        path: String,
    },

    /// File read error
    #[error("Failed to read file: {path} (cause: {cause})")]
    FileRead {
        /// ファイルパス
        path: String,
        /// エラー原因
        cause: String,
    },
}

impl IoError {
    /// ファイルが見つからないエラーかどうか
    pub fn is_file_not_found(&self) -> bool {
        matches!(self, IoError::FileNotFound { .. })
    }

    /// ファイル読み込みエラーかどうか
    pub fn is_file_read(&self) -> bool {
        matches!(self, IoError::FileRead { .. })
    }
}
