// スキーマドメインモデル
//
// スキーマソースが解決するテーブル定義を表現する型システム。
// TableDescriptor, ColumnDescriptor, Index, Constraint などの構造体を提供します。

use crate::core::value::Value;
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// スキーマ文書
///
/// スキーマパッケージ1つ分のテーブル定義を保持します。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchemaDocument {
    /// スキーマのバージョン
    pub version: String,

    /// テーブル定義のマップ（テーブル名 -> TableDescriptor）
    pub tables: HashMap<String, TableDescriptor>,
}

impl SchemaDocument {
    /// 新しいスキーマ文書を作成
    pub fn new(version: String) -> Self {
        Self {
            version,
            tables: HashMap::new(),
        }
    }

    /// テーブルを追加
    pub fn add_table(&mut self, table: TableDescriptor) {
        self.tables.insert(table.name.clone(), table);
    }

    /// 指定されたテーブルを取得
    pub fn get_table(&self, table_name: &str) -> Option<&TableDescriptor> {
        self.tables.get(table_name)
    }

    /// テーブル数を取得
    pub fn table_count(&self) -> usize {
        self.tables.len()
    }
}

/// テーブル定義
///
/// 単一のテーブルの構造を表現します。
/// マージ文の生成に必要なカラム、インデックス、制約の定義を保持します。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableDescriptor {
    /// テーブル名（省略時はマップのキー）
    #[serde(default)]
    pub name: String,

    /// カラム定義のリスト（定義順）
    pub columns: Vec<ColumnDescriptor>,

    /// インデックス定義のリスト
    #[serde(default)]
    pub indexes: Vec<Index>,

    /// 制約定義のリスト
    #[serde(default)]
    pub constraints: Vec<Constraint>,
}

impl TableDescriptor {
    /// 新しいテーブル定義を作成
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            columns: Vec::new(),
            indexes: Vec::new(),
            constraints: Vec::new(),
        }
    }

    /// カラムを追加
    pub fn add_column(&mut self, column: ColumnDescriptor) {
        self.columns.push(column);
    }

    /// インデックスを追加
    pub fn add_index(&mut self, index: Index) {
        self.indexes.push(index);
    }

    /// 制約を追加
    pub fn add_constraint(&mut self, constraint: Constraint) {
        self.constraints.push(constraint);
    }

    /// 指定されたカラムを取得
    pub fn get_column(&self, column_name: &str) -> Option<&ColumnDescriptor> {
        self.columns.iter().find(|c| c.name == column_name)
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    /// プライマリキーのカラム名を取得
    pub fn primary_key_columns(&self) -> Option<&[String]> {
        self.constraints.iter().find_map(|constraint| match constraint {
            Constraint::PRIMARY_KEY { columns } => Some(columns.as_slice()),
            _ => None,
        })
    }

    /// マージ時に行を突き合わせるキーを取得
    ///
    /// プライマリキー、最初のユニーク制約、最初のユニークインデックスの順に探します。
    pub fn merge_key_columns(&self) -> Option<&[String]> {
        self.primary_key_columns()
            .or_else(|| {
                self.constraints.iter().find_map(|constraint| match constraint {
                    Constraint::UNIQUE { columns } => Some(columns.as_slice()),
                    _ => None,
                })
            })
            .or_else(|| {
                self.indexes
                    .iter()
                    .find(|index| index.unique)
                    .map(|index| index.columns.as_slice())
            })
    }
}

/// カラム定義
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnDescriptor {
    /// カラム名
    pub name: String,

    /// カラム型
    #[serde(rename = "type")]
    pub column_type: ColumnType,

    /// NULL許可フラグ
    pub nullable: bool,

    /// デフォルト値
    #[serde(default)]
    pub default_value: Option<String>,

    /// 自動増分フラグ
    #[serde(default)]
    pub auto_increment: Option<bool>,
}

impl ColumnDescriptor {
    /// 新しいカラムを作成
    pub fn new(name: impl Into<String>, column_type: ColumnType, nullable: bool) -> Self {
        Self {
            name: name.into(),
            column_type,
            nullable,
            default_value: None,
            auto_increment: None,
        }
    }

    /// 自動増分カラムかどうか
    pub fn is_auto_increment(&self) -> bool {
        self.auto_increment.unwrap_or(false)
    }

    /// 値がNULLでも許容されるか
    ///
    /// デフォルト値や自動増分を持つカラムは、挿入時にNULLを省略できます。
    pub fn allows_missing(&self) -> bool {
        self.nullable || self.default_value.is_some() || self.is_auto_increment()
    }
}

/// カラム型
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind")]
#[allow(non_camel_case_types)]
pub enum ColumnType {
    /// 整数型
    INTEGER {
        /// 精度（バイト数）
        #[serde(default)]
        precision: Option<u32>,
    },

    /// 可変長文字列型
    VARCHAR {
        /// 最大長
        length: u32,
    },

    /// 固定長文字列型
    CHAR {
        /// 固定長
        length: u32,
    },

    /// テキスト型（長文）
    TEXT,

    /// 真偽値型
    BOOLEAN,

    /// 固定小数点数型
    DECIMAL {
        /// 全体の桁数
        precision: u32,
        /// 小数点以下の桁数
        scale: u32,
    },

    /// 単精度浮動小数点型
    FLOAT,

    /// 倍精度浮動小数点型
    DOUBLE,

    /// 日付型
    DATE,

    /// 時刻型
    TIME,

    /// タイムスタンプ型
    TIMESTAMP,

    /// JSON型
    JSON,

    /// UUID型
    UUID,

    /// バイナリ型（16進文字列で保持）
    BLOB,

    /// 上記に当てはまらないソース固有の型
    OTHER {
        /// ソース上の型名
        sql_type: String,
    },
}

const TIME_FORMATS: &[&str] = &["%H:%M:%S%.f", "%H:%M"];
const TIMESTAMP_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"];

fn is_date_text(s: &str) -> bool {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").is_ok()
}

fn is_time_text(s: &str) -> bool {
    TIME_FORMATS
        .iter()
        .any(|format| NaiveTime::parse_from_str(s, format).is_ok())
}

fn is_timestamp_text(s: &str) -> bool {
    DateTime::parse_from_rfc3339(s).is_ok()
        || TIMESTAMP_FORMATS
            .iter()
            .any(|format| NaiveDateTime::parse_from_str(s, format).is_ok())
}

/// 8-4-4-4-12 の16進表記
fn is_uuid_text(s: &str) -> bool {
    let groups: Vec<&str> = s.split('-').collect();
    groups.len() == 5
        && groups
            .iter()
            .zip([8, 4, 4, 4, 12])
            .all(|(group, len)| group.len() == len && group.chars().all(|c| c.is_ascii_hexdigit()))
}

impl ColumnType {
    /// 値がこの型のカラムに格納できるか
    ///
    /// NULLは常に許容します（NULL許可の判定は ColumnDescriptor 側で行う）。
    pub fn accepts(&self, value: &Value) -> bool {
        match (self, value) {
            (_, Value::Null) => true,
            (ColumnType::OTHER { .. }, _) => true,

            (ColumnType::INTEGER { .. }, Value::Int(_)) => true,

            (ColumnType::VARCHAR { length }, Value::Text(s))
            | (ColumnType::CHAR { length }, Value::Text(s)) => {
                s.chars().count() <= *length as usize
            }

            (ColumnType::BOOLEAN, Value::Bool(_)) => true,
            (ColumnType::BOOLEAN, Value::Int(i)) => *i == 0 || *i == 1,

            (ColumnType::DECIMAL { .. }, Value::Int(_) | Value::Float(_))
            | (ColumnType::FLOAT, Value::Int(_) | Value::Float(_))
            | (ColumnType::DOUBLE, Value::Int(_) | Value::Float(_)) => true,

            (ColumnType::DATE, Value::Text(s)) => is_date_text(s),
            (ColumnType::TIME, Value::Text(s)) => is_time_text(s),
            (ColumnType::TIMESTAMP, Value::Text(s)) => is_timestamp_text(s),
            (ColumnType::UUID, Value::Text(s)) => is_uuid_text(s),

            (ColumnType::TEXT | ColumnType::JSON | ColumnType::BLOB, Value::Text(_)) => true,

            _ => false,
        }
    }

    /// データベースの型名から ColumnType を推定
    ///
    /// INFORMATION_SCHEMA / PRAGMA が返す型名を受け取り、大文字小文字は区別しません。
    pub fn from_sql_type(
        data_type: &str,
        char_max_length: Option<i32>,
        numeric_precision: Option<i32>,
        numeric_scale: Option<i32>,
    ) -> Self {
        let normalized = data_type.trim().to_lowercase();
        // "varchar(255)" のような SQLite の型表記から長さを取り出す
        let (base, declared_length) = match normalized.split_once('(') {
            Some((base, rest)) => {
                let length = rest
                    .trim_end_matches(')')
                    .split(',')
                    .next()
                    .and_then(|n| n.trim().parse::<i32>().ok());
                (base.trim().to_string(), length)
            }
            None => (normalized.clone(), None),
        };
        let length = char_max_length
            .or(declared_length)
            .and_then(|l| u32::try_from(l).ok());

        match base.as_str() {
            "smallint" | "int2" => ColumnType::INTEGER { precision: Some(2) },
            "integer" | "int" | "int4" | "mediumint" => ColumnType::INTEGER { precision: Some(4) },
            "bigint" | "int8" => ColumnType::INTEGER { precision: Some(8) },
            "tinyint" if declared_length == Some(1) => ColumnType::BOOLEAN,
            "tinyint" => ColumnType::INTEGER { precision: Some(1) },
            "character varying" | "varchar" | "nvarchar" => match length {
                Some(length) => ColumnType::VARCHAR { length },
                None => ColumnType::TEXT,
            },
            "character" | "char" | "nchar" | "bpchar" => ColumnType::CHAR {
                length: length.unwrap_or(1),
            },
            "text" | "mediumtext" | "longtext" | "clob" => ColumnType::TEXT,
            "boolean" | "bool" | "bit" => ColumnType::BOOLEAN,
            "numeric" | "decimal" => ColumnType::DECIMAL {
                precision: numeric_precision
                    .and_then(|p| u32::try_from(p).ok())
                    .unwrap_or(18),
                scale: numeric_scale
                    .and_then(|s| u32::try_from(s).ok())
                    .unwrap_or(0),
            },
            "real" | "float" | "float4" => ColumnType::FLOAT,
            "double precision" | "double" | "float8" => ColumnType::DOUBLE,
            "date" => ColumnType::DATE,
            "time" | "time without time zone" | "time with time zone" => ColumnType::TIME,
            "timestamp"
            | "timestamp without time zone"
            | "timestamp with time zone"
            | "timestamptz"
            | "datetime"
            | "datetime2" => ColumnType::TIMESTAMP,
            "json" | "jsonb" => ColumnType::JSON,
            "uuid" | "uniqueidentifier" => ColumnType::UUID,
            "blob" | "bytea" | "binary" | "varbinary" | "longblob" => ColumnType::BLOB,
            _ => ColumnType::OTHER {
                sql_type: data_type.trim().to_string(),
            },
        }
    }
}

/// インデックス定義
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Index {
    /// インデックス名
    pub name: String,

    /// インデックス対象のカラム名リスト
    pub columns: Vec<String>,

    /// ユニークインデックスかどうか
    pub unique: bool,
}

impl Index {
    /// 新しいインデックスを作成
    pub fn new(name: String, columns: Vec<String>, unique: bool) -> Self {
        Self {
            name,
            columns,
            unique,
        }
    }
}

/// 制約定義
///
/// テーブルの制約（PRIMARY KEY, FOREIGN KEY, UNIQUE, CHECK）を表現します。
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type")]
#[allow(non_camel_case_types)]
pub enum Constraint {
    /// プライマリキー制約
    PRIMARY_KEY {
        /// 対象カラム
        columns: Vec<String>,
    },

    /// 外部キー制約
    FOREIGN_KEY {
        /// 対象カラム
        columns: Vec<String>,

        /// 参照先テーブル
        referenced_table: String,

        /// 参照先カラム
        referenced_columns: Vec<String>,
    },

    /// ユニーク制約
    UNIQUE {
        /// 対象カラム
        columns: Vec<String>,
    },

    /// チェック制約
    CHECK {
        /// 対象カラム
        columns: Vec<String>,

        /// チェック式
        check_expression: String,
    },
}

impl Constraint {
    /// 制約の種類を文字列で取得
    pub fn kind(&self) -> &'static str {
        match self {
            Constraint::PRIMARY_KEY { .. } => "PRIMARY_KEY",
            Constraint::FOREIGN_KEY { .. } => "FOREIGN_KEY",
            Constraint::UNIQUE { .. } => "UNIQUE",
            Constraint::CHECK { .. } => "CHECK",
        }
    }
}
