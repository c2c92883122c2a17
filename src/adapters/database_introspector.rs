// データベースイントロスペクター
//
// ライブ接続からテーブル定義を取得するための抽象化レイヤー。
// 各方言固有のINFORMATION_SCHEMA/PRAGMAクエリを実装します。

use crate::adapters::sql_quote::quote_identifier_sqlite;
use crate::core::config::Dialect;
use crate::core::schema::{ColumnDescriptor, ColumnType, Constraint, Index, TableDescriptor};
use anyhow::Result;
use async_trait::async_trait;
use sqlx::{AnyPool, Row};
use std::collections::BTreeMap;

/// 生のカラム情報（DB固有フォーマット）
///
/// データベースから取得したカラム情報を保持する構造体。
/// `ColumnType::from_sql_type` で ColumnType に変換されます。
#[derive(Debug, Clone)]
pub struct RawColumnInfo {
    /// カラム名
    pub name: String,
    /// データ型（DB固有の型文字列）
    pub data_type: String,
    /// NULL許可フラグ
    pub is_nullable: bool,
    /// デフォルト値
    pub default_value: Option<String>,
    /// 文字型の最大長
    pub char_max_length: Option<i32>,
    /// 数値型の精度
    pub numeric_precision: Option<i32>,
    /// 数値型のスケール
    pub numeric_scale: Option<i32>,
    /// 自動増分フラグ
    pub auto_increment: bool,
}

impl RawColumnInfo {
    /// カラム定義に変換
    pub fn into_descriptor(self) -> ColumnDescriptor {
        let column_type = ColumnType::from_sql_type(
            &self.data_type,
            self.char_max_length,
            self.numeric_precision,
            self.numeric_scale,
        );
        let mut column = ColumnDescriptor::new(self.name, column_type, self.is_nullable);
        column.default_value = self.default_value;
        if self.auto_increment {
            column.auto_increment = Some(true);
        }
        column
    }
}

/// 生のインデックス情報（DB固有フォーマット）
#[derive(Debug, Clone)]
pub struct RawIndexInfo {
    /// インデックス名
    pub name: String,
    /// インデックス対象のカラム
    pub columns: Vec<String>,
    /// ユニーク制約フラグ
    pub unique: bool,
}

/// 生の制約情報（DB固有フォーマット）
#[derive(Debug, Clone)]
pub enum RawConstraintInfo {
    /// プライマリキー制約
    PrimaryKey { columns: Vec<String> },
    /// 外部キー制約
    ForeignKey {
        columns: Vec<String>,
        referenced_table: String,
        referenced_columns: Vec<String>,
    },
    /// ユニーク制約
    Unique { columns: Vec<String> },
}

impl From<RawConstraintInfo> for Constraint {
    fn from(raw: RawConstraintInfo) -> Self {
        match raw {
            RawConstraintInfo::PrimaryKey { columns } => Constraint::PRIMARY_KEY { columns },
            RawConstraintInfo::ForeignKey {
                columns,
                referenced_table,
                referenced_columns,
            } => Constraint::FOREIGN_KEY {
                columns,
                referenced_table,
                referenced_columns,
            },
            RawConstraintInfo::Unique { columns } => Constraint::UNIQUE { columns },
        }
    }
}

/// データベーススキーマ取得インターフェース
///
/// 各データベース方言固有のイントロスペクション処理を抽象化します。
#[async_trait]
pub trait DatabaseIntrospector: Send + Sync {
    /// テーブル名一覧を取得
    async fn get_table_names(&self, pool: &AnyPool) -> Result<Vec<String>>;

    /// カラム情報を取得（定義順）
    async fn get_columns(&self, pool: &AnyPool, table_name: &str) -> Result<Vec<RawColumnInfo>>;

    /// インデックス情報を取得
    async fn get_indexes(&self, pool: &AnyPool, table_name: &str) -> Result<Vec<RawIndexInfo>>;

    /// 制約情報を取得
    async fn get_constraints(
        &self,
        pool: &AnyPool,
        table_name: &str,
    ) -> Result<Vec<RawConstraintInfo>>;

    /// テーブル定義を組み立てる
    async fn describe_table(&self, pool: &AnyPool, table_name: &str) -> Result<TableDescriptor> {
        let mut table = TableDescriptor::new(table_name);

        for column in self.get_columns(pool, table_name).await? {
            table.add_column(column.into_descriptor());
        }
        for index in self.get_indexes(pool, table_name).await? {
            table.add_index(Index::new(index.name, index.columns, index.unique));
        }
        for constraint in self.get_constraints(pool, table_name).await? {
            table.add_constraint(constraint.into());
        }

        Ok(table)
    }
}

/// PostgreSQL用イントロスペクター
pub struct PostgresIntrospector;

/// MySQL用イントロスペクター
pub struct MySqlIntrospector;

/// SQLite用イントロスペクター
pub struct SqliteIntrospector;

/// 方言に応じたイントロスペクターを作成
pub fn create_introspector(dialect: Dialect) -> Box<dyn DatabaseIntrospector> {
    match dialect {
        Dialect::PostgreSQL => Box::new(PostgresIntrospector),
        Dialect::MySQL => Box::new(MySqlIntrospector),
        Dialect::SQLite => Box::new(SqliteIntrospector),
    }
}

/// (グループ名, カラム名) の行をグループごとのカラムリストにまとめる
///
/// グループ名の順に並べ、各グループ内のカラム順は入力順を保ちます。
fn group_columns(rows: impl IntoIterator<Item = (String, String)>) -> Vec<(String, Vec<String>)> {
    let mut groups: BTreeMap<String, Vec<String>> = BTreeMap::new();
    for (group, column) in rows {
        groups.entry(group).or_default().push(column);
    }
    groups.into_iter().collect()
}

/// 外部キーの行（制約名, カラム, 参照先テーブル, 参照先カラム）を制約ごとにまとめる
fn group_foreign_keys(
    rows: impl IntoIterator<Item = (String, String, String, String)>,
) -> Vec<RawConstraintInfo> {
    let mut groups: BTreeMap<String, (String, Vec<String>, Vec<String>)> = BTreeMap::new();
    for (name, column, ref_table, ref_column) in rows {
        let entry = groups
            .entry(name)
            .or_insert_with(|| (ref_table, Vec::new(), Vec::new()));
        entry.1.push(column);
        entry.2.push(ref_column);
    }

    groups
        .into_values()
        .map(
            |(referenced_table, columns, referenced_columns)| RawConstraintInfo::ForeignKey {
                columns,
                referenced_table,
                referenced_columns,
            },
        )
        .collect()
}

// =============================================================================
// PostgreSQL イントロスペクター実装
// =============================================================================

#[async_trait]
impl DatabaseIntrospector for PostgresIntrospector {
    async fn get_table_names(&self, pool: &AnyPool) -> Result<Vec<String>> {
        let sql = r#"
            SELECT table_name
            FROM information_schema.tables
            WHERE table_schema = 'public' AND table_type = 'BASE TABLE'
            ORDER BY table_name
        "#;

        let rows = sqlx::query(sql).fetch_all(pool).await?;
        Ok(rows.iter().map(|row| row.get::<String, _>(0)).collect())
    }

    async fn get_columns(&self, pool: &AnyPool, table_name: &str) -> Result<Vec<RawColumnInfo>> {
        let sql = r#"
            SELECT
                column_name,
                data_type,
                is_nullable,
                column_default,
                character_maximum_length,
                numeric_precision,
                numeric_scale,
                is_identity
            FROM information_schema.columns
            WHERE table_name = $1 AND table_schema = 'public'
            ORDER BY ordinal_position
        "#;

        let rows = sqlx::query(sql).bind(table_name).fetch_all(pool).await?;

        let columns = rows
            .iter()
            .map(|row| {
                let default_value: Option<String> = row.get(3);
                let is_identity = row.get::<String, _>(7) == "YES";
                // serial 型は nextval() のデフォルトで表現される
                let is_serial = default_value
                    .as_deref()
                    .is_some_and(|d| d.starts_with("nextval("));
                RawColumnInfo {
                    name: row.get(0),
                    data_type: row.get(1),
                    is_nullable: row.get::<String, _>(2) == "YES",
                    default_value,
                    char_max_length: row.get(4),
                    numeric_precision: row.get(5),
                    numeric_scale: row.get(6),
                    auto_increment: is_identity || is_serial,
                }
            })
            .collect();

        Ok(columns)
    }

    async fn get_indexes(&self, pool: &AnyPool, table_name: &str) -> Result<Vec<RawIndexInfo>> {
        let sql = r#"
            SELECT
                i.relname as index_name,
                a.attname as column_name,
                ix.indisunique as is_unique
            FROM pg_class t
            JOIN pg_index ix ON t.oid = ix.indrelid
            JOIN pg_class i ON i.oid = ix.indexrelid
            JOIN pg_attribute a ON a.attrelid = t.oid AND a.attnum = ANY(ix.indkey)
            JOIN pg_namespace n ON n.oid = t.relnamespace
            WHERE t.relkind = 'r'
                AND t.relname = $1
                AND n.nspname = 'public'
                AND NOT ix.indisprimary
            ORDER BY i.relname, array_position(ix.indkey, a.attnum)
        "#;

        let rows = sqlx::query(sql).bind(table_name).fetch_all(pool).await?;

        let mut uniqueness: BTreeMap<String, bool> = BTreeMap::new();
        let mut pairs = Vec::new();
        for row in rows {
            let index_name: String = row.get(0);
            let is_unique: bool = row.get(2);
            uniqueness.insert(index_name.clone(), is_unique);
            pairs.push((index_name, row.get::<String, _>(1)));
        }

        Ok(group_columns(pairs)
            .into_iter()
            .map(|(name, columns)| RawIndexInfo {
                unique: uniqueness.get(&name).copied().unwrap_or(false),
                name,
                columns,
            })
            .collect())
    }

    async fn get_constraints(
        &self,
        pool: &AnyPool,
        table_name: &str,
    ) -> Result<Vec<RawConstraintInfo>> {
        let mut constraints = Vec::new();

        // PRIMARY KEY
        let pk_sql = r#"
            SELECT a.attname
            FROM pg_index i
            JOIN pg_attribute a ON a.attrelid = i.indrelid AND a.attnum = ANY(i.indkey)
            JOIN pg_class c ON c.oid = i.indrelid
            JOIN pg_namespace n ON n.oid = c.relnamespace
            WHERE i.indisprimary
                AND c.relname = $1
                AND n.nspname = 'public'
            ORDER BY array_position(i.indkey, a.attnum)
        "#;

        let pk_rows = sqlx::query(pk_sql).bind(table_name).fetch_all(pool).await?;
        let pk_columns: Vec<String> = pk_rows.iter().map(|row| row.get(0)).collect();
        if !pk_columns.is_empty() {
            constraints.push(RawConstraintInfo::PrimaryKey {
                columns: pk_columns,
            });
        }

        // FOREIGN KEY
        let fk_sql = r#"
            SELECT
                tc.constraint_name,
                kcu.column_name,
                ccu.table_name AS referenced_table,
                ccu.column_name AS referenced_column
            FROM information_schema.table_constraints tc
            JOIN information_schema.key_column_usage kcu
                ON tc.constraint_name = kcu.constraint_name
                AND tc.table_schema = kcu.table_schema
            JOIN information_schema.constraint_column_usage ccu
                ON ccu.constraint_name = tc.constraint_name
                AND ccu.table_schema = tc.table_schema
            WHERE tc.constraint_type = 'FOREIGN KEY'
                AND tc.table_name = $1
                AND tc.table_schema = 'public'
            ORDER BY tc.constraint_name, kcu.ordinal_position
        "#;

        let fk_rows = sqlx::query(fk_sql).bind(table_name).fetch_all(pool).await?;
        constraints.extend(group_foreign_keys(
            fk_rows
                .iter()
                .map(|row| (row.get(0), row.get(1), row.get(2), row.get(3))),
        ));

        // UNIQUE
        let unique_sql = r#"
            SELECT tc.constraint_name, kcu.column_name
            FROM information_schema.table_constraints tc
            JOIN information_schema.key_column_usage kcu
                ON tc.constraint_name = kcu.constraint_name
                AND tc.table_schema = kcu.table_schema
            WHERE tc.constraint_type = 'UNIQUE'
                AND tc.table_name = $1
                AND tc.table_schema = 'public'
            ORDER BY tc.constraint_name, kcu.ordinal_position
        "#;

        let unique_rows = sqlx::query(unique_sql)
            .bind(table_name)
            .fetch_all(pool)
            .await?;
        constraints.extend(
            group_columns(unique_rows.iter().map(|row| (row.get(0), row.get(1))))
                .into_iter()
                .map(|(_, columns)| RawConstraintInfo::Unique { columns }),
        );

        Ok(constraints)
    }
}

// =============================================================================
// MySQL イントロスペクター実装
// =============================================================================

#[async_trait]
impl DatabaseIntrospector for MySqlIntrospector {
    async fn get_table_names(&self, pool: &AnyPool) -> Result<Vec<String>> {
        let sql = r#"
            SELECT table_name
            FROM information_schema.tables
            WHERE table_schema = DATABASE() AND table_type = 'BASE TABLE'
            ORDER BY table_name
        "#;

        let rows = sqlx::query(sql).fetch_all(pool).await?;
        Ok(rows.iter().map(|row| row.get::<String, _>(0)).collect())
    }

    async fn get_columns(&self, pool: &AnyPool, table_name: &str) -> Result<Vec<RawColumnInfo>> {
        let sql = r#"
            SELECT
                column_name,
                column_type,
                is_nullable,
                column_default,
                character_maximum_length,
                numeric_precision,
                numeric_scale,
                extra
            FROM information_schema.columns
            WHERE table_name = ? AND table_schema = DATABASE()
            ORDER BY ordinal_position
        "#;

        let rows = sqlx::query(sql).bind(table_name).fetch_all(pool).await?;

        let columns = rows
            .iter()
            .map(|row| RawColumnInfo {
                name: row.get(0),
                // column_type は tinyint(1) のような表記を含むため BOOLEAN を判別できる
                data_type: row.get(1),
                is_nullable: row.get::<String, _>(2) == "YES",
                default_value: row.get(3),
                char_max_length: row.get(4),
                numeric_precision: row.get(5),
                numeric_scale: row.get(6),
                auto_increment: row.get::<String, _>(7).contains("auto_increment"),
            })
            .collect();

        Ok(columns)
    }

    async fn get_indexes(&self, pool: &AnyPool, table_name: &str) -> Result<Vec<RawIndexInfo>> {
        let sql = r#"
            SELECT
                index_name,
                column_name,
                non_unique
            FROM information_schema.statistics
            WHERE table_name = ? AND table_schema = DATABASE()
                AND index_name != 'PRIMARY'
            ORDER BY index_name, seq_in_index
        "#;

        let rows = sqlx::query(sql).bind(table_name).fetch_all(pool).await?;

        let mut uniqueness: BTreeMap<String, bool> = BTreeMap::new();
        let mut pairs = Vec::new();
        for row in rows {
            let index_name: String = row.get(0);
            let non_unique: i32 = row.get(2);
            uniqueness.insert(index_name.clone(), non_unique == 0);
            pairs.push((index_name, row.get::<String, _>(1)));
        }

        Ok(group_columns(pairs)
            .into_iter()
            .map(|(name, columns)| RawIndexInfo {
                unique: uniqueness.get(&name).copied().unwrap_or(false),
                name,
                columns,
            })
            .collect())
    }

    async fn get_constraints(
        &self,
        pool: &AnyPool,
        table_name: &str,
    ) -> Result<Vec<RawConstraintInfo>> {
        let mut constraints = Vec::new();

        // PRIMARY KEY
        let pk_sql = r#"
            SELECT column_name
            FROM information_schema.statistics
            WHERE table_name = ? AND table_schema = DATABASE()
                AND index_name = 'PRIMARY'
            ORDER BY seq_in_index
        "#;

        let pk_rows = sqlx::query(pk_sql).bind(table_name).fetch_all(pool).await?;
        let pk_columns: Vec<String> = pk_rows.iter().map(|row| row.get(0)).collect();
        if !pk_columns.is_empty() {
            constraints.push(RawConstraintInfo::PrimaryKey {
                columns: pk_columns,
            });
        }

        // FOREIGN KEY
        let fk_sql = r#"
            SELECT
                kcu.constraint_name,
                kcu.column_name,
                kcu.referenced_table_name,
                kcu.referenced_column_name
            FROM information_schema.key_column_usage kcu
            WHERE kcu.table_name = ? AND kcu.table_schema = DATABASE()
                AND kcu.referenced_table_name IS NOT NULL
            ORDER BY kcu.constraint_name, kcu.ordinal_position
        "#;

        let fk_rows = sqlx::query(fk_sql).bind(table_name).fetch_all(pool).await?;
        constraints.extend(group_foreign_keys(
            fk_rows
                .iter()
                .map(|row| (row.get(0), row.get(1), row.get(2), row.get(3))),
        ));

        // MySQL の UNIQUE 制約はユニークインデックスとして get_indexes で取得される

        Ok(constraints)
    }
}

// =============================================================================
// SQLite イントロスペクター実装
// =============================================================================

#[async_trait]
impl DatabaseIntrospector for SqliteIntrospector {
    async fn get_table_names(&self, pool: &AnyPool) -> Result<Vec<String>> {
        let sql = r#"
            SELECT name
            FROM sqlite_master
            WHERE type = 'table'
                AND name NOT LIKE 'sqlite_%'
            ORDER BY name
        "#;

        let rows = sqlx::query(sql).fetch_all(pool).await?;
        Ok(rows.iter().map(|row| row.get::<String, _>(0)).collect())
    }

    async fn get_columns(&self, pool: &AnyPool, table_name: &str) -> Result<Vec<RawColumnInfo>> {
        let sql = format!("PRAGMA table_info({})", quote_identifier_sqlite(table_name));
        let rows = sqlx::query(&sql).fetch_all(pool).await?;

        let columns = rows
            .iter()
            .map(|row| {
                let data_type: String = row.get(2);
                let not_null: i32 = row.get(3);
                let pk: i32 = row.get(5);
                RawColumnInfo {
                    name: row.get(1),
                    // INTEGER PRIMARY KEY は rowid のエイリアスで自動採番される
                    auto_increment: pk == 1 && data_type.eq_ignore_ascii_case("integer"),
                    data_type,
                    is_nullable: not_null == 0 && pk == 0,
                    default_value: row.get(4),
                    char_max_length: None,
                    numeric_precision: None,
                    numeric_scale: None,
                }
            })
            .collect();

        Ok(columns)
    }

    async fn get_indexes(&self, pool: &AnyPool, table_name: &str) -> Result<Vec<RawIndexInfo>> {
        let sql = format!("PRAGMA index_list({})", quote_identifier_sqlite(table_name));
        let rows = sqlx::query(&sql).fetch_all(pool).await?;

        let mut indexes = Vec::new();
        for row in rows {
            let index_name: String = row.get(1);
            let is_unique: i32 = row.get(2);

            // 自動生成インデックス（PRIMARY KEY / UNIQUE 制約由来）はスキップ
            if index_name.starts_with("sqlite_") {
                continue;
            }

            let info_sql = format!("PRAGMA index_info({})", quote_identifier_sqlite(&index_name));
            let info_rows = sqlx::query(&info_sql).fetch_all(pool).await?;
            let columns: Vec<String> = info_rows.iter().map(|r| r.get::<String, _>(2)).collect();

            indexes.push(RawIndexInfo {
                name: index_name,
                columns,
                unique: is_unique == 1,
            });
        }

        indexes.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(indexes)
    }

    async fn get_constraints(
        &self,
        pool: &AnyPool,
        table_name: &str,
    ) -> Result<Vec<RawConstraintInfo>> {
        let quoted_table = quote_identifier_sqlite(table_name);
        let mut constraints = Vec::new();

        // PRIMARY KEY（pk列はキー内の位置を 1 始まりで持つ）
        let table_info_sql = format!("PRAGMA table_info({})", quoted_table);
        let rows = sqlx::query(&table_info_sql).fetch_all(pool).await?;

        let mut pk_columns: Vec<(i32, String)> = rows
            .iter()
            .map(|row| (row.get::<i32, _>(5), row.get::<String, _>(1)))
            .filter(|(position, _)| *position > 0)
            .collect();
        pk_columns.sort_by_key(|(position, _)| *position);
        if !pk_columns.is_empty() {
            constraints.push(RawConstraintInfo::PrimaryKey {
                columns: pk_columns.into_iter().map(|(_, name)| name).collect(),
            });
        }

        // UNIQUE 制約（自動生成インデックスとして表現される）
        let index_sql = format!("PRAGMA index_list({})", quoted_table);
        for row in sqlx::query(&index_sql).fetch_all(pool).await? {
            let index_name: String = row.get(1);
            let is_unique: i32 = row.get(2);
            let origin: String = row.get(3);
            if is_unique != 1 || origin != "u" {
                continue;
            }

            let info_sql = format!("PRAGMA index_info({})", quote_identifier_sqlite(&index_name));
            let info_rows = sqlx::query(&info_sql).fetch_all(pool).await?;
            constraints.push(RawConstraintInfo::Unique {
                columns: info_rows.iter().map(|r| r.get::<String, _>(2)).collect(),
            });
        }

        // FOREIGN KEY
        let fk_sql = format!("PRAGMA foreign_key_list({})", quoted_table);
        let fk_rows = sqlx::query(&fk_sql).fetch_all(pool).await?;
        constraints.extend(group_foreign_keys(fk_rows.iter().map(|row| {
            let id: i32 = row.get(0);
            (
                format!("{:08}", id),
                row.get(3),
                row.get(2),
                row.get(4),
            )
        })));

        Ok(constraints)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_introspector_for_each_dialect() {
        // 型の確認のみ（実際のDB接続は統合テストで行う）
        let _ = create_introspector(Dialect::PostgreSQL);
        let _ = create_introspector(Dialect::MySQL);
        let _ = create_introspector(Dialect::SQLite);
    }

    #[test]
    fn test_raw_column_into_descriptor() {
        let raw = RawColumnInfo {
            name: "email".to_string(),
            data_type: "character varying".to_string(),
            is_nullable: true,
            default_value: Some("''".to_string()),
            char_max_length: Some(255),
            numeric_precision: None,
            numeric_scale: None,
            auto_increment: false,
        };

        let column = raw.into_descriptor();
        assert_eq!(column.name, "email");
        assert_eq!(column.column_type, ColumnType::VARCHAR { length: 255 });
        assert!(column.nullable);
        assert_eq!(column.default_value.as_deref(), Some("''"));
        assert!(!column.is_auto_increment());
    }

    #[test]
    fn test_raw_constraint_into_constraint() {
        let constraint: Constraint = RawConstraintInfo::PrimaryKey {
            columns: vec!["id".to_string()],
        }
        .into();
        assert_eq!(constraint.kind(), "PRIMARY_KEY");
    }

    #[test]
    fn test_group_columns_keeps_column_order() {
        let grouped = group_columns(vec![
            ("ix_b".to_string(), "x".to_string()),
            ("ix_a".to_string(), "second".to_string()),
            ("ix_b".to_string(), "y".to_string()),
        ]);

        assert_eq!(
            grouped,
            vec![
                ("ix_a".to_string(), vec!["second".to_string()]),
                ("ix_b".to_string(), vec!["x".to_string(), "y".to_string()]),
            ]
        );
    }

    #[test]
    fn test_group_foreign_keys_composite() {
        let constraints = group_foreign_keys(vec![
            (
                "fk_order".to_string(),
                "tenant_id".to_string(),
                "orders".to_string(),
                "tenant_id".to_string(),
            ),
            (
                "fk_order".to_string(),
                "order_id".to_string(),
                "orders".to_string(),
                "id".to_string(),
            ),
        ]);

        assert_eq!(constraints.len(), 1);
        match &constraints[0] {
            RawConstraintInfo::ForeignKey {
                columns,
                referenced_table,
                referenced_columns,
            } => {
                assert_eq!(columns, &vec!["tenant_id", "order_id"]);
                assert_eq!(referenced_table, "orders");
                assert_eq!(referenced_columns, &vec!["tenant_id", "id"]);
            }
            other => panic!("Expected foreign key, got {:?}", other),
        }
    }
}
