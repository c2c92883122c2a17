// スキーマカタログ
//
// スキーマソース（スキーマパッケージ、ライブ接続、プロジェクト由来の定義など）から
// テーブル定義を名前で解決するための抽象化。
// マージ判定側はこのトレイトだけに依存し、具体的なソースには依存しません。

use crate::core::error::CatalogError;
use crate::core::schema::TableDescriptor;
use async_trait::async_trait;

/// テーブル名の照合方法
///
/// 大文字小文字を区別するかどうかはソースごとに決まります。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NameMatching {
    /// 完全一致
    #[default]
    Exact,
    /// 大文字小文字を区別しない
    CaseInsensitive,
}

impl NameMatching {
    /// 2つの名前が一致するか
    pub fn matches(&self, candidate: &str, requested: &str) -> bool {
        match self {
            NameMatching::Exact => candidate == requested,
            NameMatching::CaseInsensitive => candidate.eq_ignore_ascii_case(requested),
        }
    }

    /// 照合に使う正規化済みの名前
    pub fn normalize(&self, name: &str) -> String {
        match self {
            NameMatching::Exact => name.to_string(),
            NameMatching::CaseInsensitive => name.to_ascii_lowercase(),
        }
    }
}

/// テーブル解決の結果
///
/// 「存在しない」と「ソースが読めない」を区別して表現します。
#[derive(Debug, Clone)]
pub enum TableLookup {
    /// テーブル定義が見つかった
    Found(TableDescriptor),
    /// ソースにそのテーブルは存在しない
    Absent,
    /// ソースが読めなかった
    Unavailable(CatalogError),
}

impl TableLookup {
    /// 見つかったテーブル定義を取得
    pub fn descriptor(&self) -> Option<&TableDescriptor> {
        match self {
            TableLookup::Found(table) => Some(table),
            _ => None,
        }
    }

    pub fn is_found(&self) -> bool {
        matches!(self, TableLookup::Found(_))
    }

    pub fn is_absent(&self) -> bool {
        matches!(self, TableLookup::Absent)
    }

    pub fn is_unavailable(&self) -> bool {
        matches!(self, TableLookup::Unavailable(_))
    }
}

impl From<Result<Option<TableDescriptor>, CatalogError>> for TableLookup {
    fn from(result: Result<Option<TableDescriptor>, CatalogError>) -> Self {
        match result {
            Ok(Some(table)) => TableLookup::Found(table),
            Ok(None) => TableLookup::Absent,
            Err(e) => TableLookup::Unavailable(e),
        }
    }
}

/// スキーマカタログ
///
/// テーブル定義の名前解決と、テーブル名の列挙を提供します。
#[async_trait]
pub trait SchemaCatalog: Send + Sync {
    /// スキーマソース名（ログやエラーメッセージに使用）
    fn source_name(&self) -> &str;

    /// テーブル名の照合方法
    fn name_matching(&self) -> NameMatching {
        NameMatching::Exact
    }

    /// テーブル定義を名前で取得
    ///
    /// 存在しない場合は `Ok(None)`、ソースが読めない場合は `Err(SourceUnavailable)` を返します。
    async fn get_table(&self, name: &str) -> Result<Option<TableDescriptor>, CatalogError>;

    /// ソースが定義するすべてのテーブル名を取得（名前順）
    async fn list_tables(&self) -> Result<Vec<String>, CatalogError>;

    /// テーブル定義を取得し、存在しない場合は `NotFound` エラーにする
    async fn require_table(&self, name: &str) -> Result<TableDescriptor, CatalogError> {
        self.get_table(name)
            .await?
            .ok_or_else(|| CatalogError::not_found(self.source_name(), name))
    }

    /// テーブル定義を解決し、結果を TableLookup として返す
    async fn lookup(&self, name: &str) -> TableLookup {
        self.get_table(name).await.into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_name_matching() {
        assert!(NameMatching::Exact.matches("Orders", "Orders"));
        assert!(!NameMatching::Exact.matches("Orders", "orders"));
        assert!(NameMatching::CaseInsensitive.matches("Orders", "orders"));
        assert!(!NameMatching::CaseInsensitive.matches("Orders", "order"));
        assert_eq!(NameMatching::Exact.normalize("Orders"), "Orders");
        assert_eq!(NameMatching::CaseInsensitive.normalize("Orders"), "orders");
    }

    #[test]
    fn test_table_lookup_from_result() {
        let found: TableLookup = Ok(Some(TableDescriptor::new("a"))).into();
        assert!(found.is_found());
        assert_eq!(found.descriptor().unwrap().name, "a");

        let absent: TableLookup = Ok(None).into();
        assert!(absent.is_absent());
        assert!(absent.descriptor().is_none());

        let unavailable: TableLookup = Err(CatalogError::unavailable("pkg", "broken")).into();
        assert!(unavailable.is_unavailable());
    }
}
