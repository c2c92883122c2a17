// カタログ比較サービス
//
// 2つのスキーマソースが定義するテーブル名の集合を比較します。
// どちらかのソースが読めない場合は比較結果を返さずにエラーにします。

use crate::core::catalog::{NameMatching, SchemaCatalog};
use anyhow::{Context, Result};
use std::collections::BTreeMap;
use tracing::debug;

/// カタログ比較結果
///
/// 各リストは名前順に並んでいます。
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CatalogComparison {
    /// ソース側にのみ存在するテーブル
    pub only_in_source: Vec<String>,
    /// デスティネーション側にのみ存在するテーブル
    pub only_in_destination: Vec<String>,
    /// 両方に存在するテーブル
    pub in_both: Vec<String>,
}

impl CatalogComparison {
    /// テーブル集合が一致しているか
    pub fn is_identical(&self) -> bool {
        self.only_in_source.is_empty() && self.only_in_destination.is_empty()
    }
}

/// カタログ比較サービス
#[derive(Debug, Clone, Default)]
pub struct CatalogComparator {}

impl CatalogComparator {
    /// 新しいCatalogComparatorを作成
    pub fn new() -> Self {
        Self {}
    }

    /// 2つのカタログのテーブル集合を比較
    ///
    /// どちらかのソースが大文字小文字を区別しない場合、名前は大文字小文字を無視して突き合わせます。
    /// 両方に存在するテーブルはソース側の表記で報告します。
    pub async fn compare(
        &self,
        source: &dyn SchemaCatalog,
        destination: &dyn SchemaCatalog,
    ) -> Result<CatalogComparison> {
        let matching = if source.name_matching() == NameMatching::CaseInsensitive
            || destination.name_matching() == NameMatching::CaseInsensitive
        {
            NameMatching::CaseInsensitive
        } else {
            NameMatching::Exact
        };

        let source_tables = Self::keyed_tables(source, matching).await?;
        let destination_tables = Self::keyed_tables(destination, matching).await?;

        let mut comparison = CatalogComparison::default();
        for (key, name) in &source_tables {
            if destination_tables.contains_key(key) {
                comparison.in_both.push(name.clone());
            } else {
                comparison.only_in_source.push(name.clone());
            }
        }
        comparison.only_in_destination = destination_tables
            .iter()
            .filter(|(key, _)| !source_tables.contains_key(*key))
            .map(|(_, name)| name.clone())
            .collect();

        debug!(
            source = source.source_name(),
            destination = destination.source_name(),
            ?matching,
            only_in_source = comparison.only_in_source.len(),
            only_in_destination = comparison.only_in_destination.len(),
            in_both = comparison.in_both.len(),
            "catalogs compared"
        );
        Ok(comparison)
    }

    /// 正規化した名前 -> 元の名前 のマップを作成
    async fn keyed_tables(
        catalog: &dyn SchemaCatalog,
        matching: NameMatching,
    ) -> Result<BTreeMap<String, String>> {
        let tables = catalog
            .list_tables()
            .await
            .with_context(|| format!("Failed to list tables of '{}'", catalog.source_name()))?;

        Ok(tables
            .into_iter()
            .map(|name| (matching.normalize(&name), name))
            .collect())
    }
}
