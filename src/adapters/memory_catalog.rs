// インメモリスキーマカタログ
//
// 固定されたテーブル定義の集合に対するカタログ。
// プロジェクトから導出済みの定義や、テストでの差し替えに使用します。

use crate::core::catalog::{NameMatching, SchemaCatalog};
use crate::core::error::CatalogError;
use crate::core::schema::{SchemaDocument, TableDescriptor};
use async_trait::async_trait;
use std::collections::BTreeMap;

/// インメモリスキーマカタログ
#[derive(Debug, Clone)]
pub struct MemoryCatalog {
    source_name: String,
    tables: BTreeMap<String, TableDescriptor>,
    matching: NameMatching,
}

impl MemoryCatalog {
    /// 空のカタログを作成
    pub fn new(source_name: impl Into<String>) -> Self {
        Self {
            source_name: source_name.into(),
            tables: BTreeMap::new(),
            matching: NameMatching::Exact,
        }
    }

    /// テーブル定義の集合からカタログを作成
    pub fn with_tables<I>(source_name: impl Into<String>, tables: I) -> Self
    where
        I: IntoIterator<Item = TableDescriptor>,
    {
        let mut catalog = Self::new(source_name);
        for table in tables {
            catalog.add_table(table);
        }
        catalog
    }

    /// スキーマ文書からカタログを作成
    pub fn from_document(source_name: impl Into<String>, document: SchemaDocument) -> Self {
        Self::with_tables(source_name, document.tables.into_values())
    }

    /// テーブル名の照合方法を指定
    pub fn with_matching(mut self, matching: NameMatching) -> Self {
        self.matching = matching;
        self
    }

    /// テーブル定義を追加（同名の定義は置き換え）
    pub fn add_table(&mut self, table: TableDescriptor) {
        self.tables.insert(table.name.clone(), table);
    }

    pub fn table_count(&self) -> usize {
        self.tables.len()
    }

    /// テーブル定義を同期的に解決
    pub fn find(&self, name: &str) -> Option<&TableDescriptor> {
        match self.matching {
            NameMatching::Exact => self.tables.get(name),
            NameMatching::CaseInsensitive => self
                .tables
                .values()
                .find(|t| self.matching.matches(&t.name, name)),
        }
    }
}

#[async_trait]
impl SchemaCatalog for MemoryCatalog {
    fn source_name(&self) -> &str {
        &self.source_name
    }

    fn name_matching(&self) -> NameMatching {
        self.matching
    }

    async fn get_table(&self, name: &str) -> Result<Option<TableDescriptor>, CatalogError> {
        Ok(self.find(name).cloned())
    }

    async fn list_tables(&self) -> Result<Vec<String>, CatalogError> {
        Ok(self.tables.keys().cloned().collect())
    }
}
