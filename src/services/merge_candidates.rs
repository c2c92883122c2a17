// マージ候補選択サービス
//
// 変更されたテーブルだけを対象に、ソースとデスティネーションの両方でテーブル定義を解決します。
// 「定義が存在しない」と「ソースが読めない」は別の状態として報告します。

use crate::core::catalog::{SchemaCatalog, TableLookup};
use crate::core::data_table::DataTable;
use crate::core::dirty_tracking::is_dirty;
use crate::core::error::CatalogError;
use crate::core::schema::TableDescriptor;
use tracing::{debug, info, warn};

/// マージ候補の状態
#[derive(Debug, Clone)]
pub enum MergeStatus {
    /// 両方のソースで定義が解決できた
    Ready {
        source: TableDescriptor,
        destination: TableDescriptor,
    },
    /// ソース側に定義がない
    MissingInSource,
    /// デスティネーション側に定義がない
    MissingInDestination,
    /// ソース側のスキーマソースが読めなかった
    SourceUnavailable(CatalogError),
    /// デスティネーション側のスキーマソースが読めなかった
    DestinationUnavailable(CatalogError),
}

impl MergeStatus {
    pub fn is_ready(&self) -> bool {
        matches!(self, MergeStatus::Ready { .. })
    }

    /// 読めなかったスキーマソースのエラーを取得
    pub fn unavailable_error(&self) -> Option<&CatalogError> {
        match self {
            MergeStatus::SourceUnavailable(e) | MergeStatus::DestinationUnavailable(e) => Some(e),
            _ => None,
        }
    }
}

/// マージ候補
#[derive(Debug, Clone)]
pub struct MergeCandidate {
    /// テーブル名
    pub table: String,
    /// 解決結果
    pub status: MergeStatus,
}

/// マージ候補選択サービス
#[derive(Debug, Clone, Default)]
pub struct MergeCandidateService {}

impl MergeCandidateService {
    /// 新しいMergeCandidateServiceを作成
    pub fn new() -> Self {
        Self {}
    }

    /// 変更されたテーブルのマージ候補を選択
    ///
    /// 変更のないテーブル（未追跡を含む）は結果に含まれません。
    /// 結果の順序は `tables` の順序に従います。
    pub async fn select(
        &self,
        tables: &[DataTable],
        source: &dyn SchemaCatalog,
        destination: &dyn SchemaCatalog,
    ) -> Vec<MergeCandidate> {
        let mut candidates = Vec::new();

        for table in tables {
            if !is_dirty(table) {
                debug!(table = table.name(), "skipping clean table");
                continue;
            }

            let status = Self::resolve(table.name(), source, destination).await;
            if let Some(e) = status.unavailable_error() {
                warn!(table = table.name(), "{}", e);
            }
            candidates.push(MergeCandidate {
                table: table.name().to_string(),
                status,
            });
        }

        info!(
            candidates = candidates.len(),
            ready = candidates.iter().filter(|c| c.status.is_ready()).count(),
            "merge candidates selected"
        );
        candidates
    }

    async fn resolve(
        name: &str,
        source: &dyn SchemaCatalog,
        destination: &dyn SchemaCatalog,
    ) -> MergeStatus {
        let source_table = match source.lookup(name).await {
            TableLookup::Found(table) => table,
            TableLookup::Absent => return MergeStatus::MissingInSource,
            TableLookup::Unavailable(e) => return MergeStatus::SourceUnavailable(e),
        };

        match destination.lookup(name).await {
            TableLookup::Found(table) => MergeStatus::Ready {
                source: source_table,
                destination: table,
            },
            TableLookup::Absent => MergeStatus::MissingInDestination,
            TableLookup::Unavailable(e) => MergeStatus::DestinationUnavailable(e),
        }
    }
}
