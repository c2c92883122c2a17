// 変更追跡
//
// DataTable に MutationObserver をアタッチし、行の追加・変更・削除を検知して変更フラグを立てます。
// 呼び出し側が手動でフラグを立てる必要はありません。

use crate::core::data_table::{DataTable, TableEvent};
use crate::core::error::TrackingError;
use crate::core::property_bag::DATA_CHANGED;
use std::sync::Arc;
use tracing::{debug, warn};

/// アタッチ結果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttachOutcome {
    /// 新たに購読を登録した
    Attached,
    /// 既に追跡済みのため何もしなかった
    AlreadyTracked,
}

/// 追跡状態
///
/// 「未追跡」と「追跡済みで変更なし」を区別したい呼び出し側向けの状態です。
/// `is_dirty` はどちらに対しても `false` を返します。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackingStatus {
    /// 変更追跡がアタッチされていない
    Untracked,
    /// 追跡中、ベースラインから変更なし
    Clean,
    /// ベースライン以降に変更あり
    Dirty,
}

/// 行変更の監視者
#[derive(Debug, Clone, Copy, Default)]
pub struct MutationObserver;

impl MutationObserver {
    /// 変更追跡をアタッチ
    ///
    /// 行の追加・変更・削除と新規行作成に反応し、変更フラグを立てる購読を1つ登録します。
    /// 既に追跡済みの場合は警告を出力し、購読を重複させずに `AlreadyTracked` を返します。
    pub fn attach(table: &mut DataTable) -> AttachOutcome {
        match Self::try_attach(table) {
            Ok(()) => AttachOutcome::Attached,
            Err(e) => {
                warn!("{}", e);
                AttachOutcome::AlreadyTracked
            }
        }
    }

    /// 変更追跡をアタッチ（二重アタッチはエラー）
    pub fn try_attach(table: &mut DataTable) -> Result<(), TrackingError> {
        if table.change_state().mark_tracked() {
            return Err(TrackingError::AlreadyTracked {
                table: table.name().to_string(),
            });
        }

        let state = Arc::clone(table.change_state());
        let table_name = table.name().to_string();
        // 行変更・新規行・行削除のいずれも同じく変更としてマークする
        table.subscribe(move |event: &TableEvent, properties| {
            if !state.mark_dirty() {
                debug!(table = %table_name, ?event, "table marked dirty");
            }
            properties.insert(DATA_CHANGED, true);
        });

        debug!(table = %table.name(), "change tracking attached");
        Ok(())
    }
}

/// ベースライン以降に変更があったかどうか
///
/// 失敗しません。追跡されていないテーブルや、変更のないテーブルは `false` です。
pub fn is_dirty(table: &DataTable) -> bool {
    table.change_state().is_dirty()
}

/// 追跡状態を取得
pub fn tracking_status(table: &DataTable) -> TrackingStatus {
    let state = table.change_state();
    if !state.is_tracked() {
        TrackingStatus::Untracked
    } else if state.is_dirty() {
        TrackingStatus::Dirty
    } else {
        TrackingStatus::Clean
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::data_table::DataRow;

    fn tracked_table() -> DataTable {
        let mut table = DataTable::with_column_names("users", &["id", "name"]);
        table
            .load(vec![DataRow::new().with("id", 1).with("name", "x")])
            .unwrap();
        MutationObserver::attach(&mut table);
        table
    }

    #[test]
    fn test_clean_after_load() {
        let table = tracked_table();
        assert!(!is_dirty(&table));
        assert_eq!(tracking_status(&table), TrackingStatus::Clean);
        assert!(!table.properties().contains_key(DATA_CHANGED));
    }

    #[test]
    fn test_untracked_table_is_not_dirty() {
        let mut table = DataTable::with_column_names("users", &["id"]);
        table.add_row(DataRow::new().with("id", 1)).unwrap();

        assert!(!is_dirty(&table));
        assert_eq!(tracking_status(&table), TrackingStatus::Untracked);
    }

    #[test]
    fn test_row_add_marks_dirty() {
        let mut table = tracked_table();
        table.add_row(DataRow::new().with("id", 2)).unwrap();

        assert!(is_dirty(&table));
        assert_eq!(tracking_status(&table), TrackingStatus::Dirty);
        assert_eq!(table.properties().get_bool(DATA_CHANGED), Some(true));
    }

    #[test]
    fn test_row_change_marks_dirty() {
        let mut table = tracked_table();
        table.set_value(0, "name", "y").unwrap();
        assert!(is_dirty(&table));
    }

    #[test]
    fn test_new_row_marks_dirty() {
        let mut table = tracked_table();
        let _ = table.new_row();
        assert!(is_dirty(&table));
    }

    #[test]
    fn test_row_delete_marks_dirty() {
        let mut table = tracked_table();
        table.delete_row(0).unwrap();
        assert!(is_dirty(&table));
    }

    #[test]
    fn test_dirty_is_monotonic() {
        let mut table = tracked_table();
        table.set_value(0, "name", "y").unwrap();
        table.set_value(0, "name", "x").unwrap();
        table.add_row(DataRow::new().with("id", 2)).unwrap();
        table.accept_changes();

        assert!(is_dirty(&table));
    }

    #[test]
    fn test_failed_mutation_does_not_mark_dirty() {
        let mut table = tracked_table();
        assert!(table.set_value(0, "missing", 1).is_err());
        assert!(!is_dirty(&table));
    }

    #[test]
    fn test_double_attach_is_guarded() {
        let mut table = tracked_table();

        assert_eq!(
            MutationObserver::attach(&mut table),
            AttachOutcome::AlreadyTracked
        );
        assert!(MutationObserver::try_attach(&mut table)
            .unwrap_err()
            .is_already_tracked());
        assert_eq!(table.subscriber_count(), 1);

        table.delete_row(0).unwrap();
        assert!(is_dirty(&table));
    }

    #[test]
    fn test_reload_resets_dirty_and_rearms_tracking() {
        let mut table = tracked_table();
        table.delete_row(0).unwrap();
        assert!(is_dirty(&table));

        table
            .reload(vec![DataRow::new().with("id", 1).with("name", "x")])
            .unwrap();
        assert!(!is_dirty(&table));
        assert_eq!(tracking_status(&table), TrackingStatus::Clean);
        assert!(table.properties().get_bool(DATA_CHANGED).is_none());

        table.set_value(0, "name", "z").unwrap();
        assert!(is_dirty(&table));
    }

    #[test]
    fn test_clear_dirty_resets_flag_and_key() {
        let mut table = tracked_table();
        table.delete_row(0).unwrap();
        assert!(is_dirty(&table));

        table.clear_dirty();
        assert!(!is_dirty(&table));
        assert_eq!(tracking_status(&table), TrackingStatus::Clean);
        assert!(!table.properties().contains_key(DATA_CHANGED));

        table.add_row(DataRow::new().with("id", 3)).unwrap();
        assert!(is_dirty(&table));
    }

    #[test]
    fn test_removing_data_changed_key_clears_dirty() {
        let mut table = tracked_table();
        table.set_value(0, "name", "y").unwrap();

        assert_eq!(table.remove_property(DATA_CHANGED), Some(true.into()));
        assert!(!table.properties().contains_key(DATA_CHANGED));
        assert!(!is_dirty(&table));
    }

    #[test]
    fn test_setting_data_changed_key_marks_dirty() {
        let mut table = tracked_table();
        table.set_property(DATA_CHANGED, true);
        assert!(is_dirty(&table));
    }

    #[test]
    fn test_dirty_visible_from_another_thread() {
        let mut table = tracked_table();
        let state = Arc::clone(table.change_state());

        table.delete_row(0).unwrap();

        let observed = std::thread::spawn(move || state.is_dirty()).join().unwrap();
        assert!(observed);
    }
}
