// 表形式データコンテナ
//
// テーブルやクエリ結果をメモリ上に保持する DataTable を提供します。
// 行の追加・変更・削除はすべて通知チャネル経由で購読者に通知されます。

use crate::core::error::TrackingError;
use crate::core::property_bag::{PropertyBag, DATA_CHANGED};
use crate::core::value::Value;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// カラム定義
#[derive(Debug, Clone, PartialEq)]
pub struct DataColumn {
    /// カラム名
    pub name: String,
    /// 新規行に設定されるデフォルト値
    pub default_value: Value,
}

impl DataColumn {
    /// 新しいカラムを作成（デフォルト値はNULL）
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            default_value: Value::Null,
        }
    }

    /// デフォルト値を指定
    pub fn with_default(mut self, value: impl Into<Value>) -> Self {
        self.default_value = value.into();
        self
    }
}

/// 行の状態
///
/// ベースラインからの変更内容を表し、マージ時の INSERT/UPDATE/DELETE の判定に使われます。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowState {
    /// ベースラインから変更なし
    Unchanged,
    /// ベースライン以降に追加された
    Added,
    /// ベースライン以降に値が変更された
    Modified,
    /// 削除済み（accept_changes まで保持される）
    Deleted,
}

/// 行データ（カラム名 -> 値）
#[derive(Debug, Clone, PartialEq)]
pub struct DataRow {
    values: HashMap<String, Value>,
    state: RowState,
}

impl DataRow {
    /// 空の行を作成
    pub fn new() -> Self {
        Self {
            values: HashMap::new(),
            state: RowState::Added,
        }
    }

    /// 値を設定した行を返す（ビルダー）
    pub fn with(mut self, column: impl Into<String>, value: impl Into<Value>) -> Self {
        self.values.insert(column.into(), value.into());
        self
    }

    /// カラムの値を取得
    pub fn get(&self, column: &str) -> Option<&Value> {
        self.values.get(column)
    }

    /// 値を設定
    ///
    /// テーブルに追加される前の行を組み立てるためのものです。
    /// 追加済みの行は `DataTable::set_value` で変更してください。
    pub fn set(&mut self, column: impl Into<String>, value: impl Into<Value>) {
        self.values.insert(column.into(), value.into());
    }

    /// 行の状態を取得
    pub fn state(&self) -> RowState {
        self.state
    }

    /// 値を持つカラム名の一覧
    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }
}

impl Default for DataRow {
    fn default() -> Self {
        Self::new()
    }
}

/// 行変更の種類
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowAction {
    /// 行がテーブルに追加された
    Add,
    /// 行の値が変更された
    Change,
    /// 行の変更が確定された
    Commit,
}

/// テーブルの変更イベント
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TableEvent {
    /// 行が追加・変更・確定された
    RowChanged {
        /// 行番号
        row: usize,
        /// 変更の種類
        action: RowAction,
    },
    /// 新しい行が作成された（テーブルへの追加前）
    NewRow,
    /// 行が削除された
    RowDeleted {
        /// 削除時点の行番号
        row: usize,
    },
}

/// イベント購読者
///
/// イベントとテーブルのプロパティバッグを受け取ります。
pub type TableListener = Box<dyn Fn(&TableEvent, &mut PropertyBag) + Send + Sync>;

/// 変更追跡の状態
///
/// 変更フラグと追跡済みマーカーを保持します。
/// UIスレッドとバックグラウンドのマージ処理から共有できるよう、アトミックに読み書きします。
#[derive(Debug, Default)]
pub struct ChangeState {
    dirty: AtomicBool,
    tracked: AtomicBool,
}

impl ChangeState {
    /// ベースライン以降に変更があったかどうか
    pub fn is_dirty(&self) -> bool {
        self.dirty.load(Ordering::Acquire)
    }

    /// 変更追跡がアタッチされているかどうか
    pub fn is_tracked(&self) -> bool {
        self.tracked.load(Ordering::Acquire)
    }

    /// 変更ありとしてマークし、以前の値を返す（冪等）
    pub fn mark_dirty(&self) -> bool {
        self.dirty.swap(true, Ordering::AcqRel)
    }

    /// 追跡済みとしてマークし、以前の値を返す
    pub(crate) fn mark_tracked(&self) -> bool {
        self.tracked.swap(true, Ordering::AcqRel)
    }

    pub(crate) fn reset_dirty(&self) {
        self.dirty.store(false, Ordering::Release);
    }
}

/// 表形式データコンテナ
///
/// 順序付きのカラムと行の集合を保持します。
/// プロパティバッグと変更追跡状態はコンテナと同じライフタイムを持ちます。
pub struct DataTable {
    name: String,
    columns: Vec<DataColumn>,
    rows: Vec<DataRow>,
    properties: PropertyBag,
    change_state: Arc<ChangeState>,
    listeners: Vec<TableListener>,
    baseline_at: DateTime<Utc>,
}

impl DataTable {
    /// 新しい空のテーブルを作成
    pub fn new(name: impl Into<String>, columns: Vec<DataColumn>) -> Self {
        Self {
            name: name.into(),
            columns,
            rows: Vec::new(),
            properties: PropertyBag::new(),
            change_state: Arc::new(ChangeState::default()),
            listeners: Vec::new(),
            baseline_at: Utc::now(),
        }
    }

    /// カラム名のリストからテーブルを作成
    pub fn with_column_names(name: impl Into<String>, column_names: &[&str]) -> Self {
        let columns = column_names.iter().map(|c| DataColumn::new(*c)).collect();
        Self::new(name, columns)
    }

    /// テーブル名を取得
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn columns(&self) -> &[DataColumn] {
        &self.columns
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    pub fn has_column(&self, column: &str) -> bool {
        self.columns.iter().any(|c| c.name == column)
    }

    /// 全行（削除済みを含む）
    pub fn rows(&self) -> &[DataRow] {
        &self.rows
    }

    pub fn row(&self, index: usize) -> Option<&DataRow> {
        self.rows.get(index)
    }

    /// 削除済みを除いた行
    pub fn live_rows(&self) -> impl Iterator<Item = &DataRow> {
        self.rows.iter().filter(|r| r.state != RowState::Deleted)
    }

    /// ベースラインから変更された行（行番号付き）
    pub fn changed_rows(&self) -> Vec<(usize, &DataRow)> {
        self.rows
            .iter()
            .enumerate()
            .filter(|(_, r)| r.state != RowState::Unchanged)
            .collect()
    }

    /// 行数（削除済みを含む）
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn properties(&self) -> &PropertyBag {
        &self.properties
    }

    /// プロパティを設定
    ///
    /// `DATA_CHANGED` に `true` を設定した場合は変更フラグも立てます。
    pub fn set_property(&mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) {
        let key = key.into();
        let value = value.into();
        if key == DATA_CHANGED && value.as_bool() == Some(true) {
            self.change_state.mark_dirty();
        }
        self.properties.insert(key, value);
    }

    /// プロパティを削除して返す
    ///
    /// `DATA_CHANGED` を削除すると変更フラグもクリアされます。
    pub fn remove_property(&mut self, key: &str) -> Option<serde_json::Value> {
        if key == DATA_CHANGED {
            self.change_state.reset_dirty();
        }
        self.properties.remove(key)
    }

    /// 変更フラグをクリア
    ///
    /// マージ完了後などに、行を再ロードせずにテーブルをクリーンな状態へ戻します。
    /// 行の状態と購読はそのまま残ります。
    pub fn clear_dirty(&mut self) {
        self.remove_property(DATA_CHANGED);
        tracing::debug!(table = %self.name, "dirty flag cleared");
    }

    /// 変更追跡状態を取得
    ///
    /// 返された `Arc` は別スレッドから変更フラグを読むために保持できます。
    pub fn change_state(&self) -> &Arc<ChangeState> {
        &self.change_state
    }

    /// 最後にベースラインが設定された時刻
    pub fn baseline_at(&self) -> DateTime<Utc> {
        self.baseline_at
    }

    /// 変更イベントを購読
    pub fn subscribe<F>(&mut self, listener: F)
    where
        F: Fn(&TableEvent, &mut PropertyBag) + Send + Sync + 'static,
    {
        self.listeners.push(Box::new(listener));
    }

    /// 購読者数を取得
    pub fn subscriber_count(&self) -> usize {
        self.listeners.len()
    }

    /// クリーンなソースから行をロードしてベースラインを設定
    ///
    /// 既存の行とプロパティバッグを置き換え、変更フラグをクリアします。
    /// ロード自体はイベントを発火しません。購読は維持されるため、変更追跡は再び有効になります。
    pub fn load<I>(&mut self, rows: I) -> Result<(), TrackingError>
    where
        I: IntoIterator<Item = DataRow>,
    {
        let mut loaded = Vec::new();
        for row in rows {
            let mut row = self.complete_row(row)?;
            row.state = RowState::Unchanged;
            loaded.push(row);
        }

        self.rows = loaded;
        self.properties = PropertyBag::new();
        self.change_state.reset_dirty();
        self.baseline_at = Utc::now();
        Ok(())
    }

    /// ベースラインから再ロード
    pub fn reload<I>(&mut self, rows: I) -> Result<(), TrackingError>
    where
        I: IntoIterator<Item = DataRow>,
    {
        self.load(rows)?;
        tracing::debug!(table = %self.name, rows = self.rows.len(), "baseline reloaded");
        Ok(())
    }

    /// 新しい行を作成
    ///
    /// 各カラムのデフォルト値で初期化された行を返します。テーブルへの追加は `add_row` で行います。
    pub fn new_row(&mut self) -> DataRow {
        let mut row = DataRow::new();
        for column in &self.columns {
            row.values
                .insert(column.name.clone(), column.default_value.clone());
        }
        self.notify(TableEvent::NewRow);
        row
    }

    /// 行を追加し、その行番号を返す
    pub fn add_row(&mut self, row: DataRow) -> Result<usize, TrackingError> {
        let mut row = self.complete_row(row)?;
        row.state = RowState::Added;
        self.rows.push(row);

        let index = self.rows.len() - 1;
        self.notify(TableEvent::RowChanged {
            row: index,
            action: RowAction::Add,
        });
        Ok(index)
    }

    /// 行の値を変更
    pub fn set_value(
        &mut self,
        index: usize,
        column: &str,
        value: impl Into<Value>,
    ) -> Result<(), TrackingError> {
        self.check_column(column)?;
        let table = &self.name;
        let len = self.rows.len();
        let row = self
            .rows
            .get_mut(index)
            .ok_or_else(|| TrackingError::RowOutOfRange {
                table: table.clone(),
                index,
                len,
            })?;

        if row.state == RowState::Deleted {
            return Err(TrackingError::RowDeleted {
                table: table.clone(),
                index,
            });
        }

        row.values.insert(column.to_string(), value.into());
        if row.state == RowState::Unchanged {
            row.state = RowState::Modified;
        }

        self.notify(TableEvent::RowChanged {
            row: index,
            action: RowAction::Change,
        });
        Ok(())
    }

    /// 行を削除
    ///
    /// ベースライン以降に追加された行はその場で取り除かれ、それ以外は削除済みとしてマークされます。
    pub fn delete_row(&mut self, index: usize) -> Result<(), TrackingError> {
        let state = self
            .rows
            .get(index)
            .map(|r| r.state)
            .ok_or_else(|| TrackingError::RowOutOfRange {
                table: self.name.clone(),
                index,
                len: self.rows.len(),
            })?;

        match state {
            RowState::Deleted => {
                return Err(TrackingError::RowDeleted {
                    table: self.name.clone(),
                    index,
                })
            }
            RowState::Added => {
                self.rows.remove(index);
            }
            RowState::Unchanged | RowState::Modified => {
                self.rows[index].state = RowState::Deleted;
            }
        }

        self.notify(TableEvent::RowDeleted { row: index });
        Ok(())
    }

    /// 行の変更を確定
    ///
    /// 削除済みの行を取り除き、残りの行を Unchanged にします。
    /// 変更フラグはクリアしません。
    pub fn accept_changes(&mut self) {
        self.rows.retain(|r| r.state != RowState::Deleted);

        let committed: Vec<usize> = self
            .rows
            .iter()
            .enumerate()
            .filter(|(_, r)| r.state != RowState::Unchanged)
            .map(|(i, _)| i)
            .collect();

        for index in committed {
            self.rows[index].state = RowState::Unchanged;
            self.notify(TableEvent::RowChanged {
                row: index,
                action: RowAction::Commit,
            });
        }
    }

    fn notify(&mut self, event: TableEvent) {
        for listener in &self.listeners {
            listener(&event, &mut self.properties);
        }
    }

    fn check_column(&self, column: &str) -> Result<(), TrackingError> {
        if self.has_column(column) {
            Ok(())
        } else {
            Err(TrackingError::UnknownColumn {
                table: self.name.clone(),
                column: column.to_string(),
            })
        }
    }

    /// 未知のカラムを拒否し、欠けているカラムをデフォルト値で補完
    fn complete_row(&self, mut row: DataRow) -> Result<DataRow, TrackingError> {
        if let Some(unknown) = row.values.keys().find(|c| !self.has_column(c)) {
            return Err(TrackingError::UnknownColumn {
                table: self.name.clone(),
                column: unknown.clone(),
            });
        }

        for column in &self.columns {
            row.values
                .entry(column.name.clone())
                .or_insert_with(|| column.default_value.clone());
        }
        Ok(row)
    }
}

impl fmt::Debug for DataTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DataTable")
            .field("name", &self.name)
            .field("columns", &self.columns)
            .field("rows", &self.rows.len())
            .field("properties", &self.properties)
            .field("change_state", &self.change_state)
            .field("listeners", &self.listeners.len())
            .field("baseline_at", &self.baseline_at)
            .finish()
    }
}
