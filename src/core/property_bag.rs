// プロパティバッグ
//
// DataTable に 1:1 で付随するサイドチャネルのメタデータ（拡張プロパティ）。
// 永続化されず、テーブルのロード時にリセットされます。

use serde_json::Value as JsonValue;
use std::collections::HashMap;

/// 変更フラグのキー
///
/// MutationObserver が変更検知時に `true` を書き込みます。
pub const DATA_CHANGED: &str = "DataChanged";

/// 拡張プロパティのマップ（キー -> 任意の値）
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PropertyBag {
    entries: HashMap<String, JsonValue>,
}

impl PropertyBag {
    /// 空のプロパティバッグを作成
    pub fn new() -> Self {
        Self::default()
    }

    /// 値を設定（既存の値は上書き）
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<JsonValue>) {
        self.entries.insert(key.into(), value.into());
    }

    /// 値を取得
    pub fn get(&self, key: &str) -> Option<&JsonValue> {
        self.entries.get(key)
    }

    /// 真偽値として取得
    ///
    /// キーが存在しない、または真偽値でない場合は `None` を返します。
    pub fn get_bool(&self, key: &str) -> Option<bool> {
        self.entries.get(key).and_then(JsonValue::as_bool)
    }

    /// 文字列として取得
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.entries.get(key).and_then(JsonValue::as_str)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// 値を削除して返す
    pub fn remove(&mut self, key: &str) -> Option<JsonValue> {
        self.entries.remove(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// キーの一覧を取得（ソート済み）
    pub fn keys(&self) -> Vec<&str> {
        let mut keys: Vec<&str> = self.entries.keys().map(String::as_str).collect();
        keys.sort_unstable();
        keys
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_insert_and_typed_get() {
        let mut bag = PropertyBag::new();
        bag.insert(DATA_CHANGED, true);
        bag.insert("origin", "dacpac");
        bag.insert("rows", json!(3));

        assert_eq!(bag.get_bool(DATA_CHANGED), Some(true));
        assert_eq!(bag.get_str("origin"), Some("dacpac"));
        // 型が異なる場合は None
        assert_eq!(bag.get_bool("origin"), None);
        assert_eq!(bag.get("rows"), Some(&json!(3)));
        assert_eq!(bag.keys(), vec![DATA_CHANGED, "origin", "rows"]);
    }

    #[test]
    fn test_remove() {
        let mut bag = PropertyBag::new();
        bag.insert(DATA_CHANGED, true);
        assert!(bag.contains_key(DATA_CHANGED));

        assert_eq!(bag.remove(DATA_CHANGED), Some(json!(true)));
        assert!(bag.is_empty());
        assert_eq!(bag.get_bool(DATA_CHANGED), None);
    }
}
