// SQL識別子クォートユーティリティ
//
// PRAGMA 文のようにバインドパラメータを使えない箇所で、テーブル名やインデックス名を埋め込むために使用します。

/// SQLite用識別子クォート（ダブルクォート）
///
/// 識別子内のダブルクォートは二重にエスケープします。
pub fn quote_identifier_sqlite(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}
