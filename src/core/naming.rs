// 命名ポリシー
//
// アプリケーション名と関連パスの単一ソースを提供します。

/// 現行アプリケーション名
pub const APP_NAME: &str = "tablemerge";

/// 既定の設定ファイル名
pub const CONFIG_FILE: &str = ".tablemerge.yaml";

/// 詳細ログを有効にする環境変数
pub const VERBOSE_ENV: &str = "TABLEMERGE_VERBOSE";
