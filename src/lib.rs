// tablemergeライブラリのエントリーポイント
//
// モジュール構造:
// - cli: CLIレイヤー（ユーザー入力の受付とコマンドルーティング）
// - core: コアドメインロジック（行変更の追跡、スキーマ定義、カタログ抽象）
// - adapters: スキーマパッケージとデータベースへのアクセスを抽象化
// - services: マージ判定に使うサービス（候補選択、カタログ比較、行検証）

pub mod adapters;
pub mod cli;
pub mod core;
pub mod services;
