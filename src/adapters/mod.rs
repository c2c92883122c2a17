// アダプター層
// スキーマソース（ファイルシステム、データベース）へのアクセスを抽象化

pub mod catalog_factory;
pub mod connection_string;
pub mod database;
pub mod database_introspector;
pub mod live_catalog;
pub mod memory_catalog;
pub mod package_catalog;
pub mod sql_quote;
