// Core Domain
// 変更追跡とスキーマ解決のための純粋なドメインモデル

pub mod catalog;
pub mod config;
pub mod data_table;
pub mod dirty_tracking;
pub mod error;
pub mod naming;
pub mod property_bag;
pub mod schema;
pub mod value;
