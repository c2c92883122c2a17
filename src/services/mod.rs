// Services Layer
// カタログとテーブルを組み合わせてマージ判定を行うサービス層

pub mod catalog_comparator;
pub mod merge_candidates;
pub mod row_validator;
pub mod schema_parser;
