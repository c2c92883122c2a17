// コマンドハンドラー層
// 各CLIコマンドの実装

pub mod compare;
pub mod describe;
pub mod tables;
