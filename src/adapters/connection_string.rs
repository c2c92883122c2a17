// 接続文字列ビルダー
//
// DatabaseConfig と Dialect から接続文字列を生成する。
// スキーマ取得専用の接続なので、SQLite は読み取り専用モードで開く。

use crate::core::config::{DatabaseConfig, Dialect};

/// 接続文字列を生成
pub fn build_connection_string(dialect: Dialect, config: &DatabaseConfig) -> String {
    match dialect {
        Dialect::PostgreSQL => {
            let user = config.user.as_deref().unwrap_or("postgres");
            format!(
                "postgresql://{}@{}:{}/{}",
                credentials(user, config.password.as_deref()),
                config.host,
                config.port,
                config.database
            )
        }
        Dialect::MySQL => {
            let user = config.user.as_deref().unwrap_or("root");
            format!(
                "mysql://{}@{}:{}/{}",
                credentials(user, config.password.as_deref()),
                config.host,
                config.port,
                config.database
            )
        }
        Dialect::SQLite => format!("sqlite://{}?mode=ro", config.database),
    }
}

/// 接続文字列をログ出力用にマスク
pub fn redact_connection_string(dialect: Dialect, config: &DatabaseConfig) -> String {
    let masked = DatabaseConfig {
        password: config.password.as_ref().map(|_| "****".to_string()),
        ..config.clone()
    };
    build_connection_string(dialect, &masked)
}

fn credentials(user: &str, password: Option<&str>) -> String {
    match password {
        Some(password) if !password.is_empty() => format!("{}:{}", user, password),
        _ => user.to_string(),
    }
}
