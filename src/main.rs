use anyhow::{Context, Result};
use clap::Parser;
use colored::control as color_control;
use std::env;
use std::path::PathBuf;
use std::process;
use tablemerge::cli::commands::compare::{CompareCommand, CompareCommandHandler};
use tablemerge::cli::commands::describe::{DescribeCommand, DescribeCommandHandler};
use tablemerge::cli::commands::tables::{TablesCommand, TablesCommandHandler};
use tablemerge::cli::{Cli, Commands};
use tablemerge::core::naming::{APP_NAME, VERBOSE_ENV};
use tracing_subscriber::EnvFilter;

fn main() {
    // CLIをパースして実行
    let cli = Cli::parse();

    init_tracing(cli.verbose || env::var_os(VERBOSE_ENV).is_some());

    // 非同期ランタイムを作成して実行
    let runtime = tokio::runtime::Runtime::new()
        .context("Failed to create Tokio runtime")
        .unwrap_or_else(|e| {
            eprintln!("Error: {:#}", e);
            process::exit(1);
        });

    let result = runtime.block_on(run_command(cli));

    match result {
        Ok(output) => {
            if !output.is_empty() {
                println!("{}", output);
            }
        }
        Err(e) => {
            eprintln!("Error: {:#}", e);
            process::exit(1);
        }
    }
}

/// ログ出力を初期化する
///
/// RUST_LOG が設定されていればそれを優先し、なければ --verbose で debug まで出力する。
fn init_tracing(verbose: bool) {
    let default_level = if verbose {
        format!("{}=debug", APP_NAME)
    } else {
        "warn".to_string()
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

/// コマンドを実行する
async fn run_command(cli: Cli) -> Result<String> {
    // --no-color フラグの処理
    if cli.no_color {
        color_control::set_override(false);
    }

    // プロジェクトのルートパスを取得
    let project_path = env::current_dir()?;

    // --config フラグの処理（絶対パスに変換）
    let config_path: Option<PathBuf> = cli.config.map(|p| {
        if p.is_absolute() {
            p
        } else {
            project_path.join(p)
        }
    });

    match cli.command {
        Commands::Tables { source } => {
            let handler = TablesCommandHandler::new();
            let command = TablesCommand {
                project_path,
                config_path,
                source,
            };
            handler.execute(&command).await
        }

        Commands::Describe { source, table } => {
            let handler = DescribeCommandHandler::new();
            let command = DescribeCommand {
                project_path,
                config_path,
                source,
                table,
            };
            handler.execute(&command).await
        }

        Commands::Compare {
            source,
            destination,
        } => {
            let handler = CompareCommandHandler::new();
            let command = CompareCommand {
                project_path,
                config_path,
                source,
                destination,
            };
            handler.execute(&command).await
        }
    }
}
