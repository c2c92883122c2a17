// CLI Layer
// ユーザー入力の受付とコマンドルーティング

pub mod command_context;
pub mod commands;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// tablemerge - Table data merge diagnostics
///
/// Resolves table definitions from configured schema sources
/// and reports how two sources line up before a merge.
#[derive(Parser, Debug)]
#[command(name = "tablemerge")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Schema source diagnostics for table data merges")]
#[command(propagate_version = true)]
#[command(after_help = "GETTING STARTED:
  1. Describe your sources in .tablemerge.yaml
  2. List the tables of a source:   tablemerge tables project
  3. Inspect one table:             tablemerge describe project users
  4. Compare two sources:           tablemerge compare project production

For detailed help on each command, use: tablemerge <command> --help")]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List the tables defined by a schema source
    ///
    /// EXAMPLES:
    ///   tablemerge tables project
    Tables {
        /// Source name from the configuration file
        #[arg(value_name = "SOURCE")]
        source: String,
    },

    /// Show the definition of one table
    ///
    /// Fails when the table does not exist in the source.
    ///
    /// EXAMPLES:
    ///   tablemerge describe production users
    Describe {
        /// Source name from the configuration file
        #[arg(value_name = "SOURCE")]
        source: String,

        /// Table name
        #[arg(value_name = "TABLE")]
        table: String,
    },

    /// Compare the table sets of two schema sources
    ///
    /// EXAMPLES:
    ///   tablemerge compare project production
    Compare {
        /// Source side of the merge
        #[arg(value_name = "SOURCE")]
        source: String,

        /// Destination side of the merge
        #[arg(value_name = "DESTINATION")]
        destination: String,
    },
}
