use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use transactify_client::commands::convert::FormatSelection;

/// Extended help shown after `transactify convert --help`.
pub const CONVERT_AFTER_HELP: &str = "\
Where files are read from:
  1. --path <dir>, when given
  2. the TRANSACTIFY_SOURCE_DIR environment variable, when set
  3. ~/Downloads

What gets converted:
  Excel  every .xlsx directly inside the folder (not subfolders); the first
         sheet must have the columns Transaction Date, Settlement Date,
         Activity Type, Symbol, Price, Net Amount, Account #.
         Dates look like `2023-01-01 09:00:00 AM`.
  QFX    every .QFX and .qfx file in the folder and all subfolders
         (bank, credit card, and investment statements).

Where results go:
  <folder>/transactions_excel/all_transactions.json
  <folder>/qfx_transactions/all_transactions.json
  Each run replaces the previous file. A format with no input files is
  skipped and nothing is written for it.

Logging:
  Diagnostics go to stderr. Use -v or -vv, or set TRANSACTIFY_LOG
  (for example `TRANSACTIFY_LOG=transactify_client=debug`).
";

#[derive(Debug, Parser)]
#[command(
    name = "transactify",
    version,
    about = "convert brokerage spreadsheets and QFX statements into JSON",
    disable_help_subcommand = true
)]
pub struct Cli {
    /// Print more diagnostics to stderr (-v info, -vv debug)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Convert every spreadsheet and QFX statement in a folder
    #[command(after_long_help = CONVERT_AFTER_HELP)]
    Convert {
        /// Folder to scan (defaults to TRANSACTIFY_SOURCE_DIR, then ~/Downloads)
        #[arg(long)]
        path: Option<String>,
        /// Which inputs to convert
        #[arg(long, value_enum, default_value_t = FormatArg::All)]
        format: FormatArg,
        /// Do not print per-file progress lines
        #[arg(long)]
        quiet: bool,
        /// Emit machine-readable JSON output
        #[arg(long)]
        json: bool,
    },
    /// Print the 14-digit identity hash of a string
    Hash {
        /// Text to hash, e.g. an account ID followed by a transaction ID
        input: String,
        /// Emit machine-readable JSON output
        #[arg(long)]
        json: bool,
    },
}

impl Commands {
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Convert { .. } => "convert",
            Self::Hash { .. } => "hash",
        }
    }
}

#[derive(Debug, Clone, Copy, Eq, PartialEq, ValueEnum)]
pub enum FormatArg {
    All,
    Excel,
    Qfx,
}

impl From<FormatArg> for FormatSelection {
    fn from(value: FormatArg) -> Self {
        match value {
            FormatArg::All => FormatSelection::All,
            FormatArg::Excel => FormatSelection::Excel,
            FormatArg::Qfx => FormatSelection::Qfx,
        }
    }
}

pub fn parse_from<I, T>(itr: I) -> Result<Cli, clap::Error>
where
    I: IntoIterator<Item = T>,
    T: Into<std::ffi::OsString> + Clone,
{
    Cli::try_parse_from(itr)
}
