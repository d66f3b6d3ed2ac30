pub mod rows;
pub mod sheet;

use std::path::Path;

use tracing::{debug, info};

use crate::ClientResult;
use crate::contracts::types::{CanonicalTransaction, PipelineReport, PipelineStatus, SourceFormat};
use crate::discovery::find_spreadsheets;
use crate::output::{ensure_output_dir, write_transactions};
use crate::status::StatusReporter;

pub const NO_FILES_MESSAGE: &str = "No Excel files found.";
pub const SUCCESS_MESSAGE: &str = "Excel files converted successfully.";

/// Converts every spreadsheet directly inside `source_dir` into
/// `transactions_excel/all_transactions.json`.
///
/// Nothing is created when no spreadsheet is found. Any unreadable file aborts
/// the run before the output file is touched.
pub fn convert_directory(
    source_dir: &Path,
    reporter: &dyn StatusReporter,
) -> ClientResult<PipelineReport> {
    let files = find_spreadsheets(source_dir)?;
    if files.is_empty() {
        reporter.report(NO_FILES_MESSAGE);
        return Ok(PipelineReport::no_input(SourceFormat::Excel));
    }

    let output_dir = ensure_output_dir(source_dir, SourceFormat::Excel)?;

    let mut all_transactions: Vec<CanonicalTransaction> = Vec::new();
    let mut accounts = Vec::new();
    for file in &files {
        reporter.report(&format!("Processing {}...", file.display()));
        let table = sheet::load_first_sheet(file)?;
        let transactions = rows::derive_transactions(file, &table)?;
        debug!(file = %file.display(), rows = transactions.len(), "derived spreadsheet rows");

        for transaction in &transactions {
            if !accounts.contains(&transaction.account_id) {
                accounts.push(transaction.account_id);
            }
        }
        all_transactions.extend(transactions);
    }

    let output_path = write_transactions(&output_dir, &all_transactions)?;
    info!(
        files = files.len(),
        transactions = all_transactions.len(),
        output = %output_path.display(),
        "excel conversion finished"
    );
    reporter.report(SUCCESS_MESSAGE);

    Ok(PipelineReport {
        format: SourceFormat::Excel,
        status: PipelineStatus::Converted,
        files: files.iter().map(|file| file.display().to_string()).collect(),
        accounts: accounts.len(),
        transactions: all_transactions.len(),
        output_path: Some(output_path.display().to_string()),
    })
}
