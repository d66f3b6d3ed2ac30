pub mod document;
pub mod statement;
pub mod values;

use std::fs;
use std::path::Path;

use tracing::{debug, info};

use crate::contracts::types::{
    Balance, CanonicalTransaction, PipelineReport, PipelineStatus, SourceFormat,
};
use crate::discovery::find_qfx_files;
use crate::hashing::{identity_hash, qfx_natural_key};
use crate::output::{ensure_output_dir, write_transactions};
use crate::status::StatusReporter;
use crate::{ClientError, ClientResult};

use self::statement::OfxAccount;

pub const NO_FILES_MESSAGE: &str = "No QFX files found.";
pub const SUCCESS_MESSAGE: &str = "QFX files converted successfully.";

/// Converts every `.QFX`/`.qfx` file under `source_dir` (recursively) into
/// `qfx_transactions/all_transactions.json`.
pub fn convert_directory(
    source_dir: &Path,
    reporter: &dyn StatusReporter,
) -> ClientResult<PipelineReport> {
    let files = find_qfx_files(source_dir)?;
    if files.is_empty() {
        reporter.report(NO_FILES_MESSAGE);
        return Ok(PipelineReport::no_input(SourceFormat::Qfx));
    }

    let output_dir = ensure_output_dir(source_dir, SourceFormat::Qfx)?;

    let mut all_transactions = Vec::new();
    let mut accounts = Vec::new();
    for file in &files {
        reporter.report(&format!("Processing {}...", file.display()));
        for account in read_file(file)? {
            reporter.report(&format!("Processing account {}...", account.account_id));
            debug!(
                file = %file.display(),
                account = %account.account_id,
                transactions = account.transactions.len(),
                "read statement"
            );
            if !accounts.contains(&account.account_number) {
                accounts.push(account.account_number);
            }
            all_transactions.extend(canonical_transactions(&account));
        }
    }

    let output_path = write_transactions(&output_dir, &all_transactions)?;
    info!(
        files = files.len(),
        transactions = all_transactions.len(),
        output = %output_path.display(),
        "qfx conversion finished"
    );
    reporter.report(SUCCESS_MESSAGE);

    Ok(PipelineReport {
        format: SourceFormat::Qfx,
        status: PipelineStatus::Converted,
        files: files.iter().map(|file| file.display().to_string()).collect(),
        accounts: accounts.len(),
        transactions: all_transactions.len(),
        output_path: Some(output_path.display().to_string()),
    })
}

/// Parses one OFX/QFX file into its statements.
pub fn read_file(path: &Path) -> ClientResult<Vec<OfxAccount>> {
    let bytes =
        fs::read(path).map_err(|error| ClientError::filesystem_failure(path, &error.to_string()))?;
    let content = String::from_utf8_lossy(&bytes);
    let root = document::parse_document(path, &content)?;
    statement::read_accounts(path, &root)
}

pub fn canonical_transactions(account: &OfxAccount) -> Vec<CanonicalTransaction> {
    account
        .transactions
        .iter()
        .map(|transaction| CanonicalTransaction {
            id: identity_hash(&qfx_natural_key(&account.account_id, &transaction.fitid)),
            date: transaction.posted.format("%Y-%m-%d").to_string(),
            amount: transaction.amount,
            name: transaction.payee.clone(),
            account_id: account.account_number,
            balance: Balance::Statement(account.balance),
        })
        .collect()
}
