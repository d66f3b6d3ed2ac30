use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;
use serde_json::ser::{PrettyFormatter, Serializer};
use tracing::debug;

use crate::contracts::types::{CanonicalTransaction, SourceFormat};
use crate::{ClientError, ClientResult};

pub const OUTPUT_FILE_NAME: &str = "all_transactions.json";
const JSON_INDENT: &[u8] = b"    ";

/// Creates `<source>/<format dir>` if needed and returns it.
pub fn ensure_output_dir(source_dir: &Path, format: SourceFormat) -> ClientResult<PathBuf> {
    let output_dir = source_dir.join(format.output_dir_name());
    if !output_dir.is_dir() {
        fs::create_dir(&output_dir)
            .map_err(|error| ClientError::filesystem_failure(&output_dir, &error.to_string()))?;
        debug!(format = format.as_str(), dir = %output_dir.display(), "created output directory");
    }
    Ok(output_dir)
}

pub fn render_transactions(transactions: &[CanonicalTransaction]) -> ClientResult<Vec<u8>> {
    let mut buffer = Vec::new();
    let formatter = PrettyFormatter::with_indent(JSON_INDENT);
    let mut serializer = Serializer::with_formatter(&mut buffer, formatter);
    transactions
        .serialize(&mut serializer)
        .map_err(|error| ClientError::internal_serialization(&error.to_string()))?;
    Ok(buffer)
}

/// Replaces `<output_dir>/all_transactions.json` with the full collection.
pub fn write_transactions(
    output_dir: &Path,
    transactions: &[CanonicalTransaction],
) -> ClientResult<PathBuf> {
    let body = render_transactions(transactions)?;
    let output_path = output_dir.join(OUTPUT_FILE_NAME);
    fs::write(&output_path, body)
        .map_err(|error| ClientError::filesystem_failure(&output_path, &error.to_string()))?;
    Ok(output_path)
}
