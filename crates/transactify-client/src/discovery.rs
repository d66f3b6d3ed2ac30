use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::{ClientError, ClientResult};

pub const SPREADSHEET_EXTENSION: &str = "xlsx";
pub const QFX_EXTENSIONS: [&str; 2] = ["QFX", "qfx"];

/// Spreadsheets directly inside `dir`, sorted by file name.
pub fn find_spreadsheets(dir: &Path) -> ClientResult<Vec<PathBuf>> {
    let Some(entries) = sorted_entries(dir)? else {
        return Ok(Vec::new());
    };

    let files = entries
        .into_iter()
        .filter(|path| path.is_file() && has_extension(path, SPREADSHEET_EXTENSION))
        .collect::<Vec<PathBuf>>();
    debug!(dir = %dir.display(), count = files.len(), "discovered spreadsheets");
    Ok(files)
}

/// QFX files anywhere below `dir`: every `.QFX` match first, then every
/// `.qfx` match. Within each list a directory's own files come before those
/// of its subdirectories, and entries are visited in name order.
pub fn find_qfx_files(dir: &Path) -> ClientResult<Vec<PathBuf>> {
    if sorted_entries(dir)?.is_none() {
        return Ok(Vec::new());
    }

    let mut all_files = Vec::new();
    for extension in QFX_EXTENSIONS {
        walk(dir, extension, &mut all_files);
    }
    debug!(dir = %dir.display(), count = all_files.len(), "discovered QFX files");
    Ok(all_files)
}

fn walk(dir: &Path, extension: &str, matched: &mut Vec<PathBuf>) {
    let entries = match sorted_entries(dir) {
        Ok(Some(entries)) => entries,
        Ok(None) => return,
        Err(error) => {
            warn!(dir = %dir.display(), error = %error, "skipping unreadable directory");
            return;
        }
    };

    let mut subdirs = Vec::new();
    for path in entries {
        let is_dir = fs::symlink_metadata(&path)
            .map(|metadata| metadata.file_type().is_dir())
            .unwrap_or(false);
        if is_dir {
            subdirs.push(path);
        } else if path.is_file() && has_extension(&path, extension) {
            matched.push(path);
        }
    }

    for subdir in subdirs {
        walk(&subdir, extension, matched);
    }
}

/// Entry paths of `dir` sorted by name, or `None` when `dir` does not exist.
fn sorted_entries(dir: &Path) -> ClientResult<Option<Vec<PathBuf>>> {
    let reader = match fs::read_dir(dir) {
        Ok(reader) => reader,
        Err(error) if error.kind() == ErrorKind::NotFound => return Ok(None),
        Err(error) => return Err(ClientError::filesystem_failure(dir, &error.to_string())),
    };

    let mut paths = Vec::new();
    for entry in reader {
        let entry =
            entry.map_err(|error| ClientError::filesystem_failure(dir, &error.to_string()))?;
        paths.push(entry.path());
    }
    paths.sort();
    Ok(Some(paths))
}

fn has_extension(path: &Path, extension: &str) -> bool {
    path.extension()
        .and_then(|value| value.to_str())
        .is_some_and(|value| value == extension)
}
