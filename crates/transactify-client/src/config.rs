use std::path::{Path, PathBuf};

use crate::{ClientError, ClientResult};

pub const SOURCE_DIR_ENV: &str = "TRANSACTIFY_SOURCE_DIR";
pub const DEFAULT_DOWNLOADS_DIR: &str = "Downloads";

/// Picks the folder to scan: explicit override, then `TRANSACTIFY_SOURCE_DIR`,
/// then `~/Downloads`.
pub fn resolve_source_dir(source_override: Option<&Path>) -> ClientResult<PathBuf> {
    let env_value = std::env::var_os(SOURCE_DIR_ENV).map(PathBuf::from);
    resolve_source_dir_from(source_override, env_value, home::home_dir())
}

fn resolve_source_dir_from(
    source_override: Option<&Path>,
    env_value: Option<PathBuf>,
    home_dir: Option<PathBuf>,
) -> ClientResult<PathBuf> {
    let candidate = match source_override {
        Some(path) => path.to_path_buf(),
        None => match env_value.filter(|value| !value.as_os_str().is_empty()) {
            Some(path) => path,
            None => match home_dir {
                Some(home_path) => home_path.join(DEFAULT_DOWNLOADS_DIR),
                None => return Err(ClientError::source_dir_unresolved()),
            },
        },
    };

    absolutize(&candidate)
}

fn absolutize(path: &Path) -> ClientResult<PathBuf> {
    if path.is_absolute() {
        return Ok(path.to_path_buf());
    }

    std::env::current_dir()
        .map(|cwd| cwd.join(path))
        .map_err(|error| ClientError::filesystem_failure(path, &error.to_string()))
}
