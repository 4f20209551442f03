use std::path::PathBuf;

use anyhow::{Context, Result};

pub const DEFAULT_DB_PATH: &str = "/db/bazarr.db";
pub const LOG_FILE_NAME: &str = "log-file.log";

pub fn default_log_file_path() -> Result<PathBuf> {
    let exe = std::env::current_exe().context("unable to resolve executable path")?;
    let dir = exe
        .parent()
        .context("executable path has no parent directory")?;
    Ok(dir.join(LOG_FILE_NAME))
}
