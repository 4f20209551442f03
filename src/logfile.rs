use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{Local, NaiveDateTime};
use log::warn;

/// Append-only audit log. Every line is flushed before `append` returns.
#[derive(Debug, Clone)]
pub struct LogFile {
    path: PathBuf,
    enabled: bool,
}

impl LogFile {
    pub fn new(path: PathBuf, enabled: bool) -> Self {
        Self { path, enabled }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn append(&self, message: &str) {
        if !self.enabled {
            return;
        }
        if let Err(err) = self.write_line(&format_line(Local::now().naive_local(), message)) {
            warn!("{err:#}");
        }
    }

    /// Prints to stdout, where Bazarr collects hook output, and appends to the log.
    pub fn echo(&self, message: &str) {
        println!("{message}");
        self.append(message);
    }

    fn write_line(&self, line: &str) -> Result<()> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .with_context(|| format!("failed to open log file {}", self.path.display()))?;
        file.write_all(line.as_bytes())
            .and_then(|_| file.flush())
            .with_context(|| format!("failed to write log file {}", self.path.display()))
    }
}

pub(crate) fn format_line(at: NaiveDateTime, message: &str) -> String {
    format!("[{}] {message}\n", at.format("%Y-%m-%dT%H:%M:%S%.6f"))
}
