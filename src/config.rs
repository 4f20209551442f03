use std::path::PathBuf;

/// Settings resolved once at startup and handed to every check.
#[derive(Debug, Clone)]
pub struct Config {
    pub allowed_offset_seconds: f64,
    pub api_key: String,
    pub api_host: String,
    pub api_port: u16,
    pub db_path: PathBuf,
    pub enable_logging: bool,
    pub enable_language_detection: bool,
    pub log_file: PathBuf,
}

impl Config {
    pub fn api_base_url(&self) -> String {
        format!("http://{}:{}", self.api_host, self.api_port)
    }
}
