use std::ffi::OsString;
use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use clap::builder::BoolishValueParser;
use clap::error::ErrorKind;
use log::debug;

use crate::app::Invocation;
use crate::config::Config;
use crate::paths::{DEFAULT_DB_PATH, default_log_file_path};

pub const USAGE: &str =
    "Usage: <episode_id> <series_id> <provider> <subtitle_id> <subtitles_language> <subtitles>";

#[derive(Debug, Parser)]
#[command(
    name = "subqc",
    version,
    about = "Bazarr post-processing hook: blacklist subtitles with the wrong language or a large sync offset"
)]
pub struct Cli {
    /// Radarr movie id, or Sonarr episode id for series
    #[arg(allow_hyphen_values = true)]
    pub episode_id: String,
    /// Sonarr series id, empty for movies
    #[arg(allow_hyphen_values = true)]
    pub series_id: String,
    #[arg(allow_hyphen_values = true)]
    pub provider: String,
    #[arg(allow_hyphen_values = true)]
    pub subtitle_id: String,
    /// Language tag such as `en` or `en:forced`
    #[arg(allow_hyphen_values = true)]
    pub subtitles_language: String,
    #[arg(allow_hyphen_values = true)]
    pub subtitles: PathBuf,

    /// Largest accepted sync offset, in seconds either way
    #[arg(
        long,
        env = "SUBQC_ALLOWED_OFFSET_SECONDS",
        default_value_t = 5.0,
        value_parser = parse_tolerance
    )]
    pub allowed_offset_seconds: f64,

    #[arg(long, env = "SUBQC_API_KEY", default_value = "", hide_env_values = true)]
    pub api_key: String,

    #[arg(long, env = "SUBQC_API_HOST", default_value = "127.0.0.1")]
    pub api_host: String,

    #[arg(long, env = "SUBQC_API_PORT", default_value_t = 6767)]
    pub api_port: u16,

    /// Bazarr's SQLite database
    #[arg(long, env = "SUBQC_DB_PATH", default_value = DEFAULT_DB_PATH)]
    pub db_path: PathBuf,

    #[arg(
        long,
        env = "SUBQC_ENABLE_LOGGING",
        default_value_t = true,
        action = clap::ArgAction::Set,
        value_parser = BoolishValueParser::new()
    )]
    pub enable_logging: bool,

    #[arg(
        long,
        env = "SUBQC_ENABLE_LANGUAGE_DETECTION",
        default_value_t = true,
        action = clap::ArgAction::Set,
        value_parser = BoolishValueParser::new()
    )]
    pub enable_language_detection: bool,

    /// Defaults to `log-file.log` next to the executable
    #[arg(long, env = "SUBQC_LOG_FILE")]
    pub log_file: Option<PathBuf>,
}

impl Cli {
    pub fn into_parts(self) -> Result<(Invocation, Config)> {
        let log_file = match self.log_file {
            Some(path) => path,
            None => default_log_file_path()?,
        };
        let config = Config {
            allowed_offset_seconds: self.allowed_offset_seconds,
            api_key: self.api_key,
            api_host: self.api_host,
            api_port: self.api_port,
            db_path: self.db_path,
            enable_logging: self.enable_logging,
            enable_language_detection: self.enable_language_detection,
            log_file,
        };
        let invocation = Invocation {
            episode_id: self.episode_id,
            series_id: self.series_id,
            provider: self.provider,
            subtitle_id: self.subtitle_id,
            subtitles_language: self.subtitles_language,
            subtitles_path: self.subtitles,
        };
        Ok((invocation, config))
    }
}

/// Parses the command line. `Err` carries the exit status to stop with:
/// 0 after `--help`/`--version`, 1 after printing the usage line.
pub fn parse_args<I, T>(args: I) -> Result<Cli, u8>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    match Cli::try_parse_from(args) {
        Ok(cli) => Ok(cli),
        Err(err) if matches!(err.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => {
            let _ = err.print();
            Err(0)
        }
        Err(err) => {
            debug!("{err}");
            println!("{USAGE}");
            Err(1)
        }
    }
}

fn parse_tolerance(raw: &str) -> Result<f64, String> {
    let value = raw
        .trim()
        .parse::<f64>()
        .map_err(|err| format!("'{raw}' is not a number: {err}"))?;
    if !value.is_finite() || value < 0.0 {
        return Err(format!("'{raw}' must be a non-negative number of seconds"));
    }
    Ok(value)
}
