mod blacklist;
mod language;
mod offset;


use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Result, bail};
use chrono::{Local, NaiveDateTime};
use log::debug;

use crate::config::Config;
use crate::db::HistoryDb;
use crate::logfile::LogFile;

use self::blacklist::{BlacklistReason, Blacklister};
use self::language::check_subtitle_language;
use self::offset::{OffsetOutcome, check_history_offset};

/// Provider name Bazarr uses for subtitles pulled out of the video container.
pub const EMBEDDED_PROVIDER: &str = "embeddedsubtitles";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKind {
    Movie,
    Episode,
}

/// The six values Bazarr hands to the hook.
#[derive(Debug, Clone)]
pub struct Invocation {
    pub episode_id: String,
    pub series_id: String,
    pub provider: String,
    pub subtitle_id: String,
    pub subtitles_language: String,
    pub subtitles_path: PathBuf,
}

impl Invocation {
    pub fn media_kind(&self) -> MediaKind {
        if self.series_id.is_empty() {
            MediaKind::Movie
        } else {
            MediaKind::Episode
        }
    }

    pub fn is_embedded(&self) -> bool {
        self.provider == EMBEDDED_PROVIDER
    }
}

pub fn run(invocation: Invocation, config: Config) -> ExitCode {
    let log = LogFile::new(config.log_file.clone(), config.enable_logging);
    let now = Local::now().naive_local();
    if config.enable_logging {
        debug!("appending to {}", log.path().display());
    }

    match run_checks(&invocation, &config, &log, now) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            log.echo(&format!("[ERROR] {err:#}"));
            ExitCode::from(1)
        }
    }
}

fn run_checks(
    invocation: &Invocation,
    config: &Config,
    log: &LogFile,
    now: NaiveDateTime,
) -> Result<()> {
    debug!("checking {invocation:?}");
    if invocation.is_embedded() {
        println!(
            "Provider is {EMBEDDED_PROVIDER}, proceeding with language check but skipping offset check."
        );
    }

    let mut blacklister = Blacklister::new(config, invocation, log);

    if config.enable_language_detection {
        run_language_check(invocation, log, &mut blacklister);
    } else {
        println!("[INFO] Language detection is disabled.");
    }

    if !invocation.is_embedded() {
        run_offset_check(invocation, config, log, now, &mut blacklister)?;
    }
    Ok(())
}

fn run_language_check(invocation: &Invocation, log: &LogFile, blacklister: &mut Blacklister<'_>) {
    let check = match check_subtitle_language(
        &invocation.subtitles_path,
        &invocation.subtitles_language,
    ) {
        Ok(check) => check,
        Err(err) => {
            log.echo(&format!("[LANG DETECTION ERROR] {err:#}"));
            return;
        }
    };

    println!(
        "[LANG DETECTION] Detected: {}, Expected: {}",
        check.detected_label(),
        check.expected
    );
    if let Some(detected) = &check.detected {
        debug!(
            "detected {} ({}) with confidence {:.2}",
            detected.code, detected.iso639_3, detected.confidence
        );
    }
    if check.is_match() {
        return;
    }

    println!("[ACTION] Blacklisting subtitle due to language mismatch...");
    log.append(&format!(
        "Blacklist due to language mismatch: Detected={}, Expected={}, Path={}",
        check.detected_label(),
        check.expected,
        invocation.subtitles_path.display()
    ));
    blacklister.request(BlacklistReason::LanguageMismatch);
}

fn run_offset_check(
    invocation: &Invocation,
    config: &Config,
    log: &LogFile,
    now: NaiveDateTime,
    blacklister: &mut Blacklister<'_>,
) -> Result<()> {
    if invocation.episode_id.is_empty() {
        bail!("No episode_id provided.");
    }
    if !config.db_path.exists() {
        bail!("Database not found at {}", config.db_path.display());
    }

    let outcome = {
        let db = HistoryDb::open_read_only(&config.db_path)?;
        check_history_offset(&db, invocation, now, config.allowed_offset_seconds)?
    };

    let allowed = config.allowed_offset_seconds;
    match outcome {
        OffsetOutcome::NoRecord => log.echo("[WARN] No matching 'action = 5' row found."),
        OffsetOutcome::Stale { recorded_at } => log.echo(&format!(
            "[INFO] Skipping match. Timestamp {recorded_at} is older than {} hours.",
            offset::MAX_RECORD_AGE_HOURS
        )),
        OffsetOutcome::PatternMissing => {
            log.echo("[ERROR] Offset pattern not found in description.")
        }
        OffsetOutcome::WithinRange { offset } => {
            println!("[SUCCESS] Extracted offset: {offset} seconds");
            println!(
                "[INFO] Offset is within acceptable range ±{allowed} seconds. No action taken."
            );
        }
        OffsetOutcome::Exceeded { offset } => {
            println!("[SUCCESS] Extracted offset: {offset} seconds");
            println!("[ALERT] Offset exceeds ±{allowed} seconds.");
            match invocation.media_kind() {
                MediaKind::Movie => {
                    println!("[ACTION] Blacklisting subtitle for movie...");
                    log.append(&format!(
                        "Movie: Offset={offset}, ID={}, SubID={}, Lang={}, Path={}",
                        invocation.episode_id,
                        invocation.subtitle_id,
                        invocation.subtitles_language,
                        invocation.subtitles_path.display()
                    ));
                }
                MediaKind::Episode => {
                    println!("[ACTION] Blacklisting subtitle for series...");
                    log.append(&format!(
                        "Series: Offset={offset}, SeriesID={}, EpisodeID={}, SubID={}, Lang={}, Path={}",
                        invocation.series_id,
                        invocation.episode_id,
                        invocation.subtitle_id,
                        invocation.subtitles_language,
                        invocation.subtitles_path.display()
                    ));
                }
            }
            blacklister.request(BlacklistReason::OffsetExceeded);
        }
    }
    Ok(())
}
