use std::fmt;

use log::{debug, warn};
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};

use super::{Invocation, MediaKind};
use crate::config::Config;
use crate::http::post_empty;
use crate::logfile::LogFile;

/// Everything but unreserved characters and `/` gets escaped.
const QUERY_VALUE: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'_')
    .remove(b'.')
    .remove(b'-')
    .remove(b'~')
    .remove(b'/');

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum BlacklistReason {
    LanguageMismatch,
    OffsetExceeded,
}

impl fmt::Display for BlacklistReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::LanguageMismatch => f.write_str("language mismatch"),
            Self::OffsetExceeded => f.write_str("offset exceeded"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum BlacklistOutcome {
    Sent,
    Failed,
    AlreadyRequested,
}

/// Issues the blacklist call. Only the first request per run reaches Bazarr.
pub(crate) struct Blacklister<'a> {
    config: &'a Config,
    invocation: &'a Invocation,
    log: &'a LogFile,
    requested: bool,
}

impl<'a> Blacklister<'a> {
    pub(crate) fn new(config: &'a Config, invocation: &'a Invocation, log: &'a LogFile) -> Self {
        Self {
            config,
            invocation,
            log,
            requested: false,
        }
    }

    pub(crate) fn request(&mut self, reason: BlacklistReason) -> BlacklistOutcome {
        if self.requested {
            self.log.echo(&format!(
                "[INFO] Subtitle already blacklisted in this run, not sending again for {reason}."
            ));
            return BlacklistOutcome::AlreadyRequested;
        }
        self.requested = true;

        let url = blacklist_url(self.config, self.invocation);
        debug!("POST {url}");
        if self.config.api_key.is_empty() {
            warn!("no API key configured, Bazarr is likely to reject the blacklist request");
        }

        let headers = [
            ("accept", "application/json"),
            ("X-API-KEY", self.config.api_key.as_str()),
        ];
        match post_empty(&url, &headers) {
            Ok(status) => {
                println!("[SUCCESS] Blacklist request sent for {reason} (HTTP {status}).");
                BlacklistOutcome::Sent
            }
            Err(error) => {
                self.log
                    .echo(&format!("[ERROR] Blacklist request for {reason} failed: {error}"));
                BlacklistOutcome::Failed
            }
        }
    }
}

pub(crate) fn blacklist_url(config: &Config, invocation: &Invocation) -> String {
    let base = config.api_base_url();
    let common = format!(
        "provider={}&subs_id={}&language={}&subtitles_path={}",
        quote(&invocation.provider),
        quote(&invocation.subtitle_id),
        quote(&invocation.subtitles_language),
        quote(&invocation.subtitles_path.to_string_lossy()),
    );
    match invocation.media_kind() {
        MediaKind::Movie => format!(
            "{base}/api/movies/blacklist?radarrid={}&{common}",
            quote(&invocation.episode_id)
        ),
        MediaKind::Episode => format!(
            "{base}/api/episodes/blacklist?seriesid={}&episodeid={}&{common}",
            quote(&invocation.series_id),
            quote(&invocation.episode_id)
        ),
    }
}

fn quote(value: &str) -> String {
    utf8_percent_encode(value, QUERY_VALUE).to_string()
}
