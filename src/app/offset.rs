use std::sync::LazyLock;

use anyhow::{Context, Result, anyhow, bail};
use chrono::{NaiveDateTime, TimeDelta};
use log::debug;
use regex::Regex;

use super::Invocation;
use crate::db::{HistoryDb, HistoryRecord};

pub(crate) const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.f";
pub(crate) const MAX_RECORD_AGE_HOURS: i64 = 2;

/// Bazarr writes `YYYY-MM-DD HH:MM:SS.ffffff`. The fraction is mandatory, one to six digits.
static HISTORY_TIMESTAMP: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[0-9]{4}-[0-9]{2}-[0-9]{2} [0-9]{2}:[0-9]{2}:[0-9]{2}\.[0-9]{1,6}$")
        .expect("history timestamp pattern")
});

static OFFSET_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"offset of ([\d.-]+) seconds").expect("offset pattern"));

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum OffsetOutcome {
    NoRecord,
    Stale { recorded_at: NaiveDateTime },
    /// Description carries no offset. Treated as nothing to check.
    PatternMissing,
    WithinRange { offset: f64 },
    Exceeded { offset: f64 },
}

pub(crate) fn check_history_offset(
    db: &HistoryDb,
    invocation: &Invocation,
    now: NaiveDateTime,
    allowed_offset_seconds: f64,
) -> Result<OffsetOutcome> {
    let record = db.latest_sync_record(
        invocation.media_kind(),
        &invocation.episode_id,
        &invocation.subtitles_language,
    )?;
    match record {
        Some(record) => {
            debug!("history record {}: {:?}", record.id, record.description);
            evaluate_record(&record, now, allowed_offset_seconds)
        }
        None => Ok(OffsetOutcome::NoRecord),
    }
}

pub(crate) fn evaluate_record(
    record: &HistoryRecord,
    now: NaiveDateTime,
    allowed_offset_seconds: f64,
) -> Result<OffsetOutcome> {
    let recorded_at = parse_history_timestamp(&record.timestamp)?;
    if recorded_at < now - TimeDelta::hours(MAX_RECORD_AGE_HOURS) {
        return Ok(OffsetOutcome::Stale { recorded_at });
    }

    let Some(offset) = extract_offset(&record.description)? else {
        return Ok(OffsetOutcome::PatternMissing);
    };
    if offset.abs() > allowed_offset_seconds {
        Ok(OffsetOutcome::Exceeded { offset })
    } else {
        Ok(OffsetOutcome::WithinRange { offset })
    }
}

pub(crate) fn parse_history_timestamp(raw: &str) -> Result<NaiveDateTime> {
    if !HISTORY_TIMESTAMP.is_match(raw) {
        bail!("Failed to parse timestamp: {raw}");
    }
    NaiveDateTime::parse_from_str(raw, TIMESTAMP_FORMAT)
        .with_context(|| format!("Failed to parse timestamp: {raw}"))
}

/// `Ok(None)` when the description has no "offset of N seconds" phrase.
pub(crate) fn extract_offset(description: &str) -> Result<Option<f64>> {
    let Some(captures) = OFFSET_PATTERN.captures(description) else {
        return Ok(None);
    };
    let raw = &captures[1];
    raw.parse::<f64>()
        .map(Some)
        .map_err(|err| anyhow!("Failed to parse offset '{raw}': {err}"))
}
