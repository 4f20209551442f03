use std::fs;
use std::path::Path;
use std::sync::LazyLock;

use anyhow::{Context, Result};
use regex::Regex;

pub(crate) const MAX_DIALOGUE_CHARS: usize = 10_000;

static CUE_INDEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d+$").expect("cue index pattern"));
static TIMECODE_ARROW: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d{2}:\d{2}:\d{2},\d{3} -->").expect("timecode pattern"));

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct DetectedLanguage {
    /// ISO 639-1 when one exists, otherwise the ISO 639-3 code.
    pub(crate) code: String,
    pub(crate) iso639_3: &'static str,
    pub(crate) confidence: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct LanguageCheck {
    pub(crate) detected: Option<DetectedLanguage>,
    pub(crate) expected: String,
}

impl LanguageCheck {
    pub(crate) fn is_match(&self) -> bool {
        self.detected
            .as_ref()
            .is_some_and(|detected| language_matches(detected, &self.expected))
    }

    pub(crate) fn detected_label(&self) -> &str {
        self.detected
            .as_ref()
            .map(|detected| detected.code.as_str())
            .unwrap_or("none")
    }
}

pub(crate) fn check_subtitle_language(path: &Path, language_tag: &str) -> Result<LanguageCheck> {
    let raw = read_subtitle_text(path)?;
    let dialogue = extract_dialogue(&raw);
    Ok(LanguageCheck {
        detected: detect_language(&dialogue),
        expected: expected_language(language_tag),
    })
}

pub(crate) fn read_subtitle_text(path: &Path) -> Result<String> {
    let bytes =
        fs::read(path).with_context(|| format!("failed to read subtitle {}", path.display()))?;
    Ok(decode_dropping_invalid(&bytes))
}

pub(crate) fn decode_dropping_invalid(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len());
    for chunk in bytes.utf8_chunks() {
        out.push_str(chunk.valid());
    }
    match out.strip_prefix('\u{feff}') {
        Some(rest) => rest.to_string(),
        None => out,
    }
}

/// Dialogue lines joined by single spaces, capped at [`MAX_DIALOGUE_CHARS`] characters.
pub(crate) fn extract_dialogue(raw: &str) -> String {
    let joined = raw
        .split(['\r', '\n'])
        .map(str::trim)
        .filter(|line| is_dialogue_line(line))
        .collect::<Vec<_>>()
        .join(" ");
    joined.chars().take(MAX_DIALOGUE_CHARS).collect()
}

fn is_dialogue_line(line: &str) -> bool {
    !line.is_empty() && !CUE_INDEX.is_match(line) && !TIMECODE_ARROW.is_match(line)
}

pub(crate) fn detect_language(text: &str) -> Option<DetectedLanguage> {
    if text.trim().is_empty() {
        return None;
    }
    let info = whatlang::detect(text)?;
    let iso639_3 = info.lang().code();
    Some(DetectedLanguage {
        code: iso639_1(iso639_3).unwrap_or(iso639_3).to_string(),
        iso639_3,
        confidence: info.confidence(),
    })
}

/// `en:forced` -> `en`. Bazarr's own codes for Brazilian Portuguese and
/// traditional Chinese are folded into the base language.
pub(crate) fn expected_language(language_tag: &str) -> String {
    let code = language_tag
        .split(':')
        .next()
        .unwrap_or_default()
        .trim()
        .to_lowercase();
    match code.as_str() {
        "pb" => "pt".to_string(),
        "zt" => "zh".to_string(),
        _ => code,
    }
}

pub(crate) fn language_matches(detected: &DetectedLanguage, expected: &str) -> bool {
    detected.code.eq_ignore_ascii_case(expected) || detected.iso639_3.eq_ignore_ascii_case(expected)
}

fn iso639_1(iso639_3: &str) -> Option<&'static str> {
    let code = match iso639_3 {
        "afr" => "af",
        "aka" => "ak",
        "amh" => "am",
        "ara" => "ar",
        "aze" => "az",
        "bel" => "be",
        "ben" => "bn",
        "bul" => "bg",
        "cat" => "ca",
        "ces" => "cs",
        "cmn" => "zh",
        "dan" => "da",
        "deu" => "de",
        "ell" => "el",
        "eng" => "en",
        "epo" => "eo",
        "est" => "et",
        "fin" => "fi",
        "fra" => "fr",
        "guj" => "gu",
        "heb" => "he",
        "hin" => "hi",
        "hrv" => "hr",
        "hun" => "hu",
        "hye" => "hy",
        "ind" => "id",
        "ita" => "it",
        "jav" => "jv",
        "jpn" => "ja",
        "kan" => "kn",
        "kat" => "ka",
        "khm" => "km",
        "kor" => "ko",
        "lat" => "la",
        "lav" => "lv",
        "lit" => "lt",
        "mal" => "ml",
        "mar" => "mr",
        "mkd" => "mk",
        "mya" => "my",
        "nep" => "ne",
        "nld" => "nl",
        "nob" => "no",
        "ori" => "or",
        "pan" => "pa",
        "pes" => "fa",
        "pol" => "pl",
        "por" => "pt",
        "ron" => "ro",
        "rus" => "ru",
        "sin" => "si",
        "slk" => "sk",
        "slv" => "sl",
        "sna" => "sn",
        "spa" => "es",
        "srp" => "sr",
        "swe" => "sv",
        "tam" => "ta",
        "tel" => "te",
        "tgl" => "tl",
        "tha" => "th",
        "tuk" => "tk",
        "tur" => "tr",
        "ukr" => "uk",
        "urd" => "ur",
        "uzb" => "uz",
        "vie" => "vi",
        "yid" => "yi",
        "zul" => "zu",
        _ => return None,
    };
    Some(code)
}

#[cfg(test)]
mod tests {
    use super::*;

    const ENGLISH_SRT: &str = "1\r\n00:00:01,000 --> 00:00:03,500\r\nWhere did you put the keys to the car?\r\n\r\n2\r\n00:00:04,000 --> 00:00:06,000\r\nI think they are on the kitchen table, next to the newspaper.\r\n\r\n3\r\n00:00:06,500 --> 00:00:09,000\r\nWe should leave now or we will be late for the meeting with your father.\r\n";

    const FRENCH_TEXT: &str = "Je ne sais pas où tu as mis les clés de la voiture. \
        Elles sont probablement sur la table de la cuisine, à côté du journal. \
        Nous devrions partir maintenant, sinon nous serons en retard pour le rendez-vous avec ton père.";

    fn detected(code: &str, iso639_3: &'static str) -> DetectedLanguage {
        DetectedLanguage {
            code: code.to_string(),
            iso639_3,
            confidence: 1.0,
        }
    }

    #[test]
    fn extract_dialogue_strips_indices_timecodes_and_blank_lines() {
        let dialogue = extract_dialogue(ENGLISH_SRT);
        assert_eq!(
            dialogue,
            "Where did you put the keys to the car? \
             I think they are on the kitchen table, next to the newspaper. \
             We should leave now or we will be late for the meeting with your father."
        );
    }

    #[test]
    fn extract_dialogue_keeps_dialogue_that_starts_with_digits() {
        let dialogue = extract_dialogue("12\n12 monkeys\n00:00:01,000 -->x\n  \n");
        assert_eq!(dialogue, "12 monkeys");
    }

    #[test]
    fn extract_dialogue_truncates_to_character_limit() {
        let line = "é".repeat(400);
        let raw = std::iter::repeat_n(line.as_str(), 40)
            .collect::<Vec<_>>()
            .join("\n");
        let dialogue = extract_dialogue(&raw);
        assert_eq!(dialogue.chars().count(), MAX_DIALOGUE_CHARS);
    }

    #[test]
    fn short_dialogue_is_not_padded() {
        assert_eq!(extract_dialogue("1\nhi\n").chars().count(), 2);
    }

    #[test]
    fn decode_discards_invalid_bytes_and_bom() {
        let bytes = b"\xEF\xBB\xBFHel\xFFlo\xC3";
        assert_eq!(decode_dropping_invalid(bytes), "Hello");
    }

    #[test]
    fn expected_language_drops_modifier_and_lowercases() {
        assert_eq!(expected_language("EN:forced"), "en");
        assert_eq!(expected_language("fr"), "fr");
        assert_eq!(expected_language("pb:hi"), "pt");
        assert_eq!(expected_language(""), "");
    }

    #[test]
    fn mismatch_when_detected_differs() {
        let check = LanguageCheck {
            detected: Some(detected("fr", "fra")),
            expected: "en".to_string(),
        };
        assert!(!check.is_match());
    }

    #[test]
    fn match_ignores_case_and_accepts_three_letter_codes() {
        let upper = LanguageCheck {
            detected: Some(detected("EN", "eng")),
            expected: "en".to_string(),
        };
        assert!(upper.is_match());

        let three = LanguageCheck {
            detected: Some(detected("en", "eng")),
            expected: "eng".to_string(),
        };
        assert!(three.is_match());
    }

    #[test]
    fn undetermined_language_never_matches() {
        let check = LanguageCheck {
            detected: None,
            expected: "en".to_string(),
        };
        assert!(!check.is_match());
        assert_eq!(check.detected_label(), "none");
    }

    #[test]
    fn detects_english_and_french_dialogue() {
        let english = detect_language(&extract_dialogue(ENGLISH_SRT)).expect("english detected");
        assert_eq!(english.code, "en");
        assert_eq!(english.iso639_3, "eng");

        let french = detect_language(FRENCH_TEXT).expect("french detected");
        assert_eq!(french.code, "fr");
    }

    #[test]
    fn empty_text_is_undetermined() {
        assert!(detect_language("   ").is_none());
    }

    #[test]
    fn check_subtitle_language_reads_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("movie.en.srt");
        std::fs::write(&path, ENGLISH_SRT).expect("write subtitle");

        let check = check_subtitle_language(&path, "en:forced").expect("check runs");
        assert!(check.is_match(), "unexpected verdict: {check:?}");
    }

    #[test]
    fn missing_subtitle_is_an_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let err = check_subtitle_language(&dir.path().join("missing.srt"), "en")
            .expect_err("missing file must fail");
        assert!(format!("{err:#}").contains("failed to read subtitle"));
    }
}
