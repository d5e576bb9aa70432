//! Filename identifier parsing
//!
//! Bat detectors name their recordings with an optional identification
//! prefix and a capture timestamp:
//!
//! ```text
//! PIPPIP_20190430_210112     identified (genus PIP, species PIP)
//! No_ID_20190430_210112      matched, not identified
//! NoID_20190430_210112       matched, not identified
//! NOISE_20190430_210112      matched, not identified
//! 20150610_215446            matched, not identified
//! ```
//!
//! Parsing works on the filename stem only (extension already stripped) and
//! never touches the filesystem. Many real filenames don't follow the
//! convention at all, so a non-match is an ordinary outcome, not an error.

use chrono::NaiveDateTime;

/// Result of parsing one filename stem. Constructed once, never mutated.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct IdentifierMatch {
    /// Whole stem matched the naming grammar.
    pub matched: bool,
    /// The prefix was a parseable genus+species code (the `No_ID`/`NOISE`
    /// literals match the grammar without identifying anything).
    pub identified: bool,
    pub genus: Option<String>,
    pub species: Option<String>,
    /// Capture time from the digit groups; naive, the recorder's local
    /// clock carries no offset.
    pub capture_time: Option<NaiveDateTime>,
}

impl IdentifierMatch {
    /// Parse a filename stem against the naming grammar.
    ///
    /// Grammar: optional prefix (`GGGSSS` | `No_ID` | `NoID` | `NOISE`,
    /// followed by `_`), then a mandatory `YYYYMMDD_HHMMSS`. Digit groups
    /// that don't form a real calendar date are treated as a non-match.
    pub fn parse(stem: &str) -> Self {
        let unmatched = Self::default();

        // The grammar is pure ASCII; anything else cannot match.
        if !stem.is_ascii() || stem.len() < 15 {
            return unmatched;
        }

        let (prefix, suffix) = stem.split_at(stem.len() - 15);
        let capture_time = match parse_suffix(suffix) {
            Some(dt) => dt,
            None => return unmatched,
        };

        match prefix {
            "" | "No_ID_" | "NoID_" | "NOISE_" => Self {
                matched: true,
                identified: false,
                genus: None,
                species: None,
                capture_time: Some(capture_time),
            },
            code if is_identification_prefix(code) => Self {
                matched: true,
                identified: true,
                genus: Some(code[0..3].to_string()),
                species: Some(code[3..6].to_string()),
                capture_time: Some(capture_time),
            },
            _ => unmatched,
        }
    }
}

/// `YYYYMMDD_HHMMSS`, validated as a real date-time.
fn parse_suffix(suffix: &str) -> Option<NaiveDateTime> {
    let bytes = suffix.as_bytes();
    if bytes.len() != 15 || bytes[8] != b'_' {
        return None;
    }
    if !bytes[..8].iter().all(u8::is_ascii_digit) || !bytes[9..].iter().all(u8::is_ascii_digit) {
        return None;
    }
    NaiveDateTime::parse_from_str(suffix, "%Y%m%d_%H%M%S").ok()
}

/// Six word characters and a trailing underscore.
fn is_identification_prefix(prefix: &str) -> bool {
    prefix.len() == 7
        && prefix.ends_with('_')
        && prefix[..6]
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'_')
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    // ==========================================================================
    // IDENTIFIER GRAMMAR TESTS
    // ==========================================================================

    fn dt(y: i32, mo: u32, d: u32, h: u32, mi: u32, s: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, mo, d)
            .unwrap()
            .and_hms_opt(h, mi, s)
            .unwrap()
    }

    #[test]
    fn test_identified_recording() {
        let id = IdentifierMatch::parse("PIPPIP_20190430_210112");
        assert!(id.matched);
        assert!(id.identified);
        assert_eq!(id.genus.as_deref(), Some("PIP"));
        assert_eq!(id.species.as_deref(), Some("PIP"));
        assert_eq!(id.capture_time, Some(dt(2019, 4, 30, 21, 1, 12)));
    }

    #[test]
    fn test_bare_timestamp() {
        let id = IdentifierMatch::parse("20150610_215446");
        assert!(id.matched);
        assert!(!id.identified);
        assert!(id.genus.is_none());
        assert!(id.species.is_none());
        assert_eq!(id.capture_time, Some(dt(2015, 6, 10, 21, 54, 46)));
    }

    #[test]
    fn test_noise_literal_matches_without_identifying() {
        let id = IdentifierMatch::parse("NOISE_20150610_215446");
        assert!(id.matched);
        assert!(!id.identified);
        assert!(id.genus.is_none());
    }

    #[test]
    fn test_no_id_literals() {
        for stem in ["No_ID_20150610_215446", "NoID_20150610_215446"] {
            let id = IdentifierMatch::parse(stem);
            assert!(id.matched, "{stem} should match");
            assert!(!id.identified, "{stem} should not identify");
        }
    }

    #[test]
    fn test_non_matching_stem_is_empty_not_panic() {
        let id = IdentifierMatch::parse("not_a_valid_name");
        assert!(!id.matched);
        assert!(!id.identified);
        assert!(id.genus.is_none());
        assert!(id.species.is_none());
        assert!(id.capture_time.is_none());
    }

    #[test]
    fn test_different_genus_species_codes() {
        let id = IdentifierMatch::parse("MYODAU_20200801_030000");
        assert_eq!(id.genus.as_deref(), Some("MYO"));
        assert_eq!(id.species.as_deref(), Some("DAU"));
    }

    #[test]
    fn test_impossible_calendar_date_does_not_match() {
        // Month 13 fits the digit grammar but isn't a date
        let id = IdentifierMatch::parse("20151310_215446");
        assert!(!id.matched);
        assert!(id.capture_time.is_none());
    }

    #[test]
    fn test_wrong_prefix_length_does_not_match() {
        assert!(!IdentifierMatch::parse("PIPIT_20190430_210112").matched);
        assert!(!IdentifierMatch::parse("PIPPIPX_20190430_210112").matched);
    }

    #[test]
    fn test_malformed_suffix_does_not_match() {
        assert!(!IdentifierMatch::parse("PIPPIP_2019043_2101120").matched);
        assert!(!IdentifierMatch::parse("PIPPIP_20190430-210112").matched);
        assert!(!IdentifierMatch::parse("20150610_21544").matched);
    }

    #[test]
    fn test_empty_and_short_stems() {
        assert!(!IdentifierMatch::parse("").matched);
        assert!(!IdentifierMatch::parse("PIPPIP").matched);
    }

    #[test]
    fn test_non_ascii_stem_does_not_match() {
        assert!(!IdentifierMatch::parse("PÏPPIP_20190430_210112").matched);
    }
}
