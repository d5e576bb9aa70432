//! Source reconciliation
//!
//! One recording can describe itself three ways: through its filename,
//! through an embedded WAMD chunk, and through an alternate (GUANO-style)
//! metadata source decoded outside this module. None of the three is
//! required to be complete, or present at all. Reconciliation merges them
//! into a single canonical record using fixed per-field precedence chains,
//! and always produces a record — a recording nobody managed to identify
//! still belongs in the catalog, flagged as partial.
//!
//! The merge is a pure function of its inputs: same sources in, bit-same
//! record out.

use serde::Serialize;

use crate::identifier::IdentifierMatch;
use crate::wamd::{Timestamp, WamdMetadata};

// Alternate-source field names, per the GUANO convention.
pub const ALT_MANUAL_ID: &str = "Species Manual ID";
pub const ALT_AUTO_ID: &str = "Species Auto ID";
pub const ALT_POSITION: &str = "Loc Position";
pub const ALT_SERIAL: &str = "Serial";
pub const ALT_LENGTH: &str = "Length";
pub const ALT_TIMESTAMP: &str = "Timestamp";

/// An already-decoded value from the alternate metadata source.
#[derive(Debug, Clone, PartialEq)]
pub enum AltValue {
    Text(String),
    Number(f64),
    Position(f64, f64),
    Time(Timestamp),
}

/// Opaque key→value map from the alternate metadata source. This module
/// only ever reads it; construction belongs to whatever decoded the source.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct AlternateMetadata {
    fields: Vec<(String, AltValue)>,
}

impl AlternateMetadata {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<String>, value: AltValue) {
        self.fields.push((key.into(), value));
    }

    pub fn get(&self, key: &str) -> Option<&AltValue> {
        self.fields
            .iter()
            .find_map(|(k, v)| if k == key { Some(v) } else { None })
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    fn text(&self, key: &str) -> Option<&str> {
        match self.get(key)? {
            AltValue::Text(s) => Some(s),
            _ => None,
        }
    }

    fn number(&self, key: &str) -> Option<f64> {
        match self.get(key)? {
            AltValue::Number(n) => Some(*n),
            _ => None,
        }
    }

    fn position(&self, key: &str) -> Option<(f64, f64)> {
        match self.get(key)? {
            AltValue::Position(lat, lon) => Some((*lat, *lon)),
            _ => None,
        }
    }

    fn time(&self, key: &str) -> Option<Timestamp> {
        match self.get(key)? {
            AltValue::Time(t) => Some(*t),
            _ => None,
        }
    }
}

/// The reconciled metadata for one recording. Built once per input file;
/// a fresh merge replaces it if the sources change.
///
/// Invariant: `genus` and `species` are both populated or both empty.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CanonicalRecord {
    pub genus: Option<String>,
    pub species: Option<String>,
    /// Capture time normalized to UTC clock time (naive sources verbatim).
    pub recorded_at_utc: Option<chrono::NaiveDateTime>,
    /// ISO 8601 capture time preserving the original offset when known.
    pub recorded_at_iso: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub recorder_serial: Option<String>,
    pub duration_secs: Option<f64>,
    /// False when identification, timestamp or position could not be
    /// resolved from any source ("best-effort partial").
    pub complete: bool,
}

/// Split an identification code into genus and species. Six characters
/// split 3+3, four characters split 2+2; anything else is unparseable and
/// the caller moves on to the next-priority source.
fn split_identification(code: &str) -> Option<(String, String)> {
    if !code.is_ascii() {
        return None;
    }
    match code.len() {
        6 => Some((code[..3].to_string(), code[3..].to_string())),
        4 => Some((code[..2].to_string(), code[2..].to_string())),
        _ => None,
    }
}

/// Merge the available sources into one canonical record.
///
/// Precedence, first hit wins:
/// - identification: alternate manual > alternate auto > WAMD manual >
///   WAMD auto > filename code
/// - timestamp: zoned alternate > zoned WAMD > naive filename time
///   (a timestamp without offset information from either metadata source
///   is treated as absent, never as UTC)
/// - position: alternate > WAMD
/// - serial: alternate > WAMD
/// - duration: alternate > `fallback_duration`, which is only invoked when
///   the alternate source has no value (WAMD defines no duration field)
pub fn reconcile<F>(
    ident: &IdentifierMatch,
    wamd: Option<&WamdMetadata>,
    alt: Option<&AlternateMetadata>,
    fallback_duration: F,
) -> CanonicalRecord
where
    F: FnOnce() -> Option<f64>,
{
    let identification = alt
        .and_then(|a| a.text(ALT_MANUAL_ID))
        .and_then(split_identification)
        .or_else(|| {
            alt.and_then(|a| a.text(ALT_AUTO_ID))
                .and_then(split_identification)
        })
        .or_else(|| {
            wamd.and_then(WamdMetadata::manual_id)
                .and_then(split_identification)
        })
        .or_else(|| {
            wamd.and_then(WamdMetadata::auto_id)
                .and_then(split_identification)
        })
        .or_else(|| ident.genus.clone().zip(ident.species.clone()));

    let recorded_at = alt
        .and_then(|a| a.time(ALT_TIMESTAMP))
        .filter(Timestamp::has_offset)
        .or_else(|| {
            wamd.and_then(WamdMetadata::timestamp)
                .filter(|t| t.has_offset())
                .copied()
        })
        .or_else(|| ident.capture_time.map(Timestamp::Naive));

    let position = alt.and_then(|a| a.position(ALT_POSITION)).or_else(|| {
        wamd.and_then(WamdMetadata::position)
            .map(|fix| (fix.latitude, fix.longitude))
    });

    let recorder_serial = alt
        .and_then(|a| a.text(ALT_SERIAL))
        .or_else(|| wamd.and_then(WamdMetadata::serial))
        .map(str::to_string);

    let duration_secs = alt
        .and_then(|a| a.number(ALT_LENGTH))
        .or_else(fallback_duration);

    let complete = identification.is_some() && recorded_at.is_some() && position.is_some();
    let (genus, species) = match identification {
        Some((g, s)) => (Some(g), Some(s)),
        None => (None, None),
    };

    CanonicalRecord {
        genus,
        species,
        recorded_at_utc: recorded_at.as_ref().map(Timestamp::naive_utc),
        recorded_at_iso: recorded_at.as_ref().map(Timestamp::to_iso8601),
        latitude: position.map(|(lat, _)| lat),
        longitude: position.map(|(_, lon)| lon),
        recorder_serial,
        duration_secs,
        complete,
    }
}
