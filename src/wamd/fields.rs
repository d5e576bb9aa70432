//! Per-field value coercion for WAMD records
//!
//! WAMD payloads are raw bytes; what they mean depends on the field. Most
//! fields are plain UTF-8 text, two are little-endian u16, and two logical
//! fields (timestamp, GPS waypoint) each arrive in several vendor layouts
//! that have to be disambiguated before they can be normalized.
//!
//! Coercion misses are deliberately soft: an unrecognized timestamp length
//! or a malformed waypoint simply yields no value and the field is omitted
//! from the decoded map. The single exception is a timezone offset that
//! parses neither as `±HH:MM` nor as `±HHMM` — that raises
//! [`MetadataError::Timezone`], because it indicates corrupt vendor data
//! rather than a merely absent field.

use chrono::{DateTime, FixedOffset, NaiveDateTime};

use crate::error::{MetadataError, Result};

/// A decoded WAMD field value.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    /// Unsigned 16-bit integer (`version`, `time_expansion`).
    U16(u16),
    /// UTF-8 text (the default for most fields).
    Text(String),
    /// Capture timestamp, zoned or naive depending on the source layout.
    Timestamp(Timestamp),
    /// GPS waypoint (`gpsfirst`).
    Gps(GpsFix),
}

impl FieldValue {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            FieldValue::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_u16(&self) -> Option<u16> {
        match self {
            FieldValue::U16(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_timestamp(&self) -> Option<&Timestamp> {
        match self {
            FieldValue::Timestamp(t) => Some(t),
            _ => None,
        }
    }

    pub fn as_gps(&self) -> Option<&GpsFix> {
        match self {
            FieldValue::Gps(g) => Some(g),
            _ => None,
        }
    }
}

/// A capture timestamp that may or may not carry a UTC offset.
///
/// The distinction matters downstream: reconciliation only lets a
/// metadata-source timestamp override the filename-derived one when it
/// carries real offset information.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Timestamp {
    /// Timezone-aware, e.g. `2014-04-02 22:59:14-05:00`.
    Zoned(DateTime<FixedOffset>),
    /// No offset information, e.g. `2014-04-02 22:59:14.000`.
    Naive(NaiveDateTime),
}

impl Timestamp {
    /// Whether this timestamp carries explicit offset information.
    pub fn has_offset(&self) -> bool {
        matches!(self, Timestamp::Zoned(_))
    }

    /// The timestamp normalized to UTC clock time. Naive timestamps are
    /// returned verbatim; there is nothing to normalize them against.
    pub fn naive_utc(&self) -> NaiveDateTime {
        match self {
            Timestamp::Zoned(dt) => dt.naive_utc(),
            Timestamp::Naive(dt) => *dt,
        }
    }

    /// ISO 8601 rendering that preserves the original offset when known.
    pub fn to_iso8601(&self) -> String {
        match self {
            Timestamp::Zoned(dt) => dt.to_rfc3339(),
            Timestamp::Naive(dt) => dt.format("%Y-%m-%dT%H:%M:%S%.f").to_string(),
        }
    }
}

/// A decoded GPS waypoint: decimal degrees plus optional altitude in meters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GpsFix {
    pub latitude: f64,
    pub longitude: f64,
    pub altitude: Option<f64>,
}

/// Interpret a 2-byte payload as unsigned 16-bit little-endian.
/// Any other payload length yields no value.
pub(crate) fn parse_u16_le(payload: &[u8]) -> Option<u16> {
    match payload {
        [lo, hi] => Some(u16::from_le_bytes([*lo, *hi])),
        _ => None,
    }
}

/// Parse a WAMD timestamp. Known layouts, selected by length:
///
/// ```text
/// 2014-04-02 22:59:14-05:00    25 chars, timezone-aware
/// 2014-04-02 22:59:14-0500     24 chars, offset missing its colon
/// 2014-04-02 22:59:14.000      23 chars, naive, fractional seconds
/// 2014-04-02 22:59:14          19 chars, naive
/// ```
///
/// Any other length yields `Ok(None)`. The 24-char form exists because some
/// vendor firmware writes the offset without a colon; for both zoned forms
/// the colon layout is tried first and the digits-only layout second. An
/// offset that fails both is a [`MetadataError::Timezone`] error.
pub(crate) fn parse_timestamp(text: &str) -> Result<Option<Timestamp>> {
    if !text.is_ascii() {
        return Ok(None);
    }
    match text.len() {
        25 | 24 => {
            let (clock, offset) = text.split_at(19);
            let naive = match NaiveDateTime::parse_from_str(clock, "%Y-%m-%d %H:%M:%S") {
                Ok(dt) => dt,
                Err(_) => return Ok(None),
            };
            let tz = parse_offset_colon(offset)
                .or_else(|| parse_offset_compact(offset))
                .ok_or_else(|| MetadataError::Timezone(offset.to_string()))?;
            Ok(naive
                .and_local_timezone(tz)
                .single()
                .map(Timestamp::Zoned))
        }
        23 => Ok(NaiveDateTime::parse_from_str(text, "%Y-%m-%d %H:%M:%S%.3f")
            .ok()
            .map(Timestamp::Naive)),
        19 => Ok(NaiveDateTime::parse_from_str(text, "%Y-%m-%d %H:%M:%S")
            .ok()
            .map(Timestamp::Naive)),
        _ => Ok(None),
    }
}

/// `±HH:MM`
fn parse_offset_colon(s: &str) -> Option<FixedOffset> {
    let bytes = s.as_bytes();
    if bytes.len() != 6 || bytes[3] != b':' {
        return None;
    }
    let sign = match bytes[0] {
        b'+' => 1,
        b'-' => -1,
        _ => return None,
    };
    let hours: i32 = s[1..3].parse().ok()?;
    let minutes: i32 = s[4..6].parse().ok()?;
    FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60))
}

/// `±HHMM`, sign optional. Only the sign and the first four digits are
/// inspected: a 25-char timestamp whose offset lacks a colon hands this
/// parser a fifth trailing byte, which is ignored.
fn parse_offset_compact(s: &str) -> Option<FixedOffset> {
    let (sign, digits) = match s.as_bytes().first()? {
        b'+' => (1, &s[1..]),
        b'-' => (-1, &s[1..]),
        _ => (1, s),
    };
    if digits.len() < 4 || !digits.as_bytes()[..4].iter().all(u8::is_ascii_digit) {
        return None;
    }
    let hours: i32 = digits[..2].parse().ok()?;
    let minutes: i32 = digits[2..4].parse().ok()?;
    FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60))
}

/// Parse a WAMD "GPS First" waypoint. Two vendor layouts, after a leading
/// datum identifier that is always ignored:
///
/// ```text
/// SM3/SM4:   WGS84, LAT, N|S, LON, E|W [, alt]
/// EMTouch:   WGS84, [-]LAT, [-]LON [, alt]
/// ```
///
/// The layouts are disambiguated by whether the second remaining value is
/// the literal `N` or `S`. A southern latitude negates its magnitude. A
/// western longitude is shifted by −1 degree rather than negated — that is
/// the firmware behavior this decoder reproduces, wrong as it looks; it is
/// pinned by test until the upstream fix is confirmed. EMTouch altitude may
/// be the literal `(null)`, which means "no altitude".
pub(crate) fn parse_gps(text: &str) -> Option<GpsFix> {
    if text.is_empty() {
        return None;
    }
    let vals: Vec<&str> = text.split(',').map(str::trim).collect();
    let vals = vals.get(1..)?;

    if matches!(vals.get(1).copied(), Some("N") | Some("S")) {
        let mut latitude: f64 = vals.first()?.parse().ok()?;
        let mut longitude: f64 = vals.get(2)?.parse().ok()?;
        if vals.get(1).copied() == Some("S") {
            latitude = -latitude;
        }
        if vals.get(3).copied()? == "W" {
            longitude += -1.0;
        }
        let altitude = vals
            .get(4)
            .and_then(|alt| alt.parse::<f64>().ok())
            .map(f64::round);
        Some(GpsFix {
            latitude,
            longitude,
            altitude,
        })
    } else {
        let latitude: f64 = vals.first()?.parse().ok()?;
        let longitude: f64 = vals.get(1)?.parse().ok()?;
        let altitude = vals
            .get(2)
            .filter(|alt| **alt != "(null)")
            .and_then(|alt| alt.parse().ok());
        Some(GpsFix {
            latitude,
            longitude,
            altitude,
        })
    }
}
