//! GUANO sidechunk adapter
//!
//! GUANO (Grand Unified Acoustic Notation Ontology) is the other metadata
//! convention found in bat-detector WAVE files: plain UTF-8 `key: value`
//! lines stored in a `guan` RIFF sub-chunk. The reconciliation engine
//! treats GUANO as an opaque [`AlternateMetadata`] map; this adapter is the
//! thing that fills that map in, typing the handful of fields the engine
//! knows about and keeping everything else as text.
//!
//! GUANO is the preferred source: the import pipeline reads it first and
//! only falls back to WAMD when no usable GUANO data is present.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use crate::error::{MetadataError, Result};
use crate::reconcile::{
    AltValue, AlternateMetadata, ALT_LENGTH, ALT_POSITION, ALT_TIMESTAMP,
};
use crate::riff::ChunkWalker;
use crate::wamd::fields::parse_timestamp;

/// Name of the GUANO chunk inside the WAVE container.
pub const GUANO_CHUNK: &[u8; 4] = b"guan";

/// Read and decode the GUANO chunk of a WAVE file. The file handle is held
/// only for the duration of the chunk scan.
pub fn from_file<P: AsRef<Path>>(path: P) -> Result<AlternateMetadata> {
    let file = File::open(path)?;
    let mut walker = ChunkWalker::open(BufReader::new(file))?;
    let chunk = walker
        .find(GUANO_CHUNK)?
        .ok_or(MetadataError::MissingMetadata)?;
    Ok(decode(&chunk))
}

/// Decode one `guan` chunk payload into an alternate metadata map.
///
/// Lines that aren't `key: value`, and typed fields whose values don't
/// parse, are dropped; GUANO in the wild is hand-edited often enough that
/// a bad line shouldn't cost the good ones.
pub fn decode(chunk: &[u8]) -> AlternateMetadata {
    let mut map = AlternateMetadata::new();
    let text = String::from_utf8_lossy(chunk);

    for line in text.lines() {
        let line = line.trim_matches('\0').trim();
        if line.is_empty() {
            continue;
        }
        let Some((key, value)) = line.split_once(':') else {
            continue;
        };
        let (key, value) = (key.trim(), value.trim());
        if key.is_empty() || value.is_empty() {
            continue;
        }

        match key {
            ALT_POSITION => {
                if let Some(position) = parse_position(value) {
                    map.insert(key, AltValue::Position(position.0, position.1));
                }
            }
            ALT_LENGTH => {
                if let Ok(secs) = value.parse::<f64>() {
                    map.insert(key, AltValue::Number(secs));
                }
            }
            ALT_TIMESTAMP => {
                // GUANO writes ISO 8601 with a 'T' separator; the WAMD
                // layouts use a space. Normalize, then share the parser
                // (including its naive-vs-zoned distinction).
                let normalized = normalize_iso(value);
                if let Ok(Some(ts)) = parse_timestamp(&normalized) {
                    map.insert(key, AltValue::Time(ts));
                }
            }
            _ => map.insert(key, AltValue::Text(value.to_string())),
        }
    }

    map
}

/// `Loc Position` is two whitespace-separated decimal degrees.
fn parse_position(value: &str) -> Option<(f64, f64)> {
    let mut parts = value.split_whitespace();
    let lat: f64 = parts.next()?.parse().ok()?;
    let lon: f64 = parts.next()?.parse().ok()?;
    if parts.next().is_some() {
        return None;
    }
    Some((lat, lon))
}

fn normalize_iso(value: &str) -> String {
    let mut normalized = value.to_string();
    if normalized.find('T') == Some(10) {
        normalized.replace_range(10..11, " ");
    }
    normalized
}
