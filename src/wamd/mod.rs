//! WAMD metadata chunk decoding
//!
//! Wildlife Acoustics bat detectors embed a `wamd` chunk in their WAVE
//! files. Its payload is a back-to-back sequence of TLV records:
//!
//! ```text
//! 2 bytes   field id (LE u16)
//! 4 bytes   payload length (LE u32)
//! N bytes   payload
//! ```
//!
//! repeated until the chunk is exhausted. Field ids map to names through a
//! fixed table; ids not in the table are kept under their numeric key and
//! decoded as text, so unknown vendor fields survive a round trip through
//! the catalog. A handful of ids (embedded voice-note audio, program
//! binaries, the runstate blob, alignment padding) are recognized and
//! discarded outright.
//!
//! Decoding is an explicit two-state affair: you hold either an undecoded
//! file handle or an immutable [`WamdMetadata`] value produced by a single
//! fallible call. [`WamdMetadata::decode`] is a pure function of the chunk
//! bytes; decoding the same bytes twice yields identical maps.

pub mod fields;

use std::fs::File;
use std::io::{BufReader, Read, Seek};
use std::path::Path;

use crate::error::{MetadataError, Result};
use crate::riff::ChunkWalker;

pub use fields::{FieldValue, GpsFix, Timestamp};

/// Name of the metadata chunk inside the WAVE container.
pub const WAMD_CHUNK: &[u8; 4] = b"wamd";

/// Field id → name table, from the vendor format description.
const FIELD_NAMES: &[(u16, &str)] = &[
    (0x00, "version"),
    (0x01, "model"),
    (0x02, "serial"),
    (0x03, "firmware"),
    (0x04, "prefix"),
    (0x05, "timestamp"),
    (0x06, "gpsfirst"),
    (0x07, "gpstrack"),
    (0x08, "software"),
    (0x09, "license"),
    (0x0A, "notes"),
    (0x0B, "auto_id"),
    (0x0C, "manual_id"),
    (0x0D, "voicenotes"),
    (0x0E, "auto_id_stats"),
    (0x0F, "time_expansion"),
    (0x10, "program"),
    (0x11, "runstate"),
    (0x12, "microphone"),
    (0x13, "sensitivity"),
];

/// Ids whose payloads are consumed but never kept: large opaque blobs with
/// no decodable semantics, plus the 16-bit alignment padding marker.
const DROPPED_IDS: &[u16] = &[
    0x0D,   // voice note embedded .WAV
    0x10,   // program binary
    0x11,   // runstate blob
    0xFFFF, // alignment padding
];

/// How a named field's payload is to be coerced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FieldKind {
    U16,
    Text,
    Timestamp,
    Gps,
}

fn field_name(id: u16) -> Option<&'static str> {
    FIELD_NAMES
        .iter()
        .find(|(fid, _)| *fid == id)
        .map(|(_, name)| *name)
}

fn field_kind(name: &str) -> FieldKind {
    match name {
        "version" | "time_expansion" => FieldKind::U16,
        "timestamp" => FieldKind::Timestamp,
        "gpsfirst" => FieldKind::Gps,
        _ => FieldKind::Text,
    }
}

/// Key of a decoded field: the table name, or the raw id for fields the
/// table doesn't know.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldKey {
    Named(&'static str),
    Unknown(u16),
}

impl std::fmt::Display for FieldKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FieldKey::Named(name) => f.write_str(name),
            FieldKey::Unknown(id) => write!(f, "0x{:04X}", id),
        }
    }
}

/// Decoded WAMD metadata: field name (or raw id) → typed value, in record
/// order. Immutable once constructed.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct WamdMetadata {
    fields: Vec<(FieldKey, FieldValue)>,
}

impl WamdMetadata {
    /// Extract WAMD metadata from an open WAVE stream.
    pub fn read<R: Read + Seek>(reader: R) -> Result<Self> {
        let mut walker = ChunkWalker::open(reader)?;
        let chunk = walker
            .find(WAMD_CHUNK)?
            .ok_or(MetadataError::MissingMetadata)?;
        Self::decode(&chunk)
    }

    /// Extract WAMD metadata from a file on disk. The file handle is held
    /// only for the duration of the chunk scan.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(path)?;
        Self::read(BufReader::new(file))
    }

    /// Decode one `wamd` chunk payload.
    ///
    /// Record framing that runs past the end of the chunk aborts with
    /// [`MetadataError::Decode`]; a malformed timezone offset aborts with
    /// [`MetadataError::Timezone`]. Per-field coercion misses (wrong payload
    /// length, invalid UTF-8, unrecognized layout) drop that field and keep
    /// decoding.
    pub fn decode(chunk: &[u8]) -> Result<Self> {
        let mut fields = Vec::new();

        for record in Records::new(chunk) {
            let (id, payload) = record?;
            if DROPPED_IDS.contains(&id) {
                continue;
            }

            let (key, kind) = match field_name(id) {
                Some(name) => (FieldKey::Named(name), field_kind(name)),
                None => (FieldKey::Unknown(id), FieldKind::Text),
            };

            let value = match kind {
                FieldKind::U16 => fields::parse_u16_le(payload).map(FieldValue::U16),
                FieldKind::Text => String::from_utf8(payload.to_vec())
                    .ok()
                    .map(FieldValue::Text),
                FieldKind::Timestamp => match std::str::from_utf8(payload) {
                    Ok(text) => fields::parse_timestamp(text)?.map(FieldValue::Timestamp),
                    Err(_) => None,
                },
                FieldKind::Gps => std::str::from_utf8(payload)
                    .ok()
                    .and_then(fields::parse_gps)
                    .map(FieldValue::Gps),
            };

            if let Some(value) = value {
                fields.push((key, value));
            }
        }

        Ok(Self { fields })
    }

    /// Look up a field by table name.
    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.fields.iter().find_map(|(key, value)| match key {
            FieldKey::Named(n) if *n == name => Some(value),
            _ => None,
        })
    }

    /// Look up a field the id table doesn't know, by raw id.
    pub fn get_unknown(&self, id: u16) -> Option<&FieldValue> {
        self.fields.iter().find_map(|(key, value)| match key {
            FieldKey::Unknown(fid) if *fid == id => Some(value),
            _ => None,
        })
    }

    /// Iterate fields in record order.
    pub fn iter(&self) -> impl Iterator<Item = (&FieldKey, &FieldValue)> {
        self.fields.iter().map(|(k, v)| (k, v))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    // Typed accessors for the fields reconciliation cares about.

    pub fn manual_id(&self) -> Option<&str> {
        self.get("manual_id").and_then(FieldValue::as_text)
    }

    pub fn auto_id(&self) -> Option<&str> {
        self.get("auto_id").and_then(FieldValue::as_text)
    }

    pub fn serial(&self) -> Option<&str> {
        self.get("serial").and_then(FieldValue::as_text)
    }

    pub fn timestamp(&self) -> Option<&Timestamp> {
        self.get("timestamp").and_then(FieldValue::as_timestamp)
    }

    pub fn position(&self) -> Option<&GpsFix> {
        self.get("gpsfirst").and_then(FieldValue::as_gps)
    }
}

/// Iterator over the raw (id, payload) records of a chunk. Framing only;
/// no coercion.
pub(crate) struct Records<'a> {
    chunk: &'a [u8],
    offset: usize,
}

impl<'a> Records<'a> {
    pub(crate) fn new(chunk: &'a [u8]) -> Self {
        Self { chunk, offset: 0 }
    }
}

impl<'a> Iterator for Records<'a> {
    type Item = Result<(u16, &'a [u8])>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.offset >= self.chunk.len() {
            return None;
        }

        let rest = &self.chunk[self.offset..];
        if rest.len() < 6 {
            let offset = self.offset;
            self.offset = self.chunk.len();
            return Some(Err(MetadataError::Decode(format!(
                "record header truncated at offset {}",
                offset
            ))));
        }

        let id = u16::from_le_bytes([rest[0], rest[1]]);
        let len = u32::from_le_bytes([rest[2], rest[3], rest[4], rest[5]]) as usize;

        if rest.len() - 6 < len {
            let offset = self.offset;
            self.offset = self.chunk.len();
            return Some(Err(MetadataError::Decode(format!(
                "record 0x{:04X} at offset {} declares {} bytes past end of chunk",
                id, offset, len
            ))));
        }

        self.offset += 6 + len;
        Some(Ok((id, &rest[6..6 + len])))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // ==========================================================================
    // WAMD DECODER TESTS
    // ==========================================================================
    //
    // Fixtures are synthetic chunk payloads built record by record, so every
    // test states its exact wire layout.
    // ==========================================================================

    fn record(id: u16, payload: &[u8]) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(6 + payload.len());
        bytes.extend_from_slice(&id.to_le_bytes());
        bytes.extend_from_slice(&(payload.len() as u32).to_le_bytes());
        bytes.extend_from_slice(payload);
        bytes
    }

    fn chunk(records: &[Vec<u8>]) -> Vec<u8> {
        records.iter().flatten().copied().collect()
    }

    #[test]
    fn test_decode_typical_chunk() {
        let bytes = chunk(&[
            record(0x00, &[3, 0]),
            record(0x01, b"SM4BAT-FS"),
            record(0x02, b"S4U09201"),
            record(0x05, b"2014-04-02 22:59:14-05:00"),
            record(0x06, b"WGS84,51.5,N,0.12,E,10"),
            record(0x0C, b"PIPPIP"),
        ]);
        let meta = WamdMetadata::decode(&bytes).unwrap();

        assert_eq!(meta.len(), 6);
        assert_eq!(meta.get("version"), Some(&FieldValue::U16(3)));
        assert_eq!(meta.get("model").and_then(FieldValue::as_text), Some("SM4BAT-FS"));
        assert_eq!(meta.serial(), Some("S4U09201"));
        assert_eq!(meta.manual_id(), Some("PIPPIP"));
        assert!(meta.timestamp().unwrap().has_offset());
        assert_eq!(meta.position().unwrap().latitude, 51.5);
    }

    #[test]
    fn test_unknown_id_retained_as_text() {
        let bytes = chunk(&[record(0x42, b"future field")]);
        let meta = WamdMetadata::decode(&bytes).unwrap();

        assert_eq!(
            meta.get_unknown(0x42).and_then(FieldValue::as_text),
            Some("future field")
        );
        assert!(meta.get("version").is_none());
    }

    #[test]
    fn test_drop_list_fields_never_appear() {
        let bytes = chunk(&[
            record(0x0D, &[0xDE, 0xAD]),       // voice note
            record(0x10, &[0xBE, 0xEF]),       // program binary
            record(0x11, &[0u8; 64]),          // runstate blob
            record(0xFFFF, &[0]),              // padding
            record(0x02, b"S4U09201"),
        ]);
        let meta = WamdMetadata::decode(&bytes).unwrap();

        assert_eq!(meta.len(), 1);
        assert_eq!(meta.serial(), Some("S4U09201"));
        assert!(meta.get_unknown(0x0D).is_none());
        assert!(meta.get_unknown(0xFFFF).is_none());
    }

    #[test]
    fn test_truncated_record_is_decode_error() {
        let mut bytes = chunk(&[record(0x02, b"S4U09201")]);
        // Inflate the declared length past the end of the chunk
        bytes[2..6].copy_from_slice(&100u32.to_le_bytes());
        let err = WamdMetadata::decode(&bytes).unwrap_err();
        assert!(matches!(err, MetadataError::Decode(_)));
    }

    #[test]
    fn test_truncated_header_is_decode_error() {
        let err = WamdMetadata::decode(&[0x02, 0x00, 0x04]).unwrap_err();
        assert!(matches!(err, MetadataError::Decode(_)));
    }

    #[test]
    fn test_empty_chunk_decodes_to_empty_map() {
        let meta = WamdMetadata::decode(&[]).unwrap();
        assert!(meta.is_empty());
    }

    #[test]
    fn test_unparseable_timestamp_omitted_other_fields_kept() {
        let bytes = chunk(&[
            record(0x05, b"not a timestamp at all......."),
            record(0x02, b"S4U09201"),
        ]);
        let meta = WamdMetadata::decode(&bytes).unwrap();

        assert!(meta.timestamp().is_none());
        assert_eq!(meta.serial(), Some("S4U09201"));
    }

    #[test]
    fn test_garbled_timezone_aborts_decode() {
        let bytes = chunk(&[record(0x05, b"2014-04-02 22:59:14-ab:cd")]);
        let err = WamdMetadata::decode(&bytes).unwrap_err();
        assert!(matches!(err, MetadataError::Timezone(_)));
    }

    #[test]
    fn test_invalid_utf8_field_omitted_other_fields_kept() {
        let bytes = chunk(&[
            record(0x0A, &[0xFF, 0xFE, 0x80]),
            record(0x02, b"S4U09201"),
        ]);
        let meta = WamdMetadata::decode(&bytes).unwrap();

        assert!(meta.get("notes").is_none());
        assert_eq!(meta.serial(), Some("S4U09201"));
    }

    #[test]
    fn test_u16_field_wrong_length_omitted() {
        let bytes = chunk(&[record(0x0F, &[1, 0, 0])]);
        let meta = WamdMetadata::decode(&bytes).unwrap();
        assert!(meta.get("time_expansion").is_none());
    }

    #[test]
    fn test_decode_is_deterministic() {
        let bytes = chunk(&[
            record(0x02, b"S4U09201"),
            record(0x05, b"2014-04-02 22:59:14-05:00"),
        ]);
        let a = WamdMetadata::decode(&bytes).unwrap();
        let b = WamdMetadata::decode(&bytes).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_record_framing_round_trip() {
        // Splitting a chunk into (id, length, payload) triples and
        // re-encoding them must reproduce the original bytes.
        let original = chunk(&[
            record(0x00, &[3, 0]),
            record(0x42, b"unknown"),
            record(0x11, &[0u8; 32]),
            record(0x02, b""),
        ]);

        let mut rebuilt = Vec::new();
        for rec in Records::new(&original) {
            let (id, payload) = rec.unwrap();
            rebuilt.extend_from_slice(&record(id, payload));
        }
        assert_eq!(rebuilt, original);
    }

    #[test]
    fn test_read_from_wave_stream() {
        let wamd = chunk(&[record(0x02, b"S4U09201")]);
        let mut file = Vec::new();
        file.extend_from_slice(b"RIFF");
        file.extend_from_slice(&0u32.to_le_bytes());
        file.extend_from_slice(b"WAVE");
        file.extend_from_slice(b"data");
        file.extend_from_slice(&4u32.to_le_bytes());
        file.extend_from_slice(&[0u8; 4]);
        file.extend_from_slice(b"wamd");
        file.extend_from_slice(&(wamd.len() as u32).to_le_bytes());
        file.extend_from_slice(&wamd);
        let total = (file.len() - 8) as u32;
        file[4..8].copy_from_slice(&total.to_le_bytes());

        let meta = WamdMetadata::read(std::io::Cursor::new(file)).unwrap();
        assert_eq!(meta.serial(), Some("S4U09201"));
    }

    #[test]
    fn test_missing_wamd_chunk() {
        let mut file = Vec::new();
        file.extend_from_slice(b"RIFF");
        file.extend_from_slice(&4u32.to_le_bytes());
        file.extend_from_slice(b"WAVE");

        let err = WamdMetadata::read(std::io::Cursor::new(file)).unwrap_err();
        assert!(matches!(err, MetadataError::MissingMetadata));
    }
}
