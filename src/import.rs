//! Per-file import pipeline
//!
//! Runs the whole extraction chain for one recording: filename parse,
//! alternate (GUANO) metadata, WAMD fallback, duration probe, reconcile.
//! The pipeline is deliberately forgiving — whatever goes wrong with the
//! embedded metadata, every file still comes out the other end as a
//! canonical record. The one thing worth telling the operator about, a
//! corrupt WAMD chunk, is carried alongside the record rather than
//! replacing it.
//!
//! Processing is single-file and synchronous; batching across files (and
//! parallelizing, since nothing here shares mutable state) belongs to the
//! caller.

use std::path::Path;

use serde::Serialize;

use crate::error::MetadataError;
use crate::guano;
use crate::identifier::IdentifierMatch;
use crate::probe::{DurationProbe, SymphoniaProbe};
use crate::reconcile::{reconcile, CanonicalRecord};
use crate::wamd::WamdMetadata;

/// Result of importing one file: the canonical record plus enough context
/// to report on it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ImportOutcome {
    pub file_path: String,
    pub file_name: String,
    /// Filename stem used for identifier parsing.
    pub identifier: String,
    pub record: CanonicalRecord,
    /// Set when the WAMD chunk was present but corrupt (framing ran off the
    /// end, or a garbled timezone offset). Absent metadata is not an error.
    pub metadata_error: Option<String>,
}

/// Runs the import pipeline for single files.
///
/// The alternate source is consulted first; WAMD decoding is only attempted
/// when the alternate source yields no usable metadata. The duration probe
/// runs only when no metadata source reported a length.
pub struct Importer<P: DurationProbe> {
    probe: P,
}

impl Importer<SymphoniaProbe> {
    pub fn new() -> Self {
        Self {
            probe: SymphoniaProbe,
        }
    }
}

impl Default for Importer<SymphoniaProbe> {
    fn default() -> Self {
        Self::new()
    }
}

impl<P: DurationProbe> Importer<P> {
    /// Use a different duration probe (tests substitute a canned one).
    pub fn with_probe(probe: P) -> Self {
        Self { probe }
    }

    /// Import one recording.
    pub fn process(&self, path: &Path) -> ImportOutcome {
        let file_path = path.display().to_string();
        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or_default()
            .to_string();
        let identifier = file_name
            .split('.')
            .next()
            .unwrap_or_default()
            .to_string();

        let ident = IdentifierMatch::parse(&identifier);

        let alternate = match guano::from_file(path) {
            Ok(map) if !map.is_empty() => Some(map),
            _ => None,
        };

        let mut metadata_error = None;
        let wamd = if alternate.is_some() {
            None
        } else {
            match WamdMetadata::from_file(path) {
                Ok(meta) => Some(meta),
                // No metadata, or not a WAVE at all: fall through quietly
                Err(MetadataError::MissingMetadata) | Err(MetadataError::Format(_)) => None,
                Err(e) => {
                    metadata_error = Some(e.to_string());
                    None
                }
            }
        };

        let record = reconcile(&ident, wamd.as_ref(), alternate.as_ref(), || {
            self.probe.duration_secs(path)
        });

        ImportOutcome {
            file_path,
            file_name,
            identifier,
            record,
            metadata_error,
        }
    }
}
