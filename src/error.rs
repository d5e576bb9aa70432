//! Error taxonomy for the metadata extraction pipeline
//!
//! Every variant here is recoverable at the reconciliation boundary: a file
//! whose WAMD chunk is missing, truncated or corrupt still produces a
//! canonical record from whatever the other sources can supply. Callers that
//! need to distinguish "no metadata chunk" (common, expected) from "corrupt
//! metadata chunk" (worth telling the operator about) can match on the
//! variant.

use std::io;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum MetadataError {
    /// The container or format tag did not match (not a RIFF/WAVE file).
    #[error("not a RIFF/WAVE container: {0}")]
    Format(String),

    /// The file is a well-formed WAVE but carries no `wamd` chunk.
    /// Expected and common; not logged as a failure.
    #[error("no wamd metadata chunk found")]
    MissingMetadata,

    /// Record framing ran past the end of the chunk, or a field payload
    /// could not be decoded at all.
    #[error("malformed wamd record: {0}")]
    Decode(String),

    /// A 25/24-char timestamp carried an offset that parses neither as
    /// `±HH:MM` nor as `±HHMM`. Unlike the other coercion misses this is
    /// surfaced rather than silently dropped: it indicates corrupt vendor
    /// data the operator should see.
    #[error("malformed timezone offset {0:?}")]
    Timezone(String),

    #[error(transparent)]
    Io(#[from] io::Error),
}

/// Specialized Result for metadata extraction.
pub type Result<T> = std::result::Result<T, MetadataError>;
