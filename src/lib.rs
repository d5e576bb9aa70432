//! Echotrace - catalog bat echolocation recordings
//!
//! Bat detectors write WAVE files with metadata scattered across three
//! places that rarely agree with each other:
//!
//! 1. **The filename**: an optional species code and a capture timestamp,
//!    e.g. `PIPPIP_20190430_210112.wav`.
//! 2. **A WAMD chunk**: the Wildlife Acoustics binary TLV format carrying
//!    model, serial, timestamps, GPS waypoints and identifications.
//! 3. **A GUANO chunk**: the newer text-based convention, `key: value`
//!    lines in a `guan` sub-chunk.
//!
//! Echotrace decodes whichever of those a file has and reconciles them into
//! one canonical record per recording, with fixed per-field precedence and
//! tolerance for any single source being absent, partial or corrupt. A file
//! that can't be identified at all still produces a record — it is flagged
//! as partial instead of being dropped from the catalog.
//!
//! # Quick Start
//!
//! ```no_run
//! use echotrace::Importer;
//!
//! let importer = Importer::new();
//! let outcome = importer.process(std::path::Path::new("PIPPIP_20190430_210112.wav"));
//!
//! println!("{:?} {:?}", outcome.record.genus, outcome.record.species);
//! if !outcome.record.complete {
//!     println!("partial record - some fields could not be resolved");
//! }
//! ```
//!
//! # Source Precedence
//!
//! | Field          | Order                                                          |
//! |----------------|----------------------------------------------------------------|
//! | identification | GUANO manual > GUANO auto > WAMD manual > WAMD auto > filename |
//! | timestamp      | zoned GUANO > zoned WAMD > naive filename time                 |
//! | position       | GUANO > WAMD                                                   |
//! | serial         | GUANO > WAMD                                                   |
//! | duration       | GUANO > audio probe                                            |
//!
//! A timestamp without offset information from a metadata source never
//! overrides the filename-derived time; it is treated as absent.
//!
//! # Modules
//!
//! - [`riff`]: chunk-level access to RIFF/WAVE containers
//! - [`wamd`]: the binary TLV metadata decoder
//! - [`guano`]: adapter from GUANO text to the alternate-source map
//! - [`identifier`]: filename grammar parsing
//! - [`reconcile`]: the multi-source merge
//! - [`import`]: the per-file pipeline tying it all together
//! - [`probe`]: last-resort audio duration probing

pub mod error;
pub mod guano;
pub mod identifier;
pub mod import;
pub mod probe;
pub mod reconcile;
pub mod riff;
pub mod wamd;

pub use error::MetadataError;
pub use identifier::IdentifierMatch;
pub use import::{ImportOutcome, Importer};
pub use probe::{DurationProbe, SymphoniaProbe};
pub use reconcile::{reconcile, AltValue, AlternateMetadata, CanonicalRecord};
pub use riff::ChunkWalker;
pub use wamd::{FieldValue, GpsFix, Timestamp, WamdMetadata};
