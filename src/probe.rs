//! Audio duration probing
//!
//! Last-resort fallback for the duration field: when neither metadata
//! source reports a length, the only place left to ask is the audio stream
//! itself. The default probe opens the container with symphonia and divides
//! the track's frame count by its sample rate; no sample data is decoded.

use std::fs::File;
use std::path::Path;

use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;

/// Collaborator interface: report a recording's duration in seconds, or
/// `None` when the file can't be opened or measured.
pub trait DurationProbe {
    fn duration_secs(&self, path: &Path) -> Option<f64>;
}

/// Duration probe backed by symphonia's container readers.
#[derive(Debug, Clone, Copy, Default)]
pub struct SymphoniaProbe;

impl DurationProbe for SymphoniaProbe {
    fn duration_secs(&self, path: &Path) -> Option<f64> {
        let file = File::open(path).ok()?;
        let mss = MediaSourceStream::new(Box::new(file), Default::default());

        let mut hint = Hint::new();
        if let Some(ext) = path.extension().and_then(|e| e.to_str()) {
            hint.with_extension(ext);
        }

        let probed = symphonia::default::get_probe()
            .format(
                &hint,
                mss,
                &FormatOptions::default(),
                &MetadataOptions::default(),
            )
            .ok()?;

        let track = probed.format.default_track()?;
        let frames = track.codec_params.n_frames?;
        let sample_rate = track.codec_params.sample_rate?;
        if sample_rate == 0 {
            return None;
        }
        Some(frames as f64 / sample_rate as f64)
    }
}
