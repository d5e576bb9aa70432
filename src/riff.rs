//! RIFF chunk walker
//!
//! Minimal sequential reader over a RIFF/WAVE container. A RIFF file is a
//! 12-byte header followed by chunks:
//!
//! ```text
//! Bytes 0-3    "RIFF"
//! Bytes 4-7    file length (LE u32, ignored here)
//! Bytes 8-11   "WAVE"
//! then, repeated:
//!   4 bytes    chunk name (e.g. "fmt ", "data", "wamd", "guan")
//!   4 bytes    chunk length (LE u32)
//!   N bytes    payload
//! ```
//!
//! The walker makes a single forward pass and never interprets payloads.
//! Chunk bodies are not assumed to be padded to even length; the declared
//! length is trusted.

use std::io::{Read, Seek, SeekFrom};

use crate::error::{MetadataError, Result};

/// Forward-only reader over the chunks of one RIFF/WAVE stream.
///
/// Construction verifies the container and format tags; [`ChunkWalker::find`]
/// then scans the remaining chunks in file order. The walker does not rewind,
/// so a second `find` continues from where the first one stopped.
#[derive(Debug)]
pub struct ChunkWalker<R: Read + Seek> {
    reader: R,
}

impl<R: Read + Seek> ChunkWalker<R> {
    /// Open a walker over a stream positioned at the start of the container.
    ///
    /// Fails with [`MetadataError::Format`] if the leading tag is not `RIFF`
    /// or the format tag is not `WAVE`.
    pub fn open(mut reader: R) -> Result<Self> {
        let mut header = [0u8; 12];
        reader
            .read_exact(&mut header)
            .map_err(|_| MetadataError::Format("file shorter than RIFF header".to_string()))?;

        if &header[0..4] != b"RIFF" {
            return Err(MetadataError::Format("missing RIFF tag".to_string()));
        }
        if &header[8..12] != b"WAVE" {
            return Err(MetadataError::Format("missing WAVE tag".to_string()));
        }

        Ok(Self { reader })
    }

    /// Scan forward until a chunk named `name` is found and return its
    /// payload, or `None` if the stream is exhausted first.
    ///
    /// Chunks that don't match are skipped by seeking, without reading
    /// their payload.
    pub fn find(&mut self, name: &[u8; 4]) -> Result<Option<Vec<u8>>> {
        loop {
            let mut header = [0u8; 8];
            match self.reader.read_exact(&mut header) {
                Ok(()) => {}
                Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => return Ok(None),
                Err(e) => return Err(e.into()),
            }

            let len = u32::from_le_bytes([header[4], header[5], header[6], header[7]]) as u64;

            if &header[0..4] == name {
                let mut payload = vec![0u8; len as usize];
                match self.reader.read_exact(&mut payload) {
                    Ok(()) => return Ok(Some(payload)),
                    // Chunk declares more bytes than the file holds
                    Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
                        return Err(MetadataError::Decode(format!(
                            "chunk {:?} truncated (declared {} bytes)",
                            String::from_utf8_lossy(&header[0..4]),
                            len
                        )))
                    }
                    Err(e) => return Err(e.into()),
                }
            }

            // Skipping past EOF is reported on the next read
            self.reader.seek(SeekFrom::Current(len as i64))?;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    // ==========================================================================
    // CHUNK WALKER TESTS
    // ==========================================================================
    //
    // All fixtures are synthetic RIFF byte streams built in memory. The walker
    // only looks at framing, so payloads can be arbitrary bytes.
    // ==========================================================================

    fn riff(chunks: &[(&[u8; 4], &[u8])]) -> Vec<u8> {
        let mut bytes = Vec::new();
        bytes.extend_from_slice(b"RIFF");
        bytes.extend_from_slice(&0u32.to_le_bytes()); // length patched below
        bytes.extend_from_slice(b"WAVE");
        for (name, payload) in chunks {
            bytes.extend_from_slice(*name);
            bytes.extend_from_slice(&(payload.len() as u32).to_le_bytes());
            bytes.extend_from_slice(payload);
        }
        let total = (bytes.len() - 8) as u32;
        bytes[4..8].copy_from_slice(&total.to_le_bytes());
        bytes
    }

    #[test]
    fn test_find_skips_unrelated_chunks() {
        let bytes = riff(&[
            (b"fmt ", &[0u8; 16]),
            (b"data", &[1, 2, 3, 4]),
            (b"wamd", b"hello"),
        ]);
        let mut walker = ChunkWalker::open(Cursor::new(bytes)).unwrap();
        let payload = walker.find(b"wamd").unwrap();
        assert_eq!(payload, Some(b"hello".to_vec()));
    }

    #[test]
    fn test_find_absent_chunk_is_none_not_error() {
        let bytes = riff(&[(b"fmt ", &[0u8; 16]), (b"data", &[0u8; 8])]);
        let mut walker = ChunkWalker::open(Cursor::new(bytes)).unwrap();
        assert!(walker.find(b"wamd").unwrap().is_none());
    }

    #[test]
    fn test_find_is_forward_only() {
        let bytes = riff(&[(b"wamd", b"first"), (b"data", &[0u8; 4])]);
        let mut walker = ChunkWalker::open(Cursor::new(bytes)).unwrap();
        assert!(walker.find(b"data").unwrap().is_some());
        // wamd was before data; a forward-only scan cannot see it now
        assert!(walker.find(b"wamd").unwrap().is_none());
    }

    #[test]
    fn test_bad_container_tag() {
        let mut bytes = riff(&[]);
        bytes[0..4].copy_from_slice(b"FORM");
        let err = ChunkWalker::open(Cursor::new(bytes)).unwrap_err();
        assert!(matches!(err, MetadataError::Format(_)));
    }

    #[test]
    fn test_bad_format_tag() {
        let mut bytes = riff(&[]);
        bytes[8..12].copy_from_slice(b"AVI ");
        let err = ChunkWalker::open(Cursor::new(bytes)).unwrap_err();
        assert!(matches!(err, MetadataError::Format(_)));
    }

    #[test]
    fn test_short_file_is_format_error() {
        let err = ChunkWalker::open(Cursor::new(b"RIFF".to_vec())).unwrap_err();
        assert!(matches!(err, MetadataError::Format(_)));
    }

    #[test]
    fn test_truncated_target_chunk_is_decode_error() {
        let mut bytes = riff(&[(b"wamd", b"abc")]);
        // Claim 100 bytes of payload but supply 3
        let pos = bytes.len() - 3 - 4;
        bytes[pos..pos + 4].copy_from_slice(&100u32.to_le_bytes());
        let mut walker = ChunkWalker::open(Cursor::new(bytes)).unwrap();
        let err = walker.find(b"wamd").unwrap_err();
        assert!(matches!(err, MetadataError::Decode(_)));
    }

    #[test]
    fn test_empty_payload() {
        let bytes = riff(&[(b"wamd", b"")]);
        let mut walker = ChunkWalker::open(Cursor::new(bytes)).unwrap();
        assert_eq!(walker.find(b"wamd").unwrap(), Some(Vec::new()));
    }
}
