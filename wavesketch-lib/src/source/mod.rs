//! Audio source collaborators feeding decoded PCM into an operation.
//!
//! - [`AudioSource`] is the pull contract the operation drives.
//! - [`FileSource`] demuxes and decodes files through Symphonia.
//! - [`MemorySource`] serves in-memory samples in fixed-size chunks.

mod file;
mod memory;

use serde::Serialize;

use crate::envelope::EnvelopeError;

pub use file::FileSource;
pub use memory::MemorySource;

/// Format metadata of one audio track.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TrackFormat {
    pub sample_rate: u32,
    pub channels: usize,
}

/// PCM layout an operation asks its source to deliver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PcmLayout {
    pub bits_per_sample: u16,
    pub little_endian: bool,
    pub interleaved: bool,
}

impl PcmLayout {
    /// Signed 16-bit, little-endian, interleaved by channel.
    pub const CANONICAL: PcmLayout = PcmLayout {
        bits_per_sample: 16,
        little_endian: true,
        interleaved: true,
    };

    pub fn is_canonical(&self) -> bool {
        *self == Self::CANONICAL
    }
}

/// One block of decoded PCM in [`PcmLayout::CANONICAL`] layout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawAudioChunk {
    bytes: Vec<u8>,
}

impl RawAudioChunk {
    pub fn new(bytes: Vec<u8>) -> Self {
        Self { bytes }
    }

    /// Encode interleaved samples as little-endian bytes.
    pub fn from_samples(samples: &[i16]) -> Self {
        Self {
            bytes: samples.iter().flat_map(|s| s.to_le_bytes()).collect(),
        }
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// Reading status reported by a source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceStatus {
    Reading,
    Completed,
    /// Reading failed; the cause is attached when the source knows it.
    Failed(Option<String>),
}

/// Pull-based provider of decoded PCM for one or more tracks.
///
/// Chunks for each track are requested independently by index; a `None`
/// from [`AudioSource::next_chunk`] marks end-of-stream for that track.
pub trait AudioSource: Send {
    /// Open the source and enumerate its tracks.
    ///
    /// # Arguments
    /// * `layout` - PCM layout every returned chunk must use.
    ///
    /// # Errors
    /// Returns [`EnvelopeError::Open`] if the source is unreadable or unsupported.
    fn open(&mut self, layout: &PcmLayout) -> Result<Vec<TrackFormat>, EnvelopeError>;

    /// Next chunk for `track`, or `None` at end-of-stream.
    fn next_chunk(&mut self, track: usize) -> Option<RawAudioChunk>;

    fn status(&self) -> SourceStatus;

    /// Stop reading. Later calls to `next_chunk` return `None`.
    fn stop(&mut self);

    /// Called once no more chunks will be requested for `track`.
    fn release_track(&mut self, _track: usize) {}
}
