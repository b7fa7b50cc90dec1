use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::envelope::EnvelopeError;

use super::{AudioSource, PcmLayout, RawAudioChunk, SourceStatus, TrackFormat};

#[derive(Debug)]
struct MemoryTrack {
    format: TrackFormat,
    samples: Vec<i16>,
    cursor: usize,
}

impl MemoryTrack {
    fn is_drained(&self) -> bool {
        self.cursor >= self.samples.len()
    }
}

/// In-memory source serving interleaved samples in fixed-size chunks.
///
/// Failures can be injected to exercise error paths: an open failure, or a
/// mid-stream failure after a number of delivered chunks.
#[derive(Debug)]
pub struct MemorySource {
    tracks: Vec<MemoryTrack>,
    chunk_samples: usize,
    open_failure: Option<String>,
    fail_after: Option<(usize, Option<String>)>,
    delivered: usize,
    opened: bool,
    failed: Option<Option<String>>,
    stopped: Arc<AtomicBool>,
}

impl MemorySource {
    /// Build a source from `(format, interleaved samples)` per track.
    ///
    /// # Arguments
    /// * `tracks` - Per-track format and samples.
    /// * `chunk_samples` - Samples per delivered chunk. Zero is treated as one.
    pub fn new(tracks: Vec<(TrackFormat, Vec<i16>)>, chunk_samples: usize) -> Self {
        Self {
            tracks: tracks
                .into_iter()
                .map(|(format, samples)| MemoryTrack {
                    format,
                    samples,
                    cursor: 0,
                })
                .collect(),
            chunk_samples: chunk_samples.max(1),
            open_failure: None,
            fail_after: None,
            delivered: 0,
            opened: false,
            failed: None,
            stopped: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Make `open` fail with `reason`.
    pub fn failing_open(mut self, reason: &str) -> Self {
        self.open_failure = Some(reason.to_string());
        self
    }

    /// Fail mid-stream once `chunks` chunks have been delivered across all tracks.
    pub fn failing_after(mut self, chunks: usize, cause: Option<&str>) -> Self {
        self.fail_after = Some((chunks, cause.map(str::to_string)));
        self
    }

    /// Flag set once `stop` has been called.
    pub fn stopped_flag(&self) -> Arc<AtomicBool> {
        self.stopped.clone()
    }
}

impl AudioSource for MemorySource {
    fn open(&mut self, layout: &PcmLayout) -> Result<Vec<TrackFormat>, EnvelopeError> {
        if let Some(reason) = &self.open_failure {
            return Err(EnvelopeError::Open(reason.clone()));
        }
        if !layout.is_canonical() {
            return Err(EnvelopeError::Open(format!(
                "unsupported pcm layout: {:?}",
                layout
            )));
        }
        self.opened = true;
        Ok(self.tracks.iter().map(|track| track.format).collect())
    }

    fn next_chunk(&mut self, track: usize) -> Option<RawAudioChunk> {
        if !self.opened || self.failed.is_some() || self.stopped.load(Ordering::SeqCst) {
            return None;
        }

        if let Some((limit, cause)) = &self.fail_after {
            if self.delivered >= *limit {
                self.failed = Some(cause.clone());
                return None;
            }
        }

        let chunk_samples = self.chunk_samples;
        let entry = self.tracks.get_mut(track)?;
        if entry.is_drained() {
            return None;
        }

        let end = (entry.cursor + chunk_samples).min(entry.samples.len());
        let chunk = RawAudioChunk::from_samples(&entry.samples[entry.cursor..end]);
        entry.cursor = end;
        self.delivered += 1;
        Some(chunk)
    }

    fn status(&self) -> SourceStatus {
        if let Some(cause) = &self.failed {
            return SourceStatus::Failed(cause.clone());
        }
        if self.opened && self.tracks.iter().all(MemoryTrack::is_drained) {
            SourceStatus::Completed
        } else {
            SourceStatus::Reading
        }
    }

    fn stop(&mut self) {
        self.stopped.store(true, Ordering::SeqCst);
    }

    fn release_track(&mut self, track: usize) {
        if let Some(entry) = self.tracks.get_mut(track) {
            entry.cursor = entry.samples.len();
        }
    }
}
