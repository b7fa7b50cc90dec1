use log::debug;

use crate::source::{AudioSource, TrackFormat};

use super::window::{samples_per_pixel, WindowFilter};
use super::AmplitudeSeries;

const BYTES_PER_SAMPLE: usize = 2;

/// Per-track state turning chunked 16-bit PCM into an [`AmplitudeSeries`].
///
/// The series itself is passed in by the controller that owns it, so a
/// collection of series can be lent out as one slice between steps. Pending
/// bytes that do not yet fill a window are held until the next chunk arrives,
/// so between calls the buffer never holds a full window.
#[derive(Debug)]
pub struct TrackDownsampler {
    track: usize,
    filter: WindowFilter,
    pending: Vec<u8>,
    exhausted: bool,
}

impl TrackDownsampler {
    /// Build a downsampler for `track` at the given target density.
    ///
    /// # Arguments
    /// * `track` - Index passed back to the source when requesting chunks.
    /// * `format` - Sample rate and channel count of the track.
    /// * `points_per_second` - Output points per second of audio.
    pub fn new(track: usize, format: &TrackFormat, points_per_second: f64) -> Self {
        let window = samples_per_pixel(format.sample_rate, format.channels, points_per_second);
        if window == 0 {
            debug!(
                "track {} is degenerate ({} Hz, {} ch, {} pps)",
                track, format.sample_rate, format.channels, points_per_second
            );
        }

        Self {
            track,
            filter: WindowFilter::boxcar(window),
            pending: Vec::new(),
            exhausted: window == 0,
        }
    }

    /// Empty series sized for this track's window.
    pub fn new_series(&self) -> AmplitudeSeries {
        AmplitudeSeries::new(self.filter.len())
    }

    /// Pull one chunk for this track from `source` and fold it into `series`.
    ///
    /// # Returns
    /// `true` while more data may follow, `false` once the track is exhausted.
    /// End-of-stream flushes any leftover samples as one final point.
    pub fn pull_next<S: AudioSource + ?Sized>(
        &mut self,
        source: &mut S,
        series: &mut AmplitudeSeries,
    ) -> bool {
        if self.exhausted {
            return false;
        }

        match source.next_chunk(self.track) {
            Some(chunk) => {
                self.push_bytes(chunk.as_bytes(), series);
                true
            }
            None => {
                self.finish(series);
                false
            }
        }
    }

    /// Append raw little-endian i16 bytes and emit every full window.
    pub fn push_bytes(&mut self, bytes: &[u8], series: &mut AmplitudeSeries) {
        if self.exhausted {
            return;
        }
        self.pending.extend_from_slice(bytes);

        let window = self.filter.len();
        let total_samples = self.pending.len() / BYTES_PER_SAMPLE;
        let windows = total_samples / window;
        if windows == 0 {
            return;
        }

        let consumed = windows * window;
        let magnitudes = magnitudes(&self.pending[..consumed * BYTES_PER_SAMPLE]);
        if let Some(peak) = self.filter.apply(&magnitudes, series.values_mut()) {
            series.raise_max(peak);
        }
        self.pending.drain(..consumed * BYTES_PER_SAMPLE);
    }

    /// Flush leftover samples as one averaged point and mark the track exhausted.
    pub fn finish(&mut self, series: &mut AmplitudeSeries) {
        if self.exhausted {
            return;
        }
        self.exhausted = true;

        let remainder = self.pending.len() / BYTES_PER_SAMPLE;
        if remainder > 0 {
            let magnitudes = magnitudes(&self.pending[..remainder * BYTES_PER_SAMPLE]);
            let tail = WindowFilter::boxcar(remainder);
            if let Some(peak) = tail.apply(&magnitudes, series.values_mut()) {
                series.raise_max(peak);
            }
        }
        self.pending = Vec::new();
        debug!("track {} finished with {} points", self.track, series.len());
    }

    pub fn track(&self) -> usize {
        self.track
    }

    pub fn is_exhausted(&self) -> bool {
        self.exhausted
    }

    pub fn samples_per_pixel(&self) -> usize {
        self.filter.len()
    }

    /// Whole samples waiting for a window to fill.
    pub fn pending_samples(&self) -> usize {
        self.pending.len() / BYTES_PER_SAMPLE
    }
}

fn magnitudes(bytes: &[u8]) -> Vec<f32> {
    bytes
        .chunks_exact(BYTES_PER_SAMPLE)
        .map(|pair| (i16::from_le_bytes([pair[0], pair[1]]) as f32).abs())
        .collect()
}
