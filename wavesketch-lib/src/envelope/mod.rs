//! Amplitude envelope data and per-track downsampling.

mod density;
mod downsampler;
mod error;
mod window;

use serde::Serialize;

pub use density::fit_points_per_second;
pub use downsampler::TrackDownsampler;
pub use error::EnvelopeError;
pub use window::{samples_per_pixel, WindowFilter};

/// Append-only series of averaged magnitudes for one track.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AmplitudeSeries {
    samples_per_pixel: usize,
    sample_max: f32,
    values: Vec<f32>,
}

impl AmplitudeSeries {
    pub(crate) fn new(samples_per_pixel: usize) -> Self {
        Self {
            samples_per_pixel,
            sample_max: 0.0,
            values: Vec::new(),
        }
    }

    /// Averaged magnitudes in stream order.
    pub fn values(&self) -> &[f32] {
        &self.values
    }

    /// Largest value appended so far. Never decreases.
    pub fn sample_max(&self) -> f32 {
        self.sample_max
    }

    /// Interleaved samples per full window, `0` for a degenerate track.
    pub fn samples_per_pixel(&self) -> usize {
        self.samples_per_pixel
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub(crate) fn values_mut(&mut self) -> &mut Vec<f32> {
        &mut self.values
    }

    pub(crate) fn raise_max(&mut self, peak: f32) {
        if peak > self.sample_max {
            self.sample_max = peak;
        }
    }
}
