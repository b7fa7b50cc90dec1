//! Window sizing and the boxcar averaging kernel.

/// Number of interleaved samples folded into one output point.
///
/// Computed as `floor(sample_rate * channels / points_per_second)`. A result
/// of `0` marks a degenerate track that yields an empty series.
pub fn samples_per_pixel(sample_rate: u32, channels: usize, points_per_second: f64) -> usize {
    if !points_per_second.is_finite() || points_per_second <= 0.0 {
        return 0;
    }
    let raw = (sample_rate as f64 * channels as f64 / points_per_second).floor();
    if raw.is_finite() && raw >= 1.0 {
        raw as usize
    } else {
        0
    }
}

/// Rectangular averaging kernel of `len` equal weights summing to one.
///
/// Only the shared weight is stored, so the kernel costs the same at any length.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WindowFilter {
    len: usize,
    weight: f32,
}

impl WindowFilter {
    /// Build a kernel of `len` weights of `1 / len`. Zero length yields an empty filter.
    pub fn boxcar(len: usize) -> Self {
        if len == 0 {
            return Self {
                len: 0,
                weight: 0.0,
            };
        }
        Self {
            len,
            weight: 1.0 / len as f32,
        }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn weight(&self) -> f32 {
        self.weight
    }

    /// Decimate `magnitudes` by the kernel length, appending one weighted sum
    /// per full window to `out`. A trailing partial window is ignored.
    ///
    /// # Returns
    /// The largest value appended, or `None` if nothing was appended.
    pub fn apply(&self, magnitudes: &[f32], out: &mut Vec<f32>) -> Option<f32> {
        if self.len == 0 {
            return None;
        }

        let weight = self.weight;
        let mut peak: Option<f32> = None;
        for window in magnitudes.chunks_exact(self.len) {
            let value = window.iter().map(|sample| sample * weight).sum::<f32>();
            out.push(value);
            peak = Some(peak.map_or(value, |current| current.max(value)));
        }
        peak
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn derives_window_from_rate_channels_and_density() {
        assert_eq!(samples_per_pixel(44_100, 2, 10.0), 8_820);
        assert_eq!(samples_per_pixel(48_000, 1, 7.0), 6_857);
    }

    #[test]
    fn degenerate_inputs_give_zero_window() {
        assert_eq!(samples_per_pixel(0, 2, 10.0), 0);
        assert_eq!(samples_per_pixel(44_100, 0, 10.0), 0);
        assert_eq!(samples_per_pixel(5, 1, 10.0), 0);
        assert_eq!(samples_per_pixel(44_100, 2, 0.0), 0);
        assert_eq!(samples_per_pixel(44_100, 2, f64::NAN), 0);
    }

    #[test]
    fn boxcar_weights_sum_to_one() {
        let filter = WindowFilter::boxcar(8);
        assert_eq!(filter.len(), 8);
        let total = filter.weight() * filter.len() as f32;
        assert!((total - 1.0).abs() < 1e-6);
        assert!(WindowFilter::boxcar(0).is_empty());
    }

    #[test]
    fn huge_windows_do_not_allocate_a_kernel() {
        let window = samples_per_pixel(44_100, 2, 1e-300);
        assert_eq!(window, usize::MAX);
        let filter = WindowFilter::boxcar(window);
        let mut out = Vec::new();
        assert_eq!(filter.apply(&[1.0, 2.0], &mut out), None);
        assert!(out.is_empty());
    }

    #[test]
    fn apply_emits_one_value_per_full_window() {
        let filter = WindowFilter::boxcar(2);
        let mut out = Vec::new();
        let peak = filter.apply(&[2.0, 4.0, 10.0, 0.0, 7.0], &mut out);
        assert_eq!(out, vec![3.0, 5.0]);
        assert_eq!(peak, Some(5.0));
    }
}
