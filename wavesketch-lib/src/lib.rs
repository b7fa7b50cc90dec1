//! # Wavesketch Library
//!
//! Streaming extraction of amplitude envelopes for waveform display.
//! Decoded 16-bit PCM is pulled from a source in arbitrarily sized chunks and
//! reduced to a fixed density of averaged magnitudes per track, with progress
//! snapshots, cooperative cancellation, and bounded per-track memory.

pub mod envelope;
pub mod operation;
pub mod source;

pub use envelope::{AmplitudeSeries, EnvelopeError};
pub use operation::{
    CancellationHandle, Executor, InlineExecutor, OperationSettings, OperationState,
    SampleOperation, ThreadExecutor,
};
pub use source::{
    AudioSource, FileSource, MemorySource, PcmLayout, RawAudioChunk, SourceStatus, TrackFormat,
};

use std::sync::{Arc, Mutex};

/// Decode an audio file and return the finished envelope of every track.
///
/// Runs the whole operation on the calling thread.
///
/// # Arguments
/// * `file_path` - Source audio path.
/// * `settings` - Target density and progress coalescing.
///
/// # Errors
/// Returns [`EnvelopeError::Open`] if the file cannot be opened, otherwise the
/// error the operation completed with.
pub fn extract_envelope(
    file_path: &str,
    settings: OperationSettings,
) -> Result<Vec<AmplitudeSeries>, EnvelopeError> {
    let outcome = Arc::new(Mutex::new(None));
    let sink = outcome.clone();

    let operation = SampleOperation::new(settings, Arc::new(InlineExecutor));
    operation.start(
        FileSource::new(file_path),
        None,
        Box::new(move |result| {
            if let Ok(mut slot) = sink.lock() {
                *slot = Some(result);
            }
        }),
    )?;

    let result = match outcome.lock() {
        Ok(mut slot) => slot.take(),
        Err(_) => None,
    };
    result.unwrap_or(Err(EnvelopeError::Unknown))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_envelope_from_wav_file() {
        let path = std::env::temp_dir()
            .join(format!("wavesketch_extract_{}.wav", std::process::id()));
        let spec = hound::WavSpec {
            channels: 2,
            sample_rate: 8_000,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut writer = hound::WavWriter::create(&path, spec).expect("create wav");
        // One second of stereo audio at a constant magnitude of 1000.
        for i in 0..16_000 {
            let sample: i16 = if i % 2 == 0 { 1_000 } else { -1_000 };
            writer.write_sample(sample).expect("write sample");
        }
        writer.finalize().expect("finalize wav");

        let settings = OperationSettings {
            points_per_second: 16.0,
            ..OperationSettings::default()
        };
        let series = extract_envelope(path.to_str().unwrap(), settings).expect("extract");
        assert_eq!(series.len(), 1);
        assert_eq!(series[0].samples_per_pixel(), 1_000);
        assert_eq!(series[0].len(), 16);
        for value in series[0].values() {
            assert!((value - 1_000.0).abs() < 0.5);
        }

        let _ = std::fs::remove_file(path);
    }

    #[test]
    fn package_metadata_names_license_and_repository() {
        assert_eq!(env!("CARGO_PKG_LICENSE_FILE"), "../LICENSE");
        assert_eq!(env!("CARGO_PKG_README"), "../README.md");
        assert!(env!("CARGO_PKG_REPOSITORY").ends_with("/wavesketch"));
        assert_eq!(env!("CARGO_PKG_HOMEPAGE"), env!("CARGO_PKG_REPOSITORY"));
    }

    #[test]
    fn missing_file_fails_to_open() {
        let result = extract_envelope("/no/such/file.wav", OperationSettings::default());
        assert!(matches!(result, Err(EnvelopeError::Open(_))));
    }
}
