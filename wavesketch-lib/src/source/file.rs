//! Symphonia-backed source for audio files.

use std::collections::VecDeque;
use std::path::Path;

use log::{debug, warn};
use symphonia::core::audio::{AudioBufferRef, SampleBuffer};
use symphonia::core::codecs::{CodecParameters, Decoder, DecoderOptions, CODEC_TYPE_NULL};
use symphonia::core::errors::Error;
use symphonia::core::formats::{FormatOptions, FormatReader};
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;

use crate::envelope::EnvelopeError;

use super::{AudioSource, PcmLayout, RawAudioChunk, SourceStatus, TrackFormat};

struct DecodedTrack {
    id: u32,
    decoder: Box<dyn Decoder>,
    queued: VecDeque<Vec<u8>>,
    released: bool,
}

/// Decodes every audio track of a file into interleaved 16-bit PCM.
///
/// Packets are demuxed in container order; decoded blocks belonging to a
/// track other than the one requested are queued until that track asks.
pub struct FileSource {
    path: String,
    reader: Option<Box<dyn FormatReader>>,
    tracks: Vec<DecodedTrack>,
    status: SourceStatus,
    stopped: bool,
}

impl FileSource {
    pub fn new(path: &str) -> Self {
        Self {
            path: path.to_string(),
            reader: None,
            tracks: Vec::new(),
            status: SourceStatus::Reading,
            stopped: false,
        }
    }

    /// Longest track duration in seconds, probed without decoding.
    ///
    /// # Returns
    /// `None` when no track reports a frame count and time base.
    ///
    /// # Errors
    /// Returns [`EnvelopeError::Open`] if the file cannot be probed.
    pub fn probe_duration(path: &str) -> Result<Option<f64>, EnvelopeError> {
        let reader = probe_reader(path)?;
        let longest = reader
            .tracks()
            .iter()
            .filter(|track| track.codec_params.codec != CODEC_TYPE_NULL)
            .filter_map(|track| time_from_frames(&track.codec_params))
            .fold(None, |longest: Option<f64>, seconds| {
                Some(longest.map_or(seconds, |current| current.max(seconds)))
            });
        Ok(longest)
    }

    fn fail(&mut self, cause: Option<String>) {
        warn!("failed to read {}: {:?}", self.path, cause);
        self.status = SourceStatus::Failed(cause);
        self.reader = None;
    }

    /// Demux and decode until a block for `track` is produced.
    fn read_until(&mut self, track: usize) -> Option<Vec<u8>> {
        loop {
            let reader = self.reader.as_mut()?;
            let packet = match reader.next_packet() {
                Ok(packet) => packet,
                Err(Error::IoError(err)) if err.kind() == std::io::ErrorKind::UnexpectedEof => {
                    debug!("reached end of {}", self.path);
                    self.status = SourceStatus::Completed;
                    self.reader = None;
                    return None;
                }
                Err(Error::ResetRequired) => {
                    self.fail(Some("decoder reset required".to_string()));
                    return None;
                }
                Err(err) => {
                    self.fail(Some(err.to_string()));
                    return None;
                }
            };

            let Some(index) = self
                .tracks
                .iter()
                .position(|entry| entry.id == packet.track_id())
            else {
                continue;
            };
            let entry = &mut self.tracks[index];
            if entry.released {
                continue;
            }

            let decoded = entry.decoder.decode(&packet).map(interleave_i16);
            let bytes = match decoded {
                Ok(bytes) => bytes,
                Err(Error::DecodeError(err)) => {
                    warn!("decode error: {}", err);
                    continue;
                }
                Err(err) => {
                    self.fail(Some(err.to_string()));
                    return None;
                }
            };
            if bytes.is_empty() {
                continue;
            }

            if index == track {
                return Some(bytes);
            }
            entry.queued.push_back(bytes);
        }
    }
}

impl AudioSource for FileSource {
    fn open(&mut self, layout: &PcmLayout) -> Result<Vec<TrackFormat>, EnvelopeError> {
        if !layout.is_canonical() {
            return Err(EnvelopeError::Open(format!(
                "unsupported pcm layout: {:?}",
                layout
            )));
        }

        let reader = probe_reader(&self.path)?;
        let mut tracks = Vec::new();
        let mut formats = Vec::new();
        for track in reader
            .tracks()
            .iter()
            .filter(|track| track.codec_params.codec != CODEC_TYPE_NULL)
        {
            let decoder = symphonia::default::get_codecs()
                .make(&track.codec_params, &DecoderOptions::default())?;
            formats.push(track_format(track.id, &track.codec_params));
            tracks.push(DecodedTrack {
                id: track.id,
                decoder,
                queued: VecDeque::new(),
                released: false,
            });
        }

        if tracks.is_empty() {
            return Err(EnvelopeError::Open("no audio tracks found".to_string()));
        }

        debug!("opened {} with {} track(s)", self.path, tracks.len());
        self.reader = Some(reader);
        self.tracks = tracks;
        self.status = SourceStatus::Reading;
        Ok(formats)
    }

    fn next_chunk(&mut self, track: usize) -> Option<RawAudioChunk> {
        if self.stopped {
            return None;
        }
        let entry = self.tracks.get_mut(track)?;
        if entry.released {
            return None;
        }
        if let Some(bytes) = entry.queued.pop_front() {
            return Some(RawAudioChunk::new(bytes));
        }
        self.read_until(track).map(RawAudioChunk::new)
    }

    fn status(&self) -> SourceStatus {
        self.status.clone()
    }

    fn stop(&mut self) {
        self.stopped = true;
        self.reader = None;
        for entry in &mut self.tracks {
            entry.queued.clear();
        }
    }

    fn release_track(&mut self, track: usize) {
        if let Some(entry) = self.tracks.get_mut(track) {
            entry.released = true;
            entry.queued.clear();
        }
    }
}

/// Probe `path` into a format reader. `.prot` files are hinted as `.mka`.
fn probe_reader(path: &str) -> Result<Box<dyn FormatReader>, EnvelopeError> {
    let file = std::fs::File::open(path)?;
    let mss = MediaSourceStream::new(Box::new(file), Default::default());

    let mut hint = Hint::new();
    if let Some(extension) = Path::new(path)
        .extension()
        .and_then(|extension| extension.to_str())
    {
        let extension = extension.to_lowercase();
        if extension == "prot" {
            hint.with_extension("mka");
        } else {
            hint.with_extension(&extension);
        }
    }

    let probed = symphonia::default::get_probe().format(
        &hint,
        mss,
        &FormatOptions::default(),
        &MetadataOptions::default(),
    )?;
    Ok(probed.format)
}

/// Format the downsampler needs for one track.
///
/// A missing sample rate or channel layout yields a zero field, which makes
/// the track degenerate instead of guessing a window size.
fn track_format(id: u32, codec_params: &CodecParameters) -> TrackFormat {
    let sample_rate = codec_params.sample_rate.unwrap_or_else(|| {
        warn!("track {} has no sample rate", id);
        0
    });
    let channels = match codec_params.channels {
        Some(channels) => channels.count(),
        None => {
            warn!("track {} has no channel layout", id);
            0
        }
    };
    TrackFormat {
        sample_rate,
        channels,
    }
}

fn time_from_frames(codec_params: &CodecParameters) -> Option<f64> {
    let frames = codec_params.n_frames?;
    match (codec_params.time_base, codec_params.sample_rate) {
        (Some(time_base), _) => {
            let time = time_base.calc_time(codec_params.start_ts + frames);
            Some(time.seconds as f64 + time.frac)
        }
        (None, Some(sample_rate)) if sample_rate > 0 => Some(frames as f64 / sample_rate as f64),
        _ => None,
    }
}

fn interleave_i16(decoded: AudioBufferRef<'_>) -> Vec<u8> {
    let frames = decoded.frames();
    if frames == 0 {
        return Vec::new();
    }
    let spec = *decoded.spec();
    let mut buffer = SampleBuffer::<i16>::new(frames as u64, spec);
    buffer.copy_interleaved_ref(decoded);
    buffer
        .samples()
        .iter()
        .flat_map(|sample| sample.to_le_bytes())
        .collect()
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use symphonia::core::audio::Channels;

    use super::*;
    use crate::envelope::samples_per_pixel;

    fn temp_wav(name: &str, channels: u16, sample_rate: u32, samples: &[i16]) -> PathBuf {
        let path = std::env::temp_dir().join(format!(
            "wavesketch_{}_{}.wav",
            name,
            std::process::id()
        ));
        let spec = hound::WavSpec {
            channels,
            sample_rate,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut writer = hound::WavWriter::create(&path, spec).expect("create wav");
        for &sample in samples {
            writer.write_sample(sample).expect("write sample");
        }
        writer.finalize().expect("finalize wav");
        path
    }

    #[test]
    fn decodes_wav_into_interleaved_pcm() {
        let samples: Vec<i16> = (0..4_000).map(|i| ((i % 200) - 100) as i16).collect();
        let path = temp_wav("decode", 2, 8_000, &samples);

        let mut source = FileSource::new(path.to_str().unwrap());
        let formats = source.open(&PcmLayout::CANONICAL).expect("open");
        assert_eq!(
            formats,
            vec![TrackFormat {
                sample_rate: 8_000,
                channels: 2
            }]
        );

        let mut decoded = Vec::new();
        while let Some(chunk) = source.next_chunk(0) {
            decoded.extend(
                chunk
                    .as_bytes()
                    .chunks_exact(2)
                    .map(|pair| i16::from_le_bytes([pair[0], pair[1]])),
            );
        }
        assert_eq!(decoded, samples);
        assert_eq!(source.status(), SourceStatus::Completed);

        let _ = std::fs::remove_file(path);
    }

    #[test]
    fn probes_duration_from_codec_params() {
        let path = temp_wav("duration", 1, 8_000, &vec![0i16; 16_000]);
        let duration = FileSource::probe_duration(path.to_str().unwrap()).expect("probe");
        assert_eq!(duration, Some(2.0));
        let _ = std::fs::remove_file(path);
    }

    #[test]
    fn missing_file_is_an_open_error() {
        let mut source = FileSource::new("/definitely/not/here.wav");
        assert!(matches!(
            source.open(&PcmLayout::CANONICAL),
            Err(EnvelopeError::Open(_))
        ));
    }

    #[test]
    fn unknown_channel_layout_makes_track_degenerate() {
        let mut params = CodecParameters::new();
        params.with_sample_rate(44_100);
        let format = track_format(1, &params);
        assert_eq!(
            format,
            TrackFormat {
                sample_rate: 44_100,
                channels: 0
            }
        );
        assert_eq!(
            samples_per_pixel(format.sample_rate, format.channels, 10.0),
            0
        );

        params.with_channels(Channels::FRONT_LEFT | Channels::FRONT_RIGHT);
        assert_eq!(track_format(1, &params).channels, 2);
    }

    #[test]
    fn stop_ends_reading() {
        let path = temp_wav("stop", 1, 8_000, &vec![7i16; 8_000]);
        let mut source = FileSource::new(path.to_str().unwrap());
        source.open(&PcmLayout::CANONICAL).expect("open");
        assert!(source.next_chunk(0).is_some());
        source.stop();
        assert!(source.next_chunk(0).is_none());
        let _ = std::fs::remove_file(path);
    }
}
