//! Pull loop driving every track's downsampler against one source.

use std::sync::Arc;

use log::{debug, warn};

use crate::envelope::{AmplitudeSeries, EnvelopeError, TrackDownsampler};
use crate::source::{AudioSource, SourceStatus};

use super::cancel::{OperationShared, OperationState};
use super::{CompletionCallback, ProgressCallback};

/// Everything the loop owns for one run. Only this struct writes the series.
///
/// `series[i]` belongs to `downsamplers[i]`; keeping them side by side lets a
/// progress report lend the whole slice without copying.
pub(super) struct Runner<S: AudioSource> {
    pub(super) source: S,
    pub(super) downsamplers: Vec<TrackDownsampler>,
    pub(super) series: Vec<AmplitudeSeries>,
    pub(super) progress: Option<ProgressCallback>,
    pub(super) completion: CompletionCallback,
    pub(super) progress_interval: usize,
    pub(super) shared: Arc<OperationShared>,
    pub(super) iterations: usize,
}

impl<S: AudioSource> Runner<S> {
    pub(super) fn run(mut self) {
        if self.shared.cancel_requested()
            || !self
                .shared
                .advance(OperationState::Opened, OperationState::Reading)
        {
            self.resolve();
            return;
        }

        while !self.shared.cancel_requested() {
            if !self.step() {
                break;
            }
            self.iterations += 1;
            if self.iterations % self.progress_interval == 0 {
                self.report_progress();
            }
        }
        debug!("pull loop stopped after {} iterations", self.iterations);

        self.resolve();
    }

    /// Pull once from every active track, in track order.
    ///
    /// # Returns
    /// `true` if any track may still produce data.
    fn step(&mut self) -> bool {
        let mut productive = false;
        for (downsampler, series) in self.downsamplers.iter_mut().zip(self.series.iter_mut()) {
            if downsampler.is_exhausted() {
                continue;
            }
            if downsampler.pull_next(&mut self.source, series) {
                productive = true;
            } else {
                self.source.release_track(downsampler.track());
            }
        }
        productive
    }

    fn report_progress(&mut self) {
        if self.shared.cancel_requested() {
            return;
        }
        if let Some(progress) = self.progress.as_mut() {
            progress(&self.series);
        }
    }

    /// Pick the terminal state and invoke the completion callback once.
    fn resolve(self) {
        let Runner {
            mut source,
            series,
            completion,
            shared,
            ..
        } = self;

        let (state, outcome) = if shared.cancel_requested() {
            source.stop();
            (OperationState::Cancelled, Err(EnvelopeError::Cancelled))
        } else {
            match source.status() {
                SourceStatus::Failed(Some(cause)) => {
                    (OperationState::Failed, Err(EnvelopeError::Read(cause)))
                }
                SourceStatus::Failed(None) => {
                    warn!("source failed without a cause");
                    (OperationState::Failed, Err(EnvelopeError::Unknown))
                }
                SourceStatus::Completed | SourceStatus::Reading => {
                    (OperationState::Completed, Ok(series))
                }
            }
        };

        if shared.terminate(state) {
            completion(outcome);
        }
    }
}
