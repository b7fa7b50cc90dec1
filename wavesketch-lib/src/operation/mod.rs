//! Orchestration of a streaming envelope extraction.
//!
//! This module is split so responsibilities are explicit:
//! - [`cancel`] holds lifecycle state and the cancel capability.
//! - [`executor`] defines the injected background execution context.
//! - [`runner`] executes the pull/progress/resolve loop.
//! - [`settings`] carries density and progress coalescing.

mod cancel;
mod executor;
mod runner;
mod settings;

use std::sync::Arc;

use log::debug;

use crate::envelope::{AmplitudeSeries, EnvelopeError, TrackDownsampler};
use crate::source::{AudioSource, PcmLayout};

pub use cancel::{CancellationHandle, OperationState};
pub use executor::{Executor, InlineExecutor, Job, ThreadExecutor};
pub use settings::{OperationSettings, DEFAULT_POINTS_PER_SECOND, DEFAULT_PROGRESS_INTERVAL};

use cancel::OperationShared;
use runner::Runner;

/// Receives a read-only snapshot of every track's series while reading.
pub type ProgressCallback = Box<dyn FnMut(&[AmplitudeSeries]) + Send>;

/// Receives the final series or the error the operation ended with.
pub type CompletionCallback = Box<dyn FnOnce(Result<Vec<AmplitudeSeries>, EnvelopeError>) + Send>;

/// One extraction run over one source.
///
/// Moves through `Created -> Opened -> Reading` and ends in exactly one of
/// `Completed`, `Failed`, or `Cancelled`. Callbacks run on the injected
/// executor's context.
pub struct SampleOperation {
    settings: OperationSettings,
    executor: Arc<dyn Executor>,
    shared: Arc<OperationShared>,
}

impl SampleOperation {
    /// Create an operation that will run its loop on `executor`.
    pub fn new(settings: OperationSettings, executor: Arc<dyn Executor>) -> Self {
        Self {
            settings,
            executor,
            shared: OperationShared::new(),
        }
    }

    pub fn settings(&self) -> &OperationSettings {
        &self.settings
    }

    pub fn state(&self) -> OperationState {
        self.shared.state()
    }

    /// Cancel capability usable before [`SampleOperation::start`] is called.
    pub fn cancellation_handle(&self) -> CancellationHandle {
        CancellationHandle::new(self.shared.clone())
    }

    /// Open `source` and schedule the pull loop.
    ///
    /// # Arguments
    /// * `source` - Source to open and read.
    /// * `progress` - Called every `progress_interval` productive iterations.
    /// * `completion` - Called exactly once with the terminal outcome.
    ///
    /// # Errors
    /// Returns [`EnvelopeError::Open`] if the source cannot be opened. In that
    /// case no callback is ever invoked.
    pub fn start<S: AudioSource + 'static>(
        self,
        mut source: S,
        progress: Option<ProgressCallback>,
        completion: CompletionCallback,
    ) -> Result<CancellationHandle, EnvelopeError> {
        let formats = match source.open(&PcmLayout::CANONICAL) {
            Ok(formats) => formats,
            Err(err) => {
                self.shared.terminate(OperationState::Failed);
                return Err(match err {
                    EnvelopeError::Open(reason) => EnvelopeError::Open(reason),
                    other => EnvelopeError::Open(other.to_string()),
                });
            }
        };
        self.shared
            .advance(OperationState::Created, OperationState::Opened);

        let points_per_second = self.settings.points_per_second;
        let downsamplers = formats
            .iter()
            .enumerate()
            .map(|(track, format)| TrackDownsampler::new(track, format, points_per_second))
            .collect::<Vec<_>>();
        let series = downsamplers
            .iter()
            .map(TrackDownsampler::new_series)
            .collect::<Vec<_>>();
        for downsampler in downsamplers.iter().filter(|d| d.is_exhausted()) {
            source.release_track(downsampler.track());
        }
        debug!(
            "starting operation over {} track(s) at {} pps",
            downsamplers.len(),
            points_per_second
        );

        let runner = Runner {
            source,
            downsamplers,
            series,
            progress,
            completion,
            progress_interval: self.settings.progress_interval.max(1),
            shared: self.shared.clone(),
            iterations: 0,
        };
        let handle = CancellationHandle::new(self.shared);
        self.executor.execute(Box::new(move || runner.run()));
        Ok(handle)
    }
}
