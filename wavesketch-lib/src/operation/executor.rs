//! Execution contexts an operation runs its pull loop on.

use std::thread;

/// Unit of work handed to an [`Executor`].
pub type Job = Box<dyn FnOnce() + Send + 'static>;

/// Runs operation loops. Each job must run sequentially to completion.
pub trait Executor: Send + Sync {
    fn execute(&self, job: Job);
}

/// Spawns a dedicated thread per job.
#[derive(Debug, Default, Clone, Copy)]
pub struct ThreadExecutor;

impl Executor for ThreadExecutor {
    fn execute(&self, job: Job) {
        thread::spawn(job);
    }
}

/// Runs each job on the calling thread before `execute` returns.
#[derive(Debug, Default, Clone, Copy)]
pub struct InlineExecutor;

impl Executor for InlineExecutor {
    fn execute(&self, job: Job) {
        job();
    }
}
