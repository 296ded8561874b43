//! Background drive mode: walks run on a dedicated worker thread.

use super::error::ExecutionError;
use super::runner::Executor;
use crate::config::ExecutorConfig;
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread::{self, JoinHandle};
use tracing::{info, warn};

type Job = Box<dyn FnOnce() + Send + 'static>;

/// Runs walks one after another on a single named worker thread.
///
/// [`execute`](Self::execute) returns as soon as the walk is queued. The
/// outcome of the walk is only visible through observers and logs; the
/// returned [`WalkHandle`] hands the executor back so its context and
/// history can be inspected.
pub struct BackgroundExecutor {
    sender: Option<Sender<Job>>,
    worker: Option<JoinHandle<()>>,
    name: String,
}

impl BackgroundExecutor {
    pub fn new() -> Result<Self, ExecutionError> {
        Self::with_config(&ExecutorConfig::default())
    }

    pub fn with_config(config: &ExecutorConfig) -> Result<Self, ExecutionError> {
        let (sender, receiver) = mpsc::channel::<Job>();
        let worker = thread::Builder::new()
            .name(config.worker_name.clone())
            .spawn(move || {
                for job in receiver {
                    job();
                }
            })?;
        info!(worker = %config.worker_name, "Background worker started");

        Ok(Self {
            sender: Some(sender),
            worker: Some(worker),
            name: config.worker_name.clone(),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Queue a walk on the worker.
    pub fn execute<C: Send + 'static>(
        &self,
        mut executor: Executor<C>,
    ) -> Result<WalkHandle<C>, ExecutionError> {
        let sender = self.sender.as_ref().ok_or(ExecutionError::WorkerUnavailable)?;
        let (done, receiver) = mpsc::channel();

        let job: Job = Box::new(move || {
            if let Err(err) = executor.execute() {
                warn!(run_id = %executor.run_id(), error = %err, "Background walk ended with an error");
            }
            // the caller may have dropped the handle
            let _ = done.send(executor);
        });
        sender
            .send(job)
            .map_err(|_| ExecutionError::WorkerUnavailable)?;

        Ok(WalkHandle { receiver })
    }

    /// Stop accepting walks, let queued ones finish and join the worker.
    pub fn shutdown(&mut self) {
        self.sender.take();
        if let Some(worker) = self.worker.take() {
            if worker.join().is_err() {
                warn!(worker = %self.name, "Background worker panicked");
            }
            info!(worker = %self.name, "Background worker stopped");
        }
    }
}

impl Drop for BackgroundExecutor {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// Gives back the executor once its background walk is over.
pub struct WalkHandle<C> {
    receiver: Receiver<Executor<C>>,
}

impl<C> WalkHandle<C> {
    /// Block until the walk is over. `None` if the worker died first.
    pub fn join(self) -> Option<Executor<C>> {
        self.receiver.recv().ok()
    }

    /// The executor, if the walk is already over.
    pub fn try_join(&self) -> Option<Executor<C>> {
        self.receiver.try_recv().ok()
    }
}
