//! Blocking external work (process spawn, sysfs writes) runs here so the
//! event thread never waits on I/O. Results come back on a completion queue
//! that the reactor drains.

use std::path::PathBuf;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use crossbeam_channel::{Receiver, Sender, unbounded};
use tracing::{debug, trace, warn};

use crate::common::error::WmError;
use crate::sys::backlight::Backlight;
use crate::sys::process;

#[derive(Debug, Clone, PartialEq)]
pub enum Job {
    Spawn { command: String },
    Brightness { device: PathBuf, step: u32, increase: bool },
}

impl Job {
    fn describe(&self) -> String {
        match self {
            Job::Spawn { command } => format!("spawn `{command}`"),
            Job::Brightness { device, .. } => format!("brightness {}", device.display()),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Completion {
    Spawned { command: String },
    BrightnessSet { value: u64 },
    Failed { action: String, reason: String },
}

impl Completion {
    pub fn into_error(self) -> Option<WmError> {
        match self {
            Completion::Failed { action, reason } => {
                Some(WmError::ExternalActionFailure { action, reason })
            }
            _ => None,
        }
    }
}

type Notify = Arc<dyn Fn() + Send + Sync>;

pub struct WorkerPool {
    jobs: Sender<Job>,
    completions: Receiver<Completion>,
}

impl WorkerPool {
    /// `notify` is called from a worker thread after each completion is
    /// queued, so the event loop knows to drain.
    pub fn new(threads: usize, notify: Option<Notify>) -> Self {
        let (jobs_tx, jobs_rx) = unbounded::<Job>();
        let (done_tx, done_rx) = unbounded::<Completion>();
        for i in 0..threads.max(1) {
            let jobs = jobs_rx.clone();
            let done = done_tx.clone();
            let notify = notify.clone();
            let spawned = thread::Builder::new()
                .name(format!("worker-{i}"))
                .spawn(move || worker_loop(jobs, done, notify));
            if let Err(e) = spawned {
                warn!("could not start worker thread: {e}");
            }
        }
        Self {
            jobs: jobs_tx,
            completions: done_rx,
        }
    }

    /// Fire and forget; the outcome shows up in [`WorkerPool::drain`].
    pub fn submit(&self, job: Job) {
        trace!(?job, "submitting job");
        if self.jobs.send(job).is_err() {
            warn!("worker pool is gone; dropping job");
        }
    }

    pub fn drain(&self) -> Vec<Completion> { self.completions.try_iter().collect() }

    /// Wait up to `timeout` for the next completion.
    pub fn recv_timeout(&self, timeout: Duration) -> Option<Completion> {
        self.completions.recv_timeout(timeout).ok()
    }
}

fn worker_loop(jobs: Receiver<Job>, done: Sender<Completion>, notify: Option<Notify>) {
    while let Ok(job) = jobs.recv() {
        let action = job.describe();
        let completion = match job {
            Job::Spawn { command } => match process::spawn(&command) {
                Ok(()) => Completion::Spawned { command },
                Err(e) => Completion::Failed { action, reason: e.to_string() },
            },
            Job::Brightness { device, step, increase } => {
                match Backlight::new(device).adjust(step, increase) {
                    Ok(value) => Completion::BrightnessSet { value },
                    Err(e) => Completion::Failed { action, reason: e.to_string() },
                }
            }
        };
        debug!(?completion, "job finished");
        if done.send(completion).is_err() {
            break;
        }
        if let Some(notify) = &notify {
            notify();
        }
    }
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    const WAIT: Duration = Duration::from_secs(5);

    #[test]
    fn brightness_job_completes() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("brightness"), "50").unwrap();
        fs::write(dir.path().join("max_brightness"), "100").unwrap();

        let count = Arc::new(AtomicUsize::new(0));
        let notify: Notify = {
            let count = count.clone();
            Arc::new(move || {
                count.fetch_add(1, Ordering::SeqCst);
            })
        };
        let pool = WorkerPool::new(2, Some(notify));
        pool.submit(Job::Brightness {
            device: dir.path().to_path_buf(),
            step: 16,
            increase: true,
        });
        assert_eq!(pool.recv_timeout(WAIT), Some(Completion::BrightnessSet { value: 66 }));
        assert_eq!(fs::read_to_string(dir.path().join("brightness")).unwrap(), "66");
        // The notify callback runs right after the completion is queued.
        for _ in 0..500 {
            if count.load(Ordering::SeqCst) == 1 {
                break;
            }
            thread::sleep(Duration::from_millis(10));
        }
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn failures_come_back_as_completions() {
        let pool = WorkerPool::new(1, None);
        pool.submit(Job::Spawn {
            command: "definitely-not-a-real-binary-5f1c".into(),
        });
        let completion = pool.recv_timeout(WAIT).unwrap();
        assert!(matches!(completion.clone().into_error(), Some(WmError::ExternalActionFailure { .. })));
        assert!(pool.drain().is_empty());
    }
}
