//! Staged results from off-thread collaborator calls.
//!
//! A collaborator call runs on an [`Executor`] and sends its result down a
//! channel. The engine only looks at the channel from inside a tick, so a
//! result is applied at a tick boundary and never mid-frame. Each staged
//! call carries a tag (the month it was made for) so a late answer for an
//! epoch that has already closed can be recognised and dropped.

use std::collections::VecDeque;
use std::sync::mpsc::{self, Receiver, Sender, TryRecvError};
use std::sync::{Arc, Mutex};

use penny_logic::time::Millis;

pub type Job = Box<dyn FnOnce() + Send + 'static>;

/// Runs collaborator jobs somewhere other than the tick.
pub trait Executor: Send + Sync {
    fn spawn(&self, job: Job);
}

/// One detached worker thread per job.
#[derive(Debug, Default, Clone, Copy)]
pub struct ThreadExecutor;

impl Executor for ThreadExecutor {
    fn spawn(&self, job: Job) {
        let spawned = std::thread::Builder::new()
            .name("penny-collaborator".into())
            .spawn(job);
        if let Err(e) = spawned {
            // The job (and its sender) is dropped, which the poller sees as a
            // disconnect and handles like any other failure.
            log::warn!("Failed to start collaborator thread: {}", e);
        }
    }
}

/// Runs the job immediately on the calling thread. The result is still only
/// picked up at the next poll.
#[derive(Debug, Default, Clone, Copy)]
pub struct InlineExecutor;

impl Executor for InlineExecutor {
    fn spawn(&self, job: Job) {
        job();
    }
}

/// Holds jobs until [`ManualExecutor::run_pending`] is called. Lets callers
/// decide exactly when a collaborator "answers".
#[derive(Default, Clone)]
pub struct ManualExecutor {
    queue: Arc<Mutex<VecDeque<Job>>>,
}

impl ManualExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run every queued job. Returns how many ran.
    pub fn run_pending(&self) -> usize {
        let jobs: Vec<Job> = match self.queue.lock() {
            Ok(mut q) => q.drain(..).collect(),
            Err(poisoned) => poisoned.into_inner().drain(..).collect(),
        };
        let count = jobs.len();
        for job in jobs {
            job();
        }
        count
    }

    /// Drop every queued job without running it.
    pub fn abandon_pending(&self) -> usize {
        match self.queue.lock() {
            Ok(mut q) => q.drain(..).count(),
            Err(poisoned) => poisoned.into_inner().drain(..).count(),
        }
    }

    pub fn pending(&self) -> usize {
        match self.queue.lock() {
            Ok(q) => q.len(),
            Err(poisoned) => poisoned.into_inner().len(),
        }
    }
}

impl Executor for ManualExecutor {
    fn spawn(&self, job: Job) {
        match self.queue.lock() {
            Ok(mut q) => q.push_back(job),
            Err(poisoned) => poisoned.into_inner().push_back(job),
        }
    }
}

/// Outcome of looking at a staged call.
#[derive(Debug, PartialEq, Eq)]
pub enum Poll<T> {
    Pending,
    Ready(T),
    TimedOut,
    Disconnected,
}

/// The receiving end of one in-flight collaborator call.
#[derive(Debug)]
pub struct Staged<T> {
    rx: Receiver<T>,
    tag: u32,
    requested_at: Millis,
}

impl<T> Staged<T> {
    /// Open a slot for a call tagged `tag`, made at `requested_at`.
    pub fn channel(tag: u32, requested_at: Millis) -> (Sender<T>, Self) {
        let (tx, rx) = mpsc::channel();
        (
            tx,
            Self {
                rx,
                tag,
                requested_at,
            },
        )
    }

    pub fn tag(&self) -> u32 {
        self.tag
    }

    /// Non-blocking check. A call older than `timeout_ms` with no answer
    /// reports `TimedOut`.
    pub fn poll(&self, now: Millis, timeout_ms: Millis) -> Poll<T> {
        match self.rx.try_recv() {
            Ok(value) => Poll::Ready(value),
            Err(TryRecvError::Disconnected) => Poll::Disconnected,
            Err(TryRecvError::Empty) if now - self.requested_at >= timeout_ms => Poll::TimedOut,
            Err(TryRecvError::Empty) => Poll::Pending,
        }
    }
}

/// Run `call` on `executor` and stage its result under `tag`.
pub fn dispatch<T, F>(executor: &dyn Executor, tag: u32, now: Millis, call: F) -> Staged<T>
where
    T: Send + 'static,
    F: FnOnce() -> T + Send + 'static,
{
    let (tx, staged) = Staged::channel(tag, now);
    executor.spawn(Box::new(move || {
        // The receiver may be gone if the engine moved on; nothing to do then.
        let _ = tx.send(call());
    }));
    staged
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_inline_result_ready_on_first_poll() {
        let staged = dispatch(&InlineExecutor, 3, 0, || 42);
        assert_eq!(staged.tag(), 3);
        assert_eq!(staged.poll(0, 100), Poll::Ready(42));
    }

    #[test]
    fn test_manual_pending_then_ready() {
        let exec = ManualExecutor::new();
        let staged = dispatch(&exec, 1, 0, || "done");
        assert_eq!(staged.poll(10, 100), Poll::Pending);
        assert_eq!(exec.run_pending(), 1);
        assert_eq!(staged.poll(20, 100), Poll::Ready("done"));
    }

    #[test]
    fn test_timeout() {
        let exec = ManualExecutor::new();
        let staged = dispatch(&exec, 1, 0, || 1);
        assert_eq!(staged.poll(99, 100), Poll::Pending);
        assert_eq!(staged.poll(100, 100), Poll::TimedOut);
    }

    #[test]
    fn test_abandoned_job_disconnects() {
        let exec = ManualExecutor::new();
        let staged = dispatch(&exec, 1, 0, || 1);
        assert_eq!(exec.abandon_pending(), 1);
        assert_eq!(staged.poll(1, 100), Poll::Disconnected);
    }

    #[test]
    fn test_thread_executor_delivers() {
        let staged = dispatch(&ThreadExecutor, 1, 0, || 7);
        let mut result = Poll::Pending;
        for _ in 0..200 {
            result = staged.poll(0, 1_000);
            if result != Poll::Pending {
                break;
            }
            std::thread::sleep(std::time::Duration::from_millis(5));
        }
        assert_eq!(result, Poll::Ready(7));
    }
}
