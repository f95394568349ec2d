//! Keyed, single-flight job registry

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::{Rc, Weak};

use futures::future::{AbortHandle, Abortable};

use super::spawn::{LocalTask, Spawn};

/// Identifies one job. Shared by every task of the job and by its
/// [`ThunkContext`](super::ThunkContext).
#[derive(Debug, Clone)]
pub struct JobToken {
    key: Rc<str>,
    id: u64,
    cancelled: Rc<Cell<bool>>,
}

impl JobToken {
    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.get()
    }
}

struct Job {
    id: u64,
    cancelled: Rc<Cell<bool>>,
    handles: Vec<AbortHandle>,
    live: usize,
}

impl Job {
    fn cancel(self) {
        self.cancelled.set(true);
        for handle in self.handles {
            handle.abort();
        }
    }
}

/// Runs thunk jobs, at most one per key.
///
/// Starting a job under a key that already has one cancels the old job first.
/// Cancellation is cooperative: aborted tasks are not polled again and the
/// job's context stops forwarding dispatches. A job ends when all of its tasks
/// have finished, or when it is cancelled.
pub struct ThunkScheduler {
    this: Weak<ThunkScheduler>,
    spawner: Rc<dyn Spawn>,
    jobs: RefCell<HashMap<String, Job>>,
    next_job: Cell<u64>,
}

impl ThunkScheduler {
    pub fn new(spawner: Rc<dyn Spawn>) -> Rc<Self> {
        Rc::new_cyclic(|this| Self {
            this: this.clone(),
            spawner,
            jobs: RefCell::new(HashMap::new()),
            next_job: Cell::new(1),
        })
    }

    /// Open a job under `key`, superseding the one running there.
    pub fn begin(&self, key: &str) -> JobToken {
        let id = self.next_job.get();
        self.next_job.set(id + 1);

        let token = JobToken {
            key: Rc::from(key),
            id,
            cancelled: Rc::new(Cell::new(false)),
        };
        let job = Job {
            id,
            cancelled: Rc::clone(&token.cancelled),
            handles: Vec::new(),
            live: 0,
        };

        // Release the borrow before aborting: abort may wake tasks synchronously.
        let previous = self.jobs.borrow_mut().insert(key.to_owned(), job);
        if let Some(previous) = previous {
            log::debug!("Thunk `{}` superseded", key);
            previous.cancel();
        }
        token
    }

    /// Run `task` as part of the job identified by `token`.
    ///
    /// Returns whether the task was handed to the executor. A task that could
    /// not be spawned counts as finished, so it never keeps its job alive.
    pub fn spawn(&self, token: &JobToken, task: LocalTask) -> bool {
        let (handle, registration) = AbortHandle::new_pair();
        {
            let mut jobs = self.jobs.borrow_mut();
            let job = jobs
                .get_mut(token.key())
                .filter(|job| job.id == token.id && !token.is_cancelled());
            let Some(job) = job else {
                log::debug!("Thunk `{}` is no longer running, task dropped", token.key());
                return false;
            };
            job.handles.push(handle);
            job.live += 1;
        }

        let scheduler = self.this.clone();
        let task_token = token.clone();
        let spawned = self.spawner.spawn(Box::pin(async move {
            if Abortable::new(task, registration).await.is_err() {
                log::trace!("Thunk `{}` task aborted", task_token.key());
            }
            if let Some(scheduler) = scheduler.upgrade() {
                scheduler.finish(&task_token);
            }
        }));

        match spawned {
            Ok(()) => true,
            Err(e) => {
                log::error!("Thunk `{}`: {}", token.key(), e);
                self.finish(token);
                false
            }
        }
    }

    fn finish(&self, token: &JobToken) {
        let mut jobs = self.jobs.borrow_mut();
        let done = match jobs.get_mut(token.key()) {
            Some(job) if job.id == token.id => {
                job.live = job.live.saturating_sub(1);
                job.live == 0
            }
            _ => false,
        };
        if done {
            jobs.remove(token.key());
            log::trace!("Thunk `{}` finished", token.key());
        }
    }

    /// Cancel the job under `key`. Returns whether one was running.
    pub fn cancel(&self, key: &str) -> bool {
        let job = self.jobs.borrow_mut().remove(key);
        match job {
            Some(job) => {
                log::debug!("Thunk `{}` cancelled", key);
                job.cancel();
                true
            }
            None => false,
        }
    }

    pub fn cancel_all(&self) {
        let jobs: Vec<Job> = self.jobs.borrow_mut().drain().map(|(_, job)| job).collect();
        if !jobs.is_empty() {
            log::debug!("Cancelling {} thunk job(s)", jobs.len());
        }
        for job in jobs {
            job.cancel();
        }
    }

    pub fn is_running(&self, key: &str) -> bool {
        self.jobs.borrow().contains_key(key)
    }

    pub fn running_jobs(&self) -> usize {
        self.jobs.borrow().len()
    }
}
