use std::future::Future;

use futures::executor::{LocalPool, LocalSpawner};
use spindle::thunk::ThunkExtensionFactory;

/// Deterministic executor for thunks.
///
/// Nothing runs until the test drives the pool.
pub struct TestScheduler {
    pool: LocalPool,
}

impl TestScheduler {
    pub fn new() -> Self {
        Self {
            pool: LocalPool::new(),
        }
    }

    pub fn spawner(&self) -> LocalSpawner {
        self.pool.spawner()
    }

    /// Thunk extension that runs on this scheduler.
    pub fn thunk_extension(&self) -> ThunkExtensionFactory {
        spindle::thunk(self.spawner())
    }

    /// Run every task until none can make progress.
    pub fn run_until_stalled(&mut self) {
        self.pool.run_until_stalled();
    }

    pub fn run_until<F: Future>(&mut self, future: F) -> F::Output {
        self.pool.run_until(future)
    }
}

impl Default for TestScheduler {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::task::LocalSpawnExt;
    use std::cell::Cell;
    use std::rc::Rc;

    #[test]
    fn test_tasks_wait_for_the_pool() {
        let mut scheduler = TestScheduler::new();
        let ran = Rc::new(Cell::new(false));
        let flag = Rc::clone(&ran);
        scheduler
            .spawner()
            .spawn_local(async move { flag.set(true) })
            .unwrap();

        assert!(!ran.get());
        scheduler.run_until_stalled();
        assert!(ran.get());
    }
}
