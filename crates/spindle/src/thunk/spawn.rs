//! Executors thunk tasks can run on

use std::rc::Rc;

use futures::executor::LocalSpawner;
use futures::future::LocalBoxFuture;
use futures::task::LocalSpawnExt;
use tokio::task::LocalSet;

use crate::error::StateError;

pub type LocalTask = LocalBoxFuture<'static, ()>;

/// Runs thunk tasks.
///
/// Stores are single-threaded, so their thunks are local futures and need a
/// local executor: a tokio [`LocalSet`] or a `futures` [`LocalPool`](futures::executor::LocalPool).
pub trait Spawn {
    /// Hand `task` to the executor. On error the task has been dropped.
    fn spawn(&self, task: LocalTask) -> Result<(), StateError>;
}

/// Spawns onto the tokio `LocalSet` the caller is running inside.
///
/// Dispatching an action that schedules a thunk outside of a `LocalSet` panics.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioLocalSpawner;

impl Spawn for TokioLocalSpawner {
    fn spawn(&self, task: LocalTask) -> Result<(), StateError> {
        tokio::task::spawn_local(task);
        Ok(())
    }
}

/// Spawns onto a specific `LocalSet`; tasks run whenever that set is driven.
impl Spawn for Rc<LocalSet> {
    fn spawn(&self, task: LocalTask) -> Result<(), StateError> {
        self.spawn_local(task);
        Ok(())
    }
}

/// Fails once the `LocalPool` behind the spawner has been dropped.
impl Spawn for LocalSpawner {
    fn spawn(&self, task: LocalTask) -> Result<(), StateError> {
        Ok(self.spawn_local(task)?)
    }
}
