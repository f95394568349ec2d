use std::pin::pin;
use std::rc::Rc;

use futures::{Stream, StreamExt};

use super::scheduler::{JobToken, ThunkScheduler};
use super::ThunkUpdate;
use crate::action::Action;
use crate::reducer::ReducerId;
use crate::scope::StoreScope;
use crate::update::Update;

/// Handle given to a running thunk.
///
/// Reads and dispatches go through the scope of the reducer that scheduled the
/// thunk. Once the job is superseded or cancelled every dispatch is dropped.
pub struct ThunkContext<S> {
    scope: StoreScope<S>,
    reducer: ReducerId,
    scheduler: Rc<ThunkScheduler>,
    job: JobToken,
}

impl<S: Clone + 'static> ThunkContext<S> {
    pub(crate) fn new(
        scope: StoreScope<S>,
        reducer: ReducerId,
        scheduler: Rc<ThunkScheduler>,
        job: JobToken,
    ) -> Self {
        Self {
            scope,
            reducer,
            scheduler,
            job,
        }
    }

    pub fn key(&self) -> &str {
        self.job.key()
    }

    pub fn is_active(&self) -> bool {
        !self.job.is_cancelled()
    }

    pub fn dispatch<A: Action>(&self, action: A) {
        if self.is_active() {
            self.scope.dispatch(action);
        } else {
            log::debug!("Thunk `{}` is no longer running, dropping {:?}", self.key(), action);
        }
    }

    /// Last committed state of the reducer that scheduled this thunk.
    pub fn get_state(&self) -> S {
        self.scope.get_state()
    }

    /// Apply `apply` to this reducer's state, through the store's queue.
    pub fn register(&self, apply: impl Fn(S) -> S + 'static) {
        self.register_update(Update::new(apply));
    }

    pub fn register_update(&self, update: Update<S>) {
        self.dispatch(ThunkUpdate::new(self.reducer, update));
    }

    /// Cancel the job running under `key`, which may be this one.
    pub fn cancel(&self, key: &str) -> bool {
        self.scheduler.cancel(key)
    }

    /// Collect `stream` in a task that belongs to this job, so superseding or
    /// cancelling the job also stops the stream.
    pub fn launch_in_thunk<St, F>(&self, stream: St, mut on_item: F)
    where
        St: Stream + 'static,
        F: FnMut(&ThunkContext<S>, St::Item) + 'static,
    {
        let context = self.clone();
        self.scheduler.spawn(
            &self.job,
            Box::pin(async move {
                let mut stream = pin!(stream);
                while let Some(item) = stream.next().await {
                    if !context.is_active() {
                        break;
                    }
                    on_item(&context, item);
                }
            }),
        );
    }
}

impl<S> Clone for ThunkContext<S> {
    fn clone(&self) -> Self {
        Self {
            scope: self.scope.clone(),
            reducer: self.reducer,
            scheduler: Rc::clone(&self.scheduler),
            job: self.job.clone(),
        }
    }
}
