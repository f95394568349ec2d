//! Thunk extension: keyed, cancellable async work started by reducers
//!
//! A handler returns [`Execution::Thunk`] instead of an update when it needs to
//! do asynchronous work. The thunk runs on the extension's [`Spawn`]er and can
//! read state, dispatch actions and register updates for the reducer that
//! started it. Thunks never touch state directly: [`ThunkContext::register`]
//! dispatches a [`ThunkUpdate`], which goes through the store's queue like any
//! other action and is applied only by that reducer.
//!
//! At most one thunk runs per key. The key defaults to the discriminant of the
//! action that started it, so re-dispatching the same action restarts its work.

mod context;
mod scheduler;
mod spawn;

use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::rc::Rc;

pub use context::ThunkContext;
pub use scheduler::{JobToken, ThunkScheduler};
pub use spawn::{LocalTask, Spawn, TokioLocalSpawner};

use crate::action::{Action, AnyAction, Discriminant};
use crate::error::fail_fast;
use crate::execution::{Execution, ExecutionContext, ExecutionRegistrar};
use crate::extension::{ExtensionFactory, ExtensionHandler, HandlerContext, StoreExtension};
use crate::environment::Environment;
use crate::reducer::ReducerId;
use crate::scope::StoreScope;
use crate::update::{ErasedUpdate, Update};

type ThunkBody<S> = Box<dyn FnOnce(ThunkContext<S>) -> LocalTask>;

/// Deferred async work, scheduled under `key`.
pub struct Thunk<S> {
    key: String,
    body: ThunkBody<S>,
}

impl<S: Clone + 'static> Thunk<S> {
    pub fn new<F, Fut>(key: impl Into<String>, body: F) -> Self
    where
        F: FnOnce(ThunkContext<S>) -> Fut + 'static,
        Fut: Future<Output = ()> + 'static,
    {
        Self {
            key: key.into(),
            body: Box::new(move |context| Box::pin(body(context))),
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub(crate) fn schedule(self, context: &ExecutionContext<S>) {
        let scheduler = match context.capability::<ThunkScheduler>() {
            Ok(scheduler) => scheduler,
            Err(e) => fail_fast(e),
        };

        log::debug!("Scheduling thunk `{}`", self.key);
        let job = scheduler.begin(&self.key);
        let thunk_context = ThunkContext::new(
            context.scope().clone(),
            context.reducer(),
            Rc::clone(&scheduler),
            job.clone(),
        );
        scheduler.spawn(&job, (self.body)(thunk_context));
    }
}

impl<S> fmt::Debug for Thunk<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Thunk").field("key", &self.key).finish()
    }
}

impl<S: Clone + 'static> ExecutionRegistrar<S> {
    /// Schedule `body` under the handled action's discriminant name.
    pub fn thunk<F, Fut>(&mut self, body: F)
    where
        F: FnOnce(ThunkContext<S>) -> Fut + 'static,
        Fut: Future<Output = ()> + 'static,
    {
        let key = self.name().name();
        self.register(Execution::Thunk(Thunk::new(key, body)));
    }

    pub fn thunk_keyed<F, Fut>(&mut self, key: impl Into<String>, body: F)
    where
        F: FnOnce(ThunkContext<S>) -> Fut + 'static,
        Fut: Future<Output = ()> + 'static,
    {
        self.register(Execution::Thunk(Thunk::new(key, body)));
    }
}

/// Internal action carrying an update from a thunk back to its reducer.
#[derive(Debug, Clone)]
pub struct ThunkUpdate {
    target: ReducerId,
    update: ErasedUpdate,
}

impl ThunkUpdate {
    pub fn new<S: 'static>(target: ReducerId, update: Update<S>) -> Self {
        Self {
            target,
            update: ErasedUpdate::new(update),
        }
    }

    pub fn target(&self) -> ReducerId {
        self.target
    }

    pub fn update<S: 'static>(&self) -> Option<Update<S>> {
        self.update.downcast::<S>()
    }
}

impl Action for ThunkUpdate {
    const DISCRIMINANT: Discriminant = Discriminant::new("ThunkUpdate");
}

pub struct ThunkExtension {
    scheduler: Rc<ThunkScheduler>,
}

impl ThunkExtension {
    pub fn new(spawner: Rc<dyn Spawn>) -> Self {
        Self {
            scheduler: ThunkScheduler::new(spawner),
        }
    }

    pub fn scheduler(&self) -> Rc<ThunkScheduler> {
        Rc::clone(&self.scheduler)
    }
}

impl StoreExtension for ThunkExtension {
    fn register_handlers(&self) -> HashMap<Discriminant, ExtensionHandler> {
        let apply: ExtensionHandler = Rc::new(|action: &dyn AnyAction, cx: &HandlerContext| {
            let update = action.downcast_ref::<ThunkUpdate>()?;
            (update.target == cx.reducer()).then(|| update.update.clone())
        });
        HashMap::from([(ThunkUpdate::DISCRIMINANT, apply)])
    }

    fn extend_environment(&self) -> Environment {
        Environment::new().with(Rc::clone(&self.scheduler))
    }
}

impl Drop for ThunkExtension {
    fn drop(&mut self) {
        self.scheduler.cancel_all();
    }
}

/// Extension factory returned by [`thunk`].
#[derive(Clone)]
pub struct ThunkExtensionFactory {
    spawner: Rc<dyn Spawn>,
}

impl<S> ExtensionFactory<S> for ThunkExtensionFactory {
    fn create(&self, _scope: &StoreScope<S>) -> Box<dyn StoreExtension> {
        Box::new(ThunkExtension::new(Rc::clone(&self.spawner)))
    }
}

/// Install thunk support on a store, running thunks on `spawner`.
pub fn thunk(spawner: impl Spawn + 'static) -> ThunkExtensionFactory {
    ThunkExtensionFactory {
        spawner: Rc::new(spawner),
    }
}
