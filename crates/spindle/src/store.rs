//! Store: owns the current state and runs dispatch
//!
//! The Store follows the Redux pattern:
//! - One state value, replaced wholesale on each action
//! - Actions are dispatched to produce the next state
//! - Reducers compute the next state; side effects run as thunks
//! - Subscribers are told about every change
//!
//! # Reentrancy
//!
//! Reducers, thunks and subscribers may dispatch at any time. While an action
//! is being reduced the store is busy and further actions are queued. Once the
//! running action is committed and subscribers have seen it, queued actions are
//! applied one by one in the order they were dispatched, before the outermost
//! `dispatch` returns.
//!
//! ```
//! use spindle::{create_reducer, Store};
//!
//! #[derive(Debug)]
//! struct Increment;
//! spindle::action!(Increment);
//!
//! let counter = create_reducer(0u32, |builder| {
//!     builder.on::<Increment>(|r, _, _| r.update(|n| n + 1));
//! });
//! let store = Store::builder(counter).build();
//! store.dispatch(Increment);
//! assert_eq!(store.get_state(), 1);
//! ```

use std::cell::{Cell, OnceCell, RefCell};
use std::collections::VecDeque;
use std::rc::{Rc, Weak};

use crate::action::{Action, BoxedAction};
use crate::config::StoreConfig;
use crate::dispatcher::Dispatcher;
use crate::error::{fail_fast, StateError};
use crate::extension::{ExtensionFactory, Extensions, StoreExtension};
use crate::reducer::{Reducer, ReducerFactory};
use crate::scope::StoreScope;

type Subscriber<S> = Rc<dyn Fn(&S)>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

/// Single-threaded state container.
pub struct Store<S> {
    inner: Rc<StoreInner<S>>,
}

struct StoreInner<S> {
    state: RefCell<S>,
    reducer: OnceCell<Reducer<S>>,
    idle: Cell<bool>,
    queue: RefCell<VecDeque<BoxedAction>>,
    subscribers: RefCell<Vec<(SubscriptionId, Subscriber<S>)>>,
    next_subscription: Cell<u64>,
    config: StoreConfig,
    // Dropped last; the thunk extension cancels its jobs on drop.
    extensions: RefCell<Vec<Box<dyn StoreExtension>>>,
}

/// Marks the store busy for as long as it lives.
struct Busy<'a>(&'a Cell<bool>);

impl<'a> Busy<'a> {
    fn enter(idle: &'a Cell<bool>) -> Self {
        idle.set(false);
        Self(idle)
    }
}

impl Drop for Busy<'_> {
    fn drop(&mut self) {
        self.0.set(true);
    }
}

impl<S: Clone + PartialEq + 'static> StoreInner<S> {
    fn dispatch(&self, action: BoxedAction) {
        if !self.idle.get() {
            let pending = {
                let mut queue = self.queue.borrow_mut();
                queue.push_back(action);
                queue.len()
            };
            if pending == self.config.queue_warn_threshold {
                log::warn!("Store: {} actions waiting in the dispatch queue", pending);
            }
            return;
        }

        self.process(action);
        self.drain();
    }

    /// Apply queued actions until the queue is empty. Actions they dispatch
    /// are queued behind them, so a chain of any length runs in this one loop.
    fn drain(&self) {
        loop {
            // Pop in its own statement so the queue is not borrowed while reducing.
            let next = self.queue.borrow_mut().pop_front();
            let Some(action) = next else {
                break;
            };
            self.process(action);
        }
    }

    fn process(&self, action: BoxedAction) {
        let Some(reducer) = self.reducer.get() else {
            log::error!("Store: no reducer yet, dropping {:?}", action);
            return;
        };
        let _busy = Busy::enter(&self.idle);

        if self.config.log_actions {
            log::debug!("Action: {:?}", action);
        }

        let current = self.state.borrow().clone();
        let next = reducer.reduce(current, action.as_ref());
        let changed = *self.state.borrow() != next;
        self.state.replace(next);

        if changed {
            self.notify();
        }
    }

    fn notify(&self) {
        let state = self.state.borrow().clone();
        let subscribers: Vec<Subscriber<S>> = self
            .subscribers
            .borrow()
            .iter()
            .map(|(_, subscriber)| Rc::clone(subscriber))
            .collect();
        for subscriber in subscribers {
            subscriber(&state);
        }
    }
}

impl<S: Clone + PartialEq + 'static> Store<S> {
    pub fn builder(factory: impl ReducerFactory<S> + 'static) -> StoreBuilder<S> {
        StoreBuilder::new(factory)
    }

    /// Dispatch an action, applying it (and everything it causes to be
    /// dispatched) before returning, unless the store is already busy.
    pub fn dispatch<A: Action>(&self, action: A) {
        self.inner.dispatch(Box::new(action));
    }

    pub fn dispatch_boxed(&self, action: BoxedAction) {
        self.inner.dispatch(action);
    }

    /// Last committed state.
    pub fn get_state(&self) -> S {
        self.inner.state.borrow().clone()
    }

    /// Call `subscriber` with the new state after every dispatch that changes it.
    pub fn subscribe(&self, subscriber: impl Fn(&S) + 'static) -> SubscriptionId {
        let id = SubscriptionId(self.inner.next_subscription.get());
        self.inner.next_subscription.set(id.0 + 1);
        self.inner.subscribers.borrow_mut().push((id, Rc::new(subscriber)));
        id
    }

    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut subscribers = self.inner.subscribers.borrow_mut();
        let before = subscribers.len();
        subscribers.retain(|(subscription, _)| *subscription != id);
        subscribers.len() != before
    }

    /// Scope over the whole state. It does not keep the store alive.
    pub fn scope(&self) -> StoreScope<S> {
        let dispatch_to = Rc::downgrade(&self.inner);
        let read_from: Weak<StoreInner<S>> = Rc::downgrade(&self.inner);

        StoreScope::new(
            Dispatcher::new(move |action| match dispatch_to.upgrade() {
                Some(inner) => inner.dispatch(action),
                None => log::warn!("Store: dropped, ignoring {:?}", action),
            }),
            move || match read_from.upgrade() {
                Some(inner) => inner.state.borrow().clone(),
                None => fail_fast(StateError::StoreDropped),
            },
        )
    }

    pub fn config(&self) -> &StoreConfig {
        &self.inner.config
    }
}

/// Configures and creates a [`Store`].
pub struct StoreBuilder<S> {
    factory: Box<dyn ReducerFactory<S>>,
    extensions: Vec<Box<dyn ExtensionFactory<S>>>,
    config: StoreConfig,
}

impl<S: Clone + PartialEq + 'static> StoreBuilder<S> {
    pub fn new(factory: impl ReducerFactory<S> + 'static) -> Self {
        Self {
            factory: Box::new(factory),
            extensions: Vec::new(),
            config: StoreConfig::default(),
        }
    }

    /// Install an extension. On handler or capability collisions the
    /// extension added last wins.
    pub fn extension(mut self, extension: impl ExtensionFactory<S> + 'static) -> Self {
        self.add_extension(extension);
        self
    }

    pub fn add_extension(&mut self, extension: impl ExtensionFactory<S> + 'static) {
        self.extensions.push(Box::new(extension));
    }

    pub fn config(mut self, config: StoreConfig) -> Self {
        self.config = config;
        self
    }

    /// Use the config found by [`StoreConfig::load`].
    pub fn load_config(self) -> Self {
        self.config(StoreConfig::load())
    }

    pub fn build(self) -> Store<S> {
        let store = Store {
            inner: Rc::new(StoreInner {
                state: RefCell::new(self.factory.initial_state()),
                reducer: OnceCell::new(),
                // Busy until the reducer exists; dispatches made while creating it are queued.
                idle: Cell::new(false),
                queue: RefCell::new(VecDeque::new()),
                subscribers: RefCell::new(Vec::new()),
                next_subscription: Cell::new(1),
                config: self.config,
                extensions: RefCell::new(Vec::new()),
            }),
        };

        let scope = store.scope();
        let extensions: Vec<Box<dyn StoreExtension>> = self
            .extensions
            .iter()
            .map(|factory| factory.create(&scope))
            .collect();
        let reducer = self.factory.create(scope, &Extensions::merge(&extensions));

        *store.inner.extensions.borrow_mut() = extensions;
        if store.inner.reducer.set(reducer).is_err() {
            log::error!("Store: reducer was already set");
        }
        log::debug!("Store created with {} extension(s)", store.inner.extensions.borrow().len());

        store.inner.idle.set(true);
        store.inner.drain();
        store
    }
}

/// Create a store from a reducer factory and extension factories.
pub fn create_store<S>(
    factory: impl ReducerFactory<S> + 'static,
    extensions: Vec<Box<dyn ExtensionFactory<S>>>,
) -> Store<S>
where
    S: Clone + PartialEq + 'static,
{
    let mut builder = StoreBuilder::new(factory);
    builder.extensions = extensions;
    builder.build()
}
