//! Reducers and the handler registry they are built from
//!
//! A reducer factory knows the initial state and how to create a [`Reducer`]
//! for a given store scope. [`create_reducer`] is the usual way to get one: its
//! builder block registers handlers keyed by action discriminant.
//!
//! Reduction of one action:
//!
//! 1. the `accept` gate is consulted, a rejected action leaves the state untouched
//! 2. handlers registered for exactly the action's discriminant are invoked,
//!    extension handlers first, then builder handlers in registration order
//! 3. the executions they return are folded over the state, left to right

use std::collections::HashMap;
use std::rc::Rc;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::action::{Action, AnyAction, Discriminant};
use crate::execution::{Execution, ExecutionContext, ExecutionRegistrar};
use crate::extension::{ExtensionHandler, Extensions, HandlerContext};
use crate::scope::StoreScope;

static NEXT_REDUCER_ID: AtomicU64 = AtomicU64::new(1);

/// Identity of one created reducer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ReducerId(u64);

impl ReducerId {
    pub fn next() -> Self {
        Self(NEXT_REDUCER_ID.fetch_add(1, Ordering::Relaxed))
    }
}

/// `(state, action) -> state`
pub struct Reducer<S> {
    reduce: Box<dyn Fn(S, &dyn AnyAction) -> S>,
}

impl<S> Reducer<S> {
    pub fn new(reduce: impl Fn(S, &dyn AnyAction) -> S + 'static) -> Self {
        Self {
            reduce: Box::new(reduce),
        }
    }

    pub fn reduce(&self, state: S, action: &dyn AnyAction) -> S {
        (self.reduce)(state, action)
    }
}

pub trait ReducerFactory<S> {
    fn initial_state(&self) -> S;

    fn create(&self, scope: StoreScope<S>, extensions: &Extensions) -> Reducer<S>;
}

impl<S, F: ReducerFactory<S> + ?Sized> ReducerFactory<S> for Box<F> {
    fn initial_state(&self) -> S {
        (**self).initial_state()
    }

    fn create(&self, scope: StoreScope<S>, extensions: &Extensions) -> Reducer<S> {
        (**self).create(scope, extensions)
    }
}

impl<S, F: ReducerFactory<S> + ?Sized> ReducerFactory<S> for Rc<F> {
    fn initial_state(&self) -> S {
        (**self).initial_state()
    }

    fn create(&self, scope: StoreScope<S>, extensions: &Extensions) -> Reducer<S> {
        (**self).create(scope, extensions)
    }
}

type Handler<S> = Box<dyn Fn(&dyn AnyAction) -> Vec<Execution<S>>>;

type Accept = Box<dyn Fn(&dyn AnyAction) -> bool>;

/// Handed to the builder block of [`create_reducer`].
pub struct ReducerBuilder<S> {
    scope: StoreScope<S>,
    handlers: HashMap<Discriminant, Vec<Handler<S>>>,
    accept: Option<Accept>,
}

impl<S: Clone + 'static> ReducerBuilder<S> {
    fn new(scope: StoreScope<S>) -> Self {
        Self {
            scope,
            handlers: HashMap::new(),
            accept: None,
        }
    }

    /// Register a raw handler. Returning `None` means "not applicable".
    pub fn register(
        &mut self,
        discriminant: Discriminant,
        handler: impl Fn(&dyn AnyAction) -> Option<Execution<S>> + 'static,
    ) -> &mut Self {
        self.push(
            discriminant,
            Box::new(move |action: &dyn AnyAction| handler(action).into_iter().collect()),
        );
        self
    }

    /// Register a typed handler for action `A`.
    ///
    /// The block receives a registrar, the reducer's last committed state and
    /// the payload. Every update or thunk it registers is executed in order.
    pub fn on<A: Action>(
        &mut self,
        block: impl Fn(&mut ExecutionRegistrar<S>, S, &A) + 'static,
    ) -> &mut Self {
        let scope = self.scope.clone();
        self.push(
            A::DISCRIMINANT,
            Box::new(move |action: &dyn AnyAction| {
                let Some(payload) = action.downcast_ref::<A>() else {
                    return Vec::new();
                };
                let mut registrar = ExecutionRegistrar::new(A::DISCRIMINANT);
                block(&mut registrar, scope.get_state(), payload);
                registrar.into_executions()
            }),
        );
        self
    }

    /// Only reduce actions for which `predicate` holds. The last call wins.
    pub fn accept(&mut self, predicate: impl Fn(&dyn AnyAction) -> bool + 'static) -> &mut Self {
        self.accept = Some(Box::new(predicate));
        self
    }

    pub fn scope(&self) -> &StoreScope<S> {
        &self.scope
    }

    pub fn get_state(&self) -> S {
        self.scope.get_state()
    }

    pub fn dispatch<A: Action>(&self, action: A) {
        self.scope.dispatch(action);
    }

    fn push(&mut self, discriminant: Discriminant, handler: Handler<S>) {
        self.handlers.entry(discriminant).or_default().push(handler);
    }

    fn install_extension(&mut self, discriminant: Discriminant, handler: ExtensionHandler, cx: HandlerContext) {
        self.push(
            discriminant,
            Box::new(move |action: &dyn AnyAction| {
                handler(action, &cx)
                    .and_then(|update| update.downcast::<S>())
                    .map(Execution::Update)
                    .into_iter()
                    .collect()
            }),
        );
    }

    fn build(self, context: ExecutionContext<S>) -> Reducer<S> {
        let ReducerBuilder { handlers, accept, .. } = self;
        Reducer::new(move |state, action| {
            if let Some(accept) = &accept {
                if !accept(action) {
                    return state;
                }
            }
            let Some(handlers) = handlers.get(&action.discriminant()) else {
                return state;
            };
            let executions: Vec<Execution<S>> = handlers.iter().flat_map(|handler| handler(action)).collect();
            executions
                .into_iter()
                .fold(state, |acc, execution| execution.execute(acc, &context))
        })
    }
}

/// Factory returned by [`create_reducer`].
pub struct RegistryReducer<S> {
    initial_state: S,
    build: Rc<dyn Fn(&mut ReducerBuilder<S>)>,
}

/// Define a reducer by registering handlers in `build`.
///
/// `build` runs again for every reducer the factory creates.
pub fn create_reducer<S, F>(initial_state: S, build: F) -> RegistryReducer<S>
where
    S: Clone + 'static,
    F: Fn(&mut ReducerBuilder<S>) + 'static,
{
    RegistryReducer {
        initial_state,
        build: Rc::new(build),
    }
}

impl<S: Clone + 'static> ReducerFactory<S> for RegistryReducer<S> {
    fn initial_state(&self) -> S {
        self.initial_state.clone()
    }

    fn create(&self, scope: StoreScope<S>, extensions: &Extensions) -> Reducer<S> {
        let id = ReducerId::next();
        let mut builder = ReducerBuilder::new(scope.clone());
        for (discriminant, handler) in extensions.handlers() {
            builder.install_extension(discriminant, Rc::clone(handler), HandlerContext::new(id));
        }
        (self.build)(&mut builder);
        builder.build(ExecutionContext::new(id, scope, extensions.environment()))
    }
}
