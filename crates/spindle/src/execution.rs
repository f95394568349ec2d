//! What a handler asks the reducer to do with an action

use std::fmt;
use std::rc::Rc;

use crate::action::Discriminant;
use crate::environment::Environment;
use crate::error::StateError;
use crate::reducer::ReducerId;
use crate::scope::StoreScope;
use crate::thunk::Thunk;
use crate::update::Update;

/// Result of a handler for one action.
pub enum Execution<S> {
    /// Applied to the accumulator right away.
    Update(Update<S>),
    /// Scheduled on the thunk extension; leaves the state as it is.
    Thunk(Thunk<S>),
}

impl<S: Clone + 'static> Execution<S> {
    pub fn update(apply: impl Fn(S) -> S + 'static) -> Self {
        Self::Update(Update::new(apply))
    }

    pub fn execute(self, state: S, context: &ExecutionContext<S>) -> S {
        match self {
            Execution::Update(update) => update.apply(state),
            Execution::Thunk(thunk) => {
                thunk.schedule(context);
                state
            }
        }
    }
}

impl<S> fmt::Debug for Execution<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Execution::Update(update) => f.debug_tuple("Update").field(update).finish(),
            Execution::Thunk(thunk) => f.debug_tuple("Thunk").field(thunk).finish(),
        }
    }
}

/// Everything an execution may touch: the reducer it belongs to, that
/// reducer's scope and the store's extension environment.
pub struct ExecutionContext<S> {
    reducer: ReducerId,
    scope: StoreScope<S>,
    environment: Rc<Environment>,
}

impl<S: 'static> ExecutionContext<S> {
    pub fn new(reducer: ReducerId, scope: StoreScope<S>, environment: Rc<Environment>) -> Self {
        Self {
            reducer,
            scope,
            environment,
        }
    }

    pub fn reducer(&self) -> ReducerId {
        self.reducer
    }

    pub fn scope(&self) -> &StoreScope<S> {
        &self.scope
    }

    pub fn environment(&self) -> &Environment {
        &self.environment
    }

    pub fn capability<T: 'static>(&self) -> Result<Rc<T>, StateError> {
        self.environment.require::<T>()
    }
}

/// Collects the executions a handler block produces for one action.
pub struct ExecutionRegistrar<S> {
    name: Discriminant,
    executions: Vec<Execution<S>>,
}

impl<S: Clone + 'static> ExecutionRegistrar<S> {
    pub fn new(name: Discriminant) -> Self {
        Self {
            name,
            executions: Vec::new(),
        }
    }

    /// Discriminant of the action being handled. Default thunk key.
    pub fn name(&self) -> Discriminant {
        self.name
    }

    pub fn register(&mut self, execution: Execution<S>) {
        self.executions.push(execution);
    }

    pub fn update(&mut self, apply: impl Fn(S) -> S + 'static) {
        self.register(Execution::Update(Update::new(apply)));
    }

    pub fn into_executions(self) -> Vec<Execution<S>> {
        self.executions
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatcher::Dispatcher;

    fn context() -> ExecutionContext<u32> {
        ExecutionContext::new(
            ReducerId::next(),
            StoreScope::new(Dispatcher::detached(), || 0),
            Rc::new(Environment::new()),
        )
    }

    #[test]
    fn test_update_execution_applies_to_accumulator() {
        let context = context();
        let state = Execution::update(|n: u32| n + 1).execute(41, &context);
        assert_eq!(state, 42);
    }

    #[test]
    fn test_registrar_keeps_registration_order() {
        let context = context();
        let mut registrar = ExecutionRegistrar::new(Discriminant::new("Step"));
        registrar.update(|n: u32| n * 10);
        registrar.update(|n: u32| n + 1);

        assert_eq!(registrar.name().name(), "Step");
        let state = registrar
            .into_executions()
            .into_iter()
            .fold(1, |acc, execution| execution.execute(acc, &context));
        assert_eq!(state, 11);
    }

    #[test]
    #[should_panic(expected = "ThunkScheduler")]
    fn test_thunk_without_extension_fails_fast() {
        let context = context();
        let thunk = Execution::Thunk(Thunk::new("load", |_ctx| async {}));
        thunk.execute(0, &context);
    }
}
