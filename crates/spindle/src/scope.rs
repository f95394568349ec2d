//! Read-and-dispatch view of a store

use std::rc::Rc;

use crate::action::{Action, BoxedAction};
use crate::dispatcher::Dispatcher;

/// What reducers, extensions and thunks may do with the store: read the last
/// committed state and dispatch actions.
///
/// A scope can be narrowed with [`downscope`](Self::downscope) so a branch of a
/// combined state only ever sees its own slice.
pub struct StoreScope<S> {
    dispatcher: Dispatcher,
    reader: Rc<dyn Fn() -> S>,
}

impl<S: 'static> StoreScope<S> {
    pub fn new(dispatcher: Dispatcher, reader: impl Fn() -> S + 'static) -> Self {
        Self {
            dispatcher,
            reader: Rc::new(reader),
        }
    }

    pub fn dispatch<A: Action>(&self, action: A) {
        self.dispatcher.dispatch(action);
    }

    pub fn dispatch_boxed(&self, action: BoxedAction) {
        self.dispatcher.dispatch_boxed(action);
    }

    pub fn get_state(&self) -> S {
        (self.reader)()
    }

    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    /// Narrow this scope to a projection of its state. Dispatch is unchanged.
    pub fn downscope<T: 'static>(&self, project: impl Fn(S) -> T + 'static) -> StoreScope<T> {
        let reader = Rc::clone(&self.reader);
        StoreScope {
            dispatcher: self.dispatcher.clone(),
            reader: Rc::new(move || project(reader())),
        }
    }
}

impl<S> Clone for StoreScope<S> {
    fn clone(&self) -> Self {
        Self {
            dispatcher: self.dispatcher.clone(),
            reader: Rc::clone(&self.reader),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[derive(Debug, Clone, PartialEq)]
    struct Counter {
        value: u32,
        label: &'static str,
    }

    #[test]
    fn test_downscope_reads_projection_of_live_state() {
        let value = Rc::new(Cell::new(1));
        let source = Rc::clone(&value);
        let scope = StoreScope::new(Dispatcher::detached(), move || Counter {
            value: source.get(),
            label: "clicks",
        });
        let values = scope.downscope(|counter| counter.value);

        assert_eq!(values.get_state(), 1);
        value.set(5);
        assert_eq!(values.get_state(), 5);
        assert_eq!(scope.get_state().label, "clicks");
    }
}
