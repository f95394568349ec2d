use std::cell::RefCell;
use std::rc::Rc;

use spindle::{BoxedAction, Dispatcher, StoreScope};

/// Captures the single action dispatched while a reducer is being created.
///
/// A second dispatch panics with "can only be called once".
#[derive(Default)]
pub struct ActionCollector {
    slot: Rc<RefCell<Option<BoxedAction>>>,
}

impl ActionCollector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn dispatcher(&self) -> Dispatcher {
        let slot = Rc::clone(&self.slot);
        Dispatcher::new(move |action| {
            let mut slot = slot.borrow_mut();
            if let Some(previous) = slot.as_ref() {
                panic!("can only be called once, already collected {:?}", previous);
            }
            *slot = Some(action);
        })
    }

    /// Scope that always reads `state` and dispatches into this collector.
    pub fn scope<S: Clone + 'static>(&self, state: S) -> StoreScope<S> {
        StoreScope::new(self.dispatcher(), move || state.clone())
    }

    pub fn take(&self) -> Option<BoxedAction> {
        self.slot.borrow_mut().take()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use spindle::{create_reducer, Extensions, ReducerFactory};

    #[derive(Debug)]
    struct Init;

    spindle::action!(Init);

    #[test]
    fn test_collects_build_dispatch() {
        let collector = ActionCollector::new();
        let factory = create_reducer(0u8, |builder| builder.dispatch(Init));
        let _reducer = factory.create(collector.scope(0), &Extensions::none());

        let action = collector.take().expect("build block dispatched");
        assert!(action.is::<Init>());
        assert!(collector.take().is_none());
    }

    #[test]
    #[should_panic(expected = "can only be called once")]
    fn test_second_dispatch_panics() {
        let collector = ActionCollector::new();
        let dispatcher = collector.dispatcher();
        dispatcher.dispatch(Init);
        dispatcher.dispatch(Init);
    }
}
