//! Dispatcher for feeding actions back into a store
//!
//! Reducers, thunks and subscribers never hold the store itself. They hold a
//! Dispatcher, which forwards to the store's dispatch entry point. Actions sent
//! while the store is reducing are queued and applied afterwards, in order.

use std::rc::Rc;

use crate::action::{Action, BoxedAction};

/// Cheap, cloneable handle that forwards actions to a store.
#[derive(Clone)]
pub struct Dispatcher {
    sink: Rc<dyn Fn(BoxedAction)>,
}

impl Dispatcher {
    /// Create a dispatcher that hands every action to `sink`.
    pub fn new(sink: impl Fn(BoxedAction) + 'static) -> Self {
        Self {
            sink: Rc::new(sink),
        }
    }

    /// A dispatcher that logs and discards everything.
    pub fn detached() -> Self {
        Self::new(|action| log::warn!("Dispatcher: no store attached, dropping {:?}", action))
    }

    pub fn dispatch<A: Action>(&self, action: A) {
        self.dispatch_boxed(Box::new(action));
    }

    pub fn dispatch_boxed(&self, action: BoxedAction) {
        (self.sink)(action);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    #[derive(Debug)]
    struct Ping(u8);

    crate::action!(Ping);

    #[test]
    fn test_dispatch_forwards_to_sink() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        let dispatcher = Dispatcher::new(move |action| {
            if let Some(ping) = action.downcast_ref::<Ping>() {
                sink.borrow_mut().push(ping.0);
            }
        });

        dispatcher.dispatch(Ping(1));
        dispatcher.clone().dispatch(Ping(2));

        assert_eq!(*seen.borrow(), vec![1, 2]);
    }
}
