use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use futures::channel::mpsc::{self, UnboundedSender};
use futures::Stream;

/// In-memory event source for thunks that collect a stream.
///
/// Every [`subscribe`](Self::subscribe) call opens a stream that receives the
/// events emitted afterwards. Subscribers that were dropped, for example
/// because their thunk was cancelled, stop counting as subscribed.
pub struct FakeEventSource<E> {
    inner: Rc<RefCell<Inner<E>>>,
}

struct Inner<E> {
    subscribers: Vec<UnboundedSender<E>>,
    emitted: Vec<E>,
}

impl<E: Clone + fmt::Debug + 'static> FakeEventSource<E> {
    pub fn new() -> Self {
        Self {
            inner: Rc::new(RefCell::new(Inner {
                subscribers: Vec::new(),
                emitted: Vec::new(),
            })),
        }
    }

    pub fn subscribe(&self) -> impl Stream<Item = E> + 'static {
        let (tx, rx) = mpsc::unbounded();
        self.inner.borrow_mut().subscribers.push(tx);
        rx
    }

    /// Send `event` to every live subscriber. Returns how many received it.
    pub fn emit(&self, event: E) -> usize {
        let mut inner = self.inner.borrow_mut();
        inner.subscribers.retain(|tx| !tx.is_closed());
        let delivered = inner
            .subscribers
            .iter()
            .filter(|tx| tx.unbounded_send(event.clone()).is_ok())
            .count();
        log::trace!("FakeEventSource: {:?} delivered to {} subscriber(s)", event, delivered);
        inner.emitted.push(event);
        delivered
    }

    pub fn subscriber_count(&self) -> usize {
        let mut inner = self.inner.borrow_mut();
        inner.subscribers.retain(|tx| !tx.is_closed());
        inner.subscribers.len()
    }

    pub fn emitted(&self) -> Vec<E> {
        self.inner.borrow().emitted.clone()
    }
}

impl<E: Clone + fmt::Debug + 'static> Default for FakeEventSource<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E> Clone for FakeEventSource<E> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::executor::block_on;
    use futures::StreamExt;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_emit_reaches_current_subscribers() {
        let source = FakeEventSource::new();
        let early = source.subscribe();
        assert_eq!(source.emit(1), 1);

        let late = source.subscribe();
        assert_eq!(source.emit(2), 2);

        assert_eq!(source.emitted(), vec![1, 2]);
        drop(source);
        assert_eq!(block_on(early.collect::<Vec<_>>()), vec![1, 2]);
        assert_eq!(block_on(late.collect::<Vec<_>>()), vec![2]);
    }

    #[test]
    fn test_dropped_subscriber_is_forgotten() {
        let source = FakeEventSource::<&str>::new();
        let stream = source.subscribe();
        assert_eq!(source.subscriber_count(), 1);

        drop(stream);
        assert_eq!(source.subscriber_count(), 0);
        assert_eq!(source.emit("ignored"), 0);
    }
}
