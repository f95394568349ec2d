//! Test helpers for spindle reducers and stores
//!
//! - [`ReducerTest`] reduces single actions against a state you control and
//!   records everything the reducer dispatches
//! - [`TestScheduler`] runs thunks deterministically on a local pool
//! - [`FakeEventSource`] stands in for an external event stream
//! - [`ActionCollector`] captures what a reducer dispatches while being created

mod collector;
mod fake_event_source;
mod scheduler;

pub use collector::ActionCollector;
pub use fake_event_source::FakeEventSource;
pub use reducer_test::ReducerTest;
pub use scheduler::TestScheduler;
