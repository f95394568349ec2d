//! # spindle
//!
//! A composable, observable state container.
//!
//! A [`Store`] holds one state value. Dispatching an action runs it through the
//! store's reducer, commits the result and notifies subscribers when it
//! changed. Reducers are built from small pieces:
//!
//! - [`create_reducer`] registers handlers per action type
//! - [`combine_reducers`] assembles an aggregate state from branch reducers
//! - [`ReducerFactoryExt::outer`] layers a reducer on top of another
//! - [`create_page_reducer`] routes actions to the active page only
//!
//! Asynchronous work runs as thunks, provided by the [`thunk`] extension.
//!
//! ## Usage
//!
//! ```rust
//! use futures::executor::LocalPool;
//! use spindle::{create_reducer, thunk, Store};
//!
//! #[derive(Debug)]
//! struct Fetch;
//! spindle::action!(Fetch);
//!
//! let mut pool = LocalPool::new();
//! let items = create_reducer(Vec::<String>::new(), |builder| {
//!     builder.on::<Fetch>(|r, _, _| {
//!         r.thunk(|ctx| async move {
//!             ctx.register(|mut items| {
//!                 items.push("fetched".to_string());
//!                 items
//!             });
//!         });
//!     });
//! });
//!
//! let store = Store::builder(items).extension(thunk(pool.spawner())).build();
//! store.dispatch(Fetch);
//! pool.run_until_stalled();
//! assert_eq!(store.get_state(), vec!["fetched".to_string()]);
//! ```

pub mod action;
pub mod combine;
pub mod config;
pub mod dispatcher;
pub mod environment;
pub mod error;
pub mod execution;
pub mod extension;
pub mod page;
pub mod reducer;
pub mod scope;
pub mod store;
pub mod thunk;
pub mod update;

pub use action::{Action, AnyAction, BoxedAction, Discriminant};
pub use combine::{
    branch, combine_reducers, Branch, BranchState, CombinedReducer, ObjectFactory, Part, Parts,
    ReducerFactoryExt, SharedState, Tuple,
};
pub use config::StoreConfig;
pub use dispatcher::Dispatcher;
pub use environment::Environment;
pub use error::StateError;
pub use execution::{Execution, ExecutionContext, ExecutionRegistrar};
pub use extension::{ExtensionFactory, ExtensionHandler, Extensions, HandlerContext, StoreExtension};
pub use page::{
    create_page_reducer, create_page_reducer_with, go_to, navigate, ChangePage, GoTo, Page, PageDispatch, PageReducer,
    PageRoutes, RouteContainer, Router, UpdatePage, UpdateRoute,
};
pub use reducer::{create_reducer, Reducer, ReducerBuilder, ReducerFactory, ReducerId, RegistryReducer};
pub use scope::StoreScope;
pub use store::{create_store, Store, StoreBuilder, SubscriptionId};
pub use thunk::{thunk, Spawn, Thunk, ThunkContext, ThunkExtension, ThunkScheduler, ThunkUpdate, TokioLocalSpawner};
pub use update::{ErasedUpdate, Update};
