//! Store extensions
//!
//! An extension is created once per store. It can contribute action handlers
//! that every reducer of the store installs ahead of its own, and capabilities
//! that every execution can look up from the shared [`Environment`].

use std::collections::HashMap;
use std::rc::Rc;

use crate::action::{AnyAction, Discriminant};
use crate::environment::Environment;
use crate::reducer::ReducerId;
use crate::scope::StoreScope;
use crate::update::ErasedUpdate;

/// Identifies the reducer an extension handler is running in.
#[derive(Debug, Clone, Copy)]
pub struct HandlerContext {
    reducer: ReducerId,
}

impl HandlerContext {
    pub fn new(reducer: ReducerId) -> Self {
        Self { reducer }
    }

    pub fn reducer(&self) -> ReducerId {
        self.reducer
    }
}

/// Handler contributed by an extension.
///
/// It is shared by reducers of every state type, so it returns an erased
/// update. Reducers whose state type does not match skip it.
pub type ExtensionHandler = Rc<dyn Fn(&dyn AnyAction, &HandlerContext) -> Option<ErasedUpdate>>;

pub trait StoreExtension {
    fn register_handlers(&self) -> HashMap<Discriminant, ExtensionHandler> {
        HashMap::new()
    }

    fn extend_environment(&self) -> Environment {
        Environment::new()
    }
}

/// Builds an extension for a store, given the store's root scope.
pub trait ExtensionFactory<S> {
    fn create(&self, scope: &StoreScope<S>) -> Box<dyn StoreExtension>;
}

impl<S, F> ExtensionFactory<S> for F
where
    F: Fn(&StoreScope<S>) -> Box<dyn StoreExtension>,
{
    fn create(&self, scope: &StoreScope<S>) -> Box<dyn StoreExtension> {
        self(scope)
    }
}

/// Handlers and environment of all extensions of a store, merged.
#[derive(Clone, Default)]
pub struct Extensions {
    handlers: Rc<HashMap<Discriminant, ExtensionHandler>>,
    environment: Rc<Environment>,
}

impl Extensions {
    pub fn none() -> Self {
        Self::default()
    }

    /// Merge in installation order. On a key collision the later extension wins.
    pub fn merge(extensions: &[Box<dyn StoreExtension>]) -> Self {
        let mut handlers = HashMap::new();
        let mut environment = Environment::new();
        for extension in extensions {
            for (discriminant, handler) in extension.register_handlers() {
                if handlers.insert(discriminant, handler).is_some() {
                    log::debug!("Extension handler for {} replaced", discriminant);
                }
            }
            environment.merge(extension.extend_environment());
        }

        Self {
            handlers: Rc::new(handlers),
            environment: Rc::new(environment),
        }
    }

    pub fn handlers(&self) -> impl Iterator<Item = (Discriminant, &ExtensionHandler)> {
        self.handlers.iter().map(|(discriminant, handler)| (*discriminant, handler))
    }

    pub fn environment(&self) -> Rc<Environment> {
        Rc::clone(&self.environment)
    }
}
