//! Typed capability registry shared with every execution

use std::any::{type_name, Any, TypeId};
use std::collections::HashMap;
use std::rc::Rc;

use crate::error::StateError;

/// Capabilities contributed by store extensions, keyed by their type.
///
/// An extension provides a value once (for example the thunk scheduler) and
/// executions look it up by type. Providing the same type twice keeps the last
/// value.
#[derive(Default, Clone)]
pub struct Environment {
    capabilities: HashMap<TypeId, Rc<dyn Any>>,
}

impl Environment {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn provide<T: 'static>(&mut self, capability: Rc<T>) {
        self.capabilities.insert(TypeId::of::<T>(), capability);
    }

    pub fn with<T: 'static>(mut self, capability: Rc<T>) -> Self {
        self.provide(capability);
        self
    }

    pub fn get<T: 'static>(&self) -> Option<Rc<T>> {
        self.capabilities
            .get(&TypeId::of::<T>())
            .and_then(|capability| Rc::clone(capability).downcast::<T>().ok())
    }

    pub fn require<T: 'static>(&self) -> Result<Rc<T>, StateError> {
        self.get::<T>()
            .ok_or(StateError::MissingCapability(type_name::<T>()))
    }

    /// Add every capability of `other`, replacing ones of the same type.
    pub fn merge(&mut self, other: Environment) {
        self.capabilities.extend(other.capabilities);
    }

    pub fn len(&self) -> usize {
        self.capabilities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.capabilities.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Clock(u64);
    struct Locale(&'static str);

    #[test]
    fn test_lookup_by_type() {
        let env = Environment::new()
            .with(Rc::new(Clock(7)))
            .with(Rc::new(Locale("en")));

        assert_eq!(env.get::<Clock>().map(|c| c.0), Some(7));
        assert_eq!(env.require::<Locale>().map(|l| l.0).ok(), Some("en"));
        assert_eq!(env.len(), 2);
    }

    #[test]
    fn test_missing_capability_is_an_error() {
        let env = Environment::new();
        let error = env.require::<Clock>().err();
        assert!(matches!(error, Some(StateError::MissingCapability(name)) if name.ends_with("Clock")));
    }

    #[test]
    fn test_merge_last_wins() {
        let mut env = Environment::new().with(Rc::new(Clock(1)));
        env.merge(Environment::new().with(Rc::new(Clock(2))));
        assert_eq!(env.get::<Clock>().map(|c| c.0), Some(2));
        assert_eq!(env.len(), 1);
    }
}
