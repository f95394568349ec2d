//! Pure state updates

use std::any::{type_name, Any};
use std::fmt;
use std::rc::Rc;

/// A named, pure `S -> S` function.
///
/// Updates may be applied any number of times and must not have side effects.
pub struct Update<S> {
    name: Option<&'static str>,
    apply: Rc<dyn Fn(S) -> S>,
}

impl<S> Update<S> {
    pub fn new(apply: impl Fn(S) -> S + 'static) -> Self {
        Self {
            name: None,
            apply: Rc::new(apply),
        }
    }

    pub fn named(name: &'static str, apply: impl Fn(S) -> S + 'static) -> Self {
        Self {
            name: Some(name),
            apply: Rc::new(apply),
        }
    }

    pub fn name(&self) -> Option<&'static str> {
        self.name
    }

    pub fn apply(&self, state: S) -> S {
        (self.apply)(state)
    }
}

impl<S> Clone for Update<S> {
    fn clone(&self) -> Self {
        Self {
            name: self.name,
            apply: Rc::clone(&self.apply),
        }
    }
}

impl<S> fmt::Debug for Update<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Update")
            .field("name", &self.name.unwrap_or("<anonymous>"))
            .field("state", &type_name::<S>())
            .finish()
    }
}

/// An [`Update`] whose state type is only known to the reducer that applies it.
///
/// Extension handlers are shared by reducers of every state type, so the
/// updates they produce travel erased and are recovered with [`downcast`](Self::downcast).
#[derive(Clone)]
pub struct ErasedUpdate {
    state_type: &'static str,
    update: Rc<dyn Any>,
}

impl ErasedUpdate {
    pub fn new<S: 'static>(update: Update<S>) -> Self {
        Self {
            state_type: type_name::<S>(),
            update: Rc::new(update),
        }
    }

    pub fn state_type(&self) -> &'static str {
        self.state_type
    }

    /// The update, if it was created for state type `S`.
    pub fn downcast<S: 'static>(&self) -> Option<Update<S>> {
        self.update.downcast_ref::<Update<S>>().cloned()
    }
}

impl fmt::Debug for ErasedUpdate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ErasedUpdate")
            .field("state", &self.state_type)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_update_is_repeatable() {
        let double = Update::named("double", |n: u32| n * 2);
        assert_eq!(double.apply(2), 4);
        assert_eq!(double.clone().apply(2), 4);
        assert_eq!(double.name(), Some("double"));
    }

    #[test]
    fn test_erased_update_recovers_only_its_state_type() {
        let erased = ErasedUpdate::new(Update::new(|s: String| s + "!"));
        assert_eq!(erased.downcast::<String>().map(|u| u.apply("hi".into())), Some("hi!".to_string()));
        assert!(erased.downcast::<u32>().is_none());
    }
}
