//! Actions and their discriminants
//!
//! Every action type carries an explicit [`Discriminant`]. Reducers route on the
//! discriminant alone and only downcast to the concrete payload type once a
//! handler has been selected, so two unrelated types never match by accident
//! of their shape.

use std::any::Any;
use std::fmt;

/// Routing key of an action type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Discriminant(&'static str);

impl Discriminant {
    pub const fn new(name: &'static str) -> Self {
        Self(name)
    }

    pub const fn name(&self) -> &'static str {
        self.0
    }
}

impl fmt::Display for Discriminant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0)
    }
}

/// An action that can be dispatched to a store.
///
/// Implement it by hand for generic types, or use [`action!`](crate::action)
/// for plain ones:
///
/// ```
/// #[derive(Debug)]
/// struct Increment;
///
/// spindle::action!(Increment);
///
/// use spindle::Action;
/// assert_eq!(Increment::DISCRIMINANT.name(), "Increment");
/// ```
pub trait Action: fmt::Debug + 'static {
    const DISCRIMINANT: Discriminant;
}

/// Object-safe view of an [`Action`], as seen by reducers and handlers.
pub trait AnyAction: fmt::Debug {
    fn discriminant(&self) -> Discriminant;

    fn as_any(&self) -> &dyn Any;
}

impl<A: Action> AnyAction for A {
    fn discriminant(&self) -> Discriminant {
        A::DISCRIMINANT
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl<'a> dyn AnyAction + 'a {
    /// Borrow the payload as `A`, if this action is one.
    pub fn downcast_ref<A: Action>(&self) -> Option<&A> {
        self.as_any().downcast_ref::<A>()
    }

    pub fn is<A: Action>(&self) -> bool {
        self.as_any().is::<A>()
    }
}

pub type BoxedAction = Box<dyn AnyAction>;

/// Implement [`Action`] for one or more types, using the type name as discriminant.
#[macro_export]
macro_rules! action {
    ($($ty:ident),+ $(,)?) => {
        $(
            impl $crate::Action for $ty {
                const DISCRIMINANT: $crate::Discriminant =
                    $crate::Discriminant::new(stringify!($ty));
            }
        )+
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, PartialEq)]
    struct Rename(String);

    #[derive(Debug)]
    struct Clear;

    crate::action!(Rename, Clear);

    #[test]
    fn test_discriminant_is_type_name() {
        assert_eq!(Rename::DISCRIMINANT.name(), "Rename");
        assert_eq!(Clear::DISCRIMINANT.to_string(), "Clear");
    }

    #[test]
    fn test_boxed_action_reports_its_discriminant() {
        let action: BoxedAction = Box::new(Rename("a".into()));
        assert_eq!(action.discriminant(), Rename::DISCRIMINANT);
        assert_ne!(action.discriminant(), Clear::DISCRIMINANT);
    }

    #[test]
    fn test_downcast_only_to_own_type() {
        let action: BoxedAction = Box::new(Rename("todo".into()));
        assert_eq!(action.downcast_ref::<Rename>(), Some(&Rename("todo".into())));
        assert!(action.downcast_ref::<Clear>().is_none());
        assert!(action.is::<Rename>());
    }

    #[test]
    fn test_downcast_through_borrowed_handler_argument() {
        let title_len = |action: &dyn AnyAction| action.downcast_ref::<Rename>().map(|rename| rename.0.len());
        let is_clear = |action: &dyn AnyAction| action.is::<Clear>();

        assert_eq!(title_len(&Rename("abc".into())), Some(3));
        assert_eq!(title_len(&Clear), None);
        assert!(is_clear(&Clear));
    }
}
