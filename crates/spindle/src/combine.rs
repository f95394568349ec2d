//! Reducer combinators
//!
//! [`combine_reducers`] builds one aggregate state out of independently
//! defined branches. The aggregate is assembled and taken apart by an
//! [`ObjectFactory`], positionally: branch `i` owns part `i`. Each branch
//! reducer sees a scope narrowed to its own part.
//!
//! [`ReducerFactoryExt::outer`] layers a second reducer on top of an existing
//! one, and [`ReducerFactoryExt::share`] exposes a reducer's scope to code
//! outside of it.

use std::any::{type_name, Any};
use std::cell::RefCell;
use std::rc::Rc;

use crate::action::AnyAction;
use crate::error::{fail_fast, StateError};
use crate::extension::Extensions;
use crate::reducer::{create_reducer, Reducer, ReducerBuilder, ReducerFactory, RegistryReducer};
use crate::scope::StoreScope;

/// One branch's state, type-erased.
pub type Part = Box<dyn Any>;

/// Branch states handed to [`ObjectFactory::construct`], in branch order.
pub struct Parts {
    parts: Vec<Option<Part>>,
}

impl Parts {
    pub fn new(parts: Vec<Part>) -> Self {
        Self {
            parts: parts.into_iter().map(Some).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.parts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parts.is_empty()
    }

    /// Take part `index` as a `T`. A missing part or one of another type is a
    /// wiring error.
    pub fn take<T: 'static>(&mut self, index: usize) -> T {
        let len = self.parts.len();
        let Some(slot) = self.parts.get_mut(index) else {
            fail_fast(StateError::BranchOutOfRange { index, len })
        };
        let Some(part) = slot.take() else {
            fail_fast(StateError::BranchTaken { index })
        };
        downcast_part(part, index)
    }

    pub fn expect_len(&self, branches: usize) {
        if self.parts.len() != branches {
            fail_fast(StateError::BranchCountMismatch {
                parts: self.parts.len(),
                branches,
            });
        }
    }
}

fn downcast_part<T: 'static>(part: Part, index: usize) -> T {
    match part.downcast::<T>() {
        Ok(value) => *value,
        Err(_) => fail_fast(StateError::BranchTypeMismatch {
            index,
            expected: type_name::<T>(),
        }),
    }
}

/// Builds an aggregate state from its parts and takes it apart again.
///
/// `destruct(&construct(parts), i)` must equal `parts[i]`.
pub trait ObjectFactory<R> {
    fn construct(&self, parts: Parts) -> R;

    fn destruct(&self, state: &R, index: usize) -> Part;
}

/// Object factory for tuples of up to four branches.
#[derive(Debug, Clone, Copy, Default)]
pub struct Tuple;

macro_rules! tuple_object_factory {
    ($len:expr; $($index:tt => $ty:ident),+) => {
        impl<$($ty: Clone + 'static),+> ObjectFactory<($($ty,)+)> for Tuple {
            fn construct(&self, mut parts: Parts) -> ($($ty,)+) {
                parts.expect_len($len);
                ($(parts.take::<$ty>($index),)+)
            }

            fn destruct(&self, state: &($($ty,)+), index: usize) -> Part {
                match index {
                    $($index => Box::new(state.$index.clone()),)+
                    _ => fail_fast(StateError::BranchOutOfRange { index, len: $len }),
                }
            }
        }
    };
}

tuple_object_factory!(2; 0 => A, 1 => B);
tuple_object_factory!(3; 0 => A, 1 => B, 2 => C);
tuple_object_factory!(4; 0 => A, 1 => B, 2 => C, 3 => D);

/// A branch as seen by an interceptor.
#[derive(Clone, Copy)]
pub struct BranchState<'a> {
    pub index: usize,
    pub state: &'a dyn Any,
}

impl<'a> BranchState<'a> {
    pub fn downcast_ref<T: 'static>(&self) -> Option<&'a T> {
        self.state.downcast_ref::<T>()
    }
}

type Interceptor<R> = Rc<dyn Fn(&R, BranchState<'_>, &dyn AnyAction) -> bool>;

type BranchReducer = Box<dyn Fn(Part, &dyn AnyAction) -> Part>;

type CreateBranch<R> = Box<dyn Fn(usize, &StoreScope<R>, &Rc<dyn ObjectFactory<R>>, &Extensions) -> BranchReducer>;

/// A reducer factory prepared for use as a branch of `R`.
pub struct Branch<R> {
    initial_state: Box<dyn Fn() -> Part>,
    create: CreateBranch<R>,
}

/// Wrap `factory` as a branch of aggregate state `R`.
pub fn branch<R, T, F>(factory: F) -> Branch<R>
where
    R: 'static,
    T: Clone + 'static,
    F: ReducerFactory<T> + 'static,
{
    let factory = Rc::new(factory);
    let initial = Rc::clone(&factory);
    Branch {
        initial_state: Box::new(move || -> Part { Box::new(initial.initial_state()) }),
        create: Box::new(
            move |index: usize,
                  scope: &StoreScope<R>,
                  objects: &Rc<dyn ObjectFactory<R>>,
                  extensions: &Extensions|
                  -> BranchReducer {
                let objects = Rc::clone(objects);
                let branch_scope =
                    scope.downscope(move |state: R| downcast_part::<T>(objects.destruct(&state, index), index));
                let reducer = factory.create(branch_scope, extensions);
                Box::new(move |part: Part, action: &dyn AnyAction| -> Part {
                    Box::new(reducer.reduce(downcast_part::<T>(part, index), action))
                })
            },
        ),
    }
}

/// Factory returned by [`combine_reducers`].
pub struct CombinedReducer<R> {
    objects: Rc<dyn ObjectFactory<R>>,
    branches: Vec<Branch<R>>,
    interceptor: Option<Interceptor<R>>,
}

/// Combine `branches` into one reducer over `R`.
///
/// For every action each branch part is taken out of the aggregate, reduced by
/// its own reducer unless the interceptor says to skip it, and the aggregate is
/// rebuilt from the results.
///
/// Branch `i` must hold the type the object factory stores at index `i`. A
/// mismatch fails fast the first time the initial state is built.
pub fn combine_reducers<R, O>(objects: O, branches: Vec<Branch<R>>) -> CombinedReducer<R>
where
    R: 'static,
    O: ObjectFactory<R> + 'static,
{
    CombinedReducer {
        objects: Rc::new(objects),
        branches,
        interceptor: None,
    }
}

impl<R: 'static> CombinedReducer<R> {
    /// Skip reducing a branch whenever `interceptor` returns true.
    ///
    /// Receives the aggregate state, the branch and the action. Only one
    /// interceptor is kept; setting another replaces it.
    pub fn intercept(
        mut self,
        interceptor: impl Fn(&R, BranchState<'_>, &dyn AnyAction) -> bool + 'static,
    ) -> Self {
        self.interceptor = Some(Rc::new(interceptor));
        self
    }

    pub fn branch_count(&self) -> usize {
        self.branches.len()
    }
}

impl<R: 'static> CombinedReducer<R> {
    /// Create the reducer with an extra interceptor on top of the one set by
    /// [`intercept`](Self::intercept). A branch is skipped when either says so.
    pub fn create_intercepted(
        &self,
        scope: StoreScope<R>,
        extensions: &Extensions,
        extra: impl Fn(&R, BranchState<'_>, &dyn AnyAction) -> bool + 'static,
    ) -> Reducer<R> {
        let extra: Interceptor<R> = Rc::new(extra);
        self.build(scope, extensions, Some(extra))
    }

    fn build(&self, scope: StoreScope<R>, extensions: &Extensions, extra: Option<Interceptor<R>>) -> Reducer<R> {
        let reducers: Vec<BranchReducer> = self
            .branches
            .iter()
            .enumerate()
            .map(|(index, branch)| (branch.create)(index, &scope, &self.objects, extensions))
            .collect();
        let objects = Rc::clone(&self.objects);
        let interceptors: Vec<Interceptor<R>> = self.interceptor.iter().cloned().chain(extra).collect();

        Reducer::new(move |state: R, action: &dyn AnyAction| {
            let parts = reducers
                .iter()
                .enumerate()
                .map(|(index, reduce)| {
                    let part = objects.destruct(&state, index);
                    let skip = interceptors
                        .iter()
                        .any(|intercept| intercept(&state, BranchState { index, state: &*part }, action));
                    if skip {
                        part
                    } else {
                        reduce(part, action)
                    }
                })
                .collect();
            objects.construct(Parts::new(parts))
        })
    }
}

impl<R: 'static> ReducerFactory<R> for CombinedReducer<R> {
    fn initial_state(&self) -> R {
        let parts = self.branches.iter().map(|branch| (branch.initial_state)()).collect();
        self.objects.construct(Parts::new(parts))
    }

    fn create(&self, scope: StoreScope<R>, extensions: &Extensions) -> Reducer<R> {
        self.build(scope, extensions, None)
    }
}

/// Factory returned by [`ReducerFactoryExt::outer`].
pub struct Outer<S, F> {
    inner: F,
    outer: RegistryReducer<S>,
}

impl<S: Clone + 'static, F: ReducerFactory<S>> ReducerFactory<S> for Outer<S, F> {
    fn initial_state(&self) -> S {
        self.inner.initial_state()
    }

    fn create(&self, scope: StoreScope<S>, extensions: &Extensions) -> Reducer<S> {
        let inner = self.inner.create(scope.clone(), extensions);
        let outer = self.outer.create(scope, extensions);
        Reducer::new(move |state: S, action: &dyn AnyAction| outer.reduce(inner.reduce(state, action), action))
    }
}

/// Read access to the scope of a [`shared`](ReducerFactoryExt::share) reducer.
///
/// There is one slot per `share()` call and every `create` overwrites it, so
/// the handle follows the reducer created most recently. A shared factory
/// must back a single store.
pub struct SharedState<S> {
    scope: Rc<RefCell<Option<StoreScope<S>>>>,
}

impl<S: 'static> SharedState<S> {
    /// `None` until the shared reducer has been created.
    pub fn try_get_state(&self) -> Option<S> {
        let scope = self.scope.borrow().clone();
        scope.map(|scope| scope.get_state())
    }

    pub fn get_state(&self) -> S {
        match self.try_get_state() {
            Some(state) => state,
            None => fail_fast(StateError::SharedStateUnavailable),
        }
    }
}

impl<S> Clone for SharedState<S> {
    fn clone(&self) -> Self {
        Self {
            scope: Rc::clone(&self.scope),
        }
    }
}

/// Factory returned by [`ReducerFactoryExt::share`].
pub struct Shared<S, F> {
    inner: F,
    scope: Rc<RefCell<Option<StoreScope<S>>>>,
}

impl<S: 'static, F: ReducerFactory<S>> ReducerFactory<S> for Shared<S, F> {
    fn initial_state(&self) -> S {
        self.inner.initial_state()
    }

    fn create(&self, scope: StoreScope<S>, extensions: &Extensions) -> Reducer<S> {
        *self.scope.borrow_mut() = Some(scope.clone());
        self.inner.create(scope, extensions)
    }
}

pub trait ReducerFactoryExt<S: Clone + 'static>: ReducerFactory<S> + Sized {
    /// Run `build`'s handlers after this reducer, on its result.
    fn outer<B>(self, build: B) -> Outer<S, Self>
    where
        B: Fn(&mut ReducerBuilder<S>) + 'static,
    {
        let outer = create_reducer(self.initial_state(), build);
        Outer { inner: self, outer }
    }

    /// Expose this reducer's scope through the returned [`SharedState`].
    ///
    /// The handle reads whichever reducer this factory created last.
    fn share(self) -> (Shared<S, Self>, SharedState<S>) {
        let scope = Rc::new(RefCell::new(None));
        let state = SharedState {
            scope: Rc::clone(&scope),
        };
        (Shared { inner: self, scope }, state)
    }
}

impl<S: Clone + 'static, F: ReducerFactory<S>> ReducerFactoryExt<S> for F {}
