//! Routed pages
//!
//! A page state pairs some content with the route currently shown. The content
//! is a combined state with one branch per page; only the branch the router
//! selects for the current route reduces actions, every other branch is left
//! exactly as it was.
//!
//! Pages are told apart by enum variant. [`GoTo`] moves to another variant
//! with [`ChangePage`], or refreshes the data of the current one with
//! [`UpdatePage`]. Work started on a page can dispatch through a
//! [`PageDispatch`], which drops the action once that page is no longer shown.

use std::fmt;
use std::mem;
use std::rc::Rc;

use crate::action::{Action, AnyAction, Discriminant};
use crate::combine::{BranchState, CombinedReducer};
use crate::dispatcher::Dispatcher;
use crate::extension::Extensions;
use crate::reducer::{create_reducer, Reducer, ReducerFactory, RegistryReducer};
use crate::scope::StoreScope;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteContainer<R> {
    pub route: R,
}

/// Replace the current route.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateRoute<R> {
    pub route: R,
}

impl<R: fmt::Debug + 'static> Action for UpdateRoute<R> {
    const DISCRIMINANT: Discriminant = Discriminant::new("UpdateRoute");
}

pub fn navigate<R>(route: R) -> UpdateRoute<R> {
    UpdateRoute { route }
}

/// Show `route`: [`ChangePage`] when it is another page than the current
/// one, [`UpdatePage`] otherwise.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GoTo<R> {
    pub route: R,
}

impl<R: fmt::Debug + 'static> Action for GoTo<R> {
    const DISCRIMINANT: Discriminant = Discriminant::new("GoTo");
}

pub fn go_to<R>(route: R) -> GoTo<R> {
    GoTo { route }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangePage<R> {
    pub previous: R,
    pub new_page: R,
}

impl<R: fmt::Debug + 'static> Action for ChangePage<R> {
    const DISCRIMINANT: Discriminant = Discriminant::new("ChangePage");
}

/// New data for the current page. Ignored when the current route is another
/// page by the time it is reduced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdatePage<R> {
    pub route: R,
}

impl<R: fmt::Debug + 'static> Action for UpdatePage<R> {
    const DISCRIMINANT: Discriminant = Discriminant::new("UpdatePage");
}

fn same_page<R>(a: &R, b: &R) -> bool {
    mem::discriminant(a) == mem::discriminant(b)
}

#[derive(Debug, Clone, PartialEq)]
pub struct Page<C, R> {
    pub content: C,
    pub route_container: RouteContainer<R>,
}

impl<C, R> Page<C, R> {
    pub fn route(&self) -> &R {
        &self.route_container.route
    }
}

/// Picks the content branch that is active for a route.
pub trait Router<R, C> {
    /// Index of the active branch of `content`.
    fn route(&self, route: &R, content: &C) -> usize;
}

impl<R, C, F> Router<R, C> for F
where
    F: Fn(&R, &C) -> usize,
{
    fn route(&self, route: &R, content: &C) -> usize {
        self(route, content)
    }
}

pub fn route_container_reducer<R>(initial_route: R) -> RegistryReducer<RouteContainer<R>>
where
    R: Clone + fmt::Debug + 'static,
{
    create_reducer(RouteContainer { route: initial_route }, |builder| {
        builder.on::<UpdateRoute<R>>(|r, _, update| {
            let route = update.route.clone();
            r.update(move |_| RouteContainer { route: route.clone() });
        });

        let scope = builder.scope().clone();
        builder.on::<GoTo<R>>(move |_, current, go_to| {
            let route = go_to.route.clone();
            if same_page(&current.route, &route) {
                scope.dispatch(UpdatePage { route });
            } else {
                scope.dispatch(ChangePage {
                    previous: current.route,
                    new_page: route,
                });
            }
        });

        builder.on::<ChangePage<R>>(|r, _, change| {
            let route = change.new_page.clone();
            r.update(move |_| RouteContainer { route: route.clone() });
        });

        builder.on::<UpdatePage<R>>(|r, _, update| {
            let route = update.route.clone();
            r.update(move |container| {
                if same_page(&container.route, &route) {
                    RouteContainer { route: route.clone() }
                } else {
                    container
                }
            });
        });
    })
}

/// The route of one page store, handed to the content builder of
/// [`create_page_reducer_with`].
pub struct PageRoutes<R> {
    scope: StoreScope<RouteContainer<R>>,
}

impl<R: Clone + fmt::Debug + 'static> PageRoutes<R> {
    fn unbound(route: R) -> Self {
        Self {
            scope: StoreScope::new(Dispatcher::detached(), move || RouteContainer { route: route.clone() }),
        }
    }

    /// The last committed route.
    pub fn current(&self) -> R {
        self.scope.get_state().route
    }

    /// Run `block` when the current route is the page `page` picks out.
    ///
    /// `page` returns the page's data for a route of that page and `None` for
    /// any other route.
    pub fn with_page_content<PC>(
        &self,
        page: impl Fn(&R) -> Option<PC> + 'static,
        block: impl FnOnce(PageDispatch<R, PC>),
    ) {
        let dispatch = PageDispatch {
            scope: self.scope.clone(),
            page: Rc::new(page),
        };
        if dispatch.is_current() {
            block(dispatch);
        }
    }

    /// Like [`with_page_content`](Self::with_page_content), also passing the
    /// page's current data.
    pub fn with_page_context<PC>(
        &self,
        page: impl Fn(&R) -> Option<PC> + 'static,
        block: impl FnOnce(&PageDispatch<R, PC>, PC),
    ) {
        self.with_page_content(page, |dispatch| {
            if let Some(content) = dispatch.page_state() {
                block(&dispatch, content);
            }
        });
    }
}

impl<R> Clone for PageRoutes<R> {
    fn clone(&self) -> Self {
        Self {
            scope: self.scope.clone(),
        }
    }
}

/// Dispatches on behalf of one page, only while that page is shown.
pub struct PageDispatch<R, PC> {
    scope: StoreScope<RouteContainer<R>>,
    page: Rc<dyn Fn(&R) -> Option<PC>>,
}

impl<R: Clone + fmt::Debug + 'static, PC> PageDispatch<R, PC> {
    pub fn is_current(&self) -> bool {
        self.page_state().is_some()
    }

    /// Data of the page, `None` once another page is shown.
    pub fn page_state(&self) -> Option<PC> {
        (self.page)(&self.scope.get_state().route)
    }

    /// Dispatch `action` if the page is still shown. Returns whether it was
    /// dispatched.
    pub fn page_dispatch<A: Action>(&self, action: A) -> bool {
        if !self.is_current() {
            log::debug!("Page left, dropping {:?}", action);
            return false;
        }
        self.scope.dispatch(action);
        true
    }
}

impl<R, PC> Clone for PageDispatch<R, PC> {
    fn clone(&self) -> Self {
        Self {
            scope: self.scope.clone(),
            page: Rc::clone(&self.page),
        }
    }
}

type BuildContent<C, R> = Box<dyn Fn(&PageRoutes<R>) -> Rc<CombinedReducer<C>>>;

/// Factory returned by [`create_page_reducer`] and
/// [`create_page_reducer_with`].
///
/// Every reducer it creates reads the route from its own store, so one
/// factory can back several stores.
pub struct PageReducer<C, R> {
    initial_route: R,
    router: Rc<dyn Router<R, C>>,
    content: BuildContent<C, R>,
}

/// Combine `content` with a route so that only the page selected by `router`
/// reduces actions.
pub fn create_page_reducer<R, C>(
    initial_route: R,
    router: impl Router<R, C> + 'static,
    content: CombinedReducer<C>,
) -> PageReducer<C, R>
where
    R: Clone + fmt::Debug + 'static,
    C: Clone + 'static,
{
    let content = Rc::new(content);
    PageReducer {
        initial_route,
        router: Rc::new(router),
        content: Box::new(move |_: &PageRoutes<R>| Rc::clone(&content)),
    }
}

/// Like [`create_page_reducer`], building the content with access to the
/// store's route.
///
/// `build_content` runs once per created reducer, and once more for the
/// initial state with a route that never changes and dispatches nowhere.
pub fn create_page_reducer_with<R, C>(
    initial_route: R,
    router: impl Router<R, C> + 'static,
    build_content: impl Fn(&PageRoutes<R>) -> CombinedReducer<C> + 'static,
) -> PageReducer<C, R>
where
    R: Clone + fmt::Debug + 'static,
    C: Clone + 'static,
{
    PageReducer {
        initial_route,
        router: Rc::new(router),
        content: Box::new(move |routes: &PageRoutes<R>| Rc::new(build_content(routes))),
    }
}

impl<C, R> ReducerFactory<Page<C, R>> for PageReducer<C, R>
where
    C: Clone + 'static,
    R: Clone + fmt::Debug + 'static,
{
    fn initial_state(&self) -> Page<C, R> {
        let routes = PageRoutes::unbound(self.initial_route.clone());
        Page {
            content: (self.content)(&routes).initial_state(),
            route_container: RouteContainer {
                route: self.initial_route.clone(),
            },
        }
    }

    fn create(&self, scope: StoreScope<Page<C, R>>, extensions: &Extensions) -> Reducer<Page<C, R>> {
        let route_scope = scope.downscope(|page: Page<C, R>| page.route_container);
        let routes = route_container_reducer(self.initial_route.clone()).create(route_scope.clone(), extensions);

        let router = Rc::clone(&self.router);
        let current = route_scope.clone();
        let content = (self.content)(&PageRoutes { scope: route_scope }).create_intercepted(
            scope.downscope(|page: Page<C, R>| page.content),
            extensions,
            move |content: &C, branch: BranchState<'_>, _: &dyn AnyAction| {
                router.route(&current.get_state().route, content) != branch.index
            },
        );

        Reducer::new(move |page: Page<C, R>, action: &dyn AnyAction| Page {
            content: content.reduce(page.content, action),
            route_container: routes.reduce(page.route_container, action),
        })
    }
}

/// Scope over the content of a page store.
pub fn content_scope<C, R>(scope: &StoreScope<Page<C, R>>) -> StoreScope<C>
where
    C: 'static,
    R: 'static,
{
    scope.downscope(|page| page.content)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::BoxedAction;
    use crate::combine::{branch, combine_reducers, Tuple};
    use pretty_assertions::assert_eq;
    use std::cell::RefCell;

    #[derive(Debug, Clone, Copy, PartialEq)]
    enum Route {
        Inbox,
        Settings,
    }

    #[derive(Debug, Clone, PartialEq)]
    enum Screen {
        Inbox { unread: u32 },
        Thread { id: u32 },
    }

    #[derive(Debug)]
    struct Refresh;

    crate::action!(Refresh);

    fn refreshing() -> RegistryReducer<u32> {
        create_reducer(0u32, |builder| {
            builder.on::<Refresh>(|r, _, _| r.update(|n| n + 1));
        })
    }

    fn content() -> CombinedReducer<(u32, u32)> {
        combine_reducers(Tuple, vec![branch(refreshing()), branch(refreshing())])
    }

    fn router(route: &Route, _: &(u32, u32)) -> usize {
        match route {
            Route::Inbox => 0,
            Route::Settings => 1,
        }
    }

    fn thread_id(screen: &Screen) -> Option<u32> {
        match screen {
            Screen::Thread { id } => Some(*id),
            Screen::Inbox { .. } => None,
        }
    }

    type Recorded = Rc<RefCell<Vec<BoxedAction>>>;

    fn recording_scope(route: Rc<RefCell<Screen>>) -> (StoreScope<RouteContainer<Screen>>, Recorded) {
        let recorded: Recorded = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&recorded);
        let scope = StoreScope::new(Dispatcher::new(move |action| sink.borrow_mut().push(action)), move || {
            RouteContainer {
                route: route.borrow().clone(),
            }
        });
        (scope, recorded)
    }

    fn debug_of(recorded: &Recorded) -> Vec<String> {
        recorded.borrow().iter().map(|action| format!("{:?}", action)).collect()
    }

    #[test]
    fn test_route_container_updates_route() {
        let factory = route_container_reducer(Route::Inbox);
        let reducer = factory.create(
            StoreScope::new(Dispatcher::detached(), || RouteContainer { route: Route::Inbox }),
            &Extensions::none(),
        );
        let state = reducer.reduce(factory.initial_state(), &navigate(Route::Settings));
        assert_eq!(state.route, Route::Settings);
    }

    #[test]
    fn test_go_to_picks_change_or_update() {
        let route = Rc::new(RefCell::new(Screen::Inbox { unread: 2 }));
        let (scope, recorded) = recording_scope(Rc::clone(&route));
        let factory = route_container_reducer(Screen::Inbox { unread: 2 });
        let reducer = factory.create(scope, &Extensions::none());

        let state = reducer.reduce(factory.initial_state(), &go_to(Screen::Inbox { unread: 0 }));
        // GoTo only dispatches.
        assert_eq!(state.route, Screen::Inbox { unread: 2 });
        reducer.reduce(state, &go_to(Screen::Thread { id: 4 }));

        assert_eq!(
            debug_of(&recorded),
            vec![
                format!("{:?}", UpdatePage { route: Screen::Inbox { unread: 0 } }),
                format!(
                    "{:?}",
                    ChangePage {
                        previous: Screen::Inbox { unread: 2 },
                        new_page: Screen::Thread { id: 4 },
                    }
                ),
            ]
        );
    }

    #[test]
    fn test_update_page_of_other_variant_is_ignored() {
        let factory = route_container_reducer(Screen::Thread { id: 1 });
        let reducer = factory.create(
            StoreScope::new(Dispatcher::detached(), || RouteContainer {
                route: Screen::Thread { id: 1 },
            }),
            &Extensions::none(),
        );

        let state = reducer.reduce(factory.initial_state(), &UpdatePage { route: Screen::Inbox { unread: 5 } });
        assert_eq!(state.route, Screen::Thread { id: 1 });

        let state = reducer.reduce(state, &UpdatePage { route: Screen::Thread { id: 9 } });
        assert_eq!(state.route, Screen::Thread { id: 9 });

        let state = reducer.reduce(
            state,
            &ChangePage {
                previous: Screen::Thread { id: 9 },
                new_page: Screen::Inbox { unread: 0 },
            },
        );
        assert_eq!(state.route, Screen::Inbox { unread: 0 });
    }

    #[test]
    fn test_page_dispatch_only_while_page_is_shown() {
        let route = Rc::new(RefCell::new(Screen::Thread { id: 3 }));
        let (scope, recorded) = recording_scope(Rc::clone(&route));
        let routes = PageRoutes { scope };

        let mut seen = None;
        routes.with_page_context(thread_id, |page, id| {
            seen = Some(id);
            assert!(page.page_dispatch(Refresh));
            *route.borrow_mut() = Screen::Inbox { unread: 0 };
            assert!(!page.page_dispatch(Refresh));
            assert_eq!(page.page_state(), None);
        });

        assert_eq!(seen, Some(3));
        assert_eq!(debug_of(&recorded), vec![String::from("Refresh")]);
    }

    #[test]
    fn test_with_page_content_skips_other_page() {
        let route = Rc::new(RefCell::new(Screen::Inbox { unread: 1 }));
        let (scope, _) = recording_scope(route);
        let routes = PageRoutes { scope };

        let mut ran = false;
        routes.with_page_content(thread_id, |_| ran = true);
        assert!(!ran);
        assert_eq!(routes.current(), Screen::Inbox { unread: 1 });
    }

    #[test]
    fn test_initial_page_state() {
        let factory = create_page_reducer(Route::Inbox, router, content());
        assert_eq!(
            factory.initial_state(),
            Page {
                content: (0, 0),
                route_container: RouteContainer { route: Route::Inbox },
            }
        );
    }

    #[test]
    fn test_only_routed_page_reduces() {
        let factory = create_page_reducer(Route::Settings, router, content());
        let committed = factory.initial_state();
        let reducer = factory.create(
            StoreScope::new(Dispatcher::detached(), move || committed.clone()),
            &Extensions::none(),
        );

        let state = reducer.reduce(factory.initial_state(), &Refresh);
        assert_eq!(state.content, (0, 1));
        assert_eq!(state.route(), &Route::Settings);
    }

    #[test]
    fn test_content_builder_sees_unbound_route_for_initial_state() {
        let factory = create_page_reducer_with(Route::Settings, router, |routes: &PageRoutes<Route>| {
            assert_eq!(routes.current(), Route::Settings);
            content()
        });
        assert_eq!(factory.initial_state().content, (0, 0));
    }
}
