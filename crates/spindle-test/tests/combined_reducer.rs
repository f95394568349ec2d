use pretty_assertions::assert_eq;
use spindle::error::{fail_fast, StateError};
use spindle::{
    branch, combine_reducers, create_reducer, CombinedReducer, ObjectFactory, Part, Parts, ReducerFactoryExt,
    RegistryReducer, Store,
};
use spindle_test::{ReducerTest, TestScheduler};

#[derive(Debug, Clone, PartialEq)]
struct Dashboard {
    unread: u32,
    filter: String,
    total_clicks: u32,
}

struct DashboardFactory;

impl ObjectFactory<Dashboard> for DashboardFactory {
    fn construct(&self, mut parts: Parts) -> Dashboard {
        parts.expect_len(2);
        Dashboard {
            unread: parts.take(0),
            filter: parts.take(1),
            total_clicks: 0,
        }
    }

    fn destruct(&self, state: &Dashboard, index: usize) -> Part {
        match index {
            0 => Box::new(state.unread),
            1 => Box::new(state.filter.clone()),
            _ => fail_fast(StateError::BranchOutOfRange { index, len: 2 }),
        }
    }
}

#[derive(Debug)]
struct MessageArrived;

#[derive(Debug)]
struct SetFilter(&'static str);

#[derive(Debug)]
struct SyncInbox;

spindle::action!(MessageArrived, SetFilter, SyncInbox);

fn unread() -> RegistryReducer<u32> {
    create_reducer(0u32, |builder| {
        builder.on::<MessageArrived>(|r, _, _| r.update(|n: u32| n + 1));
        builder.on::<SyncInbox>(|r, _, _| {
            r.thunk(|ctx| async move {
                ctx.register(|n: u32| n + 100);
            });
        });
    })
}

fn filter() -> RegistryReducer<String> {
    create_reducer(String::from("all"), |builder| {
        builder.on::<SetFilter>(|r, _, filter| {
            let filter = filter.0;
            r.update(move |_| filter.to_string());
        });
    })
}

fn dashboard() -> CombinedReducer<Dashboard> {
    combine_reducers(DashboardFactory, vec![branch(unread()), branch(filter())])
}

#[test]
fn test_initial_state_is_constructed_from_branches() {
    let test = ReducerTest::new(dashboard());
    test.assert_initial_state(Dashboard {
        unread: 0,
        filter: "all".to_string(),
        total_clicks: 0,
    });
}

#[test]
fn test_branches_reduce_their_own_parts() {
    let mut test = ReducerTest::new(dashboard());
    test.reduce(MessageArrived);
    test.reduce(MessageArrived);
    let state = test.reduce(SetFilter("unread"));

    assert_eq!(state.unread, 2);
    assert_eq!(state.filter, "unread");
}

#[test]
fn test_outer_sees_combined_result() {
    let factory = dashboard().outer(|builder| {
        builder.on::<MessageArrived>(|r, _, _| {
            r.update(|mut state: Dashboard| {
                state.total_clicks = state.unread * 10;
                state
            });
        });
    });
    let mut test = ReducerTest::new(factory);

    test.reduce(MessageArrived);
    let state = test.reduce(MessageArrived);
    assert_eq!(state.total_clicks, 20);
}

#[test]
fn test_interceptor_freezes_filter() {
    let factory = dashboard().intercept(|state: &Dashboard, branch, _| branch.index == 1 && state.unread > 0);
    let mut test = ReducerTest::new(factory);

    test.reduce(SetFilter("first"));
    test.reduce(MessageArrived);
    let state = test.reduce(SetFilter("second"));

    assert_eq!(state.filter, "first");
    assert_eq!(state.unread, 1);
}

#[test]
fn test_thunk_update_in_branch_applies_once() {
    let mut scheduler = TestScheduler::new();
    let factory = dashboard().outer(|builder| {
        builder.on::<MessageArrived>(|r, _, _| r.update(|state: Dashboard| state));
    });
    let store = Store::builder(factory).extension(scheduler.thunk_extension()).build();

    store.dispatch(SyncInbox);
    scheduler.run_until_stalled();
    store.dispatch(SyncInbox);
    scheduler.run_until_stalled();

    assert_eq!(store.get_state().unread, 200);
}
