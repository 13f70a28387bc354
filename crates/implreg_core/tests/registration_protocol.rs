use implreg_core::{
    BufferPolicy, Channel, Contributor, Delivery, Implementor, ImplementorMap, LibraryIndex,
    MergeHandler, Registry, RegistryState, StaticContributor,
};
use std::sync::{Arc, Mutex};

fn lib(name: &str, entry: &str) -> ImplementorMap {
    ImplementorMap::new().with_library(name, vec![Implementor::new(entry)])
}

fn contributor(source: &str, map: ImplementorMap) -> StaticContributor<Implementor> {
    StaticContributor::new(source, map)
}

type Calls = Arc<Mutex<Vec<ImplementorMap>>>;

fn recording_handler() -> (Calls, Arc<dyn MergeHandler<Implementor>>) {
    let calls: Calls = Arc::default();
    let sink = Arc::clone(&calls);
    let handler: Arc<dyn MergeHandler<Implementor>> = Arc::new(move |map: ImplementorMap| {
        sink.lock().expect("calls lock").push(map);
    });
    (calls, handler)
}

#[test]
fn contributor_before_consumer_is_drained_on_install() {
    let mut registry = Registry::with_policy(Channel::Implementors, BufferPolicy::SingleSlot);
    contributor("a.js", lib("lib1", "X")).contribute(&mut registry);

    let (calls, handler) = recording_handler();
    registry.install(handler);

    assert_eq!(*calls.lock().unwrap(), vec![lib("lib1", "X")]);
}

#[test]
fn single_slot_loses_first_of_two_early_contributors() {
    let mut registry = Registry::with_policy(Channel::Implementors, BufferPolicy::SingleSlot);
    contributor("a.js", lib("lib1", "X")).contribute(&mut registry);
    let delivery = contributor("b.js", lib("lib2", "Y")).contribute(&mut registry);
    assert_eq!(delivery, Delivery::Replaced);

    let (calls, handler) = recording_handler();
    registry.install(handler);

    assert_eq!(*calls.lock().unwrap(), vec![lib("lib2", "Y")]);
    assert_eq!(registry.discarded(), 1);
}

#[test]
fn queue_keeps_both_early_contributors() {
    let mut registry = Registry::new(Channel::Implementors);
    contributor("a.js", lib("lib1", "X")).contribute(&mut registry);
    contributor("b.js", lib("lib2", "Y")).contribute(&mut registry);

    let (index, report) = LibraryIndex::attach(&mut registry);

    assert_eq!(report.drained, 2);
    assert_eq!(index.libraries(), ["lib1", "lib2"]);
    assert_eq!(index.merge_count(), 2);
}

#[test]
fn consumer_first_then_contributor_dispatches_immediately() {
    let mut registry = Registry::new(Channel::Implementors);
    let (calls, handler) = recording_handler();
    registry.install(handler);
    assert_eq!(registry.state(), RegistryState::Active);

    let delivery = contributor("a.js", lib("lib1", "X")).contribute(&mut registry);

    assert_eq!(delivery, Delivery::Dispatched);
    assert_eq!(*calls.lock().unwrap(), vec![lib("lib1", "X")]);
    assert_eq!(registry.pending_len(), 0);
}

#[test]
fn reinstalling_never_redelivers_drained_maps() {
    for policy in [BufferPolicy::Queue, BufferPolicy::SingleSlot] {
        let mut registry = Registry::with_policy(Channel::Implementors, policy);
        contributor("a.js", lib("lib1", "X")).contribute(&mut registry);

        let (calls, handler) = recording_handler();
        registry.install(Arc::clone(&handler));
        let report = registry.install(handler);

        assert_eq!(report.drained, 0, "policy {policy}");
        assert_eq!(calls.lock().unwrap().len(), 1, "policy {policy}");
    }
}

#[test]
fn state_machine_walks_uninitialized_buffering_active() {
    let mut registry = Registry::new(Channel::Implementors);
    assert_eq!(registry.state(), RegistryState::Uninitialized);

    registry.register(lib("lib1", "X"));
    assert_eq!(registry.state(), RegistryState::Buffering);
    registry.register(lib("lib2", "Y"));
    assert_eq!(registry.state(), RegistryState::Buffering);

    let (_index, _report) = LibraryIndex::attach(&mut registry);
    assert_eq!(registry.state(), RegistryState::Active);
    registry.register(lib("lib3", "Z"));
    assert_eq!(registry.state(), RegistryState::Active);

    let stats = registry.stats();
    assert_eq!(stats.buffered, 2);
    assert_eq!(stats.drained, 2);
    assert_eq!(stats.dispatched, 1);
}
