//! Behavioural tests for `SqliteBoundaryStore` using rstest-bdd.

use std::cell::RefCell;

use camino::Utf8PathBuf;
use rstest::fixture;
use rstest_bdd_macros::{given, scenario, then, when};
use ridings_core::{
    BoundaryStore, DedupKey, InsertOutcome, SqliteBoundaryStore, StoreConfig,
    test_support::record,
};
use tempfile::TempDir;

#[derive(Debug)]
struct StoreWorld {
    temp_dir: TempDir,
    config: RefCell<Option<StoreConfig>>,
    store: RefCell<Option<SqliteBoundaryStore>>,
    outcomes: RefCell<Vec<InsertOutcome>>,
}

impl StoreWorld {
    fn new() -> Self {
        Self {
            temp_dir: TempDir::new().expect("create temp dir"),
            config: RefCell::new(None),
            store: RefCell::new(None),
            outcomes: RefCell::new(Vec::new()),
        }
    }

    fn config(&self) -> StoreConfig {
        self.config
            .borrow()
            .clone()
            .expect("store config should be initialised")
    }

    fn open(&self) {
        let store = SqliteBoundaryStore::open(&self.config()).expect("open store");
        self.store.replace(Some(store));
    }

    fn insert(&self, region_name: &str, parent_region: &str) {
        let outcome = {
            let mut borrowed = self.store.borrow_mut();
            let store = borrowed.as_mut().expect("store should be open");
            store
                .insert(&record(region_name, parent_region))
                .expect("insert should not fail")
        };
        self.outcomes.borrow_mut().push(outcome);
    }

    fn with_store<T>(&self, f: impl FnOnce(&SqliteBoundaryStore) -> T) -> T {
        let borrowed = self.store.borrow();
        f(borrowed.as_ref().expect("store should be open"))
    }
}

#[fixture]
fn world() -> StoreWorld {
    StoreWorld::new()
}

#[given("an on-disk boundary store")]
fn given_store(world: &StoreWorld) {
    let path = Utf8PathBuf::from_path_buf(world.temp_dir.path().join("ridings.db"))
        .expect("temp path should be UTF-8");
    world.config.replace(Some(StoreConfig::new(path)));
    world.open();
}

#[when("the riding Test Riding in Ontario is inserted twice")]
fn when_inserted_twice(world: &StoreWorld) {
    world.insert("Test Riding", "Ontario");
    world.insert("Test Riding", "Ontario");
}

#[when("a riding is inserted and the store is reopened")]
fn when_reopened(world: &StoreWorld) {
    world.insert("Iqaluit", "Nunavut");
    world.store.replace(None);
    world.open();
}

#[then("the second insert reports a conflict")]
fn then_conflict(world: &StoreWorld) {
    let outcomes = world.outcomes.borrow();
    assert!(matches!(outcomes.first(), Some(InsertOutcome::Inserted { .. })));
    assert_eq!(outcomes.get(1), Some(&InsertOutcome::Conflict));
}

#[then("the store holds one boundary")]
fn then_one_boundary(world: &StoreWorld) {
    let count = world.with_store(|store| store.count_all().expect("count"));
    assert_eq!(count, 1);
}

#[then("the identity keys list the stored riding")]
fn then_keys(world: &StoreWorld) {
    let keys = world.with_store(|store| store.identity_keys().expect("keys"));
    assert_eq!(keys, vec![DedupKey::new("Iqaluit", "Nunavut")]);
}

#[scenario(path = "tests/features/sqlite_boundary_store.feature", index = 0)]
fn duplicate_insert_conflicts(world: StoreWorld) {
    let _ = world;
}

#[scenario(path = "tests/features/sqlite_boundary_store.feature", index = 1)]
fn boundaries_survive_reopen(world: StoreWorld) {
    let _ = world;
}
