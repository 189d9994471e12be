//! Optimistic compare-and-swap flows across units of work.
//!
//! Two logical units of work race on the same record; the loser's pre-image
//! goes stale and its write must come back `StaleState` without touching the
//! store.

use gridmap::{
    CasOutcome, CollectingDialect, EntityKey, EntityKeyMetadata, GridDialect, MemoryDialect,
    OperationKind, OptimisticLockingDialect, OptionsContainer, Tuple, TupleContext, TupleSnapshot,
    Value,
};

fn account_key(id: i64) -> EntityKey {
    EntityKey::new(EntityKeyMetadata::new("Account", ["id"]), vec![Value::Int(id)])
}

fn account_tuple(id: i64, balance: i64, version: i64) -> Tuple {
    let mut tuple = Tuple::new();
    tuple.put("id", id);
    tuple.put("balance", balance);
    tuple.put("version", version);
    tuple
}

/// Reads the record the way a unit of work would, keeping the snapshot as
/// the CAS pre-image.
fn read_pre_image(dialect: &MemoryDialect, key: &EntityKey, ctx: &TupleContext<'_>) -> TupleSnapshot {
    dialect
        .get_tuple(key, ctx)
        .expect("read works")
        .expect("record exists")
        .snapshot()
        .clone()
}

#[test]
fn concurrent_updates_race_and_the_loser_sees_stale_state() {
    let options = OptionsContainer::empty();
    let ctx = TupleContext::new(&options);
    let mut dialect = MemoryDialect::new();

    dialect
        .insert_or_update_tuple(&account_key(1), &account_tuple(1, 100, 1), &ctx)
        .expect("seed");

    // Both units of work read the same state.
    let uow_a_pre_image = read_pre_image(&dialect, &account_key(1), &ctx);
    let uow_b_pre_image = read_pre_image(&dialect, &account_key(1), &ctx);

    // A commits first, bumping balance and version.
    let mut a_write = Tuple::new();
    a_write.put("balance", 150i64);
    a_write.put("version", 2i64);
    let outcome = dialect
        .update_tuple_with_optimistic_lock(&account_key(1), &uow_a_pre_image, &a_write, &ctx)
        .expect("no store error");
    assert_eq!(outcome, CasOutcome::Applied);

    // B's pre-image is now stale; the write must not apply.
    let mut b_write = Tuple::new();
    b_write.put("balance", 90i64);
    b_write.put("version", 2i64);
    let outcome = dialect
        .update_tuple_with_optimistic_lock(&account_key(1), &uow_b_pre_image, &b_write, &ctx)
        .expect("no store error");
    assert_eq!(outcome, CasOutcome::StaleState);

    let stored = dialect.get_tuple(&account_key(1), &ctx).expect("read works").expect("stored");
    assert_eq!(stored.get("balance"), Some(&Value::Int(150)));
    assert_eq!(stored.get("version"), Some(&Value::Int(2)));
}

#[test]
fn retry_after_stale_state_succeeds_with_a_fresh_pre_image() {
    let options = OptionsContainer::empty();
    let ctx = TupleContext::new(&options);
    let mut dialect = MemoryDialect::new();

    dialect
        .insert_or_update_tuple(&account_key(1), &account_tuple(1, 100, 1), &ctx)
        .expect("seed");

    let stale = TupleSnapshot::from_iter([
        ("id", Value::Int(1)),
        ("balance", Value::Int(42)),
        ("version", Value::Int(0)),
    ]);
    let mut write = Tuple::new();
    write.put("balance", 90i64);

    // First attempt loses; the retry re-reads and wins.
    assert_eq!(
        dialect
            .update_tuple_with_optimistic_lock(&account_key(1), &stale, &write, &ctx)
            .expect("no store error"),
        CasOutcome::StaleState
    );

    let fresh = read_pre_image(&dialect, &account_key(1), &ctx);
    assert_eq!(
        dialect
            .update_tuple_with_optimistic_lock(&account_key(1), &fresh, &write, &ctx)
            .expect("no store error"),
        CasOutcome::Applied
    );
}

#[test]
fn optimistic_remove_only_deletes_the_observed_state() {
    let options = OptionsContainer::empty();
    let ctx = TupleContext::new(&options);
    let mut dialect = MemoryDialect::new();

    dialect
        .insert_or_update_tuple(&account_key(1), &account_tuple(1, 100, 1), &ctx)
        .expect("seed");
    let pre_image = read_pre_image(&dialect, &account_key(1), &ctx);

    // A concurrent bump invalidates the observed state.
    let mut bump = Tuple::new();
    bump.put("version", 2i64);
    dialect.insert_or_update_tuple(&account_key(1), &bump, &ctx).expect("concurrent write");

    assert_eq!(
        dialect
            .remove_tuple_with_optimistic_lock(&account_key(1), &pre_image, &ctx)
            .expect("no store error"),
        CasOutcome::StaleState
    );
    assert!(dialect.get_tuple(&account_key(1), &ctx).expect("read works").is_some());

    let fresh = read_pre_image(&dialect, &account_key(1), &ctx);
    assert_eq!(
        dialect
            .remove_tuple_with_optimistic_lock(&account_key(1), &fresh, &ctx)
            .expect("no store error"),
        CasOutcome::Applied
    );
    assert!(dialect.get_tuple(&account_key(1), &ctx).expect("read works").is_none());
}

#[test]
fn collector_files_attempts_by_outcome_with_pre_images() {
    let options = OptionsContainer::empty();
    let ctx = TupleContext::new(&options);
    let mut dialect = CollectingDialect::new(MemoryDialect::new());

    dialect
        .insert_or_update_tuple(&account_key(1), &account_tuple(1, 100, 1), &ctx)
        .expect("seed");
    let pre_image = dialect
        .get_tuple(&account_key(1), &ctx)
        .expect("read works")
        .expect("stored")
        .snapshot()
        .clone();

    let mut write = Tuple::new();
    write.put("version", 2i64);
    let _ = dialect
        .update_tuple_with_optimistic_lock(&account_key(1), &pre_image, &write, &ctx)
        .expect("no store error");

    // Same pre-image again: stale now.
    let _ = dialect
        .update_tuple_with_optimistic_lock(&account_key(1), &pre_image, &write, &ctx)
        .expect("no store error");

    let collector = dialect.collector();
    let applied_kinds: Vec<_> = collector.applied().iter().map(|op| op.kind()).collect();
    assert_eq!(
        applied_kinds,
        vec![OperationKind::InsertOrUpdateTuple, OperationKind::UpdateTupleWithOptimisticLock]
    );

    assert_eq!(collector.stale().len(), 1);
    let stale = collector.stale()[0]
        .as_update_tuple_with_optimistic_lock()
        .expect("an optimistic update record");
    assert_eq!(stale.old_lock_state, pre_image);
}
