//! End-to-end unit-of-work flows over the full dialect stack.
//!
//! The stack under test mirrors a production wiring: a batching wrapper
//! populating the operations queue, over a collecting wrapper recording
//! write intents, over the in-memory reference store.

use gridmap::{
    AssociationContext, BatchingDialect, CollectingDialect, EntityKey, EntityKeyMetadata,
    GridDialect, MemoryDialect, OperationKind, OptionsContainer, RowKey, Tuple, TupleContext,
    Value,
};
use gridmap::{Association, AssociationKey, AssociationKeyMetadata};

fn user_key(id: i64) -> EntityKey {
    EntityKey::new(EntityKeyMetadata::new("User", ["id"]), vec![Value::Int(id)])
}

fn address_association(id: i64) -> AssociationKey {
    AssociationKey::new(
        AssociationKeyMetadata::new("User_Address", ["user_id"]),
        vec![Value::Int(id)],
    )
}

fn user_tuple(id: i64, name: &str) -> Tuple {
    let mut tuple = Tuple::new();
    tuple.put("id", id);
    tuple.put("name", name);
    tuple
}

#[test]
fn batched_unit_of_work_writes_tuples_and_associations() {
    let options = OptionsContainer::empty();
    let tuple_ctx = TupleContext::new(&options);
    let association_ctx = AssociationContext::new(&options);

    let mut dialect = BatchingDialect::new(CollectingDialect::new(MemoryDialect::new()));

    // The engine mutates tuples and hands them over; nothing hits the store.
    dialect
        .insert_or_update_tuple(&user_key(1), &user_tuple(1, "Alice"), &tuple_ctx)
        .expect("write queues");
    dialect
        .insert_or_update_tuple(&user_key(2), &user_tuple(2, "Bob"), &tuple_ctx)
        .expect("write queues");

    let mut addresses = Association::new();
    let mut home = Tuple::new();
    home.put("city", "Lisbon");
    addresses.put(RowKey::new(["address_id"], vec![Value::Int(10)]), home);
    dialect
        .insert_or_update_association(&address_association(1), &addresses, &association_ctx)
        .expect("write queues");

    assert_eq!(dialect.queue().size(), 3);
    assert_eq!(dialect.inner().inner().tuple_count(), 0);

    // A second write to a queued record needs no store read first.
    assert!(dialect.queue().contains(&user_key(1)));

    dialect.flush().expect("batch applies");

    let store = dialect.inner().inner();
    assert_eq!(store.tuple_count(), 2);
    assert_eq!(store.association_count(), 1);

    let alice = dialect
        .get_tuple(&user_key(1), &tuple_ctx)
        .expect("read works")
        .expect("stored");
    assert_eq!(alice.get("name"), Some(&Value::String("Alice".into())));
}

#[test]
fn flush_records_one_execute_batch_with_ordered_sub_operations() {
    let options = OptionsContainer::empty();
    let tuple_ctx = TupleContext::new(&options);

    let mut dialect = BatchingDialect::new(CollectingDialect::new(MemoryDialect::new()));

    dialect
        .insert_or_update_tuple(&user_key(1), &user_tuple(1, "Alice"), &tuple_ctx)
        .expect("write queues");
    dialect.remove_tuple(&user_key(2), &tuple_ctx).expect("write queues");
    dialect.flush().expect("batch applies");

    let collector = dialect.inner().collector();
    assert_eq!(collector.applied().len(), 1);

    let batch = collector.applied()[0].as_execute_batch().expect("an ExecuteBatch record");
    let kinds: Vec<_> = batch.operations.iter().map(|op| op.kind()).collect();
    assert_eq!(kinds, vec![OperationKind::InsertOrUpdateTuple, OperationKind::RemoveTuple]);

    // The record preserves the written value for compensation.
    let first = batch.operations[0].as_insert_or_update_tuple().expect("kinds match");
    assert_eq!(first.key, user_key(1));
    assert_eq!(first.tuple.get("name"), Some(&Value::String("Alice".into())));
}

#[test]
fn incremental_updates_only_touch_logged_columns() {
    let options = OptionsContainer::empty();
    let ctx = TupleContext::new(&options);

    let mut dialect = BatchingDialect::new(MemoryDialect::new());

    dialect
        .insert_or_update_tuple(&user_key(1), &user_tuple(1, "Alice"), &ctx)
        .expect("write queues");
    dialect.flush().expect("batch applies");

    // Re-read, mutate through the snapshot-plus-diff model, write back.
    let stored = dialect.get_tuple(&user_key(1), &ctx).expect("read works").expect("stored");
    let mut updated = Tuple::from_snapshot(stored.snapshot().clone());
    updated.put("name", "Alpha");
    updated.remove("never_there");
    dialect.insert_or_update_tuple(&user_key(1), &updated, &ctx).expect("write queues");
    dialect.flush().expect("batch applies");

    let stored = dialect.get_tuple(&user_key(1), &ctx).expect("read works").expect("stored");
    assert_eq!(stored.get("id"), Some(&Value::Int(1)));
    assert_eq!(stored.get("name"), Some(&Value::String("Alpha".into())));
}

#[test]
fn association_clear_then_put_rebuilds_the_row_set() {
    let options = OptionsContainer::empty();
    let ctx = AssociationContext::new(&options);

    let mut dialect = BatchingDialect::new(MemoryDialect::new());

    let mut addresses = Association::new();
    for id in [10, 11] {
        let mut row = Tuple::new();
        row.put("address_id", id);
        addresses.put(RowKey::new(["address_id"], vec![Value::Int(id)]), row);
    }
    dialect
        .insert_or_update_association(&address_association(1), &addresses, &ctx)
        .expect("write queues");
    dialect.flush().expect("batch applies");

    let stored = dialect
        .get_association(&address_association(1), &ctx)
        .expect("read works")
        .expect("stored");
    assert_eq!(stored.size(), 2);

    let mut replacement = Association::from_snapshot(stored.snapshot().clone());
    replacement.clear();
    let mut row = Tuple::new();
    row.put("address_id", 12);
    replacement.put(RowKey::new(["address_id"], vec![Value::Int(12)]), row);
    dialect
        .insert_or_update_association(&address_association(1), &replacement, &ctx)
        .expect("write queues");
    dialect.flush().expect("batch applies");

    let stored = dialect
        .get_association(&address_association(1), &ctx)
        .expect("read works")
        .expect("stored");
    assert_eq!(stored.size(), 1);
    assert!(stored.get(&RowKey::new(["address_id"], vec![Value::Int(12)])).is_some());
}
