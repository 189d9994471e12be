//! Native query execution through the queryable facet.

use gridmap::{
    BackendQuery, EntityKey, EntityKeyMetadata, GridDialect, MemoryDialect,
    ParameterMetadataBuilder, QueryParameters, QueryableDialect, RowSelection,
    TokenizerParameterMetadataBuilder, Tuple, TupleContext, Value,
};
use gridmap::OptionsContainer;

fn city_key(id: i64) -> EntityKey {
    EntityKey::new(EntityKeyMetadata::new("City", ["id"]), vec![Value::Int(id)])
}

fn city_tuple(id: i64, name: &str, population: i64) -> Tuple {
    let mut tuple = Tuple::new();
    tuple.put("id", id);
    tuple.put("name", name);
    tuple.put("population", population);
    tuple
}

fn seeded_dialect(ctx: &TupleContext<'_>) -> MemoryDialect {
    let mut dialect = MemoryDialect::new();
    for (id, name, population) in
        [(1, "Lisbon", 545), (2, "Porto", 231), (3, "Lisbon", 545), (4, "Braga", 193)]
    {
        dialect
            .insert_or_update_tuple(&city_key(id), &city_tuple(id, name, population), ctx)
            .expect("seed");
    }
    dialect
}

#[test]
fn parsed_query_runs_with_bound_parameters() {
    let options = OptionsContainer::empty();
    let ctx = TupleContext::new(&options);
    let dialect = seeded_dialect(&ctx);

    let native = dialect
        .parse_native_query(
            r#"{ "table": "City", "criteria": [ { "column": "name", "equals": { "param": "name" } } ] }"#,
        )
        .expect("query parses");
    let query = BackendQuery::for_single_entity(native, EntityKeyMetadata::new("City", ["id"]));
    let params = QueryParameters::none().with_parameter("name", "Lisbon");

    let results = dialect.execute_backend_query(&query, &params, &ctx).expect("query runs");
    assert_eq!(results.len(), 2);
    for tuple in &results {
        assert_eq!(tuple.get("name"), Some(&Value::String("Lisbon".into())));
    }
}

#[test]
fn row_selection_pages_through_results() {
    let options = OptionsContainer::empty();
    let ctx = TupleContext::new(&options);
    let dialect = seeded_dialect(&ctx);

    let native = dialect.parse_native_query(r#"{ "table": "City" }"#).expect("query parses");
    let query = BackendQuery::new(native);

    let page = |first, max| {
        let params = QueryParameters::none()
            .with_row_selection(RowSelection::new(Some(first), Some(max)));
        dialect.execute_backend_query(&query, &params, &ctx).expect("query runs")
    };

    assert_eq!(page(0, 2).len(), 2);
    assert_eq!(page(2, 2).len(), 2);
    assert_eq!(page(4, 2).len(), 0);
}

#[test]
fn update_query_reports_affected_records() {
    let options = OptionsContainer::empty();
    let ctx = TupleContext::new(&options);
    let mut dialect = seeded_dialect(&ctx);

    let native = dialect
        .parse_native_query(
            r#"{
                "table": "City",
                "criteria": [ { "column": "name", "equals": { "param": "name" } } ],
                "assignments": [ { "column": "population", "value": { "param": "population" } } ]
            }"#,
        )
        .expect("query parses");
    let params = QueryParameters::none()
        .with_parameter("name", "Lisbon")
        .with_parameter("population", 550i64);

    let affected = dialect
        .execute_backend_update_query(&BackendQuery::new(native), &params, &ctx)
        .expect("update runs");
    assert_eq!(affected, 2);

    let stored = dialect.get_tuple(&city_key(1), &ctx).expect("read works").expect("stored");
    assert_eq!(stored.get("population"), Some(&Value::Int(550)));
}

#[test]
fn dialect_declares_its_parameter_discovery_strategy() {
    let dialect = MemoryDialect::new();

    // Structured queries carry parameters structurally: nothing to scan.
    let metadata = dialect
        .parameter_metadata_builder()
        .build_parameter_metadata(r#"{ "table": "City" }"#)
        .expect("noop never fails");
    assert!(metadata.is_empty());
}

#[test]
fn string_backed_stores_use_the_tokenizer_builder() {
    // A string-query store pairs the same contract with the tokenizer
    // implementation instead.
    let builder = TokenizerParameterMetadataBuilder::new();
    let metadata = builder
        .build_parameter_metadata("FROM City c WHERE c.name = :name AND c.population > ?1")
        .expect("query scans");

    assert!(metadata.named_parameters().contains("name"));
    assert!(metadata.ordinal_parameters().contains(&1));
}
