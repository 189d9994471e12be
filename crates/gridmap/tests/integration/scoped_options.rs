//! Bootstrap configuration feeding scoped option resolution.

use gridmap::{ConfigurationProperties, ScopedOptions, StoreOption};

/// At most one write concern per scope; later scopes win.
struct WriteConcern;
impl StoreOption for WriteConcern {
    type Identifier = ();
    type Value = String;
    const UNIQUE: bool = true;
}

/// Per-region cache TTLs accumulate.
struct RegionTtl;
impl StoreOption for RegionTtl {
    type Identifier = String;
    type Value = u64;
}

/// Reads the bootstrap property map into the global scope, the way a host
/// engine wires configuration at startup.
fn bootstrap(props: &ConfigurationProperties) -> ScopedOptions {
    let mut scopes = ScopedOptions::new();
    if let Some(concern) = props.get("gridmap.write_concern") {
        scopes.global_mut().add::<WriteConcern>((), concern.to_owned());
    }
    if let Some(ttl) = props.get_i64("gridmap.cache.default_ttl").expect("valid property") {
        scopes.global_mut().add::<RegionTtl>("default".into(), ttl as u64);
    }
    scopes
}

#[test]
fn bootstrap_properties_become_global_options() {
    let props = ConfigurationProperties::from_iter([
        ("gridmap.write_concern", "ACKNOWLEDGED"),
        ("gridmap.cache.default_ttl", "300"),
    ]);

    let scopes = bootstrap(&props);
    let global = scopes.resolve_global();

    assert_eq!(global.get_unique::<WriteConcern>().as_deref(), Some("ACKNOWLEDGED"));
    assert_eq!(global.get::<RegionTtl>(&"default".into()), Some(300));
}

#[test]
fn entity_scope_overrides_bootstrap_defaults() {
    let props = ConfigurationProperties::from_iter([("gridmap.write_concern", "ACKNOWLEDGED")]);
    let mut scopes = bootstrap(&props);
    scopes.entity_mut("Payment").add::<WriteConcern>((), "MAJORITY".into());

    assert_eq!(
        scopes.resolve_entity("Payment").get_unique::<WriteConcern>().as_deref(),
        Some("MAJORITY")
    );
    assert_eq!(
        scopes.resolve_entity("AuditLog").get_unique::<WriteConcern>().as_deref(),
        Some("ACKNOWLEDGED")
    );
}

#[test]
fn resolved_containers_are_shareable_across_units_of_work() {
    let mut scopes = ScopedOptions::new();
    scopes.global_mut().add::<WriteConcern>((), "ACKNOWLEDGED".into());
    let options = scopes.resolve_global();

    // Immutable and cheap to clone into concurrent readers.
    let handles: Vec<_> = (0..4)
        .map(|_| {
            let options = options.clone();
            std::thread::spawn(move || {
                options.get_unique::<WriteConcern>().expect("configured at bootstrap")
            })
        })
        .collect();

    for handle in handles {
        assert_eq!(handle.join().expect("reader thread"), "ACKNOWLEDGED");
    }
}

#[test]
fn non_unique_identifier_collisions_resolve_to_the_most_specific_scope() {
    let mut scopes = ScopedOptions::new();
    scopes.global_mut().add::<RegionTtl>("users".into(), 60);
    scopes.global_mut().add::<RegionTtl>("orders".into(), 60);
    scopes.entity_mut("User").add::<RegionTtl>("users".into(), 600);

    let resolved = scopes.resolve_entity("User").get_all::<RegionTtl>();
    assert_eq!(resolved.get("users"), Some(&600));
    assert_eq!(resolved.get("orders"), Some(&60));
}
