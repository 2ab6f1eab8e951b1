use dupgen_core::{Record, RecordId, RecordKind, UniquenessRegistry, true_link_groups, true_link_pairs};

fn record(id: RecordId, values: &[(&str, &str)]) -> Record {
    let mut record = Record::new(id);
    for (field, value) in values {
        record.set(*field, *value);
    }
    record
}

#[test]
fn record_ids_render_and_parse() {
    let original = RecordId::original(42);
    let duplicate = RecordId::duplicate(42, 3);
    assert_eq!(original.to_string(), "rec-42-org");
    assert_eq!(duplicate.to_string(), "rec-42-dup-3");
    assert_eq!("rec-42-org".parse::<RecordId>().expect("parse"), original);
    assert_eq!("rec-42-dup-3".parse::<RecordId>().expect("parse"), duplicate);
    assert_eq!(duplicate.kind, RecordKind::Duplicate(3));
    assert!("rec-x-org".parse::<RecordId>().is_err());
    assert!("rec-1-dup".parse::<RecordId>().is_err());
}

#[test]
fn record_ids_serialize_as_strings() {
    let json = serde_json::to_string(&RecordId::duplicate(7, 0)).expect("serialize");
    assert_eq!(json, "\"rec-7-dup-0\"");
    let parsed: RecordId = serde_json::from_str("\"rec-7-org\"").expect("deserialize");
    assert!(parsed.is_original());
}

#[test]
fn canonical_key_ignores_id_and_insertion_order() {
    let a = record(RecordId::original(1), &[("surname", "smith"), ("given_name", "ann")]);
    let b = record(RecordId::duplicate(9, 0), &[("given_name", "ann"), ("surname", "smith")]);
    assert_eq!(a.canonical_key(), b.canonical_key());

    let shifted = record(RecordId::original(2), &[("given_name", "ann;"), ("surname", "smith")]);
    assert_ne!(a.canonical_key(), shifted.canonical_key());
}

#[test]
fn registry_rejects_repeated_mappings() {
    let mut registry = UniquenessRegistry::new();
    let a = record(RecordId::original(1), &[("state", "nsw")]);
    let b = record(RecordId::original(2), &[("state", "nsw")]);
    let c = record(RecordId::original(3), &[("state", "vic")]);
    assert!(registry.insert(&a));
    assert!(!registry.insert(&b));
    assert!(registry.insert(&c));
    assert_eq!(registry.len(), 2);
}

#[test]
fn swap_exchanges_present_fields_only() {
    let mut rec = record(RecordId::original(1), &[("address_1", "a"), ("address_2", "b")]);
    assert!(rec.swap("address_1", "address_2"));
    assert_eq!(rec.get("address_1"), Some("b"));
    assert_eq!(rec.get("address_2"), Some("a"));
    assert!(!rec.swap("address_1", "suburb"));
}

#[test]
fn true_links_pair_duplicates_with_their_source() {
    let ids = vec![
        RecordId::duplicate(0, 1),
        RecordId::original(0),
        RecordId::original(1),
        RecordId::duplicate(0, 0),
        RecordId::original(2),
        RecordId::duplicate(2, 0),
    ];

    let groups = true_link_groups(&ids);
    assert_eq!(groups.len(), 3);
    assert_eq!(
        groups[&0],
        vec![RecordId::original(0), RecordId::duplicate(0, 0), RecordId::duplicate(0, 1)]
    );
    assert_eq!(groups[&1], vec![RecordId::original(1)]);

    let pairs = true_link_pairs(&ids);
    assert_eq!(pairs.len(), 4);
    assert!(pairs.iter().all(|link| link.left.index == link.right.index));
    assert!(pairs.iter().all(|link| link.left > link.right));
    assert!(pairs.iter().any(|link| {
        link.left == RecordId::duplicate(2, 0) && link.right == RecordId::original(2)
    }));
}
