use serde_json::json;

use super::*;

#[test]
fn from_value_lifts_reserved_keys() {
    let document = Document::from_value(json!({
        "id": 42,
        "type": "Person",
        "name": "Alice",
        "age": 31
    }))
    .expect("object must parse");

    assert_eq!(document.id, Some(42));
    assert_eq!(document.doc_type, "Person");
    assert_eq!(document.get("name"), Some(&json!("Alice")));
    assert!(document.get("id").is_none());
    assert!(document.get("type").is_none());
}

#[test]
fn from_value_rejects_scalars_and_arrays() {
    for value in [json!(1), json!("doc"), json!(null), json!([1, 2])] {
        let error = Document::from_value(value).expect_err("must fail");
        assert!(matches!(error, CollectionError::InvalidInput(_)));
    }
}

#[test]
fn from_value_rejects_non_string_type() {
    let error = Document::from_value(json!({ "type": 7 })).expect_err("must fail");
    assert!(matches!(error, CollectionError::InvalidInput(_)));
}

#[test]
fn with_field_routes_reserved_keys_to_their_slots() {
    let document = Document::new("")
        .with_field("type", "Dog")
        .with_field("id", 9)
        .with_field("name", "Rex");
    assert_eq!(document.doc_type, "Dog");
    assert_eq!(document.id, Some(9));
    assert!(document.get("type").is_none());

    let cleared = document.with_field("type", Value::Null);
    assert_eq!(cleared.doc_type, "");
}

#[cfg(debug_assertions)]
#[test]
#[should_panic(expected = "with_field rejected a reserved key")]
fn with_field_panics_on_a_non_string_type_in_debug_builds() {
    let _ = Document::new("Dog").with_field("type", 5);
}

#[test]
fn non_positive_or_malformed_ids_read_as_unstored() {
    for id in [json!(null), json!(0), json!(-5), json!(1.5), json!("12")] {
        let document = Document::from_value(json!({ "id": id, "name": "x" }))
            .expect("object must parse");
        assert_eq!(document.id, None);
    }
}

#[test]
fn property_reads_reserved_slots_and_missing_fields_as_null() {
    let mut document = Document::new("Person").with_field("name", "Bob");
    document.id = Some(7);

    assert_eq!(document.property("id"), json!(7));
    assert_eq!(document.property("type"), json!("Person"));
    assert_eq!(document.property("name"), json!("Bob"));
    assert_eq!(document.property("missing"), Value::Null);
    assert_eq!(Document::new("Person").property("id"), Value::Null);
}

#[test]
fn stored_id_ignores_zero() {
    let mut document = Document::new("Person");
    document.id = Some(0);
    assert_eq!(document.stored_id(), None);
    document.id = Some(3);
    assert_eq!(document.stored_id(), Some(3));
}

#[test]
fn serde_uses_the_flat_json_form() {
    let mut document = Document::new("Person").with_field("name", "Alice");
    document.id = Some(9);

    let encoded = serde_json::to_value(&document).expect("serialize must succeed");
    assert_eq!(encoded, json!({ "id": 9, "type": "Person", "name": "Alice" }));
    assert_eq!(encoded, document.to_value());

    let decoded: Document = serde_json::from_value(encoded).expect("deserialize must succeed");
    assert_eq!(decoded, document);

    let rejected = serde_json::from_value::<Document>(json!(["not", "a", "document"]));
    assert!(rejected.is_err());
}

#[test]
fn loose_eq_coerces_scalars() {
    assert!(loose_eq(&json!(1), &json!(1.0)));
    assert!(loose_eq(&json!("42"), &json!(42)));
    assert!(loose_eq(&json!(true), &json!(1)));
    assert!(loose_eq(&json!(false), &json!("0")));
    assert!(loose_eq(&json!(""), &json!(0)));
    assert!(loose_eq(&json!(null), &json!(null)));

    assert!(!loose_eq(&json!(null), &json!(0)));
    assert!(!loose_eq(&json!("Alice"), &json!("alice")));
    assert!(!loose_eq(&json!("abc"), &json!(0)));
    assert!(!loose_eq(&json!("true"), &json!(true)));
}

#[test]
fn loose_eq_compares_containers_element_wise() {
    assert!(loose_eq(&json!([1, "2"]), &json!(["1", 2])));
    assert!(loose_eq(&json!({ "a": 1 }), &json!({ "a": "1" })));
    assert!(!loose_eq(&json!([1]), &json!([1, 2])));
    assert!(!loose_eq(&json!({ "a": 1 }), &json!({ "b": 1 })));
    assert!(!loose_eq(&json!([1]), &json!(1)));
}
