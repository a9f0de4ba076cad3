use command_syntax_structure::leaves::{SNOWFLAKE, STATUS_LINK, UINT4N};
use command_syntax_structure::*;
use serde_json::{Value, json};

#[test]
fn test_nullable_snowflake_cases() {
    let s = nullable(SNOWFLAKE.clone());

    assert_eq!(s.check(&Value::Null).unwrap(), None);
    assert!(s.check(&json!("123456789012345678")).is_ok());

    let err = s.check(&json!("abc")).unwrap_err();
    assert_eq!(err.kind, FailureKind::InvalidValue);
}

#[test]
fn test_object_with_optional_and_type_error() {
    let shape = object([
        ("a", string().erase()),
        ("b", optional(number()).erase()),
    ]);
    let ok = shape.check(&json!({"a": "x"})).unwrap();
    assert_eq!(ok.get("b"), None);

    let err = object([("a", string().erase())])
        .check(&json!({"a": 1}))
        .unwrap_err();
    assert_eq!(err.kind, FailureKind::IncorrectType);
    assert!(err.mentions("a"));
}

#[test]
fn test_array_of_uint4n_cites_index_two() {
    let err = array(UINT4N.clone()).check(&json!([1, 2, -1])).unwrap_err();
    assert!(
        err.information
            .iter()
            .all(|e| e.path == vec![PathSegment::Index(2)])
    );
}

#[test]
fn test_uint4n_bounds() {
    assert!(UINT4N.check(&json!(4294967296u64)).is_err());
    assert_eq!(UINT4N.check(&json!(0)).unwrap(), 0);
}

#[test]
fn test_status_link_shape() {
    assert!(
        STATUS_LINK
            .check(&json!("https://twitter.com/someuser/status/123456"))
            .is_ok()
    );
    assert!(STATUS_LINK.check(&json!("https://example.com")).is_err());
}

#[test]
fn test_paths_accumulate_through_nesting() {
    let inner = object([("ids", array(nullable(SNOWFLAKE.clone())).erase())]);
    let outer = object([("settings", inner.erase())]);

    let err = outer
        .check(&json!({"settings": {"ids": [null, "123456789012345678", "x"]}}))
        .unwrap_err();

    assert_eq!(err.information.len(), 1);
    let line = err.first_line().unwrap();
    assert!(line.starts_with("settings.ids[2]<Snowflake>: "), "{line}");
}

#[test]
fn test_structures_are_reusable_across_calls() {
    let s = array(UINT4N.clone());
    for _ in 0..3 {
        assert!(s.check(&json!([1])).is_ok());
        assert!(s.check(&json!([-1])).is_err());
    }
}
