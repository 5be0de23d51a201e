//! Loader failure modes and discriminator matching.
//!
//! Every malformed document must fail with a descriptive [`LoadError`]
//! before any evaluation begins; well-formed documents may spell `kind` and
//! `op` in any casing.

use pretty_assertions::assert_eq;
use rinha::{LoadError, NoLimitTracker, NoPrint, NoopTracer, Object, Program};
use serde_json::{Value as Json, json};

fn loc() -> Json {
    json!({"start": 0, "end": 0, "filename": "test.rinha"})
}

fn document(expression: Json) -> Json {
    json!({"name": "test.rinha", "expression": expression, "location": loc()})
}

fn load(expression: Json) -> Result<Program, LoadError> {
    Program::load_document(&document(expression))
}

fn run(expression: Json) -> Object {
    load(expression)
        .expect("document should load")
        .run(NoLimitTracker, NoopTracer, &mut NoPrint)
        .expect("evaluation should succeed")
}

#[test]
fn unknown_kind_is_rejected() {
    let err = load(json!({"kind": "Tuple", "location": loc()})).unwrap_err();
    assert!(matches!(err, LoadError::UnknownKind { ref kind, .. } if kind == "Tuple"), "got: {err}");
}

#[test]
fn unknown_operator_is_rejected() {
    let expr = json!({
        "kind": "Binary",
        "lhs": {"kind": "Int", "value": 1, "location": loc()},
        "op": "Xor",
        "rhs": {"kind": "Int", "value": 2, "location": loc()},
        "location": loc(),
    });
    let err = load(expr).unwrap_err();
    assert!(matches!(err, LoadError::UnknownOperator { ref name, .. } if name == "Xor"), "got: {err}");
}

#[test]
fn missing_field_is_rejected() {
    let expr = json!({
        "kind": "Let",
        "name": {"text": "x", "location": loc()},
        "value": {"kind": "Int", "value": 1, "location": loc()},
        "location": loc(),
    });
    let err = load(expr).unwrap_err();
    assert!(
        matches!(err, LoadError::MissingField { field: "next", context: "Let", .. }),
        "got: {err}"
    );
}

#[test]
fn missing_location_is_rejected() {
    let err = load(json!({"kind": "Int", "value": 1})).unwrap_err();
    assert!(matches!(err, LoadError::MissingField { field: "location", .. }), "got: {err}");
}

#[test]
fn wrong_scalar_type_is_rejected() {
    let err = load(json!({"kind": "Int", "value": "ten", "location": loc()})).unwrap_err();
    assert!(
        matches!(err, LoadError::WrongType { field: "value", context: "Int", .. }),
        "got: {err}"
    );
}

#[test]
fn negative_offset_is_rejected() {
    let err = load(json!({
        "kind": "Int",
        "value": 1,
        "location": {"start": -1, "end": 0, "filename": "test.rinha"},
    }))
    .unwrap_err();
    assert!(matches!(err, LoadError::WrongType { field: "start", .. }), "got: {err}");
}

#[test]
fn non_object_term_is_rejected() {
    let err = load(json!(42)).unwrap_err();
    assert!(matches!(err, LoadError::WrongType { .. }), "got: {err}");
}

#[test]
fn malformed_json_text_is_rejected() {
    let err = Program::load_str("{not json").unwrap_err();
    assert!(matches!(err, LoadError::Document(_)), "got: {err}");
}

/// Load errors carry the nearest enclosing node's span when one was read.
#[test]
fn load_errors_carry_locations() {
    let err = load(json!({"kind": "Perform", "location": loc()})).unwrap_err();
    let location = err.location().expect("location should be attached");
    assert_eq!(&*location.filename, "test.rinha");
}

// === Case-insensitive discriminators ===

#[test]
fn kind_matches_case_insensitively() {
    let expr = json!({
        "kind": "lEt",
        "name": {"text": "x", "location": loc()},
        "value": {"kind": "INT", "value": 2, "location": loc()},
        "next": {"kind": "var", "text": "x", "location": loc()},
        "location": loc(),
    });
    assert_eq!(run(expr), Object::Int(2));
}

#[test]
fn operator_name_matches_case_insensitively() {
    for op in ["Add", "add", "ADD", "aDd"] {
        let expr = json!({
            "kind": "Binary",
            "lhs": {"kind": "Int", "value": 20, "location": loc()},
            "op": op,
            "rhs": {"kind": "Int", "value": 22, "location": loc()},
            "location": loc(),
        });
        assert_eq!(run(expr), Object::Int(42));
    }
}

/// Operators are named by enumeration name, not by token.
#[test]
fn operator_token_is_not_a_name() {
    let expr = json!({
        "kind": "Binary",
        "lhs": {"kind": "Int", "value": 1, "location": loc()},
        "op": "+",
        "rhs": {"kind": "Int", "value": 2, "location": loc()},
        "location": loc(),
    });
    let err = load(expr).unwrap_err();
    assert!(matches!(err, LoadError::UnknownOperator { .. }), "got: {err}");
}
