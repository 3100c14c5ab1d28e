//! Tests for Avro schema types and parsing.

use biplane::error::SchemaError;
use biplane::schema::*;

// ============================================================================
// Parser Tests - Primitive Types
// ============================================================================

#[test]
fn test_parse_primitive_string_schemas() {
    assert_eq!(*parse_schema(r#""null""#).unwrap().root(), AvroSchema::Null);
    assert_eq!(
        *parse_schema(r#""boolean""#).unwrap().root(),
        AvroSchema::Boolean
    );
    assert_eq!(*parse_schema(r#""int""#).unwrap().root(), AvroSchema::Int);
    assert_eq!(*parse_schema(r#""long""#).unwrap().root(), AvroSchema::Long);
    assert_eq!(
        *parse_schema(r#""float""#).unwrap().root(),
        AvroSchema::Float
    );
    assert_eq!(
        *parse_schema(r#""double""#).unwrap().root(),
        AvroSchema::Double
    );
    assert_eq!(
        *parse_schema(r#""bytes""#).unwrap().root(),
        AvroSchema::Bytes
    );
    assert_eq!(
        *parse_schema(r#""string""#).unwrap().root(),
        AvroSchema::String
    );
}

#[test]
fn test_parse_primitive_object_schemas() {
    assert_eq!(
        *parse_schema(r#"{"type": "null"}"#).unwrap().root(),
        AvroSchema::Null
    );
    assert_eq!(
        *parse_schema(r#"{"type": "int"}"#).unwrap().root(),
        AvroSchema::Int
    );
    assert_eq!(
        *parse_schema(r#"{"type": "string"}"#).unwrap().root(),
        AvroSchema::String
    );
}

#[test]
fn test_parse_invalid_json() {
    assert!(matches!(
        parse_schema("{not json"),
        Err(SchemaError::InvalidJson(_))
    ));
}

#[test]
fn test_parse_invalid_top_level() {
    assert!(parse_schema("42").is_err());
}

// ============================================================================
// Parser Tests - Record Schema
// ============================================================================

#[test]
fn test_parse_simple_record() {
    let json = r#"{
        "type": "record",
        "name": "User",
        "fields": [
            {"name": "id", "type": "long"},
            {"name": "name", "type": "string"}
        ]
    }"#;

    let schema = parse_schema(json).unwrap();
    match schema.root() {
        AvroSchema::Record(r) => {
            assert_eq!(r.name, "User");
            assert_eq!(r.fields.len(), 2);
            assert_eq!(r.fields[0].name, "id");
            assert_eq!(r.fields[0].schema, AvroSchema::Long);
            assert_eq!(r.fields[1].name, "name");
            assert_eq!(r.fields[1].schema, AvroSchema::String);
        }
        other => panic!("expected Record, got {:?}", other),
    }
    assert!(schema.context().contains("User"));
}

#[test]
fn test_parse_record_with_namespace() {
    let json = r#"{
        "type": "record",
        "name": "User",
        "namespace": "com.example",
        "fields": [{"name": "id", "type": "long"}]
    }"#;

    let schema = parse_schema(json).unwrap();
    match schema.root() {
        AvroSchema::Record(r) => {
            assert_eq!(r.fullname(), "com.example.User");
        }
        other => panic!("expected Record, got {:?}", other),
    }
    assert!(schema.context().contains("com.example.User"));
}

#[test]
fn test_parse_record_dotted_name_overrides_namespace() {
    let json = r#"{
        "type": "record",
        "name": "org.acme.Widget",
        "namespace": "ignored",
        "fields": [{"name": "id", "type": "long"}]
    }"#;

    let schema = parse_schema(json).unwrap();
    match schema.root() {
        AvroSchema::Record(r) => {
            assert_eq!(r.name, "Widget");
            assert_eq!(r.namespace.as_deref(), Some("org.acme"));
        }
        other => panic!("expected Record, got {:?}", other),
    }
    assert!(schema.context().contains("org.acme.Widget"));
}

#[test]
fn test_nested_record_inherits_namespace() {
    let json = r#"{
        "type": "record",
        "name": "Outer",
        "namespace": "com.example",
        "fields": [
            {"name": "inner", "type": {
                "type": "record",
                "name": "Inner",
                "fields": [{"name": "x", "type": "int"}]
            }}
        ]
    }"#;

    let schema = parse_schema(json).unwrap();
    assert!(schema.context().contains("com.example.Outer"));
    assert!(schema.context().contains("com.example.Inner"));
}

#[test]
fn test_nested_record_own_namespace() {
    let json = r#"{
        "type": "record",
        "name": "Outer",
        "namespace": "com.example",
        "fields": [
            {"name": "inner", "type": {
                "type": "record",
                "name": "Inner",
                "namespace": "org.other",
                "fields": [{"name": "x", "type": "int"}]
            }}
        ]
    }"#;

    let schema = parse_schema(json).unwrap();
    assert!(schema.context().contains("org.other.Inner"));
    assert!(!schema.context().contains("com.example.Inner"));
}

#[test]
fn test_parse_record_missing_fields_key() {
    let json = r#"{"type": "record", "name": "NoFields"}"#;
    assert!(matches!(
        parse_schema(json),
        Err(SchemaError::MissingRequiredField { field, .. }) if field == "fields"
    ));
}

#[test]
fn test_parse_record_duplicate_field_names() {
    let json = r#"{
        "type": "record",
        "name": "Dup",
        "fields": [
            {"name": "x", "type": "int"},
            {"name": "x", "type": "long"}
        ]
    }"#;
    assert!(matches!(
        parse_schema(json),
        Err(SchemaError::DuplicateName { name, .. }) if name == "x"
    ));
}

#[test]
fn test_parse_record_duplicate_fullname() {
    let json = r#"{
        "type": "record",
        "name": "Box",
        "fields": [
            {"name": "a", "type": {"type": "fixed", "name": "Token", "size": 4}},
            {"name": "b", "type": {"type": "fixed", "name": "Token", "size": 8}}
        ]
    }"#;
    assert!(matches!(
        parse_schema(json),
        Err(SchemaError::DuplicateName { name, .. }) if name == "Token"
    ));
}

// ============================================================================
// Parser Tests - References
// ============================================================================

#[test]
fn test_reference_to_sibling_definition() {
    let json = r#"{
        "type": "record",
        "name": "Pair",
        "fields": [
            {"name": "first", "type": {"type": "fixed", "name": "Id", "size": 8}},
            {"name": "second", "type": "Id"}
        ]
    }"#;

    let schema = parse_schema(json).unwrap();
    match schema.root() {
        AvroSchema::Record(r) => {
            assert_eq!(r.fields[1].schema, AvroSchema::Named("Id".to_string()));
        }
        other => panic!("expected Record, got {:?}", other),
    }
    assert!(schema.context().contains("Id"));
}

#[test]
fn test_self_reference() {
    let json = r#"{
        "type": "record",
        "name": "LinkedList",
        "fields": [
            {"name": "value", "type": "int"},
            {"name": "next", "type": ["null", "LinkedList"]}
        ]
    }"#;

    let schema = parse_schema(json).unwrap();
    assert!(schema.context().contains("LinkedList"));
}

#[test]
fn test_unknown_reference_fails() {
    let json = r#"{
        "type": "record",
        "name": "Holder",
        "fields": [{"name": "payload", "type": "Mystery"}]
    }"#;
    assert!(matches!(
        parse_schema(json),
        Err(SchemaError::UnknownReference { name, .. }) if name == "Mystery"
    ));
}

#[test]
fn test_reference_resolves_in_enclosing_namespace() {
    let json = r#"{
        "type": "record",
        "name": "Wrapper",
        "namespace": "com.example",
        "fields": [
            {"name": "id", "type": {"type": "fixed", "name": "Token", "size": 4}},
            {"name": "again", "type": "Token"}
        ]
    }"#;

    let schema = parse_schema(json).unwrap();
    match schema.root() {
        AvroSchema::Record(r) => {
            // The unqualified reference is qualified against the record's namespace
            assert_eq!(
                r.fields[1].schema,
                AvroSchema::Named("com.example.Token".to_string())
            );
        }
        other => panic!("expected Record, got {:?}", other),
    }
}

#[test]
fn test_reference_through_alias() {
    let json = r#"{
        "type": "record",
        "name": "Doc",
        "fields": [
            {"name": "a", "type": {"type": "fixed", "name": "Hash", "aliases": ["Digest"], "size": 16}},
            {"name": "b", "type": "Digest"}
        ]
    }"#;

    let schema = parse_schema(json).unwrap();
    assert!(schema.context().contains("Hash"));
    assert!(schema.context().contains("Digest"));
}

// ============================================================================
// Parser Tests - Enum Schema
// ============================================================================

#[test]
fn test_parse_enum() {
    let json = r#"{
        "type": "enum",
        "name": "Suit",
        "symbols": ["SPADES", "HEARTS", "DIAMONDS", "CLUBS"]
    }"#;

    let schema = parse_schema(json).unwrap();
    match schema.root() {
        AvroSchema::Enum(e) => {
            assert_eq!(e.name, "Suit");
            assert_eq!(e.symbols.len(), 4);
            assert_eq!(e.symbol_index("HEARTS"), Some(1));
        }
        other => panic!("expected Enum, got {:?}", other),
    }
}

#[test]
fn test_parse_enum_duplicate_symbols() {
    let json = r#"{"type": "enum", "name": "E", "symbols": ["A", "B", "A"]}"#;
    assert!(matches!(
        parse_schema(json),
        Err(SchemaError::DuplicateName { name, .. }) if name == "A"
    ));
}

#[test]
fn test_parse_enum_empty_symbols() {
    let json = r#"{"type": "enum", "name": "E", "symbols": []}"#;
    assert!(parse_schema(json).is_err());
}

#[test]
fn test_parse_enum_default_must_be_symbol() {
    let json = r#"{"type": "enum", "name": "E", "symbols": ["A", "B"], "default": "C"}"#;
    assert!(matches!(
        parse_schema(json),
        Err(SchemaError::InvalidDefault { .. })
    ));

    let ok = r#"{"type": "enum", "name": "E", "symbols": ["A", "B"], "default": "B"}"#;
    assert!(parse_schema(ok).is_ok());
}

// ============================================================================
// Parser Tests - Array, Map, Fixed
// ============================================================================

#[test]
fn test_parse_array() {
    let schema = parse_schema(r#"{"type": "array", "items": "string"}"#).unwrap();
    assert_eq!(
        *schema.root(),
        AvroSchema::Array(Box::new(AvroSchema::String))
    );
}

#[test]
fn test_parse_array_missing_items() {
    assert!(matches!(
        parse_schema(r#"{"type": "array"}"#),
        Err(SchemaError::MissingRequiredField { field, .. }) if field == "items"
    ));
}

#[test]
fn test_parse_map() {
    let schema = parse_schema(r#"{"type": "map", "values": "long"}"#).unwrap();
    assert_eq!(*schema.root(), AvroSchema::Map(Box::new(AvroSchema::Long)));
}

#[test]
fn test_parse_fixed() {
    let schema = parse_schema(r#"{"type": "fixed", "name": "MD5", "size": 16}"#).unwrap();
    match schema.root() {
        AvroSchema::Fixed(f) => {
            assert_eq!(f.name, "MD5");
            assert_eq!(f.size, 16);
        }
        other => panic!("expected Fixed, got {:?}", other),
    }
}

#[test]
fn test_parse_fixed_rejects_zero_size() {
    assert!(parse_schema(r#"{"type": "fixed", "name": "Z", "size": 0}"#).is_err());
    assert!(parse_schema(r#"{"type": "fixed", "name": "Z", "size": -4}"#).is_err());
}

// ============================================================================
// Parser Tests - Unions
// ============================================================================

#[test]
fn test_parse_union() {
    let schema = parse_schema(r#"["null", "string"]"#).unwrap();
    assert_eq!(
        *schema.root(),
        AvroSchema::Union(vec![AvroSchema::Null, AvroSchema::String])
    );
}

#[test]
fn test_union_rejects_duplicate_primitives() {
    assert!(matches!(
        parse_schema(r#"["int", "int"]"#),
        Err(SchemaError::InvalidUnion { .. })
    ));
}

#[test]
fn test_union_rejects_duplicate_containers() {
    assert!(matches!(
        parse_schema(
            r#"[{"type":"array","items":"int"}, {"type":"array","items":"string"}]"#
        ),
        Err(SchemaError::InvalidUnion { .. })
    ));
    assert!(matches!(
        parse_schema(r#"[{"type":"map","values":"int"}, {"type":"map","values":"long"}]"#),
        Err(SchemaError::InvalidUnion { .. })
    ));
}

#[test]
fn test_union_rejects_nested_union() {
    assert!(matches!(
        parse_schema(r#"["null", ["int", "string"]]"#),
        Err(SchemaError::InvalidUnion { .. })
    ));
}

#[test]
fn test_union_rejects_logical_duplicate_of_base() {
    // A decimal annotation does not make a second bytes branch legal
    let json = r#"["bytes", {"type":"bytes","logicalType":"decimal","precision":4,"scale":2}]"#;
    assert!(matches!(
        parse_schema(json),
        Err(SchemaError::InvalidUnion { .. })
    ));
}

#[test]
fn test_union_allows_distinct_named_types() {
    let json = r#"[
        {"type": "fixed", "name": "A", "size": 4},
        {"type": "fixed", "name": "B", "size": 4}
    ]"#;
    assert!(parse_schema(json).is_ok());
}

#[test]
fn test_union_rejects_same_fullname_twice() {
    let json = r#"[
        {"type": "fixed", "name": "A", "size": 4},
        "A"
    ]"#;
    // The second branch references the first by name; same fullname twice
    assert!(matches!(
        parse_schema(json),
        Err(SchemaError::InvalidUnion { .. }) | Err(SchemaError::DuplicateName { .. })
    ));
}

// ============================================================================
// Parser Tests - Strict vs Lenient
// ============================================================================

#[test]
fn test_strict_rejects_unknown_keys() {
    let json = r#"{"type": "record", "name": "R", "color": "red", "fields": []}"#;
    assert!(matches!(
        parse_schema_with_options(json, true),
        Err(SchemaError::UnrecognizedKey { key, .. }) if key == "color"
    ));
    assert!(parse_schema_with_options(json, false).is_ok());
}

#[test]
fn test_strict_rejects_bad_names() {
    let json = r#"{"type": "record", "name": "bad-name", "fields": []}"#;
    assert!(matches!(
        parse_schema_with_options(json, true),
        Err(SchemaError::InvalidName { .. })
    ));
    assert!(parse_schema_with_options(json, false).is_ok());
}

#[test]
fn test_strict_rejects_colliding_field_aliases() {
    let json = r#"{
        "type": "record",
        "name": "R",
        "fields": [
            {"name": "a", "type": "int"},
            {"name": "b", "type": "int", "aliases": ["a"]}
        ]
    }"#;
    assert!(matches!(
        parse_schema_with_options(json, true),
        Err(SchemaError::DuplicateName { .. })
    ));
    assert!(parse_schema_with_options(json, false).is_ok());
}

// ============================================================================
// Parser Tests - Logical Types
// ============================================================================

#[test]
fn test_parse_date() {
    let schema = parse_schema(r#"{"type": "int", "logicalType": "date"}"#).unwrap();
    match schema.root() {
        AvroSchema::Logical(lt) => {
            assert_eq!(lt.logical_type, LogicalTypeName::Date);
            assert_eq!(*lt.base, AvroSchema::Int);
        }
        other => panic!("expected Logical, got {:?}", other),
    }
}

#[test]
fn test_parse_decimal_bytes() {
    let json = r#"{"type": "bytes", "logicalType": "decimal", "precision": 10, "scale": 2}"#;
    let schema = parse_schema(json).unwrap();
    match schema.root() {
        AvroSchema::Logical(lt) => {
            assert_eq!(
                lt.logical_type,
                LogicalTypeName::Decimal {
                    precision: 10,
                    scale: 2
                }
            );
        }
        other => panic!("expected Logical, got {:?}", other),
    }
}

#[test]
fn test_parse_decimal_fixed_capacity() {
    // fixed[2] holds at most 4 digits; precision 10 cannot fit
    let json = r#"{"type": "fixed", "name": "D", "size": 2, "logicalType": "decimal", "precision": 10, "scale": 2}"#;
    assert!(matches!(
        parse_schema_with_options(json, true),
        Err(SchemaError::InvalidLogicalType { .. })
    ));
    // Lenient mode drops the annotation, leaving the fixed
    let schema = parse_schema(json).unwrap();
    assert!(matches!(schema.root(), AvroSchema::Fixed(_)));
}

#[test]
fn test_parse_decimal_scale_exceeding_precision() {
    let json = r#"{"type": "bytes", "logicalType": "decimal", "precision": 2, "scale": 5}"#;
    assert!(matches!(
        parse_schema_with_options(json, true),
        Err(SchemaError::InvalidLogicalType { .. })
    ));
    let schema = parse_schema(json).unwrap();
    assert_eq!(*schema.root(), AvroSchema::Bytes);
}

#[test]
fn test_parse_uuid_string_and_fixed() {
    let schema = parse_schema(r#"{"type": "string", "logicalType": "uuid"}"#).unwrap();
    assert!(matches!(schema.root(), AvroSchema::Logical(_)));

    let schema = parse_schema(
        r#"{"type": "fixed", "name": "U", "size": 16, "logicalType": "uuid"}"#,
    )
    .unwrap();
    assert!(matches!(schema.root(), AvroSchema::Logical(_)));

    // uuid on a 4-byte fixed is invalid
    let json = r#"{"type": "fixed", "name": "U", "size": 4, "logicalType": "uuid"}"#;
    assert!(matches!(
        parse_schema_with_options(json, true),
        Err(SchemaError::InvalidLogicalType { .. })
    ));
}

#[test]
fn test_parse_timestamp_variants() {
    for (name, expected) in [
        ("timestamp-millis", LogicalTypeName::TimestampMillis),
        ("timestamp-micros", LogicalTypeName::TimestampMicros),
        ("timestamp-nanos", LogicalTypeName::TimestampNanos),
        ("local-timestamp-millis", LogicalTypeName::LocalTimestampMillis),
        ("local-timestamp-micros", LogicalTypeName::LocalTimestampMicros),
    ] {
        let json = format!(r#"{{"type": "long", "logicalType": "{}"}}"#, name);
        let schema = parse_schema(&json).unwrap();
        match schema.root() {
            AvroSchema::Logical(lt) => assert_eq!(lt.logical_type, expected),
            other => panic!("expected Logical for {}, got {:?}", name, other),
        }
    }
}

#[test]
fn test_parse_timestamp_on_int_base_rejected() {
    let json = r#"{"type": "int", "logicalType": "timestamp-millis"}"#;
    assert!(matches!(
        parse_schema_with_options(json, true),
        Err(SchemaError::InvalidLogicalType { .. })
    ));
    assert_eq!(*parse_schema(json).unwrap().root(), AvroSchema::Int);
}

#[test]
fn test_unknown_logical_type_falls_back_to_base() {
    let schema = parse_schema(r#"{"type": "long", "logicalType": "nonsense"}"#).unwrap();
    assert_eq!(*schema.root(), AvroSchema::Long);
}

// ============================================================================
// Parser Tests - Defaults
// ============================================================================

#[test]
fn test_field_default_type_checked() {
    let json = r#"{
        "type": "record",
        "name": "R",
        "fields": [{"name": "count", "type": "int", "default": "lots"}]
    }"#;
    assert!(matches!(
        parse_schema(json),
        Err(SchemaError::InvalidDefault { .. })
    ));
}

#[test]
fn test_union_default_applies_to_first_branch() {
    let good = r#"{
        "type": "record",
        "name": "R",
        "fields": [{"name": "opt", "type": ["null", "int"], "default": null}]
    }"#;
    assert!(parse_schema(good).is_ok());

    // Default must match the first branch (null), not the second
    let bad = r#"{
        "type": "record",
        "name": "R",
        "fields": [{"name": "opt", "type": ["null", "int"], "default": 3}]
    }"#;
    assert!(matches!(
        parse_schema(bad),
        Err(SchemaError::InvalidDefault { .. })
    ));
}

#[test]
fn test_int_default_range_checked() {
    let json = r#"{
        "type": "record",
        "name": "R",
        "fields": [{"name": "n", "type": "int", "default": 3000000000}]
    }"#;
    assert!(matches!(
        parse_schema(json),
        Err(SchemaError::InvalidDefault { .. })
    ));
}

// ============================================================================
// Schema Serialization Tests
// ============================================================================

#[test]
fn test_schema_json_roundtrip() {
    let json = r#"{
        "type": "record",
        "name": "User",
        "namespace": "com.example",
        "fields": [
            {"name": "id", "type": "long"},
            {"name": "tags", "type": {"type": "array", "items": "string"}},
            {"name": "status", "type": {"type": "enum", "name": "Status", "symbols": ["ON", "OFF"]}}
        ]
    }"#;

    let schema = parse_schema(json).unwrap();
    let reparsed = parse_schema(&schema.root().to_json()).unwrap();
    assert_eq!(schema.root(), reparsed.root());
}

#[test]
fn test_error_path_reporting() {
    let json = r#"{
        "type": "record",
        "name": "Outer",
        "fields": [
            {"name": "list", "type": {"type": "array", "items": {"type": "enum", "name": "E", "symbols": []}}}
        ]
    }"#;
    match parse_schema(json) {
        Err(SchemaError::InvalidSchema { path, .. }) => {
            assert_eq!(path, "$.fields[0].type.items.symbols");
        }
        other => panic!("expected InvalidSchema, got {:?}", other),
    }
}
