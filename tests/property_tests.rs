//! Property-based tests for the binary codec.
//!
//! These use proptest to verify universal properties across many
//! generated inputs: round-trips, determinism, and the integer codec
//! over its full range.

use proptest::prelude::*;

use biplane::codec::{
    decode, decode_varint, decode_with_options, decode_zigzag, encode, encode_varint,
    encode_with_options, encode_zigzag, AvroValue, Decimal, DecimalMode, DecodeOptions,
    EncodeOptions,
};
use biplane::schema::parse_schema;

// ============================================================================
// Generators
// ============================================================================

/// Generate (schema JSON, value) pairs for every primitive kind.
fn arb_primitive_pair() -> impl Strategy<Value = (&'static str, AvroValue)> {
    prop_oneof![
        Just((r#""null""#, AvroValue::Null)),
        any::<bool>().prop_map(|b| (r#""boolean""#, AvroValue::Boolean(b))),
        any::<i32>().prop_map(|v| (r#""int""#, AvroValue::Int(v))),
        any::<i64>().prop_map(|v| (r#""long""#, AvroValue::Long(v))),
        any::<f32>()
            .prop_filter("NaN is not equal to itself", |f| !f.is_nan())
            .prop_map(|f| (r#""float""#, AvroValue::Float(f))),
        any::<f64>()
            .prop_filter("NaN is not equal to itself", |d| !d.is_nan())
            .prop_map(|d| (r#""double""#, AvroValue::Double(d))),
        proptest::collection::vec(any::<u8>(), 0..256)
            .prop_map(|b| (r#""bytes""#, AvroValue::Bytes(b))),
        ".*".prop_map(|s| (r#""string""#, AvroValue::String(s))),
    ]
}

proptest! {
    // ========================================================================
    // Integer codec over the full 64-bit range
    // ========================================================================

    #[test]
    fn prop_zigzag_roundtrip(value in any::<i64>()) {
        let mut out = Vec::new();
        encode_zigzag(value, &mut out);
        let mut cursor = &out[..];
        prop_assert_eq!(decode_zigzag(&mut cursor).unwrap(), value);
        prop_assert!(cursor.is_empty());
    }

    #[test]
    fn prop_varint_roundtrip(value in any::<u64>()) {
        let mut out = Vec::new();
        encode_varint(value, &mut out);
        let mut cursor = &out[..];
        prop_assert_eq!(decode_varint(&mut cursor).unwrap(), value);
        prop_assert!(cursor.is_empty());
    }

    // ========================================================================
    // Primitive round-trips
    // ========================================================================

    #[test]
    fn prop_primitive_roundtrip((json, value) in arb_primitive_pair()) {
        let schema = parse_schema(json).unwrap();
        let bytes = encode(&schema, &value).unwrap();
        prop_assert_eq!(decode(&schema, &bytes).unwrap(), value);
    }

    #[test]
    fn prop_encode_is_deterministic((json, value) in arb_primitive_pair()) {
        let schema = parse_schema(json).unwrap();
        let first = encode(&schema, &value).unwrap();
        let second = encode(&schema, &value).unwrap();
        prop_assert_eq!(first, second);
    }

    // ========================================================================
    // Containers
    // ========================================================================

    #[test]
    fn prop_array_roundtrip(items in proptest::collection::vec(any::<i64>(), 0..64)) {
        let schema = parse_schema(r#"{"type": "array", "items": "long"}"#).unwrap();
        let value = AvroValue::Array(items.into_iter().map(AvroValue::Long).collect());
        let bytes = encode(&schema, &value).unwrap();
        prop_assert_eq!(decode(&schema, &bytes).unwrap(), value);
    }

    #[test]
    fn prop_map_roundtrip(entries in proptest::collection::hash_map("[a-z]{1,8}", any::<i64>(), 0..32)) {
        let schema = parse_schema(r#"{"type": "map", "values": "long"}"#).unwrap();
        let value = AvroValue::Map(
            entries
                .into_iter()
                .map(|(k, v)| (k, AvroValue::Long(v)))
                .collect(),
        );
        let bytes = encode(&schema, &value).unwrap();
        prop_assert_eq!(decode(&schema, &bytes).unwrap(), value);
    }

    #[test]
    fn prop_block_size_mode_decodes_identically(items in proptest::collection::vec(".*", 0..32)) {
        let schema = parse_schema(r#"{"type": "array", "items": "string"}"#).unwrap();
        let value = AvroValue::Array(items.into_iter().map(AvroValue::String).collect());

        let plain = encode(&schema, &value).unwrap();
        let sized = encode_with_options(
            &schema,
            &value,
            &EncodeOptions { include_block_byte_size: true },
        )
        .unwrap();

        prop_assert_eq!(decode(&schema, &plain).unwrap(), value.clone());
        prop_assert_eq!(decode(&schema, &sized).unwrap(), value);
    }

    // ========================================================================
    // Unions
    // ========================================================================

    #[test]
    fn prop_nullable_long_roundtrip(value in proptest::option::of(any::<i64>())) {
        let schema = parse_schema(r#"["null", "long"]"#).unwrap();
        let avro = match value {
            Some(v) => AvroValue::Long(v),
            None => AvroValue::Null,
        };
        let bytes = encode(&schema, &avro).unwrap();
        prop_assert_eq!(decode(&schema, &bytes).unwrap(), avro);
    }

    #[test]
    fn prop_union_selection_is_stable((json, value) in arb_primitive_pair()) {
        // A union containing every primitive: any primitive value selects
        // exactly one branch, and selection is deterministic.
        prop_assume!(json != r#""null""#);
        let schema = parse_schema(
            r#"["null", "boolean", "int", "long", "float", "double", "bytes", "string"]"#,
        )
        .unwrap();
        let first = encode(&schema, &value).unwrap();
        let second = encode(&schema, &value).unwrap();
        prop_assert_eq!(&first, &second);
        prop_assert_eq!(decode(&schema, &first).unwrap(), value);
    }

    #[test]
    fn prop_tagged_decode_reencodes_identically(value in proptest::option::of(".*")) {
        let schema = parse_schema(r#"["null", "string"]"#).unwrap();
        let avro = match value {
            Some(s) => AvroValue::String(s),
            None => AvroValue::Null,
        };
        let bytes = encode(&schema, &avro).unwrap();

        let options = DecodeOptions { tagged_unions: true, ..DecodeOptions::default() };
        let tagged = decode_with_options(&schema, &bytes, &options).unwrap();
        prop_assert_eq!(encode(&schema, &tagged).unwrap(), bytes);
    }

    // ========================================================================
    // Records
    // ========================================================================

    #[test]
    fn prop_record_roundtrip(id in any::<i64>(), name in ".*", flag in any::<bool>()) {
        let schema = parse_schema(
            r#"{
                "type": "record",
                "name": "Row",
                "fields": [
                    {"name": "id", "type": "long"},
                    {"name": "name", "type": "string"},
                    {"name": "flag", "type": "boolean"}
                ]
            }"#,
        )
        .unwrap();
        let value = AvroValue::Record(vec![
            ("id".to_string(), AvroValue::Long(id)),
            ("name".to_string(), AvroValue::String(name)),
            ("flag".to_string(), AvroValue::Boolean(flag)),
        ]);
        let bytes = encode(&schema, &value).unwrap();
        prop_assert_eq!(decode(&schema, &bytes).unwrap(), value);
    }

    // ========================================================================
    // Logical types
    // ========================================================================

    #[test]
    fn prop_decimal_exact_roundtrip(unscaled in any::<i64>()) {
        // i64 has at most 19 digits; precision 20 always fits
        let schema = parse_schema(
            r#"{"type": "bytes", "logicalType": "decimal", "precision": 20, "scale": 4}"#,
        )
        .unwrap();
        let value = AvroValue::Decimal(Decimal::new(unscaled, 4));
        let bytes = encode(&schema, &value).unwrap();

        let options = DecodeOptions { decimals: DecimalMode::Exact, ..DecodeOptions::default() };
        prop_assert_eq!(decode_with_options(&schema, &bytes, &options).unwrap(), value);
    }

    #[test]
    fn prop_date_roundtrip(days in any::<i32>()) {
        let schema = parse_schema(r#"{"type": "int", "logicalType": "date"}"#).unwrap();
        let value = AvroValue::Date(days);
        let bytes = encode(&schema, &value).unwrap();
        prop_assert_eq!(decode(&schema, &bytes).unwrap(), value);
    }

    #[test]
    fn prop_timestamp_roundtrip(ts in any::<i64>()) {
        for json in [
            r#"{"type": "long", "logicalType": "timestamp-millis"}"#,
            r#"{"type": "long", "logicalType": "timestamp-micros"}"#,
            r#"{"type": "long", "logicalType": "timestamp-nanos"}"#,
        ] {
            let schema = parse_schema(json).unwrap();
            let value = match json.contains("millis") {
                true => AvroValue::TimestampMillis(ts),
                false if json.contains("micros") => AvroValue::TimestampMicros(ts),
                false => AvroValue::TimestampNanos(ts),
            };
            let bytes = encode(&schema, &value).unwrap();
            prop_assert_eq!(decode(&schema, &bytes).unwrap(), value);
        }
    }

    #[test]
    fn prop_enum_roundtrip(index in 0usize..4) {
        let schema = parse_schema(
            r#"{"type": "enum", "name": "Suit", "symbols": ["SPADES", "HEARTS", "DIAMONDS", "CLUBS"]}"#,
        )
        .unwrap();
        let symbols = ["SPADES", "HEARTS", "DIAMONDS", "CLUBS"];
        let value = AvroValue::Enum(index as i32, symbols[index].to_string());
        let bytes = encode(&schema, &value).unwrap();
        prop_assert_eq!(decode(&schema, &bytes).unwrap(), value);
    }

    #[test]
    fn prop_fixed_roundtrip(bytes in proptest::collection::vec(any::<u8>(), 16..=16)) {
        let schema = parse_schema(r#"{"type": "fixed", "name": "F16", "size": 16}"#).unwrap();
        let value = AvroValue::Fixed(bytes);
        let encoded = encode(&schema, &value).unwrap();
        prop_assert_eq!(&encoded[..], match &value {
            AvroValue::Fixed(b) => &b[..],
            _ => unreachable!(),
        });
        prop_assert_eq!(decode(&schema, &encoded).unwrap(), value);
    }

    // ========================================================================
    // Hostile input never panics
    // ========================================================================

    #[test]
    fn prop_decoder_never_panics_on_garbage(data in proptest::collection::vec(any::<u8>(), 0..128)) {
        let schema = parse_schema(
            r#"{
                "type": "record",
                "name": "R",
                "fields": [
                    {"name": "s", "type": "string"},
                    {"name": "u", "type": ["null", "long"]},
                    {"name": "xs", "type": {"type": "array", "items": "int"}}
                ]
            }"#,
        )
        .unwrap();
        // Either outcome is fine; what matters is that it returns
        let _ = decode(&schema, &data);
    }
}
