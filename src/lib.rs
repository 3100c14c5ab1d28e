//! Schema-driven Apache Avro binary codec.
//!
//! This library parses Avro schemas (JSON per the Avro 1.11
//! specification) and converts in-memory values to Avro binary and
//! back, with the schema known out of band to both sides. Logical types
//! (dates, times, timestamps, decimals, UUIDs, durations) are converted
//! on both paths.
//!
//! ```
//! use biplane::codec::{decode, encode, AvroValue};
//! use biplane::schema::parse_schema;
//!
//! let schema = parse_schema(r#"["null", "int"]"#).unwrap();
//! let bytes = encode(&schema, &AvroValue::Int(25)).unwrap();
//! assert_eq!(bytes, vec![2, 50]);
//! assert_eq!(decode(&schema, &bytes).unwrap(), AvroValue::Int(25));
//! ```
//!
//! A parsed [`Schema`](schema::Schema) is immutable and can be shared
//! across concurrent encode and decode calls. The Object Container File
//! format, the JSON encoding, and reader/writer schema resolution are
//! out of scope; the codec starts where the caller already has bytes
//! and a schema.

pub mod codec;
pub mod error;
pub mod schema;

// Re-export main types
pub use codec::{
    decode, decode_with_options, encode, encode_with_options, AvroValue, Decimal, DecimalMode,
    DecodeOptions, EncodeOptions, TrailingBytesPolicy, UuidFormat,
};
pub use error::{DecodeError, EncodeError, SchemaError};
pub use schema::{
    parse_schema, parse_schema_with_options, AvroSchema, EnumSchema, FieldOrder, FieldSchema,
    FixedSchema, LogicalType, LogicalTypeName, RecordSchema, Schema, SchemaContext, SchemaParser,
};
