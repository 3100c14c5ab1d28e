//! Avro schema types, parsing, and the named type context.
//!
//! This module defines the complete Avro schema type system including
//! primitives, complex types, logical types, JSON parsing, and the
//! fullname registry that resolves named references.

mod context;
mod parser;
mod types;

pub use context::{Schema, SchemaContext};
pub use parser::{parse_schema, parse_schema_with_options, SchemaParser};
pub use types::*;
