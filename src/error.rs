//! Error types for schema parsing and the binary codec.

use thiserror::Error;

/// Errors that can occur while parsing and validating a schema.
///
/// Every variant carries the JSON path of the offending node, in
/// `$.fields[2].type` form, so the error can be traced back into the
/// schema document.
#[derive(Debug, Error)]
pub enum SchemaError {
    /// The input was not valid JSON.
    #[error("invalid JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),
    /// A name does not follow the Avro naming rules.
    #[error("invalid name '{name}' at {path}: {message}")]
    InvalidName {
        path: String,
        name: String,
        message: String,
    },
    /// A fullname, alias, field name, or enum symbol is defined twice.
    #[error("duplicate name '{name}' at {path}")]
    DuplicateName { path: String, name: String },
    /// A named reference never resolves to a definition in the document.
    #[error("unknown reference '{name}' at {path}")]
    UnknownReference { path: String, name: String },
    /// A union violates the branch rules (nested or duplicate branch type).
    #[error("invalid union at {path}: {message}")]
    InvalidUnion { path: String, message: String },
    /// A field or enum default does not match its schema.
    #[error("invalid default at {path}: {message}")]
    InvalidDefault { path: String, message: String },
    /// A logical type annotation fails its own validation.
    #[error("invalid logical type at {path}: {message}")]
    InvalidLogicalType { path: String, message: String },
    /// A required key is missing from a schema object.
    #[error("missing required field '{field}' at {path}")]
    MissingRequiredField { path: String, field: String },
    /// An unknown key appeared in a schema object (strict mode only).
    #[error("unrecognized key '{key}' at {path}")]
    UnrecognizedKey { path: String, key: String },
    /// A structural problem not covered by the more specific variants.
    #[error("invalid schema at {path}: {message}")]
    InvalidSchema { path: String, message: String },
}

/// Errors that can occur while encoding a value under a schema.
#[derive(Debug, Error)]
pub enum EncodeError {
    /// The value does not fit the schema node directing the encoding.
    #[error("type mismatch: {0}")]
    TypeMismatch(String),
    /// No union branch accepts the value, or a tagged branch name is unknown.
    #[error("no union branch matches: {0}")]
    UnionBranchNotFound(String),
    /// The symbol is not part of the enum's declared symbols.
    #[error("unknown enum symbol '{symbol}'")]
    EnumSymbolNotFound { symbol: String },
    /// A fixed value has the wrong length.
    #[error("fixed size mismatch: expected {expected} bytes, got {actual}")]
    FixedSizeMismatch { expected: usize, actual: usize },
    /// A UUID value is not canonical 36-character text.
    #[error("invalid UUID text '{text}'")]
    InvalidUuid { text: String },
    /// A decimal value cannot be represented under the schema's
    /// precision, scale, or fixed size.
    #[error("decimal out of range: {0}")]
    DecimalOutOfRange(String),
    /// A named reference is missing from the schema context.
    #[error("unresolved named type reference '{name}'")]
    UnresolvedReference { name: String },
    /// Wraps an error with the schema path where it occurred.
    #[error("{source} (at {path})")]
    Context {
        path: String,
        #[source]
        source: Box<EncodeError>,
    },
}

impl EncodeError {
    /// Attach a schema path unless one is already attached.
    ///
    /// The deepest frame wins, so the path points at the exact node
    /// that rejected the value.
    pub(crate) fn at(self, path: String) -> EncodeError {
        match self {
            EncodeError::Context { .. } => self,
            other => EncodeError::Context {
                path,
                source: Box::new(other),
            },
        }
    }
}

/// Errors that can occur while decoding Avro binary data.
#[derive(Debug, Error)]
pub enum DecodeError {
    /// The input ended before the value was complete.
    #[error("unexpected end of input")]
    UnexpectedEof,
    /// A varint ran past the 10-byte limit for 64-bit values.
    #[error("invalid varint encoding")]
    InvalidVarint,
    /// The bytes are structurally invalid for the schema node.
    #[error("invalid data: {0}")]
    InvalidData(String),
    /// A string's bytes are not valid UTF-8. Carries the offending bytes.
    #[error("invalid UTF-8 string ({} bytes)", .bytes.len())]
    InvalidString { bytes: Vec<u8> },
    /// A fixed-backed UUID does not have the 16 bytes a UUID requires.
    #[error("invalid binary UUID: {len} bytes, expected 16")]
    InvalidBinaryUuid { len: usize },
    /// A union branch index is outside the declared branch list.
    #[error("union branch index {index} out of range (0..{len})")]
    UnionIndexOutOfRange { index: i64, len: usize },
    /// An enum index is outside the declared symbol list.
    #[error("enum index {index} out of range (0..{len})")]
    EnumIndexOutOfRange { index: i64, len: usize },
    /// A named reference is missing from the schema context.
    #[error("unresolved named type reference '{name}'")]
    UnresolvedReference { name: String },
    /// Bytes remain after a complete decode and the caller asked to know.
    #[error("{remaining} trailing bytes after value")]
    TrailingBytes { remaining: usize },
    /// Wraps an error with the schema path where it occurred.
    #[error("{source} (at {path})")]
    Context {
        path: String,
        #[source]
        source: Box<DecodeError>,
    },
}

impl DecodeError {
    /// Attach a schema path unless one is already attached.
    pub(crate) fn at(self, path: String) -> DecodeError {
        match self {
            DecodeError::Context { .. } => self,
            other => DecodeError::Context {
                path,
                source: Box::new(other),
            },
        }
    }
}
