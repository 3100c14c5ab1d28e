//! The in-memory value model for the binary codec.
//!
//! Decoded values are freshly allocated and owned by the caller; the
//! encoder borrows values and never mutates them.

use num_bigint::{BigInt, Sign};
use num_traits::{pow, ToPrimitive, Zero};
use serde_json::Value;

use crate::error::EncodeError;
use crate::schema::{AvroSchema, SchemaContext};

/// Represents an Avro value.
#[derive(Debug, Clone, PartialEq)]
pub enum AvroValue {
    /// Null value
    Null,
    /// Boolean value
    Boolean(bool),
    /// 32-bit signed integer
    Int(i32),
    /// 64-bit signed integer
    Long(i64),
    /// 32-bit floating point
    Float(f32),
    /// 64-bit floating point
    Double(f64),
    /// Byte array
    Bytes(Vec<u8>),
    /// UTF-8 string
    String(String),
    /// Record with named fields
    Record(Vec<(String, AvroValue)>),
    /// Enum variant (index and symbol name)
    Enum(i32, String),
    /// Array of values
    Array(Vec<AvroValue>),
    /// Map with string keys
    Map(Vec<(String, AvroValue)>),
    /// Tagged union value: the branch name and the inner value.
    ///
    /// On encode this forces the named branch instead of shape
    /// inference; the decoder produces it only when tagged unions are
    /// requested.
    Union(String, Box<AvroValue>),
    /// Fixed-size byte array
    Fixed(Vec<u8>),

    // Logical type values
    /// Arbitrary-precision decimal
    Decimal(Decimal),
    /// UUID in canonical 36-character text form
    Uuid(String),
    /// Date (days since Unix epoch, 1970-01-01)
    Date(i32),
    /// Time in milliseconds since midnight
    TimeMillis(i32),
    /// Time in microseconds since midnight
    TimeMicros(i64),
    /// Timestamp in milliseconds since Unix epoch
    TimestampMillis(i64),
    /// Timestamp in microseconds since Unix epoch
    TimestampMicros(i64),
    /// Timestamp in nanoseconds since Unix epoch
    TimestampNanos(i64),
    /// Duration (months, days, milliseconds)
    Duration {
        /// Number of months
        months: u32,
        /// Number of days
        days: u32,
        /// Number of milliseconds
        milliseconds: u32,
    },
}

impl AvroValue {
    /// Short name of the value's shape, for error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            AvroValue::Null => "null",
            AvroValue::Boolean(_) => "boolean",
            AvroValue::Int(_) => "int",
            AvroValue::Long(_) => "long",
            AvroValue::Float(_) => "float",
            AvroValue::Double(_) => "double",
            AvroValue::Bytes(_) => "bytes",
            AvroValue::String(_) => "string",
            AvroValue::Record(_) => "record",
            AvroValue::Enum(_, _) => "enum",
            AvroValue::Array(_) => "array",
            AvroValue::Map(_) => "map",
            AvroValue::Union(_, _) => "union",
            AvroValue::Fixed(_) => "fixed",
            AvroValue::Decimal(_) => "decimal",
            AvroValue::Uuid(_) => "uuid",
            AvroValue::Date(_) => "date",
            AvroValue::TimeMillis(_) => "time-millis",
            AvroValue::TimeMicros(_) => "time-micros",
            AvroValue::TimestampMillis(_) => "timestamp-millis",
            AvroValue::TimestampMicros(_) => "timestamp-micros",
            AvroValue::TimestampNanos(_) => "timestamp-nanos",
            AvroValue::Duration { .. } => "duration",
        }
    }

    /// Build a value from a JSON tree under schema direction.
    ///
    /// This is the Avro JSON *default* representation: bytes and fixed
    /// are strings whose code points are byte values, union defaults
    /// belong to the first branch, and missing record fields fall back
    /// to their own defaults.
    pub fn from_json(
        schema: &AvroSchema,
        json: &Value,
        context: &SchemaContext,
    ) -> Result<AvroValue, EncodeError> {
        let mismatch =
            |expected: &str| EncodeError::TypeMismatch(format!("{} expected, found {}", expected, json));
        match schema {
            AvroSchema::Null => match json {
                Value::Null => Ok(AvroValue::Null),
                _ => Err(mismatch("null")),
            },
            AvroSchema::Boolean => match json.as_bool() {
                Some(b) => Ok(AvroValue::Boolean(b)),
                None => Err(mismatch("boolean")),
            },
            AvroSchema::Int => match json.as_i64() {
                Some(n) if n >= i32::MIN as i64 && n <= i32::MAX as i64 => {
                    Ok(AvroValue::Int(n as i32))
                }
                _ => Err(mismatch("int")),
            },
            AvroSchema::Long => match json.as_i64() {
                Some(n) => Ok(AvroValue::Long(n)),
                None => Err(mismatch("long")),
            },
            AvroSchema::Float => match json.as_f64() {
                Some(n) => Ok(AvroValue::Float(n as f32)),
                None => Err(mismatch("float")),
            },
            AvroSchema::Double => match json.as_f64() {
                Some(n) => Ok(AvroValue::Double(n)),
                None => Err(mismatch("double")),
            },
            AvroSchema::Bytes => match json.as_str() {
                Some(s) => Ok(AvroValue::Bytes(codepoint_bytes(s)?)),
                None => Err(mismatch("bytes")),
            },
            AvroSchema::String => match json.as_str() {
                Some(s) => Ok(AvroValue::String(s.to_string())),
                None => Err(mismatch("string")),
            },
            AvroSchema::Enum(e) => match json.as_str() {
                Some(s) => match e.symbol_index(s) {
                    Some(i) => Ok(AvroValue::Enum(i as i32, s.to_string())),
                    None => Err(EncodeError::EnumSymbolNotFound {
                        symbol: s.to_string(),
                    }),
                },
                None => Err(mismatch("enum symbol")),
            },
            AvroSchema::Fixed(f) => match json.as_str() {
                Some(s) => {
                    let bytes = codepoint_bytes(s)?;
                    if bytes.len() != f.size {
                        return Err(EncodeError::FixedSizeMismatch {
                            expected: f.size,
                            actual: bytes.len(),
                        });
                    }
                    Ok(AvroValue::Fixed(bytes))
                }
                None => Err(mismatch("fixed")),
            },
            AvroSchema::Array(items) => match json.as_array() {
                Some(arr) => {
                    let values: Result<Vec<_>, _> = arr
                        .iter()
                        .map(|v| AvroValue::from_json(items, v, context))
                        .collect();
                    Ok(AvroValue::Array(values?))
                }
                None => Err(mismatch("array")),
            },
            AvroSchema::Map(values) => match json.as_object() {
                Some(obj) => {
                    let mut entries = Vec::with_capacity(obj.len());
                    for (k, v) in obj {
                        entries.push((k.clone(), AvroValue::from_json(values, v, context)?));
                    }
                    Ok(AvroValue::Map(entries))
                }
                None => Err(mismatch("map")),
            },
            AvroSchema::Union(branches) => match branches.first() {
                Some(first) => AvroValue::from_json(first, json, context),
                None => Err(EncodeError::TypeMismatch("union has no branches".to_string())),
            },
            AvroSchema::Record(r) => match json.as_object() {
                Some(obj) => {
                    let mut fields = Vec::with_capacity(r.fields.len());
                    for field in &r.fields {
                        let value = match obj.get(&field.name) {
                            Some(v) => AvroValue::from_json(&field.schema, v, context)?,
                            None => match &field.default {
                                Some(d) => AvroValue::from_json(&field.schema, d, context)?,
                                None => {
                                    return Err(EncodeError::TypeMismatch(format!(
                                        "record value missing field '{}'",
                                        field.name
                                    )))
                                }
                            },
                        };
                        fields.push((field.name.clone(), value));
                    }
                    Ok(AvroValue::Record(fields))
                }
                None => Err(mismatch("record")),
            },
            AvroSchema::Named(name) => match context.get(name) {
                Some(resolved) => AvroValue::from_json(resolved, json, context),
                None => Err(EncodeError::UnresolvedReference { name: name.clone() }),
            },
            AvroSchema::Logical(lt) => AvroValue::from_json(&lt.base, json, context),
        }
    }
}

/// Decode an Avro JSON byte string (one byte per code point).
fn codepoint_bytes(s: &str) -> Result<Vec<u8>, EncodeError> {
    s.chars()
        .map(|c| {
            let cp = c as u32;
            if cp <= 0xFF {
                Ok(cp as u8)
            } else {
                Err(EncodeError::TypeMismatch(format!(
                    "byte string contains code point U+{:04X} above 0xFF",
                    cp
                )))
            }
        })
        .collect()
}

/// An arbitrary-precision decimal: an unscaled integer and a scale.
///
/// The numeric value is `unscaled * 10^(-scale)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Decimal {
    /// The unscaled integer value.
    pub unscaled: BigInt,
    /// Number of digits after the decimal point.
    pub scale: u32,
}

impl Decimal {
    /// Create a decimal from an unscaled value and a scale.
    pub fn new(unscaled: impl Into<BigInt>, scale: u32) -> Self {
        Self {
            unscaled: unscaled.into(),
            scale,
        }
    }

    /// Build a decimal from big-endian two's-complement bytes.
    ///
    /// An empty slice is zero.
    pub fn from_twos_complement_be(bytes: &[u8], scale: u32) -> Self {
        let unscaled = if bytes.is_empty() {
            BigInt::zero()
        } else {
            BigInt::from_signed_bytes_be(bytes)
        };
        Self { unscaled, scale }
    }

    /// The unscaled value as minimal big-endian two's-complement bytes.
    pub fn to_twos_complement_be(&self) -> Vec<u8> {
        self.unscaled.to_signed_bytes_be()
    }

    /// Floating-point approximation `unscaled * 10^(-scale)`.
    pub fn to_f64(&self) -> f64 {
        let unscaled = self.unscaled.to_f64().unwrap_or(f64::NAN);
        unscaled * 10f64.powi(-(self.scale as i32))
    }

    /// Number of significant decimal digits in the unscaled value.
    pub fn digits(&self) -> u32 {
        if self.unscaled.is_zero() {
            1
        } else {
            self.unscaled.magnitude().to_string().len() as u32
        }
    }

    /// Whether the unscaled value is negative.
    pub fn is_negative(&self) -> bool {
        self.unscaled.sign() == Sign::Minus
    }

    /// Re-express this decimal at another scale, if exactly representable.
    ///
    /// Scaling up multiplies the unscaled value; scaling down succeeds
    /// only when no nonzero digits are dropped.
    pub fn rescale(&self, scale: u32) -> Option<Decimal> {
        use std::cmp::Ordering;
        match scale.cmp(&self.scale) {
            Ordering::Equal => Some(self.clone()),
            Ordering::Greater => {
                let factor = ten_pow(scale - self.scale);
                Some(Decimal {
                    unscaled: &self.unscaled * factor,
                    scale,
                })
            }
            Ordering::Less => {
                let factor = ten_pow(self.scale - scale);
                let remainder = &self.unscaled % &factor;
                if remainder.is_zero() {
                    Some(Decimal {
                        unscaled: &self.unscaled / factor,
                        scale,
                    })
                } else {
                    None
                }
            }
        }
    }
}

fn ten_pow(exp: u32) -> BigInt {
    pow(BigInt::from(10), exp as usize)
}

// ============================================================================
// Union branch selection
// ============================================================================

/// The name a union branch answers to when tagging.
///
/// Named branches use their fullname, primitives their type name, and
/// the unnamed container kinds their kind.
pub(crate) fn branch_tag(schema: &AvroSchema) -> String {
    match schema {
        AvroSchema::Null => "null".to_string(),
        AvroSchema::Boolean => "boolean".to_string(),
        AvroSchema::Int => "int".to_string(),
        AvroSchema::Long => "long".to_string(),
        AvroSchema::Float => "float".to_string(),
        AvroSchema::Double => "double".to_string(),
        AvroSchema::Bytes => "bytes".to_string(),
        AvroSchema::String => "string".to_string(),
        AvroSchema::Array(_) => "array".to_string(),
        AvroSchema::Map(_) => "map".to_string(),
        AvroSchema::Record(r) => r.fullname(),
        AvroSchema::Enum(e) => e.fullname(),
        AvroSchema::Fixed(f) => f.fullname(),
        AvroSchema::Named(n) => n.clone(),
        AvroSchema::Union(_) => "union".to_string(),
        AvroSchema::Logical(lt) => branch_tag(&lt.base),
    }
}

/// Select the union branch for a value by runtime shape.
///
/// Two passes: exact shape matches first, then widening matches
/// (narrower numeric types into wider branches, strings into enums,
/// bytes into fixed, raw primitives into logical branches). The
/// two-pass walk is what makes "prefer narrower" hold regardless of
/// branch order.
pub(crate) fn select_branch<'a>(
    branches: &'a [AvroSchema],
    value: &AvroValue,
    context: &SchemaContext,
) -> Option<(usize, &'a AvroSchema)> {
    for (i, branch) in branches.iter().enumerate() {
        if branch_matches(value, branch, context, true) {
            return Some((i, branch));
        }
    }
    for (i, branch) in branches.iter().enumerate() {
        if branch_matches(value, branch, context, false) {
            return Some((i, branch));
        }
    }
    None
}

/// Select the union branch named by a tagged value.
pub(crate) fn select_branch_by_name<'a>(
    branches: &'a [AvroSchema],
    name: &str,
) -> Option<(usize, &'a AvroSchema)> {
    branches
        .iter()
        .enumerate()
        .find(|(_, b)| branch_tag(b) == name)
}

/// Whether a value can encode under a branch schema.
///
/// `exact` restricts matching to the value's own shape; the widening
/// pass additionally accepts compatible conversions.
fn branch_matches(
    value: &AvroValue,
    branch: &AvroSchema,
    context: &SchemaContext,
    exact: bool,
) -> bool {
    match branch {
        AvroSchema::Named(name) => match context.get(name) {
            Some(resolved) => branch_matches(value, resolved, context, exact),
            None => false,
        },
        AvroSchema::Null => matches!(value, AvroValue::Null),
        AvroSchema::Boolean => matches!(value, AvroValue::Boolean(_)),
        AvroSchema::Int => match value {
            AvroValue::Int(_) => true,
            AvroValue::Long(v) if !exact => {
                *v >= i32::MIN as i64 && *v <= i32::MAX as i64
            }
            _ => false,
        },
        AvroSchema::Long => match value {
            AvroValue::Long(_) => true,
            AvroValue::Int(_) => !exact,
            _ => false,
        },
        AvroSchema::Float => match value {
            AvroValue::Float(_) => true,
            AvroValue::Int(_) | AvroValue::Long(_) => !exact,
            _ => false,
        },
        AvroSchema::Double => match value {
            AvroValue::Double(_) => true,
            AvroValue::Float(_) | AvroValue::Int(_) | AvroValue::Long(_) => !exact,
            _ => false,
        },
        AvroSchema::Bytes => match value {
            AvroValue::Bytes(_) => true,
            AvroValue::Fixed(_) => !exact,
            _ => false,
        },
        AvroSchema::String => match value {
            AvroValue::String(_) => true,
            AvroValue::Uuid(_) | AvroValue::Enum(_, _) => !exact,
            _ => false,
        },
        AvroSchema::Record(r) => match value {
            AvroValue::Record(fields) => {
                // All fields without a default must be present
                r.fields.iter().all(|f| {
                    f.default.is_some() || fields.iter().any(|(name, _)| *name == f.name)
                })
            }
            _ => false,
        },
        AvroSchema::Enum(e) => match value {
            AvroValue::Enum(_, symbol) => e.symbols.iter().any(|s| s == symbol),
            AvroValue::String(s) if !exact => e.symbols.iter().any(|sym| sym == s),
            _ => false,
        },
        AvroSchema::Array(_) => matches!(value, AvroValue::Array(_)),
        AvroSchema::Map(_) => matches!(value, AvroValue::Map(_)),
        AvroSchema::Fixed(f) => match value {
            AvroValue::Fixed(b) => b.len() == f.size,
            AvroValue::Bytes(b) if !exact => b.len() == f.size,
            _ => false,
        },
        AvroSchema::Union(_) => false,
        AvroSchema::Logical(lt) => {
            logical_value_matches(value, lt, exact)
                || (!exact && branch_matches(value, &lt.base, context, false))
        }
    }
}

fn logical_value_matches(
    value: &AvroValue,
    lt: &crate::schema::LogicalType,
    exact: bool,
) -> bool {
    use crate::schema::LogicalTypeName as L;
    match (&lt.logical_type, value) {
        (L::Decimal { .. }, AvroValue::Decimal(_)) => true,
        (L::Uuid, AvroValue::Uuid(_)) => true,
        (L::Uuid, AvroValue::String(_)) => !exact,
        (L::Date, AvroValue::Date(_)) => true,
        (L::TimeMillis, AvroValue::TimeMillis(_)) => true,
        (L::TimeMicros, AvroValue::TimeMicros(_)) => true,
        (L::TimeMillis, AvroValue::TimeMicros(_)) | (L::TimeMicros, AvroValue::TimeMillis(_)) => {
            !exact
        }
        (
            L::TimestampMillis | L::LocalTimestampMillis,
            AvroValue::TimestampMillis(_),
        ) => true,
        (
            L::TimestampMicros | L::LocalTimestampMicros,
            AvroValue::TimestampMicros(_),
        ) => true,
        (L::TimestampNanos, AvroValue::TimestampNanos(_)) => true,
        (
            L::TimestampMillis
            | L::TimestampMicros
            | L::TimestampNanos
            | L::LocalTimestampMillis
            | L::LocalTimestampMicros,
            AvroValue::TimestampMillis(_)
            | AvroValue::TimestampMicros(_)
            | AvroValue::TimestampNanos(_),
        ) => !exact,
        (L::Duration, AvroValue::Duration { .. }) => true,
        _ => false,
    }
}
