//! Avro binary encoder for primitive and complex types.
//!
//! The encoder is schema-directed: the in-memory value is interpreted
//! through the schema node, field by field, branch by branch. Output is
//! deterministic; encoding the same value under the same schema always
//! yields the same bytes.

use crate::codec::value::{branch_tag, select_branch, select_branch_by_name, AvroValue, Decimal};
use crate::codec::varint::encode_zigzag;
use crate::error::EncodeError;
use crate::schema::{
    AvroSchema, EnumSchema, FixedSchema, LogicalType, LogicalTypeName, RecordSchema, Schema,
    SchemaContext,
};

/// Options recognized by the encoder.
#[derive(Debug, Clone, Default)]
pub struct EncodeOptions {
    /// Emit the optional byte-length prefix on array and map blocks
    /// (negated count followed by the block's byte size), letting
    /// decoders skip blocks without parsing items.
    pub include_block_byte_size: bool,
}

/// Encode a value under a schema with default options.
pub fn encode(schema: &Schema, value: &AvroValue) -> Result<Vec<u8>, EncodeError> {
    encode_with_options(schema, value, &EncodeOptions::default())
}

/// Encode a value under a schema.
pub fn encode_with_options(
    schema: &Schema,
    value: &AvroValue,
    options: &EncodeOptions,
) -> Result<Vec<u8>, EncodeError> {
    let mut out = Vec::new();
    let mut encoder = Encoder {
        context: schema.context(),
        options,
        path: Vec::new(),
    };
    encoder.encode_value(schema.root(), value, &mut out)?;
    Ok(out)
}

// ============================================================================
// Primitive writers
// ============================================================================

/// Append a boolean as a single byte, 0x00 or 0x01.
#[inline]
pub fn encode_boolean(value: bool, out: &mut Vec<u8>) {
    out.push(u8::from(value));
}

/// Append a 32-bit signed integer (zigzag varint encoded).
#[inline]
pub fn encode_int(value: i32, out: &mut Vec<u8>) {
    encode_zigzag(value as i64, out);
}

/// Append a 64-bit signed integer (zigzag varint encoded).
#[inline]
pub fn encode_long(value: i64, out: &mut Vec<u8>) {
    encode_zigzag(value, out);
}

/// Append a 32-bit IEEE 754 floating-point number (little-endian).
#[inline]
pub fn encode_float(value: f32, out: &mut Vec<u8>) {
    out.extend_from_slice(&value.to_le_bytes());
}

/// Append a 64-bit IEEE 754 floating-point number (little-endian).
#[inline]
pub fn encode_double(value: f64, out: &mut Vec<u8>) {
    out.extend_from_slice(&value.to_le_bytes());
}

/// Append a byte array (long-encoded length followed by raw bytes).
#[inline]
pub fn encode_bytes(value: &[u8], out: &mut Vec<u8>) {
    encode_zigzag(value.len() as i64, out);
    out.extend_from_slice(value);
}

/// Append a UTF-8 string (long-encoded byte length followed by raw bytes).
#[inline]
pub fn encode_string(value: &str, out: &mut Vec<u8>) {
    encode_bytes(value.as_bytes(), out);
}

/// Parse canonical 36-character UUID text into raw bytes.
///
/// Expects lowercase or uppercase hex with hyphens at positions
/// 8, 13, 18, and 23.
pub(crate) fn parse_uuid_text(s: &str) -> Option<[u8; 16]> {
    let b = s.as_bytes();
    if b.len() != 36 || b[8] != b'-' || b[13] != b'-' || b[18] != b'-' || b[23] != b'-' {
        return None;
    }
    let mut out = [0u8; 16];
    let mut idx = 0;
    let mut i = 0;
    while i < 36 {
        if matches!(i, 8 | 13 | 18 | 23) {
            i += 1;
            continue;
        }
        let hi = (b[i] as char).to_digit(16)?;
        let lo = (b[i + 1] as char).to_digit(16)?;
        out[idx] = ((hi << 4) | lo) as u8;
        idx += 1;
        i += 2;
    }
    Some(out)
}

// ============================================================================
// Schema-directed encoder
// ============================================================================

struct Encoder<'a> {
    context: &'a SchemaContext,
    options: &'a EncodeOptions,
    path: Vec<String>,
}

impl<'a> Encoder<'a> {
    fn json_path(&self) -> String {
        let mut out = String::from("$");
        for segment in &self.path {
            out.push_str(segment);
        }
        out
    }

    fn mismatch(&self, expected: &str, value: &AvroValue) -> EncodeError {
        EncodeError::TypeMismatch(format!(
            "schema expects {}, value is {}",
            expected,
            value.type_name()
        ))
    }

    fn encode_value(
        &mut self,
        schema: &AvroSchema,
        value: &AvroValue,
        out: &mut Vec<u8>,
    ) -> Result<(), EncodeError> {
        if self.path.is_empty() {
            // Root errors carry no useful path
            self.encode_value_inner(schema, value, out)
        } else {
            self.encode_value_inner(schema, value, out)
                .map_err(|e| e.at(self.json_path()))
        }
    }

    fn encode_value_inner(
        &mut self,
        schema: &AvroSchema,
        value: &AvroValue,
        out: &mut Vec<u8>,
    ) -> Result<(), EncodeError> {
        match schema {
            AvroSchema::Null => match value {
                AvroValue::Null => Ok(()),
                other => Err(self.mismatch("null", other)),
            },
            AvroSchema::Boolean => match value {
                AvroValue::Boolean(b) => {
                    encode_boolean(*b, out);
                    Ok(())
                }
                other => Err(self.mismatch("boolean", other)),
            },
            AvroSchema::Int => {
                let v = self.int_value(value)?;
                encode_int(v, out);
                Ok(())
            }
            AvroSchema::Long => {
                let v = self.long_value(value)?;
                encode_long(v, out);
                Ok(())
            }
            AvroSchema::Float => match value {
                AvroValue::Float(f) => {
                    encode_float(*f, out);
                    Ok(())
                }
                AvroValue::Int(i) => {
                    encode_float(*i as f32, out);
                    Ok(())
                }
                AvroValue::Long(l) => {
                    encode_float(*l as f32, out);
                    Ok(())
                }
                other => Err(self.mismatch("float", other)),
            },
            AvroSchema::Double => match value {
                AvroValue::Double(d) => {
                    encode_double(*d, out);
                    Ok(())
                }
                AvroValue::Float(f) => {
                    encode_double(*f as f64, out);
                    Ok(())
                }
                AvroValue::Int(i) => {
                    encode_double(*i as f64, out);
                    Ok(())
                }
                AvroValue::Long(l) => {
                    encode_double(*l as f64, out);
                    Ok(())
                }
                other => Err(self.mismatch("double", other)),
            },
            AvroSchema::Bytes => match value {
                AvroValue::Bytes(b) | AvroValue::Fixed(b) => {
                    encode_bytes(b, out);
                    Ok(())
                }
                other => Err(self.mismatch("bytes", other)),
            },
            AvroSchema::String => match value {
                AvroValue::String(s) | AvroValue::Uuid(s) => {
                    encode_string(s, out);
                    Ok(())
                }
                other => Err(self.mismatch("string", other)),
            },
            AvroSchema::Record(record) => self.encode_record(record, value, out),
            AvroSchema::Enum(e) => self.encode_enum(e, value, out),
            AvroSchema::Array(items) => match value {
                AvroValue::Array(values) => self.encode_array(items, values, out),
                other => Err(self.mismatch("array", other)),
            },
            AvroSchema::Map(values_schema) => match value {
                AvroValue::Map(entries) => self.encode_map(values_schema, entries, out),
                other => Err(self.mismatch("map", other)),
            },
            AvroSchema::Union(branches) => self.encode_union(branches, value, out),
            AvroSchema::Fixed(fixed) => self.encode_fixed(fixed, value, out),
            AvroSchema::Named(name) => match self.context.get(name) {
                Some(resolved) => {
                    let resolved = resolved.clone();
                    self.encode_value_inner(&resolved, value, out)
                }
                None => Err(EncodeError::UnresolvedReference { name: name.clone() }),
            },
            AvroSchema::Logical(lt) => self.encode_logical(lt, value, out),
        }
    }

    fn int_value(&self, value: &AvroValue) -> Result<i32, EncodeError> {
        match value {
            AvroValue::Int(v) => Ok(*v),
            AvroValue::Long(v) => {
                if *v >= i32::MIN as i64 && *v <= i32::MAX as i64 {
                    Ok(*v as i32)
                } else {
                    Err(EncodeError::TypeMismatch(format!(
                        "{} does not fit in a signed 32-bit int",
                        v
                    )))
                }
            }
            other => Err(self.mismatch("int", other)),
        }
    }

    fn long_value(&self, value: &AvroValue) -> Result<i64, EncodeError> {
        match value {
            AvroValue::Long(v) => Ok(*v),
            AvroValue::Int(v) => Ok(*v as i64),
            other => Err(self.mismatch("long", other)),
        }
    }

    /// Record fields are encoded in declared order, concatenated with
    /// no framing. Missing fields fall back to their schema default.
    fn encode_record(
        &mut self,
        record: &RecordSchema,
        value: &AvroValue,
        out: &mut Vec<u8>,
    ) -> Result<(), EncodeError> {
        let entries = match value {
            AvroValue::Record(entries) | AvroValue::Map(entries) => entries,
            other => return Err(self.mismatch("record", other)),
        };

        for field in &record.fields {
            self.path.push(format!(".{}", field.name));
            let result = match entries.iter().find(|(name, _)| *name == field.name) {
                Some((_, field_value)) => self.encode_value(&field.schema, field_value, out),
                None => match &field.default {
                    Some(default) => {
                        let value = AvroValue::from_json(&field.schema, default, self.context)?;
                        self.encode_value(&field.schema, &value, out)
                    }
                    None => Err(EncodeError::TypeMismatch(format!(
                        "record value missing field '{}'",
                        field.name
                    ))),
                },
            };
            self.path.pop();
            result?;
        }
        Ok(())
    }

    /// Enums encode as the long zero-based index of the symbol.
    fn encode_enum(
        &mut self,
        e: &EnumSchema,
        value: &AvroValue,
        out: &mut Vec<u8>,
    ) -> Result<(), EncodeError> {
        let symbol = match value {
            AvroValue::Enum(_, symbol) => symbol,
            AvroValue::String(s) => s,
            other => return Err(self.mismatch("enum symbol", other)),
        };
        match e.symbol_index(symbol) {
            Some(index) => {
                encode_long(index as i64, out);
                Ok(())
            }
            None => Err(EncodeError::EnumSymbolNotFound {
                symbol: symbol.clone(),
            }),
        }
    }

    /// Arrays encode as blocks: `<count><items...>` then a zero-count
    /// terminator. Empty arrays are the single terminator byte.
    fn encode_array(
        &mut self,
        item_schema: &AvroSchema,
        items: &[AvroValue],
        out: &mut Vec<u8>,
    ) -> Result<(), EncodeError> {
        if !items.is_empty() {
            let mut body = Vec::new();
            for (i, item) in items.iter().enumerate() {
                self.path.push(format!("[{}]", i));
                let result = self.encode_value(item_schema, item, &mut body);
                self.path.pop();
                result?;
            }
            self.write_block(items.len(), &body, out);
        }
        out.push(0);
        Ok(())
    }

    /// Maps encode exactly like arrays with string-keyed items.
    fn encode_map(
        &mut self,
        value_schema: &AvroSchema,
        entries: &[(String, AvroValue)],
        out: &mut Vec<u8>,
    ) -> Result<(), EncodeError> {
        if !entries.is_empty() {
            let mut body = Vec::new();
            for (key, item) in entries {
                encode_string(key, &mut body);
                self.path.push(format!(".{}", key));
                let result = self.encode_value(value_schema, item, &mut body);
                self.path.pop();
                result?;
            }
            self.write_block(entries.len(), &body, out);
        }
        out.push(0);
        Ok(())
    }

    /// Write one container block. With the byte-size option the count
    /// is negated and followed by the body length, so consumers can
    /// jump the block without parsing items.
    fn write_block(&self, count: usize, body: &[u8], out: &mut Vec<u8>) {
        if self.options.include_block_byte_size {
            encode_long(-(count as i64), out);
            encode_long(body.len() as i64, out);
        } else {
            encode_long(count as i64, out);
        }
        out.extend_from_slice(body);
    }

    /// Unions encode the branch index as a long, then the branch value.
    ///
    /// A tagged value forces its named branch; anything else picks the
    /// first branch matching the value's runtime shape.
    fn encode_union(
        &mut self,
        branches: &[AvroSchema],
        value: &AvroValue,
        out: &mut Vec<u8>,
    ) -> Result<(), EncodeError> {
        let (index, branch, inner) = match value {
            AvroValue::Union(name, inner) => match select_branch_by_name(branches, name) {
                Some((i, branch)) => (i, branch, inner.as_ref()),
                None => {
                    return Err(EncodeError::UnionBranchNotFound(format!(
                        "no branch named '{}' among [{}]",
                        name,
                        branch_names(branches)
                    )))
                }
            },
            other => match select_branch(branches, other, self.context) {
                Some((i, branch)) => (i, branch, other),
                None => {
                    return Err(EncodeError::UnionBranchNotFound(format!(
                        "value of type {} matches none of [{}]",
                        other.type_name(),
                        branch_names(branches)
                    )))
                }
            },
        };

        encode_long(index as i64, out);
        self.path.push(format!("[{}]", index));
        let result = self.encode_value(branch, inner, out);
        self.path.pop();
        result
    }

    /// Fixed encodes as exactly `size` raw bytes.
    fn encode_fixed(
        &mut self,
        fixed: &FixedSchema,
        value: &AvroValue,
        out: &mut Vec<u8>,
    ) -> Result<(), EncodeError> {
        let bytes = match value {
            AvroValue::Fixed(b) | AvroValue::Bytes(b) => b,
            other => return Err(self.mismatch("fixed", other)),
        };
        if bytes.len() != fixed.size {
            return Err(EncodeError::FixedSizeMismatch {
                expected: fixed.size,
                actual: bytes.len(),
            });
        }
        out.extend_from_slice(bytes);
        Ok(())
    }

    // --------------------------------------------------------------------
    // Logical types
    // --------------------------------------------------------------------

    fn encode_logical(
        &mut self,
        lt: &LogicalType,
        value: &AvroValue,
        out: &mut Vec<u8>,
    ) -> Result<(), EncodeError> {
        match &lt.logical_type {
            LogicalTypeName::Decimal { precision, scale } => {
                self.encode_decimal(&lt.base, *precision, *scale, value, out)
            }
            LogicalTypeName::Uuid => self.encode_uuid(&lt.base, value, out),
            LogicalTypeName::Date => {
                let days = match value {
                    AvroValue::Date(d) => *d,
                    other => self.int_value(other)?,
                };
                encode_int(days, out);
                Ok(())
            }
            LogicalTypeName::TimeMillis => {
                let millis = match value {
                    AvroValue::TimeMillis(t) => *t,
                    AvroValue::TimeMicros(t) => i32::try_from(t.div_euclid(1_000))
                        .map_err(|_| self.mismatch("time-millis", value))?,
                    other => self.int_value(other)?,
                };
                if !(0..86_400_000).contains(&millis) {
                    return Err(EncodeError::TypeMismatch(format!(
                        "time-millis value {} outside [0, 86400000)",
                        millis
                    )));
                }
                encode_int(millis, out);
                Ok(())
            }
            LogicalTypeName::TimeMicros => {
                let micros = match value {
                    AvroValue::TimeMicros(t) => *t,
                    AvroValue::TimeMillis(t) => (*t as i64) * 1_000,
                    other => self.long_value(other)?,
                };
                if !(0..86_400_000_000).contains(&micros) {
                    return Err(EncodeError::TypeMismatch(format!(
                        "time-micros value {} outside [0, 86400000000)",
                        micros
                    )));
                }
                encode_long(micros, out);
                Ok(())
            }
            LogicalTypeName::TimestampMillis | LogicalTypeName::LocalTimestampMillis => {
                let millis = self.timestamp_value(value, TimestampUnit::Millis)?;
                encode_long(millis, out);
                Ok(())
            }
            LogicalTypeName::TimestampMicros | LogicalTypeName::LocalTimestampMicros => {
                let micros = self.timestamp_value(value, TimestampUnit::Micros)?;
                encode_long(micros, out);
                Ok(())
            }
            LogicalTypeName::TimestampNanos => {
                let nanos = self.timestamp_value(value, TimestampUnit::Nanos)?;
                encode_long(nanos, out);
                Ok(())
            }
            LogicalTypeName::Duration => self.encode_duration(&lt.base, value, out),
        }
    }

    /// Convert a timestamp value to the schema's unit, truncating
    /// sub-unit precision (flooring, so pre-epoch instants stay ordered).
    fn timestamp_value(
        &self,
        value: &AvroValue,
        unit: TimestampUnit,
    ) -> Result<i64, EncodeError> {
        let nanos_per = |u: TimestampUnit| match u {
            TimestampUnit::Millis => 1_000_000i64,
            TimestampUnit::Micros => 1_000,
            TimestampUnit::Nanos => 1,
        };
        let (raw, raw_unit) = match value {
            AvroValue::TimestampMillis(t) => (*t, TimestampUnit::Millis),
            AvroValue::TimestampMicros(t) => (*t, TimestampUnit::Micros),
            AvroValue::TimestampNanos(t) => (*t, TimestampUnit::Nanos),
            other => return self.long_value(other),
        };
        let from = nanos_per(raw_unit);
        let to = nanos_per(unit);
        if from >= to {
            raw.checked_mul(from / to).ok_or_else(|| {
                EncodeError::TypeMismatch(format!(
                    "timestamp {} overflows the {} unit",
                    raw,
                    unit.name()
                ))
            })
        } else {
            Ok(raw.div_euclid(to / from))
        }
    }

    /// Decimal encodes the unscaled integer as two's-complement
    /// big-endian bytes: minimal length for a bytes base, sign-extended
    /// to the declared size for a fixed base.
    fn encode_decimal(
        &mut self,
        base: &AvroSchema,
        precision: u32,
        scale: u32,
        value: &AvroValue,
        out: &mut Vec<u8>,
    ) -> Result<(), EncodeError> {
        let decimal = match value {
            AvroValue::Decimal(d) => d.clone(),
            AvroValue::Int(v) => Decimal::new(*v, 0),
            AvroValue::Long(v) => Decimal::new(*v, 0),
            other => return Err(self.mismatch("decimal", other)),
        };

        let scaled = decimal.rescale(scale).ok_or_else(|| {
            EncodeError::DecimalOutOfRange(format!(
                "scale {} value is not representable at schema scale {}",
                decimal.scale, scale
            ))
        })?;
        if scaled.digits() > precision {
            return Err(EncodeError::DecimalOutOfRange(format!(
                "{} digits exceed precision {}",
                scaled.digits(),
                precision
            )));
        }

        let bytes = scaled.to_twos_complement_be();
        match base {
            AvroSchema::Bytes => {
                encode_bytes(&bytes, out);
                Ok(())
            }
            AvroSchema::Fixed(f) => {
                if bytes.len() > f.size {
                    return Err(EncodeError::DecimalOutOfRange(format!(
                        "unscaled value needs {} bytes, fixed size is {}",
                        bytes.len(),
                        f.size
                    )));
                }
                let fill = if scaled.is_negative() { 0xFF } else { 0x00 };
                out.resize(out.len() + f.size - bytes.len(), fill);
                out.extend_from_slice(&bytes);
                Ok(())
            }
            other => Err(EncodeError::TypeMismatch(format!(
                "decimal base must be bytes or fixed, found {:?}",
                other
            ))),
        }
    }

    /// UUID on string writes canonical text; on fixed[16] it writes raw
    /// bytes, parsing canonical text first when that is what arrived.
    fn encode_uuid(
        &mut self,
        base: &AvroSchema,
        value: &AvroValue,
        out: &mut Vec<u8>,
    ) -> Result<(), EncodeError> {
        match base {
            AvroSchema::String => match value {
                AvroValue::Uuid(s) | AvroValue::String(s) => {
                    if parse_uuid_text(s).is_none() {
                        return Err(EncodeError::InvalidUuid { text: s.clone() });
                    }
                    encode_string(s, out);
                    Ok(())
                }
                other => Err(self.mismatch("uuid", other)),
            },
            AvroSchema::Fixed(f) if f.size == 16 => match value {
                AvroValue::Fixed(b) | AvroValue::Bytes(b) => {
                    if b.len() != 16 {
                        return Err(EncodeError::FixedSizeMismatch {
                            expected: 16,
                            actual: b.len(),
                        });
                    }
                    out.extend_from_slice(b);
                    Ok(())
                }
                AvroValue::Uuid(s) | AvroValue::String(s) => match parse_uuid_text(s) {
                    Some(bytes) => {
                        out.extend_from_slice(&bytes);
                        Ok(())
                    }
                    None => Err(EncodeError::InvalidUuid { text: s.clone() }),
                },
                other => Err(self.mismatch("uuid", other)),
            },
            other => Err(EncodeError::TypeMismatch(format!(
                "uuid base must be string or fixed[16], found {:?}",
                other
            ))),
        }
    }

    /// Duration encodes as fixed[12]: three little-endian u32 values
    /// (months, days, milliseconds).
    fn encode_duration(
        &mut self,
        base: &AvroSchema,
        value: &AvroValue,
        out: &mut Vec<u8>,
    ) -> Result<(), EncodeError> {
        match base {
            AvroSchema::Fixed(f) if f.size == 12 => match value {
                AvroValue::Duration {
                    months,
                    days,
                    milliseconds,
                } => {
                    out.extend_from_slice(&months.to_le_bytes());
                    out.extend_from_slice(&days.to_le_bytes());
                    out.extend_from_slice(&milliseconds.to_le_bytes());
                    Ok(())
                }
                AvroValue::Fixed(b) if b.len() == 12 => {
                    out.extend_from_slice(b);
                    Ok(())
                }
                other => Err(self.mismatch("duration", other)),
            },
            other => Err(EncodeError::TypeMismatch(format!(
                "duration base must be fixed[12], found {:?}",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum TimestampUnit {
    Millis,
    Micros,
    Nanos,
}

impl TimestampUnit {
    fn name(self) -> &'static str {
        match self {
            TimestampUnit::Millis => "millisecond",
            TimestampUnit::Micros => "microsecond",
            TimestampUnit::Nanos => "nanosecond",
        }
    }
}

fn branch_names(branches: &[AvroSchema]) -> String {
    branches
        .iter()
        .map(|b| branch_tag(b))
        .collect::<Vec<_>>()
        .join(", ")
}
