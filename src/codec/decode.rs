//! Avro binary decoder for primitive and complex types.
//!
//! The decoder consumes a fully materialized byte buffer left to right
//! under schema direction:
//! - Varints use zigzag encoding for signed integers
//! - Floats and doubles are little-endian IEEE 754
//! - Bytes and strings are length-prefixed
//! - Arrays and maps arrive in counted blocks

use crate::codec::value::{branch_tag, AvroValue, Decimal};
use crate::codec::varint;
use crate::error::DecodeError;
use crate::schema::{
    AvroSchema, EnumSchema, LogicalType, LogicalTypeName, RecordSchema, Schema, SchemaContext,
};

/// How decimal logical values are materialized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DecimalMode {
    /// A floating-point approximation, `unscaled * 10^(-scale)`.
    #[default]
    Approximate,
    /// An arbitrary-precision [`Decimal`].
    Exact,
}

/// Output representation of a fixed[16]-backed UUID.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UuidFormat {
    /// The raw 16 bytes.
    #[default]
    Binary,
    /// Canonical lowercase `8-4-4-4-12` text.
    CanonicalString,
}

/// What to do with bytes left over after a complete decode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TrailingBytesPolicy {
    /// Ignore them, like the reference implementation.
    #[default]
    Allow,
    /// Fail with [`DecodeError::TrailingBytes`].
    Report,
}

/// Options recognized by the decoder.
#[derive(Debug, Clone, Default)]
pub struct DecodeOptions {
    /// Return unions as `Union(branch_name, value)` instead of the bare
    /// inner value. Null branches stay raw null either way.
    pub tagged_unions: bool,
    /// Decimal materialization mode.
    pub decimals: DecimalMode,
    /// Fixed-backed UUID output format.
    pub uuid_format: UuidFormat,
    /// Policy for leftover input.
    pub trailing_bytes: TrailingBytesPolicy,
}

/// Decode a value under a schema with default options.
pub fn decode(schema: &Schema, data: &[u8]) -> Result<AvroValue, DecodeError> {
    decode_with_options(schema, data, &DecodeOptions::default())
}

/// Decode a value under a schema.
pub fn decode_with_options(
    schema: &Schema,
    data: &[u8],
    options: &DecodeOptions,
) -> Result<AvroValue, DecodeError> {
    let mut cursor = data;
    let mut decoder = Decoder {
        context: schema.context(),
        options,
        path: Vec::new(),
    };
    let value = decoder.decode_value(&mut cursor, schema.root())?;
    if options.trailing_bytes == TrailingBytesPolicy::Report && !cursor.is_empty() {
        return Err(DecodeError::TrailingBytes {
            remaining: cursor.len(),
        });
    }
    Ok(value)
}

// ============================================================================
// Primitive decoders
// ============================================================================

/// Decode a null value (no-op, consumes no bytes).
#[inline]
pub fn decode_null(_data: &mut &[u8]) -> Result<(), DecodeError> {
    Ok(())
}

/// Decode a boolean value: one byte, 0x00 or 0x01.
#[inline]
pub fn decode_boolean(data: &mut &[u8]) -> Result<bool, DecodeError> {
    if data.is_empty() {
        return Err(DecodeError::UnexpectedEof);
    }
    let byte = data[0];
    *data = &data[1..];
    match byte {
        0 => Ok(false),
        1 => Ok(true),
        _ => Err(DecodeError::InvalidData(format!(
            "invalid boolean value: {}, expected 0 or 1",
            byte
        ))),
    }
}

/// Decode a 32-bit signed integer (zigzag varint encoded).
#[inline]
pub fn decode_int(data: &mut &[u8]) -> Result<i32, DecodeError> {
    let long = decode_long(data)?;
    if long < i32::MIN as i64 || long > i32::MAX as i64 {
        return Err(DecodeError::InvalidData(format!(
            "integer overflow: {} does not fit in i32",
            long
        )));
    }
    Ok(long as i32)
}

/// Decode a 64-bit signed integer (zigzag varint encoded).
#[inline]
pub fn decode_long(data: &mut &[u8]) -> Result<i64, DecodeError> {
    varint::decode_zigzag(data)
}

/// Decode a 32-bit IEEE 754 floating-point number (little-endian).
#[inline]
pub fn decode_float(data: &mut &[u8]) -> Result<f32, DecodeError> {
    if data.len() < 4 {
        return Err(DecodeError::UnexpectedEof);
    }
    let bytes: [u8; 4] = [data[0], data[1], data[2], data[3]];
    *data = &data[4..];
    Ok(f32::from_le_bytes(bytes))
}

/// Decode a 64-bit IEEE 754 floating-point number (little-endian).
#[inline]
pub fn decode_double(data: &mut &[u8]) -> Result<f64, DecodeError> {
    if data.len() < 8 {
        return Err(DecodeError::UnexpectedEof);
    }
    let bytes: [u8; 8] = [
        data[0], data[1], data[2], data[3], data[4], data[5], data[6], data[7],
    ];
    *data = &data[8..];
    Ok(f64::from_le_bytes(bytes))
}

/// Decode a byte array (long-encoded length followed by raw bytes).
#[inline]
pub fn decode_bytes(data: &mut &[u8]) -> Result<Vec<u8>, DecodeError> {
    let len = decode_long(data)?;
    if len < 0 {
        return Err(DecodeError::InvalidData(format!(
            "negative bytes length: {}",
            len
        )));
    }
    let len = len as usize;

    if data.len() < len {
        return Err(DecodeError::UnexpectedEof);
    }

    let bytes = data[..len].to_vec();
    *data = &data[len..];
    Ok(bytes)
}

/// Decode a UTF-8 string (length-prefixed).
///
/// Ill-formed UTF-8 fails with [`DecodeError::InvalidString`] carrying
/// the offending bytes.
#[inline]
pub fn decode_string(data: &mut &[u8]) -> Result<String, DecodeError> {
    let bytes = decode_bytes(data)?;
    String::from_utf8(bytes).map_err(|e| DecodeError::InvalidString {
        bytes: e.into_bytes(),
    })
}

/// Decode exactly `size` raw bytes.
#[inline]
pub fn decode_fixed(data: &mut &[u8], size: usize) -> Result<Vec<u8>, DecodeError> {
    if data.len() < size {
        return Err(DecodeError::UnexpectedEof);
    }
    let bytes = data[..size].to_vec();
    *data = &data[size..];
    Ok(bytes)
}

/// Format raw UUID bytes as canonical lowercase `8-4-4-4-12` text.
pub(crate) fn format_uuid(bytes: &[u8; 16]) -> String {
    format!(
        "{:02x}{:02x}{:02x}{:02x}-{:02x}{:02x}-{:02x}{:02x}-{:02x}{:02x}-{:02x}{:02x}{:02x}{:02x}{:02x}{:02x}",
        bytes[0], bytes[1], bytes[2], bytes[3],
        bytes[4], bytes[5],
        bytes[6], bytes[7],
        bytes[8], bytes[9],
        bytes[10], bytes[11], bytes[12], bytes[13], bytes[14], bytes[15]
    )
}

// ============================================================================
// Schema-directed decoder
// ============================================================================

struct Decoder<'a> {
    context: &'a SchemaContext,
    options: &'a DecodeOptions,
    path: Vec<String>,
}

impl<'a> Decoder<'a> {
    fn json_path(&self) -> String {
        let mut out = String::from("$");
        for segment in &self.path {
            out.push_str(segment);
        }
        out
    }

    fn decode_value(
        &mut self,
        data: &mut &[u8],
        schema: &AvroSchema,
    ) -> Result<AvroValue, DecodeError> {
        if self.path.is_empty() {
            // Root errors carry no useful path
            self.decode_value_inner(data, schema)
        } else {
            self.decode_value_inner(data, schema)
                .map_err(|e| e.at(self.json_path()))
        }
    }

    fn decode_value_inner(
        &mut self,
        data: &mut &[u8],
        schema: &AvroSchema,
    ) -> Result<AvroValue, DecodeError> {
        match schema {
            AvroSchema::Null => {
                decode_null(data)?;
                Ok(AvroValue::Null)
            }
            AvroSchema::Boolean => Ok(AvroValue::Boolean(decode_boolean(data)?)),
            AvroSchema::Int => Ok(AvroValue::Int(decode_int(data)?)),
            AvroSchema::Long => Ok(AvroValue::Long(decode_long(data)?)),
            AvroSchema::Float => Ok(AvroValue::Float(decode_float(data)?)),
            AvroSchema::Double => Ok(AvroValue::Double(decode_double(data)?)),
            AvroSchema::Bytes => Ok(AvroValue::Bytes(decode_bytes(data)?)),
            AvroSchema::String => Ok(AvroValue::String(decode_string(data)?)),
            AvroSchema::Record(record) => self.decode_record(data, record),
            AvroSchema::Enum(e) => self.decode_enum(data, e),
            AvroSchema::Array(items) => self.decode_array(data, items),
            AvroSchema::Map(values) => self.decode_map(data, values),
            AvroSchema::Union(branches) => self.decode_union(data, branches),
            AvroSchema::Fixed(fixed) => Ok(AvroValue::Fixed(decode_fixed(data, fixed.size)?)),
            AvroSchema::Named(name) => match self.context.get(name) {
                Some(resolved) => {
                    let resolved = resolved.clone();
                    self.decode_value_inner(data, &resolved)
                }
                None => Err(DecodeError::UnresolvedReference { name: name.clone() }),
            },
            AvroSchema::Logical(lt) => self.decode_logical(data, lt),
        }
    }

    /// Record fields decode in declared order; there is no framing.
    fn decode_record(
        &mut self,
        data: &mut &[u8],
        record: &RecordSchema,
    ) -> Result<AvroValue, DecodeError> {
        let mut fields = Vec::with_capacity(record.fields.len());
        for field in &record.fields {
            self.path.push(format!(".{}", field.name));
            let value = self.decode_value(data, &field.schema);
            self.path.pop();
            fields.push((field.name.clone(), value?));
        }
        Ok(AvroValue::Record(fields))
    }

    /// Enums decode as the long index into the declared symbol order.
    fn decode_enum(
        &mut self,
        data: &mut &[u8],
        e: &EnumSchema,
    ) -> Result<AvroValue, DecodeError> {
        let index = decode_long(data)?;
        if index < 0 || index as usize >= e.symbols.len() {
            return Err(DecodeError::EnumIndexOutOfRange {
                index,
                len: e.symbols.len(),
            });
        }
        Ok(AvroValue::Enum(
            index as i32,
            e.symbols[index as usize].clone(),
        ))
    }

    /// Array blocks: positive count reads items, negative count is
    /// always followed by a byte-size long (consumed, not validated),
    /// zero terminates.
    fn decode_array(
        &mut self,
        data: &mut &[u8],
        item_schema: &AvroSchema,
    ) -> Result<AvroValue, DecodeError> {
        let mut items = Vec::new();

        loop {
            let count = self.read_block_count(data)?;
            if count == 0 {
                break;
            }
            // The wire count is untrusted; cap the pre-allocation
            items.reserve(count.min(1024));
            for _ in 0..count {
                self.path.push(format!("[{}]", items.len()));
                let value = self.decode_value(data, item_schema);
                self.path.pop();
                items.push(value?);
            }
        }

        Ok(AvroValue::Array(items))
    }

    /// Maps decode like arrays with string keys. Duplicate keys across
    /// blocks resolve to the last value seen.
    fn decode_map(
        &mut self,
        data: &mut &[u8],
        value_schema: &AvroSchema,
    ) -> Result<AvroValue, DecodeError> {
        let mut entries: Vec<(String, AvroValue)> = Vec::new();

        loop {
            let count = self.read_block_count(data)?;
            if count == 0 {
                break;
            }
            // The wire count is untrusted; cap the pre-allocation
            entries.reserve(count.min(1024));
            for _ in 0..count {
                let key = decode_string(data)?;
                self.path.push(format!(".{}", key));
                let value = self.decode_value(data, value_schema);
                self.path.pop();
                let value = value?;
                match entries.iter_mut().find(|(k, _)| *k == key) {
                    Some(existing) => existing.1 = value,
                    None => entries.push((key, value)),
                }
            }
        }

        Ok(AvroValue::Map(entries))
    }

    /// Read a block count, consuming the byte-size long that follows a
    /// negative count.
    fn read_block_count(&mut self, data: &mut &[u8]) -> Result<usize, DecodeError> {
        let count = decode_long(data)?;
        if count >= 0 {
            return Ok(count as usize);
        }
        let byte_size = decode_long(data)?;
        if byte_size < 0 {
            return Err(DecodeError::InvalidData(format!(
                "negative block byte size: {}",
                byte_size
            )));
        }
        count
            .checked_neg()
            .map(|c| c as usize)
            .ok_or_else(|| DecodeError::InvalidData("block count overflow".to_string()))
    }

    /// Unions decode the long branch index, then the branch value.
    fn decode_union(
        &mut self,
        data: &mut &[u8],
        branches: &[AvroSchema],
    ) -> Result<AvroValue, DecodeError> {
        let index = decode_long(data)?;
        if index < 0 || index as usize >= branches.len() {
            return Err(DecodeError::UnionIndexOutOfRange {
                index,
                len: branches.len(),
            });
        }
        let branch = &branches[index as usize];

        self.path.push(format!("[{}]", index));
        let value = self.decode_value(data, branch);
        self.path.pop();
        let value = value?;

        // Null carries no information worth tagging
        if self.options.tagged_unions && !matches!(value, AvroValue::Null) {
            Ok(AvroValue::Union(branch_tag(branch), Box::new(value)))
        } else {
            Ok(value)
        }
    }

    // --------------------------------------------------------------------
    // Logical types
    // --------------------------------------------------------------------

    fn decode_logical(
        &mut self,
        data: &mut &[u8],
        lt: &LogicalType,
    ) -> Result<AvroValue, DecodeError> {
        match &lt.logical_type {
            LogicalTypeName::Decimal { scale, .. } => {
                let raw = match &*lt.base {
                    AvroSchema::Bytes => decode_bytes(data)?,
                    AvroSchema::Fixed(f) => decode_fixed(data, f.size)?,
                    other => {
                        return Err(DecodeError::InvalidData(format!(
                            "decimal base must be bytes or fixed, found {:?}",
                            other
                        )))
                    }
                };
                let decimal = Decimal::from_twos_complement_be(&raw, *scale);
                match self.options.decimals {
                    DecimalMode::Exact => Ok(AvroValue::Decimal(decimal)),
                    DecimalMode::Approximate => Ok(AvroValue::Double(decimal.to_f64())),
                }
            }
            LogicalTypeName::Uuid => match &*lt.base {
                AvroSchema::String => {
                    let text = decode_string(data)?;
                    if text.len() != 36 {
                        return Err(DecodeError::InvalidData(format!(
                            "invalid UUID string length: expected 36, got {}",
                            text.len()
                        )));
                    }
                    Ok(AvroValue::Uuid(text))
                }
                AvroSchema::Fixed(f) => {
                    if f.size != 16 {
                        return Err(DecodeError::InvalidBinaryUuid { len: f.size });
                    }
                    let raw = decode_fixed(data, 16)?;
                    match self.options.uuid_format {
                        UuidFormat::Binary => Ok(AvroValue::Fixed(raw)),
                        UuidFormat::CanonicalString => {
                            let bytes: [u8; 16] = raw
                                .try_into()
                                .map_err(|b: Vec<u8>| DecodeError::InvalidBinaryUuid {
                                    len: b.len(),
                                })?;
                            Ok(AvroValue::Uuid(format_uuid(&bytes)))
                        }
                    }
                }
                other => Err(DecodeError::InvalidData(format!(
                    "uuid base must be string or fixed[16], found {:?}",
                    other
                ))),
            },
            LogicalTypeName::Date => Ok(AvroValue::Date(decode_int(data)?)),
            LogicalTypeName::TimeMillis => {
                let millis = decode_int(data)?;
                if !(0..86_400_000).contains(&millis) {
                    return Err(DecodeError::InvalidData(format!(
                        "time-millis value {} outside [0, 86400000)",
                        millis
                    )));
                }
                Ok(AvroValue::TimeMillis(millis))
            }
            LogicalTypeName::TimeMicros => {
                let micros = decode_long(data)?;
                if !(0..86_400_000_000).contains(&micros) {
                    return Err(DecodeError::InvalidData(format!(
                        "time-micros value {} outside [0, 86400000000)",
                        micros
                    )));
                }
                Ok(AvroValue::TimeMicros(micros))
            }
            LogicalTypeName::TimestampMillis | LogicalTypeName::LocalTimestampMillis => {
                Ok(AvroValue::TimestampMillis(decode_long(data)?))
            }
            LogicalTypeName::TimestampMicros | LogicalTypeName::LocalTimestampMicros => {
                Ok(AvroValue::TimestampMicros(decode_long(data)?))
            }
            LogicalTypeName::TimestampNanos => {
                Ok(AvroValue::TimestampNanos(decode_long(data)?))
            }
            LogicalTypeName::Duration => {
                let bytes = decode_fixed(data, 12)?;
                let months = u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]);
                let days = u32::from_le_bytes([bytes[4], bytes[5], bytes[6], bytes[7]]);
                let milliseconds = u32::from_le_bytes([bytes[8], bytes[9], bytes[10], bytes[11]]);
                Ok(AvroValue::Duration {
                    months,
                    days,
                    milliseconds,
                })
            }
        }
    }
}
