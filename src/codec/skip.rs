//! Skip functions: advance past a value without materializing it.
//!
//! Primitives skip by fixed width or varint; containers skip block by
//! block, jumping whole blocks when the producer wrote the byte-size
//! hint (see [`EncodeOptions::include_block_byte_size`]).
//!
//! [`EncodeOptions::include_block_byte_size`]: crate::codec::EncodeOptions

use crate::codec::decode::{decode_int, decode_long};
use crate::codec::varint::skip_varint;
use crate::error::DecodeError;
use crate::schema::{AvroSchema, SchemaContext};

/// Skip over a fixed-width run of bytes.
#[inline]
pub fn skip_fixed(data: &mut &[u8], size: usize) -> Result<(), DecodeError> {
    if data.len() < size {
        return Err(DecodeError::UnexpectedEof);
    }
    *data = &data[size..];
    Ok(())
}

/// Skip over a bytes or string value.
#[inline]
pub fn skip_bytes(data: &mut &[u8]) -> Result<(), DecodeError> {
    let len = decode_long(data)?;
    if len < 0 {
        return Err(DecodeError::InvalidData(format!(
            "negative bytes length: {}",
            len
        )));
    }
    skip_fixed(data, len as usize)
}

/// Skip over an array value, jumping byte-sized blocks directly.
pub fn skip_array(
    data: &mut &[u8],
    item_schema: &AvroSchema,
    context: &SchemaContext,
) -> Result<(), DecodeError> {
    loop {
        let count = decode_long(data)?;
        if count == 0 {
            break;
        }

        if count < 0 {
            let byte_size = decode_long(data)?;
            if byte_size < 0 {
                return Err(DecodeError::InvalidData(format!(
                    "negative block byte size: {}",
                    byte_size
                )));
            }
            skip_fixed(data, byte_size as usize)?;
            continue;
        }

        for _ in 0..count {
            skip_value(data, item_schema, context)?;
        }
    }
    Ok(())
}

/// Skip over a map value, jumping byte-sized blocks directly.
pub fn skip_map(
    data: &mut &[u8],
    value_schema: &AvroSchema,
    context: &SchemaContext,
) -> Result<(), DecodeError> {
    loop {
        let count = decode_long(data)?;
        if count == 0 {
            break;
        }

        if count < 0 {
            let byte_size = decode_long(data)?;
            if byte_size < 0 {
                return Err(DecodeError::InvalidData(format!(
                    "negative block byte size: {}",
                    byte_size
                )));
            }
            skip_fixed(data, byte_size as usize)?;
            continue;
        }

        for _ in 0..count {
            skip_bytes(data)?; // key
            skip_value(data, value_schema, context)?;
        }
    }
    Ok(())
}

/// Skip over any value under schema direction.
pub fn skip_value(
    data: &mut &[u8],
    schema: &AvroSchema,
    context: &SchemaContext,
) -> Result<(), DecodeError> {
    match schema {
        AvroSchema::Null => Ok(()),
        AvroSchema::Boolean => skip_fixed(data, 1),
        AvroSchema::Int | AvroSchema::Long => skip_varint(data),
        AvroSchema::Float => skip_fixed(data, 4),
        AvroSchema::Double => skip_fixed(data, 8),
        AvroSchema::Bytes | AvroSchema::String => skip_bytes(data),
        AvroSchema::Fixed(fixed) => skip_fixed(data, fixed.size),
        AvroSchema::Enum(_) => skip_varint(data),
        AvroSchema::Array(item_schema) => skip_array(data, item_schema, context),
        AvroSchema::Map(value_schema) => skip_map(data, value_schema, context),
        AvroSchema::Union(branches) => {
            let index = decode_int(data)?;
            if index < 0 || index as usize >= branches.len() {
                return Err(DecodeError::UnionIndexOutOfRange {
                    index: index as i64,
                    len: branches.len(),
                });
            }
            skip_value(data, &branches[index as usize], context)
        }
        AvroSchema::Record(record) => {
            for field in &record.fields {
                skip_value(data, &field.schema, context)?;
            }
            Ok(())
        }
        AvroSchema::Named(name) => match context.get(name) {
            Some(resolved) => {
                let resolved = resolved.clone();
                skip_value(data, &resolved, context)
            }
            None => Err(DecodeError::UnresolvedReference { name: name.clone() }),
        },
        AvroSchema::Logical(logical) => skip_value(data, &logical.base, context),
    }
}
