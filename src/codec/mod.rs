//! Binary codec: schema-directed encoding and decoding.
//!
//! The encoder and decoder share the variable-length integer codec, the
//! block framing for arrays and maps, the union branch selection rules,
//! and the logical type conversions.

pub mod decode;
pub mod encode;
pub mod skip;
pub mod value;
pub mod varint;

pub use decode::{
    decode, decode_boolean, decode_bytes, decode_double, decode_fixed, decode_float, decode_int,
    decode_long, decode_null, decode_string, decode_with_options, DecimalMode, DecodeOptions,
    TrailingBytesPolicy, UuidFormat,
};
pub use encode::{
    encode, encode_boolean, encode_bytes, encode_double, encode_float, encode_int, encode_long,
    encode_string, encode_with_options, EncodeOptions,
};
pub use skip::{skip_array, skip_bytes, skip_fixed, skip_map, skip_value};
pub use value::{AvroValue, Decimal};
pub use varint::{decode_varint, decode_zigzag, encode_varint, encode_zigzag, skip_varint};
