//! Tagged value codec.
//!
//! Every property value is a single tag byte followed by a fixed or
//! length-prefixed payload. The encoder always produces the canonical tag;
//! the decoder additionally accepts the alternate real and string tags that
//! appear in the wild.

use crate::encoding::{reader::Reader, writer::Writer};
use crate::types::{DateTime, Value};
use crate::{DecodeError, EncodeError};

pub const TAG_NULL: u8 = 0x00;
pub const TAG_BOOLEAN: u8 = 0x11;
pub const TAG_UNSIGNED8: u8 = 0x21;
pub const TAG_UNSIGNED16: u8 = 0x22;
pub const TAG_UNSIGNED32: u8 = 0x23;
pub const TAG_SIGNED32: u8 = 0x25;
pub const TAG_REAL_ALT: u8 = 0x29;
pub const TAG_DOUBLE: u8 = 0x2A;
pub const TAG_STRING_ALT: u8 = 0x30;
pub const TAG_REAL: u8 = 0x39;
pub const TAG_STRING: u8 = 0x41;
pub const TAG_ENUMERATED: u8 = 0x91;
pub const TAG_DATE_TIME: u8 = 0xC4;

/// Longest encodable character string.
pub const MAX_STRING_LEN: usize = 254;

/// Builds the marker byte for context tag `n` (class bits `101`).
pub const fn context_marker(tag_num: u8) -> u8 {
    0xA0 | (tag_num & 0x1F)
}

/// True when `byte`'s high three bits mark it as a context tag.
pub const fn is_context_marker(byte: u8) -> bool {
    (byte & 0xE0) == 0xA0
}

pub fn encode_value(w: &mut Writer<'_>, value: &Value<'_>) -> Result<(), EncodeError> {
    match value {
        Value::Null => w.write_u8(TAG_NULL),
        Value::Boolean(v) => {
            w.write_u8(TAG_BOOLEAN)?;
            w.write_u8(u8::from(*v))
        }
        Value::Unsigned8(v) => {
            w.write_u8(TAG_UNSIGNED8)?;
            w.write_u8(*v)
        }
        Value::Unsigned16(v) => {
            w.write_u8(TAG_UNSIGNED16)?;
            w.write_be_u16(*v)
        }
        Value::Unsigned32(v) => {
            w.write_u8(TAG_UNSIGNED32)?;
            w.write_be_u32(*v)
        }
        Value::Signed32(v) => {
            w.write_u8(TAG_SIGNED32)?;
            w.write_be_u32(*v as u32)
        }
        Value::Real(v) => {
            w.write_u8(TAG_REAL)?;
            w.write_be_u32(v.to_bits())
        }
        Value::Double(v) => {
            w.write_u8(TAG_DOUBLE)?;
            w.write_be_u64(v.to_bits())
        }
        Value::CharacterString(v) => {
            let bytes = v.as_bytes();
            if bytes.len() > MAX_STRING_LEN {
                return Err(EncodeError::StringTooLong);
            }
            w.write_u8(TAG_STRING)?;
            w.write_u8(bytes.len() as u8)?;
            w.write_all(bytes)
        }
        Value::DateTime(v) => {
            w.write_u8(TAG_DATE_TIME)?;
            v.encode(w)
        }
        Value::Enumerated(v) => {
            w.write_u8(TAG_ENUMERATED)?;
            w.write_u8(*v)
        }
    }
}

pub fn decode_value<'a>(r: &mut Reader<'a>) -> Result<Value<'a>, DecodeError> {
    match r.read_u8()? {
        TAG_NULL => Ok(Value::Null),
        TAG_BOOLEAN => Ok(Value::Boolean(r.read_u8()? != 0)),
        TAG_UNSIGNED8 => Ok(Value::Unsigned8(r.read_u8()?)),
        TAG_UNSIGNED16 => Ok(Value::Unsigned16(r.read_be_u16()?)),
        TAG_UNSIGNED32 => Ok(Value::Unsigned32(r.read_be_u32()?)),
        TAG_SIGNED32 => Ok(Value::Signed32(r.read_be_u32()? as i32)),
        TAG_REAL | TAG_REAL_ALT => Ok(Value::Real(f32::from_bits(r.read_be_u32()?))),
        TAG_DOUBLE => Ok(Value::Double(f64::from_bits(r.read_be_u64()?))),
        TAG_STRING | TAG_STRING_ALT => {
            let len = r.read_u8()? as usize;
            if len > MAX_STRING_LEN {
                return Err(DecodeError::InvalidLength);
            }
            let bytes = r.read_exact(len)?;
            let s = core::str::from_utf8(bytes).map_err(|_| DecodeError::InvalidValue)?;
            Ok(Value::CharacterString(s))
        }
        TAG_DATE_TIME => Ok(Value::DateTime(DateTime::decode(r)?)),
        TAG_ENUMERATED => Ok(Value::Enumerated(r.read_u8()?)),
        _ => Err(DecodeError::InvalidTag),
    }
}
