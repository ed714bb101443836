use std::collections::HashSet;

use tracing::trace;

use crate::error::{Result, SaveError};
use crate::reader::{ByteReader, ByteWriter};

use super::{LuaKey, LuaTable, LuaValue};

pub const TAG_NIL: u8 = b'-';
pub const TAG_FALSE: u8 = b'0';
pub const TAG_TRUE: u8 = b'1';
pub const TAG_NUMBER: u8 = b'N';
pub const TAG_STRING: u8 = b'S';
pub const TAG_TABLE: u8 = b'T';
pub const TAG_TABLE_END: u8 = b'E';

/// Default bound on table nesting while decoding or encoding.
pub const DEFAULT_MAX_DEPTH: usize = 256;

/// Largest magnitude an integer key can have and still survive the trip
/// through an f64.
const MAX_EXACT_INTEGER: i64 = 1 << 53;

/// Recursive-descent codec for the tagged Lua value stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LuaCodec {
    max_depth: usize,
}

impl Default for LuaCodec {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

impl LuaCodec {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_depth(max_depth: usize) -> Self {
        Self { max_depth }
    }

    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    /// Decode a blob holding exactly one value.
    pub fn decode(&self, bytes: &[u8]) -> Result<LuaValue> {
        let mut r = ByteReader::new(bytes);
        let value = self.decode_value(&mut r, 0)?;
        if !r.is_empty() {
            return Err(SaveError::TrailingBytes {
                offset: r.position(),
                len: r.remaining(),
            });
        }
        trace!(len = bytes.len(), kind = value.type_name(), "decoded lua blob");
        Ok(value)
    }

    pub fn encode(&self, value: &LuaValue) -> Result<Vec<u8>> {
        let mut w = ByteWriter::new();
        self.encode_value(&mut w, value, 0)?;
        Ok(w.into_inner())
    }

    fn decode_value(&self, r: &mut ByteReader<'_>, depth: usize) -> Result<LuaValue> {
        let offset = r.position();
        let tag = r.read_u8()?;
        match tag {
            TAG_NIL => Ok(LuaValue::Nil),
            TAG_FALSE => Ok(LuaValue::Boolean(false)),
            TAG_TRUE => Ok(LuaValue::Boolean(true)),
            TAG_NUMBER => Ok(LuaValue::Number(r.read_f64()?)),
            TAG_STRING => Ok(LuaValue::String(r.read_len_prefixed()?.to_vec())),
            TAG_TABLE => self.decode_table(r, depth + 1).map(LuaValue::Table),
            tag => Err(SaveError::UnknownTag { tag, offset }),
        }
    }

    fn decode_table(&self, r: &mut ByteReader<'_>, depth: usize) -> Result<LuaTable> {
        if depth > self.max_depth {
            return Err(SaveError::RecursionLimitExceeded {
                limit: self.max_depth,
            });
        }

        let mut table = LuaTable::new();
        let mut seen = HashSet::new();
        loop {
            if r.peek_u8()? == TAG_TABLE_END {
                r.read_u8()?;
                return Ok(table);
            }

            let key_offset = r.position();
            let key = decode_key(r)?;
            if !seen.insert(key.clone()) {
                return Err(SaveError::DuplicateKey {
                    key: key.to_string(),
                    offset: key_offset,
                });
            }
            let value = self.decode_value(r, depth)?;
            table.push_unchecked(key, value);
        }
    }

    fn encode_value(&self, w: &mut ByteWriter, value: &LuaValue, depth: usize) -> Result<()> {
        match value {
            LuaValue::Nil => w.write_u8(TAG_NIL),
            LuaValue::Boolean(false) => w.write_u8(TAG_FALSE),
            LuaValue::Boolean(true) => w.write_u8(TAG_TRUE),
            LuaValue::Number(n) => {
                w.write_u8(TAG_NUMBER);
                w.write_f64(*n);
            }
            LuaValue::String(bytes) => {
                w.write_u8(TAG_STRING);
                w.write_len_prefixed(bytes)?;
            }
            LuaValue::Table(table) => {
                let depth = depth + 1;
                if depth > self.max_depth {
                    return Err(SaveError::RecursionLimitExceeded {
                        limit: self.max_depth,
                    });
                }
                w.write_u8(TAG_TABLE);
                let mut seen = HashSet::new();
                for (key, value) in table.iter() {
                    if !seen.insert(key) {
                        return Err(SaveError::DuplicateKey {
                            key: key.to_string(),
                            offset: w.position(),
                        });
                    }
                    encode_key(w, key)?;
                    self.encode_value(w, value, depth)?;
                }
                w.write_u8(TAG_TABLE_END);
            }
        }
        Ok(())
    }
}

fn decode_key(r: &mut ByteReader<'_>) -> Result<LuaKey> {
    let offset = r.position();
    match r.read_u8()? {
        TAG_NUMBER => {
            let n = r.read_f64()?;
            // -0.0 would come back as +0.0
            if n.fract() != 0.0
                || n.abs() > MAX_EXACT_INTEGER as f64
                || n.to_bits() == (-0.0f64).to_bits()
            {
                return Err(SaveError::InvalidKey {
                    offset,
                    reason: format!("number key {n} is not an exact integer"),
                });
            }
            Ok(LuaKey::Integer(n as i64))
        }
        TAG_STRING => Ok(LuaKey::String(r.read_len_prefixed()?.to_vec())),
        tag @ (TAG_NIL | TAG_FALSE | TAG_TRUE | TAG_TABLE) => Err(SaveError::InvalidKey {
            offset,
            reason: format!("tag 0x{tag:02x} cannot be used as a key"),
        }),
        tag => Err(SaveError::UnknownTag { tag, offset }),
    }
}

fn encode_key(w: &mut ByteWriter, key: &LuaKey) -> Result<()> {
    match key {
        LuaKey::Integer(i) => {
            if i.unsigned_abs() > MAX_EXACT_INTEGER as u64 {
                return Err(SaveError::InvalidKey {
                    offset: w.position(),
                    reason: format!("integer key {i} cannot be stored exactly"),
                });
            }
            w.write_u8(TAG_NUMBER);
            w.write_f64(*i as f64);
        }
        LuaKey::String(bytes) => {
            w.write_u8(TAG_STRING);
            w.write_len_prefixed(bytes)?;
        }
    }
    Ok(())
}
