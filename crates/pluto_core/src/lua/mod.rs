//! Typed model of the serialized Lua state embedded in a save.

pub mod codec;
pub mod edit;
pub mod path;

use std::fmt;

use serde::{Deserialize, Serialize};

pub use codec::{DEFAULT_MAX_DEPTH, LuaCodec};
pub use edit::coerce_edit;
pub use path::LuaPath;

/// A table key. Lua tables in the save only use integer and string keys.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LuaKey {
    Integer(i64),
    String(Vec<u8>),
}

impl LuaKey {
    pub fn string(s: impl Into<Vec<u8>>) -> Self {
        Self::String(s.into())
    }

    pub fn as_integer(&self) -> Option<i64> {
        match *self {
            Self::Integer(i) => Some(i),
            Self::String(_) => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(bytes) => std::str::from_utf8(bytes).ok(),
            Self::Integer(_) => None,
        }
    }
}

impl From<i64> for LuaKey {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<&str> for LuaKey {
    fn from(value: &str) -> Self {
        Self::String(value.as_bytes().to_vec())
    }
}

impl From<String> for LuaKey {
    fn from(value: String) -> Self {
        Self::String(value.into_bytes())
    }
}

impl fmt::Display for LuaKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Integer(i) => write!(f, "{i}"),
            Self::String(bytes) => f.write_str(&String::from_utf8_lossy(bytes)),
        }
    }
}

/// One decoded Lua value.
///
/// Numbers compare by bit pattern so that a decoded tree equals itself even
/// when it holds NaN, and `0.0` and `-0.0` stay distinguishable.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum LuaValue {
    Nil,
    Boolean(bool),
    Number(#[serde(with = "number_repr")] f64),
    String(Vec<u8>),
    Table(LuaTable),
}

impl PartialEq for LuaValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Nil, Self::Nil) => true,
            (Self::Boolean(a), Self::Boolean(b)) => a == b,
            (Self::Number(a), Self::Number(b)) => a.to_bits() == b.to_bits(),
            (Self::String(a), Self::String(b)) => a == b,
            (Self::Table(a), Self::Table(b)) => a == b,
            _ => false,
        }
    }
}

impl LuaValue {
    pub fn string(s: impl Into<Vec<u8>>) -> Self {
        Self::String(s.into())
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Nil => "nil",
            Self::Boolean(_) => "boolean",
            Self::Number(_) => "number",
            Self::String(_) => "string",
            Self::Table(_) => "table",
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match *self {
            Self::Boolean(b) => Some(b),
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match *self {
            Self::Number(n) => Some(n),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(bytes) => std::str::from_utf8(bytes).ok(),
            _ => None,
        }
    }

    pub fn as_table(&self) -> Option<&LuaTable> {
        match self {
            Self::Table(t) => Some(t),
            _ => None,
        }
    }

    pub fn as_table_mut(&mut self) -> Option<&mut LuaTable> {
        match self {
            Self::Table(t) => Some(t),
            _ => None,
        }
    }
}

impl From<bool> for LuaValue {
    fn from(value: bool) -> Self {
        Self::Boolean(value)
    }
}

impl From<f64> for LuaValue {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

impl From<&str> for LuaValue {
    fn from(value: &str) -> Self {
        Self::String(value.as_bytes().to_vec())
    }
}

impl From<LuaTable> for LuaValue {
    fn from(value: LuaTable) -> Self {
        Self::Table(value)
    }
}

/// Serde form of a number: finite values as JSON numbers, everything else as
/// the hex bit pattern, since JSON has no NaN or infinity.
mod number_repr {
    use serde::de::Error as _;
    use serde::{Deserialize, Deserializer, Serializer};

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Repr {
        Finite(f64),
        Bits(String),
    }

    pub fn serialize<S: Serializer>(n: &f64, serializer: S) -> Result<S::Ok, S::Error> {
        if n.is_finite() {
            serializer.serialize_f64(*n)
        } else {
            serializer.serialize_str(&format!("0x{:016x}", n.to_bits()))
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
        match Repr::deserialize(deserializer)? {
            Repr::Finite(n) => Ok(n),
            Repr::Bits(text) => {
                let digits = text
                    .strip_prefix("0x")
                    .ok_or_else(|| D::Error::custom(format!("bad number bits '{text}'")))?;
                u64::from_str_radix(digits, 16)
                    .map(f64::from_bits)
                    .map_err(|e| D::Error::custom(format!("bad number bits '{text}': {e}")))
            }
        }
    }
}

/// Ordered key/value entries of a Lua table.
///
/// Entry order is the order found in the file, and it is written back in the
/// same order. Keys are unique; `insert` replaces an existing entry in place
/// and appends new keys at the end, and deserializing rejects repeats.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawTable")]
pub struct LuaTable {
    entries: Vec<(LuaKey, LuaValue)>,
}

#[derive(Deserialize)]
struct RawTable {
    entries: Vec<(LuaKey, LuaValue)>,
}

impl TryFrom<RawTable> for LuaTable {
    type Error = String;

    fn try_from(raw: RawTable) -> std::result::Result<Self, Self::Error> {
        let mut table = Self::new();
        for (key, value) in raw.entries {
            if table.contains_key(&key) {
                return Err(format!("duplicate table key {key}"));
            }
            table.push_unchecked(key, value);
        }
        Ok(table)
    }
}

impl LuaTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&LuaKey, &LuaValue)> {
        self.entries.iter().map(|(k, v)| (k, v))
    }

    pub fn keys(&self) -> impl Iterator<Item = &LuaKey> {
        self.entries.iter().map(|(k, _)| k)
    }

    pub fn contains_key(&self, key: &LuaKey) -> bool {
        self.position(key).is_some()
    }

    pub fn get(&self, key: &LuaKey) -> Option<&LuaValue> {
        self.position(key).map(|i| &self.entries[i].1)
    }

    pub fn get_mut(&mut self, key: &LuaKey) -> Option<&mut LuaValue> {
        self.position(key).map(|i| &mut self.entries[i].1)
    }

    /// Insert or replace. Returns the previous value for an existing key.
    pub fn insert(&mut self, key: LuaKey, value: LuaValue) -> Option<LuaValue> {
        match self.position(&key) {
            Some(i) => Some(std::mem::replace(&mut self.entries[i].1, value)),
            None => {
                self.entries.push((key, value));
                None
            }
        }
    }

    /// Remove an entry, keeping the order of the remaining ones.
    pub fn remove(&mut self, key: &LuaKey) -> Option<LuaValue> {
        self.position(key).map(|i| self.entries.remove(i).1)
    }

    /// Append without the uniqueness check; the decoder has already verified it.
    pub(crate) fn push_unchecked(&mut self, key: LuaKey, value: LuaValue) {
        self.entries.push((key, value));
    }

    fn position(&self, key: &LuaKey) -> Option<usize> {
        self.entries.iter().position(|(k, _)| k == key)
    }
}

impl FromIterator<(LuaKey, LuaValue)> for LuaTable {
    fn from_iter<I: IntoIterator<Item = (LuaKey, LuaValue)>>(iter: I) -> Self {
        let mut table = Self::new();
        for (k, v) in iter {
            table.insert(k, v);
        }
        table
    }
}
