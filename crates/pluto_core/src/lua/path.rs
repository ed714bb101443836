use std::fmt;
use std::str::FromStr;

use crate::error::{Result, SaveError};

use super::{LuaKey, LuaValue};

/// A sequence of table keys leading from the root value to a nested value.
///
/// Text form joins segments with `/`. A segment made only of digits (with an
/// optional leading `-`) is an integer key; wrap it in double quotes to force
/// a string key, e.g. `RunHistory/3` versus `Names/"3"`. Quoting also
/// covers keys that are empty or contain `/`; inside quotes `\"` and `\\`
/// stand for a literal quote and backslash. String keys that are not valid
/// UTF-8 display lossily and cannot be parsed back.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct LuaPath {
    segments: Vec<LuaKey>,
}

impl LuaPath {
    pub fn root() -> Self {
        Self::default()
    }

    pub fn new(segments: Vec<LuaKey>) -> Self {
        Self { segments }
    }

    pub fn segments(&self) -> &[LuaKey] {
        &self.segments
    }

    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn join(&self, key: impl Into<LuaKey>) -> Self {
        let mut segments = self.segments.clone();
        segments.push(key.into());
        Self { segments }
    }

    pub fn split_last(&self) -> Option<(&LuaKey, &[LuaKey])> {
        self.segments.split_last()
    }
}

impl AsRef<[LuaKey]> for LuaPath {
    fn as_ref(&self) -> &[LuaKey] {
        &self.segments
    }
}

impl From<Vec<LuaKey>> for LuaPath {
    fn from(segments: Vec<LuaKey>) -> Self {
        Self { segments }
    }
}

impl From<&[&str]> for LuaPath {
    fn from(segments: &[&str]) -> Self {
        Self {
            segments: segments.iter().map(|s| LuaKey::from(*s)).collect(),
        }
    }
}

impl FromStr for LuaPath {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim().trim_matches('/');
        if trimmed.is_empty() {
            return Ok(Self::root());
        }

        let mut segments = Vec::new();
        let mut rest = trimmed;
        loop {
            let (key, tail) = match rest.strip_prefix('"') {
                Some(quoted) => {
                    let (text, tail) = read_quoted(quoted)
                        .ok_or_else(|| format!("unterminated quote in path '{s}'"))?;
                    (LuaKey::from(text), tail)
                }
                None => {
                    let end = rest.find('/').unwrap_or(rest.len());
                    let raw = &rest[..end];
                    if raw.is_empty() {
                        return Err(format!("empty segment in path '{s}'"));
                    }
                    (parse_plain(raw)?, &rest[end..])
                }
            };
            segments.push(key);

            if tail.is_empty() {
                return Ok(Self { segments });
            }
            rest = tail
                .strip_prefix('/')
                .ok_or_else(|| format!("expected '/' after quoted segment in path '{s}'"))?;
        }
    }
}

/// Body of a quoted segment up to the closing quote, with `\"` and `\\`
/// unescaped, and the text after it.
fn read_quoted(text: &str) -> Option<(String, &str)> {
    let mut out = String::new();
    let mut chars = text.char_indices();
    while let Some((i, c)) = chars.next() {
        match c {
            '"' => return Some((out, &text[i + 1..])),
            '\\' => out.push(chars.next()?.1),
            c => out.push(c),
        }
    }
    None
}

fn parse_plain(raw: &str) -> Result<LuaKey, String> {
    let digits = raw.strip_prefix('-').unwrap_or(raw);
    if !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit()) {
        return raw
            .parse::<i64>()
            .map(LuaKey::Integer)
            .map_err(|e| format!("integer segment '{raw}' out of range: {e}"));
    }

    Ok(LuaKey::from(raw))
}

fn needs_quotes(text: &str) -> bool {
    text.is_empty()
        || text.contains('/')
        || text.starts_with('"')
        || text != text.trim()
        || matches!(parse_plain(text), Ok(LuaKey::Integer(_)))
}

impl fmt::Display for LuaPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.segments.is_empty() {
            return f.write_str("/");
        }
        for (i, segment) in self.segments.iter().enumerate() {
            if i > 0 {
                f.write_str("/")?;
            }
            match segment {
                LuaKey::Integer(n) => write!(f, "{n}")?,
                LuaKey::String(_) => {
                    let text = segment.to_string();
                    if needs_quotes(&text) {
                        let escaped = text.replace('\\', "\\\\").replace('"', "\\\"");
                        write!(f, "\"{escaped}\"")?;
                    } else {
                        f.write_str(&text)?;
                    }
                }
            }
        }
        Ok(())
    }
}

pub(crate) fn describe(segments: &[LuaKey]) -> String {
    LuaPath::new(segments.to_vec()).to_string()
}

/// Walk `segments` down from `root`.
pub fn lookup<'a>(root: &'a LuaValue, segments: &[LuaKey]) -> Result<&'a LuaValue> {
    let mut current = root;
    for (depth, key) in segments.iter().enumerate() {
        current = current
            .as_table()
            .and_then(|t| t.get(key))
            .ok_or_else(|| SaveError::PathNotFound {
                path: describe(&segments[..=depth]),
            })?;
    }
    Ok(current)
}

pub fn lookup_mut<'a>(root: &'a mut LuaValue, segments: &[LuaKey]) -> Result<&'a mut LuaValue> {
    let mut current = root;
    for (depth, key) in segments.iter().enumerate() {
        current = current
            .as_table_mut()
            .and_then(|t| t.get_mut(key))
            .ok_or_else(|| SaveError::PathNotFound {
                path: describe(&segments[..=depth]),
            })?;
    }
    Ok(current)
}
