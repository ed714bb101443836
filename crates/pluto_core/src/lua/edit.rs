use crate::error::{Result, SaveError};

use super::LuaValue;

const TRUE_WORDS: [&str; 4] = ["true", "1", "yes", "t"];
const FALSE_WORDS: [&str; 4] = ["false", "0", "no", "f"];

/// Convert user text into a replacement for `existing`, keeping its variant.
///
/// Only leaf values are editable; nil and tables are rejected with
/// `TypeMismatch`, as is text that does not parse as the existing variant.
pub fn coerce_edit(existing: &LuaValue, text: &str) -> Result<LuaValue> {
    coerce_at("value", existing, text)
}

pub(crate) fn coerce_at(path: &str, existing: &LuaValue, text: &str) -> Result<LuaValue> {
    let mismatch = |expected: &'static str| SaveError::TypeMismatch {
        path: path.to_string(),
        expected,
        found: match existing {
            LuaValue::Nil | LuaValue::Table(_) => existing.type_name(),
            _ => "unparseable text",
        },
    };

    match existing {
        LuaValue::Boolean(_) => {
            let lowered = text.trim().to_ascii_lowercase();
            if TRUE_WORDS.contains(&lowered.as_str()) {
                Ok(LuaValue::Boolean(true))
            } else if FALSE_WORDS.contains(&lowered.as_str()) {
                Ok(LuaValue::Boolean(false))
            } else {
                Err(mismatch("boolean (true/false, 1/0, yes/no)"))
            }
        }
        LuaValue::Number(_) => text
            .trim()
            .parse::<f64>()
            .map(LuaValue::Number)
            .map_err(|_| mismatch("number")),
        LuaValue::String(_) => Ok(LuaValue::string(text)),
        LuaValue::Nil | LuaValue::Table(_) => Err(mismatch("an editable leaf value")),
    }
}
