use crate::error::{Result, SaveError};
use crate::reader::{ByteReader, ByteWriter};
use crate::version::{PROBE_LEN, SIGNATURE, SaveVersion};

pub(super) fn read_probe(r: &mut ByteReader<'_>, expected: SaveVersion) -> Result<()> {
    let signature: [u8; 4] = r.read_array()?;
    if &signature != SIGNATURE {
        return Err(SaveError::BadSignature { found: signature });
    }
    let raw = r.read_u32()?;
    if raw != expected.raw() {
        return Err(SaveError::invalid_field(
            "version",
            format!("marker {raw} does not match a version {expected} layout"),
        ));
    }
    Ok(())
}

pub(super) fn write_probe(w: &mut ByteWriter, version: SaveVersion) {
    debug_assert_eq!(w.position(), 0);
    w.write_bytes(SIGNATURE);
    w.write_u32(version.raw());
    debug_assert_eq!(w.position(), PROBE_LEN);
}

/// Zero-terminated string in a fixed-width buffer. The terminator is optional
/// when the value fills the buffer, and everything after it must be zero.
pub(super) fn read_fixed_str(
    r: &mut ByteReader<'_>,
    field: &'static str,
    width: usize,
) -> Result<String> {
    let start = r.position();
    let raw = r.read_bytes(width)?;
    let end = raw.iter().position(|&b| b == 0).unwrap_or(width);
    if let Some(i) = raw[end..].iter().position(|&b| b != 0) {
        return Err(SaveError::invalid_field(
            field,
            format!("non-zero byte after terminator at offset {}", start + end + i),
        ));
    }
    String::from_utf8(raw[..end].to_vec())
        .map_err(|e| SaveError::invalid_field(field, format!("not UTF-8: {e}")))
}

pub(super) fn write_fixed_str(
    w: &mut ByteWriter,
    field: &'static str,
    value: &str,
    width: usize,
) -> Result<()> {
    let bytes = value.as_bytes();
    if bytes.len() > width {
        return Err(SaveError::FieldOverflow {
            field,
            len: bytes.len(),
            max: width,
        });
    }
    if bytes.contains(&0) {
        return Err(SaveError::invalid_field(field, "contains a zero byte"));
    }
    w.write_bytes(bytes);
    for _ in bytes.len()..width {
        w.write_u8(0);
    }
    Ok(())
}

pub(super) fn read_flag(r: &mut ByteReader<'_>, field: &'static str) -> Result<bool> {
    match r.read_u8()? {
        0 => Ok(false),
        1 => Ok(true),
        other => Err(SaveError::invalid_field(
            field,
            format!("flag byte must be 0 or 1, found {other}"),
        )),
    }
}

pub(super) fn write_flag(w: &mut ByteWriter, value: bool) {
    w.write_u8(u8::from(value));
}

pub(super) fn read_lua_keys(r: &mut ByteReader<'_>) -> Result<Vec<(String, String)>> {
    let count = r.read_u32()? as usize;
    // Each pair needs at least its two length prefixes.
    if count > r.remaining() / 8 {
        return Err(SaveError::TruncatedInput {
            offset: r.position(),
            needed: count.saturating_mul(8),
            available: r.remaining(),
        });
    }

    let mut keys = Vec::with_capacity(count);
    for _ in 0..count {
        let key = lua_key_text(r.read_len_prefixed()?)?;
        let value = lua_key_text(r.read_len_prefixed()?)?;
        keys.push((key, value));
    }
    Ok(keys)
}

fn lua_key_text(raw: &[u8]) -> Result<String> {
    String::from_utf8(raw.to_vec())
        .map_err(|e| SaveError::invalid_field("lua_keys", format!("not UTF-8: {e}")))
}

pub(super) fn write_lua_keys(w: &mut ByteWriter, keys: &[(String, String)]) -> Result<()> {
    let count = u32::try_from(keys.len()).map_err(|_| SaveError::PayloadTooLarge {
        len: keys.len(),
        limit: u32::MAX as usize,
    })?;
    w.write_u32(count);
    for (key, value) in keys {
        w.write_len_prefixed(key.as_bytes())?;
        w.write_len_prefixed(value.as_bytes())?;
    }
    Ok(())
}

/// Check that an optional header field is set exactly when `stored` says
/// the version has it.
pub(super) fn present_when<T: Copy>(
    field: &'static str,
    value: Option<T>,
    stored: bool,
    version: SaveVersion,
) -> Result<Option<T>> {
    match (value, stored) {
        (Some(v), true) => Ok(Some(v)),
        (None, false) => Ok(None),
        (None, true) => Err(SaveError::invalid_field(
            field,
            format!("required by version {version}"),
        )),
        (Some(_), false) => Err(SaveError::invalid_field(
            field,
            format!("not stored by version {version}"),
        )),
    }
}
