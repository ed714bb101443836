//! The field walk shared by every version. Which optional fields appear, and
//! how the blob ends, come from the `SaveVersion` predicates.

use tracing::debug;

use super::fields::{
    present_when, read_fixed_str, read_flag, read_lua_keys, read_probe, write_fixed_str,
    write_flag, write_lua_keys, write_probe,
};
use super::{HeaderFields, ParsedRecord};
use crate::error::Result;
use crate::layout::{FileLayout, SectionId};
use crate::reader::{ByteReader, ByteWriter};
use crate::version::{PROBE_LEN, SaveVersion};

pub(super) fn parse(
    version: SaveVersion,
    width: usize,
    bytes: &[u8],
) -> Result<ParsedRecord<'_>> {
    let mut r = ByteReader::new(bytes);
    let mut layout = FileLayout::new(bytes.len());

    read_probe(&mut r, version)?;
    layout.record(SectionId::Signature, 0, PROBE_LEN);

    let timestamp = version.has_timestamp().then(|| r.read_u64()).transpose()?;
    let location = read_fixed_str(&mut r, "location", width)?;
    let runs = r.read_u32()?;
    let active_meta_points = r.read_u32()?;
    let active_shrine_points = version
        .has_shrine_points()
        .then(|| r.read_u32())
        .transpose()?;
    let god_mode_enabled = read_flag(&mut r, "god_mode_enabled")?;
    let hell_mode_enabled = version
        .has_hell_mode_flag()
        .then(|| read_flag(&mut r, "hell_mode_enabled"))
        .transpose()?;
    layout.record(SectionId::Header, PROBE_LEN, r.position());

    let keys_start = r.position();
    let lua_keys = read_lua_keys(&mut r)?;
    layout.record(SectionId::LuaKeys, keys_start, r.position());

    let maps_start = r.position();
    let current_map_name = read_fixed_str(&mut r, "current_map_name", width)?;
    let start_next_map = read_fixed_str(&mut r, "start_next_map", width)?;
    layout.record(SectionId::MapNames, maps_start, r.position());

    let blob_start = r.position();
    let blob = if version.has_blob_length_prefix() {
        r.read_len_prefixed()?
    } else {
        r.read_rest()
    };
    let consumed = r.position();
    layout.record(SectionId::LuaState, blob_start, consumed);
    if consumed < bytes.len() {
        layout.record(SectionId::Padding, consumed, bytes.len());
    }

    debug!(
        %version,
        ?timestamp,
        runs,
        ?active_shrine_points,
        lua_keys = lua_keys.len(),
        blob_len = blob.len(),
        "parsed header"
    );

    Ok(ParsedRecord {
        header: HeaderFields {
            timestamp,
            location,
            runs,
            active_meta_points,
            active_shrine_points,
            god_mode_enabled,
            hell_mode_enabled,
            lua_keys,
            current_map_name,
            start_next_map,
        },
        blob,
        consumed,
        layout,
    })
}

pub(super) fn build(
    version: SaveVersion,
    width: usize,
    header: &HeaderFields,
    blob: &[u8],
) -> Result<Vec<u8>> {
    let timestamp = present_when(
        "timestamp",
        header.timestamp,
        version.has_timestamp(),
        version,
    )?;
    let active_shrine_points = present_when(
        "active_shrine_points",
        header.active_shrine_points,
        version.has_shrine_points(),
        version,
    )?;
    let hell_mode_enabled = present_when(
        "hell_mode_enabled",
        header.hell_mode_enabled,
        version.has_hell_mode_flag(),
        version,
    )?;

    let mut w = ByteWriter::with_capacity(blob.len() + 8 * width);
    write_probe(&mut w, version);
    if let Some(timestamp) = timestamp {
        w.write_u64(timestamp);
    }
    write_fixed_str(&mut w, "location", &header.location, width)?;
    w.write_u32(header.runs);
    w.write_u32(header.active_meta_points);
    if let Some(points) = active_shrine_points {
        w.write_u32(points);
    }
    write_flag(&mut w, header.god_mode_enabled);
    if let Some(flag) = hell_mode_enabled {
        write_flag(&mut w, flag);
    }
    write_lua_keys(&mut w, &header.lua_keys)?;
    write_fixed_str(&mut w, "current_map_name", &header.current_map_name, width)?;
    write_fixed_str(&mut w, "start_next_map", &header.start_next_map, width)?;
    if version.has_blob_length_prefix() {
        w.write_len_prefixed(blob)?;
    } else {
        w.write_bytes(blob);
    }
    Ok(w.into_inner())
}
