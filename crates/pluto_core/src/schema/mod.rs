//! Per-version outer layouts: fixed header fields followed by the Lua state blob.

mod fields;
pub mod v14;
pub mod v15;
pub mod v16;
mod walk;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::layout::FileLayout;
use crate::version::SaveVersion;

/// Metadata stored outside the Lua state.
///
/// The struct is shared by every version; fields a version does not store
/// are `None` for that version.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeaderFields {
    pub timestamp: Option<u64>,
    pub location: String,
    pub runs: u32,
    pub active_meta_points: u32,
    pub active_shrine_points: Option<u32>,
    pub god_mode_enabled: bool,
    pub hell_mode_enabled: Option<bool>,
    /// Auxiliary string pairs, kept in file order.
    pub lua_keys: Vec<(String, String)>,
    pub current_map_name: String,
    pub start_next_map: String,
}

impl HeaderFields {
    /// An empty header with the version-specific fields set to neutral values.
    pub fn for_version(version: SaveVersion) -> Self {
        Self {
            timestamp: version.has_timestamp().then_some(0),
            active_shrine_points: version.has_shrine_points().then_some(0),
            hell_mode_enabled: version.has_hell_mode_flag().then_some(false),
            ..Self::default()
        }
    }

    pub fn lua_key(&self, key: &str) -> Option<&str> {
        self.lua_keys
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }
}

/// Output of a schema parse, borrowing the blob from the input buffer.
#[derive(Debug, Clone)]
pub struct ParsedRecord<'a> {
    pub header: HeaderFields,
    pub blob: &'a [u8],
    /// Bytes used by the probe, header and blob; anything after is padding.
    pub consumed: usize,
    pub layout: FileLayout,
}

pub trait LayoutSchema: Sync {
    fn version(&self) -> SaveVersion;

    /// Width of the fixed location and map-name buffers.
    fn string_width(&self) -> usize;

    fn parse<'a>(&self, bytes: &'a [u8]) -> Result<ParsedRecord<'a>>;

    /// Serialize the probe, header and blob. Padding is not applied here.
    fn build(&self, header: &HeaderFields, blob: &[u8]) -> Result<Vec<u8>>;
}

pub fn schema_for(version: SaveVersion) -> &'static dyn LayoutSchema {
    match version {
        SaveVersion::V14 => &v14::V14Schema,
        SaveVersion::V15 => &v15::V15Schema,
        SaveVersion::V16 => &v16::V16Schema,
    }
}
