use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Result, SaveError};
use crate::reader::ByteReader;

pub const SIGNATURE: &[u8; 4] = b"SGB1";
/// Signature plus the u32 version marker.
pub const PROBE_LEN: usize = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "u32", try_from = "u32")]
pub enum SaveVersion {
    V14,
    V15,
    V16,
}

impl SaveVersion {
    pub const ALL: [SaveVersion; 3] = [Self::V14, Self::V15, Self::V16];

    pub fn from_raw(raw: u32) -> Option<Self> {
        match raw {
            14 => Some(Self::V14),
            15 => Some(Self::V15),
            16 => Some(Self::V16),
            _ => None,
        }
    }

    pub fn raw(&self) -> u32 {
        match *self {
            Self::V14 => 14,
            Self::V15 => 15,
            Self::V16 => 16,
        }
    }

    pub fn has_timestamp(&self) -> bool {
        matches!(self, Self::V16)
    }

    pub fn has_shrine_points(&self) -> bool {
        !matches!(self, Self::V14)
    }

    pub fn has_hell_mode_flag(&self) -> bool {
        !matches!(self, Self::V14)
    }

    /// Whether the Lua state carries a u32 length; otherwise it runs to end
    /// of file.
    pub fn has_blob_length_prefix(&self) -> bool {
        !matches!(self, Self::V16)
    }
}

impl From<SaveVersion> for u32 {
    fn from(version: SaveVersion) -> Self {
        version.raw()
    }
}

impl TryFrom<u32> for SaveVersion {
    type Error = String;

    fn try_from(raw: u32) -> Result<Self, Self::Error> {
        Self::from_raw(raw).ok_or_else(|| format!("unsupported save version {raw}"))
    }
}

impl fmt::Display for SaveVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.raw())
    }
}

/// Classify a save by its signature and version marker.
pub fn detect(bytes: &[u8]) -> Result<SaveVersion> {
    let mut r = ByteReader::new(bytes);
    let signature: [u8; 4] = r.read_array()?;
    let raw = r.read_u32()?;
    if &signature != SIGNATURE {
        return Err(SaveError::BadSignature { found: signature });
    }

    let version = SaveVersion::from_raw(raw).ok_or(SaveError::UnsupportedVersion { found: raw })?;
    debug!(%version, "detected save version");
    Ok(version)
}
