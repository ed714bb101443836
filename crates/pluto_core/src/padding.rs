use tracing::debug;

use crate::error::{Result, SaveError};
use crate::version::SaveVersion;

pub const V14_FILE_LEN: usize = 3_145_728;
pub const V15_FILE_LEN: usize = 9_437_184;

/// Whether a version's files are zero-padded to an exact total length.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaddingPolicy {
    Unpadded,
    FixedLength(usize),
}

impl PaddingPolicy {
    pub fn for_version(version: SaveVersion) -> Self {
        match version {
            SaveVersion::V14 => Self::FixedLength(V14_FILE_LEN),
            SaveVersion::V15 => Self::FixedLength(V15_FILE_LEN),
            SaveVersion::V16 => Self::Unpadded,
        }
    }

    pub fn declared_len(&self) -> Option<usize> {
        match *self {
            Self::Unpadded => None,
            Self::FixedLength(len) => Some(len),
        }
    }

    /// Right-pad `bytes` with zeros to the declared length.
    pub fn apply(&self, mut bytes: Vec<u8>) -> Result<Vec<u8>> {
        let Self::FixedLength(limit) = *self else {
            return Ok(bytes);
        };
        if bytes.len() > limit {
            return Err(SaveError::PayloadTooLarge {
                len: bytes.len(),
                limit,
            });
        }
        debug!(content = bytes.len(), padded = limit, "padding save");
        bytes.resize(limit, 0);
        Ok(bytes)
    }

    /// Check a loaded file against the policy, given where its content ends.
    pub fn verify(&self, bytes: &[u8], content_len: usize) -> Result<()> {
        let Self::FixedLength(limit) = *self else {
            return Ok(());
        };
        if bytes.len() < limit {
            return Err(SaveError::TruncatedInput {
                offset: bytes.len(),
                needed: limit - bytes.len(),
                available: 0,
            });
        }
        if bytes.len() > limit {
            return Err(SaveError::PayloadTooLarge {
                len: bytes.len(),
                limit,
            });
        }
        match bytes[content_len..].iter().position(|&b| b != 0) {
            Some(i) => Err(SaveError::NonZeroPadding {
                offset: content_len + i,
            }),
            None => Ok(()),
        }
    }
}

pub fn apply(version: SaveVersion, bytes: Vec<u8>) -> Result<Vec<u8>> {
    PaddingPolicy::for_version(version).apply(bytes)
}
