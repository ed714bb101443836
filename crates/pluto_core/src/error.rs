use std::io;
use std::path::{Path, PathBuf};

/// Flat classification of [`SaveError`], for callers that branch on the kind
/// of failure rather than its details.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Io,
    BadSignature,
    UnsupportedVersion,
    TruncatedInput,
    UnknownTag,
    InvalidKey,
    DuplicateKey,
    RecursionLimitExceeded,
    TrailingBytes,
    PayloadTooLarge,
    NonZeroPadding,
    FieldOverflow,
    InvalidField,
    PathNotFound,
    TypeMismatch,
}

#[derive(Debug, thiserror::Error)]
pub enum SaveError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    #[error("bad save signature {found:02x?}, expected \"SGB1\"")]
    BadSignature { found: [u8; 4] },
    #[error("unsupported save version {found}, expected one of 14, 15, 16")]
    UnsupportedVersion { found: u32 },
    #[error("truncated input at offset {offset}: need {needed} bytes, {available} available")]
    TruncatedInput {
        offset: usize,
        needed: usize,
        available: usize,
    },
    #[error("unknown value tag 0x{tag:02x} at offset {offset}")]
    UnknownTag { tag: u8, offset: usize },
    #[error("invalid table key at offset {offset}: {reason}")]
    InvalidKey { offset: usize, reason: String },
    #[error("duplicate table key {key} at offset {offset}")]
    DuplicateKey { key: String, offset: usize },
    #[error("table nesting exceeds the limit of {limit}")]
    RecursionLimitExceeded { limit: usize },
    #[error("{len} trailing bytes after value at offset {offset}")]
    TrailingBytes { offset: usize, len: usize },
    #[error("payload of {len} bytes exceeds the limit of {limit} bytes")]
    PayloadTooLarge { len: usize, limit: usize },
    #[error("non-zero padding byte at offset {offset}")]
    NonZeroPadding { offset: usize },
    #[error("field {field} is {len} bytes, its buffer holds {max}")]
    FieldOverflow {
        field: &'static str,
        len: usize,
        max: usize,
    },
    #[error("invalid field {field}: {reason}")]
    InvalidField { field: &'static str, reason: String },
    #[error("path not found: {path}")]
    PathNotFound { path: String },
    #[error("type mismatch at {path}: expected {expected}, found {found}")]
    TypeMismatch {
        path: String,
        expected: &'static str,
        found: &'static str,
    },
    #[error("{}: {source}", path.display())]
    AtPath {
        path: PathBuf,
        #[source]
        source: Box<SaveError>,
    },
}

impl SaveError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Io(_) => ErrorKind::Io,
            Self::BadSignature { .. } => ErrorKind::BadSignature,
            Self::UnsupportedVersion { .. } => ErrorKind::UnsupportedVersion,
            Self::TruncatedInput { .. } => ErrorKind::TruncatedInput,
            Self::UnknownTag { .. } => ErrorKind::UnknownTag,
            Self::InvalidKey { .. } => ErrorKind::InvalidKey,
            Self::DuplicateKey { .. } => ErrorKind::DuplicateKey,
            Self::RecursionLimitExceeded { .. } => ErrorKind::RecursionLimitExceeded,
            Self::TrailingBytes { .. } => ErrorKind::TrailingBytes,
            Self::PayloadTooLarge { .. } => ErrorKind::PayloadTooLarge,
            Self::NonZeroPadding { .. } => ErrorKind::NonZeroPadding,
            Self::FieldOverflow { .. } => ErrorKind::FieldOverflow,
            Self::InvalidField { .. } => ErrorKind::InvalidField,
            Self::PathNotFound { .. } => ErrorKind::PathNotFound,
            Self::TypeMismatch { .. } => ErrorKind::TypeMismatch,
            Self::AtPath { source, .. } => source.kind(),
        }
    }

    /// The file this error was raised for, when it came out of `load`/`save`.
    pub fn path(&self) -> Option<&Path> {
        match self {
            Self::AtPath { path, .. } => Some(path),
            _ => None,
        }
    }

    pub(crate) fn at_path(self, path: &Path) -> Self {
        match self {
            already @ Self::AtPath { .. } => already,
            other => Self::AtPath {
                path: path.to_path_buf(),
                source: Box::new(other),
            },
        }
    }

    pub(crate) fn invalid_field(field: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidField {
            field,
            reason: reason.into(),
        }
    }
}

pub type Result<T, E = SaveError> = std::result::Result<T, E>;
