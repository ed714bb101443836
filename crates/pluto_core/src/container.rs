use std::ffi::OsString;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::error::{Result, SaveError};
use crate::layout::FileLayout;
use crate::lua::edit::coerce_at;
use crate::lua::path::{describe, lookup, lookup_mut};
use crate::lua::{LuaCodec, LuaKey, LuaValue};
use crate::padding::PaddingPolicy;
use crate::schema::{HeaderFields, schema_for};
use crate::version::{SaveVersion, detect};

/// A decoded save: version, header fields and the Lua state tree.
///
/// Loading and saving are whole-file operations. Edits only touch the
/// in-memory state until [`SaveContainer::save`] is called.
#[derive(Debug, Clone, PartialEq)]
pub struct SaveContainer {
    version: SaveVersion,
    header: HeaderFields,
    root: LuaValue,
    codec: LuaCodec,
}

impl SaveContainer {
    pub fn new(version: SaveVersion, header: HeaderFields, root: LuaValue) -> Self {
        Self {
            version,
            header,
            root,
            codec: LuaCodec::default(),
        }
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        Self::load_with_codec(path, LuaCodec::default())
    }

    pub fn load_with_codec(path: impl AsRef<Path>, codec: LuaCodec) -> Result<Self> {
        let path = path.as_ref();
        let bytes = fs::read(path).map_err(|e| SaveError::from(e).at_path(path))?;
        let container =
            Self::from_bytes_with_codec(&bytes, codec).map_err(|e| e.at_path(path))?;
        info!(
            path = %path.display(),
            version = %container.version,
            len = bytes.len(),
            "loaded save"
        );
        Ok(container)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        Self::from_bytes_with_codec(bytes, LuaCodec::default())
    }

    pub fn from_bytes_with_codec(bytes: &[u8], codec: LuaCodec) -> Result<Self> {
        let version = detect(bytes)?;
        let record = schema_for(version).parse(bytes)?;
        PaddingPolicy::for_version(version).verify(bytes, record.consumed)?;
        let root = codec.decode(record.blob)?;
        debug!(blob_len = record.blob.len(), "decoded lua state");

        Ok(Self {
            version,
            header: record.header,
            root,
            codec,
        })
    }

    pub fn version(&self) -> SaveVersion {
        self.version
    }

    pub fn header(&self) -> &HeaderFields {
        &self.header
    }

    pub fn header_mut(&mut self) -> &mut HeaderFields {
        &mut self.header
    }

    pub fn root(&self) -> &LuaValue {
        &self.root
    }

    pub fn root_mut(&mut self) -> &mut LuaValue {
        &mut self.root
    }

    pub fn codec(&self) -> LuaCodec {
        self.codec
    }

    pub fn get(&self, path: impl AsRef<[LuaKey]>) -> Result<&LuaValue> {
        lookup(&self.root, path.as_ref())
    }

    pub fn get_mut(&mut self, path: impl AsRef<[LuaKey]>) -> Result<&mut LuaValue> {
        lookup_mut(&mut self.root, path.as_ref())
    }

    /// Store `value` at `path`, returning what was there before.
    ///
    /// The parent table must already exist; an empty path replaces the root.
    pub fn set(&mut self, path: impl AsRef<[LuaKey]>, value: LuaValue) -> Result<Option<LuaValue>> {
        let path = path.as_ref();
        let Some((key, parent_path)) = path.split_last() else {
            return Ok(Some(std::mem::replace(&mut self.root, value)));
        };
        let parent = lookup_mut(&mut self.root, parent_path)?;
        let found = parent.type_name();
        let table = parent.as_table_mut().ok_or_else(|| SaveError::TypeMismatch {
            path: describe(parent_path),
            expected: "table",
            found,
        })?;
        Ok(table.insert(key.clone(), value))
    }

    pub fn remove(&mut self, path: impl AsRef<[LuaKey]>) -> Result<LuaValue> {
        let path = path.as_ref();
        let not_found = || SaveError::PathNotFound {
            path: describe(path),
        };
        let (key, parent_path) = path.split_last().ok_or_else(not_found)?;
        lookup_mut(&mut self.root, parent_path)?
            .as_table_mut()
            .and_then(|t| t.remove(key))
            .ok_or_else(not_found)
    }

    /// Replace a leaf with `text` parsed as the leaf's current variant.
    /// Returns the previous value.
    pub fn edit_leaf(&mut self, path: impl AsRef<[LuaKey]>, text: &str) -> Result<LuaValue> {
        let path = path.as_ref();
        let slot = lookup_mut(&mut self.root, path)?;
        let value = coerce_at(&describe(path), slot, text)?;
        Ok(std::mem::replace(slot, value))
    }

    /// Encode the tree, rebuild the outer layout and apply padding.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let blob = self.codec.encode(&self.root)?;
        let built = schema_for(self.version).build(&self.header, &blob)?;
        debug!(blob_len = blob.len(), content_len = built.len(), "rebuilt save");
        PaddingPolicy::for_version(self.version).apply(built)
    }

    /// Write the save to `<path>.tmp`, sync it, then rename it over `path`.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let bytes = self.to_bytes().map_err(|e| e.at_path(path))?;
        write_atomic(path, &bytes).map_err(|e| SaveError::from(e).at_path(path))?;
        info!(
            path = %path.display(),
            version = %self.version,
            len = bytes.len(),
            "saved save"
        );
        Ok(())
    }
}

fn tmp_path(path: &Path) -> PathBuf {
    let mut name = OsString::from(path.as_os_str());
    name.push(".tmp");
    PathBuf::from(name)
}

fn write_atomic(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    let tmp = tmp_path(path);
    let written = File::create(&tmp).and_then(|mut file| {
        file.write_all(bytes)?;
        file.sync_all()
    });
    if let Err(e) = written.and_then(|()| fs::rename(&tmp, path)) {
        let _ = fs::remove_file(&tmp);
        return Err(e);
    }
    Ok(())
}

/// Byte ranges of every region of a save file, checked to tile it exactly.
pub fn describe_layout(bytes: &[u8]) -> Result<FileLayout> {
    let version = detect(bytes)?;
    let record = schema_for(version).parse(bytes)?;
    let layout = record.layout;
    layout.validate()?;
    Ok(layout)
}
