use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::container::SaveContainer;
use crate::error::{Result, SaveError};
use crate::lua::{LuaKey, LuaPath, LuaValue};

/// Side file of table entries seen in earlier saves, keyed by table path.
///
/// Lets a caller put back an entry that the game (or an edit) has since
/// removed, using the value it last had.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DiscoveredCache {
    tables: BTreeMap<String, Vec<(LuaKey, LuaValue)>>,
}

impl DiscoveredCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Read a cache file. A missing file is an empty cache.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = match fs::read_to_string(path) {
            Ok(text) => text,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "no discovered-value cache yet");
                return Ok(Self::default());
            }
            Err(e) => return Err(SaveError::from(e).at_path(path)),
        };
        serde_json::from_str(&text).map_err(|e| {
            SaveError::invalid_field("discovered_cache", e.to_string()).at_path(path)
        })
    }

    pub fn store(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let text = serde_json::to_string_pretty(self)
            .map_err(|e| SaveError::invalid_field("discovered_cache", e.to_string()))?;
        fs::write(path, text).map_err(|e| SaveError::from(e).at_path(path))
    }

    pub fn entries(&self, table: &LuaPath) -> Option<&[(LuaKey, LuaValue)]> {
        self.tables.get(&table.to_string()).map(Vec::as_slice)
    }

    /// Merge the current entries of the table at `table` into the cache.
    /// Returns how many keys were new to the cache.
    pub fn record(&mut self, container: &SaveContainer, table: &LuaPath) -> Result<usize> {
        let value = container.get(table)?;
        let source = value.as_table().ok_or_else(|| SaveError::TypeMismatch {
            path: table.to_string(),
            expected: "table",
            found: value.type_name(),
        })?;

        let cached = self.tables.entry(table.to_string()).or_default();
        let mut added = 0;
        for (key, value) in source.iter() {
            match cached.iter_mut().find(|(k, _)| k == key) {
                Some(slot) => slot.1 = value.clone(),
                None => {
                    cached.push((key.clone(), value.clone()));
                    added += 1;
                }
            }
        }
        debug!(table = %table, added, total = cached.len(), "recorded discovered entries");
        Ok(added)
    }

    /// Re-insert the cached value for `key` into the table at `table`.
    ///
    /// Returns `false` when the key is already present. Fails with
    /// `PathNotFound` when the cache has never seen the key.
    pub fn restore(
        &self,
        container: &mut SaveContainer,
        table: &LuaPath,
        key: &LuaKey,
    ) -> Result<bool> {
        let target = table.join(key.clone());
        let cached = self
            .entries(table)
            .and_then(|entries| entries.iter().find(|(k, _)| k == key))
            .map(|(_, v)| v.clone());

        if container.get(table)?.as_table().is_some_and(|t| t.contains_key(key)) {
            return Ok(false);
        }

        let Some(value) = cached else {
            warn!(path = %target, "no cached value to restore");
            return Err(SaveError::PathNotFound {
                path: target.to_string(),
            });
        };
        container.set(&target, value)?;
        Ok(true)
    }
}
