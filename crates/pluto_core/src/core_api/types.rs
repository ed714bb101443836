use serde::{Deserialize, Serialize};

use crate::version::SaveVersion;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SaveInfo {
    pub version: SaveVersion,
    pub timestamp: Option<u64>,
    pub location: String,
    pub runs: u32,
    pub active_meta_points: u32,
    pub active_shrine_points: Option<u32>,
    pub god_mode_enabled: bool,
    pub easy_mode_level: Option<f64>,
    pub god_mode_damage_reduction: Option<f64>,
    pub hell_mode_enabled: bool,
    pub current_map_name: String,
    pub start_next_map: String,
    pub lua_key_count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CurrencyEntry {
    pub name: String,
    /// `None` when the save has no value at the currency's path.
    pub value: Option<f64>,
}

/// One row of run history, projected from `GameState/RunHistory`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunRecord {
    pub attempt: i64,
    pub heat: Option<f64>,
    pub weapon: Option<String>,
    pub aspect: Option<String>,
    pub elapsed_seconds: Option<f64>,
    pub escaped: bool,
    pub god_mode: bool,
    pub god_mode_damage_reduction: Option<f64>,
}
