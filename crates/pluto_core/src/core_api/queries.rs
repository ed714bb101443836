use tracing::warn;

use super::types::{CurrencyEntry, RunRecord, SaveInfo};
use super::well_known::{
    self, CURRENCIES, EASY_MODE_LEVEL, HARD_MODE_FLAG, RUN_HISTORY, aspect_name,
    damage_reduction_from_level, weapon_name,
};
use crate::container::SaveContainer;
use crate::lua::{LuaKey, LuaTable, LuaValue};

pub fn save_info(container: &SaveContainer) -> SaveInfo {
    let header = container.header();
    let easy_mode_level = number_at(container, EASY_MODE_LEVEL);
    // Version 14 has no header flag; the tree flag is the only record there.
    let hell_mode_enabled = header
        .hell_mode_enabled
        .or_else(|| {
            container
                .get(well_known::path(HARD_MODE_FLAG))
                .ok()
                .and_then(LuaValue::as_bool)
        })
        .unwrap_or(false);

    SaveInfo {
        version: container.version(),
        timestamp: header.timestamp,
        location: header.location.clone(),
        runs: header.runs,
        active_meta_points: header.active_meta_points,
        active_shrine_points: header.active_shrine_points,
        god_mode_enabled: header.god_mode_enabled,
        easy_mode_level,
        god_mode_damage_reduction: easy_mode_level.map(damage_reduction_from_level),
        hell_mode_enabled,
        current_map_name: header.current_map_name.clone(),
        start_next_map: header.start_next_map.clone(),
        lua_key_count: header.lua_keys.len(),
    }
}

pub fn currencies(container: &SaveContainer) -> Vec<CurrencyEntry> {
    CURRENCIES
        .iter()
        .map(|currency| CurrencyEntry {
            name: currency.name.to_string(),
            value: container
                .get(currency.path())
                .ok()
                .and_then(LuaValue::as_number),
        })
        .collect()
}

fn number_at(container: &SaveContainer, path: &[&str]) -> Option<f64> {
    container
        .get(well_known::path(path))
        .ok()
        .and_then(LuaValue::as_number)
}

/// Project every entry of `GameState/RunHistory`, in table order.
///
/// A save without run history yields no rows. Entries that are not tables
/// or whose key is not a run number are skipped.
pub fn run_history(container: &SaveContainer) -> Vec<RunRecord> {
    let Some(runs) = container
        .get(well_known::path(RUN_HISTORY))
        .ok()
        .and_then(LuaValue::as_table)
    else {
        warn!("save has no GameState/RunHistory table");
        return Vec::new();
    };

    runs.iter()
        .filter_map(|(key, run)| {
            let attempt = attempt_number(key);
            let run = run.as_table();
            match (attempt, run) {
                (Some(attempt), Some(run)) => Some(run_record(attempt, run)),
                _ => {
                    warn!(key = %key, "skipping malformed run history entry");
                    None
                }
            }
        })
        .collect()
}

fn attempt_number(key: &LuaKey) -> Option<i64> {
    match key {
        LuaKey::Integer(n) => Some(*n),
        LuaKey::String(_) => key.as_str().and_then(|s| s.trim().parse().ok()),
    }
}

fn run_record(attempt: i64, run: &LuaTable) -> RunRecord {
    let field = |name: &str| run.get(&LuaKey::from(name));
    let easy_mode_level = field("EasyModeLevel").and_then(LuaValue::as_number);

    RunRecord {
        attempt,
        heat: field("ShrinePointsCache").and_then(LuaValue::as_number),
        weapon: field("WeaponsCache").map(|cache| {
            weapon_from_cache(cache)
                .unwrap_or("Unknown weapon")
                .to_string()
        }),
        aspect: field("TraitCache").map(|cache| match aspect_from_cache(cache) {
            Some(name) => format!("Aspect of {name}"),
            None => "Redacted".to_string(),
        }),
        elapsed_seconds: field("GameplayTime").and_then(LuaValue::as_number),
        escaped: field("Cleared").and_then(LuaValue::as_bool).unwrap_or(false),
        god_mode: field("EasyModeLevel").is_some(),
        god_mode_damage_reduction: easy_mode_level.map(damage_reduction_from_level),
    }
}

/// Names held by a cache table, whether stored as keys (`{SwordWeapon = true}`)
/// or as array values (`{"SwordWeapon"}`).
fn cache_names(cache: &LuaValue) -> Vec<&str> {
    let Some(table) = cache.as_table() else {
        return Vec::new();
    };
    table
        .iter()
        .filter_map(|(key, value)| key.as_str().or_else(|| value.as_str()))
        .collect()
}

fn weapon_from_cache(cache: &LuaValue) -> Option<&'static str> {
    let names = cache_names(cache);
    well_known::HERO_MELEE_WEAPONS
        .iter()
        .find(|(id, _)| names.contains(id))
        .and_then(|(id, _)| weapon_name(id))
}

fn aspect_from_cache(cache: &LuaValue) -> Option<&'static str> {
    cache_names(cache).into_iter().find_map(aspect_name)
}
