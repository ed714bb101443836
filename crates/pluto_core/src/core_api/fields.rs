use std::fmt;
use std::str::FromStr;

use tracing::{debug, warn};

use super::well_known::{
    self, CURRENCIES, EASY_MODE_LEVEL, HARD_MODE_FLAG, NPC_RECORD_TABLES,
    level_from_damage_reduction,
};
use crate::container::SaveContainer;
use crate::error::{ErrorKind, Result, SaveError};
use crate::lua::edit::coerce_at;
use crate::lua::{LuaPath, LuaTable, LuaValue};

/// Fields the `update` command can change, each with a fixed target and type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EditableField {
    Darkness,
    Gems,
    Diamonds,
    Nectar,
    Ambrosia,
    Keys,
    TitanBlood,
    GodModeReduction,
    HellMode,
    Runs,
    Location,
    ActiveMetaPoints,
    ActiveShrinePoints,
    GodMode,
}

impl EditableField {
    pub const ALL: [EditableField; 14] = [
        Self::Darkness,
        Self::Gems,
        Self::Diamonds,
        Self::Nectar,
        Self::Ambrosia,
        Self::Keys,
        Self::TitanBlood,
        Self::GodModeReduction,
        Self::HellMode,
        Self::Runs,
        Self::Location,
        Self::ActiveMetaPoints,
        Self::ActiveShrinePoints,
        Self::GodMode,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Self::Darkness => "darkness",
            Self::Gems => "gems",
            Self::Diamonds => "diamonds",
            Self::Nectar => "nectar",
            Self::Ambrosia => "ambrosia",
            Self::Keys => "keys",
            Self::TitanBlood => "titan_blood",
            Self::GodModeReduction => "god_mode_reduction",
            Self::HellMode => "hell_mode",
            Self::Runs => "runs",
            Self::Location => "location",
            Self::ActiveMetaPoints => "active_meta_points",
            Self::ActiveShrinePoints => "active_shrine_points",
            Self::GodMode => "god_mode",
        }
    }

    /// Resource name for the currency fields.
    fn resource(&self) -> Option<&'static str> {
        let currency = match self {
            Self::Darkness => "darkness",
            Self::Gems => "gems",
            Self::Diamonds => "diamonds",
            Self::Nectar => "nectar",
            Self::Ambrosia => "ambrosia",
            Self::Keys => "chthonic_key",
            Self::TitanBlood => "titan_blood",
            _ => return None,
        };
        CURRENCIES
            .iter()
            .find(|c| c.name == currency)
            .map(|c| c.resource)
    }
}

impl fmt::Display for EditableField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for EditableField {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase().replace('-', "_");
        Self::ALL
            .into_iter()
            .find(|field| field.name() == wanted)
            .ok_or_else(|| {
                let names: Vec<&str> = Self::ALL.iter().map(|f| f.name()).collect();
                format!("unknown field '{s}', expected one of: {}", names.join(", "))
            })
    }
}

/// Parse `text` for `field` and store it in the container.
pub fn apply_update(container: &mut SaveContainer, field: EditableField, text: &str) -> Result<()> {
    let name = field.name();
    match field {
        EditableField::Darkness
        | EditableField::Gems
        | EditableField::Diamonds
        | EditableField::Nectar
        | EditableField::Ambrosia
        | EditableField::Keys
        | EditableField::TitanBlood => {
            let value = parse_number(name, text)?;
            let path = currency_path(field)?;
            container.set(&path, LuaValue::Number(value))?;
            debug!(field = name, value, "updated currency");
        }
        EditableField::GodModeReduction => {
            let level = level_from_damage_reduction(parse_number(name, text)?);
            container.set(well_known::path(EASY_MODE_LEVEL), LuaValue::Number(level))?;
            debug!(level, "updated god mode level");
        }
        EditableField::HellMode => {
            let enabled = matches!(
                text.trim().to_ascii_lowercase().as_str(),
                "true" | "on" | "1" | "yes"
            );
            container.set(well_known::path(HARD_MODE_FLAG), LuaValue::Boolean(enabled))?;
            if container.version().has_hell_mode_flag() {
                container.header_mut().hell_mode_enabled = Some(enabled);
            }
        }
        EditableField::Runs => container.header_mut().runs = parse_u32(name, text)?,
        EditableField::Location => container.header_mut().location = text.to_string(),
        EditableField::ActiveMetaPoints => {
            container.header_mut().active_meta_points = parse_u32(name, text)?;
        }
        EditableField::ActiveShrinePoints => {
            let version = container.version();
            if !version.has_shrine_points() {
                return Err(SaveError::invalid_field(
                    "active_shrine_points",
                    format!("not stored by version {version}"),
                ));
            }
            container.header_mut().active_shrine_points = Some(parse_u32(name, text)?);
        }
        EditableField::GodMode => {
            let current = LuaValue::Boolean(container.header().god_mode_enabled);
            let parsed = coerce_at(name, &current, text)?;
            container.header_mut().god_mode_enabled = parsed.as_bool().unwrap_or(false);
        }
    }
    Ok(())
}

fn currency_path(field: EditableField) -> Result<LuaPath> {
    field
        .resource()
        .map(|resource| {
            well_known::path(&[well_known::GAME_STATE, well_known::RESOURCES, resource])
        })
        .ok_or_else(|| SaveError::invalid_field("currency", format!("{field} is not a currency")))
}

fn parse_number(field: &str, text: &str) -> Result<f64> {
    text.trim().parse::<f64>().map_err(|_| SaveError::TypeMismatch {
        path: field.to_string(),
        expected: "number",
        found: "unparseable text",
    })
}

fn parse_u32(field: &str, text: &str) -> Result<u32> {
    text.trim().parse::<u32>().map_err(|_| SaveError::TypeMismatch {
        path: field.to_string(),
        expected: "unsigned 32-bit integer",
        found: "unparseable text",
    })
}

/// Replace the NPC gift and dialogue record tables with empty tables.
/// Returns how many tables were reset; a save without `GameState` is left
/// untouched.
pub fn reset_npc_gifts(container: &mut SaveContainer) -> Result<usize> {
    let mut reset = 0;
    for table in NPC_RECORD_TABLES {
        let path = well_known::npc_record_path(table);
        match container.set(&path, LuaValue::Table(LuaTable::new())) {
            Ok(_) => reset += 1,
            Err(e) if e.kind() == ErrorKind::PathNotFound => {
                warn!(path = %path, "save has no GameState table, skipping gift reset");
                break;
            }
            Err(e) => return Err(e),
        }
    }
    debug!(reset, "reset npc records");
    Ok(reset)
}
