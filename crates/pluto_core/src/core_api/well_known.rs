//! Tree locations and display names the game uses for the state this tool
//! reads and edits.

use crate::lua::{LuaKey, LuaPath};

pub const GAME_STATE: &str = "GameState";
pub const RESOURCES: &str = "Resources";

pub const EASY_MODE_LEVEL: &[&str] = &[GAME_STATE, "EasyModeLevel"];
pub const HARD_MODE_FLAG: &[&str] = &[GAME_STATE, "Flags", "HardMode"];
pub const RUN_HISTORY: &[&str] = &[GAME_STATE, "RunHistory"];

/// Tables under `GameState` that hold NPC gift and dialogue progress.
pub const NPC_RECORD_TABLES: &[&str] = &[
    "Gift",
    "NPCInteractions",
    "TriggerRecord",
    "ActivationRecord",
    "UseRecord",
    "TextLinesRecord",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Currency {
    pub name: &'static str,
    pub resource: &'static str,
}

#[rustfmt::skip]
pub const CURRENCIES: &[Currency] = &[
    Currency { name: "darkness",     resource: "MetaPoints" },
    Currency { name: "gems",         resource: "Gems" },
    Currency { name: "diamonds",     resource: "SuperGems" },
    Currency { name: "nectar",       resource: "GiftPoints" },
    Currency { name: "ambrosia",     resource: "SuperGiftPoints" },
    Currency { name: "chthonic_key", resource: "LockKeys" },
    Currency { name: "titan_blood",  resource: "SuperLockKeys" },
];

impl Currency {
    pub fn path(&self) -> LuaPath {
        LuaPath::from(&[GAME_STATE, RESOURCES, self.resource][..])
    }
}

pub fn path(segments: &[&str]) -> LuaPath {
    LuaPath::from(segments)
}

pub fn npc_record_path(table: &str) -> LuaPath {
    LuaPath::new(vec![LuaKey::from(GAME_STATE), LuaKey::from(table)])
}

/// Melee weapon ids in the order the run export checks them.
#[rustfmt::skip]
pub const HERO_MELEE_WEAPONS: &[(&str, &str)] = &[
    ("SwordWeapon",  "Stygian Blade"),
    ("SpearWeapon",  "Eternal Spear"),
    ("ShieldWeapon", "Shield of Chaos"),
    ("BowWeapon",    "Heart-Seeking Bow"),
    ("FistWeapon",   "Twin Fists"),
    ("GunWeapon",    "Adamant Rail"),
];

/// Aspect trait ids and the name of the aspect they grant.
#[rustfmt::skip]
pub const ASPECT_TRAITS: &[(&str, &str)] = &[
    ("SwordBaseUpgradeTrait",          "Zagreus"),
    ("SwordCriticalParryTrait",        "Nemesis"),
    ("DislodgeAmmoTrait",              "Poseidon"),
    ("SwordConsecrationTrait",         "Arthur"),
    ("SpearBaseUpgradeTrait",          "Zagreus"),
    ("SpearTeleportTrait",             "Achilles"),
    ("SpearWeaveTrait",                "Hades"),
    ("SpearSpinTravel",                "Guan Yu"),
    ("ShieldBaseUpgradeTrait",         "Zagreus"),
    ("ShieldRushBonusProjectileTrait", "Chaos"),
    ("ShieldTwoShieldTrait",           "Zeus"),
    ("ShieldLoadAmmoTrait",            "Beowulf"),
    ("BowBaseUpgradeTrait",            "Zagreus"),
    ("BowMarkHomingTrait",             "Chiron"),
    ("BowLoadAmmoTrait",               "Hera"),
    ("BowBondTrait",                   "Rama"),
    ("FistBaseUpgradeTrait",           "Zagreus"),
    ("FistVacuumTrait",                "Talos"),
    ("FistWeaveTrait",                 "Demeter"),
    ("FistDetonateTrait",              "Gilgamesh"),
    ("GunBaseUpgradeTrait",            "Zagreus"),
    ("GunGrenadeSelfEmpowerTrait",     "Eris"),
    ("GunManualReloadTrait",           "Hestia"),
    ("GunLoadedGrenadeTrait",          "Lucifer"),
];

pub fn weapon_name(id: &str) -> Option<&'static str> {
    HERO_MELEE_WEAPONS
        .iter()
        .find(|(weapon, _)| *weapon == id)
        .map(|(_, name)| *name)
}

pub fn aspect_name(trait_id: &str) -> Option<&'static str> {
    ASPECT_TRAITS
        .iter()
        .find(|(id, _)| *id == trait_id)
        .map(|(_, name)| *name)
}

/// Damage reduction percentage for a god mode level.
pub fn damage_reduction_from_level(level: f64) -> f64 {
    level * 2.0 + 20.0
}

/// God mode level for a damage reduction percentage, clamped to the 20..=80
/// range the game offers.
pub fn level_from_damage_reduction(percent: f64) -> f64 {
    ((percent.clamp(20.0, 80.0) - 20.0) / 2.0).trunc()
}
