use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use pluto_core::{HeaderFields, LuaKey, LuaPath, LuaTable, LuaValue, SaveContainer, SaveVersion};
use serde_json::Value;
use tempfile::TempDir;

fn run_cli(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_pluto"))
        .args(args)
        .env_remove("RUST_LOG")
        .output()
        .expect("failed to run pluto CLI")
}

fn table(entries: Vec<(&str, LuaValue)>) -> LuaValue {
    LuaValue::Table(
        entries
            .into_iter()
            .map(|(k, v)| (LuaKey::from(k), v))
            .collect::<LuaTable>(),
    )
}

fn write_save(dir: &TempDir, version: SaveVersion) -> PathBuf {
    let mut history = LuaTable::new();
    history.insert(
        LuaKey::Integer(1),
        table(vec![
            ("ShrinePointsCache", LuaValue::Number(4.0)),
            (
                "WeaponsCache",
                table(vec![("BowWeapon", LuaValue::Boolean(true))]),
            ),
            ("GameplayTime", LuaValue::Number(900.0)),
            ("Cleared", LuaValue::Boolean(false)),
        ]),
    );
    let root = table(vec![(
        "GameState",
        table(vec![
            (
                "Resources",
                table(vec![
                    ("MetaPoints", LuaValue::Number(750.0)),
                    ("Gems", LuaValue::Number(20.0)),
                ]),
            ),
            ("Flags", table(vec![("HardMode", LuaValue::Boolean(false))])),
            ("RunHistory", LuaValue::Table(history)),
            ("Gift", table(vec![("NPC_Hypnos_01", LuaValue::Number(2.0))])),
        ]),
    )]);

    let mut header = HeaderFields::for_version(version);
    header.location = "Tartarus".to_string();
    header.runs = 4;
    header.current_map_name = "RoomOpening".to_string();

    let path = dir.path().join(format!("Profile_v{}.sav", version.raw()));
    SaveContainer::new(version, header, root)
        .save(&path)
        .expect("fixture save should be writable");
    path
}

fn stdout_json(output: &Output) -> Value {
    assert!(
        output.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    serde_json::from_str(&String::from_utf8_lossy(&output.stdout))
        .expect("stdout should be valid JSON")
}

fn path_str(path: &Path) -> String {
    path.to_string_lossy().to_string()
}

fn value_at(path: &Path, lua_path: &str) -> LuaValue {
    let container = SaveContainer::load(path).expect("save should reload");
    container
        .get(lua_path.parse::<LuaPath>().expect("valid path"))
        .expect("path should exist")
        .clone()
}

#[test]
fn show_info_json_reports_header() {
    let dir = tempfile::tempdir().unwrap();
    let save = path_str(&write_save(&dir, SaveVersion::V15));

    let json = stdout_json(&run_cli(&["-f", &save, "show", "info", "--json"]));
    assert_eq!(json["version"], 15);
    assert_eq!(json["location"], "Tartarus");
    assert_eq!(json["runs"], 4);
    assert_eq!(json["hell_mode_enabled"], false);
    assert_eq!(json["current_map_name"], "RoomOpening");
}

#[test]
fn show_currencies_text_lists_every_currency() {
    let dir = tempfile::tempdir().unwrap();
    let save = path_str(&write_save(&dir, SaveVersion::V16));

    let output = run_cli(&["-f", &save, "show", "currencies"]);
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.starts_with("Currencies:"));
    assert!(stdout.lines().any(|l| l.contains("Darkness:") && l.ends_with("750")));
    assert!(stdout.lines().any(|l| l.contains("Titan Blood:") && l.ends_with('-')));
}

#[test]
fn get_prints_leaf_and_json() {
    let dir = tempfile::tempdir().unwrap();
    let save = path_str(&write_save(&dir, SaveVersion::V16));

    let output = run_cli(&["-f", &save, "get", "GameState/Resources/Gems"]);
    assert!(output.status.success());
    assert_eq!(String::from_utf8_lossy(&output.stdout), "20\n");

    let json = stdout_json(&run_cli(&[
        "-f",
        &save,
        "get",
        "GameState/Resources",
        "--json",
    ]));
    assert_eq!(json["MetaPoints"], 750);

    let missing = run_cli(&["-f", &save, "get", "GameState/Nope"]);
    assert!(!missing.status.success());
    assert!(String::from_utf8_lossy(&missing.stderr).contains("GameState/Nope"));
}

#[test]
fn tree_depth_collapses_nested_tables() {
    let dir = tempfile::tempdir().unwrap();
    let save = path_str(&write_save(&dir, SaveVersion::V14));

    let output = run_cli(&["-f", &save, "tree", "--depth", "1"]);
    assert!(output.status.success());
    assert_eq!(String::from_utf8_lossy(&output.stdout), "GameState: {4 entries}\n");
}

#[test]
fn set_keeps_type_and_writes_to_output() {
    let dir = tempfile::tempdir().unwrap();
    let input = write_save(&dir, SaveVersion::V15);
    let before = fs::read(&input).unwrap();
    let edited = dir.path().join("edited.sav");

    let output = run_cli(&[
        "-f",
        &path_str(&input),
        "-o",
        &path_str(&edited),
        "set",
        "GameState/Resources/Gems",
        "99",
    ]);
    assert!(output.status.success());
    assert_eq!(value_at(&edited, "GameState/Resources/Gems"), LuaValue::Number(99.0));
    assert_eq!(fs::read(&input).unwrap(), before);

    let rejected = run_cli(&[
        "-f",
        &path_str(&input),
        "set",
        "GameState/Flags/HardMode",
        "maybe",
    ]);
    assert!(!rejected.status.success());
}

#[test]
fn update_edits_named_fields_in_place() {
    let dir = tempfile::tempdir().unwrap();
    let save = write_save(&dir, SaveVersion::V16);
    let arg = path_str(&save);

    assert!(run_cli(&["-f", &arg, "update", "darkness", "5000"]).status.success());
    assert!(run_cli(&["-f", &arg, "update", "hell-mode", "on"]).status.success());
    assert!(run_cli(&["-f", &arg, "update", "location", "Styx"]).status.success());

    assert_eq!(value_at(&save, "GameState/Resources/MetaPoints"), LuaValue::Number(5000.0));
    assert_eq!(value_at(&save, "GameState/Flags/HardMode"), LuaValue::Boolean(true));
    let container = SaveContainer::load(&save).unwrap();
    assert_eq!(container.header().location, "Styx");
    assert_eq!(container.header().hell_mode_enabled, Some(true));

    let bad_field = run_cli(&["-f", &arg, "update", "souls", "1"]);
    assert!(!bad_field.status.success());
}

#[test]
fn reset_gifts_clears_records() {
    let dir = tempfile::tempdir().unwrap();
    let save = write_save(&dir, SaveVersion::V16);

    let output = run_cli(&["-f", &path_str(&save), "reset-gifts"]);
    assert!(output.status.success());
    assert!(String::from_utf8_lossy(&output.stdout).contains("Reset 6 NPC record tables"));
    match value_at(&save, "GameState/Gift") {
        LuaValue::Table(t) => assert!(t.is_empty()),
        other => panic!("expected table, got {other:?}"),
    }
}

#[test]
fn export_runs_writes_csv() {
    let dir = tempfile::tempdir().unwrap();
    let save = path_str(&write_save(&dir, SaveVersion::V15));
    let csv = dir.path().join("runs.csv");

    let output = run_cli(&["-f", &save, "export-runs", &path_str(&csv)]);
    assert!(output.status.success());
    let text = fs::read_to_string(&csv).unwrap();
    let lines: Vec<&str> = text.split("\r\n").collect();
    assert!(lines[0].starts_with("Attempt,Heat,Weapon"));
    assert!(lines[1].starts_with("1,4,Heart-Seeking Bow,"));
}

#[test]
fn layout_json_covers_padding() {
    let dir = tempfile::tempdir().unwrap();
    let save = path_str(&write_save(&dir, SaveVersion::V14));

    let json = stdout_json(&run_cli(&["-f", &save, "layout", "--json"]));
    assert_eq!(json["file_len"], 3_145_728);
    let sections = json["sections"].as_array().expect("sections array");
    assert_eq!(sections[0]["section"], "signature");
    assert_eq!(sections.last().unwrap()["section"], "padding");
    assert_eq!(sections.last().unwrap()["end"], 3_145_728);
}

#[test]
fn bad_files_exit_with_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let bad = dir.path().join("bad.sav");
    fs::write(&bad, b"NOPE\x10\x00\x00\x00").unwrap();

    let output = run_cli(&["-f", &path_str(&bad), "show", "info"]);
    assert!(!output.status.success());
    assert!(output.stdout.is_empty());
    assert!(String::from_utf8_lossy(&output.stderr).contains("bad.sav"));
}

#[test]
fn cache_restores_cleared_entries() {
    let dir = tempfile::tempdir().unwrap();
    let save = write_save(&dir, SaveVersion::V16);
    let arg = path_str(&save);
    let cache = path_str(&dir.path().join("cache.json"));

    let recorded = run_cli(&["-f", &arg, "cache", "--cache", &cache, "record", "GameState/Gift"]);
    assert!(recorded.status.success());
    assert!(String::from_utf8_lossy(&recorded.stdout).contains("Recorded 1 new entries"));

    assert!(run_cli(&["-f", &arg, "reset-gifts"]).status.success());
    let restored = run_cli(&[
        "-f",
        &arg,
        "cache",
        "--cache",
        &cache,
        "restore",
        "GameState/Gift",
        "NPC_Hypnos_01",
    ]);
    assert!(restored.status.success());
    assert_eq!(
        value_at(&save, "GameState/Gift/NPC_Hypnos_01"),
        LuaValue::Number(2.0)
    );
}

#[test]
fn max_depth_is_bounded() {
    let dir = tempfile::tempdir().unwrap();
    let save = path_str(&write_save(&dir, SaveVersion::V16));

    for depth in ["0", "4097", "1000000"] {
        let output = run_cli(&["-f", &save, "--max-depth", depth, "show", "info"]);
        assert!(!output.status.success(), "depth {depth}");
        assert_eq!(output.status.code(), Some(2), "depth {depth}");
    }

    let shallow = run_cli(&["-f", &save, "--max-depth", "1", "show", "info"]);
    assert!(!shallow.status.success());
    assert!(String::from_utf8_lossy(&shallow.stderr).contains("nesting"));

    let ok = run_cli(&["-f", &save, "--max-depth", "4096", "show", "info"]);
    assert!(ok.status.success());
}
