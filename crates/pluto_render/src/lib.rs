use std::fmt::Write as _;

use pluto_core::core_api::{CurrencyEntry, RunRecord, SaveInfo, currencies, save_info};
use pluto_core::{FileLayout, LuaKey, LuaValue, SaveContainer};
use serde_json::{Map as JsonMap, Value as JsonValue};

const INFO_LABEL_WIDTH: usize = 28;
const LAYOUT_NAME_WIDTH: usize = 12;

pub const RUNS_CSV_HEADER: [&str; 8] = [
    "Attempt",
    "Heat",
    "Weapon",
    "Form",
    "Elapsed time (seconds)",
    "Outcome",
    "Godmode",
    "Godmode damage reduction",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TreeRenderOptions {
    /// Tables nested deeper than this are summarized instead of expanded.
    pub max_depth: Option<usize>,
}

// ----------------------------------------------------------------------------
// Info and currencies
// ----------------------------------------------------------------------------

pub fn render_info_json(container: &SaveContainer) -> JsonValue {
    let info = save_info(container);
    let mut out = JsonMap::new();

    out.insert("version".to_string(), JsonValue::from(info.version.raw()));
    out.insert("timestamp".to_string(), opt(info.timestamp));
    out.insert("location".to_string(), JsonValue::String(info.location));
    out.insert("runs".to_string(), JsonValue::from(info.runs));
    out.insert(
        "active_meta_points".to_string(),
        JsonValue::from(info.active_meta_points),
    );
    out.insert(
        "active_shrine_points".to_string(),
        opt(info.active_shrine_points),
    );
    out.insert(
        "god_mode_enabled".to_string(),
        JsonValue::Bool(info.god_mode_enabled),
    );
    out.insert("easy_mode_level".to_string(), number_or_null(info.easy_mode_level));
    out.insert(
        "god_mode_damage_reduction".to_string(),
        number_or_null(info.god_mode_damage_reduction),
    );
    out.insert(
        "hell_mode_enabled".to_string(),
        JsonValue::Bool(info.hell_mode_enabled),
    );
    out.insert(
        "current_map_name".to_string(),
        JsonValue::String(info.current_map_name),
    );
    out.insert(
        "start_next_map".to_string(),
        JsonValue::String(info.start_next_map),
    );

    JsonValue::Object(out)
}

pub fn render_info_text(container: &SaveContainer) -> String {
    let info: SaveInfo = save_info(container);
    let mut out = String::new();
    let _ = writeln!(out, "Save File Information:");
    info_line(&mut out, "Version", &info.version.to_string());
    if let Some(ts) = info.timestamp {
        info_line(&mut out, "Timestamp", &ts.to_string());
    }
    info_line(&mut out, "Location", &info.location);
    info_line(&mut out, "Runs", &info.runs.to_string());
    info_line(&mut out, "Active Meta Points", &info.active_meta_points.to_string());
    if let Some(points) = info.active_shrine_points {
        info_line(&mut out, "Active Shrine Points", &points.to_string());
    }
    info_line(&mut out, "God Mode Enabled", yes_no(info.god_mode_enabled));
    if info.god_mode_enabled {
        if let Some(reduction) = info.god_mode_damage_reduction {
            info_line(
                &mut out,
                "God Mode Damage Reduction",
                &format!("{}%", format_number(reduction)),
            );
        }
    }
    info_line(&mut out, "Hell Mode Enabled", yes_no(info.hell_mode_enabled));
    info_line(&mut out, "Current Map", &info.current_map_name);
    info_line(&mut out, "Next Map", &info.start_next_map);
    out
}

pub fn render_currencies_json(container: &SaveContainer) -> JsonValue {
    let mut out = JsonMap::new();
    for CurrencyEntry { name, value } in currencies(container) {
        out.insert(name, number_or_null(value));
    }
    JsonValue::Object(out)
}

pub fn render_currencies_text(container: &SaveContainer) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Currencies:");
    for entry in currencies(container) {
        let value = match entry.value {
            Some(v) => format_number(v.trunc()),
            None => "-".to_string(),
        };
        info_line(&mut out, &title_case(&entry.name), &value);
    }
    out
}

/// Header fields exactly as stored, for inspection.
pub fn render_raw_json(container: &SaveContainer) -> JsonValue {
    let header = container.header();
    let mut out = JsonMap::new();
    out.insert(
        "version".to_string(),
        JsonValue::from(container.version().raw()),
    );
    out.insert("timestamp".to_string(), opt(header.timestamp));
    out.insert(
        "location".to_string(),
        JsonValue::String(header.location.clone()),
    );
    out.insert("runs".to_string(), JsonValue::from(header.runs));
    out.insert(
        "active_meta_points".to_string(),
        JsonValue::from(header.active_meta_points),
    );
    out.insert(
        "active_shrine_points".to_string(),
        opt(header.active_shrine_points),
    );
    out.insert(
        "god_mode_enabled".to_string(),
        JsonValue::Bool(header.god_mode_enabled),
    );
    out.insert("hell_mode_enabled".to_string(), opt(header.hell_mode_enabled));

    let mut keys = JsonMap::new();
    for (k, v) in &header.lua_keys {
        keys.insert(k.clone(), JsonValue::String(v.clone()));
    }
    out.insert("lua_keys".to_string(), JsonValue::Object(keys));
    out.insert(
        "current_map_name".to_string(),
        JsonValue::String(header.current_map_name.clone()),
    );
    out.insert(
        "start_next_map".to_string(),
        JsonValue::String(header.start_next_map.clone()),
    );
    JsonValue::Object(out)
}

// ----------------------------------------------------------------------------
// Lua tree
// ----------------------------------------------------------------------------

/// Convert a Lua value to JSON. Tables become objects in entry order, with
/// integer keys written as decimal strings. Non-UTF-8 strings are converted
/// lossily and non-finite numbers become `null`.
pub fn lua_to_json(value: &LuaValue) -> JsonValue {
    match value {
        LuaValue::Nil => JsonValue::Null,
        LuaValue::Boolean(b) => JsonValue::Bool(*b),
        LuaValue::Number(n) => json_number(*n),
        LuaValue::String(bytes) => JsonValue::String(String::from_utf8_lossy(bytes).into_owned()),
        LuaValue::Table(table) => {
            let mut out = JsonMap::new();
            for (key, value) in table.iter() {
                out.insert(key.to_string(), lua_to_json(value));
            }
            JsonValue::Object(out)
        }
    }
}

pub fn render_tree_text(value: &LuaValue, options: TreeRenderOptions) -> String {
    let mut out = String::new();
    match value {
        LuaValue::Table(_) => write_tree(&mut out, value, 0, options),
        leaf => {
            let _ = writeln!(out, "{}", leaf_text(leaf));
        }
    }
    out
}

fn write_tree(out: &mut String, value: &LuaValue, depth: usize, options: TreeRenderOptions) {
    let Some(table) = value.as_table() else {
        return;
    };
    let indent = "  ".repeat(depth);
    for (key, child) in table.iter() {
        let label = key_text(key);
        match child {
            LuaValue::Table(inner) => {
                let expand = options.max_depth.is_none_or(|max| depth + 1 < max);
                if expand && !inner.is_empty() {
                    let _ = writeln!(out, "{indent}{label}:");
                    write_tree(out, child, depth + 1, options);
                } else {
                    let _ = writeln!(out, "{indent}{label}: {{{} entries}}", inner.len());
                }
            }
            leaf => {
                let _ = writeln!(out, "{indent}{label} = {}", leaf_text(leaf));
            }
        }
    }
}

fn key_text(key: &LuaKey) -> String {
    match key {
        LuaKey::Integer(n) => format!("[{n}]"),
        LuaKey::String(_) => key.to_string(),
    }
}

fn leaf_text(value: &LuaValue) -> String {
    match value {
        LuaValue::Nil => "nil".to_string(),
        LuaValue::Boolean(b) => b.to_string(),
        LuaValue::Number(n) => format_number(*n),
        LuaValue::String(bytes) => format!("{:?}", String::from_utf8_lossy(bytes)),
        LuaValue::Table(t) => format!("{{{} entries}}", t.len()),
    }
}

// ----------------------------------------------------------------------------
// Layout
// ----------------------------------------------------------------------------

pub fn render_layout_text(layout: &FileLayout) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "File length: {} bytes", layout.file_len);
    for section in &layout.sections {
        let _ = writeln!(
            out,
            "  {:<width$} {:>10}..{:<10} ({} bytes)",
            section.id.name(),
            section.range.start,
            section.range.end,
            section.range.len(),
            width = LAYOUT_NAME_WIDTH,
        );
    }
    out
}

pub fn render_layout_json(layout: &FileLayout) -> JsonValue {
    let sections = layout
        .sections
        .iter()
        .map(|section| {
            let mut entry = JsonMap::new();
            entry.insert(
                "section".to_string(),
                JsonValue::String(section.id.name().to_string()),
            );
            entry.insert("start".to_string(), JsonValue::from(section.range.start));
            entry.insert("end".to_string(), JsonValue::from(section.range.end));
            entry.insert("len".to_string(), JsonValue::from(section.range.len()));
            JsonValue::Object(entry)
        })
        .collect();

    let mut out = JsonMap::new();
    out.insert("file_len".to_string(), JsonValue::from(layout.file_len));
    out.insert("sections".to_string(), JsonValue::Array(sections));
    JsonValue::Object(out)
}

// ----------------------------------------------------------------------------
// Run history CSV
// ----------------------------------------------------------------------------

/// Run history as CSV with the Excel dialect: comma separated, CRLF line
/// ends, fields quoted only when they need it.
pub fn runs_to_csv(runs: &[RunRecord]) -> String {
    let mut out = String::new();
    write_csv_row(&mut out, RUNS_CSV_HEADER.iter().map(|s| s.to_string()));
    for run in runs {
        let row = [
            run.attempt.to_string(),
            run.heat.map(format_number).unwrap_or_default(),
            run.weapon.clone().unwrap_or_default(),
            run.aspect.clone().unwrap_or_default(),
            run.elapsed_seconds.map(format_number).unwrap_or_default(),
            if run.escaped { "Escaped" } else { "" }.to_string(),
            if run.god_mode { "True" } else { "False" }.to_string(),
            run.god_mode_damage_reduction
                .map(format_number)
                .unwrap_or_default(),
        ];
        write_csv_row(&mut out, row.into_iter());
    }
    out
}

fn write_csv_row(out: &mut String, fields: impl Iterator<Item = String>) {
    for (i, field) in fields.enumerate() {
        if i > 0 {
            out.push(',');
        }
        out.push_str(&csv_field(&field));
    }
    out.push_str("\r\n");
}

fn csv_field(field: &str) -> String {
    if field.contains([',', '"', '\r', '\n']) {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

// ----------------------------------------------------------------------------
// Helpers
// ----------------------------------------------------------------------------

/// Integral values print without a fractional part.
pub fn format_number(n: f64) -> String {
    if n.is_finite() && n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        n.to_string()
    }
}

fn json_number(n: f64) -> JsonValue {
    if n.is_finite() && n.fract() == 0.0 && n.abs() < 1e15 {
        JsonValue::from(n as i64)
    } else {
        serde_json::Number::from_f64(n)
            .map(JsonValue::Number)
            .unwrap_or(JsonValue::Null)
    }
}

fn number_or_null(n: Option<f64>) -> JsonValue {
    n.map(json_number).unwrap_or(JsonValue::Null)
}

fn opt<T: Into<JsonValue>>(value: Option<T>) -> JsonValue {
    value.map(Into::into).unwrap_or(JsonValue::Null)
}

fn info_line(out: &mut String, label: &str, value: &str) {
    let label = format!("{label}:");
    let _ = writeln!(out, "  {label:<width$}{value}", width = INFO_LABEL_WIDTH);
}

fn yes_no(flag: bool) -> &'static str {
    if flag { "Yes" } else { "No" }
}

fn title_case(name: &str) -> String {
    name.split('_')
        .filter(|w| !w.is_empty())
        .map(|w| {
            let mut chars = w.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}
