use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand, ValueEnum};
use pluto_core::core_api::{EditableField, apply_update, reset_npc_gifts, run_history};
use pluto_core::{
    DiscoveredCache, LuaCodec, LuaKey, LuaPath, SaveContainer, describe_layout,
    lua::DEFAULT_MAX_DEPTH,
};
use pluto_render::{
    TreeRenderOptions, lua_to_json, render_currencies_json, render_currencies_text,
    render_info_json, render_info_text, render_layout_json, render_layout_text, render_raw_json,
    render_tree_text, runs_to_csv,
};
use serde_json::Value as JsonValue;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Deeper nesting than this risks overflowing the decoder's stack.
const MAX_DEPTH_CEILING: i64 = 4096;

#[derive(Debug, Parser)]
#[command(name = "pluto", author, version, about = "Inspect and edit Hades save files")]
struct Cli {
    /// Save file to read
    #[arg(short, long, value_name = "SAVE")]
    file: PathBuf,

    /// Enable debug logging on stderr
    #[arg(short, long)]
    verbose: bool,

    /// Maximum table nesting accepted in the Lua state
    #[arg(
        long,
        value_name = "N",
        default_value_t = DEFAULT_MAX_DEPTH as u32,
        value_parser = clap::value_parser!(u32).range(1..=MAX_DEPTH_CEILING),
    )]
    max_depth: u32,

    /// Write edits here instead of overwriting SAVE
    #[arg(short, long, value_name = "PATH")]
    output: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Print a summary section of the save
    Show {
        #[arg(value_enum)]
        section: ShowSection,
        #[arg(long)]
        json: bool,
    },
    /// Print the value at a path in the Lua state, e.g. GameState/Resources/Gems
    Get {
        path: LuaPath,
        #[arg(long)]
        json: bool,
    },
    /// Print the Lua state as an indented tree
    Tree {
        path: Option<LuaPath>,
        /// Expand at most this many levels of tables
        #[arg(long, value_name = "N")]
        depth: Option<usize>,
    },
    /// Replace a leaf value, keeping its type
    Set {
        path: LuaPath,
        #[arg(allow_hyphen_values = true)]
        value: String,
    },
    /// Change a named field
    Update {
        #[arg(value_parser = parse_field)]
        field: EditableField,
        #[arg(allow_hyphen_values = true)]
        value: String,
    },
    /// Clear NPC gift and dialogue records
    ResetGifts,
    /// Write run history to a CSV file
    ExportRuns { csv: PathBuf },
    /// Print the byte ranges of each region of the file
    Layout {
        #[arg(long)]
        json: bool,
    },
    /// Remember or restore table entries across saves
    Cache {
        /// Cache file [default: SAVE.discovered.json]
        #[arg(long, value_name = "PATH")]
        cache: Option<PathBuf>,
        #[command(subcommand)]
        action: CacheAction,
    },
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
enum ShowSection {
    Info,
    Currencies,
    Raw,
}

#[derive(Debug, Subcommand)]
enum CacheAction {
    /// Add the entries of a table to the cache
    Record { table: LuaPath },
    /// Put a cached entry back into a table
    Restore { table: LuaPath, key: LuaPath },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let codec = LuaCodec::with_max_depth(cli.max_depth as usize);
    let output = cli.output.clone().unwrap_or_else(|| cli.file.clone());

    match cli.command {
        Command::Show { section, json } => {
            let container = load(&cli.file, codec)?;
            let rendered = match (section, json) {
                (ShowSection::Info, true) => pretty(&render_info_json(&container))?,
                (ShowSection::Info, false) => render_info_text(&container),
                (ShowSection::Currencies, true) => pretty(&render_currencies_json(&container))?,
                (ShowSection::Currencies, false) => render_currencies_text(&container),
                (ShowSection::Raw, _) => pretty(&render_raw_json(&container))?,
            };
            print_block(&rendered);
        }
        Command::Get { path, json } => {
            let container = load(&cli.file, codec)?;
            let value = container.get(&path)?;
            if json {
                print_block(&pretty(&lua_to_json(value))?);
            } else {
                print_block(&render_tree_text(value, TreeRenderOptions::default()));
            }
        }
        Command::Tree { path, depth } => {
            let container = load(&cli.file, codec)?;
            let path = path.unwrap_or_default();
            let value = container.get(&path)?;
            print_block(&render_tree_text(value, TreeRenderOptions { max_depth: depth }));
        }
        Command::Set { path, value } => {
            let mut container = load(&cli.file, codec)?;
            let previous = container.edit_leaf(&path, &value)?;
            info!(path = %path, ?previous, "edited leaf");
            save(&container, &output)?;
        }
        Command::Update { field, value } => {
            let mut container = load(&cli.file, codec)?;
            apply_update(&mut container, field, &value)
                .with_context(|| format!("failed to update {field}"))?;
            save(&container, &output)?;
        }
        Command::ResetGifts => {
            let mut container = load(&cli.file, codec)?;
            let reset = reset_npc_gifts(&mut container)?;
            println!("Reset {reset} NPC record tables");
            save(&container, &output)?;
        }
        Command::ExportRuns { csv } => {
            let container = load(&cli.file, codec)?;
            let runs = run_history(&container);
            fs::write(&csv, runs_to_csv(&runs))
                .with_context(|| format!("failed to write {}", csv.display()))?;
            println!("Exported {} runs to {}", runs.len(), csv.display());
        }
        Command::Layout { json } => {
            let bytes = fs::read(&cli.file)
                .with_context(|| format!("failed to read {}", cli.file.display()))?;
            let layout = describe_layout(&bytes)
                .with_context(|| format!("failed to map {}", cli.file.display()))?;
            if json {
                print_block(&pretty(&render_layout_json(&layout))?);
            } else {
                print_block(&render_layout_text(&layout));
            }
        }
        Command::Cache { cache, action } => {
            let cache_path = cache.unwrap_or_else(|| default_cache_path(&cli.file));
            let mut store = DiscoveredCache::load(&cache_path)?;
            match action {
                CacheAction::Record { table } => {
                    let container = load(&cli.file, codec)?;
                    let added = store.record(&container, &table)?;
                    store.store(&cache_path)?;
                    println!("Recorded {added} new entries from {table}");
                }
                CacheAction::Restore { table, key } => {
                    let key = single_key(&key)?;
                    let mut container = load(&cli.file, codec)?;
                    if store.restore(&mut container, &table, &key)? {
                        save(&container, &output)?;
                        println!("Restored {}", table.join(key));
                    } else {
                        println!("{} is already present", table.join(key));
                    }
                }
            }
        }
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// Shared helpers
// ---------------------------------------------------------------------------

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn load(path: &Path, codec: LuaCodec) -> Result<SaveContainer> {
    Ok(SaveContainer::load_with_codec(path, codec)?)
}

fn save(container: &SaveContainer, path: &Path) -> Result<()> {
    container.save(path)?;
    println!("Saved {}", path.display());
    Ok(())
}

fn pretty(value: &JsonValue) -> Result<String> {
    serde_json::to_string_pretty(value).context("failed to render JSON output")
}

fn print_block(text: &str) {
    if text.ends_with('\n') {
        print!("{text}");
    } else {
        println!("{text}");
    }
}

fn parse_field(value: &str) -> Result<EditableField, String> {
    value.parse()
}

fn single_key(path: &LuaPath) -> Result<LuaKey> {
    match path.segments() {
        [key] => Ok(key.clone()),
        _ => bail!("expected a single table key, got '{path}'"),
    }
}

fn default_cache_path(save: &Path) -> PathBuf {
    let mut name = OsString::from(save.as_os_str());
    name.push(".discovered.json");
    PathBuf::from(name)
}
