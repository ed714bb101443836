mod fields;
mod queries;
mod types;
pub mod well_known;

pub use fields::{EditableField, apply_update, reset_npc_gifts};
pub use queries::{currencies, run_history, save_info};
pub use types::{CurrencyEntry, RunRecord, SaveInfo};
