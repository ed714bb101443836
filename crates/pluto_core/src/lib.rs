pub mod cache;
pub mod container;
pub mod core_api;
pub mod error;
pub mod layout;
pub mod lua;
pub mod padding;
pub mod reader;
pub mod schema;
pub mod version;

pub use cache::DiscoveredCache;
pub use container::{SaveContainer, describe_layout};
pub use error::{ErrorKind, Result, SaveError};
pub use layout::{ByteRange, FileLayout, SectionId, SectionLayout};
pub use lua::{LuaCodec, LuaKey, LuaPath, LuaTable, LuaValue, coerce_edit};
pub use padding::PaddingPolicy;
pub use schema::HeaderFields;
pub use version::{SaveVersion, detect};
