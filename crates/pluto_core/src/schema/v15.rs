use super::{HeaderFields, LayoutSchema, ParsedRecord, walk};
use crate::error::Result;
use crate::version::SaveVersion;

pub const STRING_WIDTH: usize = 64;

/// Adds shrine points and the hell mode flag, and widens the string buffers.
#[derive(Debug, Clone, Copy, Default)]
pub struct V15Schema;

impl LayoutSchema for V15Schema {
    fn version(&self) -> SaveVersion {
        SaveVersion::V15
    }

    fn string_width(&self) -> usize {
        STRING_WIDTH
    }

    fn parse<'a>(&self, bytes: &'a [u8]) -> Result<ParsedRecord<'a>> {
        walk::parse(SaveVersion::V15, STRING_WIDTH, bytes)
    }

    fn build(&self, header: &HeaderFields, blob: &[u8]) -> Result<Vec<u8>> {
        walk::build(SaveVersion::V15, STRING_WIDTH, header, blob)
    }
}
