use super::{HeaderFields, LayoutSchema, ParsedRecord, walk};
use crate::error::Result;
use crate::version::SaveVersion;

pub const STRING_WIDTH: usize = 64;

/// Current layout: a leading timestamp, and the Lua state runs to end of file
/// with no length prefix.
#[derive(Debug, Clone, Copy, Default)]
pub struct V16Schema;

impl LayoutSchema for V16Schema {
    fn version(&self) -> SaveVersion {
        SaveVersion::V16
    }

    fn string_width(&self) -> usize {
        STRING_WIDTH
    }

    fn parse<'a>(&self, bytes: &'a [u8]) -> Result<ParsedRecord<'a>> {
        walk::parse(SaveVersion::V16, STRING_WIDTH, bytes)
    }

    fn build(&self, header: &HeaderFields, blob: &[u8]) -> Result<Vec<u8>> {
        walk::build(SaveVersion::V16, STRING_WIDTH, header, blob)
    }
}
