use super::{HeaderFields, LayoutSchema, ParsedRecord, walk};
use crate::error::Result;
use crate::version::SaveVersion;

pub const STRING_WIDTH: usize = 32;

/// Oldest layout: short string buffers, no shrine points, no hell mode flag.
#[derive(Debug, Clone, Copy, Default)]
pub struct V14Schema;

impl LayoutSchema for V14Schema {
    fn version(&self) -> SaveVersion {
        SaveVersion::V14
    }

    fn string_width(&self) -> usize {
        STRING_WIDTH
    }

    fn parse<'a>(&self, bytes: &'a [u8]) -> Result<ParsedRecord<'a>> {
        walk::parse(SaveVersion::V14, STRING_WIDTH, bytes)
    }

    fn build(&self, header: &HeaderFields, blob: &[u8]) -> Result<Vec<u8>> {
        walk::build(SaveVersion::V14, STRING_WIDTH, header, blob)
    }
}
