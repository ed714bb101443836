use serde::Serialize;

use crate::error::{Result, SaveError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ByteRange {
    pub start: usize,
    pub end: usize,
}

impl ByteRange {
    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SectionId {
    Signature,
    Header,
    LuaKeys,
    MapNames,
    LuaState,
    Padding,
}

impl SectionId {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Signature => "signature",
            Self::Header => "header",
            Self::LuaKeys => "lua_keys",
            Self::MapNames => "map_names",
            Self::LuaState => "lua_state",
            Self::Padding => "padding",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SectionLayout {
    pub id: SectionId,
    pub range: ByteRange,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileLayout {
    pub file_len: usize,
    pub sections: Vec<SectionLayout>,
}

impl FileLayout {
    pub(crate) fn new(file_len: usize) -> Self {
        Self {
            file_len,
            sections: Vec::new(),
        }
    }

    pub(crate) fn record(&mut self, id: SectionId, start: usize, end: usize) {
        self.sections.push(SectionLayout {
            id,
            range: ByteRange { start, end },
        });
    }

    pub fn section(&self, id: SectionId) -> Option<&SectionLayout> {
        self.sections.iter().find(|s| s.id == id)
    }

    /// Check that the sections tile the file without gaps or overlaps.
    pub fn validate(&self) -> Result<()> {
        let Some(first) = self.sections.first() else {
            return Err(layout_error("file layout must contain at least one section"));
        };

        if first.range.start != 0 {
            return Err(layout_error("layout does not start at byte 0"));
        }

        let mut expected = 0usize;
        for section in &self.sections {
            if section.range.start != expected {
                return Err(layout_error(format!(
                    "layout gap/overlap around section {:?}: expected start {}, got {}",
                    section.id, expected, section.range.start
                )));
            }
            if section.range.end < section.range.start {
                return Err(layout_error(format!(
                    "invalid section range {:?}: {}..{}",
                    section.id, section.range.start, section.range.end
                )));
            }
            expected = section.range.end;
        }

        if expected != self.file_len {
            return Err(layout_error(format!(
                "layout does not cover file: ended at {}, file length {}",
                expected, self.file_len
            )));
        }

        Ok(())
    }
}

fn layout_error(reason: impl Into<String>) -> SaveError {
    SaveError::invalid_field("layout", reason)
}
