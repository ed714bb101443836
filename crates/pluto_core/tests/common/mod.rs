#![allow(dead_code)]

//! Synthetic save files written field by field, without going through the
//! library's own builders.

pub const V14_FILE_LEN: usize = 3_145_728;
pub const V15_FILE_LEN: usize = 9_437_184;

pub struct Synthetic {
    pub version: u32,
    pub timestamp: u64,
    pub location: &'static str,
    pub runs: u32,
    pub meta_points: u32,
    pub shrine_points: u32,
    pub god_mode: bool,
    pub hell_mode: bool,
    pub lua_keys: Vec<(&'static str, &'static str)>,
    pub current_map: &'static str,
    pub next_map: &'static str,
    pub blob: Vec<u8>,
}

impl Synthetic {
    pub fn new(version: u32, blob: Vec<u8>) -> Self {
        Self {
            version,
            timestamp: 1_700_000_000,
            location: "Tartarus",
            runs: 3,
            meta_points: 12,
            shrine_points: 4,
            god_mode: true,
            hell_mode: false,
            lua_keys: vec![("LastSave", "RoomOpening"), ("Profile", "1")],
            current_map: "RoomOpening",
            next_map: "A_Intro",
            blob,
        }
    }

    fn width(&self) -> usize {
        if self.version == 14 { 32 } else { 64 }
    }

    /// Bytes up to and including the blob, without padding.
    pub fn content(&self) -> Vec<u8> {
        let mut out = Vec::new();
        out.extend_from_slice(b"SGB1");
        out.extend_from_slice(&self.version.to_le_bytes());
        if self.version == 16 {
            out.extend_from_slice(&self.timestamp.to_le_bytes());
        }
        fixed(&mut out, self.location, self.width());
        out.extend_from_slice(&self.runs.to_le_bytes());
        out.extend_from_slice(&self.meta_points.to_le_bytes());
        if self.version >= 15 {
            out.extend_from_slice(&self.shrine_points.to_le_bytes());
        }
        out.push(self.god_mode as u8);
        if self.version >= 15 {
            out.push(self.hell_mode as u8);
        }
        out.extend_from_slice(&(self.lua_keys.len() as u32).to_le_bytes());
        for (k, v) in &self.lua_keys {
            prefixed(&mut out, k.as_bytes());
            prefixed(&mut out, v.as_bytes());
        }
        fixed(&mut out, self.current_map, self.width());
        fixed(&mut out, self.next_map, self.width());
        if self.version == 16 {
            out.extend_from_slice(&self.blob);
        } else {
            prefixed(&mut out, &self.blob);
        }
        out
    }

    /// The complete file, padded for the versions that require it.
    pub fn file(&self) -> Vec<u8> {
        let mut out = self.content();
        match self.version {
            14 => out.resize(V14_FILE_LEN, 0),
            15 => out.resize(V15_FILE_LEN, 0),
            _ => {}
        }
        out
    }
}

fn fixed(out: &mut Vec<u8>, value: &str, width: usize) {
    assert!(value.len() <= width);
    out.extend_from_slice(value.as_bytes());
    out.resize(out.len() + width - value.len(), 0);
}

fn prefixed(out: &mut Vec<u8>, bytes: &[u8]) {
    out.extend_from_slice(&(bytes.len() as u32).to_le_bytes());
    out.extend_from_slice(bytes);
}

/// Encoded Lua helpers, one tag at a time.
pub mod lua {
    pub fn string(s: &str) -> Vec<u8> {
        let mut out = vec![b'S'];
        out.extend_from_slice(&(s.len() as u32).to_le_bytes());
        out.extend_from_slice(s.as_bytes());
        out
    }

    pub fn number(n: f64) -> Vec<u8> {
        let mut out = vec![b'N'];
        out.extend_from_slice(&n.to_le_bytes());
        out
    }

    pub fn boolean(b: bool) -> Vec<u8> {
        vec![if b { b'1' } else { b'0' }]
    }

    pub fn table(entries: &[(Vec<u8>, Vec<u8>)]) -> Vec<u8> {
        let mut out = vec![b'T'];
        for (k, v) in entries {
            out.extend_from_slice(k);
            out.extend_from_slice(v);
        }
        out.push(b'E');
        out
    }

    /// `{ darkness = <value> }`
    pub fn darkness(value: f64) -> Vec<u8> {
        table(&[(string("darkness"), number(value))])
    }
}
