//! Deduplicated name table
//!
//! Names are stored once each as NUL-terminated ASCII. `.` and `..` are
//! interned first so they occupy offsets 0 and 2, matching shipped archives.
//! [`StringTableBuilder::finish`] pads the blob to 32 bytes and consumes the
//! builder, so nothing can be interned into a finalized table.

use crate::error::{RarcError, Result};
use crate::utils::{ALIGNMENT, align_up};
use std::collections::HashMap;

/// Self-reference sentinel name
pub const DOT: &str = ".";
/// Parent-reference sentinel name
pub const DOT_DOT: &str = "..";

/// Accumulates names before the table is finalized
#[derive(Debug, Clone)]
pub struct StringTableBuilder {
    data: Vec<u8>,
    offsets: HashMap<String, u32>,
}

impl StringTableBuilder {
    /// Create a builder with the two sentinel names already interned
    pub fn new() -> Self {
        let mut builder = Self {
            data: Vec::new(),
            offsets: HashMap::new(),
        };
        builder.insert(DOT);
        builder.insert(DOT_DOT);
        builder
    }

    /// Intern a name, returning its byte offset
    ///
    /// A name seen before returns its existing offset.
    pub fn intern(&mut self, name: &str) -> Result<u32> {
        if let Some(&offset) = self.offsets.get(name) {
            return Ok(offset);
        }
        if !name.is_ascii() {
            return Err(RarcError::NonAsciiName(name.to_string()));
        }
        Ok(self.insert(name))
    }

    /// Intern every name from an iterator
    pub fn intern_all<'a>(&mut self, names: impl IntoIterator<Item = &'a str>) -> Result<()> {
        for name in names {
            self.intern(name)?;
        }
        Ok(())
    }

    fn insert(&mut self, name: &str) -> u32 {
        let offset = self.data.len() as u32;
        self.data.extend_from_slice(name.as_bytes());
        self.data.push(0);
        self.offsets.insert(name.to_string(), offset);
        offset
    }

    /// Unpadded length so far
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Whether nothing has been written, sentinels included
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Whether no name besides `.` and `..` has been interned
    pub fn has_only_sentinels(&self) -> bool {
        self.offsets.len() <= 2
    }

    /// Pad to the section alignment and freeze the table
    pub fn finish(mut self) -> StringTable {
        let padded = align_up(self.data.len(), ALIGNMENT);
        self.data.resize(padded, 0);
        StringTable {
            data: self.data,
            offsets: self.offsets,
        }
    }
}

impl Default for StringTableBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Finalized, padded name table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StringTable {
    data: Vec<u8>,
    offsets: HashMap<String, u32>,
}

impl StringTable {
    /// Wrap a table read from an archive
    pub fn from_bytes(data: Vec<u8>) -> Self {
        let mut offsets = HashMap::new();
        let mut start = 0usize;
        for (i, &byte) in data.iter().enumerate() {
            if byte == 0 {
                if i > start
                    && let Ok(name) = std::str::from_utf8(&data[start..i])
                {
                    offsets.entry(name.to_string()).or_insert(start as u32);
                }
                start = i + 1;
            }
        }
        Self { data, offsets }
    }

    /// Offset of an interned name
    pub fn offset(&self, name: &str) -> Result<u32> {
        self.offsets
            .get(name)
            .copied()
            .ok_or_else(|| RarcError::NameNotInterned(name.to_string()))
    }

    /// Offset of an interned name, checked against the 16-bit node field
    pub fn node_offset(&self, name: &str) -> Result<u16> {
        let offset = self.offset(name)?;
        u16::try_from(offset).map_err(|_| RarcError::StringOffsetOverflow {
            name: name.to_string(),
            offset,
        })
    }

    /// Name stored at `offset`, if the offset starts a NUL-terminated string
    pub fn name_at(&self, offset: u32) -> Option<&str> {
        let start = offset as usize;
        let tail = self.data.get(start..)?;
        let end = tail.iter().position(|&b| b == 0)?;
        std::str::from_utf8(&tail[..end]).ok()
    }

    /// Padded table bytes
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    /// Padded length
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Whether the table holds no bytes
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}
