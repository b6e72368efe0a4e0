//! Directory table records

use binrw::{BinRead, BinWrite};

/// Type tag carried by the root directory record
pub const ROOT_TAG: [u8; 4] = *b"ROOT";

/// Size of one directory record in bytes
pub const DIRECTORY_RECORD_SIZE: usize = 16;

/// One directory table record (16 bytes)
#[derive(Debug, Clone, Copy, PartialEq, Eq, BinRead, BinWrite)]
#[br(big)]
#[bw(big)]
pub struct DirectoryRecord {
    /// Type tag: `ROOT`, or the first four characters of the name upper-cased
    pub tag: [u8; 4],
    /// Name offset in the string table
    pub name_offset: u32,
    /// Name hash
    pub name_hash: u16,
    /// Nodes in this directory's span (entries plus `.` and `..`)
    pub node_count: u16,
    /// Index of the span's first node in the node table
    pub first_node: u32,
}

impl DirectoryRecord {
    /// Type tag as text
    pub fn tag_str(&self) -> String {
        String::from_utf8_lossy(&self.tag).into_owned()
    }

    /// Node table index range covered by this directory
    pub fn node_range(&self) -> std::ops::Range<usize> {
        let start = self.first_node as usize;
        start..start + usize::from(self.node_count)
    }
}

/// Derive a non-root directory's tag: upper-cased, cut to four bytes, space padded
pub fn directory_tag(name: &str) -> [u8; 4] {
    let mut tag = [b' '; 4];
    for (slot, byte) in tag.iter_mut().zip(name.bytes()) {
        *slot = byte.to_ascii_uppercase();
    }
    tag
}
