//! Node table records
//!
//! Every directory owns a contiguous span of nodes: one per entry in archive
//! order, then `.` (self) and `..` (parent). Loaders walk a span until they
//! reach the `.` record, so the sentinels must trail the real entries.

use crate::payload::PayloadSlot;
use binrw::{BinRead, BinWrite};

/// Node is a file
pub const ATTR_FILE: u8 = 0x01;
/// Node is a directory reference
pub const ATTR_DIRECTORY: u8 = 0x02;
/// File data is compressed
pub const ATTR_COMPRESSED: u8 = 0x04;
/// File is loaded into main memory
pub const ATTR_MRAM: u8 = 0x10;
/// File is loaded into auxiliary memory
pub const ATTR_ARAM: u8 = 0x20;
/// File is read from disc on demand
pub const ATTR_DVD: u8 = 0x40;
/// Compression scheme is Yaz0 (otherwise Yay0)
pub const ATTR_YAZ0: u8 = 0x80;

/// Identifier carried by directory and sentinel nodes
pub const DIRECTORY_NODE_ID: u16 = 0xFFFF;
/// Size field carried by directory and sentinel nodes
pub const DIRECTORY_NODE_SIZE: u32 = 0x10;
/// Parent reference of the root's `..` node
pub const NO_PARENT: u32 = 0xFFFF_FFFF;

/// Size of one node record in bytes
pub const NODE_RECORD_SIZE: usize = 20;

/// Payload encoding selected once for the whole archive
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FileEncoding {
    /// Yaz0-compressed and resident in auxiliary memory (`0xA5`)
    #[default]
    CompressedAram,
    /// Stored verbatim and resident in main memory (`0x11`)
    RawMram,
}

impl FileEncoding {
    /// Attribute byte written into file nodes
    pub const fn attributes(self) -> u8 {
        match self {
            Self::CompressedAram => ATTR_FILE | ATTR_COMPRESSED | ATTR_ARAM | ATTR_YAZ0,
            Self::RawMram => ATTR_FILE | ATTR_MRAM,
        }
    }

    /// Recognize a file node's attribute byte
    pub const fn from_attributes(attributes: u8) -> Option<Self> {
        match attributes {
            0xA5 => Some(Self::CompressedAram),
            0x11 => Some(Self::RawMram),
            _ => None,
        }
    }

    /// Whether payloads go through the external compressor
    pub const fn is_compressed(self) -> bool {
        matches!(self, Self::CompressedAram)
    }
}

/// How file node identifiers are assigned
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FileIdScheme {
    /// Position among all file nodes emitted so far
    #[default]
    FileOrdinal,
    /// Global node table index ("synced" ids)
    NodeIndex,
}

/// One node table record (20 bytes)
#[derive(Debug, Clone, Copy, PartialEq, Eq, BinRead, BinWrite)]
#[br(big)]
#[bw(big)]
pub struct NodeRecord {
    /// File identifier, or `0xFFFF` for directory nodes
    pub id: u16,
    /// Name hash
    pub name_hash: u16,
    /// Attribute bits
    #[brw(pad_after = 1)]
    pub attributes: u8,
    /// Name offset in the string table
    pub name_offset: u16,
    /// Payload offset for files, directory index for directory nodes
    pub data: u32,
    /// Payload length for files, `0x10` for directory nodes
    #[brw(pad_after = 4)]
    pub size: u32,
}

impl NodeRecord {
    /// Directory reference node (real subdirectory or sentinel)
    pub const fn directory(name_hash: u16, name_offset: u16, target: u32) -> Self {
        Self {
            id: DIRECTORY_NODE_ID,
            name_hash,
            attributes: ATTR_DIRECTORY,
            name_offset,
            data: target,
            size: DIRECTORY_NODE_SIZE,
        }
    }

    /// File node pointing at a payload slot
    pub const fn file(
        id: u16,
        name_hash: u16,
        encoding: FileEncoding,
        name_offset: u16,
        slot: PayloadSlot,
    ) -> Self {
        Self {
            id,
            name_hash,
            attributes: encoding.attributes(),
            name_offset,
            data: slot.offset,
            size: slot.length,
        }
    }

    /// Whether this node references a directory
    pub const fn is_directory(&self) -> bool {
        self.attributes & ATTR_DIRECTORY != 0
    }

    /// Whether this node describes a file
    pub const fn is_file(&self) -> bool {
        self.attributes & ATTR_FILE != 0
    }

    /// Encoding of a file node
    pub const fn encoding(&self) -> Option<FileEncoding> {
        FileEncoding::from_attributes(self.attributes)
    }
}
