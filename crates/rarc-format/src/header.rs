//! Archive header and info block
//!
//! Both blocks are 0x20 bytes and big-endian. Offsets in the header are
//! relative to the end of the header; offsets in the info block are relative
//! to the start of the info block.

use crate::error::{RarcError, Result};
use binrw::{BinRead, BinWrite};

/// Archive magic
pub const RARC_MAGIC: [u8; 4] = *b"RARC";
/// Size of the archive header
pub const HEADER_SIZE: u32 = 0x20;
/// Size of the info block
pub const INFO_BLOCK_SIZE: u32 = 0x20;

/// Archive header (32 bytes)
#[derive(Debug, Clone, Copy, PartialEq, Eq, BinRead, BinWrite)]
#[br(big)]
#[bw(big)]
pub struct RarcHeader {
    /// Magic bytes: "RARC"
    pub magic: [u8; 4],
    /// Total archive size
    pub total_size: u32,
    /// Header size (0x20)
    pub header_size: u32,
    /// Payload section offset, relative to the end of the header
    pub data_offset: u32,
    /// Payload section size
    pub data_size: u32,
    /// Bytes of payload that load into main memory
    pub mram_size: u32,
    /// Bytes of payload that load into auxiliary memory
    pub aram_size: u32,
    /// Bytes of payload read from disc on demand
    pub dvd_size: u32,
}

impl RarcHeader {
    /// Create a header with sizes filled in by the assembler
    pub const fn new(
        total_size: u32,
        data_offset: u32,
        data_size: u32,
        mram_size: u32,
        aram_size: u32,
    ) -> Self {
        Self {
            magic: RARC_MAGIC,
            total_size,
            header_size: HEADER_SIZE,
            data_offset,
            data_size,
            mram_size,
            aram_size,
            dvd_size: 0,
        }
    }

    /// Absolute offset of the payload section
    pub const fn data_start(&self) -> usize {
        self.header_size as usize + self.data_offset as usize
    }

    /// Validate header fields against the archive length
    pub fn validate(&self, archive_len: usize) -> Result<()> {
        if self.magic != RARC_MAGIC {
            return Err(RarcError::InvalidMagic(self.magic));
        }
        if (self.total_size as usize) > archive_len {
            return Err(RarcError::TruncatedData {
                expected: self.total_size as usize,
                actual: archive_len,
            });
        }
        Ok(())
    }
}

/// Info block (32 bytes) describing the three tables
#[derive(Debug, Clone, Copy, PartialEq, Eq, BinRead, BinWrite)]
#[br(big)]
#[bw(big)]
pub struct InfoBlock {
    /// Number of directory records
    pub directory_count: u32,
    /// Directory table offset
    pub directory_offset: u32,
    /// Number of node records
    pub node_count: u32,
    /// Node table offset
    pub node_offset: u32,
    /// Padded string table size
    pub string_table_size: u32,
    /// String table offset
    pub string_table_offset: u32,
    /// Next free file identifier
    pub next_file_id: u16,
    /// File ids equal node indices
    #[br(map = |x: u8| x != 0)]
    #[bw(map = |x: &bool| u8::from(*x))]
    #[brw(pad_after = 5)]
    pub sync_file_ids: bool,
}

impl InfoBlock {
    /// Absolute offset of a table given its info-block-relative offset
    pub const fn absolute(relative: u32) -> usize {
        (HEADER_SIZE + relative) as usize
    }
}
