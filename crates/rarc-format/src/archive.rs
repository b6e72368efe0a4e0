//! Archive assembly and parsing
//!
//! Layout, every section starting on a 32-byte boundary:
//!
//! ```text
//! 0x00  header (0x20)
//! 0x20  info block (0x20)
//! 0x40  directory table        info-relative offset 0x20
//!       node table             aligned
//!       string table           aligned, padded
//!       payload section        aligned, padded
//! ```
//!
//! Assembly is a pure function of the finalized tables: the complete byte
//! buffer exists before anything is written anywhere.

use crate::builder::{ArchiveOptions, Tables};
use crate::directory::{DIRECTORY_RECORD_SIZE, DirectoryRecord};
use crate::error::{RarcError, Result};
use crate::header::{HEADER_SIZE, INFO_BLOCK_SIZE, InfoBlock, RarcHeader};
use crate::node::{FileIdScheme, NODE_RECORD_SIZE, NodeRecord};
use crate::payload::PayloadSection;
use crate::string_table::{DOT, DOT_DOT, StringTable};
use crate::tree::ROOT_INDEX;
use crate::utils::{ALIGNMENT, align_up};
use binrw::io::{Cursor, Seek, SeekFrom, Write};
use binrw::{BinRead, BinWrite};
use std::collections::HashSet;
use std::path::{Path, PathBuf};

/// Section offsets relative to the start of the info block
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SectionLayout {
    /// Directory table offset
    pub directory_offset: u32,
    /// Node table offset
    pub node_offset: u32,
    /// String table offset
    pub string_table_offset: u32,
    /// Payload section offset
    pub data_offset: u32,
    /// Total archive size including the header
    pub total_size: u32,
}

impl SectionLayout {
    /// Compute offsets for tables of the given sizes
    pub fn compute(
        directory_count: usize,
        node_count: usize,
        string_table_len: usize,
        payload_len: usize,
    ) -> Result<Self> {
        let directory_offset = INFO_BLOCK_SIZE as usize;
        let directory_end = directory_offset + directory_count * DIRECTORY_RECORD_SIZE;
        let node_offset = align_up(directory_end, ALIGNMENT);
        let node_end = node_offset + node_count * NODE_RECORD_SIZE;
        let string_table_offset = align_up(node_end, ALIGNMENT);
        let data_offset = align_up(string_table_offset + string_table_len, ALIGNMENT);
        let total_size = HEADER_SIZE as usize + data_offset + payload_len;

        let layout = Self {
            directory_offset: to_u32(directory_offset)?,
            node_offset: to_u32(node_offset)?,
            string_table_offset: to_u32(string_table_offset)?,
            data_offset: to_u32(data_offset)?,
            total_size: to_u32(total_size)?,
        };
        layout.check_alignment()?;
        Ok(layout)
    }

    fn check_alignment(&self) -> Result<()> {
        let base = u64::from(HEADER_SIZE);
        let sections = [
            ("directory table", base + u64::from(self.directory_offset)),
            ("node table", base + u64::from(self.node_offset)),
            ("string table", base + u64::from(self.string_table_offset)),
            ("payload section", base + u64::from(self.data_offset)),
            ("archive end", u64::from(self.total_size)),
        ];
        for (section, offset) in sections {
            if offset % ALIGNMENT as u64 != 0 {
                return Err(RarcError::Misaligned {
                    section,
                    offset,
                    alignment: ALIGNMENT as u64,
                });
            }
        }
        Ok(())
    }
}

fn to_u32(value: usize) -> Result<u32> {
    u32::try_from(value).map_err(|_| RarcError::PayloadTooLarge)
}

/// A complete archive: header, info block, tables and payload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Archive {
    /// Archive header
    pub header: RarcHeader,
    /// Info block
    pub info: InfoBlock,
    /// Directory table
    pub directories: Vec<DirectoryRecord>,
    /// Node table
    pub nodes: Vec<NodeRecord>,
    /// Padded string table
    pub strings: StringTable,
    /// Padded payload section
    pub payload: Vec<u8>,
}

/// A file read back out of an archive
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveFile<'a> {
    /// Path relative to the root directory
    pub path: PathBuf,
    /// The file's node record
    pub node: NodeRecord,
    /// Embedded bytes (compressed when the node says so)
    pub data: &'a [u8],
}

impl Archive {
    /// Fill in the header and info block around finalized tables
    pub fn assemble(
        tables: Tables,
        strings: StringTable,
        payload: PayloadSection,
        options: ArchiveOptions,
    ) -> Result<Self> {
        let layout = SectionLayout::compute(
            tables.directories.len(),
            tables.nodes.len(),
            strings.len(),
            payload.len(),
        )?;
        debug_assert_eq!(strings.len() % ALIGNMENT, 0);
        debug_assert_eq!(payload.len() % ALIGNMENT, 0);

        let data_size = to_u32(payload.len())?;
        let (mram_size, aram_size) = if options.encoding.is_compressed() {
            (0, data_size)
        } else {
            (data_size, 0)
        };
        let header = RarcHeader::new(
            layout.total_size,
            layout.data_offset,
            data_size,
            mram_size,
            aram_size,
        );

        let (next_file_id, sync_file_ids) = match options.id_scheme {
            FileIdScheme::FileOrdinal => (tables.file_count, false),
            FileIdScheme::NodeIndex => (tables.nodes.len(), true),
        };
        let next_file_id = u16::try_from(next_file_id).map_err(|_| RarcError::CountOverflow {
            what: "file id",
            count: next_file_id,
            limit: usize::from(u16::MAX),
        })?;

        let info = InfoBlock {
            directory_count: to_u32(tables.directories.len())?,
            directory_offset: layout.directory_offset,
            node_count: to_u32(tables.nodes.len())?,
            node_offset: layout.node_offset,
            string_table_size: to_u32(strings.len())?,
            string_table_offset: layout.string_table_offset,
            next_file_id,
            sync_file_ids,
        };

        Ok(Self {
            header,
            info,
            directories: tables.directories,
            nodes: tables.nodes,
            strings,
            payload: payload.as_bytes().to_vec(),
        })
    }

    /// Serialize the archive into one contiguous buffer
    pub fn build(&self) -> Result<Vec<u8>> {
        let mut cursor = Cursor::new(Vec::with_capacity(self.header.total_size as usize));

        self.header.write(&mut cursor)?;
        self.info.write(&mut cursor)?;

        pad_to(&mut cursor, InfoBlock::absolute(self.info.directory_offset))?;
        for record in &self.directories {
            record.write(&mut cursor)?;
        }

        pad_to(&mut cursor, InfoBlock::absolute(self.info.node_offset))?;
        for record in &self.nodes {
            record.write(&mut cursor)?;
        }

        pad_to(&mut cursor, InfoBlock::absolute(self.info.string_table_offset))?;
        cursor.write_all(self.strings.as_bytes())?;

        pad_to(&mut cursor, self.header.data_start())?;
        cursor.write_all(&self.payload)?;

        let bytes = cursor.into_inner();
        debug_assert_eq!(bytes.len(), self.header.total_size as usize);
        Ok(bytes)
    }

    /// Parse an archive, validating magic, sizes and table bounds
    pub fn parse(data: &[u8]) -> Result<Self> {
        let min = (HEADER_SIZE + INFO_BLOCK_SIZE) as usize;
        if data.len() < min {
            return Err(RarcError::TruncatedData {
                expected: min,
                actual: data.len(),
            });
        }

        let mut cursor = Cursor::new(data);
        let header = RarcHeader::read(&mut cursor)?;
        header.validate(data.len())?;
        cursor.seek(SeekFrom::Start(u64::from(HEADER_SIZE)))?;
        let info = InfoBlock::read(&mut cursor)?;

        let directory_start = InfoBlock::absolute(info.directory_offset);
        let directory_len = info.directory_count as usize * DIRECTORY_RECORD_SIZE;
        check_bounds(data, "directory table", directory_start, directory_len)?;
        cursor.seek(SeekFrom::Start(directory_start as u64))?;
        let directories = (0..info.directory_count)
            .map(|_| DirectoryRecord::read(&mut cursor))
            .collect::<binrw::BinResult<Vec<_>>>()?;

        let node_start = InfoBlock::absolute(info.node_offset);
        let node_len = info.node_count as usize * NODE_RECORD_SIZE;
        check_bounds(data, "node table", node_start, node_len)?;
        cursor.seek(SeekFrom::Start(node_start as u64))?;
        let nodes = (0..info.node_count)
            .map(|_| NodeRecord::read(&mut cursor))
            .collect::<binrw::BinResult<Vec<_>>>()?;

        let string_start = InfoBlock::absolute(info.string_table_offset);
        let string_len = info.string_table_size as usize;
        check_bounds(data, "string table", string_start, string_len)?;
        let strings = StringTable::from_bytes(data[string_start..string_start + string_len].to_vec());

        let data_start = header.data_start();
        let data_len = header.data_size as usize;
        check_bounds(data, "payload section", data_start, data_len)?;
        let payload = data[data_start..data_start + data_len].to_vec();

        Ok(Self {
            header,
            info,
            directories,
            nodes,
            strings,
            payload,
        })
    }

    /// Name of a node
    pub fn node_name(&self, node: &NodeRecord) -> Option<&str> {
        self.strings.name_at(u32::from(node.name_offset))
    }

    /// Name of a directory
    pub fn directory_name(&self, record: &DirectoryRecord) -> Option<&str> {
        self.strings.name_at(record.name_offset)
    }

    /// Nodes of a directory's span, sentinels included
    pub fn span(&self, record: &DirectoryRecord) -> Result<&[NodeRecord]> {
        let range = record.node_range();
        self.nodes.get(range.clone()).ok_or(RarcError::TableOutOfBounds {
            table: "node span",
            offset: range.start,
            size: range.len(),
        })
    }

    /// Every file reachable from the root, in node table order of traversal
    pub fn files(&self) -> Result<Vec<ArchiveFile<'_>>> {
        let mut files = Vec::new();
        let mut visited = HashSet::new();
        self.collect_files(ROOT_INDEX, Path::new(""), &mut visited, &mut files)?;
        Ok(files)
    }

    fn collect_files<'a>(
        &'a self,
        index: usize,
        prefix: &Path,
        visited: &mut HashSet<usize>,
        files: &mut Vec<ArchiveFile<'a>>,
    ) -> Result<()> {
        if !visited.insert(index) {
            return Ok(());
        }
        let record = self
            .directories
            .get(index)
            .ok_or(RarcError::InvalidDirectoryIndex(index))?;

        for node in self.span(record)? {
            let Some(name) = self.node_name(node) else {
                return Err(RarcError::NameNotInterned(format!(
                    "offset {:#x}",
                    node.name_offset
                )));
            };
            if name == DOT || name == DOT_DOT {
                continue;
            }
            let path = prefix.join(name);
            if node.is_directory() {
                self.collect_files(node.data as usize, &path, visited, files)?;
            } else {
                let start = node.data as usize;
                let len = node.size as usize;
                let data = self
                    .payload
                    .get(start..start + len)
                    .ok_or(RarcError::TableOutOfBounds {
                        table: "file payload",
                        offset: start,
                        size: len,
                    })?;
                files.push(ArchiveFile {
                    path,
                    node: *node,
                    data,
                });
            }
        }
        Ok(())
    }
}

fn pad_to(cursor: &mut Cursor<Vec<u8>>, target: usize) -> Result<()> {
    let position = cursor.stream_position()? as usize;
    if position > target {
        return Err(RarcError::Misaligned {
            section: "section start",
            offset: position as u64,
            alignment: ALIGNMENT as u64,
        });
    }
    cursor.write_all(&vec![0u8; target - position])?;
    Ok(())
}

fn check_bounds(data: &[u8], table: &'static str, offset: usize, size: usize) -> Result<()> {
    match offset.checked_add(size) {
        Some(end) if end <= data.len() => Ok(()),
        _ => Err(RarcError::TableOutOfBounds {
            table,
            offset,
            size,
        }),
    }
}
