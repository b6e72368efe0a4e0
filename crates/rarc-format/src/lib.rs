//! RARC archive encoder and parser
//!
#![allow(clippy::cast_possible_truncation)] // Intentional for binary format fields
#![allow(clippy::cast_lossless)] // Sometimes clearer than From
#![allow(clippy::uninlined_format_args)] // Backwards compatibility
#![allow(clippy::doc_markdown)] // Format-specific terms don't need backticks
#![allow(clippy::module_name_repetitions)] // Clear naming is preferred
#![allow(clippy::return_self_not_must_use)] // Builder patterns
#![allow(clippy::use_self)] // Type clarity
//! This crate lays out the RARC container used by JSystem-based GameCube and
//! Wii titles, producing archives the original loader accepts unchanged.
//!
//! # Pipeline
//!
//! Each stage consumes the frozen output of the previous one:
//!
//! - **Tree**: directories in a pre-order arena, entries in archive order
//!   ([`TreeBuilder`], [`DirectoryTree`])
//! - **String table**: deduplicated names, `.` and `..` first
//!   ([`StringTableBuilder`])
//! - **Payload section**: per-file 32-byte aligned bytes ([`PayloadBuilder`])
//! - **Tables**: directory records and node spans ([`build_tables`])
//! - **Assembly**: header, info block and padded sections ([`Archive`])
//!
//! [`RarcBuilder`] runs the tables and assembly stages over a tree and a
//! finished payload section. Compressing payloads is left to the caller; see
//! the `rarc-pack` crate for the external codec integration.
//!
//! # Format Notes
//!
//! - All integers are big-endian
//! - Every section starts on a 32-byte boundary and the archive length is a
//!   multiple of 32
//! - Within each directory's node span, real entries precede `.` and `..`
//! - Names are hashed with a 16-bit `hash * 3 + c` fold ([`name_hash`])
//! - Siblings sort with `_` after all letters ([`collate`])

#![warn(missing_docs)]

pub mod archive;
pub mod builder;
pub mod collate;
pub mod directory;
pub mod error;
pub mod hash;
pub mod header;
pub mod node;
pub mod payload;
pub mod string_table;
pub mod tree;
pub mod utils;

pub use archive::{Archive, ArchiveFile, SectionLayout};
pub use builder::{
    ArchiveOptions, RarcBuilder, Tables, build_raw_payload, build_string_table, build_tables,
};
pub use collate::{collate, collation_key};
pub use directory::{DirectoryRecord, directory_tag};
pub use error::{RarcError, Result};
pub use hash::name_hash;
pub use header::{InfoBlock, RarcHeader};
pub use node::{FileEncoding, FileIdScheme, NodeRecord};
pub use payload::{PayloadBuilder, PayloadSection, PayloadSlot};
pub use string_table::{StringTable, StringTableBuilder};
pub use tree::{Directory, DirectoryTree, Entry, FileEntry, PendingDir, TreeBuilder};
