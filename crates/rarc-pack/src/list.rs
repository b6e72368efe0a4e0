//! Human-readable archive listing for the `list` subcommand.

use crate::error::{InputError, Result};
use rarc_format::{Archive, RarcError};
use std::fmt::Write;
use std::fs;
use std::path::Path;

/// Read and parse an archive from disk
pub fn read_archive(path: &Path) -> Result<Archive> {
    let data = fs::read(path).map_err(|source| InputError::ReadFile {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(Archive::parse(&data)?)
}

/// Describe an archive's directory table and every file it contains
///
/// ```text
/// rels: 2 directories, 6 nodes, 1 file, 32 payload bytes
/// dir   0 ROOT rels (3 nodes)
/// dir   1 AMEM amem (3 nodes)
/// file     0 0x11        4 amem/foo.bin
/// ```
pub fn render_listing(archive: &Archive) -> std::result::Result<String, RarcError> {
    let root_name = archive
        .directories
        .first()
        .and_then(|root| archive.directory_name(root))
        .unwrap_or("?");
    let files = archive.files()?;

    let mut out = String::new();
    let _ = writeln!(
        out,
        "{root_name}: {} directories, {} nodes, {} file{}, {} payload bytes",
        archive.directories.len(),
        archive.nodes.len(),
        files.len(),
        if files.len() == 1 { "" } else { "s" },
        archive.header.data_size
    );
    for (index, record) in archive.directories.iter().enumerate() {
        let _ = writeln!(
            out,
            "dir {index:>3} {} {} ({} nodes)",
            record.tag_str(),
            archive.directory_name(record).unwrap_or("?"),
            record.node_count
        );
    }
    for file in &files {
        let _ = writeln!(
            out,
            "file {:>5} {:#04x} {:>8} {}",
            file.node.id,
            file.node.attributes,
            file.node.size,
            file.path.display()
        );
    }
    Ok(out)
}
