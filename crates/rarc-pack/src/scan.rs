//! Input tree scanner
//!
//! Walks the input directory depth-first with subdirectories ahead of files
//! and both groups collated, which is exactly the order the archive stores
//! them in. Each subdirectory is appended to the arena as soon as the walk
//! reaches it, so directory indices come out in pre-order.

use crate::error::{InputError, Result};
use rarc_format::tree::ROOT_INDEX;
use rarc_format::{DirectoryTree, FileEntry, collate};
use std::cmp::Ordering;
use std::fs;
use std::path::Path;
use tracing::{debug, trace};
use walkdir::{DirEntry, WalkDir};

/// Scan `root` into a directory tree whose root is named `root_name`
///
/// File contents are read eagerly. The root directory's own name never
/// appears in the archive.
pub fn scan_directory(root: &Path, root_name: &str) -> Result<DirectoryTree> {
    match fs::metadata(root) {
        Ok(meta) if meta.is_dir() => {}
        Ok(_) => return Err(InputError::NotADirectory(root.to_path_buf()).into()),
        Err(_) => return Err(InputError::NotFound(root.to_path_buf()).into()),
    }

    let mut tree = DirectoryTree::new(root_name);
    // Arena index of the directory open at each depth; depth 0 is the root
    let mut open = vec![ROOT_INDEX];

    let walker = WalkDir::new(root)
        .min_depth(1)
        .follow_links(true)
        .sort_by(archive_order);

    for entry in walker {
        let entry = entry.map_err(|source| InputError::Walk {
            path: source
                .path()
                .map_or_else(|| root.to_path_buf(), Path::to_path_buf),
            source,
        })?;

        let name = entry_name(&entry)?;
        open.truncate(entry.depth());
        let parent = open[entry.depth() - 1];
        let file_type = entry.file_type();

        if file_type.is_dir() {
            let index = tree.add_directory(parent, name)?;
            trace!(index, path = %entry.path().display(), "directory");
            open.push(index);
        } else if file_type.is_file() {
            let data = fs::read(entry.path()).map_err(|source| InputError::ReadFile {
                path: entry.path().to_path_buf(),
                source,
            })?;
            trace!(size = data.len(), path = %entry.path().display(), "file");
            tree.add_file(
                parent,
                FileEntry {
                    name,
                    data,
                    source: Some(entry.path().to_path_buf()),
                },
            )?;
        } else {
            debug!(path = %entry.path().display(), "skipping special file");
        }
    }

    debug!(
        directories = tree.directories().len(),
        files = tree.file_count(),
        "scanned {}",
        root.display()
    );
    Ok(tree)
}

fn entry_name(entry: &DirEntry) -> std::result::Result<String, InputError> {
    let name = entry
        .file_name()
        .to_str()
        .ok_or_else(|| InputError::NonUtf8Name(entry.path().to_path_buf()))?;
    if !name.is_ascii() {
        return Err(InputError::NonAsciiName(entry.path().to_path_buf()));
    }
    Ok(name.to_owned())
}

// Sorting sees unfollowed file types, so links are resolved here to keep
// linked directories with the other subdirectories
fn archive_order(a: &DirEntry, b: &DirEntry) -> Ordering {
    let a_dir = a.path().is_dir();
    let b_dir = b.path().is_dir();
    b_dir
        .cmp(&a_dir)
        .then_with(|| collate(&a.file_name().to_string_lossy(), &b.file_name().to_string_lossy()))
}
