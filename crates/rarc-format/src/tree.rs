//! In-memory directory arena
//!
//! Directories live in a flat `Vec` addressed by their pre-order index, with
//! the root at index 0. Parent and child links are plain indices into the
//! same arena, so the tree has no ownership cycles. Entries are kept in
//! archive order (subdirectories first, then files, each group collated)
//! and are not re-sorted by later stages.

use crate::collate::collate;
use crate::error::{RarcError, Result};
use std::path::PathBuf;

/// Index of the root directory
pub const ROOT_INDEX: usize = 0;

/// File contents captured at scan time
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileEntry {
    /// Name as stored in the archive
    pub name: String,
    /// Raw file bytes
    pub data: Vec<u8>,
    /// On-disk origin, when the file came from a directory scan
    pub source: Option<PathBuf>,
}

/// One entry inside a directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Entry {
    /// Reference to a child directory by arena index
    Dir {
        /// Name as stored in the archive
        name: String,
        /// Arena index of the child directory
        index: usize,
    },
    /// Regular file
    File(FileEntry),
}

impl Entry {
    /// Entry name
    pub fn name(&self) -> &str {
        match self {
            Self::Dir { name, .. } => name,
            Self::File(file) => &file.name,
        }
    }

    /// Whether this entry references a directory
    pub fn is_dir(&self) -> bool {
        matches!(self, Self::Dir { .. })
    }
}

/// A directory node in the arena
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Directory {
    /// Directory name (the root carries the archive's root name)
    pub name: String,
    /// Parent arena index, `None` for the root
    pub parent: Option<usize>,
    /// Entries in archive order
    pub entries: Vec<Entry>,
}

impl Directory {
    /// Number of node records this directory spans (entries plus `.` and `..`)
    pub fn node_count(&self) -> usize {
        self.entries.len() + 2
    }
}

/// Arena of directories in pre-order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectoryTree {
    directories: Vec<Directory>,
}

impl DirectoryTree {
    /// Create a tree holding only an empty root
    pub fn new(root_name: impl Into<String>) -> Self {
        Self {
            directories: vec![Directory {
                name: root_name.into(),
                parent: None,
                entries: Vec::new(),
            }],
        }
    }

    /// Append a subdirectory to `parent` and return its arena index
    ///
    /// Callers that want pre-order numbering must descend into the new
    /// directory before adding its next sibling, as [`TreeBuilder`] does.
    pub fn add_directory(&mut self, parent: usize, name: impl Into<String>) -> Result<usize> {
        let name = name.into();
        let index = self.directories.len();
        let parent_dir = self
            .directories
            .get_mut(parent)
            .ok_or(RarcError::InvalidDirectoryIndex(parent))?;
        parent_dir.entries.push(Entry::Dir {
            name: name.clone(),
            index,
        });
        self.directories.push(Directory {
            name,
            parent: Some(parent),
            entries: Vec::new(),
        });
        Ok(index)
    }

    /// Append a file to `parent`
    pub fn add_file(&mut self, parent: usize, file: FileEntry) -> Result<()> {
        self.directories
            .get_mut(parent)
            .ok_or(RarcError::InvalidDirectoryIndex(parent))?
            .entries
            .push(Entry::File(file));
        Ok(())
    }

    /// All directories in index order
    pub fn directories(&self) -> &[Directory] {
        &self.directories
    }

    /// Directory by arena index
    pub fn directory(&self, index: usize) -> Option<&Directory> {
        self.directories.get(index)
    }

    /// Root directory
    pub fn root(&self) -> &Directory {
        &self.directories[ROOT_INDEX]
    }

    /// Total node records across all directories
    pub fn node_count(&self) -> usize {
        self.directories.iter().map(Directory::node_count).sum()
    }

    /// Files in emission order (directory index order, then entry order)
    ///
    /// The position in this iterator is the file's archive-wide ordinal.
    pub fn files(&self) -> impl Iterator<Item = &FileEntry> {
        self.directories.iter().flat_map(|dir| {
            dir.entries.iter().filter_map(|entry| match entry {
                Entry::File(file) => Some(file),
                Entry::Dir { .. } => None,
            })
        })
    }

    /// Number of file entries
    pub fn file_count(&self) -> usize {
        self.files().count()
    }

    /// Every name that must be interned, in first-use order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.directories.iter().flat_map(|dir| {
            std::iter::once(dir.name.as_str()).chain(dir.entries.iter().map(Entry::name))
        })
    }

    /// Relative path of a directory from the root (empty for the root)
    pub fn path_of(&self, index: usize) -> Option<PathBuf> {
        let mut parts = Vec::new();
        let mut current = index;
        loop {
            let dir = self.directories.get(current)?;
            match dir.parent {
                Some(parent) => {
                    parts.push(dir.name.as_str());
                    current = parent;
                }
                None => break,
            }
        }
        Some(parts.iter().rev().collect())
    }
}

/// A directory listing waiting to be placed in the arena
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PendingDir {
    /// Directory name
    pub name: String,
    /// Child directories in any order
    pub subdirs: Vec<PendingDir>,
    /// Files in any order
    pub files: Vec<FileEntry>,
}

impl PendingDir {
    /// Create an empty listing
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            subdirs: Vec::new(),
            files: Vec::new(),
        }
    }

    /// Add a child directory
    #[must_use]
    pub fn with_dir(mut self, dir: PendingDir) -> Self {
        self.subdirs.push(dir);
        self
    }

    /// Add a file from memory
    #[must_use]
    pub fn with_file(mut self, name: impl Into<String>, data: impl Into<Vec<u8>>) -> Self {
        self.files.push(FileEntry {
            name: name.into(),
            data: data.into(),
            source: None,
        });
        self
    }
}

/// Places a nested listing into a [`DirectoryTree`] in archive order
///
/// Subdirectories come before files, both groups are collated, and every
/// subdirectory is numbered at the point its parent visits it.
#[derive(Debug, Default)]
pub struct TreeBuilder;

impl TreeBuilder {
    /// Build the arena from a root listing; the root keeps `root_name`
    pub fn build(root_name: impl Into<String>, root: PendingDir) -> Result<DirectoryTree> {
        let mut tree = DirectoryTree::new(root_name);
        Self::place(&mut tree, ROOT_INDEX, root)?;
        Ok(tree)
    }

    fn place(tree: &mut DirectoryTree, index: usize, mut listing: PendingDir) -> Result<()> {
        listing.subdirs.sort_by(|a, b| collate(&a.name, &b.name));
        listing.files.sort_by(|a, b| collate(&a.name, &b.name));

        for subdir in listing.subdirs {
            let child = tree.add_directory(index, subdir.name.clone())?;
            Self::place(tree, child, subdir)?;
        }
        for file in listing.files {
            tree.add_file(index, file)?;
        }
        Ok(())
    }
}
