//! Directory and node table construction
//!
//! Runs after the string table and payload section are finalized. Emits one
//! directory record per arena directory in index order, and for each
//! directory its entry nodes followed by the `.` and `..` sentinels.

use crate::archive::Archive;
use crate::directory::{DirectoryRecord, ROOT_TAG, directory_tag};
use crate::error::{RarcError, Result};
use crate::hash::name_hash;
use crate::node::{FileEncoding, FileIdScheme, NO_PARENT, NodeRecord};
use crate::payload::{PayloadBuilder, PayloadSection};
use crate::string_table::{DOT, DOT_DOT, StringTable, StringTableBuilder};
use crate::tree::{DirectoryTree, Entry, ROOT_INDEX};
use tracing::debug;

/// Largest file id; `0xFFFF` is reserved for directory nodes
const MAX_FILE_ID: usize = 0xFFFE;

/// Archive-wide choices made once per pack
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ArchiveOptions {
    /// Encoding recorded in every file node
    pub encoding: FileEncoding,
    /// File id assignment
    pub id_scheme: FileIdScheme,
}

/// Directory and node tables for one archive
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tables {
    /// Directory records in arena order
    pub directories: Vec<DirectoryRecord>,
    /// Node records, one span per directory
    pub nodes: Vec<NodeRecord>,
    /// Number of file nodes
    pub file_count: usize,
}

/// Running counters for one table build
#[derive(Debug, Default)]
struct Counters {
    next_node: usize,
    next_file: usize,
}

/// Build both tables from a finalized tree, string table and payload section
pub fn build_tables(
    tree: &DirectoryTree,
    strings: &StringTable,
    payload: &PayloadSection,
    options: ArchiveOptions,
) -> Result<Tables> {
    let mut directories = Vec::with_capacity(tree.directories().len());
    let mut nodes = Vec::with_capacity(tree.node_count());
    let mut counters = Counters::default();

    let dot = NodeName::new(strings, DOT)?;
    let dot_dot = NodeName::new(strings, DOT_DOT)?;

    for (index, dir) in tree.directories().iter().enumerate() {
        let span = dir.node_count();
        let node_count = u16::try_from(span).map_err(|_| RarcError::CountOverflow {
            what: "directory node",
            count: span,
            limit: usize::from(u16::MAX),
        })?;
        debug_assert_eq!(counters.next_node, nodes.len());

        directories.push(DirectoryRecord {
            tag: if index == ROOT_INDEX {
                ROOT_TAG
            } else {
                directory_tag(&dir.name)
            },
            name_offset: strings.offset(&dir.name)?,
            name_hash: name_hash(&dir.name),
            node_count,
            first_node: counters.next_node as u32,
        });

        for entry in &dir.entries {
            let name = NodeName::new(strings, entry.name())?;
            let node = match entry {
                Entry::Dir { index: child, .. } => {
                    if tree.directory(*child).is_none() {
                        return Err(RarcError::InvalidDirectoryIndex(*child));
                    }
                    NodeRecord::directory(name.hash, name.offset, *child as u32)
                }
                Entry::File(_) => {
                    let slot = payload.slot(counters.next_file)?;
                    let id = match options.id_scheme {
                        FileIdScheme::FileOrdinal => counters.next_file,
                        FileIdScheme::NodeIndex => counters.next_node,
                    };
                    let id = file_id(id)?;
                    counters.next_file += 1;
                    NodeRecord::file(id, name.hash, options.encoding, name.offset, slot)
                }
            };
            nodes.push(node);
            counters.next_node += 1;
        }

        let parent = dir.parent.map_or(NO_PARENT, |p| p as u32);
        nodes.push(NodeRecord::directory(dot.hash, dot.offset, index as u32));
        nodes.push(NodeRecord::directory(dot_dot.hash, dot_dot.offset, parent));
        counters.next_node += 2;
    }

    if counters.next_file != payload.slots().len() {
        return Err(RarcError::MissingPayload(counters.next_file));
    }

    debug!(
        "Built tables: {} directories, {} nodes, {} files",
        directories.len(),
        nodes.len(),
        counters.next_file
    );

    Ok(Tables {
        directories,
        nodes,
        file_count: counters.next_file,
    })
}

fn file_id(value: usize) -> Result<u16> {
    if value > MAX_FILE_ID {
        return Err(RarcError::CountOverflow {
            what: "file id",
            count: value,
            limit: MAX_FILE_ID,
        });
    }
    Ok(value as u16)
}

/// Name fields shared by every node that carries a given name
struct NodeName {
    hash: u16,
    offset: u16,
}

impl NodeName {
    fn new(strings: &StringTable, name: &str) -> Result<Self> {
        Ok(Self {
            hash: name_hash(name),
            offset: strings.node_offset(name)?,
        })
    }
}

/// Intern every name in the tree, sentinels first, and finalize the table
pub fn build_string_table(tree: &DirectoryTree) -> Result<StringTable> {
    let mut builder = StringTableBuilder::new();
    builder.intern_all(tree.names())?;
    Ok(builder.finish())
}

/// Embed every file verbatim in emission order
pub fn build_raw_payload(tree: &DirectoryTree) -> Result<PayloadSection> {
    let mut builder = PayloadBuilder::new();
    for file in tree.files() {
        builder.push(&file.data)?;
    }
    builder.finish()
}

/// Runs the pure stages of the encoder over a scanned tree
///
/// # Example
///
/// ```
/// use rarc_format::{Archive, PendingDir, RarcBuilder, TreeBuilder};
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let root = PendingDir::new("input")
///     .with_dir(PendingDir::new("amem").with_file("foo.bin", vec![1, 2, 3, 4]));
/// let tree = TreeBuilder::build("rels", root)?;
///
/// let archive = RarcBuilder::new().build_raw(&tree)?;
/// assert_eq!(archive.info.directory_count, 2);
/// assert_eq!(archive.info.node_count, 6);
///
/// let bytes = archive.build()?;
/// assert_eq!(bytes.len() % 32, 0);
/// assert_eq!(Archive::parse(&bytes)?, archive);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct RarcBuilder {
    options: ArchiveOptions,
}

impl RarcBuilder {
    /// Create a builder with the default options (compressed encoding, ordinal ids)
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the file encoding
    #[must_use]
    pub fn encoding(mut self, encoding: FileEncoding) -> Self {
        self.options.encoding = encoding;
        self
    }

    /// Set the file id scheme
    #[must_use]
    pub fn id_scheme(mut self, id_scheme: FileIdScheme) -> Self {
        self.options.id_scheme = id_scheme;
        self
    }

    /// Lay out an archive around an already-encoded payload section
    pub fn build(&self, tree: &DirectoryTree, payload: PayloadSection) -> Result<Archive> {
        let strings = build_string_table(tree)?;
        let tables = build_tables(tree, &strings, &payload, self.options)?;
        Archive::assemble(tables, strings, payload, self.options)
    }

    /// Lay out an archive with every file stored verbatim
    pub fn build_raw(&self, tree: &DirectoryTree) -> Result<Archive> {
        let payload = build_raw_payload(tree)?;
        self.encoding(FileEncoding::RawMram).build(tree, payload)
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::node::DIRECTORY_NODE_ID;
    use crate::tree::{PendingDir, TreeBuilder};
    use pretty_assertions::assert_eq;

    fn amem_tree() -> DirectoryTree {
        let root = PendingDir::new("in")
            .with_dir(PendingDir::new("amem").with_file("foo.bin", vec![0xDE, 0xAD, 0xBE, 0xEF]));
        TreeBuilder::build("rels", root).unwrap()
    }

    fn tables_for(tree: &DirectoryTree, options: ArchiveOptions) -> Tables {
        let strings = build_string_table(tree).unwrap();
        let payload = build_raw_payload(tree).unwrap();
        build_tables(tree, &strings, &payload, options).unwrap()
    }

    #[test]
    fn test_single_subdirectory_layout() {
        let tree = amem_tree();
        let tables = tables_for(&tree, ArchiveOptions::default());

        assert_eq!(tables.directories.len(), 2);
        assert_eq!(tables.nodes.len(), 6);
        assert_eq!(tables.file_count, 1);

        let root = tables.directories[0];
        assert_eq!(&root.tag, b"ROOT");
        assert_eq!(root.node_count, 3);
        assert_eq!(root.first_node, 0);
        assert_eq!(root.name_hash, name_hash("rels"));

        let amem = tables.directories[1];
        assert_eq!(&amem.tag, b"AMEM");
        assert_eq!(amem.node_count, 3);
        assert_eq!(amem.first_node, 3);

        // Root span: amem, ".", ".."
        assert_eq!(tables.nodes[0].data, 1);
        assert!(tables.nodes[0].is_directory());
        assert_eq!(tables.nodes[1].data, 0);
        assert_eq!(tables.nodes[2].data, NO_PARENT);

        // amem span: foo.bin, ".", ".."
        let foo = tables.nodes[3];
        assert!(foo.is_file());
        assert_eq!(foo.id, 0);
        assert_eq!(foo.size, 4);
        assert_eq!(foo.data, 0);
        assert_eq!(tables.nodes[4].data, 1);
        assert_eq!(tables.nodes[5].data, 0);
    }

    #[test]
    fn test_sentinels_trail_real_entries() {
        let root = PendingDir::new("in")
            .with_file("b.bin", vec![1])
            .with_file("a.bin", vec![2])
            .with_dir(PendingDir::new("sub").with_file("c.bin", vec![3]));
        let tree = TreeBuilder::build("root", root).unwrap();
        let strings = build_string_table(&tree).unwrap();
        let tables = tables_for(&tree, ArchiveOptions::default());

        let dot = strings.node_offset(".").unwrap();
        let dot_dot = strings.node_offset("..").unwrap();
        for dir in &tables.directories {
            let span = &tables.nodes[dir.node_range()];
            let (real, sentinels) = span.split_at(span.len() - 2);
            assert!(real.iter().all(|n| n.name_offset != dot && n.name_offset != dot_dot));
            assert_eq!(sentinels[0].name_offset, dot);
            assert_eq!(sentinels[1].name_offset, dot_dot);
        }
    }

    #[test]
    fn test_file_ids_are_archive_wide_ordinals() {
        let root = PendingDir::new("in")
            .with_dir(
                PendingDir::new("amem")
                    .with_file("x.rel", vec![1])
                    .with_file("y.rel", vec![2]),
            )
            .with_dir(PendingDir::new("mmem").with_file("z.rel", vec![3]))
            .with_file("top.bin", vec![4]);
        let tree = TreeBuilder::build("rels", root).unwrap();
        let tables = tables_for(&tree, ArchiveOptions::default());

        let ids: Vec<u16> = tables
            .nodes
            .iter()
            .filter(|n| n.is_file())
            .map(|n| n.id)
            .collect();
        assert_eq!(ids, vec![0, 1, 2, 3]);
        assert!(
            tables
                .nodes
                .iter()
                .filter(|n| n.is_directory())
                .all(|n| n.id == DIRECTORY_NODE_ID)
        );
    }

    #[test]
    fn test_node_index_scheme() {
        let tree = amem_tree();
        let options = ArchiveOptions {
            id_scheme: FileIdScheme::NodeIndex,
            ..ArchiveOptions::default()
        };
        let tables = tables_for(&tree, options);
        // foo.bin sits after root's three nodes
        assert_eq!(tables.nodes[3].id, 3);
    }

    #[test]
    fn test_encoding_applied_to_every_file() {
        let tree = amem_tree();
        for encoding in [FileEncoding::CompressedAram, FileEncoding::RawMram] {
            let options = ArchiveOptions {
                encoding,
                ..ArchiveOptions::default()
            };
            let tables = tables_for(&tree, options);
            for node in tables.nodes.iter().filter(|n| n.is_file()) {
                assert_eq!(node.encoding(), Some(encoding));
            }
        }
    }

    #[test]
    fn test_missing_payload_rejected() {
        let tree = amem_tree();
        let strings = build_string_table(&tree).unwrap();
        let empty = PayloadBuilder::new().finish().unwrap();
        assert!(matches!(
            build_tables(&tree, &strings, &empty, ArchiveOptions::default()),
            Err(RarcError::MissingPayload(0))
        ));
    }

    #[test]
    fn test_shared_names_share_offsets() {
        let root = PendingDir::new("in")
            .with_dir(PendingDir::new("a").with_file("same.rel", vec![1]))
            .with_dir(PendingDir::new("b").with_file("same.rel", vec![2]));
        let tree = TreeBuilder::build("root", root).unwrap();
        let tables = tables_for(&tree, ArchiveOptions::default());
        let offsets: Vec<u16> = tables
            .nodes
            .iter()
            .filter(|n| n.is_file())
            .map(|n| n.name_offset)
            .collect();
        assert_eq!(offsets[0], offsets[1]);
    }
}
