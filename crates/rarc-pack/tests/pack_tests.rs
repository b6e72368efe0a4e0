#![allow(clippy::expect_used, clippy::unwrap_used, clippy::panic)]
//! Integration tests for end-to-end packing
//!
//! Each test builds an input tree in a temporary directory, packs it with an
//! in-process codec standing in for decomp-toolkit, and reads the archive
//! back with the format crate's parser.

use pretty_assertions::assert_eq;
use proptest::prelude::*;
use rarc_format::{Archive, FileEncoding, FileIdScheme};
use rarc_pack::{Codec, CodecError, InputError, PackConfig, PackError, PackWarning, pack};
use std::cell::Cell;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use walkdir::WalkDir;

/// Stands in for Yaz0: magic, big-endian length, then the input verbatim
struct FakeYaz0;

impl Codec for FakeYaz0 {
    fn name(&self) -> &str {
        "fake-yaz0"
    }

    fn probe(&self) -> Result<(), CodecError> {
        Ok(())
    }

    fn compress(&self, input: &Path, output: &Path) -> Result<(), CodecError> {
        let data = fs::read(input)?;
        let mut out = b"Yaz0".to_vec();
        out.extend_from_slice(&(data.len() as u32).to_be_bytes());
        out.extend_from_slice(&[0; 8]);
        out.extend_from_slice(&data);
        fs::write(output, out)?;
        Ok(())
    }
}

/// Compressor that is not installed
struct Missing;

impl Codec for Missing {
    fn name(&self) -> &str {
        "missing"
    }

    fn probe(&self) -> Result<(), CodecError> {
        Err(CodecError::NotFound("`dtk` not on PATH".to_owned()))
    }

    fn compress(&self, _input: &Path, _output: &Path) -> Result<(), CodecError> {
        panic!("compress called after a failed probe");
    }
}

/// Compressor that hangs on one particular file
struct TimesOutOn {
    name: &'static str,
    calls: Cell<usize>,
}

impl TimesOutOn {
    fn new(name: &'static str) -> Self {
        Self {
            name,
            calls: Cell::new(0),
        }
    }
}

impl Codec for TimesOutOn {
    fn name(&self) -> &str {
        "times-out"
    }

    fn probe(&self) -> Result<(), CodecError> {
        Ok(())
    }

    fn compress(&self, input: &Path, output: &Path) -> Result<(), CodecError> {
        self.calls.set(self.calls.get() + 1);
        if input.file_name().and_then(|n| n.to_str()) == Some(self.name) {
            return Err(CodecError::Timeout {
                program: PathBuf::from("dtk"),
                timeout: std::time::Duration::from_secs(60),
            });
        }
        FakeYaz0.compress(input, output)
    }
}

fn write_file(root: &Path, rel: &str, data: &[u8]) {
    let path = root.join(rel);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, data).unwrap();
}

fn parse_output(path: &Path) -> Archive {
    let bytes = fs::read(path).unwrap();
    assert_eq!(bytes.len() % 32, 0, "archive length must be 32-byte aligned");
    Archive::parse(&bytes).unwrap()
}

/// Relative path to contents for every regular file under `root`
fn disk_files(root: &Path) -> BTreeMap<PathBuf, Vec<u8>> {
    WalkDir::new(root)
        .into_iter()
        .map(Result::unwrap)
        .filter(|e| e.file_type().is_file())
        .map(|e| {
            let rel = e.path().strip_prefix(root).unwrap().to_path_buf();
            (rel, fs::read(e.path()).unwrap())
        })
        .collect()
}

fn archive_files(archive: &Archive) -> BTreeMap<PathBuf, Vec<u8>> {
    archive
        .files()
        .unwrap()
        .into_iter()
        .map(|f| (f.path, f.data.to_vec()))
        .collect()
}

// --- Single file in a subdirectory ---

#[test]
fn pack_single_subdirectory_compressed() {
    let work = TempDir::new().unwrap();
    let input = work.path().join("in");
    write_file(&input, "amem/foo.bin", &[0xDE, 0xAD, 0xBE, 0xEF]);
    let output = work.path().join("out/RELS.arc");

    let report = pack(&PackConfig::new(&input, &output), &FakeYaz0).unwrap();
    assert!(report.compressed());
    assert!(report.warnings.is_empty());
    assert_eq!(report.directory_count, 2);
    assert_eq!(report.node_count, 6);
    assert_eq!(report.file_count, 1);

    let archive = parse_output(&output);
    assert_eq!(archive.info.directory_count, 2);
    assert_eq!(archive.info.node_count, 6);
    assert_eq!(archive.directories[0].tag_str(), "ROOT");
    assert_eq!(archive.directory_name(&archive.directories[0]), Some("rels"));
    assert_eq!(archive.directories[1].tag_str(), "AMEM");

    let files = archive.files().unwrap();
    assert_eq!(files.len(), 1);
    assert_eq!(files[0].path, PathBuf::from("amem/foo.bin"));
    assert_eq!(files[0].node.id, 0);
    assert_eq!(files[0].node.attributes, 0xA5);
    assert_eq!(&files[0].data[..4], b"Yaz0");

    assert!(archive.header.data_size >= 32);
    assert_eq!(archive.header.aram_size, archive.header.data_size);
    assert_eq!(archive.header.mram_size, 0);
    assert_eq!(archive.info.next_file_id, 1);
    assert!(!archive.info.sync_file_ids);
}

#[test]
fn pack_without_compression() {
    let work = TempDir::new().unwrap();
    let input = work.path().join("in");
    write_file(&input, "amem/foo.bin", &[1, 2, 3]);
    let output = work.path().join("rels.arc");

    let mut config = PackConfig::new(&input, &output);
    config.compress = false;
    let report = pack(&config, &Missing).unwrap();
    assert_eq!(report.encoding, FileEncoding::RawMram);
    assert!(report.warnings.is_empty());

    let archive = parse_output(&output);
    let files = archive.files().unwrap();
    assert_eq!(files[0].node.attributes, 0x11);
    assert_eq!(files[0].data, &[1, 2, 3]);
    assert_eq!(archive.header.mram_size, archive.header.data_size);
    assert_eq!(archive.header.aram_size, 0);
}

// --- Codec failures ---

#[test]
fn pack_falls_back_when_codec_missing() {
    let work = TempDir::new().unwrap();
    let input = work.path().join("in");
    write_file(&input, "a.bin", b"alpha");
    write_file(&input, "sub/b.bin", b"beta");
    let output = work.path().join("rels.arc");

    let report = pack(&PackConfig::new(&input, &output), &Missing).unwrap();
    assert!(!report.compressed());
    assert!(matches!(
        report.warnings.as_slice(),
        [PackWarning::CodecUnavailable { .. }]
    ));

    let archive = parse_output(&output);
    for file in archive.files().unwrap() {
        assert_eq!(file.node.attributes, 0x11, "{}", file.path.display());
    }
}

#[test]
fn pack_falls_back_when_one_file_times_out() {
    let work = TempDir::new().unwrap();
    let input = work.path().join("in");
    write_file(&input, "a.bin", b"alpha");
    write_file(&input, "sub/b.bin", b"beta");
    let output = work.path().join("rels.arc");

    let codec = TimesOutOn::new("b.bin");
    let report = pack(&PackConfig::new(&input, &output), &codec).unwrap();
    assert_eq!(report.encoding, FileEncoding::RawMram);
    match report.warnings.as_slice() {
        [PackWarning::CompressionFailed { file, .. }] => {
            assert_eq!(file, &PathBuf::from("sub/b.bin"));
        }
        other => panic!("unexpected warnings: {other:?}"),
    }

    // No file keeps compressed attributes after the switch
    let archive = parse_output(&output);
    assert_eq!(archive_files(&archive), disk_files(&input));
    for file in archive.files().unwrap() {
        assert_eq!(file.node.attributes, 0x11);
    }
}

#[test]
fn pack_without_fallback_names_failing_file() {
    let work = TempDir::new().unwrap();
    let input = work.path().join("in");
    write_file(&input, "a.bin", b"alpha");
    write_file(&input, "sub/b.bin", b"beta");
    let output = work.path().join("rels.arc");

    let mut config = PackConfig::new(&input, &output);
    config.allow_fallback = false;
    let err = pack(&config, &TimesOutOn::new("b.bin")).unwrap_err();
    match &err {
        PackError::Compress { file, source } => {
            assert_eq!(file, &PathBuf::from("sub/b.bin"));
            assert!(matches!(source, CodecError::Timeout { .. }));
        }
        other => panic!("unexpected error: {other}"),
    }
    assert!(err.to_string().contains("sub/b.bin"));
    assert!(!output.exists(), "no partial archive may be written");
}

#[test]
fn pack_without_fallback_requires_codec() {
    let work = TempDir::new().unwrap();
    let input = work.path().join("in");
    write_file(&input, "a.bin", b"alpha");

    let mut config = PackConfig::new(&input, work.path().join("rels.arc"));
    config.allow_fallback = false;
    let err = pack(&config, &Missing).unwrap_err();
    assert!(matches!(err, PackError::CodecUnavailable(CodecError::NotFound(_))));
}

// --- Input and output errors ---

#[test]
fn pack_missing_input_directory() {
    let work = TempDir::new().unwrap();
    let config = PackConfig::new(work.path().join("absent"), work.path().join("rels.arc"));
    let err = pack(&config, &FakeYaz0).unwrap_err();
    assert!(matches!(err, PackError::Input(InputError::NotFound(_))));
}

#[cfg(target_os = "linux")]
#[test]
fn pack_unreadable_file_writes_nothing() {
    let work = TempDir::new().unwrap();
    let input = work.path().join("in");
    write_file(&input, "a.bin", b"alpha");
    // Reading a process's own memory file at offset 0 fails with EIO, even as root
    std::os::unix::fs::symlink("/proc/self/mem", input.join("mem.bin")).unwrap();
    let output = work.path().join("rels.arc");

    let err = pack(&PackConfig::new(&input, &output), &FakeYaz0).unwrap_err();
    assert!(matches!(err, PackError::Input(InputError::ReadFile { .. })));
    assert!(!output.exists());
}

#[cfg(unix)]
#[test]
fn pack_linked_directory_precedes_files() {
    let work = TempDir::new().unwrap();
    let input = work.path().join("in");
    write_file(&input, "a.bin", b"alpha");
    write_file(work.path(), "real/inner.bin", b"inner");
    std::os::unix::fs::symlink(work.path().join("real"), input.join("zdir")).unwrap();
    let output = work.path().join("rels.arc");

    pack(&PackConfig::new(&input, &output), &FakeYaz0).unwrap();
    let archive = parse_output(&output);
    let root = archive.span(&archive.directories[0]).unwrap();
    let names: Vec<&str> = root.iter().filter_map(|n| archive.node_name(n)).collect();
    assert_eq!(names, vec!["zdir", "a.bin", ".", ".."]);
    assert!(root[0].is_directory());
}

#[test]
fn pack_empty_input_directory() {
    let work = TempDir::new().unwrap();
    let input = work.path().join("in");
    fs::create_dir_all(&input).unwrap();
    let output = work.path().join("empty.arc");

    let report = pack(&PackConfig::new(&input, &output), &FakeYaz0).unwrap();
    assert_eq!(report.directory_count, 1);
    assert_eq!(report.node_count, 2);
    assert_eq!(report.file_count, 0);

    let archive = parse_output(&output);
    assert_eq!(archive.header.data_size, 0);
    assert!(archive.files().unwrap().is_empty());
}

// --- Ordering and ids ---

#[test]
fn pack_collates_underscore_after_letters() {
    let work = TempDir::new().unwrap();
    let input = work.path().join("in");
    write_file(&input, "mmem/e_dn.rel", b"1");
    write_file(&input, "mmem/econt.rel", b"2");
    write_file(&input, "mmem/eb.rel", b"3");
    let output = work.path().join("rels.arc");

    pack(&PackConfig::new(&input, &output), &FakeYaz0).unwrap();
    let archive = parse_output(&output);
    let names: Vec<PathBuf> = archive.files().unwrap().into_iter().map(|f| f.path).collect();
    assert_eq!(
        names,
        vec![
            PathBuf::from("mmem/eb.rel"),
            PathBuf::from("mmem/econt.rel"),
            PathBuf::from("mmem/e_dn.rel"),
        ]
    );
    let ids: Vec<u16> = archive.files().unwrap().iter().map(|f| f.node.id).collect();
    assert_eq!(ids, vec![0, 1, 2]);
}

#[test]
fn pack_synced_ids_use_node_indices() {
    let work = TempDir::new().unwrap();
    let input = work.path().join("in");
    write_file(&input, "top.bin", b"t");
    write_file(&input, "amem/foo.bin", b"f");
    let output = work.path().join("rels.arc");

    let mut config = PackConfig::new(&input, &output);
    config.id_scheme = FileIdScheme::NodeIndex;
    pack(&config, &FakeYaz0).unwrap();

    let archive = parse_output(&output);
    assert!(archive.info.sync_file_ids);
    assert_eq!(u32::from(archive.info.next_file_id), archive.info.node_count);
    for (index, node) in archive.nodes.iter().enumerate() {
        if node.is_file() {
            assert_eq!(usize::from(node.id), index);
        }
    }
}

// --- Round trip against the input tree ---

#[test]
fn pack_round_trips_nested_tree() {
    let work = TempDir::new().unwrap();
    let input = work.path().join("in");
    write_file(&input, "zz.bin", &[0x5A; 40]);
    write_file(&input, "amem/deep/inner.bin", &[1; 33]);
    write_file(&input, "amem/a.bin", &[]);
    write_file(&input, "mmem/_last.rel", &[2; 64]);
    write_file(&input, "mmem/first.rel", &[3; 5]);
    fs::create_dir_all(input.join("empty")).unwrap();
    let output = work.path().join("files/Stage.arc");

    let mut config = PackConfig::new(&input, &output);
    config.compress = false;
    let report = pack(&config, &Missing).unwrap();
    assert_eq!(report.directory_count, 5);

    let archive = parse_output(&output);
    assert_eq!(archive.directory_name(&archive.directories[0]), Some("stage"));
    assert_eq!(archive_files(&archive), disk_files(&input));
    for file in archive.files().unwrap() {
        assert_eq!(file.node.data % 32, 0, "{} misaligned", file.path.display());
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(16))]

    #[test]
    fn pack_preserves_file_contents(
        files in prop::collection::btree_map(
            "[a-z_]{1,6}(/[a-z_]{1,6})?\\.bin",
            prop::collection::vec(any::<u8>(), 0..80),
            1..8,
        )
    ) {
        let work = TempDir::new().unwrap();
        let input = work.path().join("in");
        fs::create_dir_all(&input).unwrap();
        // Directory names never contain '.', so they cannot collide with files
        for (rel, data) in &files {
            write_file(&input, rel, data);
        }
        let output = work.path().join("prop.arc");

        let mut config = PackConfig::new(&input, &output);
        config.compress = false;
        pack(&config, &Missing).unwrap();

        let archive = parse_output(&output);
        prop_assert_eq!(archive_files(&archive), disk_files(&input));
    }
}
