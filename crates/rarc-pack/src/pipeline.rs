//! End-to-end packing: scan, encode payloads, lay out, write.
//!
//! The compression mode is decided once per run. When the codec cannot be
//! started, or any single file fails to compress, the whole archive is
//! re-encoded raw (if fallback is allowed) so every file node carries the
//! same attributes.

use crate::codec::{Codec, compress_file};
use crate::config::PackConfig;
use crate::error::{OutputError, PackError, Result};
use crate::scan::scan_directory;
use rarc_format::{
    DirectoryTree, Entry, FileEncoding, PayloadBuilder, PayloadSection, RarcBuilder,
    build_raw_payload,
};
use std::fmt;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::{debug, info, warn};

/// Non-fatal condition recorded during a run
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PackWarning {
    /// The codec could not be started; all files were stored raw
    CodecUnavailable {
        /// Codec failure description
        reason: String,
    },
    /// A file failed to compress; all files were stored raw
    CompressionFailed {
        /// Archive-relative path of the file
        file: PathBuf,
        /// Codec failure description
        reason: String,
    },
}

impl fmt::Display for PackWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::CodecUnavailable { reason } => {
                write!(f, "compressor unavailable, storing files raw: {reason}")
            }
            Self::CompressionFailed { file, reason } => write!(
                f,
                "compressing {} failed, storing files raw: {reason}",
                file.display()
            ),
        }
    }
}

/// Summary of a completed run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackReport {
    /// Archive written
    pub output: PathBuf,
    /// Archive size in bytes
    pub archive_size: usize,
    /// Directory records written
    pub directory_count: usize,
    /// File nodes written
    pub file_count: usize,
    /// Node records written, sentinels included
    pub node_count: usize,
    /// Encoding applied to every file
    pub encoding: FileEncoding,
    /// Conditions that degraded the output without failing the run
    pub warnings: Vec<PackWarning>,
}

impl PackReport {
    /// Whether payloads were compressed
    pub fn compressed(&self) -> bool {
        self.encoding.is_compressed()
    }
}

/// Pack `config.input_dir` into `config.output` using `codec` for compression
pub fn pack(config: &PackConfig, codec: &dyn Codec) -> Result<PackReport> {
    let root_name = config.root_name();
    info!(
        "packing {} as '{}' into {}",
        config.input_dir.display(),
        root_name,
        config.output.display()
    );

    let tree = scan_directory(&config.input_dir, &root_name)?;
    let mut warnings = Vec::new();

    let (encoding, payload) = encode(config, codec, &tree, &mut warnings)?;

    let archive = RarcBuilder::new()
        .encoding(encoding)
        .id_scheme(config.id_scheme)
        .build(&tree, payload)?;
    let bytes = archive.build()?;

    write_archive(&config.output, &bytes)?;

    let report = PackReport {
        output: config.output.clone(),
        archive_size: bytes.len(),
        directory_count: archive.directories.len(),
        file_count: tree.file_count(),
        node_count: archive.nodes.len(),
        encoding,
        warnings,
    };
    info!(
        size = report.archive_size,
        directories = report.directory_count,
        files = report.file_count,
        compressed = report.compressed(),
        "wrote {}",
        report.output.display()
    );
    Ok(report)
}

fn encode(
    config: &PackConfig,
    codec: &dyn Codec,
    tree: &DirectoryTree,
    warnings: &mut Vec<PackWarning>,
) -> Result<(FileEncoding, PayloadSection)> {
    if !config.compress {
        debug!("compression disabled");
        return Ok((FileEncoding::RawMram, build_raw_payload(tree)?));
    }

    if let Err(err) = codec.probe() {
        if !config.allow_fallback {
            return Err(PackError::CodecUnavailable(err));
        }
        warn!("{} unavailable, storing files raw: {err}", codec.name());
        warnings.push(PackWarning::CodecUnavailable {
            reason: err.to_string(),
        });
        return Ok((FileEncoding::RawMram, build_raw_payload(tree)?));
    }

    match compress_payloads(codec, tree) {
        Ok(payload) => Ok((FileEncoding::CompressedAram, payload)),
        Err(PackError::Compress { file, source }) if config.allow_fallback => {
            warn!(
                "compressing {} failed, storing all files raw: {source}",
                file.display()
            );
            warnings.push(PackWarning::CompressionFailed {
                file,
                reason: source.to_string(),
            });
            Ok((FileEncoding::RawMram, build_raw_payload(tree)?))
        }
        Err(PackError::CodecUnavailable(err)) if config.allow_fallback => {
            warn!("{} unusable, storing files raw: {err}", codec.name());
            warnings.push(PackWarning::CodecUnavailable {
                reason: err.to_string(),
            });
            Ok((FileEncoding::RawMram, build_raw_payload(tree)?))
        }
        Err(err) => Err(err),
    }
}

/// Compress every file in emission order into a payload section
pub fn compress_payloads(codec: &dyn Codec, tree: &DirectoryTree) -> Result<PayloadSection> {
    let scratch = tempfile::Builder::new()
        .prefix("rarc-pack-")
        .tempdir()
        .map_err(|e| PackError::CodecUnavailable(e.into()))?;

    let mut payload = PayloadBuilder::new();
    for (index, dir) in tree.directories().iter().enumerate() {
        let dir_path = tree.path_of(index).unwrap_or_default();
        for entry in &dir.entries {
            let Entry::File(file) = entry else {
                continue;
            };
            let ordinal = payload.file_count();
            let data = compress_file(codec, file, ordinal, &scratch).map_err(|source| {
                PackError::Compress {
                    file: dir_path.join(&file.name),
                    source,
                }
            })?;
            debug!(
                raw = file.data.len(),
                compressed = data.len(),
                "compressed {}",
                dir_path.join(&file.name).display()
            );
            payload.push(&data)?;
        }
    }
    Ok(payload.finish()?)
}

/// Write the finished archive in one step
///
/// Bytes go to a temporary file beside the destination which is then
/// renamed over it, so a failed run never leaves a partial archive.
pub fn write_archive(output: &Path, bytes: &[u8]) -> std::result::Result<(), OutputError> {
    let parent = match output.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    fs::create_dir_all(parent).map_err(|source| OutputError::CreateDir {
        path: parent.to_path_buf(),
        source,
    })?;

    let write_err = |source| OutputError::Write {
        path: output.to_path_buf(),
        source,
    };
    let mut staged = NamedTempFile::new_in(parent).map_err(write_err)?;
    staged.write_all(bytes).map_err(write_err)?;
    staged.flush().map_err(write_err)?;
    staged.persist(output).map_err(|e| write_err(e.error))?;
    Ok(())
}
