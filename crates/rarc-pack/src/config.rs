//! Packer configuration.
//!
//! [`PackConfig`] is the library-facing configuration consumed by
//! [`pack`](crate::pack). The binary fills it from command-line arguments
//! through [`Cli`], which also reads the environment:
//!
//! - `RARC_PACK_DTK`: path to the decomp-toolkit binary
//! - `RARC_PACK_CODEC_TIMEOUT`: per-file compressor time limit in seconds
//!
//! # Example
//!
//! ```
//! use rarc_pack::PackConfig;
//!
//! let config = PackConfig::new("build/rels", "files/RELS.arc");
//! assert_eq!(config.root_name(), "rels");
//! assert!(config.compress);
//! ```

use crate::codec::{DEFAULT_TIMEOUT, DtkCodec};
use clap::{Args, Parser, Subcommand};
use rarc_format::FileIdScheme;
use std::path::PathBuf;
use std::time::Duration;

/// Root name used when the output path has no usable stem
pub const FALLBACK_ROOT_NAME: &str = "root";

/// Options for one packing run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackConfig {
    /// Directory whose contents become the archive
    pub input_dir: PathBuf,
    /// Archive to write
    pub output: PathBuf,
    /// Compress payloads with the external codec
    pub compress: bool,
    /// Store everything raw when the codec is unusable instead of failing
    pub allow_fallback: bool,
    /// File id assignment
    pub id_scheme: FileIdScheme,
    /// Root directory name; defaults to the output stem in lower case
    pub root_name: Option<String>,
    /// Explicit compressor path
    pub codec_path: Option<PathBuf>,
    /// Per-file compressor time limit
    pub codec_timeout: Duration,
}

impl PackConfig {
    /// Default configuration for packing `input_dir` into `output`
    pub fn new(input_dir: impl Into<PathBuf>, output: impl Into<PathBuf>) -> Self {
        Self {
            input_dir: input_dir.into(),
            output: output.into(),
            ..Self::default()
        }
    }

    /// Name of the archive's root directory
    pub fn root_name(&self) -> String {
        if let Some(name) = &self.root_name {
            return name.clone();
        }
        self.output
            .file_stem()
            .and_then(|stem| stem.to_str())
            .filter(|stem| !stem.is_empty())
            .map_or_else(|| FALLBACK_ROOT_NAME.to_owned(), str::to_lowercase)
    }

    /// Codec described by this configuration
    pub fn codec(&self) -> DtkCodec {
        DtkCodec::new(self.codec_path.clone(), self.codec_timeout)
    }
}

impl Default for PackConfig {
    fn default() -> Self {
        Self {
            input_dir: PathBuf::new(),
            output: PathBuf::new(),
            compress: true,
            allow_fallback: true,
            id_scheme: FileIdScheme::default(),
            root_name: None,
            codec_path: None,
            codec_timeout: DEFAULT_TIMEOUT,
        }
    }
}

/// Command-line interface.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "rarc-pack",
    about = "Pack a directory tree into a RARC archive",
    version
)]
pub struct Cli {
    /// Subcommand to run
    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    /// Parse the process arguments.
    #[must_use]
    pub fn from_args() -> Self {
        Self::parse()
    }
}

/// Subcommands.
#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Pack a directory into an archive
    Pack(PackArgs),
    /// Print the layout of an existing archive
    List(ListArgs),
}

/// Arguments for `pack`.
#[derive(Debug, Clone, Args)]
pub struct PackArgs {
    /// Directory to pack
    pub input_dir: PathBuf,

    /// Archive to write
    pub output: PathBuf,

    /// Store payloads uncompressed in main memory
    #[arg(long)]
    pub no_compress: bool,

    /// Path to the decomp-toolkit binary (default: search PATH)
    #[arg(long, env = "RARC_PACK_DTK")]
    pub dtk: Option<PathBuf>,

    /// Per-file compressor time limit in seconds
    #[arg(long, env = "RARC_PACK_CODEC_TIMEOUT", default_value_t = 60)]
    pub codec_timeout: u64,

    /// Fail instead of storing raw payloads when compression fails
    #[arg(long)]
    pub no_fallback: bool,

    /// Use node table indices as file ids
    #[arg(long)]
    pub sync_ids: bool,

    /// Root directory name (default: output file stem, lower-cased)
    #[arg(long)]
    pub root_name: Option<String>,
}

impl From<PackArgs> for PackConfig {
    fn from(args: PackArgs) -> Self {
        Self {
            input_dir: args.input_dir,
            output: args.output,
            compress: !args.no_compress,
            allow_fallback: !args.no_fallback,
            id_scheme: if args.sync_ids {
                FileIdScheme::NodeIndex
            } else {
                FileIdScheme::FileOrdinal
            },
            root_name: args.root_name,
            codec_path: args.dtk,
            codec_timeout: Duration::from_secs(args.codec_timeout),
        }
    }
}

/// Arguments for `list`.
#[derive(Debug, Clone, Args)]
pub struct ListArgs {
    /// Archive to read
    pub archive: PathBuf,
}
