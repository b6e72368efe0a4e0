//! Directory-to-RARC packer
//!
//! Turns a directory tree into a RARC archive the way the game's build
//! expects: subdirectories before files, `_` collated after letters, and
//! every payload Yaz0-compressed by decomp-toolkit when it is available.
//!
//! ```no_run
//! use rarc_pack::{PackConfig, pack};
//!
//! # fn main() -> Result<(), rarc_pack::PackError> {
//! let config = PackConfig::new("build/rels", "files/RELS.arc");
//! let report = pack(&config, &config.codec())?;
//! for warning in &report.warnings {
//!     eprintln!("warning: {warning}");
//! }
//! # Ok(())
//! # }
//! ```
//!
//! When the compressor is missing or fails on any file the run falls back
//! to raw, main-memory payloads for the whole archive and records a
//! [`PackWarning`]. Set [`PackConfig::allow_fallback`] to `false` to make
//! that fatal instead.

#![warn(missing_docs)]

pub mod codec;
pub mod config;
pub mod error;
pub mod list;
pub mod pipeline;
pub mod scan;

pub use codec::{Codec, DtkCodec, compress_file};
pub use config::{Cli, Command, ListArgs, PackArgs, PackConfig};
pub use error::{CodecError, InputError, OutputError, PackError, Result};
pub use list::{read_archive, render_listing};
pub use pipeline::{PackReport, PackWarning, compress_payloads, pack, write_archive};
pub use scan::scan_directory;
