//! rarc-pack binary entry point.
//!
//! Parses arguments, initializes logging, and dispatches to the library.
//! Log verbosity follows `RUST_LOG` (default `info`).

use anyhow::{Context, Result};
use rarc_pack::{Cli, Command, PackConfig, pack, read_archive, render_listing};

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    match Cli::from_args().command {
        Command::Pack(args) => {
            let config = PackConfig::from(args);
            let codec = config.codec();
            let report = pack(&config, &codec)
                .with_context(|| format!("failed to pack {}", config.input_dir.display()))?;
            println!(
                "{}: {} bytes, {} directories, {} files ({})",
                report.output.display(),
                report.archive_size,
                report.directory_count,
                report.file_count,
                if report.compressed() { "yaz0" } else { "raw" }
            );
        }
        Command::List(args) => {
            let archive = read_archive(&args.archive)?;
            print!("{}", render_listing(&archive)?);
        }
    }

    Ok(())
}
