//! External Yaz0 compressor integration
//!
//! Compression is delegated to a command-line tool through the [`Codec`]
//! trait. The shipped implementation drives decomp-toolkit
//! (`dtk yaz0 compress <in> -o <out>`); tests substitute in-process fakes.

use crate::error::CodecError;
use rarc_format::FileEntry;
use std::ffi::OsStr;
use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::sync::mpsc;
use std::thread;
use std::time::{Duration, Instant};
use tempfile::TempDir;
use tracing::{debug, trace};

/// Default per-invocation time limit
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// Binary name searched on `PATH`
pub const DTK_BINARY: &str = "dtk";

const POLL_INTERVAL: Duration = Duration::from_millis(10);

/// How long to wait for stderr once the child has exited
const STDERR_GRACE: Duration = Duration::from_millis(500);

/// A file-to-file compressor
pub trait Codec {
    /// Short name for log messages
    fn name(&self) -> &str;

    /// Check that the compressor can be run at all
    fn probe(&self) -> Result<(), CodecError>;

    /// Compress `input` into a new file at `output`
    fn compress(&self, input: &Path, output: &Path) -> Result<(), CodecError>;
}

/// decomp-toolkit's Yaz0 compressor
#[derive(Debug, Clone)]
pub struct DtkCodec {
    explicit: Option<PathBuf>,
    timeout: Duration,
}

impl DtkCodec {
    /// Create a codec; `explicit` overrides the `PATH` search
    pub fn new(explicit: Option<PathBuf>, timeout: Duration) -> Self {
        Self { explicit, timeout }
    }

    /// Resolve the executable: explicit path first, then `PATH`
    pub fn locate(&self) -> Result<PathBuf, CodecError> {
        match &self.explicit {
            Some(path) if path.is_file() => Ok(path.clone()),
            Some(path) => which::which(path).map_err(|e| {
                CodecError::NotFound(format!("{} is not executable: {e}", path.display()))
            }),
            None => which::which(DTK_BINARY)
                .map_err(|e| CodecError::NotFound(format!("`{DTK_BINARY}` not on PATH: {e}"))),
        }
    }

    fn run<I, S>(&self, program: &Path, args: I) -> Result<(), CodecError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        let mut child = Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|source| CodecError::Spawn {
                program: program.to_path_buf(),
                source,
            })?;

        // Drain stderr on the side so a chatty child cannot block on a full
        // pipe. A grandchild may inherit the pipe and keep it open after the
        // child exits, so the text is only ever awaited with a bound.
        let stderr = child.stderr.take();
        let (tx, rx) = mpsc::channel();
        thread::spawn(move || {
            let mut buf = String::new();
            if let Some(mut pipe) = stderr {
                let _ = pipe.read_to_string(&mut buf);
            }
            let _ = tx.send(buf);
        });

        let deadline = Instant::now() + self.timeout;
        let status = loop {
            match child.try_wait() {
                Ok(Some(status)) => break status,
                Ok(None) => {}
                Err(err) => {
                    let _ = child.kill();
                    let _ = child.wait();
                    return Err(err.into());
                }
            }
            if Instant::now() >= deadline {
                let _ = child.kill();
                let _ = child.wait();
                return Err(CodecError::Timeout {
                    program: program.to_path_buf(),
                    timeout: self.timeout,
                });
            }
            thread::sleep(POLL_INTERVAL);
        };
        let stderr = rx.recv_timeout(STDERR_GRACE).unwrap_or_default();

        if status.success() {
            Ok(())
        } else {
            Err(CodecError::Failed {
                program: program.to_path_buf(),
                status: status.to_string(),
                stderr: stderr.trim().to_owned(),
            })
        }
    }
}

impl Default for DtkCodec {
    fn default() -> Self {
        Self::new(None, DEFAULT_TIMEOUT)
    }
}

impl Codec for DtkCodec {
    fn name(&self) -> &str {
        DTK_BINARY
    }

    fn probe(&self) -> Result<(), CodecError> {
        let program = self.locate()?;
        debug!("probing {}", program.display());
        self.run(&program, ["--version"])
    }

    fn compress(&self, input: &Path, output: &Path) -> Result<(), CodecError> {
        let program = self.locate()?;
        trace!("{} yaz0 compress {}", program.display(), input.display());
        self.run(
            &program,
            [
                OsStr::new("yaz0"),
                OsStr::new("compress"),
                input.as_os_str(),
                OsStr::new("-o"),
                output.as_os_str(),
            ],
        )
    }
}

/// Compress one scanned file through `codec`, using `scratch` for temporaries
///
/// Files that came from disk are handed to the codec by path; in-memory
/// files are spilled to the scratch directory first. `ordinal` keeps
/// scratch names unique within one run.
pub fn compress_file(
    codec: &dyn Codec,
    file: &FileEntry,
    ordinal: usize,
    scratch: &TempDir,
) -> Result<Vec<u8>, CodecError> {
    let input = match &file.source {
        Some(path) => path.clone(),
        None => {
            let path = scratch.path().join(format!("{ordinal:05}.in"));
            fs::write(&path, &file.data)?;
            path
        }
    };
    let output = scratch.path().join(format!("{ordinal:05}.yaz0"));

    codec.compress(&input, &output)?;

    if !output.is_file() {
        return Err(CodecError::MissingOutput(output));
    }
    let data = fs::read(&output)?;
    let _ = fs::remove_file(&output);
    Ok(data)
}
