// /////////////////////////////////////////////////////////////////////////////
// HDS Agent
// SPDX-License-Identifier: BSD-3-Clause
// /////////////////////////////////////////////////////////////////////////////

//! # Logging
//!
//! Two rotating log files per run, `<temp_dir>/<exe_name>-<timestamp>.INFO`
//! and `<temp_dir>/<exe_name>-<timestamp>.ERROR` (§6 "Logging"). `INFO`
//! receives every event; `ERROR` receives only `ERROR`-level events and is
//! mirrored to stderr so an operator watching the foreground process still
//! sees failures. Either file is closed and reopened under a fresh
//! timestamp once it crosses [`ROTATION_THRESHOLD_BYTES`].
//!
//! When `-stdout` is passed, an additional unfiltered layer writes to
//! stdout instead of (not in place of) the files.

use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use tracing_subscriber::fmt::writer::{MakeWriter, MakeWriterExt};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

/// Files are rotated once they exceed this size.
pub const ROTATION_THRESHOLD_BYTES: u64 = 50 * 1024 * 1024;

struct RotatingFile {
    dir: PathBuf,
    exe_name: String,
    suffix: &'static str,
    current: Mutex<(File, u64)>,
}

impl RotatingFile {
    fn open(dir: &Path, exe_name: &str, suffix: &'static str) -> io::Result<Self> {
        let (file, path) = Self::create_new(dir, exe_name, suffix)?;
        let size = file.metadata().map(|m| m.len()).unwrap_or(0);
        let _ = path;
        Ok(Self {
            dir: dir.to_path_buf(),
            exe_name: exe_name.to_string(),
            suffix,
            current: Mutex::new((file, size)),
        })
    }

    fn create_new(dir: &Path, exe_name: &str, suffix: &str) -> io::Result<(File, PathBuf)> {
        let timestamp = unix_timestamp();
        let path = dir.join(format!("{exe_name}-{timestamp}.{suffix}"));
        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        Ok((file, path))
    }
}

/// `SystemTime::now()` isn't banned here the way `Date.now()` equivalents
/// are in the workflow scripting layer; this runs inside the compiled
/// binary, not a replayed script.
fn unix_timestamp() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

impl Write for &RotatingFile {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let mut guard = self.current.lock().expect("rotating log mutex poisoned");
        let (file, size) = &mut *guard;
        let written = file.write(buf)?;
        *size += written as u64;

        if *size >= ROTATION_THRESHOLD_BYTES {
            match RotatingFile::create_new(&self.dir, &self.exe_name, self.suffix) {
                Ok((new_file, _)) => {
                    *file = new_file;
                    *size = 0;
                }
                Err(err) => {
                    tracing::warn!(error = %err, "failed to rotate log file, continuing with current file");
                }
            }
        }

        Ok(written)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.current.lock().expect("rotating log mutex poisoned").0.flush()
    }
}

impl<'a> MakeWriter<'a> for RotatingFile {
    type Writer = &'a RotatingFile;

    fn make_writer(&'a self) -> Self::Writer {
        self
    }
}

/// Initializes the global `tracing` subscriber: rotating INFO file (all
/// levels), rotating ERROR file mirrored to stderr (error level only), and
/// optionally a plain stdout layer when `stdout` is true (`-stdout` flag,
/// §6).
///
/// Returns an error if either log file cannot be opened.
pub fn init_logging(exe_name: &str, log_dir: &Path, stdout: bool) -> io::Result<()> {
    let info_writer = RotatingFile::open(log_dir, exe_name, "INFO")?;
    let error_writer = RotatingFile::open(log_dir, exe_name, "ERROR")?;

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let info_layer = tracing_subscriber::fmt::layer()
        .with_writer(info_writer)
        .with_ansi(false);

    let error_layer = tracing_subscriber::fmt::layer()
        .with_writer(error_writer.and(io::stderr))
        .with_ansi(false)
        .with_filter(tracing_subscriber::filter::LevelFilter::ERROR);

    let registry = tracing_subscriber::registry().with(env_filter).with(info_layer).with(error_layer);

    if stdout {
        let stdout_layer = tracing_subscriber::fmt::layer().with_writer(io::stdout).with_ansi(true);
        registry.with(stdout_layer).try_init()
    } else {
        registry.try_init()
    }
    .map_err(|err| io::Error::new(io::ErrorKind::Other, err))
}
