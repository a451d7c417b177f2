//! Rotating File Sink - size-rotated numbered files with retention
//!
//! Writes one line per event into `<stem>_<NNNN><ext>`. Once the current
//! file has grown past the size threshold, the next write closes it and
//! starts the next number. Every rotation also sweeps older numbers and
//! deletes the ones last modified before the retention cutoff.
//!
//! # Startup
//!
//! The directory is scanned for existing numbers and a new file is opened
//! at highest + 1 (or 0). A restarted process never appends to a file a
//! previous run was writing.
//!
//! ```text
//! logs/app_0006.log   previous run, closed
//! logs/app_0007.log   previous run, closed
//! logs/app_0008.log   <- this process starts here
//! ```
//!
//! # Locking
//!
//! Size check, rotation, sweep and write all happen under one mutex, so two
//! writers can never both observe an oversized file and rotate twice.

mod naming;

pub use naming::FileNaming;

use std::fmt;
use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::PathBuf;
use std::time::{Duration, SystemTime};

use async_trait::async_trait;
use logfan_config::RotatingFileSinkConfig;
use logfan_protocol::{LogEvent, LogLevel};
use parking_lot::Mutex;

use crate::util::RateLimitedLogger;
use crate::{Sink, SinkError};

/// Mutable rotation state, guarded by the sink's mutex
struct RotationState {
    /// Open file; `None` after a failed rotation or after dispose
    file: Option<File>,
    current_suffix: u32,
    bytes_written: u64,
    rotations: u64,
    closed: bool,
}

/// Size/retention rotated file sink
pub struct RotatingFileSink {
    name: String,
    naming: FileNaming,
    max_file_size: u64,
    retention: Option<Duration>,
    min_level: LogLevel,
    state: Mutex<RotationState>,
    fallback: RateLimitedLogger,
}

impl RotatingFileSink {
    /// Open the next numbered file for `config.base_file_name`
    ///
    /// Creates the directory if needed.
    ///
    /// # Errors
    ///
    /// Returns `SinkError::Config` for an unusable base name and
    /// `SinkError::Init` if the directory cannot be scanned or the first file
    /// cannot be created.
    pub fn new(name: impl Into<String>, config: &RotatingFileSinkConfig) -> Result<Self, SinkError> {
        let name = name.into();
        let naming = FileNaming::new(&config.base_file_name).ok_or_else(|| {
            SinkError::config(format!(
                "base_file_name '{}' has no usable file name",
                config.base_file_name
            ))
        })?;
        if config.max_trace_file_size == 0 {
            return Err(SinkError::config("max_trace_file_size must be greater than zero"));
        }

        fs::create_dir_all(naming.dir()).map_err(|e| {
            SinkError::init(format!(
                "failed to create directory '{}': {}",
                naming.dir().display(),
                e
            ))
        })?;

        let highest = naming.highest_existing().map_err(|e| {
            SinkError::init(format!(
                "failed to scan directory '{}': {}",
                naming.dir().display(),
                e
            ))
        })?;
        let first_suffix = highest.map_or(0, |h| h.saturating_add(1));

        let path = naming.path(first_suffix);
        let file = create_fresh(&path).map_err(|e| {
            SinkError::init(format!("failed to create '{}': {}", path.display(), e))
        })?;

        tracing::info!(
            sink = %name,
            path = %path.display(),
            recovered_from = ?highest,
            "rotating file sink opened"
        );

        Ok(Self {
            fallback: RateLimitedLogger::with_default_interval(name.clone()),
            name,
            naming,
            max_file_size: config.max_trace_file_size,
            retention: config.retention(),
            min_level: config.min_level,
            state: Mutex::new(RotationState {
                file: Some(file),
                current_suffix: first_suffix,
                bytes_written: 0,
                rotations: 0,
                closed: false,
            }),
        })
    }

    /// Write one record, rotating first if the current file is oversized
    ///
    /// Every write path funnels through here. The record is flushed before
    /// returning.
    pub fn write_record(&self, record: &[u8]) -> Result<(), SinkError> {
        let mut state = self.state.lock();
        if state.closed {
            return Err(SinkError::Closed);
        }

        if state.file.is_none() || state.bytes_written > self.max_file_size {
            self.rotate(&mut state)?;
        }

        let state = &mut *state;
        let Some(file) = state.file.as_mut() else {
            return Err(SinkError::write("no file open"));
        };
        let (landed, result) = write_counted(file, record);
        state.bytes_written += landed;
        result?;
        file.flush()?;
        Ok(())
    }

    /// Close the current file and open the next number, then sweep
    fn rotate(&self, state: &mut RotationState) -> Result<(), SinkError> {
        if let Some(mut old) = state.file.take()
            && let Err(e) = old.flush()
        {
            self.fallback.error("flush before rotation failed", &e);
        }

        // The number advances even when the open fails, so a name taken by
        // someone else is skipped instead of retried forever.
        let next = state.current_suffix.saturating_add(1);
        state.current_suffix = next;
        state.bytes_written = 0;

        let path = self.naming.path(next);
        let file = create_fresh(&path).map_err(|e| SinkError::rotation(&path, e))?;
        state.file = Some(file);
        state.rotations += 1;

        tracing::debug!(sink = %self.name, path = %path.display(), "rotated");

        if let Some(retention) = self.retention {
            self.sweep(next, retention);
        }
        Ok(())
    }

    /// Delete numbered files below `current` last modified before the cutoff
    fn sweep(&self, current: u32, retention: Duration) {
        let Some(cutoff) = SystemTime::now().checked_sub(retention) else {
            return;
        };

        for suffix in 0..current {
            let path = self.naming.path(suffix);
            let modified = match fs::metadata(&path).and_then(|m| m.modified()) {
                Ok(modified) => modified,
                Err(e) if e.kind() == io::ErrorKind::NotFound => continue,
                Err(e) => {
                    self.fallback.error("retention check failed", &e);
                    continue;
                }
            };

            if modified < cutoff {
                match fs::remove_file(&path) {
                    Ok(()) => {
                        tracing::debug!(sink = %self.name, path = %path.display(), "expired file removed")
                    }
                    Err(e) if e.kind() == io::ErrorKind::NotFound => {}
                    Err(e) => {
                        self.fallback.error("retention delete failed", &e);
                    }
                }
            }
        }
    }

    /// Path of the file currently written to
    pub fn current_path(&self) -> PathBuf {
        self.naming.path(self.state.lock().current_suffix)
    }

    /// Number of the file currently written to
    pub fn current_suffix(&self) -> u32 {
        self.state.lock().current_suffix
    }

    /// Rotations performed since construction
    pub fn rotations(&self) -> u64 {
        self.state.lock().rotations
    }

    /// Size threshold in bytes
    pub fn max_file_size(&self) -> u64 {
        self.max_file_size
    }
}

/// Write all of `record`, reporting how many bytes landed even on failure
fn write_counted(writer: &mut impl Write, record: &[u8]) -> (u64, io::Result<()>) {
    let mut landed = 0;
    while landed < record.len() {
        match writer.write(&record[landed..]) {
            Ok(0) => return (landed as u64, Err(io::ErrorKind::WriteZero.into())),
            Ok(n) => landed += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
            Err(e) => return (landed as u64, Err(e)),
        }
    }
    (landed as u64, Ok(()))
}

/// Create a file that must not exist yet
fn create_fresh(path: &std::path::Path) -> io::Result<File> {
    OpenOptions::new().write(true).create_new(true).open(path)
}

#[async_trait]
impl Sink for RotatingFileSink {
    fn name(&self) -> &str {
        &self.name
    }

    fn write(&self, event: &LogEvent) -> Result<(), SinkError> {
        if !event.level().passes(self.min_level) {
            return Ok(());
        }

        let mut line = event.to_string();
        line.push('\n');
        self.write_record(line.as_bytes())
    }

    async fn dispose(&self) -> Result<(), SinkError> {
        let mut state = self.state.lock();
        state.closed = true;
        if let Some(mut file) = state.file.take() {
            file.flush()?;
            file.sync_all()?;
        }
        Ok(())
    }
}

impl fmt::Debug for RotatingFileSink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RotatingFileSink")
            .field("name", &self.name)
            .field("naming", &self.naming)
            .field("max_file_size", &self.max_file_size)
            .field("retention", &self.retention)
            .field("min_level", &self.min_level)
            .finish_non_exhaustive()
    }
}
