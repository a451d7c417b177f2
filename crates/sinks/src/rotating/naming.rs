//! Numbered file naming
//!
//! `logs/app.log` expands to `logs/app_0000.log`, `logs/app_0001.log`, ...
//! The suffix is zero-padded to four digits and grows past four digits
//! unpadded. Parsing accepts any run of digits between `<stem>_` and the
//! extension so older or hand-made files are still recognized.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Splits a base file name into the parts numbered files are built from
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileNaming {
    dir: PathBuf,
    stem: String,
    extension: String,
}

impl FileNaming {
    /// Split `base` into directory, stem and extension
    ///
    /// Returns `None` when `base` has no file name component.
    pub fn new(base: impl AsRef<Path>) -> Option<Self> {
        let base = base.as_ref();
        let stem = base.file_stem()?.to_str()?.to_string();
        let extension = match base.extension() {
            Some(ext) => format!(".{}", ext.to_str()?),
            None => String::new(),
        };
        let dir = match base.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };

        Some(Self {
            dir,
            stem,
            extension,
        })
    }

    /// Directory the numbered files live in
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// File name for `suffix`, without the directory
    pub fn file_name(&self, suffix: u32) -> String {
        format!("{}_{:04}{}", self.stem, suffix, self.extension)
    }

    /// Full path for `suffix`
    pub fn path(&self, suffix: u32) -> PathBuf {
        self.dir.join(self.file_name(suffix))
    }

    /// Suffix encoded in `file_name`, if it belongs to this sequence
    pub fn parse_suffix(&self, file_name: &str) -> Option<u32> {
        let digits = file_name
            .strip_prefix(self.stem.as_str())?
            .strip_prefix('_')?
            .strip_suffix(self.extension.as_str())?;

        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        digits.parse().ok()
    }

    /// Highest suffix present in the directory
    ///
    /// A missing directory counts as empty.
    pub fn highest_existing(&self) -> io::Result<Option<u32>> {
        let entries = match fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e),
        };

        let mut highest = None;
        for entry in entries {
            let entry = entry?;
            let Some(name) = entry.file_name().to_str().map(str::to_owned) else {
                continue;
            };
            if let Some(suffix) = self.parse_suffix(&name) {
                highest = highest.max(Some(suffix));
            }
        }
        Ok(highest)
    }
}
