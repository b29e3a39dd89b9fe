//! The managed debug log file.

use crate::model::error::InputError;
use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

/// Handle to the debug log on disk.
///
/// Every call touches the file afresh; nothing is cached between calls.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogFile {
    path: PathBuf,
}

impl LogFile {
    /// Handle for `path`. The file need not exist yet.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Path of the log file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns true if the file exists.
    pub fn exists(&self) -> bool {
        self.path.is_file()
    }

    /// Read the whole file. Invalid UTF-8 is replaced rather than rejected.
    ///
    /// # Errors
    ///
    /// Returns `InputError::FileNotFound` if the file does not exist.
    /// Returns `InputError::Io` for other I/O errors.
    pub fn read(&self) -> Result<String, InputError> {
        match fs::read(&self.path) {
            Ok(bytes) => Ok(String::from_utf8_lossy(&bytes).into_owned()),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Err(InputError::FileNotFound {
                path: self.path.clone(),
            }),
            Err(source) => Err(self.io_error(source)),
        }
    }

    /// Size in bytes; 0 when the file does not exist.
    pub fn size(&self) -> Result<u64, InputError> {
        match fs::metadata(&self.path) {
            Ok(meta) => Ok(meta.len()),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(0),
            Err(source) => Err(self.io_error(source)),
        }
    }

    /// Create the file (and its directory) if missing.
    pub fn ensure_exists(&self) -> Result<(), InputError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|source| self.io_error(source))?;
        }
        self.open_append().map(drop)
    }

    /// Truncate the file to zero length, creating it if needed.
    pub fn clear(&self) -> Result<(), InputError> {
        File::create(&self.path)
            .map(drop)
            .map_err(|source| self.io_error(source))?;
        tracing::info!(path = %self.path.display(), "Cleared debug log");
        Ok(())
    }

    /// Append one line. A trailing newline is added.
    pub fn append_line(&self, line: &str) -> Result<(), InputError> {
        let mut file = self.open_append()?;
        writeln!(file, "{line}").map_err(|source| self.io_error(source))
    }

    /// Append the entire content of `other` to this file.
    pub fn append_from(&self, other: &LogFile) -> Result<u64, InputError> {
        let mut src = File::open(&other.path).map_err(|source| other.io_error(source))?;
        let mut dst = self.open_append()?;
        io::copy(&mut src, &mut dst).map_err(|source| self.io_error(source))
    }

    /// Delete the file.
    pub fn remove(&self) -> Result<(), InputError> {
        fs::remove_file(&self.path).map_err(|source| self.io_error(source))
    }

    fn open_append(&self) -> Result<File, InputError> {
        OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|source| self.io_error(source))
    }

    fn io_error(&self, source: io::Error) -> InputError {
        InputError::Io {
            path: self.path.clone(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_reads_as_not_found_and_zero_size() {
        let dir = tempfile::tempdir().unwrap();
        let log = LogFile::new(dir.path().join("debug.log"));

        assert!(matches!(log.read(), Err(InputError::FileNotFound { .. })));
        assert_eq!(log.size().unwrap(), 0);
        assert!(!log.exists());
    }

    #[test]
    fn append_clear_cycle() {
        let dir = tempfile::tempdir().unwrap();
        let log = LogFile::new(dir.path().join("nested").join("debug.log"));

        log.ensure_exists().unwrap();
        log.append_line("[29-Nov-2023 01:30:03 UTC] PHP Notice:  hi").unwrap();
        assert_eq!(log.read().unwrap(), "[29-Nov-2023 01:30:03 UTC] PHP Notice:  hi\n");
        assert_eq!(log.size().unwrap(), 43);

        log.clear().unwrap();
        assert_eq!(log.read().unwrap(), "");
        assert!(log.exists());
    }

    #[test]
    fn invalid_utf8_is_replaced() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("debug.log");
        fs::write(&path, b"[29-Nov-2023 01:30:03 UTC] bad \xff byte\n").unwrap();

        let text = LogFile::new(path).read().unwrap();
        assert!(text.contains("bad \u{fffd} byte"));
    }

    #[test]
    fn append_from_copies_content() {
        let dir = tempfile::tempdir().unwrap();
        let old = LogFile::new(dir.path().join("old.log"));
        let new = LogFile::new(dir.path().join("new.log"));
        old.append_line("one").unwrap();
        new.append_line("zero").unwrap();

        assert_eq!(new.append_from(&old).unwrap(), 4);
        assert_eq!(new.read().unwrap(), "zero\none\n");
    }
}
