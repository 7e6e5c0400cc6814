use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum OutputError {
    #[error("destination directory missing or not writable: {0}")]
    DestinationDir(String),
    #[error("io error: {0}")]
    Io(#[from] io::Error),
}

/// Ensure the destination directory exists; create it if missing.
pub fn ensure_destination_dir(dir: &Path) -> Result<(), OutputError> {
    if !dir.exists() {
        fs::create_dir_all(dir).map_err(|e| OutputError::DestinationDir(e.to_string()))?;
    } else if !dir.is_dir() {
        return Err(OutputError::DestinationDir(format!(
            "{} is not a directory",
            dir.display()
        )));
    }
    // Writability probe: try creating a temp file.
    NamedTempFile::new_in(dir).map_err(|e| OutputError::DestinationDir(e.to_string()))?;
    Ok(())
}

/// Writes extracted text into a destination directory without clobbering
/// earlier results: `{stem}_001.txt`, `{stem}_002.txt`, and so on.
///
/// Content goes to a temp file in the same directory first and is renamed
/// into place, so readers never observe a partial file.
pub struct SequentialTextWriter {
    dir: PathBuf,
}

impl SequentialTextWriter {
    pub fn new(dir: PathBuf) -> Self {
        Self { dir }
    }

    /// Picks the first free sequential name for `stem`, writes `content`
    /// there and returns the final path.
    pub fn write(&self, stem: &str, content: &str) -> Result<PathBuf, OutputError> {
        ensure_destination_dir(&self.dir)?;

        let target = self.next_free_path(stem);
        let mut tmp = NamedTempFile::new_in(&self.dir)?;
        tmp.write_all(content.as_bytes())?;
        tmp.flush()?;
        tmp.as_file_mut().sync_all()?;
        tmp.persist_noclobber(&target)
            .map_err(|e| OutputError::Io(e.error))?;
        Ok(target)
    }

    // First `{stem}_{n:03}.txt` not already on disk.
    fn next_free_path(&self, stem: &str) -> PathBuf {
        let mut n = 1u32;
        loop {
            let candidate = self.dir.join(format!("{stem}_{n:03}.txt"));
            if !candidate.exists() {
                return candidate;
            }
            n += 1;
        }
    }
}
