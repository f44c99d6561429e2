use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PersistError {
    #[error("output directory missing or not writable: {0}")]
    OutputDir(String),
    #[error("io error: {0}")]
    Io(#[from] io::Error),
}

/// Creates the download directory (and parents) unless it is already there.
pub fn ensure_output_dir(dir: &Path) -> Result<(), PersistError> {
    match fs::metadata(dir) {
        Ok(meta) if meta.is_dir() => Ok(()),
        Ok(_) => Err(PersistError::OutputDir(format!("{} is not a directory", dir.display()))),
        Err(err) if err.kind() == io::ErrorKind::NotFound => {
            fs::create_dir_all(dir).map_err(|e| PersistError::OutputDir(e.to_string()))
        }
        Err(err) => Err(PersistError::OutputDir(err.to_string())),
    }
}

/// Writes downloaded artifacts to `{dir}/{filename}` via a temp file and rename,
/// so a failed download never leaves a truncated file behind.
pub struct AtomicFileWriter {
    dir: PathBuf,
}

impl AtomicFileWriter {
    pub fn new(dir: PathBuf) -> Self {
        Self { dir }
    }

    pub fn write(&self, filename: &str, content: &[u8]) -> Result<PathBuf, PersistError> {
        ensure_output_dir(&self.dir)?;

        let target = self.dir.join(filename);
        let mut tmp = NamedTempFile::new_in(&self.dir)?;
        tmp.write_all(content)?;
        tmp.flush()?;
        tmp.as_file_mut().sync_all()?;

        // Re-downloading the same task replaces the earlier copy.
        tmp.persist(&target).map_err(|e| PersistError::Io(e.error))?;
        Ok(target)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn creates_missing_output_dir() {
        let temp = TempDir::new().unwrap();
        let new_dir = temp.path().join("podcasts");
        ensure_output_dir(&new_dir).unwrap();
        assert!(new_dir.is_dir());
    }

    #[test]
    fn rewrite_replaces_previous_download() {
        let temp = TempDir::new().unwrap();
        let writer = AtomicFileWriter::new(temp.path().to_path_buf());

        let first = writer.write("episode.mp3", b"ID3 first").unwrap();
        let second = writer.write("episode.mp3", b"ID3 second").unwrap();

        assert_eq!(first, second);
        assert_eq!(fs::read(&second).unwrap(), b"ID3 second");
        assert_eq!(fs::read_dir(temp.path()).unwrap().count(), 1);
    }

    #[test]
    fn file_in_place_of_directory_is_an_error() {
        let temp = TempDir::new().unwrap();
        let not_a_dir = temp.path().join("not_a_dir");
        fs::write(&not_a_dir, "x").unwrap();

        let writer = AtomicFileWriter::new(not_a_dir.clone());
        assert!(matches!(
            writer.write("episode.mp3", b"data"),
            Err(PersistError::OutputDir(_))
        ));
    }
}
