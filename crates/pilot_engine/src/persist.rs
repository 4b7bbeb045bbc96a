use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PersistError {
    #[error("config directory missing or not writable: {0}")]
    ConfigDir(String),
    #[error("io error: {0}")]
    Io(#[from] io::Error),
}

/// Ensure the config directory exists; create it if missing.
pub fn ensure_config_dir(dir: &Path) -> Result<(), PersistError> {
    if dir.exists() {
        let meta = fs::metadata(dir).map_err(|e| PersistError::ConfigDir(e.to_string()))?;
        if !meta.is_dir() {
            return Err(PersistError::ConfigDir(format!(
                "{} is not a directory",
                dir.display()
            )));
        }
    } else {
        fs::create_dir_all(dir).map_err(|e| PersistError::ConfigDir(e.to_string()))?;
    }
    Ok(())
}

/// Writes whole files through a sibling temp file so readers never see a partial write.
#[derive(Debug, Clone)]
pub struct AtomicFileWriter {
    dir: PathBuf,
}

impl AtomicFileWriter {
    pub fn new(dir: PathBuf) -> Self {
        Self { dir }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn write(&self, filename: &str, content: &str) -> Result<PathBuf, PersistError> {
        ensure_config_dir(&self.dir)?;

        let target = self.dir.join(filename);
        let mut tmp = NamedTempFile::new_in(&self.dir)?;
        tmp.write_all(content.as_bytes())?;
        tmp.flush()?;
        tmp.as_file_mut().sync_all()?;

        tmp.persist(&target).map_err(|e| PersistError::Io(e.error))?;
        Ok(target)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn creates_missing_directory_and_replaces_content() {
        let root = tempfile::tempdir().expect("tempdir");
        let dir = root.path().join("pilot");
        let writer = AtomicFileWriter::new(dir.clone());

        let path = writer.write("settings.ron", "first").expect("first write");
        assert_eq!(path, dir.join("settings.ron"));
        writer.write("settings.ron", "second").expect("second write");

        assert_eq!(fs::read_to_string(&path).expect("read back"), "second");
        let leftovers = fs::read_dir(&dir).expect("list").count();
        assert_eq!(leftovers, 1);
    }

    #[test]
    fn rejects_file_in_place_of_directory() {
        let root = tempfile::tempdir().expect("tempdir");
        let blocker = root.path().join("pilot");
        fs::write(&blocker, "not a dir").expect("blocker");

        let err = AtomicFileWriter::new(blocker)
            .write("settings.ron", "x")
            .expect_err("must fail");
        assert!(matches!(err, PersistError::ConfigDir(_)));
    }
}
