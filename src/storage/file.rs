//! Filesystem-backed disk handler.
//!
//! Each key maps to one file inside the handler's directory. Writes are
//! staged into a hidden temporary file and published with an atomic rename
//! on finalize, so readers of a key never observe a half-written chunk.

use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};

use crate::error::{QuillError, Result};
use crate::storage::{DiskHandler, StagedWriter};

/// A [`DiskHandler`] that stores every key as a file in one directory.
#[derive(Debug)]
pub struct FileDiskHandler {
    directory: PathBuf,
}

impl FileDiskHandler {
    /// Open a handler rooted at `directory`, creating it when missing.
    pub fn new<P: AsRef<Path>>(directory: P) -> Result<Self> {
        let directory = directory.as_ref().to_path_buf();
        fs::create_dir_all(&directory)?;
        Ok(FileDiskHandler { directory })
    }

    fn final_path(&self, key: &str) -> Result<PathBuf> {
        // Keys become file names verbatim; reject anything that could
        // escape the handler directory.
        if key.is_empty() || key.contains(['/', '\\']) || key.starts_with('.') {
            return Err(QuillError::storage(format!("invalid storage key: {key:?}")));
        }
        Ok(self.directory.join(key))
    }

    fn staging_path(&self, key: &str) -> Result<PathBuf> {
        Ok(self.directory.join(format!(".{key}.staged")))
    }
}

impl DiskHandler for FileDiskHandler {
    fn get_writer(&self, key: &str) -> Result<Box<dyn StagedWriter>> {
        let final_path = self.final_path(key)?;
        let staging_path = self.staging_path(key)?;
        let file = File::create(&staging_path)?;
        Ok(Box::new(FileStagedWriter {
            writer: BufWriter::new(file),
            staging_path,
            final_path,
        }))
    }

    fn get_reader(&self, key: &str) -> Result<Option<Box<dyn Read + Send>>> {
        let path = self.final_path(key)?;
        match File::open(&path) {
            Ok(file) => Ok(Some(Box::new(BufReader::new(file)))),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err.into()),
        }
    }
}

struct FileStagedWriter {
    writer: BufWriter<File>,
    staging_path: PathBuf,
    final_path: PathBuf,
}

impl Write for FileStagedWriter {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.writer.write(buf)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.writer.flush()
    }
}

impl StagedWriter for FileStagedWriter {
    fn finalize(mut self: Box<Self>) -> Result<()> {
        self.writer.flush()?;
        self.writer.get_ref().sync_all()?;
        fs::rename(&self.staging_path, &self.final_path)?;
        Ok(())
    }
}
