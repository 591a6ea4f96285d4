//! Backing store abstraction
//!
//! Provides random-access byte I/O underneath the file system:
//! - positioned reads and writes, always exact-length
//! - durable sync, required before a mutation may report success

use std::fs::{self, File, OpenOptions};
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::path::Path;

/// Random-access byte store
///
/// Implemented by [`DiskFile`] over a regular file.
pub trait BackingStore: Send {
    /// Read exactly `buf.len()` bytes starting at `offset`
    fn read_at(&mut self, offset: u64, buf: &mut [u8]) -> io::Result<()>;

    /// Write all of `buf` starting at `offset`
    fn write_at(&mut self, offset: u64, buf: &[u8]) -> io::Result<()>;

    /// Flush written data down to durable storage
    fn sync(&mut self) -> io::Result<()>;
}

/// File-backed store
pub struct DiskFile {
    file: File,
}

impl DiskFile {
    /// Open or create the backing file, extending it to `min_len` bytes if
    /// shorter. Existing content is never truncated. Missing parent
    /// directories are created.
    pub fn open<P: AsRef<Path>>(path: P, min_len: u64) -> io::Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                fs::create_dir_all(parent)?;
            }
        }
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .open(path)?;
        let len = file.metadata()?.len();
        if len < min_len {
            file.set_len(min_len)?;
            log::debug!(
                "fsys: extended {} from {} to {} bytes",
                path.display(),
                len,
                min_len
            );
        }
        Ok(Self { file })
    }
}

impl BackingStore for DiskFile {
    fn read_at(&mut self, offset: u64, buf: &mut [u8]) -> io::Result<()> {
        self.file.seek(SeekFrom::Start(offset))?;
        self.file.read_exact(buf)
    }

    fn write_at(&mut self, offset: u64, buf: &[u8]) -> io::Result<()> {
        self.file.seek(SeekFrom::Start(offset))?;
        self.file.write_all(buf)
    }

    fn sync(&mut self) -> io::Result<()> {
        self.file.sync_all()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn open_extends_short_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("store.img");
        let _ = DiskFile::open(&path, 1024).unwrap();
        assert_eq!(fs::metadata(&path).unwrap().len(), 1024);
    }

    #[test]
    fn open_never_truncates() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("store.img");
        fs::write(&path, vec![7u8; 2048]).unwrap();
        let mut store = DiskFile::open(&path, 1024).unwrap();
        assert_eq!(fs::metadata(&path).unwrap().len(), 2048);
        let mut buf = [0u8; 4];
        store.read_at(2000, &mut buf).unwrap();
        assert_eq!(buf, [7u8; 4]);
    }

    #[test]
    fn open_creates_parent_directories() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a").join("b").join("store.img");
        let _ = DiskFile::open(&path, 64).unwrap();
        assert!(path.exists());
    }

    #[test]
    fn positioned_write_then_read() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("store.img");
        let mut store = DiskFile::open(&path, 256).unwrap();
        store.write_at(100, b"hello").unwrap();
        store.sync().unwrap();
        let mut buf = [0u8; 5];
        store.read_at(100, &mut buf).unwrap();
        assert_eq!(&buf, b"hello");
    }
}
