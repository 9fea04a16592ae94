//! Core I/O traits

use std::fs::File;
use std::io::{Read, Result, Seek, SeekFrom, Write};

/// Positioned access to a raw image file.
///
/// Every access is an explicit seek followed by a read or write, so a
/// single handle can be shared by all bands of a dataset. Callers must
/// serialise access to one handle.
pub trait RawStorage {
    /// Reads up to `buf.len()` bytes at `offset`, zero-filling whatever lies
    /// past the end of the data. Returns the number of bytes actually read.
    fn read_at(&self, offset: u64, buf: &mut [u8]) -> Result<usize>;

    /// Writes all of `buf` at `offset`, extending the file when needed
    fn write_at(&self, offset: u64, buf: &[u8]) -> Result<()>;

    /// Pushes buffered writes down to the storage device
    fn flush_all(&self) -> Result<()>;
}

impl RawStorage for File {
    fn read_at(&self, offset: u64, buf: &mut [u8]) -> Result<usize> {
        let mut handle = self;
        handle.seek(SeekFrom::Start(offset))?;

        let mut filled = 0;
        while filled < buf.len() {
            match handle.read(&mut buf[filled..]) {
                Ok(0) => break,
                Ok(n) => filled += n,
                Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            }
        }
        buf[filled..].fill(0);
        Ok(filled)
    }

    fn write_at(&self, offset: u64, buf: &[u8]) -> Result<()> {
        let mut handle = self;
        handle.seek(SeekFrom::Start(offset))?;
        handle.write_all(buf)
    }

    fn flush_all(&self) -> Result<()> {
        let mut handle = self;
        handle.flush()?;
        self.sync_data()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::OpenOptions;
    use tempfile::tempdir;

    fn open_rw(path: &std::path::Path) -> File {
        OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(path)
            .unwrap()
    }

    #[test]
    fn test_write_then_read_at_offset() {
        let dir = tempdir().unwrap();
        let file = open_rw(&dir.path().join("data.raw"));

        file.write_at(4, &[0x10, 0x20, 0x30]).unwrap();

        let mut buf = [0xFFu8; 3];
        assert_eq!(file.read_at(4, &mut buf).unwrap(), 3);
        assert_eq!(buf, [0x10, 0x20, 0x30]);

        let mut head = [0xFFu8; 4];
        file.read_at(0, &mut head).unwrap();
        assert_eq!(head, [0, 0, 0, 0]);
    }

    #[test]
    fn test_read_past_end_zero_fills() {
        let dir = tempdir().unwrap();
        let file = open_rw(&dir.path().join("short.raw"));
        file.write_at(0, &[7, 8]).unwrap();

        let mut buf = [0xFFu8; 5];
        let n = file.read_at(1, &mut buf).unwrap();
        assert_eq!(n, 1);
        assert_eq!(buf, [8, 0, 0, 0, 0]);
    }

    #[test]
    fn test_flush_all() {
        let dir = tempdir().unwrap();
        let file = open_rw(&dir.path().join("flush.raw"));
        file.write_at(0, &[1]).unwrap();
        assert!(file.flush_all().is_ok());
    }
}
