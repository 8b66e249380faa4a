use super::ReadAt;
use anyhow::{bail, Result};
use std::path::Path;

/// Local file reader with random access support
pub struct LocalFileReader {
    file: std::fs::File,
    size: u64,
}

impl LocalFileReader {
    pub fn new(path: &Path) -> Result<Self> {
        let file = std::fs::File::open(path)?;
        let size = file.metadata()?.len();
        Ok(Self { file, size })
    }

    /// Read at most `buf.len()` bytes at `offset`; may return short.
    fn read_chunk(&self, offset: u64, buf: &mut [u8]) -> Result<usize> {
        #[cfg(unix)]
        {
            use std::os::unix::fs::FileExt;
            Ok(self.file.read_at(buf, offset)?)
        }

        #[cfg(windows)]
        {
            use std::os::windows::fs::FileExt;
            Ok(self.file.seek_read(buf, offset)?)
        }

        #[cfg(not(any(unix, windows)))]
        {
            use std::io::{Read, Seek, SeekFrom};
            let mut file = &self.file;
            file.seek(SeekFrom::Start(offset))?;
            Ok(file.read(buf)?)
        }
    }
}

impl ReadAt for LocalFileReader {
    fn read_at(&self, offset: u64, buf: &mut [u8]) -> Result<usize> {
        let total = buf.len();
        let mut filled = 0;

        // Positional reads may return short; loop until the buffer is full.
        while filled < total {
            let n = self.read_chunk(offset + filled as u64, &mut buf[filled..])?;
            if n == 0 {
                bail!("unexpected end of file at offset {}", offset + filled as u64);
            }
            filled += n;
        }

        Ok(total)
    }

    fn size(&self) -> u64 {
        self.size
    }
}
