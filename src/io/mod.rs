mod local;

pub use local::LocalFileReader;

use anyhow::Result;

/// Trait for random access reading from a data source
pub trait ReadAt {
    /// Read exactly `buf.len()` bytes starting at `offset`.
    ///
    /// Returns the number of bytes read (always `buf.len()` on success);
    /// hitting end-of-file before the buffer is full is an error.
    fn read_at(&self, offset: u64, buf: &mut [u8]) -> Result<usize>;

    /// Get the total size of the data source
    fn size(&self) -> u64;
}
