use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::io::ReadAt;
use anyhow::{bail, Context, Result};
use flate2::read::DeflateDecoder;

use super::parser::ZipParser;
use super::structures::{CompressionMethod, ZipFileEntry};

/// ZIP file extractor
pub struct ZipExtractor<R: ReadAt> {
    parser: ZipParser<R>,
}

impl<R: ReadAt> ZipExtractor<R> {
    pub fn new(reader: Arc<R>) -> Self {
        Self {
            parser: ZipParser::new(reader),
        }
    }

    /// List all entries in the archive
    pub fn list_entries(&self) -> Result<Vec<ZipFileEntry>> {
        self.parser.list_entries()
    }

    /// Extract file data to memory
    pub fn extract_to_memory(&self, entry: &ZipFileEntry) -> Result<Vec<u8>> {
        // Get data offset
        let data_offset = self.parser.data_offset(entry)?;

        // Read the compressed (or stored) bytes
        let mut raw = vec![0u8; entry.compressed_size as usize];
        self.parser.reader().read_at(data_offset, &mut raw)?;

        let data = match entry.compression_method {
            CompressionMethod::Stored => raw,
            CompressionMethod::Deflate => {
                // ZIP entries use raw deflate streams (no zlib header)
                let mut decoder = DeflateDecoder::new(&raw[..]);
                let mut out = Vec::with_capacity(entry.uncompressed_size as usize);
                decoder
                    .read_to_end(&mut out)
                    .with_context(|| format!("corrupt deflate stream in {}", entry.file_name))?;
                out
            }
            CompressionMethod::Unknown(method) => {
                bail!(
                    "unsupported compression method {} for {}",
                    method,
                    entry.file_name
                );
            }
        };

        if data.len() as u64 != entry.uncompressed_size {
            bail!(
                "size mismatch for {}: expected {} bytes, got {}",
                entry.file_name,
                entry.uncompressed_size,
                data.len()
            );
        }

        Ok(data)
    }

    /// Extract a single file entry to disk
    pub fn extract_to_file(&self, entry: &ZipFileEntry, output_path: &Path) -> Result<()> {
        // Create parent directories if needed
        if let Some(parent) = output_path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)
                    .with_context(|| format!("cannot create {}", parent.display()))?;
            }
        }

        let data = self.extract_to_memory(entry)?;

        fs::write(output_path, &data)
            .with_context(|| format!("cannot write {}", output_path.display()))?;

        Ok(())
    }

    /// Extract every entry of the archive into `dest_dir`, preserving
    /// relative paths and directory entries (including empty directories).
    ///
    /// Returns the number of entries extracted.
    pub fn unpack(&self, dest_dir: &Path) -> Result<usize> {
        let entries = self.list_entries()?;

        for entry in &entries {
            let target = entry_destination(dest_dir, &entry.file_name)?;

            if entry.is_directory {
                fs::create_dir_all(&target)
                    .with_context(|| format!("cannot create {}", target.display()))?;
            } else {
                self.extract_to_file(entry, &target)?;
            }
        }

        Ok(entries.len())
    }
}

/// Resolve an archive-internal name to a path under `dest_dir`.
///
/// Rejects absolute names and parent-directory traversal so a hostile
/// archive cannot write outside the extraction root.
fn entry_destination(dest_dir: &Path, name: &str) -> Result<PathBuf> {
    if name.starts_with('/') {
        bail!("unsafe absolute path in archive: {}", name);
    }

    let mut target = dest_dir.to_path_buf();
    for part in name.split('/') {
        match part {
            "" | "." => continue,
            ".." => bail!("unsafe path in archive: {}", name),
            part => target.push(part),
        }
    }

    Ok(target)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entry_destination_joins_components() {
        let dest = Path::new("staging");
        let path = entry_destination(dest, "word/document.xml").unwrap();
        assert_eq!(path, Path::new("staging").join("word").join("document.xml"));

        // Trailing slash of a directory entry yields the directory itself
        let path = entry_destination(dest, "word/media/").unwrap();
        assert_eq!(path, Path::new("staging").join("word").join("media"));
    }

    #[test]
    fn entry_destination_rejects_traversal() {
        let dest = Path::new("staging");
        assert!(entry_destination(dest, "../evil.txt").is_err());
        assert!(entry_destination(dest, "word/../../evil.txt").is_err());
        assert!(entry_destination(dest, "/etc/passwd").is_err());
    }
}
