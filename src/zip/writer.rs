//! ZIP archive writer.
//!
//! Write-side counterpart of [`parser`](super::parser): emits local file
//! headers followed by entry data, then the central directory and the EOCD
//! record. Offsets are tracked as bytes are written, so the output sink only
//! needs [`Write`], not [`Seek`](std::io::Seek).
//!
//! Entries carry a fixed DOS timestamp (1980-01-01), which makes repacking
//! the same tree reproducible. Archives that would overflow the classic
//! 32-bit offsets are rejected; ZIP64 output is not produced.

use byteorder::{LittleEndian, WriteBytesExt};
use std::fs;
use std::io::{BufWriter, Write};
use std::path::Path;

use anyhow::{bail, Context, Result};
use flate2::write::DeflateEncoder;
use flate2::{Compression, Crc};

use super::structures::{
    CompressionMethod, EndOfCentralDirectory, CDFH_MIN_SIZE, CDFH_SIGNATURE, LFH_SIGNATURE,
    LFH_SIZE,
};

/// Fixed DOS timestamp for all written entries: 1980-01-01 00:00:00.
const DOS_EPOCH_DATE: u16 = 0x0021;
const DOS_EPOCH_TIME: u16 = 0x0000;

/// Version needed to extract / made by: 2.0 (deflate, directories).
const ZIP_VERSION: u16 = 20;

/// MS-DOS directory attribute bit, set on directory entries.
const DOS_DIR_ATTR: u32 = 0x10;

/// Central directory state for one written entry.
struct PendingEntry {
    name: String,
    method: CompressionMethod,
    crc32: u32,
    compressed_size: u32,
    uncompressed_size: u32,
    lfh_offset: u32,
    is_directory: bool,
}

/// Incremental ZIP writer over any byte sink.
pub struct ZipArchiveWriter<W: Write> {
    writer: W,
    entries: Vec<PendingEntry>,
    offset: u64,
}

impl<W: Write> ZipArchiveWriter<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer,
            entries: Vec::new(),
            offset: 0,
        }
    }

    /// Add a directory entry (zero-length, stored).
    ///
    /// Directory entries are what keep empty directories alive across an
    /// unpack/repack round trip. `name` is normalized to end with `/`.
    pub fn add_directory(&mut self, name: &str) -> Result<()> {
        let name = if name.ends_with('/') {
            name.to_string()
        } else {
            format!("{}/", name)
        };

        let lfh_offset = self.current_offset()?;
        self.write_local_header(&name, CompressionMethod::Stored, 0, 0, 0)?;

        self.entries.push(PendingEntry {
            name,
            method: CompressionMethod::Stored,
            crc32: 0,
            compressed_size: 0,
            uncompressed_size: 0,
            lfh_offset,
            is_directory: true,
        });

        Ok(())
    }

    /// Add a regular file entry, deflate-compressed.
    pub fn add_file(&mut self, name: &str, data: &[u8]) -> Result<()> {
        if data.len() > u32::MAX as usize {
            bail!("entry {} too large for a ZIP archive", name);
        }
        let uncompressed_size = data.len() as u32;

        let mut crc = Crc::new();
        crc.update(data);
        let crc32 = crc.sum();

        // ZIP stores raw deflate streams (no zlib wrapper)
        let mut encoder = DeflateEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(data)?;
        let compressed = encoder.finish()?;
        let compressed_size = compressed.len() as u32;

        let lfh_offset = self.current_offset()?;
        self.write_local_header(
            name,
            CompressionMethod::Deflate,
            crc32,
            compressed_size,
            uncompressed_size,
        )?;

        self.writer.write_all(&compressed)?;
        self.offset += compressed.len() as u64;

        self.entries.push(PendingEntry {
            name: name.to_string(),
            method: CompressionMethod::Deflate,
            crc32,
            compressed_size,
            uncompressed_size,
            lfh_offset,
            is_directory: false,
        });

        Ok(())
    }

    /// Write the central directory and EOCD, returning the inner sink.
    pub fn finish(mut self) -> Result<W> {
        let cd_offset = self.current_offset()?;

        for entry in &self.entries {
            let name_bytes = entry.name.as_bytes();

            self.writer.write_all(CDFH_SIGNATURE)?;
            self.writer.write_u16::<LittleEndian>(ZIP_VERSION)?; // version made by
            self.writer.write_u16::<LittleEndian>(ZIP_VERSION)?; // version needed
            self.writer.write_u16::<LittleEndian>(0)?; // flags
            self.writer
                .write_u16::<LittleEndian>(entry.method.as_u16())?;
            self.writer.write_u16::<LittleEndian>(DOS_EPOCH_TIME)?;
            self.writer.write_u16::<LittleEndian>(DOS_EPOCH_DATE)?;
            self.writer.write_u32::<LittleEndian>(entry.crc32)?;
            self.writer
                .write_u32::<LittleEndian>(entry.compressed_size)?;
            self.writer
                .write_u32::<LittleEndian>(entry.uncompressed_size)?;
            self.writer
                .write_u16::<LittleEndian>(name_bytes.len() as u16)?;
            self.writer.write_u16::<LittleEndian>(0)?; // extra field length
            self.writer.write_u16::<LittleEndian>(0)?; // file comment length
            self.writer.write_u16::<LittleEndian>(0)?; // disk number start
            self.writer.write_u16::<LittleEndian>(0)?; // internal attributes
            let external_attrs = if entry.is_directory { DOS_DIR_ATTR } else { 0 };
            self.writer.write_u32::<LittleEndian>(external_attrs)?;
            self.writer.write_u32::<LittleEndian>(entry.lfh_offset)?;
            self.writer.write_all(name_bytes)?;

            self.offset += CDFH_MIN_SIZE as u64 + name_bytes.len() as u64;
        }

        let cd_end = self.current_offset()?;
        if self.entries.len() > u16::MAX as usize {
            bail!("too many entries for a ZIP archive");
        }
        let total = self.entries.len() as u16;

        let eocd = EndOfCentralDirectory {
            disk_number: 0,
            disk_with_cd: 0,
            disk_entries: total,
            total_entries: total,
            cd_size: cd_end - cd_offset,
            cd_offset,
            comment_len: 0,
        };
        eocd.write_to(&mut self.writer)?;

        Ok(self.writer)
    }

    fn write_local_header(
        &mut self,
        name: &str,
        method: CompressionMethod,
        crc32: u32,
        compressed_size: u32,
        uncompressed_size: u32,
    ) -> Result<()> {
        let name_bytes = name.as_bytes();
        if name_bytes.len() > u16::MAX as usize {
            bail!("entry name too long: {}", name);
        }

        self.writer.write_all(LFH_SIGNATURE)?;
        self.writer.write_u16::<LittleEndian>(ZIP_VERSION)?;
        self.writer.write_u16::<LittleEndian>(0)?; // flags
        self.writer.write_u16::<LittleEndian>(method.as_u16())?;
        self.writer.write_u16::<LittleEndian>(DOS_EPOCH_TIME)?;
        self.writer.write_u16::<LittleEndian>(DOS_EPOCH_DATE)?;
        self.writer.write_u32::<LittleEndian>(crc32)?;
        self.writer.write_u32::<LittleEndian>(compressed_size)?;
        self.writer.write_u32::<LittleEndian>(uncompressed_size)?;
        self.writer
            .write_u16::<LittleEndian>(name_bytes.len() as u16)?;
        self.writer.write_u16::<LittleEndian>(0)?; // extra field length
        self.writer.write_all(name_bytes)?;

        self.offset += LFH_SIZE as u64 + name_bytes.len() as u64;
        Ok(())
    }

    /// Current write offset as a classic 32-bit ZIP offset.
    fn current_offset(&self) -> Result<u32> {
        if self.offset > u32::MAX as u64 {
            bail!("archive too large (ZIP64 not supported)");
        }
        Ok(self.offset as u32)
    }
}

/// Pack a directory tree into a fresh ZIP archive at `dest`.
///
/// Walks `source_dir` recursively in sorted order, writing one entry per
/// subdirectory (so empty directories survive) and one deflate entry per
/// regular file. Symbolic links and other non-regular files are skipped.
/// Archive-internal names are `/`-separated paths relative to `source_dir`,
/// so extracting the output reproduces the tree's layout exactly.
///
/// Returns the number of entries written.
pub fn pack_directory(source_dir: &Path, dest: &Path) -> Result<usize> {
    if !source_dir.is_dir() {
        bail!("{} is not a directory", source_dir.display());
    }

    let file = fs::File::create(dest)
        .with_context(|| format!("cannot create {}", dest.display()))?;
    let mut zip = ZipArchiveWriter::new(BufWriter::new(file));

    add_tree(&mut zip, source_dir, source_dir)?;

    let count = zip.entries.len();
    let mut inner = zip.finish()?;
    inner
        .flush()
        .with_context(|| format!("cannot write {}", dest.display()))?;

    Ok(count)
}

/// Recursively add the contents of `dir` to the archive, naming entries
/// relative to `root`.
fn add_tree<W: Write>(zip: &mut ZipArchiveWriter<W>, root: &Path, dir: &Path) -> Result<()> {
    let mut children: Vec<_> = fs::read_dir(dir)
        .with_context(|| format!("cannot read {}", dir.display()))?
        .collect::<std::io::Result<_>>()?;

    // Sorted walk keeps the archive layout deterministic
    children.sort_by_key(|entry| entry.file_name());

    for child in children {
        let path = child.path();
        let file_type = child.file_type()?;

        // Symbolic links and other non-regular files are skipped
        if file_type.is_symlink() {
            continue;
        }

        if file_type.is_dir() {
            zip.add_directory(&archive_name(root, &path)?)?;
            add_tree(zip, root, &path)?;
        } else if file_type.is_file() {
            let data = fs::read(&path)
                .with_context(|| format!("cannot read {}", path.display()))?;
            zip.add_file(&archive_name(root, &path)?, &data)?;
        }
    }

    Ok(())
}

/// Archive-internal name for `path`: its components relative to `root`,
/// joined with `/` regardless of platform separator.
fn archive_name(root: &Path, path: &Path) -> Result<String> {
    let relative = path
        .strip_prefix(root)
        .with_context(|| format!("{} is outside {}", path.display(), root.display()))?;

    let parts: Vec<String> = relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect();

    Ok(parts.join("/"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::zip::structures::EndOfCentralDirectory;

    #[test]
    fn empty_archive_is_bare_eocd() {
        let zip = ZipArchiveWriter::new(Vec::new());
        let bytes = zip.finish().unwrap();

        assert_eq!(bytes.len(), EndOfCentralDirectory::SIZE);
        let eocd = EndOfCentralDirectory::from_bytes(&bytes).unwrap();
        assert_eq!(eocd.total_entries, 0);
        assert_eq!(eocd.cd_size, 0);
    }

    #[test]
    fn directory_names_gain_trailing_slash() {
        let mut zip = ZipArchiveWriter::new(Vec::new());
        zip.add_directory("word").unwrap();
        zip.add_directory("word/media/").unwrap();

        assert_eq!(zip.entries[0].name, "word/");
        assert_eq!(zip.entries[1].name, "word/media/");
    }

    #[test]
    fn archive_name_is_slash_joined() {
        let root = Path::new("staging");
        let name = archive_name(root, &root.join("word").join("document.xml")).unwrap();
        assert_eq!(name, "word/document.xml");
    }
}
