//! ZIP archive reading and writing.
//!
//! This module provides both halves of the document package round trip:
//! extracting an archive into a working directory, and recombining a
//! working directory into a fresh archive.
//!
//! ## Architecture
//!
//! - [`structures`]: Data structures representing ZIP format elements (EOCD, file headers, etc.)
//! - [`parser`]: Low-level parsing of ZIP structures from raw bytes
//! - [`extractor`]: High-level extraction API (unpack a whole archive to disk)
//! - [`writer`]: Archive creation (pack a directory tree, deflate compression)
//!
//! ## ZIP Format Overview
//!
//! A ZIP file consists of:
//! 1. Local file headers and compressed data for each file
//! 2. Central Directory with metadata for all files
//! 3. End of Central Directory (EOCD) record at the end
//!
//! Reading starts from the EOCD at the end of the file; writing emits the
//! pieces in file order and tracks offsets, so no seeking is required on
//! either side.
//!
//! ## Supported Features
//!
//! - Standard ZIP format (PKZIP APPNOTE 6.3.x compatible)
//! - STORED (no compression) method
//! - DEFLATE compression method
//! - Directory entries, preserving empty directories across a round trip
//!
//! ## Limitations
//!
//! - No ZIP64 extensions (archives past 4 GiB are rejected)
//! - No encryption support
//! - No multi-disk archive support
//! - No BZIP2, LZMA, or other compression methods

mod extractor;
mod parser;
mod structures;
mod writer;

pub use extractor::ZipExtractor;
pub use parser::ZipParser;
pub use structures::*;
pub use writer::{pack_directory, ZipArchiveWriter};
